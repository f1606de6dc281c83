use ndarray::Array1;
use splice_core::ValueMap;

/// One evaluation of an [`Assembly`](crate::Assembly) at a point.
///
/// Derived data only: identical independent-variable values always
/// reproduce an identical `Evaluation`, bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The objective after the goal transform (always minimized).
    pub objective: f64,
    /// Consistency residuals, one per coupling, named after the assumed
    /// variable. Equality constraints with target zero; each residual is a
    /// sum of squares and therefore never negative.
    pub consistency: Vec<(String, f64)>,
    /// Inequality constraint values; feasible when `<= 0`.
    pub inequalities: Vec<(String, f64)>,
    /// Normalized outputs of every discipline, in declaration order.
    pub outputs: Vec<(String, ValueMap)>,
}

impl Evaluation {
    /// A consistency residual by assumed-variable name.
    #[must_use]
    pub fn consistency_residual(&self, variable: &str) -> Option<f64> {
        self.consistency
            .iter()
            .find(|(n, _)| n == variable)
            .map(|(_, v)| *v)
    }

    /// An inequality value by constraint name.
    #[must_use]
    pub fn inequality(&self, name: &str) -> Option<f64> {
        self.inequalities
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// The normalized outputs of a discipline.
    #[must_use]
    pub fn outputs_of(&self, discipline: &str) -> Option<&ValueMap> {
        self.outputs
            .iter()
            .find(|(n, _)| n == discipline)
            .map(|(_, v)| v)
    }
}

/// Total derivatives of the assembled problem with respect to the flattened
/// independent vector (see [`Layout`](crate::Layout)).
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyJacobian {
    /// Gradient of the (goal-transformed) objective.
    pub objective: Array1<f64>,
    /// One gradient row per consistency constraint, in coupling order.
    pub consistency: Vec<(String, Array1<f64>)>,
    /// One gradient row per inequality constraint, in declaration order.
    pub inequalities: Vec<(String, Array1<f64>)>,
}

impl AssemblyJacobian {
    /// A consistency gradient row by assumed-variable name.
    #[must_use]
    pub fn consistency_row(&self, variable: &str) -> Option<&Array1<f64>> {
        self.consistency
            .iter()
            .find(|(n, _)| n == variable)
            .map(|(_, v)| v)
    }

    /// An inequality gradient row by constraint name.
    #[must_use]
    pub fn inequality_row(&self, name: &str) -> Option<&Array1<f64>> {
        self.inequalities
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
