use serde::{Deserialize, Serialize};

/// The optimization direction of an assembly's objective.
///
/// The assembly always hands the external optimizer a value to minimize;
/// [`Goal::transform`] negates maximized quantities so both directions look
/// the same downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    /// Report the objective value unchanged.
    Minimize,
    /// Report the negated objective value.
    Maximize,
}

impl Goal {
    /// Transforms an objective value for internal minimization.
    #[must_use]
    pub fn transform(self, value: f64) -> f64 {
        match self {
            Self::Minimize => value,
            Self::Maximize => -value,
        }
    }

    /// The sign applied by [`Goal::transform`].
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Minimize => 1.0,
            Self::Maximize => -1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_negates() {
        assert_eq!(Goal::Minimize.transform(2.5), 2.5);
        assert_eq!(Goal::Maximize.transform(2.5), -2.5);
        assert_eq!(Goal::Maximize.sign(), -1.0);
    }
}
