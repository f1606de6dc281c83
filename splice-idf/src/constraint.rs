use serde::{Deserialize, Serialize};

use crate::goal::Goal;

/// A reference to one scalar element somewhere in the assembly: either an
/// element of an independent variable or an element of a discipline output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueRef {
    Variable {
        name: String,
        index: usize,
    },
    Output {
        discipline: String,
        slot: String,
        index: usize,
    },
}

impl ValueRef {
    /// The first (or only) element of an independent variable.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable {
            name: name.into(),
            index: 0,
        }
    }

    /// A specific element of an independent variable.
    pub fn variable_element(name: impl Into<String>, index: usize) -> Self {
        Self::Variable {
            name: name.into(),
            index,
        }
    }

    /// The first (or only) element of a discipline output.
    pub fn output(discipline: impl Into<String>, slot: impl Into<String>) -> Self {
        Self::Output {
            discipline: discipline.into(),
            slot: slot.into(),
            index: 0,
        }
    }

    /// A specific element of a discipline output.
    pub fn output_element(
        discipline: impl Into<String>,
        slot: impl Into<String>,
        index: usize,
    ) -> Self {
        Self::Output {
            discipline: discipline.into(),
            slot: slot.into(),
            index,
        }
    }
}

/// A one-sided feasibility bound on a physical quantity.
///
/// The assembly reports `physical - limit` for an upper bound and
/// `limit - physical` for a lower bound, so a feasible point is `<= 0`
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    Upper(f64),
    Lower(f64),
}

/// A named inequality constraint over one referenced scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inequality {
    pub name: String,
    pub value: ValueRef,
    pub bound: Bound,
}

impl Inequality {
    pub fn new(name: impl Into<String>, value: ValueRef, bound: Bound) -> Self {
        Self {
            name: name.into(),
            value,
            bound,
        }
    }
}

/// One coupling edge under IDF: the independent "assumed" variable both
/// consumers read, and the producing discipline output it must agree with.
///
/// Each coupling yields one equality constraint with residual
/// `Σ (assumed - produced)²` in normalized space, target zero at a feasible
/// optimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupling {
    pub variable: String,
    pub discipline: String,
    pub slot: String,
}

/// Where a routed discipline input takes its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteSource {
    /// An independent variable, including assumed coupling copies.
    Variable(String),
    /// The output of a discipline declared earlier in the assembly.
    Output { discipline: String, slot: String },
}

/// One directed edge of the wiring: a source value feeding a discipline's
/// input slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub source: RouteSource,
    pub discipline: String,
    pub slot: String,
}

/// The scalar the external optimizer minimizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub value: ValueRef,
    pub goal: Goal,
}
