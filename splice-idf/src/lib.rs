//! Individual-Discipline-Feasible (IDF) assembly of disciplines into one
//! optimization problem.
//!
//! Under IDF, every coupling quantity that would close a loop between
//! disciplines is exposed as an independent optimization variable. Each
//! consumer reads the independent "assumed" copy, never the producer's
//! output, so the disciplines of one iteration are mutually independent and
//! need no nested coupled solve. For every such edge the assembly adds a
//! quadratic consistency constraint tying the assumed copy to the produced
//! value; the external optimizer drives those residuals to zero.
//!
//! The wiring is an explicit directed edge list built once at construction
//! and walked deterministically each evaluation. Acyclic feed-forward
//! consumption may route straight from a producer's output; the builder
//! rejects edges that would run backwards against the declaration order, so
//! genuine cycles must be decoupled through an assumed variable.

mod assembly;
mod constraint;
mod evaluation;
mod goal;
mod layout;

pub use assembly::{Assembly, AssemblyBuilder};
pub use constraint::{Bound, Coupling, Inequality, Objective, Route, RouteSource, ValueRef};
pub use evaluation::{AssemblyJacobian, Evaluation};
pub use goal::Goal;
pub use layout::Layout;
