//! A supersonic business jet design model for Splice.
//!
//! Four coupled disciplines — structure, aerodynamics, propulsion, and
//! performance — share a six-element global design vector
//! `z = (t/c, h, M, AR, Λ, Sref)` and exchange coupling quantities (lift,
//! drag, total weight, engine weight, engine scale factor, wing twist).
//! Each discipline implements [`splice_core::Discipline`]: physical values
//! in, physical values out, exact analytic Jacobian on demand. Fitted
//! quadratic response surfaces stand in for the expensive structural and
//! propulsion responses, with the trust-region derivative clamp their
//! consumers differentiate through.
//!
//! [`idf_assembly`] wires the disciplines into a single
//! Individual-Discipline-Feasible problem: every cyclic coupling becomes an
//! independent assumed variable plus a quadratic consistency constraint, the
//! local feasibility limits become inequality constraints, and the objective
//! maximizes the Breguet range.

pub mod constants;

mod disciplines;
mod problem;
mod scales;
mod surface;

pub use disciplines::{Aerodynamics, Performance, Propulsion, Structure};
pub use problem::idf_assembly;
pub use scales::Scales;
pub use surface::{PolynomialSurface, Section, SectionShape};
