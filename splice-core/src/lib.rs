//! Core abstractions for gradient-based multidisciplinary design
//! optimization.
//!
//! A *discipline* is a pure physics model: named physical inputs in, named
//! physical outputs out, plus the exact Jacobian of those outputs with
//! respect to those inputs. Everything an optimizer touches crosses a
//! [`Scale`] boundary, so the optimizer only ever sees order-one normalized
//! quantities while the model computes in physical units.
//!
//! This crate provides:
//!
//! - [`Scale`], [`VariableSpec`], and [`ValueMap`] — the slot currency at
//!   every model boundary.
//! - The [`Discipline`] trait and the [`Normalized`] adapter that applies
//!   scaling on entry and exit, including to Jacobian blocks.
//! - [`Jacobian`] — block-sparse partials keyed by (output, input) pair.
//! - The [`ResponseSurface`] contract for fitted local surrogates, with the
//!   trust-region derivative policy surrogate consumers rely on.
//! - [`check::check_partials`] — finite-difference verification of analytic
//!   partials.
//!
//! Assembling disciplines into an optimization problem lives in
//! `splice-idf`; a complete worked aircraft model lives in `splice-ssbj`.

pub mod check;

mod discipline;
mod error;
mod jacobian;
mod scale;
mod surrogate;
mod variable;

pub use discipline::{Discipline, Normalized};
pub use error::{ConfigError, EvalError, SlotKind, SurfaceError};
pub use jacobian::Jacobian;
pub use scale::Scale;
pub use surrogate::{ResponseSurface, SurfaceSensitivity};
pub use variable::{ValueMap, VariableSpec};
