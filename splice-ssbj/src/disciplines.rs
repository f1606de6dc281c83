//! The four coupled disciplines of the aircraft model.
//!
//! Each discipline computes in physical units and hands back analytic
//! physical partials; scaling to and from the optimizer's normalized space
//! happens at the [`splice_core::Normalized`] boundary.

pub mod aerodynamics;
pub mod performance;
pub mod propulsion;
pub mod structure;

pub use aerodynamics::Aerodynamics;
pub use performance::Performance;
pub use propulsion::Propulsion;
pub use structure::Structure;

use ndarray::Array1;
use splice_core::{EvalError, ValueMap};

/// Shape-checked lookup of a fixed-length vector slot.
fn vector_slot<'m>(
    values: &'m ValueMap,
    owner: &str,
    name: &str,
    len: usize,
) -> Result<&'m Array1<f64>, EvalError> {
    let value = values.slot(owner, name)?;
    if value.len() != len {
        return Err(EvalError::SlotShape {
            owner: owner.to_string(),
            slot: name.to_string(),
            expected: len,
            actual: value.len(),
        });
    }
    Ok(value)
}
