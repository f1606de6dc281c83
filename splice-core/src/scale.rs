use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed multiplicative factors converting between the optimizer's
/// normalized space and a model's physical units.
///
/// `physical = normalized * factor` and `normalized = physical / factor`,
/// element by element. Factors are set when a problem is built and never
/// change afterwards; the normalized values are the only state an optimizer
/// mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scale {
    /// One factor applied to every element.
    Uniform(f64),
    /// One factor per element.
    PerElement(Array1<f64>),
}

impl Scale {
    /// A per-element scale from anything convertible to a 1-D array.
    pub fn per_element(factors: impl Into<Array1<f64>>) -> Self {
        Self::PerElement(factors.into())
    }

    /// Checks that every factor is finite and nonzero and, for a per-element
    /// scale, that the factor count matches the variable's length.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming `variable` when validation fails.
    pub fn validate(&self, variable: &str, len: usize) -> Result<(), ConfigError> {
        if let Self::PerElement(factors) = self {
            if factors.len() != len {
                return Err(ConfigError::ScaleShape {
                    variable: variable.to_string(),
                    scale_len: factors.len(),
                    value_len: len,
                });
            }
        }
        for &factor in self.factors() {
            if !factor.is_finite() || factor == 0.0 {
                return Err(ConfigError::InvalidScaleFactor {
                    variable: variable.to_string(),
                    factor,
                });
            }
        }
        Ok(())
    }

    /// The factor applied to element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for a per-element scale.
    #[must_use]
    pub fn factor(&self, index: usize) -> f64 {
        match self {
            Self::Uniform(factor) => *factor,
            Self::PerElement(factors) => factors[index],
        }
    }

    /// Maps a normalized value into physical units.
    #[must_use]
    pub fn to_physical(&self, normalized: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Uniform(factor) => normalized * *factor,
            Self::PerElement(factors) => normalized * factors,
        }
    }

    /// Maps a physical value back into normalized space.
    #[must_use]
    pub fn to_normalized(&self, physical: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Uniform(factor) => physical / *factor,
            Self::PerElement(factors) => physical / factors,
        }
    }

    fn factors(&self) -> &[f64] {
        match self {
            Self::Uniform(factor) => std::slice::from_ref(factor),
            Self::PerElement(factors) => factors.as_slice().unwrap_or(&[]),
        }
    }
}
