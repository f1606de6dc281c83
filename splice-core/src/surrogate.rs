use ndarray::{Array1, Array2};

use crate::error::SurfaceError;

/// A fitted local approximation of a more expensive response, evaluated near
/// a stored reference point within a trust region.
///
/// Surfaces are selected by label. Reference points and trust-region
/// half-widths are immutable per label once the surface set is built, so
/// repeated queries are deterministic.
///
/// The value query returns the scalar approximation. The sensitivity query
/// returns the building blocks a consumer needs to chain its own partials
/// through the surface; see [`SurfaceSensitivity`].
pub trait ResponseSurface: Send + Sync {
    /// Evaluates the approximation at a physical coordinate vector.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] for an unknown label or a coordinate count
    /// that does not match the surface's dimension.
    fn value(&self, label: &str, point: &[f64]) -> Result<f64, SurfaceError>;

    /// Evaluates the chain-rule building blocks at `point`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ResponseSurface::value`].
    fn sensitivity(&self, label: &str, point: &[f64]) -> Result<SurfaceSensitivity, SurfaceError>;
}

/// The derivative-mode payload of a [`ResponseSurface`] query.
///
/// `shifted` holds the trust-region-normalized coordinates (clamped into the
/// band), `linear` and `quadratic` the polynomial coefficients at the
/// expansion point, and `shift_gradient` the derivative of the shift
/// transform with respect to each raw coordinate.
///
/// The shift gradient encodes the trust-region policy: it is
/// `1 / reference[d]` only while `raw[d] / reference[d]` lies within
/// `[0.75, 1.25]` inclusive, and exactly zero outside that band. The
/// evaluated value clamps the normalized coordinate into the band, so the
/// surface really is locally flat out there and the zero is not an
/// approximation. The policy makes the Jacobian discontinuous at the band
/// edge while the value stays continuous; downstream optimizers must
/// tolerate the jump.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSensitivity {
    /// Trust-region-normalized coordinates, clamped into the band.
    pub shifted: Array1<f64>,
    /// First-order coefficients at the expansion point.
    pub linear: Array1<f64>,
    /// Second-order coefficient matrix at the expansion point.
    pub quadratic: Array2<f64>,
    /// `d(shifted) / d(raw)` per dimension; zero outside the trust band.
    pub shift_gradient: Array1<f64>,
}

impl SurfaceSensitivity {
    /// The partial of the surface value with respect to raw dimension `dim`.
    ///
    /// Chains the polynomial gradient at the shifted point through the shift
    /// transform:
    ///
    /// ```text
    /// ∂f/∂x_d = (linear[d] + quadratic[d,d]·s[d] + Σ_{j≠d} quadratic[j,d]·s[j])
    ///           · shift_gradient[d]
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `dim` is out of bounds.
    #[must_use]
    pub fn partial(&self, dim: usize) -> f64 {
        let s = &self.shifted;
        let mut gradient = self.linear[dim] + self.quadratic[[dim, dim]] * s[dim];
        for j in 0..s.len() {
            if j != dim {
                gradient += self.quadratic[[j, dim]] * s[j];
            }
        }
        gradient * self.shift_gradient[dim]
    }

    /// Number of coordinate dimensions.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.shifted.len()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn partial_chains_through_the_shift_gradient() {
        let sensitivity = SurfaceSensitivity {
            shifted: array![0.1, -0.2],
            linear: array![2.0, 3.0],
            quadratic: array![[4.0, 0.5], [0.5, 6.0]],
            shift_gradient: array![10.0, 0.0],
        };

        // (2 + 4*0.1 + 0.5*(-0.2)) * 10
        assert_relative_eq!(sensitivity.partial(0), 23.0);
        // Outside the band the gradient is exactly zero.
        assert_eq!(sensitivity.partial(1), 0.0);
    }
}
