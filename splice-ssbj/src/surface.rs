//! Fitted quadratic response surfaces with a trust-region derivative clamp.
//!
//! Each labeled surface approximates one scalar response near a stored
//! reference point. Coordinates are normalized by their reference value and
//! clamped into the `[0.75, 1.25]` band, then shifted so the reference sits
//! at zero:
//!
//! ```text
//! s_d = clamp(raw_d / reference_d, 0.75, 1.25) - 1
//! value = 1 + linear·s + ½ sᵀ·Q·s
//! ```
//!
//! The per-dimension quadratic sections are fixed at construction by a
//! [`SectionShape`] that pins the section through three points at
//! `-half_width`, `0`, and `+half_width`. Because the clamp saturates the
//! normalized coordinate, the surface is exactly flat outside the band; the
//! sensitivity payload reports a zero shift gradient there and `1/reference`
//! inside, which is the derivative consumers chain through.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use splice_core::{ConfigError, ResponseSurface, SurfaceError, SurfaceSensitivity};

/// Lower edge of the trust band on the reference-normalized coordinate.
const BAND_LOW: f64 = 0.75;
/// Upper edge of the trust band.
const BAND_HIGH: f64 = 1.25;
/// Endpoint offset step used by every section shape.
const STEP: f64 = 0.1;

/// Shape of one 1-D quadratic section, expressed as the value offsets at the
/// ends of the fitting interval; the midpoint is always pinned to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionShape {
    /// Rises by half a step on each side of the reference.
    GentleRise,
    /// Rises twice as fast above the reference as below it.
    SteepRise,
    /// Falls by half a step on each side of the reference.
    GentleFall,
    /// Falls twice as fast above the reference as below it.
    SteepFall,
    /// Symmetric bowl with its minimum at the reference.
    Bowl,
}

impl SectionShape {
    /// Section values at `-half_width` and `+half_width`.
    fn endpoints(self) -> (f64, f64) {
        match self {
            Self::GentleRise => (1.0 - 0.5 * STEP, 1.0 + 0.5 * STEP),
            Self::SteepRise => (1.0 - 0.5 * STEP, 1.0 + STEP),
            Self::GentleFall => (1.0 + 0.5 * STEP, 1.0 - 0.5 * STEP),
            Self::SteepFall => (1.0 + 0.5 * STEP, 1.0 - STEP),
            Self::Bowl => {
                let end = 1.0 + (0.5 * STEP).powi(2);
                (end, end)
            }
        }
    }
}

/// One dimension of a fitted surface: the immutable reference coordinate,
/// the trust-region half-width in shifted space, and the section shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub reference: f64,
    pub half_width: f64,
    pub shape: SectionShape,
}

impl Section {
    #[must_use]
    pub fn new(reference: f64, half_width: f64, shape: SectionShape) -> Self {
        Self {
            reference,
            half_width,
            shape,
        }
    }

    /// Linear coefficient of the fitted section.
    fn linear(self) -> f64 {
        let (lo, hi) = self.shape.endpoints();
        (hi - lo) / (2.0 * self.half_width)
    }

    /// Diagonal quadratic coefficient of the fitted section.
    fn curvature(self) -> f64 {
        let (lo, hi) = self.shape.endpoints();
        (hi + lo - 2.0) / (self.half_width * self.half_width)
    }
}

/// A set of labeled quadratic response surfaces.
///
/// Built once per discipline with every label it will query; tables are
/// immutable afterwards, so repeated queries are deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolynomialSurface {
    tables: Vec<(String, Vec<Section>)>,
}

impl PolynomialSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a labeled surface.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a duplicate label, an empty dimension
    /// list, a non-finite or zero reference, or a non-positive half-width.
    pub fn with_surface(
        mut self,
        label: impl Into<String>,
        sections: Vec<Section>,
    ) -> Result<Self, ConfigError> {
        let label = label.into();
        if self.tables.iter().any(|(l, _)| *l == label) {
            return Err(ConfigError::DuplicateSurface { label });
        }
        if sections.is_empty() {
            return Err(ConfigError::EmptySurface { label });
        }
        for (dim, section) in sections.iter().enumerate() {
            let reference_ok = section.reference.is_finite() && section.reference != 0.0;
            let width_ok = section.half_width.is_finite() && section.half_width > 0.0;
            if !reference_ok || !width_ok {
                return Err(ConfigError::InvalidSurfaceSection { label, dim });
            }
        }
        self.tables.push((label, sections));
        Ok(self)
    }

    fn table(&self, label: &str, dims: usize) -> Result<&[Section], SurfaceError> {
        let sections = self
            .tables
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| s.as_slice())
            .ok_or_else(|| SurfaceError::UnknownLabel {
                label: label.to_string(),
            })?;
        if sections.len() != dims {
            return Err(SurfaceError::DimensionMismatch {
                label: label.to_string(),
                expected: sections.len(),
                actual: dims,
            });
        }
        Ok(sections)
    }

    fn expand(sections: &[Section], point: &[f64]) -> SurfaceSensitivity {
        let dims = sections.len();
        let mut shifted = Array1::zeros(dims);
        let mut linear = Array1::zeros(dims);
        let mut quadratic = Array2::zeros((dims, dims));
        let mut shift_gradient = Array1::zeros(dims);

        for (d, section) in sections.iter().enumerate() {
            let ratio = point[d] / section.reference;
            shifted[d] = ratio.clamp(BAND_LOW, BAND_HIGH) - 1.0;
            shift_gradient[d] = if (BAND_LOW..=BAND_HIGH).contains(&ratio) {
                1.0 / section.reference
            } else {
                0.0
            };
            linear[d] = section.linear();
            quadratic[[d, d]] = section.curvature();
        }
        for i in 0..dims {
            for j in (i + 1)..dims {
                let cross = quadratic[[i, i]] * quadratic[[j, j]];
                quadratic[[i, j]] = cross;
                quadratic[[j, i]] = cross;
            }
        }

        SurfaceSensitivity {
            shifted,
            linear,
            quadratic,
            shift_gradient,
        }
    }
}

impl ResponseSurface for PolynomialSurface {
    fn value(&self, label: &str, point: &[f64]) -> Result<f64, SurfaceError> {
        let sections = self.table(label, point.len())?;
        let parts = Self::expand(sections, point);
        let s = &parts.shifted;
        let quadratic_form = s.dot(&parts.quadratic.dot(s));
        Ok(1.0 + parts.linear.dot(s) + 0.5 * quadratic_form)
    }

    fn sensitivity(&self, label: &str, point: &[f64]) -> Result<SurfaceSensitivity, SurfaceError> {
        let sections = self.table(label, point.len())?;
        Ok(Self::expand(sections, point))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn temperature_surface() -> PolynomialSurface {
        PolynomialSurface::new()
            .with_surface(
                "temp",
                vec![
                    Section::new(1.6, 0.25, SectionShape::SteepRise),
                    Section::new(45_000.0, 0.25, SectionShape::SteepFall),
                    Section::new(0.5, 0.25, SectionShape::SteepRise),
                ],
            )
            .unwrap()
    }

    #[test]
    fn value_at_the_reference_point_is_one() {
        let surface = temperature_surface();
        let value = surface.value("temp", &[1.6, 45_000.0, 0.5]).unwrap();
        assert_relative_eq!(value, 1.0);
    }

    #[test]
    fn sensitivity_matches_finite_differences_inside_the_band() {
        let surface = temperature_surface();
        let point = [1.55, 46_000.0, 0.52];
        let sensitivity = surface.sensitivity("temp", &point).unwrap();

        let h = [1e-6, 1e-2, 1e-7];
        for d in 0..3 {
            let mut above = point;
            let mut below = point;
            above[d] += h[d];
            below[d] -= h[d];
            let estimate = (surface.value("temp", &above).unwrap()
                - surface.value("temp", &below).unwrap())
                / (2.0 * h[d]);
            assert_relative_eq!(sensitivity.partial(d), estimate, max_relative = 1e-6);
        }
    }

    #[test]
    fn clamp_zeroes_the_gradient_and_flattens_the_value() {
        let surface = temperature_surface();

        // Dimension 2 (reference 0.5): ratio 1.3 sits beyond the band.
        let outside = surface.sensitivity("temp", &[1.6, 45_000.0, 0.65]).unwrap();
        assert_eq!(outside.shift_gradient[2], 0.0);
        assert_eq!(outside.partial(2), 0.0);

        // The evaluated value is flat past the edge and continuous at it.
        let at_edge = surface.value("temp", &[1.6, 45_000.0, 0.625]).unwrap();
        let past_edge = surface.value("temp", &[1.6, 45_000.0, 0.7]).unwrap();
        assert_relative_eq!(at_edge, past_edge);

        // The band is inclusive: exactly at 0.75 and 1.25 the gradient is
        // still 1/reference.
        for ratio in [0.75, 1.25] {
            let edge = surface
                .sensitivity("temp", &[1.6, 45_000.0, 0.5 * ratio])
                .unwrap();
            assert_relative_eq!(edge.shift_gradient[2], 1.0 / 0.5);
        }
        let beyond = surface
            .sensitivity("temp", &[1.6, 45_000.0, 0.5 * 1.2500001])
            .unwrap();
        assert_eq!(beyond.shift_gradient[2], 0.0);
    }

    #[test]
    fn lookup_failures_are_reported() {
        let surface = temperature_surface();

        assert!(matches!(
            surface.value("lift", &[1.0]),
            Err(SurfaceError::UnknownLabel { .. })
        ));
        assert!(matches!(
            surface.value("temp", &[1.0, 2.0]),
            Err(SurfaceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn construction_rejects_degenerate_sections() {
        let duplicate = PolynomialSurface::new()
            .with_surface("twist", vec![Section::new(1.0, 0.25, SectionShape::Bowl)])
            .unwrap()
            .with_surface("twist", vec![Section::new(1.0, 0.25, SectionShape::Bowl)]);
        assert!(matches!(
            duplicate,
            Err(ConfigError::DuplicateSurface { .. })
        ));

        let zero_reference = PolynomialSurface::new()
            .with_surface("twist", vec![Section::new(0.0, 0.25, SectionShape::Bowl)]);
        assert!(matches!(
            zero_reference,
            Err(ConfigError::InvalidSurfaceSection { .. })
        ));

        let empty = PolynomialSurface::new().with_surface("twist", vec![]);
        assert!(matches!(empty, Err(ConfigError::EmptySurface { .. })));
    }
}
