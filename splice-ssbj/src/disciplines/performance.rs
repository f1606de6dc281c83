//! Performance discipline: Breguet range of the cruise segment.
//!
//! ```text
//! R = 661·√θ · M · (L/D) / SFC · ln(WT / (WT − WF))
//! ```
//!
//! with the temperature ratio `θ` following the standard-atmosphere lapse
//! below the tropopause and frozen at `0.7519` above it.

use ndarray::Array2;
use splice_core::{ConfigError, Discipline, EvalError, Jacobian, Scale, ValueMap, VariableSpec};

use crate::{constants::TROPOPAUSE_FT, scales::Scales};

use super::vector_slot;

/// The performance discipline.
///
/// Inputs: the global design vector `z` (only altitude and Mach
/// participate) and the feed-forward couplings `SFC`, `fin`, `WT`, `WF`.
/// Output: the cruise range `R`.
pub struct Performance {
    inputs: Vec<VariableSpec>,
    outputs: Vec<VariableSpec>,
}

impl Performance {
    /// Builds the discipline against a scale table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale table is degenerate.
    pub fn new(scales: &Scales) -> Result<Self, ConfigError> {
        Ok(Self {
            inputs: vec![
                VariableSpec::vector("z", vec![1.0; 6], Scale::per_element(scales.z.to_vec()))?,
                VariableSpec::scalar("SFC", 1.0, scales.sfc)?,
                VariableSpec::scalar("fin", 1.0, scales.fin)?,
                VariableSpec::scalar("WT", 1.0, scales.wt)?,
                VariableSpec::scalar("WF", 1.0, scales.wf)?,
            ],
            outputs: vec![VariableSpec::scalar("R", 1.0, scales.range)?],
        })
    }
}

fn temperature_ratio(altitude: f64) -> (f64, f64) {
    if altitude < TROPOPAUSE_FT {
        (1.0 - 6.875e-6 * altitude, -6.875e-6)
    } else {
        (0.7519, 0.0)
    }
}

impl Discipline for Performance {
    fn name(&self) -> &str {
        "Performance"
    }

    fn inputs(&self) -> &[VariableSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[VariableSpec] {
        &self.outputs
    }

    fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let sfc = inputs.slot_scalar(self.name(), "SFC")?;
        let fin = inputs.slot_scalar(self.name(), "fin")?;
        let total_weight = inputs.slot_scalar(self.name(), "WT")?;
        let fuel_weight = inputs.slot_scalar(self.name(), "WF")?;
        let (altitude, mach) = (z[1], z[2]);

        let (theta, _) = temperature_ratio(altitude);
        // A non-positive dry weight makes the logarithm non-finite, which
        // the normalized boundary reports as a numeric-domain fault.
        let range = 661.0 * theta.sqrt() * mach * fin / sfc
            * (total_weight / (total_weight - fuel_weight)).ln();

        let mut outputs = ValueMap::new();
        outputs.insert_scalar("R", range);
        Ok(outputs)
    }

    fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let sfc = inputs.slot_scalar(self.name(), "SFC")?;
        let fin = inputs.slot_scalar(self.name(), "fin")?;
        let total_weight = inputs.slot_scalar(self.name(), "WT")?;
        let fuel_weight = inputs.slot_scalar(self.name(), "WF")?;
        let (altitude, mach) = (z[1], z[2]);

        let (theta, dtheta_dh) = temperature_ratio(altitude);
        let coefficient = 661.0 * theta.sqrt() * mach * fin / sfc;
        let log_term = (total_weight / (total_weight - fuel_weight)).ln();
        let range = coefficient * log_term;

        let dry = total_weight - fuel_weight;
        let dlog_dwt = 1.0 / total_weight - 1.0 / dry;
        let dlog_dwf = 1.0 / dry;

        let mut jacobian = Jacobian::new();
        let mut range_z = Array2::zeros((1, 6));
        range_z[[0, 1]] = range * dtheta_dh / (2.0 * theta);
        range_z[[0, 2]] = range / mach;
        jacobian.set("R", "z", range_z);
        jacobian.set_scalar("R", "SFC", -range / sfc);
        jacobian.set_scalar("R", "fin", range / fin);
        jacobian.set_scalar("R", "WT", coefficient * dlog_dwt);
        jacobian.set_scalar("R", "WF", coefficient * dlog_dwf);
        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use splice_core::{Normalized, check::check_partials};

    use super::*;

    fn discipline() -> Performance {
        Performance::new(&Scales::nominal()).unwrap()
    }

    #[test]
    fn range_follows_the_breguet_relation() {
        let performance = discipline();
        let mut inputs = ValueMap::new();
        inputs.insert("z", vec![0.05, 45_000.0, 1.6, 5.5, 55.0, 1000.0]);
        inputs.insert_scalar("SFC", 1.123_28);
        inputs.insert_scalar("fin", 4.093_062);
        inputs.insert_scalar("WT", 49_909.585_78);
        inputs.insert_scalar("WF", 7_306.202_62);

        let range = performance
            .compute(&inputs)
            .unwrap()
            .scalar("R")
            .unwrap();

        let expected = 661.0 * 0.7519_f64.sqrt() * 1.6 * 4.093_062 / 1.123_28
            * (49_909.585_78_f64 / (49_909.585_78 - 7_306.202_62)).ln();
        assert_relative_eq!(range, expected, max_relative = 1e-15);
    }

    #[test]
    fn non_positive_dry_weight_is_a_numeric_domain_fault() {
        let performance = discipline();
        let mut at = ValueMap::new();
        at.insert("z", vec![1.0; 6]);
        at.insert_scalar("SFC", 1.0);
        at.insert_scalar("fin", 1.0);
        at.insert_scalar("WT", 0.1);
        // Fuel heavier than the aircraft: ln of a negative ratio.
        at.insert_scalar("WF", 1.0);

        let err = Normalized::new(&performance).compute(&at).unwrap_err();
        assert!(matches!(err, EvalError::NonFinite { ref slot, .. } if slot == "R"));
    }

    #[test]
    fn analytic_partials_match_finite_differences() {
        let performance = discipline();

        let points = [
            ([1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 1.0, 0.8, 1.04, 1.0),
            ([1.0, 0.9, 1.1, 1.0, 1.0, 1.0], 1.05, 0.9, 1.1, 0.95),
            // Below the tropopause the lapse-rate branch is active.
            ([1.0, 0.7, 1.0, 1.0, 1.0, 1.0], 0.95, 1.0, 1.08, 1.05),
        ];
        for (z, sfc, fin, wt, wf) in points {
            let mut at = ValueMap::new();
            at.insert("z", z.to_vec());
            at.insert_scalar("SFC", sfc);
            at.insert_scalar("fin", fin);
            at.insert_scalar("WT", wt);
            at.insert_scalar("WF", wf);

            for check in check_partials(&performance, &at, 1e-7).unwrap() {
                assert!(
                    check.max_rel_error < 1e-4,
                    "({}, {}) at h={}: {:?}",
                    check.output,
                    check.input,
                    z[1],
                    check,
                );
            }
        }
    }
}
