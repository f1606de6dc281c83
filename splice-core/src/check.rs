//! Finite-difference verification of analytic partials.
//!
//! Disciplines promise exact Jacobians; this module checks that promise the
//! way the surrounding optimization tooling would, by comparing every
//! declared (output, input) block against a centered finite-difference
//! estimate in normalized space.

use ndarray::Array2;

use crate::{
    discipline::{Discipline, Normalized},
    error::EvalError,
    variable::ValueMap,
};

/// The comparison of one analytic Jacobian block against its
/// finite-difference estimate.
#[derive(Debug, Clone)]
pub struct PartialCheck {
    pub output: String,
    pub input: String,
    pub analytic: Array2<f64>,
    pub estimate: Array2<f64>,
    /// Largest absolute difference across the block.
    pub max_abs_error: f64,
    /// Largest elementwise relative difference, with agreement on
    /// near-zero entries counted as zero error.
    pub max_rel_error: f64,
}

/// Compares every (output, input) pair of `discipline` against a centered
/// finite difference with the given normalized `step`.
///
/// Each input element is perturbed one at a time, costing two normalized
/// evaluations per element. Pairs without an analytic block are compared
/// against zeros, so a forgotten partial shows up as error rather than
/// silently passing.
///
/// # Errors
///
/// Propagates any [`EvalError`] raised while evaluating the discipline.
pub fn check_partials(
    discipline: &dyn Discipline,
    at: &ValueMap,
    step: f64,
) -> Result<Vec<PartialCheck>, EvalError> {
    let model = Normalized::new(discipline);
    let analytic = model.jacobian(at)?;

    let mut checks = Vec::new();
    for out_spec in discipline.outputs() {
        for in_spec in discipline.inputs() {
            let mut estimate = Array2::zeros((out_spec.len(), in_spec.len()));
            for col in 0..in_spec.len() {
                let plus = model.compute(&perturbed(at, in_spec.name(), col, step)?)?;
                let minus = model.compute(&perturbed(at, in_spec.name(), col, -step)?)?;
                let above = plus.slot(discipline.name(), out_spec.name())?;
                let below = minus.slot(discipline.name(), out_spec.name())?;
                for row in 0..out_spec.len() {
                    estimate[[row, col]] = (above[row] - below[row]) / (2.0 * step);
                }
            }

            let analytic_block = analytic
                .block(out_spec.name(), in_spec.name())
                .cloned()
                .unwrap_or_else(|| Array2::zeros((out_spec.len(), in_spec.len())));

            let mut max_abs_error = 0.0_f64;
            let mut max_rel_error = 0.0_f64;
            for (a, e) in analytic_block.iter().zip(estimate.iter()) {
                let abs = (a - e).abs();
                max_abs_error = max_abs_error.max(abs);
                let denom = a.abs().max(e.abs());
                if denom > 1e-12 {
                    max_rel_error = max_rel_error.max(abs / denom);
                }
            }

            checks.push(PartialCheck {
                output: out_spec.name().to_string(),
                input: in_spec.name().to_string(),
                analytic: analytic_block,
                estimate,
                max_abs_error,
                max_rel_error,
            });
        }
    }
    Ok(checks)
}

fn perturbed(at: &ValueMap, input: &str, element: usize, step: f64) -> Result<ValueMap, EvalError> {
    let mut values = at.clone();
    let value = values
        .get_mut(input)
        .ok_or_else(|| EvalError::MissingSlot {
            owner: "finite-difference check".to_string(),
            slot: input.to_string(),
        })?;
    value[element] += step;
    Ok(values)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use crate::{ConfigError, Jacobian, Scale, VariableSpec};

    use super::*;

    /// A deliberately wrong partial for `skew` next to a correct one for
    /// `lift`, to show the check flags only the bad block.
    struct HalfWrong {
        inputs: Vec<VariableSpec>,
        outputs: Vec<VariableSpec>,
    }

    impl HalfWrong {
        fn new() -> Result<Self, ConfigError> {
            Ok(Self {
                inputs: vec![VariableSpec::vector(
                    "x",
                    vec![1.0, 1.0],
                    Scale::per_element(vec![2.0, 3.0]),
                )?],
                outputs: vec![
                    VariableSpec::scalar("lift", 1.0, 4.0)?,
                    VariableSpec::scalar("skew", 1.0, 1.0)?,
                ],
            })
        }
    }

    impl Discipline for HalfWrong {
        fn name(&self) -> &str {
            "HalfWrong"
        }

        fn inputs(&self) -> &[VariableSpec] {
            &self.inputs
        }

        fn outputs(&self) -> &[VariableSpec] {
            &self.outputs
        }

        fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
            let x = inputs.slot(self.name(), "x")?;
            let mut outputs = ValueMap::new();
            outputs.insert_scalar("lift", x[0] * x[0] + x[1]);
            outputs.insert_scalar("skew", x[0] * x[1]);
            Ok(outputs)
        }

        fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
            let x = inputs.slot(self.name(), "x")?;
            let mut jacobian = Jacobian::new();
            jacobian.set("lift", "x", array![[2.0 * x[0], 1.0]]);
            // Deliberately wrong: d(skew)/dx0 is x[1], not 2*x[1].
            jacobian.set("skew", "x", array![[2.0 * x[1], x[0]]]);
            Ok(jacobian)
        }
    }

    #[test]
    fn flags_only_the_incorrect_block() {
        let model = HalfWrong::new().unwrap();
        let mut at = ValueMap::new();
        at.insert("x", vec![1.1, 0.9]);

        let checks = check_partials(&model, &at, 1e-6).unwrap();

        let lift = checks.iter().find(|c| c.output == "lift").unwrap();
        assert!(lift.max_rel_error < 1e-6, "lift block: {lift:?}");

        let skew = checks.iter().find(|c| c.output == "skew").unwrap();
        assert!(skew.max_rel_error > 0.1, "skew block: {skew:?}");
    }
}
