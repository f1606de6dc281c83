//! Finite-difference verification of the assembled total derivatives.
//!
//! The assembly chains each discipline's analytic Jacobian through the
//! explicit edge list; this test checks the whole chain at once against
//! centered differences on the flattened independent vector.

use splice_ssbj::{Scales, idf_assembly};

const STEP: f64 = 1e-6;
const REL_TOL: f64 = 1e-4;
const ABS_TOL: f64 = 1e-7;

fn agree(analytic: f64, estimate: f64) -> bool {
    let abs = (analytic - estimate).abs();
    abs <= ABS_TOL || abs <= REL_TOL * analytic.abs().max(estimate.abs())
}

#[test]
fn assembled_jacobian_matches_finite_differences() {
    let assembly = idf_assembly(&Scales::nominal()).unwrap();
    let layout = assembly.layout().clone();
    let x = assembly.defaults();
    let flat = layout.flatten(&x).unwrap();

    let jacobian = assembly.jacobian(&x).unwrap();

    for col in 0..layout.len() {
        let mut above = flat.clone();
        let mut below = flat.clone();
        above[col] += STEP;
        below[col] -= STEP;
        let high = assembly.evaluate(&layout.unflatten(&above)).unwrap();
        let low = assembly.evaluate(&layout.unflatten(&below)).unwrap();

        let objective_estimate = (high.objective - low.objective) / (2.0 * STEP);
        assert!(
            agree(jacobian.objective[col], objective_estimate),
            "objective, column {col}: analytic {} vs estimate {objective_estimate}",
            jacobian.objective[col],
        );

        for (name, _) in &high.consistency {
            let estimate = (high.consistency_residual(name).unwrap()
                - low.consistency_residual(name).unwrap())
                / (2.0 * STEP);
            let analytic = jacobian.consistency_row(name).unwrap()[col];
            assert!(
                agree(analytic, estimate),
                "consistency `{name}`, column {col}: analytic {analytic} vs estimate {estimate}",
            );
        }

        for (name, _) in &high.inequalities {
            let estimate = (high.inequality(name).unwrap() - low.inequality(name).unwrap())
                / (2.0 * STEP);
            let analytic = jacobian.inequality_row(name).unwrap()[col];
            assert!(
                agree(analytic, estimate),
                "inequality `{name}`, column {col}: analytic {analytic} vs estimate {estimate}",
            );
        }
    }
}
