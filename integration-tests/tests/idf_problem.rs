//! End-to-end behavior of the assembled IDF aircraft problem.

use approx::assert_relative_eq;
use splice_core::EvalError;
use splice_ssbj::{Scales, idf_assembly};

#[test]
fn evaluation_is_bit_identical_across_repeats() {
    let assembly = idf_assembly(&Scales::nominal()).unwrap();
    let x = assembly.defaults();

    let first = assembly.evaluate(&x).unwrap();
    let second = assembly.evaluate(&x).unwrap();
    assert_eq!(first, second);

    let jacobian_a = assembly.jacobian(&x).unwrap();
    let jacobian_b = assembly.jacobian(&x).unwrap();
    assert_eq!(jacobian_a, jacobian_b);
}

#[test]
fn consistency_residuals_are_quadratic_in_the_assumed_copy() {
    let assembly = idf_assembly(&Scales::nominal()).unwrap();
    let mut x = assembly.defaults();

    // Pin the drag copy to whatever aerodynamics currently produces, so the
    // residual bottoms out at zero there.
    let produced = assembly
        .evaluate(&x)
        .unwrap()
        .outputs_of("Aerodynamics")
        .unwrap()
        .scalar("D")
        .unwrap();

    x.insert_scalar("D", produced);
    let matched = assembly.evaluate(&x).unwrap();
    // Propulsion consumes the D copy, so moving it shifts the propulsion
    // outputs but not the aerodynamics drag; the residual at the matched
    // point is exactly zero.
    assert_relative_eq!(matched.consistency_residual("D").unwrap(), 0.0);

    for delta in [-0.2, -0.05, 0.1, 0.3] {
        x.insert_scalar("D", produced + delta);
        let residual = assembly
            .evaluate(&x)
            .unwrap()
            .consistency_residual("D")
            .unwrap();
        assert!(residual >= 0.0);
        assert_relative_eq!(residual, delta * delta, max_relative = 1e-10);
    }
}

#[test]
fn feasible_region_reports_nonpositive_inequalities() {
    let assembly = idf_assembly(&Scales::nominal()).unwrap();
    let evaluation = assembly.evaluate(&assembly.defaults()).unwrap();

    // The starting guess need not be feasible, but every constraint is
    // present and finite, and the twist bounds bracket a nonempty band.
    let upper = evaluation.inequality("theta_upper").unwrap();
    let lower = evaluation.inequality("theta_lower").unwrap();
    assert!(upper.is_finite() && lower.is_finite());
    // theta_upper + theta_lower = (Θ − 1.04) + (0.96 − Θ) = −0.08.
    assert_relative_eq!(upper + lower, -0.08, max_relative = 1e-12);
}

#[test]
fn zero_throttle_propagates_as_a_numeric_domain_fault() {
    let assembly = idf_assembly(&Scales::nominal()).unwrap();
    let mut x = assembly.defaults();
    x.insert_scalar("x_pro", 0.0);

    let err = assembly.evaluate(&x).unwrap_err();
    assert!(matches!(err, EvalError::NonFinite { ref owner, .. } if owner == "Propulsion"));
}

#[test]
fn scale_table_round_trips_through_json_into_an_identical_problem() {
    let scales = Scales::nominal();
    let json = serde_json::to_string(&scales).unwrap();
    let reloaded: Scales = serde_json::from_str(&json).unwrap();

    let original = idf_assembly(&scales).unwrap();
    let rebuilt = idf_assembly(&reloaded).unwrap();

    let x = original.defaults();
    assert_eq!(rebuilt.defaults(), x);
    assert_eq!(
        original.evaluate(&x).unwrap(),
        rebuilt.evaluate(&x).unwrap()
    );
}
