//! The full IDF optimization problem for the aircraft model.

use splice_core::{ConfigError, Scale, VariableSpec};
use splice_idf::{Assembly, AssemblyBuilder, Bound, Goal, ValueRef};

use crate::{
    disciplines::{Aerodynamics, Performance, Propulsion, Structure},
    scales::Scales,
};

/// Builds the Individual-Discipline-Feasible problem: independent design
/// and coupling variables, the four disciplines, the explicit wiring, six
/// consistency constraints, the local feasibility limits, and the range
/// objective.
///
/// The cyclic couplings between structure, aerodynamics, and propulsion
/// (`L`, `WE`, `WT`, `Theta`, `ESF`, `D`) each get an independent assumed
/// copy plus a consistency constraint. Performance only consumes upstream
/// results, so its inputs are fed straight from the producing disciplines.
///
/// Initial values are fixed starting guesses for the optimizer, not a
/// consistent coupled state; driving the consistency residuals to zero is
/// the optimizer's job.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the scale table is degenerate.
pub fn idf_assembly(scales: &Scales) -> Result<Assembly, ConfigError> {
    let assembly = AssemblyBuilder::new()
        // Global and local design variables.
        .variable(VariableSpec::vector(
            "z",
            vec![1.2, 1.0, 1.0, 1.0, 1.0, 1.0],
            Scale::per_element(scales.z.to_vec()),
        )?)
        .variable(VariableSpec::vector(
            "x_str",
            vec![1.0, 1.0],
            Scale::per_element(scales.x_str.to_vec()),
        )?)
        .variable(VariableSpec::scalar("x_aer", 1.0, scales.x_aer)?)
        .variable(VariableSpec::scalar("x_pro", 1.0, scales.x_pro)?)
        // Assumed copies of the cyclic coupling quantities.
        .variable(VariableSpec::scalar("L", 0.888, scales.l)?)
        .variable(VariableSpec::scalar("WE", 1.490, scales.we)?)
        .variable(VariableSpec::scalar("WT", 0.888, scales.wt)?)
        .variable(VariableSpec::scalar("Theta", 0.997, scales.theta)?)
        .variable(VariableSpec::scalar("ESF", 1.463, scales.esf)?)
        .variable(VariableSpec::scalar("D", 0.457, scales.d)?)
        .discipline(Structure::new(scales)?)
        .discipline(Aerodynamics::new(scales)?)
        .discipline(Propulsion::new(scales)?)
        .discipline(Performance::new(scales)?)
        // The shared design vector reaches every discipline.
        .route("z", "Structure", "z")
        .route("z", "Aerodynamics", "z")
        .route("z", "Propulsion", "z")
        .route("z", "Performance", "z")
        // Local design variables.
        .route("x_str", "Structure", "x_str")
        .route("x_aer", "Aerodynamics", "x_aer")
        .route("x_pro", "Propulsion", "x_pro")
        // Assumed coupling copies; consumers never read producer outputs.
        .route("L", "Structure", "L")
        .route("WE", "Structure", "WE")
        .route("WT", "Aerodynamics", "WT")
        .route("Theta", "Aerodynamics", "Theta")
        .route("ESF", "Aerodynamics", "ESF")
        .route("D", "Propulsion", "D")
        // Performance sits downstream of everything; feed it directly.
        .feed("Propulsion", "SFC", "Performance", "SFC")
        .feed("Aerodynamics", "fin", "Performance", "fin")
        .feed("Structure", "WT", "Performance", "WT")
        .feed("Structure", "WF", "Performance", "WF")
        // Consistency: every assumed copy must match its producer.
        .coupling("WT", "Structure", "WT")
        .coupling("Theta", "Structure", "Theta")
        .coupling("L", "Aerodynamics", "L")
        .coupling("D", "Aerodynamics", "D")
        .coupling("ESF", "Propulsion", "ESF")
        .coupling("WE", "Propulsion", "WE")
        // Local feasibility limits on physical values.
        .inequality(
            "theta_upper",
            ValueRef::variable("Theta"),
            Bound::Upper(1.04),
        )
        .inequality(
            "theta_lower",
            ValueRef::variable("Theta"),
            Bound::Lower(0.96),
        )
        .inequality(
            "sigma1",
            ValueRef::output_element("Structure", "sigma", 0),
            Bound::Upper(1.9),
        )
        .inequality(
            "sigma2",
            ValueRef::output_element("Structure", "sigma", 1),
            Bound::Upper(1.9),
        )
        .inequality(
            "sigma3",
            ValueRef::output_element("Structure", "sigma", 2),
            Bound::Upper(1.9),
        )
        .inequality(
            "sigma4",
            ValueRef::output_element("Structure", "sigma", 3),
            Bound::Upper(1.9),
        )
        .inequality(
            "sigma5",
            ValueRef::output_element("Structure", "sigma", 4),
            Bound::Upper(1.9),
        )
        .inequality(
            "dpdx",
            ValueRef::output("Aerodynamics", "dpdx"),
            Bound::Upper(1.04),
        )
        .inequality("esf", ValueRef::variable("ESF"), Bound::Upper(1.5))
        .inequality(
            "temp",
            ValueRef::output("Propulsion", "Temp"),
            Bound::Upper(1.0),
        )
        .inequality(
            "dt",
            ValueRef::output("Propulsion", "DT"),
            Bound::Upper(0.0),
        )
        // Range is maximized; the assembly reports its negation.
        .objective(ValueRef::output("Performance", "R"), Goal::Maximize)
        .build()?;
    Ok(assembly)
}
