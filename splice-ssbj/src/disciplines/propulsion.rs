//! Propulsion discipline: engine sizing from throttle setting and drag.
//!
//! The engine model works off the nondimensional thrust
//! `Tbar = |x_pro| · 16168.6 lb`. Required engine scale follows from the
//! drag each of the three engines must overcome, specific fuel consumption
//! and the throttle temperature limit come from closed-form fits in
//! altitude, Mach, and `Tbar`, and the engine temperature ratio comes from a
//! fitted response surface in `(M, h, |x_pro|)`.

use ndarray::Array2;
use splice_core::{
    ConfigError, Discipline, EvalError, Jacobian, ResponseSurface, Scale, ValueMap, VariableSpec,
};

use crate::{
    constants::{THRUST_PER_UNIT, WBE},
    scales::Scales,
    surface::{PolynomialSurface, Section, SectionShape},
};

use super::vector_slot;

/// Quantities shared between the value and derivative paths.
struct EngineState {
    tbar: f64,
    esf: f64,
    tuabar: f64,
}

fn engine_state(thrust: f64, drag: f64, altitude: f64, mach: f64) -> EngineState {
    let tbar = thrust.abs() * THRUST_PER_UNIT;
    // Drag is shared by three engines.
    let esf = (drag / 3.0) / tbar;
    let tuabar = 11_484.0 + 10_856.0 * mach - 0.50802 * altitude + 3200.2 * mach * mach
        - 0.29326 * mach * altitude
        + 6.8572e-6 * altitude * altitude;
    EngineState { tbar, esf, tuabar }
}

fn specific_fuel_consumption(tbar: f64, altitude: f64, mach: f64) -> f64 {
    1.1324 + 1.5344 * mach - 3.2956e-5 * altitude - 1.6379e-4 * tbar - 0.31623 * mach * mach
        + 8.2138e-6 * mach * altitude
        - 10.496e-5 * tbar * mach
        - 8.574e-11 * altitude * altitude
        + 3.8042e-9 * tbar * altitude
        + 1.06e-8 * tbar * tbar
}

/// The propulsion discipline.
///
/// Inputs: the global design vector `z` (only altitude `z[1]` and Mach
/// `z[2]` participate), the throttle setting `x_pro`, and the drag coupling
/// `D`. Outputs: engine temperature ratio `Temp`, engine scale factor
/// `ESF`, specific fuel consumption `SFC`, engine weight `WE`, and the
/// throttle temperature margin `DT`.
pub struct Propulsion {
    inputs: Vec<VariableSpec>,
    outputs: Vec<VariableSpec>,
    surface: PolynomialSurface,
}

impl Propulsion {
    /// Builds the discipline against a scale table; the temperature surface
    /// is anchored at the nominal physical point the table describes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale table is degenerate.
    pub fn new(scales: &Scales) -> Result<Self, ConfigError> {
        let surface = PolynomialSurface::new().with_surface(
            "temp",
            vec![
                Section::new(scales.z[2], 0.25, SectionShape::SteepRise),
                Section::new(scales.z[1], 0.25, SectionShape::SteepFall),
                Section::new(scales.x_pro, 0.25, SectionShape::SteepRise),
            ],
        )?;
        Ok(Self {
            inputs: vec![
                VariableSpec::vector("z", vec![1.0; 6], Scale::per_element(scales.z.to_vec()))?,
                VariableSpec::scalar("x_pro", 1.0, scales.x_pro)?,
                VariableSpec::scalar("D", 1.0, scales.d)?,
            ],
            outputs: vec![
                VariableSpec::scalar("Temp", 1.0, scales.temp)?,
                VariableSpec::scalar("ESF", 1.0, scales.esf)?,
                VariableSpec::scalar("SFC", 1.0, scales.sfc)?,
                VariableSpec::scalar("WE", 1.0, scales.we)?,
                VariableSpec::scalar("DT", 1.0, scales.dt)?,
            ],
            surface,
        })
    }
}

impl Discipline for Propulsion {
    fn name(&self) -> &str {
        "Propulsion"
    }

    fn inputs(&self) -> &[VariableSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[VariableSpec] {
        &self.outputs
    }

    fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let thrust = inputs.slot_scalar(self.name(), "x_pro")?;
        let drag = inputs.slot_scalar(self.name(), "D")?;
        let (altitude, mach) = (z[1], z[2]);

        let state = engine_state(thrust, drag, altitude, mach);
        let temp = self
            .surface
            .value("temp", &[mach, altitude, thrust.abs()])?;
        let sfc = specific_fuel_consumption(state.tbar, altitude, mach);
        let engine_weight = 3.0 * WBE * state.esf.abs().powf(1.05);
        let margin = state.tbar / state.tuabar - 1.0;

        let mut outputs = ValueMap::new();
        outputs.insert_scalar("Temp", temp);
        outputs.insert_scalar("ESF", state.esf);
        outputs.insert_scalar("SFC", sfc);
        outputs.insert_scalar("WE", engine_weight);
        outputs.insert_scalar("DT", margin);
        Ok(outputs)
    }

    fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let thrust = inputs.slot_scalar(self.name(), "x_pro")?;
        let drag = inputs.slot_scalar(self.name(), "D")?;
        let (altitude, mach) = (z[1], z[2]);

        let EngineState { tbar, esf, tuabar } = engine_state(thrust, drag, altitude, mach);
        let dtbar = THRUST_PER_UNIT * thrust.signum();

        let dsfc_dthrust =
            (-1.6379e-4 - 10.496e-5 * mach + 3.8042e-9 * altitude + 2.0 * 1.06e-8 * tbar) * dtbar;
        let dsfc_dh = -3.2956e-5 + 8.2138e-6 * mach - 2.0 * 8.574e-11 * altitude + 3.8042e-9 * tbar;
        let dsfc_dm = 1.5344 - 2.0 * 0.31623 * mach + 8.2138e-6 * altitude - 10.496e-5 * tbar;

        let desf_dthrust = -(drag / 3.0) / (tbar * tbar) * dtbar;
        let desf_ddrag = (1.0 / 3.0) / tbar;
        let dwe_desf = 3.0 * WBE * 1.05 * esf.abs().powf(0.05) * esf.signum();

        let dtua_dh = -0.50802 - 0.29326 * mach + 2.0 * 6.8572e-6 * altitude;
        let dtua_dm = 10_856.0 + 2.0 * 3200.2 * mach - 0.29326 * altitude;
        let ddt_dthrust = dtbar / tuabar;
        let ddt_dh = -tbar * dtua_dh / (tuabar * tuabar);
        let ddt_dm = -tbar * dtua_dm / (tuabar * tuabar);

        let sens = self
            .surface
            .sensitivity("temp", &[mach, altitude, thrust.abs()])?;
        let dtemp_dm = sens.partial(0);
        let dtemp_dh = sens.partial(1);
        let dtemp_dthrust = sens.partial(2) * thrust.signum();

        let mut jacobian = Jacobian::new();

        jacobian.set_scalar("SFC", "x_pro", dsfc_dthrust);
        let mut sfc_z = Array2::zeros((1, 6));
        sfc_z[[0, 1]] = dsfc_dh;
        sfc_z[[0, 2]] = dsfc_dm;
        jacobian.set("SFC", "z", sfc_z);

        jacobian.set_scalar("ESF", "x_pro", desf_dthrust);
        jacobian.set_scalar("ESF", "D", desf_ddrag);

        jacobian.set_scalar("WE", "x_pro", dwe_desf * desf_dthrust);
        jacobian.set_scalar("WE", "D", dwe_desf * desf_ddrag);

        jacobian.set_scalar("DT", "x_pro", ddt_dthrust);
        let mut dt_z = Array2::zeros((1, 6));
        dt_z[[0, 1]] = ddt_dh;
        dt_z[[0, 2]] = ddt_dm;
        jacobian.set("DT", "z", dt_z);

        jacobian.set_scalar("Temp", "x_pro", dtemp_dthrust);
        let mut temp_z = Array2::zeros((1, 6));
        temp_z[[0, 1]] = dtemp_dh;
        temp_z[[0, 2]] = dtemp_dm;
        jacobian.set("Temp", "z", temp_z);

        Ok(jacobian)
    }
}
