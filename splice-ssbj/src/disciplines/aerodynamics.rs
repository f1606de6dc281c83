//! Aerodynamics discipline: lift, drag, and the wing pressure gradient.
//!
//! Lift balances the assumed total weight. Drag combines a profile term
//! (minimum drag corrected by a fitted skin-friction surface and a
//! wave-drag term in thickness ratio and sweep) with an induced term
//! `k·CL²`, where fitted surfaces penalize off-nominal wing twist and
//! engine scale. Dynamic pressure follows the standard atmosphere, piecewise
//! at the tropopause.

use std::f64::consts::PI;

use ndarray::Array2;
use splice_core::{
    ConfigError, Discipline, EvalError, Jacobian, ResponseSurface, Scale, ValueMap, VariableSpec,
};

use crate::{
    constants::{CDMIN, OSWALD, TROPOPAUSE_FT},
    scales::Scales,
    surface::{PolynomialSurface, Section, SectionShape},
};

use super::vector_slot;

/// Dynamic pressure at altitude and Mach, with its two partials.
///
/// Below the tropopause both speed of sound and density follow the
/// standard-atmosphere lapse; above it the temperature is constant and
/// density decays exponentially.
fn dynamic_pressure(altitude: f64, mach: f64) -> (f64, f64, f64) {
    if altitude <= TROPOPAUSE_FT {
        let lapse = 1.0 - 6.875e-6 * altitude;
        let speed = 1116.39 * mach * lapse.sqrt();
        let density = 2.377e-3 * lapse.powf(4.2561);
        let q = 0.5 * density * speed * speed;
        // q ∝ M² · lapse^5.2561
        let dq_dh = q * 5.2561 / lapse * (-6.875e-6);
        (q, dq_dh, 2.0 * q / mach)
    } else {
        let speed = 968.1 * mach;
        let density = 2.377e-3 * 0.2971 * ((TROPOPAUSE_FT - altitude) / 20_806.7).exp();
        let q = 0.5 * density * speed * speed;
        (q, -q / 20_806.7, 2.0 * q / mach)
    }
}

/// The aerodynamics discipline.
///
/// Inputs: the global design vector `z`, the skin-friction local `x_aer`,
/// and the assumed couplings `WT`, `Theta`, `ESF`. Outputs: lift `L`, drag
/// `D`, lift-to-drag ratio `fin`, and the wing pressure gradient `dpdx`.
pub struct Aerodynamics {
    inputs: Vec<VariableSpec>,
    outputs: Vec<VariableSpec>,
    surface: PolynomialSurface,
}

impl Aerodynamics {
    /// Builds the discipline against a scale table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale table is degenerate.
    pub fn new(scales: &Scales) -> Result<Self, ConfigError> {
        let surface = PolynomialSurface::new()
            .with_surface(
                "skin_friction",
                vec![Section::new(scales.x_aer, 0.25, SectionShape::GentleRise)],
            )?
            .with_surface(
                "nacelle_drag",
                vec![Section::new(scales.esf, 0.25, SectionShape::GentleRise)],
            )?
            .with_surface(
                "twist_drag",
                vec![Section::new(scales.theta, 0.25, SectionShape::Bowl)],
            )?
            .with_surface(
                "pressure_gradient",
                vec![Section::new(scales.z[0], 0.25, SectionShape::SteepRise)],
            )?;
        Ok(Self {
            inputs: vec![
                VariableSpec::vector("z", vec![1.0; 6], Scale::per_element(scales.z.to_vec()))?,
                VariableSpec::scalar("x_aer", 1.0, scales.x_aer)?,
                VariableSpec::scalar("WT", 1.0, scales.wt)?,
                VariableSpec::scalar("Theta", 1.0, scales.theta)?,
                VariableSpec::scalar("ESF", 1.0, scales.esf)?,
            ],
            outputs: vec![
                VariableSpec::scalar("L", 1.0, scales.l)?,
                VariableSpec::scalar("D", 1.0, scales.d)?,
                VariableSpec::scalar("fin", 1.0, scales.fin)?,
                VariableSpec::scalar("dpdx", 1.0, scales.dpdx)?,
            ],
            surface,
        })
    }
}

impl Discipline for Aerodynamics {
    fn name(&self) -> &str {
        "Aerodynamics"
    }

    fn inputs(&self) -> &[VariableSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[VariableSpec] {
        &self.outputs
    }

    fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let x_aer = inputs.slot_scalar(self.name(), "x_aer")?;
        let weight = inputs.slot_scalar(self.name(), "WT")?;
        let twist = inputs.slot_scalar(self.name(), "Theta")?;
        let esf = inputs.slot_scalar(self.name(), "ESF")?;
        let (tc, altitude, mach, aspect, sweep, area) = (z[0], z[1], z[2], z[3], z[4], z[5]);

        let (q, _, _) = dynamic_pressure(altitude, mach);
        let qs = q * area;
        let cl = weight / qs;

        let friction = self.surface.value("skin_friction", &[x_aer])?;
        let nacelle = self.surface.value("nacelle_drag", &[esf])?;
        let twist_penalty = self.surface.value("twist_drag", &[twist])?;

        let sweep_cos = sweep.to_radians().cos();
        let cd_min = CDMIN * friction + 3.05 * tc.abs().powf(5.0 / 3.0) * sweep_cos.powf(1.5);
        let induced_factor = (1.0 + 0.2 * mach * mach) / (PI * OSWALD * aspect);
        let cd = nacelle * (cd_min + twist_penalty * induced_factor * cl * cl);
        let drag = qs * cd;

        let mut outputs = ValueMap::new();
        outputs.insert_scalar("L", weight);
        outputs.insert_scalar("D", drag);
        outputs.insert_scalar("fin", weight / drag);
        outputs.insert_scalar(
            "dpdx",
            self.surface.value("pressure_gradient", &[tc])?,
        );
        Ok(outputs)
    }

    fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let x_aer = inputs.slot_scalar(self.name(), "x_aer")?;
        let weight = inputs.slot_scalar(self.name(), "WT")?;
        let twist = inputs.slot_scalar(self.name(), "Theta")?;
        let esf = inputs.slot_scalar(self.name(), "ESF")?;
        let (tc, altitude, mach, aspect, sweep, area) = (z[0], z[1], z[2], z[3], z[4], z[5]);

        let (q, dq_dh, dq_dm) = dynamic_pressure(altitude, mach);
        let qs = q * area;
        let cl = weight / qs;

        let friction = self.surface.value("skin_friction", &[x_aer])?;
        let nacelle = self.surface.value("nacelle_drag", &[esf])?;
        let twist_penalty = self.surface.value("twist_drag", &[twist])?;
        let dfriction = self.surface.sensitivity("skin_friction", &[x_aer])?.partial(0);
        let dnacelle = self.surface.sensitivity("nacelle_drag", &[esf])?.partial(0);
        let dtwist_penalty = self.surface.sensitivity("twist_drag", &[twist])?.partial(0);

        let sweep_rad = sweep.to_radians();
        let sweep_cos = sweep_rad.cos();
        let cd_min = CDMIN * friction + 3.05 * tc.abs().powf(5.0 / 3.0) * sweep_cos.powf(1.5);
        let induced_factor = (1.0 + 0.2 * mach * mach) / (PI * OSWALD * aspect);
        let induced = twist_penalty * induced_factor * cl * cl;
        let drag = qs * nacelle * (cd_min + induced);

        // Holding the drag polar fixed, drag = qs·n·cd_min + n·F_t·k·WT²/qs,
        // so the sensitivity to dynamic pressure splits into the two terms.
        let ddrag_dqs = nacelle * (cd_min - induced);

        let dcdmin_dtc =
            3.05 * (5.0 / 3.0) * tc.abs().powf(2.0 / 3.0) * tc.signum() * sweep_cos.powf(1.5);
        let dcdmin_dsweep = -3.05
            * tc.abs().powf(5.0 / 3.0)
            * 1.5
            * sweep_cos.sqrt()
            * sweep_rad.sin()
            * PI
            / 180.0;
        let dk_daspect = -induced_factor / aspect;
        let dk_dm = 0.4 * mach / (PI * OSWALD * aspect);

        let ddrag_dtc = qs * nacelle * dcdmin_dtc;
        let ddrag_dh = ddrag_dqs * area * dq_dh;
        let ddrag_dm = ddrag_dqs * area * dq_dm + qs * nacelle * twist_penalty * cl * cl * dk_dm;
        let ddrag_daspect = qs * nacelle * twist_penalty * cl * cl * dk_daspect;
        let ddrag_dsweep = qs * nacelle * dcdmin_dsweep;
        let ddrag_darea = ddrag_dqs * q;
        let ddrag_dxaer = qs * nacelle * CDMIN * dfriction;
        let ddrag_dweight = nacelle * twist_penalty * induced_factor * 2.0 * weight / qs;
        let ddrag_dtwist = qs * nacelle * induced_factor * cl * cl * dtwist_penalty;
        let ddrag_desf = qs * (cd_min + induced) * dnacelle;

        let dfin = |ddrag: f64| -weight / (drag * drag) * ddrag;

        let mut jacobian = Jacobian::new();

        jacobian.set_scalar("L", "WT", 1.0);

        let mut drag_z = Array2::zeros((1, 6));
        drag_z[[0, 0]] = ddrag_dtc;
        drag_z[[0, 1]] = ddrag_dh;
        drag_z[[0, 2]] = ddrag_dm;
        drag_z[[0, 3]] = ddrag_daspect;
        drag_z[[0, 4]] = ddrag_dsweep;
        drag_z[[0, 5]] = ddrag_darea;
        jacobian.set("D", "z", drag_z);
        jacobian.set_scalar("D", "x_aer", ddrag_dxaer);
        jacobian.set_scalar("D", "WT", ddrag_dweight);
        jacobian.set_scalar("D", "Theta", ddrag_dtwist);
        jacobian.set_scalar("D", "ESF", ddrag_desf);

        let mut fin_z = Array2::zeros((1, 6));
        fin_z[[0, 0]] = dfin(ddrag_dtc);
        fin_z[[0, 1]] = dfin(ddrag_dh);
        fin_z[[0, 2]] = dfin(ddrag_dm);
        fin_z[[0, 3]] = dfin(ddrag_daspect);
        fin_z[[0, 4]] = dfin(ddrag_dsweep);
        fin_z[[0, 5]] = dfin(ddrag_darea);
        jacobian.set("fin", "z", fin_z);
        jacobian.set_scalar("fin", "x_aer", dfin(ddrag_dxaer));
        jacobian.set_scalar("fin", "WT", 1.0 / drag + dfin(ddrag_dweight));
        jacobian.set_scalar("fin", "Theta", dfin(ddrag_dtwist));
        jacobian.set_scalar("fin", "ESF", dfin(ddrag_desf));

        let mut dpdx_z = Array2::zeros((1, 6));
        dpdx_z[[0, 0]] = self
            .surface
            .sensitivity("pressure_gradient", &[tc])?
            .partial(0);
        jacobian.set("dpdx", "z", dpdx_z);

        Ok(jacobian)
    }
}
