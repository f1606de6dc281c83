//! Structure discipline: wing weight, fuel volume, twist, and stresses.
//!
//! Wing weight follows the classical power-law estimate in load, planform,
//! and taper, corrected by a fitted sizing surface in the wing-box section
//! factor. Fuel carried in the wing scales with the box volume. Twist and
//! the stresses at five span stations come from fitted surfaces over the
//! section factor, half span, box inertia ratio, and applied load.

use ndarray::{Array1, Array2};
use splice_core::{
    ConfigError, Discipline, EvalError, Jacobian, ResponseSurface, Scale, ValueMap, VariableSpec,
};

use crate::{
    constants::{NZ, WFO, WO},
    scales::Scales,
    surface::{PolynomialSurface, Section, SectionShape},
};

use super::vector_slot;

/// Stress-station surface labels, root to tip.
const SIGMA_LABELS: [&str; 5] = ["sigma1", "sigma2", "sigma3", "sigma4", "sigma5"];

/// Trust-region half-widths per stress station; outboard stations fit a
/// wider region because the nominal load there is smaller.
const SIGMA_HALF_WIDTHS: [f64; 5] = [0.1, 0.15, 0.2, 0.25, 0.3];

/// Wing fuel per unit of planform area times box thickness, lb/ft³.
const FUEL_DENSITY: f64 = 5.0 / 18.0 * 2.0 / 3.0 * 42.5;

/// The structure discipline.
///
/// Inputs: the global design vector `z`, the locals
/// `x_str = (taper ratio, section factor)`, and the assumed couplings `L`
/// and `WE`. Outputs: total weight `WT`, fuel weight `WF`, wing twist
/// `Theta`, and the five-station stress vector `sigma`.
pub struct Structure {
    inputs: Vec<VariableSpec>,
    outputs: Vec<VariableSpec>,
    surface: PolynomialSurface,
}

impl Structure {
    /// Builds the discipline against a scale table; every fitted surface is
    /// anchored at the nominal physical geometry the table describes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale table is degenerate.
    pub fn new(scales: &Scales) -> Result<Self, ConfigError> {
        let section_ref = scales.x_str[1];
        let span_ref = scales.nominal_half_span();
        let inertia_ref = scales.nominal_inertia_ratio();

        let mut surface = PolynomialSurface::new()
            .with_surface(
                "wing_sizing",
                vec![Section::new(section_ref, 0.008, SectionShape::GentleRise)],
            )?
            .with_surface(
                "twist",
                vec![
                    Section::new(section_ref, 0.25, SectionShape::SteepRise),
                    Section::new(span_ref, 0.25, SectionShape::SteepFall),
                    Section::new(inertia_ref, 0.25, SectionShape::SteepFall),
                    Section::new(scales.l, 0.25, SectionShape::GentleFall),
                ],
            )?;
        for (label, width) in SIGMA_LABELS.iter().zip(SIGMA_HALF_WIDTHS) {
            surface = surface.with_surface(
                *label,
                vec![
                    Section::new(scales.z[0], width, SectionShape::SteepFall),
                    Section::new(scales.l, width, SectionShape::GentleRise),
                    Section::new(section_ref, width, SectionShape::SteepFall),
                    Section::new(span_ref, width, SectionShape::GentleRise),
                    Section::new(inertia_ref, width, SectionShape::GentleRise),
                ],
            )?;
        }

        Ok(Self {
            inputs: vec![
                VariableSpec::vector("z", vec![1.0; 6], Scale::per_element(scales.z.to_vec()))?,
                VariableSpec::vector(
                    "x_str",
                    vec![1.0, 1.0],
                    Scale::per_element(scales.x_str.to_vec()),
                )?,
                VariableSpec::scalar("L", 1.0, scales.l)?,
                VariableSpec::scalar("WE", 1.0, scales.we)?,
            ],
            outputs: vec![
                VariableSpec::scalar("WT", 1.0, scales.wt)?,
                VariableSpec::scalar("WF", 1.0, scales.wf)?,
                VariableSpec::scalar("Theta", 1.0, scales.theta)?,
                VariableSpec::vector(
                    "sigma",
                    vec![1.0; 5],
                    Scale::per_element(scales.sigma.to_vec()),
                )?,
            ],
            surface,
        })
    }
}

/// Geometry derived from the planform, shared by both evaluation paths.
struct Planform {
    thickness: f64,
    half_span: f64,
    inertia: f64,
}

fn planform(tc: f64, aspect: f64, area: f64, taper: f64) -> Planform {
    Planform {
        thickness: tc * (area / aspect).sqrt(),
        half_span: (aspect * area).sqrt() / 2.0,
        inertia: (1.0 + 2.0 * taper) / (3.0 * (1.0 + taper)),
    }
}

impl Discipline for Structure {
    fn name(&self) -> &str {
        "Structure"
    }

    fn inputs(&self) -> &[VariableSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[VariableSpec] {
        &self.outputs
    }

    fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let x = vector_slot(inputs, self.name(), "x_str", 2)?;
        let lift = inputs.slot_scalar(self.name(), "L")?;
        let engine_weight = inputs.slot_scalar(self.name(), "WE")?;
        let (tc, aspect, sweep, area) = (z[0], z[3], z[4], z[5]);
        let (taper, section) = (x[0], x[1]);

        let geometry = planform(tc, aspect, area, taper);
        let sizing = self.surface.value("wing_sizing", &[section.abs()])?;
        let sweep_cos = sweep.to_radians().cos();

        let wing_weight = sizing
            * (0.0051
                * (lift * NZ).abs().powf(0.557)
                * area.abs().powf(0.649)
                * aspect.abs().sqrt()
                * tc.abs().powf(-0.4)
                * (1.0 + taper).abs().powf(0.1)
                * (0.1875 * area.abs()).powf(0.1)
                / sweep_cos.abs());
        let wing_fuel = FUEL_DENSITY * area * geometry.thickness;
        let fuel_weight = wing_fuel + WFO;
        let total_weight = WO + wing_weight + fuel_weight + engine_weight;

        let twist = self.surface.value(
            "twist",
            &[section.abs(), geometry.half_span, geometry.inertia, lift],
        )?;

        let mut sigma = Array1::zeros(5);
        for (station, label) in SIGMA_LABELS.iter().enumerate() {
            sigma[station] = self.surface.value(
                label,
                &[tc, lift, section.abs(), geometry.half_span, geometry.inertia],
            )?;
        }

        let mut outputs = ValueMap::new();
        outputs.insert_scalar("WT", total_weight);
        outputs.insert_scalar("WF", fuel_weight);
        outputs.insert_scalar("Theta", twist);
        outputs.insert("sigma", sigma);
        Ok(outputs)
    }

    fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
        let z = vector_slot(inputs, self.name(), "z", 6)?;
        let x = vector_slot(inputs, self.name(), "x_str", 2)?;
        let lift = inputs.slot_scalar(self.name(), "L")?;
        let (tc, aspect, sweep, area) = (z[0], z[3], z[4], z[5]);
        let (taper, section) = (x[0], x[1]);

        let geometry = planform(tc, aspect, area, taper);
        let sizing = self.surface.value("wing_sizing", &[section.abs()])?;
        let dsizing = self
            .surface
            .sensitivity("wing_sizing", &[section.abs()])?
            .partial(0);
        let sweep_rad = sweep.to_radians();

        let wing_weight = sizing
            * (0.0051
                * (lift * NZ).abs().powf(0.557)
                * area.abs().powf(0.649)
                * aspect.abs().sqrt()
                * tc.abs().powf(-0.4)
                * (1.0 + taper).abs().powf(0.1)
                * (0.1875 * area.abs()).powf(0.1)
                / sweep_rad.cos().abs());

        // Geometry partials.
        let dthick_dtc = (area / aspect).sqrt();
        let dthick_darea = 0.5 * geometry.thickness / area;
        let dthick_daspect = -0.5 * geometry.thickness / aspect;
        let dspan_daspect = geometry.half_span / (2.0 * aspect);
        let dspan_darea = geometry.half_span / (2.0 * area);
        let dinertia_dtaper = 1.0 / (3.0 * (1.0 + taper) * (1.0 + taper));

        // Power-law wing weight: each exponent becomes a log-derivative.
        let dww_dlift = 0.557 * wing_weight / lift;
        let dww_darea = 0.749 * wing_weight / area;
        let dww_daspect = 0.5 * wing_weight / aspect;
        let dww_dtc = -0.4 * wing_weight / tc;
        let dww_dtaper = 0.1 * wing_weight / (1.0 + taper);
        let dww_dsweep = wing_weight * sweep_rad.tan() * std::f64::consts::PI / 180.0;
        let dww_dsection = wing_weight / sizing * dsizing * section.signum();

        let dfuel_dtc = FUEL_DENSITY * area * dthick_dtc;
        let dfuel_darea = FUEL_DENSITY * (geometry.thickness + area * dthick_darea);
        let dfuel_daspect = FUEL_DENSITY * area * dthick_daspect;

        let mut jacobian = Jacobian::new();

        let mut wt_z = Array2::zeros((1, 6));
        wt_z[[0, 0]] = dww_dtc + dfuel_dtc;
        wt_z[[0, 3]] = dww_daspect + dfuel_daspect;
        wt_z[[0, 4]] = dww_dsweep;
        wt_z[[0, 5]] = dww_darea + dfuel_darea;
        jacobian.set("WT", "z", wt_z);
        let mut wt_x = Array2::zeros((1, 2));
        wt_x[[0, 0]] = dww_dtaper;
        wt_x[[0, 1]] = dww_dsection;
        jacobian.set("WT", "x_str", wt_x);
        jacobian.set_scalar("WT", "L", dww_dlift);
        jacobian.set_scalar("WT", "WE", 1.0);

        let mut wf_z = Array2::zeros((1, 6));
        wf_z[[0, 0]] = dfuel_dtc;
        wf_z[[0, 3]] = dfuel_daspect;
        wf_z[[0, 5]] = dfuel_darea;
        jacobian.set("WF", "z", wf_z);

        let twist_sens = self.surface.sensitivity(
            "twist",
            &[section.abs(), geometry.half_span, geometry.inertia, lift],
        )?;
        let mut theta_z = Array2::zeros((1, 6));
        theta_z[[0, 3]] = twist_sens.partial(1) * dspan_daspect;
        theta_z[[0, 5]] = twist_sens.partial(1) * dspan_darea;
        jacobian.set("Theta", "z", theta_z);
        let mut theta_x = Array2::zeros((1, 2));
        theta_x[[0, 0]] = twist_sens.partial(2) * dinertia_dtaper;
        theta_x[[0, 1]] = twist_sens.partial(0) * section.signum();
        jacobian.set("Theta", "x_str", theta_x);
        jacobian.set_scalar("Theta", "L", twist_sens.partial(3));

        let mut sigma_z = Array2::zeros((5, 6));
        let mut sigma_x = Array2::zeros((5, 2));
        let mut sigma_lift = Array2::zeros((5, 1));
        for (station, label) in SIGMA_LABELS.iter().enumerate() {
            let sens = self.surface.sensitivity(
                label,
                &[tc, lift, section.abs(), geometry.half_span, geometry.inertia],
            )?;
            sigma_z[[station, 0]] = sens.partial(0);
            sigma_z[[station, 3]] = sens.partial(3) * dspan_daspect;
            sigma_z[[station, 5]] = sens.partial(3) * dspan_darea;
            sigma_x[[station, 0]] = sens.partial(4) * dinertia_dtaper;
            sigma_x[[station, 1]] = sens.partial(2) * section.signum();
            sigma_lift[[station, 0]] = sens.partial(1);
        }
        jacobian.set("sigma", "z", sigma_z);
        jacobian.set("sigma", "x_str", sigma_x);
        jacobian.set("sigma", "L", sigma_lift);

        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use splice_core::check::check_partials;

    use super::*;

    fn discipline() -> Structure {
        Structure::new(&Scales::nominal()).unwrap()
    }

    fn physical_inputs() -> ValueMap {
        let mut inputs = ValueMap::new();
        inputs.insert("z", vec![0.05, 45_000.0, 1.6, 5.5, 55.0, 1000.0]);
        inputs.insert("x_str", vec![0.25, 1.0]);
        inputs.insert_scalar("L", 44_319.7);
        inputs.insert_scalar("WE", 8_565.9);
        inputs
    }

    #[test]
    fn weights_add_up() {
        let structure = discipline();
        let outputs = structure.compute(&physical_inputs()).unwrap();

        let total = outputs.scalar("WT").unwrap();
        let fuel = outputs.scalar("WF").unwrap();

        // Nominal wing volume: t = 0.05·√(1000/5.5), so the in-wing fuel is
        // the fixed density times Sref·t, plus the fixed allowance.
        let thickness = 0.05 * (1000.0_f64 / 5.5).sqrt();
        assert_relative_eq!(
            fuel,
            FUEL_DENSITY * 1000.0 * thickness + WFO,
            max_relative = 1e-12,
        );

        // WT = WO + WW + WF + WE, so the wing-weight share is what is left.
        let wing_weight = total - WO - fuel - 8_565.9;
        assert!(wing_weight > 0.0);

        // An extra pound of engine weight is a pound of total weight.
        let mut heavier = physical_inputs();
        heavier.insert_scalar("WE", 8_566.9);
        let bumped = structure.compute(&heavier).unwrap();
        assert_relative_eq!(
            bumped.scalar("WT").unwrap() - total,
            1.0,
            max_relative = 1e-9,
        );
    }

    #[test]
    fn stresses_report_five_stations() {
        let structure = discipline();
        let outputs = structure.compute(&physical_inputs()).unwrap();

        let sigma = outputs.get("sigma").unwrap();
        assert_eq!(sigma.len(), 5);
        // At the nominal point every station sits at its surface reference.
        for &station in sigma {
            assert_relative_eq!(station, 1.0);
        }
    }

    #[test]
    fn analytic_partials_match_finite_differences() {
        let structure = discipline();

        let points = [
            ([1.0, 1.0, 1.0, 1.0, 1.0, 1.0], [1.0, 1.0], 0.888, 1.49),
            ([1.1, 1.0, 1.0, 0.95, 1.05, 0.95], [0.9, 1.002], 0.95, 1.2),
            ([0.9, 1.0, 1.0, 1.05, 0.95, 1.05], [1.1, 0.998], 1.05, 1.6),
        ];
        for (z, x_str, l, we) in points {
            let mut at = ValueMap::new();
            at.insert("z", z.to_vec());
            at.insert("x_str", x_str.to_vec());
            at.insert_scalar("L", l);
            at.insert_scalar("WE", we);

            for check in check_partials(&structure, &at, 1e-7).unwrap() {
                assert!(
                    check.max_rel_error < 1e-4,
                    "({}, {}) at L={l}: {:?}",
                    check.output,
                    check.input,
                    check,
                );
            }
        }
    }
}
