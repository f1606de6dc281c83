use serde::{Deserialize, Serialize};

/// Physical-per-normalized scale factors for every quantity in the model,
/// measured at the nominal design point.
///
/// The optimizer works entirely in normalized space; these factors are the
/// only bridge back to physical units. They are fixed when the problem is
/// built and shared read-only by every discipline, and they double as the
/// reference coordinates of the fitted response surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    /// Global design vector `(t/c, h, M, AR, Λ, Sref)`.
    pub z: [f64; 6],
    /// Structure locals: taper ratio and wing-box section factor.
    pub x_str: [f64; 2],
    /// Aerodynamics local: skin-friction factor.
    pub x_aer: f64,
    /// Propulsion local: throttle setting.
    pub x_pro: f64,
    /// Total aircraft weight, lb.
    pub wt: f64,
    /// Fuel weight, lb.
    pub wf: f64,
    /// Wing twist.
    pub theta: f64,
    /// Stress at the five wing stations.
    pub sigma: [f64; 5],
    /// Lift, lb.
    pub l: f64,
    /// Drag, lb.
    pub d: f64,
    /// Lift-to-drag ratio.
    pub fin: f64,
    /// Wing pressure gradient.
    pub dpdx: f64,
    /// Specific fuel consumption.
    pub sfc: f64,
    /// Engine weight, lb.
    pub we: f64,
    /// Engine scale factor.
    pub esf: f64,
    /// Throttle temperature margin.
    pub dt: f64,
    /// Engine temperature ratio.
    pub temp: f64,
    /// Breguet range, nm.
    pub range: f64,
}

impl Scales {
    /// Factors measured at the nominal supersonic-cruise design point.
    #[must_use]
    pub fn nominal() -> Self {
        Self {
            z: [0.05, 45_000.0, 1.6, 5.5, 55.0, 1000.0],
            x_str: [0.25, 1.0],
            x_aer: 1.0,
            x_pro: 0.5,
            wt: 49_909.585_78,
            wf: 7_306.202_62,
            theta: 0.950_978,
            sigma: [1.122_55, 1.081_709_24, 1.061_223_8, 1.049_029_68, 1.040_853_09],
            l: 49_909.585_78,
            d: 12_193.701_8,
            fin: 4.093_062,
            dpdx: 1.0,
            sfc: 1.123_28,
            we: 5_748.915_355,
            esf: 1.0,
            dt: 0.278_366,
            temp: 1.0,
            range: 528.913_63,
        }
    }

    /// Half the wing span at the nominal planform, ft.
    #[must_use]
    pub fn nominal_half_span(&self) -> f64 {
        (self.z[3] * self.z[5]).sqrt() / 2.0
    }

    /// Wing-box inertia ratio at the nominal taper ratio.
    #[must_use]
    pub fn nominal_inertia_ratio(&self) -> f64 {
        let taper = self.x_str[0];
        (1.0 + 2.0 * taper) / (3.0 * (1.0 + taper))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn nominal_geometry_helpers() {
        let scales = Scales::nominal();
        assert_relative_eq!(
            scales.nominal_half_span(),
            (5.5_f64 * 1000.0).sqrt() / 2.0
        );
        assert_relative_eq!(scales.nominal_inertia_ratio(), 0.4);
    }

    #[test]
    fn serde_round_trip() {
        let scales = Scales::nominal();
        let json = serde_json::to_string(&scales).unwrap();
        let back: Scales = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scales);
    }
}
