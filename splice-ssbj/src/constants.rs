//! Shared physical constants of the aircraft model.

/// Reference engine weight, lb.
pub const WBE: f64 = 4360.0;

/// Fixed operating weight (crew, payload, systems), lb.
pub const WO: f64 = 25_000.0;

/// Fixed fuel allowance outside the wing box, lb.
pub const WFO: f64 = 2_000.0;

/// Ultimate load factor.
pub const NZ: f64 = 6.0;

/// Minimum profile drag coefficient before the friction correction.
pub const CDMIN: f64 = 0.01375;

/// Thrust per unit of the propulsion design variable, lb.
pub const THRUST_PER_UNIT: f64 = 16_168.6;

/// Geopotential altitude of the tropopause, ft.
pub const TROPOPAUSE_FT: f64 = 36_089.0;

/// Span efficiency used by the induced-drag estimate.
pub const OSWALD: f64 = 0.96;
