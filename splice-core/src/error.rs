use std::fmt;

use thiserror::Error;

/// Problem-construction failures.
///
/// All of these are fatal: a malformed problem must be fixed by the caller
/// before re-running. Nothing here is retried at evaluation time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scale for `{variable}` has {scale_len} factors but the value has {value_len} elements")]
    ScaleShape {
        variable: String,
        scale_len: usize,
        value_len: usize,
    },

    #[error("scale factor {factor} for `{variable}` must be finite and nonzero")]
    InvalidScaleFactor { variable: String, factor: f64 },

    #[error("duplicate independent variable `{name}`")]
    DuplicateVariable { name: String },

    #[error("duplicate discipline `{name}`")]
    DuplicateDiscipline { name: String },

    #[error("no discipline named `{name}`")]
    UnknownDiscipline { name: String },

    #[error("no independent variable named `{name}`")]
    UnknownVariable { name: String },

    #[error("discipline `{discipline}` has no {kind} slot named `{slot}`")]
    UnknownSlot {
        discipline: String,
        kind: SlotKind,
        slot: String,
    },

    #[error("input `{slot}` of `{discipline}` expects length {expected}, but its source has length {actual}")]
    RouteShape {
        discipline: String,
        slot: String,
        expected: usize,
        actual: usize,
    },

    #[error("input `{slot}` of `{discipline}` is routed more than once")]
    DuplicateRoute { discipline: String, slot: String },

    #[error("input `{slot}` of `{discipline}` is never routed")]
    UnroutedInput { discipline: String, slot: String },

    #[error("output route into `{consumer}` must come from a discipline declared before it, not `{producer}`")]
    BackwardRoute { consumer: String, producer: String },

    #[error("coupling variable `{variable}` already has a consistency constraint")]
    DuplicateCoupling { variable: String },

    #[error("coupling variable `{variable}` has length {variable_len}, but `{discipline}.{slot}` has length {output_len}")]
    CouplingShape {
        variable: String,
        variable_len: usize,
        discipline: String,
        slot: String,
        output_len: usize,
    },

    #[error("element {index} is out of bounds for `{name}` of length {len}")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("assembly declares no objective")]
    MissingObjective,

    #[error("response surface `{label}` is already defined")]
    DuplicateSurface { label: String },

    #[error("response surface `{label}` has no dimensions")]
    EmptySurface { label: String },

    #[error("dimension {dim} of response surface `{label}` needs a finite nonzero reference and a positive half-width")]
    InvalidSurfaceSection { label: String, dim: usize },
}

/// The side of a discipline boundary a slot lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Input,
    Output,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Evaluation-time failures of a pure numeric model.
///
/// There is no recoverable path here: shape faults are configuration defects
/// that slipped past construction, and arithmetic domain faults (a division
/// by zero thrust, a negative logarithm) surface as non-finite values that
/// must propagate to the caller rather than being silently suppressed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("`{owner}` received no value for slot `{slot}`")]
    MissingSlot { owner: String, slot: String },

    #[error("slot `{slot}` of `{owner}` expects length {expected}, got {actual}")]
    SlotShape {
        owner: String,
        slot: String,
        expected: usize,
        actual: usize,
    },

    #[error("Jacobian block ({output}, {input}) of `{owner}` references an undeclared slot")]
    UnknownBlock {
        owner: String,
        output: String,
        input: String,
    },

    #[error(
        "Jacobian block ({output}, {input}) of `{owner}` has shape \
         {rows}x{cols}, expected {expected_rows}x{expected_cols}"
    )]
    BlockShape {
        owner: String,
        output: String,
        input: String,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("non-finite value in `{slot}` of `{owner}`")]
    NonFinite { owner: String, slot: String },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Response-surface query failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("no response surface labeled `{label}`")]
    UnknownLabel { label: String },

    #[error("surface `{label}` expects {expected} coordinates, got {actual}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}
