use crate::{
    error::EvalError,
    jacobian::Jacobian,
    variable::{ValueMap, VariableSpec},
};

/// A single physics model with an exact Jacobian.
///
/// A discipline declares named input and output slots, computes physical
/// outputs from physical inputs, and produces the partial derivatives of
/// those outputs on demand. Implementations must be deterministic and own no
/// mutable state: configuration (scale specs, fitted surfaces) is fixed when
/// the problem is built, so one instance can be evaluated repeatedly and
/// disciplines of one optimizer iteration can run concurrently.
///
/// The trait is object safe; assembly layers store disciplines as
/// `Box<dyn Discipline>` and talk to them only through their declared slots.
pub trait Discipline: Send + Sync {
    /// Identifies the discipline in errors and assembly wiring.
    fn name(&self) -> &str;

    /// The declared input slots, in a fixed order.
    fn inputs(&self) -> &[VariableSpec];

    /// The declared output slots, in a fixed order.
    fn outputs(&self) -> &[VariableSpec];

    /// Evaluates the model: physical inputs in, physical outputs out.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] for missing or mis-shaped slots and for
    /// arithmetic domain faults surfacing as non-finite values.
    fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError>;

    /// The partials of every physical output with respect to every physical
    /// input, evaluated at the given physical inputs.
    ///
    /// Pairs with no stored block are exactly zero.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Discipline::compute`].
    fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError>;
}

/// A discipline as seen from the optimizer: normalized values at the
/// boundary, physical units inside.
///
/// On [`compute`](Normalized::compute), declared inputs are validated and
/// de-scaled on entry and outputs are validated, checked finite, and
/// re-scaled on exit. On [`jacobian`](Normalized::jacobian), each physical
/// partial is rescaled by `input_scale / output_scale`, element by element,
/// so the optimizer receives derivatives in its own space.
#[derive(Debug, Clone, Copy)]
pub struct Normalized<'a, D: ?Sized> {
    discipline: &'a D,
}

impl<'a, D: Discipline + ?Sized> Normalized<'a, D> {
    pub fn new(discipline: &'a D) -> Self {
        Self { discipline }
    }

    /// Evaluates the discipline from normalized inputs to normalized
    /// outputs.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a declared input is absent or mis-shaped,
    /// if the discipline produces a mis-shaped output, or if any output
    /// element is non-finite (a numeric-domain fault, never suppressed).
    pub fn compute(&self, normalized: &ValueMap) -> Result<ValueMap, EvalError> {
        let physical = self.descale_inputs(normalized)?;
        let outputs = self.discipline.compute(&physical)?;

        let owner = self.discipline.name();
        let mut scaled = ValueMap::new();
        for spec in self.discipline.outputs() {
            let value = outputs.slot(owner, spec.name())?;
            if value.len() != spec.len() {
                return Err(EvalError::SlotShape {
                    owner: owner.to_string(),
                    slot: spec.name().to_string(),
                    expected: spec.len(),
                    actual: value.len(),
                });
            }
            if !value.iter().all(|v| v.is_finite()) {
                return Err(EvalError::NonFinite {
                    owner: owner.to_string(),
                    slot: spec.name().to_string(),
                });
            }
            scaled.insert(spec.name(), spec.scale().to_normalized(value));
        }
        Ok(scaled)
    }

    /// The Jacobian of normalized outputs with respect to normalized inputs.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] for the same input faults as
    /// [`Normalized::compute`], and for Jacobian blocks that reference
    /// undeclared slots or have the wrong shape.
    pub fn jacobian(&self, normalized: &ValueMap) -> Result<Jacobian, EvalError> {
        let physical = self.descale_inputs(normalized)?;
        let mut jacobian = self.discipline.jacobian(&physical)?;

        let owner = self.discipline.name();
        for (output, input, block) in jacobian.iter_mut() {
            let out_spec = find_spec(self.discipline.outputs(), output);
            let in_spec = find_spec(self.discipline.inputs(), input);
            let (Some(out_spec), Some(in_spec)) = (out_spec, in_spec) else {
                return Err(EvalError::UnknownBlock {
                    owner: owner.to_string(),
                    output: output.to_string(),
                    input: input.to_string(),
                });
            };
            if block.nrows() != out_spec.len() || block.ncols() != in_spec.len() {
                return Err(EvalError::BlockShape {
                    owner: owner.to_string(),
                    output: output.to_string(),
                    input: input.to_string(),
                    rows: block.nrows(),
                    cols: block.ncols(),
                    expected_rows: out_spec.len(),
                    expected_cols: in_spec.len(),
                });
            }
            for ((row, col), entry) in block.indexed_iter_mut() {
                *entry *= in_spec.scale().factor(col) / out_spec.scale().factor(row);
            }
        }
        Ok(jacobian)
    }

    fn descale_inputs(&self, normalized: &ValueMap) -> Result<ValueMap, EvalError> {
        let owner = self.discipline.name();
        let mut physical = ValueMap::new();
        for spec in self.discipline.inputs() {
            let value = normalized.slot(owner, spec.name())?;
            if value.len() != spec.len() {
                return Err(EvalError::SlotShape {
                    owner: owner.to_string(),
                    slot: spec.name().to_string(),
                    expected: spec.len(),
                    actual: value.len(),
                });
            }
            physical.insert(spec.name(), spec.scale().to_physical(value));
        }
        Ok(physical)
    }
}

fn find_spec<'s>(specs: &'s [VariableSpec], name: &str) -> Option<&'s VariableSpec> {
    specs.iter().find(|spec| spec.name() == name)
}
