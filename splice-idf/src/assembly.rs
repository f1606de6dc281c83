use ndarray::{Array1, Array2};
use splice_core::{
    ConfigError, Discipline, EvalError, Normalized, SlotKind, ValueMap, VariableSpec,
};

use crate::{
    constraint::{Bound, Coupling, Inequality, Objective, Route, RouteSource, ValueRef},
    evaluation::{AssemblyJacobian, Evaluation},
    goal::Goal,
    layout::Layout,
};

/// Collects independent variables, disciplines, wiring, and constraints,
/// then validates the whole problem into an immutable [`Assembly`].
///
/// Declaration order matters twice: independent variables flatten into the
/// optimizer vector in declaration order, and disciplines evaluate in
/// declaration order, which is why output routes must point forward.
#[derive(Default)]
pub struct AssemblyBuilder {
    variables: Vec<VariableSpec>,
    disciplines: Vec<Box<dyn Discipline>>,
    routes: Vec<Route>,
    couplings: Vec<Coupling>,
    inequalities: Vec<Inequality>,
    objective: Option<Objective>,
}

impl AssemblyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an independent optimization variable.
    #[must_use]
    pub fn variable(mut self, spec: VariableSpec) -> Self {
        self.variables.push(spec);
        self
    }

    /// Adds a discipline; it will evaluate after every one added before it.
    #[must_use]
    pub fn discipline(mut self, discipline: impl Discipline + 'static) -> Self {
        self.disciplines.push(Box::new(discipline));
        self
    }

    /// Routes an independent variable into a discipline's input slot.
    #[must_use]
    pub fn route(
        mut self,
        variable: impl Into<String>,
        discipline: impl Into<String>,
        slot: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            source: RouteSource::Variable(variable.into()),
            discipline: discipline.into(),
            slot: slot.into(),
        });
        self
    }

    /// Routes a producer's output straight into a consumer's input slot.
    ///
    /// Only valid forward in declaration order; a cycle must go through an
    /// independent variable and a [`coupling`](AssemblyBuilder::coupling)
    /// instead.
    #[must_use]
    pub fn feed(
        mut self,
        producer: impl Into<String>,
        output: impl Into<String>,
        consumer: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            source: RouteSource::Output {
                discipline: producer.into(),
                slot: output.into(),
            },
            discipline: consumer.into(),
            slot: input.into(),
        });
        self
    }

    /// Ties an assumed coupling variable to the discipline output it stands
    /// in for, adding one quadratic consistency constraint.
    #[must_use]
    pub fn coupling(
        mut self,
        variable: impl Into<String>,
        discipline: impl Into<String>,
        slot: impl Into<String>,
    ) -> Self {
        self.couplings.push(Coupling {
            variable: variable.into(),
            discipline: discipline.into(),
            slot: slot.into(),
        });
        self
    }

    /// Adds a named one-sided feasibility constraint on a physical value.
    #[must_use]
    pub fn inequality(mut self, name: impl Into<String>, value: ValueRef, bound: Bound) -> Self {
        self.inequalities.push(Inequality::new(name, value, bound));
        self
    }

    /// Sets the objective; maximization is recast as minimization of the
    /// negated value.
    #[must_use]
    pub fn objective(mut self, value: ValueRef, goal: Goal) -> Self {
        self.objective = Some(Objective { value, goal });
        self
    }

    /// Validates every endpoint and shape and freezes the problem.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending declaration:
    /// duplicate names, unknown endpoints, mis-shaped or missing routes,
    /// backward output routes, repeated couplings, out-of-range element
    /// references, or a missing objective.
    pub fn build(self) -> Result<Assembly, ConfigError> {
        let Self {
            variables,
            disciplines,
            routes,
            couplings,
            inequalities,
            objective,
        } = self;

        for (i, spec) in variables.iter().enumerate() {
            if variables[..i].iter().any(|s| s.name() == spec.name()) {
                return Err(ConfigError::DuplicateVariable {
                    name: spec.name().to_string(),
                });
            }
        }
        for (i, discipline) in disciplines.iter().enumerate() {
            if disciplines[..i].iter().any(|d| d.name() == discipline.name()) {
                return Err(ConfigError::DuplicateDiscipline {
                    name: discipline.name().to_string(),
                });
            }
        }

        for route in &routes {
            validate_route(route, &variables, &disciplines)?;
        }
        for discipline in &disciplines {
            for input in discipline.inputs() {
                let count = routes
                    .iter()
                    .filter(|r| r.discipline == discipline.name() && r.slot == input.name())
                    .count();
                if count == 0 {
                    return Err(ConfigError::UnroutedInput {
                        discipline: discipline.name().to_string(),
                        slot: input.name().to_string(),
                    });
                }
                if count > 1 {
                    return Err(ConfigError::DuplicateRoute {
                        discipline: discipline.name().to_string(),
                        slot: input.name().to_string(),
                    });
                }
            }
        }

        for (i, coupling) in couplings.iter().enumerate() {
            if couplings[..i].iter().any(|c| c.variable == coupling.variable) {
                return Err(ConfigError::DuplicateCoupling {
                    variable: coupling.variable.clone(),
                });
            }
            let variable = find_variable(&variables, &coupling.variable)?;
            let output = find_output(&disciplines, &coupling.discipline, &coupling.slot)?;
            if variable.len() != output.len() {
                return Err(ConfigError::CouplingShape {
                    variable: coupling.variable.clone(),
                    variable_len: variable.len(),
                    discipline: coupling.discipline.clone(),
                    slot: coupling.slot.clone(),
                    output_len: output.len(),
                });
            }
        }

        for inequality in &inequalities {
            validate_ref(&inequality.value, &variables, &disciplines)?;
        }
        let objective = objective.ok_or(ConfigError::MissingObjective)?;
        validate_ref(&objective.value, &variables, &disciplines)?;

        let layout = Layout::new(&variables);
        Ok(Assembly {
            variables,
            disciplines,
            routes,
            couplings,
            inequalities,
            objective,
            layout,
        })
    }
}

/// A validated, immutable optimization problem under the IDF formulation.
///
/// Evaluation is a deterministic forward walk: disciplines run in
/// declaration order against the independent variables and already-computed
/// upstream outputs, then constraints and the objective are read off. There
/// is no hidden state; evaluating twice at the same point is bit-identical.
pub struct Assembly {
    variables: Vec<VariableSpec>,
    disciplines: Vec<Box<dyn Discipline>>,
    routes: Vec<Route>,
    couplings: Vec<Coupling>,
    inequalities: Vec<Inequality>,
    objective: Objective,
    layout: Layout,
}

impl Assembly {
    /// The flattening of independent variables into optimizer columns.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The declared independent variables, in declaration order.
    #[must_use]
    pub fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    /// The normalized starting point declared with the variables.
    #[must_use]
    pub fn defaults(&self) -> ValueMap {
        let mut values = ValueMap::new();
        for spec in &self.variables {
            values.insert(spec.name(), spec.default().clone());
        }
        values
    }

    /// Looks up a discipline by name.
    #[must_use]
    pub fn discipline(&self, name: &str) -> Option<&dyn Discipline> {
        self.disciplines
            .iter()
            .find(|d| d.name() == name)
            .map(AsRef::as_ref)
    }

    /// Evaluates the objective, all constraints, and every discipline at the
    /// given normalized independent-variable values.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] for missing or mis-shaped variables and for
    /// numeric-domain faults inside a discipline.
    pub fn evaluate(&self, x: &ValueMap) -> Result<Evaluation, EvalError> {
        self.validate_point(x)?;
        let outputs = self.run_disciplines(x)?;

        let mut consistency = Vec::with_capacity(self.couplings.len());
        for coupling in &self.couplings {
            let assumed = x.slot("assembly", &coupling.variable)?;
            let produced = lookup_output(&outputs, &coupling.discipline, &coupling.slot)?;
            let residual = assumed
                .iter()
                .zip(produced.iter())
                .map(|(a, p)| (a - p).powi(2))
                .sum::<f64>();
            consistency.push((coupling.variable.clone(), residual));
        }

        let mut inequalities = Vec::with_capacity(self.inequalities.len());
        for inequality in &self.inequalities {
            let normalized = self.resolve(&inequality.value, x, &outputs)?;
            let physical = normalized * self.ref_scale(&inequality.value)?;
            let value = match inequality.bound {
                Bound::Upper(limit) => physical - limit,
                Bound::Lower(limit) => limit - physical,
            };
            inequalities.push((inequality.name.clone(), value));
        }

        let objective_value = self.resolve(&self.objective.value, x, &outputs)?;
        Ok(Evaluation {
            objective: self.objective.goal.transform(objective_value),
            consistency,
            inequalities,
            outputs,
        })
    }

    /// Total derivatives of the objective and every constraint with respect
    /// to the flattened independent vector, assembled by chaining each
    /// discipline's normalized Jacobian through the explicit edge list.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Assembly::evaluate`].
    pub fn jacobian(&self, x: &ValueMap) -> Result<AssemblyJacobian, EvalError> {
        self.validate_point(x)?;
        let n = self.layout.len();
        let outputs = self.run_disciplines(x)?;

        // Forward accumulation: total derivative of every discipline output
        // with respect to the flat x, in declaration order so upstream
        // totals are always ready.
        let mut totals: Vec<(String, Vec<(String, Array2<f64>)>)> = Vec::new();
        for discipline in &self.disciplines {
            let inputs = self.gather_inputs(discipline.as_ref(), x, &outputs)?;
            let local = Normalized::new(discipline.as_ref()).jacobian(&inputs)?;

            let mut per_output = Vec::with_capacity(discipline.outputs().len());
            for out_spec in discipline.outputs() {
                let mut total = Array2::zeros((out_spec.len(), n));
                for route in self
                    .routes
                    .iter()
                    .filter(|r| r.discipline == discipline.name())
                {
                    let Some(block) = local.block(out_spec.name(), &route.slot) else {
                        continue;
                    };
                    match &route.source {
                        RouteSource::Variable(name) => {
                            let range = self.layout_range(name)?;
                            for ((row, col), value) in block.indexed_iter() {
                                total[[row, range.start + col]] += value;
                            }
                        }
                        RouteSource::Output {
                            discipline: producer,
                            slot,
                        } => {
                            let upstream = lookup_total(&totals, producer, slot)?;
                            total += &block.dot(upstream);
                        }
                    }
                }
                per_output.push((out_spec.name().to_string(), total));
            }
            totals.push((discipline.name().to_string(), per_output));
        }

        let objective = self.ref_gradient(&self.objective.value, &totals)?
            * self.objective.goal.sign();

        let mut consistency = Vec::with_capacity(self.couplings.len());
        for coupling in &self.couplings {
            let assumed = x.slot("assembly", &coupling.variable)?;
            let produced = lookup_output(&outputs, &coupling.discipline, &coupling.slot)?;
            let produced_total = lookup_total(&totals, &coupling.discipline, &coupling.slot)?;
            let range = self.layout_range(&coupling.variable)?;

            let mut row = Array1::zeros(n);
            for k in 0..assumed.len() {
                let gap = assumed[k] - produced[k];
                row[range.start + k] += 2.0 * gap;
                for col in 0..n {
                    row[col] -= 2.0 * gap * produced_total[[k, col]];
                }
            }
            consistency.push((coupling.variable.clone(), row));
        }

        let mut inequalities = Vec::with_capacity(self.inequalities.len());
        for inequality in &self.inequalities {
            let mut row = self.ref_gradient(&inequality.value, &totals)?;
            row *= self.ref_scale(&inequality.value)?;
            if matches!(inequality.bound, Bound::Lower(_)) {
                row *= -1.0;
            }
            inequalities.push((inequality.name.clone(), row));
        }

        Ok(AssemblyJacobian {
            objective,
            consistency,
            inequalities,
        })
    }

    fn validate_point(&self, x: &ValueMap) -> Result<(), EvalError> {
        for spec in &self.variables {
            let value = x.slot("assembly", spec.name())?;
            if value.len() != spec.len() {
                return Err(EvalError::SlotShape {
                    owner: "assembly".to_string(),
                    slot: spec.name().to_string(),
                    expected: spec.len(),
                    actual: value.len(),
                });
            }
        }
        Ok(())
    }

    fn run_disciplines(&self, x: &ValueMap) -> Result<Vec<(String, ValueMap)>, EvalError> {
        let mut outputs = Vec::with_capacity(self.disciplines.len());
        for discipline in &self.disciplines {
            let inputs = self.gather_inputs(discipline.as_ref(), x, &outputs)?;
            let result = Normalized::new(discipline.as_ref()).compute(&inputs)?;
            outputs.push((discipline.name().to_string(), result));
        }
        Ok(outputs)
    }

    fn gather_inputs(
        &self,
        discipline: &dyn Discipline,
        x: &ValueMap,
        outputs: &[(String, ValueMap)],
    ) -> Result<ValueMap, EvalError> {
        let mut inputs = ValueMap::new();
        for route in self
            .routes
            .iter()
            .filter(|r| r.discipline == discipline.name())
        {
            let value = match &route.source {
                RouteSource::Variable(name) => x.slot("assembly", name)?.clone(),
                RouteSource::Output {
                    discipline: producer,
                    slot,
                } => lookup_output(outputs, producer, slot)?.clone(),
            };
            inputs.insert(route.slot.clone(), value);
        }
        Ok(inputs)
    }

    fn resolve(
        &self,
        value: &ValueRef,
        x: &ValueMap,
        outputs: &[(String, ValueMap)],
    ) -> Result<f64, EvalError> {
        match value {
            ValueRef::Variable { name, index } => Ok(x.slot("assembly", name)?[*index]),
            ValueRef::Output {
                discipline,
                slot,
                index,
            } => Ok(lookup_output(outputs, discipline, slot)?[*index]),
        }
    }

    /// The physical-per-normalized factor behind a reference; endpoints were
    /// validated at build time, so a miss here is a defect surfaced as an
    /// evaluation fault rather than a panic.
    fn ref_scale(&self, value: &ValueRef) -> Result<f64, EvalError> {
        match value {
            ValueRef::Variable { name, index } => {
                let spec = self
                    .variables
                    .iter()
                    .find(|s| s.name() == name)
                    .ok_or_else(|| missing("assembly", name))?;
                Ok(spec.scale().factor(*index))
            }
            ValueRef::Output {
                discipline,
                slot,
                index,
            } => {
                let owner = self
                    .discipline(discipline)
                    .ok_or_else(|| missing("assembly", discipline))?;
                let spec = owner
                    .outputs()
                    .iter()
                    .find(|s| s.name() == slot)
                    .ok_or_else(|| missing(discipline, slot))?;
                Ok(spec.scale().factor(*index))
            }
        }
    }

    fn ref_gradient(
        &self,
        value: &ValueRef,
        totals: &[(String, Vec<(String, Array2<f64>)>)],
    ) -> Result<Array1<f64>, EvalError> {
        match value {
            ValueRef::Variable { name, index } => {
                let range = self.layout_range(name)?;
                let mut row = Array1::zeros(self.layout.len());
                row[range.start + index] = 1.0;
                Ok(row)
            }
            ValueRef::Output {
                discipline,
                slot,
                index,
            } => {
                let total = lookup_total(totals, discipline, slot)?;
                Ok(total.row(*index).to_owned())
            }
        }
    }

    fn layout_range(&self, name: &str) -> Result<std::ops::Range<usize>, EvalError> {
        self.layout
            .range(name)
            .ok_or_else(|| missing("assembly", name))
    }
}

fn missing(owner: &str, slot: &str) -> EvalError {
    EvalError::MissingSlot {
        owner: owner.to_string(),
        slot: slot.to_string(),
    }
}

fn lookup_output<'a>(
    outputs: &'a [(String, ValueMap)],
    discipline: &str,
    slot: &str,
) -> Result<&'a Array1<f64>, EvalError> {
    let (_, values) = outputs
        .iter()
        .find(|(name, _)| name == discipline)
        .ok_or_else(|| missing("assembly", discipline))?;
    values.slot(discipline, slot)
}

fn lookup_total<'a>(
    totals: &'a [(String, Vec<(String, Array2<f64>)>)],
    discipline: &str,
    slot: &str,
) -> Result<&'a Array2<f64>, EvalError> {
    let (_, per_output) = totals
        .iter()
        .find(|(name, _)| name == discipline)
        .ok_or_else(|| missing("assembly", discipline))?;
    per_output
        .iter()
        .find(|(name, _)| name == slot)
        .map(|(_, total)| total)
        .ok_or_else(|| missing(discipline, slot))
}

fn find_variable<'a>(
    variables: &'a [VariableSpec],
    name: &str,
) -> Result<&'a VariableSpec, ConfigError> {
    variables
        .iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| ConfigError::UnknownVariable {
            name: name.to_string(),
        })
}

fn find_discipline_index(
    disciplines: &[Box<dyn Discipline>],
    name: &str,
) -> Result<usize, ConfigError> {
    disciplines
        .iter()
        .position(|d| d.name() == name)
        .ok_or_else(|| ConfigError::UnknownDiscipline {
            name: name.to_string(),
        })
}

fn find_slot<'a>(
    discipline: &'a dyn Discipline,
    kind: SlotKind,
    slot: &str,
) -> Result<&'a VariableSpec, ConfigError> {
    let specs = match kind {
        SlotKind::Input => discipline.inputs(),
        SlotKind::Output => discipline.outputs(),
    };
    specs
        .iter()
        .find(|s| s.name() == slot)
        .ok_or_else(|| ConfigError::UnknownSlot {
            discipline: discipline.name().to_string(),
            kind,
            slot: slot.to_string(),
        })
}

fn find_output<'a>(
    disciplines: &'a [Box<dyn Discipline>],
    discipline: &str,
    slot: &str,
) -> Result<&'a VariableSpec, ConfigError> {
    let index = find_discipline_index(disciplines, discipline)?;
    find_slot(disciplines[index].as_ref(), SlotKind::Output, slot)
}

fn validate_route(
    route: &Route,
    variables: &[VariableSpec],
    disciplines: &[Box<dyn Discipline>],
) -> Result<(), ConfigError> {
    let consumer_index = find_discipline_index(disciplines, &route.discipline)?;
    let input = find_slot(disciplines[consumer_index].as_ref(), SlotKind::Input, &route.slot)?;

    let source_len = match &route.source {
        RouteSource::Variable(name) => find_variable(variables, name)?.len(),
        RouteSource::Output { discipline, slot } => {
            let producer_index = find_discipline_index(disciplines, discipline)?;
            if producer_index >= consumer_index {
                return Err(ConfigError::BackwardRoute {
                    consumer: route.discipline.clone(),
                    producer: discipline.clone(),
                });
            }
            find_slot(disciplines[producer_index].as_ref(), SlotKind::Output, slot)?.len()
        }
    };

    if source_len != input.len() {
        return Err(ConfigError::RouteShape {
            discipline: route.discipline.clone(),
            slot: route.slot.clone(),
            expected: input.len(),
            actual: source_len,
        });
    }
    Ok(())
}

fn validate_ref(
    value: &ValueRef,
    variables: &[VariableSpec],
    disciplines: &[Box<dyn Discipline>],
) -> Result<(), ConfigError> {
    match value {
        ValueRef::Variable { name, index } => {
            let spec = find_variable(variables, name)?;
            if *index >= spec.len() {
                return Err(ConfigError::IndexOutOfBounds {
                    name: name.clone(),
                    index: *index,
                    len: spec.len(),
                });
            }
        }
        ValueRef::Output {
            discipline,
            slot,
            index,
        } => {
            let spec = find_output(disciplines, discipline, slot)?;
            if *index >= spec.len() {
                return Err(ConfigError::IndexOutOfBounds {
                    name: format!("{discipline}.{slot}"),
                    index: *index,
                    len: spec.len(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use splice_core::Jacobian;

    use super::*;

    /// Produces `area = span²` from the span variable.
    struct Panel {
        inputs: Vec<VariableSpec>,
        outputs: Vec<VariableSpec>,
    }

    impl Panel {
        fn new() -> Self {
            Self {
                inputs: vec![VariableSpec::scalar("span", 1.0, 2.0).unwrap()],
                outputs: vec![VariableSpec::scalar("area", 1.0, 4.0).unwrap()],
            }
        }
    }

    impl Discipline for Panel {
        fn name(&self) -> &str {
            "Panel"
        }

        fn inputs(&self) -> &[VariableSpec] {
            &self.inputs
        }

        fn outputs(&self) -> &[VariableSpec] {
            &self.outputs
        }

        fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
            let span = inputs.slot_scalar(self.name(), "span")?;
            let mut outputs = ValueMap::new();
            outputs.insert_scalar("area", span * span);
            Ok(outputs)
        }

        fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
            let span = inputs.slot_scalar(self.name(), "span")?;
            let mut jacobian = Jacobian::new();
            jacobian.set_scalar("area", "span", 2.0 * span);
            Ok(jacobian)
        }
    }

    /// Consumes the assumed area copy plus the produced area, producing
    /// `load = 3·area_hat` and `ratio = area / area_hat`.
    struct Loads {
        inputs: Vec<VariableSpec>,
        outputs: Vec<VariableSpec>,
    }

    impl Loads {
        fn new() -> Self {
            Self {
                inputs: vec![
                    VariableSpec::scalar("area_hat", 1.0, 4.0).unwrap(),
                    VariableSpec::scalar("area", 1.0, 4.0).unwrap(),
                ],
                outputs: vec![
                    VariableSpec::scalar("load", 1.0, 12.0).unwrap(),
                    VariableSpec::scalar("ratio", 1.0, 1.0).unwrap(),
                ],
            }
        }
    }

    impl Discipline for Loads {
        fn name(&self) -> &str {
            "Loads"
        }

        fn inputs(&self) -> &[VariableSpec] {
            &self.inputs
        }

        fn outputs(&self) -> &[VariableSpec] {
            &self.outputs
        }

        fn compute(&self, inputs: &ValueMap) -> Result<ValueMap, EvalError> {
            let area_hat = inputs.slot_scalar(self.name(), "area_hat")?;
            let area = inputs.slot_scalar(self.name(), "area")?;
            let mut outputs = ValueMap::new();
            outputs.insert_scalar("load", 3.0 * area_hat);
            outputs.insert_scalar("ratio", area / area_hat);
            Ok(outputs)
        }

        fn jacobian(&self, inputs: &ValueMap) -> Result<Jacobian, EvalError> {
            let area_hat = inputs.slot_scalar(self.name(), "area_hat")?;
            let area = inputs.slot_scalar(self.name(), "area")?;
            let mut jacobian = Jacobian::new();
            jacobian.set_scalar("load", "area_hat", 3.0);
            jacobian.set_scalar("ratio", "area_hat", -area / (area_hat * area_hat));
            jacobian.set_scalar("ratio", "area", 1.0 / area_hat);
            Ok(jacobian)
        }
    }

    fn build() -> Assembly {
        AssemblyBuilder::new()
            .variable(VariableSpec::scalar("span", 1.1, 2.0).unwrap())
            .variable(VariableSpec::scalar("area_hat", 0.9, 4.0).unwrap())
            .discipline(Panel::new())
            .discipline(Loads::new())
            .route("span", "Panel", "span")
            .route("area_hat", "Loads", "area_hat")
            .feed("Panel", "area", "Loads", "area")
            .coupling("area_hat", "Panel", "area")
            .inequality("span_limit", ValueRef::variable("span"), Bound::Upper(2.6))
            .objective(ValueRef::output("Loads", "load"), Goal::Minimize)
            .build()
            .unwrap()
    }

    #[test]
    fn evaluates_the_forward_walk() {
        let assembly = build();
        let evaluation = assembly.evaluate(&assembly.defaults()).unwrap();

        // span 1.1 normalized -> 2.2 physical -> area 4.84 physical -> 1.21
        // normalized; assumed copy is 0.9.
        let panel = evaluation.outputs_of("Panel").unwrap();
        assert_relative_eq!(panel.scalar("area").unwrap(), 1.21);
        assert_relative_eq!(
            evaluation.consistency_residual("area_hat").unwrap(),
            (0.9_f64 - 1.21).powi(2),
        );
        // load = 3 * (0.9 * 4) physical = 10.8, scaled by 12.
        assert_relative_eq!(evaluation.objective, 10.8 / 12.0);
        // span physical 2.2 against the 2.6 limit.
        assert_relative_eq!(evaluation.inequality("span_limit").unwrap(), 2.2 - 2.6);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let assembly = build();
        let x = assembly.defaults();

        let first = assembly.evaluate(&x).unwrap();
        let second = assembly.evaluate(&x).unwrap();
        assert_eq!(first, second);

        let jacobian_a = assembly.jacobian(&x).unwrap();
        let jacobian_b = assembly.jacobian(&x).unwrap();
        assert_eq!(jacobian_a, jacobian_b);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let assembly = build();
        let x = assembly.defaults();
        let jacobian = assembly.jacobian(&x).unwrap();
        let layout = assembly.layout().clone();
        let flat = layout.flatten(&x).unwrap();

        let step = 1e-6;
        for col in 0..layout.len() {
            let mut plus = flat.clone();
            let mut minus = flat.clone();
            plus[col] += step;
            minus[col] -= step;
            let above = assembly.evaluate(&layout.unflatten(&plus)).unwrap();
            let below = assembly.evaluate(&layout.unflatten(&minus)).unwrap();

            let objective_estimate = (above.objective - below.objective) / (2.0 * step);
            assert_relative_eq!(
                jacobian.objective[col],
                objective_estimate,
                max_relative = 1e-5,
                epsilon = 1e-9,
            );

            let residual_estimate = (above.consistency_residual("area_hat").unwrap()
                - below.consistency_residual("area_hat").unwrap())
                / (2.0 * step);
            assert_relative_eq!(
                jacobian.consistency_row("area_hat").unwrap()[col],
                residual_estimate,
                max_relative = 1e-5,
                epsilon = 1e-9,
            );

            let inequality_estimate = (above.inequality("span_limit").unwrap()
                - below.inequality("span_limit").unwrap())
                / (2.0 * step);
            assert_relative_eq!(
                jacobian.inequality_row("span_limit").unwrap()[col],
                inequality_estimate,
                max_relative = 1e-5,
                epsilon = 1e-9,
            );
        }
    }

    #[test]
    fn consistency_residual_is_quadratic_and_nonnegative() {
        let assembly = build();
        let mut x = assembly.defaults();

        // Make the assumed copy agree with the produced area exactly.
        x.insert_scalar("area_hat", 1.21);
        let matched = assembly.evaluate(&x).unwrap();
        assert_relative_eq!(matched.consistency_residual("area_hat").unwrap(), 0.0);

        for delta in [-0.3, -0.1, 0.2, 0.4] {
            x.insert_scalar("area_hat", 1.21 + delta);
            let perturbed = assembly.evaluate(&x).unwrap();
            let residual = perturbed.consistency_residual("area_hat").unwrap();
            assert!(residual >= 0.0);
            assert_relative_eq!(residual, delta * delta, max_relative = 1e-12);
        }
    }

    #[test]
    fn builder_rejects_bad_wiring() {
        let unrouted = AssemblyBuilder::new()
            .variable(VariableSpec::scalar("span", 1.0, 2.0).unwrap())
            .discipline(Panel::new())
            .objective(ValueRef::output("Panel", "area"), Goal::Minimize)
            .build();
        assert!(matches!(unrouted, Err(ConfigError::UnroutedInput { .. })));

        let backward = AssemblyBuilder::new()
            .variable(VariableSpec::scalar("span", 1.0, 2.0).unwrap())
            .variable(VariableSpec::scalar("area_hat", 1.0, 4.0).unwrap())
            .discipline(Loads::new())
            .discipline(Panel::new())
            .route("span", "Panel", "span")
            .route("area_hat", "Loads", "area_hat")
            .feed("Panel", "area", "Loads", "area")
            .objective(ValueRef::output("Loads", "load"), Goal::Minimize)
            .build();
        assert!(matches!(backward, Err(ConfigError::BackwardRoute { .. })));

        let unknown = AssemblyBuilder::new()
            .variable(VariableSpec::scalar("span", 1.0, 2.0).unwrap())
            .discipline(Panel::new())
            .route("chord", "Panel", "span")
            .objective(ValueRef::output("Panel", "area"), Goal::Minimize)
            .build();
        assert!(matches!(unknown, Err(ConfigError::UnknownVariable { .. })));

        let no_objective = AssemblyBuilder::new()
            .variable(VariableSpec::scalar("span", 1.0, 2.0).unwrap())
            .discipline(Panel::new())
            .route("span", "Panel", "span")
            .build();
        assert!(matches!(no_objective, Err(ConfigError::MissingObjective)));
    }
}
