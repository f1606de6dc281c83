use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, EvalError},
    scale::Scale,
};

/// Declares one named slot: its normalized default value and the scale tying
/// normalized to physical units.
///
/// A spec is pure configuration. Disciplines expose their boundary as a list
/// of specs, and the assembly layer declares its independent variables the
/// same way, so a single shape/scale validation covers both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    name: String,
    default: Array1<f64>,
    scale: Scale,
}

impl VariableSpec {
    /// Declares a scalar slot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale factor is zero or non-finite.
    pub fn scalar(name: impl Into<String>, default: f64, scale: f64) -> Result<Self, ConfigError> {
        Self::new(name, Array1::from(vec![default]), Scale::Uniform(scale))
    }

    /// Declares a fixed-length vector slot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale fails validation against the
    /// default value's length.
    pub fn vector(
        name: impl Into<String>,
        default: impl Into<Array1<f64>>,
        scale: Scale,
    ) -> Result<Self, ConfigError> {
        Self::new(name, default.into(), scale)
    }

    fn new(name: impl Into<String>, default: Array1<f64>, scale: Scale) -> Result<Self, ConfigError> {
        let name = name.into();
        scale.validate(&name, default.len())?;
        Ok(Self {
            name,
            default,
            scale,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed number of elements in this slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.default.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default.is_empty()
    }

    /// The normalized starting value.
    #[must_use]
    pub fn default(&self) -> &Array1<f64> {
        &self.default
    }

    #[must_use]
    pub fn scale(&self) -> &Scale {
        &self.scale
    }
}

/// An ordered collection of named values: the slot currency at every
/// discipline and assembly boundary.
///
/// Iteration follows insertion order, so repeated walks over the same map
/// are deterministic and evaluations are reproducible bit for bit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueMap {
    entries: Vec<(String, Array1<f64>)>,
}

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `name`, replacing any existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Array1<f64>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Inserts a length-one value under `name`.
    pub fn insert_scalar(&mut self, name: impl Into<String>, value: f64) {
        self.insert(name, vec![value]);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Array1<f64>> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The single element of a length-one entry, if present and scalar.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(value) if value.len() == 1 => Some(value[0]),
            _ => None,
        }
    }

    /// Looks up `name` on behalf of `owner`, failing with the owner's
    /// identity in the error.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingSlot`] if the entry is absent.
    pub fn slot(&self, owner: &str, name: &str) -> Result<&Array1<f64>, EvalError> {
        self.get(name).ok_or_else(|| EvalError::MissingSlot {
            owner: owner.to_string(),
            slot: name.to_string(),
        })
    }

    /// Like [`ValueMap::slot`], but also requires the entry to be scalar.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingSlot`] or [`EvalError::SlotShape`].
    pub fn slot_scalar(&self, owner: &str, name: &str) -> Result<f64, EvalError> {
        let value = self.slot(owner, name)?;
        if value.len() != 1 {
            return Err(EvalError::SlotShape {
                owner: owner.to_string(),
                slot: name.to_string(),
                expected: 1,
                actual: value.len(),
            });
        }
        Ok(value[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn spec_validates_scale_against_length() {
        let err = VariableSpec::vector("z", vec![1.0; 6], Scale::per_element(vec![1.0; 5]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::ScaleShape { .. }));

        let spec = VariableSpec::vector("z", vec![1.0; 6], Scale::per_element(vec![2.0; 6]))
            .unwrap();
        assert_eq!(spec.len(), 6);
        assert_eq!(spec.scale().factor(3), 2.0);
    }

    #[test]
    fn insert_replaces_in_place_and_preserves_order() {
        let mut values = ValueMap::new();
        values.insert_scalar("a", 1.0);
        values.insert("b", vec![2.0, 3.0]);
        values.insert_scalar("a", 4.0);

        let names: Vec<_> = values.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(values.scalar("a"), Some(4.0));
        assert_eq!(values.get("b"), Some(&array![2.0, 3.0]));
    }

    #[test]
    fn slot_lookup_reports_owner() {
        let values = ValueMap::new();

        let err = values.slot("Propulsion", "D").unwrap_err();

        assert_eq!(
            err.to_string(),
            "`Propulsion` received no value for slot `D`"
        );
    }

    #[test]
    fn scalar_lookup_rejects_vectors() {
        let mut values = ValueMap::new();
        values.insert("z", vec![1.0, 2.0]);

        assert_eq!(values.scalar("z"), None);
        assert!(matches!(
            values.slot_scalar("Aerodynamics", "z"),
            Err(EvalError::SlotShape { .. })
        ));
    }
}
