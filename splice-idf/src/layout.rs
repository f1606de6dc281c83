use std::ops::Range;

use ndarray::Array1;
use splice_core::{EvalError, ValueMap, VariableSpec};

/// The flattening of named independent variables into one optimizer vector.
///
/// Columns follow declaration order, with each variable occupying a
/// contiguous range. The layout is fixed at assembly construction, so the
/// same name always maps to the same columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    entries: Vec<(String, Range<usize>)>,
    total: usize,
}

impl Layout {
    pub(crate) fn new(variables: &[VariableSpec]) -> Self {
        let mut entries = Vec::with_capacity(variables.len());
        let mut total = 0;
        for spec in variables {
            let start = total;
            total += spec.len();
            entries.push((spec.name().to_string(), start..total));
        }
        Self { entries, total }
    }

    /// Total number of scalar columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The column range of a named variable.
    #[must_use]
    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.clone())
    }

    /// The column of one element of a named variable.
    #[must_use]
    pub fn column(&self, name: &str, element: usize) -> Option<usize> {
        let range = self.range(name)?;
        let column = range.start + element;
        (column < range.end).then_some(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r.clone()))
    }

    /// Packs named values into a flat vector in layout order.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a variable is missing or mis-shaped.
    pub fn flatten(&self, values: &ValueMap) -> Result<Array1<f64>, EvalError> {
        let mut flat = Array1::zeros(self.total);
        for (name, range) in &self.entries {
            let value = values.slot("layout", name)?;
            if value.len() != range.len() {
                return Err(EvalError::SlotShape {
                    owner: "layout".to_string(),
                    slot: name.clone(),
                    expected: range.len(),
                    actual: value.len(),
                });
            }
            for (offset, &v) in value.iter().enumerate() {
                flat[range.start + offset] = v;
            }
        }
        Ok(flat)
    }

    /// Unpacks a flat vector into named values in layout order.
    ///
    /// # Panics
    ///
    /// Panics if `flat` is shorter than the layout.
    #[must_use]
    pub fn unflatten(&self, flat: &Array1<f64>) -> ValueMap {
        let mut values = ValueMap::new();
        for (name, range) in &self.entries {
            let slice: Vec<f64> = flat.iter().skip(range.start).take(range.len()).copied().collect();
            values.insert(name.clone(), slice);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use splice_core::Scale;

    use super::*;

    fn specs() -> Vec<VariableSpec> {
        vec![
            VariableSpec::vector("z", vec![1.0; 3], Scale::Uniform(1.0)).unwrap(),
            VariableSpec::scalar("thrust", 0.5, 2.0).unwrap(),
        ]
    }

    #[test]
    fn columns_follow_declaration_order() {
        let layout = Layout::new(&specs());

        assert_eq!(layout.len(), 4);
        assert_eq!(layout.range("z"), Some(0..3));
        assert_eq!(layout.column("thrust", 0), Some(3));
        assert_eq!(layout.column("z", 5), None);
        assert_eq!(layout.range("missing"), None);
    }

    #[test]
    fn flatten_and_unflatten_round_trip() {
        let layout = Layout::new(&specs());
        let mut values = ValueMap::new();
        values.insert("z", vec![1.0, 2.0, 3.0]);
        values.insert_scalar("thrust", 4.0);

        let flat = layout.flatten(&values).unwrap();
        assert_eq!(flat, array![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(layout.unflatten(&flat), values);
    }
}
