use ndarray::Array2;

/// Partial derivatives of a model's outputs with respect to its inputs,
/// stored as one dense block per (output, input) pair.
///
/// Pairs that are never set are exactly zero: [`Jacobian::block`] returns
/// `None` for them and [`Jacobian::entry`] returns `0.0`. This keeps
/// unrelated pairs free of floating-point noise and lets consumers skip
/// whole blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Jacobian {
    blocks: Vec<(String, String, Array2<f64>)>,
}

impl Jacobian {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the block `d output / d input`, replacing any previous one.
    ///
    /// The block has one row per output element and one column per input
    /// element.
    pub fn set(
        &mut self,
        output: impl Into<String>,
        input: impl Into<String>,
        block: Array2<f64>,
    ) {
        let output = output.into();
        let input = input.into();
        match self
            .blocks
            .iter_mut()
            .find(|(o, i, _)| *o == output && *i == input)
        {
            Some((_, _, existing)) => *existing = block,
            None => self.blocks.push((output, input, block)),
        }
    }

    /// Stores a 1×1 block for a scalar-to-scalar pair.
    pub fn set_scalar(&mut self, output: impl Into<String>, input: impl Into<String>, value: f64) {
        self.set(output, input, Array2::from_elem((1, 1), value));
    }

    #[must_use]
    pub fn block(&self, output: &str, input: &str) -> Option<&Array2<f64>> {
        self.blocks
            .iter()
            .find(|(o, i, _)| o == output && i == input)
            .map(|(_, _, b)| b)
    }

    /// One entry of the full Jacobian; `0.0` for pairs with no stored block.
    ///
    /// # Panics
    ///
    /// Panics if the pair has a block and `row`/`col` are out of bounds.
    #[must_use]
    pub fn entry(&self, output: &str, row: usize, input: &str, col: usize) -> f64 {
        self.block(output, input)
            .map_or(0.0, |block| block[[row, col]])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Array2<f64>)> {
        self.blocks
            .iter()
            .map(|(o, i, b)| (o.as_str(), i.as_str(), b))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &str, &mut Array2<f64>)> {
        self.blocks
            .iter_mut()
            .map(|(o, i, b)| (o.as_str(), i.as_str(), b))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
