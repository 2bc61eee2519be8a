//! Ordered chains of operators.

use crate::{ApplyRgb, Operator};
use std::ops::Index;

/// An ordered list of operators applied first to last.
///
/// Shaper + cube files (Resolve `.cube`, Cinespace with a non-trivial
/// pre-LUT) read back as a two-element sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LutSequence {
    /// Operators in application order.
    pub operators: Vec<Operator>,
}

impl LutSequence {
    /// Creates a sequence from operators.
    pub fn new(operators: impl IntoIterator<Item = impl Into<Operator>>) -> Self {
        Self {
            operators: operators.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends an operator.
    pub fn push(&mut self, op: impl Into<Operator>) {
        self.operators.push(op.into());
    }

    /// Adds an operator at `index`, shifting later ones.
    pub fn insert(&mut self, index: usize, op: impl Into<Operator>) {
        self.operators.insert(index, op.into());
    }

    /// Removes and returns the operator at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Operator> {
        (index < self.operators.len()).then(|| self.operators.remove(index))
    }

    /// Number of operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// True if the sequence holds no operators.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// First operator.
    pub fn first(&self) -> Option<&Operator> {
        self.operators.first()
    }

    /// Operator at `index`.
    pub fn get(&self, index: usize) -> Option<&Operator> {
        self.operators.get(index)
    }

    /// Iterates operators in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operator> {
        self.operators.iter()
    }
}

impl ApplyRgb for LutSequence {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.operators.iter().fold(rgb, |acc, op| op.apply_rgb(acc))
    }
}

impl Index<usize> for LutSequence {
    type Output = Operator;

    fn index(&self, index: usize) -> &Operator {
        &self.operators[index]
    }
}

impl<'a> IntoIterator for &'a LutSequence {
    type Item = &'a Operator;
    type IntoIter = std::slice::Iter<'a, Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.operators.iter()
    }
}

impl IntoIterator for LutSequence {
    type Item = Operator;
    type IntoIter = std::vec::IntoIter<Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.operators.into_iter()
    }
}

impl FromIterator<Operator> for LutSequence {
    fn from_iter<I: IntoIterator<Item = Operator>>(iter: I) -> Self {
        Self { operators: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lut1D, Matrix, Range};

    #[test]
    fn applies_in_order() {
        let mut seq = LutSequence::default();
        seq.push(Matrix::new([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]], [0.0; 3]));
        seq.push(Range::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(seq.apply_rgb([0.25, 0.75, 0.1]), [0.5, 1.0, 0.2]);

        // Reversed: clamp first, then scale.
        seq.operators.reverse();
        assert_eq!(seq.apply_rgb([0.25, 0.75, 0.1]), [0.5, 1.5, 0.2]);
    }

    #[test]
    fn edit_operations() {
        let mut seq = LutSequence::new([Lut1D::identity(4).with_name("a")]);
        seq.push(Lut1D::identity(4).with_name("c"));
        seq.insert(1, Lut1D::identity(4).with_name("b"));
        let names: Vec<_> = seq.iter().map(Operator::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(seq[2].name(), "c");

        assert_eq!(seq.remove(0).map(|op| op.name().to_string()).as_deref(), Some("a"));
        assert!(seq.remove(5).is_none());
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn empty_is_identity() {
        let seq = LutSequence::default();
        assert!(seq.is_empty());
        assert_eq!(seq.apply_rgb([0.1, 0.2, 0.3]), [0.1, 0.2, 0.3]);
    }
}
