//! Three independent 1D curves, one per channel.

use crate::domain::{interpolate, validate_table};
use crate::{Domain, LutResult};

/// A 1-dimensional lookup table with a separate curve per RGB channel.
///
/// Each entry of `table` holds the red, green and blue outputs for the
/// matching input sample of `domain`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3x1D {
    /// Display name.
    pub name: String,
    /// Output samples, one RGB triple per entry.
    pub table: Vec<[f64; 3]>,
    /// Per-channel input domain.
    pub domain: Domain<[f64; 3]>,
    /// Free-text comments, written back in order.
    pub comments: Vec<String>,
}

impl Lut3x1D {
    /// Creates a LUT from samples and a domain.
    pub fn new(table: Vec<[f64; 3]>, domain: Domain<[f64; 3]>) -> LutResult<Self> {
        let lut = Self {
            name: String::new(),
            table,
            domain,
            comments: Vec::new(),
        };
        lut.validate()?;
        Ok(lut)
    }

    /// Creates an identity LUT over `[0, 1]`.
    pub fn identity(size: usize) -> Self {
        let domain = Domain::unit();
        Self {
            name: format!("Unity {}", size),
            table: Self::linear_table(size, &domain),
            domain,
            comments: Vec::new(),
        }
    }

    /// Evenly spaced samples spanning `domain` on each channel.
    pub fn linear_table(size: usize, domain: &Domain<[f64; 3]>) -> Vec<[f64; 3]> {
        domain.samples(size)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the comments.
    pub fn with_comments<S: Into<String>>(mut self, comments: impl IntoIterator<Item = S>) -> Self {
        self.comments = comments.into_iter().map(Into::into).collect();
        self
    }

    /// Number of entries per channel.
    #[inline]
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// True if the domain stores every input sample.
    #[inline]
    pub fn is_domain_explicit(&self) -> bool {
        self.domain.is_explicit()
    }

    /// Re-checks the table and domain invariants.
    pub fn validate(&self) -> LutResult<()> {
        validate_table(&self.table, self.table.len())?;
        self.domain.validate(self.size())
    }

    /// Evaluates each channel's curve with linear interpolation.
    pub fn apply(&self, rgb: [f64; 3]) -> [f64; 3] {
        if !self.domain.can_sample(self.size()) {
            return rgb;
        }
        std::array::from_fn(|c| {
            let position = self.domain.position(c, rgb[c], self.size());
            interpolate(&self.table, c, position)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let lut = Lut3x1D::identity(33);
        let out = lut.apply([0.5, 0.25, 0.8]);
        for (o, e) in out.iter().zip([0.5, 0.25, 0.8]) {
            assert!((o - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_per_channel_domain() {
        let domain = Domain::new([-0.1, -0.2, -0.4], [1.5, 3.0, 6.0]);
        let table = Lut3x1D::linear_table(16, &domain);
        assert_eq!(table[0], [-0.1, -0.2, -0.4]);
        assert_eq!(table[15], [1.5, 3.0, 6.0]);

        let lut = Lut3x1D::new(table, domain).unwrap();
        let out = lut.apply([0.7, 1.4, 2.8]);
        assert!((out[0] - 0.7).abs() < 1e-9);
        assert!((out[1] - 1.4).abs() < 1e-9);
        assert!((out[2] - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_apply_malformed_passes_through() {
        let mut lut = Lut3x1D::identity(5);
        lut.table.truncate(1);
        assert_eq!(lut.apply([0.25, 0.5, 0.75]), [0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_shape_mismatch() {
        let domain = Domain::Explicit(vec![[0.0; 3], [0.5; 3], [1.0; 3]]);
        assert!(Lut3x1D::new(vec![[0.0; 3], [1.0; 3]], domain).is_err());
    }
}
