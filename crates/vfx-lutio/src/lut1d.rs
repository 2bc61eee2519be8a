//! 1-dimensional lookup table.
//!
//! A 1D LUT applies the same transfer curve to every color channel.
//! Common uses include:
//! - Gamma correction
//! - Log-to-linear conversion
//! - Shapers in front of a 3D cube

use crate::domain::{interpolate, validate_table};
use crate::{Domain, Lut3x1D, LutResult};

/// A single-channel 1-dimensional lookup table.
///
/// # Example
///
/// ```rust
/// use vfx_lutio::{Domain, Lut1D};
///
/// let domain = Domain::new(-0.1, 1.5);
/// let table = Lut1D::linear_table(16, &domain)
///     .into_iter()
///     .map(|x| x.max(0.0).powf(1.0 / 2.2))
///     .collect();
/// let lut = Lut1D::new(table, domain).unwrap().with_name("My LUT");
/// assert_eq!(lut.size(), 16);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1D {
    /// Display name.
    pub name: String,
    /// Output samples.
    pub table: Vec<f64>,
    /// Input domain.
    pub domain: Domain<f64>,
    /// Free-text comments, written back in order.
    pub comments: Vec<String>,
}

impl Lut1D {
    /// Creates a LUT from samples and a domain.
    ///
    /// # Errors
    ///
    /// Fails if the table has fewer than two entries, holds non-finite
    /// values, or disagrees in length with an explicit domain.
    pub fn new(table: Vec<f64>, domain: Domain<f64>) -> LutResult<Self> {
        let lut = Self {
            name: String::new(),
            table,
            domain,
            comments: Vec::new(),
        };
        lut.validate()?;
        Ok(lut)
    }

    /// Creates an identity (pass-through) LUT over `[0, 1]`.
    pub fn identity(size: usize) -> Self {
        let domain = Domain::unit();
        Self {
            name: format!("Unity {}", size),
            table: Self::linear_table(size, &domain),
            domain,
            comments: Vec::new(),
        }
    }

    /// Evenly spaced samples spanning `domain`.
    ///
    /// Explicit domains return their own sample axis.
    pub fn linear_table(size: usize, domain: &Domain<f64>) -> Vec<f64> {
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

    /// Number of entries.
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

    /// Replicates the curve on three channels.
    pub fn to_lut3x1d(&self) -> Lut3x1D {
        let domain = match &self.domain {
            Domain::Implicit([min, max]) => Domain::Implicit([[*min; 3], [*max; 3]]),
            Domain::Explicit(samples) => Domain::Explicit(samples.iter().map(|s| [*s; 3]).collect()),
        };
        Lut3x1D {
            name: self.name.clone(),
            table: self.table.iter().map(|v| [*v; 3]).collect(),
            domain,
            comments: self.comments.clone(),
        }
    }

    /// Evaluates the curve at `value` using linear interpolation.
    ///
    /// Inputs outside the domain are clamped to it.
    pub fn apply(&self, value: f64) -> f64 {
        if !self.domain.can_sample(self.size()) {
            return value;
        }
        let position = self.domain.position(0, value, self.size());
        interpolate(&self.table, 0, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LutError;

    #[test]
    fn test_identity() {
        let lut = Lut1D::identity(256);
        assert!((lut.apply(0.0) - 0.0).abs() < 1e-9);
        assert!((lut.apply(0.5) - 0.5).abs() < 1e-9);
        assert!((lut.apply(1.0) - 1.0).abs() < 1e-9);
        assert_eq!(lut.name, "Unity 256");
    }

    #[test]
    fn test_gamma() {
        let domain = Domain::unit();
        let table = Lut1D::linear_table(1024, &domain).into_iter().map(|x| x * x).collect();
        let lut = Lut1D::new(table, domain).unwrap();
        assert!((lut.apply(0.5) - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_domain_clamp() {
        let lut = Lut1D::new(vec![0.0, 1.0, 2.0], Domain::new(-1.0, 1.0)).unwrap();
        assert!((lut.apply(0.0) - 1.0).abs() < 1e-12);
        assert_eq!(lut.apply(-5.0), 0.0);
        assert_eq!(lut.apply(5.0), 2.0);
    }

    #[test]
    fn test_explicit_domain() {
        let lut = Lut1D::new(vec![0.0, 0.5, 1.0], Domain::Explicit(vec![0.0, 0.1, 1.0])).unwrap();
        assert!(lut.is_domain_explicit());
        assert!((lut.apply(0.05) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(matches!(
            Lut1D::new(vec![0.0], Domain::unit()),
            Err(LutError::InvalidSize(_))
        ));
        assert!(matches!(
            Lut1D::new(vec![0.0, f64::NAN], Domain::unit()),
            Err(LutError::NonFinite(_))
        ));
        assert!(matches!(
            Lut1D::new(vec![0.0, 1.0], Domain::Explicit(vec![0.0, 0.5, 1.0])),
            Err(LutError::ShapeMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_apply_malformed_passes_through() {
        let mut lut = Lut1D::identity(4);
        lut.table.clear();
        assert_eq!(lut.apply(0.3), 0.3);

        let mut lut = Lut1D::identity(3);
        lut.domain = Domain::Explicit(vec![0.0, 1.0]);
        assert_eq!(lut.apply(0.7), 0.7);
    }

    #[test]
    fn test_to_lut3x1d() {
        let lut = Lut1D::new(vec![0.0, 0.5, 1.0], Domain::new(-0.1, 1.5))
            .unwrap()
            .with_comments(["a"]);
        let wide = lut.to_lut3x1d();
        assert_eq!(wide.size(), 3);
        assert_eq!(wide.table[1], [0.5; 3]);
        assert_eq!(wide.domain, Domain::Implicit([[-0.1; 3], [1.5; 3]]));
        assert_eq!(wide.comments, vec!["a".to_string()]);
    }
}
