//! 3-dimensional lookup table.
//!
//! A 3D LUT maps RGB input to RGB output through a cube of color values.
//! Common uses include:
//! - Color grading / Look development
//! - Display calibration
//! - Color space conversion

use crate::domain::validate_table;
use crate::{Domain, LutError, LutResult};

/// A 3-dimensional lookup table.
///
/// Stores a cube of RGB values indexed by input RGB. Only uniform grids
/// (the same size on all three axes) are representable.
///
/// # Structure
///
/// - `size^3` entries, each containing RGB output values
/// - Stored row-major `[r][g][b]`: blue varies fastest, then green, then red
/// - Trilinear interpolation for lookup
///
/// # Example
///
/// ```rust
/// use vfx_lutio::{Domain, Lut3D};
///
/// let table = Lut3D::linear_table(16, &Domain::unit())
///     .into_iter()
///     .map(|rgb| rgb.map(|v| v.powf(1.0 / 2.2)))
///     .collect();
/// let lut = Lut3D::new(table, 16, Domain::unit()).unwrap();
/// let out = lut.apply([0.5, 0.3, 0.2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    /// Display name.
    pub name: String,
    /// LUT data: `[R][G][B] -> [R', G', B']`, flattened with B fastest.
    pub table: Vec<[f64; 3]>,
    /// Samples per axis.
    pub size: usize,
    /// Per-channel input domain.
    pub domain: Domain<[f64; 3]>,
    /// Free-text comments, written back in order.
    pub comments: Vec<String>,
}

impl Lut3D {
    /// Creates a 3D LUT from raw data.
    ///
    /// Data must be row-major with exactly `size^3` entries.
    pub fn new(table: Vec<[f64; 3]>, size: usize, domain: Domain<[f64; 3]>) -> LutResult<Self> {
        let lut = Self {
            name: String::new(),
            table,
            size,
            domain,
            comments: Vec::new(),
        };
        lut.validate()?;
        Ok(lut)
    }

    /// Creates an identity (pass-through) 3D LUT over `[0, 1]`.
    pub fn identity(size: usize) -> Self {
        let domain = Domain::unit();
        Self {
            name: format!("Unity {}", size),
            table: Self::linear_table(size, &domain),
            size,
            domain,
            comments: Vec::new(),
        }
    }

    /// The `size^3` lattice spanning `domain`, last axis varying fastest.
    ///
    /// Entry `(i * size + j) * size + k` is `[r_i, g_j, b_k]`.
    pub fn linear_table(size: usize, domain: &Domain<[f64; 3]>) -> Vec<[f64; 3]> {
        let axes = domain.samples(size);
        let size = axes.len();

        let mut table = Vec::with_capacity(size * size * size);
        for i in 0..size {
            for j in 0..size {
                for k in 0..size {
                    table.push([axes[i][0], axes[j][1], axes[k][2]]);
                }
            }
        }
        table
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

    /// Returns the total number of entries in the LUT.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.size * self.size * self.size
    }

    /// True if the domain stores every input sample.
    #[inline]
    pub fn is_domain_explicit(&self) -> bool {
        self.domain.is_explicit()
    }

    /// Re-checks the table and domain invariants.
    pub fn validate(&self) -> LutResult<()> {
        if self.size < 2 {
            return Err(LutError::InvalidSize(format!("LUT size must be >= 2, got {}", self.size)));
        }
        validate_table(&self.table, self.entry_count())?;
        self.domain.validate(self.size)
    }

    /// Returns the flat index for grid position (r, g, b).
    #[inline]
    pub fn index(&self, r: usize, g: usize, b: usize) -> usize {
        (r * self.size + g) * self.size + b
    }

    /// Gets the value at grid position (r, g, b).
    #[inline]
    pub fn get(&self, r: usize, g: usize, b: usize) -> [f64; 3] {
        self.table[self.index(r, g, b)]
    }

    /// Applies the LUT to an RGB value with trilinear interpolation.
    ///
    /// Inputs outside the domain are clamped to it. A table whose shape does
    /// not match `size` (see [`Lut3D::validate`]) passes `rgb` through.
    pub fn apply(&self, rgb: [f64; 3]) -> [f64; 3] {
        if !self.domain.can_sample(self.size) || self.size.checked_pow(3) != Some(self.table.len()) {
            return rgb;
        }
        let last = self.size - 1;
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for c in 0..3 {
            let position = self.domain.position(c, rgb[c], self.size);
            base[c] = (position.floor() as usize).min(last - 1);
            frac[c] = position - base[c] as f64;
        }
        let [ri, gi, bi] = base;
        let [rf, gf, bf] = frac;

        let c000 = self.get(ri, gi, bi);
        let c100 = self.get(ri + 1, gi, bi);
        let c010 = self.get(ri, gi + 1, bi);
        let c110 = self.get(ri + 1, gi + 1, bi);
        let c001 = self.get(ri, gi, bi + 1);
        let c101 = self.get(ri + 1, gi, bi + 1);
        let c011 = self.get(ri, gi + 1, bi + 1);
        let c111 = self.get(ri + 1, gi + 1, bi + 1);

        std::array::from_fn(|i| {
            let c00 = c000[i] * (1.0 - rf) + c100[i] * rf;
            let c01 = c001[i] * (1.0 - rf) + c101[i] * rf;
            let c10 = c010[i] * (1.0 - rf) + c110[i] * rf;
            let c11 = c011[i] * (1.0 - rf) + c111[i] * rf;

            let c0 = c00 * (1.0 - gf) + c10 * gf;
            let c1 = c01 * (1.0 - gf) + c11 * gf;

            c0 * (1.0 - bf) + c1 * bf
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_table_order() {
        let table = Lut3D::linear_table(3, &Domain::unit());
        assert_eq!(table.len(), 27);
        assert_eq!(table[0], [0.0, 0.0, 0.0]);
        assert_eq!(table[1], [0.0, 0.0, 0.5]);
        assert_eq!(table[3], [0.0, 0.5, 0.0]);
        assert_eq!(table[9], [0.5, 0.0, 0.0]);
        assert_eq!(table[26], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_identity() {
        let lut = Lut3D::identity(17);
        let result = lut.apply([0.5, 0.3, 0.8]);
        assert!((result[0] - 0.5).abs() < 1e-9);
        assert!((result[1] - 0.3).abs() < 1e-9);
        assert!((result[2] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_corners() {
        let lut = Lut3D::identity(33);

        let black = lut.apply([0.0, 0.0, 0.0]);
        assert!(black[0].abs() < 1e-12);

        let white = lut.apply([1.0, 1.0, 1.0]);
        assert!((white[0] - 1.0).abs() < 1e-12);

        let red = lut.apply([1.0, 0.0, 0.0]);
        assert!((red[0] - 1.0).abs() < 1e-12);
        assert!(red[1].abs() < 1e-12);
    }

    #[test]
    fn test_from_data() {
        let data: Vec<[f64; 3]> = (0..8).map(|_| [0.5, 0.5, 0.5]).collect();
        let lut = Lut3D::new(data, 2, Domain::unit()).unwrap();
        assert_eq!(lut.apply([0.5, 0.5, 0.5]), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_shape_mismatch() {
        let data: Vec<[f64; 3]> = vec![[0.0; 3]; 7];
        assert!(matches!(
            Lut3D::new(data, 2, Domain::unit()),
            Err(LutError::ShapeMismatch { expected: 8, actual: 7 })
        ));
    }

    #[test]
    fn test_custom_domain() {
        let domain = Domain::new([0.0; 3], [2.0; 3]);
        let lut = Lut3D::new(Lut3D::linear_table(5, &domain), 5, domain).unwrap();
        let out = lut.apply([1.5, 0.25, 1.0]);
        assert!((out[0] - 1.5).abs() < 1e-9);
        assert!((out[1] - 0.25).abs() < 1e-9);
        assert!((out[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_malformed_passes_through() {
        let single = Lut3D {
            name: String::new(),
            table: vec![[0.5; 3]],
            size: 1,
            domain: Domain::unit(),
            comments: Vec::new(),
        };
        assert_eq!(single.apply([0.2, 0.4, 0.6]), [0.2, 0.4, 0.6]);

        let mut short = Lut3D::identity(3);
        short.table.truncate(20);
        assert_eq!(short.apply([0.9; 3]), [0.9; 3]);

        let mut empty = Lut3D::identity(2);
        empty.size = 0;
        empty.table.clear();
        assert_eq!(empty.apply([0.1; 3]), [0.1; 3]);
    }
}
