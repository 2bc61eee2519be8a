//! Non-table operators and the shared [`ApplyRgb`] capability.
//!
//! Tables, matrices, ranges and ASC CDLs can all be chained into a
//! [`LutSequence`](crate::LutSequence). [`Operator`] is the closed set of
//! things a sequence can hold.

use crate::{Lut1D, Lut3D, Lut3x1D};

/// Rec.709 luma weights used by the ASC CDL saturation operator.
const REC709_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Anything that maps an RGB triple to another RGB triple.
pub trait ApplyRgb {
    /// Applies the operator to one RGB value.
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3];
}

/// A 3x3 color matrix with RGB offset.
///
/// Applies transform: `out = matrix * in + offset`
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    /// Display name.
    pub name: String,
    /// 3x3 matrix in row-major order [row][col]
    pub matrix: [[f64; 3]; 3],
    /// RGB offset added after the matrix
    pub offset: [f64; 3],
    /// Free-text comments.
    pub comments: Vec<String>,
}

impl Matrix {
    /// Create an identity matrix (no transformation).
    pub fn identity() -> Self {
        Self::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], [0.0; 3])
    }

    /// Create from matrix and offset.
    pub fn new(matrix: [[f64; 3]; 3], offset: [f64; 3]) -> Self {
        Self {
            name: String::new(),
            matrix,
            offset,
            comments: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// True if any offset channel is non-zero.
    pub fn has_offset(&self) -> bool {
        self.offset.iter().any(|v| *v != 0.0)
    }

    /// Apply matrix transform to RGB.
    #[inline]
    pub fn apply(&self, rgb: [f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        std::array::from_fn(|row| {
            m[row][0] * rgb[0] + m[row][1] * rgb[1] + m[row][2] * rgb[2] + self.offset[row]
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Linear remap of `[min_in, max_in]` onto `[min_out, max_out]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    /// Display name.
    pub name: String,
    /// Minimum input value.
    pub min_in: f64,
    /// Maximum input value.
    pub max_in: f64,
    /// Minimum output value.
    pub min_out: f64,
    /// Maximum output value.
    pub max_out: f64,
    /// Whether to clamp to the output range.
    pub clamp: bool,
    /// Free-text comments.
    pub comments: Vec<String>,
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }
}

impl Range {
    /// Creates a clamping range.
    pub fn new(min_in: f64, max_in: f64, min_out: f64, max_out: f64) -> Self {
        Self {
            name: String::new(),
            min_in,
            max_in,
            min_out,
            max_out,
            clamp: true,
            comments: Vec::new(),
        }
    }

    /// Disables output clamping.
    pub fn without_clamp(mut self) -> Self {
        self.clamp = false;
        self
    }

    /// Applies the remap to one value.
    pub fn apply(&self, value: f64) -> f64 {
        let range_in = self.max_in - self.min_in;
        let range_out = self.max_out - self.min_out;

        let out = if range_in.abs() < 1e-10 {
            self.min_out
        } else {
            self.min_out + (value - self.min_in) / range_in * range_out
        };

        if self.clamp {
            out.clamp(self.min_out.min(self.max_out), self.max_out.max(self.min_out))
        } else {
            out
        }
    }
}

/// ASC Color Decision List slope / offset / power / saturation.
#[derive(Debug, Clone, PartialEq)]
pub struct AscCdl {
    /// Correction identifier (`id` attribute or EDL event number).
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Slope (multiply) per channel [R, G, B].
    pub slope: [f64; 3],
    /// Offset (add) per channel [R, G, B].
    pub offset: [f64; 3],
    /// Power (gamma) per channel [R, G, B].
    pub power: [f64; 3],
    /// Saturation adjustment (1.0 = no change).
    pub saturation: f64,
    /// Descriptions and notes, in file order.
    pub comments: Vec<String>,
}

impl Default for AscCdl {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            slope: [1.0, 1.0, 1.0],
            offset: [0.0, 0.0, 0.0],
            power: [1.0, 1.0, 1.0],
            saturation: 1.0,
            comments: Vec::new(),
        }
    }
}

impl AscCdl {
    /// Creates a new correction with given SOP values.
    pub fn new(slope: [f64; 3], offset: [f64; 3], power: [f64; 3]) -> Self {
        Self { slope, offset, power, ..Default::default() }
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Applies the CDL: `max(in * slope + offset, 0) ^ power`, then saturation.
    pub fn apply(&self, rgb: [f64; 3]) -> [f64; 3] {
        let mut out: [f64; 3] = std::array::from_fn(|i| {
            (rgb[i] * self.slope[i] + self.offset[i]).max(0.0).powf(self.power[i])
        });
        if (self.saturation - 1.0).abs() > 1e-12 {
            let luma: f64 = out.iter().zip(REC709_LUMA).map(|(v, w)| v * w).sum();
            for v in out.iter_mut() {
                *v = luma + (*v - luma) * self.saturation;
            }
        }
        out
    }
}

/// One stage of a [`LutSequence`](crate::LutSequence).
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Single-channel curve.
    Lut1D(Lut1D),
    /// Per-channel curves.
    Lut3x1D(Lut3x1D),
    /// RGB cube.
    Lut3D(Lut3D),
    /// Matrix with offset.
    Matrix(Matrix),
    /// Range remap.
    Range(Range),
    /// ASC CDL.
    Cdl(AscCdl),
}

impl Operator {
    /// Display name of the wrapped operator.
    pub fn name(&self) -> &str {
        match self {
            Operator::Lut1D(op) => &op.name,
            Operator::Lut3x1D(op) => &op.name,
            Operator::Lut3D(op) => &op.name,
            Operator::Matrix(op) => &op.name,
            Operator::Range(op) => &op.name,
            Operator::Cdl(op) => &op.name,
        }
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Operator::Lut1D(_) => "LUT1D",
            Operator::Lut3x1D(_) => "LUT3x1D",
            Operator::Lut3D(_) => "LUT3D",
            Operator::Matrix(_) => "Matrix",
            Operator::Range(_) => "Range",
            Operator::Cdl(_) => "ASC_CDL",
        }
    }
}

impl ApplyRgb for Lut1D {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        rgb.map(|v| self.apply(v))
    }
}

impl ApplyRgb for Lut3x1D {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.apply(rgb)
    }
}

impl ApplyRgb for Lut3D {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.apply(rgb)
    }
}

impl ApplyRgb for Matrix {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.apply(rgb)
    }
}

impl ApplyRgb for Range {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        rgb.map(|v| self.apply(v))
    }
}

impl ApplyRgb for AscCdl {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.apply(rgb)
    }
}

impl ApplyRgb for Operator {
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        match self {
            Operator::Lut1D(op) => op.apply_rgb(rgb),
            Operator::Lut3x1D(op) => op.apply_rgb(rgb),
            Operator::Lut3D(op) => op.apply_rgb(rgb),
            Operator::Matrix(op) => op.apply_rgb(rgb),
            Operator::Range(op) => op.apply_rgb(rgb),
            Operator::Cdl(op) => op.apply_rgb(rgb),
        }
    }
}

macro_rules! impl_from_operator {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operator {
                fn from(op: $ty) -> Self {
                    Operator::$variant(op)
                }
            }
        )*
    };
}

impl_from_operator! {
    Lut1D => Lut1D,
    Lut3x1D => Lut3x1D,
    Lut3D => Lut3D,
    Matrix => Matrix,
    Range => Range,
    Cdl => AscCdl,
}
