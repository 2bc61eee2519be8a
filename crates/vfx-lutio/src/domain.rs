//! Input domains for lookup tables.
//!
//! A domain tells which input values a table's samples cover. Most files
//! only store `(min, max)` per channel and the samples are spread evenly
//! between them (implicit domain). Cinespace pre-LUTs can also carry an
//! arbitrary monotonic axis (explicit domain).

use crate::{LutError, LutResult};
use std::fmt::Debug;

/// Relative tolerance used when deciding that explicit samples are evenly spaced.
const UNIFORM_EPSILON: f64 = 1e-9;

/// Per-sample channel layout: `f64` for single channel tables, `[f64; 3]` for RGB.
pub trait Channels: Copy + PartialEq + Debug {
    /// Number of channels.
    const COUNT: usize;

    /// Returns channel `index`.
    fn channel(&self, index: usize) -> f64;

    /// Builds a sample from a per-channel function.
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self;

    /// Builds a sample holding `value` in every channel.
    fn splat(value: f64) -> Self {
        Self::from_fn(|_| value)
    }
}

impl Channels for f64 {
    const COUNT: usize = 1;

    #[inline]
    fn channel(&self, _index: usize) -> f64 {
        *self
    }

    #[inline]
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        f(0)
    }
}

impl Channels for [f64; 3] {
    const COUNT: usize = 3;

    #[inline]
    fn channel(&self, index: usize) -> f64 {
        self[index]
    }

    #[inline]
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        std::array::from_fn(f)
    }
}

/// The `index`-th of `size` evenly spaced values in `[min, max]`.
///
/// The last sample is exactly `max`.
#[inline]
pub(crate) fn lerp_sample(min: f64, max: f64, index: usize, size: usize) -> f64 {
    if size < 2 || index + 1 >= size {
        return if size < 2 { min } else { max };
    }
    min + (max - min) * (index as f64 / (size - 1) as f64)
}

/// Input domain of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Domain<T> {
    /// Evenly spaced samples between `[min, max]`.
    Implicit([T; 2]),
    /// One input value per table sample, monotonically non-decreasing.
    Explicit(Vec<T>),
}

impl<T: Channels> Domain<T> {
    /// Creates an implicit domain.
    pub fn new(min: T, max: T) -> Self {
        Domain::Implicit([min, max])
    }

    /// The `[0, 1]` domain on every channel.
    pub fn unit() -> Self {
        Domain::Implicit([T::splat(0.0), T::splat(1.0)])
    }

    /// Creates a domain from an explicit sample axis.
    ///
    /// Evenly spaced axes collapse to an implicit domain, so
    /// [`is_explicit`](Self::is_explicit) only reports axes that really
    /// need every sample stored.
    pub fn from_samples(samples: Vec<T>) -> Self {
        if samples.len() >= 2 && is_uniform(&samples) {
            let first = samples[0];
            let last = samples[samples.len() - 1];
            Domain::Implicit([first, last])
        } else {
            Domain::Explicit(samples)
        }
    }

    /// True if the domain cannot be described by a `(min, max)` pair.
    #[inline]
    pub fn is_explicit(&self) -> bool {
        matches!(self, Domain::Explicit(_))
    }

    /// True if this is exactly the `[0, 1]` implicit domain.
    pub fn is_unit(&self) -> bool {
        *self == Self::unit()
    }

    /// Domain minimum.
    pub fn min(&self) -> T {
        match self {
            Domain::Implicit([min, _]) => *min,
            Domain::Explicit(samples) => samples.first().copied().unwrap_or(T::splat(0.0)),
        }
    }

    /// Domain maximum.
    pub fn max(&self) -> T {
        match self {
            Domain::Implicit([_, max]) => *max,
            Domain::Explicit(samples) => samples.last().copied().unwrap_or(T::splat(1.0)),
        }
    }

    /// True if min and max are the same on every channel.
    pub fn is_channel_uniform(&self) -> bool {
        let (min, max) = (self.min(), self.max());
        (1..T::COUNT).all(|c| min.channel(c) == min.channel(0) && max.channel(c) == max.channel(0))
    }

    /// Input sample axis for a table of `size` entries.
    pub fn samples(&self, size: usize) -> Vec<T> {
        match self {
            Domain::Implicit([min, max]) => (0..size)
                .map(|i| T::from_fn(|c| lerp_sample(min.channel(c), max.channel(c), i, size)))
                .collect(),
            Domain::Explicit(samples) => samples.clone(),
        }
    }

    /// Checks the domain against a table of `size` entries.
    pub fn validate(&self, size: usize) -> LutResult<()> {
        let values: &[T] = match self {
            Domain::Implicit(bounds) => bounds,
            Domain::Explicit(samples) => {
                if samples.len() != size {
                    return Err(LutError::ShapeMismatch {
                        expected: size,
                        actual: samples.len(),
                    });
                }
                samples
            }
        };

        for c in 0..T::COUNT {
            if values.iter().any(|v| !v.channel(c).is_finite()) {
                return Err(LutError::NonFinite("domain".into()));
            }
            for pair in values.windows(2) {
                let (lo, hi) = (pair[0].channel(c), pair[1].channel(c));
                if lo > hi {
                    return Err(LutError::InvalidRange { min: lo, max: hi });
                }
            }
        }
        Ok(())
    }

    /// True when a table of `size` samples can be evaluated over this domain.
    pub(crate) fn can_sample(&self, size: usize) -> bool {
        size >= 2
            && match self {
                Domain::Implicit(_) => true,
                Domain::Explicit(samples) => samples.len() == size,
            }
    }

    /// Fractional table index of `x` on `channel`, clamped to `[0, size - 1]`.
    pub(crate) fn position(&self, channel: usize, x: f64, size: usize) -> f64 {
        let last = (size - 1) as f64;
        match self {
            Domain::Implicit([min, max]) => {
                let (lo, hi) = (min.channel(channel), max.channel(channel));
                let span = hi - lo;
                if span.abs() < f64::EPSILON {
                    return 0.0;
                }
                ((x - lo) / span * last).clamp(0.0, last)
            }
            Domain::Explicit(samples) => {
                let axis = |i: usize| samples[i].channel(channel);
                if x <= axis(0) {
                    return 0.0;
                }
                if x >= axis(samples.len() - 1) {
                    return last;
                }
                let hi = samples.partition_point(|s| s.channel(channel) <= x);
                let lo = hi - 1;
                let span = axis(hi) - axis(lo);
                if span <= 0.0 {
                    lo as f64
                } else {
                    lo as f64 + (x - axis(lo)) / span
                }
            }
        }
    }
}

/// Checks a table's entry count and sample values.
pub(crate) fn validate_table<T: Channels>(table: &[T], expected: usize) -> LutResult<()> {
    if expected < 2 {
        return Err(LutError::InvalidSize(format!("LUT size must be >= 2, got {}", expected)));
    }
    if table.len() != expected {
        return Err(LutError::ShapeMismatch {
            expected,
            actual: table.len(),
        });
    }
    if table.iter().any(|v| (0..T::COUNT).any(|c| !v.channel(c).is_finite())) {
        return Err(LutError::NonFinite("table".into()));
    }
    Ok(())
}

/// Linear interpolation of `channel` of `table` at fractional index `position`.
#[inline]
pub(crate) fn interpolate<T: Channels>(table: &[T], channel: usize, position: f64) -> f64 {
    let last = table.len() - 1;
    let i0 = (position.floor() as usize).min(last);
    let i1 = (i0 + 1).min(last);
    let frac = position - i0 as f64;
    table[i0].channel(channel) * (1.0 - frac) + table[i1].channel(channel) * frac
}

fn is_uniform<T: Channels>(samples: &[T]) -> bool {
    let size = samples.len();
    let (first, last) = (samples[0], samples[size - 1]);
    (0..T::COUNT).all(|c| {
        let (min, max) = (first.channel(c), last.channel(c));
        let tolerance = UNIFORM_EPSILON * (1.0 + (max - min).abs());
        samples
            .iter()
            .enumerate()
            .all(|(i, s)| (s.channel(c) - lerp_sample(min, max, i, size)).abs() <= tolerance)
    })
}
