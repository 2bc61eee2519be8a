//! LUT error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for LUT operations.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur while building, reading or writing LUTs.
#[derive(Debug, Error)]
pub enum LutError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The LUT file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Extension or method is not registered for the requested direction.
    #[error("unknown LUT format: {0}")]
    UnknownFormat(String),

    /// Grammar violation while parsing a LUT file.
    #[error("parse error: {0}")]
    ParseError(String),

    /// A single-stage grammar found a second (shaper) stage.
    #[error("unexpected LUT stage: {0}")]
    UnexpectedStage(String),

    /// Structural invariant violated (grid shape, index lattice, domain).
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// The LUT variant cannot be represented by the target format.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Table length does not match the declared size.
    #[error("shape mismatch: expected {expected} entries, got {actual}")]
    ShapeMismatch {
        /// Expected entry count
        expected: usize,
        /// Actual entry count
        actual: usize,
    },

    /// Invalid LUT size.
    #[error("invalid LUT size: {0}")]
    InvalidSize(String),

    /// Domain minimum exceeds its maximum.
    #[error("invalid domain range: [{min}, {max}]")]
    InvalidRange {
        /// Minimum value
        min: f64,
        /// Maximum value
        max: f64,
    },

    /// Table or domain holds NaN or infinite samples.
    #[error("non-finite value in {0}")]
    NonFinite(String),
}

impl LutError {
    /// Returns true for grammar-level failures.
    ///
    /// These are the failures the dispatch layer may answer by retrying an
    /// Iridas `.cube` file with the Resolve grammar.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, LutError::ParseError(_) | LutError::UnexpectedStage(_))
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        LutError::ParseError(reason.into())
    }

    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        LutError::Invariant(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classification() {
        assert!(LutError::parse("bad token").is_parse_error());
        assert!(LutError::UnexpectedStage("shaper".into()).is_parse_error());
        assert!(!LutError::invariant("4 4 5").is_parse_error());
        assert!(!LutError::FileNotFound(PathBuf::from("a.cube")).is_parse_error());
    }

    #[test]
    fn messages() {
        let err = LutError::ShapeMismatch { expected: 8, actual: 7 };
        assert_eq!(err.to_string(), "shape mismatch: expected 8 entries, got 7");
        let err = LutError::FileNotFound(PathBuf::from("grade.spi3d"));
        assert_eq!(err.to_string(), "file not found: grade.spi3d");
    }
}
