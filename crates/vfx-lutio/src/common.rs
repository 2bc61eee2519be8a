//! Helpers shared by the format codecs.

use crate::domain::Channels;
use crate::{Domain, Lut, LutError, LutResult};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tracing::{trace, warn};

/// Derives a display title from a path: file stem, underscores as spaces.
///
/// `"/luts/My_LUT.spi3d"` becomes `"My LUT"`.
pub fn path_to_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

/// Opens a LUT file for buffered reading.
pub(crate) fn open(path: &Path) -> LutResult<BufReader<File>> {
    trace!(path = %path.display(), "opening LUT file");
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(LutError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Creates (or truncates) a LUT file for buffered writing.
pub(crate) fn create(path: &Path) -> LutResult<BufWriter<File>> {
    trace!(path = %path.display(), "creating LUT file");
    Ok(BufWriter::new(File::create(path)?))
}

/// Parses one numeric token, naming `what` in the error.
pub(crate) fn parse_f64(token: &str, what: &str) -> LutResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| LutError::parse(format!("invalid {what} value '{token}'")))
}

/// Parses one non-negative integer token.
pub(crate) fn parse_usize(token: &str, what: &str) -> LutResult<usize> {
    token
        .parse::<usize>()
        .map_err(|_| LutError::parse(format!("invalid {what} '{token}'")))
}

/// Parses every whitespace-separated token of `line` as a float.
pub(crate) fn parse_floats(line: &str, what: &str) -> LutResult<Vec<f64>> {
    line.split_whitespace().map(|t| parse_f64(t, what)).collect()
}

/// Parses exactly three floats.
pub(crate) fn parse_triplet<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    what: &str,
) -> LutResult<[f64; 3]> {
    let mut out = [0.0; 3];
    for v in out.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| LutError::parse(format!("{what} needs 3 values")))?;
        *v = parse_f64(token, what)?;
    }
    if tokens.next().is_some() {
        return Err(LutError::parse(format!("{what} has more than 3 values")));
    }
    Ok(out)
}

/// Formats a float with a fixed number of fractional digits.
#[inline]
pub(crate) fn fmt(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Formats an RGB triple as three space-separated fixed-point floats.
pub(crate) fn fmt_rgb(rgb: [f64; 3], decimals: usize) -> String {
    format!(
        "{} {} {}",
        fmt(rgb[0], decimals),
        fmt(rgb[1], decimals),
        fmt(rgb[2], decimals)
    )
}

/// Replaces a sequence by its first operator for single-table formats.
///
/// Emits a warning when narrowing happens.
pub(crate) fn first_of_sequence<'a>(lut: &'a Lut, format: &str) -> LutResult<Cow<'a, Lut>> {
    match lut {
        Lut::Sequence(seq) => {
            let first = seq.first().ok_or_else(|| {
                LutError::TypeMismatch(format!("{format} cannot write an empty LUT sequence"))
            })?;
            warn!(
                format,
                operators = seq.len(),
                "LUT sequence passed, using first sequence LUT \"{}\"",
                first.name()
            );
            Ok(Cow::Owned(Lut::from(first.clone())))
        }
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Builds the standard "cannot write" type error.
pub(crate) fn unsupported(format: &str, lut: &Lut, expected: &str) -> LutError {
    LutError::TypeMismatch(format!(
        "{format} cannot write a {}, expected {expected}",
        lut.kind()
    ))
}

/// Returns `[min, max]` of an implicit domain, rejecting explicit ones.
pub(crate) fn implicit_bounds<T: Channels>(domain: &Domain<T>, format: &str) -> LutResult<[T; 2]> {
    match domain {
        Domain::Implicit(bounds) => Ok(*bounds),
        Domain::Explicit(_) => Err(LutError::invariant(format!(
            "{format} requires an implicit domain"
        ))),
    }
}

/// Strips one pair of surrounding double quotes.
pub(crate) fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lut1D, Lut3D, LutSequence};
    use std::path::PathBuf;

    #[test]
    fn title_from_path() {
        assert_eq!(path_to_title(Path::new("/tmp/My_LUT.spi3d")), "My LUT");
        assert_eq!(path_to_title(Path::new("grade.cube")), "grade");
        assert_eq!(path_to_title(Path::new("")), "");
    }

    #[test]
    fn missing_file() {
        let path = PathBuf::from("/definitely/not/here.cube");
        assert!(matches!(open(&path), Err(LutError::FileNotFound(p)) if p == path));
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_floats("0.5 1 -2e-1", "row").unwrap(), vec![0.5, 1.0, -0.2]);
        assert!(parse_floats("0.5 x", "row").unwrap_err().is_parse_error());
        assert_eq!(parse_triplet("1 2 3".split_whitespace(), "DOMAIN_MIN").unwrap(), [1.0, 2.0, 3.0]);
        assert!(parse_triplet("1 2".split_whitespace(), "DOMAIN_MIN").is_err());
        assert!(parse_triplet("1 2 3 4".split_whitespace(), "DOMAIN_MIN").is_err());
        assert!(parse_usize("-3", "size").is_err());
    }

    #[test]
    fn formatting() {
        assert_eq!(fmt(0.5, 7), "0.5000000");
        assert_eq!(fmt(1.0 / 3.0, 4), "0.3333");
        assert_eq!(fmt_rgb([0.0, 0.25, 1.0], 2), "0.00 0.25 1.00");
    }

    #[test]
    fn quotes() {
        assert_eq!(unquote("\"My LUT\""), "My LUT");
        assert_eq!(unquote("bare"), "bare");
        assert_eq!(unquote(" \"\" "), "");
    }

    #[test]
    fn narrowing() {
        let single = Lut::from(Lut1D::identity(4));
        assert!(matches!(first_of_sequence(&single, "test").unwrap(), Cow::Borrowed(_)));

        let seq = Lut::from(LutSequence::new([Lut3D::identity(2).with_name("first")]));
        let narrowed = first_of_sequence(&seq, "test").unwrap();
        assert_eq!(narrowed.name(), Some("first"));

        let empty = Lut::from(LutSequence::default());
        assert!(matches!(first_of_sequence(&empty, "test"), Err(LutError::TypeMismatch(_))));
    }
}
