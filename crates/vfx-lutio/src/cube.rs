//! Iridas `.cube` LUT format.
//!
//! The single-stage `.cube` grammar: either a 1D table (three channels per
//! row) or a 3D cube, never both.
//!
//! # Format
//!
//! ```text
//! TITLE "LUT Name"
//! # Comment
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//! 0.0 0.0 0.0
//! ...
//! 1.0 1.0 1.0
//! ```
//!
//! 3D rows are stored with red varying fastest. A file declaring both
//! `LUT_1D_SIZE` and `LUT_3D_SIZE` is a Resolve shaper + cube file; the
//! reader hands it to [`resolve`](crate::resolve).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vfx_lutio::{cube, ReadOptions};
//!
//! let lut = cube::read(Path::new("grade.cube"), &ReadOptions::default())?;
//! # Ok::<(), vfx_lutio::LutError>(())
//! ```

use crate::common::{self, first_of_sequence, fmt_rgb, implicit_bounds, parse_triplet, unquote};
use crate::{resolve, Domain, Lut, Lut3D, Lut3x1D, LutError, LutResult, ReadOptions, WriteOptions};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, warn};

const FORMAT: &str = "Iridas Cube";

/// Largest accepted `LUT_1D_SIZE`.
pub const MAX_1D_SIZE: usize = 65536;
/// Largest accepted `LUT_3D_SIZE`.
pub const MAX_3D_SIZE: usize = 256;

/// Reads an Iridas `.cube` file.
///
/// Returns [`Lut::Lut3x1D`] or [`Lut::Lut3D`], or a [`Lut::Sequence`] when the
/// file turns out to hold a Resolve shaper + cube pair.
pub fn read(path: &Path, _options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let lut = parse(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), kind = lut.kind(), "read Iridas cube");
    Ok(lut)
}

/// Parses an Iridas `.cube` file from a reader.
///
/// `title` names the table unless the file carries a `TITLE`.
pub fn parse<R: BufRead>(reader: R, title: &str) -> LutResult<Lut> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    match parse_lines(&lines, title) {
        Err(LutError::UnexpectedStage(reason)) => {
            debug!(%reason, "retrying with the Resolve cube grammar");
            resolve::parse_lines(&lines, title)
        }
        other => other,
    }
}

fn parse_lines(lines: &[String], title: &str) -> LutResult<Lut> {
    let mut title = title.to_string();
    let mut comments = Vec::new();
    let mut domain_min = [0.0; 3];
    let mut domain_max = [1.0; 3];
    let mut size_1d: Option<usize> = None;
    let mut size_3d: Option<usize> = None;
    let mut rows: Vec<[f64; 3]> = Vec::new();

    for (number, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            comments.push(comment.trim().to_string());
            continue;
        }

        let (keyword, rest) = split_keyword(line);
        match keyword {
            "TITLE" => title = unquote(rest).to_string(),
            "DOMAIN_MIN" => domain_min = parse_triplet(rest.split_whitespace(), "DOMAIN_MIN")?,
            "DOMAIN_MAX" => domain_max = parse_triplet(rest.split_whitespace(), "DOMAIN_MAX")?,
            "LUT_1D_SIZE" => size_1d = Some(parse_size(rest, keyword, MAX_1D_SIZE)?),
            "LUT_3D_SIZE" => size_3d = Some(parse_size(rest, keyword, MAX_3D_SIZE)?),
            _ if is_numeric(keyword) => rows.push(
                parse_triplet(line.split_whitespace(), "data row")
                    .map_err(|e| at_line(e, number))?,
            ),
            _ => {
                return Err(LutError::parse(format!(
                    "line {}: unknown keyword '{}'",
                    number + 1,
                    keyword
                )));
            }
        }

        if size_1d.is_some() && size_3d.is_some() {
            return Err(LutError::UnexpectedStage(
                "both LUT_1D_SIZE and LUT_3D_SIZE are declared".into(),
            ));
        }
    }

    let domain = Domain::new(domain_min, domain_max);
    match (size_1d, size_3d) {
        (Some(size), None) => {
            expect_rows(rows.len(), size)?;
            let lut = Lut3x1D::new(rows, domain)?
                .with_name(title)
                .with_comments(comments);
            Ok(Lut::Lut3x1D(lut))
        }
        (None, Some(size)) => {
            expect_rows(rows.len(), size * size * size)?;
            let lut = Lut3D::new(from_red_fastest(&rows, size), size, domain)?
                .with_name(title)
                .with_comments(comments);
            Ok(Lut::Lut3D(lut))
        }
        _ => Err(LutError::parse("missing LUT_1D_SIZE or LUT_3D_SIZE")),
    }
}

/// Writes an Iridas `.cube` file.
pub fn write(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_to(&mut writer, lut, options.decimals)?;
    writer.flush()?;
    debug!(path = %path.display(), kind = lut.kind(), "wrote Iridas cube");
    Ok(())
}

/// Writes an Iridas `.cube` file to any writer.
///
/// Accepts 1D (widened to three channels), 3x1D and 3D tables. A sequence
/// is narrowed to its first operator.
pub fn write_to<W: Write>(mut writer: W, lut: &Lut, decimals: usize) -> LutResult<()> {
    let lut = first_of_sequence(lut, FORMAT)?;
    match &*lut {
        Lut::Lut1D(lut) => {
            warn!(name = %lut.name, "{} has no single channel form, writing LUT1D as LUT3x1D", FORMAT);
            write_3x1d(&mut writer, &lut.to_lut3x1d(), decimals)
        }
        Lut::Lut3x1D(lut) => write_3x1d(&mut writer, lut, decimals),
        Lut::Lut3D(lut) => write_3d(&mut writer, lut, decimals),
        other => Err(common::unsupported(FORMAT, other, "LUT1D, LUT3x1D or LUT3D")),
    }
}

fn write_3x1d<W: Write>(writer: &mut W, lut: &Lut3x1D, decimals: usize) -> LutResult<()> {
    lut.validate()?;
    let [min, max] = implicit_bounds(&lut.domain, FORMAT)?;

    write_title(writer, &lut.name, &lut.comments)?;
    writeln!(writer, "LUT_1D_SIZE {}", lut.size())?;
    writeln!(writer, "DOMAIN_MIN {}", fmt_rgb(min, decimals))?;
    writeln!(writer, "DOMAIN_MAX {}", fmt_rgb(max, decimals))?;
    for row in &lut.table {
        writeln!(writer, "{}", fmt_rgb(*row, decimals))?;
    }
    Ok(())
}

fn write_3d<W: Write>(writer: &mut W, lut: &Lut3D, decimals: usize) -> LutResult<()> {
    lut.validate()?;
    let [min, max] = implicit_bounds(&lut.domain, FORMAT)?;

    write_title(writer, &lut.name, &lut.comments)?;
    writeln!(writer, "LUT_3D_SIZE {}", lut.size)?;
    writeln!(writer, "DOMAIN_MIN {}", fmt_rgb(min, decimals))?;
    writeln!(writer, "DOMAIN_MAX {}", fmt_rgb(max, decimals))?;
    write_red_fastest(writer, lut, decimals)
}

fn write_title<W: Write>(writer: &mut W, name: &str, comments: &[String]) -> LutResult<()> {
    if !name.is_empty() {
        writeln!(writer, "TITLE \"{}\"", name)?;
    }
    for comment in comments {
        writeln!(writer, "# {}", comment)?;
    }
    Ok(())
}

/// Splits a line into its first token and the trimmed remainder.
pub(crate) fn split_keyword(line: &str) -> (&str, &str) {
    line.split_once(char::is_whitespace)
        .map(|(keyword, rest)| (keyword, rest.trim()))
        .unwrap_or((line, ""))
}

/// True if `token` starts like a number rather than a keyword.
pub(crate) fn is_numeric(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

/// Parses a size keyword's value, checking `2..=max`.
pub(crate) fn parse_size(rest: &str, keyword: &str, max: usize) -> LutResult<usize> {
    let size = common::parse_usize(rest.trim(), keyword)?;
    if !(2..=max).contains(&size) {
        return Err(LutError::parse(format!(
            "{keyword} {size} outside supported range 2..={max}"
        )));
    }
    Ok(size)
}

/// Checks the number of data rows against the declared sizes.
pub(crate) fn expect_rows(found: usize, expected: usize) -> LutResult<()> {
    if found != expected {
        return Err(LutError::parse(format!(
            "expected {expected} data rows, found {found}"
        )));
    }
    Ok(())
}

pub(crate) fn at_line(err: LutError, index: usize) -> LutError {
    match err {
        LutError::ParseError(reason) => LutError::ParseError(format!("line {}: {}", index + 1, reason)),
        other => other,
    }
}

/// Reorders file rows (red fastest) into table order (blue fastest).
pub(crate) fn from_red_fastest(rows: &[[f64; 3]], size: usize) -> Vec<[f64; 3]> {
    let mut table = vec![[0.0; 3]; rows.len()];
    for (i, row) in rows.iter().enumerate() {
        let r = i % size;
        let g = (i / size) % size;
        let b = i / (size * size);
        table[(r * size + g) * size + b] = *row;
    }
    table
}

/// Writes the cube entries with red varying fastest.
pub(crate) fn write_red_fastest<W: Write>(writer: &mut W, lut: &Lut3D, decimals: usize) -> LutResult<()> {
    for b in 0..lut.size {
        for g in 0..lut.size {
            for r in 0..lut.size {
                writeln!(writer, "{}", fmt_rgb(lut.get(r, g, b), decimals))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lut1D, LutSequence};
    use std::io::Cursor;

    const IDENTITY_2: &str = "\
TITLE \"Two\"
# made by hand
LUT_3D_SIZE 2
0 0 0
1 0 0
0 1 0
1 1 0
0 0 1
1 0 1
0 1 1
1 1 1
";

    fn parse_str(text: &str) -> LutResult<Lut> {
        parse(Cursor::new(text), "fallback")
    }

    #[test]
    fn test_parse_3d_red_fastest() {
        let lut = parse_str(IDENTITY_2).unwrap();
        let lut = lut.as_lut3d().unwrap();
        assert_eq!(lut.name, "Two");
        assert_eq!(lut.comments, ["made by hand"]);
        assert_eq!(lut.size, 2);
        assert_eq!(lut.table, Lut3D::identity(2).table);
        assert_eq!(lut.get(1, 0, 0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_parse_1d_with_domain() {
        let text = "LUT_1D_SIZE 3\nDOMAIN_MIN -1 -1 -1\nDOMAIN_MAX 2 2 2\n0 0 0\n0.5 0.5 0.5\n1 1 1\n";
        let lut = parse_str(text).unwrap();
        let lut = lut.as_lut3x1d().unwrap();
        assert_eq!(lut.name, "fallback");
        assert_eq!(lut.domain, Domain::new([-1.0; 3], [2.0; 3]));
        assert_eq!(lut.table[1], [0.5; 3]);
    }

    #[test]
    fn test_row_count_mismatch() {
        let err = parse_str("LUT_3D_SIZE 2\n0 0 0\n").unwrap_err();
        assert!(matches!(err, LutError::ParseError(_)));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = parse_str("LUT_3D_SIZE 2\nBOGUS 1\n").unwrap_err();
        assert!(err.to_string().contains("BOGUS"));
    }

    #[test]
    fn test_bad_sizes() {
        assert!(parse_str("LUT_3D_SIZE 1\n0 0 0\n").is_err());
        assert!(parse_str("LUT_3D_SIZE 257\n").is_err());
        assert!(parse_str("0 0 0\n").is_err());
    }

    #[test]
    fn test_shaper_falls_back_to_resolve() {
        let mut text = String::from("LUT_1D_SIZE 2\nLUT_3D_SIZE 2\n0 0 0\n1 1 1\n");
        for line in IDENTITY_2.lines().skip(3) {
            text.push_str(line);
            text.push('\n');
        }
        let lut = parse_str(&text).unwrap();
        let seq = lut.as_sequence().unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.operators[0].name(), "fallback - Shaper");
        assert_eq!(seq.operators[1].name(), "fallback - Cube");
    }

    #[test]
    fn test_write_3d_round_trip() {
        let lut = Lut3D::identity(3).with_name("Round").with_comments(["one", "two"]);
        let mut buf = Vec::new();
        write_to(&mut buf, &Lut::from(lut.clone()), 7).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("TITLE \"Round\"\n# one\n# two\nLUT_3D_SIZE 3\n"));
        // Second row advances red.
        assert!(text.contains("DOMAIN_MAX 1.0000000 1.0000000 1.0000000\n0.0000000 0.0000000 0.0000000\n0.5000000 0.0000000 0.0000000\n"));

        let back = parse_str(&text).unwrap();
        assert_eq!(back, Lut::from(lut));
    }

    #[test]
    fn test_write_1d_widens() {
        let lut = Lut1D::identity(4).with_name("Curve");
        let mut buf = Vec::new();
        write_to(&mut buf, &Lut::from(lut), 5).unwrap();
        let back = parse_str(std::str::from_utf8(&buf).unwrap()).unwrap();
        let back = back.as_lut3x1d().unwrap();
        assert_eq!(back.size(), 4);
        assert_eq!(back.name, "Curve");
    }

    #[test]
    fn test_write_rejects() {
        let mut buf = Vec::new();
        let mtx = Lut::from(crate::Matrix::identity());
        assert!(matches!(write_to(&mut buf, &mtx, 7), Err(LutError::TypeMismatch(_))));

        let explicit = Lut3x1D::new(
            vec![[0.0; 3], [0.5; 3], [1.0; 3]],
            Domain::Explicit(vec![[0.0; 3], [0.1; 3], [1.0; 3]]),
        )
        .unwrap();
        assert!(matches!(
            write_to(&mut buf, &Lut::from(explicit), 7),
            Err(LutError::Invariant(_))
        ));
    }

    #[test]
    fn test_write_sequence_uses_first() {
        let seq = LutSequence::new([Lut3D::identity(2).with_name("First"), Lut3D::identity(2).with_name("Second")]);
        let mut buf = Vec::new();
        write_to(&mut buf, &Lut::from(seq), 3).unwrap();
        let back = parse_str(std::str::from_utf8(&buf).unwrap()).unwrap();
        assert_eq!(back.name(), Some("First"));
    }
}
