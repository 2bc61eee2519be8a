//! Resolve `.cube` LUT format.
//!
//! Resolve extends the `.cube` grammar with a shaper: a file may declare a
//! 1D table and a 3D cube, in which case the 1D rows come first and the
//! pair reads back as a two-operator [`LutSequence`].
//!
//! ```text
//! TITLE "Log to Rec709"
//! LUT_1D_SIZE 4096
//! LUT_1D_INPUT_RANGE -0.125 1.125
//! LUT_3D_SIZE 33
//! LUT_3D_INPUT_RANGE 0.0 1.0
//! <4096 shaper rows>
//! <33^3 cube rows, red fastest>
//! ```
//!
//! Input ranges are a single `min max` pair, so every stage needs the same
//! implicit domain on all three channels.

use crate::common::{self, fmt, fmt_rgb, implicit_bounds, unquote};
use crate::cube::{at_line, expect_rows, from_red_fastest, is_numeric, parse_size, split_keyword, write_red_fastest, MAX_1D_SIZE, MAX_3D_SIZE};
use crate::{
    Domain, Lut, Lut3D, Lut3x1D, LutError, LutResult, LutSequence, Operator, ReadOptions,
    WriteOptions,
};
use std::borrow::Cow;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, warn};

const FORMAT: &str = "Resolve Cube";
const SHAPER_SUFFIX: &str = " - Shaper";
const CUBE_SUFFIX: &str = " - Cube";

/// Reads a Resolve `.cube` file.
pub fn read(path: &Path, _options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let lut = parse(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), kind = lut.kind(), "read Resolve cube");
    Ok(lut)
}

/// Parses a Resolve `.cube` file from a reader.
pub fn parse<R: BufRead>(reader: R, title: &str) -> LutResult<Lut> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    parse_lines(&lines, title)
}

pub(crate) fn parse_lines(lines: &[String], title: &str) -> LutResult<Lut> {
    let mut title = title.to_string();
    let mut comments = Vec::new();
    let mut size_1d: Option<usize> = None;
    let mut size_3d: Option<usize> = None;
    let mut range_1d = [0.0, 1.0];
    let mut range_3d = [0.0, 1.0];
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
            "LUT_1D_SIZE" => size_1d = Some(parse_size(rest, keyword, MAX_1D_SIZE)?),
            "LUT_3D_SIZE" => size_3d = Some(parse_size(rest, keyword, MAX_3D_SIZE)?),
            "LUT_1D_INPUT_RANGE" => range_1d = parse_range(rest, keyword)?,
            "LUT_3D_INPUT_RANGE" => range_3d = parse_range(rest, keyword)?,
            _ if is_numeric(keyword) => rows.push(
                common::parse_triplet(line.split_whitespace(), "data row")
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
    }

    let domain_1d = Domain::new([range_1d[0]; 3], [range_1d[1]; 3]);
    let domain_3d = Domain::new([range_3d[0]; 3], [range_3d[1]; 3]);
    match (size_1d, size_3d) {
        (Some(size), None) => {
            expect_rows(rows.len(), size)?;
            let lut = Lut3x1D::new(rows, domain_1d)?
                .with_name(title)
                .with_comments(comments);
            Ok(Lut::Lut3x1D(lut))
        }
        (None, Some(size)) => {
            expect_rows(rows.len(), size * size * size)?;
            let lut = Lut3D::new(from_red_fastest(&rows, size), size, domain_3d)?
                .with_name(title)
                .with_comments(comments);
            Ok(Lut::Lut3D(lut))
        }
        (Some(shaper_size), Some(cube_size)) => {
            expect_rows(rows.len(), shaper_size + cube_size * cube_size * cube_size)?;
            let cube_rows = rows.split_off(shaper_size);
            let shaper = Lut3x1D::new(rows, domain_1d)?.with_name(format!("{title}{SHAPER_SUFFIX}"));
            let cube = Lut3D::new(from_red_fastest(&cube_rows, cube_size), cube_size, domain_3d)?
                .with_name(format!("{title}{CUBE_SUFFIX}"))
                .with_comments(comments);
            Ok(Lut::Sequence(LutSequence::new([
                Operator::Lut3x1D(shaper),
                Operator::Lut3D(cube),
            ])))
        }
        (None, None) => Err(LutError::parse("missing LUT_1D_SIZE or LUT_3D_SIZE")),
    }
}

fn parse_range(rest: &str, keyword: &str) -> LutResult<[f64; 2]> {
    let values = common::parse_floats(rest, keyword)?;
    match values.as_slice() {
        [min, max] => Ok([*min, *max]),
        _ => Err(LutError::parse(format!("{keyword} needs 2 values, found {}", values.len()))),
    }
}

/// Writes a Resolve `.cube` file.
pub fn write(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_to(&mut writer, lut, options.decimals)?;
    writer.flush()?;
    debug!(path = %path.display(), kind = lut.kind(), "wrote Resolve cube");
    Ok(())
}

/// Writes a Resolve `.cube` file to any writer.
///
/// Accepts a 1D/3x1D table, a 3D table, or a sequence of a shaper followed
/// by a cube.
pub fn write_to<W: Write>(mut writer: W, lut: &Lut, decimals: usize) -> LutResult<()> {
    let (shaper, cube) = split_stages(lut)?;

    let title = match (&shaper, cube) {
        (Some(_), Some(cube)) => cube.name.strip_suffix(CUBE_SUFFIX).unwrap_or(&cube.name),
        (None, Some(cube)) => cube.name.as_str(),
        (Some(shaper), None) => shaper.name.as_str(),
        (None, None) => "",
    };
    if !title.is_empty() {
        writeln!(writer, "TITLE \"{}\"", title)?;
    }
    let comments = shaper.iter().flat_map(|s| s.comments.iter());
    for comment in comments.chain(cube.iter().flat_map(|c| c.comments.iter())) {
        writeln!(writer, "# {}", comment)?;
    }

    if let Some(shaper) = &shaper {
        shaper.validate()?;
        let [min, max] = uniform_range(&shaper.domain)?;
        writeln!(writer, "LUT_1D_SIZE {}", shaper.size())?;
        writeln!(writer, "LUT_1D_INPUT_RANGE {} {}", fmt(min, decimals), fmt(max, decimals))?;
    }
    if let Some(cube) = cube {
        cube.validate()?;
        let [min, max] = uniform_range(&cube.domain)?;
        writeln!(writer, "LUT_3D_SIZE {}", cube.size)?;
        writeln!(writer, "LUT_3D_INPUT_RANGE {} {}", fmt(min, decimals), fmt(max, decimals))?;
    }

    if let Some(shaper) = &shaper {
        for row in &shaper.table {
            writeln!(writer, "{}", fmt_rgb(*row, decimals))?;
        }
    }
    if let Some(cube) = cube {
        write_red_fastest(&mut writer, cube, decimals)?;
    }
    Ok(())
}

type Stages<'a> = (Option<Cow<'a, Lut3x1D>>, Option<&'a Lut3D>);

fn split_stages(lut: &Lut) -> LutResult<Stages<'_>> {
    let expected = "LUT1D, LUT3x1D, LUT3D or a (shaper, LUT3D) sequence";
    match lut {
        Lut::Lut1D(lut) => Ok((Some(Cow::Owned(widen(lut))), None)),
        Lut::Lut3x1D(lut) => Ok((Some(Cow::Borrowed(lut)), None)),
        Lut::Lut3D(lut) => Ok((None, Some(lut))),
        Lut::Sequence(seq) => match seq.operators.as_slice() {
            [Operator::Lut1D(lut)] => Ok((Some(Cow::Owned(widen(lut))), None)),
            [Operator::Lut3x1D(lut)] => Ok((Some(Cow::Borrowed(lut)), None)),
            [Operator::Lut3D(lut)] => Ok((None, Some(lut))),
            [Operator::Lut1D(shaper), Operator::Lut3D(cube)] => {
                Ok((Some(Cow::Owned(widen(shaper))), Some(cube)))
            }
            [Operator::Lut3x1D(shaper), Operator::Lut3D(cube)] => {
                Ok((Some(Cow::Borrowed(shaper)), Some(cube)))
            }
            ops => Err(LutError::TypeMismatch(format!(
                "{FORMAT} cannot write a sequence of [{}], expected {expected}",
                ops.iter().map(Operator::kind).collect::<Vec<_>>().join(", ")
            ))),
        },
        other => Err(common::unsupported(FORMAT, other, expected)),
    }
}

fn widen(lut: &crate::Lut1D) -> Lut3x1D {
    warn!(name = %lut.name, "{} has no single channel form, writing LUT1D as LUT3x1D", FORMAT);
    lut.to_lut3x1d()
}

fn uniform_range(domain: &Domain<[f64; 3]>) -> LutResult<[f64; 2]> {
    let [min, max] = implicit_bounds(domain, FORMAT)?;
    if !domain.is_channel_uniform() {
        return Err(LutError::invariant(format!(
            "{FORMAT} requires the same input range on every channel, got {min:?} - {max:?}"
        )));
    }
    Ok([min[0], max[0]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApplyRgb, Lut1D};
    use std::io::Cursor;

    fn shaper_and_cube() -> LutSequence {
        let shaper = Lut3x1D::new(
            vec![[0.0; 3], [0.25; 3], [0.5; 3], [1.0; 3]],
            Domain::new([-0.5; 3], [1.5; 3]),
        )
        .unwrap()
        .with_name("Film - Shaper");
        let cube = Lut3D::identity(3).with_name("Film - Cube").with_comments(["graded"]);
        LutSequence::new([Operator::from(shaper), Operator::from(cube)])
    }

    #[test]
    fn test_sequence_round_trip() {
        let seq = shaper_and_cube();
        let mut buf = Vec::new();
        write_to(&mut buf, &Lut::from(seq.clone()), 7).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(
            "TITLE \"Film\"\n# graded\nLUT_1D_SIZE 4\nLUT_1D_INPUT_RANGE -0.5000000 1.5000000\nLUT_3D_SIZE 3\n"
        ));

        let back = parse(Cursor::new(text), "ignored").unwrap();
        assert_eq!(back, Lut::from(seq));
    }

    #[test]
    fn test_single_stages() {
        let text = "LUT_3D_SIZE 2\nLUT_3D_INPUT_RANGE 0 2\n0 0 0\n2 0 0\n0 2 0\n2 2 0\n0 0 2\n2 0 2\n0 2 2\n2 2 2\n";
        let lut = parse(Cursor::new(text), "Wide").unwrap();
        let lut = lut.as_lut3d().unwrap();
        assert_eq!(lut.name, "Wide");
        assert_eq!(lut.domain, Domain::new([0.0; 3], [2.0; 3]));
        assert_eq!(lut.apply_rgb([1.0, 0.5, 2.0]), [1.0, 0.5, 2.0]);

        let lut = parse(Cursor::new("LUT_1D_SIZE 2\n0 0 0\n1 1 1\n"), "Ramp").unwrap();
        assert_eq!(lut.as_lut3x1d().map(Lut3x1D::size), Some(2));
    }

    #[test]
    fn test_domain_keywords_rejected() {
        let err = parse(Cursor::new("LUT_3D_SIZE 2\nDOMAIN_MIN 0 0 0\n"), "x").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_write_rejects_non_uniform_range() {
        let cube = Lut3D::new(
            Lut3D::identity(2).table,
            2,
            Domain::new([0.0, 0.0, 0.0], [1.0, 2.0, 1.0]),
        )
        .unwrap();
        let err = write_to(Vec::new(), &Lut::from(cube), 7).unwrap_err();
        assert!(matches!(err, LutError::Invariant(_)));
    }

    #[test]
    fn test_write_rejects_bad_sequence() {
        let seq = LutSequence::new([Lut3D::identity(2), Lut3D::identity(2)]);
        let err = write_to(Vec::new(), &Lut::from(seq), 7).unwrap_err();
        assert!(matches!(err, LutError::TypeMismatch(_)));
    }

    #[test]
    fn test_1d_shaper_is_widened() {
        let seq = LutSequence::new([
            Operator::from(Lut1D::identity(5).with_name("T - Shaper")),
            Operator::from(Lut3D::identity(2).with_name("T - Cube")),
        ]);
        let mut buf = Vec::new();
        write_to(&mut buf, &Lut::from(seq), 6).unwrap();
        let back = parse(Cursor::new(buf), "x").unwrap();
        let back = back.as_sequence().unwrap();
        assert!(matches!(&back.operators[0], Operator::Lut3x1D(s) if s.size() == 5));
    }
}
