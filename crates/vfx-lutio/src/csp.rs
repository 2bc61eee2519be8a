//! Cinespace (CSP) LUT file format parser and writer.
//!
//! CSP stores a per-channel pre-LUT (shaper) in front of a 1D or 3D table.
//!
//! # Format Structure
//!
//! ```text
//! CSPLUTV100
//! 1D or 3D
//!
//! BEGIN METADATA
//! <title>
//! <comment lines>
//! END METADATA
//!
//! <prelut_r_count>
//! <input_samples_r>
//! <output_samples_r>
//! <prelut_g_count>
//! <input_samples_g>
//! <output_samples_g>
//! <prelut_b_count>
//! <input_samples_b>
//! <output_samples_b>
//!
//! <lut_size> (for 1D) or <size_r> <size_g> <size_b> (for 3D)
//! <r g b>
//! ...
//! ```
//!
//! 3D rows are stored with red varying fastest.
//!
//! The pre-LUT is folded into the table model when it can be:
//! - two points per channel mapping `[min, max]` onto `[0, 1]` become the
//!   table's implicit domain;
//! - one point per table sample, with outputs evenly spread over `[0, 1]`,
//!   become an explicit domain;
//! - anything else reads back as a `[Lut3x1D shaper, table]` sequence.
//!
//! # References
//!
//! - OpenColorIO FileFormatCSP.cpp

use crate::common::{self, fmt, fmt_rgb, implicit_bounds};
use crate::cube::{MAX_1D_SIZE, MAX_3D_SIZE, from_red_fastest, parse_size, write_red_fastest};
use crate::domain::lerp_sample;
use crate::{
    Domain, Lut, Lut1D, Lut3D, Lut3x1D, LutError, LutResult, LutSequence, Operator, ReadOptions,
    WriteOptions,
};
use std::borrow::Cow;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, warn};

const FORMAT: &str = "Cinespace";
const HEADER: &str = "CSPLUTV100";
const SHAPER_SUFFIX: &str = " - Shaper";

/// Tolerance when matching pre-LUT outputs against an even `[0, 1]` ramp.
const RAMP_TOLERANCE: f64 = 1e-6;

/// One channel of the pre-LUT.
#[derive(Debug, Clone, PartialEq)]
struct PreLutChannel {
    inputs: Vec<f64>,
    outputs: Vec<f64>,
}

impl PreLutChannel {
    /// True for the two-point `[min, max] -> [0, 1]` form.
    fn is_linear_unit(&self) -> bool {
        self.outputs.len() == 2
            && self.outputs[0].abs() <= RAMP_TOLERANCE
            && (self.outputs[1] - 1.0).abs() <= RAMP_TOLERANCE
    }

    /// True if the outputs are an even `[0, 1]` ramp of `size` points.
    fn is_ramp(&self, size: usize) -> bool {
        self.outputs.len() == size
            && self
                .outputs
                .iter()
                .enumerate()
                .all(|(i, v)| (v - lerp_sample(0.0, 1.0, i, size)).abs() <= RAMP_TOLERANCE)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Reads a CSP file.
pub fn read_csp(path: &Path, _options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let lut = parse_csp(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), kind = lut.kind(), "read Cinespace LUT");
    Ok(lut)
}

/// Parses a CSP file from a reader.
///
/// `title` names the table unless the metadata block carries one.
pub fn parse_csp<R: BufRead>(reader: R, title: &str) -> LutResult<Lut> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    let mut cursor = Lines { lines: &lines, pos: 0 };

    let header = cursor.next_nonempty()?;
    if header != HEADER {
        return Err(LutError::parse(format!("invalid CSP header: {header}")));
    }
    let is_3d = match cursor.next_nonempty()? {
        "3D" => true,
        "1D" => false,
        other => return Err(LutError::parse(format!("invalid CSP LUT type: {other}"))),
    };

    let (title, comments) = match cursor.metadata()? {
        Some(mut metadata) if !metadata.is_empty() => {
            let title = metadata.remove(0);
            (title, metadata)
        }
        _ => (title.to_string(), Vec::new()),
    };

    let prelut = [
        cursor.prelut_channel()?,
        cursor.prelut_channel()?,
        cursor.prelut_channel()?,
    ];

    let (size, table) = if is_3d {
        let parts: Vec<&str> = cursor.next_nonempty()?.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(LutError::parse(format!(
                "expected 3 CSP cube dimensions, found {}",
                parts.len()
            )));
        }
        if parts.iter().any(|p| *p != parts[0]) {
            return Err(LutError::invariant(format!(
                "non-uniform CSP cube shape is unsupported: {}",
                parts.join(" ")
            )));
        }
        let size = parse_size(parts[0], "CSP cube size", MAX_3D_SIZE)?;
        let count = size
            .checked_pow(3)
            .ok_or_else(|| LutError::parse(format!("CSP cube size {size} is too large")))?;
        let rows = cursor.rows(count)?;
        (size, from_red_fastest(&rows, size))
    } else {
        let size = parse_size(cursor.next_nonempty()?, "CSP 1D size", MAX_1D_SIZE)?;
        (size, cursor.rows(size)?)
    };
    if let Some(extra) = cursor.next_nonempty().ok() {
        return Err(LutError::parse(format!("unexpected data after CSP table: '{extra}'")));
    }

    build(is_3d, size, table, prelut, title, comments)
}

fn build(
    is_3d: bool,
    size: usize,
    table: Vec<[f64; 3]>,
    prelut: [PreLutChannel; 3],
    title: String,
    comments: Vec<String>,
) -> LutResult<Lut> {
    let make_table = |domain: Domain<[f64; 3]>, name: String| -> LutResult<Operator> {
        if is_3d {
            Ok(Lut3D::new(table.clone(), size, domain)?
                .with_name(name)
                .with_comments(comments.clone())
                .into())
        } else {
            Ok(Lut3x1D::new(table.clone(), domain)?
                .with_name(name)
                .with_comments(comments.clone())
                .into())
        }
    };

    if prelut.iter().all(PreLutChannel::is_linear_unit) {
        let min = std::array::from_fn(|c| prelut[c].inputs[0]);
        let max = std::array::from_fn(|c| prelut[c].inputs[1]);
        return Ok(Lut::from(make_table(Domain::new(min, max), title)?));
    }

    if prelut.iter().all(|channel| channel.is_ramp(size)) {
        let samples = (0..size)
            .map(|i| std::array::from_fn(|c| prelut[c].inputs[i]))
            .collect();
        return Ok(Lut::from(make_table(Domain::from_samples(samples), title)?));
    }

    let count = prelut[0].inputs.len();
    if prelut.iter().any(|channel| channel.inputs.len() != count) {
        return Err(LutError::invariant(format!(
            "CSP pre-LUT channels have different lengths: {} {} {}",
            prelut[0].inputs.len(),
            prelut[1].inputs.len(),
            prelut[2].inputs.len()
        )));
    }
    let inputs = (0..count)
        .map(|i| std::array::from_fn(|c| prelut[c].inputs[i]))
        .collect();
    let outputs = (0..count)
        .map(|i| std::array::from_fn(|c| prelut[c].outputs[i]))
        .collect();
    let shaper = Lut3x1D::new(outputs, Domain::from_samples(inputs))?
        .with_name(format!("{title}{SHAPER_SUFFIX}"));
    let main = make_table(Domain::unit(), title)?;
    Ok(Lut::Sequence(LutSequence::new([Operator::from(shaper), main])))
}

/// Cursor over the file's lines.
struct Lines<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn next_nonempty(&mut self) -> LutResult<&'a str> {
        while let Some(line) = self.lines.get(self.pos) {
            self.pos += 1;
            let line = line.trim();
            if !line.is_empty() {
                return Ok(line);
            }
        }
        Err(LutError::parse("unexpected end of CSP file"))
    }

    /// Returns the metadata block, if the next non-empty line opens one.
    fn metadata(&mut self) -> LutResult<Option<Vec<String>>> {
        let start = self.pos;
        if self.next_nonempty()? != "BEGIN METADATA" {
            self.pos = start;
            return Ok(None);
        }

        let mut metadata = Vec::new();
        while let Some(line) = self.lines.get(self.pos) {
            self.pos += 1;
            let line = line.trim();
            if line == "END METADATA" {
                return Ok(Some(metadata));
            }
            metadata.push(line.to_string());
        }
        Err(LutError::parse("unterminated CSP metadata block"))
    }

    fn prelut_channel(&mut self) -> LutResult<PreLutChannel> {
        let count = common::parse_usize(self.next_nonempty()?, "CSP pre-LUT count")?;
        let inputs = common::parse_floats(self.next_nonempty()?, "CSP pre-LUT input")?;
        let outputs = common::parse_floats(self.next_nonempty()?, "CSP pre-LUT output")?;

        if count < 2 || inputs.len() != count || outputs.len() != count {
            return Err(LutError::parse(format!(
                "CSP pre-LUT count mismatch: expected {}, got inputs={}, outputs={}",
                count,
                inputs.len(),
                outputs.len()
            )));
        }
        Ok(PreLutChannel { inputs, outputs })
    }

    fn rows(&mut self, count: usize) -> LutResult<Vec<[f64; 3]>> {
        (0..count)
            .map(|_| common::parse_triplet(self.next_nonempty()?.split_whitespace(), "CSP table row"))
            .collect()
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Writes a CSP file.
pub fn write_csp(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_csp_to(&mut writer, lut, options.decimals)?;
    writer.flush()?;
    debug!(path = %path.display(), kind = lut.kind(), "wrote Cinespace LUT");
    Ok(())
}

/// Writes a CSP file to a writer.
///
/// Accepts a 1D, 3x1D or 3D table, or a `[shaper, table]` sequence whose
/// table spans `[0, 1]`.
pub fn write_csp_to<W: Write>(mut w: W, lut: &Lut, decimals: usize) -> LutResult<()> {
    let (shaper, main) = split_stages(lut)?;

    let (name, mut comments) = match &main {
        Main::Curve(lut) => (lut.name.as_str(), lut.comments.clone()),
        Main::Cube(lut) => (lut.name.as_str(), lut.comments.clone()),
    };
    if let Some(shaper) = &shaper {
        comments.splice(0..0, shaper.comments.iter().cloned());
    }

    writeln!(w, "{HEADER}")?;
    writeln!(w, "{}", if matches!(main, Main::Cube(_)) { "3D" } else { "1D" })?;
    writeln!(w)?;
    writeln!(w, "BEGIN METADATA")?;
    writeln!(w, "{}", name)?;
    for comment in &comments {
        writeln!(w, "{}", comment)?;
    }
    writeln!(w, "END METADATA")?;
    writeln!(w)?;

    let prelut: [PreLutChannel; 3] = match &shaper {
        Some(shaper) => {
            shaper.validate()?;
            let inputs = shaper.domain.samples(shaper.size());
            std::array::from_fn(|c| PreLutChannel {
                inputs: inputs.iter().map(|v| v[c]).collect(),
                outputs: shaper.table.iter().map(|v| v[c]).collect(),
            })
        }
        None => {
            let (domain, size) = match &main {
                Main::Curve(lut) => (&lut.domain, lut.size()),
                Main::Cube(lut) => (&lut.domain, lut.size),
            };
            domain_prelut(domain, size)
        }
    };
    for channel in &prelut {
        writeln!(w, "{}", channel.inputs.len())?;
        writeln!(w, "{}", join(&channel.inputs, decimals))?;
        writeln!(w, "{}", join(&channel.outputs, decimals))?;
    }
    writeln!(w)?;

    match &main {
        Main::Curve(lut) => {
            lut.validate()?;
            writeln!(w, "{}", lut.size())?;
            for row in &lut.table {
                writeln!(w, "{}", fmt_rgb(*row, decimals))?;
            }
        }
        Main::Cube(lut) => {
            lut.validate()?;
            writeln!(w, "{0} {0} {0}", lut.size)?;
            write_red_fastest(&mut w, lut, decimals)?;
        }
    }
    Ok(())
}

enum Main<'a> {
    Curve(Cow<'a, Lut3x1D>),
    Cube(&'a Lut3D),
}

fn split_stages(lut: &Lut) -> LutResult<(Option<Cow<'_, Lut3x1D>>, Main<'_>)> {
    let expected = "LUT1D, LUT3x1D, LUT3D or a (shaper, table) sequence";
    let (shaper, main) = match lut {
        Lut::Sequence(seq) => match seq.operators.as_slice() {
            [main] => (None, main),
            [shaper, main] => (Some(as_curve(shaper, expected)?), main),
            ops => {
                return Err(LutError::TypeMismatch(format!(
                    "{FORMAT} cannot write a sequence of {} operators, expected {expected}",
                    ops.len()
                )));
            }
        },
        Lut::Lut1D(lut) => return Ok((None, Main::Curve(Cow::Owned(widen(lut))))),
        Lut::Lut3x1D(lut) => return Ok((None, Main::Curve(Cow::Borrowed(lut)))),
        Lut::Lut3D(lut) => return Ok((None, Main::Cube(lut))),
        other => return Err(common::unsupported(FORMAT, other, expected)),
    };

    let main = match main {
        Operator::Lut3D(lut) => Main::Cube(lut),
        other => Main::Curve(as_curve(other, expected)?),
    };
    if shaper.is_some() {
        let unit = match &main {
            Main::Curve(lut) => lut.domain.is_unit(),
            Main::Cube(lut) => lut.domain.is_unit(),
        };
        if !unit {
            return Err(LutError::invariant(format!(
                "{FORMAT} table following a shaper must span [0, 1]"
            )));
        }
    }
    Ok((shaper, main))
}

fn as_curve<'a>(op: &'a Operator, expected: &str) -> LutResult<Cow<'a, Lut3x1D>> {
    match op {
        Operator::Lut1D(lut) => Ok(Cow::Owned(widen(lut))),
        Operator::Lut3x1D(lut) => Ok(Cow::Borrowed(lut)),
        other => Err(LutError::TypeMismatch(format!(
            "{FORMAT} cannot write a {} stage, expected {expected}",
            other.kind()
        ))),
    }
}

fn widen(lut: &Lut1D) -> Lut3x1D {
    warn!(name = %lut.name, "{} has no single channel form, writing LUT1D as LUT3x1D", FORMAT);
    lut.to_lut3x1d()
}

/// Pre-LUT carrying a table's own domain.
fn domain_prelut(domain: &Domain<[f64; 3]>, size: usize) -> [PreLutChannel; 3] {
    match implicit_bounds(domain, FORMAT) {
        Ok([min, max]) => std::array::from_fn(|c| PreLutChannel {
            inputs: vec![min[c], max[c]],
            outputs: vec![0.0, 1.0],
        }),
        Err(_) => {
            let samples = domain.samples(size);
            std::array::from_fn(|c| PreLutChannel {
                inputs: samples.iter().map(|v| v[c]).collect(),
                outputs: (0..samples.len()).map(|i| lerp_sample(0.0, 1.0, i, samples.len())).collect(),
            })
        }
    }
}

fn join(values: &[f64], decimals: usize) -> String {
    values
        .iter()
        .map(|v| fmt(*v, decimals))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================
