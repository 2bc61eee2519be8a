//! Sony Pictures Imageworks LUT formats (SPI1D, SPI3D).
//!
//! # SPI1D Format
//!
//! ```text
//! Version 1
//! From 0.0 1.0
//! Length 1024
//! Components 3
//! {
//!     0.000000 0.000000 0.000000
//!     0.001000 0.001000 0.001000
//!     ...
//! }
//! ```
//!
//! # SPI3D Format
//!
//! ```text
//! SPILUT 1.0
//! 3 3
//! 32 32 32
//! 0 0 0 0.000000 0.000000 0.000000
//! 0 0 1 0.000000 0.000000 0.033333
//! ...
//! ```
//!
//! Every SPI3D row carries its lattice indices `i j k` (blue fastest). The
//! reader rejects files whose index columns differ from the regular lattice.
//! SPI3D always spans `[0, 1]`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vfx_lutio::{spi, ReadOptions};
//!
//! let lut = spi::read_spi3d(Path::new("grade.spi3d"), &ReadOptions::default())?;
//! # Ok::<(), vfx_lutio::LutError>(())
//! ```
//!
//! # References
//!
//! - [OpenColorIO LUT formats](https://opencolorio.readthedocs.io/en/latest/guides/authoring/luts.html)

use crate::common::{self, first_of_sequence, fmt, implicit_bounds};
use crate::cube::{MAX_3D_SIZE, at_line};
use crate::{Domain, Lut, Lut1D, Lut3D, Lut3x1D, LutError, LutResult, ReadOptions, WriteOptions};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::debug;

const SPI1D: &str = "Sony SPI1D";
const SPI3D: &str = "Sony SPI3D";

// ============================================================================
// SPI1D
// ============================================================================

/// Reads an SPI1D file from disk.
///
/// Returns [`Lut::Lut1D`] for one component and [`Lut::Lut3x1D`] for three.
///
/// # Errors
///
/// Fails on unsupported versions, component counts other than 1 or 3, and
/// when `Length` disagrees with the number of rows.
pub fn read_spi1d(path: &Path, _options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let lut = parse_spi1d(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), kind = lut.kind(), "read SPI1D");
    Ok(lut)
}

/// Parses SPI1D from a reader.
pub fn parse_spi1d<R: BufRead>(reader: R, title: &str) -> LutResult<Lut> {
    let mut version: Option<u32> = None;
    let mut from: Option<[f64; 2]> = None;
    let mut length: Option<usize> = None;
    let mut components = 1usize;
    let mut comments = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut state = BlockState::Header;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            comments.push(comment.trim().to_string());
            continue;
        }

        match state {
            BlockState::Header if line == "{" => state = BlockState::Data,
            BlockState::Header => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                match parts.as_slice() {
                    ["Version", v] => {
                        let v = common::parse_usize(v, "Version")?;
                        if v != 1 {
                            return Err(LutError::parse(format!("unsupported SPI1D version {v}")));
                        }
                        version = Some(1);
                    }
                    ["From", min, max] => {
                        from = Some([common::parse_f64(min, "From")?, common::parse_f64(max, "From")?]);
                    }
                    ["Length", n] => length = Some(common::parse_usize(n, "Length")?),
                    ["Components", n] => {
                        components = common::parse_usize(n, "Components")?;
                        if components != 1 && components != 3 {
                            return Err(LutError::parse(format!(
                                "unsupported SPI1D component count {components}"
                            )));
                        }
                    }
                    _ => {
                        return Err(LutError::parse(format!(
                            "line {}: unexpected SPI1D header line '{}'",
                            number + 1,
                            line
                        )));
                    }
                }
            }
            BlockState::Data if line == "}" => state = BlockState::Done,
            BlockState::Data => {
                let values = common::parse_floats(line, "SPI1D sample").map_err(|e| at_line(e, number))?;
                if values.len() != components {
                    return Err(LutError::parse(format!(
                        "line {}: expected {} values, found {}",
                        number + 1,
                        components,
                        values.len()
                    )));
                }
                rows.push(values);
            }
            BlockState::Done => {
                return Err(LutError::parse(format!(
                    "line {}: data after closing brace",
                    number + 1
                )));
            }
        }
    }

    if version.is_none() {
        return Err(LutError::parse("missing SPI1D Version"));
    }
    let [min, max] = from.ok_or_else(|| LutError::parse("missing SPI1D From"))?;
    let length = length.ok_or_else(|| LutError::parse("missing SPI1D Length"))?;
    if state != BlockState::Done {
        return Err(LutError::parse("unterminated SPI1D data block"));
    }
    if rows.len() != length {
        return Err(LutError::parse(format!(
            "SPI1D Length is {length} but {} rows were found",
            rows.len()
        )));
    }

    if components == 1 {
        let table = rows.into_iter().map(|row| row[0]).collect();
        let lut = Lut1D::new(table, Domain::new(min, max))?
            .with_name(title)
            .with_comments(comments);
        Ok(Lut::Lut1D(lut))
    } else {
        let table = rows.into_iter().map(|row| [row[0], row[1], row[2]]).collect();
        let lut = Lut3x1D::new(table, Domain::new([min; 3], [max; 3]))?
            .with_name(title)
            .with_comments(comments);
        Ok(Lut::Lut3x1D(lut))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Header,
    Data,
    Done,
}

/// Writes an SPI1D file to disk.
pub fn write_spi1d(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_spi1d_to(&mut writer, lut, options.decimals)?;
    writer.flush()?;
    debug!(path = %path.display(), kind = lut.kind(), "wrote SPI1D");
    Ok(())
}

/// Writes SPI1D to any writer.
pub fn write_spi1d_to<W: Write>(mut writer: W, lut: &Lut, decimals: usize) -> LutResult<()> {
    let lut = first_of_sequence(lut, SPI1D)?;
    let (min, max, components, rows, comments) = match &*lut {
        Lut::Lut1D(lut) => {
            lut.validate()?;
            let [min, max] = implicit_bounds(&lut.domain, SPI1D)?;
            let rows: Vec<String> = lut.table.iter().map(|v| fmt(*v, decimals)).collect();
            (min, max, 1, rows, &lut.comments)
        }
        Lut::Lut3x1D(lut) => {
            lut.validate()?;
            let [min, max] = implicit_bounds(&lut.domain, SPI1D)?;
            if !lut.domain.is_channel_uniform() {
                return Err(LutError::invariant(format!(
                    "{SPI1D} requires the same domain on every channel"
                )));
            }
            let rows: Vec<String> = lut.table.iter().map(|v| common::fmt_rgb(*v, decimals)).collect();
            (min[0], max[0], 3, rows, &lut.comments)
        }
        other => return Err(common::unsupported(SPI1D, other, "LUT1D or LUT3x1D")),
    };

    writeln!(writer, "Version 1")?;
    writeln!(writer, "From {} {}", fmt(min, decimals), fmt(max, decimals))?;
    writeln!(writer, "Length {}", rows.len())?;
    writeln!(writer, "Components {}", components)?;
    writeln!(writer, "{{")?;
    for row in &rows {
        writeln!(writer, "    {}", row)?;
    }
    writeln!(writer, "}}")?;

    for comment in comments {
        writeln!(writer, "# {}", comment)?;
    }
    Ok(())
}

// ============================================================================
// SPI3D
// ============================================================================

/// Reads an SPI3D file from disk.
///
/// # Errors
///
/// - [`LutError::ParseError`] when the header is out of order or a row
///   does not hold three indices and three values.
/// - [`LutError::Invariant`] for a non-uniform size line (`4 4 5`) and
///   for index columns that differ from the regular lattice.
pub fn read_spi3d(path: &Path, _options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let lut = parse_spi3d(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), "read SPI3D");
    Ok(Lut::Lut3D(lut))
}

/// Parses SPI3D from a reader.
pub fn parse_spi3d<R: BufRead>(reader: R, title: &str) -> LutResult<Lut3D> {
    let mut header = 0;
    let mut size = 0usize;
    let mut comments = Vec::new();
    let mut indexes: Vec<[usize; 3]> = Vec::new();
    let mut table: Vec<[f64; 3]> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            comments.push(comment.trim().to_string());
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match header {
            0 => {
                if parts.first().map(|p| p.to_ascii_uppercase()).as_deref() != Some("SPILUT") {
                    return Err(LutError::parse(format!("missing SPILUT signature, found '{line}'")));
                }
                header = 1;
            }
            1 => {
                if parts != ["3", "3"] {
                    return Err(LutError::parse(format!("expected '3 3' after SPILUT, found '{line}'")));
                }
                header = 2;
            }
            2 => {
                size = parse_size_line(&parts)?;
                header = 3;
            }
            _ => {
                if parts.len() != 6 {
                    return Err(LutError::parse(format!(
                        "line {}: expected 'i j k r g b', found {} values",
                        number + 1,
                        parts.len()
                    )));
                }
                let mut index = [0usize; 3];
                for (slot, part) in index.iter_mut().zip(&parts[..3]) {
                    *slot = common::parse_usize(part, "SPI3D index").map_err(|e| at_line(e, number))?;
                }
                let rgb = common::parse_triplet(parts[3..].iter().copied(), "SPI3D sample")
                    .map_err(|e| at_line(e, number))?;
                indexes.push(index);
                table.push(rgb);
            }
        }
    }

    if header < 3 {
        return Err(LutError::parse("truncated SPI3D header"));
    }
    let count = size
        .checked_pow(3)
        .ok_or_else(|| LutError::InvalidSize(format!("SPI3D size {size} is too large")))?;
    if indexes.len() != count {
        return Err(LutError::parse(format!(
            "expected {count} SPI3D rows, found {}",
            indexes.len()
        )));
    }
    let expected = lattice_indexes(size);
    if let Some(row) = indexes.iter().zip(&expected).position(|(found, want)| found != want) {
        return Err(LutError::invariant(format!(
            "SPI3D indexes do not match the expected LUT3D lattice at row {}: expected {:?}, found {:?}",
            row, expected[row], indexes[row]
        )));
    }

    Ok(Lut3D::new(table, size, Domain::unit())?
        .with_name(title)
        .with_comments(comments))
}

fn parse_size_line(parts: &[&str]) -> LutResult<usize> {
    if parts.len() != 3 {
        return Err(LutError::parse(format!(
            "SPI3D size line needs 3 values, found {}",
            parts.len()
        )));
    }
    if parts.iter().any(|p| *p != parts[0]) {
        return Err(LutError::invariant(format!(
            "non-uniform SPI3D LUT shape is unsupported: {}",
            parts.join(" ")
        )));
    }
    let size = common::parse_usize(parts[0], "SPI3D size")?;
    if size < 2 {
        return Err(LutError::InvalidSize(format!("SPI3D size must be >= 2, got {size}")));
    }
    if size > MAX_3D_SIZE {
        return Err(LutError::InvalidSize(format!(
            "SPI3D size {size} exceeds the maximum of {MAX_3D_SIZE}"
        )));
    }
    Ok(size)
}

/// Integer lattice indices of a `size^3` table, blue fastest.
///
/// Derived from [`Lut3D::linear_table`] scaled by `size - 1`.
pub fn lattice_indexes(size: usize) -> Vec<[usize; 3]> {
    let scale = size.saturating_sub(1) as f64;
    Lut3D::linear_table(size, &Domain::unit())
        .into_iter()
        .map(|p| p.map(|v| (v * scale).round() as usize))
        .collect()
}

/// Writes an SPI3D file to disk.
pub fn write_spi3d(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_spi3d_to(&mut writer, lut, options.decimals)?;
    writer.flush()?;
    debug!(path = %path.display(), "wrote SPI3D");
    Ok(())
}

/// Writes SPI3D to any writer.
///
/// A sequence is narrowed to its first operator, which must be a 3D table
/// over `[0, 1]`.
pub fn write_spi3d_to<W: Write>(mut writer: W, lut: &Lut, decimals: usize) -> LutResult<()> {
    let lut = first_of_sequence(lut, SPI3D)?;
    let Lut::Lut3D(lut) = &*lut else {
        return Err(common::unsupported(SPI3D, &lut, "LUT3D"));
    };
    if lut.is_domain_explicit() {
        return Err(LutError::invariant(format!("{SPI3D} requires an implicit domain")));
    }
    if !lut.domain.is_unit() {
        return Err(LutError::invariant(format!(
            "{SPI3D} domain must be [[0, 0, 0], [1, 1, 1]], got {:?}",
            lut.domain
        )));
    }
    lut.validate()?;

    let size = lut.size;
    writeln!(writer, "SPILUT 1.0")?;
    writeln!(writer, "3 3")?;
    writeln!(writer, "{size} {size} {size}")?;
    for ([i, j, k], rgb) in lattice_indexes(size).into_iter().zip(&lut.table) {
        writeln!(
            writer,
            "{} {} {} {}",
            i,
            j,
            k,
            common::fmt_rgb(*rgb, decimals)
        )?;
    }
    for comment in &lut.comments {
        writeln!(writer, "# {}", comment)?;
    }
    Ok(())
}
