//! Sony Pictures Imageworks Matrix format (.spimtx).
//!
//! A simple text format storing a 3x3 color matrix with RGB offsets.
//!
//! # Format
//!
//! 12 whitespace-separated float values:
//! ```text
//! m00 m01 m02 offset_r
//! m10 m11 m12 offset_g
//! m20 m21 m22 offset_b
//! ```
//!
//! The offset values are stored in a 16-bit integer range (0-65535)
//! and are normalized to [0,1] on load. Files holding only the 9 matrix
//! values read back with a zero offset.

use crate::common::{self, first_of_sequence, fmt};
use crate::{Lut, LutError, LutResult, Matrix, ReadOptions, WriteOptions};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::debug;

const FORMAT: &str = "Sony SPImtx";

/// Offset normalization factor (16-bit integer range).
const OFFSET_SCALE: f64 = 65535.0;

/// Read a .spimtx file.
pub fn read_spimtx(path: &Path, _options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let matrix = parse_spimtx(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), "read SPImtx");
    Ok(Lut::Matrix(matrix))
}

/// Parse a .spimtx from reader.
pub fn parse_spimtx<R: BufRead>(reader: R, title: &str) -> LutResult<Matrix> {
    let mut comments = Vec::new();
    let mut values: Vec<f64> = Vec::with_capacity(12);

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if let Some(comment) = line.strip_prefix('#') {
            comments.push(comment.trim().to_string());
            continue;
        }
        values.extend(common::parse_floats(line, "spimtx")?);
    }

    let mut matrix = match values.as_slice() {
        [m00, m01, m02, m10, m11, m12, m20, m21, m22] => Matrix::new(
            [[*m00, *m01, *m02], [*m10, *m11, *m12], [*m20, *m21, *m22]],
            [0.0; 3],
        ),
        [m00, m01, m02, r, m10, m11, m12, g, m20, m21, m22, b] => Matrix::new(
            [[*m00, *m01, *m02], [*m10, *m11, *m12], [*m20, *m21, *m22]],
            [r / OFFSET_SCALE, g / OFFSET_SCALE, b / OFFSET_SCALE],
        ),
        _ => {
            return Err(LutError::parse(format!(
                "spimtx requires 9 or 12 values, found {}",
                values.len()
            )));
        }
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(LutError::NonFinite("spimtx matrix".into()));
    }
    matrix.name = title.to_string();
    matrix.comments = comments;
    Ok(matrix)
}

/// Write a .spimtx file.
pub fn write_spimtx(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_spimtx_to(&mut writer, lut, options.decimals)?;
    writer.flush()?;
    debug!(path = %path.display(), "wrote SPImtx");
    Ok(())
}

/// Write a .spimtx to any writer.
///
/// Always writes the 12 value form.
pub fn write_spimtx_to<W: Write>(mut writer: W, lut: &Lut, decimals: usize) -> LutResult<()> {
    let lut = first_of_sequence(lut, FORMAT)?;
    let Lut::Matrix(matrix) = &*lut else {
        return Err(common::unsupported(FORMAT, &lut, "Matrix"));
    };

    for comment in &matrix.comments {
        writeln!(writer, "# {}", comment)?;
    }
    for (row, offset) in matrix.matrix.iter().zip(matrix.offset) {
        writeln!(
            writer,
            "{} {} {} {}",
            fmt(row[0], decimals),
            fmt(row[1], decimals),
            fmt(row[2], decimals),
            fmt(offset * OFFSET_SCALE, decimals)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_spimtx() {
        let content = "1.0 0.0 0.0 0.0\n0.0 1.0 0.0 0.0\n0.0 0.0 1.0 0.0";
        let mtx = parse_spimtx(Cursor::new(content), "Identity").unwrap();
        assert_eq!(mtx.matrix, Matrix::identity().matrix);
        assert!(!mtx.has_offset());
        assert_eq!(mtx.name, "Identity");
    }

    #[test]
    fn test_parse_spimtx_with_offset() {
        // offset[0] = 6553.5 / 65535 = 0.1
        let content = "# bias\n1.0 0.0 0.0 6553.5\n0.0 1.0 0.0 13107.0\n0.0 0.0 1.0 19660.5";
        let mtx = parse_spimtx(Cursor::new(content), "x").unwrap();
        assert!((mtx.offset[0] - 0.1).abs() < 1e-9);
        assert!((mtx.offset[1] - 0.2).abs() < 1e-9);
        assert!((mtx.offset[2] - 0.3).abs() < 1e-9);
        assert_eq!(mtx.comments, ["bias"]);
    }

    #[test]
    fn test_parse_nine_values() {
        let mtx = parse_spimtx(Cursor::new("2 0 0\n0 2 0\n0 0 2\n"), "x").unwrap();
        assert_eq!(mtx.apply([0.25, 0.5, 1.0]), [0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_spimtx(Cursor::new("1 0 0 0 1"), "x").unwrap_err().is_parse_error());
        assert!(parse_spimtx(Cursor::new("1 0 zero 0 1 0 0 0 1"), "x").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut mtx = Matrix::new(
            [[1.1, 0.2, 0.0], [0.0, 0.9, 0.1], [0.05, 0.0, 0.95]],
            [0.01, 0.02, 0.03],
        )
        .with_name("Grade");
        mtx.comments.push("from set".into());

        let mut buf = Vec::new();
        write_spimtx_to(&mut buf, &Lut::from(mtx.clone()), 7).unwrap();
        let parsed = parse_spimtx(Cursor::new(buf), "Grade").unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert!((parsed.matrix[i][j] - mtx.matrix[i][j]).abs() < 1e-7);
            }
            assert!((parsed.offset[i] - mtx.offset[i]).abs() < 1e-9);
        }
        assert_eq!(parsed.comments, mtx.comments);
    }

    #[test]
    fn test_write_rejects_tables() {
        let err = write_spimtx_to(Vec::new(), &Lut::from(crate::Lut3D::identity(2)), 7).unwrap_err();
        assert!(matches!(err, LutError::TypeMismatch(_)));
    }
}
