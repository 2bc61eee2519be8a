//! ASC CDL values in Avid Log Exchange files (`.ale`).
//!
//! ALE files are tab delimited with three sections:
//!
//! ```text
//! Heading
//! FIELD_DELIM	TABS
//! FPS	24
//!
//! Column
//! Name	Start	End	ASC_SOP	ASC_SAT
//!
//! Data
//! A001C003	01:00:00:00	01:00:05:00	(1.1 1.0 0.9)(0.01 0.0 -0.02)(1.0 1.2 0.8)	0.9
//! ```
//!
//! Each data row with an `ASC_SOP` or `ASC_SAT` value yields one correction.
//! The `Name` column gives both its id and name. Read only.

use crate::cdl::select;
use crate::common::{self, parse_f64};
use crate::cube::at_line;
use crate::edl::parse_sop;
use crate::{AscCdl, Lut, LutError, LutResult, ReadOptions};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

const FORMAT: &str = "ALE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Heading,
    Column,
    Data,
}

/// Reads the ASC CDL corrections of an ALE file.
pub fn read_ale(path: &Path, options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let corrections = parse_ale(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), corrections = corrections.len(), "read ALE");
    select(corrections, options, FORMAT)
}

/// Parses the graded rows of an ALE file, in file order.
///
/// Rows without a `Name` value are named `title` followed by their position
/// among the graded rows.
pub fn parse_ale<R: BufRead>(reader: R, title: &str) -> LutResult<Vec<AscCdl>> {
    let mut section = Section::Preamble;
    let mut columns: Vec<String> = Vec::new();
    let mut corrections = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        match line.trim() {
            "Heading" => {
                section = Section::Heading;
                continue;
            }
            "Column" => {
                section = Section::Column;
                continue;
            }
            "Data" => {
                if columns.is_empty() {
                    return Err(LutError::parse("ALE Data section before Column section"));
                }
                section = Section::Data;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Preamble => {
                return Err(LutError::parse(format!(
                    "line {}: expected ALE Heading, found '{}'",
                    number + 1,
                    line.trim()
                )));
            }
            Section::Heading => {}
            Section::Column => {
                if !columns.is_empty() {
                    return Err(LutError::parse("ALE Column section holds more than one row"));
                }
                columns = line.split('\t').map(|c| c.trim().to_string()).collect();
                if !columns.iter().any(|c| c == "ASC_SOP" || c == "ASC_SAT") {
                    return Err(LutError::parse("ALE has no ASC_SOP or ASC_SAT column"));
                }
            }
            Section::Data => {
                let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
                let field = |name: &str| {
                    columns
                        .iter()
                        .position(|c| c == name)
                        .and_then(|i| fields.get(i).copied())
                        .filter(|v| !v.is_empty())
                };

                let sop = field("ASC_SOP");
                let sat = field("ASC_SAT");
                if sop.is_none() && sat.is_none() {
                    continue;
                }

                let name = field("Name")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{title} {}", corrections.len() + 1));
                let mut cdl = AscCdl {
                    id: Some(name.clone()),
                    name,
                    ..Default::default()
                };
                if let Some(sop) = sop {
                    let (slope, offset, power) = parse_sop(sop)
                        .map_err(|e| at_line(e, number))?;
                    cdl.slope = slope;
                    cdl.offset = offset;
                    cdl.power = power;
                }
                if let Some(sat) = sat {
                    cdl.saturation = parse_f64(sat, "ASC_SAT")
                        .map_err(|e| at_line(e, number))?;
                }
                corrections.push(cdl);
            }
        }
    }

    if section != Section::Data {
        return Err(LutError::parse("ALE file has no Data section"));
    }
    Ok(corrections)
}
