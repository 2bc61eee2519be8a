//! ASC CDL values embedded in CMX3600 edit decision lists (`.edl`).
//!
//! ```text
//! TITLE: Reel 1
//! FCM: NON-DROP FRAME
//!
//! 001  A001C003 V     C        01:00:00:00 01:00:05:00 00:00:00:00 00:00:05:00
//! * FROM CLIP NAME: A001C003_220101.mov
//! *ASC_SOP (1.1 1.0 0.9)(0.01 0.0 -0.02)(1.0 1.2 0.8)
//! *ASC_SAT 0.9
//! ```
//!
//! Each event carrying `*ASC_SOP` or `*ASC_SAT` yields one correction whose
//! id is the event number. Other `*` notes become comments. Read only.

use crate::cdl::select;
use crate::common::{self, parse_f64};
use crate::cube::at_line;
use crate::{AscCdl, Lut, LutError, LutResult, ReadOptions};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

const FORMAT: &str = "EDL";
const CLIP_NAME: &str = "FROM CLIP NAME:";

/// Reads the ASC CDL corrections of an EDL.
pub fn read_edl(path: &Path, options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let corrections = parse_edl(reader)?;
    debug!(path = %path.display(), corrections = corrections.len(), "read EDL");
    select(corrections, options, FORMAT)
}

/// Parses the graded events of an EDL, in file order.
pub fn parse_edl<R: BufRead>(reader: R) -> LutResult<Vec<AscCdl>> {
    let mut corrections = Vec::new();
    let mut event: Option<Event> = None;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(note) = line.strip_prefix('*') {
            let Some(event) = event.as_mut() else {
                continue;
            };
            let note = note.trim();
            if let Some(sop) = note.strip_prefix("ASC_SOP") {
                let (slope, offset, power) = parse_sop(sop).map_err(|e| at_line(e, number))?;
                event.cdl.slope = slope;
                event.cdl.offset = offset;
                event.cdl.power = power;
                event.graded = true;
            } else if let Some(sat) = note.strip_prefix("ASC_SAT") {
                event.cdl.saturation = parse_f64(sat.trim(), "ASC_SAT").map_err(|e| at_line(e, number))?;
                event.graded = true;
            } else if let Some(name) = note.strip_prefix(CLIP_NAME) {
                event.cdl.name = name.trim().to_string();
            } else {
                event.cdl.comments.push(note.to_string());
            }
            continue;
        }

        let mut tokens = line.split_whitespace();
        if let (Some(id), Some(_)) = (tokens.next(), tokens.next()) {
            if id.chars().all(|c| c.is_ascii_digit()) {
                if let Some(done) = event.take() {
                    corrections.extend(done.finish());
                }
                event = Some(Event::new(id));
            }
        }
    }

    if let Some(done) = event.take() {
        corrections.extend(done.finish());
    }
    Ok(corrections)
}

struct Event {
    cdl: AscCdl,
    graded: bool,
}

impl Event {
    fn new(id: &str) -> Self {
        Self {
            cdl: AscCdl {
                id: Some(id.to_string()),
                name: id.to_string(),
                ..Default::default()
            },
            graded: false,
        }
    }

    fn finish(self) -> Option<AscCdl> {
        self.graded.then_some(self.cdl)
    }
}

/// Parses `(s s s)(o o o)(p p p)` into slope, offset and power.
pub(crate) fn parse_sop(text: &str) -> LutResult<([f64; 3], [f64; 3], [f64; 3])> {
    let cleaned: String = text
        .chars()
        .map(|c| if c == '(' || c == ')' { ' ' } else { c })
        .collect();
    let values = common::parse_floats(&cleaned, "ASC_SOP")?;
    match values.as_slice() {
        [s0, s1, s2, o0, o1, o2, p0, p1, p2] => {
            Ok(([*s0, *s1, *s2], [*o0, *o1, *o2], [*p0, *p1, *p2]))
        }
        _ => Err(LutError::parse(format!(
            "ASC_SOP needs 9 values, found {}",
            values.len()
        ))),
    }
}
