//! ASC CDL XML file formats.
//!
//! - `.cc` - Single ColorCorrection
//! - `.ccc` - ColorCorrectionCollection (multiple CCs)
//! - `.cdl` - ColorDecisionList (CCs wrapped in ColorDecisions)
//!
//! All three share one reader: every `ColorCorrection` element found in
//! the document becomes an [`AscCdl`], whatever the root element is.
//! Descriptions inside a correction are kept as its comments.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vfx_lutio::{cdl, ReadOptions};
//!
//! let options = ReadOptions::default().with_correction_id("shot001");
//! let grade = cdl::read_cdl(Path::new("grades.ccc"), &options)?;
//! # Ok::<(), vfx_lutio::LutError>(())
//! ```
//!
//! # References
//!
//! - ASC CDL v1.01 Specification

use crate::common::{self, fmt};
use crate::{AscCdl, Lut, LutError, LutResult, Operator, ReadOptions, WriteOptions};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesDecl, BytesEnd, BytesRef, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;

const FORMAT: &str = "ASC CDL";
const NAMESPACE: &str = "urn:ASC:CDL:v1.01";

/// Root element written by the CDL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdlFlavor {
    /// `<ColorCorrection>` (`.cc`), exactly one correction.
    Correction,
    /// `<ColorCorrectionCollection>` (`.ccc`).
    Collection,
    /// `<ColorDecisionList>` (`.cdl`).
    DecisionList,
}

impl CdlFlavor {
    /// Picks the root element from the file extension, defaulting to a collection.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "cc" => CdlFlavor::Correction,
            "cdl" => CdlFlavor::DecisionList,
            _ => CdlFlavor::Collection,
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Reads a `.cc`, `.ccc` or `.cdl` file.
///
/// Returns [`Lut::Cdl`] for one correction (or the one selected by
/// [`ReadOptions::correction_id`]) and [`Lut::CdlCollection`] otherwise.
pub fn read_cdl(path: &Path, options: &ReadOptions) -> LutResult<Lut> {
    let reader = common::open(path)?;
    let corrections = parse_cdl(reader, &common::path_to_title(path))?;
    debug!(path = %path.display(), corrections = corrections.len(), "read ASC CDL");
    select(corrections, options, FORMAT)
}

/// Parses every `ColorCorrection` of an ASC CDL XML document.
///
/// Corrections without an `id` are named `title`.
pub fn parse_cdl<R: BufRead>(reader: R, title: &str) -> LutResult<Vec<AscCdl>> {
    let mut xml = Reader::from_reader(reader);

    let mut buf = Vec::new();
    let mut corrections = Vec::new();
    let mut current: Option<AscCdl> = None;
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"ColorCorrection" {
                    current = Some(start_correction(&e, title));
                }
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"ColorCorrection" {
                    corrections.push(start_correction(&e, title));
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "ColorCorrection" {
                    corrections.extend(current.take());
                } else if let Some(cc) = current.as_mut() {
                    match name.as_str() {
                        "Slope" => cc.slope = parse_rgb(&text, "Slope")?,
                        "Offset" => cc.offset = parse_rgb(&text, "Offset")?,
                        "Power" => cc.power = parse_rgb(&text, "Power")?,
                        "Saturation" => cc.saturation = common::parse_f64(text.trim(), "Saturation")?,
                        "Description" | "InputDescription" | "ViewingDescription" => {
                            cc.comments.push(text.trim().to_string());
                        }
                        _ => {}
                    }
                }
                text.clear();
            }
            Ok(Event::Text(e)) => {
                text.push_str(&e.decode().map_err(xml_error)?);
            }
            Ok(Event::GeneralRef(e)) => push_reference(&mut text, &e)?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(LutError::parse("unterminated ColorCorrection element"));
    }
    Ok(corrections)
}

/// Appends the character behind `&...;` to `text`.
fn push_reference(text: &mut String, e: &BytesRef) -> LutResult<()> {
    if let Some(ch) = e.resolve_char_ref().map_err(xml_error)? {
        text.push(ch);
        return Ok(());
    }
    let name = e.decode().map_err(xml_error)?;
    let value = resolve_predefined_entity(&name)
        .ok_or_else(|| LutError::parse(format!("unknown XML entity '&{name};'")))?;
    text.push_str(value);
    Ok(())
}

fn xml_error(e: impl std::fmt::Display) -> LutError {
    LutError::parse(format!("XML error: {e}"))
}

fn start_correction(e: &BytesStart, title: &str) -> AscCdl {
    let id = get_attr(e, b"id");
    AscCdl {
        name: id.clone().unwrap_or_else(|| title.to_string()),
        id,
        ..Default::default()
    }
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn parse_rgb(s: &str, what: &str) -> LutResult<[f64; 3]> {
    common::parse_triplet(s.split_whitespace(), what)
}

/// Turns the corrections of a CDL-family file into the read result.
pub(crate) fn select(corrections: Vec<AscCdl>, options: &ReadOptions, format: &str) -> LutResult<Lut> {
    if let Some(id) = &options.correction_id {
        return corrections
            .into_iter()
            .find(|cc| cc.id.as_deref() == Some(id.as_str()))
            .map(Lut::Cdl)
            .ok_or_else(|| LutError::parse(format!("{format}: no correction with id '{id}'")));
    }

    let mut corrections = corrections;
    match corrections.len() {
        0 => Err(LutError::parse(format!("{format}: no color correction found"))),
        1 => Ok(Lut::Cdl(corrections.remove(0))),
        _ => Ok(Lut::CdlCollection(corrections)),
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Writes an ASC CDL file, picking the root element from the extension.
pub fn write_cdl(lut: &Lut, path: &Path, options: &WriteOptions) -> LutResult<()> {
    let mut writer = common::create(path)?;
    write_cdl_to(&mut writer, lut, options.decimals, CdlFlavor::from_path(path))?;
    writer.flush()?;
    debug!(path = %path.display(), "wrote ASC CDL");
    Ok(())
}

/// Writes ASC CDL XML to any writer.
///
/// Accepts a CDL, a CDL collection, or a sequence made only of CDLs.
pub fn write_cdl_to<W: Write>(writer: W, lut: &Lut, decimals: usize, flavor: CdlFlavor) -> LutResult<()> {
    let corrections: Vec<&AscCdl> = match lut {
        Lut::Cdl(cc) => vec![cc],
        Lut::CdlCollection(ccs) => ccs.iter().collect(),
        Lut::Sequence(seq) => seq
            .iter()
            .map(|op| match op {
                Operator::Cdl(cc) => Ok(cc),
                other => Err(LutError::TypeMismatch(format!(
                    "{FORMAT} cannot write a {} sequence stage",
                    other.kind()
                ))),
            })
            .collect::<LutResult<_>>()?,
        other => return Err(common::unsupported(FORMAT, other, "ASC_CDL")),
    };
    if flavor == CdlFlavor::Correction && corrections.len() != 1 {
        return Err(LutError::TypeMismatch(format!(
            "a .cc file holds exactly one correction, got {}",
            corrections.len()
        )));
    }

    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;

    match flavor {
        CdlFlavor::Correction => write_correction(&mut xml, corrections[0], decimals, true)?,
        CdlFlavor::Collection => {
            let mut root = BytesStart::new("ColorCorrectionCollection");
            root.push_attribute(("xmlns", NAMESPACE));
            xml.write_event(Event::Start(root)).map_err(write_error)?;
            for cc in &corrections {
                write_correction(&mut xml, cc, decimals, false)?;
            }
            xml.write_event(Event::End(BytesEnd::new("ColorCorrectionCollection")))
                .map_err(write_error)?;
        }
        CdlFlavor::DecisionList => {
            let mut root = BytesStart::new("ColorDecisionList");
            root.push_attribute(("xmlns", NAMESPACE));
            xml.write_event(Event::Start(root)).map_err(write_error)?;
            for cc in &corrections {
                xml.write_event(Event::Start(BytesStart::new("ColorDecision")))
                    .map_err(write_error)?;
                write_correction(&mut xml, cc, decimals, false)?;
                xml.write_event(Event::End(BytesEnd::new("ColorDecision")))
                    .map_err(write_error)?;
            }
            xml.write_event(Event::End(BytesEnd::new("ColorDecisionList")))
                .map_err(write_error)?;
        }
    }

    // quick-xml does not terminate the last line.
    xml.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_correction<W: Write>(
    xml: &mut Writer<W>,
    cc: &AscCdl,
    decimals: usize,
    with_namespace: bool,
) -> LutResult<()> {
    let mut start = BytesStart::new("ColorCorrection");
    if with_namespace {
        start.push_attribute(("xmlns", NAMESPACE));
    }
    if let Some(id) = &cc.id {
        start.push_attribute(("id", id.as_str()));
    }
    xml.write_event(Event::Start(start)).map_err(write_error)?;

    for comment in &cc.comments {
        write_text_element(xml, "Description", comment)?;
    }

    let rgb = |v: [f64; 3]| format!("{} {} {}", fmt(v[0], decimals), fmt(v[1], decimals), fmt(v[2], decimals));
    xml.write_event(Event::Start(BytesStart::new("SOPNode"))).map_err(write_error)?;
    write_text_element(xml, "Slope", &rgb(cc.slope))?;
    write_text_element(xml, "Offset", &rgb(cc.offset))?;
    write_text_element(xml, "Power", &rgb(cc.power))?;
    xml.write_event(Event::End(BytesEnd::new("SOPNode"))).map_err(write_error)?;

    xml.write_event(Event::Start(BytesStart::new("SatNode"))).map_err(write_error)?;
    write_text_element(xml, "Saturation", &fmt(cc.saturation, decimals))?;
    xml.write_event(Event::End(BytesEnd::new("SatNode"))).map_err(write_error)?;

    xml.write_event(Event::End(BytesEnd::new("ColorCorrection")))
        .map_err(write_error)?;
    Ok(())
}

/// Helper to write a text element.
fn write_text_element<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> LutResult<()> {
    xml.write_event(Event::Start(BytesStart::new(name))).map_err(write_error)?;
    xml.write_event(Event::Text(BytesText::new(text))).map_err(write_error)?;
    xml.write_event(Event::End(BytesEnd::new(name))).map_err(write_error)?;
    Ok(())
}

fn write_error(e: impl std::fmt::Display) -> LutError {
    LutError::Io(io::Error::other(format!("XML write error: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
