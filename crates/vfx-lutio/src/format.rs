//! Format registry and path-based dispatch.
//!
//! Formats are a closed enum. Each variant knows its extensions and carries
//! its codec's read and write functions, so the read and write registries
//! are just [`Format::readable`] and [`Format::writable`].
//!
//! # Cube ambiguity
//!
//! `.cube` maps to [`Format::IridasCube`]. Resolve writes shaper + cube
//! files with the same extension, so a failed Iridas read that is a grammar
//! failure ([`LutError::is_parse_error`]) is retried once as
//! [`Format::ResolveCube`]. Writing a [`LutSequence`](crate::LutSequence)
//! through Iridas is upgraded to Resolve, since only Resolve has two stages.

use crate::{ale, cdl, csp, cube, edl, resolve, spi, spi_mtx};
use crate::{Lut, LutError, LutResult, ReadOptions, WriteOptions};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Codec read entry point.
pub type ReadFn = fn(&Path, &ReadOptions) -> LutResult<Lut>;

/// Codec write entry point.
pub type WriteFn = fn(&Lut, &Path, &WriteOptions) -> LutResult<()>;

/// Supported LUT file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Iridas / Adobe `.cube`, single stage.
    IridasCube,
    /// DaVinci Resolve `.cube`, optional shaper + cube.
    ResolveCube,
    /// Sony Pictures Imageworks 1D LUT.
    SonySpi1d,
    /// Sony Pictures Imageworks 3D LUT.
    SonySpi3d,
    /// Sony Pictures Imageworks matrix.
    SonySpiMtx,
    /// Cinespace `.csp`.
    Cinespace,
    /// ASC CDL XML (`.cc`, `.ccc`, `.cdl`).
    AscCdl,
    /// CMX3600 EDL with ASC CDL notes.
    Edl,
    /// Avid Log Exchange with ASC CDL columns.
    Ale,
}

impl Format {
    /// Every format, in registry order.
    pub const ALL: [Format; 9] = [
        Format::IridasCube,
        Format::ResolveCube,
        Format::SonySpi1d,
        Format::SonySpi3d,
        Format::SonySpiMtx,
        Format::Cinespace,
        Format::AscCdl,
        Format::Edl,
        Format::Ale,
    ];

    /// Display name, also accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Format::IridasCube => "Iridas Cube",
            Format::ResolveCube => "Resolve Cube",
            Format::SonySpi1d => "Sony SPI1D",
            Format::SonySpi3d => "Sony SPI3D",
            Format::SonySpiMtx => "Sony SPImtx",
            Format::Cinespace => "Cinespace",
            Format::AscCdl => "ASC CDL",
            Format::Edl => "EDL",
            Format::Ale => "ALE",
        }
    }

    /// Lowercase extensions, without the dot.
    ///
    /// Resolve has none of its own: `.cube` resolves to Iridas first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::IridasCube => &["cube"],
            Format::ResolveCube => &[],
            Format::SonySpi1d => &["spi1d"],
            Format::SonySpi3d => &["spi3d"],
            Format::SonySpiMtx => &["spimtx"],
            Format::Cinespace => &["csp"],
            Format::AscCdl => &["cc", "ccc", "cdl"],
            Format::Edl => &["edl"],
            Format::Ale => &["ale"],
        }
    }

    /// Looks up a format by extension, case-insensitively. A leading dot
    /// is accepted.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Looks up a format from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Codec reader.
    pub fn reader(self) -> Option<ReadFn> {
        let read: ReadFn = match self {
            Format::IridasCube => cube::read,
            Format::ResolveCube => resolve::read,
            Format::SonySpi1d => spi::read_spi1d,
            Format::SonySpi3d => spi::read_spi3d,
            Format::SonySpiMtx => spi_mtx::read_spimtx,
            Format::Cinespace => csp::read_csp,
            Format::AscCdl => cdl::read_cdl,
            Format::Edl => edl::read_edl,
            Format::Ale => ale::read_ale,
        };
        Some(read)
    }

    /// Codec writer, `None` for read-only formats.
    pub fn writer(self) -> Option<WriteFn> {
        let write: WriteFn = match self {
            Format::IridasCube => cube::write,
            Format::ResolveCube => resolve::write,
            Format::SonySpi1d => spi::write_spi1d,
            Format::SonySpi3d => spi::write_spi3d,
            Format::SonySpiMtx => spi_mtx::write_spimtx,
            Format::Cinespace => csp::write_csp,
            Format::AscCdl => cdl::write_cdl,
            Format::Edl | Format::Ale => return None,
        };
        Some(write)
    }

    /// True if the format has a reader.
    pub fn can_read(self) -> bool {
        self.reader().is_some()
    }

    /// True if the format has a writer.
    pub fn can_write(self) -> bool {
        self.writer().is_some()
    }

    /// The read registry.
    pub fn readable() -> impl Iterator<Item = Format> {
        Self::ALL.into_iter().filter(|f| f.can_read())
    }

    /// The write registry.
    pub fn writable() -> impl Iterator<Item = Format> {
        Self::ALL.into_iter().filter(|f| f.can_write())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = LutError;

    /// Parses a display name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LutError::UnknownFormat(s.to_string()))
    }
}

fn resolve_format(path: &Path, method: Option<Format>) -> LutResult<Format> {
    match method {
        Some(format) => Ok(format),
        None => Format::from_path(path).ok_or_else(|| {
            LutError::UnknownFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{e}"))
                    .unwrap_or_else(|| path.display().to_string()),
            )
        }),
    }
}

/// Reads a LUT, picking the codec from `method` or the path's extension.
pub fn read_lut<P: AsRef<Path>>(path: P, method: Option<Format>) -> LutResult<Lut> {
    read_lut_with(path, method, &ReadOptions::default())
}

/// Reads a LUT with explicit reader options.
pub fn read_lut_with<P: AsRef<Path>>(
    path: P,
    method: Option<Format>,
    options: &ReadOptions,
) -> LutResult<Lut> {
    let path = path.as_ref();
    let format = resolve_format(path, method)?;
    let read = format
        .reader()
        .ok_or_else(|| LutError::UnknownFormat(format!("{format} is not readable")))?;
    debug!(path = %path.display(), format = %format, "reading LUT");

    match read(path, options) {
        Err(err) if format == Format::IridasCube && err.is_parse_error() => {
            debug!(path = %path.display(), error = %err, "retrying as Resolve Cube");
            resolve::read(path, options).map_err(|_| err)
        }
        result => result,
    }
}

/// Writes a LUT with `decimals` fractional digits, picking the codec from
/// `method` or the path's extension.
pub fn write_lut<P: AsRef<Path>>(
    lut: &Lut,
    path: P,
    decimals: usize,
    method: Option<Format>,
) -> LutResult<()> {
    write_lut_with(lut, path, method, &WriteOptions::with_decimals(decimals))
}

/// Writes a LUT with explicit writer options.
pub fn write_lut_with<P: AsRef<Path>>(
    lut: &Lut,
    path: P,
    method: Option<Format>,
    options: &WriteOptions,
) -> LutResult<()> {
    let path = path.as_ref();
    let mut format = resolve_format(path, method)?;
    if format == Format::IridasCube && lut.is_sequence() {
        debug!(path = %path.display(), "sequence written as Resolve Cube");
        format = Format::ResolveCube;
    }
    let write = format
        .writer()
        .ok_or_else(|| LutError::UnknownFormat(format!("{format} is not writable")))?;
    debug!(path = %path.display(), format = %format, lut = lut.kind(), "writing LUT");
    write(lut, path, options)
}
