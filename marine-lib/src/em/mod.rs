//! Multibeam echosounder `.all` datagrams.
//!
//! A file is a plain concatenation of datagrams. Each starts with a 4 byte
//! length that counts every byte after itself, followed by the start marker
//! [STX] and a type code. Byte order is fixed for the whole file and is
//! detected from the first length field.
mod context;
mod datagrams;
pub mod runtime;

pub use context::{nearest_position, nearest_position_linear, Attributed, Context, Meta};
pub use datagrams::{Position, Sounding};

use tracing::{trace, warn};

use crate::describe::Record;
use crate::section::{log_split, Format, Section};
use crate::{bytes, Error, Result};

/// Start of datagram marker.
pub const STX: u8 = 0x02;
/// End of datagram marker.
pub const ETX: u8 = 0x03;

/// Every known datagram type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatagramType {
    InstallStart,
    InstallStop,
    InstallRemote,
    Runtime,
    Xyz88,
    CentralBeams,
    RawRangeBeamAngle,
    RawRangeBeamAngleF,
    RawRangeAngle78,
    SeabedImage,
    SeabedImage89,
    WaterColumn,
    QualityFactor79,
    Attitude,
    NetworkAttitudeVelocity,
    Clock,
    DepthOrHeight,
    Heading,
    Position,
    SingleBeamDepth,
    Tide,
    SurfaceSoundSpeed,
    SoundSpeedProfile,
    SspOutput,
    TransducerTilt,
    ExtraParameters,
    PuId,
    PuStatus,
    PuBist,
    DepthDatagram,
    Unknown(u8),
}

impl DatagramType {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        use DatagramType::*;
        match code {
            0x49 => InstallStart,
            0x69 => InstallStop,
            0x70 => InstallRemote,
            0x52 => Runtime,
            0x58 | 0x88 => Xyz88,
            0x4b => CentralBeams,
            0x46 => RawRangeBeamAngle,
            0x66 => RawRangeBeamAngleF,
            0x4e | 0x78 => RawRangeAngle78,
            0x53 => SeabedImage,
            0x59 | 0x89 => SeabedImage89,
            0x6b => WaterColumn,
            0x4f => QualityFactor79,
            0x41 => Attitude,
            0x6e => NetworkAttitudeVelocity,
            0x43 => Clock,
            0x68 => DepthOrHeight,
            0x48 => Heading,
            0x50 => Position,
            0x45 => SingleBeamDepth,
            0x54 => Tide,
            0x47 => SurfaceSoundSpeed,
            0x55 => SoundSpeedProfile,
            0x57 => SspOutput,
            0x4a => TransducerTilt,
            0x33 => ExtraParameters,
            0x30 => PuId,
            0x31 => PuStatus,
            0x42 => PuBist,
            0x44 => DepthDatagram,
            other => Unknown(other),
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        use DatagramType::*;
        match self {
            InstallStart => "Install Start",
            InstallStop => "Install Stop",
            InstallRemote => "Install Remote",
            Runtime => "Runtime",
            Xyz88 => "XYZ88",
            CentralBeams => "Central Beams",
            RawRangeBeamAngle => "Raw range and Beam angle",
            RawRangeBeamAngleF => "Raw range and Beam angle F",
            RawRangeAngle78 => "Raw range and angle 78",
            SeabedImage => "Seabed image",
            SeabedImage89 => "Seabed image 89",
            WaterColumn => "Water column",
            QualityFactor79 => "Quality factor 79",
            Attitude => "Attitude",
            NetworkAttitudeVelocity => "Network attitude velocity",
            Clock => "Clock",
            DepthOrHeight => "Depth or height",
            Heading => "Heading",
            Position => "Position",
            SingleBeamDepth => "Single beam echo sounder depth",
            Tide => "Tide",
            SurfaceSoundSpeed => "Surface sound speed",
            SoundSpeedProfile => "Sound speed profile",
            SspOutput => "Kongberg Maritime SSP output",
            TransducerTilt => "Mechanical transducer tilt",
            ExtraParameters => "Extra parameters 3",
            PuId => "PU ID output",
            PuStatus => "PU Status output",
            PuBist => "PU BIST result output",
            DepthDatagram => "Depth datagram",
            Unknown(_) => "Unknown",
        }
    }
}

/// Byte order of a whole file, from the length of its first datagram.
///
/// A sane length is small, so whichever reading is smaller wins. Files too
/// short to hold a length are treated as little-endian.
#[must_use]
pub fn detect_endianness(buf: &[u8]) -> bool {
    match (bytes::u32_at(buf, 0, true), bytes::u32_at(buf, 0, false)) {
        (Ok(le), Ok(be)) => {
            if le == be {
                warn!(length = le, "multibeam byte order undecidable; assuming little-endian");
            }
            le <= be
        }
        _ => true,
    }
}

/// The multibeam format with a fixed byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multibeam {
    pub le: bool,
}

impl Multibeam {
    #[must_use]
    pub fn new(le: bool) -> Self {
        Multibeam { le }
    }

    /// Byte order detected from `buf`.
    #[must_use]
    pub fn detect(buf: &[u8]) -> Self {
        Multibeam::new(detect_endianness(buf))
    }

    /// Describe a section, failing early when its start marker is wrong.
    ///
    /// # Errors
    /// [Error::InvalidMarker] for a section whose STX is not [STX], otherwise
    /// as [Format::describe].
    pub fn describe_checked(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let stx = bytes::u8_at(buf, section.offset + 4)?;
        if stx != STX {
            return Err(Error::InvalidMarker {
                expected: STX.into(),
                actual: stx.into(),
                offset: section.offset + 4,
            });
        }
        self.describe(buf, section)
    }
}

impl Format for Multibeam {
    /// Walk the datagram chain. A zero length or a datagram running past the
    /// end of the buffer is reported as one invalid section and ends the
    /// walk; a trailing fragment shorter than a length field is dropped.
    ///
    /// A zero length is not stepped over to the next length field: the walk
    /// stops there rather than continuing at `offset + 4`.
    fn split(&self, buf: &[u8]) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut off = 0usize;
        while off < buf.len() {
            let Ok(length) = bytes::u32_at(buf, off, self.le) else {
                warn!(offset = off, trailing = buf.len() - off, "trailing bytes after last datagram");
                break;
            };
            let length = length as usize;
            let kind = bytes::u8_at(buf, off + 5).unwrap_or(0);
            let stx = bytes::u8_at(buf, off + 4).unwrap_or(0);
            let end = off.saturating_add(length).saturating_add(4);

            if length == 0 || end > buf.len() {
                warn!(offset = off, length, "datagram length out of range");
                sections.push(Section {
                    kind: kind.into(),
                    offset: off,
                    length,
                    valid: false,
                });
                break;
            }

            let valid = stx == STX;
            if !valid {
                warn!(offset = off, stx, "bad datagram start marker");
            }
            trace!(offset = off, length, kind, "datagram");
            sections.push(Section {
                kind: kind.into(),
                offset: off,
                length,
                valid,
            });
            off = end;
        }
        log_split("em", &sections);
        sections
    }

    fn describe(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let (start, end) = self.extent(section);
        let typ = DatagramType::from_code(bytes::u8_at(buf, start + 5)?);
        datagrams::describe(typ, buf, start, end, self.le)
    }

    fn title(&self, kind: u16) -> &'static str {
        u8::try_from(kind).map_or("Unknown", |k| DatagramType::from_code(k).title())
    }

    /// The length field does not count itself.
    fn extent(&self, section: &Section) -> (usize, usize) {
        (
            section.offset,
            section.offset.saturating_add(section.length).saturating_add(4),
        )
    }
}
