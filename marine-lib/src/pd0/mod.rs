//! Acoustic Doppler current profiler PD0 ensembles.
//!
//! A file is a sequence of ensembles. Each starts with the [HEADER_ID]
//! magic, a byte count and a table of offsets, relative to the ensemble
//! start, of the sub-sections that follow. Every sub-section begins with its
//! own 2 byte ID.
mod context;
pub mod leader;

pub use context::{Context, Meta};

use tracing::{trace, warn};

use crate::describe::{Record, RecordWalker};
use crate::schema::FieldType;
use crate::section::{log_split, Format, Section};
use crate::{bytes, Result};

use leader::{
    BEAM_CELL, BOTTOM_TRACK, FIXED_LEADER, HEADER, NAVIGATION, PERCENT_GOOD_CELL,
    VARIABLE_LEADER, VELOCITY_CELL,
};

/// Ensemble header magic.
pub const HEADER_ID: u16 = 0x7f7f;

/// Sub-section IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Header,
    FixedLeader,
    VariableLeader,
    Velocity,
    Correlation,
    Intensity,
    PercentGood,
    Status,
    BottomTrack,
    AmbientSound,
    MicroCat,
    Navigation,
    FixedAttitude,
    /// 0x3040 through 0x30FC.
    VariableAttitude(u16),
    Unknown(u16),
}

impl SectionId {
    #[must_use]
    pub fn from_id(id: u16) -> Self {
        use SectionId::*;
        match id {
            HEADER_ID => Header,
            0x0000 => FixedLeader,
            0x0080 => VariableLeader,
            0x0100 => Velocity,
            0x0200 => Correlation,
            0x0300 => Intensity,
            0x0400 => PercentGood,
            0x0500 => Status,
            0x0600 => BottomTrack,
            0x020c => AmbientSound,
            0x0800 => MicroCat,
            0x2000 => Navigation,
            0x3000 => FixedAttitude,
            0x3040..=0x30fc => VariableAttitude(id),
            other => Unknown(other),
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        use SectionId::*;
        match self {
            Header => "Header",
            FixedLeader => "Fixed Leader",
            VariableLeader => "Variable Leader",
            Velocity => "Velocity Data",
            Correlation => "Correlation magnitude Data",
            Intensity => "Echo intensity Data",
            PercentGood => "Percent good Data",
            Status => "Status Data",
            BottomTrack => "Bottom Track Data",
            AmbientSound => "Ambient Sound Profile",
            MicroCat => "MicroCAT Data",
            Navigation => "Binary Navigation Data",
            FixedAttitude => "Binary Fixed Attitude Data",
            VariableAttitude(_) => "Binary Variable Attitude data",
            Unknown(_) => "Unknown",
        }
    }
}

/// One ensemble and its sub-sections, header first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensemble {
    pub offset: usize,
    /// Bytes from the magic through the checksum.
    pub length: usize,
    /// Whether the trailing checksum matches the ensemble bytes.
    pub checksum_ok: bool,
    pub sections: Vec<Section>,
}

impl Ensemble {
    /// First sub-section with `id`.
    #[must_use]
    pub fn find(&self, id: SectionId) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| SectionId::from_id(s.kind) == id)
    }
}

fn checksum(ens: &[u8]) -> u16 {
    ens.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Walk the ensemble chain until the buffer ends or the magic is missing.
#[must_use]
pub fn split_ensembles(buf: &[u8], le: bool) -> Vec<Ensemble> {
    let mut ensembles = Vec::new();
    let mut off = 0usize;
    while off < buf.len() {
        match bytes::u16_at(buf, off, le) {
            Ok(HEADER_ID) => {}
            Ok(id) => {
                warn!(offset = off, id, "missing ensemble header; stopping");
                break;
            }
            Err(_) => {
                warn!(offset = off, "trailing bytes after last ensemble");
                break;
            }
        }
        let Some(ensemble) = split_ensemble(buf, off, le) else {
            break;
        };
        trace!(offset = off, length = ensemble.length, "ensemble");
        off += ensemble.length;
        let complete = ensemble.sections.first().is_some_and(|s| s.valid);
        ensembles.push(ensemble);
        if !complete {
            break;
        }
    }
    ensembles
}

fn split_ensemble(buf: &[u8], off: usize, le: bool) -> Option<Ensemble> {
    let header = HEADER
        .read_fields(buf, off, &["noBytesEns", "noDataTypes"], le)
        .ok()?;
    let num_bytes = header.get("noBytesEns").and_then(|v| v.as_u64())? as usize;
    let num_types = header.get("noDataTypes").and_then(|v| v.as_u64())? as usize;
    let table = off + HEADER.size();

    // Checksum follows the counted bytes.
    let length = num_bytes + 2;
    let in_bounds = num_bytes > 0 && off + length <= buf.len();
    let mut offsets = Vec::with_capacity(num_types);
    for i in 0..num_types {
        match bytes::u16_at(buf, table + 2 * i, le) {
            Ok(o) => offsets.push(usize::from(o)),
            Err(_) => break,
        }
    }
    let table_ok = in_bounds
        && offsets.len() == num_types
        && offsets.windows(2).all(|w| w[0] < w[1])
        && offsets.last().map_or(true, |&o| o < num_bytes);
    if !table_ok {
        warn!(offset = off, num_bytes, num_types, "ensemble does not fit");
    }

    let mut sections = Vec::with_capacity(num_types + 1);
    let first = offsets.first().copied().unwrap_or(num_bytes);
    sections.push(Section {
        kind: HEADER_ID,
        offset: off,
        length: first,
        valid: table_ok,
    });
    if table_ok {
        for (i, start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(num_bytes);
            let at = off + start;
            sections.push(Section {
                kind: bytes::u16_at(buf, at, le).unwrap_or(0),
                offset: at,
                length: end - start,
                valid: true,
            });
        }
    }

    let checksum_ok = in_bounds
        && bytes::u16_at(buf, off + num_bytes, le)
            .is_ok_and(|sum| sum == checksum(&buf[off..off + num_bytes]));

    Some(Ensemble {
        offset: off,
        length,
        checksum_ok,
        sections,
    })
}

/// Every ensemble's sub-sections in file order.
#[must_use]
pub fn split_sections(ensembles: &[Ensemble]) -> Vec<Section> {
    ensembles
        .iter()
        .flat_map(|e| e.sections.iter().copied())
        .collect()
}

fn cell_prefix(i: usize) -> String {
    format!("dc{}_", i + 1)
}

/// The PD0 format with a fixed byte order. Instruments write
/// little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adcp {
    pub le: bool,
}

impl Default for Adcp {
    fn default() -> Self {
        Adcp { le: true }
    }
}

impl Adcp {
    fn describe_cells(
        &self,
        buf: &[u8],
        section: &Section,
        cell: &crate::schema::Schema,
    ) -> Result<Record> {
        let (start, end) = self.extent(section);
        let mut w = RecordWalker::new(buf, start, end, self.le);
        w.field("hID", FieldType::U2)?;
        let n = w.remaining() / cell.size();
        w.repeat("depth cells", n, cell, cell_prefix)?;
        Ok(w.finish())
    }
}

impl Format for Adcp {
    fn split(&self, buf: &[u8]) -> Vec<Section> {
        let sections = split_sections(&split_ensembles(buf, self.le));
        log_split("pd0", &sections);
        sections
    }

    fn describe(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let (start, end) = self.extent(section);
        let id = SectionId::from_id(bytes::u16_at(buf, start, self.le)?);
        let mut w = RecordWalker::new(buf, start, end, self.le);
        match id {
            SectionId::Header => {
                w.schema(&HEADER, "")?;
                let n = w.count("noDataTypes")?;
                w.array("offsets", n, FieldType::U2, |i| format!("addr_{i}"))?;
            }
            SectionId::FixedLeader => {
                w.schema(&FIXED_LEADER, "")?;
            }
            SectionId::VariableLeader => {
                w.schema(&VARIABLE_LEADER, "")?;
            }
            SectionId::Velocity => return self.describe_cells(buf, section, &VELOCITY_CELL),
            SectionId::Correlation | SectionId::Intensity | SectionId::Status => {
                return self.describe_cells(buf, section, &BEAM_CELL)
            }
            SectionId::PercentGood => {
                return self.describe_cells(buf, section, &PERCENT_GOOD_CELL)
            }
            SectionId::BottomTrack => {
                w.schema(&BOTTOM_TRACK, "")?;
            }
            SectionId::Navigation => {
                w.schema(&NAVIGATION, "")?;
            }
            _ => {
                w.field("hID", FieldType::U2)?;
            }
        }
        Ok(w.finish())
    }

    fn title(&self, kind: u16) -> &'static str {
        SectionId::from_id(kind).title()
    }
}
