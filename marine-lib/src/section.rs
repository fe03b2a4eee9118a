//! Section tables and the per format split/describe contract.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::describe::Record;
use crate::Result;

/// One datagram, ensemble, header or trace located in a larger buffer.
///
/// `kind` is the format specific record type code. `length` follows the
/// format's own convention; see [Format::extent] for the bytes a section
/// actually covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Section {
    pub kind: u16,
    pub offset: usize,
    pub length: usize,
    pub valid: bool,
}

/// A section together with the outcome of describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionResult {
    pub section: Section,
    pub record: Result<Record>,
}

/// A splittable, describable record format.
///
/// Implementations are cheap parameter holders (byte order, layout); the
/// buffer is passed to every call and never retained.
pub trait Format {
    /// Split `buf` into its sections, front to back.
    fn split(&self, buf: &[u8]) -> Vec<Section>;

    /// Describe every field of one section.
    ///
    /// # Errors
    /// Any decode error for this section. Errors never affect other sections.
    fn describe(&self, buf: &[u8], section: &Section) -> Result<Record>;

    /// Human readable name of a section kind.
    fn title(&self, kind: u16) -> &'static str;

    /// Byte range `[start, end)` covered by `section`.
    fn extent(&self, section: &Section) -> (usize, usize) {
        (section.offset, section.offset.saturating_add(section.length))
    }

    /// Split and describe every section. A section that fails to decode is
    /// reported in place and iteration continues.
    fn describe_all(&self, buf: &[u8]) -> Vec<SectionResult> {
        self.split(buf)
            .into_iter()
            .map(|section| SectionResult {
                record: self.describe(buf, &section),
                section,
            })
            .collect()
    }
}

/// Log a summary of a finished split.
pub(crate) fn log_split(format: &str, sections: &[Section]) {
    let invalid = sections.iter().filter(|s| !s.valid).count();
    tracing::debug!(format, sections = sections.len(), invalid, "split complete");
}
