use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;

use super::text::TextHeader;
use super::{BinaryHeader, Seismic, Trace, KIND_TRACE};
use crate::section::{Format, Section};
use crate::Result;

/// Summary of a SEG-Y file from its first and last traces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Meta {
    pub ts: Option<DateTime<Utc>>,
    pub ts2: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub lat2: Option<f64>,
    pub lng2: Option<f64>,
    /// Interval and sample count of the first trace.
    pub desc: Option<String>,
    pub count: usize,
    pub bytes: usize,
}

/// A split SEG-Y buffer.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    buf: &'a [u8],
    format: Seismic,
    sections: Vec<Section>,
}

impl<'a> Context<'a> {
    /// Split `buf` with its detected byte order.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_format(buf, Seismic::detect(buf))
    }

    #[must_use]
    pub fn with_format(buf: &'a [u8], format: Seismic) -> Self {
        Context {
            buf,
            format,
            sections: format.split(buf),
        }
    }

    #[must_use]
    pub fn format(&self) -> Seismic {
        self.format
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The textual header, `None` when its character set is unknown.
    #[must_use]
    pub fn text_header(&self) -> Option<TextHeader> {
        self.buf.get(..super::text::TEXT_HEADER_LEN).and_then(TextHeader::decode)
    }

    /// # Errors
    /// [crate::Error::NotEnoughData] if the file is shorter than its headers.
    pub fn binary_header(&self) -> Result<BinaryHeader> {
        BinaryHeader::read(self.buf, self.format.le)
    }

    /// Complete traces, in file order.
    pub fn trace_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.kind == KIND_TRACE && s.valid)
    }

    /// # Errors
    /// [crate::Error::NotEnoughData] on a truncated trace header.
    pub fn traces(&self) -> Result<Vec<Trace>> {
        self.trace_sections()
            .map(|s| Trace::decode(self.buf, s.offset, self.format.le))
            .collect()
    }

    #[must_use]
    pub fn meta(&self) -> Meta {
        let decode = |s: Option<&Section>| {
            s.and_then(|s| Trace::decode(self.buf, s.offset, self.format.le).ok())
        };
        let first = decode(self.trace_sections().next());
        let last = decode(self.trace_sections().last());
        Meta {
            ts: first.as_ref().and_then(|t| t.ts),
            lat: first.as_ref().and_then(|t| t.lat),
            lng: first.as_ref().and_then(|t| t.lng),
            desc: first
                .as_ref()
                .map(|t| format!("interval : {}, number samples : {}", t.interval, t.num_samples)),
            ts2: last.as_ref().and_then(|t| t.ts),
            lat2: last.as_ref().and_then(|t| t.lat),
            lng2: last.as_ref().and_then(|t| t.lng),
            count: self.trace_sections().count(),
            bytes: self.buf.len(),
        }
    }
}
