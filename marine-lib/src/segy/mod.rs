//! SEG-Y seismic files.
//!
//! A file opens with a 3200 byte textual header and a 400 byte binary header
//! at fixed offsets, optionally followed by extended textual headers, and then
//! a run of traces. Each trace is a 240 byte header followed by `numSample`
//! samples whose width comes from the binary header format code.
mod context;
mod sample;
pub mod text;

pub use context::{Context, Meta};
pub use sample::{ibm_to_f64, SampleFormat};

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{trace, warn};

use crate::describe::{Described, Record, RecordWalker};
use crate::schema::{FieldType, Schema, Value};
use crate::section::{log_split, Format, Section};
use crate::{bytes, time, Result};
use text::{TextHeader, TEXT_HEADER_LEN};

/// Section kind of the binary file header.
pub const KIND_BINARY: u16 = 0x01;
/// Section kind of a trace.
pub const KIND_TRACE: u16 = 0x02;
/// Section kind of the textual file header.
pub const KIND_TEXT: u16 = 0x03;

pub const BINARY_HEADER_OFFSET: usize = 3200;
pub const BINARY_HEADER_LEN: usize = 400;
pub const TRACE_HEADER_LEN: usize = 240;
const PART2_OFFSET: usize = 3500;
const UNASSIGNED_WORDS: usize = 50;
/// Text plus binary header.
const FILE_HEADER_LEN: usize = BINARY_HEADER_OFFSET + BINARY_HEADER_LEN;

fn compile(fields: &[(&str, &str)]) -> Schema {
    Schema::compile(fields).expect("seismic layouts are valid")
}

/// Binary header bytes 3200..3300.
pub static BINARY_PART1: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("jobIDNum", "U4"),
        ("lineNum", "U4"),
        ("reelNum", "U4"),
        ("tracesPEns", "U2"),
        ("auxTracesPEns", "U2"),
        ("interval", "U2"),
        ("intervalOrg", "U2"),
        ("numSamplePTrace", "U2"),
        ("numSamplePTraceOrg", "U2"),
        ("code", "U2"),
        ("ensFold", "U2"),
        ("traceSortingCode", "U2"),
        ("vertSumCode", "U2"),
        ("sweepFreqStart", "U2"),
        ("sweepFreqEnd", "U2"),
        ("sweepLen", "U2"),
        ("sweepTypeCode", "U2"),
        ("traceNumSweepChannel", "U2"),
        ("sweepTTLenStart", "U2"),
        ("sweepTTLenEnd", "U2"),
        ("taperType", "U2"),
        ("corelTrace", "U2"),
        ("binGainRec", "U2"),
        ("ampRecM", "U2"),
        ("measureSystem", "U2"),
        ("impulseSigPol", "U2"),
        ("vibPolCode", "U2"),
        ("extNumTracePEns", "U4"),
        ("extNumAuxTracePEns", "U4"),
        ("extNumSample", "U4"),
        ("extInterval", "F8"),
        ("extIntervalOrg", "F8"),
        ("extNumSamplePTraceOrg", "U4"),
        ("extEnsFold", "U4"),
        ("constant1234", "U4"),
    ])
});

/// Binary header bytes 3500..3532.
pub static BINARY_PART2: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("majorRev", "U1"),
        ("minorRev", "U1"),
        ("fixedLenTrace", "U2"),
        ("numExtTextHDR", "U2"),
        ("numAddTraceHDR", "U4"),
        ("timeCode", "U2"),
        ("numTraceInFile", "U8"),
        ("offsetTrace", "U8"),
        ("numTrailerStanza", "I4"),
    ])
});

pub static TRACE_HEADER: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("traceSeqLine", "U4"),
        ("traceSeqFile", "U4"),
        ("orgFieldRecNum", "U4"),
        ("traceNumOrg", "U4"),
        ("energySrc", "U4"),
        ("ensNum", "U4"),
        ("traceNumEns", "U4"),
        ("traceIDCode", "U2"),
        ("numVertSum", "U2"),
        ("numHoriSum", "U2"),
        ("dataUse", "U2"),
        ("distCent", "U4"),
        ("elevRecv", "U4"),
        ("surfElev", "U4"),
        ("srcDepth", "U4"),
        ("seisDatumRecv", "U4"),
        ("seisDatumSrc", "U4"),
        ("watColHeiSrc", "U4"),
        ("watColHeiRecv", "U4"),
        ("scalarElev", "I2"),
        ("scalarCoord", "I2"),
        ("srcCoordX", "I4"),
        ("srcCoordY", "I4"),
        ("grpCoordX", "I4"),
        ("grpCoordY", "I4"),
        ("coordUnit", "U2"),
        ("weatherVel", "U2"),
        ("subWeatherVel", "U2"),
        ("upSrcMS", "U2"),
        ("upGrpMS", "U2"),
        ("srcCorrMS", "U2"),
        ("grpCorrMS", "U2"),
        ("totMS", "U2"),
        ("lagAMS", "U2"),
        ("lagBMS", "U2"),
        ("delayRecMS", "U2"),
        ("muteStartMS", "U2"),
        ("muteEndMS", "U2"),
        ("numSample", "U2"),
        ("intervalSample", "U2"),
        ("gainType", "U2"),
        ("instGain", "U2"),
        ("instInitGain", "U2"),
        ("correlated", "U2"),
        ("sweepFreqS", "U2"),
        ("sweepFreqE", "U2"),
        ("sweepLen", "U2"),
        ("sweepType", "U2"),
        ("sweepTraceLenS", "U2"),
        ("sweepTraceLenE", "U2"),
        ("taperType", "U2"),
        ("aliasFFreq", "U2"),
        ("aliasFSlope", "U2"),
        ("notchFFreq", "U2"),
        ("notchFSlope", "U2"),
        ("lcFreq", "U2"),
        ("hcFreq", "U2"),
        ("lcSlope", "U2"),
        ("hcSlope", "U2"),
        ("year", "U2"),
        ("day", "U2"),
        ("hour", "U2"),
        ("minute", "U2"),
        ("second", "U2"),
        ("timeCode", "U2"),
        ("traceWeiFac", "U2"),
        ("geoGNRoll", "U2"),
        ("geoGNTrace", "U2"),
        ("geoGNLTrace", "U2"),
        ("gapSize", "U2"),
        ("overTravel", "U2"),
        ("XcoordEns", "U4"),
        ("YcoordEns", "U4"),
        ("PSinline", "U4"),
        ("PScrossline", "U4"),
        ("shotpoint", "U4"),
        ("scalarShot", "U2"),
        ("traceUnit", "I2"),
        ("transC", "U8"),
        ("transUnit", "I2"),
        ("id", "U2"),
        ("scalarTimes", "U2"),
        ("srcType", "I2"),
        ("srcEnergyDir", "U2"),
        ("sourceM1", "U4"),
        ("sourceM2", "U2"),
        ("srcUnit", "I2"),
        ("pad1", "U4"),
        ("pad2", "U4"),
        ("pad3", "U2"),
    ])
});

/// Time basis code of the binary and trace headers.
#[must_use]
pub fn time_basis(code: u16) -> Option<&'static str> {
    Some(match code {
        1 => "Local",
        2 => "GMT",
        3 => "Other",
        4 => "UTC",
        5 => "GPS",
        _ => return None,
    })
}

/// Byte order of a file from binary header fields that should be small:
/// line number, traces per ensemble and the format code, in that order. The
/// first field whose two readings differ decides; the smaller reading wins.
#[must_use]
pub fn detect_endianness(buf: &[u8]) -> bool {
    let probes = [
        (bytes::u32_at(buf, 3204, true), bytes::u32_at(buf, 3204, false)),
        (
            bytes::u16_at(buf, 3212, true).map(u32::from),
            bytes::u16_at(buf, 3212, false).map(u32::from),
        ),
        (
            bytes::u16_at(buf, 3224, true).map(u32::from),
            bytes::u16_at(buf, 3224, false).map(u32::from),
        ),
    ];
    for (le, be) in probes {
        if let (Ok(le), Ok(be)) = (le, be) {
            if le != be {
                return le < be;
            }
        }
    }
    warn!("seismic byte order undecidable; assuming little-endian");
    true
}

/// The binary header fields that drive splitting.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BinaryHeader {
    pub interval: u16,
    pub samples_per_trace: u16,
    pub code: u16,
    pub major_rev: u8,
    pub minor_rev: u8,
    pub num_ext_text: u16,
    pub offset_trace: u64,
}

impl BinaryHeader {
    /// # Errors
    /// [crate::Error::NotEnoughData] if the file is shorter than its headers.
    pub fn read(buf: &[u8], le: bool) -> Result<Self> {
        let p1 = &*BINARY_PART1;
        let p2 = &*BINARY_PART2;
        let at = BINARY_HEADER_OFFSET;
        Ok(BinaryHeader {
            interval: p1.read_u64(buf, at, "interval", le)? as u16,
            samples_per_trace: p1.read_u64(buf, at, "numSamplePTrace", le)? as u16,
            code: p1.read_u64(buf, at, "code", le)? as u16,
            major_rev: p2.read_u64(buf, PART2_OFFSET, "majorRev", le)? as u8,
            minor_rev: p2.read_u64(buf, PART2_OFFSET, "minorRev", le)? as u8,
            num_ext_text: p2.read_u64(buf, PART2_OFFSET, "numExtTextHDR", le)? as u16,
            offset_trace: p2.read_u64(buf, PART2_OFFSET, "offsetTrace", le)?,
        })
    }

    /// Sample format of the header's code, falling back to 4 byte IEEE float
    /// for unknown codes.
    #[must_use]
    pub fn sample_format(&self) -> SampleFormat {
        SampleFormat::from_code(self.code).unwrap_or(SampleFormat::F4)
    }

    /// Offset of the first trace: the header's own trace offset when it
    /// points past the file headers, else right after the extended textual
    /// headers.
    #[must_use]
    pub fn first_trace_offset(&self) -> usize {
        match usize::try_from(self.offset_trace) {
            Ok(at) if at >= FILE_HEADER_LEN => at,
            _ => FILE_HEADER_LEN + TEXT_HEADER_LEN * usize::from(self.num_ext_text),
        }
    }
}

/// The trace header fields most callers want.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Trace {
    pub sequence: u32,
    pub num_samples: u16,
    pub interval: u16,
    pub ts: Option<DateTime<Utc>>,
    pub time_basis: Option<&'static str>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Trace {
    /// Decode the trace whose header starts at `offset`. Coordinates are only
    /// reported in seconds of arc (coordinate unit 2), stored in
    /// milliseconds of arc.
    ///
    /// # Errors
    /// [crate::Error::NotEnoughData] if the header is truncated.
    pub fn decode(buf: &[u8], offset: usize, le: bool) -> Result<Self> {
        let h = &*TRACE_HEADER;
        bytes::slice(buf, offset, h.size())?;
        let u = |name: &str| h.read_u64(buf, offset, name, le);
        let ts = time::from_day_of_year(
            u("year")? as i64,
            u("day")? as i64,
            u("hour")? as i64,
            u("minute")? as i64,
            u("second")? as i64,
        );
        let (lat, lng) = if u("coordUnit")? == 2 {
            let arc = |name: &str| -> Result<f64> {
                Ok(h.read_i64(buf, offset, name, le)? as f64 / 3_600_000.0)
            };
            (Some(arc("srcCoordY")?), Some(arc("srcCoordX")?))
        } else {
            (None, None)
        };
        Ok(Trace {
            sequence: u("traceSeqLine")? as u32,
            num_samples: u("numSample")? as u16,
            interval: u("intervalSample")? as u16,
            ts,
            time_basis: time_basis(u("timeCode")? as u16),
            lat,
            lng,
        })
    }
}

/// The SEG-Y format with a fixed byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seismic {
    pub le: bool,
}

impl Seismic {
    #[must_use]
    pub fn new(le: bool) -> Self {
        Seismic { le }
    }

    #[must_use]
    pub fn detect(buf: &[u8]) -> Self {
        Seismic::new(detect_endianness(buf))
    }

    /// Sample values of one trace as floats.
    ///
    /// # Errors
    /// [crate::Error::NotEnoughData] if the trace or the binary header is
    /// truncated.
    pub fn samples(&self, buf: &[u8], section: &Section) -> Result<Vec<f64>> {
        let format = BinaryHeader::read(buf, self.le)?.sample_format();
        let n = TRACE_HEADER.read_u64(buf, section.offset, "numSample", self.le)? as usize;
        let start = section.offset + TRACE_HEADER_LEN;
        bytes::slice(buf, start, n * format.width())?;
        (0..n)
            .map(|i| {
                let v = format.decode(buf, start + i * format.width(), self.le)?;
                Ok(v.as_f64().unwrap_or_default())
            })
            .collect()
    }

    fn describe_text(buf: &[u8], section: &Section) -> Result<Record> {
        let raw = bytes::slice(buf, section.offset, TEXT_HEADER_LEN)?;
        let text = TextHeader::decode(raw).map(|h| h.text).unwrap_or_default();
        let mut record = Record::with_capacity(1);
        record.insert(
            "text",
            Described {
                value: Value::Text(text),
                typ: FieldType::Ascii(TEXT_HEADER_LEN),
                size: TEXT_HEADER_LEN,
            },
        );
        Ok(record)
    }

    fn describe_binary(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let mut w = RecordWalker::new(buf, section.offset, section.offset + section.length, self.le);
        w.schema(&BINARY_PART1, "")?
            .array("unassigned", UNASSIGNED_WORDS, FieldType::U4, |i| {
                format!("un_{}", i + 1)
            })?
            .schema(&BINARY_PART2, "")?;
        Ok(w.finish())
    }

    fn describe_trace(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let format = BinaryHeader::read(buf, self.le)?.sample_format();
        let mut w = RecordWalker::new(buf, section.offset, section.offset + section.length, self.le);
        w.schema(&TRACE_HEADER, "")?;
        let n = w.count("numSample")?;
        w.ensure("samples", n, format.width())?;
        let typ = format.field_type();
        for i in 0..n {
            w.decoded(&format!("sample_{}", i + 1), typ, format.width(), |buf, at, le| {
                format.decode(buf, at, le)
            })?;
        }
        Ok(w.finish())
    }
}

impl Format for Seismic {
    /// Text and binary headers, then traces from the first trace offset. A
    /// trace running past the end of the buffer is reported invalid and ends
    /// the walk.
    fn split(&self, buf: &[u8]) -> Vec<Section> {
        let mut sections = vec![
            Section {
                kind: KIND_TEXT,
                offset: 0,
                length: TEXT_HEADER_LEN,
                valid: buf.len() >= TEXT_HEADER_LEN,
            },
            Section {
                kind: KIND_BINARY,
                offset: BINARY_HEADER_OFFSET,
                length: BINARY_HEADER_LEN,
                valid: buf.len() >= FILE_HEADER_LEN,
            },
        ];
        let Ok(header) = BinaryHeader::read(buf, self.le) else {
            warn!(len = buf.len(), "seismic file shorter than its headers");
            log_split("segy", &sections);
            return sections;
        };
        if SampleFormat::from_code(header.code).is_none() {
            warn!(code = header.code, "unknown sample format code; reading 4 byte floats");
        }
        let width = header.sample_format().width();

        let mut off = header.first_trace_offset();
        while off < buf.len() {
            let samples = TRACE_HEADER
                .read_u64(buf, off, "numSample", self.le)
                .map(|n| n as usize);
            let length = samples
                .as_ref()
                .map_or(buf.len() - off, |&n| TRACE_HEADER_LEN + n * width);
            let valid = samples.is_ok() && off + length <= buf.len();
            trace!(offset = off, length, valid, "trace");
            sections.push(Section {
                kind: KIND_TRACE,
                offset: off,
                length,
                valid,
            });
            if !valid {
                warn!(offset = off, length, "truncated trace");
                break;
            }
            off += length;
        }
        log_split("segy", &sections);
        sections
    }

    fn describe(&self, buf: &[u8], section: &Section) -> Result<Record> {
        match section.kind {
            KIND_TEXT => Self::describe_text(buf, section),
            KIND_BINARY => self.describe_binary(buf, section),
            _ => self.describe_trace(buf, section),
        }
    }

    fn title(&self, kind: u16) -> &'static str {
        match kind {
            KIND_TEXT => "Text header",
            KIND_BINARY => "Binary header",
            KIND_TRACE => "Trace",
            _ => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use test_case::test_case;

    /// Big-endian file: ASCII text header, binary header with `code`, and one
    /// trace per entry of `traces`, each a list of sample words.
    fn file(code: u16, ext: u16, traces: &[&[u32]]) -> Vec<u8> {
        let mut buf = vec![b' '; TEXT_HEADER_LEN];
        buf[..4].copy_from_slice(b"C 1 ");
        buf.resize(FILE_HEADER_LEN, 0);
        buf[3204..3208].copy_from_slice(&7u32.to_be_bytes());
        buf[3212..3214].copy_from_slice(&1u16.to_be_bytes());
        buf[3216..3218].copy_from_slice(&250u16.to_be_bytes());
        buf[3224..3226].copy_from_slice(&code.to_be_bytes());
        buf[3504..3506].copy_from_slice(&ext.to_be_bytes());
        buf.resize(FILE_HEADER_LEN + TEXT_HEADER_LEN * usize::from(ext), b' ');
        for (i, samples) in traces.iter().enumerate() {
            let mut h = vec![0u8; TRACE_HEADER_LEN];
            h[0..4].copy_from_slice(&(i as u32 + 1).to_be_bytes());
            h[72..76].copy_from_slice(&(-36_000_000i32).to_be_bytes());
            h[76..80].copy_from_slice(&(18_000_000i32).to_be_bytes());
            h[88..90].copy_from_slice(&2u16.to_be_bytes());
            h[114..116].copy_from_slice(&(samples.len() as u16).to_be_bytes());
            h[116..118].copy_from_slice(&250u16.to_be_bytes());
            h[156..158].copy_from_slice(&2023u16.to_be_bytes());
            h[158..160].copy_from_slice(&32u16.to_be_bytes());
            h[160..162].copy_from_slice(&12u16.to_be_bytes());
            h[166..168].copy_from_slice(&4u16.to_be_bytes());
            buf.extend(h);
            for s in *samples {
                buf.extend(s.to_be_bytes());
            }
        }
        buf
    }

    #[test]
    fn layouts_compile() {
        assert_eq!(BINARY_PART1.size(), 100);
        assert_eq!(BINARY_PART2.size(), 32);
        assert_eq!(TRACE_HEADER.size(), TRACE_HEADER_LEN);
        assert_eq!(TRACE_HEADER.offset_of("numSample"), Some(114));
        assert_eq!(TRACE_HEADER.offset_of("year"), Some(156));
        assert_eq!(TRACE_HEADER.offset_of("coordUnit"), Some(88));
    }

    #[test]
    fn split_headers_and_traces() {
        let one = 1.0f32.to_bits();
        let buf = file(5, 0, &[&[one, one, one], &[one]]);
        let sections = Seismic::detect(&buf).split(&buf);

        let kinds: Vec<u16> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![KIND_TEXT, KIND_BINARY, KIND_TRACE, KIND_TRACE]);
        assert!(sections.iter().all(|s| s.valid));
        assert_eq!(sections[2].offset, 3600);
        assert_eq!(sections[2].length, 240 + 12);
        assert_eq!(sections[3].offset, 3600 + 252);
        assert_eq!(sections[3].length, 244);
    }

    #[test]
    fn extended_text_headers_move_first_trace() {
        let buf = file(5, 2, &[&[0]]);
        let sections = Seismic::new(false).split(&buf);
        assert_eq!(sections[2].offset, 3600 + 6400);
    }

    #[test]
    fn truncated_trace_ends_split() {
        let mut buf = file(5, 0, &[&[0, 0], &[0, 0]]);
        buf.truncate(buf.len() - 3);
        let sections = Seismic::new(false).split(&buf);
        assert_eq!(sections.len(), 4);
        assert!(sections[2].valid);
        assert!(!sections[3].valid, "short last trace");
    }

    #[test]
    fn big_endian_detected_from_line_number() {
        let buf = file(5, 0, &[]);
        assert!(!detect_endianness(&buf));
    }

    #[test]
    fn tie_defaults_to_little_endian() {
        let buf = vec![0u8; FILE_HEADER_LEN];
        assert!(detect_endianness(&buf));
    }

    #[test]
    fn describe_binary_header() {
        let buf = file(5, 0, &[]);
        let fmt = Seismic::new(false);
        let sections = fmt.split(&buf);
        let r = fmt.describe(&buf, &sections[1]).unwrap();
        assert_eq!(r.u64("lineNum"), Some(7));
        assert_eq!(r.u64("code"), Some(5));
        assert_eq!(r.u64("interval"), Some(250));
        assert_eq!(r.u64("un_50"), Some(0));
        assert!(r.get("numTrailerStanza").is_some());
        assert_eq!(r.byte_size(), 100 + 200 + 32);
    }

    #[test]
    fn describe_text_header() {
        let buf = file(5, 0, &[]);
        let fmt = Seismic::new(false);
        let r = fmt.describe(&buf, &fmt.split(&buf)[0]).unwrap();
        assert!(r.text("text").unwrap().starts_with("C 1 "));
        assert_eq!(r.get("text").map(|d| d.size), Some(TEXT_HEADER_LEN));
    }

    #[test_case(5, 1.5f32.to_bits(), 1.5; "ieee")]
    #[test_case(1, 0x4118_0000, 1.5; "ibm")]
    #[test_case(2, (-3i32) as u32, -3.0; "int4")]
    fn describe_trace_samples(code: u16, word: u32, expected: f64) {
        let buf = file(code, 0, &[&[word, word]]);
        let fmt = Seismic::new(false);
        let sections = fmt.split(&buf);
        let r = fmt.describe(&buf, &sections[2]).unwrap();
        assert_eq!(r.u64("numSample"), Some(2));
        assert_eq!(r.f64("sample_2"), Some(expected));
        assert!(r.get("sample_3").is_none());
        assert_eq!(fmt.samples(&buf, &sections[2]).unwrap(), vec![expected; 2]);
    }

    #[test]
    fn unknown_code_reads_floats() {
        let buf = file(13, 0, &[&[2.0f32.to_bits()]]);
        let fmt = Seismic::new(false);
        let sections = fmt.split(&buf);
        assert_eq!(sections[2].length, 244);
        let r = fmt.describe(&buf, &sections[2]).unwrap();
        assert_eq!(r.f64("sample_1"), Some(2.0));
    }

    #[test]
    fn trace_with_corrupt_count_fails_alone() {
        let buf = file(5, 0, &[&[0]]);
        let fmt = Seismic::new(false);
        let mut section = fmt.split(&buf)[2];
        section.length = 240;
        let err = fmt.describe(&buf, &section).unwrap_err();
        assert!(matches!(err, Error::LengthConsistency { .. }));
    }

    #[test]
    fn trace_minimum_form() {
        let buf = file(5, 0, &[&[0]]);
        let t = Trace::decode(&buf, 3600, false).unwrap();
        assert_eq!(t.sequence, 1);
        assert_eq!(t.num_samples, 1);
        assert_eq!(t.interval, 250);
        assert_eq!(t.time_basis, Some("UTC"));
        assert_eq!(t.lat, Some(5.0));
        assert_eq!(t.lng, Some(-10.0));
        assert_eq!(
            t.ts.unwrap().to_rfc3339(),
            "2023-02-01T12:00:00+00:00",
            "day 32 is February 1st"
        );
    }
}
