//! Sea-Bird CTD `.hex` files.
//!
//! A file is a block of `*` prefixed header lines followed by a body of
//! fixed pitch lines, each the hex encoding of one scan. Nothing in the file
//! gives the line pitch, so it is taken from the first body line.
mod header;
mod scan;

pub use header::{degrees_minutes, parse_bottle_log, parse_header, BottleFire, BottleLog, HeaderInfo};
pub use scan::{decode_scan, CtdStatus, Scan, ScanLayout};

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{trace, warn};

use crate::bytes::latin1;
use crate::describe::{Described, Record};
use crate::schema::{FieldType, Value};
use crate::section::{log_split, Format, Section};
use crate::{Error, Result};

/// Section kind of the text header.
pub const KIND_HEADER: u16 = 0x01;
/// Section kind of a body line.
pub const KIND_LINE: u16 = 0x02;

/// Span searched for the end of the header.
const HEADER_SCAN: usize = 2048;
/// Span of the body searched for the first line end.
const LINE_SCAN: usize = 1024;
const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// A `.hex` file split into its header and fixed pitch body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBody<'a> {
    /// Header text without the final line end.
    pub header: String,
    /// Offset of the first body line.
    pub body_offset: usize,
    /// Line pitch including the line end.
    pub line_length: usize,
    /// 1 for LF, 2 for CRLF.
    pub eol_length: usize,
    /// Body lines, counting a trailing partial line.
    pub line_count: usize,
    body: &'a [u8],
}

/// Split a `.hex` file. The header ends at the first line feed within the
/// first 2048 bytes that is not followed by `*`; the first line feed within
/// 1024 bytes of the body gives the line pitch.
///
/// # Errors
/// [Error::Header] if either boundary cannot be found.
pub fn split_edge(buf: &[u8]) -> Result<HexBody<'_>> {
    let head = &buf[..buf.len().min(HEADER_SCAN)];
    let eoh = head
        .windows(2)
        .position(|w| w[0] == LF && w[1] != b'*')
        .filter(|&i| i > 0)
        .ok_or_else(|| Error::Header("no end of header in the first 2048 bytes".into()))?;

    let body_offset = eoh + 1;
    let body = &buf[body_offset..];
    let line_length = body[..body.len().min(LINE_SCAN)]
        .iter()
        .position(|&b| b == LF)
        .map(|i| i + 1)
        .ok_or_else(|| Error::Header("no line end in the first body line".into()))?;
    let eol_length = if line_length >= 2 && body[line_length - 2] == CR {
        2
    } else {
        1
    };

    Ok(HexBody {
        header: latin1(&head[..eoh]),
        body_offset,
        line_length,
        eol_length,
        line_count: body.len().div_ceil(line_length),
        body,
    })
}

impl<'a> HexBody<'a> {
    /// Line `idx` without its line end. A trailing partial line is returned
    /// as far as it goes.
    #[must_use]
    pub fn line(&self, idx: usize) -> Option<&'a [u8]> {
        let start = idx.checked_mul(self.line_length)?;
        if start >= self.body.len() {
            return None;
        }
        let end = (start + self.line_length).min(self.body.len());
        let line = &self.body[start..end];
        let trimmed = line.len() - line.iter().rev().take_while(|&&b| b == LF || b == CR).count();
        Some(&line[..trimmed])
    }

    /// Hex decode line `idx`.
    ///
    /// # Errors
    /// [Error::InvalidHex] for a non-hex digit or an odd digit count, and
    /// [Error::NotEnoughData] past the last line.
    pub fn scan(&self, idx: usize) -> Result<Vec<u8>> {
        let line = self.line(idx).ok_or(Error::NotEnoughData {
            actual: self.body.len(),
            minimum: (idx + 1) * self.line_length,
        })?;
        hex::decode(line).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { index, .. } => Error::InvalidHex {
                line: idx,
                column: index,
            },
            _ => Error::InvalidHex {
                line: idx,
                column: line.len(),
            },
        })
    }

    /// Parsed header keys.
    #[must_use]
    pub fn header_info(&self) -> HeaderInfo {
        parse_header(&self.header)
    }
}

/// The CTD `.hex` format for one deck unit configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ctd {
    pub layout: ScanLayout,
}

impl Ctd {
    #[must_use]
    pub fn new(layout: ScanLayout) -> Self {
        Ctd { layout }
    }
}

impl Format for Ctd {
    /// The header, then one section per body line. A file whose header or
    /// line pitch cannot be found is one invalid header section.
    fn split(&self, buf: &[u8]) -> Vec<Section> {
        let hex = match split_edge(buf) {
            Ok(hex) => hex,
            Err(err) => {
                warn!(%err, "not a hex file");
                let sections = vec![Section {
                    kind: KIND_HEADER,
                    offset: 0,
                    length: buf.len(),
                    valid: false,
                }];
                log_split("ctd", &sections);
                return sections;
            }
        };
        let mut sections = Vec::with_capacity(hex.line_count + 1);
        sections.push(Section {
            kind: KIND_HEADER,
            offset: 0,
            length: hex.body_offset,
            valid: true,
        });
        for idx in 0..hex.line_count {
            let offset = hex.body_offset + idx * hex.line_length;
            let length = hex.line_length.min(buf.len() - offset);
            let valid = length == hex.line_length;
            if !valid {
                warn!(offset, length, "short body line");
            }
            trace!(offset, length, "line");
            sections.push(Section {
                kind: KIND_LINE,
                offset,
                length,
                valid,
            });
        }
        log_split("ctd", &sections);
        sections
    }

    fn describe(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let hex = split_edge(buf)?;
        if section.kind == KIND_HEADER {
            let mut record = Record::with_capacity(1);
            record.insert(
                "header",
                Described::new(Value::Text(hex.header), FieldType::Ascii(section.length)),
            );
            return Ok(record);
        }
        let idx = section.offset.saturating_sub(hex.body_offset) / hex.line_length;
        let raw = hex.scan(idx)?;
        self.layout.describe(&raw)
    }

    fn title(&self, kind: u16) -> &'static str {
        match kind {
            KIND_HEADER => "Header",
            KIND_LINE => "Scan",
            _ => "Unknown",
        }
    }
}

/// Summary of a `.hex` file from its header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Meta {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub ts: Option<DateTime<Utc>>,
    /// Body lines.
    pub count: usize,
    /// Scan layout used for the body.
    pub desc: String,
    /// Cast length in seconds for 24 Hz data, i.e. when the deck unit did
    /// not average scans.
    pub duration: Option<usize>,
    pub bytes: usize,
}

/// A split `.hex` buffer.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    buf: &'a [u8],
    format: Ctd,
    hex: HexBody<'a>,
}

impl<'a> Context<'a> {
    /// # Errors
    /// [Error::Header] if `buf` does not split into a header and body.
    pub fn new(buf: &'a [u8], layout: ScanLayout) -> Result<Self> {
        Ok(Context {
            buf,
            format: Ctd::new(layout),
            hex: split_edge(buf)?,
        })
    }

    #[must_use]
    pub fn hex(&self) -> &HexBody<'a> {
        &self.hex
    }

    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        self.format.split(self.buf)
    }

    /// Decode body line `idx`.
    ///
    /// # Errors
    /// [Error::InvalidHex] or [Error::NotEnoughData] for a bad line.
    pub fn scan(&self, idx: usize) -> Result<Scan> {
        decode_scan(&self.hex.scan(idx)?, &self.format.layout)
    }

    #[must_use]
    pub fn meta(&self) -> Meta {
        let info = self.hex.header_info();
        Meta {
            lat: info.lat,
            lng: info.lng,
            ts: info.utc,
            count: self.hex.line_count,
            desc: self.format.layout.to_string(),
            duration: (info.scan_avg == Some(1)).then_some(self.hex.line_count / 24),
            bytes: self.buf.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(eol: &str, lines: &[&str]) -> Vec<u8> {
        let mut text = format!(
            "* Sea-Bird SBE 9 Data File:{eol}* NMEA Latitude = 10 30.00 N{eol}\
             * Number of Scans Averaged by the Deck Unit = 1{eol}*END*{eol}"
        );
        for line in lines {
            text.push_str(line);
            text.push_str(eol);
        }
        text.into_bytes()
    }

    const SCAN: &str = "0102030405060708090a0b0c";

    #[test]
    fn split_edge_crlf() {
        let buf = file("\r\n", &[SCAN, SCAN]);
        let hex = split_edge(&buf).unwrap();
        assert!(hex.header.ends_with("*END*\r"));
        assert_eq!(hex.eol_length, 2);
        assert_eq!(hex.line_length, 26);
        assert_eq!(hex.line_count, 2);
        assert_eq!(hex.line(1), Some(SCAN.as_bytes()));
        assert_eq!(hex.line(2), None);
        assert_eq!(hex.scan(0).unwrap()[0], 1);
    }

    #[test]
    fn split_edge_lf() {
        let buf = file("\n", &[SCAN]);
        let hex = split_edge(&buf).unwrap();
        assert_eq!(hex.eol_length, 1);
        assert_eq!(hex.line_length, 25);
        assert_eq!(&buf[..hex.body_offset], &buf[..buf.len() - 25]);
    }

    #[test]
    fn no_header_end() {
        assert!(matches!(split_edge(b"* only header\n*"), Err(Error::Header(_))));
        assert!(matches!(split_edge(b""), Err(Error::Header(_))));
    }

    #[test]
    fn invalid_hex_reports_position() {
        let buf = file("\n", &[SCAN, "01020304050607080x0a0b0c"]);
        let hex = split_edge(&buf).unwrap();
        assert_eq!(
            hex.scan(1).unwrap_err(),
            Error::InvalidHex { line: 1, column: 17 }
        );
    }

    #[test]
    fn split_marks_short_last_line() {
        let mut buf = file("\n", &[SCAN, SCAN]);
        buf.extend_from_slice(b"0102");
        let ctd = Ctd::default();
        let sections = ctd.split(&buf);
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].kind, KIND_HEADER);
        assert!(sections[..3].iter().all(|s| s.valid));
        assert!(!sections[3].valid);
        assert_eq!(sections[3].length, 4);

        let r = ctd.describe(&buf, &sections[2]).unwrap();
        assert_eq!(r.u64("f1"), Some(0x040506));
        assert!(ctd.describe(&buf, &sections[3]).is_err());
    }

    #[test]
    fn meta_from_header() {
        let buf = file("\n", &[SCAN; 48]);
        let ctx = Context::new(&buf, ScanLayout::default()).unwrap();
        let meta = ctx.meta();
        assert_eq!(meta.lat, Some(10.5));
        assert_eq!(meta.count, 48);
        assert_eq!(meta.duration, Some(2));
        assert_eq!(meta.bytes, buf.len());
        assert_eq!(ctx.scan(0).unwrap().modulo_count, 0x0c);
    }
}
