//! One hex encoded scan line of a CTD body.
use std::fmt::Display;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::describe::{Record, RecordWalker};
use crate::schema::{FieldType, Value};
use crate::{bytes, time, Error, Result};

const WORD: usize = 3;
const NMEA_POSITION_LEN: usize = 7;
const NMEA_TIME_LEN: usize = 4;
/// Pressure sensor temperature and status word plus the modulo count.
const TRAILER_LEN: usize = 3;

/// Which words a scan line carries, as configured on the deck unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ScanLayout {
    /// Frequency channels, 3 bytes each.
    #[builder(default = 3)]
    pub freq_words: usize,
    /// A/D words, 3 bytes each holding two 12 bit voltages.
    #[builder(default)]
    pub ad_words: usize,
    #[builder(default)]
    pub surface_par: bool,
    #[builder(default)]
    pub nmea_position: bool,
    #[builder(default)]
    pub nmea_time: bool,
}

impl Default for ScanLayout {
    fn default() -> Self {
        ScanLayout::builder().build()
    }
}

impl ScanLayout {
    /// Bytes in one decoded scan.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        WORD * (self.freq_words + self.ad_words)
            + if self.surface_par { WORD } else { 0 }
            + if self.nmea_position { NMEA_POSITION_LEN } else { 0 }
            + if self.nmea_time { NMEA_TIME_LEN } else { 0 }
            + TRAILER_LEN
    }

    /// Describe the raw words of a decoded scan.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `raw` is shorter than the layout.
    pub fn describe(&self, raw: &[u8]) -> Result<Record> {
        let word = |buf: &[u8], at: usize, _le: bool| -> Result<Value> {
            let [a, b, c] = bytes::take::<3>(buf, at)?;
            Ok(Value::U(u64::from(u32::from_be_bytes([0, a, b, c]))))
        };
        let mut w = RecordWalker::new(raw, 0, raw.len(), false);
        for i in 0..self.freq_words {
            w.decoded(&format!("f{i}"), FieldType::U4, WORD, word)?;
        }
        for i in 0..self.ad_words {
            w.decoded(&format!("ad{i}"), FieldType::U4, WORD, word)?;
        }
        if self.surface_par {
            w.decoded("surfacePar", FieldType::U4, WORD, word)?;
        }
        if self.nmea_position {
            w.decoded("nmeaLat", FieldType::U4, WORD, word)?
                .decoded("nmeaLng", FieldType::U4, WORD, word)?
                .field("nmeaFlags", FieldType::U1)?;
        }
        if self.nmea_time {
            // the only little-endian word of a scan
            w.decoded("nmeaTime", FieldType::U4, NMEA_TIME_LEN, |buf, at, _| {
                Ok(Value::U(u64::from(bytes::u32_at(buf, at, true)?)))
            })?;
        }
        w.field("status", FieldType::U2)?
            .field("moduloCount", FieldType::U1)?;
        Ok(w.finish())
    }
}

impl Display for ScanLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "countFreq: {}, countADWords: {}, surfacePar: {}, nmeaPosition: {}, nmeaTime: {}",
            self.freq_words, self.ad_words, self.surface_par, self.nmea_position, self.nmea_time
        )
    }
}

/// Low nibble of the pressure temperature word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CtdStatus {
    pub pump_on: bool,
    /// Set when the bottom contact switch is open.
    pub no_bottom_contact: bool,
    pub water_sampler: bool,
    /// Set when no carrier is detected.
    pub no_carrier: bool,
}

impl CtdStatus {
    #[must_use]
    pub fn decode(bits: u8) -> Self {
        CtdStatus {
            pump_on: bits & 0b0001 != 0,
            no_bottom_contact: bits & 0b0010 != 0,
            water_sampler: bits & 0b0100 != 0,
            no_carrier: bits & 0b1000 != 0,
        }
    }
}

/// Raw sensor readings of one scan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Scan {
    /// Frequencies in Hz.
    pub freqs: Vec<f64>,
    /// A/D voltages, two per A/D word.
    pub volts: Vec<f64>,
    pub surface_par: Option<f64>,
    /// `(lat, lng)` in decimal degrees.
    pub position: Option<(f64, f64)>,
    pub time: Option<DateTime<Utc>>,
    /// 12 bit pressure sensor temperature count.
    pub pressure_temp: u16,
    pub status: CtdStatus,
    pub modulo_count: u8,
}

fn take<'a>(rest: &mut &'a [u8], n: usize) -> &'a [u8] {
    let (head, tail) = rest.split_at(n);
    *rest = tail;
    head
}

fn volts(bits: u32) -> f64 {
    5.0 * (1.0 - f64::from(bits) / 4095.0)
}

/// Decode a hex decoded scan line.
///
/// # Errors
/// [Error::NotEnoughData] if `raw` is shorter than `layout` requires.
pub fn decode_scan(raw: &[u8], layout: &ScanLayout) -> Result<Scan> {
    if raw.len() < layout.byte_len() {
        return Err(Error::NotEnoughData {
            actual: raw.len(),
            minimum: layout.byte_len(),
        });
    }
    let mut rest = raw;

    let freqs = (0..layout.freq_words)
        .map(|_| {
            let b = take(&mut rest, WORD);
            f64::from(b[0]) * 256.0 + f64::from(b[1]) + f64::from(b[2]) / 256.0
        })
        .collect();

    let mut v = Vec::with_capacity(layout.ad_words * 2);
    for _ in 0..layout.ad_words {
        let b = take(&mut rest, WORD);
        let word = u32::from_be_bytes([0, b[0], b[1], b[2]]);
        v.push(volts(word >> 12));
        v.push(volts(word & 0x0fff));
    }

    let surface_par = layout.surface_par.then(|| {
        let b = take(&mut rest, WORD);
        f64::from(u16::from_be_bytes([b[1], b[2]]) & 0x0fff) / 819.0
    });

    let position = layout.nmea_position.then(|| {
        let b = take(&mut rest, NMEA_POSITION_LEN);
        let mut lat = f64::from(u32::from_be_bytes([0, b[0], b[1], b[2]])) / 50000.0;
        let mut lng = f64::from(u32::from_be_bytes([0, b[3], b[4], b[5]])) / 50000.0;
        if b[6] & 0x80 != 0 {
            lat = -lat;
        }
        if b[6] & 0x40 != 0 {
            lng = -lng;
        }
        (lat, lng)
    });

    let time = if layout.nmea_time {
        let b = take(&mut rest, NMEA_TIME_LEN);
        time::from_secs_since_2000(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    } else {
        None
    };

    let b = take(&mut rest, TRAILER_LEN);
    let word = u16::from_be_bytes([b[0], b[1]]);
    Ok(Scan {
        freqs,
        volts: v,
        surface_par,
        position,
        time,
        pressure_temp: word >> 4,
        status: CtdStatus::decode((word & 0x0f) as u8),
        modulo_count: b[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let layout = ScanLayout::default();
        assert_eq!(layout.freq_words, 3);
        assert_eq!(layout.ad_words, 0);
        assert_eq!(layout.byte_len(), 12);
    }

    #[test]
    fn decode_full_layout() {
        let layout = ScanLayout::builder()
            .freq_words(1)
            .ad_words(1)
            .surface_par(true)
            .nmea_position(true)
            .nmea_time(true)
            .build();
        #[rustfmt::skip]
        let raw = hex::decode(concat!(
            "0a0b80",         // f0
            "000fff",         // ad word: 0, 4095
            "000ccc",         // surface par
            "1e8480", "2dc6c0", "40", // 40.0, 60.0, lng negative
            "0a000000",       // 10 s after 2000
            "9c45",           // psT 0x9c4, status 0101
            "07",             // modulo
        ))
        .unwrap();
        assert_eq!(raw.len(), layout.byte_len());

        let scan = decode_scan(&raw, &layout).unwrap();
        assert_eq!(scan.freqs, vec![2560.0 + 11.0 + 0.5]);
        assert_eq!(scan.volts, vec![5.0, 0.0]);
        assert_eq!(scan.surface_par, Some(f64::from(0xccc) / 819.0));
        assert_eq!(scan.position, Some((40.0, -60.0)));
        assert_eq!(
            scan.time.unwrap().to_rfc3339(),
            "2000-01-01T00:00:10+00:00"
        );
        assert_eq!(scan.pressure_temp, 0x9c4);
        assert!(scan.status.pump_on);
        assert!(!scan.status.no_bottom_contact);
        assert!(scan.status.water_sampler);
        assert!(!scan.status.no_carrier);
        assert_eq!(scan.modulo_count, 7);
    }

    #[test]
    fn short_scan_fails() {
        let err = decode_scan(&[0; 11], &ScanLayout::default()).unwrap_err();
        assert_eq!(
            err,
            Error::NotEnoughData {
                actual: 11,
                minimum: 12
            }
        );
    }

    #[test]
    fn describe_raw_words() {
        let raw = hex::decode("0102030405060708090a0b0c").unwrap();
        let r = ScanLayout::default().describe(&raw).unwrap();
        assert_eq!(r.u64("f0"), Some(0x010203));
        assert_eq!(r.u64("f2"), Some(0x070809));
        assert_eq!(r.u64("status"), Some(0x0a0b));
        assert_eq!(r.u64("moduloCount"), Some(0x0c));
        assert_eq!(r.byte_size(), 12);
    }
}
