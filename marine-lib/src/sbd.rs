//! Argo float Iridium SBD messages.
//!
//! A message is a run of 100 byte big-endian packets. The first byte of a
//! packet is its type; CTD packets carry up to 15 samples after a short
//! header and the time of the first sample.
use std::sync::LazyLock;

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{trace, warn};

use crate::describe::{Described, Record, RecordWalker};
use crate::schema::{FieldType, Schema, Value};
use crate::section::{log_split, Format, Section};
use crate::{bytes, Result};

pub const PACKET_LEN: usize = 100;
/// Samples in a CTD packet, including all-zero padding samples.
pub const CTD_SAMPLES: usize = 15;

fn compile(fields: &[(&str, &str)]) -> Schema {
    Schema::compile(fields).expect("float packet layouts are valid")
}

pub static TECHNICAL_N1: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("type", "U1"),
        ("gi_cycleno", "U2"),
        ("gi_irisesno", "U1"),
        ("gi_ffchk", "U2"),
        ("gi_fserialno", "U2"),
        ("er_day", "U1"),
        ("er_month", "U1"),
        ("er_year", "U1"),
        ("er_rday", "U1"),
        ("er_cyclestart", "U2"),
        ("er_hyd1surf", "U2"),
        ("er_nosimplevalvesurf", "U1"),
        ("er_groundsurf", "U1"),
        ("pdd_descstart", "U2"),
        ("pdd_fstabletime", "U2"),
        ("pdd_descend", "U2"),
        ("pdd_novalve", "U1"),
        ("pdd_nopump", "U1"),
        ("pdd_fstablepres", "U2"),
        ("pdd_maxpres", "U2"),
        ("pdp_driftabsday", "U1"),
        ("pdp_noent", "U1"),
        ("pdp_norepos", "U1"),
        ("pdp_minpres", "U2"),
        ("pdp_maxpres", "U2"),
        ("pdp_novalve", "U1"),
        ("pdp_nopump", "U1"),
        ("dpd_descstart", "U2"),
        ("dpd_descend", "U2"),
        ("dpd_novalve", "U1"),
        ("dpd_nopump", "U1"),
        ("dpd_maxpres", "U2"),
        ("dppp_noent", "U1"),
        ("dppp_norepos", "U1"),
        ("dppp_novalve", "U1"),
        ("dppp_nopump", "U1"),
        ("dppp_minpres", "U2"),
        ("dppp_maxpres", "U2"),
        ("ap_ascstart", "U2"),
        ("ap_ascend", "U2"),
        ("ap_nopump", "U1"),
        ("gi_ftime1", "U1"),
        ("gi_ftime2", "U1"),
        ("gi_ftime3", "U1"),
        ("gi_fdate1", "U1"),
        ("gi_fdate2", "U1"),
        ("gi_fdate3", "U1"),
        ("gi_pressensoroffset", "U1"),
        ("gi_intpres", "U1"),
        ("gi_battvoltdrop", "U1"),
        ("gi_rtcstate", "U1"),
        ("gi_problemcounter", "U1"),
        ("gi_oxysensorstatus", "U1"),
        ("gps_latdeg", "U1"),
        ("gps_latmin", "U1"),
        ("gps_latminfrac", "U2"),
        ("gps_latns", "U1"),
        ("gps_lngdeg", "U1"),
        ("gps_lngmin", "U1"),
        ("gps_lngminfrac", "U2"),
        ("gps_lngew", "U1"),
        ("gps_validfix", "U1"),
        ("gps_sesduration", "U2"),
        ("gps_retries", "U1"),
        ("gps_pumpduration", "U2"),
        ("gps_antennastatus", "U1"),
        ("eoli_detflag", "U1"),
        ("eoli_starthour1", "U1"),
        ("eoli_starthour2", "U1"),
        ("eoli_starthour3", "U1"),
        ("eoli_startdate1", "U1"),
        ("eoli_startdate2", "U1"),
        ("eoli_startdate3", "U1"),
        ("eoli_notused1", "U1"),
        ("eoli_notused2", "U1"),
        ("eoli_notused3", "U1"),
    ])
});

pub static CTD_HEADER: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("type", "U1"),
        ("gi_cycleno", "U2"),
        ("hour", "U2"),
        ("min", "U1"),
        ("sec", "U1"),
    ])
});

pub static CTD_SAMPLE: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("pres", "U2"), ("temp", "U2"), ("sal", "U2")]));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PacketType {
    TechnicalN1,
    DescentCtd,
    DriftCtd,
    AscentCtd,
    TechnicalN2,
    FloatParameter,
    Hydraulic,
    Unknown(u8),
}

impl PacketType {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        use PacketType::*;
        match code {
            0 => TechnicalN1,
            1 => DescentCtd,
            2 => DriftCtd,
            3 => AscentCtd,
            4 => TechnicalN2,
            5 => FloatParameter,
            6 => Hydraulic,
            other => Unknown(other),
        }
    }

    #[must_use]
    pub fn code(&self) -> u8 {
        use PacketType::*;
        match self {
            TechnicalN1 => 0,
            DescentCtd => 1,
            DriftCtd => 2,
            AscentCtd => 3,
            TechnicalN2 => 4,
            FloatParameter => 5,
            Hydraulic => 6,
            Unknown(code) => *code,
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        use PacketType::*;
        match self {
            TechnicalN1 => "Technical packet n1",
            DescentCtd => "Descent CTD packet",
            DriftCtd => "Drift CTD packet",
            AscentCtd => "Ascent CTD packet",
            TechnicalN2 => "Technical packet n2",
            FloatParameter => "Float parameter packet",
            Hydraulic => "Hydraulic packet",
            Unknown(_) => "Unknown",
        }
    }

    #[must_use]
    pub fn is_ctd(&self) -> bool {
        matches!(
            self,
            PacketType::DescentCtd | PacketType::DriftCtd | PacketType::AscentCtd
        )
    }
}

/// Pressure in decibar.
#[must_use]
pub fn pressure_dbar(raw: u16) -> f64 {
    f64::from(raw) / 10.0
}

/// Temperature in degrees Celsius.
#[must_use]
pub fn temperature_c(raw: u16) -> f64 {
    f64::from(raw) / 1000.0
}

/// Practical salinity.
#[must_use]
pub fn salinity_psu(raw: u16) -> f64 {
    (f64::from(raw) + 10000.0) / 1000.0
}

/// One CTD sample in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CtdSample {
    pub pressure: f64,
    pub temperature: f64,
    pub salinity: f64,
}

/// Raw samples of the CTD packet at `offset`, skipping all-zero padding.
fn raw_samples(buf: &[u8], offset: usize) -> Result<Vec<(usize, [u16; 3])>> {
    let first = offset + CTD_HEADER.size();
    bytes::slice(buf, first, CTD_SAMPLES * CTD_SAMPLE.size())?;
    let mut samples = Vec::with_capacity(CTD_SAMPLES);
    for i in 0..CTD_SAMPLES {
        let at = first + i * CTD_SAMPLE.size();
        let s = [
            bytes::u16_at(buf, at, false)?,
            bytes::u16_at(buf, at + 2, false)?,
            bytes::u16_at(buf, at + 4, false)?,
        ];
        if s != [0, 0, 0] {
            samples.push((i, s));
        }
    }
    Ok(samples)
}

/// The SBD packet format. Packets are always big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Argo;

impl Argo {
    /// Samples of a CTD packet in physical units.
    ///
    /// # Errors
    /// [crate::Error::NotEnoughData] if the packet is truncated.
    pub fn ctd_samples(&self, buf: &[u8], section: &Section) -> Result<Vec<CtdSample>> {
        Ok(raw_samples(buf, section.offset)?
            .into_iter()
            .map(|(_, [p, t, s])| CtdSample {
                pressure: pressure_dbar(p),
                temperature: temperature_c(t),
                salinity: salinity_psu(s),
            })
            .collect())
    }
}

impl Format for Argo {
    /// One section per 100 bytes. Packets of unknown type and a trailing
    /// partial packet are invalid.
    fn split(&self, buf: &[u8]) -> Vec<Section> {
        if buf.len() % PACKET_LEN != 0 {
            warn!(len = buf.len(), "message is not a whole number of packets");
        }
        let sections: Vec<Section> = buf
            .chunks(PACKET_LEN)
            .enumerate()
            .map(|(i, packet)| {
                let kind = PacketType::from_code(packet[0]);
                let valid = packet.len() == PACKET_LEN && !matches!(kind, PacketType::Unknown(_));
                trace!(offset = i * PACKET_LEN, kind = kind.title(), valid, "packet");
                Section {
                    kind: u16::from(kind.code()),
                    offset: i * PACKET_LEN,
                    length: packet.len(),
                    valid,
                }
            })
            .collect();
        log_split("sbd", &sections);
        sections
    }

    /// Technical n1 and CTD packets are described in full; other packets
    /// describe their type byte only.
    fn describe(&self, buf: &[u8], section: &Section) -> Result<Record> {
        let kind = PacketType::from_code(bytes::u8_at(buf, section.offset)?);
        let mut w = RecordWalker::new(buf, section.offset, section.offset + section.length, false);
        if kind == PacketType::TechnicalN1 {
            w.schema(&TECHNICAL_N1, "")?;
        } else if kind.is_ctd() {
            w.schema(&CTD_HEADER, "")?;
            w.ensure("samples", CTD_SAMPLES, CTD_SAMPLE.size())?;
            let mut record = w.finish();
            for (i, sample) in raw_samples(buf, section.offset)? {
                for (name, v) in ["pres", "temp", "sal"].into_iter().zip(sample) {
                    record.insert(
                        format!("{name}{}", i + 1),
                        Described::new(Value::U(u64::from(v)), FieldType::U2),
                    );
                }
            }
            return Ok(record);
        } else {
            w.field("type", FieldType::U1)?;
        }
        Ok(w.finish())
    }

    fn title(&self, kind: u16) -> &'static str {
        u8::try_from(kind).map_or("Unknown", |k| PacketType::from_code(k).title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn ctd_packet(kind: u8, samples: &[[u16; 3]]) -> Vec<u8> {
        let mut p = vec![0u8; PACKET_LEN];
        p[0] = kind;
        p[1..3].copy_from_slice(&42u16.to_be_bytes());
        for (i, s) in samples.iter().enumerate() {
            let at = CTD_HEADER.size() + i * CTD_SAMPLE.size();
            for (j, v) in s.iter().enumerate() {
                p[at + j * 2..at + j * 2 + 2].copy_from_slice(&v.to_be_bytes());
            }
        }
        p
    }

    #[test]
    fn layouts_compile() {
        assert_eq!(TECHNICAL_N1.size(), 99);
        assert_eq!(CTD_HEADER.size(), 7);
        assert_eq!(CTD_HEADER.size() + CTD_SAMPLES * CTD_SAMPLE.size(), 97);
    }

    #[test]
    fn split_marks_unknown_and_partial() {
        let mut buf = vec![0u8; PACKET_LEN];
        buf.extend(ctd_packet(9, &[]));
        buf.extend(ctd_packet(2, &[])[..40].iter());
        let sections = Argo.split(&buf);
        assert_eq!(sections.len(), 3);
        assert!(sections[0].valid);
        assert!(!sections[1].valid, "unknown type");
        assert_eq!(sections[1].kind, 9);
        assert!(!sections[2].valid, "partial packet");
        assert_eq!(sections[2].length, 40);
        assert_eq!(Argo.title(sections[2].kind), "Drift CTD packet");
    }

    #[test]
    fn describe_ctd_skips_zero_samples() {
        let buf = ctd_packet(3, &[[1000, 15000, 24000], [0, 0, 0], [2000, 4000, 24500]]);
        let section = Argo.split(&buf)[0];
        let r = Argo.describe(&buf, &section).unwrap();
        assert_eq!(r.u64("gi_cycleno"), Some(42));
        assert_eq!(r.u64("pres1"), Some(1000));
        assert!(r.get("pres2").is_none());
        assert_eq!(r.u64("sal3"), Some(24500));
        assert!(r.get("pres4").is_none());

        let samples = Argo.ctd_samples(&buf, &section).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].pressure, 100.0);
        assert_eq!(samples[0].temperature, 15.0);
        assert_eq!(samples[0].salinity, 34.0);
    }

    #[test]
    fn describe_technical_and_other() {
        let mut buf = vec![0u8; PACKET_LEN];
        buf[1..3].copy_from_slice(&7u16.to_be_bytes());
        buf.extend(ctd_packet(5, &[]));
        let sections = Argo.split(&buf);

        let r = Argo.describe(&buf, &sections[0]).unwrap();
        assert_eq!(r.u64("gi_cycleno"), Some(7));
        assert!(r.get("eoli_notused3").is_some());

        let r = Argo.describe(&buf, &sections[1]).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.u64("type"), Some(5));
    }

    #[test]
    fn truncated_ctd_packet_fails() {
        let buf = ctd_packet(1, &[[1, 2, 3]]);
        let section = Section {
            kind: 1,
            offset: 0,
            length: 50,
            valid: false,
        };
        assert!(matches!(
            Argo.describe(&buf[..50], &section),
            Err(Error::LengthConsistency { .. })
        ));
    }
}
