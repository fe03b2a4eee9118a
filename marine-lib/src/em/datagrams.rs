//! Datagram layouts and their describers.
//!
//! Every datagram starts with the same 16 byte header; the layouts below
//! list it explicitly so field offsets match the vendor documentation.
use std::sync::LazyLock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::describe::{Record, RecordWalker};
use crate::schema::{FieldType, Schema};
use crate::{bytes, Result};

use super::DatagramType;

const HEADER: [(&str, &str); 6] = [
    ("length", "U4"),
    ("stx", "U1"),
    ("type", "U1"),
    ("model", "U2"),
    ("date", "U4"),
    ("time", "U4"),
];

fn with_header(fields: &[(&str, &str)]) -> Schema {
    let spec: Vec<(&str, &str)> = HEADER.iter().chain(fields).copied().collect();
    Schema::compile(&spec).expect("multibeam layouts are valid")
}

fn compile(fields: &[(&str, &str)]) -> Schema {
    Schema::compile(fields).expect("multibeam layouts are valid")
}

pub static COMMON: LazyLock<Schema> = LazyLock::new(|| with_header(&[]));

pub static XYZ88_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("heading", "U2"),
        ("ss", "U2"),
        ("txTRDepth", "F4"),
        ("numBeams", "U2"),
        ("numValid", "U2"),
        ("freq", "F4"),
        ("info", "U1"),
        ("spare01", "U1"),
        ("spare02", "U1"),
        ("spare03", "U1"),
    ])
});

pub static XYZ88_BEAM: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("z", "F4"),
        ("y", "F4"),
        ("x", "F4"),
        ("windowLen", "U2"),
        ("QFac", "U1"),
        ("angAdj", "I1"),
        ("dInfo", "U1"),
        ("cInfo", "I1"),
        ("reflectivity", "I2"),
    ])
});

pub static XYZ88_TAIL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("spare04", "U1"), ("etx", "U1"), ("checksum", "U2")]));

pub static INSTALL: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("lineNo", "U2"),
        ("serial", "U2"),
        ("serial2ndSonar", "U2"),
    ])
});

pub static RUNTIME: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("operatorStationStatus", "U1"),
        ("PUStatus", "U1"),
        ("BSPStatus", "U1"),
        ("SHTStatus", "U1"),
        ("mode", "U1"),
        ("filterID", "U1"),
        ("minDepth", "U2"),
        ("maxDepth", "U2"),
        ("absorpCoeff", "U2"),
        ("txPulseLen", "U2"),
        ("txBeamWidth", "U2"),
        ("txPower", "I1"),
        ("rxBeamWidth", "U1"),
        ("rxBandwidth", "U1"),
        ("rxGain", "U1"),
        ("TVGLawAng", "U1"),
        ("srcSS", "U1"),
        ("maxPortSwath", "U2"),
        ("beamSpacing", "U1"),
        ("maxPortCoverage", "U1"),
        ("yawPitchStable", "U1"),
        ("maxSTBDCoverage", "U1"),
        ("maxSTBDSwath", "U2"),
        ("txTiltValue", "I2"),
        ("filterID2", "U1"),
        ("etx", "U1"),
        ("checksum", "U2"),
    ])
});

pub static POSITION: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("positionCounter", "U2"),
        ("serial", "U2"),
        ("lat", "I4"),
        ("lng", "I4"),
        ("measurePosFixQ", "U2"),
        ("speed", "U2"),
        ("course", "U2"),
        ("heading", "U2"),
        ("posSysDesc", "U1"),
        ("numInput", "U1"),
    ])
});

pub static DEPTH_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("heading", "U2"),
        ("ss", "U2"),
        ("txTRDepth", "U2"),
        ("maxNumBeams", "U1"),
        ("numValid", "U1"),
        ("zRes", "U1"),
        ("xyRes", "U1"),
        ("freq", "U2"),
    ])
});

fn depth_beam(z: &str) -> Schema {
    compile(&[
        ("z", z),
        ("y", "I2"),
        ("x", "I2"),
        ("beamDeprAng", "I2"),
        ("beamAzimAng", "U2"),
        ("range", "U2"),
        ("QFac", "U1"),
        ("len", "U1"),
        ("reflectivity", "I1"),
        ("beamNum", "U1"),
    ])
}

/// Depth beam for EM 120 and EM 300, which store depth unsigned.
pub static DEPTH_BEAM_UNSIGNED: LazyLock<Schema> = LazyLock::new(|| depth_beam("U2"));
pub static DEPTH_BEAM_SIGNED: LazyLock<Schema> = LazyLock::new(|| depth_beam("I2"));

pub static DEPTH_TAIL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("depthOffsetM", "I1"), ("etx", "U1"), ("checksum", "U2")]));

pub static SOUND_SPEED_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("date2", "U4"),
        ("time2", "U4"),
        ("numEntries", "U2"),
        ("depthRes", "U2"),
    ])
});

pub static SPARE_TAIL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("spareEOS", "U1"), ("etx", "U1"), ("checksum", "U2")]));

pub static PU_ID: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("byteOrder", "U2"),
        ("serial", "U2"),
        ("UDP1", "U2"),
        ("UDP2", "U2"),
        ("UDP3", "U2"),
        ("UDP4", "U2"),
        ("sysDesc", "U4"),
        ("PUVer", "A16"),
        ("BSPVer", "A16"),
        ("sonarHead1Ver", "A16"),
        ("sonarHead2Ver", "A16"),
        ("IPAddr", "U4"),
        ("txOpenAng", "U1"),
        ("rxOpenAng", "U1"),
        ("spare1", "U4"),
        ("spare2", "U2"),
        ("spareEOS", "U1"),
        ("etx", "U1"),
        ("checksum", "U2"),
    ])
});

pub static PU_STATUS: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("statusCounter", "U2"),
        ("serial", "U2"),
        ("pingRate", "U2"),
        ("pingCounter", "U2"),
        ("distSwath10", "U4"),
        ("UDP2", "U4"),
        ("serial1", "U4"),
        ("serial2", "U4"),
        ("serial3", "U4"),
        ("serial4", "U4"),
        ("pps", "I1"),
        ("posStat", "I1"),
        ("attStat", "I1"),
        ("clockStat", "I1"),
        ("headingStat", "I1"),
        ("puStat", "U1"),
        ("lastHeading", "U2"),
        ("lastRoll", "I2"),
        ("lastPitch", "I2"),
        ("lastHeave", "U2"),
        ("ssTrans", "U2"),
        ("lastDepth", "U4"),
        ("velocity", "I2"),
        ("attVelocity", "U1"),
        ("mammalRamp", "U1"),
        ("backObliqueAngle", "I1"),
        ("backIncidence", "I1"),
        ("fixedGain", "I1"),
        ("depthIncidence", "U1"),
        ("rangeIncidence", "U2"),
        ("portCoverage", "U1"),
        ("stbdCoverage", "U1"),
        ("ssTransProfile", "U2"),
        ("yawStabAngle", "I2"),
        ("portCoverage2", "I2"),
        ("stbdCoverage2", "I2"),
        ("tempCPU", "I1"),
        ("etx", "U1"),
        ("checksum", "U2"),
    ])
});

pub static NETWORK_ATTITUDE_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("netAttCounter", "U2"),
        ("serial", "U2"),
        ("numEntries", "U2"),
        ("senSysDesc", "I1"),
        ("spare1", "U1"),
    ])
});

pub static NETWORK_ATTITUDE_ENTRY: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("time", "U2"),
        ("roll", "I2"),
        ("pitch", "I2"),
        ("heave", "I2"),
        ("heading", "U2"),
        ("numBytes", "U1"),
    ])
});

pub static CLOCK: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("clockCounter", "U2"),
        ("serial", "U2"),
        ("date2", "U4"),
        ("time2", "U4"),
        ("ppsUsed", "U1"),
        ("etx", "U1"),
        ("checksum", "U2"),
    ])
});

pub static ATTITUDE_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("attCounter", "U2"),
        ("serial", "U2"),
        ("numEntries", "U2"),
    ])
});

pub static ATTITUDE_ENTRY: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("time", "U2"),
        ("senStatus", "U2"),
        ("roll", "I2"),
        ("pitch", "I2"),
        ("heave", "I2"),
        ("heading", "U2"),
    ])
});

pub static ATTITUDE_TAIL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("senSysDesc", "U1"), ("etx", "U1"), ("checksum", "U2")]));

pub static SEABED_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("meanAbsorpCoeff", "U2"),
        ("pulseLen", "U2"),
        ("rangeIncience", "U2"),
        ("startTVG", "U2"),
        ("stoptTVG", "U2"),
        ("BSN", "I1"),
        ("BSO", "I1"),
        ("txBeamWidth", "U2"),
        ("tvgLaw", "U1"),
        ("numValidBeams", "U1"),
    ])
});

pub static SEABED_ENTRY: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("idx", "U1"),
        ("direction", "I1"),
        ("Ns", "U2"),
        ("centreSampleNum", "U2"),
    ])
});

pub static SEABED89_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("sampleFreq", "F4"),
        ("rangeIncience", "U2"),
        ("BSN", "I2"),
        ("BSO", "I2"),
        ("txBeamWidth", "U2"),
        ("tvgLaw", "U2"),
        ("numValidBeams", "U2"),
    ])
});

pub static SEABED89_ENTRY: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("direction", "I1"),
        ("dInfo", "U1"),
        ("Ns", "U2"),
        ("centreSampleNum", "U2"),
    ])
});

pub static RAW78_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("ssTrans", "U2"),
        ("Ntx", "U2"),
        ("Nrx", "U2"),
        ("numValidDetect", "U2"),
        ("sampleFreq", "F4"),
        ("dScale", "U4"),
    ])
});

pub static RAW78_TX: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("tiltAngle", "I2"),
        ("focusRange", "U2"),
        ("sigLen", "F4"),
        ("secTransDelay", "F4"),
        ("centreFreq", "F4"),
        ("meanAbsorpCoeff", "U2"),
        ("sigId", "U1"),
        ("transSecNum", "U1"),
        ("sigBandwidth", "F4"),
    ])
});

pub static RAW78_RX: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("beamAngle", "I2"),
        ("transSecNum", "U1"),
        ("dInfo", "U1"),
        ("windowLen", "U2"),
        ("qFac", "U1"),
        ("dCorr", "I1"),
        ("twoTT", "F4"),
        ("BS", "I2"),
        ("cInfo", "I1"),
        ("spare", "U1"),
    ])
});

pub static EXTRA_HEAD: LazyLock<Schema> = LazyLock::new(|| {
    with_header(&[
        ("pingCounter", "U2"),
        ("serial", "U2"),
        ("contentID", "U2"),
    ])
});

/// Extra parameters content id carrying a text block.
const CONTENT_TEXT: u64 = 6;

fn entry_prefix(i: usize) -> String {
    format!("e{}_", i + 1)
}

/// Describe one datagram occupying `buf[start..end]`.
pub(super) fn describe(
    typ: DatagramType,
    buf: &[u8],
    start: usize,
    end: usize,
    le: bool,
) -> Result<Record> {
    let mut w = RecordWalker::new(buf, start, end, le);
    match typ {
        DatagramType::Xyz88 => {
            w.schema(&XYZ88_HEAD, "")?;
            let n = w.count("numBeams")?;
            w.repeat("beams", n, &XYZ88_BEAM, entry_prefix)?;
            w.schema(&XYZ88_TAIL, "")?;
        }
        DatagramType::InstallStart | DatagramType::InstallStop | DatagramType::InstallRemote => {
            w.schema(&INSTALL, "")?;
            let n = w.count("length")?.saturating_sub(INSTALL.size());
            w.ascii("ascii", n)?;
            w.end_of_datagram()?;
        }
        DatagramType::Runtime => {
            w.schema(&RUNTIME, "")?;
        }
        DatagramType::Position => {
            w.schema(&POSITION, "")?;
            let n = w.count("numInput")?;
            w.ascii("input", n)?;
            w.end_of_datagram()?;
        }
        DatagramType::DepthDatagram => {
            w.schema(&DEPTH_HEAD, "")?;
            let n = w.count("numValid")?;
            let beam = depth_beam_schema(w.count("model")?);
            w.repeat("beams", n, beam, entry_prefix)?;
            w.schema(&DEPTH_TAIL, "")?;
        }
        DatagramType::SoundSpeedProfile => {
            w.schema(&SOUND_SPEED_HEAD, "")?;
            let n = w.count("numEntries")?;
            w.ensure("entries", n, 8)?;
            for i in 1..=n {
                w.field(&format!("depth_{i}"), FieldType::U4)?;
                w.field(&format!("ss_{i}"), FieldType::U4)?;
            }
            w.schema(&SPARE_TAIL, "")?;
        }
        DatagramType::PuId => {
            w.schema(&PU_ID, "")?;
        }
        DatagramType::PuStatus => {
            w.schema(&PU_STATUS, "")?;
        }
        DatagramType::NetworkAttitudeVelocity => {
            w.schema(&NETWORK_ATTITUDE_HEAD, "")?;
            let n = w.count("numEntries")?;
            w.ensure("entries", n, NETWORK_ATTITUDE_ENTRY.size())?;
            for i in 0..n {
                let prefix = entry_prefix(i);
                w.schema(&NETWORK_ATTITUDE_ENTRY, &prefix)?;
                let len = w.count(&format!("{prefix}numBytes"))?;
                w.ascii(&format!("{prefix}inputs"), len)?;
            }
            w.end_of_datagram()?;
        }
        DatagramType::Clock => {
            w.schema(&CLOCK, "")?;
        }
        DatagramType::Attitude => {
            w.schema(&ATTITUDE_HEAD, "")?;
            let n = w.count("numEntries")?;
            w.repeat("entries", n, &ATTITUDE_ENTRY, entry_prefix)?;
            w.schema(&ATTITUDE_TAIL, "")?;
        }
        DatagramType::SeabedImage => {
            w.schema(&SEABED_HEAD, "")?;
            let n = w.count("numValidBeams")?;
            w.repeat("beams", n, &SEABED_ENTRY, entry_prefix)?;
            let counts = sample_counts(&w, n)?;
            w.repeat_sum("amplitudes", &counts, FieldType::I1, |i| {
                format!("amplitudes{}", i + 1)
            })?;
            w.end_of_datagram()?;
        }
        DatagramType::SeabedImage89 => {
            w.schema(&SEABED89_HEAD, "")?;
            let n = w.count("numValidBeams")?;
            w.repeat("beams", n, &SEABED89_ENTRY, entry_prefix)?;
            let counts = sample_counts(&w, n)?;
            w.repeat_sum("amplitudes", &counts, FieldType::I2, |i| {
                format!("amplitudes{}", i + 1)
            })?;
            w.schema(&SPARE_TAIL, "")?;
        }
        DatagramType::RawRangeAngle78 => {
            w.schema(&RAW78_HEAD, "")?;
            let ntx = w.count("Ntx")?;
            w.repeat("tx sectors", ntx, &RAW78_TX, |i| format!("ntx{}_", i + 1))?;
            let nrx = w.count("Nrx")?;
            w.repeat("rx beams", nrx, &RAW78_RX, |i| format!("nrx{}_", i + 1))?;
            w.schema(&SPARE_TAIL, "")?;
        }
        DatagramType::ExtraParameters => {
            w.schema(&EXTRA_HEAD, "")?;
            if w.record().u64("contentID") == Some(CONTENT_TEXT) {
                w.field("Nc", FieldType::U2)?;
                let n = w.count("Nc")?;
                w.ascii("content", n)?;
            }
            w.end_of_datagram()?;
        }
        _ => {
            w.schema(&COMMON, "")?;
        }
    }
    Ok(w.finish())
}

fn depth_beam_schema(model: usize) -> &'static Schema {
    if model == 120 || model == 300 {
        &*DEPTH_BEAM_UNSIGNED
    } else {
        &*DEPTH_BEAM_SIGNED
    }
}

fn sample_counts(w: &RecordWalker, n: usize) -> Result<Vec<usize>> {
    (0..n)
        .map(|i| w.count(&format!("{}Ns", entry_prefix(i))))
        .collect()
}

/// Vessel position from a position datagram, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub date: u32,
    pub time: u32,
    pub lat: f64,
    pub lng: f64,
    pub heading: f64,
    /// Metres per second.
    pub speed: f64,
    pub course: f64,
}

impl Position {
    /// Decode the position datagram starting at `offset`.
    ///
    /// # Errors
    /// [crate::Error::NotEnoughData] if the datagram header is truncated.
    pub fn decode(buf: &[u8], offset: usize, le: bool) -> Result<Self> {
        let s = &*POSITION;
        bytes::slice(buf, offset, s.size())?;
        Ok(Position {
            date: read_u32(s, buf, offset, "date", le)?,
            time: read_u32(s, buf, offset, "time", le)?,
            lat: s.read_f64(buf, offset, "lat", le)? / 20_000_000.0,
            lng: s.read_f64(buf, offset, "lng", le)? / 10_000_000.0,
            heading: s.read_f64(buf, offset, "heading", le)? / 100.0,
            speed: s.read_f64(buf, offset, "speed", le)? / 100.0,
            course: s.read_f64(buf, offset, "course", le)? / 100.0,
        })
    }
}

/// One ping of soundings relative to the transducer, in metres.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sounding {
    pub date: u32,
    pub time: u32,
    pub num_beams: usize,
    pub tx_depth: f64,
    /// `[x, y, z]` per beam: along track, across track, depth.
    pub beams: Vec<[f64; 3]>,
}

impl Sounding {
    /// Decode an XYZ88 datagram starting at `offset`.
    ///
    /// # Errors
    /// [crate::Error::LengthConsistency] if the beam count runs past the
    /// datagram.
    pub fn decode_xyz88(buf: &[u8], offset: usize, le: bool) -> Result<Self> {
        let head = &*XYZ88_HEAD;
        let beam = &*XYZ88_BEAM;
        bytes::slice(buf, offset, head.size())?;
        let num_beams = read_usize(head, buf, offset, "numBeams", le)?;
        let body = offset + head.size();
        check_body(buf, offset, head, "beams", num_beams, beam.size(), le)?;

        let mut beams = Vec::with_capacity(num_beams);
        for i in 0..num_beams {
            let at = body + i * beam.size();
            beams.push([
                beam.read_f64(buf, at, "x", le)?,
                beam.read_f64(buf, at, "y", le)?,
                beam.read_f64(buf, at, "z", le)?,
            ]);
        }
        Ok(Sounding {
            date: read_u32(head, buf, offset, "date", le)?,
            time: read_u32(head, buf, offset, "time", le)?,
            num_beams,
            tx_depth: head.read_f64(buf, offset, "txTRDepth", le)?,
            beams,
        })
    }

    /// Decode a depth datagram starting at `offset`, converting centimetres
    /// to metres.
    ///
    /// # Errors
    /// [crate::Error::LengthConsistency] if the beam count runs past the
    /// datagram.
    pub fn decode_depth(buf: &[u8], offset: usize, le: bool) -> Result<Self> {
        let head = &*DEPTH_HEAD;
        bytes::slice(buf, offset, head.size())?;
        let beam = depth_beam_schema(read_usize(head, buf, offset, "model", le)?);
        let num_beams = read_usize(head, buf, offset, "numValid", le)?;
        let body = offset + head.size();
        check_body(buf, offset, head, "beams", num_beams, beam.size(), le)?;

        let mut beams = Vec::with_capacity(num_beams);
        for i in 0..num_beams {
            let at = body + i * beam.size();
            beams.push([
                beam.read_f64(buf, at, "x", le)? / 100.0,
                beam.read_f64(buf, at, "y", le)? / 100.0,
                beam.read_f64(buf, at, "z", le)? / 100.0,
            ]);
        }
        Ok(Sounding {
            date: read_u32(head, buf, offset, "date", le)?,
            time: read_u32(head, buf, offset, "time", le)?,
            num_beams,
            tx_depth: head.read_f64(buf, offset, "txTRDepth", le)? / 100.0,
            beams,
        })
    }
}

fn read_u32(s: &Schema, buf: &[u8], offset: usize, name: &str, le: bool) -> Result<u32> {
    let v = s.read_u64(buf, offset, name, le)?;
    u32::try_from(v).map_err(|_| crate::Error::UnknownField(name.to_string()))
}

fn read_usize(s: &Schema, buf: &[u8], offset: usize, name: &str, le: bool) -> Result<usize> {
    let v = s.read_u64(buf, offset, name, le)?;
    usize::try_from(v).map_err(|_| crate::Error::UnknownField(name.to_string()))
}

/// Bound a counted body by the datagram's own length field.
fn check_body(
    buf: &[u8],
    offset: usize,
    head: &Schema,
    what: &str,
    count: usize,
    unit: usize,
    le: bool,
) -> Result<()> {
    let length = read_usize(head, buf, offset, "length", le)?;
    let end = offset.saturating_add(length).saturating_add(4);
    let w = RecordWalker::new(buf, offset + head.size(), end, le);
    w.ensure(what, count, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn datagram(kind: u8, body: &[u8]) -> Vec<u8> {
        let mut dat = Vec::with_capacity(COMMON.size() + body.len());
        dat.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
        dat.extend_from_slice(&[0x02, kind]);
        dat.extend_from_slice(&2040u16.to_le_bytes());
        dat.extend_from_slice(&20_210_410u32.to_le_bytes());
        dat.extend_from_slice(&3_600_000u32.to_le_bytes());
        dat.extend_from_slice(body);
        dat
    }

    fn describe_le(kind: u8, dat: &[u8]) -> Result<Record> {
        describe(DatagramType::from_code(kind), dat, 0, dat.len(), true)
    }

    fn seabed89(counts: [u16; 3]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&100u16.to_le_bytes());
        body.extend_from_slice(&30_000.0f32.to_le_bytes());
        body.extend_from_slice(&12u16.to_le_bytes());
        body.extend_from_slice(&(-30i16).to_le_bytes());
        body.extend_from_slice(&(-15i16).to_le_bytes());
        body.extend_from_slice(&10u16.to_le_bytes());
        body.extend_from_slice(&3u16.to_le_bytes());
        body.extend_from_slice(&3u16.to_le_bytes());
        for (i, ns) in counts.iter().enumerate() {
            body.push((i as i8 - 1) as u8);
            body.push(0);
            body.extend_from_slice(&ns.to_le_bytes());
            body.extend_from_slice(&(ns / 2).to_le_bytes());
        }
        for a in [-100i16, -101, -200, -201, -202] {
            body.extend_from_slice(&a.to_le_bytes());
        }
        body.extend_from_slice(&[0x00, 0x03, 0x34, 0x12]);
        datagram(0x89, &body)
    }

    #[test]
    fn seabed89_amplitudes_follow_sample_counts() {
        let dat = seabed89([2, 0, 3]);
        let r = describe_le(0x89, &dat).unwrap();

        assert_eq!(r.u64("numValidBeams"), Some(3));
        assert_eq!(r.i64("e1_direction"), Some(-1));
        assert_eq!(r.u64("e2_Ns"), Some(0));
        assert_eq!(r.u64("e3_Ns"), Some(3));
        assert_eq!(r.i64("amplitudes1"), Some(-100));
        assert_eq!(r.i64("amplitudes3"), Some(-200));
        assert_eq!(r.i64("amplitudes5"), Some(-202));
        assert!(r.get("amplitudes6").is_none());
        assert_eq!(r.u64("spareEOS"), Some(0));
        assert_eq!(r.u64("etx"), Some(0x03));
        assert_eq!(r.u64("checksum"), Some(0x1234));
        assert_eq!(r.byte_size(), dat.len());
    }

    #[test]
    fn seabed89_sample_counts_past_datagram_fail() {
        let dat = seabed89([2, 0, 30]);
        assert!(matches!(
            describe_le(0x89, &dat),
            Err(Error::LengthConsistency { .. })
        ));
    }

    #[test]
    fn seabed_amplitudes_are_single_bytes() {
        let mut body = Vec::new();
        for v in [1u16, 100, 50, 200, 12, 5, 40] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        body.extend_from_slice(&[0xe2, 0xf1]);
        body.extend_from_slice(&10u16.to_le_bytes());
        body.extend_from_slice(&[3, 2]);
        #[rustfmt::skip]
        let beams: [u8; 12] = [
            0, 0xff, 2, 0, 1, 0,
            1, 0x01, 1, 0, 0, 0,
        ];
        body.extend_from_slice(&beams);
        body.extend_from_slice(&[0xfb, 0xfa, 0xf9]);
        body.extend_from_slice(&[0x03, 0x34, 0x12]);
        let dat = datagram(0x53, &body);

        let r = describe_le(0x53, &dat).unwrap();
        assert_eq!(r.i64("BSN"), Some(-30));
        assert_eq!(r.u64("e2_idx"), Some(1));
        assert_eq!(r.i64("amplitudes1"), Some(-5));
        assert_eq!(r.i64("amplitudes3"), Some(-7));
        assert!(r.get("amplitudes4").is_none());
        assert!(r.get("spareEOS").is_none());
        assert_eq!(r.u64("checksum"), Some(0x1234));
        assert_eq!(r.byte_size(), dat.len());
    }

    #[test]
    fn xyz88_three_beams() {
        let mut body = Vec::new();
        for v in [7u16, 100, 18_000, 15_000] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        body.extend_from_slice(&4.5f32.to_le_bytes());
        body.extend_from_slice(&3u16.to_le_bytes());
        body.extend_from_slice(&3u16.to_le_bytes());
        body.extend_from_slice(&12_000.0f32.to_le_bytes());
        body.extend_from_slice(&[0, 0, 0, 0]);
        for i in 1..=3u8 {
            let f = f32::from(i);
            for v in [100.0 * f, 10.0 * f, f] {
                body.extend_from_slice(&v.to_le_bytes());
            }
            body.extend_from_slice(&[0x10, 0x00, 0x05, 0x00, 0x01, 0x00, i, 0x00]);
        }
        body.extend_from_slice(&[0x00, 0x03, 0x00, 0x00]);
        let dat = datagram(0x58, &body);

        let r = describe_le(0x58, &dat).unwrap();
        for i in 1..=3 {
            let f = f64::from(i);
            assert_eq!(r.f64(&format!("e{i}_z")), Some(100.0 * f));
            assert_eq!(r.f64(&format!("e{i}_y")), Some(10.0 * f));
            assert_eq!(r.f64(&format!("e{i}_x")), Some(f));
            assert_eq!(r.i64(&format!("e{i}_reflectivity")), Some(i64::from(i)));
        }
        assert!(r.get("e4_z").is_none());
        assert_eq!(
            r.byte_size() - XYZ88_TAIL.size(),
            XYZ88_HEAD.size() + 3 * XYZ88_BEAM.size()
        );
        assert_eq!(r.byte_size(), dat.len());
        assert_eq!(r.u64("etx"), Some(0x03));
    }

    #[test]
    fn layouts_compile() {
        let all: [(&str, &LazyLock<Schema>, usize); 28] = [
            ("common", &COMMON, 16),
            ("xyz88 head", &XYZ88_HEAD, 40),
            ("xyz88 beam", &XYZ88_BEAM, 20),
            ("xyz88 tail", &XYZ88_TAIL, 4),
            ("install", &INSTALL, 22),
            ("runtime", &RUNTIME, 56),
            ("position", &POSITION, 38),
            ("depth head", &DEPTH_HEAD, 32),
            ("depth beam u", &DEPTH_BEAM_UNSIGNED, 16),
            ("depth beam i", &DEPTH_BEAM_SIGNED, 16),
            ("depth tail", &DEPTH_TAIL, 4),
            ("ssp head", &SOUND_SPEED_HEAD, 32),
            ("spare tail", &SPARE_TAIL, 4),
            ("pu id", &PU_ID, 112),
            ("pu status", &PU_STATUS, 92),
            ("nav head", &NETWORK_ATTITUDE_HEAD, 24),
            ("nav entry", &NETWORK_ATTITUDE_ENTRY, 11),
            ("clock", &CLOCK, 32),
            ("attitude head", &ATTITUDE_HEAD, 22),
            ("attitude entry", &ATTITUDE_ENTRY, 12),
            ("attitude tail", &ATTITUDE_TAIL, 4),
            ("seabed head", &SEABED_HEAD, 36),
            ("seabed entry", &SEABED_ENTRY, 6),
            ("seabed89 head", &SEABED89_HEAD, 36),
            ("seabed89 entry", &SEABED89_ENTRY, 6),
            ("raw78 head", &RAW78_HEAD, 36),
            ("raw78 tx", &RAW78_TX, 24),
            ("raw78 rx", &RAW78_RX, 16),
        ];
        for (name, schema, size) in all {
            assert_eq!(schema.size(), size, "{name} size");
        }
        assert_eq!(EXTRA_HEAD.size(), 22);
    }
}
