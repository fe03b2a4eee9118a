//! Ensemble sub-section layouts and the decoders for their packed words.
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::bits::{decode_any_bit, AnyTable, Matched};
use crate::schema::Schema;
use crate::time;

/// Velocity component marking a bad or missing measurement.
pub const INVALID_VELOCITY: i16 = -32768;

fn compile(fields: &[(&str, &str)]) -> Schema {
    Schema::compile(fields).expect("ensemble layouts are valid")
}

pub static HEADER: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("hID", "U2"),
        ("noBytesEns", "U2"),
        ("spare01", "U1"),
        ("noDataTypes", "U1"),
    ])
});

pub static FIXED_LEADER: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("hID", "U2"),
        ("fwVer", "U1"),
        ("fwRev", "U1"),
        ("sysCfg", "U2"),
        ("flagSim", "U1"),
        ("lagLen", "U1"),
        ("noBeams", "U1"),
        ("noCells", "U1"),
        ("pingsPEns", "U2"),
        ("dptCellLen", "U2"),
        ("blankTrans", "U2"),
        ("profMode", "U1"),
        ("lowCorrThresh", "U1"),
        ("noCodeReps", "U1"),
        ("PGMin", "U1"),
        ("EVMax", "U2"),
        ("TPPm", "U1"),
        ("TPPs", "U1"),
        ("TPPHund", "U1"),
        ("coordTransf", "U1"),
        ("hdtAli", "U2"),
        ("hdtBias", "U2"),
        ("sensorSrc", "U1"),
        ("sensorsAvail", "U1"),
        ("bin1Dist", "U2"),
        ("xmitPulseLen", "U2"),
        ("WPRefAvg", "U2"),
        ("falseTgtThresh", "U1"),
        ("spare02", "U1"),
        ("transLagDist", "U2"),
        ("cpuSerial", "U8"),
        ("sysBandwidth", "U2"),
        ("sysPwr", "U1"),
        ("spare03", "U1"),
        ("insSerial", "U4"),
        ("beamAngle", "U1"),
    ])
});

/// Variable leader up to the RTC year. Older instruments stop there even
/// though later firmware appends the rest of the RTC timestamp.
pub static VARIABLE_LEADER: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("hID", "U2"),
        ("noEns", "U2"),
        ("tsYear", "U1"),
        ("tsMonth", "U1"),
        ("tsDay", "U1"),
        ("tsHour", "U1"),
        ("tsMin", "U1"),
        ("tsSec", "U1"),
        ("tsHundredths", "U1"),
        ("ensMSB", "U1"),
        ("bitResult", "U2"),
        ("soundSpeed", "U2"),
        ("dptTrans", "U2"),
        ("hdt", "U2"),
        ("pitch", "I2"),
        ("roll", "I2"),
        ("salinity", "U2"),
        ("temp", "I2"),
        ("mptMin", "U1"),
        ("mptSec", "U1"),
        ("mptHundredths", "U1"),
        ("stdHdt", "U1"),
        ("stdPitch", "U1"),
        ("stdRoll", "U1"),
        ("adc0", "U1"),
        ("adc1", "U1"),
        ("adc2", "U1"),
        ("adc3", "U1"),
        ("adc4", "U1"),
        ("adc5", "U1"),
        ("adc6", "U1"),
        ("adc7", "U1"),
        ("errStatus", "U4"),
        ("spare01", "U2"),
        ("pressure", "U4"),
        ("pressureVar", "U4"),
        ("spare02", "U1"),
        ("rtcCentury", "U1"),
        ("rtcYear", "U1"),
    ])
});

pub static VELOCITY_CELL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("v1", "I2"), ("v2", "I2"), ("v3", "I2"), ("v4", "I2")]));

/// Per beam byte cell shared by correlation, echo intensity and status.
pub static BEAM_CELL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("b1", "U1"), ("b2", "U1"), ("b3", "U1"), ("b4", "U1")]));

pub static PERCENT_GOOD_CELL: LazyLock<Schema> =
    LazyLock::new(|| compile(&[("f1", "U1"), ("f2", "U1"), ("f3", "U1"), ("f4", "U1")]));

pub static BOTTOM_TRACK: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("hID", "U2"),
        ("pingsPEns", "U2"),
        ("delayReacq", "U2"),
        ("corrMagMin", "U1"),
        ("evalAmpMin", "U1"),
        ("pgMin", "U1"),
        ("mode", "U1"),
        ("errVelMax", "U2"),
        ("reserved", "U4"),
        ("range1", "U2"),
        ("range2", "U2"),
        ("range3", "U2"),
        ("range4", "U2"),
        ("vel1", "U2"),
        ("vel2", "U2"),
        ("vel3", "U2"),
        ("vel4", "U2"),
        ("corr1", "U1"),
        ("corr2", "U1"),
        ("corr3", "U1"),
        ("corr4", "U1"),
        ("evalAmp1", "U1"),
        ("evalAmp2", "U1"),
        ("evalAmp3", "U1"),
        ("evalAmp4", "U1"),
        ("pg1", "U1"),
        ("pg2", "U1"),
        ("pg3", "U1"),
        ("pg4", "U1"),
        ("rl1", "U2"),
        ("rl2", "U2"),
        ("rl3", "U2"),
        ("rlVel1", "U2"),
        ("rlVel2", "U2"),
        ("rlVel3", "U2"),
        ("rlVel4", "U2"),
        ("rlcm1", "U1"),
        ("rlcm2", "U1"),
        ("rlcm3", "U1"),
        ("rlcm4", "U1"),
        ("rlei1", "U1"),
        ("rlei2", "U1"),
        ("rlei3", "U1"),
        ("rlei4", "U1"),
        ("rlpg1", "U1"),
        ("rlpg2", "U1"),
        ("rlpg3", "U1"),
        ("rlpg4", "U1"),
        ("maxDepth", "U2"),
        ("rssiAmp1", "U1"),
        ("rssiAmp2", "U1"),
        ("rssiAmp3", "U1"),
        ("rssiAmp4", "U1"),
        ("gain", "U1"),
        ("rangeMSB1", "U1"),
        ("rangeMSB2", "U1"),
        ("rangeMSB3", "U1"),
        ("rangeMSB4", "U1"),
    ])
});

pub static NAVIGATION: LazyLock<Schema> = LazyLock::new(|| {
    compile(&[
        ("hID", "U2"),
        ("utcDay", "U1"),
        ("utcMonth", "U1"),
        ("utcYear", "U2"),
        ("utcTimeFF", "I4"),
        ("pcClockOffset", "I4"),
        ("firstLat", "U4"),
        ("firstLng", "U4"),
        ("utcTimeLF", "U4"),
        ("lastLat", "U4"),
        ("lastLng", "U4"),
        ("avgSpd", "I2"),
        ("avgTrackTrue", "U2"),
        ("avgTrackMag", "U2"),
        ("SMG", "U2"),
        ("DMG", "U2"),
        ("reserved1", "U2"),
        ("flags", "U2"),
        ("reserved2", "U2"),
        ("noEns", "U4"),
        ("ensYear", "U2"),
        ("ensDay", "U1"),
        ("ensMonth", "U1"),
        ("ensTime", "U4"),
        ("pitch", "I2"),
        ("roll", "I2"),
        ("hdt", "U2"),
        ("numSpeedAvg", "U2"),
        ("numTTAvg", "U2"),
        ("numMTAvg", "U2"),
        ("numHdtAvg", "U2"),
        ("numPRAvg", "U2"),
    ])
});

/// Transmit frequency from the low three bits of the system configuration.
#[must_use]
pub fn system_frequency(sys_cfg: u16) -> Option<&'static str> {
    match sys_cfg & 0b111 {
        0b000 => Some("75kHz"),
        0b001 => Some("150kHz"),
        0b010 => Some("300kHz"),
        0b011 => Some("600kHz"),
        0b100 => Some("1200kHz"),
        0b101 => Some("2400kHz"),
        // Undocumented; seen on Ocean Surveyor 38 kHz units.
        0b110 => Some("38kHz"),
        _ => None,
    }
}

/// Decoded system configuration word.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SystemConfig {
    pub frequency: Option<&'static str>,
    pub convex: bool,
    /// Sensor configuration number, 1 through 3.
    pub sensor_config: Option<u8>,
    pub transducer_attached: bool,
    pub up_facing: bool,
    pub beam_angle: &'static str,
    pub janus: Option<&'static str>,
}

impl SystemConfig {
    #[must_use]
    pub fn decode(word: u16) -> Self {
        let lo = word & 0xff;
        let hi = word >> 8;
        SystemConfig {
            frequency: system_frequency(word),
            convex: lo & 0b1000 != 0,
            sensor_config: match lo & 0b11_0000 {
                0b00_0000 => Some(1),
                0b01_0000 => Some(2),
                0b10_0000 => Some(3),
                _ => None,
            },
            transducer_attached: lo & 0b100_0000 != 0,
            up_facing: lo & 0b1000_0000 != 0,
            beam_angle: match hi & 0b11 {
                0b00 => "15E Beam Angle",
                0b01 => "20E Beam Angle",
                0b10 => "30E Beam Angle",
                _ => "Other Beam Angle",
            },
            janus: match hi & 0b1111_0000 {
                0b0100_0000 => Some("4-Beam JANUS Config"),
                0b0101_0000 => Some("5-Beam JANUS Config DEMOD"),
                0b1111_0000 => Some("5-Beam JANUS Config 2 DEMOD"),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Coordinates {
    Beam,
    Instrument,
    Ship,
    Earth,
}

impl Coordinates {
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Coordinates::Beam => "No transformation",
            Coordinates::Instrument => "Instrument coordinates",
            Coordinates::Ship => "Ship coordinates",
            Coordinates::Earth => "Earth coordinate",
        }
    }
}

/// Decoded coordinate transformation byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CoordTransform {
    pub coordinates: Coordinates,
    pub tilt: bool,
    pub three_beam: bool,
    pub bin_mapping: bool,
}

impl CoordTransform {
    #[must_use]
    pub fn decode(byte: u8) -> Self {
        let coordinates = match byte & 0b1_1000 {
            0b0_0000 => Coordinates::Beam,
            0b0_1000 => Coordinates::Instrument,
            0b1_0000 => Coordinates::Ship,
            _ => Coordinates::Earth,
        };
        CoordTransform {
            coordinates,
            tilt: byte & 0b100 != 0,
            three_beam: byte & 0b10 != 0,
            bin_mapping: byte & 0b1 != 0,
        }
    }
}

pub const SENSOR_SOURCE: &AnyTable = &[
    (0b0100_0000, "Calculates EC (Speed of sound) from ED, ES, ET"),
    (0b0010_0000, "Uses ED from depth sensor"),
    (0b0001_0000, "Uses EH from transducer heading sensor"),
    (0b0000_1000, "Uses EP from transducer pitch sensor"),
    (0b0000_0100, "Uses ER from transducer roll sensor"),
    (0b0000_0010, "Uses ES (Salinity) from transducer conductivity sensor"),
    (0b0000_0001, "Uses ET from transducer temperature sensor"),
];

/// High byte of the built in test result word.
pub const BIT_RESULT_HI: &AnyTable = &[
    (0b0001_0000, "DEMOD 1 Error"),
    (0b0000_1000, "DEMOD 0 Error"),
    (0b0000_0010, "Timing card Error"),
];

pub const ERROR_STATUS_1: &AnyTable = &[
    (0b0000_0001, "Bus error exception"),
    (0b0000_0010, "Address error exception"),
    (0b0000_0100, "Illegal Instruction exception"),
    (0b0000_1000, "Zero Divide exception"),
    (0b0001_0000, "Emulator exception"),
    (0b0010_0000, "Unassigned exception"),
    (0b0100_0000, "Watchdog restart occurred"),
    (0b1000_0000, "Battery saver power"),
];

pub const ERROR_STATUS_2: &AnyTable = &[
    (0b0000_0001, "Pinging"),
    (0b0100_0000, "Cold wakeup occurred"),
    (0b1000_0000, "Unknown wakeup occurred"),
];

pub const ERROR_STATUS_3: &AnyTable = &[
    (0b0000_0001, "Clock read error occurred"),
    (0b0000_0010, "Unexpected alarm"),
    (0b0000_0100, "Clock jump forward"),
    (0b0000_1000, "Clock jump backward"),
];

pub const ERROR_STATUS_4: &AnyTable = &[
    (0b0000_1000, "Power fail - unrecorded"),
    (0b0001_0000, "spurious level 4 intr - DSP"),
    (0b0010_0000, "spurious level 5 intr - UART"),
    (0b0100_0000, "spurious level 6 intr - CLOCK"),
    (0b1000_0000, "Level 7 interrupt occurred"),
];

#[must_use]
pub fn sensor_source(byte: u8) -> Vec<Matched> {
    decode_any_bit(SENSOR_SOURCE, byte.into())
}

#[must_use]
pub fn bit_result(word: u16) -> Vec<Matched> {
    decode_any_bit(BIT_RESULT_HI, (word >> 8).into())
}

/// Error status word, least significant byte first.
#[must_use]
pub fn error_status(dword: u32) -> Vec<Matched> {
    [ERROR_STATUS_1, ERROR_STATUS_2, ERROR_STATUS_3, ERROR_STATUS_4]
        .into_iter()
        .enumerate()
        .flat_map(|(i, table)| decode_any_bit(table, (dword >> (8 * i)) & 0xff))
        .collect()
}

const NAV_FLAGS: [(&str, &str); 11] = [
    ("Data updated", "Data not updated"),
    ("PSN Valid", "PSN Invalid"),
    ("Speed Valid", "Speed Invalid"),
    ("Mag Track Valid", "Mag Track Invalid"),
    ("True Track Valid", "True Track Invalid"),
    ("Date/Time Valid", "Date/Time Invalid"),
    ("SMG/DMG Valid", "SMG/DMG Invalid"),
    ("Pitch/Roll Valid", "Pitch/Roll Invalid"),
    ("Heading Valid", "Heading Invalid"),
    ("ADCP Time Valid", "ADCP Time Invalid"),
    ("Clock offset Time Valid", "Clock offset Time Invalid"),
];

/// Navigation flags split into what is and is not valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NavFlags {
    pub valid: Vec<&'static str>,
    pub invalid: Vec<&'static str>,
}

impl NavFlags {
    #[must_use]
    pub fn decode(word: u16) -> Self {
        let mut flags = NavFlags::default();
        for (bit, (set, unset)) in NAV_FLAGS.iter().enumerate() {
            if word & (1 << bit) != 0 {
                flags.valid.push(set);
            } else {
                flags.invalid.push(unset);
            }
        }
        flags
    }
}

/// Binary angular measurement of `bits` width to degrees.
#[must_use]
pub fn bam(value: f64, bits: u32) -> f64 {
    value * 180.0 / 2f64.powi(bits as i32 - 1)
}

/// Ensemble timestamp from the variable leader time fields.
#[must_use]
pub fn ensemble_time(fields: [u8; 7]) -> Option<DateTime<Utc>> {
    let [year, month, day, hour, minute, second, hundredths] = fields;
    time::from_two_digit_year(year, month, day, hour, minute, second, hundredths)
}

/// Horizontal current of one depth cell in earth coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EarthVelocity {
    pub east: i16,
    pub north: i16,
    pub up: i16,
    pub error: i16,
    /// mm/s, `None` when either horizontal component is invalid.
    pub magnitude: Option<f64>,
    /// Degrees clockwise from north, 0 to 360.
    pub direction: Option<f64>,
}

impl EarthVelocity {
    #[must_use]
    pub fn new(cell: [i16; 4]) -> Self {
        let [east, north, up, error] = cell;
        let (magnitude, direction) = if east == INVALID_VELOCITY || north == INVALID_VELOCITY {
            (None, None)
        } else {
            let (e, n) = (f64::from(east), f64::from(north));
            let d = n.atan2(e).to_degrees();
            (Some(e.hypot(n)), Some((450.0 - d) % 360.0))
        };
        EarthVelocity {
            east,
            north,
            up,
            error,
            magnitude,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::join;
    use test_case::test_case;

    #[test]
    fn layout_sizes() {
        assert_eq!(HEADER.size(), 6);
        assert_eq!(FIXED_LEADER.size(), 59);
        assert_eq!(VARIABLE_LEADER.size(), 59);
        assert_eq!(VELOCITY_CELL.size(), 8);
        assert_eq!(BEAM_CELL.size(), 4);
        assert_eq!(PERCENT_GOOD_CELL.size(), 4);
        assert_eq!(BOTTOM_TRACK.size(), 81);
        assert_eq!(NAVIGATION.size(), 78);
    }

    #[test]
    fn system_config_word() {
        // 38kHz, convex, sensor config 2, attached, down facing; 30 degree, 4 beam janus
        let cfg = SystemConfig::decode(0b0100_0010_0101_1110);
        assert_eq!(cfg.frequency, Some("38kHz"));
        assert!(cfg.convex);
        assert_eq!(cfg.sensor_config, Some(2));
        assert!(cfg.transducer_attached);
        assert!(!cfg.up_facing);
        assert_eq!(cfg.beam_angle, "30E Beam Angle");
        assert_eq!(cfg.janus, Some("4-Beam JANUS Config"));
        assert_eq!(SystemConfig::decode(0b111).frequency, None);
    }

    #[test_case(0b0000_0000, Coordinates::Beam)]
    #[test_case(0b0000_1111, Coordinates::Instrument)]
    #[test_case(0b0001_0000, Coordinates::Ship)]
    #[test_case(0b0001_1000, Coordinates::Earth)]
    fn coordinates(byte: u8, expected: Coordinates) {
        assert_eq!(CoordTransform::decode(byte).coordinates, expected);
    }

    #[test]
    fn error_status_reads_each_byte() {
        let got = error_status(0x8000_0141);
        assert_eq!(
            join(&got),
            "Bus error exception, Watchdog restart occurred, Pinging, Level 7 interrupt occurred"
        );
    }

    #[test]
    fn nav_flags_split() {
        let flags = NavFlags::decode(0b000_0000_0011);
        assert_eq!(flags.valid, vec!["Data updated", "PSN Valid"]);
        assert_eq!(flags.invalid.len(), 9);
        assert_eq!(flags.invalid[0], "Speed Invalid");
    }

    #[test]
    fn bam_scales_to_degrees() {
        assert_eq!(bam(f64::from(1u32 << 30), 32), 90.0);
        assert_eq!(bam(32768.0, 16), 180.0);
    }

    #[test]
    fn earth_velocity_direction() {
        let east = EarthVelocity::new([100, 0, 0, 0]);
        assert_eq!(east.magnitude, Some(100.0));
        assert_eq!(east.direction, Some(90.0));

        let north = EarthVelocity::new([0, 100, 0, 0]);
        assert_eq!(north.direction, Some(0.0));

        let bad = EarthVelocity::new([INVALID_VELOCITY, 5, 0, 0]);
        assert_eq!(bad.magnitude, None);
        assert_eq!(bad.direction, None);
    }

    #[test]
    fn bit_result_uses_high_byte() {
        assert_eq!(join(&bit_result(0x1200)), "DEMOD 1 Error, Timing card Error");
        assert!(bit_result(0x00ff).is_empty());
    }
}
