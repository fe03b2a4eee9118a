//! Runtime parameter (`0x52`) status and mode words.
//!
//! Most tables depend on the sonar model carried in the datagram header.
use crate::bits::{
    decode_any_bit, decode_by_model, decode_equal_bit, AnyTable, EqualTable, Matched, ModelTables,
    Table,
};
use crate::describe::Record;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::Serialize;

pub const PU_STATUS: &AnyTable = &[
    (0b0000_0001, "Communication error With BSP (or CBMF) : All models except ME70BO"),
    (0b0000_0010, "Communication error with Sonar Head or Transceiver : All models except EM 2040 and ME70BO, Communication error with slave PU : EM 2040/EM 2040C, Problem with communication with ME70 : ME70BO"),
    (0b0000_0100, "Attitude not valid for this ping : All models"),
    (0b0000_1000, "Heading not valid for this ping : All models"),
    (0b0001_0000, "System clock has not been set since power up : All models"),
    (0b0010_0000, "External trigger signal not detected : All models except ME70BO"),
    (0b0100_0000, "CPU temperature warning : All models except EM 1002, Hull Unit not responding : EM 1002"),
    (0b1000_0000, "Attitude velocity data not valid for this ping : EM 122 EM 302 EM 710 EM 2040 EM 2040C"),
];

/// EM 2000, EM 3000, EM 3002
pub const BSP_STATUS_A: &AnyTable = &[
    (0b0000_0001, "Error on R0 data received by BSP 1 (May be a bad high speed link) : EM 2000, EM 3000, EM 3000D, EM 3002, EM 3002D"),
    (0b0000_0010, "Too much seabed image data on BSP1 : EM 3000, EM 3000D"),
    (0b0000_0100, "Invalid command received by BSP1 : EM 3000, EM 3000D"),
    (0b0000_1000, "Errors on BSP1 : EM 3002, EM 3002D"),
    (0b0001_0000, "Error on R0 data received by BSP 2 (May be a bad high speed link) : EM 3000D, EM 3002D"),
    (0b0010_0000, "Too much seabed image data on BSP2 : EM 3000D"),
    (0b0100_0000, "Invalid command received by BSP2 : EM 3000D"),
    (0b1000_0000, "Errors on BSP2 : EM 3002, EM 3002D"),
];

/// EM 1002
pub const BSP_STATUS_B: &AnyTable = &[(0b0000_0001, "Sample number error in RX data received from SPRX")];

/// EM 120, EM 300
pub const BSP_STATUS_C: &AnyTable = &[
    (0b0000_0001, "Sample number error in R0 data received from SPRX"),
    (0b0000_0010, "Missing R0 header data from SPRX"),
    (0b0000_0100, "Missing sample data from SPTX"),
    (0b0000_1000, "Missing second R0 header data from SPTX"),
    (0b0001_0000, "Bad sync TRU - PU - BSP"),
    (0b0010_0000, "Bad parameters received from PU"),
    (0b0100_0000, "Internal sync problem in BSP"),
    (0b1000_0000, "Checksum error in header from SPTX"),
];

/// EM 122, EM 302, EM 710
pub const BSP_STATUS_D: &AnyTable = &[
    (0b0000_0001, "Error on RX data received by BSP 1"),
    (0b0000_0010, "Error on RX data received by BSP 3"),
    (0b0000_0100, "Errors on BSP 3"),
    (0b0000_1000, "Errors on BSP 1"),
    (0b0001_0000, "Error on RX data received by BSP 2"),
    (0b0010_0000, "Error on RX data received by BSP 4"),
    (0b0100_0000, "Errors on BSP 4"),
    (0b1000_0000, "Errors on BSP2"),
];

/// EM 2040, EM 2040C
pub const BSP_STATUS_E: &AnyTable = &[
    (0b0000_0001, "Error on data from BSP 1 - master PU"),
    (0b0000_0010, "Error on data from BSP 2 - master PU"),
    (0b0000_0100, "Error on data from BSP 3 - master PU"),
    (0b0000_1000, "Error on data from BSP 4 - master PU"),
    (0b0001_0000, "Error on data from BSP 1 - slave PU"),
    (0b0010_0000, "Error on data from BSP 2 - slave PU"),
    (0b0100_0000, "Error on data from BSP 3 - slave PU"),
    (0b1000_0000, "Error on data from BSP 4 - slave PU"),
];

pub const BSP_BY_MODEL: &ModelTables = &[
    (2000, &[Table::Any(BSP_STATUS_A)]),
    (3000, &[Table::Any(BSP_STATUS_A)]),
    (3002, &[Table::Any(BSP_STATUS_A)]),
    (1002, &[Table::Any(BSP_STATUS_B)]),
    (102, &[Table::Any(BSP_STATUS_C)]),
    (300, &[Table::Any(BSP_STATUS_C)]),
    (122, &[Table::Any(BSP_STATUS_D)]),
    (302, &[Table::Any(BSP_STATUS_D)]),
    (710, &[Table::Any(BSP_STATUS_D)]),
    (2040, &[Table::Any(BSP_STATUS_E)]),
];

/// EM 120, EM 300
pub const TRANSCEIVER_STATUS_A: &AnyTable = &[
    (0b0000_0001, "Transmit voltage (HV) out of range"),
    (0b0000_0010, "Low voltage power out of range"),
    (0b0000_0100, "Timeout error (SPRX waits for SPTX)"),
    (0b0000_1000, "Receive channel DC offset(s) out of range"),
    (0b0001_0000, "Illegal parameter received from PU"),
    (0b0010_0000, "Internal communication error (SPTX - SPRX sync)"),
    (0b0100_0000, "Timeout error (SPTX waits for SPRX)"),
    (0b1000_0000, "Defective fuse(s) in transmitter"),
];

/// EM 122, EM 302, EM 710
pub const TRANSCEIVER_STATUS_B: &AnyTable = &[
    (0b0000_0001, "Transmit voltage (HV) out of range"),
    (0b0000_0010, "Low voltage power out of range"),
    (0b0000_0100, "Error on Transmitter"),
    (0b0000_1000, "Error on Receiver"),
    (0b0001_0000, "Not implemented"),
    (0b0010_0000, "Not implemented"),
    (0b0100_0000, "Not implemented"),
    (0b1000_0000, "Not implemented"),
];

/// EM 1002
pub const TRANSCEIVER_STATUS_C: &AnyTable = &[
    (0b0000_0001, "Transmit voltage (HV) out of range"),
    (0b0000_0010, "Low voltage power out of range"),
    (0b0000_0100, "Transmit voltage (HV) to high"),
    (0b0000_1000, "Error in command from PU (Illegal parameter)"),
    (0b0001_0000, "Error in command from PU (Bad checksum)"),
    (0b0010_0000, "Error in command from PU (Bad datagram length)"),
];

/// EM 2040
pub const TRANSCEIVER_STATUS_D: &AnyTable = &[
    (0b0000_0001, "Transmit power (HV) out of range"),
    (0b0000_0010, "Communication error with TX"),
    (0b0000_0100, "Communication error with RX 1 (port)"),
    (0b0000_1000, "Communication error with RX 2 (starboard)"),
    (0b0001_0000, "Communication error with IO2040 - master PU"),
    (0b0010_0000, "Communication error with IO2040 - slave PU"),
    (0b0100_0000, "Spare"),
    (0b1000_0000, "Spare"),
];

/// EM 2000, EM 3000, EM 3002
pub const SONAR_HEAD_STATUS_A: &AnyTable = &[
    (0b0000_0001, "Temperature to high on Sonar Head 1 EM 2000, EM 3000, EM 3000D, EM 3002, EM 3002D"),
    (0b0000_0010, "Data link failure on Sonar Head 1 EM 2000, EM 3000, EM 3000D, EM 3002, EM 3002D"),
    (0b0000_0100, "DC Supply Voltages in Sonar Head 1 is out of range EM 2000, EM 3000, EM 3000D, EM 3002, EM 3002D"),
    (0b0000_1000, "Spare"),
    (0b0001_0000, "Temperature to high on Sonar Head 2 EM 3000D, EM 3002D"),
    (0b0010_0000, "Data link failure on Sonar Head 2 EM 3000D, EM 3002D"),
    (0b0100_0000, "DC Supply Voltages in Sonar Head 2 is out of range EM 3000D, EM 3002D"),
    (0b1000_0000, "Spare"),
];

/// EM 2040C
pub const SONAR_HEAD_STATUS_B: &AnyTable = &[
    (0b0000_0001, "Transmit power (HV) out of range SH1"),
    (0b0000_0010, "Communication error with TX SH1"),
    (0b0000_0100, "Communication error with RX SH1"),
    (0b0000_1000, "Temperature to high SH1"),
    (0b0001_0000, "Transmit power (HV) out of range SH2"),
    (0b0010_0000, "Communication error with TX SH2"),
    (0b0100_0000, "Communication error with RX SH2"),
    (0b1000_0000, "Temperature to high SH2"),
];

pub const SHT_BY_MODEL: &ModelTables = &[
    (102, &[Table::Any(TRANSCEIVER_STATUS_A)]),
    (300, &[Table::Any(TRANSCEIVER_STATUS_A)]),
    (122, &[Table::Any(TRANSCEIVER_STATUS_B)]),
    (302, &[Table::Any(TRANSCEIVER_STATUS_B)]),
    (710, &[Table::Any(TRANSCEIVER_STATUS_B)]),
    (1002, &[Table::Any(TRANSCEIVER_STATUS_C)]),
    (2000, &[Table::Any(SONAR_HEAD_STATUS_A)]),
    (3000, &[Table::Any(SONAR_HEAD_STATUS_A)]),
    (3002, &[Table::Any(SONAR_HEAD_STATUS_A)]),
    (2040, &[Table::Any(TRANSCEIVER_STATUS_D), Table::Any(SONAR_HEAD_STATUS_B)]),
];

/// EM 3000
pub const PING_MODE_A: &EqualTable = &[
    (0b1111, 0b0000, "Nearfield (4º)"),
    (0b1111, 0b0001, "Normal (1.5º)"),
    (0b1111, 0b0010, "Target detect"),
];

/// EM 3002
pub const PING_MODE_B: &EqualTable = &[
    (0b1111, 0b0000, "Wide Tx beamwidth (4°)"),
    (0b1111, 0b0001, "Normal Tx beamwidth (1.5°)"),
];

/// EM 2000, EM 710, EM 1002, EM 300, EM 302, EM 120, EM 122
pub const PING_MODE_C: &EqualTable = &[
    (0b1111, 0b0000, "Very Shallow"),
    (0b1111, 0b0001, "Shallow"),
    (0b1111, 0b0010, "Medium"),
    (0b1111, 0b0011, "Deep"),
    (0b1111, 0b0100, "Very deep"),
    (0b1111, 0b0101, "Extra deep"),
];

/// EM 2040
pub const PING_MODE_D: &EqualTable = &[
    (0b1111, 0b0000, "200 kHz"),
    (0b1111, 0b0001, "300 kHz"),
    (0b1111, 0b0010, "400 kHz"),
];

/// EM 2040, EM 710, EM 302, EM 122
pub const TX_PULSE_FORM_A: &EqualTable = &[
    (0b0011_0000, 0b0000_0000, "CW"),
    (0b0011_0000, 0b0001_0000, "Mixed"),
    (0b0011_0000, 0b0010_0000, "FM"),
];

/// EM 2040C, 180 kHz + 10 kHz per step.
pub const FREQUENCY: &EqualTable = &[
    (0b0001_1111, 0b0000_0000, "180 kHz"),
    (0b0001_1111, 0b0000_0001, "190 kHz"),
    (0b0001_1111, 0b0001_0110, "400 kHz"),
];

/// EM 2040C
pub const TX_PULSE_FORM_B: &EqualTable = &[
    (0b0010_0000, 0b0000_0000, "CW"),
    (0b0010_0000, 0b0010_0000, "FM"),
];

/// EM 2040, EM 710, EM 302, EM 122
pub const DUAL_SWATH_MODE: &EqualTable = &[
    (0b1100_0000, 0b0000_0000, "Dual swath = Off"),
    (0b1100_0000, 0b0100_0000, "Dual swath = Fixed"),
    (0b1100_0000, 0b1000_0000, "Dual swath = Dynamic"),
];

const SWATH_MODES: &[Table] = &[
    Table::Equal(PING_MODE_C),
    Table::Equal(TX_PULSE_FORM_A),
    Table::Equal(DUAL_SWATH_MODE),
];

pub const MODE_BY_MODEL: &ModelTables = &[
    (3000, &[Table::Equal(PING_MODE_A)]),
    (3002, &[Table::Equal(PING_MODE_B)]),
    (2000, &[Table::Equal(PING_MODE_C)]),
    (710, SWATH_MODES),
    (1002, &[Table::Equal(PING_MODE_C)]),
    (300, &[Table::Equal(PING_MODE_C)]),
    (302, SWATH_MODES),
    (120, &[Table::Equal(PING_MODE_C)]),
    (122, SWATH_MODES),
    (
        2040,
        &[
            Table::Equal(PING_MODE_D),
            Table::Equal(TX_PULSE_FORM_A),
            Table::Equal(FREQUENCY),
            Table::Equal(TX_PULSE_FORM_B),
            Table::Equal(DUAL_SWATH_MODE),
        ],
    ),
];

pub const FILTER_ID: &EqualTable = &[
    (0b0000_0011, 0b0000_0000, "Spike filter set to Off"),
    (0b0000_0011, 0b0000_0001, "Spike filter is set to Weak"),
    (0b0000_0011, 0b0000_0010, "Spike filter is set to Medium"),
    (0b0000_0011, 0b0000_0011, "Spike filter is set to Strong"),
    (0b0000_0100, 0b0000_0100, "Slope filter is on"),
    (0b0000_1000, 0b0000_1000, "Sector tracking or Robust Bottom Detection (EM 3000) is on"),
    (0b1001_0000, 0b0000_0000, "Range gates have Normal size"),
    (0b1001_0000, 0b0001_0000, "Range gates are Large"),
    (0b1001_0000, 0b1000_0000, "Range gates are Small"),
    (0b0010_0000, 0b0010_0000, "Aeration filter is on"),
    (0b0100_0000, 0b0100_0000, "Interference filter is on"),
];

pub const FILTER_ID2: &EqualTable = &[
    // penetration filter: EM 2040, EM 710, EM 302, EM 122
    (0b0000_0011, 0b0000_0000, "Penetration filter = Off"),
    (0b0000_0011, 0b0000_0001, "Penetration filter = Weak"),
    (0b0000_0011, 0b0000_0010, "Penetration filter = Medium"),
    (0b0000_0011, 0b0000_0011, "Penetration filter = Strong"),
    // detect mode: EM 3002, EM 2040
    (0b0000_1100, 0b0000_0000, "Detect mode: Normal"),
    (0b0000_1100, 0b0000_0100, "Detect mode: Waterway"),
    (0b0000_1100, 0b0000_1000, "Detect mode: Tracking"),
    (0b0000_1100, 0b0000_1100, "Detected mode: Minimum depth"),
    // phase ramp: EM 2040, EM 3002, EM 710, EM 302, EM 122
    (0b0011_0000, 0b0000_0000, "Short phase ramp"),
    (0b0011_0000, 0b0001_0000, "Normal phase ramp"),
    (0b0011_0000, 0b0010_0000, "Long phase ramp"),
    // special TVG: EM 3002, EM 2040
    (0b0100_0000, 0b0000_0000, "Normal TVG"),
    (0b0100_0000, 0b0100_0000, "Special TVG"),
    (0b1000_0000, 0b0000_0000, "Normal amp detect"),
    (0b1000_0000, 0b1000_0000, "Special amp detect or soft sediments (EM 3002)"),
];

pub const SOUND_SPEED_SOURCE: &EqualTable = &[
    (0b0000_0011, 0b0000_0000, "From real time sensor"),
    (0b0000_0011, 0b0000_0001, "Manually entered by operator"),
    (0b0000_0011, 0b0000_0010, "Interpolated from currently used sound speed profile"),
    (0b0000_0011, 0b0000_0011, "Calculated by ME70BO TRU"),
    (0b0001_0000, 0b0001_0000, "Extra detections enabled"),
    (0b0010_0000, 0b0010_0000, "Sonar mode enabled"),
    (0b0100_0000, 0b0100_0000, "Passive mode enabled"),
    (0b1000_0000, 0b1000_0000, "3D scanning enabled"),
];

/// Every model except EM 3002.
pub const BEAM_SPACING: &EqualTable = &[
    (0b0000_0011, 0b0000_0000, "Determined by beamwidth (FFT beamformer of EM 3000)"),
    (0b0000_0011, 0b0000_0001, "Equidistant (Inbetween for EM 122 and EM 302)"),
    (0b0000_0011, 0b0000_0010, "Equiangle"),
    (0b0000_0011, 0b0000_0011, "High density equidistant (In between for EM 2000, EM 120, EM 300, EM 1002)"),
];

pub const BEAM_SPACING_3002: &EqualTable = &[
    (0b1000_0000, 0b0000_0000, "Only one sonar head is connected. If two heads are connected, both have the same beam spacing."),
    (0b1000_0000, 0b1000_0000, "Two sonar heads are connected. Individual beam spacing is possible."),
    (0b0111_0000, 0b0000_0000, "No head 2"),
    (0b0111_0000, 0b0001_0000, "h2 equidistant"),
    (0b0111_0000, 0b0010_0000, "h2 equiangle"),
    (0b0111_0000, 0b0011_0000, "h2 high density"),
    (0b0000_1111, 0b0000_0001, "h1 equidistant"),
    (0b0000_1111, 0b0000_0010, "h1 equiangle"),
    (0b0000_1111, 0b0000_0011, "h1 high density"),
];

pub const YAW_PITCH_STABILISATION: &EqualTable = &[
    (0b0000_0011, 0b0000_0000, "No yaw stabilization"),
    (0b0000_0011, 0b0000_0001, "Yaw stabilization to survey line heading (Not used)"),
    (0b0000_0011, 0b0000_0010, "Yaw stabilization to mean vessel heading"),
    (0b0000_0011, 0b0000_0011, "Yaw stabilization to manually entered heading"),
    (0b0000_1100, 0b0000_0000, "Heading filter, hard"),
    (0b0000_1100, 0b0000_0100, "Heading filter, medium"),
    (0b0000_1100, 0b0000_1000, "Heading filter, weak"),
    (0b1000_0000, 0b1000_0000, "Pitch stabilization is on."),
];

/// EM 2040 and EM 2040C only; other models store the gain in dB.
pub const RX_FIXED_GAIN_2040: &EqualTable = &[
    (0b0000_0011, 0b0000_0000, "Off (RX inactive)"),
    (0b0000_0011, 0b0000_0001, "port active"),
    (0b0000_0011, 0b0000_0010, "starboard active"),
    (0b0000_0011, 0b0000_0011, "Both active"),
    (0b0000_1100, 0b0000_0000, "Short CW"),
    (0b0000_1100, 0b0000_0100, "Medium CW"),
    (0b0000_1100, 0b0000_1000, "Long CW"),
    (0b0000_1100, 0b0000_1100, "FM"),
    (0b0111_0000, 0b0000_0000, "Very Short CW"),
    (0b0111_0000, 0b0001_0000, "Short CW"),
    (0b0111_0000, 0b0010_0000, "Medium CW"),
    (0b0111_0000, 0b0011_0000, "Long CW"),
    (0b0111_0000, 0b0100_0000, "Very Long CW"),
    (0b0111_0000, 0b0101_0000, "Extra Long CW"),
    (0b0111_0000, 0b0110_0000, "Short FM"),
    (0b0111_0000, 0b0111_0000, "Long FM"),
];

#[must_use]
pub fn pu_status(v: u32) -> Vec<Matched> {
    decode_any_bit(PU_STATUS, v)
}

#[must_use]
pub fn bsp_status(v: u32, model: u16) -> Vec<Matched> {
    decode_by_model(BSP_BY_MODEL, model, v)
}

/// Sonar head or transceiver status.
#[must_use]
pub fn sht_status(v: u32, model: u16) -> Vec<Matched> {
    decode_by_model(SHT_BY_MODEL, model, v)
}

#[must_use]
pub fn mode(v: u32, model: u16) -> Vec<Matched> {
    decode_by_model(MODE_BY_MODEL, model, v)
}

#[must_use]
pub fn filter_id(v: u32) -> Vec<Matched> {
    decode_equal_bit(FILTER_ID, v)
}

#[must_use]
pub fn filter_id2(v: u32) -> Vec<Matched> {
    decode_equal_bit(FILTER_ID2, v)
}

#[must_use]
pub fn sound_speed_source(v: u32) -> Vec<Matched> {
    decode_equal_bit(SOUND_SPEED_SOURCE, v)
}

#[must_use]
pub fn beam_spacing(v: u32, model: u16) -> Vec<Matched> {
    if model == 3002 {
        decode_equal_bit(BEAM_SPACING_3002, v)
    } else {
        decode_equal_bit(BEAM_SPACING, v)
    }
}

#[must_use]
pub fn yaw_pitch_stabilisation(v: u32) -> Vec<Matched> {
    decode_equal_bit(YAW_PITCH_STABILISATION, v)
}

/// Receiver fixed gain. Only EM 2040 packs flags here; for every other
/// model the value is the gain in dB.
#[must_use]
pub fn rx_gain(v: u32, model: u16) -> Vec<Matched> {
    if model == 2040 {
        decode_equal_bit(RX_FIXED_GAIN_2040, v)
    } else {
        vec![Matched {
            mask: 0,
            expected: Some(0),
            text: format!("{v} dB").into(),
        }]
    }
}

/// Every decoded status and mode word of one runtime datagram.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RuntimeStatus {
    pub model: u16,
    pub pu_status: Vec<Matched>,
    pub bsp_status: Vec<Matched>,
    pub sht_status: Vec<Matched>,
    pub mode: Vec<Matched>,
    pub filter_id: Vec<Matched>,
    pub filter_id2: Vec<Matched>,
    pub sound_speed_source: Vec<Matched>,
    pub beam_spacing: Vec<Matched>,
    pub yaw_pitch_stabilisation: Vec<Matched>,
    pub rx_gain: Vec<Matched>,
}

impl RuntimeStatus {
    /// Decode from a described runtime datagram.
    ///
    /// # Errors
    /// [Error::UnknownField] if `record` is not a runtime datagram.
    pub fn from_record(record: &Record) -> Result<Self> {
        let get = |name: &str| -> Result<u32> {
            record
                .u64(name)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Error::UnknownField(name.to_string()))
        };
        let model = record
            .u64("model")
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| Error::UnknownField("model".to_string()))?;

        Ok(RuntimeStatus {
            model,
            pu_status: pu_status(get("PUStatus")?),
            bsp_status: bsp_status(get("BSPStatus")?, model),
            sht_status: sht_status(get("SHTStatus")?, model),
            mode: mode(get("mode")?, model),
            filter_id: filter_id(get("filterID")?),
            filter_id2: filter_id2(get("filterID2")?),
            sound_speed_source: sound_speed_source(get("srcSS")?),
            beam_spacing: beam_spacing(get("beamSpacing")?, model),
            yaw_pitch_stabilisation: yaw_pitch_stabilisation(get("yawPitchStable")?),
            rx_gain: rx_gain(get("rxGain")?, model),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::join;
    use test_case::test_case;

    #[test_case(2000, "Errors on BSP1 : EM 3002, EM 3002D"; "table a")]
    #[test_case(1002, ""; "table b has no bit 3")]
    #[test_case(102, "Missing second R0 header data from SPTX"; "table c")]
    #[test_case(710, "Errors on BSP 1"; "table d")]
    #[test_case(2040, "Error on data from BSP 4 - master PU"; "table e")]
    #[test_case(9999, "No model found for 9999"; "unknown")]
    fn bsp_by_model(model: u16, expected: &str) {
        assert_eq!(join(&bsp_status(0b1000, model)), expected);
    }

    #[test]
    fn sht_2040_uses_both_tables() {
        let got = sht_status(0b0000_0001, 2040);
        assert_eq!(
            join(&got),
            "Transmit power (HV) out of range, Transmit power (HV) out of range SH1"
        );
    }

    #[test]
    fn mode_710_decodes_three_fields() {
        // deep, FM, dual swath dynamic
        let got = mode(0b1010_0011, 710);
        assert_eq!(join(&got), "Deep, FM, Dual swath = Dynamic");
    }

    #[test]
    fn rx_gain_is_db_except_2040() {
        assert_eq!(join(&rx_gain(20, 710)), "20 dB");
        assert_eq!(join(&rx_gain(0b0001_0101, 2040)), "port active, Medium CW, Short CW");
    }

    #[test]
    fn beam_spacing_3002_is_special() {
        assert_eq!(join(&beam_spacing(0b10, 302)), "Equiangle");
        assert_eq!(
            join(&beam_spacing(0b1001_0010, 3002)),
            "Two sonar heads are connected. Individual beam spacing is possible., h2 equidistant, h1 equiangle"
        );
    }
}
