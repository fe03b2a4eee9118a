//! Trace sample formats.
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::schema::{FieldType, Value};
use crate::{bytes, Result};

/// Data sample format code of the binary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SampleFormat {
    IbmF4,
    I4,
    I2,
    /// Obsolete; read as the raw 4 byte word.
    FixedGain4,
    F4,
    F8,
    I3,
    I1,
    I8,
    U4,
    U2,
    U8,
    U3,
    U1,
}

impl SampleFormat {
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        use SampleFormat::*;
        Some(match code {
            1 => IbmF4,
            2 => I4,
            3 => I2,
            4 => FixedGain4,
            5 => F4,
            6 => F8,
            7 => I3,
            8 => I1,
            9 => I8,
            10 => U4,
            11 => U2,
            12 => U8,
            15 => U3,
            16 => U1,
            _ => return None,
        })
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        use SampleFormat::*;
        match self {
            IbmF4 => "4-byte IBM floating-point",
            I4 => "4-byte, two's complement integer",
            I2 => "2-byte, two's complement integer",
            FixedGain4 => "4-byte fixed-point with gain (obsolete)",
            F4 => "4-byte IEEE floating-point",
            F8 => "8-byte IEEE floating-point",
            I3 => "3-byte two's complement integer",
            I1 => "1-byte, two's complement integer",
            I8 => "8-byte, two's complement integer",
            U4 => "4-byte, unsigned integer",
            U2 => "2-byte, unsigned integer",
            U8 => "8-byte, unsigned integer",
            U3 => "3-byte, unsigned integer",
            U1 => "1-byte, unsigned integer",
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        use SampleFormat::*;
        match self {
            I1 | U1 => 1,
            I2 | U2 => 2,
            I3 | U3 => 3,
            IbmF4 | I4 | FixedGain4 | F4 | U4 => 4,
            F8 | I8 | U8 => 8,
        }
    }

    /// The field type a sample is reported as. 3 byte integers are reported
    /// with their 4 byte counterpart.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        use SampleFormat::*;
        match self {
            IbmF4 | F4 => FieldType::F4,
            F8 => FieldType::F8,
            I1 => FieldType::I1,
            I2 => FieldType::I2,
            I3 | I4 | FixedGain4 => FieldType::I4,
            I8 => FieldType::I8,
            U1 => FieldType::U1,
            U2 => FieldType::U2,
            U3 | U4 => FieldType::U4,
            U8 => FieldType::U8,
        }
    }

    /// Decode one sample at `at`.
    ///
    /// # Errors
    /// [crate::Error::NotEnoughData] if the sample does not fit.
    pub fn decode(&self, buf: &[u8], at: usize, le: bool) -> Result<Value> {
        match self {
            SampleFormat::IbmF4 => Ok(Value::F(ibm_to_f64(bytes::u32_at(buf, at, le)?))),
            SampleFormat::I3 | SampleFormat::U3 => {
                let b = bytes::take::<3>(buf, at)?;
                let [hi, mid, lo] = if le { [b[2], b[1], b[0]] } else { b };
                let raw = u32::from_be_bytes([0, hi, mid, lo]);
                if *self == SampleFormat::I3 {
                    // sign extend from bit 23
                    Ok(Value::I(i64::from(((raw << 8) as i32) >> 8)))
                } else {
                    Ok(Value::U(u64::from(raw)))
                }
            }
            other => other.field_type().decode(buf, at, le),
        }
    }
}

/// IBM System/360 single precision: sign bit, 7 bit base 16 exponent biased
/// by 64, 24 bit fraction.
#[must_use]
pub fn ibm_to_f64(word: u32) -> f64 {
    let fraction = f64::from(word & 0x00ff_ffff) / f64::from(1u32 << 24);
    if fraction == 0.0 {
        return 0.0;
    }
    let exponent = ((word >> 24) & 0x7f) as i32 - 64;
    let value = fraction * 16f64.powi(exponent);
    if word & 0x8000_0000 != 0 {
        -value
    } else {
        value
    }
}
