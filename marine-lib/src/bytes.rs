//! Primitive reads at absolute offsets of a borrowed buffer.
//!
//! Every read is bounds checked and takes the byte order explicitly; nothing
//! here keeps state between calls.
use crate::{Error, Result};

/// Borrow `N` bytes starting at `at`.
///
/// # Errors
/// [Error::NotEnoughData] if `at + N` is past the end of `buf`.
pub fn take<const N: usize>(buf: &[u8], at: usize) -> Result<[u8; N]> {
    let end = at.saturating_add(N);
    buf.get(at..end)
        .and_then(|b| <[u8; N]>::try_from(b).ok())
        .ok_or(Error::NotEnoughData {
            actual: buf.len(),
            minimum: end,
        })
}

/// Borrow `len` bytes starting at `at`.
///
/// # Errors
/// [Error::NotEnoughData] if the range is past the end of `buf`.
pub fn slice(buf: &[u8], at: usize, len: usize) -> Result<&[u8]> {
    let end = at.saturating_add(len);
    buf.get(at..end).ok_or(Error::NotEnoughData {
        actual: buf.len(),
        minimum: end,
    })
}

macro_rules! reader {
    ($name:ident, $t:ty) => {
        #[doc = concat!("Read a `", stringify!($t), "` at `at` in the requested byte order.")]
        ///
        /// # Errors
        /// [Error::NotEnoughData] if the value does not fit in `buf`.
        pub fn $name(buf: &[u8], at: usize, le: bool) -> Result<$t> {
            let b = take::<{ std::mem::size_of::<$t>() }>(buf, at)?;
            Ok(if le {
                <$t>::from_le_bytes(b)
            } else {
                <$t>::from_be_bytes(b)
            })
        }
    };
}

reader!(u16_at, u16);
reader!(u32_at, u32);
reader!(u64_at, u64);
reader!(i16_at, i16);
reader!(i32_at, i32);
reader!(i64_at, i64);
reader!(f32_at, f32);
reader!(f64_at, f64);

/// Read a single byte.
///
/// # Errors
/// [Error::NotEnoughData] if `at` is past the end of `buf`.
pub fn u8_at(buf: &[u8], at: usize) -> Result<u8> {
    Ok(take::<1>(buf, at)?[0])
}

/// Read a single signed byte.
///
/// # Errors
/// [Error::NotEnoughData] if `at` is past the end of `buf`.
pub fn i8_at(buf: &[u8], at: usize) -> Result<i8> {
    Ok(i8::from_ne_bytes(take::<1>(buf, at)?))
}

/// Map every byte to the char with the same code point.
///
/// Zero bytes are kept, so the result always has exactly `bytes.len()` chars.
#[must_use]
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_orders() {
        let dat: &[u8] = &[0x01, 0x02, 0x03, 0x04];
        assert_eq!(u16_at(dat, 0, true).unwrap(), 0x0201);
        assert_eq!(u16_at(dat, 0, false).unwrap(), 0x0102);
        assert_eq!(u32_at(dat, 0, true).unwrap(), 0x0403_0201);
        assert_eq!(u32_at(dat, 0, false).unwrap(), 0x0102_0304);
    }

    #[test]
    fn read_past_end() {
        let dat: &[u8] = &[0x01, 0x02, 0x03];
        let err = u32_at(dat, 0, true).unwrap_err();
        assert_eq!(
            err,
            Error::NotEnoughData {
                actual: 3,
                minimum: 4
            }
        );
        assert!(u8_at(dat, usize::MAX).is_err(), "offset overflow must not panic");
    }

    #[test]
    fn latin1_keeps_zero_bytes() {
        let s = latin1(&[b'A', 0, 0xE9, b'Z']);
        assert_eq!(s.chars().count(), 4);
        assert_eq!(s, "A\0\u{e9}Z");
    }
}
