//! The 3200 byte textual file header.
#[cfg(feature = "serde")]
use serde::Serialize;

/// Size of the textual header and of every extended textual header.
pub const TEXT_HEADER_LEN: usize = 3200;
/// Characters per card image line.
pub const CARD_LEN: usize = 80;

/// EBCDIC to ASCII. Codes without an ASCII counterpart become a space.
#[rustfmt::skip]
const EBCDIC: [u8; 256] = [
    0x20, 0x01, 0x02, 0x03, 0x20, 0x09, 0x20, 0x7f, 0x20, 0x20, 0x20, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    0x10, 0x11, 0x12, 0x13, 0x20, 0x20, 0x08, 0x20, 0x18, 0x19, 0x20, 0x20, 0x1c, 0x1d, 0x1e, 0x1f,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x0a, 0x17, 0x1b, 0x20, 0x20, 0x20, 0x20, 0x20, 0x05, 0x06, 0x07,
    0x20, 0x20, 0x16, 0x20, 0x20, 0x20, 0x20, 0x04, 0x20, 0x20, 0x20, 0x20, 0x14, 0x15, 0x20, 0x20,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x5b, 0x2e, 0x3c, 0x28, 0x2b, 0x21,
    0x26, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x5d, 0x24, 0x2a, 0x29, 0x3b, 0x5e,
    0x2d, 0x2f, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x7c, 0x2c, 0x25, 0x5f, 0x3e, 0x3f,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x60, 0x3a, 0x23, 0x40, 0x27, 0x3d, 0x22,
    0x20, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20, 0x6a, 0x6b, 0x6c, 0x6d, 0x6e, 0x6f, 0x70, 0x71, 0x72, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20, 0x7e, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x7b, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x7d, 0x4a, 0x4b, 0x4c, 0x4d, 0x4e, 0x4f, 0x50, 0x51, 0x52, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x5c, 0x20, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
];

#[must_use]
pub fn ebcdic_to_ascii(b: u8) -> u8 {
    EBCDIC[usize::from(b)]
}

/// Character set of a textual header, judged by its first byte which is
/// always the `C` of the first card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Encoding {
    Ascii,
    Ebcdic,
}

impl Encoding {
    #[must_use]
    pub fn detect(first: u8) -> Option<Self> {
        match first {
            0x43 => Some(Encoding::Ascii),
            0xc3 => Some(Encoding::Ebcdic),
            _ => None,
        }
    }
}

/// A decoded textual header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TextHeader {
    pub encoding: Encoding,
    pub text: String,
}

impl TextHeader {
    /// Decode a textual header. `None` when the encoding cannot be told.
    #[must_use]
    pub fn decode(raw: &[u8]) -> Option<Self> {
        let encoding = Encoding::detect(*raw.first()?)?;
        let text = match encoding {
            Encoding::Ascii => raw.iter().map(|&b| char::from(b)).collect(),
            Encoding::Ebcdic => raw.iter().map(|&b| char::from(ebcdic_to_ascii(b))).collect(),
        };
        Some(TextHeader { encoding, text })
    }

    /// Full 80 character card lines; a trailing partial line is dropped.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let chars: Vec<char> = self.text.chars().collect();
        chars
            .chunks_exact(CARD_LEN)
            .map(|card| card.iter().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ebcdic_card() {
        // "C 1 CLIENT" in EBCDIC, padded to a full card
        let mut raw = vec![0xc3, 0x40, 0xf1, 0x40, 0xc3, 0xd3, 0xc9, 0xc5, 0xd5, 0xe3];
        raw.resize(CARD_LEN * 2, 0x40);
        let header = TextHeader::decode(&raw).unwrap();
        assert_eq!(header.encoding, Encoding::Ebcdic);
        let lines = header.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("C 1 CLIENT"));
        assert_eq!(lines[1].trim(), "");
    }

    #[test]
    fn ascii_card_and_unknown() {
        let mut raw = b"C 1 ascii header".to_vec();
        raw.resize(CARD_LEN + 10, b' ');
        let header = TextHeader::decode(&raw).unwrap();
        assert_eq!(header.encoding, Encoding::Ascii);
        assert_eq!(header.lines().len(), 1, "partial card dropped");

        assert!(TextHeader::decode(b"x").is_none());
        assert!(TextHeader::decode(&[]).is_none());
    }

    #[test]
    fn ebcdic_zero_is_space() {
        assert_eq!(ebcdic_to_ascii(0x00), b' ');
        assert_eq!(ebcdic_to_ascii(0x81), b'a');
        assert_eq!(ebcdic_to_ascii(0xe9), b'Z');
        assert_eq!(ebcdic_to_ascii(0x7c), b'@');
    }
}
