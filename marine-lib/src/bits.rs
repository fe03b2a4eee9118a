//! Status and mode word decoding through static bit tables.
//!
//! Two kinds of table exist. An *any* table lists `(mask, text)` pairs and
//! an entry matches when any of its bits is set. An *equal* table lists
//! `(mask, expected, text)` triples and an entry matches when the masked
//! value is exactly `expected`, which is how multi bit enums packed in a
//! status byte are described.
//!
//! ```
//! use marine::bits::{decode_any_bit, decode_equal_bit, join};
//!
//! let any = decode_any_bit(&[(0b01, "a"), (0b10, "b")], 0b11);
//! assert_eq!(join(&any), "a, b");
//!
//! let eq = decode_equal_bit(&[(0b11, 0b01, "x"), (0b11, 0b10, "y")], 0b01);
//! assert_eq!(join(&eq), "x");
//! ```
use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::Serialize;

pub type AnyTable = [(u32, &'static str)];
pub type EqualTable = [(u32, u32, &'static str)];

/// A bit table of either kind.
#[derive(Debug, Clone, Copy)]
pub enum Table {
    Any(&'static AnyTable),
    Equal(&'static EqualTable),
}

impl Table {
    #[must_use]
    pub fn decode(&self, value: u32) -> Vec<Matched> {
        match self {
            Table::Any(t) => decode_any_bit(t, value),
            Table::Equal(t) => decode_equal_bit(t, value),
        }
    }
}

/// Model number to the tables that apply to one status field.
pub type ModelTables = [(u16, &'static [Table])];

/// A table entry that matched a value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Matched {
    pub mask: u32,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub expected: Option<u32>,
    pub text: Cow<'static, str>,
}

/// Entries of `table` sharing at least one set bit with `value`, in table
/// order.
#[must_use]
pub fn decode_any_bit(table: &'static AnyTable, value: u32) -> Vec<Matched> {
    table
        .iter()
        .filter(|(mask, _)| mask & value != 0)
        .map(|&(mask, text)| Matched {
            mask,
            expected: None,
            text: Cow::Borrowed(text),
        })
        .collect()
}

/// Entries of `table` whose masked bits of `value` equal the expected bits,
/// in table order.
#[must_use]
pub fn decode_equal_bit(table: &'static EqualTable, value: u32) -> Vec<Matched> {
    table
        .iter()
        .filter(|(mask, expected, _)| mask & value == *expected)
        .map(|&(mask, expected, text)| Matched {
            mask,
            expected: Some(expected),
            text: Cow::Borrowed(text),
        })
        .collect()
}

/// Decode `value` with every table registered for `model`.
///
/// A model without tables yields a single pseudo entry naming the model
/// rather than an error, so one unknown model does not hide the rest of a
/// record.
#[must_use]
pub fn decode_by_model(tables: &'static ModelTables, model: u16, value: u32) -> Vec<Matched> {
    match tables.iter().find(|(m, _)| *m == model) {
        Some((_, found)) => found.iter().flat_map(|t| t.decode(value)).collect(),
        None => vec![Matched {
            mask: value,
            expected: None,
            text: Cow::Owned(format!("No model found for {model}")),
        }],
    }
}

/// Comma separated texts of the matched entries.
#[must_use]
pub fn join(matched: &[Matched]) -> String {
    matched
        .iter()
        .map(|m| m.text.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    static ANY: &AnyTable = &[(0b0001, "a"), (0b0010, "b"), (0b0110, "c")];
    static EQUAL: &EqualTable = &[(0b11, 0b01, "x"), (0b11, 0b10, "y"), (0b100, 0, "z")];
    static MODELS: &ModelTables = &[(1, &[Table::Any(ANY)]), (2, &[Table::Any(ANY), Table::Equal(EQUAL)])];

    #[test]
    fn any_bit_overlap() {
        assert_eq!(join(&decode_any_bit(ANY, 0b0011)), "a, b, c");
        assert_eq!(join(&decode_any_bit(ANY, 0b0100)), "c");
        assert!(decode_any_bit(ANY, 0).is_empty());
    }

    #[test]
    fn equal_bit_exact() {
        let got = decode_equal_bit(EQUAL, 0b01);
        assert_eq!(join(&got), "x, z");
        assert_eq!(got[0].expected, Some(0b01));
        assert_eq!(join(&decode_equal_bit(EQUAL, 0b111)), "");
    }

    #[test]
    fn model_lookup_concatenates_tables() {
        assert_eq!(join(&decode_by_model(MODELS, 1, 0b1)), "a");
        assert_eq!(join(&decode_by_model(MODELS, 2, 0b1)), "a, x, z");
    }

    #[test]
    fn unknown_model_is_pseudo_entry() {
        let got = decode_by_model(MODELS, 9999, 0x42);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].mask, 0x42);
        assert_eq!(got[0].text, "No model found for 9999");
    }
}
