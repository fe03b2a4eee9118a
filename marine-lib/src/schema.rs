//! Schema compilation and field access.
//!
//! A [Schema] is built once from an ordered list of `(name, tag)` pairs. Each
//! field's byte offset is fixed at compile time, so reading a field from a
//! buffer is a single bounds checked primitive read at `base + offset`.
//!
//! Supported tags are `U1 U2 U4 U8 I1 I2 I4 I8 F4 F8` and `A<n>` for `n` bytes
//! of text.
//!
//! # Example
//! ```
//! use marine::schema::{Schema, Value};
//!
//! let schema = Schema::compile(&[("id", "U2"), ("name", "A4"), ("depth", "F4")]).unwrap();
//! assert_eq!(schema.size(), 10);
//!
//! let dat: &[u8] = &[0x01, 0x00, b'a', b'b', 0, b'd', 0x00, 0x00, 0x80, 0x3f];
//! assert_eq!(schema.read(dat, 0, "id", true).unwrap(), Value::U(1));
//! assert_eq!(schema.read(dat, 0, "name", true).unwrap(), Value::Text("ab\0d".into()));
//! assert_eq!(schema.read(dat, 0, "depth", true).unwrap(), Value::F(1.0));
//! ```
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bytes;
use crate::describe::{Described, Record};
use crate::{Error, Result};

/// Primitive wire type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    U1,
    U2,
    U4,
    U8,
    I1,
    I2,
    I4,
    I8,
    F4,
    F8,
    /// Fixed length text of `n` bytes, one char per byte.
    Ascii(usize),
}

impl FieldType {
    /// Every fixed width primitive, in tag order.
    pub const PRIMITIVES: [FieldType; 10] = [
        FieldType::U1,
        FieldType::U2,
        FieldType::U4,
        FieldType::U8,
        FieldType::I1,
        FieldType::I2,
        FieldType::I4,
        FieldType::I8,
        FieldType::F4,
        FieldType::F8,
    ];

    /// Number of bytes a value of this type occupies.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            FieldType::U1 | FieldType::I1 => 1,
            FieldType::U2 | FieldType::I2 => 2,
            FieldType::U4 | FieldType::I4 | FieldType::F4 => 4,
            FieldType::U8 | FieldType::I8 | FieldType::F8 => 8,
            FieldType::Ascii(n) => *n,
        }
    }

    /// Decode a value of this type at absolute offset `at`.
    ///
    /// `le` is ignored for [FieldType::Ascii] and single byte types.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the value does not fit in `buf`.
    pub fn decode(&self, buf: &[u8], at: usize, le: bool) -> Result<Value> {
        Ok(match self {
            FieldType::U1 => Value::U(bytes::u8_at(buf, at)?.into()),
            FieldType::U2 => Value::U(bytes::u16_at(buf, at, le)?.into()),
            FieldType::U4 => Value::U(bytes::u32_at(buf, at, le)?.into()),
            FieldType::U8 => Value::U(bytes::u64_at(buf, at, le)?),
            FieldType::I1 => Value::I(bytes::i8_at(buf, at)?.into()),
            FieldType::I2 => Value::I(bytes::i16_at(buf, at, le)?.into()),
            FieldType::I4 => Value::I(bytes::i32_at(buf, at, le)?.into()),
            FieldType::I8 => Value::I(bytes::i64_at(buf, at, le)?),
            FieldType::F4 => Value::F(bytes::f32_at(buf, at, le)?.into()),
            FieldType::F8 => Value::F(bytes::f64_at(buf, at, le)?),
            FieldType::Ascii(n) => Value::Text(bytes::latin1(bytes::slice(buf, at, *n)?)),
        })
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTypeTag {
            field: String::new(),
            tag: s.to_string(),
        };
        let typ = match s {
            "U1" => FieldType::U1,
            "U2" => FieldType::U2,
            "U4" => FieldType::U4,
            "U8" => FieldType::U8,
            "I1" => FieldType::I1,
            "I2" => FieldType::I2,
            "I4" => FieldType::I4,
            "I8" => FieldType::I8,
            "F4" => FieldType::F4,
            "F8" => FieldType::F8,
            _ => {
                let digits = s.strip_prefix('A').ok_or_else(invalid)?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                FieldType::Ascii(digits.parse().map_err(|_| invalid())?)
            }
        };
        Ok(typ)
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::U1 => write!(f, "U1"),
            FieldType::U2 => write!(f, "U2"),
            FieldType::U4 => write!(f, "U4"),
            FieldType::U8 => write!(f, "U8"),
            FieldType::I1 => write!(f, "I1"),
            FieldType::I2 => write!(f, "I2"),
            FieldType::I4 => write!(f, "I4"),
            FieldType::I8 => write!(f, "I8"),
            FieldType::F4 => write!(f, "F4"),
            FieldType::F8 => write!(f, "F8"),
            FieldType::Ascii(n) => write!(f, "A{n}"),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for FieldType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A decoded field value.
///
/// 8 byte integers keep their full range.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Value {
    U(u64),
    I(i64),
    F(f64),
    Text(String),
}

impl Value {
    /// Integer view of the value; `None` for text, floats and negative integers.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U(v) => Some(*v),
            Value::I(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::U(v) => i64::try_from(*v).ok(),
            Value::I(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value. Large 64-bit integers lose precision here.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::U(v) => Some(*v as f64),
            Value::I(v) => Some(*v as f64),
            Value::F(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::U(v) => write!(f, "{v}"),
            Value::I(v) => write!(f, "{v}"),
            Value::F(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// A compiled schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub typ: FieldType,
    /// Byte offset relative to the start of the record.
    pub offset: usize,
}

impl Field {
    /// Decode this field from a record starting at `base`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the field does not fit in `buf`.
    pub fn read(&self, buf: &[u8], base: usize, le: bool) -> Result<Value> {
        self.typ.decode(buf, base.saturating_add(self.offset), le)
    }
}

/// An immutable, compiled record layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    size: usize,
}

impl Schema {
    /// Compile an ordered `(name, tag)` list.
    ///
    /// # Errors
    /// [Error::InvalidTypeTag] for the first malformed tag, or
    /// [Error::DuplicateField] if a name repeats. No partially compiled schema
    /// is ever returned.
    pub fn compile(spec: &[(&str, &str)]) -> Result<Self> {
        let mut fields = Vec::with_capacity(spec.len());
        let mut index = HashMap::with_capacity(spec.len());
        let mut offset = 0;

        for (name, tag) in spec {
            let typ = tag.parse::<FieldType>().map_err(|_| Error::InvalidTypeTag {
                field: (*name).to_string(),
                tag: (*tag).to_string(),
            })?;
            if index.insert((*name).to_string(), fields.len()).is_some() {
                return Err(Error::DuplicateField((*name).to_string()));
            }
            fields.push(Field {
                name: (*name).to_string(),
                typ,
                offset,
            });
            offset += typ.width();
        }

        Ok(Schema {
            fields,
            index,
            size: offset,
        })
    }

    /// Total record size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|f| f.offset)
    }

    /// Read a single named field of the record at `base`.
    ///
    /// # Errors
    /// [Error::UnknownField] if `name` is not in the schema, or
    /// [Error::NotEnoughData] if the field does not fit in `buf`.
    pub fn read(&self, buf: &[u8], base: usize, name: &str, le: bool) -> Result<Value> {
        self.field(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))?
            .read(buf, base, le)
    }

    /// Read an integer field, accepting either signedness when non-negative.
    ///
    /// # Errors
    /// See [Schema::read]; also [Error::UnknownField] if the field is not an
    /// unsigned-representable integer.
    pub fn read_u64(&self, buf: &[u8], base: usize, name: &str, le: bool) -> Result<u64> {
        self.read(buf, base, name, le)?
            .as_u64()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Read a signed integer field.
    ///
    /// # Errors
    /// See [Schema::read_u64].
    pub fn read_i64(&self, buf: &[u8], base: usize, name: &str, le: bool) -> Result<i64> {
        self.read(buf, base, name, le)?
            .as_i64()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Read any numeric field as `f64`.
    ///
    /// # Errors
    /// See [Schema::read_u64].
    pub fn read_f64(&self, buf: &[u8], base: usize, name: &str, le: bool) -> Result<f64> {
        self.read(buf, base, name, le)?
            .as_f64()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Read only the named fields.
    ///
    /// # Errors
    /// The first error from [Schema::read].
    pub fn read_fields(
        &self,
        buf: &[u8],
        base: usize,
        names: &[&str],
        le: bool,
    ) -> Result<HashMap<String, Value>> {
        names
            .iter()
            .map(|name| Ok(((*name).to_string(), self.read(buf, base, name, le)?)))
            .collect()
    }

    /// Describe every field of the record at `base`, in declaration order.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the record does not fit in `buf`.
    pub fn describe(&self, buf: &[u8], base: usize, le: bool) -> Result<Record> {
        let mut record = Record::with_capacity(self.fields.len());
        self.describe_into(buf, base, le, "", &mut record)?;
        Ok(record)
    }

    /// Append every field of the record at `base` to `record`, prefixing each
    /// name with `prefix`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the record does not fit in `buf`; `record` is
    /// left untouched in that case.
    pub fn describe_into(
        &self,
        buf: &[u8],
        base: usize,
        le: bool,
        prefix: &str,
        record: &mut Record,
    ) -> Result<()> {
        bytes::slice(buf, base, self.size)?;
        for field in &self.fields {
            let value = field.read(buf, base, le)?;
            record.insert(
                format!("{prefix}{}", field.name),
                Described {
                    value,
                    typ: field.typ,
                    size: field.typ.width(),
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("U1", 1)]
    #[test_case("U2", 2)]
    #[test_case("U4", 4)]
    #[test_case("U8", 8)]
    #[test_case("I1", 1)]
    #[test_case("I2", 2)]
    #[test_case("I4", 4)]
    #[test_case("I8", 8)]
    #[test_case("F4", 4)]
    #[test_case("F8", 8)]
    #[test_case("A0", 0)]
    #[test_case("A16", 16)]
    fn tag_width(tag: &str, width: usize) {
        let typ: FieldType = tag.parse().unwrap();
        assert_eq!(typ.width(), width);
        assert_eq!(typ.to_string(), tag);
    }

    #[test_case("A"; "ascii without width")]
    #[test_case("Ax"; "ascii with letters")]
    #[test_case("A-1"; "ascii negative")]
    #[test_case("U3"; "unknown width")]
    #[test_case("u1"; "lower case")]
    #[test_case(""; "empty")]
    fn bad_tag(tag: &str) {
        assert!(tag.parse::<FieldType>().is_err());
    }

    #[test]
    fn primitive_widths_match_decoders() {
        let dat = [0u8; 8];
        for typ in FieldType::PRIMITIVES {
            let w = typ.width();
            assert!(typ.decode(&dat[..w], 0, true).is_ok(), "{typ} should fit {w} bytes");
            assert!(
                typ.decode(&dat[..w - 1], 0, true).is_err(),
                "{typ} should not fit {} bytes",
                w - 1
            );
        }
    }

    #[test]
    fn offsets_are_contiguous() {
        let schema = Schema::compile(&[
            ("a", "U1"),
            ("b", "I2"),
            ("c", "F8"),
            ("d", "A5"),
            ("e", "U8"),
        ])
        .unwrap();

        let fields = schema.fields();
        for pair in fields.windows(2) {
            assert_eq!(pair[0].offset + pair[0].typ.width(), pair[1].offset);
        }
        let total: usize = fields.iter().map(|f| f.typ.width()).sum();
        assert_eq!(schema.size(), total);
        assert_eq!(schema.size(), 24);
        assert_eq!(schema.offset_of("e"), Some(16));
    }

    #[test]
    fn malformed_tag_fails_whole_schema() {
        let err = Schema::compile(&[("a", "U1"), ("b", "A"), ("c", "U4")]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTypeTag {
                field: "b".into(),
                tag: "A".into()
            }
        );
    }

    #[test]
    fn duplicate_name_fails() {
        let err = Schema::compile(&[("a", "U1"), ("a", "U2")]).unwrap_err();
        assert_eq!(err, Error::DuplicateField("a".into()));
    }

    #[test]
    fn ascii_is_exact_width() {
        let schema = Schema::compile(&[("s", "A6")]).unwrap();
        let dat: &[u8] = &[b'a', 0, 0, b'b', 0xff, 0];
        let Value::Text(s) = schema.read(dat, 0, "s", true).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(s.chars().count(), 6);
        assert_eq!(s.chars().nth(4), Some('\u{ff}'));
    }

    #[test]
    fn full_range_u64() {
        let schema = Schema::compile(&[("big", "U8"), ("neg", "I8")]).unwrap();
        let mut dat = vec![0xff; 8];
        dat.extend_from_slice(&i64::MIN.to_be_bytes());
        assert_eq!(schema.read(&dat, 0, "big", false).unwrap(), Value::U(u64::MAX));
        assert_eq!(schema.read(&dat, 0, "neg", false).unwrap(), Value::I(i64::MIN));
    }

    #[test]
    fn endianness_is_per_call() {
        let schema = Schema::compile(&[("x", "U2")]).unwrap();
        let dat: &[u8] = &[0x00, 0x00, 0x12, 0x34];
        assert_eq!(schema.read_u64(dat, 2, "x", true).unwrap(), 0x3412);
        assert_eq!(schema.read_u64(dat, 2, "x", false).unwrap(), 0x1234);
    }

    #[test]
    fn read_fields_subset() {
        let schema = Schema::compile(&[("a", "U1"), ("b", "U1"), ("c", "U1")]).unwrap();
        let got = schema.read_fields(&[1, 2, 3], 0, &["c", "a"], true).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got["a"], Value::U(1));
        assert_eq!(got["c"], Value::U(3));

        let err = schema.read_fields(&[1, 2, 3], 0, &["z"], true).unwrap_err();
        assert_eq!(err, Error::UnknownField("z".into()));
    }

    #[test]
    fn describe_is_ordered_and_typed() {
        let schema = Schema::compile(&[("z", "I1"), ("a", "U2")]).unwrap();
        let record = schema.describe(&[0xff, 0x01, 0x00], 0, true).unwrap();
        let names: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(record.get("z").unwrap().value, Value::I(-1));
        assert_eq!(record.get("a").unwrap().typ, FieldType::U2);
        assert_eq!(record.get("a").unwrap().size, 2);
    }

    #[test]
    fn describe_short_buffer_errors() {
        let schema = Schema::compile(&[("a", "U4")]).unwrap();
        assert!(matches!(
            schema.describe(&[0, 0, 0], 0, true),
            Err(Error::NotEnoughData { actual: 3, minimum: 4 })
        ));
    }
}
