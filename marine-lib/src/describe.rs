//! Ordered, typed field listings and the walker that builds them for
//! records with variable length bodies.
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::bytes;
use crate::schema::{FieldType, Schema, Value};
use crate::{Error, Result};

/// A decoded value together with the wire type and byte width it was read as.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Described {
    #[cfg_attr(feature = "serde", serde(rename = "v"))]
    pub value: Value,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub typ: FieldType,
    pub size: usize,
}

impl Described {
    #[must_use]
    pub fn new(value: Value, typ: FieldType) -> Self {
        Described {
            value,
            typ,
            size: typ.width(),
        }
    }
}

/// Field name to [Described] listing that keeps insertion order.
///
/// Inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Described)>,
    index: HashMap<String, usize>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Record::default()
    }

    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Record {
            entries: Vec::with_capacity(n),
            index: HashMap::with_capacity(n),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, described: Described) {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = described;
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, described));
        }
    }

    /// Append every entry of `other`, prefixing its names.
    pub fn extend_prefixed(&mut self, prefix: &str, other: Record) {
        for (name, d) in other.entries {
            self.insert(format!("{prefix}{name}"), d);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Described> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|d| &d.value)
    }

    #[must_use]
    pub fn u64(&self, name: &str) -> Option<u64> {
        self.value(name).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Described)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, d)| &d.value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the byte sizes of all entries.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.entries.iter().map(|(_, d)| d.size).sum()
    }
}

#[cfg(feature = "serde")]
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, d) in &self.entries {
            map.serialize_entry(k, d)?;
        }
        map.end()
    }
}

/// Walks a record of a section front to back, describing fixed heads,
/// counted repeats and trailers into one [Record].
///
/// Every counted read is checked against the bytes remaining before the
/// section end, so a corrupt count fails with [Error::LengthConsistency]
/// instead of reading into the next section.
#[derive(Debug)]
pub struct RecordWalker<'a> {
    buf: &'a [u8],
    cursor: usize,
    end: usize,
    le: bool,
    record: Record,
}

impl<'a> RecordWalker<'a> {
    /// Walk `buf[start..end]`. `end` is clamped to the buffer length.
    #[must_use]
    pub fn new(buf: &'a [u8], start: usize, end: usize, le: bool) -> Self {
        RecordWalker {
            buf,
            cursor: start,
            end: end.min(buf.len()),
            le,
            record: Record::new(),
        }
    }

    /// Current absolute offset.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.cursor)
    }

    /// The record built so far.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Fail unless `count` items of `unit` bytes fit before the section end.
    ///
    /// # Errors
    /// [Error::LengthConsistency] if they do not.
    pub fn ensure(&self, what: &str, count: usize, unit: usize) -> Result<()> {
        let needed = count.saturating_mul(unit);
        if needed > self.remaining() {
            return Err(Error::LengthConsistency {
                what: what.to_string(),
                count,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Describe one `schema` sized record at the cursor, prefixing its names.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the record runs past the section end.
    pub fn schema(&mut self, schema: &Schema, prefix: &str) -> Result<&mut Self> {
        bytes::slice(&self.buf[..self.end], self.cursor, schema.size())?;
        schema.describe_into(self.buf, self.cursor, self.le, prefix, &mut self.record)?;
        self.cursor += schema.size();
        Ok(self)
    }

    /// Describe `count` consecutive `schema` records, naming entry `i` with
    /// `prefix(i)`.
    ///
    /// # Errors
    /// [Error::LengthConsistency] if the entries do not fit before the
    /// section end.
    pub fn repeat(
        &mut self,
        what: &str,
        count: usize,
        schema: &Schema,
        prefix: impl Fn(usize) -> String,
    ) -> Result<&mut Self> {
        self.ensure(what, count, schema.size())?;
        for i in 0..count {
            self.schema(schema, &prefix(i))?;
        }
        Ok(self)
    }

    /// Describe `count` consecutive values of `typ`, naming value `i` with
    /// `name(i)`.
    ///
    /// # Errors
    /// [Error::LengthConsistency] if the values do not fit.
    pub fn array(
        &mut self,
        what: &str,
        count: usize,
        typ: FieldType,
        name: impl Fn(usize) -> String,
    ) -> Result<&mut Self> {
        self.ensure(what, count, typ.width())?;
        for i in 0..count {
            self.field(&name(i), typ)?;
        }
        Ok(self)
    }

    /// Like [RecordWalker::array] for a region whose length is the sum of
    /// per entry counts.
    ///
    /// # Errors
    /// [Error::LengthConsistency] if the region does not fit.
    pub fn repeat_sum(
        &mut self,
        what: &str,
        counts: &[usize],
        typ: FieldType,
        name: impl Fn(usize) -> String,
    ) -> Result<&mut Self> {
        let total = counts.iter().fold(0usize, |acc, n| acc.saturating_add(*n));
        self.array(what, total, typ, name)
    }

    /// Describe a single value at the cursor.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the value runs past the section end.
    pub fn field(&mut self, name: &str, typ: FieldType) -> Result<&mut Self> {
        bytes::slice(&self.buf[..self.end], self.cursor, typ.width())?;
        let value = typ.decode(self.buf, self.cursor, self.le)?;
        self.record.insert(name, Described::new(value, typ));
        self.cursor += typ.width();
        Ok(self)
    }

    /// Describe one `size` byte value with a custom decoder, reporting it as
    /// `typ`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the value runs past the section end, or any
    /// error of `decode`.
    pub fn decoded(
        &mut self,
        name: &str,
        typ: FieldType,
        size: usize,
        decode: impl FnOnce(&[u8], usize, bool) -> Result<Value>,
    ) -> Result<&mut Self> {
        bytes::slice(&self.buf[..self.end], self.cursor, size)?;
        let value = decode(self.buf, self.cursor, self.le)?;
        self.record.insert(name, Described { value, typ, size });
        self.cursor += size;
        Ok(self)
    }

    /// Describe `len` bytes of text at the cursor.
    ///
    /// # Errors
    /// [Error::LengthConsistency] if the text does not fit.
    pub fn ascii(&mut self, name: &str, len: usize) -> Result<&mut Self> {
        self.ensure(name, len, 1)?;
        self.field(name, FieldType::Ascii(len))
    }

    /// Describe a datagram trailer: an optional zero spare byte, then the end
    /// marker and a 2 byte checksum.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the trailer runs past the section end.
    pub fn end_of_datagram(&mut self) -> Result<&mut Self> {
        if bytes::u8_at(&self.buf[..self.end], self.cursor)? == 0 {
            self.field("spareEOS", FieldType::U1)?;
        }
        self.field("etx", FieldType::U1)?;
        self.field("checksum", FieldType::U2)
    }

    /// Skip `n` bytes without describing them.
    ///
    /// # Errors
    /// [Error::LengthConsistency] if fewer than `n` bytes remain.
    pub fn skip(&mut self, what: &str, n: usize) -> Result<&mut Self> {
        self.ensure(what, n, 1)?;
        self.cursor += n;
        Ok(self)
    }

    /// Read an integer already described by name.
    ///
    /// # Errors
    /// [Error::UnknownField] if `name` has not been described or is not an
    /// integer.
    pub fn count(&self, name: &str) -> Result<usize> {
        self.record
            .u64(name)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    #[must_use]
    pub fn finish(self) -> Record {
        self.record
    }
}
