use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::debug;

use super::datagrams::COMMON;
use super::{DatagramType, Multibeam, Position, Sounding};
use crate::section::{Format, Section};
use crate::time;

/// Index of the position closest to `(date, time)` by binary search.
///
/// `positions` must be sorted by `(date, time)`. Closeness compares dates
/// first and only looks at time of day when both candidates are equally far
/// in days. Ties go to the earlier position.
#[must_use]
pub fn nearest_position(positions: &[Position], date: u32, time: u32) -> Option<usize> {
    // The closest dates are the last one before `date` and the first one at
    // or after it; both may be equally far.
    let split = positions.partition_point(|p| p.date < date);
    [split.checked_sub(1), Some(split).filter(|&i| i < positions.len())]
        .into_iter()
        .flatten()
        .filter_map(|i| nearest_in_day(positions, positions[i].date, time))
        .reduce(|a, b| closer(positions, a, b, date, time))
}

fn nearest_in_day(positions: &[Position], day: u32, time: u32) -> Option<usize> {
    let start = positions.partition_point(|p| p.date < day);
    let end = positions.partition_point(|p| p.date <= day);
    let block = &positions[start..end];
    let after = block.partition_point(|p| p.time < time);
    let before = after
        .checked_sub(1)
        .map(|i| start + block.partition_point(|p| p.time < block[i].time));
    [before, Some(start + after).filter(|&i| i < end)]
        .into_iter()
        .flatten()
        .reduce(|a, b| closer(positions, a, b, day, time))
}

/// Same as [nearest_position] by scanning every position.
#[must_use]
pub fn nearest_position_linear(positions: &[Position], date: u32, time: u32) -> Option<usize> {
    (0..positions.len()).reduce(|a, b| closer(positions, a, b, date, time))
}

fn closer(positions: &[Position], a: usize, b: usize, date: u32, time: u32) -> usize {
    let (pa, pb) = (&positions[a], &positions[b]);
    let (da, db) = (pa.date.abs_diff(date), pb.date.abs_diff(date));
    if da != db {
        return if da > db { b } else { a };
    }
    if pa.time.abs_diff(time) > pb.time.abs_diff(time) {
        b
    } else {
        a
    }
}

/// A ping of soundings with the position closest in time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Attributed {
    pub sounding: Sounding,
    pub position: Option<Position>,
}

/// Summary of a multibeam file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Meta {
    pub ts: Option<DateTime<Utc>>,
    pub ts2: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub lat2: Option<f64>,
    pub lng2: Option<f64>,
    pub count: usize,
    pub bytes: usize,
}

/// A split multibeam buffer with the queries built on top of its sections.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    buf: &'a [u8],
    format: Multibeam,
    sections: Vec<Section>,
}

impl<'a> Context<'a> {
    /// Split `buf` with its detected byte order.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Context::with_endianness(buf, super::detect_endianness(buf))
    }

    #[must_use]
    pub fn with_endianness(buf: &'a [u8], le: bool) -> Self {
        let format = Multibeam::new(le);
        let sections = format.split(buf);
        Context {
            buf,
            format,
            sections,
        }
    }

    #[must_use]
    pub fn format(&self) -> &Multibeam {
        &self.format
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn valid_of(&self, types: &[DatagramType]) -> impl Iterator<Item = &Section> + '_ {
        let types = types.to_vec();
        self.sections.iter().filter(move |s| {
            s.valid
                && u8::try_from(s.kind)
                    .is_ok_and(|k| types.contains(&DatagramType::from_code(k)))
        })
    }

    /// Every position datagram that decodes, in file order.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        self.valid_of(&[DatagramType::Position])
            .filter_map(|s| match Position::decode(self.buf, s.offset, self.format.le) {
                Ok(p) => Some(p),
                Err(err) => {
                    debug!(offset = s.offset, %err, "skipping position");
                    None
                }
            })
            .collect()
    }

    /// Datagram type soundings are read from: XYZ88 when the file has any,
    /// otherwise depth datagrams.
    #[must_use]
    pub fn sounding_type(&self) -> Option<DatagramType> {
        [DatagramType::Xyz88, DatagramType::DepthDatagram]
            .into_iter()
            .find(|t| self.valid_of(&[*t]).next().is_some())
    }

    #[must_use]
    pub fn soundings(&self) -> Vec<Sounding> {
        let Some(typ) = self.sounding_type() else {
            return Vec::new();
        };
        let decode = match typ {
            DatagramType::Xyz88 => Sounding::decode_xyz88,
            _ => Sounding::decode_depth,
        };
        self.valid_of(&[typ])
            .filter_map(|s| match decode(self.buf, s.offset, self.format.le) {
                Ok(sounding) => Some(sounding),
                Err(err) => {
                    debug!(offset = s.offset, %err, "skipping sounding");
                    None
                }
            })
            .collect()
    }

    /// Pair every sounding with its nearest position.
    #[must_use]
    pub fn attribute(&self) -> Vec<Attributed> {
        let mut positions = self.positions();
        positions.sort_by_key(|p| (p.date, p.time));
        self.soundings()
            .into_iter()
            .map(|sounding| {
                let position = nearest_position(&positions, sounding.date, sounding.time)
                    .map(|i| positions[i]);
                Attributed { sounding, position }
            })
            .collect()
    }

    fn timestamp(&self, section: &Section) -> Option<DateTime<Utc>> {
        let le = self.format.le;
        let date = COMMON.read_u64(self.buf, section.offset, "date", le).ok()?;
        let millis = COMMON.read_u64(self.buf, section.offset, "time", le).ok()?;
        time::from_date_millis(u32::try_from(date).ok()?, u32::try_from(millis).ok()?)
    }

    #[must_use]
    pub fn meta(&self) -> Meta {
        let mut valid = self.sections.iter().filter(|s| s.valid);
        let first = valid.next();
        let last = valid.next_back().or(first);
        let positions = self.positions();
        Meta {
            ts: first.and_then(|s| self.timestamp(s)),
            ts2: last.and_then(|s| self.timestamp(s)),
            lat: positions.first().map(|p| p.lat),
            lng: positions.first().map(|p| p.lng),
            lat2: positions.last().map(|p| p.lat),
            lng2: positions.last().map(|p| p.lng),
            count: self.sections.len(),
            bytes: self.buf.len(),
        }
    }
}
