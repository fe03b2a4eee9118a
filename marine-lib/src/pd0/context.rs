use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;

use super::leader::{
    bam, ensemble_time, system_frequency, CoordTransform, Coordinates, EarthVelocity,
    FIXED_LEADER, NAVIGATION, VARIABLE_LEADER, VELOCITY_CELL,
};
use super::{split_ensembles, Ensemble, SectionId};
use crate::{Error, Result};

/// Summary of a PD0 file taken from its first and last ensembles.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Meta {
    /// Equipment name from the system frequency, e.g. `ADCP_38kHz`.
    pub eq: Option<String>,
    /// The file carries no serial number, so this is `eq` plus `_0000`.
    pub eqid: Option<String>,
    pub ts: Option<DateTime<Utc>>,
    pub ts2: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub lat2: Option<f64>,
    pub lng2: Option<f64>,
    pub count: usize,
    pub bytes: usize,
}

/// A split PD0 buffer.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    buf: &'a [u8],
    le: bool,
    ensembles: Vec<Ensemble>,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8], le: bool) -> Self {
        Context {
            buf,
            le,
            ensembles: split_ensembles(buf, le),
        }
    }

    #[must_use]
    pub fn ensembles(&self) -> &[Ensemble] {
        &self.ensembles
    }

    fn offset_of(ensemble: &Ensemble, id: SectionId) -> Result<usize> {
        ensemble
            .find(id)
            .map(|s| s.offset)
            .ok_or_else(|| Error::UnknownField(id.title().to_string()))
    }

    /// Ensemble start time from the variable leader.
    ///
    /// # Errors
    /// [Error::UnknownField] if the ensemble has no variable leader.
    pub fn timestamp(&self, ensemble: &Ensemble) -> Result<Option<DateTime<Utc>>> {
        let at = Self::offset_of(ensemble, SectionId::VariableLeader)?;
        let names = [
            "tsYear",
            "tsMonth",
            "tsDay",
            "tsHour",
            "tsMin",
            "tsSec",
            "tsHundredths",
        ];
        let mut fields = [0u8; 7];
        for (field, name) in fields.iter_mut().zip(names) {
            *field = VARIABLE_LEADER.read_u64(self.buf, at, name, self.le)? as u8;
        }
        Ok(ensemble_time(fields))
    }

    /// First and last GPS fix of an ensemble as `(lat, lng)` degrees.
    ///
    /// # Errors
    /// [Error::UnknownField] if the ensemble has no navigation section.
    pub fn fixes(&self, ensemble: &Ensemble) -> Result<[(f64, f64); 2]> {
        let at = Self::offset_of(ensemble, SectionId::Navigation)?;
        let angle = |name: &str| -> Result<f64> {
            // Stored as a two's complement BAM despite the unsigned layout.
            let raw = NAVIGATION.read_u64(self.buf, at, name, self.le)? as u32 as i32;
            Ok(bam(f64::from(raw), 32))
        };
        Ok([
            (angle("firstLat")?, angle("firstLng")?),
            (angle("lastLat")?, angle("lastLng")?),
        ])
    }

    /// Equipment name from the fixed leader system configuration.
    ///
    /// # Errors
    /// [Error::UnknownField] if the ensemble has no fixed leader.
    pub fn equipment(&self, ensemble: &Ensemble) -> Result<Option<String>> {
        let at = Self::offset_of(ensemble, SectionId::FixedLeader)?;
        let cfg = FIXED_LEADER.read_u64(self.buf, at, "sysCfg", self.le)? as u16;
        Ok(system_frequency(cfg).map(|f| format!("ADCP_{f}")))
    }

    /// Per cell horizontal current of an ensemble recorded in earth
    /// coordinates.
    ///
    /// # Errors
    /// [Error::Header] if the ensemble is not in earth coordinates, and
    /// [Error::UnknownField] if it lacks a fixed leader or velocity section.
    pub fn velocity_profile(&self, ensemble: &Ensemble) -> Result<Vec<EarthVelocity>> {
        let fixed = Self::offset_of(ensemble, SectionId::FixedLeader)?;
        let byte = FIXED_LEADER.read_u64(self.buf, fixed, "coordTransf", self.le)? as u8;
        let transform = CoordTransform::decode(byte);
        if transform.coordinates != Coordinates::Earth {
            return Err(Error::Header(format!(
                "velocity profile needs earth coordinates, got {}",
                transform.coordinates.title()
            )));
        }
        let section = ensemble
            .find(SectionId::Velocity)
            .ok_or_else(|| Error::UnknownField(SectionId::Velocity.title().to_string()))?;
        let cell = &*VELOCITY_CELL;
        let count = section.length.saturating_sub(2) / cell.size();
        (0..count)
            .map(|i| -> Result<EarthVelocity> {
                let at = section.offset + 2 + i * cell.size();
                let mut v = [0i16; 4];
                for (j, name) in ["v1", "v2", "v3", "v4"].into_iter().enumerate() {
                    v[j] = cell.read_i64(self.buf, at, name, self.le)? as i16;
                }
                Ok(EarthVelocity::new(v))
            })
            .collect()
    }

    /// Meta from the first and last ensembles only. Fields an ensemble
    /// cannot provide are left empty.
    #[must_use]
    pub fn meta(&self) -> Meta {
        let first = self.ensembles.first();
        let last = self.ensembles.last();
        let fixes = |e: Option<&Ensemble>| e.and_then(|e| self.fixes(e).ok());
        let eq = first.and_then(|e| self.equipment(e).ok().flatten());
        Meta {
            eqid: eq.as_ref().map(|eq| format!("{eq}_0000")),
            eq,
            ts: first.and_then(|e| self.timestamp(e).ok().flatten()),
            ts2: last.and_then(|e| self.timestamp(e).ok().flatten()),
            lat: fixes(first).map(|f| f[0].0),
            lng: fixes(first).map(|f| f[0].1),
            lat2: fixes(last).map(|f| f[1].0),
            lng2: fixes(last).map(|f| f[1].1),
            count: self.ensembles.len(),
            bytes: self.buf.len(),
        }
    }
}
