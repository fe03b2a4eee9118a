//! Timestamp composition for the instrument formats.
//!
//! Every format stores time as separate calendar fields or as an offset from
//! a format epoch. All timestamps are treated as UTC. Out of range field
//! values yield `None` rather than an error since a single bad ping time
//! should not fail a whole record.
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Milliseconds between the Unix epoch and 2000-01-01T00:00:00Z.
pub const EPOCH_2000_MILLIS: i64 = 946_684_800_000;

/// Multibeam date (`YYYYMMDD`) and time (milliseconds since midnight).
#[must_use]
pub fn from_date_millis(date: u32, millis: u32) -> Option<DateTime<Utc>> {
    let day = NaiveDate::from_ymd_opt(
        i32::try_from(date / 10_000).ok()?,
        (date / 100) % 100,
        date % 100,
    )?;
    let dt = day
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(i64::from(millis))?)?;
    Some(dt.and_utc())
}

/// ADCP ensemble time. `year` is two digits; values above 80 are in the
/// 1900s, the rest in the 2000s.
#[must_use]
pub fn from_two_digit_year(
    year: u8,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    hundredths: u8,
) -> Option<DateTime<Utc>> {
    let year = if year > 80 {
        1900 + i32::from(year)
    } else {
        2000 + i32::from(year)
    };
    let dt = NaiveDate::from_ymd_opt(year, month.into(), day.into())?
        .and_hms_milli_opt(
            hour.into(),
            minute.into(),
            second.into(),
            u32::from(hundredths) * 10,
        )?;
    Some(dt.and_utc())
}

/// Year plus day of year, where day 1 is January 1st. Day and time fields
/// past their natural range roll over into the following unit.
#[must_use]
pub fn from_day_of_year(
    year: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Option<DateTime<Utc>> {
    let start = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let offset = TimeDelta::try_days(day - 1)?
        .checked_add(&TimeDelta::try_hours(hour)?)?
        .checked_add(&TimeDelta::try_minutes(minute)?)?
        .checked_add(&TimeDelta::try_seconds(second)?)?;
    Some(start.checked_add_signed(offset)?.and_utc())
}

/// Seconds since 2000-01-01T00:00:00Z.
#[must_use]
pub fn from_secs_since_2000(secs: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(EPOCH_2000_MILLIS + i64::from(secs) * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_millis() {
        let got = from_date_millis(20_190_621, 34_812_345).unwrap();
        let expected = Utc.with_ymd_and_hms(2019, 6, 21, 9, 40, 12).unwrap()
            + TimeDelta::try_milliseconds(345).unwrap();
        assert_eq!(got, expected);
        assert!(from_date_millis(20_191_332, 0).is_none(), "month 13 is invalid");
    }

    #[test]
    fn two_digit_year_window() {
        let got = from_two_digit_year(99, 12, 31, 23, 59, 59, 50).unwrap();
        assert_eq!(got.timestamp_millis() % 1000, 500);
        assert_eq!(got.format("%Y").to_string(), "1999");

        let got = from_two_digit_year(80, 1, 1, 0, 0, 0, 0).unwrap();
        assert_eq!(got.format("%Y").to_string(), "2080");
    }

    #[test]
    fn day_of_year_rolls_over() {
        let got = from_day_of_year(2020, 60, 1, 2, 3).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2020, 2, 29, 1, 2, 3).unwrap());
        let got = from_day_of_year(2021, 0, 0, 0, 0).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2020, 12, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn secs_since_2000() {
        let got = from_secs_since_2000(86_400).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2000, 1, 2, 0, 0, 0).unwrap());
    }
}
