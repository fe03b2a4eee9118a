//! Sea-Bird text headers (`.hdr` and the `*` block of a `.hex`) and bottle
//! fire logs (`.bl`).
use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
#[cfg(feature = "serde")]
use serde::Serialize;

fn key(name: &str) -> Regex {
    Regex::new(&format!(r"(?m){} = (.*)$", regex::escape(name))).expect("header key patterns are valid")
}

static BYTES_PER_SCAN: LazyLock<Regex> = LazyLock::new(|| key("Number of Bytes Per Scan"));
static NMEA_LAT: LazyLock<Regex> = LazyLock::new(|| key("NMEA Latitude"));
static NMEA_LNG: LazyLock<Regex> = LazyLock::new(|| key("NMEA Longitude"));
static NMEA_UTC: LazyLock<Regex> = LazyLock::new(|| key("NMEA UTC (Time)"));
static SCAN_AVG: LazyLock<Regex> =
    LazyLock::new(|| key("Number of Scans Averaged by the Deck Unit"));
static DEG_MIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d*) ([\d.]*) ([NSEW])").expect("degree pattern is valid")
});

/// Values extracted from a Sea-Bird header. Keys missing from the header are
/// `None`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HeaderInfo {
    pub bytes_per_scan: Option<usize>,
    /// Signed decimal degrees.
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// The latitude as written, e.g. `35 08.42 N`.
    pub nmea_lat: Option<String>,
    pub nmea_lng: Option<String>,
    pub utc: Option<DateTime<Utc>>,
    pub nmea_utc: Option<String>,
    pub scan_avg: Option<u32>,
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// `deg min.frac H` to signed decimal degrees; south and west are negative.
#[must_use]
pub fn degrees_minutes(text: &str) -> Option<f64> {
    let c = DEG_MIN.captures(text)?;
    let degrees: f64 = c[1].parse().ok()?;
    let minutes: f64 = c[2].parse().ok()?;
    let value = degrees + minutes / 60.0;
    Some(match &c[3] {
        "S" | "W" => -value,
        _ => value,
    })
}

/// Header time such as `Jul 14 2019  10:23:45`.
fn parse_utc(text: &str) -> Option<DateTime<Utc>> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&text, "%b %d %Y %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[must_use]
pub fn parse_header(text: &str) -> HeaderInfo {
    let nmea_lat = capture(&NMEA_LAT, text).map(str::to_string);
    let nmea_lng = capture(&NMEA_LNG, text).map(str::to_string);
    let nmea_utc = capture(&NMEA_UTC, text).map(str::to_string);
    HeaderInfo {
        bytes_per_scan: capture(&BYTES_PER_SCAN, text).and_then(|s| s.parse().ok()),
        lat: nmea_lat.as_deref().and_then(degrees_minutes),
        lng: nmea_lng.as_deref().and_then(degrees_minutes),
        utc: nmea_utc.as_deref().and_then(parse_utc),
        scan_avg: capture(&SCAN_AVG, text).and_then(|s| s.parse().ok()),
        nmea_lat,
        nmea_lng,
        nmea_utc,
    }
}

/// One bottle firing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BottleFire {
    pub position: u32,
    pub date: String,
    /// First and last body line of the firing.
    pub scan_start: Option<u64>,
    pub scan_end: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BottleLog {
    /// Every firing line, including refirings of the same position.
    pub fired: usize,
    /// The last firing per bottle position.
    pub bottles: BTreeMap<u32, BottleFire>,
}

/// Parse a bottle log: `sequence, position, date, start scan, end scan` per
/// line. Lines without exactly five fields, or whose position is not a
/// number, are skipped.
#[must_use]
pub fn parse_bottle_log(text: &str) -> BottleLog {
    let mut log = BottleLog::default();
    for line in text.lines() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [_, position, date, start, end] = fields[..] else {
            continue;
        };
        let Ok(position) = position.parse::<u32>() else {
            continue;
        };
        log.fired += 1;
        log.bottles.insert(
            position,
            BottleFire {
                position,
                date: date.to_string(),
                scan_start: start.parse().ok(),
                scan_end: end.parse().ok(),
            },
        );
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const HEADER: &str = "* Sea-Bird SBE 9 Data File:\r\n\
        * FileName = C:\\data\\cast01.hex\r\n\
        * NMEA Latitude = 35 08.40 S\r\n\
        * NMEA Longitude = 129 03.00 E\r\n\
        * NMEA UTC (Time) = Jul 14 2019  10:23:45\r\n\
        * Number of Bytes Per Scan = 37\r\n\
        * Number of Scans Averaged by the Deck Unit = 1\r\n\
        *END*";

    #[test]
    fn header_keys() {
        let info = parse_header(HEADER);
        assert_eq!(info.bytes_per_scan, Some(37));
        assert_eq!(info.scan_avg, Some(1));
        assert_eq!(info.nmea_lat.as_deref(), Some("35 08.40 S"));
        assert!((info.lat.unwrap() + 35.14).abs() < 1e-9);
        assert!((info.lng.unwrap() - 129.05).abs() < 1e-9);
        assert_eq!(
            info.utc.unwrap().to_rfc3339(),
            "2019-07-14T10:23:45+00:00"
        );
    }

    #[test]
    fn missing_keys_are_none() {
        let info = parse_header("* nothing here\n*END*");
        assert_eq!(info, HeaderInfo::default());
    }

    #[test_case("12 30.0 N", Some(12.5))]
    #[test_case("12 30.0 W", Some(-12.5))]
    #[test_case("garbage", None)]
    fn deg_min(text: &str, expected: Option<f64>) {
        assert_eq!(degrees_minutes(text), expected);
    }

    #[test]
    fn bottle_log_keeps_last_firing() {
        let text = "cast01.bl\n\
            RESET Jul 14 2019 10:20:00\n\
            1, 1, Jul 14 2019 10:40:01, 1200, 1223\n\
            2, 2, Jul 14 2019 10:45:10, 4000, 4023\n\
            3, 1, Jul 14 2019 10:50:00, 5000, 5023\n";
        let log = parse_bottle_log(text);
        assert_eq!(log.fired, 3);
        assert_eq!(log.bottles.len(), 2);
        assert_eq!(log.bottles[&1].scan_start, Some(5000));
        assert_eq!(log.bottles[&2].date, "Jul 14 2019 10:45:10");
    }
}
