//! # Viewer Time Zone Helpers
//!
//! Timestamps are stored in UTC. Day boundaries, chart buckets and report
//! partitions are computed in the viewer's IANA time zone.
//!
//! A local time that does not exist (DST gap) falls back to reading the
//! naive value as UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// Parses an IANA zone name such as `Africa/Cairo`.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "timezone".to_string(),
            reason: format!("unknown time zone '{}'", name),
        })
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: format!("'{}' is not YYYY-MM-DD", date),
        }
    })
}

/// Local date + time → UTC instant.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Local midnight of `date`.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_to_utc(date, NaiveTime::MIN, tz)
}

/// Local midnight of the following day; use with `< end`.
pub fn day_end(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start(next_day, tz)
}

/// Calendar date of `instant` in `tz`.
#[inline]
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_day_bounds_in_zone() {
        let tz = parse_timezone("Africa/Cairo").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

        // Cairo is UTC+2 in January
        let start = day_start(date, tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 14, 22, 0, 0).unwrap());
        assert_eq!(day_end(date, tz) - start, chrono::Duration::hours(24));
        assert_eq!(local_date(start, tz), date);
        assert_eq!(start.with_timezone(&tz).hour(), 0);
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_timezone("UTC").is_ok());
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert!(parse_date("2026-03-01").is_ok());
        assert!(parse_date("01/03/2026").is_err());
    }
}
