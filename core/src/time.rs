//! Time related utils.

use crate::{Error, Result};
use chrono::{TimeZone, Utc};
use std::time::Duration;

/// DateTime is the alias for `chrono::DateTime<Utc>`.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into http date: `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// ## Note
///
/// HTTP date is slightly different from RFC2822.
///
/// - Timezone is fixed to GMT.
/// - Day must be 2 digit.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %T GMT").to_string()
}

/// Format time into RFC3339 without fractions: `2022-03-13T07:20:04Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse time from RFC3339.
///
/// All of them are valid time:
///
/// - `2022-03-13T07:20:04Z`
/// - `2022-03-01T08:12:34+00:00`
/// - `2022-03-01T08:12:34.000000Z`
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("failed to parse time {s}")).with_source(e))
}

/// Convert epoch seconds into time.
pub fn from_timestamp(secs: i64) -> Result<DateTime> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| Error::unexpected(format!("timestamp {secs} is out of range")))
}

/// Add a std duration to a time, failing on overflow.
pub fn add_duration(t: DateTime, d: Duration) -> Result<DateTime> {
    let delta = chrono::TimeDelta::from_std(d)
        .map_err(|e| Error::request_invalid("duration is out of range").with_source(e))?;
    t.checked_add_signed(delta)
        .ok_or_else(|| Error::request_invalid("time overflow while adding duration"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    #[test]
    fn test_format_http_date() {
        assert_eq!(format_http_date(test_time()), "Tue, 01 Mar 2022 08:12:34 GMT")
    }

    #[test]
    fn test_format_rfc3339() {
        assert_eq!(format_rfc3339(test_time()), "2022-03-01T08:12:34Z")
    }

    #[test]
    fn test_parse_rfc3339() {
        let t = test_time();

        for v in [
            "2022-03-01T08:12:34Z",
            "2022-03-01T08:12:34+00:00",
            "2022-03-01T08:12:34.00+00:00",
        ] {
            assert_eq!(t, parse_rfc3339(v).expect("must be valid time"));
        }
    }

    #[test]
    fn test_add_duration() {
        let t = add_duration(test_time(), Duration::from_secs(900)).unwrap();
        assert_eq!(t.timestamp(), test_time().timestamp() + 900);
        assert_eq!(from_timestamp(t.timestamp()).unwrap(), t);
    }
}
