//! Timestamp normalisation.
//!
//! Samples are normalised to UTC on ingest. The wide table is indexed in a
//! single display timezone, applied once when the resample index is built.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Display timezone used when none is configured
pub const DEFAULT_DISPLAY_TIMEZONE: &str = "America/Bogota";

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Config(format!("unknown display timezone '{}': {}", name, e)))
}

/// Normalise any timezone-aware instant to UTC
pub fn normalize_utc<Z: TimeZone>(ts: &DateTime<Z>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

/// Parse an RFC 3339 timestamp (any offset) and normalise it to UTC
pub fn parse_rfc3339_utc(s: &str) -> Result<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_rfc3339(s.trim())
        .map(|dt| normalize_utc(&dt))
        .map_err(|e| Error::Format(format!("invalid RFC 3339 timestamp '{}': {}", s, e)))
}

/// Convert a UTC instant to the display timezone
pub fn to_display(ts: &DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    ts.with_timezone(tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_offsets_normalise_to_same_instant() {
        let a = parse_rfc3339_utc("2024-03-01T12:00:00Z").unwrap();
        let b = parse_rfc3339_utc("2024-03-01T07:00:00-05:00").unwrap();
        let c = parse_rfc3339_utc("2024-03-01T21:00:00+09:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_display_conversion_keeps_instant() {
        let tz = parse_timezone(DEFAULT_DISPLAY_TIMEZONE).unwrap();
        let utc = parse_rfc3339_utc("2024-03-01T12:00:00Z").unwrap();
        let local = to_display(&utc, &tz);
        assert_eq!(local.hour(), 7);
        assert_eq!(normalize_utc(&local), utc);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(parse_timezone("Mars/Olympus"), Err(Error::Config(_))));
        assert!(matches!(parse_rfc3339_utc("yesterday"), Err(Error::Format(_))));
    }
}
