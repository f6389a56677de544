//! Millisecond-precision timestamp value object.

use chrono::{DateTime, Utc};
use std::fmt;

/// A point in time as a signed count of milliseconds since the Unix epoch,
/// clamped to the representable date range.
///
/// Construction never fails: out-of-range inputs saturate at [`Timestamp::MIN`]
/// and [`Timestamp::MAX`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    unix_millis: i64,
}

impl Timestamp {
    pub const MIN: Timestamp = Timestamp {
        unix_millis: -8_640_000_000_000_000,
    };

    pub const MAX: Timestamp = Timestamp {
        unix_millis: 8_640_000_000_000_000,
    };

    pub const UNIX_EPOCH: Timestamp = Timestamp { unix_millis: 0 };

    /// Builds a timestamp from a millisecond count, clamping at the range
    /// bounds.
    pub fn from_unix_millis(unix_millis: i64) -> Self {
        Self {
            unix_millis: unix_millis.clamp(Self::MIN.unix_millis, Self::MAX.unix_millis),
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_unix_millis(Utc::now().timestamp_millis())
    }

    pub fn unix_millis(self) -> i64 {
        self.unix_millis
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        // Always valid: the clamped range is well inside chrono's.
        DateTime::from_timestamp_millis(self.unix_millis).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// ISO-8601 UTC form with millisecond precision, e.g.
    /// `2023-08-25T21:30:34.586Z`.
    pub fn format_iso(self) -> String {
        self.to_datetime()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_iso())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_clamps() {
        assert_eq!(Timestamp::from_unix_millis(i64::MAX), Timestamp::MAX);
        assert_eq!(Timestamp::from_unix_millis(i64::MIN), Timestamp::MIN);
        assert_eq!(
            Timestamp::from_unix_millis(42).unix_millis(),
            42
        );
    }

    #[test]
    fn test_default_is_epoch() {
        assert_eq!(Timestamp::default(), Timestamp::UNIX_EPOCH);
        assert_eq!(Timestamp::default().unix_millis(), 0);
    }

    #[test]
    fn test_iso_formatting() {
        let ts = Timestamp::from_unix_millis(1_692_999_034_586);
        assert_eq!(ts.format_iso(), "2023-08-25T21:30:34.586Z");
        assert_eq!(ts.to_string(), "2023-08-25T21:30:34.586Z");
    }

    #[test]
    fn test_epoch_formatting() {
        assert_eq!(
            Timestamp::UNIX_EPOCH.format_iso(),
            "1970-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::from_unix_millis(-1);
        let later = Timestamp::from_unix_millis(1);
        assert!(earlier < later);
        assert!(Timestamp::MIN < Timestamp::MAX);
    }
}
