//! Millisecond-precision RFC3339 timestamps.
//!
//! The remote service exchanges every timestamp as RFC3339 with exactly three
//! fractional digits. UTC renders with a `Z` suffix, other offsets as `+HH:MM`
//! or `-HH:MM`. Values without any offset information (plain dates or naive
//! date-times) are kept naive and render without a suffix.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A timestamp that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid RFC3339 timestamp: `{0}`")]
pub struct TimestampError(pub String);

/// A point in time as exchanged with the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    local: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl Timestamp {
    /// Creates a timestamp without offset information.
    pub fn naive(local: NaiveDateTime) -> Self {
        Self {
            local,
            offset: None,
        }
    }

    /// Creates a timestamp from any timezone-aware date-time.
    pub fn from_datetime<Tz: TimeZone>(datetime: DateTime<Tz>) -> Self {
        let fixed = datetime.fixed_offset();
        Self {
            local: fixed.naive_local(),
            offset: Some(*fixed.offset()),
        }
    }

    /// Parses `YYYY-MM-DD`, naive `YYYY-MM-DDTHH:MM:SS[.f]`, or full RFC3339.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self::from_datetime(datetime));
        }
        if let Ok(local) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::naive(local));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self::naive)
            .ok_or_else(|| TimestampError(value.to_string()))
    }

    /// Renders the timestamp with exactly millisecond precision.
    pub fn to_rfc3339(&self) -> String {
        let mut rendered = self.local.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        if let Some(offset) = self.offset {
            let seconds = offset.local_minus_utc();
            if seconds == 0 {
                rendered.push('Z');
            } else {
                let sign = if seconds < 0 { '-' } else { '+' };
                let seconds = seconds.abs();
                rendered.push_str(&format!(
                    "{sign}{:02}:{:02}",
                    seconds / 3600,
                    (seconds % 3600) / 60
                ));
            }
        }
        rendered
    }

    /// The wall-clock date-time, ignoring the offset.
    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Returns the timezone-aware value, if the timestamp carries an offset.
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.offset
            .and_then(|offset| offset.from_local_datetime(&self.local).single())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(datetime: DateTime<Tz>) -> Self {
        Self::from_datetime(datetime)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(local: NaiveDateTime) -> Self {
        Self::naive(local)
    }
}
