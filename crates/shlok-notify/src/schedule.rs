//! Preferred delivery times
//!
//! Subscribers store a wall-clock time such as `7:05` or `07:05`. Times are
//! interpreted in UTC and compared at minute resolution, so the minute
//! ticker delivers each subscriber's verse at most once per day.

use crate::error::{NotifyError, NotifyResult};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hour and minute of day, UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationTime {
    hour: u8,
    minute: u8,
}

impl NotificationTime {
    /// Create from hour and minute
    ///
    /// # Errors
    /// `NotifyError::InvalidTime` if hour > 23 or minute > 59.
    pub fn new(hour: u8, minute: u8) -> NotifyResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(NotifyError::InvalidTime(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `H:M`, with or without zero padding
    ///
    /// Anything after a second colon (seconds) is ignored.
    ///
    /// # Errors
    /// `NotifyError::InvalidTime` for anything else.
    pub fn parse(input: &str) -> NotifyResult<Self> {
        let invalid = || NotifyError::InvalidTime(input.to_string());
        let mut parts = input.trim().split(':');

        let hour = parts
            .next()
            .and_then(|h| h.trim().parse::<u8>().ok())
            .ok_or_else(invalid)?;
        let minute = parts
            .next()
            .and_then(|m| m.trim().parse::<u8>().ok())
            .ok_or_else(invalid)?;

        Self::new(hour, minute).map_err(|_| invalid())
    }

    /// Minute of day for a UTC instant
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_datetime(now: DateTime<Utc>) -> Self {
        // chrono guarantees hour < 24 and minute < 60
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }

    /// Hour component
    #[inline]
    #[must_use]
    pub fn hour(self) -> u8 {
        self.hour
    }

    /// Minute component
    #[inline]
    #[must_use]
    pub fn minute(self) -> u8 {
        self.minute
    }

    /// True when `now` falls in this minute
    #[inline]
    #[must_use]
    pub fn matches(self, now: DateTime<Utc>) -> bool {
        self == Self::from_datetime(now)
    }
}

impl fmt::Display for NotificationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for NotificationTime {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_pads_components() {
        let time = NotificationTime::parse("7:5").unwrap();
        assert_eq!(time.to_string(), "07:05");
        assert_eq!(NotificationTime::parse("07:05").unwrap(), time);
    }

    #[test]
    fn parse_ignores_seconds() {
        assert_eq!(NotificationTime::parse("21:30:15").unwrap().to_string(), "21:30");
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "7", "24:00", "12:60", "ab:cd", ":30", "-1:00"] {
            assert!(
                matches!(NotificationTime::parse(input), Err(NotifyError::InvalidTime(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn matches_same_utc_minute() {
        let time: NotificationTime = "6:30".parse().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 6, 30, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 15, 6, 31, 0).unwrap();

        assert!(time.matches(at));
        assert!(!time.matches(later));
    }

    #[test]
    fn from_datetime_midnight() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(NotificationTime::from_datetime(at).to_string(), "00:00");
    }
}
