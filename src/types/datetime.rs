// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO 8601 datetime values for `datetime` properties.
//!
//! # Supported Formats
//!
//! - without timezone: `"2024-01-15T10:30:00"` (fractional seconds allowed)
//! - with timezone: `"2024-01-15T10:30:00+01:00"` or `"2024-01-15T10:30:00Z"`
//!
//! # Examples
//!
//! ```
//! use homie_device::types::HomieDateTime;
//!
//! let dt: HomieDateTime = "2024-01-15T10:30:00".parse().unwrap();
//! assert!(dt.timezone_offset().is_none());
//! assert_eq!(dt.to_string(), "2024-01-15T10:30:00");
//!
//! let dt: HomieDateTime = "2024-01-15T10:30:00+01:00".parse().unwrap();
//! assert_eq!(dt.to_string(), "2024-01-15T10:30:00+01:00");
//! ```

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::ValueError;

/// A datetime carried by a `datetime` property.
///
/// The offset is kept when the payload carried one, so a value is
/// republished in the same form it was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HomieDateTime {
    naive: NaiveDateTime,
    /// Offset in seconds east of UTC, if known.
    offset_secs: Option<i32>,
}

impl HomieDateTime {
    /// Parses an ISO 8601 datetime, returning `None` on failure.
    ///
    /// For error details, use the `FromStr` implementation instead.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Returns the datetime used as the initial value of the datetime recipe,
    /// `2000-01-01T00:00:00`.
    #[must_use]
    pub fn epoch_2000() -> Self {
        let naive = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self::from(naive)
    }

    fn parse_with_tz(s: &str) -> Option<Self> {
        let datetime = DateTime::parse_from_rfc3339(s).ok()?;
        Some(datetime.into())
    }

    fn parse_naive(s: &str) -> Option<Self> {
        let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

        formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(Self::from)
    }

    /// Returns the naive datetime (without timezone information).
    #[must_use]
    pub const fn naive(&self) -> NaiveDateTime {
        self.naive
    }

    /// Returns the timezone offset, if known.
    #[must_use]
    pub fn timezone_offset(&self) -> Option<FixedOffset> {
        self.offset_secs.and_then(FixedOffset::east_opt)
    }

    /// Returns the timezone-aware datetime, if the timezone is known.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.timezone_offset()
            .and_then(|tz| self.naive.and_local_timezone(tz).single())
    }
}

impl FromStr for HomieDateTime {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        Self::parse_with_tz(s)
            .or_else(|| Self::parse_naive(s))
            .ok_or_else(|| ValueError::InvalidDateTime(s.to_string()))
    }
}

impl From<NaiveDateTime> for HomieDateTime {
    fn from(naive: NaiveDateTime) -> Self {
        Self {
            naive,
            offset_secs: None,
        }
    }
}

impl From<DateTime<FixedOffset>> for HomieDateTime {
    fn from(datetime: DateTime<FixedOffset>) -> Self {
        Self {
            naive: datetime.naive_local(),
            offset_secs: Some(datetime.offset().local_minus_utc()),
        }
    }
}

impl std::fmt::Display for HomieDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) if self.offset_secs == Some(0) => {
                write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ"))
            }
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
            None => write!(f, "{}", self.naive.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}
