// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO 8601 durations for `duration` properties.
//!
//! Homie transmits durations as `PTxHxMxS`, optionally with a day part
//! (`P1DT2H`). Sub-second precision is not representable on the wire and is
//! truncated.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use homie_device::types::HomieDuration;
//!
//! let d: HomieDuration = "PT1H9S".parse().unwrap();
//! assert_eq!(d.as_duration(), Duration::from_secs(3609));
//!
//! assert_eq!(HomieDuration::from_secs(360).to_string(), "PT6M");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ValueError;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// A whole-second duration with ISO 8601 wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HomieDuration(u64);

impl HomieDuration {
    /// A zero-length duration (`PT0S`).
    pub const ZERO: Self = Self(0);

    /// Creates a duration from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the number of whole seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns the duration as a [`Duration`].
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl From<Duration> for HomieDuration {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs())
    }
}

impl From<HomieDuration> for Duration {
    fn from(duration: HomieDuration) -> Self {
        duration.as_duration()
    }
}

impl fmt::Display for HomieDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / SECS_PER_HOUR;
        let minutes = (self.0 % SECS_PER_HOUR) / SECS_PER_MINUTE;
        let seconds = self.0 % SECS_PER_MINUTE;

        f.write_str("PT")?;
        if hours > 0 {
            write!(f, "{hours}H")?;
        }
        if minutes > 0 {
            write!(f, "{minutes}M")?;
        }
        if seconds > 0 || (hours == 0 && minutes == 0) {
            write!(f, "{seconds}S")?;
        }
        Ok(())
    }
}

impl FromStr for HomieDuration {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidDuration(s.to_string());
        let rest = s.trim().strip_prefix('P').ok_or_else(invalid)?;

        let (date_part, time_part) = match rest.split_once('T') {
            Some((date, time)) if !time.is_empty() => (date, Some(time)),
            Some(_) => return Err(invalid()),
            None => (rest, None),
        };
        if date_part.is_empty() && time_part.is_none() {
            return Err(invalid());
        }

        let mut total = sum_components(date_part, &[('D', SECS_PER_DAY)]).ok_or_else(invalid)?;
        if let Some(time) = time_part {
            let time_secs = sum_components(
                time,
                &[('H', SECS_PER_HOUR), ('M', SECS_PER_MINUTE), ('S', 1)],
            )
            .ok_or_else(invalid)?;
            total = total.checked_add(time_secs).ok_or_else(invalid)?;
        }
        Ok(Self(total))
    }
}

// Sums "<n><unit>" groups in order; each unit may appear at most once.
fn sum_components(part: &str, units: &[(char, u64)]) -> Option<u64> {
    let mut total: u64 = 0;
    let mut remaining = part;
    let mut next_unit = 0;

    while !remaining.is_empty() {
        let digits_end = remaining.find(|c: char| !c.is_ascii_digit())?;
        if digits_end == 0 {
            return None;
        }
        let amount: u64 = remaining[..digits_end].parse().ok()?;
        let unit = remaining[digits_end..].chars().next()?;

        let offset = units[next_unit..].iter().position(|(u, _)| *u == unit)?;
        let (_, scale) = units[next_unit + offset];
        next_unit += offset + 1;

        total = total.checked_add(amount.checked_mul(scale)?)?;
        remaining = &remaining[digits_end + unit.len_utf8()..];
    }
    Some(total)
}
