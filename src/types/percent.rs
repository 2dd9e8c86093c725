// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Percentage values for the percent recipe.
//!
//! This module provides a type-safe representation of percentages,
//! ensuring values are always within the range 0-100.

use std::fmt;

use crate::error::ValueError;

/// A percentage between 0 and 100 inclusive.
///
/// # Examples
///
/// ```
/// use homie_device::types::Percent;
///
/// let p = Percent::new(75.0).unwrap();
/// assert_eq!(p.value(), 75.0);
///
/// // Values outside the range are rejected...
/// assert!(Percent::new(101.0).is_err());
///
/// // ...or clamped on request
/// assert_eq!(Percent::clamped(150.0), Percent::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    /// 0%.
    pub const MIN: Self = Self(0.0);

    /// 100%.
    pub const MAX: Self = Self(100.0);

    /// Creates a new percentage.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [0, 100] or NaN.
    pub fn new(value: f64) -> Result<Self, ValueError> {
        if !(0.0..=100.0).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: 0.0,
                max: 100.0,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    /// Creates a percentage, clamping to the valid range.
    ///
    /// NaN maps to 0%.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::MIN
        } else {
            Self(value.clamp(0.0, 100.0))
        }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Returns the value as a fraction between 0.0 and 1.0.
    #[must_use]
    pub fn as_fraction(&self) -> f64 {
        self.0 / 100.0
    }

    /// Creates a percentage from a fraction between 0.0 and 1.0.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the fraction is outside [0.0, 1.0].
    pub fn from_fraction(fraction: f64) -> Result<Self, ValueError> {
        Self::new(fraction * 100.0)
    }

    /// Creates a percentage from a raw reading relative to its full scale,
    /// e.g. a 16-bit ADC sample against 65535. The result is clamped.
    #[must_use]
    pub fn from_ratio(reading: f64, full_scale: f64) -> Self {
        if full_scale == 0.0 {
            return Self::MIN;
        }
        Self::clamped(reading / full_scale * 100.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<f64> for Percent {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u8> for Percent {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(f64::from(value))
    }
}
