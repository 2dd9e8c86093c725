// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property payload datatypes.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// The `$datatype` of a property.
///
/// # Examples
///
/// ```
/// use homie_device::types::Datatype;
///
/// assert_eq!(Datatype::Integer.as_str(), "integer");
/// assert_eq!("color".parse::<Datatype>().unwrap(), Datatype::Color);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// Free-form UTF-8 string.
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// `true` or `false`.
    Boolean,
    /// One value out of the comma-separated `$format` list.
    Enum,
    /// Three comma-separated components in the `rgb` or `hsv` model.
    Color,
    /// ISO 8601 date and time.
    DateTime,
    /// ISO 8601 duration.
    Duration,
}

impl Datatype {
    /// Every datatype defined by the convention.
    pub const ALL: [Self; 8] = [
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Enum,
        Self::Color,
        Self::DateTime,
        Self::Duration,
    ];

    /// Returns the wire representation used in `$datatype`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Color => "color",
            Self::DateTime => "datetime",
            Self::Duration => "duration",
        }
    }

    /// Returns `true` for `integer` and `float`.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|datatype| datatype.as_str() == s.to_lowercase())
            .ok_or_else(|| ValueError::NotInEnum {
                input: s.to_string(),
                allowed: Self::ALL.map(|d| d.as_str()).join(","),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(Datatype::String.as_str(), "string");
        assert_eq!(Datatype::DateTime.as_str(), "datetime");
        assert_eq!(Datatype::Duration.to_string(), "duration");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Float".parse::<Datatype>().unwrap(), Datatype::Float);
        assert_eq!("ENUM".parse::<Datatype>().unwrap(), Datatype::Enum);
    }

    #[test]
    fn parse_unknown() {
        let err = "number".parse::<Datatype>().unwrap_err();
        assert!(matches!(err, ValueError::NotInEnum { .. }));
    }

    #[test]
    fn numeric() {
        assert!(Datatype::Integer.is_numeric());
        assert!(Datatype::Float.is_numeric());
        assert!(!Datatype::Enum.is_numeric());
    }
}
