// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Homie topic identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A validated Homie identifier.
///
/// Identifiers name devices, nodes and properties in the topic tree. They
/// may only contain lowercase ASCII letters, digits and hyphens, and must
/// neither start nor end with a hyphen.
///
/// # Examples
///
/// ```
/// use homie_device::Identifier;
///
/// let id = Identifier::new("living-room").unwrap();
/// assert_eq!(id.as_str(), "living-room");
///
/// assert!(Identifier::new("Living-Room").is_err());
/// assert!(Identifier::new("-lamp").is_err());
/// assert!(Identifier::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the string is empty, contains
    /// characters outside `[a-z0-9-]`, or starts or ends with a hyphen.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if is_valid(&id) {
            Ok(Self(id))
        } else {
            Err(Error::InvalidIdentifier(id))
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `id` is a legal Homie identifier.
#[must_use]
pub fn is_valid(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && !id.ends_with('-')
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Identifier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_identifiers() {
        for id in ["a", "0", "lamp", "living-room", "node-1", "a-b-c", "123", "x--y"] {
            assert!(Identifier::new(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            Identifier::new(""),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn rejects_uppercase() {
        assert!(Identifier::new("Lamp").is_err());
        assert!(Identifier::new("LAMP").is_err());
    }

    #[test]
    fn rejects_illegal_characters() {
        for id in ["under_score", "dollar$", "$state", "with space", "slash/x", "dot.x", "é"] {
            assert!(Identifier::new(id).is_err(), "{id} should be invalid");
        }
    }

    #[test]
    fn rejects_leading_and_trailing_hyphen() {
        assert!(Identifier::new("-lamp").is_err());
        assert!(Identifier::new("lamp-").is_err());
        assert!(Identifier::new("-").is_err());
    }

    #[test]
    fn error_keeps_input() {
        let err = Identifier::new("Bad_Id").unwrap_err();
        assert_eq!(err.to_string(), "invalid identifier: \"Bad_Id\"");
    }

    #[test]
    fn parses_and_compares() {
        let id: Identifier = "light".parse().unwrap();
        assert_eq!(id, "light");
        assert_eq!(id.to_string(), "light");
    }
}
