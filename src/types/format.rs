// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsed `$format` attributes.
//!
//! The meaning of `$format` depends on the datatype:
//!
//! | Datatype | Format | Example |
//! |---|---|---|
//! | `integer`, `float` | optional `min:max` range, either side may be empty | `0:100`, `:10` |
//! | `enum` | required comma-separated list | `low,medium,high` |
//! | `color` | required color model | `rgb`, `hsv` |
//! | others | free text, published as-is | |

use std::fmt;

use crate::error::{Error, ValueError};

use super::{ColorModel, Datatype};

/// An inclusive numeric range from a `min:max` format.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericRange {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumericRange {
    /// Creates a range. Either bound may be open.
    #[must_use]
    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn min(&self) -> Option<f64> {
        self.min
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn max(&self) -> Option<f64> {
        self.max
    }

    /// Checks that `value` lies within the range.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if it does not.
    pub fn check(&self, value: f64) -> Result<(), ValueError> {
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            return Err(ValueError::OutOfRange {
                min: self.min.unwrap_or(f64::NEG_INFINITY),
                max: self.max.unwrap_or(f64::INFINITY),
                actual: value,
            });
        }
        Ok(())
    }
}

/// The parsed `$format` of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFormat {
    /// Range for numeric properties.
    Range(NumericRange),
    /// Allowed values of an enum property.
    Enum(Vec<String>),
    /// Color model of a color property.
    Color(ColorModel),
    /// Free-form format for other datatypes.
    Text(String),
}

impl PropertyFormat {
    /// Parses and validates a format string for the given datatype.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if the string is not well-formed for
    /// the datatype, or if a required format is missing.
    #[allow(clippy::cast_precision_loss)]
    pub fn parse(datatype: Datatype, format: Option<&str>) -> Result<Option<Self>, Error> {
        let invalid = |format: &str, reason: &str| Error::InvalidFormat {
            datatype,
            format: format.to_string(),
            reason: reason.to_string(),
        };

        match (datatype, format) {
            (Datatype::Enum, None) => Err(invalid("", "enum properties require a value list")),
            (Datatype::Color, None) => Err(invalid("", "color properties require `rgb` or `hsv`")),
            (_, None) => Ok(None),
            (Datatype::Integer | Datatype::Float, Some(format)) => {
                let (min, max) = format
                    .split_once(':')
                    .ok_or_else(|| invalid(format, "expected `min:max`"))?;
                let bound = |part: &str| -> Result<Option<f64>, Error> {
                    let part = part.trim();
                    if part.is_empty() {
                        return Ok(None);
                    }
                    let value = if datatype == Datatype::Integer {
                        part.parse::<i64>().map(|v| v as f64).ok()
                    } else {
                        part.parse::<f64>().ok().filter(|v| v.is_finite())
                    };
                    value
                        .map(Some)
                        .ok_or_else(|| invalid(format, "range bounds must be numbers"))
                };
                let range = NumericRange::new(bound(min)?, bound(max)?);
                if let (Some(lo), Some(hi)) = (range.min, range.max)
                    && lo > hi
                {
                    return Err(invalid(format, "range minimum exceeds maximum"));
                }
                Ok(Some(Self::Range(range)))
            }
            (Datatype::Enum, Some(format)) => {
                let values: Vec<String> = format.split(',').map(str::to_string).collect();
                if values.iter().any(String::is_empty) {
                    return Err(invalid(format, "enum values must not be empty"));
                }
                Ok(Some(Self::Enum(values)))
            }
            (Datatype::Color, Some(format)) => format
                .parse::<ColorModel>()
                .map(|model| Some(Self::Color(model)))
                .map_err(|_| invalid(format, "color format must be `rgb` or `hsv`")),
            (_, Some(format)) => Ok(Some(Self::Text(format.to_string()))),
        }
    }

    /// Returns the numeric range, if this is a range format.
    #[must_use]
    pub fn range(&self) -> Option<&NumericRange> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }

    /// Returns the enum values, if this is an enum format.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[String]> {
        match self {
            Self::Enum(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the color model, if this is a color format.
    #[must_use]
    pub fn color_model(&self) -> Option<ColorModel> {
        match self {
            Self::Color(model) => Some(*model),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(range) => {
                if let Some(min) = range.min {
                    write!(f, "{min}")?;
                }
                f.write_str(":")?;
                if let Some(max) = range.max {
                    write!(f, "{max}")?;
                }
                Ok(())
            }
            Self::Enum(values) => f.write_str(&values.join(",")),
            Self::Color(model) => model.fmt(f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_range() {
        let format = PropertyFormat::parse(Datatype::Integer, Some("0:100"))
            .unwrap()
            .unwrap();
        let range = format.range().unwrap();
        assert!(range.check(0.0).is_ok());
        assert!(range.check(100.0).is_ok());
        assert!(range.check(150.0).is_err());
        assert_eq!(format.to_string(), "0:100");
    }

    #[test]
    fn open_ranges() {
        let format = PropertyFormat::parse(Datatype::Float, Some(":10.5"))
            .unwrap()
            .unwrap();
        let range = format.range().unwrap();
        assert_eq!(range.min(), None);
        assert!(range.check(-1e9).is_ok());
        assert!(range.check(10.6).is_err());
        assert_eq!(format.to_string(), ":10.5");
    }

    #[test]
    fn integer_range_requires_integers() {
        assert!(PropertyFormat::parse(Datatype::Integer, Some("0:1.5")).is_err());
        assert!(PropertyFormat::parse(Datatype::Float, Some("0:1.5")).is_ok());
    }

    #[test]
    fn malformed_ranges() {
        for format in ["100", "a:b", "10:0", "0:NaN"] {
            assert!(
                matches!(
                    PropertyFormat::parse(Datatype::Float, Some(format)),
                    Err(Error::InvalidFormat { .. })
                ),
                "{format} should be rejected"
            );
        }
    }

    #[test]
    fn enum_list() {
        let format = PropertyFormat::parse(Datatype::Enum, Some("low,medium,high"))
            .unwrap()
            .unwrap();
        assert_eq!(format.enum_values().unwrap(), ["low", "medium", "high"]);
        assert!(PropertyFormat::parse(Datatype::Enum, Some("a,,b")).is_err());
        assert!(PropertyFormat::parse(Datatype::Enum, None).is_err());
    }

    #[test]
    fn color_model() {
        let format = PropertyFormat::parse(Datatype::Color, Some("hsv"))
            .unwrap()
            .unwrap();
        assert_eq!(format.color_model(), Some(ColorModel::Hsv));
        assert!(PropertyFormat::parse(Datatype::Color, Some("r,g,b")).is_err());
        assert!(PropertyFormat::parse(Datatype::Color, None).is_err());
    }

    #[test]
    fn optional_formats() {
        assert_eq!(PropertyFormat::parse(Datatype::Integer, None).unwrap(), None);
        assert_eq!(
            PropertyFormat::parse(Datatype::String, Some("anything")).unwrap(),
            Some(PropertyFormat::Text("anything".to_string()))
        );
    }
}
