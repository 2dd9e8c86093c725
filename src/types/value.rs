// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed property values and their wire coercion.

use std::fmt;
use std::time::Duration;

use crate::error::ValueError;

use super::{Color, Datatype, HomieDateTime, HomieDuration, HsvColor, Percent, PropertyFormat, RgbColor};

/// A typed property value.
///
/// The [`Display`](fmt::Display) implementation yields the canonical wire
/// payload.
///
/// # Examples
///
/// ```
/// use homie_device::types::{PropertyValue, RgbColor};
///
/// assert_eq!(PropertyValue::from(true).to_string(), "true");
/// assert_eq!(PropertyValue::from(42).to_string(), "42");
/// assert_eq!(PropertyValue::from(RgbColor::new(10, 20, 30)).to_string(), "10,20,30");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A float value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// One of the values of an enum format.
    Enum(String),
    /// A color value.
    Color(Color),
    /// A datetime value.
    DateTime(HomieDateTime),
    /// A duration value.
    Duration(HomieDuration),
}

impl PropertyValue {
    /// Returns the datatype this value belongs to.
    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        match self {
            Self::String(_) => Datatype::String,
            Self::Integer(_) => Datatype::Integer,
            Self::Float(_) => Datatype::Float,
            Self::Boolean(_) => Datatype::Boolean,
            Self::Enum(_) => Datatype::Enum,
            Self::Color(_) => Datatype::Color,
            Self::DateTime(_) => Datatype::DateTime,
            Self::Duration(_) => Datatype::Duration,
        }
    }

    /// Parses a wire payload into a value of `datatype`, honoring `format`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] describing why the payload was rejected.
    pub fn parse(
        datatype: Datatype,
        format: Option<&PropertyFormat>,
        payload: &str,
    ) -> Result<Self, ValueError> {
        let value = match datatype {
            Datatype::String => Self::String(payload.to_string()),
            Datatype::Integer => {
                let parsed = payload
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ValueError::NotANumber {
                        expected: "integer",
                        input: payload.to_string(),
                    })?;
                Self::Integer(parsed)
            }
            Datatype::Float => {
                let parsed = payload
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ValueError::NotANumber {
                        expected: "float",
                        input: payload.to_string(),
                    })?;
                Self::Float(parsed)
            }
            Datatype::Boolean => match payload.trim().to_lowercase().as_str() {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => return Err(ValueError::InvalidBoolean(payload.to_string())),
            },
            Datatype::Enum => Self::Enum(payload.to_string()),
            Datatype::Color => {
                let model = format
                    .and_then(PropertyFormat::color_model)
                    .unwrap_or(super::ColorModel::Rgb);
                Self::Color(model.parse_payload(payload)?)
            }
            Datatype::DateTime => Self::DateTime(payload.parse()?),
            Datatype::Duration => Self::Duration(payload.parse()?),
        };
        value.conform(datatype, format)
    }

    /// Checks a typed value against a datatype and format, converting it
    /// where the conversion is lossless.
    ///
    /// Integers are accepted by float properties, whole floats by integer
    /// properties, strings by enum properties, and colors are converted to
    /// the property's color model.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the value does not fit.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn conform(
        self,
        datatype: Datatype,
        format: Option<&PropertyFormat>,
    ) -> Result<Self, ValueError> {
        let mismatch = |actual: Datatype| ValueError::TypeMismatch {
            expected: datatype,
            actual,
        };

        let value = match (datatype, self) {
            (Datatype::Integer, Self::Integer(v)) => Self::Integer(v),
            (Datatype::Integer, Self::Float(v)) if v.fract() == 0.0 && v.is_finite() => {
                Self::Integer(v as i64)
            }
            (Datatype::Float, Self::Float(v)) if v.is_finite() => Self::Float(v),
            (Datatype::Float, Self::Integer(v)) => Self::Float(v as f64),
            (Datatype::Enum, Self::Enum(v) | Self::String(v)) => Self::Enum(v),
            (Datatype::Color, Self::Color(color)) => {
                let model = format
                    .and_then(PropertyFormat::color_model)
                    .unwrap_or_else(|| color.model());
                Self::Color(color.to_model(model))
            }
            (expected, value) if value.datatype() == expected => value,
            (_, value) => return Err(mismatch(value.datatype())),
        };

        match (&value, format) {
            (Self::Integer(v), Some(PropertyFormat::Range(range))) => range.check(*v as f64)?,
            (Self::Float(v), Some(PropertyFormat::Range(range))) => range.check(*v)?,
            (Self::Enum(v), Some(PropertyFormat::Enum(allowed))) => {
                if !allowed.contains(v) {
                    return Err(ValueError::NotInEnum {
                        input: v.clone(),
                        allowed: allowed.join(","),
                    });
                }
            }
            _ => {}
        }
        Ok(value)
    }

    /// Returns the string, if this is a string or enum value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number as a float, if this is a numeric value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the color, if this is a color value.
    #[must_use]
    pub const fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the RGB color, if this is a color value in the RGB model.
    #[must_use]
    pub const fn as_rgb(&self) -> Option<RgbColor> {
        match self {
            Self::Color(Color::Rgb(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns the HSV color, if this is a color value in the HSV model.
    #[must_use]
    pub const fn as_hsv(&self) -> Option<HsvColor> {
        match self {
            Self::Color(Color::Hsv(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns the datetime, if this is a datetime value.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<HomieDateTime> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the duration, if this is a duration value.
    #[must_use]
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(v) => Some(v.as_duration()),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) | Self::Enum(v) => f.write_str(v),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Color(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Duration(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<RgbColor> for PropertyValue {
    fn from(value: RgbColor) -> Self {
        Self::Color(Color::Rgb(value))
    }
}

impl From<HsvColor> for PropertyValue {
    fn from(value: HsvColor) -> Self {
        Self::Color(Color::Hsv(value))
    }
}

impl From<HomieDateTime> for PropertyValue {
    fn from(value: HomieDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<chrono::NaiveDateTime> for PropertyValue {
    fn from(value: chrono::NaiveDateTime) -> Self {
        Self::DateTime(value.into())
    }
}

impl From<HomieDuration> for PropertyValue {
    fn from(value: HomieDuration) -> Self {
        Self::Duration(value)
    }
}

impl From<Duration> for PropertyValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value.into())
    }
}

impl From<Percent> for PropertyValue {
    fn from(value: Percent) -> Self {
        Self::Float(value.value())
    }
}
