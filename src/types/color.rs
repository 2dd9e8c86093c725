// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color values for `color` properties.
//!
//! Homie transmits colors as three comma-separated integers. The `$format`
//! attribute of the property selects the color model:
//!
//! - `rgb`: red, green, blue, each 0-255
//! - `hsv`: hue 0-360, saturation 0-100, value 0-100

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Color model advertised in a color property's `$format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// Red, green, blue.
    Rgb,
    /// Hue, saturation, value.
    Hsv,
}

impl ColorModel {
    /// Returns the `$format` representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Hsv => "hsv",
        }
    }

    /// Parses a wire payload in this color model.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidColor`] if the payload is malformed or a
    /// component is out of range for the model.
    pub fn parse_payload(&self, payload: &str) -> Result<Color, ValueError> {
        match self {
            Self::Rgb => payload.parse().map(Color::Rgb),
            Self::Hsv => payload.parse().map(Color::Hsv),
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorModel {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rgb" => Ok(Self::Rgb),
            "hsv" => Ok(Self::Hsv),
            other => Err(ValueError::InvalidColor {
                input: other.to_string(),
                reason: "color format must be `rgb` or `hsv`".to_string(),
            }),
        }
    }
}

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use homie_device::types::RgbColor;
///
/// let color: RgbColor = "10,20,30".parse().unwrap();
/// assert_eq!(color, RgbColor::new(10, 20, 30));
/// assert_eq!(color.to_string(), "10,20,30");
///
/// assert!("256,0,0".parse::<RgbColor>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Converts this color to the HSV model.
    ///
    /// Rounding means a round trip through HSV may not give back the exact
    /// same RGB values.
    #[must_use]
    pub fn to_hsv(&self) -> HsvColor {
        let (hue, saturation, value) = rgb_to_hsv(self.red, self.green, self.blue);
        HsvColor {
            hue,
            saturation,
            value,
        }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [r, g, b] = split_components(s)?;
        let channel = |value: u32| {
            u8::try_from(value).map_err(|_| ValueError::InvalidColor {
                input: s.to_string(),
                reason: format!("{value} is not in range [0, 255]"),
            })
        };
        Ok(Self::new(channel(r)?, channel(g)?, channel(b)?))
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<RgbColor> for (u8, u8, u8) {
    fn from(color: RgbColor) -> Self {
        (color.red, color.green, color.blue)
    }
}

/// HSV color (hue 0-360, saturation 0-100, value 0-100).
///
/// # Examples
///
/// ```
/// use homie_device::types::HsvColor;
///
/// let color = HsvColor::new(120, 100, 50).unwrap();
/// assert_eq!(color.to_string(), "120,100,50");
///
/// assert!(HsvColor::new(361, 0, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HsvColor {
    hue: u16,
    saturation: u8,
    value: u8,
}

impl HsvColor {
    /// Maximum hue in degrees.
    pub const MAX_HUE: u16 = 360;

    /// Maximum saturation and value.
    pub const MAX_LEVEL: u8 = 100;

    /// Creates a new HSV color.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidColor`] if a component is out of range.
    pub fn new(hue: u16, saturation: u8, value: u8) -> Result<Self, ValueError> {
        let input = || format!("{hue},{saturation},{value}");
        if hue > Self::MAX_HUE {
            return Err(ValueError::InvalidColor {
                input: input(),
                reason: format!("{hue} is not a valid hue"),
            });
        }
        for level in [saturation, value] {
            if level > Self::MAX_LEVEL {
                return Err(ValueError::InvalidColor {
                    input: input(),
                    reason: format!("{level} is not in range [0, 100]"),
                });
            }
        }
        Ok(Self {
            hue,
            saturation,
            value,
        })
    }

    /// Returns the hue in degrees.
    #[must_use]
    pub const fn hue(&self) -> u16 {
        self.hue
    }

    /// Returns the saturation percentage.
    #[must_use]
    pub const fn saturation(&self) -> u8 {
        self.saturation
    }

    /// Returns the value (brightness) percentage.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Converts this color to the RGB model.
    #[must_use]
    pub fn to_rgb(&self) -> RgbColor {
        let (r, g, b) = hsv_to_rgb(self.hue, self.saturation, self.value);
        RgbColor::new(r, g, b)
    }
}

impl fmt::Display for HsvColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.hue, self.saturation, self.value)
    }
}

impl FromStr for HsvColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [h, sat, val] = split_components(s)?;
        let out_of_range = |value: u32| ValueError::InvalidColor {
            input: s.to_string(),
            reason: format!("{value} is out of range"),
        };
        let hue = u16::try_from(h).map_err(|_| out_of_range(h))?;
        let saturation = u8::try_from(sat).map_err(|_| out_of_range(sat))?;
        let value = u8::try_from(val).map_err(|_| out_of_range(val))?;
        Self::new(hue, saturation, value).map_err(|err| match err {
            ValueError::InvalidColor { reason, .. } => ValueError::InvalidColor {
                input: s.to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// A color value in one of the two supported models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// RGB color.
    Rgb(RgbColor),
    /// HSV color.
    Hsv(HsvColor),
}

impl Color {
    /// Returns the color model of this value.
    #[must_use]
    pub const fn model(&self) -> ColorModel {
        match self {
            Self::Rgb(_) => ColorModel::Rgb,
            Self::Hsv(_) => ColorModel::Hsv,
        }
    }

    /// Converts the color to the given model.
    #[must_use]
    pub fn to_model(&self, model: ColorModel) -> Self {
        match (self, model) {
            (Self::Rgb(rgb), ColorModel::Hsv) => Self::Hsv(rgb.to_hsv()),
            (Self::Hsv(hsv), ColorModel::Rgb) => Self::Rgb(hsv.to_rgb()),
            _ => *self,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(rgb) => rgb.fmt(f),
            Self::Hsv(hsv) => hsv.fmt(f),
        }
    }
}

impl From<RgbColor> for Color {
    fn from(color: RgbColor) -> Self {
        Self::Rgb(color)
    }
}

impl From<HsvColor> for Color {
    fn from(color: HsvColor) -> Self {
        Self::Hsv(color)
    }
}

// Splits "a,b,c" into three unsigned components.
fn split_components(s: &str) -> Result<[u32; 3], ValueError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [a, b, c] = parts.as_slice() else {
        return Err(ValueError::InvalidColor {
            input: s.to_string(),
            reason: format!("expected 3 color elements, got {}", parts.len()),
        });
    };
    let parse = |part: &str| {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::InvalidColor {
                input: s.to_string(),
                reason: format!("{part:?} is not an unsigned integer"),
            });
        }
        part.parse::<u32>().map_err(|_| ValueError::InvalidColor {
            input: s.to_string(),
            reason: format!("{part:?} is too large"),
        })
    };
    Ok([parse(a)?, parse(b)?, parse(c)?])
}

/// Converts RGB values to HSV.
///
/// Returns (hue: 0-360, saturation: 0-100, value: 0-100)
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u16, u8, u8) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = (max * 100.0).round() as u8;

    let saturation = if max == 0.0 {
        0
    } else {
        ((delta / max) * 100.0).round() as u8
    };

    let hue = if delta < f32::EPSILON {
        0
    } else if (max - r).abs() < f32::EPSILON {
        let h = 60.0 * (((g - b) / delta) % 6.0);
        if h < 0.0 {
            (h + 360.0).round() as u16
        } else {
            h.round() as u16
        }
    } else if (max - g).abs() < f32::EPSILON {
        (60.0 * (((b - r) / delta) + 2.0)).round() as u16
    } else {
        (60.0 * (((r - g) / delta) + 4.0)).round() as u16
    };

    (hue, saturation, value)
}

/// Converts HSV values to RGB.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn hsv_to_rgb(h: u16, s: u8, v: u8) -> (u8, u8, u8) {
    let s = f32::from(s) / 100.0;
    let v = f32::from(v) / 100.0;
    let h = f32::from(h % 360);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_parse_and_format() {
        let color: RgbColor = "255,127,0".parse().unwrap();
        assert_eq!(color, RgbColor::new(255, 127, 0));
        assert_eq!(color.to_string(), "255,127,0");
    }

    #[test]
    fn rgb_parse_tolerates_spaces() {
        let color: RgbColor = "10, 20, 30".parse().unwrap();
        assert_eq!(<(u8, u8, u8)>::from(color), (10, 20, 30));
    }

    #[test]
    fn rgb_rejects_out_of_range() {
        assert!("355,0,0".parse::<RgbColor>().is_err());
        assert!("-1,0,0".parse::<RgbColor>().is_err());
    }

    #[test]
    fn rgb_rejects_wrong_arity() {
        let err = "1,2".parse::<RgbColor>().unwrap_err();
        assert!(err.to_string().contains("expected 3 color elements, got 2"));
        assert!("1,2,3,4".parse::<RgbColor>().is_err());
        assert!("".parse::<RgbColor>().is_err());
    }

    #[test]
    fn hsv_parse() {
        let color: HsvColor = "255,85,0".parse().unwrap();
        assert_eq!(color.hue(), 255);
        assert_eq!(color.saturation(), 85);
        assert_eq!(color.value(), 0);
    }

    #[test]
    fn hsv_rejects_out_of_range() {
        assert!("720,0,0".parse::<HsvColor>().is_err());
        assert!("0,-1,0".parse::<HsvColor>().is_err());
        assert!("0,0,101".parse::<HsvColor>().is_err());
        assert!("361,0,0".parse::<HsvColor>().is_err());
    }

    #[test]
    fn rgb_to_hsv_primary_colors() {
        assert_eq!(RgbColor::new(255, 0, 0).to_hsv(), HsvColor::new(0, 100, 100).unwrap());
        assert_eq!(RgbColor::new(0, 255, 0).to_hsv(), HsvColor::new(120, 100, 100).unwrap());
        assert_eq!(RgbColor::new(0, 0, 255).to_hsv(), HsvColor::new(240, 100, 100).unwrap());
        assert_eq!(RgbColor::new(0, 0, 0).to_hsv(), HsvColor::new(0, 0, 0).unwrap());
    }

    #[test]
    fn hsv_to_rgb_primary_colors() {
        assert_eq!(HsvColor::new(0, 100, 100).unwrap().to_rgb(), RgbColor::new(255, 0, 0));
        assert_eq!(HsvColor::new(120, 100, 100).unwrap().to_rgb(), RgbColor::new(0, 255, 0));
        assert_eq!(HsvColor::new(360, 100, 100).unwrap().to_rgb(), RgbColor::new(255, 0, 0));
        assert_eq!(HsvColor::new(0, 0, 100).unwrap().to_rgb(), RgbColor::new(255, 255, 255));
    }

    #[test]
    fn color_model_selects_parser() {
        let rgb = ColorModel::Rgb.parse_payload("300,0,0");
        assert!(rgb.is_err());
        let hsv = ColorModel::Hsv.parse_payload("300,0,0").unwrap();
        assert_eq!(hsv.model(), ColorModel::Hsv);
    }

    #[test]
    fn color_conversion_between_models() {
        let color = Color::Rgb(RgbColor::new(255, 0, 0));
        assert_eq!(
            color.to_model(ColorModel::Hsv),
            Color::Hsv(HsvColor::new(0, 100, 100).unwrap())
        );
        assert_eq!(color.to_model(ColorModel::Rgb), color);
    }

    #[test]
    fn color_model_from_format() {
        assert_eq!("rgb".parse::<ColorModel>().unwrap(), ColorModel::Rgb);
        assert_eq!("hsv".parse::<ColorModel>().unwrap(), ColorModel::Hsv);
        assert!("cmyk".parse::<ColorModel>().is_err());
    }
}
