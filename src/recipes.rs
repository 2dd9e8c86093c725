// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ready-made property configurations.
//!
//! Each recipe returns a [`PropertyBuilder`] preset for a common kind of
//! property; every preset can still be overridden before calling
//! [`build`](PropertyBuilder::build).
//!
//! | Recipe | Datatype | Format | Unit | Settable | Initial value |
//! |---|---|---|---|---|---|
//! | [`boolean`] | `boolean` | | | yes | `false` |
//! | [`percent`] | `float` | `0:100` | `%` | no | `0` |
//! | [`rgb`] | `color` | `rgb` | | yes | `0,0,0` |
//! | [`hsv`] | `color` | `hsv` | | yes | `0,0,0` |
//! | [`datetime`] | `datetime` | | | no | `2000-01-01T00:00:00` |
//! | [`duration`] | `duration` | | | no | `PT0S` |
//! | [`integer`] | `integer` | | | no | `0` |
//! | [`float`] | `float` | | | no | `0` |
//! | [`enumeration`] | `enum` | the values | | no | first value |
//!
//! # Examples
//!
//! ```
//! use homie_device::recipes;
//! use homie_device::types::Datatype;
//!
//! let brightness = recipes::percent("brightness")
//!     .datatype(Datatype::Integer)
//!     .settable(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(brightness.payload().as_deref(), Some("0"));
//! assert_eq!(brightness.unit(), Some("%"));
//! ```

use crate::property::PropertyBuilder;
use crate::types::{Datatype, HomieDateTime, HomieDuration, HsvColor, RgbColor};

/// An on/off switch.
#[must_use]
pub fn boolean(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Boolean)
        .settable(true)
        .value(false)
}

/// A percentage. Switch to [`Datatype::Integer`] with
/// [`PropertyBuilder::datatype`] for whole percents.
#[must_use]
pub fn percent(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Float)
        .unit("%")
        .format("0:100")
        .value(0)
}

/// A color in the RGB model.
#[must_use]
pub fn rgb(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Color)
        .format("rgb")
        .settable(true)
        .value(RgbColor::default())
}

/// A color in the HSV model.
#[must_use]
pub fn hsv(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Color)
        .format("hsv")
        .settable(true)
        .value(HsvColor::default())
}

/// An ISO 8601 date and time.
#[must_use]
pub fn datetime(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::DateTime).value(HomieDateTime::epoch_2000())
}

/// An ISO 8601 duration.
#[must_use]
pub fn duration(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Duration).value(HomieDuration::ZERO)
}

/// A whole number.
#[must_use]
pub fn integer(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Integer).value(0)
}

/// A floating point number.
#[must_use]
pub fn float(id: impl Into<String>) -> PropertyBuilder {
    PropertyBuilder::new(id, Datatype::Float).value(0.0)
}

/// One value out of a fixed list. The first value is the initial one.
#[must_use]
pub fn enumeration<S: AsRef<str>>(id: impl Into<String>, values: &[S]) -> PropertyBuilder {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    let builder = PropertyBuilder::new(id, Datatype::Enum).format(values.join(","));
    match values.first() {
        Some(first) => builder.value(*first),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::property::SetOrigin;
    use crate::types::{Color, PropertyValue};

    #[test]
    fn boolean_recipe() {
        let mut prop = boolean("power").build().unwrap();
        assert!(prop.is_settable());
        assert_eq!(prop.payload().as_deref(), Some("false"));

        prop.set_value("TRUE", SetOrigin::Remote).unwrap();
        assert_eq!(prop.value(), Some(&PropertyValue::Boolean(true)));
        assert!(prop.set_value("on", SetOrigin::Remote).is_err());
    }

    #[test]
    fn percent_recipe() {
        let mut prop = percent("level").settable(true).build().unwrap();
        assert_eq!(prop.datatype(), Datatype::Float);
        assert_eq!(prop.unit(), Some("%"));
        assert_eq!(prop.payload().as_deref(), Some("0"));

        prop.set_value("55.5", SetOrigin::Remote).unwrap();
        assert!(prop.set_value("100.5", SetOrigin::Remote).is_err());
        assert!(prop.set_value("-1", SetOrigin::Remote).is_err());
        assert_eq!(prop.payload().as_deref(), Some("55.5"));
    }

    #[test]
    fn percent_recipe_as_integer() {
        let mut prop = percent("level")
            .datatype(Datatype::Integer)
            .settable(true)
            .build()
            .unwrap();
        assert_eq!(prop.value(), Some(&PropertyValue::Integer(0)));
        assert!(prop.set_value("50.5", SetOrigin::Remote).is_err());
        prop.set_value("50", SetOrigin::Remote).unwrap();
    }

    #[test]
    fn percent_recipe_rejects_non_numeric_datatype() {
        let err = percent("level")
            .datatype(Datatype::String)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Value(_)));
    }

    #[test]
    fn rgb_round_trip() {
        let mut prop = rgb("color").build().unwrap();
        assert_eq!(prop.payload().as_deref(), Some("0,0,0"));

        prop.set(RgbColor::new(10, 20, 30)).unwrap();
        assert_eq!(prop.payload().as_deref(), Some("10,20,30"));

        prop.set_value("40,50,60", SetOrigin::Remote).unwrap();
        assert_eq!(
            prop.value().and_then(PropertyValue::as_rgb),
            Some(RgbColor::new(40, 50, 60))
        );
        assert!(prop.set_value("256,0,0", SetOrigin::Remote).is_err());
        assert!(prop.set_value("1,2", SetOrigin::Remote).is_err());
    }

    #[test]
    fn hsv_recipe_validates_components() {
        let mut prop = hsv("color").build().unwrap();
        prop.set_value("360,100,100", SetOrigin::Remote).unwrap();
        assert!(prop.set_value("361,0,0", SetOrigin::Remote).is_err());
        assert!(prop.set_value("0,101,0", SetOrigin::Remote).is_err());
        assert_eq!(prop.payload().as_deref(), Some("360,100,100"));
    }

    #[test]
    fn hsv_recipe_converts_rgb_values() {
        let mut prop = hsv("color").build().unwrap();
        prop.set(RgbColor::new(255, 0, 0)).unwrap();
        assert!(matches!(
            prop.value(),
            Some(PropertyValue::Color(Color::Hsv(_)))
        ));
        assert_eq!(prop.payload().as_deref(), Some("0,100,100"));
    }

    #[test]
    fn datetime_recipe() {
        let mut prop = datetime("last-seen").build().unwrap();
        assert_eq!(prop.payload().as_deref(), Some("2000-01-01T00:00:00"));

        prop.set_value("2024-03-01T12:30:00Z", SetOrigin::Local).unwrap();
        assert_eq!(prop.payload().as_deref(), Some("2024-03-01T12:30:00Z"));
        assert!(prop.set_value("yesterday", SetOrigin::Local).is_err());
    }

    #[test]
    fn duration_recipe() {
        let mut prop = duration("uptime").build().unwrap();
        assert_eq!(prop.payload().as_deref(), Some("PT0S"));

        prop.set(std::time::Duration::from_secs(3723)).unwrap();
        assert_eq!(prop.payload().as_deref(), Some("PT1H2M3S"));
    }

    #[test]
    fn numeric_recipes() {
        assert_eq!(integer("count").build().unwrap().payload().as_deref(), Some("0"));
        assert_eq!(float("ratio").build().unwrap().payload().as_deref(), Some("0"));
    }

    #[test]
    fn enumeration_recipe() {
        let mut prop = enumeration("mode", &["low", "medium", "high"])
            .settable(true)
            .build()
            .unwrap();
        assert_eq!(prop.payload().as_deref(), Some("low"));

        prop.set_value("high", SetOrigin::Remote).unwrap();
        assert!(prop.set_value("turbo", SetOrigin::Remote).is_err());
        assert_eq!(prop.payload().as_deref(), Some("high"));
    }

    #[test]
    fn empty_enumeration_is_rejected() {
        let values: [&str; 0] = [];
        assert!(enumeration("mode", &values).build().is_err());
    }
}
