// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Homie properties.
//!
//! This module provides type-safe representations of the payloads carried
//! by Homie properties. Each type validates its range at construction time
//! and formats itself in the convention's wire representation.
//!
//! # Types
//!
//! - [`Datatype`] - The `$datatype` of a property
//! - [`PropertyFormat`] - The parsed `$format` of a property
//! - [`PropertyValue`] - A typed property value
//! - [`RgbColor`] / [`HsvColor`] - Color components
//! - [`HomieDateTime`] - ISO 8601 datetime
//! - [`HomieDuration`] - ISO 8601 duration
//! - [`Percent`] - Percentage (0-100)

mod color;
mod datatype;
mod datetime;
mod duration;
mod format;
mod percent;
mod value;

pub use color::{Color, ColorModel, HsvColor, RgbColor};
pub use datatype::Datatype;
pub use datetime::HomieDateTime;
pub use duration::HomieDuration;
pub use format::{NumericRange, PropertyFormat};
pub use percent::Percent;
pub use value::PropertyValue;
