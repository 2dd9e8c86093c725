// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Homie properties.
//!
//! A [`Property`] is a typed leaf of the topology. It is created with a
//! [`PropertyBuilder`] (directly or through one of the [`recipes`](crate::recipes))
//! and validated once at build time: the identifier, the `$format` for its
//! datatype and the initial value must all be well-formed.
//!
//! # Examples
//!
//! ```
//! use homie_device::{Property, SetOrigin};
//! use homie_device::types::Datatype;
//!
//! let mut level = Property::builder("level", Datatype::Integer)
//!     .name("Level")
//!     .format("0:100")
//!     .settable(true)
//!     .build()
//!     .unwrap();
//!
//! level.set_value("42", SetOrigin::Remote).unwrap();
//! assert_eq!(level.payload().as_deref(), Some("42"));
//!
//! assert!(level.set_value("150", SetOrigin::Remote).is_err());
//! assert_eq!(level.payload().as_deref(), Some("42"));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::id::Identifier;
use crate::types::{Datatype, PropertyFormat, PropertyValue};

/// Callback invoked with the new value after a successful remote set.
pub type SetCallback = Arc<dyn Fn(&PropertyValue) + Send + Sync>;

/// Where a value change comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOrigin {
    /// The embedding program. Always allowed.
    Local,
    /// A `.../set` command from the broker. Only allowed on settable
    /// properties.
    Remote,
}

/// A single typed attribute of a node.
#[derive(Clone)]
pub struct Property {
    id: Identifier,
    name: String,
    datatype: Datatype,
    format: Option<PropertyFormat>,
    unit: Option<String>,
    settable: bool,
    retained: bool,
    value: Option<PropertyValue>,
    on_set: Option<SetCallback>,
}

impl Property {
    /// Creates a builder for a property of the given datatype.
    #[must_use]
    pub fn builder(id: impl Into<String>, datatype: Datatype) -> PropertyBuilder {
        PropertyBuilder::new(id, datatype)
    }

    /// Returns the property identifier.
    #[must_use]
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Returns the human friendly name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the datatype.
    #[must_use]
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Returns the parsed format.
    #[must_use]
    pub fn format(&self) -> Option<&PropertyFormat> {
        self.format.as_ref()
    }

    /// Returns the unit.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Returns whether the property accepts remote commands.
    #[must_use]
    pub fn is_settable(&self) -> bool {
        self.settable
    }

    /// Returns whether the value is published as a retained message.
    #[must_use]
    pub fn is_retained(&self) -> bool {
        self.retained
    }

    /// Returns the current value, if one was set.
    #[must_use]
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// Returns the current value in its wire form.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        self.value.as_ref().map(ToString::to_string)
    }

    /// Parses a wire payload and stores it.
    ///
    /// Remote sets on non-settable properties are refused, and a successful
    /// remote set invokes the `on_set` callback. On any error the stored
    /// value is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSettable`] for a remote set on a read-only
    /// property, or [`Error::Value`] if the payload does not fit the
    /// datatype and format.
    pub fn set_value(&mut self, raw: &str, origin: SetOrigin) -> Result<&PropertyValue> {
        if origin == SetOrigin::Remote && !self.settable {
            return Err(Error::NotSettable(self.id.to_string()));
        }
        let value = PropertyValue::parse(self.datatype, self.format.as_ref(), raw)?;
        Ok(self.store(value, origin))
    }

    /// Stores a typed value set locally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the value does not fit the datatype and
    /// format.
    pub fn set(&mut self, value: impl Into<PropertyValue>) -> Result<&PropertyValue> {
        let value = value
            .into()
            .conform(self.datatype, self.format.as_ref())?;
        Ok(self.store(value, SetOrigin::Local))
    }

    /// Replaces the callback invoked after successful remote sets.
    pub fn on_set<F>(&mut self, callback: F)
    where
        F: Fn(&PropertyValue) + Send + Sync + 'static,
    {
        self.on_set = Some(Arc::new(callback));
    }

    /// Returns the `$` attributes in announce order.
    pub(crate) fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("name", self.name.clone()),
            ("datatype", self.datatype.to_string()),
            ("settable", self.settable.to_string()),
            ("retained", self.retained.to_string()),
        ];
        if let Some(unit) = &self.unit {
            attributes.push(("unit", unit.clone()));
        }
        if let Some(format) = &self.format {
            attributes.push(("format", format.to_string()));
        }
        attributes
    }

    fn store(&mut self, value: PropertyValue, origin: SetOrigin) -> &PropertyValue {
        tracing::debug!(property = %self.id, value = %value, ?origin, "Property value changed");
        let stored: &PropertyValue = self.value.insert(value);
        if origin == SetOrigin::Remote
            && let Some(callback) = &self.on_set
        {
            callback(stored);
        }
        stored
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("datatype", &self.datatype)
            .field("format", &self.format)
            .field("unit", &self.unit)
            .field("settable", &self.settable)
            .field("retained", &self.retained)
            .field("value", &self.value)
            .field("on_set", &self.on_set.is_some())
            .finish()
    }
}

/// Builder for [`Property`].
///
/// Defaults: name equal to the identifier, not settable, retained, no unit,
/// no format, no value.
#[derive(Clone)]
pub struct PropertyBuilder {
    id: String,
    name: Option<String>,
    datatype: Datatype,
    format: Option<String>,
    unit: Option<String>,
    settable: bool,
    retained: bool,
    value: Option<PropertyValue>,
    on_set: Option<SetCallback>,
}

impl PropertyBuilder {
    /// Creates a builder for a property of the given datatype.
    #[must_use]
    pub fn new(id: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            id: id.into(),
            name: None,
            datatype,
            format: None,
            unit: None,
            settable: false,
            retained: true,
            value: None,
            on_set: None,
        }
    }

    /// Sets the human friendly name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Changes the datatype.
    #[must_use]
    pub fn datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = datatype;
        self
    }

    /// Sets the `$format` attribute.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the `$unit` attribute.
    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets whether remote commands are accepted.
    #[must_use]
    pub fn settable(mut self, settable: bool) -> Self {
        self.settable = settable;
        self
    }

    /// Sets whether the value is retained by the broker.
    #[must_use]
    pub fn retained(mut self, retained: bool) -> Self {
        self.retained = retained;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the callback invoked after successful remote sets.
    #[must_use]
    pub fn on_set<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PropertyValue) + Send + Sync + 'static,
    {
        self.on_set = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration and builds the property.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for a malformed id,
    /// [`Error::InvalidFormat`] for a format that does not suit the
    /// datatype, or [`Error::Value`] if the initial value does not fit.
    pub fn build(self) -> Result<Property> {
        let id = Identifier::new(self.id)?;
        let format = PropertyFormat::parse(self.datatype, self.format.as_deref())?;
        let value = self
            .value
            .map(|value| value.conform(self.datatype, format.as_ref()))
            .transpose()?;

        Ok(Property {
            name: self.name.unwrap_or_else(|| id.to_string()),
            id,
            datatype: self.datatype,
            format,
            unit: self.unit,
            settable: self.settable,
            retained: self.retained,
            value,
            on_set: self.on_set,
        })
    }
}

impl fmt::Debug for PropertyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBuilder")
            .field("id", &self.id)
            .field("datatype", &self.datatype)
            .field("format", &self.format)
            .field("settable", &self.settable)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
