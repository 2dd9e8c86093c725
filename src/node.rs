// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Homie nodes.

use crate::error::{Error, Result};
use crate::id::Identifier;
use crate::property::Property;

/// A logical group of properties on a device.
///
/// Properties keep their registration order, which is also the order of
/// the `$properties` attribute and of the announce.
///
/// # Examples
///
/// ```
/// use homie_device::{Node, recipes};
///
/// let mut light = Node::new("light", "Ceiling light", "lamp").unwrap();
/// light.add_property(recipes::boolean("power").build().unwrap()).unwrap();
/// light.add_property(recipes::rgb("color").build().unwrap()).unwrap();
///
/// assert_eq!(light.property_ids(), "power,color");
/// assert!(light.property("brightness").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Node {
    id: Identifier,
    name: String,
    node_type: String,
    properties: Vec<Property>,
    frozen: bool,
}

impl Node {
    /// Creates an empty node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `id` is not a legal identifier.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: Identifier::new(id)?,
            name: name.into(),
            node_type: node_type.into(),
            properties: Vec::new(),
            frozen: false,
        })
    }

    /// Returns the node identifier.
    #[must_use]
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Returns the human friendly name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node type.
    #[must_use]
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Registers a property.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateIdentifier`] if a property with the same id
    /// exists, or [`Error::TopologyFrozen`] once the owning device has been
    /// announced.
    pub fn add_property(&mut self, property: Property) -> Result<&mut Property> {
        if self.frozen {
            return Err(Error::TopologyFrozen);
        }
        if self.properties.iter().any(|p| p.id() == property.id()) {
            return Err(Error::DuplicateIdentifier {
                kind: "property",
                id: property.id().to_string(),
            });
        }
        tracing::debug!(node = %self.id, property = %property.id(), "Property registered");
        let index = self.properties.len();
        self.properties.push(property);
        Ok(&mut self.properties[index])
    }

    /// Looks up a property.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such property.
    pub fn property(&self, id: &str) -> Result<&Property> {
        self.properties
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| not_found(id))
    }

    /// Looks up a property for mutation.
    ///
    /// Values changed this way are not published; use
    /// [`Device::set_property`](crate::Device::set_property) for that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such property.
    pub fn property_mut(&mut self, id: &str) -> Result<&mut Property> {
        self.properties
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| not_found(id))
    }

    /// Returns the properties in registration order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the node has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns the `$properties` attribute value.
    #[must_use]
    pub fn property_ids(&self) -> String {
        self.properties
            .iter()
            .map(|p| p.id().as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns whether the property set can still change.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns the `$` attributes in announce order.
    pub(crate) fn attributes(&self) -> [(&'static str, String); 3] {
        [
            ("name", self.name.clone()),
            ("type", self.node_type.clone()),
            ("properties", self.property_ids()),
        ]
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound {
        kind: "property",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes;

    fn light() -> Node {
        Node::new("light", "Light", "lamp").unwrap()
    }

    #[test]
    fn rejects_invalid_id() {
        assert!(matches!(
            Node::new("Light", "Light", "lamp"),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn keeps_registration_order() {
        let mut node = light();
        node.add_property(recipes::rgb("color").build().unwrap())
            .unwrap();
        node.add_property(recipes::boolean("power").build().unwrap())
            .unwrap();
        let ids: Vec<&str> = node.properties().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, ["color", "power"]);
        assert_eq!(node.property_ids(), "color,power");
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn rejects_duplicate_property() {
        let mut node = light();
        node.add_property(recipes::boolean("power").build().unwrap())
            .unwrap();
        let err = node
            .add_property(recipes::boolean("power").build().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateIdentifier { kind: "property", ref id } if id == "power"
        ));
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn lookup() {
        let mut node = light();
        node.add_property(recipes::boolean("power").build().unwrap())
            .unwrap();
        assert_eq!(node.property("power").unwrap().id(), "power");
        assert!(matches!(
            node.property("color"),
            Err(Error::NotFound { kind: "property", .. })
        ));
        node.property_mut("power").unwrap().set(true).unwrap();
        assert_eq!(node.property("power").unwrap().payload().as_deref(), Some("true"));
    }

    #[test]
    fn frozen_node_rejects_properties() {
        let mut node = light();
        node.freeze();
        let err = node
            .add_property(recipes::boolean("power").build().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::TopologyFrozen));
        assert!(node.is_empty());
    }

    #[test]
    fn attributes_in_announce_order() {
        let mut node = light();
        node.add_property(recipes::boolean("power").build().unwrap())
            .unwrap();
        assert_eq!(
            node.attributes(),
            [
                ("name", "Light".to_string()),
                ("type", "lamp".to_string()),
                ("properties", "power".to_string()),
            ]
        );
    }
}
