// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device builder.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::id::Identifier;
use crate::node::Node;
use crate::topic;
use crate::transport::Transport;

use super::{BroadcastCallback, Device, DeviceConfig, Firmware};

/// Builder for creating a [`Device`].
///
/// # Examples
///
/// ```
/// use homie_device::{Device, DeviceConfig, Node};
/// use homie_device::transport::MemoryTransport;
///
/// let device = Device::builder("lamp", "Desk lamp", MemoryTransport::new())
///     .firmware("lamp-fw", "1.2.0")
///     .local_ip("192.168.1.20")
///     .mac("AA:BB:CC:DD:EE:FF")
///     .config(DeviceConfig::default())
///     .node(Node::new("light", "Light", "lamp").unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(device.topic(), "homie/lamp");
/// ```
pub struct DeviceBuilder<T: Transport> {
    id: String,
    name: String,
    config: DeviceConfig,
    firmware: Option<Firmware>,
    local_ip: Option<String>,
    mac: Option<String>,
    extensions: Vec<String>,
    nodes: Vec<Node>,
    on_broadcast: Option<BroadcastCallback>,
    transport: T,
}

impl<T: Transport> DeviceBuilder<T> {
    /// Creates a builder for a device with the given identifier and name,
    /// bound to `transport`.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, transport: T) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            config: DeviceConfig::default(),
            firmware: None,
            local_ip: None,
            mac: None,
            extensions: Vec::new(),
            nodes: Vec::new(),
            on_broadcast: None,
            transport,
        }
    }

    /// Sets the device configuration.
    #[must_use]
    pub fn config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the firmware name and version (`$fw/name`, `$fw/version`).
    #[must_use]
    pub fn firmware(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.firmware = Some(Firmware {
            name: name.into(),
            version: version.into(),
        });
        self
    }

    /// Sets the `$localip` attribute.
    #[must_use]
    pub fn local_ip(mut self, ip: impl Into<String>) -> Self {
        self.local_ip = Some(ip.into());
        self
    }

    /// Sets the `$mac` attribute.
    #[must_use]
    pub fn mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    /// Advertises an extension in `$extensions`.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    /// Adds a node.
    #[must_use]
    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Sets the callback receiving `(level, payload)` for every broadcast.
    #[must_use]
    pub fn on_broadcast<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_broadcast = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration and builds the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for a malformed device id,
    /// [`Error::InvalidBaseTopic`] if the base topic is empty, has empty
    /// levels or contains wildcards, or [`Error::DuplicateIdentifier`] if two
    /// nodes share an id.
    pub fn build(self) -> Result<Device<T>> {
        let id = Identifier::new(self.id)?;

        if !topic::is_valid_base(&self.config.base_topic) {
            return Err(Error::InvalidBaseTopic(self.config.base_topic));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if self.nodes[..index].iter().any(|n| n.id() == node.id()) {
                return Err(Error::DuplicateIdentifier {
                    kind: "node",
                    id: node.id().to_string(),
                });
            }
        }

        let topic = format!("{}/{id}", self.config.base_topic);
        tracing::debug!(device = %id, topic = %topic, nodes = self.nodes.len(), "Device built");

        Ok(Device {
            id,
            name: self.name,
            topic,
            config: self.config,
            firmware: self.firmware,
            local_ip: self.local_ip,
            mac: self.mac,
            extensions: self.extensions,
            nodes: self.nodes,
            on_broadcast: self.on_broadcast,
            transport: self.transport,
            state: super::DeviceState::Init,
            frozen: false,
            resume_pending: false,
            next_heartbeat: None,
        })
    }
}

impl<T: Transport> fmt::Debug for DeviceBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuilder")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    #[test]
    fn builder_defaults() {
        let device = DeviceBuilder::new("lamp", "Lamp", MemoryTransport::new())
            .build()
            .unwrap();
        assert_eq!(device.id(), "lamp");
        assert_eq!(device.name(), "Lamp");
        assert_eq!(device.topic(), "homie/lamp");
        assert_eq!(device.state(), super::super::DeviceState::Init);
        assert_eq!(device.nodes().count(), 0);
    }

    #[test]
    fn custom_base_topic() {
        let config = DeviceConfig {
            base_topic: "devices/home".to_string(),
            ..DeviceConfig::default()
        };
        let device = DeviceBuilder::new("lamp", "Lamp", MemoryTransport::new())
            .config(config)
            .build()
            .unwrap();
        assert_eq!(device.topic(), "devices/home/lamp");
    }

    #[test]
    fn rejects_invalid_device_id() {
        let err = DeviceBuilder::new("Lamp_1", "Lamp", MemoryTransport::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
    }

    #[test]
    fn rejects_duplicate_nodes() {
        let err = DeviceBuilder::new("lamp", "Lamp", MemoryTransport::new())
            .node(Node::new("light", "Light", "lamp").unwrap())
            .node(Node::new("light", "Other", "lamp").unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateIdentifier { kind: "node", .. }
        ));
    }

    #[test]
    fn rejects_invalid_base_topic() {
        for base in ["", "bad/#", "home/+", "/homie", "homie/", "a//b"] {
            let config = DeviceConfig {
                base_topic: base.to_string(),
                ..DeviceConfig::default()
            };
            let err = DeviceBuilder::new("lamp", "Lamp", MemoryTransport::new())
                .config(config)
                .build()
                .unwrap_err();
            assert!(
                matches!(err, Error::InvalidBaseTopic(ref topic) if topic == base),
                "{base:?}"
            );
        }
    }

    #[test]
    fn accepts_nested_base_topic() {
        let config = DeviceConfig {
            base_topic: "site/floor-1".to_string(),
            ..DeviceConfig::default()
        };
        let device = DeviceBuilder::new("lamp", "Lamp", MemoryTransport::new())
            .config(config)
            .build()
            .unwrap();
        assert_eq!(device.topic(), "site/floor-1/lamp");
    }
}
