// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Homie device: lifecycle, announce and command routing.
//!
//! A [`Device`] owns its nodes and its transport. It never spawns a task:
//! the embedding program calls [`Device::tick`] repeatedly to drain inbound
//! messages and to keep the heartbeat going.
//!
//! # Lifecycle
//!
//! 1. Build the device and register nodes and properties.
//! 2. [`Device::start`] connects with `$state=lost` as last-will, subscribes
//!    to `<device>/+/+/set`, publishes every attribute and value, then
//!    `$state=ready`. The topology is frozen from here on.
//! 3. Call [`Device::tick`] in a loop.
//! 4. [`Device::stop`] publishes `$state=disconnected` and disconnects.
//!
//! If the transport reports a dropped connection the device moves to
//! `lost` without publishing; when the transport reconnects the device
//! announces itself again and returns to `ready`.
//!
//! # Examples
//!
//! ```
//! use homie_device::{Device, DeviceState, Node, recipes};
//! use homie_device::transport::MemoryTransport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> homie_device::Result<()> {
//! let transport = MemoryTransport::new();
//! let mut device = Device::new("lamp", "Desk lamp", transport.clone())?;
//!
//! let mut light = Node::new("light", "Light", "lamp")?;
//! light.add_property(recipes::boolean("power").name("Power").build()?)?;
//! device.add_node(light)?;
//!
//! device.start().await?;
//! assert_eq!(device.state(), DeviceState::Ready);
//!
//! transport.push_message("homie/lamp/light/power/set", "true");
//! device.tick().await?;
//! assert_eq!(transport.last_payload("homie/lamp/light/power").as_deref(), Some("true"));
//!
//! device.stop().await?;
//! assert_eq!(device.state(), DeviceState::Disconnected);
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod state;

pub use builder::DeviceBuilder;
pub use config::{DeviceConfig, HeartbeatConfig, TimeUnit};
pub use state::DeviceState;

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::id::Identifier;
use crate::node::Node;
use crate::property::SetOrigin;
use crate::topic::{self, Inbound};
use crate::transport::{LastWill, Transport, TransportEvent};
use crate::types::PropertyValue;

/// Version of the convention announced in `$homie`.
pub const HOMIE_VERSION: &str = "4.0.0";

/// Extension advertised when firmware or network attributes are set.
pub const LEGACY_FIRMWARE_EXTENSION: &str = "org.homie.legacy-firmware:0.1.1:[4.x]";

/// Callback receiving `(level, payload)` for each broadcast message.
pub type BroadcastCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Firmware attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Firmware {
    /// `$fw/name`.
    pub(crate) name: String,
    /// `$fw/version`.
    pub(crate) version: String,
}

/// A single outbound message of the announce.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Outgoing {
    topic: String,
    payload: String,
    retained: bool,
}

/// A Homie device bound to a transport.
pub struct Device<T: Transport> {
    id: Identifier,
    name: String,
    topic: String,
    config: DeviceConfig,
    firmware: Option<Firmware>,
    local_ip: Option<String>,
    mac: Option<String>,
    extensions: Vec<String>,
    nodes: Vec<Node>,
    on_broadcast: Option<BroadcastCallback>,
    transport: T,
    state: DeviceState,
    frozen: bool,
    resume_pending: bool,
    next_heartbeat: Option<Instant>,
}

impl<T: Transport> Device<T> {
    /// Creates a builder for a device bound to `transport`.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        transport: T,
    ) -> DeviceBuilder<T> {
        DeviceBuilder::new(id, name, transport)
    }

    /// Creates a device with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `id` is not a legal identifier.
    pub fn new(id: impl Into<String>, name: impl Into<String>, transport: T) -> Result<Self> {
        DeviceBuilder::new(id, name, transport).build()
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Returns the human friendly name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device topic, `<base>/<id>`.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns whether the topology can still change.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen || self.state != DeviceState::Init
    }

    /// Returns the nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Registers a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TopologyFrozen`] once the device has left `init`, or
    /// [`Error::DuplicateIdentifier`] if a node with the same id exists.
    pub fn add_node(&mut self, node: Node) -> Result<&mut Node> {
        if self.is_frozen() {
            return Err(Error::TopologyFrozen);
        }
        if self.nodes.iter().any(|n| n.id() == node.id()) {
            return Err(Error::DuplicateIdentifier {
                kind: "node",
                id: node.id().to_string(),
            });
        }
        tracing::debug!(device = %self.id, node = %node.id(), "Node registered");
        let index = self.nodes.len();
        self.nodes.push(node);
        Ok(&mut self.nodes[index])
    }

    /// Looks up a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such node.
    pub fn node(&self, id: &str) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|n| n.id() == id)
            .ok_or_else(|| node_not_found(id))
    }

    /// Looks up a node for mutation. Once the device has been announced the
    /// node refuses new properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such node.
    pub fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| node_not_found(id))
    }

    /// Sets the callback receiving `(level, payload)` for every broadcast.
    pub fn on_broadcast<F>(&mut self, callback: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_broadcast = Some(Arc::new(callback));
    }

    /// Connects, announces the topology and moves to `ready`.
    ///
    /// Allowed from `init` and, to restart a stopped device, from
    /// `disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] from any other state, or
    /// [`Error::Transport`] if connecting, subscribing or publishing fails.
    /// In the latter case the transport is disconnected again and the state
    /// is unchanged.
    pub async fn start(&mut self) -> Result<()> {
        if !matches!(self.state, DeviceState::Init | DeviceState::Disconnected) {
            return Err(Error::InvalidStateTransition {
                from: self.state,
                to: DeviceState::Ready,
            });
        }

        tracing::debug!(device = %self.id, "Connecting");
        let will = self.last_will();
        self.transport.connect(&will).await?;

        if let Err(e) = self.go_online().await {
            if let Err(disconnect_err) = self.transport.disconnect().await {
                tracing::warn!(
                    device = %self.id,
                    error = %disconnect_err,
                    "Failed to disconnect after a failed start"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Publishes `$state=disconnected` and disconnects.
    ///
    /// Safe to call from any state and any number of times; the device
    /// always ends in `disconnected`. The state publish is best effort and
    /// is skipped when the connection is already lost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the transport fails to disconnect.
    /// The state is `disconnected` regardless.
    pub async fn stop(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = DeviceState::Disconnected;
        self.next_heartbeat = None;
        self.resume_pending = false;

        match previous {
            DeviceState::Disconnected => {
                tracing::debug!(device = %self.id, "Already disconnected");
                return Ok(());
            }
            DeviceState::Init => {
                tracing::debug!(device = %self.id, "Stopped before start");
                return Ok(());
            }
            DeviceState::Lost => {}
            DeviceState::Ready | DeviceState::Alert | DeviceState::Sleeping => {
                let state_topic = topic::attribute(&self.topic, "state");
                if let Err(e) = self
                    .publish(&state_topic, DeviceState::Disconnected.as_str(), true)
                    .await
                {
                    tracing::warn!(device = %self.id, error = %e, "Failed to publish disconnected state");
                }
                for filter in self.filters() {
                    if let Err(e) = self.transport.unsubscribe(&filter).await {
                        tracing::warn!(device = %self.id, filter = %filter, error = %e, "Failed to unsubscribe");
                    }
                }
            }
        }

        let result = self.transport.disconnect().await;
        tracing::info!(device = %self.id, from = %previous, "Device disconnected");
        result.map_err(Error::from)
    }

    /// Changes the published state while online.
    ///
    /// `ready`, `alert` and `sleeping` may be set from any of those three;
    /// `disconnected` is the same as [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] for other transitions, or
    /// [`Error::Transport`] if the publish fails (the state is then
    /// unchanged).
    pub async fn set_state(&mut self, state: DeviceState) -> Result<()> {
        match state {
            DeviceState::Disconnected => self.stop().await,
            DeviceState::Ready | DeviceState::Alert | DeviceState::Sleeping
                if self.state.is_online() =>
            {
                let state_topic = topic::attribute(&self.topic, "state");
                self.publish(&state_topic, state.as_str(), true).await?;
                tracing::debug!(device = %self.id, from = %self.state, to = %state, "State changed");
                self.state = state;
                Ok(())
            }
            to => Err(Error::InvalidStateTransition {
                from: self.state,
                to,
            }),
        }
    }

    /// Drains pending transport events and runs the heartbeat.
    ///
    /// Handles at most `max_messages_per_tick` events. Invalid commands are
    /// logged and dropped. Returns the number of events handled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if polling fails, or if re-announcing
    /// after a reconnection or publishing the heartbeat fails. A failed
    /// re-announce is retried on the next tick while the connection holds.
    pub async fn tick(&mut self) -> Result<usize> {
        let limit = self.config.max_messages_per_tick.max(1);
        let mut handled = 0;

        while handled < limit {
            let Some(event) = self.transport.poll().await? else {
                break;
            };
            handled += 1;

            match event {
                TransportEvent::Message { topic, payload } => {
                    if let Err(e) = self.handle_message(&topic, &payload).await {
                        tracing::warn!(
                            device = %self.id,
                            topic = %topic,
                            payload = %payload,
                            error = %e,
                            "Dropping inbound message"
                        );
                    }
                }
                TransportEvent::ConnectionLost => self.connection_lost(),
                TransportEvent::Connected => self.reconnected().await?,
            }
        }

        if self.resume_pending && self.state == DeviceState::Lost {
            self.resume().await?;
        }

        if self.state.is_online()
            && self
                .next_heartbeat
                .is_some_and(|due| Instant::now() >= due)
        {
            self.heartbeat().await?;
        }

        Ok(handled)
    }

    /// Handles one inbound message.
    ///
    /// [`tick`](Self::tick) calls this for every message and only logs the
    /// error; it is public for programs that receive messages themselves.
    ///
    /// # Errors
    ///
    /// - [`Error::TopicNotFound`] if the topic is not a command or broadcast
    ///   for this device, or names an unknown node or property
    /// - [`Error::NotAccepting`] if the device is not online
    /// - [`Error::NotSettable`] if the property is read-only
    /// - [`Error::Value`] if the payload does not fit the property
    /// - [`Error::Transport`] if republishing the value fails
    pub async fn handle_message(&mut self, topic: &str, payload: &str) -> Result<()> {
        match Inbound::parse(&self.config.base_topic, &self.topic, topic) {
            Some(Inbound::Command { node, property }) => {
                self.handle_command(topic, node, property, payload).await
            }
            Some(Inbound::Broadcast { level }) => {
                tracing::debug!(device = %self.id, level = %level, payload = %payload, "Broadcast received");
                if let Some(callback) = &self.on_broadcast {
                    callback(level, payload);
                }
                Ok(())
            }
            None => Err(Error::TopicNotFound(topic.to_string())),
        }
    }

    /// Stores a value set by the program and publishes it when online.
    ///
    /// While offline the value is only stored; it goes out with the next
    /// announce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown node or property,
    /// [`Error::Value`] if the value does not fit, or [`Error::Transport`]
    /// if the publish fails.
    pub async fn set_property(
        &mut self,
        node: &str,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let prop = self.node_mut(node)?.property_mut(property)?;
        let payload = prop.set(value)?.to_string();
        let retained = prop.is_retained();

        if self.state.is_online() {
            let value_topic = topic::join(&[self.topic.as_str(), node, property]);
            self.publish(&value_topic, &payload, retained).await?;
        } else {
            tracing::debug!(
                device = %self.id,
                node = %node,
                property = %property,
                state = %self.state,
                "Value stored while offline"
            );
        }
        Ok(())
    }

    /// Republishes `$state` and schedules the next heartbeat. Does nothing
    /// while offline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the publish fails.
    pub async fn heartbeat(&mut self) -> Result<()> {
        if !self.state.is_online() {
            return Ok(());
        }
        let state_topic = topic::attribute(&self.topic, "state");
        self.publish(&state_topic, self.state.as_str(), true).await?;
        self.schedule_heartbeat();
        Ok(())
    }

    fn last_will(&self) -> LastWill {
        LastWill {
            topic: topic::attribute(&self.topic, "state"),
            payload: DeviceState::Lost.as_str().to_string(),
            retained: true,
            qos: self.config.qos,
        }
    }

    fn filters(&self) -> Vec<String> {
        let mut filters = vec![topic::command_filter(&self.topic)];
        if self.config.subscribe_broadcast {
            filters.push(topic::broadcast_filter(&self.config.base_topic));
        }
        filters
    }

    async fn go_online(&mut self) -> Result<()> {
        for filter in self.filters() {
            self.transport.subscribe(&filter, self.config.qos).await?;
            tracing::debug!(device = %self.id, filter = %filter, "Subscribed");
        }
        self.announce().await
    }

    async fn announce(&mut self) -> Result<()> {
        for message in self.announcement() {
            self.publish(&message.topic, &message.payload, message.retained)
                .await?;
        }

        self.frozen = true;
        for node in &mut self.nodes {
            node.freeze();
        }
        self.state = DeviceState::Ready;
        self.schedule_heartbeat();
        tracing::info!(device = %self.id, nodes = self.nodes.len(), "Device ready");
        Ok(())
    }

    /// Every message of the announce, in publish order, ending with
    /// `$state=ready`.
    fn announcement(&self) -> Vec<Outgoing> {
        let attribute = |prefix: &str, name: &str, payload: String| Outgoing {
            topic: topic::attribute(prefix, name),
            payload,
            retained: true,
        };

        let mut messages: Vec<Outgoing> = self
            .device_attributes()
            .into_iter()
            .map(|(name, payload)| attribute(&self.topic, name, payload))
            .collect();

        for node in &self.nodes {
            let node_topic = topic::join(&[self.topic.as_str(), node.id().as_str()]);
            messages.extend(
                node.attributes()
                    .into_iter()
                    .map(|(name, payload)| attribute(&node_topic, name, payload)),
            );

            for property in node.properties() {
                let property_topic = topic::join(&[node_topic.as_str(), property.id().as_str()]);
                messages.extend(
                    property
                        .attributes()
                        .into_iter()
                        .map(|(name, payload)| attribute(&property_topic, name, payload)),
                );
                if let Some(payload) = property.payload() {
                    messages.push(Outgoing {
                        topic: property_topic,
                        payload,
                        retained: property.is_retained(),
                    });
                }
            }
        }

        messages.push(attribute(
            &self.topic,
            "state",
            DeviceState::Ready.as_str().to_string(),
        ));
        messages
    }

    fn device_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("homie", HOMIE_VERSION.to_string()),
            ("name", self.name.clone()),
        ];

        let extensions = self.extensions();
        if !extensions.is_empty() {
            attributes.push(("extensions", extensions.join(",")));
        }
        attributes.push(("implementation", self.config.implementation.clone()));

        if let Some(firmware) = &self.firmware {
            attributes.push(("fw/name", firmware.name.clone()));
            attributes.push(("fw/version", firmware.version.clone()));
        }
        if let Some(ip) = &self.local_ip {
            attributes.push(("localip", ip.clone()));
        }
        if let Some(mac) = &self.mac {
            attributes.push(("mac", mac.clone()));
        }

        let nodes: Vec<&str> = self.nodes.iter().map(|n| n.id().as_str()).collect();
        attributes.push(("nodes", nodes.join(",")));
        attributes
    }

    fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        let legacy_attributes =
            self.firmware.is_some() || self.local_ip.is_some() || self.mac.is_some();
        if legacy_attributes && !extensions.contains(&LEGACY_FIRMWARE_EXTENSION) {
            extensions.push(LEGACY_FIRMWARE_EXTENSION);
        }
        extensions
    }

    async fn handle_command(
        &mut self,
        topic: &str,
        node: &str,
        property: &str,
        payload: &str,
    ) -> Result<()> {
        if !self.state.is_online() {
            return Err(Error::NotAccepting(self.state));
        }

        let prop = self
            .nodes
            .iter_mut()
            .find(|n| n.id() == node)
            .and_then(|n| n.property_mut(property).ok())
            .ok_or_else(|| Error::TopicNotFound(topic.to_string()))?;

        let canonical = prop.set_value(payload, SetOrigin::Remote)?.to_string();
        let retained = prop.is_retained();
        tracing::debug!(
            device = %self.id,
            node = %node,
            property = %property,
            value = %canonical,
            "Command applied"
        );

        let value_topic = topic::join(&[self.topic.as_str(), node, property]);
        self.publish(&value_topic, &canonical, retained).await
    }

    fn connection_lost(&mut self) {
        if self.state == DeviceState::Lost {
            self.resume_pending = false;
            return;
        }
        if !self.state.is_online() {
            tracing::trace!(device = %self.id, state = %self.state, "Ignoring connection loss");
            return;
        }
        tracing::info!(device = %self.id, from = %self.state, "Connection lost");
        self.state = DeviceState::Lost;
        self.next_heartbeat = None;
    }

    async fn reconnected(&mut self) -> Result<()> {
        if self.state != DeviceState::Lost {
            tracing::trace!(device = %self.id, state = %self.state, "Ignoring reconnection");
            return Ok(());
        }
        tracing::info!(device = %self.id, "Connection restored, announcing again");
        self.resume_pending = true;
        self.resume().await
    }

    async fn resume(&mut self) -> Result<()> {
        self.go_online().await?;
        self.resume_pending = false;
        Ok(())
    }

    fn schedule_heartbeat(&mut self) {
        self.next_heartbeat = self
            .config
            .heartbeat
            .period()
            .and_then(|period| Instant::now().checked_add(period));
    }

    async fn publish(&mut self, topic: &str, payload: &str, retained: bool) -> Result<()> {
        tracing::debug!(device = %self.id, topic = %topic, payload = %payload, retained, "Publishing");
        self.transport
            .publish(topic, payload, retained, self.config.qos)
            .await?;
        Ok(())
    }
}

impl<T: Transport> fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("topic", &self.topic)
            .field("state", &self.state)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

fn node_not_found(id: &str) -> Error {
    Error::NotFound {
        kind: "node",
        id: id.to_string(),
    }
}
