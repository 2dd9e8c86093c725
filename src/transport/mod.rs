// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publish/subscribe transports a [`Device`](crate::Device) runs on.
//!
//! The device only needs a small capability from its transport: connect
//! with a last-will message, publish, subscribe, and hand back pending
//! inbound events one at a time. The transport owns keep-alive, timeouts
//! and reconnection timing.
//!
//! # Implementations
//!
//! - [`MqttTransport`]: MQTT over TCP using `rumqttc` (feature `mqtt`)
//! - [`MemoryTransport`]: in-process transport that records every call,
//!   for tests and for hosts that bridge messages themselves

mod memory;
#[cfg(feature = "mqtt")]
mod mqtt;

pub use memory::{MemoryTransport, Published};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttTransport, MqttTransportBuilder};

use std::fmt;

use crate::error::TransportError;

/// MQTT quality of service levels used by Homie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qos {
    /// QoS 0.
    AtMostOnce,
    /// QoS 1.
    #[default]
    AtLeastOnce,
}

impl Qos {
    /// Returns the numeric QoS level.
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
        }
    }
}

impl fmt::Display for Qos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Message the broker publishes on the client's behalf after an unclean
/// disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    /// Topic of the message.
    pub topic: String,
    /// Payload of the message.
    pub payload: String,
    /// Whether the message is retained.
    pub retained: bool,
    /// Delivery guarantee.
    pub qos: Qos,
}

/// An event handed to the device by [`Transport::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// An inbound message on a subscribed topic.
    Message {
        /// Topic the message was published on.
        topic: String,
        /// UTF-8 payload.
        payload: String,
    },
    /// The connection was (re-)established.
    Connected,
    /// The connection dropped without the device asking for it.
    ConnectionLost,
}

/// Capability a [`Device`](crate::Device) requires from its transport.
///
/// Methods are `async` so implementations can wait for network I/O; the
/// device itself never blocks between these calls.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Connects to the broker, registering `will` as the last-will message.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the connection cannot be established.
    async fn connect(&mut self, will: &LastWill) -> Result<(), TransportError>;

    /// Disconnects cleanly. Calling it while disconnected is not an error.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the disconnect request could not be sent.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Publishes `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the transport is down or the request fails.
    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retained: bool,
        qos: Qos,
    ) -> Result<(), TransportError>;

    /// Subscribes to a topic filter.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails.
    async fn subscribe(&mut self, filter: &str, qos: Qos) -> Result<(), TransportError>;

    /// Removes a subscription.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails.
    async fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError>;

    /// Returns the next pending event, or `None` if nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on failures that are not reported as
    /// [`TransportEvent::ConnectionLost`].
    async fn poll(&mut self) -> Result<Option<TransportEvent>, TransportError>;
}

/// Parses a broker URL into host and port.
///
/// Accepts `mqtt://host:port`, `tcp://host:port` and bare `host[:port]`;
/// the port defaults to 1883.
#[cfg_attr(not(feature = "mqtt"), allow(dead_code))]
pub(crate) fn parse_broker_url(url: &str) -> Result<(String, u16), TransportError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| TransportError::InvalidAddress(format!("invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    if host.is_empty() {
        return Err(TransportError::InvalidAddress("host is required".to_string()));
    }
    Ok((host, port))
}
