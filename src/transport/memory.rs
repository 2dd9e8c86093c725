// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process transport.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;

use super::{LastWill, Qos, Transport, TransportEvent};

/// A message recorded by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Topic the message was published on.
    pub topic: String,
    /// Payload of the message.
    pub payload: String,
    /// Whether the message was retained.
    pub retained: bool,
    /// Delivery guarantee.
    pub qos: Qos,
}

#[derive(Debug, Default)]
struct MemoryState {
    connected: bool,
    will: Option<LastWill>,
    published: Vec<Published>,
    publish_attempts: usize,
    subscriptions: Vec<String>,
    inbound: VecDeque<TransportEvent>,
    fail_connect: bool,
    fail_publish: bool,
    connect_count: usize,
    disconnect_count: usize,
}

/// A transport that keeps everything in memory.
///
/// Clones share the same state, so a test can hand one clone to the device
/// and keep another to inject inbound messages and inspect what was
/// published. Inbound messages are only delivered when they match an active
/// subscription, as a broker would do.
///
/// # Examples
///
/// ```
/// use homie_device::transport::MemoryTransport;
///
/// let transport = MemoryTransport::new();
/// let probe = transport.clone();
///
/// probe.push_message("homie/lamp/light/power/set", "true");
/// assert!(probe.published().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// Creates a disconnected transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an inbound message.
    pub fn push_message(&self, topic: impl Into<String>, payload: impl Into<String>) {
        self.state.lock().inbound.push_back(TransportEvent::Message {
            topic: topic.into(),
            payload: payload.into(),
        });
    }

    /// Simulates the broker connection dropping.
    pub fn drop_connection(&self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.inbound.push_back(TransportEvent::ConnectionLost);
    }

    /// Simulates the connection coming back after a drop.
    pub fn restore_connection(&self) {
        let mut state = self.state.lock();
        state.connected = true;
        state.inbound.push_back(TransportEvent::Connected);
    }

    /// Makes subsequent connection attempts fail.
    pub fn fail_connects(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// Makes subsequent publishes fail.
    pub fn fail_publishes(&self, fail: bool) {
        self.state.lock().fail_publish = fail;
    }

    /// Returns every successful publish, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<Published> {
        self.state.lock().published.clone()
    }

    /// Returns the topics of every successful publish, oldest first.
    #[must_use]
    pub fn published_topics(&self) -> Vec<String> {
        self.state
            .lock()
            .published
            .iter()
            .map(|p| p.topic.clone())
            .collect()
    }

    /// Returns the last payload published on `topic`, if any.
    #[must_use]
    pub fn last_payload(&self, topic: &str) -> Option<String> {
        self.state
            .lock()
            .published
            .iter()
            .rev()
            .find(|p| p.topic == topic)
            .map(|p| p.payload.clone())
    }

    /// Forgets recorded publishes.
    pub fn clear_published(&self) {
        let mut state = self.state.lock();
        state.published.clear();
        state.publish_attempts = 0;
    }

    /// Returns how many publishes were attempted, including failed ones.
    #[must_use]
    pub fn publish_attempts(&self) -> usize {
        self.state.lock().publish_attempts
    }

    /// Returns the active subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().subscriptions.clone()
    }

    /// Returns the last-will registered at the latest connect.
    #[must_use]
    pub fn last_will(&self) -> Option<LastWill> {
        self.state.lock().will.clone()
    }

    /// Returns whether the transport is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Returns how many times `connect` succeeded.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.state.lock().connect_count
    }

    /// Returns how many times `disconnect` was called.
    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        self.state.lock().disconnect_count
    }
}

impl Transport for MemoryTransport {
    async fn connect(&mut self, will: &LastWill) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.fail_connect {
            return Err(TransportError::Connection("connection refused".to_string()));
        }
        state.connected = true;
        state.will = Some(will.clone());
        state.connect_count += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.connected = false;
        state.subscriptions.clear();
        state.disconnect_count += 1;
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retained: bool,
        qos: Qos,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.publish_attempts += 1;
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        if state.fail_publish {
            return Err(TransportError::Connection("publish rejected".to_string()));
        }
        state.published.push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retained,
            qos,
        });
        Ok(())
    }

    async fn subscribe(&mut self, filter: &str, _qos: Qos) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        if !state.subscriptions.iter().any(|s| s == filter) {
            state.subscriptions.push(filter.to_string());
        }
        Ok(())
    }

    async fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.state.lock().subscriptions.retain(|s| s != filter);
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        let mut state = self.state.lock();
        while let Some(event) = state.inbound.pop_front() {
            match &event {
                TransportEvent::Message { topic, .. }
                    if !state.subscriptions.iter().any(|f| filter_matches(f, topic)) =>
                {
                    tracing::trace!(topic = %topic, "Dropping message without subscriber");
                }
                _ => return Ok(Some(event)),
            }
        }
        Ok(None)
    }
}

/// Matches an MQTT topic against a filter with `+` and `#` wildcards.
fn filter_matches(filter: &str, topic: &str) -> bool {
    let mut levels = topic.split('/');
    for part in filter.split('/') {
        match (part, levels.next()) {
            ("#", _) => return true,
            ("+", Some(_)) => {}
            (expected, Some(level)) if expected == level => {}
            _ => return false,
        }
    }
    levels.next().is_none()
}
