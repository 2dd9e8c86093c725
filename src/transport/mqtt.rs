// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport built on `rumqttc`.
//!
//! # Examples
//!
//! ```no_run
//! use homie_device::transport::MqttTransport;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), homie_device::error::TransportError> {
//! let transport = MqttTransport::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .keep_alive(Duration::from_secs(60))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::TransportError;

use super::{LastWill, Qos, Transport, TransportEvent, parse_broker_url};

/// Configuration for an MQTT transport.
#[derive(Debug, Clone)]
struct MqttTransportConfig {
    host: String,
    port: u16,
    client_id: Option<String>,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
}

impl Default for MqttTransportConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            client_id: None,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// A [`Transport`] speaking MQTT 3.1.1 over TCP.
///
/// The `rumqttc` event loop runs in a background task spawned at connect
/// time. It forwards inbound publishes and connection changes to a channel
/// that [`Transport::poll`] drains without blocking, and keeps retrying the
/// connection after it drops.
pub struct MqttTransport {
    config: MqttTransportConfig,
    client_id: String,
    client: Option<AsyncClient>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    shutdown: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl MqttTransport {
    /// Creates a new builder for configuring an MQTT transport.
    #[must_use]
    pub fn builder() -> MqttTransportBuilder {
        MqttTransportBuilder::default()
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Returns the MQTT client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns whether authentication is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.config.credentials.is_some()
    }

    fn client(&self) -> Result<&AsyncClient, TransportError> {
        self.client.as_ref().ok_or(TransportError::NotConnected)
    }

    fn stop_task(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.client = None;
        self.events = None;
    }
}

impl Transport for MqttTransport {
    async fn connect(&mut self, will: &LastWill) -> Result<(), TransportError> {
        self.stop_task();

        let mut mqtt_options =
            MqttOptions::new(&self.client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);
        mqtt_options.set_last_will(rumqttc::LastWill::new(
            &will.topic,
            will.payload.as_bytes().to_vec(),
            to_qos(will.qos),
            will.retained,
        ));

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (connack_tx, connack_rx) = oneshot::channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(handle_events(
            event_loop,
            events_tx,
            connack_tx,
            Arc::clone(&shutdown),
            self.config.reconnect_delay,
        ));

        let timeout = self.config.connection_timeout;
        let outcome = tokio::time::timeout(timeout, connack_rx).await;
        let result = match outcome {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(TransportError::Connection(reason)),
            Ok(Err(_)) => Err(TransportError::Connection(
                "MQTT event loop terminated unexpectedly".to_string(),
            )),
            Err(_) => {
                // Safe: connection timeouts never come near u64::MAX milliseconds
                #[allow(clippy::cast_possible_truncation)]
                let timeout_ms = timeout.as_millis() as u64;
                Err(TransportError::Timeout(timeout_ms))
            }
        };

        if let Err(e) = result {
            shutdown.store(true, Ordering::Release);
            task.abort();
            return Err(e);
        }

        tracing::info!(
            host = %self.config.host,
            port = %self.config.port,
            client_id = %self.client_id,
            "Connected to MQTT broker"
        );

        self.client = Some(client);
        self.events = Some(events_rx);
        self.shutdown = shutdown;
        self.task = Some(task);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        tracing::info!(
            host = %self.config.host,
            port = %self.config.port,
            "Disconnecting from MQTT broker"
        );

        self.shutdown.store(true, Ordering::Release);
        let result = client.disconnect().await.map_err(TransportError::Mqtt);

        // Let the event loop flush the DISCONNECT packet before dropping it.
        if let Some(task) = self.task.take()
            && tokio::time::timeout(Duration::from_secs(1), task).await.is_err()
        {
            tracing::debug!("MQTT event loop did not stop in time");
        }
        self.events = None;
        result
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retained: bool,
        qos: Qos,
    ) -> Result<(), TransportError> {
        tracing::debug!(topic = %topic, payload = %payload, retained, "Publishing MQTT message");
        self.client()?
            .publish(topic, to_qos(qos), retained, payload.as_bytes().to_vec())
            .await
            .map_err(TransportError::Mqtt)
    }

    async fn subscribe(&mut self, filter: &str, qos: Qos) -> Result<(), TransportError> {
        self.client()?
            .subscribe(filter, to_qos(qos))
            .await
            .map_err(TransportError::Mqtt)?;
        tracing::debug!(filter = %filter, "Subscribed to topic filter");
        Ok(())
    }

    async fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.client()?
            .unsubscribe(filter)
            .await
            .map_err(TransportError::Mqtt)
    }

    async fn poll(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        let Some(events) = self.events.as_mut() else {
            return Ok(None);
        };
        match events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.events = None;
                Err(TransportError::Connection(
                    "MQTT event loop stopped".to_string(),
                ))
            }
        }
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.stop_task();
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("client_id", &self.client_id)
            .field("connected", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for creating an MQTT transport.
///
/// Either [`host`](Self::host) or [`broker_url`](Self::broker_url) must be
/// set. Building does not connect; the device connects when it starts.
#[derive(Debug, Default)]
pub struct MqttTransportBuilder {
    config: MqttTransportConfig,
    url: Option<String>,
}

impl MqttTransportBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets host and port from a URL such as `mqtt://broker:1883`.
    #[must_use]
    pub fn broker_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the MQTT client identifier (default: `homie-` plus a random suffix).
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the pause between reconnection attempts (default: 5 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidAddress` if the URL is malformed or
    /// no host is set.
    pub fn build(mut self) -> Result<MqttTransport, TransportError> {
        if let Some(url) = self.url.take() {
            let (host, port) = parse_broker_url(&url)?;
            self.config.host = host;
            self.config.port = port;
        }

        if self.config.host.is_empty() {
            return Err(TransportError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self.config.client_id.clone().unwrap_or_else(|| {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("homie-{}", &suffix[..12])
        });

        Ok(MqttTransport {
            config: self.config,
            client_id,
            client: None,
            events: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            task: None,
        })
    }
}

const fn to_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

/// Drives the `rumqttc` event loop and forwards what the device cares about.
async fn handle_events(
    mut event_loop: EventLoop,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    connack_tx: oneshot::Sender<Result<(), String>>,
    shutdown: Arc<AtomicBool>,
    reconnect_delay: Duration,
) {
    let mut connack_tx = Some(connack_tx);
    let mut online = false;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connection acknowledged");
                online = true;
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(Ok(()));
                } else if events_tx.send(TransportEvent::Connected).is_err() {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Ok(payload) = String::from_utf8(publish.payload.to_vec()) else {
                    tracing::warn!(topic = %publish.topic, "Dropping non UTF-8 MQTT payload");
                    continue;
                };
                tracing::debug!(
                    topic = %publish.topic,
                    payload = %payload,
                    "MQTT message received"
                );
                let event = TransportEvent::Message {
                    topic: publish.topic,
                    payload,
                };
                if events_tx.send(event).is_err() {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("MQTT disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(Err(e.to_string()));
                    break;
                }
                if online {
                    tracing::warn!(error = %e, "MQTT connection lost");
                    online = false;
                    if events_tx.send(TransportEvent::ConnectionLost).is_err() {
                        break;
                    }
                } else {
                    tracing::debug!(error = %e, "MQTT reconnection attempt failed");
                }
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}
