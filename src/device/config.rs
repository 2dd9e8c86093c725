// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration.
//!
//! Every field has a default, so a configuration file only needs the values
//! that differ:
//!
//! ```
//! use homie_device::DeviceConfig;
//! use std::time::Duration;
//!
//! let config = DeviceConfig::from_json(r#"{
//!     "base_topic": "devices",
//!     "heartbeat": { "interval": 5, "unit": "minutes" }
//! }"#).unwrap();
//!
//! assert_eq!(config.base_topic, "devices");
//! assert_eq!(config.heartbeat.period(), Some(Duration::from_secs(300)));
//! assert!(config.subscribe_broadcast);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::transport::Qos;

/// Unit of [`HeartbeatConfig::interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    #[default]
    Seconds,
    /// Minutes.
    Minutes,
}

/// How often `$state` is republished while the device is online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Number of [`unit`](Self::unit)s between republishes. `0` disables the
    /// heartbeat.
    pub interval: u64,
    /// Unit of the interval.
    pub unit: TimeUnit,
}

impl HeartbeatConfig {
    /// Disabled heartbeat.
    pub const DISABLED: Self = Self {
        interval: 0,
        unit: TimeUnit::Seconds,
    };

    /// Returns the heartbeat period, or `None` when disabled.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        if self.interval == 0 {
            return None;
        }
        Some(match self.unit {
            TimeUnit::Milliseconds => Duration::from_millis(self.interval),
            TimeUnit::Seconds => Duration::from_secs(self.interval),
            TimeUnit::Minutes => Duration::from_secs(self.interval.saturating_mul(60)),
        })
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: 60,
            unit: TimeUnit::Seconds,
        }
    }
}

/// Configuration of a [`Device`](crate::Device).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Root of the topic tree (default: `homie`).
    pub base_topic: String,
    /// `QoS` of every publish and subscription.
    pub qos: Qos,
    /// `$state` heartbeat.
    pub heartbeat: HeartbeatConfig,
    /// Maximum number of transport events handled by one
    /// [`tick`](crate::Device::tick).
    pub max_messages_per_tick: usize,
    /// Value of the `$implementation` attribute.
    pub implementation: String,
    /// Whether to subscribe to `<base>/$broadcast/#`.
    pub subscribe_broadcast: bool,
}

impl DeviceConfig {
    /// Parses a configuration from JSON. Missing fields take their default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the JSON is
    /// malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_topic: "homie".to_string(),
            qos: Qos::AtLeastOnce,
            heartbeat: HeartbeatConfig::default(),
            max_messages_per_tick: 16,
            implementation: env!("CARGO_PKG_NAME").to_string(),
            subscribe_broadcast: true,
        }
    }
}
