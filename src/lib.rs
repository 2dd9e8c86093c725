// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `homie_device` - expose devices over MQTT following the Homie v4
//! convention.
//!
//! A device is a tree of nodes, each holding typed properties. The library
//! publishes that tree as retained attributes under `<base>/<device>`,
//! keeps `$state` up to date, and routes `.../set` commands to the right
//! property after validating the payload against its datatype and format.
//!
//! # Supported Features
//!
//! - **Lifecycle**: `init`, `ready`, `alert`, `sleeping`, `disconnected` and
//!   `lost` (the last-will), with automatic re-announce after a reconnect
//! - **Datatypes**: integer, float, boolean, string, enum, color, datetime
//!   and duration, with `$format` validation
//! - **Commands**: settable properties with change callbacks
//! - **Broadcasts**: `<base>/$broadcast/<level>` delivered to a callback
//! - **Heartbeat**: periodic `$state` republish
//!
//! # Quick Start
//!
//! ```no_run
//! use homie_device::{Device, Node, recipes};
//! use homie_device::transport::MqttTransport;
//!
//! #[tokio::main]
//! async fn main() -> homie_device::Result<()> {
//!     let transport = MqttTransport::builder()
//!         .broker_url("mqtt://192.168.1.50:1883")
//!         .build()?;
//!
//!     let mut device = Device::builder("desk-lamp", "Desk lamp", transport)
//!         .firmware("lamp-fw", "1.0.0")
//!         .build()?;
//!
//!     let mut light = Node::new("light", "Light", "lamp")?;
//!     light.add_property(
//!         recipes::boolean("power")
//!             .name("Power")
//!             .on_set(|value| println!("power -> {value}"))
//!             .build()?,
//!     )?;
//!     light.add_property(recipes::percent("brightness").settable(true).build()?)?;
//!     device.add_node(light)?;
//!
//!     device.start().await?;
//!     loop {
//!         device.tick().await?;
//!         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     }
//! }
//! ```
//!
//! # Transports
//!
//! [`transport::MqttTransport`] (feature `mqtt`, enabled by default) talks to
//! a real broker. [`transport::MemoryTransport`] records every publish and
//! lets tests inject messages and connection events.

mod device;
pub mod error;
mod id;
mod node;
mod property;
pub mod recipes;
pub mod topic;
pub mod transport;
pub mod types;

pub use device::{
    BroadcastCallback, Device, DeviceBuilder, DeviceConfig, DeviceState, HOMIE_VERSION,
    HeartbeatConfig, LEGACY_FIRMWARE_EXTENSION, TimeUnit,
};
pub use error::{Error, Result, TransportError, ValueError};
pub use id::Identifier;
pub use node::Node;
pub use property::{Property, PropertyBuilder, SetCallback, SetOrigin};
pub use types::{
    Color, ColorModel, Datatype, HomieDateTime, HomieDuration, HsvColor, NumericRange, Percent,
    PropertyFormat, PropertyValue, RgbColor,
};
