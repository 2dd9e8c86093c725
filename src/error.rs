// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `homie_device` library.
//!
//! Errors fall in two groups:
//!
//! - construction errors ([`Error::InvalidIdentifier`], [`Error::InvalidFormat`],
//!   [`Error::InvalidBaseTopic`], [`Error::DuplicateIdentifier`],
//!   [`Error::TopologyFrozen`]) which indicate
//!   a programming mistake and are returned immediately;
//! - runtime errors caused by remote input ([`Error::Value`],
//!   [`Error::NotSettable`], [`Error::TopicNotFound`],
//!   [`Error::NotAccepting`]) which the device logs
//!   and drops so that a single bad message never stops it.

use thiserror::Error;

use crate::device::DeviceState;
use crate::types::Datatype;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// An identifier does not follow the Homie identifier rules.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// An identifier is already used by a sibling.
    #[error("duplicate {kind} identifier: {id}")]
    DuplicateIdentifier {
        /// What kind of entity was being added (`node` or `property`).
        kind: &'static str,
        /// The conflicting identifier.
        id: String,
    },

    /// The topology cannot change once the device has been announced.
    #[error("topology is frozen once the device has left the init state")]
    TopologyFrozen,

    /// The base topic is empty, has empty levels or contains wildcards.
    #[error("invalid base topic: {0:?}")]
    InvalidBaseTopic(String),

    /// A node or property looked up locally does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What kind of entity was looked up (`node` or `property`).
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The `$format` attribute is not valid for the datatype.
    #[error("invalid format {format:?} for {datatype} property: {reason}")]
    InvalidFormat {
        /// The datatype of the property.
        datatype: Datatype,
        /// The rejected format string.
        format: String,
        /// Why the format was rejected.
        reason: String,
    },

    /// A value failed validation or coercion.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// An inbound command addressed a node or property that does not exist.
    #[error("no property behind topic: {0}")]
    TopicNotFound(String),

    /// An inbound command addressed a property that is not settable.
    #[error("property is not settable: {0}")]
    NotSettable(String),

    /// An inbound command arrived while the device does not accept commands.
    #[error("device does not accept commands while {0}")]
    NotAccepting(DeviceState),

    /// The requested lifecycle transition is not allowed.
    #[error("cannot move device from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: DeviceState,
        /// Requested state.
        to: DeviceState,
    },

    /// Error reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be deserialized.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised while validating or coercing a property value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
        /// The actual value that was provided.
        actual: f64,
    },

    /// The payload is not a number of the expected kind.
    #[error("not a valid {expected}: {input:?}")]
    NotANumber {
        /// `integer` or `float`.
        expected: &'static str,
        /// The rejected payload.
        input: String,
    },

    /// The payload is not `true` or `false`.
    #[error("invalid boolean: {0:?}")]
    InvalidBoolean(String),

    /// The payload is not one of the enumerated values.
    #[error("{input:?} is not one of [{allowed}]")]
    NotInEnum {
        /// The rejected payload.
        input: String,
        /// Comma-separated allowed values.
        allowed: String,
    },

    /// The payload is not a valid color for the color model.
    #[error("invalid color {input:?}: {reason}")]
    InvalidColor {
        /// The rejected payload.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The payload is not an ISO 8601 datetime.
    #[error("invalid datetime {0:?} (expected ISO 8601)")]
    InvalidDateTime(String),

    /// The payload is not an ISO 8601 duration.
    #[error("invalid duration {0:?} (expected ISO 8601, e.g. PT1H2M3S)")]
    InvalidDuration(String),

    /// A typed value does not match the property datatype.
    #[error("expected a {expected} value, got {actual}")]
    TypeMismatch {
        /// Property datatype.
        expected: Datatype,
        /// Datatype of the supplied value.
        actual: Datatype,
    },
}

/// Errors reported by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// Operation timed out.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// Invalid broker URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
