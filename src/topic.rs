// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Homie topic layout.
//!
//! ```text
//! homie/<device>/$state                 device attribute
//! homie/<device>/<node>/$name           node attribute
//! homie/<device>/<node>/<prop>          property value
//! homie/<device>/<node>/<prop>/$format  property attribute
//! homie/<device>/<node>/<prop>/set      inbound command
//! homie/$broadcast/<level>              inbound broadcast
//! ```

/// Suffix of command topics.
pub const SET_SUFFIX: &str = "set";

/// Topic level under the root that carries broadcasts.
pub const BROADCAST_LEVEL: &str = "$broadcast";

/// Joins topic levels with `/`.
#[must_use]
pub fn join(levels: &[&str]) -> String {
    levels.join("/")
}

/// Returns `<prefix>/$<attribute>`.
#[must_use]
pub fn attribute(prefix: &str, attribute: &str) -> String {
    format!("{prefix}/${attribute}")
}

/// Returns the filter matching every command topic of a device.
#[must_use]
pub fn command_filter(device_topic: &str) -> String {
    format!("{device_topic}/+/+/{SET_SUFFIX}")
}

/// Returns the filter matching every broadcast under `base`.
#[must_use]
pub fn broadcast_filter(base: &str) -> String {
    format!("{base}/{BROADCAST_LEVEL}/#")
}

/// Returns `true` if `base` can root a device tree: non-empty levels and
/// no wildcards.
#[must_use]
pub fn is_valid_base(base: &str) -> bool {
    !base.is_empty()
        && base
            .split('/')
            .all(|level| !level.is_empty() && !level.contains(['+', '#']))
}

/// An inbound topic the device knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// `<device>/<node>/<property>/set`
    Command {
        /// Node identifier.
        node: &'a str,
        /// Property identifier.
        property: &'a str,
    },
    /// `<base>/$broadcast/<level>`
    Broadcast {
        /// Everything after `$broadcast/`.
        level: &'a str,
    },
}

impl<'a> Inbound<'a> {
    /// Classifies `topic` for a device published under `device_topic`
    /// (`<base>/<device>`) with root `base`.
    ///
    /// Returns `None` for topics that belong to someone else or that do not
    /// have the command shape.
    #[must_use]
    pub fn parse(base: &str, device_topic: &str, topic: &'a str) -> Option<Self> {
        if let Some(rest) = strip_levels(topic, device_topic) {
            let parts: Vec<&'a str> = rest.split('/').collect();
            return match parts[..] {
                [node, property, SET_SUFFIX] if !node.is_empty() && !property.is_empty() => {
                    Some(Self::Command { node, property })
                }
                _ => None,
            };
        }

        strip_levels(topic, base)
            .and_then(|rest| strip_levels(rest, BROADCAST_LEVEL))
            .filter(|level| !level.is_empty())
            .map(|level| Self::Broadcast { level })
    }
}

/// Strips `prefix/` from the start of `topic`.
fn strip_levels<'a>(topic: &'a str, prefix: &str) -> Option<&'a str> {
    topic.strip_prefix(prefix)?.strip_prefix('/')
}
