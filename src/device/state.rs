// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device lifecycle states.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Lifecycle state of a device, published on `$state`.
///
/// ```text
/// init ──start──▶ ready ◀──set_state──▶ alert | sleeping
///                   │
///                   ├──stop──▶ disconnected
///                   └──connection lost──▶ lost ──reconnected──▶ ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceState {
    /// Constructed, not announced yet.
    #[default]
    Init,
    /// Announced and operating.
    Ready,
    /// Cleanly disconnected.
    Disconnected,
    /// About to sleep.
    Sleeping,
    /// Needs human intervention.
    Alert,
    /// Disconnected without cooperation (published by the broker through
    /// the last-will).
    Lost,
}

impl DeviceState {
    /// All states.
    pub const ALL: [Self; 6] = [
        Self::Init,
        Self::Ready,
        Self::Disconnected,
        Self::Sleeping,
        Self::Alert,
        Self::Lost,
    ];

    /// Returns the `$state` payload.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::Sleeping => "sleeping",
            Self::Alert => "alert",
            Self::Lost => "lost",
        }
    }

    /// Returns `true` while the device is announced and connected.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Ready | Self::Alert | Self::Sleeping)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ValueError::NotInEnum {
                input: s.to_string(),
                allowed: Self::ALL.map(|state| state.as_str()).join(","),
            })
    }
}
