// ztctl - CLI for ZeroTier network members
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Member records as returned by the network controller.
//!
//! Only the fields the CLI displays are kept; everything else in the
//! controller's response is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// A device enrolled in the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Stable node address, the key for every per-member request.
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MemberConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_assignments: Option<Vec<String>>,
}

impl Member {
    pub fn is_authorized(&self) -> bool {
        self.config
            .as_ref()
            .and_then(|c| c.authorized)
            .unwrap_or(false)
    }

    pub fn ip_assignments(&self) -> &[String] {
        self.config
            .as_ref()
            .and_then(|c| c.ip_assignments.as_deref())
            .unwrap_or(&[])
    }

    /// Last contact in epoch milliseconds; a member never seen reports 0.
    pub fn last_seen_ms(&self) -> i64 {
        self.last_seen.unwrap_or(0)
    }
}

/// Partial update sent with `POST .../member/{address}`.
///
/// Fields left as `None` are omitted from the body so the controller keeps
/// their current values. `name` and `description` sit at the top level while
/// the authorization flag is nested under `config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigUpdate {
    pub authorized: bool,
}

impl MemberUpdate {
    /// Rename and/or re-describe a member. Empty strings count as not given.
    pub fn details(name: Option<String>, description: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            description: description.filter(|d| !d.is_empty()),
            config: None,
        }
    }

    pub fn authorization(authorized: bool) -> Self {
        Self {
            config: Some(ConfigUpdate { authorized }),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.config.is_none()
    }
}
