// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change categories derived from watched file paths.
//!
//! The category decides the default confirmation timeout and which
//! capability-map entry drives the restart/verify commands during a revert.

use serde::{Deserialize, Serialize};

/// Substrings that classify a path as a network configuration change.
const NETWORK_MARKERS: [&str; 4] = ["network", "netplan", "networkmanager", "interfaces"];

/// Substrings that classify a path as a firewall configuration change.
/// `firewalld` is covered by the `firewall` marker.
const FIREWALL_MARKERS: [&str; 3] = ["iptables", "ufw", "firewall"];

/// Category of a configuration change.
///
/// Matching is by case-insensitive substring with a fixed priority:
/// network > ssh > firewall > service > system. A path matching several
/// marker sets always lands in the highest-priority one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    Network,
    Ssh,
    Firewall,
    Service,
    /// Catch-all for watched paths outside the named subsystems.
    System,
}

impl ChangeCategory {
    /// Categorise a changed path.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();

        if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Network;
        }
        if lower.contains("ssh") {
            return Self::Ssh;
        }
        if FIREWALL_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Firewall;
        }
        if lower.contains("systemd") || lower.ends_with(".service") {
            return Self::Service;
        }

        Self::System
    }

    /// Canonical lowercase name, used in change ids and capability lookups.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Ssh => "ssh",
            Self::Firewall => "firewall",
            Self::Service => "service",
            Self::System => "system",
        }
    }

    /// Parse a canonical category name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "network" => Some(Self::Network),
            "ssh" => Some(Self::Ssh),
            "firewall" => Some(Self::Firewall),
            "service" => Some(Self::Service),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Default confirmation timeout for this category, in seconds.
    ///
    /// Changes that can sever the operator's own access get longer windows.
    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            Self::Network => 600,
            Self::Ssh => 900,
            Self::Firewall => 300,
            Self::Service => 300,
            Self::System => 300,
        }
    }

    /// All categories, in matching-priority order.
    pub fn all() -> [Self; 5] {
        [
            Self::Network,
            Self::Ssh,
            Self::Firewall,
            Self::Service,
            Self::System,
        ]
    }
}

impl std::fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
