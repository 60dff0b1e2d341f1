// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform capability record consulted by the revert engine.
//!
//! Built once at startup from conservative defaults plus configuration
//! overrides; never mutated afterwards. Platform detection lives outside
//! this crate and only hands records in.

use crate::category::ChangeCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Commands that drive one subsystem during a revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCommands {
    pub restart: String,
    pub reload: String,
    /// Verification command; absent means the revert assumes success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
}

/// Partial per-category command override from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandOverride {
    pub restart: Option<String>,
    pub reload: Option<String>,
    pub test: Option<String>,
}

/// Read-only map of subsystem restart/verify commands and platform defaults.
#[derive(Debug, Clone)]
pub struct CapabilityMap {
    commands: HashMap<ChangeCategory, ServiceCommands>,
    pub ssh_service: String,
    pub firewall_tool: String,
    pub package_manager: String,
}

impl CapabilityMap {
    /// Conservative systemd/Debian-family defaults, also used when platform
    /// detection comes up empty.
    pub fn debian_defaults() -> Self {
        let mut commands = HashMap::new();
        commands.insert(
            ChangeCategory::Network,
            ServiceCommands {
                restart: "systemctl restart networking".into(),
                reload: "systemctl reload networking".into(),
                test: Some("ip link show".into()),
            },
        );
        commands.insert(
            ChangeCategory::Ssh,
            ServiceCommands {
                restart: "systemctl restart ssh".into(),
                reload: "systemctl reload ssh".into(),
                test: Some("systemctl is-active ssh".into()),
            },
        );
        commands.insert(
            ChangeCategory::Firewall,
            ServiceCommands {
                restart: "ufw reload".into(),
                reload: "ufw reload".into(),
                test: Some("ufw status".into()),
            },
        );
        commands.insert(
            ChangeCategory::Service,
            ServiceCommands {
                restart: "systemctl daemon-reload".into(),
                reload: "systemctl daemon-reload".into(),
                test: Some("systemctl list-units --failed".into()),
            },
        );

        Self {
            commands,
            ssh_service: "ssh".into(),
            firewall_tool: "ufw".into(),
            package_manager: "apt".into(),
        }
    }

    /// Apply configuration overrides on top of the defaults. Consumes and
    /// returns self so the finished map stays immutable at rest.
    pub fn with_overrides(mut self, overrides: &HashMap<ChangeCategory, CommandOverride>) -> Self {
        for (category, over) in overrides {
            let entry = self
                .commands
                .entry(*category)
                .or_insert_with(|| ServiceCommands {
                    restart: String::new(),
                    reload: String::new(),
                    test: None,
                });
            if let Some(restart) = &over.restart {
                entry.restart = restart.clone();
            }
            if let Some(reload) = &over.reload {
                entry.reload = reload.clone();
            }
            if let Some(test) = &over.test {
                entry.test = Some(test.clone());
            }
        }
        self
    }

    /// Commands for a category; `None` for categories with no managed
    /// subsystem (notably `system`).
    pub fn commands(&self, category: ChangeCategory) -> Option<&ServiceCommands> {
        self.commands.get(&category)
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
