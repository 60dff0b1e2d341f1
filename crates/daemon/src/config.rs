// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: TOML file with built-in defaults.
//!
//! A missing file yields the defaults (and writes a starter file); a file
//! that exists but does not parse is a fatal startup error.

use confguard_adapters::WatchConfig;
use confguard_core::{CapabilityMap, ChangeCategory, CommandOverride};
use confguard_engine::RevertConfig;
use confguard_snapshot::{critical_paths, SnapshotConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub log_file: PathBuf,
    pub pid_file: PathBuf,
    pub socket_path: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_file: PathBuf::from("/var/log/confguard/confguard.log"),
            pid_file: PathBuf::from("/run/confguard/confguardd.pid"),
            socket_path: PathBuf::from("/run/confguard/confguardd.sock"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotSection {
    pub enable_timeshift: bool,
    pub location: PathBuf,
    pub max_snapshots: usize,
    pub compress_snapshots: bool,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            enable_timeshift: true,
            location: PathBuf::from("/var/lib/confguard/snapshots"),
            max_snapshots: 10,
            compress_snapshots: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub connectivity_check: bool,
    pub connectivity_endpoints: Vec<String>,
    pub connectivity_timeout: u64,
    pub revert_grace_period: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            connectivity_check: true,
            connectivity_endpoints: vec!["8.8.8.8".into(), "1.1.1.1".into()],
            connectivity_timeout: 10,
            revert_grace_period: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsSection {
    pub desktop_enabled: bool,
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            desktop_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub global: GlobalConfig,
    pub snapshot: SnapshotSection,
    pub monitoring: MonitoringSection,
    pub timeout: TimeoutSection,
    pub notifications: NotificationsSection,
    /// Per-category command overrides merged into the capability map.
    pub capabilities: HashMap<ChangeCategory, CommandOverride>,
}

/// Watched-path groups. Defaults to the stock Debian watch list.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct MonitoringSection(pub WatchConfig);

impl Default for MonitoringSection {
    fn default() -> Self {
        Self(WatchConfig::default_paths())
    }
}

impl DaemonConfig {
    /// Load from `path`. Missing file: defaults, plus a best-effort write
    /// of a starter config. Unparseable file: fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.write_default(path);
                return Ok(config);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_default(&self, path: &Path) {
        let written: std::io::Result<()> = (|| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, DEFAULT_CONFIG_TOML)
        })();
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "could not write default config file");
        }
    }

    pub fn capability_map(&self) -> CapabilityMap {
        CapabilityMap::debian_defaults().with_overrides(&self.capabilities)
    }

    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            enable_timeshift: self.snapshot.enable_timeshift,
            location: self.snapshot.location.clone(),
            max_snapshots: self.snapshot.max_snapshots,
            compress: self.snapshot.compress_snapshots,
            paths: critical_paths(),
        }
    }

    pub fn revert_config(&self) -> RevertConfig {
        RevertConfig {
            grace_period_secs: self.timeout.revert_grace_period,
            connectivity_check: self.timeout.connectivity_check,
            connectivity_endpoints: self.timeout.connectivity_endpoints.clone(),
            connectivity_timeout_secs: self.timeout.connectivity_timeout,
        }
    }

    pub fn watch_config(&self) -> &WatchConfig {
        &self.monitoring.0
    }
}

/// Starter config written when none exists.
const DEFAULT_CONFIG_TOML: &str = r#"# confguard daemon configuration

[global]
log_level = "info"
log_file = "/var/log/confguard/confguard.log"
pid_file = "/run/confguard/confguardd.pid"
socket_path = "/run/confguard/confguardd.sock"

[snapshot]
enable_timeshift = true
location = "/var/lib/confguard/snapshots"
max_snapshots = 10
compress_snapshots = true

[monitoring]
network_configs = [
    "/etc/network/interfaces",
    "/etc/netplan/*.yaml",
    "/etc/NetworkManager/system-connections/*",
    "/etc/systemd/network/*",
]
ssh_configs = ["/etc/ssh/sshd_config", "/etc/ssh/ssh_config.d/*"]
firewall_configs = [
    "/etc/iptables/rules.v4",
    "/etc/iptables/rules.v6",
    "/etc/ufw/*",
    "/etc/firewalld/**/*",
]
service_configs = ["/etc/systemd/system/*", "/etc/systemd/user/*"]
custom_paths = []

[timeout]
connectivity_check = true
connectivity_endpoints = ["8.8.8.8", "1.1.1.1"]
connectivity_timeout = 10
revert_grace_period = 30

[notifications]
desktop_enabled = true

# Per-category command overrides, e.g.:
# [capabilities.firewall]
# restart = "firewall-cmd --reload"
# test = "firewall-cmd --state"
"#;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
