// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer lifecycle notifications.
//!
//! Every state transition of a watched change is announced with one of
//! these events. The log is the canonical sink; message strings are part of
//! the external contract and must not drift.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Started,
    Confirmed,
    Superseded,
    Expired,
    GracePeriod,
    Reverted,
    RevertFailed,
    RevertError,
}

/// Log level a notice is emitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Notice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Confirmed => "confirmed",
            Self::Superseded => "superseded",
            Self::Expired => "expired",
            Self::GracePeriod => "grace_period",
            Self::Reverted => "reverted",
            Self::RevertFailed => "revert_failed",
            Self::RevertError => "revert_error",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Expired | Self::RevertFailed | Self::RevertError => Severity::Error,
            Self::Started | Self::GracePeriod => Severity::Warn,
            Self::Confirmed | Self::Superseded | Self::Reverted => Severity::Info,
        }
    }

    /// Fixed-format message for this notice.
    ///
    /// `timeout_seconds` is read for `Started`, `grace_seconds` for
    /// `GracePeriod`; both are ignored elsewhere.
    pub fn message(&self, path: &Path, timeout_seconds: u64, grace_seconds: u64) -> String {
        let path = path.display();
        match self {
            Self::Started => format!(
                "Configuration change timeout started: {path} ({timeout_seconds}s timeout)"
            ),
            Self::Confirmed => format!("Configuration change confirmed: {path}"),
            Self::Superseded => format!("Configuration change superseded: {path}"),
            Self::Expired => format!(
                "Configuration change timeout EXPIRED: {path} - automatic revert will be performed"
            ),
            Self::GracePeriod => {
                format!("Grace period before revert: {path} ({grace_seconds}s remaining)")
            }
            Self::Reverted => format!("Configuration change successfully reverted: {path}"),
            Self::RevertFailed => {
                format!("CRITICAL: Failed to revert configuration change: {path}")
            }
            Self::RevertError => {
                format!("CRITICAL: Error during revert of configuration change: {path}")
            }
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "notice_tests.rs"]
mod tests;
