// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot identifiers, tagged by the backend that owns them.
//!
//! The tag travels with the id end-to-end so a restore always goes through
//! the backend that created the snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "backend", content = "id", rename_all = "lowercase")]
pub enum SnapshotId {
    /// Snapshot held by the external timeshift tool.
    Timeshift(String),
    /// Snapshot materialised in the daemon's own store directory.
    Manual(String),
}

impl SnapshotId {
    /// The backend-assigned name, without the tag.
    pub fn name(&self) -> &str {
        match self {
            Self::Timeshift(name) | Self::Manual(name) => name,
        }
    }

    pub fn is_timeshift(&self) -> bool {
        matches!(self, Self::Timeshift(_))
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
