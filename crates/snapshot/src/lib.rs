// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! confguard-snapshot: file-tree snapshots of the critical configuration
//! paths, with a manual mirror-tree backend and an optional external
//! timeshift backend.

mod manual;
mod metadata;
mod store;
mod timeshift;

pub use manual::{critical_paths, ManualStore};
pub use metadata::{BackendKind, FileEntry, FileKind, SnapshotMetadata};
pub use store::{SnapshotConfig, SnapshotStore};
pub use timeshift::TimeshiftTool;

use thiserror::Error;

/// Errors from snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot not found: {0}")]
    NotFound(String),
    #[error("snapshot has no metadata: {0}")]
    MissingMetadata(String),
    #[error("{failed} of {total} manifest entries failed to restore")]
    RestoreIncomplete { failed: usize, total: usize },
    #[error("timeshift {action} failed: {detail}")]
    Timeshift {
        action: &'static str,
        detail: String,
    },
}
