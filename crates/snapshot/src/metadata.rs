// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk snapshot metadata (`metadata.json`).
//!
//! The manifest enumerates exactly the entries a restore may touch;
//! anything outside it is never written by a restore.

use chrono::{DateTime, Utc};
use confguard_core::SnapshotId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backend owns a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Manual,
    Timeshift,
}

/// Kind of a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// One restorable entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path on the host.
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Full `st_mode` as an `0o`-prefixed octal string, e.g. `0o100644`.
    pub mode: String,
}

impl FileEntry {
    pub fn format_mode(mode: u32) -> String {
        format!("0o{mode:o}")
    }

    /// Parse the recorded mode; `None` if the string is malformed.
    pub fn parse_mode(&self) -> Option<u32> {
        u32::from_str_radix(self.mode.trim_start_matches("0o"), 8).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub id: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: BackendKind,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl SnapshotMetadata {
    /// Tagged id for routing restores back to the owning backend.
    pub fn snapshot_id(&self) -> SnapshotId {
        match self.kind {
            BackendKind::Manual => SnapshotId::Manual(self.id.clone()),
            BackendKind::Timeshift => SnapshotId::Timeshift(self.id.clone()),
        }
    }
}
