// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change events observed by the watcher and the ids assigned to them.

use crate::category::ChangeCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the filesystem reported about a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Modified,
    MovedFrom,
    MovedTo,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::MovedFrom => "moved_from",
            Self::MovedTo => "moved_to",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A debounced, categorised change admitted by the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: EventKind,
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind, observed_at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            kind,
            observed_at,
        }
    }

    pub fn category(&self) -> ChangeCategory {
        ChangeCategory::from_path(&self.path.to_string_lossy())
    }
}

/// Identifier for one pending change: `<category>_<unix-seconds>`.
///
/// Not unique across same-second changes of one category; the per-path
/// single-timer rule makes the older entry yield first, so collisions are
/// harmless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub String);

impl ChangeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the id for a change observed at `unix_seconds`.
    pub fn for_change(category: ChangeCategory, unix_seconds: i64) -> Self {
        Self(format!("{}_{}", category.as_str(), unix_seconds))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category component of the id, if well-formed.
    pub fn category(&self) -> Option<ChangeCategory> {
        self.0
            .split_once('_')
            .and_then(|(name, _)| ChangeCategory::parse(name))
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChangeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChangeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for ChangeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
