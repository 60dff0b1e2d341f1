// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Armed timer entries awaiting operator confirmation.

use crate::category::ChangeCategory;
use crate::change::{ChangeId, EventKind};
use crate::snapshot_id::SnapshotId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shortest confirmation window the registry will accept.
pub const MIN_TIMEOUT_SECS: u64 = 60;

/// Longest confirmation window the registry will accept.
pub const MAX_TIMEOUT_SECS: u64 = 1800;

/// Resolve the effective timeout: requested value if given, otherwise the
/// category default, clamped into `[MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS]`.
pub fn clamp_timeout(requested: Option<u64>, category: ChangeCategory) -> u64 {
    requested
        .unwrap_or_else(|| category.default_timeout_secs())
        .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
}

/// One armed countdown: created by `arm`, destroyed by confirm, cancel, or
/// expiry handoff to the revert engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEntry {
    pub change_id: ChangeId,
    pub path: PathBuf,
    pub category: ChangeCategory,
    pub snapshot_id: Option<SnapshotId>,
    pub event_kind: EventKind,
    pub started_at: DateTime<Utc>,
    pub timeout_seconds: u64,
}

impl TimerEntry {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::seconds(self.timeout_seconds as i64)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Seconds until expiry, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let remaining = self.expires_at() - now;
        remaining.num_seconds().max(0) as u64
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
