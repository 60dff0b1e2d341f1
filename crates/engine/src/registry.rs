// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer registry: at most one armed countdown per watched path.
//!
//! All mutations happen under one lock on the `change_id → entry` map.
//! The lock is never held across revert-engine calls; expired entries are
//! drained out atomically and handled lock-free.

use crate::notices::{emit, NoticeSender};
use chrono::{DateTime, Utc};
use confguard_core::{
    clamp_timeout, ChangeCategory, ChangeId, Clock, EventKind, Notice, SnapshotId, TimerEntry,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Armed-entry view with computed remaining time, for the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTimeout {
    pub change_id: ChangeId,
    pub path: PathBuf,
    pub category: ChangeCategory,
    pub event_kind: EventKind,
    pub started_at: DateTime<Utc>,
    pub timeout_seconds: u64,
    pub remaining_seconds: u64,
    pub snapshot_id: Option<SnapshotId>,
}

pub struct TimerRegistry<C: Clock> {
    active: Mutex<HashMap<ChangeId, TimerEntry>>,
    /// Entries in their post-expiry grace window; value = late-confirmed.
    grace: Mutex<HashMap<ChangeId, bool>>,
    clock: C,
    notices: NoticeSender,
    rearm: Arc<Notify>,
}

impl<C: Clock> TimerRegistry<C> {
    pub fn new(clock: C, notices: NoticeSender) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            grace: Mutex::new(HashMap::new()),
            clock,
            notices,
            rearm: Arc::new(Notify::new()),
        }
    }

    /// Signal fired whenever the deadline set changes; the expiry loop
    /// waits on it.
    pub fn rearm_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.rearm)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Arm a countdown for a change. Any prior entry for the same path is
    /// cancelled and announced as superseded.
    pub fn arm(
        &self,
        change_id: ChangeId,
        path: PathBuf,
        category: ChangeCategory,
        snapshot_id: Option<SnapshotId>,
        event_kind: EventKind,
        timeout_seconds: Option<u64>,
    ) -> bool {
        let timeout_seconds = clamp_timeout(timeout_seconds, category);
        if snapshot_id.is_none() {
            warn!(
                change_id = %change_id,
                path = %path.display(),
                "arming without a pre-change snapshot; expiry will use the default template"
            );
        }

        let entry = TimerEntry {
            change_id: change_id.clone(),
            path: path.clone(),
            category,
            snapshot_id,
            event_kind,
            started_at: self.clock.now(),
            timeout_seconds,
        };

        let displaced: Vec<TimerEntry> = {
            let mut active = self.active.lock();
            let displaced_ids: Vec<ChangeId> = active
                .iter()
                .filter(|(_, e)| e.path == path)
                .map(|(id, _)| id.clone())
                .collect();
            let displaced = displaced_ids
                .iter()
                .filter_map(|id| active.remove(id))
                .collect();
            active.insert(change_id.clone(), entry);
            displaced
        };

        for old in &displaced {
            info!(change_id = %old.change_id, "cancelling superseded timeout");
            emit(
                &self.notices,
                Notice::Superseded,
                &old.change_id,
                &old.path,
                old.timeout_seconds,
                0,
            );
        }

        self.rearm.notify_one();
        emit(
            &self.notices,
            Notice::Started,
            &change_id,
            &path,
            timeout_seconds,
            0,
        );
        true
    }

    /// Confirm a change, cancelling its countdown. Also honours late
    /// confirms for entries sitting in their grace window.
    pub fn confirm(&self, change_id: &ChangeId) -> bool {
        let removed = self.active.lock().remove(change_id);
        if let Some(entry) = removed {
            emit(
                &self.notices,
                Notice::Confirmed,
                change_id,
                &entry.path,
                entry.timeout_seconds,
                0,
            );
            return true;
        }

        {
            let mut grace = self.grace.lock();
            if let Some(confirmed) = grace.get_mut(change_id) {
                *confirmed = true;
                info!(change_id = %change_id, "late confirmation during grace period");
                return true;
            }
        }

        warn!(change_id = %change_id, "cannot confirm unknown change");
        false
    }

    /// Cancel a countdown without confirming the change.
    pub fn cancel(&self, change_id: &ChangeId) -> bool {
        match self.active.lock().remove(change_id) {
            Some(entry) => {
                info!(change_id = %change_id, path = %entry.path.display(), "cancelled timeout");
                true
            }
            None => {
                warn!(change_id = %change_id, "cannot cancel unknown timeout");
                false
            }
        }
    }

    /// Cancel every armed countdown; returns how many were removed.
    pub fn cancel_all(&self) -> usize {
        let mut active = self.active.lock();
        let count = active.len();
        active.clear();
        info!(count, "cancelled all timeouts");
        count
    }

    /// Snapshot of armed entries with remaining time, newest deadline last.
    pub fn list(&self) -> Vec<ActiveTimeout> {
        let now = self.clock.now();
        let mut timeouts: Vec<ActiveTimeout> = self
            .active
            .lock()
            .values()
            .map(|entry| ActiveTimeout {
                change_id: entry.change_id.clone(),
                path: entry.path.clone(),
                category: entry.category,
                event_kind: entry.event_kind,
                started_at: entry.started_at,
                timeout_seconds: entry.timeout_seconds,
                remaining_seconds: entry.remaining_seconds(now),
                snapshot_id: entry.snapshot_id.clone(),
            })
            .collect();
        timeouts.sort_by_key(|t| t.remaining_seconds);
        timeouts
    }

    /// Atomically remove and return every expired entry.
    pub fn take_expired(&self) -> Vec<TimerEntry> {
        let now = self.clock.now();
        let mut active = self.active.lock();
        let expired_ids: Vec<ChangeId> = active
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        expired_ids
            .iter()
            .filter_map(|id| active.remove(id))
            .collect()
    }

    /// Earliest deadline among armed entries.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.active.lock().values().map(TimerEntry::expires_at).min()
    }

    /// Open the grace window for an expired entry.
    pub fn begin_grace(&self, change_id: &ChangeId) {
        self.grace.lock().insert(change_id.clone(), false);
    }

    /// Close the grace window; returns whether a late confirm arrived.
    pub fn end_grace(&self, change_id: &ChangeId) -> bool {
        self.grace.lock().remove(change_id).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
