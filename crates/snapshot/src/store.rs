// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot store front: backend choice, merged listing, bounded cleanup.

use crate::manual::{critical_paths, ManualStore};
use crate::metadata::SnapshotMetadata;
use crate::timeshift::TimeshiftTool;
use crate::SnapshotError;
use confguard_core::{Clock, SnapshotId};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Store construction options.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub enable_timeshift: bool,
    pub location: PathBuf,
    pub max_snapshots: usize,
    pub compress: bool,
    /// Paths captured by the manual backend.
    pub paths: Vec<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enable_timeshift: true,
            location: PathBuf::from("/var/lib/confguard/snapshots"),
            max_snapshots: 10,
            compress: true,
            paths: critical_paths(),
        }
    }
}

/// Creates, lists, restores, and garbage-collects snapshots.
///
/// When timeshift is enabled and detected it is preferred for `create`,
/// and `restore`/`delete` route by the id's backend tag. A timeshift
/// subcommand failure (or an id whose tool has gone away) falls back to
/// the manual backend for that call — `create`, `restore`, and `delete`
/// alike.
#[derive(Debug, Clone)]
pub struct SnapshotStore<C: Clock> {
    timeshift: Option<TimeshiftTool>,
    manual: ManualStore,
    max_snapshots: usize,
    clock: C,
}

impl<C: Clock> SnapshotStore<C> {
    pub fn new(config: SnapshotConfig, clock: C) -> Result<Self, SnapshotError> {
        fs::create_dir_all(&config.location)?;

        let timeshift = if config.enable_timeshift {
            TimeshiftTool::detect()
        } else {
            None
        };
        info!(
            timeshift_available = timeshift.is_some(),
            location = %config.location.display(),
            "snapshot store initialized"
        );

        Ok(Self {
            timeshift,
            manual: ManualStore::new(config.location, config.paths, config.compress),
            max_snapshots: config.max_snapshots,
            clock,
        })
    }

    /// Whether the external timeshift backend was detected and enabled.
    pub fn timeshift_available(&self) -> bool {
        self.timeshift.is_some()
    }

    /// Create a snapshot of the critical path set.
    pub fn create(&self, description: &str) -> Result<SnapshotId, SnapshotError> {
        let now = self.clock.now();

        if let Some(tool) = &self.timeshift {
            match tool.create(description, now) {
                Ok(name) => {
                    info!(id = %name, "timeshift snapshot created");
                    return Ok(SnapshotId::Timeshift(name));
                }
                Err(e) => {
                    warn!(error = %e, "timeshift snapshot failed, falling back to manual");
                }
            }
        }

        let id = format!("confguard_{}", now.format("%Y%m%d_%H%M%S"));
        self.manual.create(&id, description, now)?;
        info!(%id, "manual snapshot created");
        Ok(SnapshotId::Manual(id))
    }

    /// All known snapshots, newest first.
    pub fn list(&self) -> Vec<SnapshotMetadata> {
        let mut snapshots = Vec::new();

        if let Some(tool) = &self.timeshift {
            match tool.list() {
                Ok(mut listed) => snapshots.append(&mut listed),
                Err(e) => warn!(error = %e, "failed to list timeshift snapshots"),
            }
        }

        snapshots.extend(self.manual.list());
        snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        snapshots
    }

    pub fn restore(&self, id: &SnapshotId) -> Result<(), SnapshotError> {
        info!(id = %id, "restoring snapshot");
        match id {
            SnapshotId::Timeshift(name) => {
                if let Some(tool) = &self.timeshift {
                    match tool.restore(name) {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            warn!(id = %name, error = %e, "timeshift restore failed, falling back to manual");
                        }
                    }
                }
                self.manual.restore(name)
            }
            SnapshotId::Manual(name) => self.manual.restore(name),
        }
    }

    pub fn delete(&self, id: &SnapshotId) -> Result<(), SnapshotError> {
        match id {
            SnapshotId::Timeshift(name) => {
                if let Some(tool) = &self.timeshift {
                    match tool.delete(name) {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            warn!(id = %name, error = %e, "timeshift delete failed, falling back to manual");
                        }
                    }
                }
                self.manual.delete(name)
            }
            SnapshotId::Manual(name) => self.manual.delete(name),
        }
    }

    pub fn info(&self, id: &SnapshotId) -> Option<SnapshotMetadata> {
        self.list().into_iter().find(|meta| meta.id == id.name())
    }

    /// Delete snapshots beyond the configured bound, oldest first.
    /// Returns how many were deleted.
    pub fn cleanup(&self) -> usize {
        let snapshots = self.list();
        if snapshots.len() <= self.max_snapshots {
            return 0;
        }

        let mut deleted = 0;
        for meta in &snapshots[self.max_snapshots..] {
            match self.delete(&meta.snapshot_id()) {
                Ok(()) => deleted += 1,
                Err(e) => warn!(id = %meta.id, error = %e, "failed to delete old snapshot"),
            }
        }
        info!(deleted, "cleaned up old snapshots");
        deleted
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
