// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: component wiring, PID-file lock, privilege check.

use crate::config::DaemonConfig;
use confguard_adapters::watcher::ChangeCallback;
use confguard_adapters::{ConfigWatcher, WatchError};
use confguard_core::{ChangeEvent, ChangeId, SystemClock};
use confguard_engine::{notice_channel, NoticeMessage, RevertEngine, TimerRegistry};
use confguard_snapshot::{SnapshotError, SnapshotStore};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

pub(crate) type DaemonRegistry = TimerRegistry<SystemClock>;
pub(crate) type DaemonStore = SnapshotStore<SystemClock>;
pub(crate) type DaemonEngine = RevertEngine<SystemClock>;

#[derive(Debug, Error)]
pub(crate) enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot store setup failed: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("another instance holds the lock: {0}")]
    LockFailed(PathBuf),
}

/// The daemon's long-lived components, wired together.
pub(crate) struct Components {
    pub registry: Arc<DaemonRegistry>,
    pub store: Arc<DaemonStore>,
    pub engine: Arc<DaemonEngine>,
    pub watcher: Arc<ConfigWatcher>,
    pub notice_rx: UnboundedReceiver<NoticeMessage>,
}

pub(crate) fn build_components(config: &DaemonConfig) -> Result<Components, LifecycleError> {
    let (notice_tx, notice_rx) = notice_channel();

    let store = Arc::new(SnapshotStore::new(config.snapshot_config(), SystemClock)?);
    let registry = Arc::new(TimerRegistry::new(SystemClock, notice_tx.clone()));
    let capabilities = Arc::new(config.capability_map());
    let engine = Arc::new(RevertEngine::new(
        Arc::clone(&store),
        capabilities,
        config.revert_config(),
        notice_tx,
    ));
    let watcher = Arc::new(ConfigWatcher::new(config.watch_config()));

    info!("all components initialized");
    Ok(Components {
        registry,
        store,
        engine,
        watcher,
        notice_rx,
    })
}

/// Start the watcher with the change pipeline wired in: pre-change
/// snapshot, then arm a timer for the changed path.
pub(crate) fn start_watch_pipeline(
    watcher: &ConfigWatcher,
    registry: Arc<DaemonRegistry>,
    store: Arc<DaemonStore>,
) -> Result<(), WatchError> {
    let callback: ChangeCallback = Arc::new(move |event| {
        handle_change(&registry, &store, event);
    });
    watcher.start(callback)
}

fn handle_change(registry: &DaemonRegistry, store: &DaemonStore, event: ChangeEvent) {
    let category = event.category();
    info!(
        path = %event.path.display(),
        kind = %event.kind,
        category = %category,
        "configuration change detected"
    );

    let description = format!("Pre-change snapshot for {} modification", event.path.display());
    let snapshot_id = match store.create(&description) {
        Ok(id) => Some(id),
        Err(e) => {
            error!(error = %e, "failed to create pre-change snapshot");
            None
        }
    };

    let change_id = ChangeId::for_change(category, event.observed_at.timestamp());
    registry.arm(
        change_id,
        event.path,
        category,
        snapshot_id,
        event.kind,
        None,
    );
}

/// Take the exclusive PID lock, writing our PID into the file. The lock
/// is held for the process lifetime via the returned handle.
pub(crate) fn acquire_pid_lock(pid_file: &Path) -> Result<File, LifecycleError> {
    if let Some(parent) = pid_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(pid_file)?;
    file.try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(pid_file.to_path_buf()))?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Non-root startup is permitted but most revert actions will fail.
pub(crate) fn warn_if_not_root() {
    use std::os::unix::fs::MetadataExt;

    match fs::metadata("/proc/self") {
        Ok(meta) if meta.uid() != 0 => {
            warn!(uid = meta.uid(), "running without root privileges; revert actions will likely fail");
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
