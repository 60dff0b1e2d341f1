// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The recovery procedure for an expired timer entry.
//!
//! Order matters: safety snapshot of the post-change state first, then
//! restore, subsystem restart, verification, and an emergency rollback to
//! the safety snapshot if verification fails. A failed revert must never
//! leave the host in a state worse than the post-change one.

use crate::notices::{emit, NoticeSender};
use crate::registry::TimerRegistry;
use crate::templates;
use crate::RevertError;
use confguard_adapters::subprocess::{run_command_line, RESTART_TIMEOUT, VERIFY_TIMEOUT};
use confguard_adapters::ConnectivityChecker;
use confguard_core::{
    CapabilityMap, ChangeCategory, Clock, Notice, SnapshotId, TimerEntry,
};
use confguard_snapshot::SnapshotStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Revert engine tunables.
#[derive(Debug, Clone)]
pub struct RevertConfig {
    /// Extra wait after expiry during which a late confirm is honoured.
    pub grace_period_secs: u64,
    pub connectivity_check: bool,
    pub connectivity_endpoints: Vec<String>,
    pub connectivity_timeout_secs: u64,
}

impl Default for RevertConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 30,
            connectivity_check: true,
            connectivity_endpoints: vec!["8.8.8.8".into(), "1.1.1.1".into()],
            connectivity_timeout_secs: 10,
        }
    }
}

pub struct RevertEngine<C: Clock> {
    store: Arc<SnapshotStore<C>>,
    capabilities: Arc<CapabilityMap>,
    config: RevertConfig,
    notices: NoticeSender,
}

impl<C: Clock> RevertEngine<C> {
    pub fn new(
        store: Arc<SnapshotStore<C>>,
        capabilities: Arc<CapabilityMap>,
        config: RevertConfig,
        notices: NoticeSender,
    ) -> Self {
        Self {
            store,
            capabilities,
            config,
            notices,
        }
    }

    /// Handle one expired entry end to end: expiry notice, connectivity
    /// check, grace period (late confirms honoured), then the revert.
    pub async fn handle_expiry(&self, entry: TimerEntry, registry: &TimerRegistry<C>) {
        emit(
            &self.notices,
            Notice::Expired,
            &entry.change_id,
            &entry.path,
            entry.timeout_seconds,
            0,
        );

        if self.config.connectivity_check {
            let checker = ConnectivityChecker::new(
                self.config.connectivity_endpoints.clone(),
                self.config.connectivity_timeout_secs,
            );
            if checker.any_reachable().await {
                info!("connectivity check passed, but timeout expired - proceeding with revert");
            } else {
                warn!("connectivity check failed - configuration change may have broken connectivity");
            }
        }

        if self.config.grace_period_secs > 0 {
            emit(
                &self.notices,
                Notice::GracePeriod,
                &entry.change_id,
                &entry.path,
                entry.timeout_seconds,
                self.config.grace_period_secs,
            );
            registry.begin_grace(&entry.change_id);
            tokio::time::sleep(Duration::from_secs(self.config.grace_period_secs)).await;
            if registry.end_grace(&entry.change_id) {
                info!(change_id = %entry.change_id, "late confirmation received, skipping revert");
                return;
            }
        }

        let result = self
            .revert_change(&entry.path, entry.category, entry.snapshot_id.as_ref())
            .await;

        let notice = match result {
            Ok(true) => Notice::Reverted,
            Ok(false) => Notice::RevertFailed,
            Err(e) => {
                error!(change_id = %entry.change_id, error = %e, "critical error during revert");
                Notice::RevertError
            }
        };
        emit(
            &self.notices,
            notice,
            &entry.change_id,
            &entry.path,
            entry.timeout_seconds,
            0,
        );
    }

    /// Walk the recovery procedure. `Ok(true)` is a verified revert;
    /// `Ok(false)` means the procedure ran but failed (emergency rollback
    /// already attempted); `Err` is an unexpected breakdown.
    pub async fn revert_change(
        &self,
        path: &Path,
        category: ChangeCategory,
        snapshot_id: Option<&SnapshotId>,
    ) -> Result<bool, RevertError> {
        info!(
            category = %category,
            path = %path.display(),
            "starting revert process"
        );

        // Step 1: capture the post-change state for emergency rollback.
        let safety_id = self.create_safety_snapshot(path, category).await;

        // Step 2: restore the pre-change state.
        let restore_ok = match snapshot_id {
            Some(id) => self.restore_snapshot(id).await?,
            None => {
                warn!(
                    path = %path.display(),
                    "no snapshot available, attempting default restore"
                );
                templates::restore_default(category, path).await
            }
        };

        if !restore_ok {
            error!(path = %path.display(), "failed to restore files");
            self.emergency_restore(safety_id.as_ref()).await;
            return Ok(false);
        }

        // Step 3: restart the affected subsystem. Failure is recorded but
        // verification still runs.
        let restart_ok = self.restart_services(category).await;
        if !restart_ok {
            warn!(
                category = %category,
                "service restart issues - manual intervention may be required"
            );
        }

        // Step 4: verify.
        let verify_ok = self.verify_revert(category).await;

        // Step 5: outcome.
        if verify_ok {
            info!(
                category = %category,
                path = %path.display(),
                snapshot = snapshot_id.map(SnapshotId::name).unwrap_or("default-template"),
                safety = safety_id.as_ref().map(SnapshotId::name).unwrap_or(""),
                "revert completed successfully"
            );
            Ok(true)
        } else {
            error!(category = %category, "revert verification failed");
            self.emergency_restore(safety_id.as_ref()).await;
            Ok(false)
        }
    }

    /// Snapshot the current (post-change) state. Failure degrades the
    /// procedure: it continues without the emergency-rollback option.
    async fn create_safety_snapshot(
        &self,
        path: &Path,
        category: ChangeCategory,
    ) -> Option<SnapshotId> {
        let store = Arc::clone(&self.store);
        let description = format!("Pre-revert backup for {} ({category})", path.display());

        match tokio::task::spawn_blocking(move || store.create(&description)).await {
            Ok(Ok(id)) => {
                debug!(id = %id, "created pre-revert backup");
                Some(id)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "failed to create pre-revert backup, continuing without emergency rollback");
                None
            }
            Err(e) => {
                warn!(error = %e, "pre-revert backup task failed, continuing without emergency rollback");
                None
            }
        }
    }

    async fn restore_snapshot(&self, id: &SnapshotId) -> Result<bool, RevertError> {
        let store = Arc::clone(&self.store);
        let id = id.clone();
        let result = tokio::task::spawn_blocking(move || store.restore(&id)).await?;
        match result {
            Ok(()) => Ok(true),
            Err(e) => {
                error!(error = %e, "snapshot restore failed");
                Ok(false)
            }
        }
    }

    async fn restart_services(&self, category: ChangeCategory) -> bool {
        let Some(commands) = self.capabilities.commands(category) else {
            debug!(category = %category, "no service restart needed");
            return true;
        };
        if commands.restart.is_empty() {
            debug!(category = %category, "no restart command defined");
            return true;
        }

        info!(category = %category, command = %commands.restart, "restarting services");
        match run_command_line(&commands.restart, RESTART_TIMEOUT, "service restart").await {
            Ok(output) if output.status.success() => {
                info!(category = %category, "service restart successful");
                true
            }
            Ok(output) => {
                error!(
                    category = %category,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "service restart failed"
                );
                false
            }
            Err(e) => {
                error!(category = %category, error = %e, "service restart failed");
                false
            }
        }
    }

    /// Best-effort verification; an absent test command counts as success.
    async fn verify_revert(&self, category: ChangeCategory) -> bool {
        let Some(test) = self
            .capabilities
            .commands(category)
            .and_then(|c| c.test.as_deref())
        else {
            debug!(category = %category, "no verification test defined");
            return true;
        };

        debug!(category = %category, command = test, "verifying revert");
        match run_command_line(test, VERIFY_TIMEOUT, "revert verification").await {
            Ok(output) if output.status.success() => true,
            Ok(_) => {
                warn!(category = %category, "revert verification failed");
                false
            }
            Err(e) => {
                warn!(category = %category, error = %e, "revert verification failed");
                false
            }
        }
    }

    /// Roll the host back to the post-change safety snapshot: a known,
    /// if unconfirmed, state.
    async fn emergency_restore(&self, safety_id: Option<&SnapshotId>) {
        let Some(id) = safety_id else {
            error!("no backup available for emergency restore");
            return;
        };

        warn!(id = %id, "performing emergency restore");
        let store = Arc::clone(&self.store);
        let id = id.clone();
        match tokio::task::spawn_blocking(move || store.restore(&id)).await {
            Ok(Ok(())) => info!("emergency restore completed"),
            Ok(Err(e)) => error!(error = %e, "emergency restore failed"),
            Err(e) => error!(error = %e, "emergency restore task failed"),
        }
    }
}

#[cfg(test)]
#[path = "revert_tests.rs"]
mod tests;
