// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry processing loop.
//!
//! Waits keyed on the nearest deadline, re-armed whenever the registry's
//! deadline set changes, with a one-second fallback scan. Expired entries
//! are drained out of the registry before the engine runs, so the registry
//! lock is never held across revert I/O.

use crate::registry::TimerRegistry;
use crate::revert::RevertEngine;
use confguard_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Fallback scan interval when no deadline is armed (or as an upper bound
/// on the deadline wait).
const SCAN_INTERVAL: Duration = Duration::from_secs(1);

/// Run until `shutdown` flips to true. The entry being handled when
/// shutdown arrives is finished before the loop returns.
pub async fn run_expiry_loop<C: Clock>(
    registry: Arc<TimerRegistry<C>>,
    engine: Arc<RevertEngine<C>>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("timeout processor started");
    let rearm = registry.rearm_signal();

    loop {
        for entry in registry.take_expired() {
            debug!(change_id = %entry.change_id, "timer expired, handing to revert engine");
            engine.handle_expiry(entry, &registry).await;
        }

        let wait = match registry.next_deadline() {
            Some(deadline) => (deadline - registry.now())
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(SCAN_INTERVAL),
            None => SCAN_INTERVAL,
        };

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = rearm.notified() => {}
            _ = tokio::time::sleep(wait) => {}
        }
    }
    info!("timeout processor stopped");
}

#[cfg(test)]
#[path = "expiry_tests.rs"]
mod tests;
