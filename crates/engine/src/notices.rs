// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notice fan-out.
//!
//! Registry and revert engine log every notice at its contract severity
//! and forward a copy over an unbounded channel; the daemon drains the
//! channel into a notification adapter. The channel send is synchronous so
//! notices can be emitted from the watcher thread.

use confguard_adapters::NotifyAdapter;
use confguard_core::{ChangeId, Notice, Severity};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One emitted notice, preformatted.
#[derive(Debug, Clone)]
pub struct NoticeMessage {
    pub notice: Notice,
    pub change_id: ChangeId,
    pub path: PathBuf,
    pub message: String,
}

pub type NoticeSender = mpsc::UnboundedSender<NoticeMessage>;

pub fn notice_channel() -> (NoticeSender, mpsc::UnboundedReceiver<NoticeMessage>) {
    mpsc::unbounded_channel()
}

/// Log a notice at its severity and forward it to the notifier task.
pub(crate) fn emit(
    tx: &NoticeSender,
    notice: Notice,
    change_id: &ChangeId,
    path: &Path,
    timeout_seconds: u64,
    grace_seconds: u64,
) {
    let message = notice.message(path, timeout_seconds, grace_seconds);
    match notice.severity() {
        Severity::Info => info!(change_id = %change_id, event = notice.as_str(), "{message}"),
        Severity::Warn => warn!(change_id = %change_id, event = notice.as_str(), "{message}"),
        Severity::Error => error!(change_id = %change_id, event = notice.as_str(), "{message}"),
    }

    let _ = tx.send(NoticeMessage {
        notice,
        change_id: change_id.clone(),
        path: path.to_path_buf(),
        message,
    });
}

/// Drain notices into a notification adapter until the channel closes.
pub async fn run_notifier<N: NotifyAdapter>(
    mut rx: mpsc::UnboundedReceiver<NoticeMessage>,
    adapter: N,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = adapter.notify("confguard", &msg.message).await {
            warn!(error = %e, "failed to deliver notification");
        }
    }
}
