// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the revert engine

use confguard_snapshot::SnapshotError;
use thiserror::Error;

/// Unexpected failures while running the recovery procedure. Ordinary
/// step failures (restore/restart/verify) are outcomes, not errors.
#[derive(Debug, Error)]
pub enum RevertError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
