// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! confguard CLI: operator command surface for the confguard daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;

use clap::{Parser, Subcommand};
use client::DaemonClient;
use confguard_daemon::DaemonConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "confguard", version, about = "Control the confguard daemon")]
struct Cli {
    /// Configuration file (used to locate the daemon socket)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show daemon status
    Status,
    /// List pending change timeouts
    Timeouts,
    /// Confirm a pending change, cancelling its revert timer
    Confirm {
        /// Change id as reported in the timeout listing
        change_id: String,
    },
    /// Cancel a pending timeout without confirming the change
    Cancel {
        change_id: String,
    },
    /// Cancel every pending timeout
    CancelAll,
    /// Snapshot operations
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
    /// Stop the daemon
    Shutdown,
}

#[derive(Debug, Subcommand)]
enum SnapshotCommand {
    /// List snapshots, newest first
    List,
    /// Create a snapshot of the critical configuration paths
    Create {
        #[arg(default_value = "Manual snapshot")]
        description: String,
    },
    /// Delete a snapshot by id
    Delete {
        id: String,
    },
    /// Delete snapshots beyond the retention bound
    Cleanup,
}

/// Resolve the config path: flag, then CONFGUARD_CONFIG, then the default.
fn config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("CONFGUARD_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/etc/confguard/config.toml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = DaemonConfig::load(&config_path(cli.config))?;
    let client = DaemonClient::new(config.global.socket_path.clone());

    commands::run(cli.command, &client).await
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
