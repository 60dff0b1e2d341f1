// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers: map CLI verbs onto protocol requests and print the
//! results.

use crate::client::DaemonClient;
use crate::{Command, SnapshotCommand};
use anyhow::{anyhow, bail};
use confguard_daemon::protocol::{DaemonStatus, Request, Response};
use confguard_engine::ActiveTimeout;
use confguard_snapshot::SnapshotMetadata;

pub async fn run(command: Command, client: &DaemonClient) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            let status = match client.request(Request::Status).await? {
                Response::Status { status } => status,
                other => bail!("unexpected response: {other:?}"),
            };
            print!("{}", format_status(&status));
        }

        Command::Timeouts => {
            let timeouts = match client.request(Request::ListTimeouts).await? {
                Response::Timeouts { timeouts } => timeouts,
                other => bail!("unexpected response: {other:?}"),
            };
            print!("{}", format_timeouts(&timeouts));
        }

        Command::Confirm { change_id } => {
            match client.request(Request::Confirm { change_id: change_id.clone() }).await? {
                Response::Confirmed { confirmed: true } => {
                    println!("Change confirmed: {change_id}");
                }
                Response::Confirmed { confirmed: false } => {
                    bail!("no pending change with id {change_id}");
                }
                other => bail!("unexpected response: {other:?}"),
            }
        }

        Command::Cancel { change_id } => {
            match client.request(Request::Cancel { change_id: change_id.clone() }).await? {
                Response::Cancelled { count: 1 } => println!("Timeout cancelled: {change_id}"),
                Response::Cancelled { .. } => bail!("no pending timeout with id {change_id}"),
                other => bail!("unexpected response: {other:?}"),
            }
        }

        Command::CancelAll => {
            match client.request(Request::CancelAll).await? {
                Response::Cancelled { count } => println!("Cancelled {count} timeout(s)"),
                other => bail!("unexpected response: {other:?}"),
            }
        }

        Command::Snapshot(action) => run_snapshot(action, client).await?,

        Command::Shutdown => {
            match client.request(Request::Shutdown).await? {
                Response::Ok => println!("Shutdown requested"),
                other => bail!("unexpected response: {other:?}"),
            }
        }
    }
    Ok(())
}

async fn run_snapshot(action: SnapshotCommand, client: &DaemonClient) -> anyhow::Result<()> {
    match action {
        SnapshotCommand::List => {
            let snapshots = list_snapshots(client).await?;
            print!("{}", format_snapshots(&snapshots));
        }

        SnapshotCommand::Create { description } => {
            match client.request(Request::CreateSnapshot { description }).await? {
                Response::SnapshotCreated { id } => println!("Snapshot created: {id}"),
                Response::Error { message } => bail!("snapshot creation failed: {message}"),
                other => bail!("unexpected response: {other:?}"),
            }
        }

        SnapshotCommand::Delete { id } => {
            // Resolve the bare name to a tagged id so the daemon routes the
            // delete to the owning backend.
            let snapshots = list_snapshots(client).await?;
            let meta = snapshots
                .iter()
                .find(|meta| meta.id == id)
                .ok_or_else(|| anyhow!("no snapshot named {id}"))?;

            match client
                .request(Request::DeleteSnapshot { id: meta.snapshot_id() })
                .await?
            {
                Response::Ok => println!("Snapshot deleted: {id}"),
                Response::Error { message } => bail!("snapshot deletion failed: {message}"),
                other => bail!("unexpected response: {other:?}"),
            }
        }

        SnapshotCommand::Cleanup => {
            match client.request(Request::CleanupSnapshots).await? {
                Response::Cleaned { deleted } => println!("Deleted {deleted} old snapshot(s)"),
                other => bail!("unexpected response: {other:?}"),
            }
        }
    }
    Ok(())
}

async fn list_snapshots(client: &DaemonClient) -> anyhow::Result<Vec<SnapshotMetadata>> {
    match client.request(Request::ListSnapshots).await? {
        Response::Snapshots { snapshots } => Ok(snapshots),
        other => bail!("unexpected response: {other:?}"),
    }
}

fn format_status(status: &DaemonStatus) -> String {
    let mut out = String::new();
    out.push_str("confguard daemon\n");
    out.push_str(&format!("  pid:              {}\n", status.pid));
    out.push_str(&format!("  version:          {}\n", status.version));
    out.push_str(&format!("  uptime:           {}s\n", status.uptime_seconds));
    out.push_str(&format!("  active timeouts:  {}\n", status.active_timeouts));
    out.push_str(&format!(
        "  watcher:          {}\n",
        if status.watcher_running { "running" } else { "stopped" }
    ));
    out.push_str(&format!(
        "  timeshift:        {}\n",
        if status.timeshift_available { "available" } else { "unavailable" }
    ));
    out
}

fn format_timeouts(timeouts: &[ActiveTimeout]) -> String {
    if timeouts.is_empty() {
        return "No pending timeouts\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:<10} {:>10}  PATH\n",
        "CHANGE ID", "CATEGORY", "REMAINING"
    ));
    for timeout in timeouts {
        out.push_str(&format!(
            "{:<24} {:<10} {:>9}s  {}\n",
            timeout.change_id,
            timeout.category.as_str(),
            timeout.remaining_seconds,
            timeout.path.display()
        ));
    }
    out
}

fn format_snapshots(snapshots: &[SnapshotMetadata]) -> String {
    if snapshots.is_empty() {
        return "No snapshots\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<32} {:<10} {:<20}  DESCRIPTION\n",
        "ID", "TYPE", "CREATED"
    ));
    for meta in snapshots {
        out.push_str(&format!(
            "{:<32} {:<10} {:<20}  {}\n",
            meta.id,
            match meta.kind {
                confguard_snapshot::BackendKind::Manual => "manual",
                confguard_snapshot::BackendKind::Timeshift => "timeshift",
            },
            meta.timestamp.format("%Y-%m-%d %H:%M:%S"),
            meta.description
        ));
    }
    out
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
