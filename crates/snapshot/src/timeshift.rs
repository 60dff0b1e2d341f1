// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External timeshift backend.
//!
//! Every operation shells out to the `timeshift` binary. Only per-snapshot
//! restore is ever invoked; whole-system rollback is out of scope.

use crate::metadata::{BackendKind, SnapshotMetadata};
use crate::SnapshotError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::process::Command;
use tracing::{debug, warn};

/// Handle to a detected, working timeshift installation.
#[derive(Debug, Clone, Copy)]
pub struct TimeshiftTool;

impl TimeshiftTool {
    /// Probe for a usable timeshift: the binary must exist and `--list`
    /// must succeed (it fails when timeshift is unconfigured).
    pub fn detect() -> Option<Self> {
        let found = Command::new("which")
            .arg("timeshift")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false);
        if !found {
            return None;
        }

        let configured = Command::new("timeshift")
            .arg("--list")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false);
        if !configured {
            warn!("timeshift found but not properly configured");
            return None;
        }

        Some(Self)
    }

    /// Create a snapshot; returns the tool-assigned snapshot name.
    pub fn create(&self, description: &str, now: DateTime<Utc>) -> Result<String, SnapshotError> {
        let output = Command::new("timeshift")
            .args(["--create", "--comments", description, "--tags", "D"])
            .output()
            .map_err(|e| timeshift_err("create", e.to_string()))?;

        if !output.status.success() {
            return Err(timeshift_err(
                "create",
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_create_output(&stdout, now))
    }

    pub fn list(&self) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
        let output = Command::new("timeshift")
            .arg("--list")
            .output()
            .map_err(|e| timeshift_err("list", e.to_string()))?;

        if !output.status.success() {
            return Err(timeshift_err(
                "list",
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(parse_list_output(&String::from_utf8_lossy(&output.stdout)))
    }

    pub fn delete(&self, id: &str) -> Result<(), SnapshotError> {
        self.run_on_snapshot("delete", &["--delete", "--snapshot", id])
    }

    pub fn restore(&self, id: &str) -> Result<(), SnapshotError> {
        self.run_on_snapshot("restore", &["--restore", "--snapshot", id])
    }

    fn run_on_snapshot(&self, action: &'static str, args: &[&str]) -> Result<(), SnapshotError> {
        let output = Command::new("timeshift")
            .args(args)
            .output()
            .map_err(|e| timeshift_err(action, e.to_string()))?;

        if !output.status.success() {
            return Err(timeshift_err(
                action,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        debug!(action, "timeshift operation succeeded");
        Ok(())
    }
}

fn timeshift_err(action: &'static str, detail: String) -> SnapshotError {
    SnapshotError::Timeshift { action, detail }
}

/// Pull the snapshot name out of `timeshift --create` output. The tool
/// prints the name on its success line; fall back to a timestamp-derived
/// name when the output format is unrecognised.
fn parse_create_output(stdout: &str, now: DateTime<Utc>) -> String {
    for line in stdout.lines() {
        if line.contains("Snapshot saved successfully") || line.contains("created in") {
            for token in line.split_whitespace() {
                if token.starts_with("20") && token.contains('_') {
                    return token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-').to_string();
                }
            }
        }
    }
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Parse the snapshot table printed by `timeshift --list`.
fn parse_list_output(stdout: &str) -> Vec<SnapshotMetadata> {
    let mut snapshots = Vec::new();
    let mut in_table = false;

    for line in stdout.lines() {
        let line = line.trim();
        if line.contains("Num") && line.contains("Name") {
            in_table = true;
            continue;
        }
        if !in_table || line.is_empty() || line.starts_with('-') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        // Rows look like `0    >  2026-01-10_11-59-58  D  comment...`;
        // the `>` marker column is absent on some versions.
        let Some(name_idx) = parts
            .iter()
            .position(|t| t.starts_with("20") && t.contains('_'))
        else {
            continue;
        };

        let name = parts[name_idx].to_string();
        let description = parts.get(name_idx + 2..).map(|rest| rest.join(" ")).unwrap_or_default();
        snapshots.push(SnapshotMetadata {
            timestamp: parse_snapshot_name(&name),
            description,
            id: name,
            kind: BackendKind::Timeshift,
            files: Vec::new(),
        });
    }
    snapshots
}

/// Timeshift names snapshots `%Y-%m-%d_%H-%M-%S`; unparseable names sort
/// as oldest.
fn parse_snapshot_name(name: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(name, "%Y-%m-%d_%H-%M-%S")
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
#[path = "timeshift_tests.rs"]
mod tests;
