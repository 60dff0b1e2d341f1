// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with per-call wall-clock timeouts.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Timeout for subsystem restart commands during a revert.
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for revert verification commands.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack added on top of the ping deadline for the ping subprocess itself.
pub const PING_GRACE: Duration = Duration::from_secs(5);

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{description} failed to run: {source}")]
    Spawn {
        description: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{description} timed out after {timeout_secs}s")]
    TimedOut {
        description: String,
        timeout_secs: u64,
    },
    #[error("{description}: empty command line")]
    EmptyCommand { description: String },
}

/// Run a prepared command, killing it when the timeout elapses.
///
/// A non-zero exit is not an error here; callers inspect `Output::status`.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, CommandError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(CommandError::Spawn {
            description: description.to_string(),
            source,
        }),
        Err(_elapsed) => Err(CommandError::TimedOut {
            description: description.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
    }
}

/// Run a whitespace-separated command line, as capability-map entries and
/// default templates specify their commands.
pub async fn run_command_line(
    command_line: &str,
    timeout: Duration,
    description: &str,
) -> Result<Output, CommandError> {
    let mut parts = command_line.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(CommandError::EmptyCommand {
            description: description.to_string(),
        });
    };

    let mut cmd = Command::new(program);
    cmd.args(parts);
    run_with_timeout(cmd, timeout, description).await
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
