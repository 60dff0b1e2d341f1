// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use confguard_daemon::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT};
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (cannot connect to {0})")]
    DaemonNotRunning(PathBuf),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("request timed out")]
    Timeout,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Send one request and await its response.
    pub async fn request(&self, request: Request) -> Result<Response, ClientError> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|_| ClientError::DaemonNotRunning(self.socket_path.clone()))?;

        protocol::write_message(&mut stream, &request).await?;

        let bytes = tokio::time::timeout(DEFAULT_TIMEOUT, protocol::read_message(&mut stream))
            .await
            .map_err(|_| ClientError::Timeout)??;
        Ok(protocol::decode(&bytes)?)
    }
}
