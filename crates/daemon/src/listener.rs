// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the Unix-socket control surface.
//!
//! Connections are handled in spawned tasks so a slow client never blocks
//! the watcher or the expiry loop.

use crate::lifecycle::{DaemonRegistry, DaemonStore};
use crate::protocol::{self, DaemonStatus, ProtocolError, Request, Response};
use confguard_adapters::ConfigWatcher;
use confguard_core::ChangeId;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Shared daemon context for request handlers.
pub(crate) struct ListenCtx {
    pub registry: Arc<DaemonRegistry>,
    pub store: Arc<DaemonStore>,
    pub watcher: Arc<ConfigWatcher>,
    pub start_time: Instant,
    pub shutdown: Arc<watch::Sender<bool>>,
}

pub(crate) struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub(crate) fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    pub(crate) async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _addr)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        match handle_connection(stream, ctx).await {
                            Ok(()) | Err(ProtocolError::ConnectionClosed) => {}
                            Err(e) => warn!(error = %e, "connection handling failed"),
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    ctx: Arc<ListenCtx>,
) -> Result<(), ProtocolError> {
    loop {
        let bytes = protocol::read_message(&mut stream).await?;
        let request: Request = protocol::decode(&bytes)?;
        debug!(?request, "handling request");
        let response = handle_request(request, &ctx).await;
        protocol::write_message(&mut stream, &response).await?;
    }
}

pub(crate) async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => Response::Status {
            status: DaemonStatus {
                pid: std::process::id(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_seconds: ctx.start_time.elapsed().as_secs(),
                active_timeouts: ctx.registry.list().len(),
                watcher_running: ctx.watcher.is_running(),
                timeshift_available: ctx.store.timeshift_available(),
            },
        },

        Request::ListTimeouts => Response::Timeouts {
            timeouts: ctx.registry.list(),
        },

        Request::Confirm { change_id } => Response::Confirmed {
            confirmed: ctx.registry.confirm(&ChangeId::new(change_id)),
        },

        Request::Cancel { change_id } => Response::Cancelled {
            count: usize::from(ctx.registry.cancel(&ChangeId::new(change_id))),
        },

        Request::CancelAll => Response::Cancelled {
            count: ctx.registry.cancel_all(),
        },

        Request::ListSnapshots => {
            let store = Arc::clone(&ctx.store);
            match tokio::task::spawn_blocking(move || store.list()).await {
                Ok(snapshots) => Response::Snapshots { snapshots },
                Err(e) => error_response(e),
            }
        }

        Request::CreateSnapshot { description } => {
            let store = Arc::clone(&ctx.store);
            match tokio::task::spawn_blocking(move || store.create(&description)).await {
                Ok(Ok(id)) => Response::SnapshotCreated { id },
                Ok(Err(e)) => error_response(e),
                Err(e) => error_response(e),
            }
        }

        Request::DeleteSnapshot { id } => {
            let store = Arc::clone(&ctx.store);
            match tokio::task::spawn_blocking(move || store.delete(&id)).await {
                Ok(Ok(())) => Response::Ok,
                Ok(Err(e)) => error_response(e),
                Err(e) => error_response(e),
            }
        }

        Request::CleanupSnapshots => {
            let store = Arc::clone(&ctx.store);
            match tokio::task::spawn_blocking(move || store.cleanup()).await {
                Ok(deleted) => Response::Cleaned { deleted },
                Err(e) => error_response(e),
            }
        }

        Request::Shutdown => {
            let _ = ctx.shutdown.send(true);
            Response::Ok
        }
    }
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
