// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! confguard daemon (confguardd)
//!
//! Root-privileged background agent that guards against administrator
//! lock-out: watched configuration changes are snapshotted and armed with
//! a confirmation timeout; unconfirmed changes are reverted and the
//! affected subsystem restarted.
//!
//! Long-lived activities:
//! - Watcher thread: kernel event notification, debounce, snapshot + arm
//! - Expiry loop: deadline-keyed waits, hands expired entries to the engine
//! - Listener task: Unix-socket control surface (confirm, status, ...)

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod lifecycle;
mod listener;
mod protocol;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use config::DaemonConfig;
use confguard_adapters::{DesktopNotifyAdapter, NoOpNotifyAdapter};
use confguard_engine::{run_expiry_loop, run_notifier};
use lifecycle::LifecycleError;
use listener::{ListenCtx, Listener};
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => return Ok(()),
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("Usage: confguardd [--config <path>] [--help | --version]");
            std::process::exit(1);
        }
    };

    // Configuration parse errors are fatal startup errors.
    let config = match DaemonConfig::load(&args.config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    rotate_log_if_needed(&config.global.log_file);
    let log_guard = setup_logging(&config)?;

    info!("starting confguard daemon");
    lifecycle::warn_if_not_root();

    let _pid_lock = match lifecycle::acquire_pid_lock(&config.global.pid_file) {
        Ok(lock) => lock,
        Err(LifecycleError::LockFailed(path)) => {
            let pid = std::fs::read_to_string(&path).unwrap_or_default();
            eprintln!("confguardd is already running");
            if !pid.trim().is_empty() {
                eprintln!("  pid: {}", pid.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {e}");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let lifecycle::Components {
        registry,
        store,
        engine,
        watcher,
        notice_rx,
    } = lifecycle::build_components(&config)?;

    // Notice fan-out to the configured notification sink.
    if config.notifications.desktop_enabled {
        tokio::spawn(run_notifier(notice_rx, DesktopNotifyAdapter::new()));
    } else {
        tokio::spawn(run_notifier(notice_rx, NoOpNotifyAdapter::new()));
    }

    // Watcher thread: snapshot + arm on every admitted change.
    lifecycle::start_watch_pipeline(&watcher, Arc::clone(&registry), Arc::clone(&store))?;

    // Expiry loop.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let expiry_task = tokio::spawn(run_expiry_loop(
        Arc::clone(&registry),
        Arc::clone(&engine),
        shutdown_rx,
    ));

    // Control socket.
    let socket_path = &config.global.socket_path;
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let unix_listener = UnixListener::bind(socket_path)?;
    let ctx = Arc::new(ListenCtx {
        registry: Arc::clone(&registry),
        store: Arc::clone(&store),
        watcher: Arc::clone(&watcher),
        start_time: Instant::now(),
        shutdown: Arc::clone(&shutdown_tx),
    });
    tokio::spawn(Listener::new(unix_listener, ctx).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut shutdown_seen = shutdown_tx.subscribe();

    info!(socket = %socket_path.display(), "daemon ready");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        _ = shutdown_seen.changed() => info!("shutdown requested via command"),
    }

    // Ordered shutdown: stop feeding the registry, then let the expiry
    // loop finish its current entry. Armed entries are intentionally lost.
    let _ = shutdown_tx.send(true);
    watcher.stop();
    let _ = expiry_task.await;

    let _ = std::fs::remove_file(socket_path);
    let _ = std::fs::remove_file(&config.global.pid_file);
    info!("daemon stopped");
    Ok(())
}

struct CliArgs {
    config_path: PathBuf,
}

impl CliArgs {
    /// Parse daemon arguments. `Ok(None)` means an informational flag was
    /// handled and the process should exit successfully.
    fn parse(args: impl Iterator<Item = String>) -> Result<Option<Self>, String> {
        let mut config_path = env::config_path();
        let mut args = args;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--version" | "-V" => {
                    println!("confguardd {}", env!("CARGO_PKG_VERSION"));
                    return Ok(None);
                }
                "--help" | "-h" => {
                    println!("confguardd {}", env!("CARGO_PKG_VERSION"));
                    println!("Configuration-change guard daemon: snapshots watched config");
                    println!("changes and reverts them unless confirmed in time.");
                    println!();
                    println!("USAGE:");
                    println!("    confguardd [--config <path>]");
                    println!();
                    println!("OPTIONS:");
                    println!("    --config <path>  Configuration file (default: {})", env::DEFAULT_CONFIG_PATH);
                    println!("    -h, --help       Print help information");
                    println!("    -V, --version    Print version information");
                    return Ok(None);
                }
                "--config" => {
                    let value = args.next().ok_or("--config requires a path")?;
                    config_path = PathBuf::from(value);
                }
                other => return Err(format!("unexpected argument '{other}'")),
            }
        }

        Ok(Some(Self { config_path }))
    }
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log at startup when it exceeds [`MAX_LOG_SIZE`].
/// Best-effort: rotation failures never block startup.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let _ = std::fs::rename(format!("{log_str}.{i}"), format!("{log_str}.{}", i + 1));
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = &config.global.log_file;
    let parent = log_path
        .parent()
        .ok_or_else(|| std::io::Error::other("log file has no parent directory"))?;
    std::fs::create_dir_all(parent)?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| std::io::Error::other("log file has no file name"))?;

    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.global.log_level.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
