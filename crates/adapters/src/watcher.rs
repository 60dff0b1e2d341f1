// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file watcher.
//!
//! Watches one recursive directory per unique parent of the monitored set,
//! filters incoming events down to monitored paths, debounces per path,
//! and delivers each admitted event to the downstream callback exactly
//! once, synchronously on the watcher thread.

use chrono::Utc;
use confguard_core::{ChangeEvent, EventKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Per-path suppression window for repeated events.
const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

/// How long `stop` waits for the watcher thread to finish.
const JOIN_DEADLINE: Duration = Duration::from_secs(5);

/// Poll interval for the shutdown flag while the event channel is quiet.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Callback invoked for each admitted change event.
pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Errors from watcher setup.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create filesystem watcher: {0}")]
    Init(#[from] notify::Error),
    #[error("no watchable paths configured")]
    NothingToWatch,
}

/// Watched-path configuration: literal paths and glob patterns, grouped by
/// subsystem plus a free-form custom list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub network_configs: Vec<String>,
    pub ssh_configs: Vec<String>,
    pub firewall_configs: Vec<String>,
    pub service_configs: Vec<String>,
    pub custom_paths: Vec<String>,
}

impl WatchConfig {
    /// Stock watch list for a Debian-family host.
    pub fn default_paths() -> Self {
        Self {
            network_configs: vec![
                "/etc/network/interfaces".into(),
                "/etc/netplan/*.yaml".into(),
                "/etc/NetworkManager/system-connections/*".into(),
                "/etc/systemd/network/*".into(),
            ],
            ssh_configs: vec![
                "/etc/ssh/sshd_config".into(),
                "/etc/ssh/ssh_config.d/*".into(),
            ],
            firewall_configs: vec![
                "/etc/iptables/rules.v4".into(),
                "/etc/iptables/rules.v6".into(),
                "/etc/ufw/*".into(),
                "/etc/firewalld/**/*".into(),
            ],
            service_configs: vec!["/etc/systemd/system/*".into(), "/etc/systemd/user/*".into()],
            custom_paths: vec![],
        }
    }

    /// All configured entries, in group order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.network_configs
            .iter()
            .chain(&self.ssh_configs)
            .chain(&self.firewall_configs)
            .chain(&self.service_configs)
            .chain(&self.custom_paths)
            .map(String::as_str)
    }
}

/// The concrete monitored set after glob expansion, plus the raw patterns
/// for matching files that appear later.
#[derive(Debug, Default)]
pub(crate) struct MonitorSet {
    files: HashSet<PathBuf>,
    directories: Vec<PathBuf>,
    patterns: Vec<glob::Pattern>,
}

impl MonitorSet {
    pub(crate) fn build(config: &WatchConfig) -> Self {
        let mut set = Self::default();

        for entry in config.entries() {
            if is_glob(entry) {
                match glob::Pattern::new(entry) {
                    Ok(pattern) => set.patterns.push(pattern),
                    Err(e) => {
                        warn!(pattern = entry, error = %e, "invalid glob pattern, skipping");
                        continue;
                    }
                }
                match glob::glob(entry) {
                    Ok(matches) => {
                        let mut count = 0usize;
                        for path in matches.flatten().filter(|p| p.exists()) {
                            count += 1;
                            set.add_concrete(path);
                        }
                        debug!(pattern = entry, count, "expanded glob pattern");
                    }
                    Err(e) => warn!(pattern = entry, error = %e, "failed to expand glob pattern"),
                }
            } else {
                let path = PathBuf::from(entry);
                if path.exists() {
                    set.add_concrete(path);
                } else {
                    debug!(path = entry, "monitor path does not exist");
                }
            }
        }
        set
    }

    fn add_concrete(&mut self, path: PathBuf) {
        if path.is_dir() {
            self.directories.push(path);
        } else {
            self.files.insert(path);
        }
    }

    /// An event is delivered iff its path is literally monitored, matches a
    /// monitored glob pattern, or sits under a monitored directory.
    pub(crate) fn matches(&self, path: &Path) -> bool {
        if self.files.contains(path) {
            return true;
        }
        if self.patterns.iter().any(|p| p.matches_path(path)) {
            return true;
        }
        self.directories.iter().any(|dir| path.starts_with(dir))
    }

    /// Unique directories to install recursive watches on.
    pub(crate) fn watch_roots(&self) -> HashSet<PathBuf> {
        let mut roots: HashSet<PathBuf> = self
            .files
            .iter()
            .filter_map(|f| f.parent().map(Path::to_path_buf))
            .collect();
        roots.extend(self.directories.iter().cloned());
        roots
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty() && self.patterns.is_empty()
    }

    pub(crate) fn concrete_len(&self) -> usize {
        self.files.len() + self.directories.len()
    }
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Per-path debounce: the first event on a path opens the window, events
/// inside the window are dropped, and delivery refreshes the window.
#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    recent: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub(crate) fn admit(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(last) = self.recent.get(path) {
            if now.duration_since(*last) < DEBOUNCE_WINDOW {
                return false;
            }
        }
        self.recent.insert(path.to_path_buf(), now);
        true
    }
}

struct RunningWatcher {
    // Held to keep the kernel watches alive; dropped on stop.
    _watcher: RecommendedWatcher,
    thread: std::thread::JoinHandle<()>,
    done_rx: mpsc::Receiver<()>,
}

/// Watches the configured paths and hands admitted events to a callback.
pub struct ConfigWatcher {
    monitor: Arc<MonitorSet>,
    running: Arc<AtomicBool>,
    state: Mutex<Option<RunningWatcher>>,
}

impl ConfigWatcher {
    pub fn new(config: &WatchConfig) -> Self {
        let monitor = MonitorSet::build(config);
        info!(
            paths = monitor.concrete_len(),
            patterns = monitor.patterns.len(),
            "configuration watcher initialized"
        );
        Self {
            monitor: Arc::new(monitor),
            running: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(None),
        }
    }

    /// Start watching. Idempotent: a second call while running warns and
    /// returns.
    pub fn start(&self, callback: ChangeCallback) -> Result<(), WatchError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("configuration watcher is already running");
            return Ok(());
        }
        if self.monitor.is_empty() {
            self.running.store(false, Ordering::SeqCst);
            return Err(WatchError::NothingToWatch);
        }

        let (event_tx, event_rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = event_tx.send(res);
        })?;

        for root in self.monitor.watch_roots() {
            if !root.exists() {
                continue;
            }
            match watcher.watch(&root, RecursiveMode::Recursive) {
                Ok(()) => debug!(dir = %root.display(), "watching directory"),
                Err(e) => error!(dir = %root.display(), error = %e, "failed to watch directory"),
            }
        }

        let (done_tx, done_rx) = mpsc::channel();
        let monitor = Arc::clone(&self.monitor);
        let running = Arc::clone(&self.running);
        let thread = std::thread::spawn(move || {
            event_loop(&monitor, &running, &event_rx, callback);
            let _ = done_tx.send(());
        });

        *self.state.lock() = Some(RunningWatcher {
            _watcher: watcher,
            thread,
            done_rx,
        });
        info!("configuration watcher started");
        Ok(())
    }

    /// Stop watching, waiting up to the join deadline for the thread.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("stopping configuration watcher");

        let Some(state) = self.state.lock().take() else {
            return;
        };
        // Dropping the watcher disconnects the event channel, which the
        // thread observes immediately.
        drop(state._watcher);

        match state.done_rx.recv_timeout(JOIN_DEADLINE) {
            Ok(()) => {
                let _ = state.thread.join();
                info!("configuration watcher stopped");
            }
            Err(_) => warn!("watcher thread did not stop within deadline"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn event_loop(
    monitor: &MonitorSet,
    running: &AtomicBool,
    event_rx: &mpsc::Receiver<notify::Result<notify::Event>>,
    callback: ChangeCallback,
) {
    let mut debouncer = Debouncer::default();

    loop {
        match event_rx.recv_timeout(IDLE_POLL) {
            Ok(Ok(event)) => handle_event(monitor, &mut debouncer, &event, &callback),
            Ok(Err(e)) => warn!(error = %e, "filesystem watch error"),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn handle_event(
    monitor: &MonitorSet,
    debouncer: &mut Debouncer,
    event: &notify::Event,
    callback: &ChangeCallback,
) {
    let Some(kind) = map_event_kind(&event.kind) else {
        return;
    };

    for path in &event.paths {
        if path.is_dir() {
            continue;
        }
        if !monitor.matches(path) {
            continue;
        }
        if !debouncer.admit(path, Instant::now()) {
            continue;
        }

        debug!(path = %path.display(), kind = %kind, "configuration change detected");
        callback(ChangeEvent::new(path.clone(), kind, Utc::now()));
    }
}

fn map_event_kind(kind: &notify::EventKind) -> Option<EventKind> {
    use notify::event::{ModifyKind, RenameMode};

    match kind {
        notify::EventKind::Create(_) => Some(EventKind::Created),
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(EventKind::MovedFrom),
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(EventKind::MovedTo),
        notify::EventKind::Modify(_) => Some(EventKind::Modified),
        _ => None,
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
