// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::DaemonConfig;
use chrono::Utc;
use confguard_core::EventKind;
use tempfile::TempDir;

fn test_config(tmp: &TempDir) -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.snapshot.enable_timeshift = false;
    config.snapshot.location = tmp.path().join("snapshots");
    config.snapshot.compress_snapshots = false;
    config.global.pid_file = tmp.path().join("confguardd.pid");
    config
}

#[test]
fn pid_lock_writes_our_pid() {
    let tmp = TempDir::new().unwrap();
    let pid_file = tmp.path().join("run/confguardd.pid");

    let _lock = acquire_pid_lock(&pid_file).unwrap();
    let written = fs::read_to_string(&pid_file).unwrap();
    assert_eq!(written.trim(), std::process::id().to_string());
}

#[test]
fn second_lock_attempt_fails_while_held() {
    let tmp = TempDir::new().unwrap();
    let pid_file = tmp.path().join("confguardd.pid");

    let _held = acquire_pid_lock(&pid_file).unwrap();
    assert!(matches!(
        acquire_pid_lock(&pid_file),
        Err(LifecycleError::LockFailed(_))
    ));
}

#[test]
fn lock_is_released_on_drop() {
    let tmp = TempDir::new().unwrap();
    let pid_file = tmp.path().join("confguardd.pid");

    let held = acquire_pid_lock(&pid_file).unwrap();
    drop(held);
    assert!(acquire_pid_lock(&pid_file).is_ok());
}

#[test]
fn build_components_wires_the_store_and_registry() {
    let tmp = TempDir::new().unwrap();
    let components = build_components(&test_config(&tmp)).unwrap();

    assert!(components.registry.is_empty());
    assert!(!components.store.timeshift_available());
    assert!(!components.watcher.is_running());
}

#[test]
fn handle_change_snapshots_then_arms() {
    let tmp = TempDir::new().unwrap();
    let watched = tmp.path().join("sshd_config");
    fs::write(&watched, "Port 22\n").unwrap();

    let mut config = test_config(&tmp);
    config.monitoring = crate::config::MonitoringSection(confguard_adapters::WatchConfig {
        ssh_configs: vec![watched.to_string_lossy().into_owned()],
        ..Default::default()
    });
    let components = build_components(&config).unwrap();

    let event = ChangeEvent::new(watched.clone(), EventKind::Modified, Utc::now());
    handle_change(&components.registry, &components.store, event);

    let timeouts = components.registry.list();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].path, watched);
    assert!(
        timeouts[0].snapshot_id.is_some(),
        "pre-change snapshot recorded on the entry"
    );
    assert_eq!(components.store.list().len(), 1);
}
