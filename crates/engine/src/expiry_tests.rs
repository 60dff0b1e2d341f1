// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notices::notice_channel;
use crate::revert::RevertConfig;
use chrono::TimeZone;
use chrono::Utc;
use confguard_core::{
    CapabilityMap, ChangeCategory, ChangeId, EventKind, FakeClock, Notice,
};
use confguard_snapshot::{SnapshotConfig, SnapshotStore};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

async fn wait_for_notice(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<crate::NoticeMessage>,
    wanted: Notice,
) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .unwrap_or(Duration::ZERO);
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(msg)) if msg.notice == wanted => return,
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => panic!("notice {wanted:?} never arrived"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn loop_hands_expired_entries_to_the_engine() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("sshd_config");
    fs::write(&target, "Port 22\n").unwrap();

    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap());
    let store = SnapshotStore::new(
        SnapshotConfig {
            enable_timeshift: false,
            location: tmp.path().join("snapshots"),
            max_snapshots: 10,
            compress: false,
            paths: vec![target.clone()],
        },
        clock.clone(),
    )
    .unwrap();
    let snapshot = store.create("pre-change").unwrap();

    let (notices, mut rx) = notice_channel();
    let registry = Arc::new(TimerRegistry::new(clock.clone(), notices.clone()));
    let engine = Arc::new(RevertEngine::new(
        Arc::new(store),
        Arc::new(CapabilityMap::debian_defaults()),
        RevertConfig {
            grace_period_secs: 0,
            connectivity_check: false,
            ..Default::default()
        },
        notices,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(run_expiry_loop(
        Arc::clone(&registry),
        engine,
        shutdown_rx,
    ));

    registry.arm(
        ChangeId::new("ssh_1"),
        PathBuf::from(&target),
        ChangeCategory::Ssh,
        Some(snapshot),
        EventKind::Modified,
        Some(60),
    );
    fs::write(&target, "tampered\n").unwrap();

    // Jump past the deadline; the fallback scan picks it up within ~1s.
    clock.advance_secs(61);
    wait_for_notice(&mut rx, Notice::Expired).await;

    // The registry entry is gone once handed off.
    assert!(registry.is_empty());

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn loop_stops_on_shutdown() {
    let tmp = TempDir::new().unwrap();
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap());
    let store = SnapshotStore::new(
        SnapshotConfig {
            enable_timeshift: false,
            location: tmp.path().join("snapshots"),
            max_snapshots: 10,
            compress: false,
            paths: vec![],
        },
        clock.clone(),
    )
    .unwrap();

    let (notices, _rx) = notice_channel();
    let registry = Arc::new(TimerRegistry::new(clock, notices.clone()));
    let engine = Arc::new(RevertEngine::new(
        Arc::new(store),
        Arc::new(CapabilityMap::debian_defaults()),
        RevertConfig::default(),
        notices,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(run_expiry_loop(registry, engine, shutdown_rx));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("loop should stop promptly")
        .unwrap();
}
