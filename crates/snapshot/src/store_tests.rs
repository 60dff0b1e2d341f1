// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use confguard_core::FakeClock;
use tempfile::TempDir;

fn store_fixture() -> (TempDir, SnapshotStore<FakeClock>, PathBuf, FakeClock) {
    let tmp = TempDir::new().unwrap();
    let hosts = tmp.path().join("hosts");
    fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();

    let clock = FakeClock::new(chrono::Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap());
    let store = SnapshotStore::new(
        SnapshotConfig {
            enable_timeshift: false,
            location: tmp.path().join("snapshots"),
            max_snapshots: 5,
            compress: false,
            paths: vec![hosts.clone()],
        },
        clock.clone(),
    )
    .unwrap();
    (tmp, store, hosts, clock)
}

#[test]
fn create_assigns_timestamped_manual_ids() {
    let (_tmp, store, _hosts, _clock) = store_fixture();
    let id = store.create("pre-change").unwrap();

    assert!(!id.is_timeshift());
    assert_eq!(id.name(), "confguard_20260110_120000");
}

#[test]
fn round_trip_through_the_store() {
    let (_tmp, store, hosts, _clock) = store_fixture();
    let id = store.create("pre-change").unwrap();

    fs::write(&hosts, "tampered\n").unwrap();
    store.restore(&id).unwrap();

    assert_eq!(fs::read_to_string(&hosts).unwrap(), "127.0.0.1 localhost\n");
}

#[test]
fn list_is_newest_first() {
    let (_tmp, store, _hosts, clock) = store_fixture();
    for _ in 0..3 {
        store.create("snap").unwrap();
        clock.advance_secs(1);
    }

    let listed = store.list();
    assert_eq!(listed.len(), 3);
    assert!(listed[0].timestamp > listed[1].timestamp);
    assert!(listed[1].timestamp > listed[2].timestamp);
}

#[test]
fn cleanup_keeps_the_newest_bounded_set() {
    let (_tmp, store, _hosts, clock) = store_fixture();
    let mut ids = Vec::new();
    for _ in 0..7 {
        ids.push(store.create("snap").unwrap());
        clock.advance_secs(1);
    }

    let deleted = store.cleanup();
    assert_eq!(deleted, 2);

    let remaining = store.list();
    assert_eq!(remaining.len(), 5);
    // The two oldest are gone, the five newest survive.
    let survivors: Vec<&str> = remaining.iter().map(|m| m.id.as_str()).collect();
    assert!(!survivors.contains(&ids[0].name()));
    assert!(!survivors.contains(&ids[1].name()));
    assert!(survivors.contains(&ids[6].name()));
}

#[test]
fn cleanup_is_a_noop_under_the_bound() {
    let (_tmp, store, _hosts, clock) = store_fixture();
    for _ in 0..3 {
        store.create("snap").unwrap();
        clock.advance_secs(1);
    }
    assert_eq!(store.cleanup(), 0);
    assert_eq!(store.list().len(), 3);
}

#[test]
fn info_finds_snapshots_by_tagged_id() {
    let (_tmp, store, _hosts, _clock) = store_fixture();
    let id = store.create("described").unwrap();

    let meta = store.info(&id).unwrap();
    assert_eq!(meta.description, "described");
    assert_eq!(meta.snapshot_id(), id);
}

#[test]
fn timeshift_restore_falls_back_to_the_manual_backend() {
    let (_tmp, store, hosts, _clock) = store_fixture();
    // A snapshot the manual backend holds, addressed by a timeshift tag
    // whose tool is gone: the restore must still go through.
    let id = store.create("pre-change").unwrap();
    fs::write(&hosts, "tampered\n").unwrap();

    let timeshift_tagged = confguard_core::SnapshotId::Timeshift(id.name().to_string());
    store.restore(&timeshift_tagged).unwrap();
    assert_eq!(fs::read_to_string(&hosts).unwrap(), "127.0.0.1 localhost\n");
}

#[test]
fn timeshift_delete_falls_back_to_the_manual_backend() {
    let (_tmp, store, _hosts, _clock) = store_fixture();
    let id = store.create("pre-change").unwrap();

    let timeshift_tagged = confguard_core::SnapshotId::Timeshift(id.name().to_string());
    store.delete(&timeshift_tagged).unwrap();
    assert!(store.list().is_empty());
}

#[test]
fn fallback_restore_of_a_snapshot_neither_backend_holds_fails() {
    let (_tmp, store, _hosts, _clock) = store_fixture();
    let id = confguard_core::SnapshotId::Timeshift("2026-01-10_11-59-58".into());
    assert!(matches!(
        store.restore(&id),
        Err(SnapshotError::NotFound(_))
    ));
}
