// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notices::{notice_channel, NoticeMessage};
use chrono::TimeZone;
use confguard_core::FakeClock;
use tokio::sync::mpsc::UnboundedReceiver;

fn registry() -> (
    TimerRegistry<FakeClock>,
    FakeClock,
    UnboundedReceiver<NoticeMessage>,
) {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap());
    let (tx, rx) = notice_channel();
    (TimerRegistry::new(clock.clone(), tx), clock, rx)
}

fn arm_path(registry: &TimerRegistry<FakeClock>, path: &str, timeout: Option<u64>) -> ChangeId {
    let category = ChangeCategory::from_path(path);
    let change_id = ChangeId::for_change(category, registry.now().timestamp());
    registry.arm(
        change_id.clone(),
        PathBuf::from(path),
        category,
        None,
        EventKind::Modified,
        timeout,
    );
    change_id
}

fn drain(rx: &mut UnboundedReceiver<NoticeMessage>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        notices.push(msg.notice);
    }
    notices
}

#[test]
fn arm_registers_a_started_timeout() {
    let (registry, _clock, mut rx) = registry();
    let id = arm_path(&registry, "/etc/ssh/sshd_config", None);

    let listed = registry.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].change_id, id);
    assert_eq!(listed[0].timeout_seconds, 900);
    assert_eq!(listed[0].remaining_seconds, 900);
    assert_eq!(drain(&mut rx), vec![Notice::Started]);
}

#[test]
fn arm_clamps_requested_timeouts() {
    let (registry, _clock, _rx) = registry();
    arm_path(&registry, "/etc/hosts", Some(5));
    assert_eq!(registry.list()[0].timeout_seconds, 60);

    arm_path(&registry, "/etc/hostname", Some(1_000_000));
    let listed = registry.list();
    let hostname = listed
        .iter()
        .find(|t| t.path.ends_with("hostname"))
        .unwrap();
    assert_eq!(hostname.timeout_seconds, 1800);
}

#[test]
fn arming_the_same_path_supersedes_the_old_entry() {
    let (registry, clock, mut rx) = registry();
    let first = arm_path(&registry, "/etc/network/interfaces", None);
    clock.advance_secs(5);
    let second = arm_path(&registry, "/etc/network/interfaces", None);

    let listed = registry.list();
    assert_eq!(listed.len(), 1, "one timer per path");
    assert_eq!(listed[0].change_id, second);
    assert_ne!(first, second);
    assert_eq!(
        drain(&mut rx),
        vec![Notice::Started, Notice::Superseded, Notice::Started]
    );
}

#[test]
fn distinct_paths_keep_independent_timers() {
    let (registry, _clock, _rx) = registry();
    arm_path(&registry, "/etc/ssh/sshd_config", None);
    arm_path(&registry, "/etc/hosts", None);
    assert_eq!(registry.list().len(), 2);
}

#[test]
fn confirm_removes_the_entry() {
    let (registry, _clock, mut rx) = registry();
    let id = arm_path(&registry, "/etc/ssh/sshd_config", None);

    assert!(registry.confirm(&id));
    assert!(registry.is_empty());
    assert_eq!(drain(&mut rx), vec![Notice::Started, Notice::Confirmed]);
}

#[test]
fn confirm_unknown_id_is_a_warned_noop() {
    let (registry, _clock, mut rx) = registry();
    assert!(!registry.confirm(&ChangeId::new("ssh_123")));
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn cancel_removes_without_confirmed_notice() {
    let (registry, _clock, mut rx) = registry();
    let id = arm_path(&registry, "/etc/hosts", None);

    assert!(registry.cancel(&id));
    assert!(registry.is_empty());
    assert_eq!(drain(&mut rx), vec![Notice::Started]);
    assert!(!registry.cancel(&id));
}

#[test]
fn cancel_all_reports_the_count() {
    let (registry, _clock, _rx) = registry();
    arm_path(&registry, "/etc/hosts", None);
    arm_path(&registry, "/etc/ssh/sshd_config", None);
    assert_eq!(registry.cancel_all(), 2);
    assert!(registry.is_empty());
}

#[test]
fn list_computes_remaining_and_floors_at_zero() {
    let (registry, clock, _rx) = registry();
    arm_path(&registry, "/etc/hosts", Some(60));

    clock.advance_secs(45);
    assert_eq!(registry.list()[0].remaining_seconds, 15);

    clock.advance_secs(100);
    assert_eq!(registry.list()[0].remaining_seconds, 0);
}

#[test]
fn take_expired_drains_only_due_entries() {
    let (registry, clock, _rx) = registry();
    let short = arm_path(&registry, "/etc/hosts", Some(60));
    arm_path(&registry, "/etc/ssh/sshd_config", Some(900));

    clock.advance_secs(61);
    let expired = registry.take_expired();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].change_id, short);

    // The drained entry is gone; the long timer remains armed.
    assert_eq!(registry.list().len(), 1);
    assert!(registry.take_expired().is_empty());
}

#[test]
fn next_deadline_is_the_earliest_expiry() {
    let (registry, _clock, _rx) = registry();
    assert!(registry.next_deadline().is_none());

    arm_path(&registry, "/etc/ssh/sshd_config", Some(900));
    arm_path(&registry, "/etc/hosts", Some(60));

    let deadline = registry.next_deadline().unwrap();
    assert_eq!(deadline, registry.now() + chrono::Duration::seconds(60));
}

#[test]
fn grace_window_honours_late_confirms() {
    let (registry, clock, _rx) = registry();
    let id = arm_path(&registry, "/etc/hosts", Some(60));
    clock.advance_secs(61);
    let expired = registry.take_expired();
    assert_eq!(expired.len(), 1);

    registry.begin_grace(&id);
    assert!(registry.confirm(&id), "late confirm succeeds during grace");
    assert!(registry.end_grace(&id), "grace window saw the confirm");
}

#[test]
fn grace_window_without_confirm_reports_unconfirmed() {
    let (registry, _clock, _rx) = registry();
    let id = ChangeId::new("network_1");
    registry.begin_grace(&id);
    assert!(!registry.end_grace(&id));
    // Window is closed now; a confirm after it is unknown.
    assert!(!registry.confirm(&id));
}
