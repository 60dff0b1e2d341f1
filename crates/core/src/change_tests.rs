// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn change_id_format() {
    let id = ChangeId::for_change(ChangeCategory::Ssh, 1_700_000_000);
    assert_eq!(id.as_str(), "ssh_1700000000");
}

#[test]
fn change_id_category_parses_prefix() {
    let id = ChangeId::for_change(ChangeCategory::Firewall, 42);
    assert_eq!(id.category(), Some(ChangeCategory::Firewall));

    let malformed = ChangeId::new("no-separator");
    assert_eq!(malformed.category(), None);

    let unknown = ChangeId::new("bogus_123");
    assert_eq!(unknown.category(), None);
}

#[test]
fn change_id_serde() {
    let id = ChangeId::new("network_1700000000");
    let json = serde_json::to_string(&id).unwrap();
    let parsed: ChangeId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn event_kind_names() {
    assert_eq!(EventKind::Created.as_str(), "created");
    assert_eq!(EventKind::Modified.as_str(), "modified");
    assert_eq!(EventKind::MovedFrom.as_str(), "moved_from");
    assert_eq!(EventKind::MovedTo.as_str(), "moved_to");
}

#[test]
fn change_event_categorises_its_path() {
    let at = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
    let event = ChangeEvent::new("/etc/ssh/sshd_config", EventKind::Modified, at);
    assert_eq!(event.category(), ChangeCategory::Ssh);

    let event = ChangeEvent::new("/etc/hosts", EventKind::Created, at);
    assert_eq!(event.category(), ChangeCategory::System);
}
