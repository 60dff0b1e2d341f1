// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
}

#[test]
fn create_output_yields_snapshot_name() {
    let stdout = "Creating new snapshot...\n\
                  Snapshot saved successfully (RSYNC): 2026-01-10_11-59-58\n";
    assert_eq!(
        parse_create_output(stdout, at_noon()),
        "2026-01-10_11-59-58"
    );
}

#[test]
fn unrecognised_create_output_falls_back_to_timestamp() {
    let stdout = "some unexpected format\n";
    assert_eq!(parse_create_output(stdout, at_noon()), "2026-01-10_12-00-00");
}

#[test]
fn list_output_parses_the_snapshot_table() {
    let stdout = "\
Device : /dev/sda2
Num     Name                 Tags  Description
------------------------------------------------------------------
0    >  2026-01-08_03-00-01  D     scheduled
1    >  2026-01-10_11-59-58  D     pre-change guard
";
    let snapshots = parse_list_output(stdout);
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].id, "2026-01-08_03-00-01");
    assert_eq!(snapshots[1].id, "2026-01-10_11-59-58");
    assert_eq!(snapshots[1].kind, BackendKind::Timeshift);
    assert!(snapshots[1].description.contains("pre-change"));
}

#[test]
fn list_output_without_table_is_empty() {
    assert!(parse_list_output("No snapshots found\n").is_empty());
}

#[test]
fn snapshot_names_parse_to_timestamps() {
    let at = parse_snapshot_name("2026-01-10_11-59-58");
    assert_eq!(
        at,
        Utc.with_ymd_and_hms(2026, 1, 10, 11, 59, 58).unwrap()
    );

    // Unparseable names sort as oldest.
    assert_eq!(parse_snapshot_name("garbage"), DateTime::<Utc>::UNIX_EPOCH);
}
