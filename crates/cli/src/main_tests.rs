// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::CommandFactory;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn confirm_takes_a_change_id() {
    let cli = Cli::try_parse_from(["confguard", "confirm", "ssh_1700000000"]).unwrap();
    match cli.command {
        Command::Confirm { change_id } => assert_eq!(change_id, "ssh_1700000000"),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn snapshot_create_defaults_its_description() {
    let cli = Cli::try_parse_from(["confguard", "snapshot", "create"]).unwrap();
    match cli.command {
        Command::Snapshot(SnapshotCommand::Create { description }) => {
            assert_eq!(description, "Manual snapshot");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn config_flag_is_global() {
    let cli = Cli::try_parse_from(["confguard", "status", "--config", "/tmp/c.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
}

#[test]
fn config_path_falls_back_to_the_default() {
    // Flag wins when present.
    assert_eq!(
        config_path(Some(PathBuf::from("/tmp/a.toml"))),
        PathBuf::from("/tmp/a.toml")
    );
}
