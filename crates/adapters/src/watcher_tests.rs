// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;

fn config_for(entries: Vec<String>) -> WatchConfig {
    WatchConfig {
        custom_paths: entries,
        ..Default::default()
    }
}

#[test]
fn build_keeps_existing_literals_and_drops_missing_ones() {
    let tmp = TempDir::new().unwrap();
    let present = tmp.path().join("sshd_config");
    fs::write(&present, "Port 22\n").unwrap();
    let missing = tmp.path().join("absent.conf");

    let set = MonitorSet::build(&config_for(vec![
        present.to_string_lossy().into_owned(),
        missing.to_string_lossy().into_owned(),
    ]));

    assert!(set.matches(&present));
    assert!(!set.matches(&missing));
    assert_eq!(set.concrete_len(), 1);
}

#[test]
fn glob_patterns_match_files_created_later() {
    let tmp = TempDir::new().unwrap();
    let pattern = tmp.path().join("*.yaml").to_string_lossy().into_owned();
    let set = MonitorSet::build(&config_for(vec![pattern]));

    // Nothing matched at expansion time, but the pattern still admits a
    // file that appears afterwards.
    let late = tmp.path().join("01-netcfg.yaml");
    assert!(set.matches(&late));
    assert!(!set.matches(&tmp.path().join("01-netcfg.conf")));
}

#[test]
fn files_under_a_monitored_directory_match() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("conf.d");
    fs::create_dir(&dir).unwrap();

    let set = MonitorSet::build(&config_for(vec![dir.to_string_lossy().into_owned()]));
    assert!(set.matches(&dir.join("anything.conf")));
    assert!(!set.matches(&tmp.path().join("outside.conf")));
}

#[test]
fn watch_roots_group_files_by_parent() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.conf");
    let b = tmp.path().join("b.conf");
    fs::write(&a, "").unwrap();
    fs::write(&b, "").unwrap();

    let set = MonitorSet::build(&config_for(vec![
        a.to_string_lossy().into_owned(),
        b.to_string_lossy().into_owned(),
    ]));
    let roots = set.watch_roots();
    assert_eq!(roots.len(), 1);
    assert!(roots.contains(tmp.path()));
}

#[test]
fn debouncer_opens_and_refreshes_the_window() {
    let mut debouncer = Debouncer::default();
    let path = Path::new("/etc/hosts");
    let t0 = Instant::now();

    assert!(debouncer.admit(path, t0));
    assert!(!debouncer.admit(path, t0 + Duration::from_millis(500)));
    assert!(!debouncer.admit(path, t0 + Duration::from_millis(1_900)));
    assert!(debouncer.admit(path, t0 + Duration::from_secs(2)));
}

#[test]
fn debouncer_tracks_paths_independently() {
    let mut debouncer = Debouncer::default();
    let t0 = Instant::now();

    assert!(debouncer.admit(Path::new("/etc/hosts"), t0));
    assert!(debouncer.admit(Path::new("/etc/hostname"), t0));
}

#[test]
fn entries_iterates_groups_in_order() {
    let config = WatchConfig {
        network_configs: vec!["/etc/network/interfaces".into()],
        ssh_configs: vec!["/etc/ssh/sshd_config".into()],
        custom_paths: vec!["/opt/app.conf".into()],
        ..Default::default()
    };
    let entries: Vec<&str> = config.entries().collect();
    assert_eq!(
        entries,
        vec![
            "/etc/network/interfaces",
            "/etc/ssh/sshd_config",
            "/opt/app.conf"
        ]
    );
}

#[test]
fn default_paths_cover_all_groups() {
    let config = WatchConfig::default_paths();
    assert!(!config.network_configs.is_empty());
    assert!(!config.ssh_configs.is_empty());
    assert!(!config.firewall_configs.is_empty());
    assert!(!config.service_configs.is_empty());
}

// Live-watch tests: exercise the real notify backend against a temp tree.

fn collecting_callback() -> (ChangeCallback, Arc<Mutex<Vec<ChangeEvent>>>) {
    let seen: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ChangeCallback = Arc::new(move |event| {
        sink.lock().push(event);
    });
    (callback, seen)
}

fn wait_for_events(seen: &Arc<Mutex<Vec<ChangeEvent>>>, at_least: usize) {
    for _ in 0..40 {
        if seen.lock().len() >= at_least {
            return;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

#[test]
fn delivers_exactly_one_callback_for_a_burst_of_writes() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("sshd_config");
    fs::write(&target, "Port 22\n").unwrap();

    let watcher = ConfigWatcher::new(&config_for(vec![target.to_string_lossy().into_owned()]));
    let (callback, seen) = collecting_callback();
    watcher.start(callback).unwrap();

    // Two writes inside the debounce window: one delivery.
    fs::write(&target, "Port 22\nPermitRootLogin no\n").unwrap();
    std::thread::sleep(Duration::from_millis(100));
    fs::write(&target, "Port 22\nPermitRootLogin yes\n").unwrap();

    wait_for_events(&seen, 1);
    std::thread::sleep(Duration::from_millis(500));

    let events = seen.lock().clone();
    assert_eq!(events.len(), 1, "debounce should collapse the burst");
    assert_eq!(events[0].path, target);

    watcher.stop();
}

#[test]
fn unmonitored_files_in_the_same_directory_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("watched.conf");
    let bystander = tmp.path().join("unwatched.conf");
    fs::write(&target, "a\n").unwrap();
    fs::write(&bystander, "b\n").unwrap();

    let watcher = ConfigWatcher::new(&config_for(vec![target.to_string_lossy().into_owned()]));
    let (callback, seen) = collecting_callback();
    watcher.start(callback).unwrap();

    fs::write(&bystander, "changed\n").unwrap();
    std::thread::sleep(Duration::from_millis(700));

    assert!(seen.lock().is_empty());
    watcher.stop();
}

#[test]
fn start_is_idempotent_and_stop_joins() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("watched.conf");
    fs::write(&target, "a\n").unwrap();

    let watcher = ConfigWatcher::new(&config_for(vec![target.to_string_lossy().into_owned()]));
    let (callback, _seen) = collecting_callback();
    watcher.start(Arc::clone(&callback)).unwrap();
    assert!(watcher.is_running());

    // Second start is a warning, not an error.
    watcher.start(callback).unwrap();

    watcher.stop();
    assert!(!watcher.is_running());
}

#[test]
fn starting_with_no_watchable_paths_fails() {
    let watcher = ConfigWatcher::new(&config_for(vec![]));
    let (callback, _seen) = collecting_callback();
    assert!(matches!(
        watcher.start(callback),
        Err(WatchError::NothingToWatch)
    ));
    assert!(!watcher.is_running());
}
