// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: filesystem watching, subprocesses,
//! notifications, connectivity probing.

pub mod connectivity;
pub mod notify;
pub mod subprocess;
pub mod watcher;

pub use connectivity::ConnectivityChecker;
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter};
pub use subprocess::{run_command_line, run_with_timeout, CommandError};
pub use watcher::{ConfigWatcher, WatchConfig, WatchError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
