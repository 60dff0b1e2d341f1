// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;
use yare::parameterized;

fn sshd() -> PathBuf {
    PathBuf::from("/etc/ssh/sshd_config")
}

#[test]
fn started_message_names_path_and_timeout() {
    let msg = Notice::Started.message(&sshd(), 900, 30);
    assert_eq!(
        msg,
        "Configuration change timeout started: /etc/ssh/sshd_config (900s timeout)"
    );
}

#[parameterized(
    confirmed = { Notice::Confirmed, "Configuration change confirmed: /etc/ssh/sshd_config" },
    superseded = { Notice::Superseded, "Configuration change superseded: /etc/ssh/sshd_config" },
    expired = { Notice::Expired, "Configuration change timeout EXPIRED: /etc/ssh/sshd_config - automatic revert will be performed" },
    reverted = { Notice::Reverted, "Configuration change successfully reverted: /etc/ssh/sshd_config" },
    revert_failed = { Notice::RevertFailed, "CRITICAL: Failed to revert configuration change: /etc/ssh/sshd_config" },
    revert_error = { Notice::RevertError, "CRITICAL: Error during revert of configuration change: /etc/ssh/sshd_config" },
)]
fn fixed_messages(notice: Notice, expected: &str) {
    assert_eq!(notice.message(&sshd(), 900, 30), expected);
}

#[test]
fn grace_period_message_names_remaining_seconds() {
    let msg = Notice::GracePeriod.message(&sshd(), 900, 30);
    assert_eq!(
        msg,
        "Grace period before revert: /etc/ssh/sshd_config (30s remaining)"
    );
}

#[parameterized(
    started = { Notice::Started, Severity::Warn },
    grace = { Notice::GracePeriod, Severity::Warn },
    expired = { Notice::Expired, Severity::Error },
    revert_failed = { Notice::RevertFailed, Severity::Error },
    revert_error = { Notice::RevertError, Severity::Error },
    confirmed = { Notice::Confirmed, Severity::Info },
    superseded = { Notice::Superseded, Severity::Info },
    reverted = { Notice::Reverted, Severity::Info },
)]
fn severity_routing(notice: Notice, expected: Severity) {
    assert_eq!(notice.severity(), expected);
}
