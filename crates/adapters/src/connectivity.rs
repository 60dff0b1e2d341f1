// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reachability probing used around timer expiry.
//!
//! The outcome is informational only: the expired timer already decided
//! that a revert happens.

use crate::subprocess::{run_with_timeout, PING_GRACE};
use std::net::IpAddr;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ConnectivityChecker {
    endpoints: Vec<String>,
    timeout: Duration,
}

impl ConnectivityChecker {
    pub fn new(endpoints: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            endpoints,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// True if any configured endpoint answers.
    pub async fn any_reachable(&self) -> bool {
        for endpoint in &self.endpoints {
            if self.probe(endpoint).await {
                debug!(%endpoint, "connectivity check passed");
                return true;
            }
        }
        warn!("all connectivity checks failed");
        false
    }

    async fn probe(&self, endpoint: &str) -> bool {
        // Hostnames get a DNS resolution first; a failure there means the
        // endpoint is unreachable without spending the ping timeout.
        if endpoint.parse::<IpAddr>().is_err()
            && tokio::net::lookup_host((endpoint, 0)).await.is_err()
        {
            debug!(endpoint, "DNS resolution failed");
            return false;
        }

        let mut cmd = Command::new("ping");
        cmd.args(["-c", "1", "-W", &self.timeout.as_secs().to_string(), endpoint]);

        match run_with_timeout(cmd, self.timeout + PING_GRACE, "ping").await {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!(endpoint, error = %e, "connectivity probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
