// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default restore templates, used when an expired change has no snapshot.
//!
//! File bodies and command sequences are part of the external contract;
//! they return the subsystem to a minimal known-good state that keeps the
//! host reachable.

use confguard_adapters::subprocess::{run_command_line, RESTART_TIMEOUT};
use confguard_core::ChangeCategory;
use std::path::Path;
use tracing::{error, info, warn};

/// Minimal DHCP loopback+eth0 `/etc/network/interfaces`.
pub const DEFAULT_INTERFACES: &str = "\
# This file describes the network interfaces available on your system
# and how to activate them. For more information, see interfaces(5).

source /etc/network/interfaces.d/*

# The loopback network interface
auto lo
iface lo inet loopback

# The primary network interface (DHCP)
auto eth0
iface eth0 inet dhcp
";

/// Single-file DHCP netplan configuration.
pub const DEFAULT_NETPLAN: &str = "\
network:
  version: 2
  renderer: networkd
  ethernets:
    eth0:
      dhcp4: true
";

/// Minimal safe sshd_config permitting password and key login on port 22.
pub const MINIMAL_SSHD_CONFIG: &str = "\
Port 22
Protocol 2
HostKey /etc/ssh/ssh_host_rsa_key
HostKey /etc/ssh/ssh_host_dsa_key
HostKey /etc/ssh/ssh_host_ecdsa_key
HostKey /etc/ssh/ssh_host_ed25519_key
UsePrivilegeSeparation yes
KeyRegenerationInterval 3600
ServerKeyBits 1024
SyslogFacility AUTH
LogLevel INFO
LoginGraceTime 120
PermitRootLogin yes
StrictModes yes
RSAAuthentication yes
PubkeyAuthentication yes
IgnoreRhosts yes
RhostsRSAAuthentication no
HostbasedAuthentication no
PermitEmptyPasswords no
ChallengeResponseAuthentication no
PasswordAuthentication yes
X11Forwarding yes
X11DisplayOffset 10
PrintMotd no
PrintLastLog yes
TCPKeepAlive yes
AcceptEnv LANG LC_*
Subsystem sftp /usr/lib/openssh/sftp-server
UsePAM yes
";

/// Stock sshd_config locations tried before falling back to the minimal
/// template.
pub const SSHD_DEFAULT_SOURCES: [&str; 3] = [
    "/usr/share/openssh/sshd_config",
    "/etc/ssh/sshd_config.orig",
    "/etc/ssh/sshd_config.default",
];

/// Which default restore applies to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefaultRestore {
    Interfaces,
    Netplan,
    NetworkManager,
    SshdConfig,
    Ufw,
    Iptables,
    Firewalld,
    ServiceReload,
}

/// Pick the restore strategy for a category/path pair. `None` means no
/// default exists and the restore fails.
pub(crate) fn strategy_for(category: ChangeCategory, path: &str) -> Option<DefaultRestore> {
    let lower = path.to_lowercase();
    match category {
        ChangeCategory::Network => {
            if lower.contains("interfaces") {
                Some(DefaultRestore::Interfaces)
            } else if lower.contains("netplan") {
                Some(DefaultRestore::Netplan)
            } else if lower.contains("networkmanager") {
                Some(DefaultRestore::NetworkManager)
            } else {
                None
            }
        }
        ChangeCategory::Ssh => lower
            .contains("sshd_config")
            .then_some(DefaultRestore::SshdConfig),
        ChangeCategory::Firewall => {
            if lower.contains("ufw") {
                Some(DefaultRestore::Ufw)
            } else if lower.contains("iptables") {
                Some(DefaultRestore::Iptables)
            } else if lower.contains("firewalld") {
                Some(DefaultRestore::Firewalld)
            } else {
                None
            }
        }
        ChangeCategory::Service => Some(DefaultRestore::ServiceReload),
        ChangeCategory::System => None,
    }
}

/// Restore a subsystem to its default template. Returns whether the
/// restore succeeded.
pub(crate) async fn restore_default(category: ChangeCategory, path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    let Some(strategy) = strategy_for(category, &path_str) else {
        error!(category = %category, path = %path.display(), "no default restore strategy");
        return false;
    };

    match strategy {
        DefaultRestore::Interfaces => restore_default_interfaces().await,
        DefaultRestore::Netplan => restore_default_netplan().await,
        DefaultRestore::NetworkManager => {
            run_step("systemctl restart NetworkManager", "NetworkManager restart").await
        }
        DefaultRestore::SshdConfig => restore_default_sshd_config().await,
        DefaultRestore::Ufw => restore_default_ufw().await,
        DefaultRestore::Iptables => restore_default_iptables().await,
        DefaultRestore::Firewalld => run_step("firewall-cmd --reload", "firewalld reload").await,
        DefaultRestore::ServiceReload => {
            run_step("systemctl daemon-reload", "systemd daemon reload").await
        }
    }
}

async fn restore_default_interfaces() -> bool {
    match tokio::fs::write("/etc/network/interfaces", DEFAULT_INTERFACES).await {
        Ok(()) => {
            info!("restored default /etc/network/interfaces");
            true
        }
        Err(e) => {
            error!(error = %e, "failed to restore default interfaces");
            false
        }
    }
}

async fn restore_default_netplan() -> bool {
    let netplan_dir = Path::new("/etc/netplan");
    if !netplan_dir.exists() {
        return true;
    }

    let result: std::io::Result<()> = async {
        let mut entries = tokio::fs::read_dir(netplan_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "yaml").unwrap_or(false) {
                tokio::fs::remove_file(&path).await?;
            }
        }
        tokio::fs::write("/etc/netplan/01-network-manager-all.yaml", DEFAULT_NETPLAN).await
    }
    .await;

    if let Err(e) = result {
        error!(error = %e, "failed to restore default netplan");
        return false;
    }

    if !run_step("netplan apply", "netplan apply").await {
        return false;
    }
    info!("restored default netplan configuration");
    true
}

async fn restore_default_sshd_config() -> bool {
    for source in SSHD_DEFAULT_SOURCES {
        if Path::new(source).exists() {
            match tokio::fs::copy(source, "/etc/ssh/sshd_config").await {
                Ok(_) => {
                    info!(source, "restored sshd_config from stock copy");
                    return true;
                }
                Err(e) => warn!(source, error = %e, "failed to restore sshd_config from source"),
            }
        }
    }

    match tokio::fs::write("/etc/ssh/sshd_config", MINIMAL_SSHD_CONFIG).await {
        Ok(()) => {
            info!("created minimal safe sshd_config");
            true
        }
        Err(e) => {
            error!(error = %e, "failed to create minimal sshd_config");
            false
        }
    }
}

async fn restore_default_ufw() -> bool {
    // Reset to defaults, re-allow ssh before enabling to avoid lockout.
    for (command, description) in [
        ("ufw --force reset", "ufw reset"),
        ("ufw allow ssh", "ufw allow ssh"),
        ("ufw --force enable", "ufw enable"),
    ] {
        if !run_step(command, description).await {
            return false;
        }
    }
    info!("restored default UFW configuration");
    true
}

async fn restore_default_iptables() -> bool {
    // Flush all tables and open every policy.
    for (command, description) in [
        ("iptables -F", "iptables flush"),
        ("iptables -X", "iptables delete chains"),
        ("iptables -t nat -F", "iptables nat flush"),
        ("iptables -t nat -X", "iptables nat delete chains"),
        ("iptables -P INPUT ACCEPT", "iptables input policy"),
        ("iptables -P FORWARD ACCEPT", "iptables forward policy"),
        ("iptables -P OUTPUT ACCEPT", "iptables output policy"),
    ] {
        if !run_step(command, description).await {
            return false;
        }
    }
    info!("restored default iptables configuration");
    true
}

async fn run_step(command: &str, description: &str) -> bool {
    match run_command_line(command, RESTART_TIMEOUT, description).await {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            error!(
                command,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "default restore step failed"
            );
            false
        }
        Err(e) => {
            error!(command, error = %e, "default restore step failed");
            false
        }
    }
}

#[cfg(test)]
#[path = "templates_tests.rs"]
mod tests;
