// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manual snapshot backend: mirrors the critical path set under a snapshot
//! directory, `metadata.json` written last.
//!
//! A snapshot directory without `metadata.json` is incomplete and is
//! invisible to `list` and `restore`.

use crate::metadata::{BackendKind, FileEntry, FileKind, SnapshotMetadata};
use crate::SnapshotError;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const METADATA_FILE: &str = "metadata.json";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// The fixed set of configuration paths captured by a manual snapshot.
pub fn critical_paths() -> Vec<PathBuf> {
    [
        "/etc/network/interfaces",
        "/etc/netplan",
        "/etc/NetworkManager/system-connections",
        "/etc/systemd/network",
        "/etc/ssh/sshd_config",
        "/etc/ssh/ssh_config.d",
        "/etc/iptables",
        "/etc/ufw",
        "/etc/firewalld",
        "/etc/systemd/system",
        "/etc/hosts",
        "/etc/resolv.conf",
        "/etc/hostname",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Manual backend rooted at a store directory.
#[derive(Debug, Clone)]
pub struct ManualStore {
    root: PathBuf,
    paths: Vec<PathBuf>,
    compress: bool,
}

impl ManualStore {
    pub fn new(root: impl Into<PathBuf>, paths: Vec<PathBuf>, compress: bool) -> Self {
        Self {
            root: root.into(),
            paths,
            compress,
        }
    }

    /// Create a snapshot. All-or-nothing: any failure removes the partial
    /// snapshot directory before returning.
    pub fn create(
        &self,
        id: &str,
        description: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<SnapshotMetadata, SnapshotError> {
        let snapshot_dir = self.root.join(id);

        let result = self.create_inner(&snapshot_dir, id, description, timestamp);
        if result.is_err() {
            if let Err(e) = fs::remove_dir_all(&snapshot_dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(id, error = %e, "failed to remove partial snapshot");
                }
            }
        }
        result
    }

    fn create_inner(
        &self,
        snapshot_dir: &Path,
        id: &str,
        description: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<SnapshotMetadata, SnapshotError> {
        fs::create_dir_all(snapshot_dir)?;

        let mut files = Vec::new();
        for source in &self.paths {
            if !source.exists() {
                debug!(path = %source.display(), "critical path absent, skipping");
                continue;
            }
            if let Err(e) = backup_path(source, snapshot_dir, &mut files) {
                warn!(path = %source.display(), error = %e, "failed to back up path");
            }
        }

        let metadata = SnapshotMetadata {
            id: id.to_string(),
            description: description.to_string(),
            timestamp,
            kind: BackendKind::Manual,
            files,
        };

        // Written last: its presence marks the snapshot complete.
        let file = File::create(snapshot_dir.join(METADATA_FILE))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &metadata)?;

        if self.compress {
            if let Err(e) = self.compress_snapshot(snapshot_dir, id) {
                warn!(id, error = %e, "failed to compress snapshot, keeping directory");
            }
        }

        Ok(metadata)
    }

    fn compress_snapshot(&self, snapshot_dir: &Path, id: &str) -> Result<(), SnapshotError> {
        let archive_path = self.archive_path(id);
        let file = File::create(&archive_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(id, snapshot_dir)?;
        builder.into_inner()?.finish()?;

        fs::remove_dir_all(snapshot_dir)?;
        debug!(archive = %archive_path.display(), "snapshot compressed");
        Ok(())
    }

    /// All complete snapshots, unordered. Compressed snapshots are read
    /// without unpacking.
    pub fn list(&self) -> Vec<SnapshotMetadata> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut snapshots = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            let metadata = if path.is_dir() {
                read_dir_metadata(&path)
            } else if let Some(id) = name.strip_suffix(ARCHIVE_SUFFIX) {
                // An archive restored earlier leaves its unpacked twin
                // behind; the directory entry already covers it.
                if self.root.join(id).is_dir() {
                    continue;
                }
                read_archive_metadata(&path)
            } else {
                continue;
            };

            match metadata {
                Ok(Some(meta)) => snapshots.push(meta),
                Ok(None) => debug!(%name, "ignoring incomplete snapshot"),
                Err(e) => warn!(%name, error = %e, "failed to read snapshot metadata"),
            }
        }
        snapshots
    }

    /// Restore every manifest entry. Per-entry failures are logged and
    /// counted; the call fails iff any entry failed.
    pub fn restore(&self, id: &str) -> Result<(), SnapshotError> {
        let snapshot_dir = self.root.join(id);
        let archive_path = self.archive_path(id);

        if !snapshot_dir.exists() {
            if archive_path.exists() {
                self.unpack(&archive_path)?;
            } else {
                return Err(SnapshotError::NotFound(id.to_string()));
            }
        }

        let metadata =
            read_dir_metadata(&snapshot_dir)?.ok_or_else(|| SnapshotError::MissingMetadata(id.to_string()))?;

        let total = metadata.files.len();
        let mut failed = 0usize;
        for entry in &metadata.files {
            if let Err(e) = restore_entry(entry, &snapshot_dir) {
                warn!(path = %entry.path.display(), error = %e, "failed to restore entry");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(SnapshotError::RestoreIncomplete { failed, total });
        }
        Ok(())
    }

    fn unpack(&self, archive_path: &Path) -> Result<(), SnapshotError> {
        let file = File::open(archive_path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        archive.unpack(&self.root)?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), SnapshotError> {
        let snapshot_dir = self.root.join(id);
        let archive_path = self.archive_path(id);

        let mut removed = false;
        if snapshot_dir.exists() {
            fs::remove_dir_all(&snapshot_dir)?;
            removed = true;
        }
        if archive_path.exists() {
            fs::remove_file(&archive_path)?;
            removed = true;
        }

        if removed {
            Ok(())
        } else {
            Err(SnapshotError::NotFound(id.to_string()))
        }
    }

    pub fn info(&self, id: &str) -> Option<SnapshotMetadata> {
        self.list().into_iter().find(|meta| meta.id == id)
    }

    fn archive_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}{ARCHIVE_SUFFIX}"))
    }
}

/// Copy one critical path into the snapshot mirror, recording it in the
/// manifest.
fn backup_path(
    source: &Path,
    snapshot_dir: &Path,
    files: &mut Vec<FileEntry>,
) -> Result<(), SnapshotError> {
    let target = snapshot_dir.join(mirror_path(source));
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let stat = fs::metadata(source)?;
    let mode = FileEntry::format_mode(stat.permissions().mode());

    if stat.is_file() {
        fs::copy(source, &target)?;
        files.push(FileEntry {
            path: source.to_path_buf(),
            kind: FileKind::File,
            size: Some(stat.len()),
            mode,
        });
    } else if stat.is_dir() {
        copy_dir_recursive(source, &target)?;
        files.push(FileEntry {
            path: source.to_path_buf(),
            kind: FileKind::Directory,
            size: None,
            mode,
        });
    }
    Ok(())
}

/// Restore one manifest entry from the snapshot mirror onto the host.
fn restore_entry(entry: &FileEntry, snapshot_dir: &Path) -> Result<(), SnapshotError> {
    let source = snapshot_dir.join(mirror_path(&entry.path));
    if !source.exists() {
        return Err(SnapshotError::NotFound(source.display().to_string()));
    }

    let target = &entry.path;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    match entry.kind {
        FileKind::File => {
            fs::copy(&source, target)?;
        }
        FileKind::Directory => {
            if target.exists() {
                fs::remove_dir_all(target)?;
            }
            copy_dir_recursive(&source, target)?;
        }
    }

    if let Some(mode) = entry.parse_mode() {
        let perms = fs::Permissions::from_mode(mode & 0o7777);
        if let Err(e) = fs::set_permissions(target, perms) {
            warn!(path = %target.display(), error = %e, "failed to restore mode");
        }
    }
    Ok(())
}

/// A mirror keeps the absolute path verbatim under the snapshot root.
fn mirror_path(absolute: &Path) -> PathBuf {
    absolute
        .strip_prefix("/")
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| absolute.to_path_buf())
}

fn copy_dir_recursive(source: &Path, target: &Path) -> Result<(), SnapshotError> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else if file_type.is_file() {
            fs::copy(&from, &to)?;
        }
        // Symlinks and special files are not part of the critical set.
    }
    let mode = fs::metadata(source)?.permissions().mode();
    fs::set_permissions(target, fs::Permissions::from_mode(mode & 0o7777))?;
    Ok(())
}

fn read_dir_metadata(snapshot_dir: &Path) -> Result<Option<SnapshotMetadata>, SnapshotError> {
    let path = snapshot_dir.join(METADATA_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    Ok(Some(serde_json::from_reader(BufReader::new(file))?))
}

/// Read `<id>/metadata.json` out of a `.tar.gz` snapshot without unpacking
/// it to disk.
fn read_archive_metadata(archive_path: &Path) -> Result<Option<SnapshotMetadata>, SnapshotError> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_metadata = {
            let path = entry.path()?;
            path.components().count() == 2
                && path.file_name().map(|n| n == METADATA_FILE).unwrap_or(false)
        };
        if is_metadata {
            let mut buf = String::new();
            entry.read_to_string(&mut buf)?;
            return Ok(Some(serde_json::from_str(&buf)?));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "manual_tests.rs"]
mod tests;
