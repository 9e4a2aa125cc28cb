//! Timestamped backups of files nexus-route manages.
//!
//! Before a managed file is first written, its original is kept next to it
//! as `{name}.nexus-route-{YYYYmmddHHMMSS}.bak`. If there was no original,
//! an `.absent` marker records that restoring means deleting the file.
//! Only one backup per file is kept, and an existing one is never replaced,
//! so re-running a configure step cannot lose the original.

use std::fs::Permissions;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};

use crate::error::{NexusError, Result};

/// Infix between the file name and the timestamp.
const BACKUP_INFIX: &str = ".nexus-route-";

/// Timestamp format used in backup names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// What a backup holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    /// Copy of the original file.
    Copy,
    /// The original file did not exist.
    Absent,
}

impl BackupKind {
    fn extension(&self) -> &'static str {
        match self {
            Self::Copy => "bak",
            Self::Absent => "absent",
        }
    }
}

/// A backup found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    pub kind: BackupKind,
    pub taken_at: NaiveDateTime,
}

/// Result of a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Original contents were copied back.
    Restored(PathBuf),
    /// The managed file was removed because there was no original.
    Removed,
    /// No backup exists for this file.
    NothingToRestore,
}

fn backup_error(path: &Path, message: impl std::fmt::Display) -> NexusError {
    NexusError::BackupError {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| backup_error(path, "path has no file name"))
}

/// All backups of `path`, newest first.
pub fn list(path: &Path) -> Result<Vec<Backup>> {
    let name = file_name(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{name}{BACKUP_INFIX}");
    let mut backups = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        let Some(rest) = entry_name.strip_prefix(&prefix) else {
            continue;
        };
        let Some((stamp, ext)) = rest.split_once('.') else {
            continue;
        };
        let kind = match ext {
            "bak" => BackupKind::Copy,
            "absent" => BackupKind::Absent,
            _ => continue,
        };
        let Ok(taken_at) = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) else {
            continue;
        };
        backups.push(Backup {
            path: entry.path(),
            kind,
            taken_at,
        });
    }
    backups.sort_by(|a, b| b.taken_at.cmp(&a.taken_at).then(b.path.cmp(&a.path)));
    Ok(backups)
}

/// The backup that `restore` would use.
pub fn latest(path: &Path) -> Result<Option<Backup>> {
    Ok(list(path)?.into_iter().next())
}

/// Record the original state of `path` unless a backup already exists.
///
/// Returns the backup now in effect.
pub fn backup(path: &Path) -> Result<Backup> {
    if let Some(existing) = prune(path)? {
        tracing::debug!(
            path = %path.display(),
            backup = %existing.path.display(),
            "Keeping existing backup"
        );
        return Ok(existing);
    }

    let stamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let kind = if path.exists() {
        BackupKind::Copy
    } else {
        BackupKind::Absent
    };
    let backup_path = path.with_file_name(format!(
        "{}{}{}.{}",
        file_name(path)?,
        BACKUP_INFIX,
        stamp,
        kind.extension()
    ));

    match kind {
        BackupKind::Copy => {
            std::fs::copy(path, &backup_path).map_err(|e| backup_error(path, e))?;
        }
        BackupKind::Absent => {
            if let Some(parent) = backup_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| backup_error(path, e))?;
            }
            std::fs::write(&backup_path, b"").map_err(|e| backup_error(path, e))?;
        }
    }

    tracing::info!(
        path = %path.display(),
        backup = %backup_path.display(),
        kind = ?kind,
        "Backed up managed file"
    );

    Ok(Backup {
        path: backup_path,
        kind,
        taken_at: NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT)
            .map_err(|e| backup_error(path, e))?,
    })
}

/// Delete all but the newest backup; returns the one kept.
fn prune(path: &Path) -> Result<Option<Backup>> {
    let mut backups = list(path)?.into_iter();
    let newest = backups.next();
    for stale in backups {
        tracing::debug!(backup = %stale.path.display(), "Removing stale backup");
        std::fs::remove_file(&stale.path).map_err(|e| backup_error(path, e))?;
    }
    Ok(newest)
}

/// Put back the original state of `path` and drop the backup.
pub fn restore(path: &Path) -> Result<RestoreOutcome> {
    let Some(backup) = prune(path)? else {
        return Ok(RestoreOutcome::NothingToRestore);
    };

    let outcome = match backup.kind {
        BackupKind::Copy => {
            let data = std::fs::read(&backup.path).map_err(|e| backup_error(path, e))?;
            let permissions = std::fs::metadata(&backup.path)
                .map_err(|e| backup_error(path, e))?
                .permissions();
            replace_file(path, &data, Some(permissions))?;
            RestoreOutcome::Restored(backup.path.clone())
        }
        BackupKind::Absent => {
            if path.exists() {
                std::fs::remove_file(path).map_err(|e| backup_error(path, e))?;
            }
            RestoreOutcome::Removed
        }
    };
    std::fs::remove_file(&backup.path).map_err(|e| backup_error(path, e))?;

    tracing::info!(path = %path.display(), outcome = ?outcome, "Restored managed file");
    Ok(outcome)
}

/// Write `data` to `path` atomically (write tmp, rename), creating parents.
///
/// An existing file keeps its permissions.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let permissions = match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    replace_file(path, data, permissions)
}

fn replace_file(path: &Path, data: &[u8], permissions: Option<Permissions>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name(path)?));
    std::fs::write(&tmp_path, data)?;
    if let Some(permissions) = permissions {
        std::fs::set_permissions(&tmp_path, permissions)?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
