//! Destination backups.
//!
//! Copies the whole destination tree into `backup_<YYYYMMDD_HHMMSS>` under a
//! user-chosen backup root before mods are copied over it.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, IoContext, Result};

/// Timestamp format of backup folder names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Result of a completed backup.
#[derive(Debug, Clone)]
pub struct BackupSummary {
    /// The created `backup_<timestamp>` folder.
    pub path: PathBuf,
    /// Number of files copied.
    pub files: u64,
    /// Bytes copied.
    pub bytes: u64,
}

/// Name of the backup folder for a given moment
pub fn backup_dir_name(at: &DateTime<Local>) -> String {
    format!("backup_{}", at.format(TIMESTAMP_FORMAT))
}

/// Backs up `source` under `backup_root`, timestamped with the current time.
///
/// Fails with a configuration error when no backup root was chosen. A failed
/// copy may leave a partial backup folder behind.
pub fn create_backup(source: &Path, backup_root: Option<&Path>) -> Result<BackupSummary> {
    let root = backup_root
        .ok_or_else(|| Error::Configuration("No backup location selected.".to_string()))?;
    create_backup_at(source, root, &Local::now())
}

/// Backs up `source` into `<backup_root>/backup_<at>`.
///
/// The target folder must not exist yet.
pub fn create_backup_at(
    source: &Path,
    backup_root: &Path,
    at: &DateTime<Local>,
) -> Result<BackupSummary> {
    if !source.is_dir() {
        return Err(Error::Io {
            context: format!("Failed to create backup of {}", source.display()),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "source folder not found"),
        });
    }

    let target = backup_root.join(backup_dir_name(at));
    if target.exists() {
        return Err(Error::Io {
            context: format!("Failed to create backup at {}", target.display()),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "backup folder already exists",
            ),
        });
    }

    std::fs::create_dir_all(&target)
        .io_context(|| format!("Failed to create backup directory: {}", target.display()))?;

    // The backup root may live inside the folder being backed up
    let walk_source = std::fs::canonicalize(source)
        .io_context(|| format!("Failed to resolve {}", source.display()))?;
    let walk_target = std::fs::canonicalize(&target)
        .io_context(|| format!("Failed to resolve {}", target.display()))?;

    let (files, bytes) = copy_tree(&walk_source, &walk_target)?;

    tracing::info!(
        "Backup created at {} ({} files, {} bytes)",
        target.display(),
        files,
        bytes
    );

    Ok(BackupSummary {
        path: target,
        files,
        bytes,
    })
}

/// Recursively copies `source` into the existing directory `dest`, never
/// descending into `dest` itself.
fn copy_tree(source: &Path, dest: &Path) -> Result<(u64, u64)> {
    let mut files: u64 = 0;
    let mut bytes: u64 = 0;

    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.path() != dest);

    for entry in walker {
        let entry = entry
            .map_err(std::io::Error::from)
            .io_context(|| format!("Failed to read directory entry in {}", source.display()))?;
        let source_path = entry.path();

        let Ok(relative_path) = source_path.strip_prefix(source) else {
            continue;
        };
        let dest_path = dest.join(relative_path);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path)
                .io_context(|| format!("Failed to create directory: {}", dest_path.display()))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)
                    .io_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }

            bytes += std::fs::copy(source_path, &dest_path)
                .io_context(|| format!("Failed to copy file: {}", source_path.display()))?;
            files += 1;
            tracing::debug!("Backed up {}", relative_path.display());
        }
        // Symlinks are not followed or recreated
    }

    Ok((files, bytes))
}
