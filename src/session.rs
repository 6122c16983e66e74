//! Per-session state of the file copier
//!
//! Holds the selected-files list, the backup toggle and location, and the
//! routing mode. The selected-files list is mirrored to
//! `modified_files.json` after every change so it survives restarts; the
//! backup location is never persisted.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::copier::Routing;
use crate::error::{Error, IoContext, Result};

/// Ordered list of user-selected mod files, mirrored to a JSON side file.
#[derive(Debug, Clone)]
pub struct SelectedFiles {
    side_file: PathBuf,
    files: Vec<PathBuf>,
}

/// Outcome of adding files to the selection
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<PathBuf>,
    /// Inputs that were not existing files
    pub missing: Vec<PathBuf>,
}

impl SelectedFiles {
    /// Load the list from `side_file`, empty if it doesn't exist
    pub fn load(side_file: &Path) -> Result<Self> {
        let files = if side_file.exists() {
            let content = std::fs::read_to_string(side_file)
                .io_context(|| format!("Failed to read {}", side_file.display()))?;
            serde_json::from_str(&content).map_err(|source| Error::Json {
                path: side_file.to_path_buf(),
                source,
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            side_file: side_file.to_path_buf(),
            files,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Append existing files in order; anything that is not a file is
    /// reported back instead of added.
    pub fn add<I, P>(&mut self, paths: I) -> Result<AddReport>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();

        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                warn!("File not found: {}", path.display());
                report.missing.push(path.to_path_buf());
                continue;
            }

            let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            debug!("Selected {}", absolute.display());
            self.files.push(absolute.clone());
            report.added.push(absolute);
        }

        self.save()?;
        Ok(report)
    }

    /// Remove every entry whose file name is `name`. Returns how many went.
    pub fn remove_by_name(&mut self, name: &str) -> Result<usize> {
        let before = self.files.len();
        self.files
            .retain(|p| p.file_name().map(|n| n != name).unwrap_or(true));
        let removed = before - self.files.len();

        self.save()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.files.clear();
        self.save()
    }

    /// Rewrite the side file with the whole list
    fn save(&self) -> Result<()> {
        crate::paths::ensure_parent_dirs(&self.side_file)
            .io_context(|| format!("Failed to create parent of {}", self.side_file.display()))?;

        let content = serde_json::to_string_pretty(&self.files).map_err(|source| Error::Json {
            path: self.side_file.clone(),
            source,
        })?;

        std::fs::write(&self.side_file, content)
            .io_context(|| format!("Failed to write {}", self.side_file.display()))
    }
}

/// Everything one copy run needs besides the destination
#[derive(Debug, Clone)]
pub struct Session {
    pub selected: SelectedFiles,
    pub backup_enabled: bool,
    pub backup_root: Option<PathBuf>,
    pub routing: Routing,
}

impl Session {
    pub fn new(selected: SelectedFiles) -> Self {
        Self {
            selected,
            backup_enabled: false,
            backup_root: None,
            routing: Routing::Flat,
        }
    }

    pub fn with_backup(mut self, root: Option<PathBuf>) -> Self {
        self.backup_enabled = true;
        self.backup_root = root;
        self
    }

    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = routing;
        self
    }
}
