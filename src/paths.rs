//! On-disk layout of the state files and installed tools
//!
//! Everything lives under one data directory (by default the working
//! directory, so the tool stays portable next to its executable):
//!
//! ```text
//! <data dir>/
//!   config.json
//!   settings.json
//!   modified_files.json
//!   additional_programs/<Tool>/...
//! ```

use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const SELECTED_FILES_FILE: &str = "modified_files.json";
pub const PROGRAMS_DIR: &str = "additional_programs";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn selected_files_file(&self) -> PathBuf {
        self.root.join(SELECTED_FILES_FILE)
    }

    /// Parent of every extracted tool folder
    pub fn programs_dir(&self) -> PathBuf {
        self.root.join(PROGRAMS_DIR)
    }
}

impl Default for DataDir {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Get the filename of a path for display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Get file extension (lowercase)
pub fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Create parent directories for a path if they don't exist
pub fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
