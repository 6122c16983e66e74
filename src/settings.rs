//! Tool download flags
//!
//! Stored in `settings.json` as `{"UABEA_downloaded": bool,
//! "AssetStudio_downloaded": bool}`. Keys this version doesn't know are kept
//! when the file is rewritten.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::{Error, IoContext, Result};
use crate::tools::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "UABEA_downloaded", default)]
    pub uabea_downloaded: bool,

    #[serde(rename = "AssetStudio_downloaded", default)]
    pub asset_studio_downloaded: bool,

    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    /// Load settings from disk, or return defaults if they can't be read
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not load settings: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Try to load settings; a missing file yields defaults
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).io_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::paths::ensure_parent_dirs(path)
            .io_context(|| format!("Failed to create parent of {}", path.display()))?;

        let content = serde_json::to_string(self).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, content).io_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn is_downloaded(&self, tool: Tool) -> bool {
        match tool {
            Tool::Uabea => self.uabea_downloaded,
            Tool::AssetStudio => self.asset_studio_downloaded,
        }
    }

    pub fn mark_downloaded(&mut self, tool: Tool) {
        match tool {
            Tool::Uabea => self.uabea_downloaded = true,
            Tool::AssetStudio => self.asset_studio_downloaded = true,
        }
    }
}
