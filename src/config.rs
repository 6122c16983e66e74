//! Destination configuration
//!
//! Stores the game's bundle directory in `config.json`. On startup a stored
//! path that still exists is used as-is; otherwise the game folder is
//! auto-detected, and failing that the user is asked to pick it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, IoContext, Result};
use crate::game_finder::GameFinder;
use crate::prompt::DirectoryPrompt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Game asset-bundle folder mods are copied into
    #[serde(default)]
    pub destination_dir: String,
}

impl Config {
    /// Load the config, returning defaults if the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save the config, overwriting the whole file
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::paths::ensure_parent_dirs(path)
            .io_context(|| format!("Failed to create parent of {}", path.display()))?;

        let content = serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, content).io_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn destination(&self) -> Option<PathBuf> {
        if self.destination_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.destination_dir))
        }
    }

    pub fn set_destination(&mut self, dir: &Path) {
        self.destination_dir = dir.to_string_lossy().to_string();
    }

    /// True when a destination is stored and exists on disk
    pub fn has_valid_destination(&self) -> bool {
        self.destination().map(|d| d.exists()).unwrap_or(false)
    }
}

/// Loads `config.json` and resolves the destination directory.
///
/// Order: stored path (if it still exists), auto-detection, interactive
/// prompt. Whatever is found by detection or prompt is persisted. Returns
/// `None` when nothing was found and the prompt was cancelled.
pub fn resolve_destination(
    config_path: &Path,
    finder: &GameFinder,
    prompt: &dyn DirectoryPrompt,
) -> Result<(Config, Option<PathBuf>)> {
    let mut config = Config::load(config_path)?;

    if config.has_valid_destination() {
        debug!("Using stored destination {}", config.destination_dir);
        let dest = config.destination();
        return Ok((config, dest));
    }

    if let Some(found) = finder.find() {
        info!("Detected game folder at {}", found.display());
        config.set_destination(&found);
        config.save(config_path)?;
        return Ok((config, Some(found)));
    }

    let chosen = prompt_for_destination(&mut config, config_path, prompt)?;
    Ok((config, chosen))
}

/// Ask the user for the bundle folder and persist the choice.
///
/// This is the interactive fallback used both when detection fails and when
/// a copy finds the destination missing. An answer that is not an existing
/// directory is treated like a cancel and nothing is stored.
pub fn prompt_for_destination(
    config: &mut Config,
    config_path: &Path,
    prompt: &dyn DirectoryPrompt,
) -> Result<Option<PathBuf>> {
    match prompt.pick_directory("Select Combat Master Bundles Folder") {
        Some(path) if !path.is_dir() => {
            warn!("Not a directory: {}", path.display());
            Ok(None)
        }
        Some(path) => {
            info!("Destination set to {}", path.display());
            config.set_destination(&path);
            config.save(config_path)?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::tests::ScriptedPrompt;
    use tempfile::TempDir;

    fn empty_finder(dir: &Path) -> GameFinder {
        GameFinder::with_roots(Some(dir.join("no-home")), Vec::new())
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.destination().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.set_destination(Path::new("/games/Bundles"));
        config.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["destination_dir"], "/games/Bundles");
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Json { .. })));
    }

    #[test]
    fn test_resolve_uses_stored_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let bundles = dir.path().join("Bundles");
        std::fs::create_dir(&bundles).unwrap();

        let mut config = Config::default();
        config.set_destination(&bundles);
        config.save(&path).unwrap();

        let prompt = ScriptedPrompt::new(None);
        let (_, dest) = resolve_destination(&path, &empty_finder(dir.path()), &prompt).unwrap();
        assert_eq!(dest, Some(bundles));
        assert_eq!(prompt.calls(), 0);
    }

    #[test]
    fn test_resolve_prompts_when_nothing_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let picked = dir.path().join("picked");
        std::fs::create_dir(&picked).unwrap();

        let prompt = ScriptedPrompt::new(Some(picked.clone()));
        let (config, dest) =
            resolve_destination(&path, &empty_finder(dir.path()), &prompt).unwrap();

        assert_eq!(dest, Some(picked.clone()));
        assert_eq!(prompt.calls(), 1);
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_resolve_stale_destination_redetects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let home = dir.path().join("home");
        let detected = home.join(crate::game_finder::LINUX_BUNDLES_PATH);
        std::fs::create_dir_all(&detected).unwrap();

        let mut config = Config::default();
        config.set_destination(&dir.path().join("gone"));
        config.save(&path).unwrap();

        let finder = GameFinder::with_roots(Some(home), Vec::new());
        let prompt = ScriptedPrompt::new(None);
        let (_, dest) = resolve_destination(&path, &finder, &prompt).unwrap();

        assert_eq!(dest, Some(detected.clone()));
        assert_eq!(prompt.calls(), 0);
        assert_eq!(Config::load(&path).unwrap().destination(), Some(detected));
    }

    #[test]
    fn test_cancelled_prompt_leaves_destination_unset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let prompt = ScriptedPrompt::new(None);

        let (config, dest) =
            resolve_destination(&path, &empty_finder(dir.path()), &prompt).unwrap();
        assert!(dest.is_none());
        assert!(config.destination().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_prompt_answer_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.set_destination(&dir.path().join("gone"));
        config.save(&path).unwrap();

        let prompt = ScriptedPrompt::new(Some(dir.path().join("Typo")));
        let (config, dest) =
            resolve_destination(&path, &empty_finder(dir.path()), &prompt).unwrap();

        assert!(dest.is_none());
        assert_eq!(prompt.calls(), 1);
        assert_eq!(config.destination(), Some(dir.path().join("gone")));
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
