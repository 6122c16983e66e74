//! Copying selected mod files into the game.
//!
//! Files are copied in selection order into the bundle folder. With
//! extension routing enabled, `.resource` files go to the game's `Data`
//! folder instead. The first failing file aborts the run; files copied
//! before it stay in place.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backup::{self, BackupSummary};
use crate::config::{self, Config};
use crate::error::{Error, IoContext, Result};
use crate::game_finder::{GAME_NAME, LIBRARY_NAMES};
use crate::paths;
use crate::prompt::DirectoryPrompt;
use crate::session::Session;

/// Extension of files that belong in the `Data` folder
pub const RESOURCE_EXTENSION: &str = "resource";

/// How copied files are assigned a target folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Routing {
    /// Everything goes to the bundle folder
    #[default]
    Flat,
    /// `.resource` files go to the game's `Data` folder
    ByExtension,
}

/// Where each file of a copy run lands.
#[derive(Debug, Clone)]
pub struct FileRouter {
    routing: Routing,
    bundles_dir: PathBuf,
}

impl FileRouter {
    pub fn new(routing: Routing, bundles_dir: &Path) -> Self {
        Self {
            routing,
            bundles_dir: bundles_dir.to_path_buf(),
        }
    }

    /// Folder a file should be copied into.
    pub fn target_dir(&self, file: &Path) -> Result<PathBuf> {
        match self.routing {
            Routing::Flat => Ok(self.bundles_dir.clone()),
            Routing::ByExtension => {
                if paths::extension(file).as_deref() == Some(RESOURCE_EXTENSION) {
                    data_dir_for(&self.bundles_dir).ok_or_else(|| {
                        Error::Configuration(format!(
                            "Could not locate the Data folder for {}",
                            self.bundles_dir.display()
                        ))
                    })
                } else {
                    Ok(self.bundles_dir.clone())
                }
            }
        }
    }
}

/// The game's `Data` folder, derived from its bundle folder.
///
/// The library root is `SteamLibrary` when the path mentions it and `Steam`
/// otherwise; the result is `<library>/steamapps/common/Combat Master/Data`.
/// Without a library component the nearest ancestor named `Data` is used.
pub fn data_dir_for(bundles_dir: &Path) -> Option<PathBuf> {
    let library = if bundles_dir.to_string_lossy().contains(LIBRARY_NAMES[1]) {
        LIBRARY_NAMES[1]
    } else {
        LIBRARY_NAMES[0]
    };

    let library_root = bundles_dir
        .ancestors()
        .find(|a| a.file_name().map(|n| n == library).unwrap_or(false));

    if let Some(root) = library_root {
        return Some(
            root.join("steamapps")
                .join("common")
                .join(GAME_NAME)
                .join("Data"),
        );
    }

    bundles_dir
        .ancestors()
        .find(|a| a.file_name().map(|n| n == "Data").unwrap_or(false))
        .map(Path::to_path_buf)
}

/// Outcome of a copy run
#[derive(Debug)]
pub enum CopyOutcome {
    /// The selection was empty; nothing was touched
    NothingSelected,
    Copied {
        /// Target paths, in copy order
        files: Vec<PathBuf>,
        backup: Option<BackupSummary>,
    },
}

/// Copies the session's selected files into `destination`.
///
/// Order of checks: destination must exist, selection must be non-empty,
/// the backup (if enabled) must succeed; only then is any file copied.
pub fn copy_files(session: &Session, destination: &Path) -> Result<CopyOutcome> {
    if !destination.is_dir() {
        return Err(Error::DestinationMissing(destination.to_path_buf()));
    }

    if session.selected.is_empty() {
        warn!("No files selected.");
        return Ok(CopyOutcome::NothingSelected);
    }

    let backup = if session.backup_enabled {
        Some(backup::create_backup(
            destination,
            session.backup_root.as_deref(),
        )?)
    } else {
        None
    };

    let router = FileRouter::new(session.routing, destination);
    let mut copied = Vec::with_capacity(session.selected.len());

    for file in session.selected.files() {
        let target = copy_one(&router, file)?;
        copied.push(target);
    }

    info!(
        "Copied {} files into {}",
        copied.len(),
        destination.display()
    );

    Ok(CopyOutcome::Copied {
        files: copied,
        backup,
    })
}

fn copy_one(router: &FileRouter, file: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| Error::Io {
        context: format!("Failed to copy {}", file.display()),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
    })?;

    let target = router.target_dir(file)?.join(name);
    std::fs::copy(file, &target)
        .io_context(|| format!("Failed to copy {}", paths::display_name(file)))?;

    debug!("{} -> {}", file.display(), target.display());
    Ok(target)
}

/// Copy run as triggered by the user.
///
/// When the destination is missing, the user is asked for the bundle folder
/// once and the answer is persisted; the run itself still fails with
/// `DestinationMissing` so it can be started again against the new folder.
pub fn copy_with_fallback(
    session: &Session,
    config: &mut Config,
    config_path: &Path,
    prompt: &dyn DirectoryPrompt,
) -> Result<CopyOutcome> {
    let destination = config.destination().unwrap_or_default();

    match copy_files(session, &destination) {
        Err(Error::DestinationMissing(missing)) => {
            config::prompt_for_destination(config, config_path, prompt)?;
            Err(Error::DestinationMissing(missing))
        }
        other => other,
    }
}
