//! Combat Master install detection
//!
//! Probes a fixed list of candidate bundle folders: the default Linux Steam
//! library first, then `Steam` and `SteamLibrary` on every drive letter that
//! exists. The first existing candidate wins.

use std::path::{Path, PathBuf};
use tracing::debug;

pub const GAME_NAME: &str = "Combat Master";

/// Steam library folder names, in search order
pub const LIBRARY_NAMES: [&str; 2] = ["Steam", "SteamLibrary"];

/// Bundle folder relative to the home directory on Linux
pub const LINUX_BUNDLES_PATH: &str =
    ".local/share/Steam/steamapps/common/Combat Master/Data/StreamingAssets/Bundles";

/// Components below a library root leading to the bundle folder
const BUNDLES_SUBPATH: [&str; 6] = [
    "steamapps",
    "common",
    GAME_NAME,
    "Data",
    "StreamingAssets",
    "Bundles",
];

#[derive(Debug, Clone)]
pub struct GameFinder {
    home: Option<PathBuf>,
    drive_roots: Vec<PathBuf>,
}

impl GameFinder {
    /// Finder over the real home directory and the drives present right now
    pub fn new() -> Self {
        Self::with_roots(dirs::home_dir(), existing_drive_roots())
    }

    pub fn with_roots(home: Option<PathBuf>, drive_roots: Vec<PathBuf>) -> Self {
        Self { home, drive_roots }
    }

    /// All candidate bundle folders in search order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(home) = &self.home {
            candidates.push(home.join(LINUX_BUNDLES_PATH));
        }

        for drive in &self.drive_roots {
            for library in LIBRARY_NAMES {
                candidates.push(bundles_dir(&drive.join(library)));
            }
        }

        candidates
    }

    /// First candidate that exists, or `None` so the caller can prompt
    pub fn find(&self) -> Option<PathBuf> {
        self.candidates().into_iter().find(|p| {
            let exists = p.exists();
            debug!("Probing {} -> {}", p.display(), exists);
            exists
        })
    }
}

impl Default for GameFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bundle folder below a Steam library root
pub fn bundles_dir(library_root: &Path) -> PathBuf {
    BUNDLES_SUBPATH
        .iter()
        .fold(library_root.to_path_buf(), |p, c| p.join(c))
}

/// Drive roots `A:\` through `Z:\` that exist on this system.
///
/// Empty on systems without drive letters.
pub fn existing_drive_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|root| root.exists())
        .collect()
}
