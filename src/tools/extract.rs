//! ZIP extraction for downloaded tool releases

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, IoContext, Result};

/// Extract every entry of `archive_path` into `output_dir`, creating it if
/// needed. Entries whose names would escape `output_dir` are skipped.
/// `output_dir` is only created once the archive has been read successfully.
///
/// Returns the number of files written.
pub fn extract_zip_to_dir(archive_path: &Path, output_dir: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .io_context(|| format!("Failed to open {}", archive_path.display()))?;
    let archive_err = |source| Error::Archive {
        path: archive_path.to_path_buf(),
        source,
    };
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(archive_err)?;

    fs::create_dir_all(output_dir)
        .io_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(archive_err)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let out_path = output_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .io_context(|| format!("Failed to create {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .io_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut output = File::create(&out_path)
            .io_context(|| format!("Failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut output)
            .io_context(|| format!("Failed to extract {}", out_path.display()))?;

        debug!("Extracted {}", out_path.display());
        written += 1;
    }

    Ok(written)
}
