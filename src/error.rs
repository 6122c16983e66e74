//! Error taxonomy shared by every operation.
//!
//! Errors are raised by the operations and caught by the shell at the point
//! of the user-triggered action, where they are reported and the action is
//! aborted. Nothing is retried and partial side effects are not rolled back.

use std::path::PathBuf;

use crate::tools::Tool;

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing backup location, unusable destination, cancelled prompt
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Destination folder not found: {}. Please ensure Combat Master is installed.", .0.display())]
    DestinationMissing(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Download failed: {0}")]
    Network(String),

    #[error("Failed to extract archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Could not find {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0} is already being downloaded")]
    AlreadyDownloading(Tool),

    #[error("{0} is already installed")]
    AlreadyInstalled(Tool),

    #[error("Failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Attach a human-readable context to an `io::Result`
pub(crate) trait IoContext<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|source| Error::Io {
            context: f(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::DestinationMissing(PathBuf::from("/games/Bundles"));
        assert!(err.to_string().contains("/games/Bundles"));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Err::<(), _>(denied).io_context(|| "Failed to copy a.bundle".to_string());
        assert_eq!(err.unwrap_err().to_string(), "Failed to copy a.bundle: denied");

        assert_eq!(
            Error::AlreadyDownloading(Tool::Uabea).to_string(),
            "UABEA is already being downloaded"
        );
        assert_eq!(
            Error::AlreadyInstalled(Tool::AssetStudio).to_string(),
            "AssetStudio is already installed"
        );
    }
}
