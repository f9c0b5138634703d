//! Error types for library operations.

use std::path::PathBuf;

use thiserror::Error;
use vscan_models::PathError;

/// Result type for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Errors that can occur while scanning or editing the library.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("No move rule matches: {0}")]
    NoMoveRule(String),

    #[error("Library root unreadable: {root}: {source}")]
    RootUnreadable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Map an IO error for `path`, turning `NotFound` into [`LibraryError::NotFound`].
    pub fn io_for(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io(err)
        }
    }

    /// Whether the error was caused by bad client input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath(_) | Self::NotFound(_) | Self::NoMoveRule(_)
        )
    }
}
