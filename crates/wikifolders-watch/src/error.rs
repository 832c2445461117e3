//! Error types for the folder watching system.

use thiserror::Error;
use wikifolders_store::StoreError;

/// Errors that can occur during folder watching operations.
#[derive(Error, Debug)]
pub enum WatchError {
    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(String),

    /// The folder is not being watched.
    #[error("Folder '{0}' is not watched")]
    NotWatched(String),

    /// Reconciliation failed in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for folder watching operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Convert notify errors to our error type.
impl From<notify::Error> for WatchError {
    fn from(err: notify::Error) -> Self {
        WatchError::Watch(err.to_string())
    }
}
