//! Error types for editor sessions.

use std::path::PathBuf;
use thiserror::Error;
use wikifolders_store::StoreError;
use wikifolders_watch::WatchError;

/// Errors returned by [`EditorSession`](crate::EditorSession) operations.
#[derive(Error, Debug)]
pub enum EditorError {
    /// A session for another folder has to be closed first.
    #[error("Editor already open for '{}' (requested '{}')", open.display(), requested.display())]
    AlreadyOpen {
        /// Folder currently being edited.
        open: PathBuf,
        /// Folder the caller asked for.
        requested: PathBuf,
    },

    /// The operation needs an open session.
    #[error("No editor session is open")]
    NotOpen,

    /// The folder could not be resolved.
    #[error("Cannot open folder '{}': {source}", path.display())]
    Io {
        /// Folder that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The scheduler rejected the operation.
    #[error(transparent)]
    Watch(#[from] WatchError),
}

impl EditorError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EditorError::Store(e) => e.is_retryable(),
            EditorError::Watch(WatchError::Store(e)) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
