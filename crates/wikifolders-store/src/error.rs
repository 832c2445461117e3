//! Error types for the annotation store.

use std::path::PathBuf;
use thiserror::Error;
use wikifolders_markup::RenderError;

/// Errors that can occur while reading or writing annotations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO failure on an annotation, artifact or marker file.
    ///
    /// Live files are left as they were before the failing write.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// File or folder involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The folder lock could not be acquired within the bounded wait.
    #[error("Folder '{folder}' is busy (waited {waited_ms}ms)")]
    Busy {
        /// Contended folder
        folder: PathBuf,
        /// How long the caller waited
        waited_ms: u64,
    },

    /// A newer write for the same folder was requested while this one waited.
    #[error("Write to '{0}' was superseded by a newer write")]
    Superseded(PathBuf),

    /// The artifact could not be rendered and the last good one was kept.
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// The wiki-folder registry could not be loaded or saved.
    #[error("Registry error: {0}")]
    Registry(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
