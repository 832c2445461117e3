//! Error types for preference loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading preferences.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The preferences file exists but could not be read.
    #[error("Failed to read preferences '{path}': {source}")]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The preferences file is not valid TOML for [`crate::Preferences`].
    #[error("Failed to parse preferences '{path}': {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A value is out of range.
    #[error("Invalid preference '{field}': {message}")]
    Validation {
        /// Offending key
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
