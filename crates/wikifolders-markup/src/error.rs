//! Render failures.
//!
//! Tag rewriting itself never fails; only resource loading can.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while composing a rendered document.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The HTML template could not be read.
    #[error("HTML template missing: {path}")]
    TemplateMissing {
        /// Expected template location
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A referenced resource (the background image) does not exist.
    #[error("Render resource missing: {0}")]
    ResourceMissing(PathBuf),
}

/// Result type for render operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
