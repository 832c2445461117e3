//! Folder change events delivered by watch backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A change relevant to one watched folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderEvent {
    /// Folder the change belongs to.
    pub folder: PathBuf,

    /// Kind of change.
    pub kind: FolderEventKind,

    /// Timestamp when the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl FolderEvent {
    /// Create a new folder event.
    pub fn new(folder: PathBuf, kind: FolderEventKind) -> Self {
        Self {
            folder,
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Kinds of folder changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FolderEventKind {
    /// The annotation file was created, written or renamed into place.
    AnnotationChanged,
    /// The annotation file was deleted or renamed away.
    AnnotationRemoved,
    /// The folder itself was deleted.
    FolderRemoved,
}
