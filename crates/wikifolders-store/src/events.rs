//! Notifications for the external icon-rendering consumer.

use std::path::{Path, PathBuf};

/// Something visible changed on disk for a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new rendered artifact was moved into place.
    ArtifactUpdated {
        /// Folder whose decoration changed
        folder: PathBuf,
    },
    /// The annotation and its artifact were deleted.
    AnnotationRemoved {
        /// Folder that is no longer a wiki folder
        folder: PathBuf,
    },
}

impl StoreEvent {
    /// Folder the event refers to.
    pub fn folder(&self) -> &Path {
        match self {
            StoreEvent::ArtifactUpdated { folder } | StoreEvent::AnnotationRemoved { folder } => {
                folder
            }
        }
    }
}
