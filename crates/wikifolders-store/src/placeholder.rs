//! "Write in progress" markers.
//!
//! A [`PlaceholderFile`] exists in the folder for exactly as long as the
//! guard lives. The watcher checks for one before reconciling so that the
//! store's own writes are not mistaken for external edits.

use crate::error::{Result, StoreError};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tracing::{trace, warn};
use wikifolders_config::constants::{is_placeholder_filename, placeholder_filename};

/// Upper bound on marker numbers tried before giving up.
const MAX_PLACEHOLDERS: u32 = 1024;

/// Scoped marker file, deleted on drop.
#[derive(Debug)]
pub struct PlaceholderFile {
    path: PathBuf,
}

impl PlaceholderFile {
    /// Create the lowest-numbered marker not already present in `folder`.
    pub async fn create(folder: &Path) -> Result<Self> {
        for n in 0..MAX_PLACEHOLDERS {
            let path = folder.join(placeholder_filename(n));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => {
                    trace!("Created placeholder {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::io(path)(e)),
            }
        }

        Err(StoreError::Io {
            path: folder.to_path_buf(),
            source: std::io::Error::other("no free placeholder file name"),
        })
    }

    /// Marker location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PlaceholderFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => trace!("Removed placeholder {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove placeholder {}: {}", self.path.display(), e),
        }
    }
}

/// Whether any placeholder marker is present in `folder`.
pub async fn placeholder_present(folder: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(folder).await else {
        return false;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry
            .file_name()
            .to_str()
            .is_some_and(is_placeholder_filename)
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn marker_lives_as_long_as_the_guard() {
        let temp = TempDir::new().unwrap();
        let guard = PlaceholderFile::create(temp.path()).await.unwrap();

        assert!(guard.path().exists());
        assert!(placeholder_present(temp.path()).await);

        drop(guard);
        assert!(!placeholder_present(temp.path()).await);
    }

    #[tokio::test]
    async fn concurrent_markers_get_distinct_numbers() {
        let temp = TempDir::new().unwrap();
        let first = PlaceholderFile::create(temp.path()).await.unwrap();
        let second = PlaceholderFile::create(temp.path()).await.unwrap();

        assert!(first.path().ends_with("~wikithinking_placeholder_file0.tmp"));
        assert!(second.path().ends_with("~wikithinking_placeholder_file1.tmp"));
    }

    #[tokio::test]
    async fn missing_folder_has_no_marker() {
        let temp = TempDir::new().unwrap();
        assert!(!placeholder_present(&temp.path().join("absent")).await);
    }
}
