//! Create-temp-then-rename file replacement, with rollback of the
//! previous live file.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// New contents written beside a live file, not yet visible.
///
/// Dropping an uncommitted file deletes the temp copy, leaving the live
/// file untouched.
#[derive(Debug)]
pub(crate) struct StagedFile {
    temp: PathBuf,
    live: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Write `contents` to `<live>.tmp`.
    pub(crate) async fn stage(live: &Path, contents: &[u8]) -> Result<Self> {
        let staged = Self {
            temp: sibling(live, ".tmp"),
            live: live.to_path_buf(),
            committed: false,
        };

        tokio::fs::write(&staged.temp, contents)
            .await
            .map_err(StoreError::io(&staged.temp))?;
        Ok(staged)
    }

    /// Modification time of the staged copy; `rename` preserves it.
    pub(crate) async fn modified(&self) -> Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.temp)
            .await
            .map_err(StoreError::io(&self.temp))?;
        let modified = metadata.modified().map_err(StoreError::io(&self.temp))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    /// Atomically move the staged copy over the live file.
    pub(crate) async fn commit(mut self) -> Result<()> {
        tokio::fs::rename(&self.temp, &self.live)
            .await
            .map_err(StoreError::io(&self.live))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.temp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to discard staged file {}: {}", self.temp.display(), e);
            }
        }
    }
}

/// The previous version of a live file, kept until the replacement is
/// known to have stuck.
///
/// The live file stays in place: the backup is a hard link to it, so it
/// keeps the original contents and modification time once the live name
/// is renamed over. Dropping an unresolved backup puts the original back.
#[derive(Debug)]
pub(crate) struct Backup {
    live: PathBuf,
    /// `None` when there was no live file to preserve.
    saved: Option<PathBuf>,
    resolved: bool,
}

impl Backup {
    /// Preserve the current `live` file as `<live>.bak`.
    pub(crate) async fn preserve(live: &Path) -> Result<Self> {
        let saved = sibling(live, ".bak");
        // Leftover from an interrupted run
        remove_if_exists(&saved).await?;

        let linked = match tokio::fs::hard_link(live, &saved).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    live: live.to_path_buf(),
                    saved: None,
                    resolved: false,
                });
            }
            Err(e) => Err(e),
        };
        if let Err(e) = linked {
            // No hard links on this filesystem
            debug!("Moving {} aside instead of linking: {}", live.display(), e);
            tokio::fs::rename(live, &saved)
                .await
                .map_err(StoreError::io(live))?;
        }

        Ok(Self {
            live: live.to_path_buf(),
            saved: Some(saved),
            resolved: false,
        })
    }

    /// Put the preserved file back, or remove the live file if there was
    /// none before.
    pub(crate) async fn restore(mut self) -> Result<()> {
        self.resolved = true;
        match &self.saved {
            Some(saved) => {
                tokio::fs::rename(saved, &self.live)
                    .await
                    .map_err(StoreError::io(&self.live))?;
                // Renaming onto another link of the same file leaves both names
                remove_if_exists(saved).await.map(|_| ())
            }
            None => remove_if_exists(&self.live).await.map(|_| ()),
        }
    }

    /// Keep the new live file and delete the backup.
    pub(crate) async fn discard(mut self) {
        self.resolved = true;
        if let Some(saved) = &self.saved {
            if let Err(e) = remove_if_exists(saved).await {
                warn!("Failed to remove backup: {}", e);
            }
        }
    }
}

impl Drop for Backup {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let restored = match &self.saved {
            Some(saved) => std::fs::rename(saved, &self.live).and_then(|()| {
                match std::fs::remove_file(saved) {
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    other => other,
                }
            }),
            None => match std::fs::remove_file(&self.live) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = restored {
            warn!("Failed to restore {}: {}", self.live.display(), e);
        }
    }
}

fn sibling(live: &Path, suffix: &str) -> PathBuf {
    let mut name = live.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    live.with_file_name(name)
}

/// Read a file, mapping "not found" to `None`.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path)(e)),
    }
}

/// Delete a file, returning whether it existed.
pub(crate) async fn remove_if_exists(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path)(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn uncommitted_stage_leaves_live_file_alone() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");
        tokio::fs::write(&live, "old").await.unwrap();

        let staged = StagedFile::stage(&live, b"new").await.unwrap();
        assert!(temp.path().join("note.tmp").exists());
        drop(staged);

        assert!(!temp.path().join("note.tmp").exists());
        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "old");
    }

    #[tokio::test]
    async fn commit_replaces_live_file() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");
        tokio::fs::write(&live, "old").await.unwrap();

        StagedFile::stage(&live, b"new")
            .await
            .unwrap()
            .commit()
            .await
            .unwrap();

        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "new");
        assert!(!temp.path().join("note.tmp").exists());
    }

    #[tokio::test]
    async fn restored_backup_brings_back_contents_and_mtime() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");
        tokio::fs::write(&live, "old").await.unwrap();
        let before = tokio::fs::metadata(&live).await.unwrap().modified().unwrap();

        let backup = Backup::preserve(&live).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "old");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        StagedFile::stage(&live, b"new")
            .await
            .unwrap()
            .commit()
            .await
            .unwrap();

        backup.restore().await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "old");
        let after = tokio::fs::metadata(&live).await.unwrap().modified().unwrap();
        assert_eq!(before, after);
        assert!(!temp.path().join("note.bak").exists());
    }

    #[tokio::test]
    async fn restore_before_replacement_leaves_no_backup() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");
        tokio::fs::write(&live, "old").await.unwrap();

        Backup::preserve(&live).await.unwrap().restore().await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "old");
        assert!(!temp.path().join("note.bak").exists());
    }

    #[tokio::test]
    async fn restoring_without_previous_file_removes_live() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");

        let backup = Backup::preserve(&live).await.unwrap();
        tokio::fs::write(&live, "new").await.unwrap();
        backup.restore().await.unwrap();

        assert!(!live.exists());
    }

    #[tokio::test]
    async fn discarded_backup_keeps_new_file() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");
        tokio::fs::write(&live, "old").await.unwrap();

        let backup = Backup::preserve(&live).await.unwrap();
        StagedFile::stage(&live, b"new")
            .await
            .unwrap()
            .commit()
            .await
            .unwrap();
        backup.discard().await;

        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "new");
        assert!(!temp.path().join("note.bak").exists());
    }

    #[tokio::test]
    async fn dropped_backup_restores_original() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("note");
        tokio::fs::write(&live, "old").await.unwrap();

        let backup = Backup::preserve(&live).await.unwrap();
        tokio::fs::remove_file(&live).await.unwrap();
        drop(backup);

        assert_eq!(tokio::fs::read_to_string(&live).await.unwrap(), "old");
    }
}
