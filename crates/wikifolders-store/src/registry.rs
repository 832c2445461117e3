//! Persistent list of active wiki folders.
//!
//! Stored as JSON and rewritten atomically (temp file, then rename) on
//! every change.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    folders: BTreeSet<PathBuf>,
}

/// Set of folders that currently carry an annotation.
#[derive(Debug)]
pub struct FolderRegistry {
    path: PathBuf,
    folders: Mutex<BTreeSet<PathBuf>>,
}

impl FolderRegistry {
    /// Load the registry at `path`; a missing file is an empty registry.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let folders = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let file: RegistryFile = serde_json::from_str(&content).map_err(|e| {
                    StoreError::Registry(format!("{}: {}", path.display(), e))
                })?;
                info!(
                    "Loaded {} wiki folders from {}",
                    file.folders.len(),
                    path.display()
                );
                file.folders
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No registry at {}, starting empty", path.display());
                BTreeSet::new()
            }
            Err(e) => return Err(StoreError::io(&path)(e)),
        };

        Ok(Self {
            path,
            folders: Mutex::new(folders),
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered folders, sorted.
    pub async fn folders(&self) -> Vec<PathBuf> {
        self.folders.lock().await.iter().cloned().collect()
    }

    /// Whether `folder` is registered.
    pub async fn contains(&self, folder: &Path) -> bool {
        self.folders.lock().await.contains(folder)
    }

    /// Add `folder`; returns `false` if it was already present.
    pub async fn insert(&self, folder: &Path) -> Result<bool> {
        let mut folders = self.folders.lock().await;
        if !folders.insert(folder.to_path_buf()) {
            return Ok(false);
        }
        self.persist(&folders).await?;
        Ok(true)
    }

    /// Remove `folder`; returns `false` if it was not present.
    pub async fn remove(&self, folder: &Path) -> Result<bool> {
        let mut folders = self.folders.lock().await;
        if !folders.remove(folder) {
            return Ok(false);
        }
        self.persist(&folders).await?;
        Ok(true)
    }

    async fn persist(&self, folders: &BTreeSet<PathBuf>) -> Result<()> {
        let file = RegistryFile {
            folders: folders.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Registry(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io(parent))?;
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(StoreError::io(&temp_path))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(StoreError::io(&self.path))?;

        debug!("Registry persisted to {}", self.path.display());
        Ok(())
    }
}
