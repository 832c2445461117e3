//! Shared setup for commands: preferences, store and scheduler.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use wikifolders_config::Preferences;
use wikifolders_store::{AnnotationStore, FolderRegistry};
use wikifolders_watch::Scheduler;

/// Process exit codes.
pub mod exit_codes {
    use wikifolders_editor::EditorError;
    use wikifolders_store::{Outcome, StoreError};
    use wikifolders_watch::WatchError;

    pub const SUCCESS: i32 = 0;
    pub const ERROR: i32 = 1;
    pub const NO_CHANGE: i32 = 3;
    /// Temporary failure (sysexits `EX_TEMPFAIL`); the same command may
    /// succeed when retried.
    pub const BUSY: i32 = 75;

    /// Exit code reporting a write or refresh outcome.
    pub fn for_outcome(outcome: Outcome) -> i32 {
        match outcome {
            Outcome::MadeChanges => SUCCESS,
            Outcome::NoChange => NO_CHANGE,
        }
    }

    /// Exit code for a failed command.
    pub fn for_error(error: &anyhow::Error) -> i32 {
        let retryable = error.chain().any(|cause| {
            if let Some(e) = cause.downcast_ref::<EditorError>() {
                e.is_retryable()
            } else if let Some(e) = cause.downcast_ref::<StoreError>() {
                e.is_retryable()
            } else if let Some(WatchError::Store(e)) = cause.downcast_ref::<WatchError>() {
                e.is_retryable()
            } else {
                false
            }
        });
        if retryable {
            BUSY
        } else {
            ERROR
        }
    }
}

pub struct App {
    pub prefs: Preferences,
    pub store: Arc<AnnotationStore>,
}

impl App {
    /// Load preferences from `config` (or the default location) and build the store.
    pub async fn load(config: Option<&Path>) -> Result<Self> {
        let prefs = match config {
            Some(path) => Preferences::load_from_file(path)
                .await
                .with_context(|| format!("Failed to load preferences from {}", path.display()))?,
            None => Preferences::load_default()
                .await
                .context("Failed to load preferences")?,
        };
        Self::from_preferences(prefs).await
    }

    pub async fn from_preferences(prefs: Preferences) -> Result<Self> {
        let registry_path = prefs.registry_path();
        let registry = FolderRegistry::load(&registry_path)
            .await
            .with_context(|| format!("Failed to load folder registry {}", registry_path.display()))?;
        debug!(
            "Tracking {} wiki folder(s) in {}",
            registry.folders().await.len(),
            registry.path().display()
        );
        debug!("Using resources in {}", prefs.resources_dir.display());

        let store = AnnotationStore::from_preferences(&prefs).with_registry(Arc::new(registry));
        Ok(Self {
            prefs,
            store: Arc::new(store),
        })
    }

    /// A scheduler reconciling through this app's store.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::from_preferences(self.store.clone(), &self.prefs)
    }

    /// Folders recorded as annotated in the registry.
    pub async fn registered_folders(&self) -> Vec<PathBuf> {
        match self.store.registry() {
            Some(registry) => registry.folders().await,
            None => Vec::new(),
        }
    }
}

/// Resolve a folder argument to an absolute path.
pub async fn resolve_folder(folder: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(folder)
        .await
        .with_context(|| format!("Folder {} does not exist", folder.display()))
}
