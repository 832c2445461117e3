//! Seam between the scheduler and the store.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use wikifolders_store::{AnnotationStore, Outcome};

/// Re-renders a folder when its debounce timer fires.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Bring the folder's artifact up to date with its annotation.
    async fn reconcile(&self, folder: &Path) -> Result<Outcome>;

    /// Whether a writer is currently mid-write in the folder.
    async fn write_in_progress(&self, folder: &Path) -> bool;

    /// Whether the folder still carries an annotation.
    async fn is_active(&self, folder: &Path) -> bool;
}

#[async_trait]
impl Reconciler for AnnotationStore {
    async fn reconcile(&self, folder: &Path) -> Result<Outcome> {
        Ok(self.force_refresh(folder).await?)
    }

    async fn write_in_progress(&self, folder: &Path) -> bool {
        AnnotationStore::write_in_progress(self, folder).await
    }

    async fn is_active(&self, folder: &Path) -> bool {
        AnnotationStore::is_active(self, folder).await
    }
}
