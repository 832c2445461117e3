//! The annotation store: per-folder markup file and rendered artifact.
//!
//! Write protocol, all under the folder lock:
//!
//! 1. create a placeholder marker
//! 2. stage the new annotation next to the live one
//! 3. render and stage the artifact, stamped with the staged annotation's mtime
//! 4. keep a backup of the live annotation, then rename the annotation
//!    and the artifact over the live files
//! 5. drop the backup and the marker
//!
//! Nothing live is touched before step 4. A failed rename in step 4 puts
//! the backed-up annotation back, so the previously committed pair stays.

use crate::annotation::{Annotation, Outcome, RenderedArtifact};
use crate::error::{Result, StoreError};
use crate::events::StoreEvent;
use crate::locks::FolderLocks;
use crate::placeholder::{placeholder_present, PlaceholderFile};
use crate::registry::FolderRegistry;
use crate::staging::{read_optional, remove_if_exists, Backup, StagedFile};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use wikifolders_config::constants::{ARTIFACT_FILENAME, WIKITEXT_FILENAME};
use wikifolders_config::Preferences;
use wikifolders_markup::{RenderError, Renderer};

const EVENT_CAPACITY: usize = 64;

/// Reads and writes annotations and their rendered artifacts.
#[derive(Debug)]
pub struct AnnotationStore {
    renderer: Renderer,
    locks: FolderLocks,
    registry: Option<Arc<FolderRegistry>>,
    events: broadcast::Sender<StoreEvent>,
}

impl AnnotationStore {
    /// Create a store with the given renderer and bounded lock wait.
    pub fn new(renderer: Renderer, lock_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            renderer,
            locks: FolderLocks::new(lock_timeout),
            registry: None,
            events,
        }
    }

    /// Create a store from user preferences (no registry attached).
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(Renderer::from_preferences(prefs), prefs.lock_timeout())
    }

    /// Keep `registry` in sync with the set of annotated folders.
    pub fn with_registry(mut self, registry: Arc<FolderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Attached registry, if any.
    pub fn registry(&self) -> Option<&Arc<FolderRegistry>> {
        self.registry.as_ref()
    }

    /// Renderer used for artifacts.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Per-folder lock table shared by every operation of this store.
    pub fn locks(&self) -> &FolderLocks {
        &self.locks
    }

    /// Subscribe to artifact notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Current annotation of `folder`, if one exists.
    pub async fn read(&self, folder: &Path) -> Result<Option<Annotation>> {
        let folder = canonical_folder(folder).await?;
        read_annotation(&folder).await
    }

    /// Current artifact of `folder`, if one exists with a readable header.
    pub async fn artifact(&self, folder: &Path) -> Result<Option<RenderedArtifact>> {
        let folder = canonical_folder(folder).await?;
        let contents = read_optional(&folder.join(ARTIFACT_FILENAME)).await?;
        Ok(contents.as_deref().and_then(RenderedArtifact::decode))
    }

    /// Whether `folder` currently has an annotation.
    pub async fn is_active(&self, folder: &Path) -> bool {
        tokio::fs::try_exists(folder.join(WIKITEXT_FILENAME))
            .await
            .unwrap_or(false)
    }

    /// Whether the artifact is missing or older than the annotation.
    ///
    /// A folder without an annotation is never stale.
    pub async fn is_stale(&self, folder: &Path) -> Result<bool> {
        let Some(annotation) = self.read(folder).await? else {
            return Ok(false);
        };
        let artifact = self.artifact(folder).await?;
        Ok(!artifact.is_some_and(|a| a.is_valid_for(&annotation)))
    }

    /// Whether a store write is currently in progress in `folder`.
    pub async fn write_in_progress(&self, folder: &Path) -> bool {
        placeholder_present(folder).await
    }

    /// Replace the annotation of `folder` with `markup` and re-render.
    ///
    /// Byte-equal markup is a [`Outcome::NoChange`]; empty markup removes
    /// the annotation and artifact.
    pub async fn write(&self, folder: &Path, markup: &str) -> Result<Outcome> {
        let folder = canonical_folder(folder).await?;
        let outcome = {
            let slot = self.locks.slot(&folder);
            let ticket = slot.issue_ticket();
            let _lock = self.locks.acquire(&folder, &slot).await?;

            if !slot.is_current(ticket) {
                debug!("Dropping superseded write to {}", folder.display());
                return Err(StoreError::Superseded(folder));
            }
            self.write_locked(&folder, markup).await?
        };

        // Slot and guard are released; the slot goes unless someone queued
        if markup.is_empty() && outcome.made_changes() {
            self.locks.forget(&folder);
        }
        Ok(outcome)
    }

    async fn write_locked(&self, folder: &Path, markup: &str) -> Result<Outcome> {
        let current = read_annotation(folder).await?;
        if markup.is_empty() {
            return self.clear_locked(folder, current.is_some()).await;
        }
        if current.as_ref().is_some_and(|a| a.markup == markup) {
            debug!("Annotation of {} unchanged", folder.display());
            return Ok(Outcome::NoChange);
        }

        let _placeholder = PlaceholderFile::create(folder).await?;

        let annotation_path = folder.join(WIKITEXT_FILENAME);
        let artifact_path = folder.join(ARTIFACT_FILENAME);

        let staged_annotation = StagedFile::stage(&annotation_path, markup.as_bytes()).await?;
        let annotation = Annotation {
            folder: folder.to_path_buf(),
            markup: markup.to_string(),
            modified: staged_annotation.modified().await?,
        };

        let staged_artifact = match self.render_document(&annotation, &artifact_path).await {
            Ok(document) => Some(StagedFile::stage(&artifact_path, document.as_bytes()).await?),
            Err(e) => {
                warn!(
                    "Keeping last rendered artifact of {}: {}",
                    folder.display(),
                    e
                );
                None
            }
        };

        let rendered = staged_artifact.is_some();
        let previous = Backup::preserve(&annotation_path).await?;
        if let Err(e) = staged_annotation.commit().await {
            return Err(roll_back(previous, e).await);
        }
        if let Some(staged) = staged_artifact {
            if let Err(e) = staged.commit().await {
                return Err(roll_back(previous, e).await);
            }
        }
        previous.discard().await;

        if current.is_none() {
            self.register(folder).await;
        }
        if rendered {
            self.emit(StoreEvent::ArtifactUpdated {
                folder: folder.to_path_buf(),
            });
        }

        info!("Saved annotation for {}", folder.display());
        Ok(Outcome::MadeChanges)
    }

    /// Re-render `folder`. Without `force`, a valid artifact is left alone.
    pub async fn refresh(&self, folder: &Path, force: bool) -> Result<Outcome> {
        let folder = canonical_folder(folder).await?;
        let slot = self.locks.slot(&folder);
        let _lock = self.locks.acquire(&folder, &slot).await?;

        let artifact_path = folder.join(ARTIFACT_FILENAME);
        let Some(annotation) = read_annotation(&folder).await? else {
            // Annotation deleted behind our back
            if remove_if_exists(&artifact_path).await? {
                debug!("Removed orphaned artifact in {}", folder.display());
                self.emit(StoreEvent::AnnotationRemoved {
                    folder: folder.clone(),
                });
            }
            self.unregister(&folder).await;
            return Ok(Outcome::NoChange);
        };

        let existing = read_optional(&artifact_path).await?;
        if !force {
            let valid = existing
                .as_deref()
                .and_then(RenderedArtifact::decode)
                .is_some_and(|a| a.is_valid_for(&annotation));
            if valid {
                debug!("Artifact of {} is current", folder.display());
                return Ok(Outcome::NoChange);
            }
        }

        let document = self.render_document(&annotation, &artifact_path).await?;
        if existing.as_deref() == Some(document.as_str()) {
            debug!("Re-render of {} is byte-identical", folder.display());
            return Ok(Outcome::NoChange);
        }

        let _placeholder = PlaceholderFile::create(&folder).await?;
        StagedFile::stage(&artifact_path, document.as_bytes())
            .await?
            .commit()
            .await?;
        self.emit(StoreEvent::ArtifactUpdated {
            folder: folder.clone(),
        });

        info!("Refreshed artifact for {}", folder.display());
        Ok(Outcome::MadeChanges)
    }

    /// Re-render `folder` regardless of staleness.
    pub async fn force_refresh(&self, folder: &Path) -> Result<Outcome> {
        self.refresh(folder, true).await
    }

    async fn clear_locked(&self, folder: &Path, existed: bool) -> Result<Outcome> {
        let artifact_path = folder.join(ARTIFACT_FILENAME);
        if !existed {
            remove_if_exists(&artifact_path).await?;
            return Ok(Outcome::NoChange);
        }

        let _placeholder = PlaceholderFile::create(folder).await?;
        let annotation_path = folder.join(WIKITEXT_FILENAME);
        let previous = Backup::preserve(&annotation_path).await?;
        if let Err(e) = remove_if_exists(&annotation_path).await {
            return Err(roll_back(previous, e).await);
        }
        if let Err(e) = remove_if_exists(&artifact_path).await {
            return Err(roll_back(previous, e).await);
        }
        previous.discard().await;

        self.unregister(folder).await;
        self.emit(StoreEvent::AnnotationRemoved {
            folder: folder.to_path_buf(),
        });

        info!("Removed annotation from {}", folder.display());
        Ok(Outcome::MadeChanges)
    }

    /// Render and stamp a document for `annotation`.
    ///
    /// A render failure is an error only when a previous artifact exists
    /// to fall back on; otherwise the built-in template is used.
    async fn render_document(
        &self,
        annotation: &Annotation,
        artifact_path: &Path,
    ) -> std::result::Result<String, RenderError> {
        let html = match self.renderer.render(&annotation.markup).await {
            Ok(html) => html,
            Err(e) => {
                if tokio::fs::try_exists(artifact_path).await.unwrap_or(false) {
                    return Err(e);
                }
                warn!(
                    "Rendering {} with the built-in template: {}",
                    annotation.folder.display(),
                    e
                );
                self.renderer.render_fallback(&annotation.markup)
            }
        };

        Ok(stamp(annotation.modified, &self.renderer, html))
    }

    async fn register(&self, folder: &Path) {
        if let Some(registry) = &self.registry {
            if let Err(e) = registry.insert(folder).await {
                warn!("Failed to register {}: {}", folder.display(), e);
            }
        }
    }

    async fn unregister(&self, folder: &Path) {
        if let Some(registry) = &self.registry {
            if let Err(e) = registry.remove(folder).await {
                warn!("Failed to unregister {}: {}", folder.display(), e);
            }
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Put the previous annotation back after a failed commit and return the
/// original failure.
async fn roll_back(previous: Backup, cause: StoreError) -> StoreError {
    warn!("Rolling back annotation: {}", cause);
    if let Err(e) = previous.restore().await {
        warn!("Rollback failed: {}", e);
    }
    cause
}

fn stamp(source_modified: DateTime<Utc>, renderer: &Renderer, html: String) -> String {
    RenderedArtifact {
        source_modified,
        template: renderer.template_path().to_path_buf(),
        background: renderer.background_path().to_path_buf(),
        html,
    }
    .encode()
}

async fn canonical_folder(folder: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(folder)
        .await
        .map_err(StoreError::io(folder))
}

async fn read_annotation(folder: &Path) -> Result<Option<Annotation>> {
    let path = folder.join(WIKITEXT_FILENAME);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(&path)(e)),
    };
    let Some(markup) = read_optional(&path).await? else {
        return Ok(None);
    };
    let modified = metadata.modified().map_err(StoreError::io(&path))?;

    Ok(Some(Annotation {
        folder: folder.to_path_buf(),
        markup,
        modified: DateTime::<Utc>::from(modified),
    }))
}
