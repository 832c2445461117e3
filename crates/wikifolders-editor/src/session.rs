//! Open / edit / save-or-cancel lifecycle for one folder at a time.

use crate::error::{EditorError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wikifolders_store::{AnnotationStore, Outcome};
use wikifolders_watch::Scheduler;

/// Lifecycle state of an [`EditorSession`].
///
/// Saving and cancelling are not observable states: both run inside a
/// single `&mut self` call and leave the session `Closed` on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No folder is being edited.
    Closed,
    /// A folder is open and its text can be edited.
    Open,
}

#[derive(Debug)]
struct Document {
    folder: PathBuf,
    original: String,
    buffer: String,
}

/// Edits the annotation of a single folder.
///
/// Only one folder can be open at a time; opening a different folder
/// while one is open fails with [`EditorError::AlreadyOpen`].
#[derive(Debug)]
pub struct EditorSession {
    store: Arc<AnnotationStore>,
    scheduler: Scheduler,
    document: Option<Document>,
}

impl EditorSession {
    /// Create a closed session.
    pub fn new(store: Arc<AnnotationStore>, scheduler: Scheduler) -> Self {
        Self {
            store,
            scheduler,
            document: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.document.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Folder being edited, if any.
    pub fn folder(&self) -> Option<&Path> {
        self.document.as_ref().map(|doc| doc.folder.as_path())
    }

    /// Text being edited, if a folder is open.
    pub fn text(&self) -> Option<&str> {
        self.document.as_ref().map(|doc| doc.buffer.as_str())
    }

    /// Whether the buffer differs from the text loaded at open.
    pub fn is_dirty(&self) -> bool {
        self.document
            .as_ref()
            .is_some_and(|doc| doc.buffer != doc.original)
    }

    /// Open `folder` for editing and return its current text.
    ///
    /// A folder without an annotation opens with an empty buffer.
    /// Reopening the folder that is already open keeps the unsaved buffer.
    pub async fn open(&mut self, folder: &Path) -> Result<&str> {
        let folder = tokio::fs::canonicalize(folder)
            .await
            .map_err(|source| EditorError::Io {
                path: folder.to_path_buf(),
                source,
            })?;

        if let Some(doc) = &self.document {
            if doc.folder != folder {
                return Err(EditorError::AlreadyOpen {
                    open: doc.folder.clone(),
                    requested: folder,
                });
            }
            debug!("Editor already open for {}", folder.display());
        } else {
            let text = self
                .store
                .read(&folder)
                .await?
                .map(|annotation| annotation.markup)
                .unwrap_or_default();
            if !text.is_empty() {
                self.scheduler.watch(&folder);
            }
            info!("Opened editor for {}", folder.display());
            self.document = Some(Document {
                folder,
                original: text.clone(),
                buffer: text,
            });
        }

        self.text().ok_or(EditorError::NotOpen)
    }

    /// Replace the text being edited.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        let doc = self.document.as_mut().ok_or(EditorError::NotOpen)?;
        doc.buffer = text.into();
        Ok(())
    }

    /// Persist the buffer and close the session.
    ///
    /// On [`Outcome::MadeChanges`] the folder is reconciled immediately,
    /// bypassing the debounce, and its watch is started or stopped to
    /// match whether it still has an annotation. On failure the session
    /// stays open with the buffer intact.
    pub async fn save(&mut self) -> Result<Outcome> {
        let doc = self.document.as_ref().ok_or(EditorError::NotOpen)?;
        let folder = doc.folder.clone();
        let outcome = self.store.write(&folder, &doc.buffer).await?;

        if outcome.made_changes() {
            if let Err(e) = self.scheduler.reconcile_now(&folder).await {
                warn!("Post-save reconciliation of {} failed: {}", folder.display(), e);
            }
            if self.store.is_active(&folder).await {
                self.scheduler.watch(&folder);
            } else {
                self.scheduler.unwatch(&folder);
            }
        }

        info!("Saved {}: {}", folder.display(), outcome);
        self.document = None;
        Ok(outcome)
    }

    /// Discard the buffer and close the session.
    pub fn cancel(&mut self) -> Result<Outcome> {
        let doc = self.document.take().ok_or(EditorError::NotOpen)?;
        debug!("Cancelled editing {}", doc.folder.display());
        Ok(Outcome::NoChange)
    }

    /// Whether `folder` currently has an annotation.
    pub async fn is_active_wiki_folder(&self, folder: &Path) -> bool {
        self.store.is_active(folder).await
    }
}
