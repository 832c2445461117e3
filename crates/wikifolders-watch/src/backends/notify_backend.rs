//! Notify-based folder watching backend.

use crate::{
    error::{Result, WatchError},
    events::{FolderEvent, FolderEventKind},
    scheduler::Scheduler,
};

use chrono::Utc;
use dashmap::DashSet;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};
use wikifolders_config::constants::WIKITEXT_FILENAME;

/// Collation window for raw OS events. Much shorter than the scheduler's
/// debounce; it only merges the create/modify/close bursts of one save.
pub const DEFAULT_COLLATION: Duration = Duration::from_millis(100);

/// Watches annotated folders (non-recursively) and forwards annotation
/// changes as [`FolderEvent`]s.
pub struct NotifyBackend {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    folders: Arc<DashSet<PathBuf>>,
}

impl NotifyBackend {
    /// Create a backend sending events to `sender`.
    pub fn new(collation: Duration, sender: mpsc::UnboundedSender<FolderEvent>) -> Result<Self> {
        let folders: Arc<DashSet<PathBuf>> = Arc::new(DashSet::new());
        let watched = Arc::clone(&folders);

        let debouncer = new_debouncer(collation, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        for folder_event in convert_notify_event(&event.event, &watched) {
                            if let Err(e) = sender.send(folder_event) {
                                error!("Failed to send folder event: {}", e);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!("Notify error: {:?}", error);
                    }
                }
            }
        })
        .map_err(|e| WatchError::Watch(format!("Failed to create notify watcher: {}", e)))?;

        info!("Notify backend initialized");
        Ok(Self { debouncer, folders })
    }

    /// Start delivering events for `folder`.
    pub fn watch(&mut self, folder: &Path) -> Result<()> {
        if self.folders.contains(folder) {
            return Ok(());
        }
        self.debouncer
            .watch(folder, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Watch(format!("Failed to watch {}: {}", folder.display(), e)))?;
        self.folders.insert(folder.to_path_buf());
        debug!("Added notify watch: {}", folder.display());
        Ok(())
    }

    /// Stop delivering events for `folder`.
    pub fn unwatch(&mut self, folder: &Path) -> Result<()> {
        if self.folders.remove(folder).is_none() {
            return Err(WatchError::NotWatched(folder.display().to_string()));
        }
        // The OS watch is already gone when the folder itself was deleted.
        if let Err(e) = self.debouncer.unwatch(folder) {
            debug!("Unwatch of {} reported: {}", folder.display(), e);
        }
        debug!("Removed notify watch: {}", folder.display());
        Ok(())
    }

    /// Folders currently watched by the backend.
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self.folders.iter().map(|f| f.key().clone()).collect();
        folders.sort();
        folders
    }
}

/// Map one raw notify event onto the folder events it implies.
///
/// Only the annotation file and the watched folders themselves matter;
/// artifact, placeholder and staging files are ignored.
fn convert_notify_event(event: &Event, watched: &DashSet<PathBuf>) -> Vec<FolderEvent> {
    let mut converted = Vec::new();
    for (index, path) in event.paths.iter().enumerate() {
        if watched.contains(path) {
            if matches!(event.kind, EventKind::Remove(_)) {
                converted.push(FolderEvent::new(path.clone(), FolderEventKind::FolderRemoved));
            }
            continue;
        }

        if path.file_name().and_then(|n| n.to_str()) != Some(WIKITEXT_FILENAME) {
            continue;
        }
        let Some(folder) = path.parent() else {
            continue;
        };

        let removed = match event.kind {
            EventKind::Remove(_) => true,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => true,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => index == 0,
            _ => false,
        };
        let kind = if removed {
            FolderEventKind::AnnotationRemoved
        } else {
            FolderEventKind::AnnotationChanged
        };
        trace!("{:?} -> {:?} for {}", event.kind, kind, folder.display());
        converted.push(FolderEvent::new(folder.to_path_buf(), kind));
    }
    converted
}

/// Feed backend events into `scheduler` until the channel closes.
pub fn spawn_dispatcher(
    scheduler: Scheduler,
    mut events: mpsc::UnboundedReceiver<FolderEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let lag = Utc::now().signed_duration_since(event.timestamp);
            trace!(
                "Dispatching {:?} for {} ({} ms after it was observed)",
                event.kind,
                event.folder.display(),
                lag.num_milliseconds()
            );
            match event.kind {
                FolderEventKind::AnnotationChanged | FolderEventKind::AnnotationRemoved => {
                    scheduler.notify(&event.folder);
                }
                FolderEventKind::FolderRemoved => {
                    scheduler.unwatch(&event.folder);
                }
            }
        }
        debug!("Folder event channel closed");
    })
}
