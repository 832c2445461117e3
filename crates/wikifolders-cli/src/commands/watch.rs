use crate::app::{exit_codes, resolve_folder, App};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use wikifolders_store::StoreEvent;
use wikifolders_watch::{spawn_dispatcher, NotifyBackend, Scheduler, DEFAULT_COLLATION};

pub async fn execute(app: &App, folders: Vec<PathBuf>) -> Result<i32> {
    let scheduler = app.scheduler();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut backend =
        NotifyBackend::new(DEFAULT_COLLATION, tx).context("Failed to start file watcher")?;
    let dispatcher = spawn_dispatcher(scheduler.clone(), rx);
    let mut events = app.store.subscribe();

    let mut targets = Vec::with_capacity(folders.len());
    for folder in &folders {
        targets.push(resolve_folder(folder).await?);
    }
    for folder in app.registered_folders().await {
        if !targets.contains(&folder) {
            targets.push(folder);
        }
    }

    for folder in &targets {
        start_watching(app, &scheduler, &mut backend, folder).await;
    }
    info!(
        "Watching {} folder(s) with a {:?} delay; press Ctrl-C to stop",
        scheduler.watched_folders().len(),
        scheduler.delay()
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Stopping watcher");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let folder = event.folder();
                    match &event {
                        StoreEvent::ArtifactUpdated { .. } => {
                            info!("Artifact updated for {}", folder.display());
                        }
                        StoreEvent::AnnotationRemoved { .. } => {
                            info!("{} is no longer a wiki folder", folder.display());
                            scheduler.unwatch(folder);
                            if let Err(e) = backend.unwatch(folder) {
                                debug!("{}", e);
                            }
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Missed {} store events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    for folder in backend.folders() {
        if let Err(e) = backend.unwatch(&folder) {
            debug!("{}", e);
        }
    }
    dispatcher.abort();
    Ok(exit_codes::SUCCESS)
}

/// Watch `folder` and bring its artifact up to date with edits made while
/// nothing was watching.
async fn start_watching(
    app: &App,
    scheduler: &Scheduler,
    backend: &mut NotifyBackend,
    folder: &Path,
) {
    if !app.store.is_active(folder).await {
        warn!("{} has no annotation, skipping", folder.display());
        return;
    }
    if let Err(e) = backend.watch(folder) {
        warn!("Cannot watch {}: {}", folder.display(), e);
        return;
    }
    scheduler.watch(folder);

    match app.store.refresh(folder, false).await {
        Ok(outcome) => debug!("Startup refresh of {}: {}", folder.display(), outcome),
        Err(e) => warn!("Startup refresh of {} failed: {}", folder.display(), e),
    }
}
