//! Scheduler and notify backend driving a real annotation store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wikifolders_config::constants::{ARTIFACT_FILENAME, WIKITEXT_FILENAME};
use wikifolders_markup::{RenderSettings, Renderer};
use wikifolders_store::{AnnotationStore, Outcome};
use wikifolders_watch::{
    spawn_dispatcher, NotifyBackend, Reconciler, Result, Scheduler, DEFAULT_COLLATION,
};

/// Counts reconciliations while delegating to the real store.
struct Counting {
    store: AnnotationStore,
    calls: AtomicU64,
}

#[async_trait]
impl Reconciler for Counting {
    async fn reconcile(&self, folder: &Path) -> Result<Outcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.store.reconcile(folder).await
    }

    async fn write_in_progress(&self, folder: &Path) -> bool {
        self.store.write_in_progress(folder).await
    }

    async fn is_active(&self, folder: &Path) -> bool {
        Reconciler::is_active(&self.store, folder).await
    }
}

async fn setup() -> (TempDir, PathBuf, Arc<Counting>) {
    let temp = TempDir::new().unwrap();
    let resources = temp.path().join("resources");
    let folder = temp.path().join("Inbox");
    tokio::fs::create_dir_all(&resources).await.unwrap();
    tokio::fs::create_dir_all(&folder).await.unwrap();
    tokio::fs::write(resources.join("template.html"), "<body>{{content}}</body>")
        .await
        .unwrap();
    tokio::fs::write(resources.join("background.png"), b"png")
        .await
        .unwrap();

    let renderer = Renderer::new(
        resources.join("template.html"),
        resources.join("background.png"),
        RenderSettings::default(),
    );
    let store = AnnotationStore::new(renderer, Duration::from_secs(5));
    let folder = tokio::fs::canonicalize(&folder).await.unwrap();
    let reconciler = Arc::new(Counting {
        store,
        calls: AtomicU64::new(0),
    });
    (temp, folder, reconciler)
}

async fn artifact_html(folder: &Path) -> Option<String> {
    tokio::fs::read_to_string(folder.join(ARTIFACT_FILENAME))
        .await
        .ok()
}

/// Poll until `check` holds or the deadline passes.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn burst_of_external_edits_renders_once() {
    let (_temp, folder, reconciler) = setup().await;
    let scheduler = Scheduler::new(reconciler.clone(), Duration::from_millis(150));
    scheduler.watch(&folder);

    for i in 0..5 {
        tokio::fs::write(folder.join(WIKITEXT_FILENAME), format!("'''draft {i}'''"))
            .await
            .unwrap();
        scheduler.notify(&folder);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(reconciler.calls.load(Ordering::SeqCst), 1);

    let html = artifact_html(&folder).await.unwrap();
    assert!(html.contains("<b>draft 4</b>"));
    assert!(!reconciler.store.is_stale(&folder).await.unwrap());
}

#[tokio::test]
async fn removing_the_annotation_drops_artifact_and_watch() {
    let (_temp, folder, reconciler) = setup().await;
    reconciler.store.write(&folder, "keep me").await.unwrap();

    let scheduler = Scheduler::new(reconciler.clone(), Duration::from_millis(50));
    scheduler.watch(&folder);

    tokio::fs::remove_file(folder.join(WIKITEXT_FILENAME))
        .await
        .unwrap();
    scheduler.notify(&folder);

    let (watched, target) = (&scheduler, &folder);
    assert!(eventually(|| async move { !watched.is_watched(target) }).await);
    assert!(artifact_html(&folder).await.is_none());
}

#[tokio::test]
async fn notify_backend_picks_up_external_edits() {
    let (_temp, folder, reconciler) = setup().await;
    reconciler.store.write(&folder, "first").await.unwrap();

    let scheduler = Scheduler::new(reconciler.clone(), Duration::from_millis(100));
    scheduler.watch(&folder);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut backend = NotifyBackend::new(DEFAULT_COLLATION, tx).unwrap();
    backend.watch(&folder).unwrap();
    let dispatcher = spawn_dispatcher(scheduler.clone(), rx);

    tokio::fs::write(folder.join(WIKITEXT_FILENAME), "''second''")
        .await
        .unwrap();

    let target = &folder;
    let rendered = eventually(|| async move {
        artifact_html(target)
            .await
            .is_some_and(|html| html.contains("<i>second</i>"))
    })
    .await;
    assert!(rendered, "artifact was not refreshed after an external edit");

    backend.unwatch(&folder).unwrap();
    dispatcher.abort();
}
