//! End-to-end editor flows against a real store and scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wikifolders_config::constants::{ARTIFACT_FILENAME, WIKITEXT_FILENAME};
use wikifolders_editor::{EditorSession, Outcome, SessionState};
use wikifolders_markup::{RenderSettings, Renderer};
use wikifolders_store::{placeholder_present, AnnotationStore};
use wikifolders_watch::Scheduler;

struct Fixture {
    _temp: TempDir,
    folder: PathBuf,
    store: Arc<AnnotationStore>,
    scheduler: Scheduler,
}

impl Fixture {
    async fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("Taxes 2026");
        tokio::fs::create_dir_all(&folder).await.unwrap();
        tokio::fs::write(
            temp.path().join("template.html"),
            "<div style=\"font-size:{{font_size}}px\">{{content}}</div>",
        )
        .await
        .unwrap();
        tokio::fs::write(temp.path().join("background.png"), b"png")
            .await
            .unwrap();

        let renderer = Renderer::new(
            temp.path().join("template.html"),
            temp.path().join("background.png"),
            RenderSettings::default(),
        );
        let store = Arc::new(AnnotationStore::new(renderer, Duration::from_secs(5)));
        let scheduler = Scheduler::new(store.clone(), Duration::from_secs(60));
        let folder = tokio::fs::canonicalize(&folder).await.unwrap();
        Self {
            _temp: temp,
            folder,
            store,
            scheduler,
        }
    }

    fn session(&self) -> EditorSession {
        EditorSession::new(self.store.clone(), self.scheduler.clone())
    }
}

#[tokio::test]
async fn first_save_activates_and_watches_the_folder() {
    let fx = Fixture::new().await;
    let mut session = fx.session();

    assert!(!session.is_active_wiki_folder(&fx.folder).await);
    session.open(&fx.folder).await.unwrap();
    session.set_text("==Receipts==\n''scan by april''").unwrap();
    assert!(session.is_dirty());

    assert_eq!(session.save().await.unwrap(), Outcome::MadeChanges);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.is_active_wiki_folder(&fx.folder).await);
    assert!(fx.scheduler.is_watched(&fx.folder));
    assert!(!placeholder_present(&fx.folder).await);

    let html = tokio::fs::read_to_string(fx.folder.join(ARTIFACT_FILENAME))
        .await
        .unwrap();
    assert!(html.contains("<h2>Receipts</h2><br/><i>scan by april</i>"));
    assert!(html.contains("font-size:12px"));
}

#[tokio::test]
async fn saving_unchanged_text_reports_no_change() {
    let fx = Fixture::new().await;
    fx.store.write(&fx.folder, "stable").await.unwrap();

    let mut session = fx.session();
    assert_eq!(session.open(&fx.folder).await.unwrap(), "stable");
    assert_eq!(session.save().await.unwrap(), Outcome::NoChange);
    assert_eq!(session.state(), SessionState::Closed);
    // Opening an annotated folder watches it; the no-op save leaves that alone
    assert!(fx.scheduler.is_watched(&fx.folder));
}

#[tokio::test]
async fn saving_empty_text_clears_the_folder() {
    let fx = Fixture::new().await;
    let mut session = fx.session();
    session.open(&fx.folder).await.unwrap();
    session.set_text("temporary").unwrap();
    session.save().await.unwrap();

    session.open(&fx.folder).await.unwrap();
    session.set_text("").unwrap();
    assert_eq!(session.save().await.unwrap(), Outcome::MadeChanges);

    assert!(!session.is_active_wiki_folder(&fx.folder).await);
    assert!(!fx.scheduler.is_watched(&fx.folder));
    assert!(!fx.folder.join(WIKITEXT_FILENAME).exists());
    assert!(!fx.folder.join(ARTIFACT_FILENAME).exists());
}

#[tokio::test]
async fn failed_save_keeps_the_session_open() {
    let fx = Fixture::new().await;
    let mut session = fx.session();
    session.open(&fx.folder).await.unwrap();
    session.set_text("unsaved work").unwrap();

    // Removing the folder makes the write fail
    tokio::fs::remove_dir_all(&fx.folder).await.unwrap();

    assert!(session.save().await.is_err());
    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.text(), Some("unsaved work"));
}
