//! Commands run against a temporary resources directory and registry.

use std::path::PathBuf;
use tempfile::TempDir;
use wikifolders_cli::app::{exit_codes, App};
use wikifolders_cli::cli::Commands;
use wikifolders_cli::commands::status::FolderStatus;
use wikifolders_cli::run;
use wikifolders_config::constants::{ARTIFACT_FILENAME, WIKITEXT_FILENAME};
use wikifolders_config::Preferences;

struct Fixture {
    temp: TempDir,
    folder: PathBuf,
    app: App,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_lock_timeout(Preferences::default().lock_timeout_ms).await
    }

    async fn with_lock_timeout(lock_timeout_ms: u64) -> Self {
        let temp = TempDir::new().unwrap();
        let resources = temp.path().join("resources");
        let folder = temp.path().join("Recipes");
        tokio::fs::create_dir_all(&resources).await.unwrap();
        tokio::fs::create_dir_all(&folder).await.unwrap();
        tokio::fs::write(
            resources.join("template.html"),
            "<body style=\"width:{{width}}px\">{{content}}</body>",
        )
        .await
        .unwrap();
        tokio::fs::write(resources.join("background.png"), b"png")
            .await
            .unwrap();

        let prefs = Preferences {
            resources_dir: resources,
            registry_path: Some(temp.path().join("folders.json")),
            lock_timeout_ms,
            ..Preferences::default()
        };
        let app = App::from_preferences(prefs).await.unwrap();
        let folder = tokio::fs::canonicalize(&folder).await.unwrap();
        Self { temp, folder, app }
    }

    async fn markup_file(&self, markup: &str) -> PathBuf {
        let path = self.temp.path().join("input.txt");
        tokio::fs::write(&path, markup).await.unwrap();
        path
    }
}

#[tokio::test]
async fn edit_then_repeat_maps_outcomes_to_exit_codes() {
    let fx = Fixture::new().await;
    let file = fx.markup_file("'''Soup''' {{300g}} lentils").await;

    let edit = || Commands::Edit {
        folder: fx.folder.clone(),
        file: Some(file.clone()),
    };
    assert_eq!(run(&fx.app, edit()).await.unwrap(), exit_codes::SUCCESS);
    assert_eq!(run(&fx.app, edit()).await.unwrap(), exit_codes::NO_CHANGE);

    let html = tokio::fs::read_to_string(fx.folder.join(ARTIFACT_FILENAME))
        .await
        .unwrap();
    assert!(html.contains("<b>Soup</b> <tt>300g</tt> lentils"));
    assert!(html.contains("width:480px"));
}

#[tokio::test]
async fn status_reports_registration_and_staleness() {
    let fx = Fixture::new().await;
    let status = FolderStatus::collect(&fx.app, &fx.folder).await.unwrap();
    assert!(!status.active);
    assert!(!status.registered);

    fx.app.store.write(&fx.folder, "notes").await.unwrap();
    let status = FolderStatus::collect(&fx.app, &fx.folder).await.unwrap();
    assert!(status.active);
    assert!(status.registered);
    assert!(!status.stale);
    assert_eq!(status.modified, status.rendered_from);
}

#[tokio::test]
async fn refresh_and_clear_round_out_the_lifecycle() {
    let fx = Fixture::new().await;
    fx.app.store.write(&fx.folder, "v1").await.unwrap();

    let refresh = |force| Commands::Refresh {
        folder: fx.folder.clone(),
        force,
    };
    assert_eq!(
        run(&fx.app, refresh(false)).await.unwrap(),
        exit_codes::NO_CHANGE
    );

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tokio::fs::write(fx.folder.join(WIKITEXT_FILENAME), "v2")
        .await
        .unwrap();
    assert_eq!(
        run(&fx.app, refresh(false)).await.unwrap(),
        exit_codes::SUCCESS
    );

    let clear = || Commands::Clear {
        folder: fx.folder.clone(),
    };
    assert_eq!(run(&fx.app, clear()).await.unwrap(), exit_codes::SUCCESS);
    assert_eq!(run(&fx.app, clear()).await.unwrap(), exit_codes::NO_CHANGE);
    assert!(fx.app.registered_folders().await.is_empty());
}

#[tokio::test]
async fn show_fails_for_unannotated_folder() {
    let fx = Fixture::new().await;
    let result = run(
        &fx.app,
        Commands::Show {
            folder: fx.folder.clone(),
        },
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_folder_is_reported() {
    let fx = Fixture::new().await;
    let result = run(
        &fx.app,
        Commands::Html {
            folder: fx.temp.path().join("nope"),
        },
    )
    .await;
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("does not exist"));
    assert_eq!(exit_codes::for_error(&err), exit_codes::ERROR);
}

#[tokio::test]
async fn locked_folder_exits_as_busy() {
    let fx = Fixture::with_lock_timeout(50).await;
    let file = fx.markup_file("held").await;

    let slot = fx.app.store.locks().slot(&fx.folder);
    let _held = fx.app.store.locks().acquire(&fx.folder, &slot).await.unwrap();

    let err = run(
        &fx.app,
        Commands::Edit {
            folder: fx.folder.clone(),
            file: Some(file),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(exit_codes::for_error(&err), exit_codes::BUSY);

    let err = run(
        &fx.app,
        Commands::Refresh {
            folder: fx.folder.clone(),
            force: true,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(exit_codes::for_error(&err), exit_codes::BUSY);
}
