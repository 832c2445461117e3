use crate::app::{exit_codes, resolve_folder, App};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use wikifolders_editor::EditorSession;

pub async fn execute(app: &App, folder: &Path, file: Option<PathBuf>) -> Result<i32> {
    let folder = resolve_folder(folder).await?;
    let markup = read_markup(file.as_deref()).await?;

    let mut session = EditorSession::new(app.store.clone(), app.scheduler());
    session.open(&folder).await?;
    session.set_text(markup)?;
    let outcome = session
        .save()
        .await
        .with_context(|| format!("Failed to save annotation for {}", folder.display()))?;

    println!("{}: {}", folder.display(), outcome);
    Ok(exit_codes::for_outcome(outcome))
}

async fn read_markup(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read markup from {}", path.display())),
        None => {
            let mut markup = String::new();
            tokio::io::stdin()
                .read_to_string(&mut markup)
                .await
                .context("Failed to read markup from stdin")?;
            Ok(markup)
        }
    }
}
