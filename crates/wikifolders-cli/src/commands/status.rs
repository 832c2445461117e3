use crate::app::{exit_codes, resolve_folder, App};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct FolderStatus {
    pub folder: PathBuf,
    pub active: bool,
    pub stale: bool,
    pub registered: bool,
    pub modified: Option<String>,
    pub rendered_from: Option<String>,
}

impl FolderStatus {
    pub async fn collect(app: &App, folder: &Path) -> Result<Self> {
        let annotation = app.store.read(folder).await?;
        let artifact = app.store.artifact(folder).await?;
        let registered = match app.store.registry() {
            Some(registry) => registry.contains(folder).await,
            None => false,
        };

        Ok(Self {
            folder: folder.to_path_buf(),
            active: annotation.is_some(),
            stale: app.store.is_stale(folder).await?,
            registered,
            modified: annotation.map(|a| a.modified.to_rfc3339()),
            rendered_from: artifact.map(|a| a.source_modified.to_rfc3339()),
        })
    }
}

pub async fn execute(app: &App, folder: &Path, json: bool) -> Result<i32> {
    let folder = resolve_folder(folder).await?;
    let status = FolderStatus::collect(app, &folder).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(exit_codes::SUCCESS);
    }

    println!("Folder:     {}", status.folder.display());
    if !status.active {
        println!("Annotation: none");
        return Ok(exit_codes::SUCCESS);
    }
    println!("Annotation: {}", status.modified.as_deref().unwrap_or("-"));
    println!(
        "Artifact:   {}",
        match (&status.rendered_from, status.stale) {
            (None, _) => "missing",
            (Some(_), true) => "stale",
            (Some(_), false) => "current",
        }
    );
    println!("Registered: {}", if status.registered { "yes" } else { "no" });
    Ok(exit_codes::SUCCESS)
}
