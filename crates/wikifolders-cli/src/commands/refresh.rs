use crate::app::{exit_codes, resolve_folder, App};
use anyhow::{Context, Result};
use std::path::Path;

pub async fn execute(app: &App, folder: &Path, force: bool) -> Result<i32> {
    let folder = resolve_folder(folder).await?;
    let outcome = app
        .store
        .refresh(&folder, force)
        .await
        .with_context(|| format!("Failed to refresh {}", folder.display()))?;
    println!("{}: {}", folder.display(), outcome);
    Ok(exit_codes::for_outcome(outcome))
}
