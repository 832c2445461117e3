use crate::app::{exit_codes, resolve_folder, App};
use anyhow::{bail, Result};
use std::path::Path;

pub async fn execute(app: &App, folder: &Path) -> Result<i32> {
    let folder = resolve_folder(folder).await?;
    let Some(annotation) = app.store.read(&folder).await? else {
        bail!("{} has no annotation", folder.display());
    };
    println!("{}", annotation.markup);
    Ok(exit_codes::SUCCESS)
}
