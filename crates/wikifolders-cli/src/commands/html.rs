use crate::app::{exit_codes, resolve_folder, App};
use anyhow::{bail, Result};
use std::path::Path;
use tracing::warn;
use wikifolders_markup::to_html_counted;

pub async fn execute(app: &App, folder: &Path) -> Result<i32> {
    let folder = resolve_folder(folder).await?;
    let Some(annotation) = app.store.read(&folder).await? else {
        bail!("{} has no annotation", folder.display());
    };

    let rewrite = to_html_counted(&annotation.markup);
    if rewrite.unmatched > 0 {
        warn!(
            "{} unmatched delimiter(s) kept as text in {}",
            rewrite.unmatched,
            folder.display()
        );
    }
    println!("{}", rewrite.text);
    Ok(exit_codes::SUCCESS)
}
