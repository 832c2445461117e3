//! Library side of the `wikifolders` binary, split out so commands can be
//! exercised from integration tests.

pub mod app;
pub mod cli;
pub mod commands;

use anyhow::Result;
use app::App;
use cli::Commands;

/// Run one parsed command and return the process exit code.
pub async fn run(app: &App, command: Commands) -> Result<i32> {
    match command {
        Commands::Show { folder } => commands::show::execute(app, &folder).await,
        Commands::Edit { folder, file } => commands::edit::execute(app, &folder, file).await,
        Commands::Clear { folder } => commands::clear::execute(app, &folder).await,
        Commands::Refresh { folder, force } => {
            commands::refresh::execute(app, &folder, force).await
        }
        Commands::Status { folder, json } => commands::status::execute(app, &folder, json).await,
        Commands::Html { folder } => commands::html::execute(app, &folder).await,
        Commands::Watch { folders } => commands::watch::execute(app, folders).await,
    }
}
