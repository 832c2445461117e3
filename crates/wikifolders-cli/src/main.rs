// WikiFolders command-line front end
//
// Edits, renders and watches per-folder wiki annotations.

use clap::Parser;
use std::process;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use wikifolders_cli::{app::exit_codes, app::App, cli::Cli, run};

const LOG_TARGETS: &[&str] = &[
    "wikifolders",
    "wikifolders_cli",
    "wikifolders_config",
    "wikifolders_markup",
    "wikifolders_store",
    "wikifolders_watch",
    "wikifolders_editor",
];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the --verbose default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = cli.log_level();
        let directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect();
        EnvFilter::new(directives.join(","))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("wikifolders v{}", env!("CARGO_PKG_VERSION"));

    let app = match App::load(cli.config.as_deref()).await {
        Ok(app) => app,
        Err(e) => {
            error!("{:#}", e);
            process::exit(exit_codes::ERROR);
        }
    };

    match run(&app, cli.command).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            let code = exit_codes::for_error(&e);
            if code == exit_codes::BUSY {
                warn!("{:#}; try again shortly", e);
            } else {
                error!("{:#}", e);
            }
            process::exit(code);
        }
    }
}
