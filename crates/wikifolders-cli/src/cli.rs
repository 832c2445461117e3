use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wikifolders")]
#[command(about = "Wiki-style folder annotations rendered as HTML decorations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level unless RUST_LOG says otherwise)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Preferences file (defaults to ~/.config/wikifolders/preferences.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the folder's annotation markup
    Show {
        /// Annotated folder
        folder: PathBuf,
    },

    /// Replace the folder's annotation (reads stdin unless --file is given)
    Edit {
        /// Folder to annotate
        folder: PathBuf,

        /// Read the new markup from this file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Remove the folder's annotation and artifact
    Clear {
        /// Annotated folder
        folder: PathBuf,
    },

    /// Re-render the folder's artifact
    Refresh {
        /// Annotated folder
        folder: PathBuf,

        /// Re-render even when the artifact is current
        #[arg(long)]
        force: bool,
    },

    /// Report whether the folder is annotated and its artifact current
    Status {
        /// Folder to inspect
        folder: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the HTML conversion of the folder's markup
    Html {
        /// Annotated folder
        folder: PathBuf,
    },

    /// Keep artifacts up to date until interrupted
    Watch {
        /// Folders to watch in addition to the registered ones
        folders: Vec<PathBuf>,
    },
}

impl Cli {
    /// Default tracing directive for this invocation.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
