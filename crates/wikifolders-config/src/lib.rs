//! # WikiFolders Configuration
//!
//! Read-only preferences and fixed constants shared by the WikiFolders crates.
//!
//! Preferences are loaded from a TOML file; a missing file yields defaults.
//!
//! ```rust,no_run
//! use wikifolders_config::Preferences;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let prefs = Preferences::load_default().await?;
//!     println!("debounce: {:?}", prefs.folder_watch_delay());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
mod error;
mod preferences;

pub use error::{ConfigError, Result};
pub use preferences::{Preferences, CONFIG_ENV_VAR};
