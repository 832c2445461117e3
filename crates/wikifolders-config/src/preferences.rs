//! User preferences supplied by the external preferences collaborator.
//!
//! This crate only ever reads them.

use crate::constants::{BACKGROUND_IMAGE_FILENAME, HTML_TEMPLATE_FILENAME, MAX_WINDOW_DIMENSION};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable overriding the preferences file location.
pub const CONFIG_ENV_VAR: &str = "WIKIFOLDERS_CONFIG";

/// Rendering and watching preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Draw a border around the rendered content.
    pub draw_icon_borders: bool,
    /// Font size of the rendered annotation, in pixels.
    pub rendered_font_size: u32,
    /// Trailing-edge debounce applied to folder change notifications.
    pub folder_watch_delay_ms: u64,
    /// Bounded wait for a folder lock before reporting `Busy`.
    pub lock_timeout_ms: u64,
    /// Directory holding the HTML template and background image.
    pub resources_dir: PathBuf,
    /// Width of the folder window the artifact decorates.
    pub window_width: u32,
    /// Height of the folder window the artifact decorates.
    pub window_height: u32,
    /// Where the list of active wiki folders is persisted.
    pub registry_path: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            draw_icon_borders: false,
            rendered_font_size: 12,
            folder_watch_delay_ms: 1000,
            lock_timeout_ms: 2000,
            resources_dir: default_resources_dir(),
            window_width: 480,
            window_height: 320,
            registry_path: None,
        }
    }
}

impl Preferences {
    /// Load preferences from `$WIKIFOLDERS_CONFIG` or the platform config dir.
    pub async fn load_default() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .or_else(default_config_path);

        match path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config directory available, using default preferences");
                Ok(Self::default())
            }
        }
    }

    /// Load preferences from a TOML file. A missing file yields defaults.
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Preferences file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let prefs = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!("Loaded preferences from {}", path.display());
        Ok(prefs)
    }

    /// Parse and validate preferences from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let prefs: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Reject values the renderer or the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.rendered_font_size == 0 {
            return Err(ConfigError::Validation {
                field: "rendered_font_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Validation {
                field: "window_width/window_height",
                message: format!(
                    "window must be non-empty, got {}x{}",
                    self.window_width, self.window_height
                ),
            });
        }
        if self.window_width > MAX_WINDOW_DIMENSION || self.window_height > MAX_WINDOW_DIMENSION {
            return Err(ConfigError::Validation {
                field: "window_width/window_height",
                message: format!(
                    "window sides are limited to {}px, got {}x{}",
                    MAX_WINDOW_DIMENSION, self.window_width, self.window_height
                ),
            });
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "lock_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Debounce delay as a [`Duration`].
    pub fn folder_watch_delay(&self) -> Duration {
        Duration::from_millis(self.folder_watch_delay_ms)
    }

    /// Folder lock wait as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Path of the HTML template resource.
    pub fn template_path(&self) -> PathBuf {
        self.resources_dir.join(HTML_TEMPLATE_FILENAME)
    }

    /// Path of the background image resource.
    pub fn background_path(&self) -> PathBuf {
        self.resources_dir.join(BACKGROUND_IMAGE_FILENAME)
    }

    /// Registry location, falling back to the platform data dir.
    pub fn registry_path(&self) -> PathBuf {
        self.registry_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wikifolders")
                .join("folders.json")
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wikifolders").join("preferences.toml"))
}

fn default_resources_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("wikifolders").join("resources"))
        .unwrap_or_else(|| PathBuf::from("resources"))
}
