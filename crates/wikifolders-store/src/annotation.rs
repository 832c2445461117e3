//! Annotation and rendered-artifact types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const STAMP_OPEN: &str = "<!-- wikifolders-artifact ";
const STAMP_CLOSE: &str = " -->\n";

/// The single annotation attached to a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Owning folder (unique key).
    pub folder: PathBuf,
    /// Raw markup text.
    pub markup: String,
    /// Modification time of the annotation file.
    pub modified: DateTime<Utc>,
}

/// Result of a write or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Files on disk changed.
    MadeChanges,
    /// Nothing needed to change.
    NoChange,
}

impl Outcome {
    /// Legacy integer return code: `0` for changes, `-1` for no change.
    pub fn code(self) -> i32 {
        match self {
            Outcome::MadeChanges => 0,
            Outcome::NoChange => -1,
        }
    }

    /// Whether files on disk changed.
    pub fn made_changes(self) -> bool {
        self == Outcome::MadeChanges
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::MadeChanges => write!(f, "made changes"),
            Outcome::NoChange => write!(f, "no change"),
        }
    }
}

/// Provenance header stored as the first line of the artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ArtifactStamp {
    source_modified: DateTime<Utc>,
    template: PathBuf,
    background: PathBuf,
}

/// A rendered document plus the annotation timestamp it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Annotation modification time at render.
    pub source_modified: DateTime<Utc>,
    /// Template used.
    pub template: PathBuf,
    /// Background image referenced.
    pub background: PathBuf,
    /// Rendered HTML document.
    pub html: String,
}

impl RenderedArtifact {
    /// Whether this artifact was rendered from the annotation's current contents.
    pub fn is_valid_for(&self, annotation: &Annotation) -> bool {
        self.source_modified == annotation.modified
    }

    /// File contents: provenance header followed by the document.
    pub fn encode(&self) -> String {
        let stamp = ArtifactStamp {
            source_modified: self.source_modified,
            template: self.template.clone(),
            background: self.background.clone(),
        };
        // Serializing a struct of paths and a timestamp cannot fail.
        let header = serde_json::to_string(&stamp).unwrap_or_default();
        format!("{STAMP_OPEN}{header}{STAMP_CLOSE}{}", self.html)
    }

    /// Parse file contents written by [`RenderedArtifact::encode`].
    ///
    /// Returns `None` for files without a readable header; callers treat
    /// those as stale.
    pub fn decode(contents: &str) -> Option<Self> {
        let rest = contents.strip_prefix(STAMP_OPEN)?;
        let (header, html) = rest.split_once(STAMP_CLOSE)?;
        let stamp: ArtifactStamp = serde_json::from_str(header).ok()?;
        Some(Self {
            source_modified: stamp.source_modified,
            template: stamp.template,
            background: stamp.background,
            html: html.to_string(),
        })
    }
}
