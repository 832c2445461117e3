//! Editor session for WikiFolders annotations.
//!
//! An [`EditorSession`] edits one folder at a time:
//! `Closed -> Open -> (save | cancel) -> Closed`. Saving persists through
//! the [`AnnotationStore`](wikifolders_store::AnnotationStore) and then
//! reconciles the folder right away instead of waiting for the watcher's
//! debounce.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod session;

pub use error::{EditorError, Result};
pub use session::{EditorSession, SessionState};
pub use wikifolders_store::Outcome;
