//! # WikiFolders folder watching
//!
//! Keeps rendered artifacts in step with annotations edited outside the
//! editor session.
//!
//! ```text
//! ┌────────────────┐  FolderEvent  ┌──────────────┐  reconcile  ┌─────────────────┐
//! │ NotifyBackend  │──────────────▶│  Scheduler   │────────────▶│   Reconciler    │
//! │ (OS events)    │  dispatcher   │  (debounce)  │             │ (AnnotationStore)│
//! └────────────────┘               └──────────────┘             └─────────────────┘
//! ```
//!
//! The backend only reports changes to `.wikitext` files and removal of
//! watched folders. The scheduler coalesces bursts per folder and asks the
//! reconciler to re-render once the folder has been quiet for the
//! configured delay.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod error;
mod events;
mod scheduler;
pub mod traits;

pub use backends::*;
pub use error::*;
pub use events::*;
pub use scheduler::{Scheduler, SchedulerStats, WatchEntry, WatchState};
pub use traits::Reconciler;
