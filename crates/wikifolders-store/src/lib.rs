//! # WikiFolders Annotation Store
//!
//! Owns the per-folder annotation file and its rendered artifact.
//!
//! - [`AnnotationStore`]: read / write / refresh with atomic replacement
//! - [`PlaceholderFile`]: marker present while the store is writing
//! - [`FolderRegistry`]: persisted list of active wiki folders
//! - [`StoreEvent`]: notifications for the icon-rendering consumer
//!
//! Operations on one folder are serialized by a per-folder lock with a
//! bounded wait; different folders proceed independently.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod annotation;
pub mod error;
mod events;
pub mod locks;
mod placeholder;
mod registry;
mod staging;
mod store;

pub use annotation::{Annotation, Outcome, RenderedArtifact};
pub use error::{Result, StoreError};
pub use events::StoreEvent;
pub use placeholder::{placeholder_present, PlaceholderFile};
pub use registry::FolderRegistry;
pub use store::AnnotationStore;
