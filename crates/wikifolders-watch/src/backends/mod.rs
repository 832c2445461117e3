//! Sources of folder change events.

mod notify_backend;

pub use notify_backend::{spawn_dispatcher, NotifyBackend, DEFAULT_COLLATION};
