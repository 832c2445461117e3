//! Per-folder mutual exclusion with bounded waits.
//!
//! Every store operation on a folder runs under that folder's lock.
//! Writes additionally take a ticket before waiting; once a write holds
//! the lock it only proceeds if no newer write was requested meanwhile,
//! so at most one queued write per folder ever runs.

use crate::error::{Result, StoreError};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Lock and write-ticket counter for one folder.
#[derive(Debug, Default)]
pub struct FolderSlot {
    lock: Arc<Mutex<()>>,
    latest_ticket: AtomicU64,
}

impl FolderSlot {
    /// Register a new write request and return its ticket.
    pub fn issue_ticket(&self) -> u64 {
        self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `ticket` is still the newest write request.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest_ticket.load(Ordering::SeqCst) == ticket
    }
}

/// Table of folder locks keyed by canonical folder path.
#[derive(Debug)]
pub struct FolderLocks {
    slots: DashMap<PathBuf, Arc<FolderSlot>>,
    timeout: Duration,
}

impl FolderLocks {
    /// Create a lock table with the given bounded wait.
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }

    /// Slot for `folder`, created on first use.
    pub fn slot(&self, folder: &Path) -> Arc<FolderSlot> {
        self.slots
            .entry(folder.to_path_buf())
            .or_default()
            .value()
            .clone()
    }

    /// Wait up to the configured timeout for the folder lock.
    pub async fn acquire(&self, folder: &Path, slot: &FolderSlot) -> Result<OwnedMutexGuard<()>> {
        match tokio::time::timeout(self.timeout, slot.lock.clone().lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                debug!("Timed out waiting for lock on {}", folder.display());
                Err(StoreError::Busy {
                    folder: folder.to_path_buf(),
                    waited_ms: self.timeout_ms(),
                })
            }
        }
    }

    /// Bounded wait in whole milliseconds, saturating at `u64::MAX`.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Drop the slot of a folder that is no longer in use.
    ///
    /// A slot still referenced by a waiting or running operation is kept.
    pub fn forget(&self, folder: &Path) {
        self.slots
            .remove_if(folder, |_, slot| Arc::strong_count(slot) == 1);
    }

    /// Number of folders with a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no folder has a slot.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
