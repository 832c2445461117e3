//! Per-folder trailing-edge debounce.
//!
//! Each watched folder has a [`WatchEntry`] moving through
//! `Idle -> PendingDebounce -> Reconciling -> Idle`. A change notification
//! (re)arms the folder's timer; only the last timer in a burst reconciles.
//!
//! Timers carry the entry's generation at arming time. A timer whose
//! generation no longer matches, or whose folder is no longer watched,
//! exits without touching the store.

use crate::error::Result;
use crate::traits::Reconciler;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};
use wikifolders_config::Preferences;
use wikifolders_store::Outcome;

/// Debounce state of a watched folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No change pending.
    Idle,
    /// A timer is armed.
    PendingDebounce,
    /// The store is re-rendering the folder.
    Reconciling,
}

/// Debounce bookkeeping for one folder.
#[derive(Debug)]
pub struct WatchEntry {
    /// Watched folder.
    pub folder: PathBuf,
    /// Current state.
    pub state: WatchState,
    /// When the armed timer fires, if any.
    pub fire_at: Option<Instant>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl WatchEntry {
    fn new(folder: PathBuf) -> Self {
        Self {
            folder,
            state: WatchState::Idle,
            fire_at: None,
            generation: 0,
            task: None,
        }
    }

    fn cancel_timer(&mut self) {
        // A running reconciliation is left to finish.
        if self.state == WatchState::PendingDebounce {
            if let Some(task) = self.task.take() {
                task.abort();
            }
        }
        self.fire_at = None;
    }
}

impl Drop for WatchEntry {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

/// Counters for observing scheduler behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Change notifications accepted for watched folders.
    pub notifications: u64,
    /// Reconciliations started (debounced and immediate).
    pub reconciliations: u64,
    /// Timers re-armed because a store write was in progress.
    pub deferrals: u64,
}

struct Inner {
    reconciler: Arc<dyn Reconciler>,
    delay: Duration,
    entries: DashMap<PathBuf, WatchEntry>,
    notifications: AtomicU64,
    reconciliations: AtomicU64,
    deferrals: AtomicU64,
}

/// Debounces folder change notifications into reconciliations.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("delay", &self.inner.delay)
            .field("watched", &self.inner.entries.len())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler reconciling through `reconciler` after `delay`.
    pub fn new(reconciler: Arc<dyn Reconciler>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                reconciler,
                delay,
                entries: DashMap::new(),
                notifications: AtomicU64::new(0),
                reconciliations: AtomicU64::new(0),
                deferrals: AtomicU64::new(0),
            }),
        }
    }

    /// Create a scheduler using the configured folder watch delay.
    pub fn from_preferences(reconciler: Arc<dyn Reconciler>, prefs: &Preferences) -> Self {
        Self::new(reconciler, prefs.folder_watch_delay())
    }

    /// Debounce delay.
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Start watching `folder`. Returns `false` if it was already watched.
    pub fn watch(&self, folder: &Path) -> bool {
        let mut inserted = false;
        self.inner
            .entries
            .entry(folder.to_path_buf())
            .or_insert_with(|| {
                inserted = true;
                WatchEntry::new(folder.to_path_buf())
            });
        if inserted {
            info!("Watching {}", folder.display());
        }
        inserted
    }

    /// Stop watching `folder`, cancelling any pending timer.
    pub fn unwatch(&self, folder: &Path) -> bool {
        match self.inner.entries.remove(folder) {
            Some(_) => {
                info!("Stopped watching {}", folder.display());
                true
            }
            None => false,
        }
    }

    /// Whether `folder` is watched.
    pub fn is_watched(&self, folder: &Path) -> bool {
        self.inner.entries.contains_key(folder)
    }

    /// Debounce state of `folder`, if watched.
    pub fn state(&self, folder: &Path) -> Option<WatchState> {
        self.inner.entries.get(folder).map(|entry| entry.state)
    }

    /// All watched folders.
    pub fn watched_folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self
            .inner
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        folders.sort();
        folders
    }

    /// Scheduler counters.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            notifications: self.inner.notifications.load(Ordering::Relaxed),
            reconciliations: self.inner.reconciliations.load(Ordering::Relaxed),
            deferrals: self.inner.deferrals.load(Ordering::Relaxed),
        }
    }

    /// Record a change in `folder` and (re)arm its timer.
    ///
    /// Returns `false` when the folder is not watched; the change is dropped.
    pub fn notify(&self, folder: &Path) -> bool {
        let Some(mut entry) = self.inner.entries.get_mut(folder) else {
            trace!("Ignoring change in unwatched {}", folder.display());
            return false;
        };

        entry.cancel_timer();
        entry.generation += 1;
        entry.state = WatchState::PendingDebounce;
        entry.fire_at = Some(Instant::now() + self.inner.delay);

        let inner = Arc::clone(&self.inner);
        let generation = entry.generation;
        let target = folder.to_path_buf();
        entry.task = Some(tokio::spawn(async move {
            Inner::run_timer(inner, target, generation).await;
        }));

        self.inner.notifications.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Change in {} (generation {}), firing in {:?}",
            folder.display(),
            generation,
            self.inner.delay
        );
        true
    }

    /// Reconcile `folder` immediately, superseding any armed timer.
    ///
    /// Works for unwatched folders too; they simply have no entry to update.
    pub async fn reconcile_now(&self, folder: &Path) -> Result<Outcome> {
        let generation = self.inner.entries.get_mut(folder).map(|mut entry| {
            entry.cancel_timer();
            entry.generation += 1;
            entry.state = WatchState::Reconciling;
            entry.generation
        });

        debug!("Immediate reconciliation of {}", folder.display());
        let result = self.inner.reconcile(folder).await;

        if let Some(generation) = generation {
            self.inner.finish(folder, generation);
        }
        result
    }
}

impl Inner {
    async fn run_timer(inner: Arc<Inner>, folder: PathBuf, generation: u64) {
        let mut deferred = false;
        loop {
            tokio::time::sleep(inner.delay).await;

            if !inner.is_current(&folder, generation) {
                trace!("Timer for {} superseded", folder.display());
                return;
            }
            if deferred || !inner.reconciler.write_in_progress(&folder).await {
                break;
            }

            // Our own write is still in flight; give it one more period.
            deferred = true;
            inner.deferrals.fetch_add(1, Ordering::Relaxed);
            debug!("Write in progress in {}, deferring once", folder.display());
            if let Some(mut entry) = inner.entries.get_mut(&folder) {
                entry.fire_at = Some(Instant::now() + inner.delay);
            }
        }

        {
            let Some(mut entry) = inner.entries.get_mut(&folder) else {
                return;
            };
            if entry.generation != generation {
                return;
            }
            entry.state = WatchState::Reconciling;
            entry.fire_at = None;
        }

        if let Err(e) = inner.reconcile(&folder).await {
            error!("Reconciliation of {} failed: {}", folder.display(), e);
        }
        inner.finish(&folder, generation);

        if !inner.reconciler.is_active(&folder).await
            && inner
                .entries
                .remove_if(&folder, |_, entry| entry.generation == generation)
                .is_some()
        {
            info!("{} no longer has an annotation", folder.display());
        }
    }

    async fn reconcile(&self, folder: &Path) -> Result<Outcome> {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        let outcome = self.reconciler.reconcile(folder).await?;
        debug!("Reconciled {}: {}", folder.display(), outcome);
        Ok(outcome)
    }

    fn is_current(&self, folder: &Path, generation: u64) -> bool {
        self.entries
            .get(folder)
            .is_some_and(|entry| entry.generation == generation)
    }

    fn finish(&self, folder: &Path, generation: u64) {
        if let Some(mut entry) = self.entries.get_mut(folder) {
            if entry.generation == generation {
                entry.state = WatchState::Idle;
                entry.task = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingReconciler {
        calls: AtomicU64,
        busy: AtomicBool,
    }

    #[async_trait]
    impl Reconciler for CountingReconciler {
        async fn reconcile(&self, _folder: &Path) -> Result<Outcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::MadeChanges)
        }

        async fn write_in_progress(&self, _folder: &Path) -> bool {
            self.busy.load(Ordering::SeqCst)
        }

        async fn is_active(&self, _folder: &Path) -> bool {
            true
        }
    }

    /// Blocks inside `reconcile` until released.
    struct GatedReconciler {
        entered: Notify,
        release: Notify,
        calls: AtomicU64,
    }

    #[async_trait]
    impl Reconciler for GatedReconciler {
        async fn reconcile(&self, _folder: &Path) -> Result<Outcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Outcome::NoChange)
        }

        async fn write_in_progress(&self, _folder: &Path) -> bool {
            false
        }

        async fn is_active(&self, _folder: &Path) -> bool {
            true
        }
    }

    const DELAY: Duration = Duration::from_millis(500);

    fn scheduler() -> (Scheduler, Arc<CountingReconciler>) {
        let reconciler = Arc::new(CountingReconciler::default());
        let scheduler = Scheduler::new(reconciler.clone(), DELAY);
        (scheduler, reconciler)
    }

    #[tokio::test(start_paused = true)]
    async fn single_change_reconciles_after_delay() {
        let (scheduler, reconciler) = scheduler();
        let folder = Path::new("/notes");
        scheduler.watch(folder);

        assert!(scheduler.notify(folder));
        assert_eq!(scheduler.state(folder), Some(WatchState::PendingDebounce));

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(folder), Some(WatchState::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn unwatched_changes_are_dropped() {
        let (scheduler, reconciler) = scheduler();
        assert!(!scheduler.notify(Path::new("/elsewhere")));

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unwatch_cancels_pending_timer() {
        let (scheduler, reconciler) = scheduler();
        let folder = Path::new("/notes");
        scheduler.watch(folder);
        scheduler.notify(folder);

        tokio::time::sleep(DELAY / 2).await;
        assert!(scheduler.unwatch(folder));

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_watched(folder));
    }

    #[tokio::test(start_paused = true)]
    async fn write_in_progress_defers_exactly_once() {
        let (scheduler, reconciler) = scheduler();
        let folder = Path::new("/notes");
        scheduler.watch(folder);
        reconciler.busy.store(true, Ordering::SeqCst);
        scheduler.notify(folder);

        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.stats().deferrals, 1);

        // Still "busy" on the second fire: reconcile anyway
        tokio::time::sleep(DELAY).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_reconcile_supersedes_pending_timer() {
        let (scheduler, reconciler) = scheduler();
        let folder = Path::new("/notes");
        scheduler.watch(folder);
        scheduler.notify(folder);

        let outcome = scheduler.reconcile_now(folder).await.unwrap();
        assert_eq!(outcome, Outcome::MadeChanges);
        assert_eq!(scheduler.state(folder), Some(WatchState::Idle));

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn change_during_reconcile_schedules_another_pass() {
        let reconciler = Arc::new(GatedReconciler {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicU64::new(0),
        });
        let scheduler = Scheduler::new(reconciler.clone(), DELAY);
        let folder = Path::new("/notes");
        scheduler.watch(folder);
        scheduler.notify(folder);

        reconciler.entered.notified().await;
        assert_eq!(scheduler.state(folder), Some(WatchState::Reconciling));

        scheduler.notify(folder);
        assert_eq!(scheduler.state(folder), Some(WatchState::PendingDebounce));
        reconciler.release.notify_one();

        reconciler.entered.notified().await;
        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 2);
        reconciler.release.notify_one();
    }
}
