// SPDX-License-Identifier: MPL-2.0

//! Bounded prefetch cache that keeps normalization off the render path.
//!
//! A background worker replays the asset order forever and keeps up to
//! `target` ready assets around for the scheduler:
//!
//! ```text
//! ┌─────────────┐
//! │ AssetCycle  │  fixed order, repeated on wraparound
//! └─────┬───────┘
//!       │ one asset per poll tick, skipped while paused
//!       ▼
//! ┌─────────────┐
//! │ Preprocess  │  runs on the worker thread
//! └─────┬───────┘
//!       │ insert
//!       ▼
//! ┌─────────────┐
//! │ entries     │  ← bounded (target size)
//! └─────┬───────┘
//!       │ first() / remove()
//!       ▼
//! ┌─────────────┐
//! │ Scheduler   │
//! └─────────────┘
//! ```
//!
//! # Handshake
//!
//! The scheduler calls [`PrefetchCache::pause`] and then waits for
//! [`PrefetchCache::wait_until_idle`] before rendering. The worker
//! acknowledges by observing the pause at the top of its next poll and
//! reporting idle without inserting. Nothing is inserted until
//! [`PrefetchCache::resume`].
//!
//! # Failures
//!
//! An asset that fails to normalize is skipped and never tried again. Later
//! passes of the cycle step over it without a tick, and it no longer counts
//! towards [`PrefetchCache::viable_assets`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};
use slideshow_saver_config::CacheConfig;

use crate::asset::{AssetCycle, AssetRef, ReadyAsset};
use crate::preprocess::Preprocess;

/// Statistics about cache fill operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Ready assets inserted by the worker.
    pub inserted: u64,
    /// Assets skipped because normalization failed.
    pub skipped_failed: u64,
    /// Ticks skipped because the next asset was already cached.
    pub skipped_duplicate: u64,
    /// Entries removed by the consumer.
    pub removed: u64,
}

/// What a single fill tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The worker should exit.
    Stopped,
    /// A pause is pending; the tick reported idle instead of inserting.
    Paused,
    /// Already holding `target` entries.
    Full,
    Inserted,
    /// The next asset in the cycle is still cached.
    Duplicate,
    /// The next asset failed to normalize and was skipped.
    Failed,
    /// Every asset in the cycle failed, or there were none.
    Exhausted,
}

/// The pause/idle handshake flags.
///
/// `stopped` only ever goes from `false` to `true`.
#[derive(Debug, Default)]
struct Control {
    paused: bool,
    idle: bool,
    stopped: bool,
}

/// State owned by whoever runs the fill ticks.
struct Producer {
    cycle: AssetCycle,
    preprocessor: Box<dyn Preprocess>,
    failed: IndexSet<AssetRef>,
}

impl Producer {
    /// Next asset of the cycle that hasn't failed before.
    ///
    /// Looks at most one full pass ahead, so `None` means every asset failed.
    fn next_viable(&mut self) -> Option<AssetRef> {
        if self.cycle.is_empty() {
            return None;
        }

        for _ in 0..self.cycle.len() {
            let asset = self.cycle.next()?;
            if !self.failed.contains(&asset) {
                return Some(asset);
            }
        }
        None
    }
}

struct Shared {
    target: usize,
    entries: Mutex<IndexMap<AssetRef, ReadyAsset>>,
    control: Mutex<Control>,
    idle_changed: Condvar,
    /// Distinct assets that haven't failed to normalize.
    viable: AtomicUsize,
    stats_inserted: AtomicU64,
    stats_failed: AtomicU64,
    stats_duplicate: AtomicU64,
    stats_removed: AtomicU64,
}

/// Poisoning only means another thread panicked mid-update; the flags and
/// entries stay consistent, so keep going with the inner value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn poll(&self, producer: &mut Producer) -> PollOutcome {
        {
            let mut control = lock(&self.control);
            if control.stopped {
                return PollOutcome::Stopped;
            }
            if control.paused {
                if !control.idle {
                    control.idle = true;
                    self.idle_changed.notify_all();
                }
                return PollOutcome::Paused;
            }
            control.idle = false;
        }

        if lock(&self.entries).len() >= self.target {
            return PollOutcome::Full;
        }

        let Some(asset) = producer.next_viable() else {
            return PollOutcome::Exhausted;
        };

        if lock(&self.entries).contains_key(&asset) {
            self.stats_duplicate.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(%asset, "already cached, skipping tick");
            return PollOutcome::Duplicate;
        }

        // Normalization may take a while; the entries stay unlocked meanwhile.
        let ready = match producer.preprocessor.normalize(&asset) {
            Ok(ready) => ready,
            Err(why) => {
                self.stats_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%why, %asset, "skipping asset for the rest of the session");
                if producer.failed.insert(asset) {
                    self.viable.fetch_sub(1, Ordering::AcqRel);
                }
                return PollOutcome::Failed;
            }
        };

        lock(&self.entries).insert(asset, ready);
        self.stats_inserted.fetch_add(1, Ordering::Relaxed);
        PollOutcome::Inserted
    }
}

/// Single-producer, single-consumer cache of ready assets.
pub struct PrefetchCache {
    shared: Arc<Shared>,
    poll_interval: Duration,
    /// Present until [`PrefetchCache::start`] hands it to the worker.
    producer: Mutex<Option<Producer>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PrefetchCache {
    /// Create a cache replaying `assets` in the given order.
    ///
    /// Nothing is fetched until [`PrefetchCache::start`] is called or a tick
    /// is run by hand with [`PrefetchCache::poll_once`].
    pub fn new(
        config: &CacheConfig,
        assets: Vec<AssetRef>,
        preprocessor: impl Preprocess + 'static,
    ) -> Self {
        let distinct = assets.iter().collect::<IndexSet<_>>().len();

        Self {
            shared: Arc::new(Shared {
                target: config.size.max(1),
                entries: Mutex::new(IndexMap::with_capacity(config.size)),
                control: Mutex::new(Control::default()),
                idle_changed: Condvar::new(),
                viable: AtomicUsize::new(distinct),
                stats_inserted: AtomicU64::new(0),
                stats_failed: AtomicU64::new(0),
                stats_duplicate: AtomicU64::new(0),
                stats_removed: AtomicU64::new(0),
            }),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            producer: Mutex::new(Some(Producer {
                cycle: AssetCycle::new(assets),
                preprocessor: Box::new(preprocessor),
                failed: IndexSet::new(),
            })),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the background worker. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if the worker thread can't be spawned.
    pub fn start(&self) -> std::io::Result<()> {
        let Some(mut producer) = lock(&self.producer).take() else {
            return Ok(());
        };

        let shared = Arc::clone(&self.shared);
        let interval = self.poll_interval;
        let handle = std::thread::Builder::new()
            .name("prefetch".into())
            .spawn(move || {
                tracing::debug!(target = shared.target, "prefetch worker started");
                while shared.poll(&mut producer) != PollOutcome::Stopped {
                    std::thread::sleep(interval);
                }
                tracing::debug!("prefetch worker stopped");
            })?;

        *lock(&self.worker) = Some(handle);
        Ok(())
    }

    /// Run one fill tick on the calling thread.
    ///
    /// Only works before the worker is started; afterwards the worker owns
    /// the cycle and this returns [`PollOutcome::Stopped`].
    pub fn poll_once(&self) -> PollOutcome {
        match lock(&self.producer).as_mut() {
            Some(producer) => self.shared.poll(producer),
            None => PollOutcome::Stopped,
        }
    }

    /// Ask the worker to stop inserting. Existing entries are kept.
    pub fn pause(&self) {
        let mut control = lock(&self.shared.control);
        control.paused = true;
        control.idle = false;
    }

    pub fn resume(&self) {
        let mut control = lock(&self.shared.control);
        control.paused = false;
        control.idle = false;
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.shared.control).paused
    }

    /// Whether the worker acknowledged the current pause.
    pub fn is_idle(&self) -> bool {
        lock(&self.shared.control).idle
    }

    /// Block until the worker acknowledged the pause or was stopped.
    pub fn wait_until_idle(&self) {
        let control = lock(&self.shared.control);
        let _guard = self
            .shared
            .idle_changed
            .wait_while(control, |control| !control.idle && !control.stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`PrefetchCache::wait_until_idle`], giving up after `timeout`.
    ///
    /// Returns `true` if the worker is idle or stopped.
    pub fn wait_until_idle_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut control = lock(&self.shared.control);

        while !control.idle && !control.stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            control = self
                .shared
                .idle_changed
                .wait_timeout(control, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        true
    }

    /// Request the worker to exit after its current tick. Idempotent.
    pub fn stop(&self) {
        let mut control = lock(&self.shared.control);
        if !control.stopped {
            control.stopped = true;
            self.shared.idle_changed.notify_all();
            tracing::debug!("prefetch stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        lock(&self.shared.control).stopped
    }

    /// Stop the worker and wait for it to exit.
    pub fn join(&self) {
        self.stop();
        let Some(handle) = lock(&self.worker).take() else {
            return;
        };

        if handle.join().is_err() {
            tracing::error!("prefetch worker panicked");
        }
    }

    /// Clone of the first entry in iteration order.
    pub fn first(&self) -> Option<ReadyAsset> {
        lock(&self.shared.entries).values().next().cloned()
    }

    /// Remove an entry, returning it so its temporary copy can be discarded.
    /// Removing an absent key does nothing.
    pub fn remove(&self, asset: &AssetRef) -> Option<ReadyAsset> {
        let removed = lock(&self.shared.entries).shift_remove(asset);
        if removed.is_some() {
            self.shared.stats_removed.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Discard every remaining entry and its temporary copy.
    ///
    /// Returns how many entries were dropped.
    pub fn drain(&self) -> usize {
        let entries: Vec<_> = lock(&self.shared.entries).drain(..).collect();
        let count = entries.len();
        for (_, ready) in entries {
            ready.discard();
        }
        count
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn target_size(&self) -> usize {
        self.shared.target
    }

    /// Distinct assets in the cycle that haven't failed to normalize.
    ///
    /// Shrinks as failures are found; the cache can never hold more entries
    /// than this.
    pub fn viable_assets(&self) -> usize {
        self.shared.viable.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            inserted: self.shared.stats_inserted.load(Ordering::Relaxed),
            skipped_failed: self.shared.stats_failed.load(Ordering::Relaxed),
            skipped_duplicate: self.shared.stats_duplicate.load(Ordering::Relaxed),
            removed: self.shared.stats_removed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for PrefetchCache {
    fn drop(&mut self) {
        // An unjoined worker would otherwise poll forever.
        self.stop();
    }
}
