//! Sweeping Cache
//!
//! Keyed container whose entries are evicted by a periodic background sweep.
//! The cache owns the mechanism only: which entries are stale is decided by
//! the filter its owner supplies, evaluated against each entry's current
//! value at sweep time.
//!
//! Entries live in a `DashMap`, so `insert`, `get` and `delete` are
//! synchronous and a sweep (`retain`, one shard at a time) never blocks the
//! whole map. A sweep pass only looks at entries written before it started;
//! a write that lands while a pass is running is left for the next one.
//!
//! On a `current_thread` runtime a pass only runs while the caller is
//! suspended, so `insert` followed by `get` always sees the value. On a
//! multi-threaded runtime a pass that starts after the `insert` may evict
//! the entry before the `get`; only writes made after a pass began are
//! guaranteed to survive it.

use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default time between sweep passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// A cached value plus its write metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    generation: u64,
}

impl<V> CacheEntry<V> {
    /// The value as it is now.
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// When this value was written.
    pub const fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// Time since this value was written.
    pub fn age(&self) -> Duration {
        self.inserted_at.elapsed()
    }
}

/// Eviction predicate: return `true` to remove the entry.
pub type SweepFilter<K, V> = Arc<dyn Fn(&K, &CacheEntry<V>) -> bool + Send + Sync>;

/// Sweep schedule and policy.
pub struct SweeperOptions<K, V> {
    /// Evict every entry for which this returns `true`.
    pub filter: SweepFilter<K, V>,
    /// Time between passes.
    pub interval: Duration,
}

impl<K, V> SweeperOptions<K, V> {
    /// Sweep every `interval` with a custom filter.
    pub fn new<F>(interval: Duration, filter: F) -> Self
    where
        F: Fn(&K, &CacheEntry<V>) -> bool + Send + Sync + 'static,
    {
        Self {
            filter: Arc::new(filter),
            interval,
        }
    }

    /// Evict entries whose age exceeds `retention`.
    pub fn older_than(retention: Duration, interval: Duration) -> Self {
        Self::new(interval, move |_, entry| entry.age() > retention)
    }
}

impl<K, V> Clone for SweeperOptions<K, V> {
    fn clone(&self) -> Self {
        Self {
            filter: Arc::clone(&self.filter),
            interval: self.interval,
        }
    }
}

impl<K, V> std::fmt::Debug for SweeperOptions<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweeperOptions")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Entries removed.
    pub evicted: usize,
    /// Entries kept because the filter panicked on them.
    pub failed: usize,
}

struct Shared<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    generation: AtomicU64,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash,
{
    fn sweep(&self, filter: &(dyn Fn(&K, &CacheEntry<V>) -> bool + Send + Sync)) -> SweepOutcome {
        let horizon = self.generation.load(Ordering::Acquire);
        self.sweep_before(horizon, filter)
    }

    fn sweep_before(
        &self,
        horizon: u64,
        filter: &(dyn Fn(&K, &CacheEntry<V>) -> bool + Send + Sync),
    ) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        self.entries.retain(|key, entry| {
            // Written after this pass started
            if entry.generation >= horizon {
                return true;
            }
            match catch_unwind(AssertUnwindSafe(|| filter(key, entry))) {
                Ok(true) => {
                    outcome.evicted += 1;
                    false
                }
                Ok(false) => true,
                Err(_) => {
                    outcome.failed += 1;
                    true
                }
            }
        });

        outcome
    }
}

/// Background schedule handle.
struct Sweeper {
    handle: JoinHandle<()>,
    /// Held by the task for the length of a pass; `true` once stopped.
    gate: Arc<Mutex<bool>>,
}

/// Keyed cache with optional periodic sweeping.
pub struct SweepingCache<K, V> {
    shared: Arc<Shared<K, V>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<K, V> Default for SweepingCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SweepingCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create a cache that is never swept.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: DashMap::new(),
                generation: AtomicU64::new(0),
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a cache and start its sweep schedule on the current tokio runtime.
    ///
    /// The first pass runs one `interval` after construction. Without a
    /// runtime, or with a zero interval, the cache is returned unswept and a
    /// warning is logged.
    pub fn with_sweeper(options: SweeperOptions<K, V>) -> Self {
        let cache = Self::new();

        if options.interval.is_zero() {
            tracing::warn!("Zero sweep interval; cache created without a sweeper");
            return cache;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("No tokio runtime; cache created without a sweeper");
                return cache;
            }
        };

        let gate = Arc::new(Mutex::new(false));
        let start = Instant::now() + options.interval;
        let handle = runtime.spawn(run_sweeper(
            Arc::downgrade(&cache.shared),
            options,
            start,
            Arc::clone(&gate),
        ));

        *cache.lock_sweeper() = Some(Sweeper { handle, gate });
        cache
    }

    /// Insert or replace the value under `key`, resetting its insertion time.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        // Stamp while holding the shard lock so a pass sees stamp and value together
        let slot = self.shared.entries.entry(key);
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            generation: self.shared.generation.fetch_add(1, Ordering::AcqRel),
        };
        match slot {
            Entry::Occupied(mut occupied) => Some(occupied.insert(entry).value),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                None
            }
        }
    }

    /// Get a copy of the value under `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shared.entries.get(key).map(|e| e.value.clone())
    }

    /// Run `f` against the entry under `key` without cloning the value.
    pub fn with_entry<R>(&self, key: &K, f: impl FnOnce(&CacheEntry<V>) -> R) -> Option<R> {
        self.shared.entries.get(key).map(|e| f(e.value()))
    }

    /// Remove `key`. Returns `true` iff an entry was present.
    pub fn delete(&self, key: &K) -> bool {
        self.shared.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.shared.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    pub fn clear(&self) {
        self.shared.entries.clear();
    }

    /// Snapshot of the current keys.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.shared.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot of the current values.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.shared
            .entries
            .iter()
            .map(|e| e.value().value.clone())
            .collect()
    }

    /// Whether a sweep schedule is active.
    pub fn is_sweeping(&self) -> bool {
        self.lock_sweeper().is_some()
    }

    /// Cancel the sweep schedule.
    ///
    /// Waits for a pass already in progress, then guarantees no further pass
    /// runs. Reads and writes keep working. Calling it again is a no-op.
    pub fn stop(&self) {
        let Some(sweeper) = self.lock_sweeper().take() else {
            return;
        };
        *sweeper.gate.lock().unwrap_or_else(PoisonError::into_inner) = true;
        sweeper.handle.abort();
        tracing::debug!("Cache sweeper stopped");
    }

    fn lock_sweeper(&self) -> std::sync::MutexGuard<'_, Option<Sweeper>> {
        self.sweeper.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Drop for SweepingCache<K, V> {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            *sweeper.gate.lock().unwrap_or_else(PoisonError::into_inner) = true;
            sweeper.handle.abort();
        }
    }
}

impl<K, V> std::fmt::Debug for SweepingCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepingCache")
            .field("len", &self.shared.entries.len())
            .finish_non_exhaustive()
    }
}

async fn run_sweeper<K, V>(
    shared: Weak<Shared<K, V>>,
    options: SweeperOptions<K, V>,
    start: Instant,
    gate: Arc<Mutex<bool>>,
) where
    K: Eq + Hash,
{
    let mut ticker = tokio::time::interval_at(start, options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let stopped = gate.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            break;
        }
        let Some(strong) = shared.upgrade() else {
            break;
        };

        let outcome = strong.sweep(options.filter.as_ref());
        if outcome.failed > 0 {
            tracing::warn!(
                failed = outcome.failed,
                "Sweep filter panicked; affected entries kept"
            );
        }
        tracing::debug!(
            evicted = outcome.evicted,
            remaining = strong.entries.len(),
            "Cache sweep completed"
        );
        drop(stopped);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(60);

    /// Sleep just past the next `n` sweep ticks.
    async fn pass_ticks(n: u32) {
        tokio::time::sleep(INTERVAL * n + Duration::from_millis(1)).await;
    }

    #[test]
    fn test_insert_then_get() {
        let cache = SweepingCache::new();
        assert!(cache.insert(1u64, "one").is_none());
        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_insert_replaces_value() {
        let cache = SweepingCache::new();
        cache.insert(1u64, "one");
        assert_eq!(cache.insert(1, "uno"), Some("one"));
        assert_eq!(cache.get(&1), Some("uno"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let cache = SweepingCache::new();
        cache.insert(1u64, ());
        assert!(cache.delete(&1));
        assert!(!cache.delete(&1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_without_runtime_is_unswept() {
        let cache: SweepingCache<u64, u64> =
            SweepingCache::with_sweeper(SweeperOptions::new(INTERVAL, |_, _| true));
        assert!(!cache.is_sweeping());

        cache.insert(1, 1);
        assert_eq!(cache.get(&1), Some(1));
    }

    #[test]
    fn test_sweep_skips_entries_written_after_horizon() {
        let cache = SweepingCache::new();
        cache.insert(1u64, ());
        let horizon = cache.shared.generation.load(Ordering::Acquire);
        cache.insert(2u64, ());

        let outcome = cache.shared.sweep_before(horizon, &|_, _| true);

        assert_eq!(outcome.evicted, 1);
        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinsert_resets_inserted_at() {
        let cache = SweepingCache::new();
        cache.insert(1u64, "one");
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.with_entry(&1, |e| e.age()).unwrap() >= Duration::from_secs(30));

        cache.insert(1, "one");
        assert_eq!(cache.with_entry(&1, |e| e.age()), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_matching_entries_only() {
        let cache = SweepingCache::with_sweeper(SweeperOptions::new(
            INTERVAL,
            |_, e: &CacheEntry<u64>| *e.value() % 2 == 0,
        ));
        for i in 0u64..10 {
            cache.insert(i, i);
        }

        pass_ticks(1).await;

        for i in 0u64..10 {
            if i % 2 == 0 {
                assert_eq!(cache.get(&i), None, "{i} should be evicted");
            } else {
                assert_eq!(cache.get(&i), Some(i), "{i} should remain");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_evicted_before_interval() {
        let cache = SweepingCache::with_sweeper(SweeperOptions::new(
            INTERVAL,
            |_, _: &CacheEntry<u64>| true,
        ));
        cache.insert(1u64, 1);

        tokio::time::sleep(INTERVAL - Duration::from_millis(1)).await;
        assert_eq!(cache.get(&1), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_sees_current_value() {
        let cache = SweepingCache::with_sweeper(SweeperOptions::new(
            INTERVAL,
            |_, e: &CacheEntry<&str>| *e.value() == "stale",
        ));
        cache.insert(1u64, "fresh");
        cache.insert(2u64, "fresh");
        cache.insert(1, "stale");

        pass_ticks(1).await;

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_age_filter() {
        let cache = SweepingCache::with_sweeper(SweeperOptions::older_than(
            Duration::from_secs(90),
            INTERVAL,
        ));
        cache.insert(1u64, ());
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.insert(2u64, ());

        // t=60: both younger than 90s
        pass_ticks(1).await;
        assert!(cache.contains_key(&1));
        assert!(cache.contains_key(&2));

        // t=120: entry 1 is 120s old, entry 2 is 75s old
        pass_ticks(1).await;
        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_final() {
        let cache = SweepingCache::with_sweeper(SweeperOptions::new(
            INTERVAL,
            |_, _: &CacheEntry<()>| true,
        ));
        assert!(cache.is_sweeping());
        cache.insert(1u64, ());

        cache.stop();
        cache.stop();
        assert!(!cache.is_sweeping());

        pass_ticks(5).await;
        assert!(cache.contains_key(&1));

        // Still usable
        cache.insert(2, ());
        assert!(cache.delete(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_filter_keeps_entry_and_schedule() {
        let cache = SweepingCache::with_sweeper(SweeperOptions::new(
            INTERVAL,
            |k: &u64, _: &CacheEntry<()>| {
                assert!(*k != 1, "filter failure");
                true
            },
        ));
        cache.insert(1, ());
        cache.insert(2, ());

        pass_ticks(1).await;
        assert!(cache.contains_key(&1));
        assert!(!cache.contains_key(&2));

        cache.insert(3, ());
        pass_ticks(1).await;
        assert!(!cache.contains_key(&3));
        assert!(cache.is_sweeping());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_entries() {
        let cache: SweepingCache<u64, ()> =
            SweepingCache::with_sweeper(SweeperOptions::new(INTERVAL, |_, _| true));
        let weak = Arc::downgrade(&cache.shared);
        drop(cache);

        pass_ticks(1).await;
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_zero_interval_is_unswept() {
        let cache: SweepingCache<u64, u64> =
            SweepingCache::with_sweeper(SweeperOptions::new(Duration::ZERO, |_, _| true));
        assert!(!cache.is_sweeping());

        cache.insert(1, 1);
        tokio::task::yield_now().await;
        assert_eq!(cache.get(&1), Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_writes_after_pass_start_survive_concurrent_passes() {
        let cache = Arc::new(SweepingCache::new());
        for i in 0u64..1_000 {
            cache.insert(i, i);
        }
        let horizon = cache.shared.generation.load(Ordering::Acquire);

        let sweeper = {
            let cache = Arc::clone(&cache);
            tokio::task::spawn_blocking(move || {
                for _ in 0..200 {
                    cache.shared.sweep_before(horizon, &|_, _| true);
                }
            })
        };
        let writers: Vec<_> = (0..4u64)
            .map(|w| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for i in 0..5_000u64 {
                        let key = 1_000 + w * 5_000 + i;
                        cache.insert(key, key);
                        assert_eq!(cache.get(&key), Some(key));
                    }
                })
            })
            .collect();

        sweeper.await.unwrap();
        for writer in writers {
            writer.await.unwrap();
        }

        assert!((0u64..1_000).all(|i| !cache.contains_key(&i)));
        assert_eq!(cache.len(), 20_000);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8, u32),
        Delete(u8),
        /// Evict values above the limit.
        Sweep(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            any::<u8>().prop_map(Op::Delete),
            any::<u32>().prop_map(Op::Sweep),
        ]
    }

    proptest! {
        #[test]
        fn prop_behaves_like_hash_map(ops in prop::collection::vec(op(), 0..200)) {
            let cache = SweepingCache::new();
            let mut model = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(k, v) => {
                        prop_assert_eq!(cache.insert(k, v), model.insert(k, v));
                    }
                    Op::Delete(k) => {
                        prop_assert_eq!(cache.delete(&k), model.remove(&k).is_some());
                    }
                    Op::Sweep(limit) => {
                        let outcome = cache
                            .shared
                            .sweep(&|_, e: &CacheEntry<u32>| *e.value() > limit);
                        let before = model.len();
                        model.retain(|_, v| *v <= limit);
                        prop_assert_eq!(outcome.evicted, before - model.len());
                        prop_assert_eq!(outcome.failed, 0);
                    }
                }
            }

            prop_assert_eq!(cache.len(), model.len());
            for (k, v) in &model {
                prop_assert_eq!(cache.get(k), Some(*v));
            }
        }
    }
}
