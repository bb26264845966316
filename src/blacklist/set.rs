//! Time-To-Live Membership Set
//!
//! [`ExpiringSet`] answers "is this key currently blacklisted?" in O(1) and
//! forgets keys once their expiry has passed, without one timer per key.
//!
//! ## Design
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ExpiringSet (Arc)                       │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                    Mutex<Inner>                        │  │
//! │  │  membership: HashSet<K>       <── contains()           │  │
//! │  │  heap: PriorityQueue<HeapEntry, ByExpiry>              │  │
//! │  │  sweeper: Option<SweepHandle>                          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ Weak
//!                 ┌─────────────┴─────────────┐
//!                 │      sweeper task         │
//!                 │ (armed only while the     │
//!                 │  heap is non-empty)       │
//!                 └───────────────────────────┘
//! ```
//!
//! A sweep pops entries from the front of the heap while they are expired and
//! stops at the first live one, so each tick costs only as much as the number
//! of entries that expired since the previous tick.
//!
//! ## Duplicate keys
//!
//! Inserting a key that is already present pushes a second heap entry but the
//! membership index only records the key once. When the earlier entry is
//! swept the key leaves the index, even though the later entry is still in
//! the heap. [`ExpiringSet::len`] counts keys and [`ExpiringSet::heap_len`]
//! counts heap entries, so the two can differ.

use crate::blacklist::clock::{Clock, SystemClock};
use crate::blacklist::config::BlacklistConfig;
use crate::blacklist::entry::{ByExpiry, HeapEntry};
use crate::blacklist::error::{BlacklistError, BlacklistResult};
use crate::blacklist::sweeper::SweepHandle;
use crate::queue::PriorityQueue;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

/// State guarded by the set's mutex.
struct Inner<K, V> {
    /// Entries ordered by ascending expiry
    heap: PriorityQueue<HeapEntry<K, V>, ByExpiry>,
    /// Keys currently considered blacklisted
    membership: HashSet<K>,
    /// Present while a sweep task is scheduled
    sweeper: Option<SweepHandle>,
    /// Epoch handed to the next armed sweeper
    next_epoch: u64,
}

/// State shared between the set handles and the sweep task.
pub(crate) struct Shared<K, V> {
    state: Mutex<Inner<K, V>>,

    /// Sweep period, fixed at construction
    interval: Duration,

    /// Source of "now" for expiry checks
    clock: Arc<dyn Clock>,

    /// Runtime pinned by `with_runtime`; otherwise the runtime current at
    /// each arming is used
    runtime: Option<Handle>,

    /// Set once we have warned about arming without a runtime
    warned_no_runtime: AtomicBool,

    /// Statistics: total inserts
    inserted: AtomicU64,

    /// Statistics: total heap entries evicted by sweeps
    evicted: AtomicU64,

    /// Statistics: total sweeps performed
    sweeps: AtomicU64,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // Every critical section leaves Inner consistent, so a panic
        // elsewhere does not invalidate it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evicts expired entries from the front of the heap.
    ///
    /// Disarms the sweeper if the heap ends up empty.
    fn sweep_locked(&self, inner: &mut Inner<K, V>) -> usize {
        let now = self.clock.now_ms();
        let mut evicted = 0;

        while inner
            .heap
            .peek()
            .is_some_and(|entry| entry.is_expired_at(now))
        {
            if let Some(entry) = inner.heap.pop() {
                inner.membership.remove(&entry.key);
                evicted += 1;
            }
        }

        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.evicted.fetch_add(evicted as u64, Ordering::Relaxed);

        if inner.heap.is_empty() {
            // Dropping the handle aborts the task
            inner.sweeper = None;
        }

        if evicted > 0 {
            debug!(
                evicted = evicted,
                keys_remaining = inner.membership.len(),
                heap_remaining = inner.heap.len(),
                "Expired blacklist entries swept"
            );
        } else {
            trace!(heap_remaining = inner.heap.len(), "Blacklist sweep found nothing");
        }

        evicted
    }

    /// Runs one sweep on behalf of the task armed with `epoch`.
    ///
    /// Returns `false` when that task should stop.
    pub(crate) fn sweep_from_task(&self, epoch: u64) -> bool {
        let mut inner = self.lock();

        if inner.sweeper.as_ref().map(SweepHandle::epoch) != Some(epoch) {
            trace!(epoch = epoch, "Stale sweeper exiting");
            return false;
        }

        self.sweep_locked(&mut inner);
        inner.sweeper.is_some()
    }
}

/// A set of keys that each stay members until their expiry time.
///
/// Cloning an `ExpiringSet` is cheap and yields another handle to the same
/// set.
///
/// # Example
///
/// ```
/// use ttlset::blacklist::{clock, ExpiringSet};
/// use std::time::Duration;
///
/// let set: ExpiringSet<String> = ExpiringSet::new(Duration::from_secs(15)).unwrap();
///
/// set.insert("jti-1".to_string(), clock::now_ms() + 60_000, None);
/// assert!(set.contains(&"jti-1".to_string()));
/// assert_eq!(set.len(), 1);
///
/// set.clear();
/// assert!(set.is_empty());
/// ```
pub struct ExpiringSet<K, V = ()> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for ExpiringSet<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> fmt::Debug for ExpiringSet<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringSet")
            .field("interval", &self.shared.interval)
            .field("inserted", &self.shared.inserted.load(Ordering::Relaxed))
            .field("evicted", &self.shared.evicted.load(Ordering::Relaxed))
            .finish()
    }
}

impl<K, V> ExpiringSet<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    /// Creates an empty set that sweeps every `interval` using the system clock.
    ///
    /// The sweeper is spawned on whichever Tokio runtime is current when an
    /// insert arms it.
    ///
    /// # Errors
    ///
    /// Returns [`BlacklistError::InvalidInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> BlacklistResult<Self> {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    /// Creates an empty set with the default 15 second sweep interval.
    pub fn with_defaults() -> Self {
        Self::build(
            BlacklistConfig::default().sweep_interval,
            Arc::new(SystemClock),
            None,
        )
    }

    /// Creates an empty set from a [`BlacklistConfig`].
    pub fn from_config(config: &BlacklistConfig) -> BlacklistResult<Self> {
        config.validate()?;
        Self::new(config.sweep_interval)
    }

    /// Creates an empty set reading time from `clock`.
    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> BlacklistResult<Self> {
        if interval.is_zero() {
            return Err(BlacklistError::InvalidInterval);
        }
        Ok(Self::build(interval, clock, None))
    }

    /// Creates an empty set whose sweeper always runs on `runtime`, even when
    /// inserts happen outside it.
    pub fn with_runtime(
        interval: Duration,
        clock: Arc<dyn Clock>,
        runtime: Handle,
    ) -> BlacklistResult<Self> {
        if interval.is_zero() {
            return Err(BlacklistError::InvalidInterval);
        }
        Ok(Self::build(interval, clock, Some(runtime)))
    }

    fn build(interval: Duration, clock: Arc<dyn Clock>, runtime: Option<Handle>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    heap: PriorityQueue::new(ByExpiry),
                    membership: HashSet::new(),
                    sweeper: None,
                    next_epoch: 0,
                }),
                interval,
                clock,
                runtime,
                warned_no_runtime: AtomicBool::new(false),
                inserted: AtomicU64::new(0),
                evicted: AtomicU64::new(0),
                sweeps: AtomicU64::new(0),
            }),
        }
    }

    /// Blacklists `key` until `expires_at_ms` (milliseconds since the Unix epoch).
    ///
    /// The entry is always pushed onto the heap, even if `key` is already a
    /// member. Arms the sweeper if it is not running.
    pub fn insert(&self, key: K, expires_at_ms: u64, value: Option<V>) {
        let mut inner = self.shared.lock();

        inner.membership.insert(key.clone());
        inner.heap.push_one(HeapEntry::new(key, expires_at_ms, value));
        self.shared.inserted.fetch_add(1, Ordering::Relaxed);

        if !inner.sweeper.as_ref().is_some_and(SweepHandle::is_running) {
            self.arm(&mut inner);
        }
    }

    fn arm(&self, inner: &mut Inner<K, V>) {
        let runtime = match self
            .shared
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        {
            Some(runtime) => runtime,
            None => {
                // A handle left by a runtime that has since shut down
                inner.sweeper = None;
                if !self.shared.warned_no_runtime.swap(true, Ordering::Relaxed) {
                    warn!("No Tokio runtime, expired entries wait for an explicit sweep");
                }
                return;
            }
        };

        let epoch = inner.next_epoch;
        inner.next_epoch += 1;

        inner.sweeper = Some(SweepHandle::spawn(
            &runtime,
            Arc::downgrade(&self.shared),
            self.shared.interval,
            epoch,
        ));
    }

    /// Returns `true` if `key` is currently blacklisted.
    ///
    /// Accepts any borrowed form of the key, as [`HashSet::contains`] does.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.lock().membership.contains(key)
    }

    /// Removes every entry and cancels the sweeper.
    ///
    /// Calling this on an empty set is a no-op.
    pub fn clear(&self) {
        let mut inner = self.shared.lock();
        inner.heap.clear();
        inner.membership.clear();
        inner.sweeper = None;
    }

    /// Evicts every entry that has expired by now.
    ///
    /// Returns the number of heap entries removed. The sweeper calls this on
    /// its own; callers without a Tokio runtime can call it directly.
    pub fn sweep(&self) -> usize {
        let mut inner = self.shared.lock();
        self.shared.sweep_locked(&mut inner)
    }

    /// Returns the number of blacklisted keys.
    pub fn len(&self) -> usize {
        self.shared.lock().membership.len()
    }

    /// Returns `true` if no key is blacklisted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries waiting in the expiry heap.
    pub fn heap_len(&self) -> usize {
        self.shared.lock().heap.len()
    }

    /// Returns `true` while a sweep task is scheduled.
    pub fn is_armed(&self) -> bool {
        self.shared
            .lock()
            .sweeper
            .as_ref()
            .is_some_and(SweepHandle::is_running)
    }

    /// Returns the earliest pending expiry, if any.
    pub fn next_expiry(&self) -> Option<u64> {
        self.shared.lock().heap.peek().map(|entry| entry.expires_at_ms)
    }

    /// Returns the sweep interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Returns a snapshot of the set's statistics.
    pub fn stats(&self) -> BlacklistStats {
        let inner = self.shared.lock();
        BlacklistStats {
            keys: inner.membership.len(),
            heap_entries: inner.heap.len(),
            armed: inner.sweeper.as_ref().is_some_and(SweepHandle::is_running),
            inserted: self.shared.inserted.load(Ordering::Relaxed),
            evicted: self.shared.evicted.load(Ordering::Relaxed),
            sweeps: self.shared.sweeps.load(Ordering::Relaxed),
        }
    }
}

/// Blacklist statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlacklistStats {
    /// Number of keys currently blacklisted
    pub keys: usize,
    /// Number of entries in the expiry heap
    pub heap_entries: usize,
    /// Whether a sweep task is scheduled
    pub armed: bool,
    /// Total inserts
    pub inserted: u64,
    /// Total heap entries evicted by sweeps
    pub evicted: u64,
    /// Total sweeps performed
    pub sweeps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::clock::{now_ms, ManualClock};

    /// A set on a manual clock whose sweeper never fires during a test.
    fn manual_set(start_ms: u64) -> (ExpiringSet<&'static str, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start_ms));
        let set = ExpiringSet::with_clock(Duration::from_secs(3600), clock.clone()).unwrap();
        (set, clock)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result: BlacklistResult<ExpiringSet<String>> = ExpiringSet::new(Duration::ZERO);
        assert_eq!(result.unwrap_err(), BlacklistError::InvalidInterval);
    }

    #[test]
    fn test_defaults() {
        let set: ExpiringSet<String> = ExpiringSet::with_defaults();
        assert_eq!(set.interval(), Duration::from_millis(15_000));
        assert!(set.is_empty());
        assert!(!set.is_armed());
    }

    #[test]
    fn test_insert_and_contains() {
        let (set, _clock) = manual_set(1_000);

        set.insert("a", 2_000, Some(1));
        set.insert("b", 3_000, None);

        assert!(set.contains(&"a"));
        assert!(set.contains(&"b"));
        assert!(!set.contains(&"c"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.heap_len(), 2);
    }

    #[test]
    fn test_sweep_stops_at_first_live_entry() {
        let (set, clock) = manual_set(0);

        for (key, exp) in [("d", 40), ("b", 20), ("a", 10), ("c", 30)] {
            set.insert(key, exp, None);
        }

        clock.set(25);
        assert_eq!(set.sweep(), 2);
        assert!(!set.contains(&"a"));
        assert!(!set.contains(&"b"));
        assert!(set.contains(&"c"));
        assert!(set.contains(&"d"));
        assert_eq!(set.next_expiry(), Some(30));
    }

    #[test]
    fn test_entry_expiring_now_survives_sweep() {
        let (set, clock) = manual_set(0);
        set.insert("edge", 100, None);

        clock.set(100);
        assert_eq!(set.sweep(), 0);
        assert!(set.contains(&"edge"));

        clock.set(101);
        assert_eq!(set.sweep(), 1);
        assert!(!set.contains(&"edge"));
    }

    #[test]
    fn test_duplicate_key_expires_with_earliest_entry() {
        let (set, clock) = manual_set(1_000);

        set.insert("x", 1_010, None);
        set.insert("x", 2_000, None);
        assert_eq!(set.len(), 1);
        assert_eq!(set.heap_len(), 2);

        clock.set(1_020);
        assert_eq!(set.sweep(), 1);

        // The later revocation is still queued but the key is no longer a member
        assert!(!set.contains(&"x"));
        assert_eq!(set.len(), 0);
        assert_eq!(set.heap_len(), 1);
        assert_eq!(set.next_expiry(), Some(2_000));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (set, _clock) = manual_set(0);
        set.insert("a", 10, None);
        set.insert("b", 20, None);

        set.clear();
        assert!(!set.contains(&"a"));
        assert!(!set.contains(&"b"));
        assert_eq!(set.len(), 0);
        assert_eq!(set.heap_len(), 0);

        set.clear();
        assert_eq!(set.len(), 0);
        assert!(!set.is_armed());
    }

    #[test]
    fn test_without_runtime_stays_unarmed() {
        let (set, clock) = manual_set(0);
        set.insert("a", 10, None);

        assert!(!set.is_armed());
        assert!(set.contains(&"a"));

        clock.set(11);
        assert_eq!(set.sweep(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_stats() {
        let (set, clock) = manual_set(0);
        set.insert("a", 10, None);
        set.insert("a", 50, None);
        set.insert("b", 20, Some(7));

        clock.set(30);
        set.sweep();

        let stats = set.stats();
        assert_eq!(stats.keys, 0);
        assert_eq!(stats.heap_entries, 1);
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.sweeps, 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let (set, _clock) = manual_set(0);
        let mut handles = vec![];

        for i in 0..8u32 {
            let set = set.clone();
            handles.push(thread::spawn(move || {
                for j in 0..100u64 {
                    let key: &'static str = Box::leak(format!("key-{}-{}", i, j).into_boxed_str());
                    set.insert(key, 1_000 + j, Some(i));
                    assert!(set.contains(&key));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(set.len(), 800);
        assert_eq!(set.heap_len(), 800);
    }

    #[tokio::test]
    async fn test_token_expires_after_sweep() {
        let set: ExpiringSet<String> = ExpiringSet::new(Duration::from_millis(10)).unwrap();

        set.insert("tok1".to_string(), now_ms() + 50, None);
        assert!(set.contains(&"tok1".to_string()));
        assert!(set.is_armed());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!set.contains(&"tok1".to_string()));
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_short_lived_key_swept_before_long_lived() {
        let set: ExpiringSet<String> = ExpiringSet::new(Duration::from_millis(5)).unwrap();
        let now = now_ms();

        set.insert("a".to_string(), now + 1_000, None);
        set.insert("b".to_string(), now + 10, None);

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(!set.contains(&"b".to_string()));
        assert!(set.contains(&"a".to_string()));
        assert!(set.is_armed());
    }

    #[tokio::test]
    async fn test_duplicate_key_with_live_sweeper() {
        let set: ExpiringSet<String> = ExpiringSet::new(Duration::from_millis(5)).unwrap();
        let now = now_ms();

        set.insert("x".to_string(), now + 10, None);
        set.insert("x".to_string(), now + 1_000, None);

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(!set.contains(&"x".to_string()));
        assert_eq!(set.heap_len(), 1);
        assert!(set.is_armed());
    }

    #[tokio::test]
    async fn test_sweeper_disarms_and_rearms() {
        let set: ExpiringSet<u64> = ExpiringSet::new(Duration::from_millis(5)).unwrap();

        set.insert(1, now_ms() + 5, None);
        assert!(set.is_armed());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(set.is_empty());
        assert!(!set.is_armed());

        set.insert(2, now_ms() + 60_000, None);
        assert!(set.is_armed());
        assert!(set.contains(&2));
    }

    #[tokio::test]
    async fn test_clear_cancels_sweeper() {
        let set: ExpiringSet<u64> = ExpiringSet::new(Duration::from_millis(5)).unwrap();

        set.insert(1, now_ms() + 60_000, None);
        assert!(set.is_armed());

        set.clear();
        assert!(!set.is_armed());

        // Re-arming after clear leaves exactly one live sweeper
        set.insert(2, now_ms() + 5, None);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!set.contains(&2));
        assert!(!set.is_armed());
    }

    fn current_thread_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_sweeper_uses_runtime_current_at_insert() {
        let first = current_thread_runtime();
        let set: ExpiringSet<String> =
            first.block_on(async { ExpiringSet::new(Duration::from_millis(5)).unwrap() });
        drop(first);

        let second = current_thread_runtime();
        second.block_on(async {
            set.insert("tok".to_string(), now_ms() + 10, None);
            assert!(set.is_armed());
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        assert!(!set.contains("tok"));
        assert_eq!(set.heap_len(), 0);
        assert!(!set.is_armed());
    }

    #[test]
    fn test_rearms_after_runtime_shutdown() {
        let set: ExpiringSet<String> = ExpiringSet::new(Duration::from_millis(5)).unwrap();

        let first = current_thread_runtime();
        first.block_on(async {
            set.insert("old".to_string(), now_ms() + 60_000, None);
            assert!(set.is_armed());
        });
        drop(first);
        assert!(!set.is_armed());

        let second = current_thread_runtime();
        second.block_on(async {
            set.insert("new".to_string(), now_ms() + 10, None);
            assert!(set.is_armed());
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        assert!(!set.contains("new"));
        assert!(set.contains("old"));
        assert!(set.is_armed());
    }

    #[test]
    fn test_with_runtime_arms_outside_the_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let set: ExpiringSet<String> = ExpiringSet::with_runtime(
            Duration::from_millis(5),
            Arc::new(SystemClock),
            runtime.handle().clone(),
        )
        .unwrap();

        // No runtime is current on the test thread
        assert!(Handle::try_current().is_err());
        set.insert("tok".to_string(), now_ms() + 10, None);
        assert!(set.is_armed());

        std::thread::sleep(Duration::from_millis(200));
        assert!(!set.contains("tok"));
        assert!(!set.is_armed());
    }

    #[test]
    fn test_with_runtime_rejects_zero_interval() {
        let runtime = current_thread_runtime();
        let result: BlacklistResult<ExpiringSet<String>> = ExpiringSet::with_runtime(
            Duration::ZERO,
            Arc::new(SystemClock),
            runtime.handle().clone(),
        );
        assert_eq!(result.unwrap_err(), BlacklistError::InvalidInterval);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let set: ExpiringSet<String> = ExpiringSet::new(Duration::from_secs(60)).unwrap();
        let other = set.clone();

        set.insert("shared".to_string(), now_ms() + 60_000, None);
        assert!(other.contains(&"shared".to_string()));

        other.clear();
        assert!(!set.contains(&"shared".to_string()));
    }
}
