//! Thread-safe entry store with per-entry expiry and bounded eviction

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use parking_lot::RwLock;

use super::config::{EvictionPolicy, StoreConfig};
use super::expiry::Expiry;
use super::stats::{CacheStats, MetricsCollector};
use crate::time::{Clock, SystemClock};

/// A snapshot of a stored entry handed back by lookups
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// When the value was inserted
    pub created_at: Instant,
    /// When the value stops being served
    pub expiry: Expiry,
}

#[derive(Debug)]
struct Slot<V> {
    entry: Entry<V>,
    inserted_seq: u64,
    touched_seq: u64,
    reads: u64,
}

#[derive(Debug)]
struct Storage<K, V> {
    slots: HashMap<K, Slot<V>>,
    seq: u64,
}

impl<K, V> Storage<K, V> {
    fn tick(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Generic thread-safe store keyed by `K` whose entries expire individually
///
/// Reads take the write lock because every hit updates recency metadata.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use memora_common::cache::{EntryStore, Expiry, StoreConfig};
/// use memora_common::time::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// let store: EntryStore<String, i32, MockClock> =
///     EntryStore::with_clock(StoreConfig::lru(100), clock.clone());
///
/// store.insert("k".to_string(), 42, Expiry::after(clock.now(), Duration::from_secs(5)));
/// assert_eq!(store.get(&"k".to_string()), Some(42));
///
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(store.get(&"k".to_string()), None);
/// ```
pub struct EntryStore<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    storage: RwLock<Storage<K, V>>,
    config: StoreConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> EntryStore<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a store on the system clock
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> EntryStore<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a store with a custom clock (useful for testing)
    pub fn with_clock(config: StoreConfig, clock: C) -> Self {
        Self {
            storage: RwLock::new(Storage { slots: HashMap::new(), seq: 0 }),
            config,
            metrics: MetricsCollector::default(),
            clock,
        }
    }

    /// The configuration this store was built with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current instant on the store's clock
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// The clock driving this store
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Insert or replace a value
    ///
    /// When the store is full, expired entries are purged first and one
    /// entry is evicted by policy only if that freed nothing.
    pub fn insert(&self, key: K, value: V, expiry: Expiry) {
        let now = self.clock.now();
        let mut storage = self.storage.write();

        if let Some(max_size) = self.config.max_size {
            if storage.slots.len() >= max_size && !storage.slots.contains_key(&key) {
                let purged = Self::drop_expired(&mut storage, now);
                self.record_expirations(purged);
                if storage.slots.len() >= max_size {
                    self.evict_one(&mut storage);
                }
            }
        }

        let seq = storage.tick();
        let slot = Slot {
            entry: Entry { value, created_at: now, expiry },
            inserted_seq: seq,
            touched_seq: seq,
            reads: 0,
        };
        storage.slots.insert(key, slot);

        if self.config.track_metrics {
            self.metrics.record_insert();
        }
    }

    /// Fetch a live value, dropping it if its hard deadline has passed
    pub fn get(&self, key: &K) -> Option<V> {
        self.lookup(key, 1.0, None).map(|entry| entry.value)
    }

    /// Fetch a live entry snapshot
    ///
    /// `roll` is a uniform sample in `[0, 1)` consulted inside an entry's
    /// early-expiry window (pass `1.0` to ignore the window). When the entry
    /// is expired and `extend_stale` is set, the stale entry is kept and its
    /// deadline pushed to `now + extend_stale` so concurrent readers keep
    /// being served while this caller recomputes; this caller still sees a
    /// miss. Without `extend_stale` an expired entry is removed.
    pub fn lookup(
        &self,
        key: &K,
        roll: f64,
        extend_stale: Option<std::time::Duration>,
    ) -> Option<Entry<V>> {
        let now = self.clock.now();
        let mut storage = self.storage.write();

        let expired = match storage.slots.get(key) {
            None => {
                self.record_miss();
                return None;
            }
            Some(slot) => slot.entry.expiry.is_expired(now, roll),
        };

        if expired {
            match extend_stale {
                Some(grace) => {
                    if let Some(slot) = storage.slots.get_mut(key) {
                        slot.entry.expiry = Expiry::after(now, grace);
                    }
                }
                None => {
                    storage.slots.remove(key);
                    self.record_expirations(1);
                }
            }
            self.record_miss();
            return None;
        }

        let seq = storage.tick();
        let slot = storage.slots.get_mut(key)?;
        slot.touched_seq = seq;
        slot.reads += 1;
        let entry = slot.entry.clone();
        self.record_hit();
        Some(entry)
    }

    /// Remove a value regardless of expiry
    pub fn remove(&self, key: &K) -> Option<V> {
        self.storage.write().slots.remove(key).map(|slot| slot.entry.value)
    }

    /// Remove a value because it was judged expired by the caller
    pub fn expire(&self, key: &K) -> bool {
        let removed = self.storage.write().slots.remove(key).is_some();
        if removed {
            self.record_expirations(1);
        }
        removed
    }

    /// Whether a key is present, expired or not
    pub fn contains_key(&self, key: &K) -> bool {
        self.storage.read().slots.contains_key(key)
    }

    /// Clear all entries and reset counters
    pub fn clear(&self) {
        let mut storage = self.storage.write();
        storage.slots.clear();
        storage.seq = 0;
        self.metrics.reset();
    }

    /// Current number of entries, including ones not yet purged
    pub fn len(&self) -> usize {
        self.storage.read().slots.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry past its hard deadline, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut storage = self.storage.write();
        let purged = Self::drop_expired(&mut storage, now);
        self.record_expirations(purged);
        purged
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len(), self.config.max_size)
    }

    fn drop_expired(storage: &mut Storage<K, V>, now: Instant) -> usize {
        let before = storage.slots.len();
        storage.slots.retain(|_, slot| !slot.entry.expiry.is_expired(now, 1.0));
        before - storage.slots.len()
    }

    fn evict_one(&self, storage: &mut Storage<K, V>) {
        let victim = match self.config.eviction_policy {
            EvictionPolicy::LRU => storage
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.touched_seq)
                .map(|(k, _)| k.clone()),
            EvictionPolicy::LFU => storage
                .slots
                .iter()
                .min_by_key(|(_, slot)| (slot.reads, slot.touched_seq))
                .map(|(k, _)| k.clone()),
            EvictionPolicy::FIFO => storage
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.inserted_seq)
                .map(|(k, _)| k.clone()),
            EvictionPolicy::Random => {
                use rand::seq::IteratorRandom;
                let mut rng = rand::thread_rng();
                storage.slots.keys().choose(&mut rng).cloned()
            }
            EvictionPolicy::None => None,
        };

        if let Some(key) = victim {
            storage.slots.remove(&key);
            if self.config.track_metrics {
                self.metrics.record_eviction();
            }
        }
    }

    fn record_hit(&self) {
        if self.config.track_metrics {
            self.metrics.record_hit();
        }
    }

    fn record_miss(&self) {
        if self.config.track_metrics {
            self.metrics.record_miss();
        }
    }

    fn record_expirations(&self, count: usize) {
        if self.config.track_metrics && count > 0 {
            self.metrics.record_expirations(count as u64);
        }
    }
}

impl<K, V, C> std::fmt::Debug for EntryStore<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::store.
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::time::MockClock;

    fn store(config: StoreConfig) -> (EntryStore<String, i32, MockClock>, MockClock) {
        let clock = MockClock::new();
        (EntryStore::with_clock(config, clock.clone()), clock)
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    /// Validates insert, overwrite and remove.
    ///
    /// Assertions:
    /// - Confirms a replaced key keeps a single entry with the newer value.
    /// - Confirms `remove` returns the value and empties the store.
    #[test]
    fn test_insert_overwrite_remove() {
        let (store, _) = store(StoreConfig::default());

        store.insert(key("a"), 1, Expiry::never());
        store.insert(key("a"), 2, Expiry::never());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key("a")), Some(2));

        assert_eq!(store.remove(&key("a")), Some(2));
        assert!(store.is_empty());
        assert_eq!(store.get(&key("a")), None);
    }

    /// Validates hard expiry against the mock clock.
    ///
    /// Assertions:
    /// - Live before the deadline, gone at it, and removed from storage.
    #[test]
    fn test_hard_expiry_removes_entry() {
        let (store, clock) = store(StoreConfig::default());

        store.insert(key("a"), 1, Expiry::after(clock.now(), Duration::from_secs(10)));
        clock.advance(Duration::from_secs(9));
        assert_eq!(store.get(&key("a")), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get(&key("a")), None);
        assert!(!store.contains_key(&key("a")));
    }

    /// Validates that an expired entry can be extended for other readers.
    ///
    /// Assertions:
    /// - The caller that observes expiry gets a miss.
    /// - A later reader within the grace period sees the stale value.
    /// - After the grace period the entry is gone.
    #[test]
    fn test_lookup_extends_stale_entry() {
        let (store, clock) = store(StoreConfig::default());

        store.insert(key("a"), 7, Expiry::after(clock.now(), Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));

        assert!(store.lookup(&key("a"), 1.0, Some(Duration::from_secs(30))).is_none());
        assert_eq!(store.get(&key("a")), Some(7));

        clock.advance(Duration::from_secs(30));
        assert_eq!(store.get(&key("a")), None);
    }

    /// Validates extending a stale entry by an unbounded grace period.
    ///
    /// Assertions:
    /// - `Duration::MAX` does not panic and keeps the stale value indefinitely.
    #[test]
    fn test_lookup_extends_stale_entry_without_bound() {
        let (store, clock) = store(StoreConfig::default());

        store.insert(key("a"), 7, Expiry::after(clock.now(), Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));

        assert!(store.lookup(&key("a"), 1.0, Some(Duration::MAX)).is_none());
        clock.advance(Duration::from_secs(86_400 * 365));
        assert_eq!(store.get(&key("a")), Some(7));
    }

    /// Validates early expiry rolls inside the variance window.
    ///
    /// Assertions:
    /// - A high roll keeps the entry, a low roll expires it.
    #[test]
    fn test_lookup_respects_roll_in_window() {
        let (store, clock) = store(StoreConfig::default());
        let created = clock.now();
        let expiry = Expiry::after(created, Duration::from_secs(100)).with_variance(created, 1.0);

        store.insert(key("a"), 1, expiry);
        clock.advance(Duration::from_secs(50));

        assert!(store.lookup(&key("a"), 0.9, None).is_some());
        assert!(store.lookup(&key("a"), 0.1, None).is_none());
        assert!(!store.contains_key(&key("a")));
    }

    /// Validates LRU eviction order.
    ///
    /// Assertions:
    /// - Reading `a` protects it; `b` is evicted when `c` arrives.
    #[test]
    fn test_lru_eviction() {
        let (store, _) = store(StoreConfig::lru(2));

        store.insert(key("a"), 1, Expiry::never());
        store.insert(key("b"), 2, Expiry::never());
        assert_eq!(store.get(&key("a")), Some(1));
        store.insert(key("c"), 3, Expiry::never());

        assert_eq!(store.len(), 2);
        assert!(store.contains_key(&key("a")));
        assert!(!store.contains_key(&key("b")));
    }

    /// Validates LFU and FIFO eviction.
    ///
    /// Assertions:
    /// - LFU evicts the entry read least often.
    /// - FIFO evicts the first inserted entry even if it was read.
    #[test]
    fn test_lfu_and_fifo_eviction() {
        let lfu_config =
            StoreConfig::builder().max_size(2).eviction_policy(EvictionPolicy::LFU).build();
        let (lfu, _) = store(lfu_config);
        lfu.insert(key("a"), 1, Expiry::never());
        lfu.insert(key("b"), 2, Expiry::never());
        lfu.get(&key("a"));
        lfu.get(&key("a"));
        lfu.get(&key("b"));
        lfu.insert(key("c"), 3, Expiry::never());
        assert!(lfu.contains_key(&key("a")));
        assert!(!lfu.contains_key(&key("b")));

        let fifo_config =
            StoreConfig::builder().max_size(2).eviction_policy(EvictionPolicy::FIFO).build();
        let (fifo, _) = store(fifo_config);
        fifo.insert(key("a"), 1, Expiry::never());
        fifo.insert(key("b"), 2, Expiry::never());
        fifo.get(&key("a"));
        fifo.insert(key("c"), 3, Expiry::never());
        assert!(!fifo.contains_key(&key("a")));
        assert!(fifo.contains_key(&key("b")));
    }

    /// Validates that a full store purges expired entries before evicting.
    ///
    /// Assertions:
    /// - The expired entry goes and the live one survives.
    #[test]
    fn test_full_store_prefers_expired() {
        let (store, clock) = store(StoreConfig::lru(2));

        store.insert(key("live"), 1, Expiry::never());
        store.insert(key("old"), 2, Expiry::after(clock.now(), Duration::from_secs(1)));
        store.get(&key("old"));
        clock.advance(Duration::from_secs(2));
        store.insert(key("new"), 3, Expiry::never());

        assert!(store.contains_key(&key("live")));
        assert!(store.contains_key(&key("new")));
        assert!(!store.contains_key(&key("old")));
    }

    /// Validates random and disabled eviction.
    ///
    /// Assertions:
    /// - Random keeps the size at the bound.
    /// - `None` lets the store grow past `max_size`.
    #[test]
    fn test_random_and_no_eviction() {
        let random_config =
            StoreConfig::builder().max_size(3).eviction_policy(EvictionPolicy::Random).build();
        let (random, _) = store(random_config);
        for i in 0..10 {
            random.insert(format!("k{i}"), i, Expiry::never());
        }
        assert_eq!(random.len(), 3);

        let none_config =
            StoreConfig::builder().max_size(2).eviction_policy(EvictionPolicy::None).build();
        let (unbounded, _) = store(none_config);
        for i in 0..5 {
            unbounded.insert(format!("k{i}"), i, Expiry::never());
        }
        assert_eq!(unbounded.len(), 5);
    }

    /// Validates counters when metrics are enabled.
    ///
    /// Assertions:
    /// - Hits, misses, inserts, expirations and evictions are all counted.
    /// - `clear` resets them.
    #[test]
    fn test_stats_tracking() {
        let config = StoreConfig::builder().max_size(1).track_metrics(true).build();
        let (store, clock) = store(config);

        store.insert(key("a"), 1, Expiry::after(clock.now(), Duration::from_secs(1)));
        store.get(&key("a"));
        store.get(&key("zzz"));
        clock.advance(Duration::from_secs(1));
        store.get(&key("a"));
        store.insert(key("b"), 2, Expiry::never());
        store.insert(key("c"), 3, Expiry::never());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.inserts, 3);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.size, 1);

        store.clear();
        assert_eq!(store.stats(), CacheStats { max_size: Some(1), ..CacheStats::default() });
    }

    /// Validates `purge_expired` and `expire`.
    ///
    /// Assertions:
    /// - Only past-deadline entries are purged.
    /// - `expire` reports whether something was removed.
    #[test]
    fn test_purge_and_expire() {
        let (store, clock) = store(StoreConfig::default());

        store.insert(key("short"), 1, Expiry::after(clock.now(), Duration::from_secs(1)));
        store.insert(key("long"), 2, Expiry::never());
        clock.advance(Duration::from_secs(5));

        assert_eq!(store.purge_expired(), 1);
        assert!(store.expire(&key("long")));
        assert!(!store.expire(&key("long")));
        assert!(store.is_empty());
    }

    /// Validates concurrent inserts and reads from many threads.
    ///
    /// Assertions:
    /// - Confirms every inserted key is readable afterwards.
    #[test]
    fn test_thread_safety() {
        let store: Arc<EntryStore<String, i32>> = Arc::new(EntryStore::new(StoreConfig::default()));
        let mut handles = vec![];

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..50 {
                    store.insert(format!("{i}-{j}"), j, Expiry::never());
                    store.get(&format!("{i}-{j}"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 400);
    }
}
