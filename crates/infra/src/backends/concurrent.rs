//! Concurrent backend on `moka`
//!
//! Concurrent misses on one key are coalesced: exactly one caller runs the
//! producer and the others wait for its result. Entries expire per entry
//! (`expires_at`, `expires_in`, `default_expires_in`) and are also checked
//! against the injected clock on every hit, so expiry follows a mock clock
//! in tests. `max_size` bounds the entry count with moka's own admission
//! policy; the `eviction` option is ignored. `busy_lock` and
//! `expires_variance` are accepted and ignored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use memora_common::{CacheStats, Clock, SharedClock};
use memora_core::{CacheAdapter, CacheError, CallResult, Producer};
use memora_domain::{CacheKey, CacheOptions, CallOptions, EntryInfo, ReturnValue};
use moka::sync::Cache;
use tracing::trace;

use super::key::storage_key;

/// Longest lifetime handed to moka; longer ones rely on the clock check alone
const MAX_EVICTION_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct Stamped {
    value: ReturnValue,
    created_at: Instant,
    expires_at: Option<Instant>,
    ttl: Option<Duration>,
}

impl Stamped {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

struct StampedExpiry;

impl moka::Expiry<String, Stamped> for StampedExpiry {
    fn expire_after_create(&self, _key: &String, value: &Stamped, _created_at: Instant) -> Option<Duration> {
        value.ttl
    }
}

/// Moka-backed [`CacheAdapter`] with coalesced computation
pub struct ConcurrentCache {
    namespace: String,
    entries: Cache<String, Stamped>,
    clock: SharedClock,
    default_ttl: Option<Duration>,
    max_size: Option<usize>,
    max_key_length: Option<usize>,
}

impl ConcurrentCache {
    pub fn new(options: &CacheOptions, clock: SharedClock) -> Self {
        let mut builder = Cache::builder().expire_after(StampedExpiry);
        if let Some(max_size) = options.max_size {
            builder = builder.max_capacity(max_size as u64);
        }

        Self {
            namespace: options.namespace.clone().unwrap_or_else(|| "default".to_string()),
            entries: builder.build(),
            clock,
            default_ttl: options.default_expires_in,
            max_size: options.max_size,
            max_key_length: options.max_key_length,
        }
    }

    /// Entry count after pending maintenance has run
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stamp(&self, value: ReturnValue, options: &CallOptions) -> Stamped {
        let now = self.clock.now();
        // Unrepresentable deadlines mean the entry never expires
        let expires_at = match options.expires_at {
            Some(deadline) => self.clock.instant_for(deadline),
            None => options.expires_in.or(self.default_ttl).and_then(|ttl| now.checked_add(ttl)),
        };
        Stamped {
            value,
            created_at: now,
            expires_at,
            ttl: expires_at
                .map(|deadline| deadline.saturating_duration_since(now))
                .filter(|ttl| *ttl <= MAX_EVICTION_TTL),
        }
    }

    fn usable(&self, stamped: &Stamped, options: &CallOptions) -> bool {
        let now = self.clock.now();
        if !stamped.is_live(now) {
            return false;
        }
        !options.expire_if.as_ref().is_some_and(|expire_if| {
            expire_if(&EntryInfo {
                created_at: stamped.created_at,
                expires_at: stamped.expires_at,
                checked_at: now,
            })
        })
    }
}

impl CacheAdapter for ConcurrentCache {
    fn compute_or_fetch(
        &self,
        key: &CacheKey,
        options: &CallOptions,
        producer: Producer<'_>,
    ) -> CallResult {
        let storage_key = storage_key(key, self.max_key_length);

        if let Some(stamped) = self.entries.get(&storage_key) {
            if self.usable(&stamped, options) {
                trace!(namespace = %self.namespace, key = %storage_key, "cache hit");
                return Ok(stamped.value);
            }
            self.entries.invalidate(&storage_key);
        }

        trace!(namespace = %self.namespace, key = %storage_key, "cache miss");
        self.entries
            .try_get_with(storage_key, || producer().map(|value| self.stamp(value, options)))
            .map(|stamped| stamped.value)
            .map_err(|err: Arc<memora_core::CallError>| (*err).clone())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.invalidate_all();
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn backend(&self) -> &'static str {
        "concurrent"
    }

    fn stats(&self) -> Option<CacheStats> {
        Some(CacheStats { size: self.len(), max_size: self.max_size, ..CacheStats::default() })
    }
}

impl std::fmt::Debug for ConcurrentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentCache")
            .field("namespace", &self.namespace)
            .field("entries", &self.entries.entry_count())
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for backends::concurrent.
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    use memora_common::MockClock;
    use memora_core::CallError;
    use memora_domain::CallContext;
    use serde_json::json;

    use super::*;

    fn key(n: i64) -> CacheKey {
        CacheKey::new("memoize::main::g", CallContext::Scalar, vec![json!(n)]).unwrap()
    }

    fn counted(cache: &ConcurrentCache, options: &CallOptions, runs: &AtomicUsize) -> ReturnValue {
        cache
            .compute_or_fetch(
                &key(1),
                options,
                Box::new(|| Ok(ReturnValue::Scalar(json!(runs.fetch_add(1, Ordering::SeqCst) + 1)))),
            )
            .unwrap()
    }

    /// Validates expiry against the injected clock.
    ///
    /// Assertions:
    /// - Entries are reused before the deadline and recomputed after it.
    #[test]
    fn test_expires_in_with_mock_clock() {
        let clock = MockClock::new();
        let cache = ConcurrentCache::new(&CacheOptions::default(), clock.shared());
        let runs = AtomicUsize::new(0);
        let options = CallOptions { expires_in: Some(Duration::from_secs(60)), ..Default::default() };

        counted(&cache, &options, &runs);
        clock.advance(Duration::from_secs(59));
        counted(&cache, &options, &runs);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(counted(&cache, &options, &runs), ReturnValue::Scalar(json!(2)));
    }

    /// Validates lifetimes beyond what the monotonic clock can represent.
    ///
    /// Assertions:
    /// - `expires_in(Duration::MAX)` stores the value without panicking.
    /// - Far lifetimes stay live and are not handed to moka.
    #[test]
    fn test_unbounded_lifetimes() {
        let clock = MockClock::new();
        let cache = ConcurrentCache::new(&CacheOptions::default(), clock.shared());
        let runs = AtomicUsize::new(0);
        let forever = CallOptions { expires_in: Some(Duration::MAX), ..Default::default() };

        counted(&cache, &forever, &runs);
        clock.advance(Duration::from_secs(86_400 * 365));
        assert_eq!(counted(&cache, &forever, &runs), ReturnValue::Scalar(json!(1)));

        let stamped = cache.stamp(ReturnValue::Scalar(json!(0)), &forever);
        assert_eq!(stamped.expires_at, None);
        assert!(stamped.is_live(clock.now()));

        let far = CallOptions {
            expires_in: Some(Duration::from_secs(u64::MAX / 4)),
            ..Default::default()
        };
        assert_eq!(cache.stamp(ReturnValue::Scalar(json!(0)), &far).ttl, None);
    }

    /// Validates `expire_if` on the concurrent backend.
    #[test]
    fn test_expire_if() {
        let cache = ConcurrentCache::new(&CacheOptions::default(), MockClock::new().shared());
        let runs = AtomicUsize::new(0);
        let always = CallOptions {
            expire_if: Some(Arc::new(|_: &EntryInfo| true)),
            ..Default::default()
        };

        counted(&cache, &always, &runs);
        counted(&cache, &always, &runs);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    /// Validates coalescing of contended identical calls.
    ///
    /// Assertions:
    /// - Eight threads racing on one key run the producer once.
    #[test]
    fn test_contended_calls_run_producer_once() {
        let cache = Arc::new(ConcurrentCache::new(&CacheOptions::default(), MockClock::new().shared()));
        let runs = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let runs = Arc::clone(&runs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .compute_or_fetch(
                            &key(5),
                            &CallOptions::default(),
                            Box::new(|| {
                                runs.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(50));
                                Ok(ReturnValue::Scalar(json!("slow")))
                            }),
                        )
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), ReturnValue::Scalar(json!("slow")));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    /// Validates producer errors.
    ///
    /// Assertions:
    /// - The error comes back unchanged and nothing is stored.
    #[test]
    fn test_producer_error_not_stored() {
        let cache = ConcurrentCache::new(&CacheOptions::default(), MockClock::new().shared());

        let err = cache
            .compute_or_fetch(
                &key(1),
                &CallOptions::default(),
                Box::new(|| Err(CallError::function("bad input"))),
            )
            .unwrap_err();
        assert_eq!(err, CallError::function("bad input"));
        assert!(cache.is_empty());
    }

    /// Validates that clear forces recomputation.
    #[test]
    fn test_clear() {
        let cache = ConcurrentCache::new(&CacheOptions::default(), MockClock::new().shared());
        let runs = AtomicUsize::new(0);
        counted(&cache, &CallOptions::default(), &runs);
        assert_eq!(cache.len(), 1);

        cache.clear().unwrap();
        counted(&cache, &CallOptions::default(), &runs);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
