//! Test doubles for the cache ports
//!
//! Available to this crate's tests and, with the `test-utils` feature, to
//! other crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use memora_common::CacheStats;
use memora_domain::{CacheKey, CacheOptions, CallOptions, ReturnValue};
use parking_lot::Mutex;
use serde_json::json;

use crate::cache::ports::{CacheAdapter, CacheFactory, Producer};
use crate::errors::{CacheError, CallResult};
use crate::function::Function;

/// A plain map cache that records what it was asked to do
///
/// Entries never expire; `expire_if` is honoured so lifecycle tests can
/// force recomputation.
#[derive(Debug, Default)]
pub struct RecordingCache {
    namespace: String,
    entries: Mutex<HashMap<String, ReturnValue>>,
    computations: AtomicUsize,
    clears: AtomicUsize,
    last_expires_in: Mutex<Option<Duration>>,
    clear_unsupported: bool,
}

impl RecordingCache {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), ..Self::default() }
    }

    /// A cache whose `clear` fails with `ClearUnsupported`
    pub fn without_clear(namespace: impl Into<String>) -> Self {
        Self { clear_unsupported: true, ..Self::new(namespace) }
    }

    /// Number of producer runs
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    /// Number of successful clears
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// `expires_in` seen on the most recent call
    pub fn last_expires_in(&self) -> Option<Duration> {
        *self.last_expires_in.lock()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheAdapter for RecordingCache {
    fn compute_or_fetch(
        &self,
        key: &CacheKey,
        options: &CallOptions,
        producer: Producer<'_>,
    ) -> CallResult {
        *self.last_expires_in.lock() = options.expires_in;

        if let Some(value) = self.entries.lock().get(key.encode()).cloned() {
            let stale = options.expire_if.as_ref().is_some_and(|predicate| {
                let now = std::time::Instant::now();
                predicate(&memora_domain::EntryInfo {
                    created_at: now,
                    expires_at: None,
                    checked_at: now,
                })
            });
            if !stale {
                return Ok(value);
            }
        }

        self.computations.fetch_add(1, Ordering::SeqCst);
        let value = producer()?;
        self.entries.lock().insert(key.encode().to_string(), value.clone());
        Ok(value)
    }

    fn clear(&self) -> Result<(), CacheError> {
        if self.clear_unsupported {
            return Err(CacheError::ClearUnsupported { backend: self.backend().to_string() });
        }
        self.entries.lock().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn backend(&self) -> &'static str {
        "recording"
    }

    fn stats(&self) -> Option<CacheStats> {
        Some(CacheStats { size: self.len(), ..CacheStats::default() })
    }
}

/// A cache whose backend is always down
#[derive(Debug, Default)]
pub struct FailingCache;

impl FailingCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheAdapter for FailingCache {
    fn compute_or_fetch(&self, _: &CacheKey, _: &CallOptions, _: Producer<'_>) -> CallResult {
        Err(CacheError::unavailable(self.backend(), "connection refused").into())
    }

    fn clear(&self) -> Result<(), CacheError> {
        Err(CacheError::ClearUnsupported { backend: self.backend().to_string() })
    }

    fn namespace(&self) -> &str {
        "failing"
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// Factory handing out [`RecordingCache`]s and remembering the options
#[derive(Debug, Default)]
pub struct StaticFactory {
    built: Mutex<Vec<CacheOptions>>,
    caches: Mutex<Vec<Arc<RecordingCache>>>,
    refuse: Option<String>,
}

impl StaticFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose every build fails with `Construction`
    pub fn refusing(message: impl Into<String>) -> Self {
        Self { refuse: Some(message.into()), ..Self::default() }
    }

    /// Options of every build, in order
    pub fn built(&self) -> Vec<CacheOptions> {
        self.built.lock().clone()
    }

    /// Caches built so far, in order
    pub fn caches(&self) -> Vec<Arc<RecordingCache>> {
        self.caches.lock().clone()
    }
}

impl CacheFactory for StaticFactory {
    fn build(&self, options: &CacheOptions) -> Result<Arc<dyn CacheAdapter>, CacheError> {
        if let Some(message) = &self.refuse {
            return Err(CacheError::construction(options.driver_or_default().as_str(), message));
        }
        self.built.lock().push(options.clone());
        let cache = Arc::new(RecordingCache::new(options.namespace.clone().unwrap_or_default()));
        self.caches.lock().push(Arc::clone(&cache));
        Ok(cache)
    }
}

/// An integer-summing function and a counter of its invocations
pub fn counting_add() -> (Function, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let add = Function::scalar(move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(json!(args.iter().filter_map(|v| v.as_i64()).sum::<i64>()))
    });
    (add, count)
}
