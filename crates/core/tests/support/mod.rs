//! Shared test helpers for `memora-core` integration tests.
//!
//! In-memory mocks for the cache ports so lifecycle tests can focus on
//! behaviour instead of backends.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use memora_core::{CacheAdapter, CacheError, CacheFactory, CallResult, Function, Producer};
use memora_domain::{CacheKey, CacheOptions, CallOptions, ReturnValue};
use parking_lot::Mutex;
use serde_json::json;

/// In-memory mock for `CacheAdapter`.
///
/// Serializes the whole compute-or-fetch so identical concurrent calls run
/// the producer once.
#[derive(Debug, Default)]
pub struct MockCache {
    namespace: String,
    entries: Mutex<HashMap<String, ReturnValue>>,
    clears: AtomicUsize,
}

impl MockCache {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), ..Self::default() }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CacheAdapter for MockCache {
    fn compute_or_fetch(&self, key: &CacheKey, _: &CallOptions, producer: Producer<'_>) -> CallResult {
        let mut entries = self.entries.lock();
        if let Some(value) = entries.get(key.encode()) {
            return Ok(value.clone());
        }
        let value = producer()?;
        entries.insert(key.encode().to_string(), value.clone());
        Ok(value)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

/// Mock factory keeping every cache it built, by namespace.
#[derive(Debug, Default)]
pub struct MockFactory {
    caches: Mutex<Vec<Arc<MockCache>>>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The most recent cache built for `namespace`.
    pub fn cache(&self, namespace: &str) -> Option<Arc<MockCache>> {
        self.caches.lock().iter().rev().find(|c| c.namespace() == namespace).cloned()
    }

    pub fn built(&self) -> usize {
        self.caches.lock().len()
    }
}

impl CacheFactory for MockFactory {
    fn build(&self, options: &CacheOptions) -> Result<Arc<dyn CacheAdapter>, CacheError> {
        let cache = Arc::new(MockCache::new(options.namespace.clone().unwrap_or_default()));
        self.caches.lock().push(Arc::clone(&cache));
        Ok(cache)
    }
}

/// A scalar function summing integer arguments, plus its call counter.
pub fn counted_sum() -> (Function, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sum = Function::scalar(move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(json!(args.iter().filter_map(|v| v.as_i64()).sum::<i64>()))
    });
    (sum, calls)
}
