//! In-process memory backend
//!
//! Entries live in an [`EntryStore`]. With `global = true` (the default)
//! every cache built for the same namespace shares one process-wide store,
//! so independently built caches see each other's entries. The first cache
//! built for a namespace fixes that store's capacity, eviction policy and
//! clock.
//!
//! Supports every per-call option:
//! - `expires_at` beats `expires_in` beats `default_expires_in`
//! - `expires_variance` opens a probabilistic early-expiry window
//! - `busy_lock` keeps serving a stale entry to others while one caller
//!   recomputes
//! - `expire_if` is evaluated on every hit
//!
//! A process-wide store is released once the last cache sharing it is
//! dropped.
//!
//! Concurrent identical misses may each run the producer; use the
//! concurrent backend when that matters.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use memora_common::cache::{EntryStore, EvictionPolicy, Expiry, StoreConfig};
use memora_common::{CacheStats, Clock, SharedClock};
use memora_core::{CacheAdapter, CacheError, CallResult, Producer};
use memora_domain::{CacheKey, CacheOptions, CallOptions, EntryInfo, Eviction, ReturnValue};
use once_cell::sync::Lazy;
use tracing::{debug, trace};

use super::key::storage_key;

type Store = EntryStore<String, ReturnValue, SharedClock>;

static GLOBAL_STORES: Lazy<DashMap<String, Arc<Store>>> = Lazy::new(DashMap::new);

/// Namespaces that currently have a process-wide store, sorted
pub fn global_namespaces() -> Vec<String> {
    let mut namespaces: Vec<String> = GLOBAL_STORES.iter().map(|e| e.key().clone()).collect();
    namespaces.sort();
    namespaces
}

fn eviction_policy(eviction: Eviction) -> EvictionPolicy {
    match eviction {
        Eviction::Lru => EvictionPolicy::LRU,
        Eviction::Lfu => EvictionPolicy::LFU,
        Eviction::Fifo => EvictionPolicy::FIFO,
        Eviction::Random => EvictionPolicy::Random,
        Eviction::None => EvictionPolicy::None,
    }
}

fn store_config(options: &CacheOptions) -> StoreConfig {
    let mut builder = StoreConfig::builder()
        .eviction_policy(eviction_policy(options.eviction))
        .track_metrics(options.track_metrics);
    if let Some(max_size) = options.max_size {
        builder = builder.max_size(max_size);
    }
    builder.build()
}

/// Memory-backed [`CacheAdapter`]
#[derive(Debug)]
pub struct MemoryCache {
    namespace: String,
    store: Arc<Store>,
    default_ttl: Option<Duration>,
    max_key_length: Option<usize>,
    global: bool,
}

impl MemoryCache {
    /// Build a cache; `namespace` defaults to `"default"`
    pub fn new(options: &CacheOptions, clock: SharedClock) -> Self {
        let namespace = options.namespace.clone().unwrap_or_else(|| "default".to_string());
        let store = if options.global {
            GLOBAL_STORES
                .entry(namespace.clone())
                .or_insert_with(|| {
                    debug!(namespace = %namespace, "created global memory store");
                    Arc::new(Store::with_clock(store_config(options), clock))
                })
                .clone()
        } else {
            Arc::new(Store::with_clock(store_config(options), clock))
        };

        Self {
            namespace,
            store,
            default_ttl: options.default_expires_in,
            max_key_length: options.max_key_length,
            global: options.global,
        }
    }

    /// Whether this cache shares its namespace's process-wide store
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn expiry_for(&self, options: &CallOptions) -> Expiry {
        let now = self.store.now();
        let expiry = if let Some(deadline) = options.expires_at {
            self.store.clock().instant_for(deadline).map_or(Expiry::never(), Expiry::at)
        } else if let Some(ttl) = options.expires_in.or(self.default_ttl) {
            Expiry::after(now, ttl)
        } else {
            Expiry::never()
        };
        match options.expires_variance {
            Some(variance) => expiry.with_variance(now, variance),
            None => expiry,
        }
    }
}

impl Drop for MemoryCache {
    fn drop(&mut self) {
        if !self.global {
            return;
        }
        // Registry plus this cache hold the last two references
        let released = GLOBAL_STORES
            .remove_if(&self.namespace, |_, store| {
                Arc::ptr_eq(store, &self.store) && Arc::strong_count(store) <= 2
            })
            .is_some();
        if released {
            debug!(namespace = %self.namespace, "released global memory store");
        }
    }
}

impl CacheAdapter for MemoryCache {
    fn compute_or_fetch(
        &self,
        key: &CacheKey,
        options: &CallOptions,
        producer: Producer<'_>,
    ) -> CallResult {
        let storage_key = storage_key(key, self.max_key_length);
        let roll: f64 = rand::random();

        if let Some(entry) = self.store.lookup(&storage_key, roll, options.busy_lock) {
            let forced = options.expire_if.as_ref().is_some_and(|expire_if| {
                expire_if(&EntryInfo {
                    created_at: entry.created_at,
                    expires_at: entry.expiry.expires_at,
                    checked_at: self.store.now(),
                })
            });
            if !forced {
                trace!(namespace = %self.namespace, key = %storage_key, "cache hit");
                return Ok(entry.value);
            }
            trace!(namespace = %self.namespace, key = %storage_key, "expire_if forced recompute");
            self.store.expire(&storage_key);
        } else {
            trace!(namespace = %self.namespace, key = %storage_key, "cache miss");
        }

        let value = producer()?;
        self.store.insert(storage_key, value.clone(), self.expiry_for(options));
        Ok(value)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.store.clear();
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    fn stats(&self) -> Option<CacheStats> {
        Some(self.store.stats())
    }
}
