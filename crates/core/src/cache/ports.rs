//! Ports for cache backends
//!
//! The core only ever talks to a cache through [`CacheAdapter`]; backends are
//! built from construction options by a [`CacheFactory`] supplied when the
//! [`Memoizer`](crate::Memoizer) is created.

use std::sync::Arc;

use memora_common::CacheStats;
use memora_domain::{CacheKey, CacheOptions, CallOptions};

use crate::errors::{CacheError, CallResult};

/// Computes a fresh value on a miss
///
/// It borrows the call's arguments, so it only lives for one
/// compute-or-fetch call.
pub type Producer<'a> = Box<dyn FnOnce() -> CallResult + 'a>;

/// A cache with compute-or-fetch and clear
///
/// Implementations decide whether concurrent misses on one key may run the
/// producer more than once. Callers must not assume at-most-one unless the
/// backend documents it.
pub trait CacheAdapter: Send + Sync {
    /// Return the live value stored under `key`, or run `producer` once,
    /// store its result and return it
    ///
    /// `options` govern expiry of the stored value and how an existing
    /// value is judged. Producer errors are returned unchanged and nothing
    /// is stored.
    fn compute_or_fetch(
        &self,
        key: &CacheKey,
        options: &CallOptions,
        producer: Producer<'_>,
    ) -> CallResult;

    /// Drop every entry in this cache's namespace
    fn clear(&self) -> Result<(), CacheError>;

    /// Isolation scope of this cache
    fn namespace(&self) -> &str;

    /// Short backend name used in logs
    fn backend(&self) -> &'static str;

    /// Statistics, for backends that collect them
    fn stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Builds cache backends from construction options
pub trait CacheFactory: Send + Sync {
    /// Build a backend; `options.namespace` is always set by the caller
    fn build(&self, options: &CacheOptions) -> Result<Arc<dyn CacheAdapter>, CacheError>;
}
