//! A backend that stores nothing

use memora_core::{CacheAdapter, CacheError, CallResult, Producer};
use memora_domain::{CacheKey, CallOptions};

/// Runs the producer on every call; useful to switch caching off by
/// configuration
#[derive(Debug, Clone)]
pub struct NullCache {
    namespace: String,
}

impl NullCache {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }
}

impl CacheAdapter for NullCache {
    fn compute_or_fetch(&self, _key: &CacheKey, _options: &CallOptions, producer: Producer<'_>) -> CallResult {
        producer()
    }

    fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn backend(&self) -> &'static str {
        "null"
    }
}
