//! Builds the reference backends from construction options

use std::sync::Arc;

use memora_common::{SharedClock, SystemClock};
use memora_core::{CacheAdapter, CacheError, CacheFactory};
use memora_domain::{CacheOptions, Driver, Eviction};
use tracing::{debug, warn};

use crate::backends::{ConcurrentCache, MemoryCache, NullCache};

/// [`CacheFactory`] for the `memory`, `concurrent` and `null` drivers
///
/// Without a driver the in-process memory backend is built.
#[derive(Clone)]
pub struct DefaultCacheFactory {
    clock: SharedClock,
}

impl DefaultCacheFactory {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Backends built by this factory measure expiry on `clock`
    pub fn with_clock(clock: SharedClock) -> Self {
        Self { clock }
    }
}

impl Default for DefaultCacheFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheFactory for DefaultCacheFactory {
    fn build(&self, options: &CacheOptions) -> Result<Arc<dyn CacheAdapter>, CacheError> {
        let driver = options.driver_or_default();
        if options.max_size.is_some() && options.eviction == Eviction::None && driver == Driver::Memory
        {
            return Err(CacheError::construction(
                driver.as_str(),
                "max_size needs an eviction policy other than none",
            ));
        }

        debug!(
            driver = %driver,
            namespace = options.namespace.as_deref().unwrap_or_default(),
            global = options.global,
            max_size = ?options.max_size,
            "building cache backend"
        );

        let cache: Arc<dyn CacheAdapter> = match driver {
            Driver::Memory => Arc::new(MemoryCache::new(options, Arc::clone(&self.clock))),
            Driver::Concurrent => {
                if options.eviction != Eviction::Lru {
                    warn!(eviction = ?options.eviction, "concurrent backend ignores the eviction policy");
                }
                Arc::new(ConcurrentCache::new(options, Arc::clone(&self.clock)))
            }
            Driver::Null => {
                Arc::new(NullCache::new(options.namespace.clone().unwrap_or_default()))
            }
        };
        Ok(cache)
    }
}

impl std::fmt::Debug for DefaultCacheFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCacheFactory").finish_non_exhaustive()
    }
}
