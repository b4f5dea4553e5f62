//! Entry store configuration and builder

/// Eviction policy for entries when capacity is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Least Recently Used - evicts the least recently read or written entry
    #[default]
    LRU,
    /// Least Frequently Used - evicts the entry with the fewest reads
    LFU,
    /// First In First Out - evicts the oldest entry by insertion time
    FIFO,
    /// Random eviction
    Random,
    /// No automatic eviction; `max_size` is not enforced
    None,
}

/// Configuration for an [`EntryStore`](super::EntryStore)
///
/// Expiry is chosen per entry by the caller; the store only bounds size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreConfig {
    /// Maximum number of entries (None = unlimited)
    pub max_size: Option<usize>,

    /// Eviction policy when max_size is reached
    pub eviction_policy: EvictionPolicy,

    /// Whether to collect hit/miss counters
    pub track_metrics: bool,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Quick preset for a bounded LRU store
    ///
    /// ```
    /// use memora_common::cache::{EvictionPolicy, StoreConfig};
    ///
    /// let config = StoreConfig::lru(1000);
    /// assert_eq!(config.eviction_policy, EvictionPolicy::LRU);
    /// ```
    pub fn lru(max_size: usize) -> Self {
        Self { max_size: Some(max_size), eviction_policy: EvictionPolicy::LRU, ..Self::default() }
    }
}

/// Builder for [`StoreConfig`] with fluent API
///
/// ```
/// use memora_common::cache::{EvictionPolicy, StoreConfig};
///
/// let config = StoreConfig::builder()
///     .max_size(500)
///     .eviction_policy(EvictionPolicy::LFU)
///     .track_metrics(true)
///     .build();
/// assert_eq!(config.max_size, Some(500));
/// ```
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set maximum number of entries
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.max_size = Some(size);
        self
    }

    /// Set eviction policy
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    /// Enable or disable metrics tracking
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        self.config
    }
}
