//! Expiring entry store with configurable eviction policies
//!
//! The store backs in-process memo caches: every entry carries its own
//! [`Expiry`], lookups can open a probabilistic early-expiry window, and a
//! bounded store evicts by LRU, LFU, FIFO or random choice.
//!
//! # Examples
//!
//! ## Bounded LRU store
//! ```
//! use memora_common::cache::{EntryStore, Expiry, StoreConfig};
//!
//! let store: EntryStore<String, i32> = EntryStore::new(StoreConfig::lru(100));
//! store.insert("key".to_string(), 42, Expiry::never());
//! assert_eq!(store.get(&"key".to_string()), Some(42));
//! ```
//!
//! ## Statistics
//! ```
//! use memora_common::cache::{EntryStore, Expiry, StoreConfig};
//!
//! let config = StoreConfig::builder().max_size(100).track_metrics(true).build();
//! let store: EntryStore<String, i32> = EntryStore::new(config);
//!
//! store.insert("key1".to_string(), 1, Expiry::never());
//! let _ = store.get(&"key1".to_string());
//!
//! let stats = store.stats();
//! assert_eq!(stats.hits, 1);
//! assert_eq!(stats.size, 1);
//! ```
//!
//! # Eviction Policies
//!
//! - **LRU**: evicts the entry touched longest ago
//! - **LFU**: evicts the entry with the fewest reads
//! - **FIFO**: evicts the oldest insertion
//! - **Random**: evicts a random entry
//! - **None**: no eviction, `max_size` is advisory only
//!
//! Expired entries are always purged before a policy victim is chosen.

mod config;
mod expiry;
mod stats;
mod store;

pub use config::{EvictionPolicy, StoreConfig, StoreConfigBuilder};
pub use expiry::Expiry;
pub use stats::CacheStats;
pub use store::{Entry, EntryStore};
