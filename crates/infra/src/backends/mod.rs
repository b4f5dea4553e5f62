//! Reference cache backends
//!
//! | Driver       | Storage                         | Identical concurrent misses |
//! |--------------|---------------------------------|-----------------------------|
//! | `memory`     | `EntryStore`, shared per namespace | may each compute         |
//! | `concurrent` | `moka::sync::Cache`             | computed once               |
//! | `null`       | none                            | each compute                |

mod concurrent;
mod key;
mod memory;
mod null;

pub use concurrent::ConcurrentCache;
pub use key::storage_key;
pub use memory::{global_namespaces, MemoryCache};
pub use null::NullCache;
