//! # Memora Infrastructure
//!
//! Infrastructure implementations of the memoization ports.
//!
//! This crate contains:
//! - Reference cache backends (`memory`, `concurrent`, `null`)
//! - The default cache factory selecting a backend by driver
//! - Configuration loading from environment variables and files
//! - A process-wide memoizer
//!
//! ## Architecture
//! - Implements traits defined in `memora-core`
//! - Depends on `memora-common`, `memora-domain` and `memora-core`
//! - Contains all code touching process state (environment, files, globals)

pub mod backends;
pub mod config;
pub mod errors;
pub mod factory;
pub mod global;

use std::sync::Arc;

use memora_core::Memoizer;
use memora_domain::MemoizeConfig;

// Re-export commonly used items
pub use backends::{global_namespaces, storage_key, ConcurrentCache, MemoryCache, NullCache};
pub use errors::{InfraError, InfraResult};
pub use factory::DefaultCacheFactory;

/// A memoizer building caches with [`DefaultCacheFactory`]
///
/// ```
/// use memora_core::{Function, MemoizeOptions};
/// use serde_json::json;
///
/// let memoizer = memora_infra::memoizer();
/// memoizer
///     .define("add", Function::scalar(|args| {
///         Ok(json!(args.iter().filter_map(|a| a.as_i64()).sum::<i64>()))
///     }))
///     .unwrap();
/// memoizer.memoize("add", MemoizeOptions::default()).unwrap();
///
/// assert_eq!(memoizer.call_scalar("add", &[json!(2), json!(3)]).unwrap(), json!(5));
/// assert!(memoizer.memoized("add").is_some());
/// ```
pub fn memoizer() -> Memoizer {
    Memoizer::new(Arc::new(DefaultCacheFactory::new()))
}

/// A memoizer building caches with [`DefaultCacheFactory`] and applying
/// `config` to [`Memoizer::memoize_configured`]
///
/// # Errors
/// Returns an error if the configuration names unknown options.
pub fn memoizer_with_config(config: MemoizeConfig) -> InfraResult<Memoizer> {
    Ok(Memoizer::with_config(Arc::new(DefaultCacheFactory::new()), config)?)
}
