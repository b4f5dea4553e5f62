//! # Memora Core
//!
//! The memoization control layer - no storage of its own.
//!
//! This crate contains:
//! - Port interfaces for cache backends ([`CacheAdapter`], [`CacheFactory`])
//! - Function values, the name-to-function table and identity resolution
//! - The registry of memoized functions
//! - Key building, the caching wrapper and the [`Memoizer`] lifecycle
//!
//! ## Architecture Principles
//! - Depends only on `memora-common` and `memora-domain`
//! - Backends live behind traits; this crate never names one
//! - Administrative operations are all-or-nothing
//!
//! Ready-made backends and a process-wide handle live in `memora-infra`.

pub mod cache;
pub mod errors;
pub mod function;
pub mod memoize;
pub mod registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use cache::ports::{CacheAdapter, CacheFactory, Producer};
pub use errors::{CacheError, CallError, CallResult, MemoizeError};
pub use function::{Function, FunctionTable, ResolvedFunction, Target};
pub use memoize::{split_options, KeyBuilder, KeyExtractor, MemoizeOptions, Memoizer};
pub use registry::{FunctionRegistry, MemoInfo};
