//! # Memora Domain
//!
//! Pure data types for the memoization layer.
//!
//! This crate contains:
//! - Function identifiers, calling context and return values
//! - Key parts and the canonical cache key encoding
//! - Typed per-call and cache-construction options, and untyped option sets
//! - The configuration file model
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other Memora crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
