//! Memoization: key building, option handling, the wrapper and the
//! lifecycle controller

mod key_builder;
mod options;
mod service;
mod wrapper;

pub use key_builder::{KeyBuilder, KeyExtractor};
pub use options::{split_options, MemoizeOptions};
pub use service::Memoizer;
