//! Registry of memoized functions

mod record;
mod store;

pub use record::MemoInfo;
pub use store::FunctionRegistry;
