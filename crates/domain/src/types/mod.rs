//! Domain types and models

pub mod context;
pub mod function_id;
pub mod key;
pub mod options;

pub use context::{CallContext, ReturnValue};
pub use function_id::{qualify_name, FunctionId};
pub use key::{CacheKey, KeyParts};
pub use options::{CacheOptions, CallOptions, Driver, EntryInfo, Eviction, ExpirePredicate};
