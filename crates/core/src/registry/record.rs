//! The record kept for each memoized function

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use memora_domain::{CallOptions, FunctionId};

use crate::cache::ports::CacheAdapter;
use crate::function::Function;

/// Everything memoize set up for one function; never changes afterwards
#[derive(Clone)]
pub struct MemoInfo {
    id: FunctionId,
    name: Option<String>,
    original: Function,
    wrapper: Function,
    cache: Arc<dyn CacheAdapter>,
    key_prefix: String,
    call_options: CallOptions,
    memoized_at: SystemTime,
}

impl MemoInfo {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: FunctionId,
        name: Option<String>,
        original: Function,
        wrapper: Function,
        cache: Arc<dyn CacheAdapter>,
        key_prefix: String,
        call_options: CallOptions,
        memoized_at: SystemTime,
    ) -> Self {
        Self { id, name, original, wrapper, cache, key_prefix, call_options, memoized_at }
    }

    pub fn id(&self) -> &FunctionId {
        &self.id
    }

    /// Fully qualified name, for named functions
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The function as it was before memoization
    pub fn original(&self) -> &Function {
        &self.original
    }

    /// The caching function installed in its place
    pub fn wrapper(&self) -> &Function {
        &self.wrapper
    }

    pub fn cache(&self) -> &Arc<dyn CacheAdapter> {
        &self.cache
    }

    /// Prefix mixed into every key of this function
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Options forwarded on every compute-or-fetch
    pub fn call_options(&self) -> &CallOptions {
        &self.call_options
    }

    pub fn memoized_at(&self) -> SystemTime {
        self.memoized_at
    }
}

impl fmt::Debug for MemoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoInfo")
            .field("id", &self.id)
            .field("original", &self.original)
            .field("wrapper", &self.wrapper)
            .field("backend", &self.cache.backend())
            .field("namespace", &self.cache.namespace())
            .field("key_prefix", &self.key_prefix)
            .field("call_options", &self.call_options)
            .finish_non_exhaustive()
    }
}
