//! The caching function installed in place of the original

use std::sync::Arc;

use memora_domain::CallOptions;
use tracing::trace;

use super::key_builder::{KeyBuilder, KeyExtractor};
use crate::cache::ports::CacheAdapter;
use crate::errors::CallError;
use crate::function::Function;

/// Build a function that answers from `cache`, falling back to `original`
///
/// Each call keys on `[key_prefix, context, ...parts]` and forwards
/// `options` to the cache untouched. A scalar produced for a list caller is
/// stored as a one-element list; a list produced for a scalar caller fails
/// with [`CallError::ShapeMismatch`] and is not stored.
pub(crate) fn build_wrapper(
    original: Function,
    cache: Arc<dyn CacheAdapter>,
    key_prefix: String,
    options: CallOptions,
    extractor: Option<KeyExtractor>,
) -> Function {
    Function::new(move |context, args| {
        let key = KeyBuilder::build(&key_prefix, context, args, extractor.as_ref())
            .map_err(CallError::KeyEncoding)?;
        trace!(key = %key, backend = cache.backend(), "memoized call");

        let original = &original;
        cache.compute_or_fetch(
            &key,
            &options,
            Box::new(move || {
                original.call(context, args)?.conform(context).ok_or(CallError::ShapeMismatch)
            }),
        )
    })
}
