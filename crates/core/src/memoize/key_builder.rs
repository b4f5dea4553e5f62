//! Cache key derivation

use std::sync::Arc;

use memora_domain::{CacheKey, CallContext, DomainError, KeyParts};
use serde_json::Value;

/// Caller-supplied mapping from arguments to key parts
pub type KeyExtractor = Arc<dyn Fn(&[Value]) -> KeyParts + Send + Sync>;

/// Builds `[prefix, context_tag, ...parts]` keys
pub struct KeyBuilder;

impl KeyBuilder {
    /// Derive the key for one call
    ///
    /// Without an extractor the raw arguments are the parts, verbatim.
    ///
    /// ```
    /// use memora_core::KeyBuilder;
    /// use memora_domain::CallContext;
    /// use serde_json::json;
    ///
    /// let key = KeyBuilder::build("memoize::main::add", CallContext::Scalar, &[json!(2), json!(3)], None)
    ///     .unwrap();
    /// assert_eq!(key.encode(), r#"["memoize::main::add","S",2,3]"#);
    /// ```
    pub fn build(
        prefix: &str,
        context: CallContext,
        args: &[Value],
        extractor: Option<&KeyExtractor>,
    ) -> Result<CacheKey, DomainError> {
        let parts = match extractor {
            Some(extract) => extract(args).into_parts(),
            None => args.to_vec(),
        };
        CacheKey::new(prefix, context, parts)
    }
}
