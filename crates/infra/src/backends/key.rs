//! Storage keys derived from canonical cache keys

use memora_domain::CacheKey;

/// The string a backend stores an entry under
///
/// The canonical encoding is used as-is unless it exceeds `max_length`, in
/// which case it becomes `"<prefix>:" + hex(blake3(encoding))`. The prefix
/// keeps digested keys inside their function's key space.
pub fn storage_key(key: &CacheKey, max_length: Option<usize>) -> String {
    let encoded = key.encode();
    match max_length {
        Some(max) if encoded.len() > max => {
            let digest = blake3::hash(encoded.as_bytes());
            format!("{}:{}", key.prefix(), hex::encode(digest.as_bytes()))
        }
        _ => encoded.to_string(),
    }
}
