//! Cache keys and their canonical encoding
//!
//! A key is the ordered sequence `[prefix, context_tag, ...parts]`. Backends
//! store entries under [`CacheKey::encode`], a compact JSON array whose
//! objects are written with keys sorted by byte order, so equal keys always
//! encode to the same string regardless of how maps were built.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::CallContext;
use crate::errors::{DomainError, Result};

/// What a key extractor hands back
///
/// ```
/// use memora_domain::KeyParts;
/// use serde_json::json;
///
/// let parts = KeyParts::fields([("b", json!(2)), ("a", json!(1))]);
/// assert_eq!(parts.into_parts(), vec![json!("a"), json!(1), json!("b"), json!(2)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum KeyParts {
    /// A single value used as the only key part
    Scalar(Value),
    /// Positional parts, kept in order
    Sequence(Vec<Value>),
    /// Named parts, flattened to `name, value` pairs in name order
    Fields(BTreeMap<String, Value>),
}

impl KeyParts {
    /// Named parts from any iterator of pairs; order does not matter
    pub fn fields<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Flatten into the positional parts that go into a key
    pub fn into_parts(self) -> Vec<Value> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::Sequence(values) => values,
            Self::Fields(fields) => fields
                .into_iter()
                .flat_map(|(name, value)| [Value::String(name), value])
                .collect(),
        }
    }
}

impl From<Vec<Value>> for KeyParts {
    fn from(values: Vec<Value>) -> Self {
        Self::Sequence(values)
    }
}

impl From<Value> for KeyParts {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

/// A fully built cache key
///
/// Equality and hashing use the canonical encoding.
#[derive(Clone)]
pub struct CacheKey {
    prefix: String,
    context: CallContext,
    parts: Vec<Value>,
    encoded: String,
}

impl CacheKey {
    /// Build and encode a key
    ///
    /// ```
    /// use memora_domain::{CacheKey, CallContext};
    /// use serde_json::json;
    ///
    /// let key = CacheKey::new("memoize::main::add", CallContext::Scalar, vec![json!(2), json!(3)])
    ///     .unwrap();
    /// assert_eq!(key.encode(), r#"["memoize::main::add","S",2,3]"#);
    /// ```
    pub fn new(prefix: impl Into<String>, context: CallContext, parts: Vec<Value>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(DomainError::Encoding("key prefix must not be empty".to_string()));
        }

        let mut encoded = String::with_capacity(prefix.len() + 8 + parts.len() * 8);
        encoded.push('[');
        write_string(&mut encoded, &prefix)?;
        encoded.push(',');
        write_string(&mut encoded, context.tag())?;
        for part in &parts {
            encoded.push(',');
            write_canonical(&mut encoded, part)?;
        }
        encoded.push(']');

        Ok(Self { prefix, context, parts, encoded })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn context(&self) -> CallContext {
        self.context
    }

    /// Key parts after the prefix and context tag
    pub fn parts(&self) -> &[Value] {
        &self.parts
    }

    /// Canonical encoding of the whole key
    pub fn encode(&self) -> &str {
        &self.encoded
    }

    /// Length in bytes of the canonical encoding
    pub fn encoded_len(&self) -> usize {
        self.encoded.len()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.encoded).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

fn write_string(out: &mut String, s: &str) -> Result<()> {
    let quoted = serde_json::to_string(s).map_err(|e| DomainError::Encoding(e.to_string()))?;
    out.push_str(&quoted);
    Ok(())
}

fn write_canonical(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push('{');
            for (i, (name, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, name)?;
                out.push(':');
                write_canonical(out, item)?;
            }
            out.push('}');
        }
    }
    Ok(())
}
