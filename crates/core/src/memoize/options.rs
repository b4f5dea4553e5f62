//! Memoize options: the programmatic builder and option-set splitting

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use memora_common::time::{parse_duration, parse_expiry};
use memora_domain::constants::{
    OPT_BUSY_LOCK, OPT_DEFAULT_EXPIRES_IN, OPT_DRIVER, OPT_EVICTION, OPT_EXPIRES_AT,
    OPT_EXPIRES_IN, OPT_EXPIRES_VARIANCE, OPT_GLOBAL, OPT_MAX_KEY_LENGTH, OPT_MAX_SIZE,
    OPT_NAMESPACE, OPT_TRACK_METRICS,
};
use memora_domain::{
    CacheOptions, CallOptions, DomainError, Driver, EntryInfo, Eviction, KeyParts, OptionSet,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::key_builder::KeyExtractor;
use crate::cache::ports::CacheAdapter;

/// Everything `memoize` accepts besides the target
///
/// ```
/// use std::time::Duration;
///
/// use memora_core::MemoizeOptions;
/// use memora_domain::{Driver, KeyParts};
///
/// let options = MemoizeOptions::new()
///     .key(|args| KeyParts::Scalar(args[0].clone()))
///     .expires_in(Duration::from_secs(600))
///     .driver(Driver::Memory)
///     .max_size(1_000);
/// assert_eq!(options.call_options().expires_in, Some(Duration::from_secs(600)));
/// ```
#[derive(Clone, Default)]
pub struct MemoizeOptions {
    key: Option<KeyExtractor>,
    cache: Option<Arc<dyn CacheAdapter>>,
    call: CallOptions,
    construction: CacheOptions,
}

impl MemoizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed options from an untyped set; unknown names are rejected
    pub fn from_option_set(options: &OptionSet) -> Result<Self, DomainError> {
        let (call, construction) = split_options(options)?;
        Ok(Self { key: None, cache: None, call, construction })
    }

    /// Derive key parts from the arguments instead of using them verbatim
    pub fn key<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&[Value]) -> KeyParts + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(extractor));
        self
    }

    /// Use this cache instead of building one
    pub fn cache(mut self, cache: Arc<dyn CacheAdapter>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.call.expires_in = Some(ttl);
        self
    }

    pub fn expires_at(mut self, deadline: SystemTime) -> Self {
        self.call.expires_at = Some(deadline);
        self
    }

    pub fn expires_variance(mut self, variance: f64) -> Self {
        self.call.expires_variance = Some(variance);
        self
    }

    pub fn busy_lock(mut self, duration: Duration) -> Self {
        self.call.busy_lock = Some(duration);
        self
    }

    /// Recompute whenever `predicate` says a stored entry is stale
    pub fn expire_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&EntryInfo) -> bool + Send + Sync + 'static,
    {
        self.call.expire_if = Some(Arc::new(predicate));
        self
    }

    pub fn driver(mut self, driver: Driver) -> Self {
        self.construction.driver = Some(driver);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.construction.namespace = Some(namespace.into());
        self
    }

    pub fn global(mut self, global: bool) -> Self {
        self.construction.global = global;
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.construction.max_size = Some(max_size);
        self
    }

    pub fn eviction(mut self, eviction: Eviction) -> Self {
        self.construction.eviction = eviction;
        self
    }

    pub fn default_expires_in(mut self, ttl: Duration) -> Self {
        self.construction.default_expires_in = Some(ttl);
        self
    }

    pub fn max_key_length(mut self, length: usize) -> Self {
        self.construction.max_key_length = Some(length);
        self
    }

    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.construction.track_metrics = enabled;
        self
    }

    /// Overlay an untyped set; its values replace those already set
    pub fn with_option_set(mut self, options: &OptionSet) -> Result<Self, DomainError> {
        options.validate_names()?;
        for (name, value) in options.iter() {
            apply(name, value, &mut self.call, &mut self.construction)?;
        }
        Ok(self)
    }

    pub fn call_options(&self) -> &CallOptions {
        &self.call
    }

    pub fn cache_options(&self) -> &CacheOptions {
        &self.construction
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Option<KeyExtractor>, Option<Arc<dyn CacheAdapter>>, CallOptions, CacheOptions) {
        (self.key, self.cache, self.call, self.construction)
    }
}

impl fmt::Debug for MemoizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizeOptions")
            .field("key", &self.key.as_ref().map(|_| "<extractor>"))
            .field("cache", &self.cache.as_ref().map(|c| c.namespace().to_string()))
            .field("call", &self.call)
            .field("construction", &self.construction)
            .finish()
    }
}

/// Split an option set into per-call and cache-construction options
///
/// Durations accept seconds as a number or text such as `"10m"`;
/// `expires_in = "never"` leaves the option unset. `expires_at` is UNIX
/// seconds.
///
/// ```
/// use std::time::Duration;
///
/// use memora_core::split_options;
/// use memora_domain::{Driver, OptionSet};
///
/// let set = OptionSet::new().with("expires_in", "1h 30m").with("driver", "null");
/// let (call, cache) = split_options(&set).unwrap();
/// assert_eq!(call.expires_in, Some(Duration::from_secs(5400)));
/// assert_eq!(cache.driver, Some(Driver::Null));
/// ```
pub fn split_options(options: &OptionSet) -> Result<(CallOptions, CacheOptions), DomainError> {
    options.validate_names()?;

    let mut call = CallOptions::default();
    let mut construction = CacheOptions::default();
    for (name, value) in options.iter() {
        apply(name, value, &mut call, &mut construction)?;
    }
    call.validate()?;

    debug!(per_call = ?call, construction = ?construction, "split memoize options");
    Ok((call, construction))
}

fn apply(
    name: &str,
    value: &Value,
    call: &mut CallOptions,
    construction: &mut CacheOptions,
) -> Result<(), DomainError> {
    match name {
        OPT_EXPIRES_IN => call.expires_in = expiry_value(name, value)?,
        OPT_EXPIRES_AT => call.expires_at = Some(timestamp_value(name, value)?),
        OPT_EXPIRES_VARIANCE => call.expires_variance = Some(float_value(name, value)?),
        OPT_BUSY_LOCK => call.busy_lock = Some(duration_value(name, value)?),
        OPT_DRIVER => construction.driver = Some(named_value::<Driver>(name, value)?),
        OPT_NAMESPACE => construction.namespace = Some(string_value(name, value)?),
        OPT_GLOBAL => construction.global = bool_value(name, value)?,
        OPT_MAX_SIZE => construction.max_size = Some(positive_value(name, value)?),
        OPT_EVICTION => construction.eviction = named_value::<Eviction>(name, value)?,
        OPT_DEFAULT_EXPIRES_IN => construction.default_expires_in = expiry_value(name, value)?,
        OPT_MAX_KEY_LENGTH => construction.max_key_length = Some(positive_value(name, value)?),
        OPT_TRACK_METRICS => construction.track_metrics = bool_value(name, value)?,
        other => return Err(DomainError::UnknownOption(other.to_string())),
    }
    Ok(())
}

fn seconds(name: &str, secs: f64) -> Result<Duration, DomainError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| DomainError::invalid_option(name, format!("invalid number of seconds: {secs}")))
}

fn expiry_value(name: &str, value: &Value) -> Result<Option<Duration>, DomainError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DomainError::invalid_option(name, "expected seconds"))
            .and_then(|secs| seconds(name, secs))
            .map(Some),
        Value::String(text) => {
            parse_expiry(text).map_err(|e| DomainError::invalid_option(name, e.to_string()))
        }
        _ => Err(DomainError::invalid_option(name, "expected seconds or duration text")),
    }
}

fn duration_value(name: &str, value: &Value) -> Result<Duration, DomainError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DomainError::invalid_option(name, "expected seconds"))
            .and_then(|secs| seconds(name, secs)),
        Value::String(text) => {
            parse_duration(text).map_err(|e| DomainError::invalid_option(name, e.to_string()))
        }
        _ => Err(DomainError::invalid_option(name, "expected seconds or duration text")),
    }
}

fn timestamp_value(name: &str, value: &Value) -> Result<SystemTime, DomainError> {
    let secs = value
        .as_f64()
        .ok_or_else(|| DomainError::invalid_option(name, "expected UNIX seconds"))?;
    UNIX_EPOCH
        .checked_add(seconds(name, secs)?)
        .ok_or_else(|| DomainError::invalid_option(name, "timestamp out of range"))
}

fn float_value(name: &str, value: &Value) -> Result<f64, DomainError> {
    value.as_f64().ok_or_else(|| DomainError::invalid_option(name, "expected a number"))
}

fn bool_value(name: &str, value: &Value) -> Result<bool, DomainError> {
    value.as_bool().ok_or_else(|| DomainError::invalid_option(name, "expected true or false"))
}

fn string_value(name: &str, value: &Value) -> Result<String, DomainError> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(DomainError::invalid_option(name, "expected a non-empty string")),
    }
}

fn positive_value(name: &str, value: &Value) -> Result<usize, DomainError> {
    value
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| DomainError::invalid_option(name, "expected a positive integer"))
}

fn named_value<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, DomainError> {
    serde_json::from_value(value.clone()).map_err(|_| {
        DomainError::invalid_option(name, format!("unsupported value {value}"))
    })
}
