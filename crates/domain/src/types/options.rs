//! Typed memoize options
//!
//! Options given to `memoize` are split in two: [`CallOptions`] travel with
//! every compute-or-fetch call, [`CacheOptions`] are used once to build a
//! backend.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use serde::{Deserialize, Serialize};

use crate::constants::{OPT_BUSY_LOCK, OPT_EXPIRES_VARIANCE};
use crate::errors::{DomainError, Result};

/// What an `expire_if` predicate gets to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    /// When the entry was stored
    pub created_at: Instant,
    /// Hard deadline, if any
    pub expires_at: Option<Instant>,
    /// When this check is happening
    pub checked_at: Instant,
}

impl EntryInfo {
    /// How long the entry has existed at check time
    pub fn age(&self) -> Duration {
        self.checked_at.saturating_duration_since(self.created_at)
    }
}

/// Predicate re-evaluated on every hit; `true` forces recomputation
pub type ExpirePredicate = Arc<dyn Fn(&EntryInfo) -> bool + Send + Sync>;

/// Options forwarded unchanged to every compute-or-fetch call
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Relative time-to-live of a stored result
    pub expires_in: Option<Duration>,
    /// Absolute expiry; takes precedence over `expires_in`
    pub expires_at: Option<SystemTime>,
    /// Fraction of the lifetime, at its end, in which early expiry may occur
    pub expires_variance: Option<f64>,
    /// How long a stale entry keeps being served while one caller recomputes
    pub busy_lock: Option<Duration>,
    pub expire_if: Option<ExpirePredicate>,
}

impl CallOptions {
    /// True when no per-call option is set
    pub fn is_empty(&self) -> bool {
        self.expires_in.is_none()
            && self.expires_at.is_none()
            && self.expires_variance.is_none()
            && self.busy_lock.is_none()
            && self.expire_if.is_none()
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(variance) = self.expires_variance {
            if !(0.0..=1.0).contains(&variance) {
                return Err(DomainError::invalid_option(
                    OPT_EXPIRES_VARIANCE,
                    format!("must be between 0 and 1, got {variance}"),
                ));
            }
        }
        if self.busy_lock == Some(Duration::ZERO) {
            return Err(DomainError::invalid_option(OPT_BUSY_LOCK, "must be greater than zero"));
        }
        Ok(())
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("expires_variance", &self.expires_variance)
            .field("busy_lock", &self.busy_lock)
            .field("expire_if", &self.expire_if.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// In-process store, optionally shared process-wide per namespace
    #[default]
    Memory,
    /// Concurrent store that runs at most one producer per key
    Concurrent,
    /// Stores nothing
    Null,
}

impl Driver {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Concurrent => "concurrent",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy applied when a bounded cache is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eviction {
    #[default]
    Lru,
    Lfu,
    Fifo,
    Random,
    None,
}

/// Options consumed when a backend is built
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// Backend to build; `None` lets the factory pick its default
    pub driver: Option<Driver>,
    /// Isolation scope; defaults to the function's key prefix
    pub namespace: Option<String>,
    /// Share one process-wide store per namespace (memory driver)
    pub global: bool,
    pub max_size: Option<usize>,
    pub eviction: Eviction,
    /// TTL used when a call carries no expiry of its own
    pub default_expires_in: Option<Duration>,
    /// Storage keys longer than this are replaced by a digest
    pub max_key_length: Option<usize>,
    pub track_metrics: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            driver: None,
            namespace: None,
            global: true,
            max_size: None,
            eviction: Eviction::default(),
            default_expires_in: None,
            max_key_length: None,
            track_metrics: false,
        }
    }
}

impl CacheOptions {
    /// Fill the namespace if none was given
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        if self.namespace.is_none() {
            self.namespace = Some(namespace.into());
        }
        self
    }

    /// Driver after applying the default
    pub fn driver_or_default(&self) -> Driver {
        self.driver.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for types::options.
    use super::*;

    /// Validates emptiness and Debug output of per-call options.
    ///
    /// Assertions:
    /// - Default options are empty.
    /// - A predicate is shown as a placeholder rather than an address.
    #[test]
    fn test_call_options_empty_and_debug() {
        assert!(CallOptions::default().is_empty());

        let options = CallOptions {
            expires_in: Some(Duration::from_secs(5)),
            expire_if: Some(Arc::new(|_: &EntryInfo| false)),
            ..CallOptions::default()
        };
        assert!(!options.is_empty());
        assert!(format!("{options:?}").contains("<predicate>"));
    }

    /// Validates range checks.
    ///
    /// Assertions:
    /// - Variance outside [0, 1] and a zero busy lock are rejected.
    #[test]
    fn test_call_options_validate() {
        let ok = CallOptions { expires_variance: Some(0.25), ..CallOptions::default() };
        assert!(ok.validate().is_ok());

        let too_high = CallOptions { expires_variance: Some(1.5), ..CallOptions::default() };
        assert!(matches!(
            too_high.validate(),
            Err(DomainError::InvalidOption { ref option, .. }) if option == "expires_variance"
        ));

        let zero_lock = CallOptions { busy_lock: Some(Duration::ZERO), ..CallOptions::default() };
        assert!(zero_lock.validate().is_err());
    }

    /// Validates construction option defaults.
    ///
    /// Assertions:
    /// - `global` defaults to true, the driver to memory.
    /// - A default namespace only fills an empty slot.
    #[test]
    fn test_cache_options_defaults() {
        let options = CacheOptions::default();
        assert!(options.global);
        assert_eq!(options.driver_or_default(), Driver::Memory);

        let filled = options.with_default_namespace("memoize::main::f");
        assert_eq!(filled.namespace.as_deref(), Some("memoize::main::f"));

        let kept = CacheOptions { namespace: Some("mine".into()), ..CacheOptions::default() }
            .with_default_namespace("other");
        assert_eq!(kept.namespace.as_deref(), Some("mine"));
    }

    /// Validates driver and eviction names.
    ///
    /// Assertions:
    /// - Lowercase names deserialize, unknown names fail.
    #[test]
    fn test_driver_and_eviction_names() {
        let driver: Driver = serde_json::from_str("\"concurrent\"").unwrap();
        assert_eq!(driver, Driver::Concurrent);
        assert_eq!(driver.to_string(), "concurrent");
        assert!(serde_json::from_str::<Driver>("\"redis\"").is_err());

        let eviction: Eviction = serde_json::from_str("\"fifo\"").unwrap();
        assert_eq!(eviction, Eviction::Fifo);
    }

    /// Validates entry age at check time.
    #[test]
    fn test_entry_info_age() {
        let created_at = Instant::now();
        let info = EntryInfo {
            created_at,
            expires_at: None,
            checked_at: created_at + Duration::from_secs(3),
        };
        assert_eq!(info.age(), Duration::from_secs(3));
    }
}
