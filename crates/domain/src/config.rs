//! Configuration structures
//!
//! Memoize options can come from a config file:
//!
//! ```toml
//! [defaults]
//! driver = "memory"
//! expires_in = "10m"
//!
//! [functions."math::fib"]
//! max_size = 1000
//! ```
//!
//! Values stay untyped here; the core crate turns an [`OptionSet`] into
//! typed options, parsing duration text on the way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CONSTRUCTION_OPTIONS, PER_CALL_OPTIONS, PROGRAMMATIC_OPTIONS};
use crate::errors::{DomainError, Result};

/// An untyped bag of named memoize options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(BTreeMap<String, Value>);

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Builder-style [`OptionSet::insert`]
    ///
    /// ```
    /// use memora_domain::OptionSet;
    ///
    /// let options = OptionSet::new().with("driver", "memory").with("max_size", 100);
    /// assert_eq!(options.len(), 2);
    /// ```
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Overlay `other` on top of this set; its values win
    pub fn merge(&mut self, other: &OptionSet) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// A new set with `other` overlaid on this one
    #[must_use]
    pub fn merged(&self, other: &OptionSet) -> OptionSet {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reject names that are unknown or that can only be set in code
    pub fn validate_names(&self) -> Result<()> {
        for name in self.0.keys() {
            if PROGRAMMATIC_OPTIONS.contains(&name.as_str()) {
                return Err(DomainError::invalid_option(
                    name.clone(),
                    "can only be set programmatically",
                ));
            }
            if !PER_CALL_OPTIONS.contains(&name.as_str())
                && !CONSTRUCTION_OPTIONS.contains(&name.as_str())
            {
                return Err(DomainError::UnknownOption(name.clone()));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// File-level memoize configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoizeConfig {
    /// Options applied to every configured memoization
    pub defaults: OptionSet,
    /// Per-function overrides keyed by fully qualified name
    pub functions: BTreeMap<String, OptionSet>,
}

impl MemoizeConfig {
    /// Effective options for a qualified function name
    ///
    /// ```
    /// use memora_domain::{MemoizeConfig, OptionSet};
    ///
    /// let mut config = MemoizeConfig::default();
    /// config.defaults.insert("expires_in", "1h");
    /// config.functions.insert("math::fib".into(), OptionSet::new().with("expires_in", "5m"));
    ///
    /// let options = config.options_for("math::fib");
    /// assert_eq!(options.get("expires_in").and_then(|v| v.as_str()), Some("5m"));
    /// ```
    pub fn options_for(&self, qualified_name: &str) -> OptionSet {
        match self.functions.get(qualified_name) {
            Some(overrides) => self.defaults.merged(overrides),
            None => self.defaults.clone(),
        }
    }

    /// Check option names in every section
    pub fn validate(&self) -> Result<()> {
        self.defaults
            .validate_names()
            .map_err(|e| DomainError::Config(format!("[defaults]: {e}")))?;
        for (function, options) in &self.functions {
            options
                .validate_names()
                .map_err(|e| DomainError::Config(format!("[functions.\"{function}\"]: {e}")))?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.functions.is_empty()
    }
}
