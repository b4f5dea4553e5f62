//! Configuration loader
//!
//! Loads memoize configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load defaults from environment variables
//! 2. If none are set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. Nothing found means an empty configuration
//!
//! ## Environment Variables
//! - `MEMORA_DRIVER`: Backend driver (`memory`, `concurrent`, `null`)
//! - `MEMORA_EXPIRES_IN`: Default time-to-live (`"10m"`, `"1h 30m"`, `"never"`)
//! - `MEMORA_MAX_SIZE`: Capacity bound per cache
//! - `MEMORA_NAMESPACE`: Namespace shared by every memoized function
//! - `MEMORA_GLOBAL`: Whether memory caches share process-wide stores
//!   (true/false)
//! - `MEMORA_CONFIG`: Explicit config file path, probed first
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `$MEMORA_CONFIG`
//! 2. `./memora.toml` or `./memora.json` (current working directory)
//! 3. `../memora.toml` or `../memora.json` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use memora_common::CommonError;
use memora_core::split_options;
use memora_domain::constants::{
    OPT_DRIVER, OPT_EXPIRES_IN, OPT_GLOBAL, OPT_MAX_SIZE, OPT_NAMESPACE,
};
use memora_domain::{MemoizeConfig, OptionSet};
use serde_json::Value;

use crate::errors::{InfraError, InfraResult};

const ENV_DRIVER: &str = "MEMORA_DRIVER";
const ENV_EXPIRES_IN: &str = "MEMORA_EXPIRES_IN";
const ENV_MAX_SIZE: &str = "MEMORA_MAX_SIZE";
const ENV_NAMESPACE: &str = "MEMORA_NAMESPACE";
const ENV_GLOBAL: &str = "MEMORA_GLOBAL";
const ENV_CONFIG: &str = "MEMORA_CONFIG";

/// Load configuration with automatic fallback strategy
///
/// Environment variables win when any is set; otherwise the first config
/// file found is used; otherwise the configuration is empty.
///
/// # Errors
/// Returns `InfraError::Config` if a source exists but is invalid.
pub fn load() -> InfraResult<MemoizeConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(InfraError::ConfigNotFound(reason)) => {
            tracing::debug!(reason = %reason, "No environment configuration, trying file");
            match load_from_file(None) {
                Err(InfraError::ConfigNotFound(reason)) => {
                    tracing::debug!(reason = %reason, "No config file, using empty configuration");
                    Ok(MemoizeConfig::default())
                }
                other => other,
            }
        }
        Err(e) => Err(e),
    }
}

/// Load `[defaults]` from environment variables
///
/// # Errors
/// Returns `InfraError::ConfigNotFound` if no `MEMORA_*` option variable is
/// set, and `InfraError::Config` if one has an invalid value.
pub fn load_from_env() -> InfraResult<MemoizeConfig> {
    let mut defaults = OptionSet::new();

    if let Some(driver) = env_var(ENV_DRIVER) {
        defaults.insert(OPT_DRIVER, driver.to_ascii_lowercase());
    }
    if let Some(expires_in) = env_var(ENV_EXPIRES_IN) {
        defaults.insert(OPT_EXPIRES_IN, expires_in);
    }
    if let Some(max_size) = env_var(ENV_MAX_SIZE) {
        let max_size = max_size
            .parse::<u64>()
            .map_err(|e| CommonError::config_field(ENV_MAX_SIZE, e.to_string()))?;
        defaults.insert(OPT_MAX_SIZE, max_size);
    }
    if let Some(namespace) = env_var(ENV_NAMESPACE) {
        defaults.insert(OPT_NAMESPACE, namespace);
    }
    if let Some(global) = env_var(ENV_GLOBAL) {
        defaults.insert(OPT_GLOBAL, Value::Bool(parse_bool(&global)));
    }

    if defaults.is_empty() {
        return Err(InfraError::ConfigNotFound("no MEMORA_* variables set".to_string()));
    }

    let config = MemoizeConfig { defaults, ..MemoizeConfig::default() };
    check(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `InfraError::ConfigNotFound` if the file (or any candidate) does
/// not exist, and `InfraError::Config` if it cannot be read or is invalid.
pub fn load_from_file(path: Option<PathBuf>) -> InfraResult<MemoizeConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(InfraError::ConfigNotFound(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            InfraError::ConfigNotFound(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(CommonError::from)?;
    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`). Option names
/// and values are checked before the configuration is returned.
///
/// # Errors
/// Returns `InfraError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> InfraResult<MemoizeConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let config: MemoizeConfig = match extension {
        "toml" => toml::from_str(contents).map_err(CommonError::from)?,
        "json" => serde_json::from_str(contents).map_err(CommonError::from)?,
        _ => {
            return Err(InfraError::config(format!("Unsupported config format: {extension}")))
        }
    };
    check(&config)?;
    Ok(config)
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(explicit) = env_var(ENV_CONFIG) {
        candidates.push(PathBuf::from(explicit));
    }

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("memora.toml"),
            cwd.join("memora.json"),
            cwd.join("../memora.toml"),
            cwd.join("../memora.json"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![exe_dir.join("memora.toml"), exe_dir.join("memora.json")]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Names must be known and every section's values must parse
fn check(config: &MemoizeConfig) -> InfraResult<()> {
    config.validate()?;
    split_options(&config.defaults)
        .map_err(|e| CommonError::config_field("[defaults]", e.to_string()))?;
    for (function, options) in &config.functions {
        split_options(&config.defaults.merged(options)).map_err(|e| {
            CommonError::config_field(format!("[functions.\"{function}\"]"), e.to_string())
        })?;
    }
    Ok(())
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse a boolean
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
