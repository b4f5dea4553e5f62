//! Common error types and utilities shared by the Memora crates
//!
//! The error handling system is built on three pieces:
//!
//! 1. **`CommonError`**: configuration and serialization failures shared by
//!    the crates that read configuration
//!
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by retryability and severity
//!
//! 3. **`ErrorSeverity` enum**: a unified severity level for logging
//!
//! ## Composition
//!
//! Crate-specific errors **convert** shared failures into their own variants
//! rather than duplicating the parsing glue:
//!
//! ```rust,ignore
//! let config: MemoizeConfig = toml::from_str(contents).map_err(CommonError::from)?;
//! ```
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | clear not supported by a backend |
//! | **Warning** | Caller misuse that left state untouched | already memoized, not memoized |
//! | **Error** | Failure requiring attention | unresolved function, invalid options, backend down |
//! | **Critical** | System integrity at risk | reserved; no memora error is critical today |

use std::fmt;

/// Failures shared by every crate that reads configuration
#[derive(Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{}': {}", field, message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::Serialization { message, format } => {
                if let Some(format) = format {
                    write!(f, "Serialization error ({}): {}", format, message)
                } else {
                    write!(f, "Serialization error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } | Self::Serialization { .. } => ErrorSeverity::Error,
        }
    }
}

impl CommonError {
    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a serialization error with format information
    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }
}

/// Error classification trait for consistent error handling across crates
///
/// ```rust,ignore
/// impl ErrorClassification for CallError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, Self::Cache(CacheError::Unavailable { .. }))
///     }
///     // ...
/// }
/// ```
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient, such as a backend outage.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::config(format!("Failed to read config file: {err}"))
    }
}
