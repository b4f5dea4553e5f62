//! Infrastructure errors
//!
//! Loading configuration and managing the process-wide memoizer fail with
//! [`InfraError`]. Backends report [`memora_core::CacheError`] directly.

mod conversions;

use memora_common::{ErrorClassification, ErrorSeverity};
use memora_core::MemoizeError;
use thiserror::Error;

/// Result alias for infrastructure operations
pub type InfraResult<T> = Result<T, InfraError>;

#[derive(Error, Debug)]
pub enum InfraError {
    /// A configuration source exists but is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// No configuration source was found
    #[error("No configuration found: {0}")]
    ConfigNotFound(String),

    #[error("Global memoizer is already initialized")]
    AlreadyInitialized,

    #[error("Global memoizer is not initialized")]
    NotInitialized,

    #[error(transparent)]
    Memoize(#[from] MemoizeError),
}

impl InfraError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl ErrorClassification for InfraError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Memoize(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigNotFound(_) => ErrorSeverity::Info,
            Self::AlreadyInitialized | Self::NotInitialized => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Error,
            Self::Memoize(err) => err.severity(),
        }
    }
}
