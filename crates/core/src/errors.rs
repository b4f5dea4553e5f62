//! Error types for the memoization layer
//!
//! Administrative operations fail with [`MemoizeError`]; wrapped calls fail
//! with [`CallError`]; backends report [`CacheError`]. All three classify
//! themselves through [`ErrorClassification`] so callers can log and retry
//! uniformly.

use memora_common::{ErrorClassification, ErrorSeverity};
use memora_domain::{DomainError, FunctionId, ReturnValue};
use thiserror::Error;

/// Result of invoking a function or a memoized wrapper
pub type CallResult = Result<ReturnValue, CallError>;

/// Failures reported by cache backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Cache backend '{backend}' unavailable: {message}")]
    Unavailable { backend: String, message: String },

    #[error("Cache backend '{backend}' does not support clear")]
    ClearUnsupported { backend: String },

    #[error("Cannot build cache backend '{backend}': {message}")]
    Construction { backend: String, message: String },
}

impl CacheError {
    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable { backend: backend.into(), message: message.into() }
    }

    pub fn construction(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction { backend: backend.into(), message: message.into() }
    }
}

impl ErrorClassification for CacheError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ClearUnsupported { .. } => ErrorSeverity::Info,
            Self::Unavailable { .. } | Self::Construction { .. } => ErrorSeverity::Error,
        }
    }
}

/// Failures of a call made through a function or its memoized wrapper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// The original function failed; nothing was cached
    #[error("Function failed: {message}")]
    Function { message: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A list result was produced for a scalar-context call
    #[error("Function returned a list where a scalar was expected")]
    ShapeMismatch,

    #[error("Cannot build cache key: {0}")]
    KeyEncoding(DomainError),

    #[error("'{name}' does not resolve to a defined function")]
    UnresolvedFunction { name: String },
}

impl CallError {
    /// Failure raised by user code
    pub fn function(message: impl Into<String>) -> Self {
        Self::Function { message: message.into() }
    }
}

impl ErrorClassification for CallError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Cache(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cache(err) => err.severity(),
            Self::Function { .. } | Self::ShapeMismatch => ErrorSeverity::Warning,
            Self::KeyEncoding(_) | Self::UnresolvedFunction { .. } => ErrorSeverity::Error,
        }
    }
}

/// Failures of memoize, unmemoize and define
///
/// An administrative call that returns one of these has changed nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoizeError {
    #[error("'{name}' does not resolve to a defined function")]
    UnresolvedFunction { name: String },

    #[error("{id} is already memoized")]
    AlreadyMemoized { id: FunctionId },

    #[error("{id} is not memoized")]
    NotMemoized { id: FunctionId },

    #[error("Invalid memoize options: {0}")]
    InvalidOptions(#[from] DomainError),

    #[error("Cannot build cache: {0}")]
    CacheConstruction(CacheError),
}

impl ErrorClassification for MemoizeError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::CacheConstruction(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyMemoized { .. } | Self::NotMemoized { .. } => ErrorSeverity::Warning,
            Self::UnresolvedFunction { .. } | Self::InvalidOptions(_) => ErrorSeverity::Error,
            Self::CacheConstruction(err) => err.severity(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for errors.
    use super::*;

    /// Validates severity and retryability of administrative errors.
    ///
    /// Assertions:
    /// - Misuse is a warning, resolution and option failures are errors.
    /// - None of them is retryable.
    #[test]
    fn test_memoize_error_classification() {
        let already = MemoizeError::AlreadyMemoized { id: FunctionId::Named("main::f".into()) };
        assert_eq!(already.severity(), ErrorSeverity::Warning);
        assert!(!already.is_retryable());
        assert_eq!(already.to_string(), "main::f is already memoized");

        let unresolved = MemoizeError::UnresolvedFunction { name: "main::nope".into() };
        assert_eq!(unresolved.severity(), ErrorSeverity::Error);

        let invalid = MemoizeError::from(DomainError::UnknownOption("ttl".into()));
        assert_eq!(invalid.severity(), ErrorSeverity::Error);
    }

    /// Validates that an unavailable backend is retryable through a call.
    ///
    /// Assertions:
    /// - `CallError::Cache(Unavailable)` is retryable with Error severity.
    /// - Clear-unsupported is informational only.
    #[test]
    fn test_cache_error_classification() {
        let call = CallError::from(CacheError::unavailable("memory", "down"));
        assert!(call.is_retryable());
        assert_eq!(call.severity(), ErrorSeverity::Error);
        assert_eq!(call.to_string(), "Cache backend 'memory' unavailable: down");

        let clear = CacheError::ClearUnsupported { backend: "null".into() };
        assert_eq!(clear.severity(), ErrorSeverity::Info);
        assert!(!clear.is_critical());
    }

    /// Validates function failures surface as-is.
    #[test]
    fn test_function_error_display() {
        let err = CallError::function("division by zero");
        assert_eq!(err.to_string(), "Function failed: division by zero");
        assert!(!err.is_retryable());
    }
}
