//! Error types raised by domain-level validation and encoding

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain validation and encoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum DomainError {
    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Key encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    /// Build an [`DomainError::InvalidOption`]
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption { option: option.into(), message: message.into() }
    }
}

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    //! Unit tests for errors.
    use super::*;

    /// Validates display text for each variant.
    ///
    /// Assertions:
    /// - Messages name the offending option or detail.
    #[test]
    fn test_display() {
        assert_eq!(
            DomainError::invalid_option("max_size", "expected an integer").to_string(),
            "Invalid value for option 'max_size': expected an integer"
        );
        assert_eq!(DomainError::UnknownOption("ttl".into()).to_string(), "Unknown option: ttl");
    }

    /// Validates the serialized shape used in diagnostics output.
    ///
    /// Assertions:
    /// - The variant name lands under `type` and the payload under `detail`.
    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(DomainError::Config("bad".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Config", "detail": "bad"}));
    }
}
