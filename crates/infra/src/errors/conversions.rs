//! Conversions from shared and domain errors into infrastructure errors.

use memora_common::CommonError;
use memora_domain::DomainError;

use super::InfraError;

/* -------------------------------------------------------------------------- */
/* Parsers and I/O → InfraError::Config */
/* -------------------------------------------------------------------------- */

impl From<CommonError> for InfraError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Config { message, field: Some(field) } => {
                InfraError::Config(format!("{field}: {message}"))
            }
            CommonError::Config { message, field: None } => InfraError::Config(message),
            CommonError::Serialization { message, format } => InfraError::Config(format!(
                "Invalid {} format: {message}",
                format.as_deref().unwrap_or("config")
            )),
        }
    }
}

impl From<DomainError> for InfraError {
    fn from(err: DomainError) -> Self {
        InfraError::Config(err.to_string())
    }
}
