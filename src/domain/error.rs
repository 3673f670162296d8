use thiserror::Error;

use super::credential::CredentialValidationError;
use super::key_owner::OwnerValidationError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Stale write: {message}")]
    StaleWrite { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Storage lookup timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn stale_write(message: impl Into<String>) -> Self {
        Self::StaleWrite {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is a uniqueness violation
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<OwnerValidationError> for DomainError {
    fn from(err: OwnerValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<CredentialValidationError> for DomainError {
    fn from(err: CredentialValidationError) -> Self {
        match err {
            CredentialValidationError::InvalidId(_) => Self::invalid_id(err.to_string()),
            other => Self::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Owner 'billing' not found");
        assert_eq!(error.to_string(), "Not found: Owner 'billing' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("Secret already in use");
        assert_eq!(error.to_string(), "Conflict: Secret already in use");
        assert!(error.is_conflict());
        assert!(!DomainError::internal("x").is_conflict());
    }

    #[test]
    fn test_timeout_error() {
        let error = DomainError::timeout(250);
        assert_eq!(error.to_string(), "Storage lookup timed out after 250ms");
    }

    #[test]
    fn test_from_validation_errors() {
        let err: DomainError = OwnerValidationError::EmptyName.into();
        assert!(matches!(err, DomainError::Validation { .. }));

        let err: DomainError = CredentialValidationError::InvalidId("nope".to_string()).into();
        assert!(matches!(err, DomainError::InvalidId { .. }));
    }
}
