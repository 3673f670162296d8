//! Credential validation utilities

use thiserror::Error;

/// Errors that can occur during credential field validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CredentialValidationError {
    #[error("Credential name cannot be empty")]
    EmptyName,

    #[error("Credential name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Credential name cannot have leading or trailing whitespace")]
    UntrimmedName,

    #[error("Credential name contains a control character")]
    ControlCharacter,

    #[error("Invalid credential ID: {0}")]
    InvalidId(String),

    #[error("Unknown credential kind: '{0}'")]
    UnknownKind(String),
}

const MAX_CREDENTIAL_NAME_LENGTH: usize = 50;

/// Validate a credential name
///
/// The name is the stable handle a key keeps across rotations.
pub fn validate_credential_name(name: &str) -> Result<(), CredentialValidationError> {
    if name.is_empty() {
        return Err(CredentialValidationError::EmptyName);
    }

    if name.chars().count() > MAX_CREDENTIAL_NAME_LENGTH {
        return Err(CredentialValidationError::NameTooLong(
            MAX_CREDENTIAL_NAME_LENGTH,
        ));
    }

    if name.trim() != name {
        return Err(CredentialValidationError::UntrimmedName);
    }

    if name.chars().any(char::is_control) {
        return Err(CredentialValidationError::ControlCharacter);
    }

    Ok(())
}
