//! Key owner validation utilities

use thiserror::Error;

/// Errors that can occur while validating owner fields
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OwnerValidationError {
    #[error("Owner name cannot be empty")]
    EmptyName,

    #[error("Owner name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Owner name cannot have leading or trailing whitespace")]
    UntrimmedName,

    #[error("Owner name contains a control character")]
    ControlCharacter,

    #[error("Path pattern cannot be empty")]
    EmptyPattern,

    #[error("Path pattern exceeds maximum length of {0} characters")]
    PatternTooLong(usize),

    #[error("Path pattern is not a valid regular expression: {0}")]
    InvalidPattern(String),
}

pub const MAX_OWNER_NAME_LENGTH: usize = 50;
pub const MAX_PATH_PATTERN_LENGTH: usize = 1024;

/// Validate an owner name
///
/// Rules:
/// - Cannot be empty
/// - Maximum 50 characters
/// - No leading/trailing whitespace, no control characters
pub fn validate_owner_name(name: &str) -> Result<(), OwnerValidationError> {
    if name.is_empty() {
        return Err(OwnerValidationError::EmptyName);
    }

    if name.chars().count() > MAX_OWNER_NAME_LENGTH {
        return Err(OwnerValidationError::NameTooLong(MAX_OWNER_NAME_LENGTH));
    }

    if name.trim() != name {
        return Err(OwnerValidationError::UntrimmedName);
    }

    if name.chars().any(char::is_control) {
        return Err(OwnerValidationError::ControlCharacter);
    }

    Ok(())
}

/// Compile a path pattern, rejecting anything the regex engine refuses
pub fn compile_path_pattern(source: &str) -> Result<regex::Regex, OwnerValidationError> {
    if source.is_empty() {
        return Err(OwnerValidationError::EmptyPattern);
    }

    if source.chars().count() > MAX_PATH_PATTERN_LENGTH {
        return Err(OwnerValidationError::PatternTooLong(MAX_PATH_PATTERN_LENGTH));
    }

    regex::Regex::new(source).map_err(|e| OwnerValidationError::InvalidPattern(e.to_string()))
}
