//! Credential domain
//!
//! API keys and client secrets share one model: a current secret, an optional
//! previous secret kept alive through a rotation window, and an owner whose
//! path rule restricts where the credential may be used.

mod entity;
mod repository;
mod resolved;
mod secret;
mod validation;

pub use entity::{Credential, CredentialId, CredentialKind, CredentialName};
#[cfg(test)]
pub use repository::{MockCredentialRepository, MockCredentialResolver};
pub use repository::{CredentialRepository, CredentialResolver};
pub use resolved::{Invalidity, ResolvedCredential};
pub use secret::{SecretDigest, SecretSlot};
pub use validation::{validate_credential_name, CredentialValidationError};
