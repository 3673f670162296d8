//! Credential repository and resolver traits

use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{Credential, CredentialId, CredentialKind, CredentialName};
use super::resolved::ResolvedCredential;
use super::secret::{SecretDigest, SecretSlot};
use crate::domain::DomainError;

/// Repository for credential storage
///
/// Implementations must enforce, atomically with every write, that a digest
/// occupies at most one slot across all credentials. A write that would break
/// this fails with [`DomainError::Conflict`] and leaves stored records intact.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync + Debug {
    /// Get a credential by its ID
    async fn get(&self, id: &CredentialId) -> Result<Option<Credential>, DomainError>;

    /// Get a credential by its unique name
    async fn get_by_name(&self, name: &CredentialName) -> Result<Option<Credential>, DomainError>;

    /// Find the credential holding `digest` in either slot
    async fn find_by_digest(
        &self,
        digest: &SecretDigest,
    ) -> Result<Option<(Credential, SecretSlot)>, DomainError>;

    /// Create a new credential
    async fn create(&self, credential: Credential) -> Result<Credential, DomainError>;

    /// Replace an existing credential
    async fn update(&self, credential: &Credential) -> Result<Credential, DomainError>;

    /// List credentials, optionally filtered by kind
    async fn list(&self, kind: Option<CredentialKind>) -> Result<Vec<Credential>, DomainError>;

    /// Count credentials, optionally filtered by kind
    async fn count(&self, kind: Option<CredentialKind>) -> Result<usize, DomainError> {
        Ok(self.list(kind).await?.len())
    }
}

/// Resolves presented secrets for the request path
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolve a plaintext secret to its credential, matched slot and owner
    async fn resolve(&self, secret: &str) -> Result<Option<ResolvedCredential>, DomainError>;
}
