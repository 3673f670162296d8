//! Key owner repository trait

use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{KeyOwner, OwnerName};
use crate::domain::DomainError;

/// Repository for key owners. There is no delete: owners are only superseded.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OwnerRepository: Send + Sync + Debug {
    /// Get an owner by name
    async fn get(&self, name: &OwnerName) -> Result<Option<KeyOwner>, DomainError>;

    /// List all owners ordered by name
    async fn list(&self) -> Result<Vec<KeyOwner>, DomainError>;

    /// Create a new owner, failing with a conflict if the name is taken
    async fn create(&self, owner: KeyOwner) -> Result<KeyOwner, DomainError>;

    /// Replace an existing owner
    async fn update(&self, owner: &KeyOwner) -> Result<KeyOwner, DomainError>;
}
