//! In-memory key owner repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::key_owner::{KeyOwner, OwnerName, OwnerRepository};
use crate::domain::DomainError;

/// In-memory implementation of OwnerRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryOwnerRepository {
    owners: Arc<RwLock<HashMap<OwnerName, KeyOwner>>>,
}

impl InMemoryOwnerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnerRepository for InMemoryOwnerRepository {
    async fn get(&self, name: &OwnerName) -> Result<Option<KeyOwner>, DomainError> {
        let owners = self.owners.read().await;
        Ok(owners.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<KeyOwner>, DomainError> {
        let owners = self.owners.read().await;

        let mut result: Vec<KeyOwner> = owners.values().cloned().collect();
        result.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
        Ok(result)
    }

    async fn create(&self, owner: KeyOwner) -> Result<KeyOwner, DomainError> {
        let mut owners = self.owners.write().await;

        if owners.contains_key(owner.name()) {
            return Err(DomainError::conflict(format!(
                "Owner '{}' already exists",
                owner.name()
            )));
        }

        owners.insert(owner.name().clone(), owner.clone());
        Ok(owner)
    }

    async fn update(&self, owner: &KeyOwner) -> Result<KeyOwner, DomainError> {
        let mut owners = self.owners.write().await;

        let Some(slot) = owners.get_mut(owner.name()) else {
            return Err(DomainError::not_found(format!(
                "Owner '{}' not found",
                owner.name()
            )));
        };

        *slot = owner.clone();
        Ok(owner.clone())
    }
}
