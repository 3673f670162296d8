//! In-memory credential repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::credential::{
    Credential, CredentialId, CredentialKind, CredentialName, CredentialRepository, SecretDigest,
    SecretSlot,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    credentials: HashMap<CredentialId, Credential>,
    name_index: HashMap<String, CredentialId>,
    digest_index: HashMap<SecretDigest, CredentialId>,
}

impl Tables {
    /// Fail if any digest of `credential` is held by a different record
    fn check_digests(&self, credential: &Credential) -> Result<(), DomainError> {
        let mut seen = Vec::new();

        for (_, digest) in credential.digests() {
            if seen.contains(&digest) {
                return Err(DomainError::conflict(
                    "Current and previous secrets must differ",
                ));
            }
            seen.push(digest);

            if let Some(holder) = self.digest_index.get(digest) {
                if *holder != credential.id() {
                    return Err(DomainError::conflict("Secret is already in use"));
                }
            }
        }

        Ok(())
    }

    fn index_digests(&mut self, credential: &Credential) {
        for (_, digest) in credential.digests() {
            self.digest_index.insert(digest.clone(), credential.id());
        }
    }
}

/// In-memory implementation of CredentialRepository
///
/// All indexes sit behind one lock so the uniqueness check and the write are
/// a single step.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn get(&self, id: &CredentialId) -> Result<Option<Credential>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.credentials.get(id).cloned())
    }

    async fn get_by_name(&self, name: &CredentialName) -> Result<Option<Credential>, DomainError> {
        let tables = self.tables.read().await;

        Ok(tables
            .name_index
            .get(name.as_str())
            .and_then(|id| tables.credentials.get(id))
            .cloned())
    }

    async fn find_by_digest(
        &self,
        digest: &SecretDigest,
    ) -> Result<Option<(Credential, SecretSlot)>, DomainError> {
        let tables = self.tables.read().await;

        let Some(credential) = tables
            .digest_index
            .get(digest)
            .and_then(|id| tables.credentials.get(id))
        else {
            return Ok(None);
        };

        Ok(credential
            .slot_of(digest)
            .map(|slot| (credential.clone(), slot)))
    }

    async fn create(&self, credential: Credential) -> Result<Credential, DomainError> {
        let mut tables = self.tables.write().await;

        if tables.credentials.contains_key(&credential.id()) {
            return Err(DomainError::conflict(format!(
                "Credential with ID '{}' already exists",
                credential.id()
            )));
        }

        if tables.name_index.contains_key(credential.name().as_str()) {
            return Err(DomainError::conflict(format!(
                "Credential with name '{}' already exists",
                credential.name()
            )));
        }

        tables.check_digests(&credential)?;

        tables
            .name_index
            .insert(credential.name().as_str().to_string(), credential.id());
        tables.index_digests(&credential);
        tables.credentials.insert(credential.id(), credential.clone());

        Ok(credential)
    }

    async fn update(&self, credential: &Credential) -> Result<Credential, DomainError> {
        let mut tables = self.tables.write().await;

        let Some(existing) = tables.credentials.get(&credential.id()) else {
            return Err(DomainError::not_found(format!(
                "Credential '{}' not found",
                credential.id()
            )));
        };

        if existing.name() != credential.name() {
            return Err(DomainError::validation("Credential name cannot be changed"));
        }

        if existing.version() != credential.version() {
            return Err(DomainError::stale_write(format!(
                "Credential '{}' was modified concurrently",
                credential.id()
            )));
        }

        tables.check_digests(credential)?;

        let released: Vec<SecretDigest> = existing.digests().map(|(_, d)| d.clone()).collect();
        for digest in released {
            tables.digest_index.remove(&digest);
        }

        let mut stored = credential.clone();
        stored.advance_version();

        tables.index_digests(&stored);
        tables.credentials.insert(stored.id(), stored.clone());

        Ok(stored)
    }

    async fn list(&self, kind: Option<CredentialKind>) -> Result<Vec<Credential>, DomainError> {
        let tables = self.tables.read().await;

        let mut result: Vec<Credential> = tables
            .credentials
            .values()
            .filter(|c| kind.is_none_or(|k| c.kind() == k))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(result)
    }
}
