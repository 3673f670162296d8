//! Credential registry
//!
//! High-level operations over owners and credentials: issuing and rotating
//! secrets, owner management, and resolving presented secrets on the request
//! path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use tracing::{debug, info, warn};

use crate::domain::credential::{
    Credential, CredentialId, CredentialKind, CredentialName, CredentialRepository,
    CredentialResolver, ResolvedCredential, SecretDigest,
};
use crate::domain::key_owner::{KeyOwner, OwnerName, OwnerRepository, PathPattern};
use crate::domain::DomainError;

use super::generator::SecretGenerator;

/// A credential together with the plaintext secret it was just issued
///
/// This is the only place a plaintext secret ever exists; it is not stored.
#[derive(Clone)]
pub struct IssuedSecret {
    pub credential: Credential,
    pub secret: String,
}

impl std::fmt::Debug for IssuedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedSecret")
            .field("credential", &self.credential)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Tunables for the registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Generation attempts before giving up on a unique secret
    pub max_attempts: u32,
    /// Bound on every request-path lookup
    pub lookup_timeout: Duration,
    /// How long a loaded owner is served from cache
    pub owner_cache_ttl: Duration,
    /// Maximum number of cached owners
    pub owner_cache_capacity: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lookup_timeout: Duration::from_millis(500),
            owner_cache_ttl: Duration::from_secs(30),
            owner_cache_capacity: 1_000,
        }
    }
}

/// Registry of owners and credentials
pub struct CredentialRegistry {
    credentials: Arc<dyn CredentialRepository>,
    owners: Arc<dyn OwnerRepository>,
    owner_cache: Cache<OwnerName, Arc<KeyOwner>>,
    generator: SecretGenerator,
    config: RegistryConfig,
}

impl std::fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRegistry")
            .field("credentials", &self.credentials)
            .field("owners", &self.owners)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CredentialRegistry {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        owners: Arc<dyn OwnerRepository>,
    ) -> Self {
        Self::with_config(credentials, owners, RegistryConfig::default())
    }

    pub fn with_config(
        credentials: Arc<dyn CredentialRepository>,
        owners: Arc<dyn OwnerRepository>,
        config: RegistryConfig,
    ) -> Self {
        let owner_cache = Cache::builder()
            .time_to_live(config.owner_cache_ttl)
            .max_capacity(config.owner_cache_capacity)
            .build();

        Self {
            credentials,
            owners,
            owner_cache,
            generator: SecretGenerator::new(),
            config,
        }
    }

    /// Use a custom generator
    pub fn with_generator(mut self, generator: SecretGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // Owners

    /// Create a new owner
    pub async fn create_owner(&self, name: &str, path_re: &str) -> Result<KeyOwner, DomainError> {
        let name = OwnerName::new(name)?;
        let path_re = PathPattern::new(path_re)?;

        info!(owner = %name, path_re = %path_re, "Creating key owner");

        if self.owners.get(&name).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Owner '{}' already exists",
                name
            )));
        }

        self.owners.create(KeyOwner::new(name, path_re)).await
    }

    /// Replace an owner's path rule
    pub async fn update_owner(&self, name: &str, path_re: &str) -> Result<KeyOwner, DomainError> {
        let name = OwnerName::new(name)?;
        let path_re = PathPattern::new(path_re)?;

        info!(owner = %name, path_re = %path_re, "Updating key owner");

        let mut owner = self.require_owner(&name).await?;
        owner.set_path_re(path_re);

        let updated = self.owners.update(&owner).await?;
        self.owner_cache.invalidate(&name).await;

        Ok(updated)
    }

    pub async fn get_owner(&self, name: &str) -> Result<Option<KeyOwner>, DomainError> {
        let name = OwnerName::new(name)?;
        self.owners.get(&name).await
    }

    pub async fn list_owners(&self) -> Result<Vec<KeyOwner>, DomainError> {
        self.owners.list().await
    }

    // Credentials

    /// Create a credential and issue its first secret
    pub async fn create_credential(
        &self,
        kind: CredentialKind,
        name: &str,
        owner: Option<&str>,
    ) -> Result<IssuedSecret, DomainError> {
        let name = CredentialName::new(name)?;
        let owner = self.existing_owner_name(owner).await?;

        info!(kind = %kind, name = %name, "Creating credential");

        if self.credentials.get_by_name(&name).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Credential with name '{}' already exists",
                name
            )));
        }

        let credential = Credential::new(kind, name, owner);
        let issued = self
            .issue(&credential, None, |c| self.credentials.create(c))
            .await?;

        info!(credential_id = %issued.credential.id(), "Credential created");
        Ok(issued)
    }

    /// Rotate a credential's secret
    ///
    /// The current secret moves to the previous slot and stays valid through
    /// `previous_expires_on` (indefinitely when `None`). A credential that has
    /// never been issued a secret simply receives its first one.
    pub async fn rotate(
        &self,
        id: &str,
        previous_expires_on: Option<NaiveDate>,
    ) -> Result<IssuedSecret, DomainError> {
        let credential = self.require_credential(id).await?;

        info!(
            credential_id = %credential.id(),
            previous_expires_on = ?previous_expires_on,
            first_issue = !credential.has_secret(),
            "Rotating credential secret"
        );

        let issued = self
            .issue(&credential, previous_expires_on, |c| async move {
                self.credentials.update(&c).await
            })
            .await?;

        info!(credential_id = %issued.credential.id(), "Credential secret rotated");
        Ok(issued)
    }

    pub async fn get_credential(&self, id: &str) -> Result<Option<Credential>, DomainError> {
        let id = CredentialId::parse(id)?;
        self.credentials.get(&id).await
    }

    pub async fn list_credentials(
        &self,
        kind: Option<CredentialKind>,
    ) -> Result<Vec<Credential>, DomainError> {
        self.credentials.list(kind).await
    }

    pub async fn count_credentials(&self) -> Result<usize, DomainError> {
        self.credentials.count(None).await
    }

    /// Point a credential at a different owner, or at none
    pub async fn reassign_owner(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Credential, DomainError> {
        let mut credential = self.require_credential(id).await?;
        let owner = self.existing_owner_name(owner).await?;

        info!(
            credential_id = %credential.id(),
            owner = ?owner.as_ref().map(OwnerName::as_str),
            "Reassigning credential owner"
        );

        credential.set_owner(owner);
        self.credentials.update(&credential).await
    }

    /// Generate secrets until one persists without colliding
    async fn issue<F, Fut>(
        &self,
        base: &Credential,
        previous_expires_on: Option<NaiveDate>,
        persist: F,
    ) -> Result<IssuedSecret, DomainError>
    where
        F: Fn(Credential) -> Fut,
        Fut: std::future::Future<Output = Result<Credential, DomainError>>,
    {
        for attempt in 1..=self.config.max_attempts {
            let generated = self.generator.generate();

            let mut candidate = base.clone();
            candidate.rotate_to(generated.digest, previous_expires_on);

            match persist(candidate).await {
                Ok(credential) => {
                    return Ok(IssuedSecret {
                        credential,
                        secret: generated.secret,
                    });
                }
                Err(e) if e.is_conflict() => {
                    warn!(
                        credential_id = %base.id(),
                        attempt,
                        "Generated secret collided, regenerating"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::internal(format!(
            "Secret generation exhausted after {} attempts",
            self.config.max_attempts
        )))
    }

    async fn require_credential(&self, id: &str) -> Result<Credential, DomainError> {
        let id = CredentialId::parse(id)?;

        self.credentials
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Credential '{}' not found", id)))
    }

    async fn require_owner(&self, name: &OwnerName) -> Result<KeyOwner, DomainError> {
        self.owners
            .get(name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Owner '{}' not found", name)))
    }

    /// Validate an optional owner reference against the stored owners
    async fn existing_owner_name(
        &self,
        owner: Option<&str>,
    ) -> Result<Option<OwnerName>, DomainError> {
        let Some(owner) = owner else {
            return Ok(None);
        };

        let name = OwnerName::new(owner)?;
        if self.owners.get(&name).await?.is_none() {
            return Err(DomainError::validation(format!(
                "Owner '{}' does not exist",
                name
            )));
        }

        Ok(Some(name))
    }

    /// Owner lookup through the TTL cache; misses are not cached
    async fn cached_owner(&self, name: &OwnerName) -> Result<Option<KeyOwner>, DomainError> {
        if let Some(cached) = self.owner_cache.get(name).await {
            debug!(owner = %name, "Cache hit for owner");
            return Ok(Some((*cached).clone()));
        }

        let owner = self.owners.get(name).await?;
        if let Some(ref owner) = owner {
            self.owner_cache
                .insert(name.clone(), Arc::new(owner.clone()))
                .await;
        }

        Ok(owner)
    }

    async fn lookup(&self, secret: &str) -> Result<Option<ResolvedCredential>, DomainError> {
        let digest = SecretDigest::of(secret);

        let Some((credential, slot)) = self.credentials.find_by_digest(&digest).await? else {
            return Ok(None);
        };

        let owner = match credential.owner() {
            Some(name) => self.cached_owner(name).await?,
            None => None,
        };

        Ok(Some(ResolvedCredential::new(credential, slot, owner)))
    }
}

#[async_trait]
impl CredentialResolver for CredentialRegistry {
    async fn resolve(&self, secret: &str) -> Result<Option<ResolvedCredential>, DomainError> {
        let timeout = self.config.lookup_timeout;

        tokio::time::timeout(timeout, self.lookup(secret))
            .await
            .map_err(|_| DomainError::timeout(timeout.as_millis() as u64))?
    }
}
