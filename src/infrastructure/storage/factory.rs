//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::credential::CredentialRepository;
use crate::domain::key_owner::OwnerRepository;
use crate::domain::DomainError;
use crate::infrastructure::credential::{
    InMemoryCredentialRepository, PostgresCredentialRepository,
};
use crate::infrastructure::key_owner::{InMemoryOwnerRepository, PostgresOwnerRepository};

use super::postgres::PostgresConfig;

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// The repositories backing the registry
#[derive(Debug, Clone)]
pub struct Repositories {
    pub credentials: Arc<dyn CredentialRepository>,
    pub owners: Arc<dyn OwnerRepository>,
}

/// Factory for creating repositories
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the repositories for the configured backend
    pub async fn create(config: &StorageConfig) -> Result<Repositories, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Ok(Self::create_in_memory())
            }
            StorageConfig::Postgres(pg_config) => {
                info!("Connecting to PostgreSQL...");
                let pool = pg_config.connect().await?;
                info!("PostgreSQL connection established");

                let owners = PostgresOwnerRepository::new(pool.clone());
                owners.ensure_table().await?;

                let credentials = PostgresCredentialRepository::new(pool);
                credentials.ensure_tables().await?;

                Ok(Repositories {
                    credentials: Arc::new(credentials),
                    owners: Arc::new(owners),
                })
            }
        }
    }

    /// Creates empty in-memory repositories
    pub fn create_in_memory() -> Repositories {
        Repositories {
            credentials: Arc::new(InMemoryCredentialRepository::new()),
            owners: Arc::new(InMemoryOwnerRepository::new()),
        }
    }
}
