use std::time::Duration;

use serde::Deserialize;

use crate::domain::{BypassPolicy, BypassRule, DomainError};
use crate::infrastructure::credential::{RegistryConfig, SecretGenerator};
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub gatekeeper: GatekeeperConfig,
    pub generator: GeneratorConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend and request-path lookup tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    /// Required for the postgres backend; `DATABASE_URL` is used when unset
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Upper bound on a single secret lookup while serving a request
    pub lookup_timeout_ms: u64,
    pub owner_cache_ttl_secs: u64,
}

/// Header names and bypass rules for the request gatekeeper
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub api_key_header: String,
    pub client_secret_header: String,
    /// Header carrying the client identity the bypass rules inspect
    pub client_header: String,
    /// Ordered exemption rules
    pub bypass: Vec<BypassRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Attempts at a non-colliding secret before giving up
    pub max_attempts: u32,
    /// Random bytes per secret
    pub secret_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token for the admin API. Admin routes refuse every call when unset.
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
            lookup_timeout_ms: 500,
            owner_cache_ttl_secs: 30,
        }
    }
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            api_key_header: "x-api-key".to_string(),
            client_secret_header: "x-client-secret".to_string(),
            client_header: "user-agent".to_string(),
            bypass: BypassPolicy::default().rules().to_vec(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            secret_bytes: 30,
        }
    }
}

/// The shipped `config/default.toml`, compiled in so its bypass rules apply
/// whatever the working directory
const SHIPPED_DEFAULTS: &str = include_str!("../../config/default.toml");

impl AppConfig {
    /// Shipped defaults, then `config/default` and `config/local` from the
    /// working directory, then `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(
                SHIPPED_DEFAULTS,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Secret generator for issuance; refuses secrets too short to be unguessable
    pub fn secret_generator(&self) -> Result<SecretGenerator, DomainError> {
        if self.generator.secret_bytes < SecretGenerator::MIN_SECRET_BYTES {
            return Err(DomainError::configuration(format!(
                "generator.secret_bytes must be at least {}, got {}",
                SecretGenerator::MIN_SECRET_BYTES,
                self.generator.secret_bytes
            )));
        }

        Ok(SecretGenerator::new().with_secret_bytes(self.generator.secret_bytes))
    }

    /// Build the bypass policy from the configured rules
    pub fn bypass_policy(&self) -> Result<BypassPolicy, DomainError> {
        BypassPolicy::new(self.gatekeeper.bypass.clone())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_attempts: self.generator.max_attempts.max(1),
            lookup_timeout: Duration::from_millis(self.storage.lookup_timeout_ms),
            owner_cache_ttl: Duration::from_secs(self.storage.owner_cache_ttl_secs),
            ..RegistryConfig::default()
        }
    }

    /// Resolve the storage backend, reading `DATABASE_URL` when no URL is configured
    pub fn storage_config(&self) -> Result<StorageConfig, DomainError> {
        let backend = StorageType::from_str(&self.storage.backend).ok_or_else(|| {
            DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                self.storage.backend
            ))
        })?;

        match backend {
            StorageType::InMemory => Ok(StorageConfig::InMemory),
            StorageType::Postgres => {
                let url = self
                    .storage
                    .database_url
                    .clone()
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| {
                        DomainError::configuration(
                            "storage.database_url or DATABASE_URL is required for postgres",
                        )
                    })?;

                Ok(StorageConfig::Postgres(
                    PostgresConfig::new(url).with_max_connections(self.storage.max_connections),
                ))
            }
        }
    }
}
