//! keygate
//!
//! Per-request API key authorization for an HTTP service:
//! - Credentials with a current and an optional previous secret for zero-downtime rotation
//! - Key owners that scope a credential to the paths it may call
//! - Configurable bypass rules for pre-flight requests, browsers and health checkers
//! - An admin API for issuing, rotating and reassigning credentials

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::middleware::GatekeeperHeaders;
use api::state::AppState;
use domain::{Gatekeeper, SystemClock};
use infrastructure::credential::CredentialRegistry;
use infrastructure::storage::StorageFactory;
use tracing::{info, warn};

/// Create the application state with default configuration and in-memory storage
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage = config.storage_config()?;
    info!(backend = ?storage.storage_type(), "Initializing storage");

    let repositories = StorageFactory::create(&storage).await?;

    let generator = config.secret_generator()?;
    let registry = Arc::new(
        CredentialRegistry::with_config(
            repositories.credentials,
            repositories.owners,
            config.registry_config(),
        )
        .with_generator(generator),
    );

    let policy = config.bypass_policy()?;
    info!(rules = policy.rules().len(), "Bypass policy loaded");

    let gatekeeper = Arc::new(Gatekeeper::new(registry.clone(), policy));
    let headers = GatekeeperHeaders::from_config(&config.gatekeeper)?;

    if config.admin.token.as_deref().is_none_or(str::is_empty) {
        warn!("No admin.token configured, the admin API is disabled");
    }

    Ok(
        AppState::new(registry, gatekeeper, Arc::new(SystemClock))
            .with_headers(headers)
            .with_admin_token(config.admin.token.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_app_state_defaults() {
        let state = create_app_state().await.unwrap();

        assert!(state.admin_token.is_none());
        assert_eq!(state.headers.api_key.as_str(), "x-api-key");
        assert_eq!(state.gatekeeper.policy().rules().len(), 4);
    }

    #[tokio::test]
    async fn test_create_app_state_with_custom_headers() {
        let mut config = AppConfig::default();
        config.gatekeeper.api_key_header = "X-Service-Key".to_string();
        config.admin.token = Some("s3cret".to_string());

        let state = create_app_state_with_config(&config).await.unwrap();

        assert_eq!(state.headers.api_key.as_str(), "x-service-key");
        assert!(state.admin_token.is_some());
    }

    #[tokio::test]
    async fn test_short_secret_bytes_fails() {
        let mut config = AppConfig::default();
        config.generator.secret_bytes = 0;

        assert!(create_app_state_with_config(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_backend_fails() {
        let mut config = AppConfig::default();
        config.storage.backend = "sqlite".to_string();

        assert!(create_app_state_with_config(&config).await.is_err());
    }
}
