//! Application state shared by handlers and middleware

use std::sync::Arc;

use crate::domain::{Clock, Gatekeeper};
use crate::infrastructure::credential::CredentialRegistry;

use super::middleware::GatekeeperHeaders;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CredentialRegistry>,
    pub gatekeeper: Arc<Gatekeeper>,
    pub clock: Arc<dyn Clock>,
    pub headers: Arc<GatekeeperHeaders>,
    /// Bearer token for the admin API; `None` locks the admin API
    pub admin_token: Option<Arc<str>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .field("gatekeeper", &self.gatekeeper)
            .field("clock", &self.clock)
            .field("headers", &self.headers)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppState {
    pub fn new(
        registry: Arc<CredentialRegistry>,
        gatekeeper: Arc<Gatekeeper>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            gatekeeper,
            clock,
            headers: Arc::new(GatekeeperHeaders::default()),
            admin_token: None,
        }
    }

    pub fn with_headers(mut self, headers: GatekeeperHeaders) -> Self {
        self.headers = Arc::new(headers);
        self
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }
}
