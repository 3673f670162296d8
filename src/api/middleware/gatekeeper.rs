//! Key enforcement for every inbound request
//!
//! The middleware reads the request facts and the presented secret, asks the
//! [`Gatekeeper`](crate::domain::Gatekeeper) for a decision, and either
//! forwards the request with the attributed credential in its extensions or
//! answers with the uniform rejection.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::config::GatekeeperConfig;
use crate::domain::{
    CredentialId, CredentialKind, Decision, DomainError, RequestFacts, ResolvedCredential,
    SecretSlot,
};

/// Header names the gatekeeper reads
#[derive(Debug, Clone)]
pub struct GatekeeperHeaders {
    pub api_key: HeaderName,
    pub client_secret: HeaderName,
    /// Client identity header inspected by the bypass rules
    pub client: HeaderName,
}

impl Default for GatekeeperHeaders {
    fn default() -> Self {
        Self {
            api_key: HeaderName::from_static("x-api-key"),
            client_secret: HeaderName::from_static("x-client-secret"),
            client: HeaderName::from_static("user-agent"),
        }
    }
}

impl GatekeeperHeaders {
    pub fn from_config(config: &GatekeeperConfig) -> Result<Self, DomainError> {
        Ok(Self {
            api_key: parse_header_name(&config.api_key_header)?,
            client_secret: parse_header_name(&config.client_secret_header)?,
            client: parse_header_name(&config.client_header)?,
        })
    }

    /// The presented secret: the API key header, else the client secret header
    fn presented<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        header_str(headers, &self.api_key).or_else(|| header_str(headers, &self.client_secret))
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, DomainError> {
    HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
        .map_err(|_| DomainError::configuration(format!("Invalid header name '{}'", name)))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
}

/// Identity attached to an admitted request
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedCredential {
    pub id: CredentialId,
    pub name: String,
    pub kind: CredentialKind,
    pub owner: Option<String>,
    pub slot: SecretSlot,
    /// Admitted by a bypass rule rather than by key validation
    pub bypassed: bool,
}

impl AuthenticatedCredential {
    fn from_resolved(resolved: &ResolvedCredential, bypassed: bool) -> Self {
        let credential = resolved.credential();

        Self {
            id: credential.id(),
            name: credential.name().to_string(),
            kind: credential.kind(),
            owner: credential.owner().map(|o| o.to_string()),
            slot: resolved.slot(),
            bypassed,
        }
    }
}

/// Gatekeeper middleware, installed with `from_fn_with_state`
pub async fn gatekeeper_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let today = state.clock.today();

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let client = header_str(request.headers(), &state.headers.client).map(str::to_owned);
    let presented = state.headers.presented(request.headers()).map(str::to_owned);

    let facts = RequestFacts::new(method.as_str(), &path, client.as_deref());
    let decision = state
        .gatekeeper
        .inspect(&facts, presented.as_deref(), today)
        .await;

    match decision {
        Decision::Admit {
            credential,
            bypassed,
        } => {
            if let Some(resolved) = credential {
                debug!(
                    credential_id = %resolved.credential().id(),
                    slot = %resolved.slot(),
                    bypassed,
                    "Request attributed to credential"
                );
                request
                    .extensions_mut()
                    .insert(AuthenticatedCredential::from_resolved(&resolved, bypassed));
            }

            next.run(request).await
        }
        Decision::Reject(reason) => {
            info!(
                method = %method,
                path = %path,
                reason = reason.as_str(),
                "Request rejected by gatekeeper"
            );

            ApiError::key_rejected().into_response()
        }
    }
}

/// Extractor for handlers that need the attributed credential
///
/// Rejects with the same response as the gatekeeper when the request carries
/// no identity (for example a bypassed request without a key).
#[derive(Debug, Clone)]
pub struct RequireCredential(pub AuthenticatedCredential);

impl<S> FromRequestParts<S> for RequireCredential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedCredential>()
            .cloned()
            .map(RequireCredential)
            .ok_or_else(ApiError::key_rejected)
    }
}
