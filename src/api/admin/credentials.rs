//! Credential admin endpoints
//!
//! Responses never contain stored digests. The plaintext secret appears only
//! in the response to creation and rotation.

use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{Credential, CredentialKind};
use crate::infrastructure::credential::IssuedSecret;

/// Request to create a credential
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCredentialRequest {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub kind: CredentialKind,
}

/// Request to rotate a credential's secret
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RotateCredentialRequest {
    /// Last day the outgoing secret is honoured; omit to keep it until the next rotation
    #[serde(default)]
    pub previous_expires_on: Option<NaiveDate>,
}

/// Request to reassign a credential's owner
#[derive(Debug, Clone, Deserialize)]
pub struct ReassignOwnerRequest {
    pub owner: Option<String>,
}

/// Query for listing credentials
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCredentialsQuery {
    #[serde(default)]
    pub kind: Option<String>,
    /// Case-insensitive substring of the credential name
    #[serde(default)]
    pub name: Option<String>,
}

/// Credential response for admin API
#[derive(Debug, Clone, Serialize)]
pub struct CredentialResponse {
    pub id: String,
    pub kind: CredentialKind,
    pub name: String,
    pub owner: Option<String>,
    pub has_secret: bool,
    pub has_previous: bool,
    pub previous_expires_on: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Credential> for CredentialResponse {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id().to_string(),
            kind: credential.kind(),
            name: credential.name().to_string(),
            owner: credential.owner().map(|o| o.to_string()),
            has_secret: credential.has_secret(),
            has_previous: credential.previous().is_some(),
            previous_expires_on: credential.previous_expires_on(),
            created_at: credential.created_at().to_rfc3339(),
            updated_at: credential.updated_at().to_rfc3339(),
        }
    }
}

/// Credential response with the freshly issued secret
#[derive(Debug, Clone, Serialize)]
pub struct CredentialWithSecretResponse {
    #[serde(flatten)]
    pub credential: CredentialResponse,
    pub secret: String,
}

impl From<IssuedSecret> for CredentialWithSecretResponse {
    fn from(issued: IssuedSecret) -> Self {
        Self {
            credential: CredentialResponse::from(&issued.credential),
            secret: issued.secret,
        }
    }
}

/// List credentials response
#[derive(Debug, Clone, Serialize)]
pub struct ListCredentialsResponse {
    pub credentials: Vec<CredentialResponse>,
    pub total: usize,
}

/// GET /admin/credentials
pub async fn list_credentials(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ListCredentialsQuery>,
) -> Result<Json<ListCredentialsResponse>, ApiError> {
    debug!(kind = ?query.kind, name = ?query.name, "Admin listing credentials");

    let kind = query
        .kind
        .as_deref()
        .map(CredentialKind::parse)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()).with_param("kind"))?;

    let needle = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_lowercase);

    let credentials: Vec<CredentialResponse> = state
        .registry
        .list_credentials(kind)
        .await?
        .iter()
        .filter(|c| {
            needle
                .as_deref()
                .is_none_or(|n| c.name().as_str().to_lowercase().contains(n))
        })
        .map(CredentialResponse::from)
        .collect();
    let total = credentials.len();

    Ok(Json(ListCredentialsResponse { credentials, total }))
}

/// POST /admin/credentials
pub async fn create_credential(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<CreateCredentialRequest>,
) -> Result<Json<CredentialWithSecretResponse>, ApiError> {
    debug!(name = %request.name, kind = %request.kind, "Admin creating credential");

    let issued = state
        .registry
        .create_credential(request.kind, &request.name, request.owner.as_deref())
        .await?;

    Ok(Json(issued.into()))
}

/// GET /admin/credentials/{id}
pub async fn get_credential(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<CredentialResponse>, ApiError> {
    debug!(credential_id = %id, "Admin getting credential");

    let credential = state
        .registry
        .get_credential(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Credential '{}' not found", id)))?;

    Ok(Json(CredentialResponse::from(&credential)))
}

/// POST /admin/credentials/{id}/rotate
pub async fn rotate_credential(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(request): Json<RotateCredentialRequest>,
) -> Result<Json<CredentialWithSecretResponse>, ApiError> {
    debug!(credential_id = %id, "Admin rotating credential");

    let issued = state
        .registry
        .rotate(&id, request.previous_expires_on)
        .await?;

    Ok(Json(issued.into()))
}

/// PUT /admin/credentials/{id}/owner
pub async fn reassign_owner(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(request): Json<ReassignOwnerRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    debug!(credential_id = %id, owner = ?request.owner, "Admin reassigning credential owner");

    let credential = state
        .registry
        .reassign_owner(&id, request.owner.as_deref())
        .await?;

    Ok(Json(CredentialResponse::from(&credential)))
}
