//! Key owner admin endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::KeyOwner;

/// Request to create an owner
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOwnerRequest {
    pub name: String,
    pub path_re: String,
}

/// Request to replace an owner's path rule
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOwnerRequest {
    pub path_re: String,
}

/// Owner response for admin API
#[derive(Debug, Clone, Serialize)]
pub struct OwnerResponse {
    pub name: String,
    pub path_re: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&KeyOwner> for OwnerResponse {
    fn from(owner: &KeyOwner) -> Self {
        Self {
            name: owner.name().to_string(),
            path_re: owner.path_re().as_str().to_string(),
            created_at: owner.created_at().to_rfc3339(),
            updated_at: owner.updated_at().to_rfc3339(),
        }
    }
}

/// List owners response
#[derive(Debug, Clone, Serialize)]
pub struct ListOwnersResponse {
    pub owners: Vec<OwnerResponse>,
    pub total: usize,
}

/// GET /admin/owners
pub async fn list_owners(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ListOwnersResponse>, ApiError> {
    debug!("Admin listing owners");

    let owners: Vec<OwnerResponse> = state
        .registry
        .list_owners()
        .await?
        .iter()
        .map(OwnerResponse::from)
        .collect();
    let total = owners.len();

    Ok(Json(ListOwnersResponse { owners, total }))
}

/// POST /admin/owners
pub async fn create_owner(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<CreateOwnerRequest>,
) -> Result<Json<OwnerResponse>, ApiError> {
    debug!(name = %request.name, "Admin creating owner");

    let owner = state
        .registry
        .create_owner(&request.name, &request.path_re)
        .await?;

    Ok(Json(OwnerResponse::from(&owner)))
}

/// GET /admin/owners/{name}
pub async fn get_owner(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(name): Path<String>,
) -> Result<Json<OwnerResponse>, ApiError> {
    debug!(name = %name, "Admin getting owner");

    let owner = state
        .registry
        .get_owner(&name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Owner '{}' not found", name)))?;

    Ok(Json(OwnerResponse::from(&owner)))
}

/// PUT /admin/owners/{name}
pub async fn update_owner(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(name): Path<String>,
    Json(request): Json<UpdateOwnerRequest>,
) -> Result<Json<OwnerResponse>, ApiError> {
    debug!(name = %name, "Admin updating owner");

    let owner = state
        .registry
        .update_owner(&name, &request.path_re)
        .await?;

    Ok(Json(OwnerResponse::from(&owner)))
}
