//! Admin API endpoints for managing owners and credentials
//!
//! There are no delete routes: owners and credentials are only superseded.

pub mod credentials;
pub mod owners;

use axum::{
    routing::{get, post, put},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Owner management
        .route("/owners", get(owners::list_owners).post(owners::create_owner))
        .route("/owners/{name}", get(owners::get_owner).put(owners::update_owner))
        // Credential management
        .route(
            "/credentials",
            get(credentials::list_credentials).post(credentials::create_credential),
        )
        .route("/credentials/{id}", get(credentials::get_credential))
        .route("/credentials/{id}/rotate", post(credentials::rotate_credential))
        .route("/credentials/{id}/owner", put(credentials::reassign_owner))
}
