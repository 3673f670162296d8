//! Endpoints that exercise the gatekeeper

use axum::http::{Method, Uri};
use axum::Extension;
use serde::Serialize;

use crate::api::middleware::{AuthenticatedCredential, RequireCredential};
use crate::api::types::Json;

/// Identity response
#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub credential: AuthenticatedCredential,
}

/// GET /api/whoami - the credential the request was admitted with
pub async fn whoami(RequireCredential(credential): RequireCredential) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse { credential })
}

/// Plain page response
#[derive(Debug, Serialize)]
pub struct TestPageResponse {
    pub ok: bool,
    /// Name of the credential the request was attributed to, if any
    pub attributed_to: Option<String>,
}

/// GET /test/ - outside the API prefix, so never enforced
pub async fn test_page(
    credential: Option<Extension<AuthenticatedCredential>>,
) -> Json<TestPageResponse> {
    Json(TestPageResponse {
        ok: true,
        attributed_to: credential.map(|Extension(c)| c.name),
    })
}

/// Echo response
#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub method: String,
    pub path: String,
    pub credential: Option<AuthenticatedCredential>,
}

/// ANY /api/echo/{*rest} - echoes the request and whatever identity it carries
pub async fn echo(
    method: Method,
    uri: Uri,
    credential: Option<Extension<AuthenticatedCredential>>,
) -> Json<EchoResponse> {
    Json(EchoResponse {
        method: method.to_string(),
        path: uri.path().to_string(),
        credential: credential.map(|Extension(c)| c),
    })
}
