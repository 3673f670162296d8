//! Request/response logging middleware with secret redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::api::state::AppState;

use super::gatekeeper::GatekeeperHeaders;

/// Log every request and its outcome. Secret-bearing headers, including the
/// configured key headers, are redacted.
///
/// Does not open its own span; `TraceLayer` already does.
pub async fn logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);
    let request_id = extract_request_id(&request);
    let headers_log = redact_headers(&request, &state.headers);

    info!(
        method = %method,
        path = %path,
        request_id = %request_id,
        headers = %headers_log,
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn extract_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn redact_headers(request: &Request<Body>, secret_headers: &GatekeeperHeaders) -> String {
    let mut parts = Vec::new();

    for (name, value) in request.headers() {
        let name_str = name.as_str();
        let sensitive = is_sensitive_header(name_str)
            || *name == secret_headers.api_key
            || *name == secret_headers.client_secret;

        if !sensitive && !should_log_header(name_str) {
            continue;
        }

        let value_str = if sensitive {
            "[REDACTED]"
        } else {
            value.to_str().unwrap_or("[invalid]")
        };

        parts.push(format!("{}={}", name_str, value_str));
    }

    parts.join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization"
            | "x-api-key"
            | "x-client-secret"
            | "cookie"
            | "set-cookie"
            | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_sensitive_header() {
        assert!(is_sensitive_header("authorization"));
        assert!(is_sensitive_header("x-api-key"));
        assert!(is_sensitive_header("x-client-secret"));
        assert!(!is_sensitive_header("user-agent"));
    }

    #[test]
    fn test_redact_headers() {
        let request = Request::builder()
            .uri("/api/orders/5")
            .header("x-api-key", "k1-plaintext")
            .header("user-agent", "okhttp/4.9")
            .header("etag", "abc")
            .body(Body::empty())
            .unwrap();

        let log = redact_headers(&request, &GatekeeperHeaders::default());

        assert!(log.contains("x-api-key=[REDACTED]"));
        assert!(log.contains("user-agent=okhttp/4.9"));
        assert!(!log.contains("k1-plaintext"));
        assert!(!log.contains("etag"));
    }

    #[test]
    fn test_redacts_configured_key_header() {
        let headers = GatekeeperHeaders {
            api_key: axum::http::HeaderName::from_static("x-partner-token"),
            ..GatekeeperHeaders::default()
        };
        let request = Request::builder()
            .header("x-partner-token", "plaintext")
            .body(Body::empty())
            .unwrap();

        let log = redact_headers(&request, &headers);
        assert_eq!(log, "x-partner-token=[REDACTED]");
    }
}
