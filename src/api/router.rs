use axum::{
    middleware::from_fn_with_state,
    routing::{any, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin;
use super::demo;
use super::health;
use super::middleware::{gatekeeper_middleware, logging_middleware};
use super::state::AppState;

/// Create the full router with application state
///
/// Every route, the fallback included, sits behind the gatekeeper. Paths
/// outside the API prefix (health, admin, `/test/`) are exempted by the
/// default bypass rules; the admin API has its own token check.
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Gatekeeper demo endpoints
        .route("/api/whoami", get(demo::whoami))
        .route("/api/echo/{*rest}", any(demo::echo))
        .route("/test/", get(demo::test_page))
        // Admin API
        .nest("/admin", admin::create_admin_router())
        .layer(from_fn_with_state(state.clone(), gatekeeper_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(state.clone(), logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::credential::MockCredentialResolver;
    use crate::domain::{BypassPolicy, BypassRule, DomainError, FixedClock, Gatekeeper};
    use crate::infrastructure::credential::CredentialRegistry;
    use crate::infrastructure::storage::StorageFactory;

    const ADMIN_TOKEN: &str = "admin-token";
    const CURL: &str = "curl/8.4.0";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn registry() -> Arc<CredentialRegistry> {
        let repos = StorageFactory::create_in_memory();
        Arc::new(CredentialRegistry::new(repos.credentials, repos.owners))
    }

    fn app_on(registry: Arc<CredentialRegistry>, today: NaiveDate) -> Router {
        let gatekeeper = Gatekeeper::new(registry.clone(), BypassPolicy::default());
        let state = AppState::new(registry, Arc::new(gatekeeper), Arc::new(FixedClock(today)))
            .with_admin_token(Some(ADMIN_TOKEN.to_string()));

        create_router_with_state(state)
    }

    fn get(uri: &str, key: Option<&str>, agent: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", agent);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn admin(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn rejection() -> Value {
        json!({"error": {"message": "API key missing or invalid.", "type": "permission_error"}})
    }

    /// Owner `orders` restricted to `^/api/echo/orders/` plus one key; returns (id, secret)
    async fn seed_orders(app: &Router) -> (String, String) {
        let (status, _) = send(
            app,
            admin(
                "POST",
                "/admin/owners",
                json!({"name": "orders", "path_re": "^/api/echo/orders/"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app,
            admin(
                "POST",
                "/admin/credentials",
                json!({"name": "ios", "owner": "orders"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        (
            body["id"].as_str().unwrap().to_string(),
            body["secret"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health_is_bypassed() {
        let app = app_on(registry(), date(2024, 12, 31));

        let (status, body) = send(&app, get("/health", None, CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_stores() {
        let app = app_on(registry(), date(2024, 12, 31));
        seed_orders(&app).await;

        let (status, body) = send(&app, get("/ready", None, CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bypass_rules"], 4);
        assert_eq!(body["stores"][0]["store"], "owners");
        assert_eq!(body["stores"][0]["records"], 1);
        assert_eq!(body["stores"][1]["records"], 1);
    }

    #[tokio::test]
    async fn test_non_api_page_needs_no_key() {
        let app = app_on(registry(), date(2024, 12, 31));

        let (status, body) = send(&app, get("/test/", None, CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["attributed_to"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_key_rejected_for_plain_client() {
        let app = app_on(registry(), date(2024, 12, 31));

        let (status, body) = send(&app, get("/api/echo/orders/5", None, CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());
    }

    #[tokio::test]
    async fn test_browser_admitted_without_credential() {
        let app = app_on(registry(), date(2024, 12, 31));

        let (status, body) = send(
            &app,
            get("/api/echo/orders/5", None, "Mozilla/5.0 (Macintosh)"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential"], Value::Null);
    }

    #[tokio::test]
    async fn test_preflight_not_rejected() {
        let app = app_on(registry(), date(2024, 12, 31));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/echo/orders/5")
            .header("user-agent", CURL)
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_orders_scenario_with_rotation() {
        let registry = registry();
        let before = app_on(registry.clone(), date(2024, 12, 31));
        let after = app_on(registry, date(2025, 1, 2));

        let (id, k1) = seed_orders(&before).await;

        let (status, body) = send(&before, get("/api/echo/orders/5", Some(&k1), CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential"]["name"], "ios");
        assert_eq!(body["credential"]["slot"], "current");

        let (status, body) = send(&before, get("/api/echo/billing/5", Some(&k1), CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());

        let (status, body) = send(
            &before,
            admin(
                "POST",
                &format!("/admin/credentials/{id}/rotate"),
                json!({"previous_expires_on": "2025-01-01"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_previous"], true);
        assert_eq!(body["previous_expires_on"], "2025-01-01");
        let k2 = body["secret"].as_str().unwrap().to_string();

        // both keys work on 2024-12-31
        let (status, body) = send(&before, get("/api/echo/orders/5", Some(&k1), CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential"]["slot"], "previous");
        let (status, _) = send(&before, get("/api/echo/orders/5", Some(&k2), CURL)).await;
        assert_eq!(status, StatusCode::OK);

        // only the new key works on 2025-01-02
        let (status, body) = send(&after, get("/api/echo/orders/5", Some(&k1), CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());
        let (status, _) = send(&after, get("/api/echo/orders/5", Some(&k2), CURL)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_secret_header_accepted() {
        let app = app_on(registry(), date(2024, 12, 31));
        let (_, secret) = seed_orders(&app).await;

        let request = Request::builder()
            .uri("/api/echo/orders/1")
            .header("user-agent", CURL)
            .header("x-client-secret", secret)
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_key_rejected() {
        let app = app_on(registry(), date(2024, 12, 31));
        seed_orders(&app).await;

        let (status, body) = send(
            &app,
            get("/api/echo/orders/5", Some("not-a-real-key"), CURL),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());
    }

    #[tokio::test]
    async fn test_ownerless_key_rejected() {
        let app = app_on(registry(), date(2024, 12, 31));

        let (_, body) = send(
            &app,
            admin("POST", "/admin/credentials", json!({"name": "orphan"})),
        )
        .await;
        let secret = body["secret"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get("/api/echo/orders/5", Some(&secret), CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());
    }

    #[tokio::test]
    async fn test_bypassed_request_attributed_when_key_is_valid() {
        let app = app_on(registry(), date(2024, 12, 31));
        let (_, secret) = seed_orders(&app).await;

        let (status, body) =
            send(&app, get("/api/echo/orders/5", Some(&secret), "Mozilla/5.0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential"]["name"], "ios");
        assert_eq!(body["credential"]["bypassed"], true);

        // outside the owner's paths the key does not count
        let (status, body) = send(&app, get("/test/", Some(&secret), CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["attributed_to"], Value::Null);
    }

    #[tokio::test]
    async fn test_expired_key_never_identifies_a_bypassed_request() {
        let registry = registry();
        let before = app_on(registry.clone(), date(2024, 12, 31));
        let after = app_on(registry.clone(), date(2025, 1, 2));

        let (id, k1) = seed_orders(&before).await;
        registry
            .rotate(&id, Some(date(2025, 1, 1)))
            .await
            .unwrap();

        let (status, body) = send(&after, get("/api/whoami", Some(&k1), "Mozilla/5.0")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());

        let (status, body) =
            send(&after, get("/api/echo/orders/5", Some(&k1), "Mozilla/5.0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential"], Value::Null);
    }

    #[tokio::test]
    async fn test_whoami_requires_identity() {
        let registry = registry();
        let app = app_on(registry.clone(), date(2024, 12, 31));

        // browsers pass the gatekeeper but have no identity to report
        let (status, body) = send(&app, get("/api/whoami", None, "Mozilla/5.0")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());

        registry.create_owner("api", "^/api/").await.unwrap();
        let issued = registry
            .create_credential(crate::domain::CredentialKind::ApiKey, "android", Some("api"))
            .await
            .unwrap();

        let (status, body) = send(&app, get("/api/whoami", Some(&issued.secret), CURL)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential"]["name"], "android");
        assert_eq!(body["credential"]["owner"], "api");
        assert_eq!(body["credential"]["bypassed"], false);
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_closed() {
        let mut resolver = MockCredentialResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(DomainError::timeout(500)));

        let gatekeeper = Gatekeeper::new(Arc::new(resolver), BypassPolicy::default());
        let state = AppState::new(
            registry(),
            Arc::new(gatekeeper),
            Arc::new(FixedClock(date(2024, 12, 31))),
        );
        let app = create_router_with_state(state);

        let (status, body) = send(&app, get("/api/echo/orders/5", Some("k1"), CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, rejection());

        // bypassed requests still go through
        let (status, _) = send(&app, get("/test/", Some("k1"), CURL)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_callback_path_bypassed_by_config() {
        let registry = registry();
        let mut rules = BypassPolicy::default().rules().to_vec();
        rules.push(BypassRule::PathEquals {
            paths: vec!["/api/echo/callback/".to_string()],
        });
        let gatekeeper = Gatekeeper::new(registry.clone(), BypassPolicy::new(rules).unwrap());
        let state = AppState::new(
            registry,
            Arc::new(gatekeeper),
            Arc::new(FixedClock(date(2024, 12, 31))),
        );
        let app = create_router_with_state(state);

        let (status, _) = send(&app, get("/api/echo/callback/", None, CURL)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, get("/api/echo/callback/x", None, CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let app = app_on(registry(), date(2024, 12, 31));

        let (status, _) = send(&app, get("/admin/owners", None, CURL)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/admin/owners")
            .header("authorization", "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_disabled_without_token() {
        let registry = registry();
        let gatekeeper = Gatekeeper::new(registry.clone(), BypassPolicy::default());
        let state = AppState::new(
            registry,
            Arc::new(gatekeeper),
            Arc::new(FixedClock(date(2024, 12, 31))),
        );
        let app = create_router_with_state(state);

        let (status, _) = send(&app, admin("GET", "/admin/owners", json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_validation_and_conflicts() {
        let app = app_on(registry(), date(2024, 12, 31));
        seed_orders(&app).await;

        let (status, _) = send(
            &app,
            admin(
                "POST",
                "/admin/owners",
                json!({"name": "billing", "path_re": "^/api/(billing"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            admin(
                "POST",
                "/admin/owners",
                json!({"name": "orders", "path_re": "^/api/"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            admin(
                "POST",
                "/admin/credentials",
                json!({"name": "ios", "owner": "orders"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            admin("GET", "/admin/credentials/not-a-uuid", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_listing_hides_secrets() {
        let app = app_on(registry(), date(2024, 12, 31));
        let (id, secret) = seed_orders(&app).await;

        let (status, body) = send(
            &app,
            admin("GET", "/admin/credentials?kind=api_key", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["credentials"][0]["id"], id.as_str());
        assert!(!body.to_string().contains(&secret));
        assert!(!body.to_string().contains("sha256$"));
    }

    #[tokio::test]
    async fn test_admin_listing_searches_by_name() {
        let app = app_on(registry(), date(2024, 12, 31));
        seed_orders(&app).await;
        for name in ["android", "backend-ios"] {
            let (status, _) = send(
                &app,
                admin("POST", "/admin/credentials", json!({"name": name})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&app, admin("GET", "/admin/credentials?name=IOS", json!({}))).await;
        assert_eq!(body["total"], 2);

        let (_, body) = send(
            &app,
            admin("GET", "/admin/credentials?name=andr&kind=api_key", json!({})),
        )
        .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["credentials"][0]["name"], "android");

        let (_, body) = send(&app, admin("GET", "/admin/credentials?name=", json!({}))).await;
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn test_reassign_owner_through_admin() {
        let app = app_on(registry(), date(2024, 12, 31));
        let (id, secret) = seed_orders(&app).await;

        let (status, body) = send(
            &app,
            admin(
                "PUT",
                &format!("/admin/credentials/{id}/owner"),
                json!({"owner": null}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], Value::Null);

        let (status, _) = send(&app, get("/api/echo/orders/5", Some(&secret), CURL)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let app = app_on(registry(), date(2024, 12, 31));

        let response = app.oneshot(get("/health", None, CURL)).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
