//! Liveness and readiness probes
//!
//! These paths carry no `/api/` marker, so the default bypass rules let probes
//! through without a key.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_rules: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stores: Vec<StoreCheck>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of probing one store
#[derive(Debug, Serialize)]
pub struct StoreCheck {
    pub store: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

/// Returns 200 while the process is serving
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION"),
        bypass_rules: None,
        stores: Vec::new(),
    })
}

/// Returns 503 unless both stores answer
///
/// A gatekeeper without storage rejects every enforced request, so the
/// instance should be taken out of rotation.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let stores = vec![
        probe("owners", async {
            state.registry.list_owners().await.map(|owners| owners.len())
        })
        .await,
        probe("credentials", state.registry.count_credentials()).await,
    ];

    let status = if stores.iter().all(|s| s.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        bypass_rules: Some(state.gatekeeper.policy().rules().len()),
        stores,
    };

    (status_code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn probe<E, F>(store: &'static str, check: F) -> StoreCheck
where
    E: std::fmt::Display,
    F: std::future::Future<Output = Result<usize, E>>,
{
    let start = Instant::now();
    let result = check.await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(records) => StoreCheck {
            store,
            status: HealthStatus::Healthy,
            records: Some(records),
            error: None,
            latency_ms,
        },
        Err(e) => StoreCheck {
            store,
            status: HealthStatus::Unhealthy,
            records: None,
            error: Some(e.to_string()),
            latency_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_body_omits_store_details() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0",
            bypass_rules: None,
            stores: Vec::new(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"healthy","version":"0.1.0"}"#);
    }

    #[tokio::test]
    async fn test_probe_counts_records() {
        let check = probe("owners", async { Ok::<_, String>(3) }).await;

        assert_eq!(check.status, HealthStatus::Healthy);
        assert_eq!(check.records, Some(3));
        assert!(check.error.is_none());
    }

    #[tokio::test]
    async fn test_probe_reports_failure() {
        let check = probe("credentials", async {
            Err::<usize, _>("connection refused")
        })
        .await;

        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.error.as_deref(), Some("connection refused"));
        assert!(check.records.is_none());
    }
}
