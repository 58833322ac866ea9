//! Health check

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;
use crate::store::Store;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new().route("/health", get(health::<S>))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    database: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    status: &'static str,
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Liveness plus a store round trip; the opened unit is dropped unused
async fn health<S: Store>(State(state): State<AppState<S>>) -> Json<HealthResponse> {
    let start = Instant::now();
    let database = match state.store.begin().await {
        Ok(_tx) => CheckResult {
            status: "ok",
            latency_ms: Some(start.elapsed().as_millis() as u64),
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check: store unavailable");
            CheckResult {
                status: "error",
                latency_ms: None,
                message: Some("database unavailable".to_string()),
            }
        }
    };

    Json(HealthResponse {
        status: if database.status == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.environment.clone(),
        database,
    })
}
