//! Request logging middleware
//!
//! Logs every request with its id, method, matched route, status and
//! latency. Client and server errors are logged at `warn`.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(super::REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(%request_id, %method, %path, status, latency_ms, "Request completed with server error");
    } else if response.status().is_client_error() {
        warn!(%request_id, %method, %path, status, latency_ms, "Request completed with client error");
    } else {
        info!(%request_id, %method, %path, status, latency_ms, "Request completed");
    }

    response
}
