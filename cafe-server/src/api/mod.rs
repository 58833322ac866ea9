//! HTTP API
//!
//! One router per resource, merged by [`build_router`]. [`build_app`] adds
//! the middleware stack and binds the state; the server and the integration
//! tests both go through it.

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::state::AppState;
use crate::store::Store;

pub mod health;
pub mod inventory;
pub mod menu;
pub mod middleware;
pub mod orders;
pub mod reports;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .merge(inventory::router())
        .merge(menu::router())
        .merge(orders::router())
        .merge(reports::router())
        // Health API - no store writes
        .merge(health::router())
}

/// Build the fully configured application with middleware and state
pub fn build_app<S: Store>(state: AppState<S>) -> Router {
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .with_state(state)
}
