//! Orders API

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{BatchOrderRequest, BatchOrderResult, Order, OrderRequest};

use crate::services::orders::ItemsSoldQuery;
use crate::state::AppState;
use crate::store::Store;

type ApiResult<T> = Result<Json<T>, AppError>;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/orders", get(list::<S>).post(create::<S>))
        .route("/orders/numberOfOrderedItems", get(items_sold::<S>))
        .route("/orders/batch-process", post(create_batch::<S>))
        .route(
            "/orders/{id}",
            get(get_by_id::<S>).put(update::<S>).delete(delete::<S>),
        )
        .route("/orders/{id}/close", post(close::<S>))
}

/// Order ids are numeric; anything else is a bad request in the API error shape
fn order_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::invalid_input(format!("order id must be an integer, got {raw}")))
}

async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(req): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.orders.create(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Vec<Order>> {
    Ok(Json(state.orders.list().await?))
}

async fn get_by_id<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    Ok(Json(state.orders.get(order_id(&id)?).await?))
}

async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<OrderRequest>,
) -> ApiResult<Order> {
    Ok(Json(state.orders.update(order_id(&id)?, req).await?))
}

async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orders.delete(order_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn close<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    Ok(Json(state.orders.close(order_id(&id)?).await?))
}

async fn create_batch<S: Store>(
    State(state): State<AppState<S>>,
    Json(req): Json<BatchOrderRequest>,
) -> Result<(StatusCode, Json<BatchOrderResult>), AppError> {
    let result = state.orders.create_batch(req).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn items_sold<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ItemsSoldQuery>,
) -> ApiResult<BTreeMap<String, i64>> {
    Ok(Json(state.orders.items_sold(&query).await?))
}
