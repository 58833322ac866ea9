//! Inventory API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{InventoryItem, InventoryTransaction, InventoryUpsert, LeftoversPage};

use crate::services::inventory::LeftoversQuery;
use crate::state::AppState;
use crate::store::Store;

type ApiResult<T> = Result<Json<T>, AppError>;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/inventory", get(list::<S>).post(create::<S>))
        .route("/inventory/getLeftOvers", get(leftovers::<S>))
        .route(
            "/inventory/{id}",
            get(get_by_id::<S>).put(update::<S>).delete(delete::<S>),
        )
        .route("/inventory/{id}/transactions", get(transactions::<S>))
}

async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(req): Json<InventoryUpsert>,
) -> Result<(StatusCode, Json<InventoryItem>), AppError> {
    let item = state.inventory.create(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Vec<InventoryItem>> {
    Ok(Json(state.inventory.list().await?))
}

async fn get_by_id<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<InventoryItem> {
    Ok(Json(state.inventory.get(&id).await?))
}

async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<InventoryUpsert>,
) -> ApiResult<InventoryItem> {
    Ok(Json(state.inventory.update(&id, req).await?))
}

async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.inventory.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn leftovers<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<LeftoversQuery>,
) -> ApiResult<LeftoversPage> {
    Ok(Json(state.inventory.leftovers(&query).await?))
}

async fn transactions<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<InventoryTransaction>> {
    Ok(Json(state.inventory.transactions(&id).await?))
}
