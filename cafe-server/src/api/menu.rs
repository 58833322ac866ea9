//! Menu API

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{MenuItem, MenuItemUpsert, PriceHistory};

use crate::state::AppState;
use crate::store::Store;

type ApiResult<T> = Result<Json<T>, AppError>;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/menu", get(list::<S>).post(create::<S>))
        .route(
            "/menu/{id}",
            get(get_by_id::<S>).put(update::<S>).delete(delete::<S>),
        )
        .route("/menu/{id}/price-history", get(price_history::<S>))
}

async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(req): Json<MenuItemUpsert>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let item = state.menu.create(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Vec<MenuItem>> {
    Ok(Json(state.menu.list().await?))
}

async fn get_by_id<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<MenuItem> {
    Ok(Json(state.menu.get(&id).await?))
}

async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<MenuItemUpsert>,
) -> ApiResult<MenuItem> {
    Ok(Json(state.menu.update(&id, req).await?))
}

async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.menu.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn price_history<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<PriceHistory>> {
    Ok(Json(state.menu.price_history(&id).await?))
}
