//! Reports API

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use shared::error::AppError;
use shared::models::{OrderedItemsByPeriod, PopularItem, SearchResults, TotalSales};

use crate::services::reports::{PeriodParams, SearchParams};
use crate::state::AppState;
use crate::store::Store;

type ApiResult<T> = Result<Json<T>, AppError>;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/reports/total-sales", get(total_sales::<S>))
        .route("/reports/popular-items", get(popular_items::<S>))
        .route("/reports/search", get(search::<S>))
        .route("/reports/orderedItemsByPeriod", get(ordered_items_by_period::<S>))
}

async fn total_sales<S: Store>(State(state): State<AppState<S>>) -> ApiResult<TotalSales> {
    Ok(Json(state.reports.total_sales().await?))
}

async fn popular_items<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Vec<PopularItem>> {
    Ok(Json(state.reports.popular_items().await?))
}

async fn search<S: Store>(
    State(state): State<AppState<S>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchResults> {
    Ok(Json(state.reports.search(params).await?))
}

async fn ordered_items_by_period<S: Store>(
    State(state): State<AppState<S>>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<OrderedItemsByPeriod> {
    Ok(Json(state.reports.ordered_items_by_period(params).await?))
}
