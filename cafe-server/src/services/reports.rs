//! Sales reports and search

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Month;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::{
    OrderedItemsByPeriod, PopularItem, ReportPeriod, SearchFilter, SearchQuery, SearchResults,
    TotalSales,
};

use super::with_deadline;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{SalesReports, Store};

const POPULAR_ITEMS_LIMIT: i64 = 3;
const DEFAULT_MIN_PRICE: i64 = 0;
const DEFAULT_MAX_PRICE: i64 = 1_000_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub filter: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodParams {
    pub period: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

fn parse_price(value: Option<&str>, field: &str, default: i64) -> ServiceResult<Decimal> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Decimal::from(default)),
        Some(raw) => raw
            .parse::<Decimal>()
            .ok()
            .filter(|p| !p.is_sign_negative())
            .ok_or_else(|| ServiceError::invalid(format!("{field} must be a non-negative number"))),
    }
}

impl SearchParams {
    fn into_query(self) -> ServiceResult<SearchQuery> {
        let q = self.q.as_deref().map(str::trim).unwrap_or_default();
        if q.is_empty() {
            return Err(ServiceError::invalid("missing required parameter: q"));
        }
        let terms = q.split_whitespace().map(str::to_string).collect();
        let filter = SearchFilter::parse(self.filter.as_deref())
            .ok_or_else(|| ServiceError::invalid("filter must be one of: all, menu, orders"))?;
        let min_price = parse_price(self.min_price.as_deref(), "minPrice", DEFAULT_MIN_PRICE)?;
        let max_price = parse_price(self.max_price.as_deref(), "maxPrice", DEFAULT_MAX_PRICE)?;
        if min_price > max_price {
            return Err(ServiceError::invalid("minPrice must not exceed maxPrice"));
        }
        Ok(SearchQuery {
            terms,
            filter,
            min_price,
            max_price,
        })
    }
}

impl PeriodParams {
    fn into_period(self) -> ServiceResult<ReportPeriod> {
        let required = |value: Option<String>, name: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ServiceError::invalid(format!("missing required parameter: {name}")))
        };
        match required(self.period, "period")?.as_str() {
            "day" => {
                let month = required(self.month, "month")?;
                let month = month
                    .parse::<Month>()
                    .map_err(|_| ServiceError::invalid(format!("unknown month: {month}")))?;
                Ok(ReportPeriod::Day {
                    month: month.number_from_month(),
                })
            }
            "month" => {
                let year = required(self.year, "year")?;
                let year = year
                    .parse::<i32>()
                    .map_err(|_| ServiceError::invalid(format!("invalid year: {year}")))?;
                Ok(ReportPeriod::Month { year })
            }
            other => Err(ServiceError::invalid(format!(
                "period must be day or month, got {other}"
            ))),
        }
    }
}

fn month_name(number: u32) -> Option<String> {
    u8::try_from(number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .map(|m| m.name().to_lowercase())
}

#[derive(Clone)]
pub struct ReportService<S> {
    store: S,
    deadline: Duration,
}

impl<S: Store> ReportService<S> {
    pub fn new(store: S, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Revenue over closed orders
    pub async fn total_sales(&self) -> ServiceResult<TotalSales> {
        let total_sales = with_deadline("total_sales", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.total_sales().await
        })
        .await?;
        Ok(TotalSales { total_sales })
    }

    pub async fn popular_items(&self) -> ServiceResult<Vec<PopularItem>> {
        with_deadline("popular_items", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.popular_items(POPULAR_ITEMS_LIMIT).await
        })
        .await
    }

    pub async fn search(&self, params: SearchParams) -> ServiceResult<SearchResults> {
        let query = params.into_query()?;

        with_deadline("search", self.deadline, async {
            let mut tx = self.store.begin().await?;
            let menu_items = if query.filter.includes_menu() {
                Some(tx.search_menu(&query).await?)
            } else {
                None
            };
            let orders = if query.filter.includes_orders() {
                Some(tx.search_orders(&query).await?)
            } else {
                None
            };
            let total_matches = menu_items.as_ref().map_or(0, Vec::len)
                + orders.as_ref().map_or(0, Vec::len);
            Ok(SearchResults {
                menu_items,
                orders,
                total_matches,
            })
        })
        .await
    }

    /// Order counts per day of a month (any year) or per month of a year
    pub async fn ordered_items_by_period(
        &self,
        params: PeriodParams,
    ) -> ServiceResult<OrderedItemsByPeriod> {
        let period = params.into_period()?;

        let buckets = with_deadline("ordered_items_by_period", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.orders_per_period(period).await
        })
        .await?;

        Ok(match period {
            ReportPeriod::Day { month } => OrderedItemsByPeriod {
                period: "day".to_string(),
                month: month_name(month),
                year: None,
                ordered_items: buckets
                    .into_iter()
                    .map(|(day, count)| BTreeMap::from([(day.to_string(), count)]))
                    .collect(),
            },
            ReportPeriod::Month { year } => OrderedItemsByPeriod {
                period: "month".to_string(),
                month: None,
                year: Some(year),
                ordered_items: buckets
                    .into_iter()
                    .filter_map(|(month, count)| {
                        let name = month_name(u32::try_from(month).ok()?)?;
                        Some(BTreeMap::from([(name, count)]))
                    })
                    .collect(),
            },
        })
    }
}
