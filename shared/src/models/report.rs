//! Report Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sum of `total_amount` over closed orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSales {
    pub total_sales: Decimal,
}

/// Menu item ranked by units sold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PopularItem {
    pub menu_item_id: String,
    pub quantity_sold: i64,
}

/// Which collections a search covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchFilter {
    #[default]
    All,
    Menu,
    Orders,
}

impl SearchFilter {
    /// `None` for values outside {all, menu, orders}
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("all") | Some("menu,orders") | Some("orders,menu") => {
                Some(Self::All)
            }
            Some("menu") => Some(Self::Menu),
            Some("orders") => Some(Self::Orders),
            Some(_) => None,
        }
    }

    pub fn includes_menu(&self) -> bool {
        matches!(self, Self::All | Self::Menu)
    }

    pub fn includes_orders(&self) -> bool {
        matches!(self, Self::All | Self::Orders)
    }
}

/// Search parameters after validation
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub filter: SearchFilter,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuSearchHit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub relevance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderSearchHit {
    pub id: i64,
    pub customer_name: String,
    pub items: Vec<String>,
    pub total: Decimal,
    pub relevance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_items: Option<Vec<MenuSearchHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<OrderSearchHit>>,
    pub total_matches: usize,
}

/// Grouping for the ordered-items report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// Days of one month (1-12)
    Day { month: u32 },
    /// Months of one year
    Month { year: i32 },
}

/// Order counts per day or month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedItemsByPeriod {
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "orderedItems")]
    pub ordered_items: Vec<BTreeMap<String, i64>>,
}
