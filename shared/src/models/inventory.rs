//! Inventory Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stocked raw material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    /// Signed: sales may drive stock below zero
    pub stock_level: Decimal,
    pub unit_type: String,
    pub price: Decimal,
    #[serde(rename = "last_update")]
    pub last_updated: DateTime<Utc>,
}

/// Create/update inventory payload
///
/// On update `stock_level` is a delta applied to the current stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryUpsert {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stock_level: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub unit_type: String,
}

/// Kind of stock-changing event recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "added")]
    Added,
    #[serde(rename = "written off")]
    WrittenOff,
    #[serde(rename = "sale")]
    Sale,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Added => "added",
            Self::WrittenOff => "written off",
            Self::Sale => "sale",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "added" => Ok(Self::Added),
            "written off" => Ok(Self::WrittenOff),
            "sale" => Ok(Self::Sale),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// One audit entry of a stock change (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: i64,
    pub inventory_id: String,
    pub change_amount: Decimal,
    pub transaction_type: TransactionKind,
    pub occurred_at: DateTime<Utc>,
}

/// Sort key for the leftovers view. Unknown keys mean no ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeftoverSort {
    #[default]
    None,
    Price,
    Quantity,
}

impl LeftoverSort {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some("price") => Self::Price,
            Some("quantity") => Self::Quantity,
            _ => Self::None,
        }
    }
}

/// Leftovers row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeftoverRow {
    pub name: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

/// Paginated leftovers response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeftoversPage {
    pub current_page: i64,
    pub has_next_page: bool,
    pub page_size: i64,
    pub total_pages: i64,
    pub data: Vec<LeftoverRow>,
}
