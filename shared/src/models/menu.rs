//! Menu Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Derived from ingredient ids on every write
    pub allergens: Vec<String>,
    pub size: String,
    /// Recipe edges (loaded separately)
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub ingredients: Vec<MenuItemIngredient>,
}

/// "One unit of the menu item consumes `quantity` of the ingredient"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItemIngredient {
    #[serde(default)]
    pub ingredient_id: String,
    #[serde(default)]
    pub quantity: Decimal,
}

/// Recipe edge keyed by menu item, as read by the recipe resolver
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecipeEdge {
    pub menu_item_id: String,
    pub ingredient_id: String,
    pub quantity: Decimal,
}

/// Create/update menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemUpsert {
    #[serde(rename = "product_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub ingredients: Vec<MenuItemIngredient>,
}

/// Snapshot of a menu price change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PriceHistory {
    pub id: i64,
    pub menu_item_id: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub changed_at: DateTime<Utc>,
}
