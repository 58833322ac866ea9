//! Storage seam
//!
//! A [`Store`] hands out units of work. Each unit implements the narrow
//! capability traits the services compose; nothing is visible to other
//! units until [`UnitOfWork::commit`], and dropping an uncommitted unit
//! rolls it back.
//!
//! Two implementations: [`PgStore`] (PostgreSQL via sqlx) and
//! [`MemoryStore`] (in-process, used by tests).

mod memory;
mod postgres;

pub use memory::{MemoryStore, MemoryTx};
pub use postgres::{PgStore, PgTx};

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::OpaquePayload;
use shared::models::{
    InventoryItem, InventoryTransaction, LeftoverRow, LeftoverSort, MenuItem, MenuItemIngredient,
    MenuSearchHit, Order, OrderDraft, OrderItem, OrderLineDraft, OrderSearchHit, OrderStatus,
    PopularItem, PriceHistory, RecipeEdge, ReportPeriod, SearchQuery, TransactionKind,
};

use crate::error::ServiceResult;

/// Source of units of work
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> ServiceResult<Self::Tx>;
}

/// One atomic unit spanning every capability
#[async_trait]
pub trait UnitOfWork:
    RecipeResolver
    + InventoryLedger
    + OrderBook
    + MenuCatalog
    + CustomerDirectory
    + SalesReports
    + Send
    + 'static
{
    async fn commit(self) -> ServiceResult<()>;
}

/// Menu prices and recipe edges
#[async_trait]
pub trait RecipeResolver: Send {
    /// Current price per id; unknown ids are absent
    async fn menu_prices(&mut self, ids: &[String]) -> ServiceResult<HashMap<String, Decimal>>;

    async fn recipe_edges(&mut self, menu_item_ids: &[String]) -> ServiceResult<Vec<RecipeEdge>>;
}

/// Inventory rows and the stock audit trail
///
/// Stock only changes through `adjust_stock`, and the ledger service pairs
/// every call with `append_transaction`.
#[async_trait]
pub trait InventoryLedger: Send {
    /// Insert with zero stock. `false` if the id is taken.
    async fn insert_inventory(
        &mut self,
        id: &str,
        name: &str,
        unit_type: &str,
        price: Decimal,
    ) -> ServiceResult<bool>;

    async fn inventory_item(&mut self, id: &str) -> ServiceResult<Option<InventoryItem>>;

    async fn inventory_items(&mut self) -> ServiceResult<Vec<InventoryItem>>;

    /// Overwrite name, unit and price. `false` if absent.
    async fn update_inventory_details(
        &mut self,
        id: &str,
        name: &str,
        unit_type: &str,
        price: Decimal,
    ) -> ServiceResult<bool>;

    /// Relative stock update; returns the new level, `None` if absent
    async fn adjust_stock(&mut self, id: &str, delta: Decimal) -> ServiceResult<Option<Decimal>>;

    async fn append_transaction(
        &mut self,
        inventory_id: &str,
        change_amount: Decimal,
        kind: TransactionKind,
    ) -> ServiceResult<()>;

    async fn delete_inventory(&mut self, id: &str) -> ServiceResult<bool>;

    /// Which of `ids` exist, locking them against deletion until commit
    async fn lock_inventory_ids(&mut self, ids: &[String]) -> ServiceResult<HashSet<String>>;

    /// One page of leftovers plus the total row count
    async fn leftovers(
        &mut self,
        sort: LeftoverSort,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<LeftoverRow>, i64)>;

    async fn inventory_transactions(
        &mut self,
        inventory_id: &str,
    ) -> ServiceResult<Vec<InventoryTransaction>>;
}

/// Orders and their lines
#[async_trait]
pub trait OrderBook: Send {
    /// Insert the header; the returned order has no items yet
    async fn insert_order(&mut self, draft: &OrderDraft) -> ServiceResult<Order>;

    async fn insert_order_items(
        &mut self,
        order_id: i64,
        lines: &[OrderLineDraft],
    ) -> ServiceResult<Vec<OrderItem>>;

    async fn order(&mut self, id: i64) -> ServiceResult<Option<Order>>;

    async fn orders(&mut self) -> ServiceResult<Vec<Order>>;

    /// Current status, row-locked until commit
    async fn order_status(&mut self, id: i64) -> ServiceResult<Option<OrderStatus>>;

    async fn update_order_header(&mut self, id: i64, draft: &OrderDraft) -> ServiceResult<bool>;

    async fn delete_order_items(&mut self, order_id: i64) -> ServiceResult<()>;

    /// Conditional open→closed write; `false` if no open row matched
    async fn close_open_order(&mut self, id: i64) -> ServiceResult<bool>;

    async fn delete_order(&mut self, id: i64) -> ServiceResult<bool>;

    /// Units sold per item name for orders created in `[start, end)`
    async fn items_sold_between(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<BTreeMap<String, i64>>;
}

/// Menu items, recipe edges and price history
#[async_trait]
pub trait MenuCatalog: Send {
    /// `false` if the id is taken
    async fn insert_menu_item(&mut self, item: &MenuItem) -> ServiceResult<bool>;

    async fn menu_item(&mut self, id: &str) -> ServiceResult<Option<MenuItem>>;

    async fn menu_items(&mut self) -> ServiceResult<Vec<MenuItem>>;

    /// Current price, row-locked until commit
    async fn menu_price_for_update(&mut self, id: &str) -> ServiceResult<Option<Decimal>>;

    /// Overwrite every column but the id. `false` if absent.
    async fn update_menu_item(&mut self, item: &MenuItem) -> ServiceResult<bool>;

    /// Delete all edges of the item, then insert `edges`
    async fn replace_recipe(
        &mut self,
        menu_item_id: &str,
        edges: &[MenuItemIngredient],
    ) -> ServiceResult<()>;

    async fn insert_price_history(
        &mut self,
        menu_item_id: &str,
        old_price: Decimal,
        new_price: Decimal,
    ) -> ServiceResult<()>;

    async fn price_history(&mut self, menu_item_id: &str) -> ServiceResult<Vec<PriceHistory>>;

    async fn delete_menu_item(&mut self, id: &str) -> ServiceResult<bool>;
}

/// Customers keyed by unique name
#[async_trait]
pub trait CustomerDirectory: Send {
    /// Atomic insert-if-absent; returns the id of the existing or new row
    async fn find_or_create_customer(
        &mut self,
        name: &str,
        email: &str,
        preferences: &OpaquePayload,
    ) -> ServiceResult<i64>;
}

/// Read-only aggregates
#[async_trait]
pub trait SalesReports: Send {
    async fn total_sales(&mut self) -> ServiceResult<Decimal>;

    async fn popular_items(&mut self, limit: i64) -> ServiceResult<Vec<PopularItem>>;

    async fn search_menu(&mut self, query: &SearchQuery) -> ServiceResult<Vec<MenuSearchHit>>;

    async fn search_orders(&mut self, query: &SearchQuery) -> ServiceResult<Vec<OrderSearchHit>>;

    /// `(bucket, order count)` ordered by bucket: day of month or month number
    async fn orders_per_period(&mut self, period: ReportPeriod) -> ServiceResult<Vec<(i32, i64)>>;
}
