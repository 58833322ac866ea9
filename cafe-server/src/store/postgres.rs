//! PostgreSQL store
//!
//! Every unit of work is one `sqlx::Transaction`; dropping it without
//! [`UnitOfWork::commit`] rolls back.

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
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use super::{
    CustomerDirectory, InventoryLedger, MenuCatalog, OrderBook, RecipeResolver, SalesReports,
    Store, UnitOfWork,
};
use crate::config::Config;
use crate::error::{BoxError, ServiceError, ServiceResult};

const ORDER_COLUMNS: &str = "id, customer_id, total_amount, status, \
     special_instructions::text AS special_instructions, payment_method, created_at, updated_at";

const INVENTORY_COLUMNS: &str =
    "id, name, stock AS stock_level, unit_type, price, last_updated";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply embedded migrations
    pub async fn connect(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            max_connections = config.db_max_connections,
            "Database ready, migrations applied"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> ServiceResult<PgTx> {
        let tx = self.pool.begin().await.map_err(ServiceError::db("begin"))?;
        Ok(PgTx { tx })
    }
}

#[async_trait]
impl UnitOfWork for PgTx {
    async fn commit(self) -> ServiceResult<()> {
        self.tx.commit().await.map_err(ServiceError::db("commit"))
    }
}

/// Text-typed order row; enums and payload are parsed after fetch
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    total_amount: Decimal,
    status: String,
    special_instructions: String,
    payment_method: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(op: &'static str, msg: String) -> ServiceError {
    ServiceError::Db {
        op,
        source: msg.into(),
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> ServiceResult<Order> {
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            total_amount: self.total_amount,
            status: self.status.parse().map_err(|e| corrupt("decode_order", e))?,
            special_instructions: OpaquePayload::parse(self.special_instructions)
                .map_err(|e| corrupt("decode_order", e.to_string()))?,
            payment_method: self
                .payment_method
                .parse()
                .map_err(|e| corrupt("decode_order", e))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

impl PgTx {
    async fn items_for_orders(&mut self, ids: &[i64]) -> ServiceResult<HashMap<i64, Vec<OrderItem>>> {
        let items: Vec<OrderItem> = sqlx::query_as(
            "SELECT id, order_id, menu_item_id, quantity, price_at_order
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("load_order_items"))?;

        let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }

    async fn ingredients_for(
        &mut self,
        ids: &[String],
    ) -> ServiceResult<HashMap<String, Vec<MenuItemIngredient>>> {
        let edges = self.recipe_edges(ids).await?;
        let mut grouped: HashMap<String, Vec<MenuItemIngredient>> = HashMap::new();
        for edge in edges {
            grouped
                .entry(edge.menu_item_id)
                .or_default()
                .push(MenuItemIngredient {
                    ingredient_id: edge.ingredient_id,
                    quantity: edge.quantity,
                });
        }
        Ok(grouped)
    }
}

// ── Recipe resolver ──

#[async_trait]
impl RecipeResolver for PgTx {
    async fn menu_prices(&mut self, ids: &[String]) -> ServiceResult<HashMap<String, Decimal>> {
        let rows: Vec<(String, Decimal)> =
            sqlx::query_as("SELECT id, price FROM menu_items WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(ServiceError::db("menu_prices"))?;
        Ok(rows.into_iter().collect())
    }

    async fn recipe_edges(&mut self, menu_item_ids: &[String]) -> ServiceResult<Vec<RecipeEdge>> {
        sqlx::query_as(
            "SELECT menu_item_id, ingredient_id, quantity
             FROM menu_item_ingredients WHERE menu_item_id = ANY($1) ORDER BY id",
        )
        .bind(menu_item_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("recipe_edges"))
    }
}

// ── Inventory ledger ──

#[async_trait]
impl InventoryLedger for PgTx {
    async fn insert_inventory(
        &mut self,
        id: &str,
        name: &str,
        unit_type: &str,
        price: Decimal,
    ) -> ServiceResult<bool> {
        let result = sqlx::query(
            "INSERT INTO inventory (id, name, stock, price, unit_type, last_updated)
             VALUES ($1, $2, 0, $3, $4, NOW())
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(unit_type)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("insert_inventory"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn inventory_item(&mut self, id: &str) -> ServiceResult<Option<InventoryItem>> {
        sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(ServiceError::db("inventory_item"))
    }

    async fn inventory_items(&mut self) -> ServiceResult<Vec<InventoryItem>> {
        sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory ORDER BY id"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("inventory_items"))
    }

    async fn update_inventory_details(
        &mut self,
        id: &str,
        name: &str,
        unit_type: &str,
        price: Decimal,
    ) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE inventory SET name = $2, unit_type = $3, price = $4, last_updated = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(unit_type)
        .bind(price)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("update_inventory"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_stock(&mut self, id: &str, delta: Decimal) -> ServiceResult<Option<Decimal>> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE inventory SET stock = stock + $2, last_updated = NOW()
             WHERE id = $1 RETURNING stock",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(ServiceError::db("adjust_stock"))?;
        Ok(row.map(|(stock,)| stock))
    }

    async fn append_transaction(
        &mut self,
        inventory_id: &str,
        change_amount: Decimal,
        kind: TransactionKind,
    ) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO inventory_transactions (inventory_id, change_amount, transaction_type, occurred_at)
             VALUES ($1, $2, $3, NOW())",
        )
        .bind(inventory_id)
        .bind(change_amount)
        .bind(kind.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("append_transaction"))?;
        Ok(())
    }

    async fn delete_inventory(&mut self, id: &str) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(ServiceError::db("delete_inventory"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn lock_inventory_ids(&mut self, ids: &[String]) -> ServiceResult<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM inventory WHERE id = ANY($1) FOR SHARE")
                .bind(ids)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(ServiceError::db("lock_inventory_ids"))?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn leftovers(
        &mut self,
        sort: LeftoverSort,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<LeftoverRow>, i64)> {
        let sort_key = match sort {
            LeftoverSort::None => "none",
            LeftoverSort::Price => "price",
            LeftoverSort::Quantity => "quantity",
        };
        let rows: Vec<LeftoverRow> = sqlx::query_as(
            "SELECT name, stock AS quantity, price
             FROM inventory
             ORDER BY
                CASE
                    WHEN $1 = 'price' THEN price
                    WHEN $1 = 'quantity' THEN stock
                END,
                id
             LIMIT $2 OFFSET $3",
        )
        .bind(sort_key)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("leftovers"))?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inventory")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(ServiceError::db("count_inventory"))?;

        Ok((rows, total))
    }

    async fn inventory_transactions(
        &mut self,
        inventory_id: &str,
    ) -> ServiceResult<Vec<InventoryTransaction>> {
        let rows: Vec<(i64, String, Decimal, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, inventory_id, change_amount, transaction_type, occurred_at
             FROM inventory_transactions WHERE inventory_id = $1 ORDER BY id",
        )
        .bind(inventory_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("inventory_transactions"))?;

        rows.into_iter()
            .map(|(id, inventory_id, change_amount, kind, occurred_at)| {
                Ok(InventoryTransaction {
                    id,
                    inventory_id,
                    change_amount,
                    transaction_type: kind
                        .parse()
                        .map_err(|e| corrupt("decode_transaction", e))?,
                    occurred_at,
                })
            })
            .collect()
    }
}

// ── Order book ──

#[async_trait]
impl OrderBook for PgTx {
    async fn insert_order(&mut self, draft: &OrderDraft) -> ServiceResult<Order> {
        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (customer_id, total_amount, status, special_instructions,
                                 payment_method, created_at, updated_at)
             VALUES ($1, $2, $3, $4::json, $5, NOW(), NOW())
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(draft.customer_id)
        .bind(draft.total_amount)
        .bind(draft.status.as_str())
        .bind(draft.special_instructions.as_str())
        .bind(draft.payment_method.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(ServiceError::db("insert_order"))?;
        row.into_order(Vec::new())
    }

    async fn insert_order_items(
        &mut self,
        order_id: i64,
        lines: &[OrderLineDraft],
    ) -> ServiceResult<Vec<OrderItem>> {
        let menu_item_ids: Vec<&str> = lines.iter().map(|l| l.menu_item_id.as_str()).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
        let prices: Vec<Decimal> = lines.iter().map(|l| l.price_at_order).collect();

        sqlx::query_as(
            "INSERT INTO order_items (order_id, menu_item_id, quantity, price_at_order)
             SELECT $1, * FROM UNNEST($2::text[], $3::int4[], $4::numeric[])
             RETURNING id, order_id, menu_item_id, quantity, price_at_order",
        )
        .bind(order_id)
        .bind(&menu_item_ids)
        .bind(&quantities)
        .bind(&prices)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("insert_order_items"))
    }

    async fn order(&mut self, id: i64) -> ServiceResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(ServiceError::db("load_order"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let items = self.items_for_orders(&[id]).await?.remove(&id).unwrap_or_default();
        row.into_order(items).map(Some)
    }

    async fn orders(&mut self) -> ServiceResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id"))
                .fetch_all(&mut *self.tx)
                .await
                .map_err(ServiceError::db("list_orders"))?;
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for_orders(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    async fn order_status(&mut self, id: i64) -> ServiceResult<Option<OrderStatus>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(ServiceError::db("order_status"))?;
        row.map(|(status,)| status.parse().map_err(|e| corrupt("decode_order", e)))
            .transpose()
    }

    async fn update_order_header(&mut self, id: i64, draft: &OrderDraft) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE orders
             SET customer_id = $2, total_amount = $3, status = $4,
                 special_instructions = $5::json, payment_method = $6, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(draft.customer_id)
        .bind(draft.total_amount)
        .bind(draft.status.as_str())
        .bind(draft.special_instructions.as_str())
        .bind(draft.payment_method.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("update_order"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_order_items(&mut self, order_id: i64) -> ServiceResult<()> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *self.tx)
            .await
            .map_err(ServiceError::db("delete_order_items"))?;
        Ok(())
    }

    async fn close_open_order(&mut self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'closed', updated_at = NOW()
             WHERE id = $1 AND status = 'open'",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("close_order"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&mut self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(ServiceError::db("delete_order"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn items_sold_between(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT COALESCE(mi.name, oi.menu_item_id) AS item_name,
                    SUM(oi.quantity)::BIGINT AS sold
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             LEFT JOIN menu_items mi ON mi.id = oi.menu_item_id
             WHERE o.created_at >= $1 AND o.created_at < $2
             GROUP BY item_name",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("items_sold_between"))?;
        Ok(rows.into_iter().collect())
    }
}

// ── Menu catalog ──

#[async_trait]
impl MenuCatalog for PgTx {
    async fn insert_menu_item(&mut self, item: &MenuItem) -> ServiceResult<bool> {
        let result = sqlx::query(
            "INSERT INTO menu_items (id, name, description, price, allergens, size)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.allergens)
        .bind(&item.size)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("insert_menu_item"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn menu_item(&mut self, id: &str) -> ServiceResult<Option<MenuItem>> {
        let item: Option<MenuItem> = sqlx::query_as(
            "SELECT id, name, description, price, allergens, size FROM menu_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(ServiceError::db("menu_item"))?;
        let Some(mut item) = item else {
            return Ok(None);
        };
        item.ingredients = self
            .ingredients_for(std::slice::from_ref(&item.id))
            .await?
            .remove(&item.id)
            .unwrap_or_default();
        Ok(Some(item))
    }

    async fn menu_items(&mut self) -> ServiceResult<Vec<MenuItem>> {
        let mut items: Vec<MenuItem> = sqlx::query_as(
            "SELECT id, name, description, price, allergens, size FROM menu_items ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("menu_items"))?;
        let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let mut edges = self.ingredients_for(&ids).await?;
        for item in &mut items {
            item.ingredients = edges.remove(&item.id).unwrap_or_default();
        }
        Ok(items)
    }

    async fn menu_price_for_update(&mut self, id: &str) -> ServiceResult<Option<Decimal>> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT price FROM menu_items WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(ServiceError::db("menu_price"))?;
        Ok(row.map(|(price,)| price))
    }

    async fn update_menu_item(&mut self, item: &MenuItem) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE menu_items
             SET name = $2, description = $3, price = $4, allergens = $5, size = $6
             WHERE id = $1",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.allergens)
        .bind(&item.size)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("update_menu_item"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_recipe(
        &mut self,
        menu_item_id: &str,
        edges: &[MenuItemIngredient],
    ) -> ServiceResult<()> {
        sqlx::query("DELETE FROM menu_item_ingredients WHERE menu_item_id = $1")
            .bind(menu_item_id)
            .execute(&mut *self.tx)
            .await
            .map_err(ServiceError::db("delete_recipe"))?;

        if edges.is_empty() {
            return Ok(());
        }

        let ingredient_ids: Vec<&str> = edges.iter().map(|e| e.ingredient_id.as_str()).collect();
        let quantities: Vec<Decimal> = edges.iter().map(|e| e.quantity).collect();
        sqlx::query(
            "INSERT INTO menu_item_ingredients (menu_item_id, ingredient_id, quantity)
             SELECT $1, * FROM UNNEST($2::text[], $3::numeric[])",
        )
        .bind(menu_item_id)
        .bind(&ingredient_ids)
        .bind(&quantities)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("insert_recipe"))?;
        Ok(())
    }

    async fn insert_price_history(
        &mut self,
        menu_item_id: &str,
        old_price: Decimal,
        new_price: Decimal,
    ) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO price_history (menu_item_id, old_price, new_price, changed_at)
             VALUES ($1, $2, $3, NOW())",
        )
        .bind(menu_item_id)
        .bind(old_price)
        .bind(new_price)
        .execute(&mut *self.tx)
        .await
        .map_err(ServiceError::db("insert_price_history"))?;
        Ok(())
    }

    async fn price_history(&mut self, menu_item_id: &str) -> ServiceResult<Vec<PriceHistory>> {
        sqlx::query_as(
            "SELECT id, menu_item_id, old_price, new_price, changed_at
             FROM price_history WHERE menu_item_id = $1 ORDER BY changed_at, id",
        )
        .bind(menu_item_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("price_history"))
    }

    async fn delete_menu_item(&mut self, id: &str) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(ServiceError::db("delete_menu_item"))?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Customers ──

#[async_trait]
impl CustomerDirectory for PgTx {
    async fn find_or_create_customer(
        &mut self,
        name: &str,
        email: &str,
        preferences: &OpaquePayload,
    ) -> ServiceResult<i64> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO customers (name, email, preferences)
             VALUES ($1, $2, $3::json)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(preferences.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(ServiceError::db("find_or_create_customer"))?;
        Ok(id)
    }
}

// ── Reports ──

#[async_trait]
impl SalesReports for PgTx {
    async fn total_sales(&mut self) -> ServiceResult<Decimal> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders",
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(ServiceError::db("total_sales"))?;
        Ok(total)
    }

    async fn popular_items(&mut self, limit: i64) -> ServiceResult<Vec<PopularItem>> {
        sqlx::query_as(
            "SELECT menu_item_id, SUM(quantity)::BIGINT AS quantity_sold
             FROM order_items
             GROUP BY menu_item_id
             ORDER BY quantity_sold DESC, menu_item_id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("popular_items"))
    }

    async fn search_menu(&mut self, query: &SearchQuery) -> ServiceResult<Vec<MenuSearchHit>> {
        sqlx::query_as(
            "SELECT id, name, description, price,
                    ts_rank(to_tsvector('english', name || ' ' || description),
                            plainto_tsquery('english', $1)) AS relevance
             FROM menu_items
             WHERE to_tsvector('english', name || ' ' || description) @@ plainto_tsquery('english', $1)
               AND price >= $2 AND price <= $3
             ORDER BY relevance DESC, id",
        )
        .bind(query.terms.join(" "))
        .bind(query.min_price)
        .bind(query.max_price)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("search_menu"))
    }

    async fn search_orders(&mut self, query: &SearchQuery) -> ServiceResult<Vec<OrderSearchHit>> {
        sqlx::query_as(
            "SELECT o.id,
                    c.name AS customer_name,
                    ARRAY_AGG(COALESCE(mi.name, oi.menu_item_id) ORDER BY oi.id) AS items,
                    o.total_amount AS total,
                    MAX(ts_rank(to_tsvector('english', c.name || ' ' || COALESCE(mi.name, oi.menu_item_id)),
                                plainto_tsquery('english', $1))) AS relevance
             FROM orders o
             JOIN customers c ON c.id = o.customer_id
             JOIN order_items oi ON oi.order_id = o.id
             LEFT JOIN menu_items mi ON mi.id = oi.menu_item_id
             WHERE o.total_amount >= $2 AND o.total_amount <= $3
             GROUP BY o.id, c.name, o.total_amount
             HAVING BOOL_OR(to_tsvector('english', c.name || ' ' || COALESCE(mi.name, oi.menu_item_id))
                            @@ plainto_tsquery('english', $1))
             ORDER BY relevance DESC, o.id",
        )
        .bind(query.terms.join(" "))
        .bind(query.min_price)
        .bind(query.max_price)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(ServiceError::db("search_orders"))
    }

    async fn orders_per_period(&mut self, period: ReportPeriod) -> ServiceResult<Vec<(i32, i64)>> {
        let query = match period {
            ReportPeriod::Day { month } => sqlx::query_as(
                "SELECT EXTRACT(DAY FROM created_at)::INT AS bucket, COUNT(*) AS orders
                 FROM orders
                 WHERE EXTRACT(MONTH FROM created_at) = $1
                 GROUP BY bucket ORDER BY bucket",
            )
            .bind(month as i32),
            ReportPeriod::Month { year } => sqlx::query_as(
                "SELECT EXTRACT(MONTH FROM created_at)::INT AS bucket, COUNT(*) AS orders
                 FROM orders
                 WHERE EXTRACT(YEAR FROM created_at) = $1
                 GROUP BY bucket ORDER BY bucket",
            )
            .bind(year),
        };
        query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(ServiceError::db("orders_per_period"))
    }
}
