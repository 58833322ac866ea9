//! In-process store
//!
//! A unit of work owns the state lock for its whole life and mutates a
//! private copy; commit writes the copy back. Units therefore run one at a
//! time, which is stricter than PostgreSQL but observably equivalent for the
//! services.
//!
//! Tests can make named operations fail ([`MemoryStore::fail_after`]) or
//! slow ([`MemoryStore::set_latency`]).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use shared::OpaquePayload;
use shared::models::{
    Customer, InventoryItem, InventoryTransaction, LeftoverRow, LeftoverSort, MenuItem,
    MenuItemIngredient, MenuSearchHit, Order, OrderDraft, OrderItem, OrderLineDraft,
    OrderSearchHit, OrderStatus, PopularItem, PriceHistory, RecipeEdge, ReportPeriod, SearchQuery,
    TransactionKind,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    CustomerDirectory, InventoryLedger, MenuCatalog, OrderBook, RecipeResolver, SalesReports,
    Store, UnitOfWork,
};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default)]
struct State {
    inventory: BTreeMap<String, InventoryItem>,
    transactions: Vec<InventoryTransaction>,
    menu: BTreeMap<String, MenuItem>,
    price_history: Vec<PriceHistory>,
    customers: Vec<Customer>,
    orders: BTreeMap<i64, Order>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Faults {
    /// Successful calls left per operation before it starts failing
    remaining: HashMap<&'static str, usize>,
    latency: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<parking_lot::Mutex<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `op` succeed `successes` more times, then fail every call
    pub fn fail_after(&self, op: &'static str, successes: usize) {
        self.faults.lock().remaining.insert(op, successes);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().remaining.clear();
    }

    /// Delay every store operation by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().latency = latency;
    }

    /// Move an order's creation time, for period reports
    pub async fn backdate_order(&self, id: i64, created_at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().await;
        match state.orders.get_mut(&id) {
            Some(order) => {
                order.created_at = created_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> ServiceResult<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        let tx = MemoryTx {
            guard,
            work,
            faults: self.faults.clone(),
        };
        tx.enter("begin").await?;
        Ok(tx)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
    faults: Arc<parking_lot::Mutex<Faults>>,
}

impl MemoryTx {
    async fn enter(&self, op: &'static str) -> ServiceResult<()> {
        let latency = {
            let mut faults = self.faults.lock();
            if let Some(remaining) = faults.remaining.get_mut(op) {
                if *remaining == 0 {
                    return Err(ServiceError::Db {
                        op,
                        source: "injected failure".into(),
                    });
                }
                *remaining -= 1;
            }
            faults.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    fn missing(op: &'static str, what: String) -> ServiceError {
        ServiceError::Db {
            op,
            source: what.into(),
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryTx {
    async fn commit(self) -> ServiceResult<()> {
        self.enter("commit").await?;
        let MemoryTx {
            mut guard, work, ..
        } = self;
        *guard = work;
        Ok(())
    }
}

/// Occurrences of every term in `text` over its word count; `None` unless
/// each term appears at least once
fn relevance(text: &str, terms: &[String]) -> Option<f32> {
    let text = text.to_lowercase();
    let words = text.split_whitespace().count().max(1);
    let mut hits = 0usize;
    for term in terms {
        let count = text.matches(term.to_lowercase().as_str()).count();
        if count == 0 {
            return None;
        }
        hits += count;
    }
    Some(hits as f32 / words as f32)
}

// ── Recipe resolver ──

#[async_trait]
impl RecipeResolver for MemoryTx {
    async fn menu_prices(&mut self, ids: &[String]) -> ServiceResult<HashMap<String, Decimal>> {
        self.enter("menu_prices").await?;
        Ok(ids
            .iter()
            .filter_map(|id| self.work.menu.get(id).map(|m| (id.clone(), m.price)))
            .collect())
    }

    async fn recipe_edges(&mut self, menu_item_ids: &[String]) -> ServiceResult<Vec<RecipeEdge>> {
        self.enter("recipe_edges").await?;
        let wanted: HashSet<&String> = menu_item_ids.iter().collect();
        Ok(self
            .work
            .menu
            .values()
            .filter(|m| wanted.contains(&m.id))
            .flat_map(|m| {
                m.ingredients.iter().map(|i| RecipeEdge {
                    menu_item_id: m.id.clone(),
                    ingredient_id: i.ingredient_id.clone(),
                    quantity: i.quantity,
                })
            })
            .collect())
    }
}

// ── Inventory ledger ──

#[async_trait]
impl InventoryLedger for MemoryTx {
    async fn insert_inventory(
        &mut self,
        id: &str,
        name: &str,
        unit_type: &str,
        price: Decimal,
    ) -> ServiceResult<bool> {
        self.enter("insert_inventory").await?;
        if self.work.inventory.contains_key(id) {
            return Ok(false);
        }
        self.work.inventory.insert(
            id.to_string(),
            InventoryItem {
                id: id.to_string(),
                name: name.to_string(),
                stock_level: Decimal::ZERO,
                unit_type: unit_type.to_string(),
                price,
                last_updated: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn inventory_item(&mut self, id: &str) -> ServiceResult<Option<InventoryItem>> {
        self.enter("inventory_item").await?;
        Ok(self.work.inventory.get(id).cloned())
    }

    async fn inventory_items(&mut self) -> ServiceResult<Vec<InventoryItem>> {
        self.enter("inventory_items").await?;
        Ok(self.work.inventory.values().cloned().collect())
    }

    async fn update_inventory_details(
        &mut self,
        id: &str,
        name: &str,
        unit_type: &str,
        price: Decimal,
    ) -> ServiceResult<bool> {
        self.enter("update_inventory").await?;
        let Some(item) = self.work.inventory.get_mut(id) else {
            return Ok(false);
        };
        item.name = name.to_string();
        item.unit_type = unit_type.to_string();
        item.price = price;
        item.last_updated = Utc::now();
        Ok(true)
    }

    async fn adjust_stock(&mut self, id: &str, delta: Decimal) -> ServiceResult<Option<Decimal>> {
        self.enter("adjust_stock").await?;
        let Some(item) = self.work.inventory.get_mut(id) else {
            return Ok(None);
        };
        item.stock_level = item
            .stock_level
            .checked_add(delta)
            .ok_or_else(|| ServiceError::invalid("stock level out of range"))?;
        item.last_updated = Utc::now();
        Ok(Some(item.stock_level))
    }

    async fn append_transaction(
        &mut self,
        inventory_id: &str,
        change_amount: Decimal,
        kind: TransactionKind,
    ) -> ServiceResult<()> {
        self.enter("append_transaction").await?;
        let id = self.work.next_id();
        self.work.transactions.push(InventoryTransaction {
            id,
            inventory_id: inventory_id.to_string(),
            change_amount,
            transaction_type: kind,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_inventory(&mut self, id: &str) -> ServiceResult<bool> {
        self.enter("delete_inventory").await?;
        Ok(self.work.inventory.remove(id).is_some())
    }

    async fn lock_inventory_ids(&mut self, ids: &[String]) -> ServiceResult<HashSet<String>> {
        self.enter("lock_inventory_ids").await?;
        Ok(ids
            .iter()
            .filter(|id| self.work.inventory.contains_key(*id))
            .cloned()
            .collect())
    }

    async fn leftovers(
        &mut self,
        sort: LeftoverSort,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<LeftoverRow>, i64)> {
        self.enter("leftovers").await?;
        let mut items: Vec<&InventoryItem> = self.work.inventory.values().collect();
        match sort {
            LeftoverSort::None => {}
            LeftoverSort::Price => items.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            LeftoverSort::Quantity => items.sort_by(|a, b| {
                a.stock_level
                    .cmp(&b.stock_level)
                    .then(a.id.cmp(&b.id))
            }),
        }
        let total = items.len() as i64;
        let rows = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|item| LeftoverRow {
                name: item.name.clone(),
                quantity: item.stock_level,
                price: item.price,
            })
            .collect();
        Ok((rows, total))
    }

    async fn inventory_transactions(
        &mut self,
        inventory_id: &str,
    ) -> ServiceResult<Vec<InventoryTransaction>> {
        self.enter("inventory_transactions").await?;
        Ok(self
            .work
            .transactions
            .iter()
            .filter(|t| t.inventory_id == inventory_id)
            .cloned()
            .collect())
    }
}

// ── Order book ──

#[async_trait]
impl OrderBook for MemoryTx {
    async fn insert_order(&mut self, draft: &OrderDraft) -> ServiceResult<Order> {
        self.enter("insert_order").await?;
        let id = self.work.next_id();
        let now = Utc::now();
        let order = Order {
            id,
            customer_id: draft.customer_id,
            total_amount: draft.total_amount,
            status: draft.status,
            special_instructions: draft.special_instructions.clone(),
            payment_method: draft.payment_method,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        };
        self.work.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn insert_order_items(
        &mut self,
        order_id: i64,
        lines: &[OrderLineDraft],
    ) -> ServiceResult<Vec<OrderItem>> {
        self.enter("insert_order_items").await?;
        let mut inserted = Vec::with_capacity(lines.len());
        for line in lines {
            inserted.push(OrderItem {
                id: self.work.next_id(),
                order_id,
                menu_item_id: line.menu_item_id.clone(),
                quantity: line.quantity,
                price_at_order: line.price_at_order,
            });
        }
        let order = self
            .work
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| Self::missing("insert_order_items", format!("no order {order_id}")))?;
        order.items.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn order(&mut self, id: i64) -> ServiceResult<Option<Order>> {
        self.enter("load_order").await?;
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn orders(&mut self) -> ServiceResult<Vec<Order>> {
        self.enter("list_orders").await?;
        Ok(self.work.orders.values().cloned().collect())
    }

    async fn order_status(&mut self, id: i64) -> ServiceResult<Option<OrderStatus>> {
        self.enter("order_status").await?;
        Ok(self.work.orders.get(&id).map(|o| o.status))
    }

    async fn update_order_header(&mut self, id: i64, draft: &OrderDraft) -> ServiceResult<bool> {
        self.enter("update_order").await?;
        let Some(order) = self.work.orders.get_mut(&id) else {
            return Ok(false);
        };
        order.customer_id = draft.customer_id;
        order.total_amount = draft.total_amount;
        order.status = draft.status;
        order.special_instructions = draft.special_instructions.clone();
        order.payment_method = draft.payment_method;
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_order_items(&mut self, order_id: i64) -> ServiceResult<()> {
        self.enter("delete_order_items").await?;
        if let Some(order) = self.work.orders.get_mut(&order_id) {
            order.items.clear();
        }
        Ok(())
    }

    async fn close_open_order(&mut self, id: i64) -> ServiceResult<bool> {
        self.enter("close_order").await?;
        match self.work.orders.get_mut(&id) {
            Some(order) if order.status == OrderStatus::Open => {
                order.status = OrderStatus::Closed;
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_order(&mut self, id: i64) -> ServiceResult<bool> {
        self.enter("delete_order").await?;
        Ok(self.work.orders.remove(&id).is_some())
    }

    async fn items_sold_between(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<BTreeMap<String, i64>> {
        self.enter("items_sold_between").await?;
        let mut sold = BTreeMap::new();
        for order in self.work.orders.values() {
            if order.created_at < start || order.created_at >= end {
                continue;
            }
            for item in &order.items {
                let name = self
                    .work
                    .menu
                    .get(&item.menu_item_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| item.menu_item_id.clone());
                *sold.entry(name).or_insert(0) += i64::from(item.quantity);
            }
        }
        Ok(sold)
    }
}

// ── Menu catalog ──

#[async_trait]
impl MenuCatalog for MemoryTx {
    async fn insert_menu_item(&mut self, item: &MenuItem) -> ServiceResult<bool> {
        self.enter("insert_menu_item").await?;
        if self.work.menu.contains_key(&item.id) {
            return Ok(false);
        }
        let mut stored = item.clone();
        stored.ingredients.clear();
        self.work.menu.insert(item.id.clone(), stored);
        Ok(true)
    }

    async fn menu_item(&mut self, id: &str) -> ServiceResult<Option<MenuItem>> {
        self.enter("menu_item").await?;
        Ok(self.work.menu.get(id).cloned())
    }

    async fn menu_items(&mut self) -> ServiceResult<Vec<MenuItem>> {
        self.enter("menu_items").await?;
        Ok(self.work.menu.values().cloned().collect())
    }

    async fn menu_price_for_update(&mut self, id: &str) -> ServiceResult<Option<Decimal>> {
        self.enter("menu_price").await?;
        Ok(self.work.menu.get(id).map(|m| m.price))
    }

    async fn update_menu_item(&mut self, item: &MenuItem) -> ServiceResult<bool> {
        self.enter("update_menu_item").await?;
        let Some(stored) = self.work.menu.get_mut(&item.id) else {
            return Ok(false);
        };
        stored.name = item.name.clone();
        stored.description = item.description.clone();
        stored.price = item.price;
        stored.allergens = item.allergens.clone();
        stored.size = item.size.clone();
        Ok(true)
    }

    async fn replace_recipe(
        &mut self,
        menu_item_id: &str,
        edges: &[MenuItemIngredient],
    ) -> ServiceResult<()> {
        self.enter("insert_recipe").await?;
        let item = self.work.menu.get_mut(menu_item_id).ok_or_else(|| {
            Self::missing("insert_recipe", format!("no menu item {menu_item_id}"))
        })?;
        item.ingredients = edges.to_vec();
        Ok(())
    }

    async fn insert_price_history(
        &mut self,
        menu_item_id: &str,
        old_price: Decimal,
        new_price: Decimal,
    ) -> ServiceResult<()> {
        self.enter("insert_price_history").await?;
        let id = self.work.next_id();
        self.work.price_history.push(PriceHistory {
            id,
            menu_item_id: menu_item_id.to_string(),
            old_price,
            new_price,
            changed_at: Utc::now(),
        });
        Ok(())
    }

    async fn price_history(&mut self, menu_item_id: &str) -> ServiceResult<Vec<PriceHistory>> {
        self.enter("price_history").await?;
        Ok(self
            .work
            .price_history
            .iter()
            .filter(|h| h.menu_item_id == menu_item_id)
            .cloned()
            .collect())
    }

    async fn delete_menu_item(&mut self, id: &str) -> ServiceResult<bool> {
        self.enter("delete_menu_item").await?;
        if self.work.menu.remove(id).is_none() {
            return Ok(false);
        }
        self.work.price_history.retain(|h| h.menu_item_id != id);
        Ok(true)
    }
}

// ── Customers ──

#[async_trait]
impl CustomerDirectory for MemoryTx {
    async fn find_or_create_customer(
        &mut self,
        name: &str,
        email: &str,
        preferences: &OpaquePayload,
    ) -> ServiceResult<i64> {
        self.enter("find_or_create_customer").await?;
        if let Some(existing) = self.work.customers.iter().find(|c| c.name == name) {
            return Ok(existing.id);
        }
        let id = self.work.next_id();
        self.work.customers.push(Customer {
            id,
            name: name.to_string(),
            email: email.to_string(),
            preferences: preferences.clone(),
        });
        Ok(id)
    }
}

// ── Reports ──

#[async_trait]
impl SalesReports for MemoryTx {
    async fn total_sales(&mut self) -> ServiceResult<Decimal> {
        self.enter("total_sales").await?;
        self.work
            .orders
            .values()
            .try_fold(Decimal::ZERO, |sum, o| sum.checked_add(o.total_amount))
            .ok_or_else(|| ServiceError::invalid("total sales out of range"))
    }

    async fn popular_items(&mut self, limit: i64) -> ServiceResult<Vec<PopularItem>> {
        self.enter("popular_items").await?;
        let mut sold: BTreeMap<&str, i64> = BTreeMap::new();
        for item in self.work.orders.values().flat_map(|o| &o.items) {
            *sold.entry(item.menu_item_id.as_str()).or_insert(0) += i64::from(item.quantity);
        }
        let mut ranked: Vec<PopularItem> = sold
            .into_iter()
            .map(|(id, quantity_sold)| PopularItem {
                menu_item_id: id.to_string(),
                quantity_sold,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then_with(|| a.menu_item_id.cmp(&b.menu_item_id))
        });
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    async fn search_menu(&mut self, query: &SearchQuery) -> ServiceResult<Vec<MenuSearchHit>> {
        self.enter("search_menu").await?;
        let mut hits: Vec<MenuSearchHit> = self
            .work
            .menu
            .values()
            .filter(|m| m.price >= query.min_price && m.price <= query.max_price)
            .filter_map(|m| {
                let text = format!("{} {}", m.name, m.description);
                relevance(&text, &query.terms).map(|relevance| MenuSearchHit {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    description: m.description.clone(),
                    price: m.price,
                    relevance,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(hits)
    }

    async fn search_orders(&mut self, query: &SearchQuery) -> ServiceResult<Vec<OrderSearchHit>> {
        self.enter("search_orders").await?;
        let mut hits = Vec::new();
        for order in self.work.orders.values() {
            if order.total_amount < query.min_price || order.total_amount > query.max_price {
                continue;
            }
            let Some(customer) = self.work.customers.iter().find(|c| c.id == order.customer_id)
            else {
                continue;
            };
            let items: Vec<String> = order
                .items
                .iter()
                .map(|i| {
                    self.work
                        .menu
                        .get(&i.menu_item_id)
                        .map(|m| m.name.clone())
                        .unwrap_or_else(|| i.menu_item_id.clone())
                })
                .collect();
            let text = format!("{} {}", customer.name, items.join(" "));
            if let Some(relevance) = relevance(&text, &query.terms) {
                hits.push(OrderSearchHit {
                    id: order.id,
                    customer_name: customer.name.clone(),
                    items,
                    total: order.total_amount,
                    relevance,
                });
            }
        }
        hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance).then(a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn orders_per_period(&mut self, period: ReportPeriod) -> ServiceResult<Vec<(i32, i64)>> {
        self.enter("orders_per_period").await?;
        let mut buckets: BTreeMap<i32, i64> = BTreeMap::new();
        for order in self.work.orders.values() {
            let at = order.created_at;
            let bucket = match period {
                ReportPeriod::Day { month } if at.month() == month => at.day() as i32,
                ReportPeriod::Month { year } if at.year() == year => at.month() as i32,
                _ => continue,
            };
            *buckets.entry(bucket).or_insert(0) += 1;
        }
        Ok(buckets.into_iter().collect())
    }
}
