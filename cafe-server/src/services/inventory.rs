//! Inventory service

use std::time::Duration;

use serde::Deserialize;
use shared::models::{
    InventoryItem, InventoryTransaction, InventoryUpsert, LeftoverSort, LeftoversPage,
    TransactionKind,
};
use shared::util::slug_from_name;

use super::{ledger, with_deadline};
use crate::error::{Resource, ServiceError, ServiceResult};
use crate::store::{InventoryLedger, Store, UnitOfWork};
use crate::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_positive, validate_required_text};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Raw leftovers query; parsed by the service so bad values are `InvalidInput`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeftoversQuery {
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_positive(value: Option<&str>, field: &str, default: i64) -> ServiceResult<i64> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ServiceError::invalid(format!("{field} must be a positive integer"))),
    }
}

fn validate_details(req: &InventoryUpsert) -> ServiceResult<()> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&req.unit_type, "unit_type", MAX_SHORT_TEXT_LEN)?;
    validate_positive(req.price, "price")
}

#[derive(Clone)]
pub struct InventoryService<S> {
    store: S,
    deadline: Duration,
}

impl<S: Store> InventoryService<S> {
    pub fn new(store: S, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Insert a new item and record its opening stock
    pub async fn create(&self, req: InventoryUpsert) -> ServiceResult<InventoryItem> {
        validate_details(&req)?;
        validate_positive(req.stock_level, "stock_level")?;
        let id = match req.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => slug_from_name(&req.name),
        };
        validate_required_text(&id, "id", MAX_SHORT_TEXT_LEN)?;

        let item = with_deadline("create_inventory", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if !tx
                .insert_inventory(&id, &req.name, &req.unit_type, req.price)
                .await?
            {
                return Err(ServiceError::AlreadyExists(Resource::InventoryItem(id.clone())));
            }
            ledger::record_stock_event(&mut tx, &id, TransactionKind::Created, req.stock_level)
                .await?;
            let item = tx
                .inventory_item(&id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(Resource::InventoryItem(id.clone())))?;
            tx.commit().await?;
            Ok(item)
        })
        .await?;

        tracing::info!(inventory_id = %item.id, stock = %item.stock_level, "Inventory item created");
        Ok(item)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<InventoryItem> {
        with_deadline("get_inventory", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.inventory_item(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(Resource::InventoryItem(id.to_string())))
        })
        .await
    }

    pub async fn list(&self) -> ServiceResult<Vec<InventoryItem>> {
        with_deadline("list_inventory", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.inventory_items().await
        })
        .await
    }

    /// Overwrite details and apply `stock_level` as a delta
    pub async fn update(&self, id: &str, req: InventoryUpsert) -> ServiceResult<InventoryItem> {
        validate_details(&req)?;
        if req.stock_level.is_zero() {
            return Err(ServiceError::invalid("stock_level change must not be zero"));
        }

        let item = with_deadline("update_inventory", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if !tx
                .update_inventory_details(id, &req.name, &req.unit_type, req.price)
                .await?
            {
                return Err(ServiceError::NotFound(Resource::InventoryItem(id.to_string())));
            }
            ledger::record_stock_event(&mut tx, id, TransactionKind::Added, req.stock_level).await?;
            let item = tx
                .inventory_item(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(Resource::InventoryItem(id.to_string())))?;
            tx.commit().await?;
            Ok(item)
        })
        .await?;

        tracing::info!(inventory_id = %id, change = %req.stock_level, stock = %item.stock_level, "Inventory item updated");
        Ok(item)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline("delete_inventory", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if !tx.delete_inventory(id).await? {
                return Err(ServiceError::NotFound(Resource::InventoryItem(id.to_string())));
            }
            tx.commit().await
        })
        .await?;
        tracing::info!(inventory_id = %id, "Inventory item deleted");
        Ok(())
    }

    /// One page of stock levels, optionally sorted ascending by price or quantity
    pub async fn leftovers(&self, query: &LeftoversQuery) -> ServiceResult<LeftoversPage> {
        let sort = LeftoverSort::parse_lenient(query.sort_by.as_deref());
        let page = parse_positive(query.page.as_deref(), "page", DEFAULT_PAGE)?;
        let page_size = parse_positive(query.page_size.as_deref(), "pageSize", DEFAULT_PAGE_SIZE)?;
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| ServiceError::invalid("page is out of range"))?;

        let (data, total) = with_deadline("leftovers", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.leftovers(sort, page_size, offset).await
        })
        .await?;

        let total_pages = if total == 0 { 0 } else { (total - 1) / page_size + 1 };
        Ok(LeftoversPage {
            current_page: page,
            has_next_page: page < total_pages,
            page_size,
            total_pages,
            data,
        })
    }

    /// Ledger rows of one item, oldest first
    pub async fn transactions(&self, id: &str) -> ServiceResult<Vec<InventoryTransaction>> {
        with_deadline("inventory_transactions", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if tx.inventory_item(id).await?.is_none() {
                return Err(ServiceError::NotFound(Resource::InventoryItem(id.to_string())));
            }
            tx.inventory_transactions(id).await
        })
        .await
    }
}
