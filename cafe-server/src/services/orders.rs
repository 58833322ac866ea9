//! Order lifecycle
//!
//! Placing an order is one unit of work: price the lines, debit every
//! ingredient, resolve the customer, then write the header and its lines.
//! Orders move `open → closed` once; closed is terminal.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::OpaquePayload;
use shared::models::{
    BatchOrderRequest, BatchOrderResult, Order, OrderDraft, OrderLine, OrderLineDraft,
    OrderRequest, OrderStatus, PaymentMethod,
};

use super::customers::resolve_customer;
use super::pricing::{price_lines, validate_lines};
use super::{ledger, recipe, with_deadline};
use crate::error::{Resource, ServiceError, ServiceResult};
use crate::store::{OrderBook, Store, UnitOfWork};
use crate::validation::{MAX_NAME_LEN, validate_required_text};

const DATE_FORMAT: &str = "%d.%m.%Y";
const DEFAULT_START_DATE: &str = "01.01.1900";
const DEFAULT_END_DATE: &str = "31.12.2100";

/// Raw date range for the items-sold report, `DD.MM.YYYY`, both inclusive
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsSoldQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// An order request that passed every check that needs no store access
#[derive(Debug, Clone)]
struct ValidOrder {
    customer_name: String,
    payment_method: PaymentMethod,
    status: OrderStatus,
    instructions: Option<OpaquePayload>,
    lines: Vec<OrderLine>,
}

impl ValidOrder {
    /// `accept_status` lets updates choose the status; creates are always open
    fn parse(req: OrderRequest, accept_status: bool) -> ServiceResult<Self> {
        validate_required_text(&req.customer_name, "customer_name", MAX_NAME_LEN)?;
        let payment_method = req
            .payment_method
            .trim()
            .parse::<PaymentMethod>()
            .map_err(ServiceError::InvalidInput)?;
        let status = match req.status.as_deref().map(str::trim) {
            Some(s) if accept_status && !s.is_empty() => {
                s.parse::<OrderStatus>().map_err(ServiceError::InvalidInput)?
            }
            _ => OrderStatus::Open,
        };
        validate_lines(&req.items)?;

        Ok(Self {
            customer_name: req.customer_name.trim().to_string(),
            payment_method,
            status,
            instructions: req.instructions,
            lines: req.items,
        })
    }

    fn special_instructions(&self) -> OpaquePayload {
        self.instructions
            .clone()
            .unwrap_or_else(OpaquePayload::default_instructions)
    }
}

/// Price, debit stock and resolve the customer; returns the header to write
/// and the frozen lines
async fn prepare<T>(
    tx: &mut T,
    order: &ValidOrder,
) -> ServiceResult<(OrderDraft, Vec<OrderLineDraft>)>
where
    T: UnitOfWork,
{
    let priced = price_lines(&mut *tx, &order.lines).await?;
    let requirements = recipe::resolve_recipe_cost(&mut *tx, &priced.units).await?;
    ledger::debit_for_sale(&mut *tx, &requirements).await?;
    let customer_id =
        resolve_customer(&mut *tx, &order.customer_name, order.instructions.as_ref()).await?;

    let draft = OrderDraft {
        customer_id,
        total_amount: priced.total,
        status: order.status,
        special_instructions: order.special_instructions(),
        payment_method: order.payment_method,
    };
    Ok((draft, priced.lines))
}

async fn place_order<T: UnitOfWork>(tx: &mut T, order: &ValidOrder) -> ServiceResult<Order> {
    let (draft, lines) = prepare(&mut *tx, order).await?;
    let mut created = tx.insert_order(&draft).await?;
    created.items = tx.insert_order_items(created.id, &lines).await?;
    Ok(created)
}

fn parse_date(value: Option<&str>, default: &str, field: &str) -> ServiceResult<NaiveDate> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(default);
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ServiceError::invalid(format!("{field} must be formatted as DD.MM.YYYY")))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    deadline: Duration,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn create(&self, req: OrderRequest) -> ServiceResult<Order> {
        let order = ValidOrder::parse(req, false)?;

        let created = with_deadline("create_order", self.deadline, async {
            let mut tx = self.store.begin().await?;
            let created = place_order(&mut tx, &order).await?;
            tx.commit().await?;
            Ok(created)
        })
        .await?;

        tracing::info!(
            order_id = created.id,
            customer_id = created.customer_id,
            total = %created.total_amount,
            lines = created.items.len(),
            "Order created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Order> {
        with_deadline("get_order", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.order(id)
                .await?
                .ok_or(ServiceError::NotFound(Resource::Order(id)))
        })
        .await
    }

    pub async fn list(&self) -> ServiceResult<Vec<Order>> {
        with_deadline("list_orders", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.orders().await
        })
        .await
    }

    /// Reprice and replace every line, overwrite the header.
    ///
    /// Stock is debited for the new lines; the previous lines are not
    /// credited back. The status is whatever the caller sends (default open).
    pub async fn update(&self, id: i64, req: OrderRequest) -> ServiceResult<Order> {
        let order = ValidOrder::parse(req, true)?;

        let updated = with_deadline("update_order", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if tx.order_status(id).await?.is_none() {
                return Err(ServiceError::NotFound(Resource::Order(id)));
            }
            let (draft, lines) = prepare(&mut tx, &order).await?;
            if !tx.update_order_header(id, &draft).await? {
                return Err(ServiceError::NotFound(Resource::Order(id)));
            }
            tx.delete_order_items(id).await?;
            tx.insert_order_items(id, &lines).await?;
            let updated = tx
                .order(id)
                .await?
                .ok_or(ServiceError::NotFound(Resource::Order(id)))?;
            tx.commit().await?;
            Ok(updated)
        })
        .await?;

        tracing::info!(order_id = id, total = %updated.total_amount, status = %updated.status, "Order updated");
        Ok(updated)
    }

    /// `open → closed`; a second close fails with `OrderAlreadyClosed`
    pub async fn close(&self, id: i64) -> ServiceResult<Order> {
        let result = with_deadline("close_order", self.deadline, async {
            let mut tx = self.store.begin().await?;
            match tx.order_status(id).await? {
                None => return Err(ServiceError::NotFound(Resource::Order(id))),
                Some(OrderStatus::Closed) => return Err(ServiceError::OrderAlreadyClosed(id)),
                Some(OrderStatus::Open) => {}
            }
            if !tx.close_open_order(id).await? {
                return Err(ServiceError::OrderAlreadyClosed(id));
            }
            let closed = tx
                .order(id)
                .await?
                .ok_or(ServiceError::NotFound(Resource::Order(id)))?;
            tx.commit().await?;
            Ok(closed)
        })
        .await;

        match &result {
            Ok(order) => tracing::info!(order_id = id, total = %order.total_amount, "Order closed"),
            Err(ServiceError::OrderAlreadyClosed(_)) => {
                tracing::warn!(order_id = id, "Close rejected, order already closed")
            }
            Err(_) => {}
        }
        result
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        with_deadline("delete_order", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if !tx.delete_order(id).await? {
                return Err(ServiceError::NotFound(Resource::Order(id)));
            }
            tx.commit().await
        })
        .await?;
        tracing::info!(order_id = id, "Order deleted");
        Ok(())
    }

    /// All orders in one unit of work; any failure persists none of them
    pub async fn create_batch(&self, req: BatchOrderRequest) -> ServiceResult<BatchOrderResult> {
        if req.orders.is_empty() {
            return Err(ServiceError::invalid("batch must contain at least one order"));
        }
        let orders = req
            .orders
            .into_iter()
            .enumerate()
            .map(|(index, order)| {
                ValidOrder::parse(order, false).map_err(|e| match e {
                    ServiceError::InvalidInput(msg) => {
                        ServiceError::InvalidInput(format!("order #{}: {msg}", index + 1))
                    }
                    other => other,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        let created = with_deadline("create_order_batch", self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut created = Vec::with_capacity(orders.len());
            for order in &orders {
                created.push(place_order(&mut tx, order).await?);
            }
            tx.commit().await?;
            Ok(created)
        })
        .await?;

        tracing::info!(processed = created.len(), "Order batch created");
        Ok(BatchOrderResult {
            processed: created.len(),
            orders: created,
        })
    }

    /// Units sold per item name for orders created in the inclusive date range
    pub async fn items_sold(&self, query: &ItemsSoldQuery) -> ServiceResult<BTreeMap<String, i64>> {
        let start = parse_date(query.start_date.as_deref(), DEFAULT_START_DATE, "startDate")?;
        let end = parse_date(query.end_date.as_deref(), DEFAULT_END_DATE, "endDate")?;
        if end < start {
            return Err(ServiceError::invalid("endDate must not be before startDate"));
        }
        let end_exclusive = end
            .succ_opt()
            .ok_or_else(|| ServiceError::invalid("endDate is out of range"))?;

        with_deadline("items_sold", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.items_sold_between(start_of_day(start), start_of_day(end_exclusive))
                .await
        })
        .await
    }
}
