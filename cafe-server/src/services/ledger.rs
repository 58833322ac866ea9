//! Inventory ledger
//!
//! The only path that changes stock. Every change updates the stock level
//! and appends one transaction row inside the caller's unit of work.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::TransactionKind;

use crate::error::{Resource, ServiceError, ServiceResult};
use crate::store::InventoryLedger;

/// Signed change and final kind for a stock event.
///
/// A `sale` is forced negative whatever the sign it arrives with, so
/// callers may pass either the amount sold or the debit. A negative `added`
/// becomes `written off`. Other kinds keep the literal sign.
pub fn normalize(kind: TransactionKind, amount: Decimal) -> ServiceResult<(TransactionKind, Decimal)> {
    if amount.is_zero() {
        return Err(ServiceError::invalid("stock change must not be zero"));
    }
    Ok(match kind {
        TransactionKind::Sale => (TransactionKind::Sale, -amount.abs()),
        TransactionKind::Added if amount.is_sign_negative() => (TransactionKind::WrittenOff, amount),
        other => (other, amount),
    })
}

async fn apply_stock_change<L>(
    ledger: &mut L,
    inventory_id: &str,
    kind: TransactionKind,
    change: Decimal,
) -> ServiceResult<Decimal>
where
    L: InventoryLedger + ?Sized,
{
    let stock = ledger
        .adjust_stock(inventory_id, change)
        .await?
        .ok_or_else(|| ServiceError::NotFound(Resource::InventoryItem(inventory_id.to_string())))?;
    ledger.append_transaction(inventory_id, change, kind).await?;

    if stock.is_sign_negative() && !stock.is_zero() {
        tracing::warn!(inventory_id, %stock, %change, "Stock level went negative");
    }
    Ok(stock)
}

/// Record a create, add or write-off event; returns the new stock level
pub async fn record_stock_event<L>(
    ledger: &mut L,
    inventory_id: &str,
    kind: TransactionKind,
    amount: Decimal,
) -> ServiceResult<Decimal>
where
    L: InventoryLedger + ?Sized,
{
    let (kind, change) = normalize(kind, amount)?;
    apply_stock_change(ledger, inventory_id, kind, change).await
}

/// Debit every ingredient of a sale, in ingredient id order
pub async fn debit_for_sale<L>(
    ledger: &mut L,
    requirements: &BTreeMap<String, Decimal>,
) -> ServiceResult<()>
where
    L: InventoryLedger + ?Sized,
{
    for (inventory_id, amount) in requirements {
        if amount.is_zero() {
            continue;
        }
        apply_stock_change(ledger, inventory_id, TransactionKind::Sale, -amount.abs()).await?;
    }
    Ok(())
}
