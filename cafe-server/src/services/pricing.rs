//! Order line validation and pricing
//!
//! Prices are read once per distinct product and frozen into every line.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use shared::models::{OrderLine, OrderLineDraft};

use crate::error::{Resource, ServiceError, ServiceResult};
use crate::store::RecipeResolver;

/// A priced order, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub total: Decimal,
    /// One line per submitted line, price frozen
    pub lines: Vec<OrderLineDraft>,
    /// Units per product, duplicate lines summed
    pub units: HashMap<String, i64>,
}

pub fn validate_lines(lines: &[OrderLine]) -> ServiceResult<()> {
    if lines.is_empty() {
        return Err(ServiceError::invalid("order must contain at least one item"));
    }
    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ServiceError::invalid("product_id must not be empty"));
        }
        if line.quantity <= 0 || line.quantity > i64::from(i32::MAX) {
            return Err(ServiceError::invalid(format!(
                "quantity for {} must be a positive integer",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Summed units per product
pub fn aggregate_units(lines: &[OrderLine]) -> HashMap<String, i64> {
    let mut units: HashMap<String, i64> = HashMap::new();
    for line in lines {
        *units.entry(line.product_id.clone()).or_insert(0) += line.quantity;
    }
    units
}

/// Price `lines` at current menu prices.
///
/// Fails with `NotFound` naming the first unknown product, in line order.
pub async fn price_lines<R>(resolver: &mut R, lines: &[OrderLine]) -> ServiceResult<PricedOrder>
where
    R: RecipeResolver + ?Sized,
{
    validate_lines(lines)?;

    let mut seen = HashSet::new();
    let ids: Vec<String> = lines
        .iter()
        .filter(|l| seen.insert(l.product_id.as_str()))
        .map(|l| l.product_id.clone())
        .collect();
    let prices = resolver.menu_prices(&ids).await?;

    let mut total = Decimal::ZERO;
    let mut drafts = Vec::with_capacity(lines.len());
    for line in lines {
        let price = *prices
            .get(&line.product_id)
            .ok_or_else(|| ServiceError::NotFound(Resource::MenuItem(line.product_id.clone())))?;
        total = price
            .checked_mul(Decimal::from(line.quantity))
            .and_then(|amount| total.checked_add(amount))
            .ok_or_else(|| ServiceError::invalid("order total out of range"))?;
        drafts.push(OrderLineDraft {
            menu_item_id: line.product_id.clone(),
            // validate_lines bounds the quantity to i32
            quantity: line.quantity as i32,
            price_at_order: price,
        });
    }

    Ok(PricedOrder {
        total,
        lines: drafts,
        units: aggregate_units(lines),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{dec, menu_item, stock_item};
    use crate::store::{MemoryStore, Store};

    fn line(id: &str, quantity: i64) -> OrderLine {
        OrderLine {
            product_id: id.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_validate_lines() {
        assert!(validate_lines(&[]).is_err());
        assert!(validate_lines(&[line("latte", 0)]).is_err());
        assert!(validate_lines(&[line("latte", -1)]).is_err());
        assert!(validate_lines(&[line("", 1)]).is_err());
        assert!(validate_lines(&[line("latte", i64::from(i32::MAX) + 1)]).is_err());
        assert!(validate_lines(&[line("latte", 2)]).is_ok());
    }

    #[test]
    fn test_aggregate_units_sums_duplicates() {
        let units = aggregate_units(&[line("latte", 2), line("mocha", 1), line("latte", 3)]);
        assert_eq!(units["latte"], 5);
        assert_eq!(units["mocha"], 1);
    }

    #[tokio::test]
    async fn test_price_lines_freezes_prices() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        menu_item(&store, "latte", "3.50", &[("milk", "200")]).await;
        menu_item(&store, "flat_white", "4.25", &[("milk", "150")]).await;

        let mut tx = store.begin().await.unwrap();
        let priced = price_lines(
            &mut tx,
            &[line("latte", 2), line("flat_white", 1), line("latte", 1)],
        )
        .await
        .unwrap();

        assert_eq!(priced.total, dec("14.75"));
        assert_eq!(priced.lines.len(), 3);
        assert_eq!(priced.lines[1].price_at_order, dec("4.25"));
        assert_eq!(priced.units["latte"], 3);
    }

    #[tokio::test]
    async fn test_price_lines_total_out_of_range() {
        let store = MemoryStore::new();
        stock_item(&store, "gold_leaf", "1000").await;
        menu_item(&store, "gold", "50000000000000000000000000000", &[("gold_leaf", "1")]).await;

        let mut tx = store.begin().await.unwrap();
        let err = price_lines(&mut tx, &[line("gold", 2)]).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(msg) if msg == "order total out of range"));

        // each line fits, the sum does not
        let err = price_lines(&mut tx, &[line("gold", 1), line("gold", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_price_lines_unknown_product() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = price_lines(&mut tx, &[line("ghost", 1)]).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound(Resource::MenuItem(id)) if id == "ghost"
        ));
    }
}
