//! Recipe resolution: units sold to ingredient amounts

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use shared::models::RecipeEdge;

use crate::error::{ServiceError, ServiceResult};
use crate::store::RecipeResolver;

/// `ingredient → Σ recipe quantity × units` over every product in `units`
///
/// Fails with `InvalidInput` when an amount does not fit a `Decimal`.
pub fn ingredient_requirements(
    edges: &[RecipeEdge],
    units: &HashMap<String, i64>,
) -> ServiceResult<BTreeMap<String, Decimal>> {
    let mut required: BTreeMap<String, Decimal> = BTreeMap::new();
    for edge in edges {
        let Some(&sold) = units.get(&edge.menu_item_id) else {
            continue;
        };
        let entry = required.entry(edge.ingredient_id.clone()).or_default();
        let so_far = *entry;
        *entry = edge
            .quantity
            .checked_mul(Decimal::from(sold))
            .and_then(|amount| so_far.checked_add(amount))
            .ok_or_else(|| ServiceError::invalid("ingredient requirement out of range"))?;
    }
    Ok(required)
}

/// Ingredient amounts needed to make `units`; empty input gives an empty map
pub async fn resolve_recipe_cost<R>(
    resolver: &mut R,
    units: &HashMap<String, i64>,
) -> ServiceResult<BTreeMap<String, Decimal>>
where
    R: RecipeResolver + ?Sized,
{
    if units.is_empty() {
        return Ok(BTreeMap::new());
    }
    let ids: Vec<String> = units.keys().cloned().collect();
    let edges = resolver.recipe_edges(&ids).await?;
    ingredient_requirements(&edges, units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(item: &str, ingredient: &str, quantity: i64) -> RecipeEdge {
        RecipeEdge {
            menu_item_id: item.to_string(),
            ingredient_id: ingredient.to_string(),
            quantity: Decimal::from(quantity),
        }
    }

    #[test]
    fn test_shared_ingredients_add_up() {
        let edges = [
            edge("latte", "milk", 200),
            edge("latte", "espresso_beans", 18),
            edge("cappuccino", "milk", 120),
            edge("cappuccino", "espresso_beans", 18),
        ];
        let units = HashMap::from([("latte".to_string(), 2), ("cappuccino".to_string(), 1)]);

        let required = ingredient_requirements(&edges, &units).unwrap();
        assert_eq!(required["milk"], Decimal::from(520));
        assert_eq!(required["espresso_beans"], Decimal::from(54));
    }

    #[test]
    fn test_products_without_units_are_ignored() {
        let edges = [edge("latte", "milk", 200)];
        assert!(ingredient_requirements(&edges, &HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_requirement_out_of_range() {
        let huge = |item: &str| RecipeEdge {
            quantity: Decimal::MAX,
            ..edge(item, "gold_leaf", 0)
        };

        let units = HashMap::from([("gold".to_string(), 2)]);
        let err = ingredient_requirements(&[huge("gold")], &units).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        // each product fits on its own, the shared ingredient does not
        let units = HashMap::from([("gold".to_string(), 1), ("gilded".to_string(), 1)]);
        assert!(ingredient_requirements(&[huge("gold"), huge("gilded")], &units).is_err());
    }

    #[tokio::test]
    async fn test_unknown_products_resolve_to_nothing() {
        use crate::store::{MemoryStore, Store};

        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let units = HashMap::from([("ghost".to_string(), 3)]);
        assert!(resolve_recipe_cost(&mut tx, &units).await.unwrap().is_empty());
    }
}
