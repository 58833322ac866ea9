//! Menu service
//!
//! Every write re-checks recipe ingredients inside its unit of work, with the
//! rows locked against deletion until commit. An update snapshots the old
//! price into the history in the same unit.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rust_decimal::Decimal;
use shared::models::{MenuItem, MenuItemIngredient, MenuItemUpsert, PriceHistory};
use shared::util::slug_from_name;

use super::allergens::derive_allergens;
use super::{recipe, with_deadline};
use crate::error::{Resource, ServiceError, ServiceResult};
use crate::store::{InventoryLedger, MenuCatalog, RecipeResolver, Store, UnitOfWork};
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_positive,
    validate_required_text,
};

const DEFAULT_DESCRIPTION: &str = "No description";

/// Validated upsert body turned into the stored shape
fn build_item(id: String, req: MenuItemUpsert) -> ServiceResult<MenuItem> {
    validate_required_text(&id, "product_id", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
    validate_positive(req.price, "price")?;
    validate_required_text(&req.size, "size", MAX_SHORT_TEXT_LEN)?;
    if req.ingredients.is_empty() {
        return Err(ServiceError::invalid("recipe must list at least one ingredient"));
    }
    for ingredient in &req.ingredients {
        validate_required_text(&ingredient.ingredient_id, "ingredient_id", MAX_SHORT_TEXT_LEN)?;
        validate_positive(
            ingredient.quantity,
            &format!("quantity of {}", ingredient.ingredient_id),
        )?;
    }

    let description = if req.description.trim().is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        req.description
    };
    let allergens = derive_allergens(req.ingredients.iter().map(|i| i.ingredient_id.as_str()));

    Ok(MenuItem {
        id,
        name: req.name,
        description,
        price: req.price,
        allergens,
        size: req.size,
        ingredients: req.ingredients,
    })
}

/// Fail with the first recipe ingredient that has no inventory row
async fn lock_ingredients<L>(ledger: &mut L, ingredients: &[MenuItemIngredient]) -> ServiceResult<()>
where
    L: InventoryLedger + ?Sized,
{
    let ids: Vec<String> = ingredients.iter().map(|i| i.ingredient_id.clone()).collect();
    let present = ledger.lock_inventory_ids(&ids).await?;
    match ids.into_iter().find(|id| !present.contains(id)) {
        Some(missing) => Err(ServiceError::NotFound(Resource::InventoryItem(missing))),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct MenuService<S> {
    store: S,
    deadline: Duration,
}

impl<S: Store> MenuService<S> {
    pub fn new(store: S, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn create(&self, req: MenuItemUpsert) -> ServiceResult<MenuItem> {
        let id = match req.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => slug_from_name(&req.name),
        };
        let item = build_item(id, req)?;

        let created = with_deadline("create_menu_item", self.deadline, async {
            let mut tx = self.store.begin().await?;
            lock_ingredients(&mut tx, &item.ingredients).await?;
            if !tx.insert_menu_item(&item).await? {
                return Err(ServiceError::AlreadyExists(Resource::MenuItem(item.id.clone())));
            }
            tx.replace_recipe(&item.id, &item.ingredients).await?;
            tx.commit().await?;
            Ok(item.clone())
        })
        .await?;

        tracing::info!(menu_item_id = %created.id, price = %created.price, "Menu item created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<MenuItem> {
        with_deadline("get_menu_item", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.menu_item(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(Resource::MenuItem(id.to_string())))
        })
        .await
    }

    pub async fn list(&self) -> ServiceResult<Vec<MenuItem>> {
        with_deadline("list_menu_items", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.menu_items().await
        })
        .await
    }

    /// Replace every field and the recipe of an existing item
    pub async fn update(&self, id: &str, req: MenuItemUpsert) -> ServiceResult<MenuItem> {
        let item = build_item(id.to_string(), req)?;

        let (updated, old_price) = with_deadline("update_menu_item", self.deadline, async {
            let mut tx = self.store.begin().await?;
            let old_price = tx
                .menu_price_for_update(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(Resource::MenuItem(id.to_string())))?;
            lock_ingredients(&mut tx, &item.ingredients).await?;
            if old_price != item.price {
                tx.insert_price_history(id, old_price, item.price).await?;
            }
            if !tx.update_menu_item(&item).await? {
                return Err(ServiceError::NotFound(Resource::MenuItem(id.to_string())));
            }
            tx.replace_recipe(id, &item.ingredients).await?;
            tx.commit().await?;
            Ok((item.clone(), old_price))
        })
        .await?;

        tracing::info!(
            menu_item_id = %id,
            old_price = %old_price,
            new_price = %updated.price,
            "Menu item updated"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline("delete_menu_item", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if !tx.delete_menu_item(id).await? {
                return Err(ServiceError::NotFound(Resource::MenuItem(id.to_string())));
            }
            tx.commit().await
        })
        .await?;
        tracing::info!(menu_item_id = %id, "Menu item deleted");
        Ok(())
    }

    pub async fn price_history(&self, id: &str) -> ServiceResult<Vec<PriceHistory>> {
        with_deadline("price_history", self.deadline, async {
            let mut tx = self.store.begin().await?;
            if tx.menu_item(id).await?.is_none() {
                return Err(ServiceError::NotFound(Resource::MenuItem(id.to_string())));
            }
            tx.price_history(id).await
        })
        .await
    }

    /// Current prices; unknown ids are left out
    pub async fn resolve_prices(&self, ids: &[String]) -> ServiceResult<HashMap<String, Decimal>> {
        with_deadline("resolve_prices", self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.menu_prices(ids).await
        })
        .await
    }

    /// Ingredient amounts needed for `units` of each menu item
    pub async fn resolve_recipe_cost(
        &self,
        units: &HashMap<String, i64>,
    ) -> ServiceResult<BTreeMap<String, Decimal>> {
        with_deadline("resolve_recipe_cost", self.deadline, async {
            let mut tx = self.store.begin().await?;
            recipe::resolve_recipe_cost(&mut tx, units).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{DEADLINE, dec, menu_item, stock_item};
    use crate::store::MemoryStore;

    fn service(store: &MemoryStore) -> MenuService<MemoryStore> {
        MenuService::new(store.clone(), DEADLINE)
    }

    fn upsert(name: &str, price: &str, recipe: &[(&str, &str)]) -> MenuItemUpsert {
        MenuItemUpsert {
            id: None,
            name: name.to_string(),
            description: String::new(),
            price: dec(price),
            size: "M".to_string(),
            ingredients: recipe
                .iter()
                .map(|(id, q)| MenuItemIngredient {
                    ingredient_id: id.to_string(),
                    quantity: dec(q),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_derives_fields() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        stock_item(&store, "espresso", "1000").await;
        let svc = service(&store);

        let item = svc
            .create(upsert(
                "Caffe Latte",
                "3.50",
                &[("espresso", "18"), ("milk", "200")],
            ))
            .await
            .unwrap();
        assert_eq!(item.id, "caffe_latte");
        assert_eq!(item.description, "No description");
        assert_eq!(item.allergens, vec!["caffeine", "lactose"]);

        let stored = svc.get("caffe_latte").await.unwrap();
        assert_eq!(stored.ingredients.len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_ingredient_and_duplicates() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        let svc = service(&store);

        let err = svc
            .create(upsert("Latte", "3", &[("milk", "200"), ("saffron", "1")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound(Resource::InventoryItem(id)) if id == "saffron"
        ));
        assert!(matches!(svc.get("latte").await, Err(ServiceError::NotFound(_))));

        svc.create(upsert("Latte", "3", &[("milk", "200")])).await.unwrap();
        assert!(matches!(
            svc.create(upsert("Latte", "3", &[("milk", "200")])).await,
            Err(ServiceError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let store = MemoryStore::new();
        let svc = service(&store);
        assert!(matches!(
            svc.create(upsert("Latte", "3", &[])).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.create(upsert("Latte", "0", &[("milk", "1")])).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.create(upsert("Latte", "3", &[("milk", "0")])).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_price_change_writes_one_history_row() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        menu_item(&store, "latte", "3.00", &[("milk", "200")]).await;
        let svc = service(&store);

        let mut req = upsert("Latte", "3.50", &[("milk", "250")]);
        req.id = Some("latte".to_string());
        let updated = svc.update("latte", req).await.unwrap();
        assert_eq!(updated.price, dec("3.50"));

        let history = svc.price_history("latte").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_price, dec("3.00"));
        assert_eq!(history[0].new_price, dec("3.50"));

        // same price again: no new row
        svc.update("latte", upsert("Latte", "3.50", &[("milk", "250")]))
            .await
            .unwrap();
        assert_eq!(svc.price_history("latte").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_with_missing_ingredient_changes_nothing() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        menu_item(&store, "latte", "3.00", &[("milk", "200")]).await;
        let svc = service(&store);
        let before = svc.get("latte").await.unwrap();

        let err = svc
            .update("latte", upsert("Latte", "4.00", &[("oat_milk", "200")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Resource::InventoryItem(_))));

        assert_eq!(svc.get("latte").await.unwrap(), before);
        assert!(svc.price_history("latte").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        let svc = service(&store);
        assert!(matches!(
            svc.update("ghost", upsert("Ghost", "1", &[("milk", "1")])).await,
            Err(ServiceError::NotFound(Resource::MenuItem(_)))
        ));
        assert!(matches!(svc.delete("ghost").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.price_history("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_prices_and_recipe_cost() {
        let store = MemoryStore::new();
        stock_item(&store, "milk", "1000").await;
        menu_item(&store, "latte", "3.00", &[("milk", "200")]).await;
        menu_item(&store, "cortado", "2.50", &[("milk", "60")]).await;
        let svc = service(&store);

        let prices = svc
            .resolve_prices(&["latte".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["latte"], dec("3.00"));

        let units = HashMap::from([("latte".to_string(), 2), ("cortado".to_string(), 3)]);
        let cost = svc.resolve_recipe_cost(&units).await.unwrap();
        assert_eq!(cost["milk"], dec("580"));
    }
}
