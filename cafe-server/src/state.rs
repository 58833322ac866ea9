//! Application state shared by every handler

use std::time::Duration;

use crate::config::Config;
use crate::error::BoxError;
use crate::services::{InventoryService, MenuService, OrderService, ReportService};
use crate::store::{PgStore, Store};

/// Services bound to one store
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub inventory: InventoryService<S>,
    pub menu: MenuService<S>,
    pub orders: OrderService<S>,
    pub reports: ReportService<S>,
    pub environment: String,
}

impl<S: Store> AppState<S> {
    /// Every service shares `store` and applies `deadline` per operation
    pub fn new(store: S, deadline: Duration) -> Self {
        Self {
            inventory: InventoryService::new(store.clone(), deadline),
            menu: MenuService::new(store.clone(), deadline),
            orders: OrderService::new(store.clone(), deadline),
            reports: ReportService::new(store.clone(), deadline),
            store,
            environment: "development".to_string(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

impl AppState<PgStore> {
    /// Connect to PostgreSQL and wire the services
    pub async fn connect(config: &Config) -> Result<Self, BoxError> {
        let store = PgStore::connect(config).await?;
        Ok(Self::new(store, config.request_timeout).with_environment(&config.environment))
    }
}
