//! Data models
//!
//! Shared between cafe-server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Inventory and menu ids are text slugs; order and customer ids are `i64`.

pub mod customer;
pub mod inventory;
pub mod menu;
pub mod order;
pub mod report;

// Re-exports
pub use customer::*;
pub use inventory::*;
pub use menu::*;
pub use order::*;
pub use report::*;
