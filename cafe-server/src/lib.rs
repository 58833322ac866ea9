//! cafe-server: café ordering backend
//!
//! Orders, menu and inventory over one transactional store. Every order
//! debits its recipe ingredients from stock in the same unit of work that
//! writes the order, and every stock change leaves a ledger row.

pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
