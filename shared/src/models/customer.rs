//! Customer Model

use crate::payload::OpaquePayload;
use serde::{Deserialize, Serialize};

/// Purchaser, unique by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub preferences: OpaquePayload,
}
