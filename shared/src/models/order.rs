//! Order Model

use crate::payload::OpaquePayload;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Open,
    Closed,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    KaspiQr,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
            Self::KaspiQr => "kaspi_qr",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            "kaspi_qr" => Ok(Self::KaspiQr),
            other => Err(format!("unsupported payment method: {other}")),
        }
    }
}

/// Customer purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub special_instructions: OpaquePayload,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One order line with its price frozen at purchase time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: String,
    pub quantity: i32,
    pub price_at_order: Decimal,
}

/// Order header as written to storage
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: i64,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub special_instructions: OpaquePayload,
    pub payment_method: PaymentMethod,
}

/// Order line as written to storage
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub menu_item_id: String,
    pub quantity: i32,
    pub price_at_order: Decimal,
}

/// Requested order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
}

/// Create/update order payload
///
/// `payment_method` and `status` stay as text so unsupported values surface
/// as validation errors instead of body rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub instructions: Option<OpaquePayload>,
    /// Desired status on update; new orders are always open
    #[serde(default)]
    pub status: Option<String>,
}

/// Batch creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOrderRequest {
    pub orders: Vec<OrderRequest>,
}

/// Batch creation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOrderResult {
    pub processed: usize,
    pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("kaspi_qr".parse::<PaymentMethod>(), Ok(PaymentMethod::KaspiQr));
        assert_eq!("cash".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
        assert!("Card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_status_serde() {
        assert_eq!(serde_json::to_string(&OrderStatus::Closed).unwrap(), "\"closed\"");
        assert_eq!(OrderStatus::default(), OrderStatus::Open);
    }

    #[test]
    fn test_order_request_defaults() {
        let req: OrderRequest = serde_json::from_str(
            r#"{"customer_name":"Aida","payment_method":"cash","items":[{"product_id":"latte","quantity":2}]}"#,
        )
        .unwrap();
        assert!(req.instructions.is_none());
        assert!(req.status.is_none());
        assert_eq!(req.items[0].quantity, 2);
    }
}
