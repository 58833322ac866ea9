//! Stable error codes carried in every error body
//!
//! - 0xxx: General
//! - 4xxx: Order
//! - 6xxx: Menu
//! - 7xxx: Inventory
//! - 9xxx: System

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code, serialized as its bare `u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Missing, malformed or out-of-range input
    InvalidInput = 2,
    /// Id already taken
    AlreadyExists = 4,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    /// Order is closed and cannot be closed again
    OrderAlreadyClosed = 4002,

    // ==================== 6xxx: Menu ====================
    MenuItemNotFound = 6001,

    // ==================== 7xxx: Inventory ====================
    InventoryItemNotFound = 7001,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    /// Operation exceeded its deadline and was rolled back
    TimeoutError = 9004,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default message when no specific one is given
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyClosed => "The order is already closed",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::InventoryItemNotFound => "Inventory item not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that names no error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ErrorCode::InvalidInput),
            4 => Ok(ErrorCode::AlreadyExists),
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyClosed),
            6001 => Ok(ErrorCode::MenuItemNotFound),
            7001 => Ok(ErrorCode::InventoryItemNotFound),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(serde_json::to_string(&ErrorCode::OrderAlreadyClosed).unwrap(), "4002");
        let code: ErrorCode = serde_json::from_str("6001").unwrap();
        assert_eq!(code, ErrorCode::MenuItemNotFound);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_try_from() {
        assert_eq!(ErrorCode::try_from(7001), Ok(ErrorCode::InventoryItemNotFound));
        assert_eq!(ErrorCode::try_from(3), Err(InvalidErrorCode(3)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::InvalidInput.to_string(), "E0002");
        assert_eq!(ErrorCode::TimeoutError.to_string(), "E9004");
    }
}
