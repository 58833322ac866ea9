//! Input validation helpers
//!
//! Every check here runs before the service opens a unit of work, so a
//! rejection never touches the store.

use rust_decimal::Decimal;

use crate::error::{ServiceError, ServiceResult};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: inventory item, menu item, customer
pub const MAX_NAME_LEN: usize = 200;

/// Menu descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Ids, unit types, sizes
pub const MAX_SHORT_TEXT_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(ServiceError::invalid(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: &str, field: &str, max_len: usize) -> ServiceResult<()> {
    if value.len() > max_len {
        return Err(ServiceError::invalid(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

pub fn validate_positive(value: Decimal, field: &str) -> ServiceResult<()> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::invalid(format!("{field} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Latte", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        let long = "x".repeat(MAX_SHORT_TEXT_LEN + 1);
        let err = validate_required_text(&long, "size", MAX_SHORT_TEXT_LEN).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_positive() {
        assert!(validate_positive(Decimal::new(1, 2), "price").is_ok());
        assert!(validate_positive(Decimal::ZERO, "price").is_err());
        assert!(validate_positive(Decimal::from(-3), "price").is_err());
    }
}
