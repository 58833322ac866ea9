//! API error and its JSON body

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned across the HTTP boundary
///
/// Carries a stable [`ErrorCode`], a human-readable message and optional
/// structured details such as the offending resource or operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidInput, msg)
    }

    pub fn already_exists(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::AlreadyExists, format!("{r} already exists"))
            .with_detail("resource", r)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        let op = operation.into();
        Self::with_message(ErrorCode::TimeoutError, format!("{op} timed out"))
            .with_detail("operation", op)
    }
}

/// Error body: `{"code": 7001, "message": "...", "details": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ErrorBody::from(&self);

        // Log system errors
        if self.code.category() == ErrorCategory::System {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database error");
        assert!(err.details.is_none());
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_constructors() {
        let err = AppError::already_exists("menu item latte");
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(err.message, "menu item latte already exists");
        assert_eq!(err.details.unwrap()["resource"], "menu item latte");

        let err = AppError::timeout("create_order");
        assert_eq!(err.code, ErrorCode::TimeoutError);
        assert_eq!(err.message, "create_order timed out");

        let err = AppError::invalid_input("quantity must be positive").with_detail("field", "quantity");
        assert_eq!(err.to_string(), "quantity must be positive");
        assert_eq!(err.details.unwrap()["field"], "quantity");
    }

    #[test]
    fn test_error_body_shape() {
        let err = AppError::with_message(ErrorCode::OrderAlreadyClosed, "order 7 is already closed")
            .with_detail("order_id", 7);
        let json = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(json["code"], 4002);
        assert_eq!(json["message"], "order 7 is already closed");
        assert_eq!(json["details"]["order_id"], 7);

        let bare = serde_json::to_string(&ErrorBody::from(&AppError::new(ErrorCode::InvalidInput)))
            .unwrap();
        assert!(!bare.contains("details"));
        assert!(!bare.contains("data"));
    }

    #[test]
    fn test_error_body_parses_back() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"code":7001,"message":"inventory item milk not found"}"#)
                .unwrap();
        assert_eq!(body.code, ErrorCode::InventoryItemNotFound);
        assert!(body.details.is_none());
    }
}
