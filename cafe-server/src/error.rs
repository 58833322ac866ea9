//! Unified service-layer error type for cafe-server
//!
//! `ServiceError` bridges store errors (`sqlx::Error`) and business-rule
//! rejections to the API-layer error (`AppError`). Handlers propagate it with
//! `?`; the conversion picks the stable error code and HTTP status.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use std::fmt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Entity named by a not-found or duplicate error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Order(i64),
    MenuItem(String),
    InventoryItem(String),
}

impl Resource {
    fn not_found_code(&self) -> ErrorCode {
        match self {
            Self::Order(_) => ErrorCode::OrderNotFound,
            Self::MenuItem(_) => ErrorCode::MenuItemNotFound,
            Self::InventoryItem(_) => ErrorCode::InventoryItemNotFound,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(id) => write!(f, "order {id}"),
            Self::MenuItem(id) => write!(f, "menu item {id}"),
            Self::InventoryItem(id) => write!(f, "inventory item {id}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Rejected before any store mutation
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} already exists")]
    AlreadyExists(Resource),
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("order {0} is already closed")]
    OrderAlreadyClosed(i64),
    /// Deadline expired; the in-flight transaction was rolled back
    #[error("{0} timed out")]
    Timeout(&'static str),
    /// Store failure, annotated with the store operation
    #[error("{op}: {source}")]
    Db {
        op: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Map a store error, tagging it with the failing operation
    pub fn db(op: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |e| Self::Db {
            op,
            source: e.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::NotFound(resource) => resource.not_found_code(),
            Self::OrderAlreadyClosed(_) => ErrorCode::OrderAlreadyClosed,
            Self::Timeout(_) => ErrorCode::TimeoutError,
            Self::Db { .. } => ErrorCode::DatabaseError,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db {
            op: "store",
            source: e.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Db { op, source } => {
                tracing::error!(operation = op, error = %source, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
            ServiceError::InvalidInput(msg) => AppError::invalid_input(msg),
            ServiceError::AlreadyExists(resource) => AppError::already_exists(resource.to_string()),
            ServiceError::NotFound(resource) => {
                let code = resource.not_found_code();
                AppError::with_message(code, format!("{resource} not found"))
                    .with_detail("resource", resource.to_string())
            }
            ServiceError::OrderAlreadyClosed(id) => AppError::with_message(
                ErrorCode::OrderAlreadyClosed,
                format!("order {id} is already closed"),
            )
            .with_detail("order_id", id),
            ServiceError::Timeout(op) => AppError::timeout(op),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::invalid("bad"), StatusCode::BAD_REQUEST),
            (
                ServiceError::NotFound(Resource::Order(1)),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::AlreadyExists(Resource::MenuItem("latte".into())),
                StatusCode::CONFLICT,
            ),
            (ServiceError::OrderAlreadyClosed(1), StatusCode::CONFLICT),
            (
                ServiceError::Timeout("create_order"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::Db {
                    op: "insert_order",
                    source: "connection reset".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.http_status(), status);
        }
    }

    #[test]
    fn test_not_found_uses_resource_code() {
        let app: AppError = ServiceError::NotFound(Resource::InventoryItem("milk".into())).into();
        assert_eq!(app.code, ErrorCode::InventoryItemNotFound);
        assert_eq!(app.message, "inventory item milk not found");
    }

    #[test]
    fn test_db_error_does_not_leak_details() {
        let app: AppError = ServiceError::Db {
            op: "debit_stock",
            source: "relation \"inventory\" does not exist".into(),
        }
        .into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert!(!app.message.contains("relation"));
    }
}
