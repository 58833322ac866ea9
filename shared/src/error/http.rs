//! HTTP status per error code

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,

            Self::OrderNotFound | Self::MenuItemNotFound | Self::InventoryItemNotFound => {
                StatusCode::NOT_FOUND
            }

            // Duplicates and terminal-state violations
            Self::AlreadyExists | Self::OrderAlreadyClosed => StatusCode::CONFLICT,

            // Transient, the client may retry
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_code() {
        let cases = [
            (ErrorCode::InvalidInput, StatusCode::BAD_REQUEST),
            (ErrorCode::MenuItemNotFound, StatusCode::NOT_FOUND),
            (ErrorCode::InventoryItemNotFound, StatusCode::NOT_FOUND),
            (ErrorCode::AlreadyExists, StatusCode::CONFLICT),
            (ErrorCode::OrderAlreadyClosed, StatusCode::CONFLICT),
            (ErrorCode::TimeoutError, StatusCode::SERVICE_UNAVAILABLE),
            (ErrorCode::DatabaseError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            assert_eq!(code.http_status(), status, "{code}");
        }
    }
}
