//! Error system shared by the server and its API clients
//!
//! - [`ErrorCode`]: stable numeric codes, grouped by range
//! - [`ErrorCategory`]: classification of a code by its range
//! - [`AppError`]: code, message and optional details
//! - [`ErrorBody`]: JSON shape of every error response
//!
//! ```
//! use shared::error::{AppError, ErrorBody, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::OrderAlreadyClosed, "order 7 is already closed")
//!     .with_detail("order_id", 7);
//! let body = ErrorBody::from(&err);
//! assert_eq!(body.code.code(), 4002);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, ErrorBody};
