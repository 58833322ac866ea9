//! Business services
//!
//! Each service owns a [`Store`](crate::store::Store) handle and runs every
//! operation as one unit of work under a deadline. The free functions in
//! `pricing`, `recipe`, `ledger` and `customers` are the building blocks the
//! services compose inside a unit.

pub mod allergens;
pub mod customers;
pub mod inventory;
pub mod ledger;
pub mod menu;
pub mod orders;
pub mod pricing;
pub mod recipe;
pub mod reports;

pub use inventory::InventoryService;
pub use menu::MenuService;
pub use orders::OrderService;
pub use reports::ReportService;

use std::future::Future;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

/// Run `fut` under `deadline`.
///
/// On expiry the future is dropped together with any unit of work it holds,
/// which rolls that unit back.
pub async fn with_deadline<T, F>(op: &'static str, deadline: Duration, fut: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation = op, deadline_ms = deadline.as_millis() as u64, "Operation timed out");
            Err(ServiceError::Timeout(op))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let result: ServiceResult<()> = with_deadline("slow_op", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Timeout("slow_op"))));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let result = with_deadline("fast_op", Duration::from_secs(1), async {
            Err::<(), _>(ServiceError::invalid("nope"))
        })
        .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
