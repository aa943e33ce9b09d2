use std::future::Future;
use std::time::Duration;

use domains::{BookingError, Result};

/// Runs a store call under `limit`. Elapsing drops the future, which rolls
/// back any open transaction, and reports `StorageUnavailable`.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout = ?limit, "storage call timed out");
            Err(BookingError::storage(format!("{operation} timed out after {limit:?}")))
        }
    }
}
