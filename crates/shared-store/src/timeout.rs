//! Bounded store calls.

use std::future::Future;
use std::time::Duration;

use crate::ports::StoreError;

/// Runs a store call, turning an elapsed `limit` into [`StoreError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after_ms: limit.as_millis() as u64,
        }),
    }
}
