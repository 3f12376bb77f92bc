//! Error types for the membership cache

use shared_store::StoreError;
use thiserror::Error;

/// Errors raised by the membership cache
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("cache capacity must be greater than zero")]
    ZeroCapacity,

    #[error("store timeout must be greater than zero")]
    ZeroTimeout,

    #[error("mirror key must not be empty")]
    EmptyMirrorKey,

    #[error("durable mirror error: {0}")]
    Store(#[from] StoreError),
}
