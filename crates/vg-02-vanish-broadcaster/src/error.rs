//! Error types for the vanish-request broadcaster

use thiserror::Error;
use vg_01_membership_cache::CacheError;

/// Construction-time failures. The broadcaster must not start on any of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("relay scope is required and must not be blank")]
    MissingRelayScope,

    #[error("stream key must not be empty")]
    EmptyStreamKey,

    #[error("stream append timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid cache configuration: {0}")]
    Cache(#[from] CacheError),
}
