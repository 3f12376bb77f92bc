//! Broadcaster configuration

use std::time::Duration;

use shared_types::VANISH_STREAM_KEY;
use vg_01_membership_cache::CacheConfig;

use super::scope::RelayScope;
use crate::error::ConfigError;

/// Default bound on a single stream append.
pub const DEFAULT_APPEND_TIMEOUT: Duration = Duration::from_millis(500);

/// Broadcaster configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcasterConfig {
    /// This relay's name as used in `relay` tags (required)
    pub relay_scope: String,
    /// Membership cache settings
    pub cache: CacheConfig,
    /// Stream receiving vanish request records
    pub stream_key: String,
    /// Bound on each stream append
    pub append_timeout: Duration,
}

impl BroadcasterConfig {
    pub fn new(relay_scope: impl Into<String>) -> Self {
        Self {
            relay_scope: relay_scope.into(),
            cache: CacheConfig::default(),
            stream_key: VANISH_STREAM_KEY.to_string(),
            append_timeout: DEFAULT_APPEND_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_stream_key(mut self, key: impl Into<String>) -> Self {
        self.stream_key = key.into();
        self
    }

    pub fn with_append_timeout(mut self, timeout: Duration) -> Self {
        self.append_timeout = timeout;
        self
    }

    /// Validates everything and returns the normalized relay scope.
    pub fn validate(&self) -> Result<RelayScope, ConfigError> {
        let scope = RelayScope::new(&self.relay_scope)?;
        self.cache.validate()?;

        if self.stream_key.trim().is_empty() {
            return Err(ConfigError::EmptyStreamKey);
        }

        if self.append_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(scope)
    }
}
