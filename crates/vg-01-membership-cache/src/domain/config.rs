//! Membership cache configuration and validation
//!
//! # Example
//!
//! ```ignore
//! let config = CacheConfig::default()
//!     .with_capacity(10_000)
//!     .with_store_timeout(Duration::from_millis(250));
//! config.validate()?;
//! ```

use std::time::Duration;

use shared_store::MEMBERSHIP_MIRROR_KEY;

use crate::error::CacheError;

/// Default number of identifiers remembered.
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Default bound on a single mirror call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(500);

/// Membership cache configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Upper bound on remembered identifiers
    pub capacity: usize,
    /// Sorted-set key of the durable mirror
    pub mirror_key: String,
    /// Bound on each durable mirror call
    pub store_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            mirror_key: MEMBERSHIP_MIRROR_KEY.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl CacheConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }

        if self.store_timeout.is_zero() {
            return Err(CacheError::ZeroTimeout);
        }

        if self.mirror_key.trim().is_empty() {
            return Err(CacheError::EmptyMirrorKey);
        }

        Ok(())
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_mirror_key(mut self, key: impl Into<String>) -> Self {
        self.mirror_key = key.into();
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}
