//! # Runtime Configuration
//!
//! Built from environment variables once at startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RELAY_URL` | required |
//! | `REDIS_URL` | `redis://localhost:6379` |
//! | `VANISH_CACHE_CAPACITY` | `1000000` |
//! | `VANISH_STORE_TIMEOUT_MS` | `500` |
//! | `VANISH_WRITE_BEHIND` | `true` |
//! | `VANISH_ALLOW_COLD_START` | `false` |
//! | `ALLOW_LIST_ENABLED` | `true` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use vg_01_membership_cache::CacheConfig;
use vg_02_vanish_broadcaster::BroadcasterConfig;

/// Default durable store location.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("RELAY_URL must be set to this relay's name")]
    MissingRelayUrl,

    #[error("invalid value {value:?} for {variable}")]
    InvalidValue {
        variable: &'static str,
        value: String,
    },
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// This relay's name as used in vanish request `relay` tags.
    pub relay_url: String,
    pub redis_url: String,
    pub cache_capacity: usize,
    /// Bound on every durable store call.
    pub store_timeout: Duration,
    /// Queue mirror writes instead of awaiting them before replying.
    pub write_behind: bool,
    /// Serve with an empty cache when the mirror cannot be loaded.
    pub allow_cold_start: bool,
    pub allow_list_enabled: bool,
}

impl PolicyConfig {
    /// Defaults for everything but the relay name.
    pub fn new(relay_url: impl Into<String>) -> Self {
        let cache = CacheConfig::default();
        Self {
            relay_url: relay_url.into(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_capacity: cache.capacity,
            store_timeout: cache.store_timeout,
            write_behind: true,
            allow_cold_start: false,
            allow_list_enabled: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let relay_url = lookup("RELAY_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingRelayUrl)?;
        let mut config = Self::new(relay_url);

        if let Some(url) = lookup("REDIS_URL").filter(|v| !v.trim().is_empty()) {
            config.redis_url = url;
        }
        if let Some(capacity) = parse_var::<usize, _>(&lookup, "VANISH_CACHE_CAPACITY")? {
            config.cache_capacity = capacity;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "VANISH_STORE_TIMEOUT_MS")? {
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(flag) = flag_var(&lookup, "VANISH_WRITE_BEHIND")? {
            config.write_behind = flag;
        }
        if let Some(flag) = flag_var(&lookup, "VANISH_ALLOW_COLD_START")? {
            config.allow_cold_start = flag;
        }
        if let Some(flag) = flag_var(&lookup, "ALLOW_LIST_ENABLED")? {
            config.allow_list_enabled = flag;
        }

        Ok(config)
    }

    /// Broadcaster settings derived from this configuration.
    pub fn broadcaster_config(&self) -> BroadcasterConfig {
        let cache = CacheConfig::default()
            .with_capacity(self.cache_capacity)
            .with_store_timeout(self.store_timeout);
        BroadcasterConfig::new(self.relay_url.clone())
            .with_cache(cache)
            .with_append_timeout(self.store_timeout)
    }
}

fn parse_var<T, F>(lookup: &F, variable: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(variable) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { variable, value }),
    }
}

fn flag_var<F>(lookup: &F, variable: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(variable) {
        None => Ok(None),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { variable, value }),
        },
    }
}
