//! # VG-02 Vanish Broadcaster
//!
//! Write-policy component honoring requests to vanish (event kind 62).
//!
//! ## Purpose
//!
//! - Shadow-rejects every event from a sender who has already vanished
//! - Records qualifying vanish requests on the durable stream for downstream
//!   deletion, then remembers the sender in the membership cache
//! - Accepts everything else; this component never rejects overtly
//!
//! ## Relay Scoping
//!
//! A vanish request qualifies when any of its `relay` tags (name and value
//! trimmed and lower-cased) equals `all_relays` or this relay's configured
//! scope.
//!
//! ## Failure Handling
//!
//! | Failure | Effect on decision | Logged at |
//! |---------|--------------------|-----------|
//! | Stream append fails or times out | none, sender still cached | `error` (with event JSON) |
//! | Mirror write fails or times out | none, sender cached in memory | `warn` |
//! | Blank relay scope, zero capacity | construction fails | n/a |

pub mod domain;
pub mod error;

pub use domain::{
    BroadcasterConfig, BroadcasterStats, Decision, RelayScope, VanishBroadcaster, VanishOutcome,
};
pub use error::ConfigError;
