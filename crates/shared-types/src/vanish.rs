//! # Vanish Requests
//!
//! A vanish request is an opt-out: once recorded, every later message from the
//! requester is dropped. Records are appended to a durable stream and never
//! mutated afterwards.
//!
//! ## Stream Field Layout
//!
//! | Field | Value |
//! |-------|-------|
//! | `pubkey` | requester identifier |
//! | `kind` | always `62` |
//! | `created_at` | event creation time (or request time for manual records) |
//! | `tags` | JSON array of tags |
//! | `content` | free-text reason |
//! | `id`, `sig` | only when an originating event exists |
//! | `requested_at` | unix seconds when the record was created |
//! | `target` | `all_relays` or the relay name |

use std::fmt;

use crate::entities::{Identifier, RelayEvent, Tag};

/// Event kind of a request to vanish.
pub const REQUEST_TO_VANISH_KIND: u32 = 62;

/// Tag name selecting the relays a request applies to.
pub const RELAY_TAG: &str = "relay";

/// Sentinel relay tag value targeting every relay.
pub const ALL_RELAYS: &str = "all_relays";

/// Stream the records are appended to.
pub const VANISH_STREAM_KEY: &str = "vanish_requests";

/// Which relays a vanish request applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VanishTarget {
    AllRelays,
    Relay(String),
}

impl fmt::Display for VanishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VanishTarget::AllRelays => f.write_str(ALL_RELAYS),
            VanishTarget::Relay(name) => f.write_str(name),
        }
    }
}

/// One recorded opt-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanishRequestRecord {
    pub identifier: Identifier,
    /// Unix seconds.
    pub requested_at: u64,
    pub target: VanishTarget,
    pub reason: String,
    /// Originating event; `None` for records submitted out of band.
    pub event: Option<RelayEvent>,
}

impl VanishRequestRecord {
    /// Record for a qualifying inbound event. The event content is the reason.
    pub fn from_event(event: &RelayEvent, target: VanishTarget, requested_at: u64) -> Self {
        Self {
            identifier: event.pubkey.clone(),
            requested_at,
            target,
            reason: event.content.clone(),
            event: Some(event.clone()),
        }
    }

    /// Unsigned record for a request received out of band.
    pub fn manual(
        identifier: Identifier,
        relay: impl Into<String>,
        reason: impl Into<String>,
        requested_at: u64,
    ) -> Self {
        Self {
            identifier,
            requested_at,
            target: VanishTarget::Relay(relay.into()),
            reason: reason.into(),
            event: None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        match &self.event {
            Some(event) => event.tags.clone(),
            None => vec![Tag::new(RELAY_TAG, self.target.to_string())],
        }
    }

    /// Ordered `(field, value)` pairs for a stream append.
    pub fn to_stream_fields(&self) -> Vec<(String, String)> {
        let created_at = self
            .event
            .as_ref()
            .map(|event| event.created_at)
            .unwrap_or(self.requested_at);
        let tags = serde_json::to_string(&self.tags()).unwrap_or_else(|_| "[]".to_string());

        let mut fields = vec![
            ("pubkey".to_string(), self.identifier.to_string()),
            ("kind".to_string(), REQUEST_TO_VANISH_KIND.to_string()),
            ("created_at".to_string(), created_at.to_string()),
            ("tags".to_string(), tags),
            ("content".to_string(), self.reason.clone()),
        ];

        if let Some(event) = &self.event {
            fields.push(("id".to_string(), event.id.clone()));
            if let Some(sig) = &event.sig {
                fields.push(("sig".to_string(), sig.clone()));
            }
        }

        fields.push(("requested_at".to_string(), self.requested_at.to_string()));
        fields.push(("target".to_string(), self.target.to_string()));
        fields
    }
}
