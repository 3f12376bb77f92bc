//! Static allow-list.
//!
//! An event passes when it is not disallowed and either its author or its kind
//! is allowed. The disallow rules override the allow rules.

use std::collections::HashSet;

use async_trait::async_trait;
use shared_types::{PolicyReply, PolicyRequest, RelayEvent, REQUEST_TO_VANISH_KIND};

use super::Policy;

/// Reject message for events outside the allow-list.
pub const NOT_AUTHORIZED: &str = "blocked: not authorized";

const TRUSTED_PUBKEYS: &[&str] = &["56d4b3d6310fadb7294b7f041aab469c5ffc8991b1b1b331981b96a246f6ae65"];

const ALLOWED_KINDS: &[u32] = &[
    0,     // metadata
    1,     // short text note
    3,     // contacts
    4,     // encrypted direct message
    5,     // deletion
    6,     // repost
    7,     // reaction
    REQUEST_TO_VANISH_KIND,
    1059,  // gift wrap
    10000, // mute list
    10002, // relay list
    30023, // long-form content
];

const DISALLOWED_PREFIXES: &[&str] = &["GM from ws"];

/// Allow and disallow rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    pub allowed_pubkeys: HashSet<String>,
    pub allowed_kinds: HashSet<u32>,
    pub disallowed_pubkeys: HashSet<String>,
    pub disallowed_content_prefixes: Vec<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            allowed_pubkeys: TRUSTED_PUBKEYS.iter().map(|p| p.to_string()).collect(),
            allowed_kinds: ALLOWED_KINDS.iter().copied().collect(),
            disallowed_pubkeys: HashSet::new(),
            disallowed_content_prefixes: DISALLOWED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl AllowList {
    pub fn is_disallowed(&self, event: &RelayEvent) -> bool {
        self.disallowed_pubkeys.contains(event.pubkey.as_str())
            || self
                .disallowed_content_prefixes
                .iter()
                .any(|prefix| event.content.starts_with(prefix.as_str()))
    }

    pub fn permits(&self, event: &RelayEvent) -> bool {
        if self.is_disallowed(event) {
            return false;
        }
        self.allowed_pubkeys.contains(event.pubkey.as_str()) || self.allowed_kinds.contains(&event.kind)
    }
}

/// Rejects events outside the [`AllowList`].
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    rules: AllowList,
}

impl AllowListPolicy {
    pub fn new(rules: AllowList) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Policy for AllowListPolicy {
    fn name(&self) -> &'static str {
        "allow_list"
    }

    async fn evaluate(&mut self, request: &PolicyRequest) -> PolicyReply {
        let event = &request.event;
        if self.rules.permits(event) {
            PolicyReply::accept(&event.id)
        } else {
            PolicyReply::reject(&event.id, NOT_AUTHORIZED)
        }
    }
}
