//! Relay scope and tag matching.

use std::fmt;

use shared_types::{normalize_tag_element, RelayEvent, VanishTarget, ALL_RELAYS, RELAY_TAG};

use crate::error::ConfigError;

/// This relay's own name as it appears in `relay` tags, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayScope(String);

impl RelayScope {
    /// Normalizes `raw` (trimmed, lower-cased). Blank input is rejected.
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        let normalized = normalize_tag_element(raw);
        if normalized.is_empty() {
            return Err(ConfigError::MissingRelayScope);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The target a vanish event addresses on this relay, if any.
    ///
    /// Every `relay` tag is inspected; `all_relays` wins over a match on this
    /// relay's own name.
    pub fn target_of(&self, event: &RelayEvent) -> Option<VanishTarget> {
        let mut target = None;
        for value in event.tag_values(RELAY_TAG) {
            let value = normalize_tag_element(value);
            if value == ALL_RELAYS {
                return Some(VanishTarget::AllRelays);
            }
            if value == self.0 {
                target = Some(VanishTarget::Relay(self.0.clone()));
            }
        }
        target
    }
}

impl fmt::Display for RelayScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
