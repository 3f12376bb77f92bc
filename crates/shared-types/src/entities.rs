//! # Core Domain Entities
//!
//! The relay event as the host hands it to the policy, and the opaque
//! identifier naming its sender.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque sender identifier (a hex public key on the wire).
///
/// Immutable and compared by exact equality. No normalization is applied: two
/// identifiers that differ only in case are different senders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Lower-cases and trims a tag element for comparison.
pub fn normalize_tag_element(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// An event tag: an ordered sequence of strings, `[name, value, ...]`.
///
/// Only the first two elements carry meaning for policy decisions; extra
/// elements are preserved so the event can be re-serialized unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    /// Builds a two-element `[name, value]` tag.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self(vec![name.into(), value.into()])
    }

    pub fn from_parts(parts: Vec<String>) -> Self {
        Self(parts)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// True when the normalized first element equals `name` (already normalized).
    pub fn is_named(&self, name: &str) -> bool {
        self.name()
            .map(|n| normalize_tag_element(n) == name)
            .unwrap_or(false)
    }
}

/// An inbound relay event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEvent {
    /// Event id, echoed verbatim in the decision reply.
    pub id: String,
    /// Sender identifier.
    pub pubkey: Identifier,
    pub kind: u32,
    pub created_at: u64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl RelayEvent {
    /// Values (second elements) of every tag whose normalized name is `name`.
    ///
    /// Tags with fewer than two elements are skipped.
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.is_named(name))
            .filter_map(Tag::value)
    }
}
