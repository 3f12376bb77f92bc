//! # Host Protocol Messages
//!
//! The relay host writes one JSON request per line and reads back exactly one
//! JSON reply per `"new"` request, in order.
//!
//! ```text
//! host ──{"type":"new","event":{...}}──→ policy
//! host ←──{"id":"<event id>","action":"accept","msg":""}── policy
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::RelayEvent;
use crate::errors::ProtocolError;

/// The only request type that produces a decision.
pub const NEW_EVENT_REQUEST: &str = "new";

/// Decision outcome reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Accept,
    Reject,
    /// Reported as accepted to the sender, never stored or delivered.
    ShadowReject,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::ShadowReject => "shadowReject",
        }
    }
}

/// A decision request from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub event: RelayEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<String>,
}

impl PolicyRequest {
    /// Wraps an event in a `"new"` request.
    pub fn new_event(event: RelayEvent) -> Self {
        Self {
            request_type: NEW_EVENT_REQUEST.to_string(),
            event,
            received_at: None,
            source_type: None,
            source_info: None,
        }
    }
}

/// A decision reply. `id` always echoes the inbound event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReply {
    pub id: String,
    pub action: Action,
    pub msg: String,
}

impl PolicyReply {
    pub fn accept(event_id: impl Into<String>) -> Self {
        Self {
            id: event_id.into(),
            action: Action::Accept,
            msg: String::new(),
        }
    }

    pub fn reject(event_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            id: event_id.into(),
            action: Action::Reject,
            msg: msg.into(),
        }
    }

    pub fn shadow_reject(event_id: impl Into<String>) -> Self {
        Self {
            id: event_id.into(),
            action: Action::ShadowReject,
            msg: String::new(),
        }
    }

    pub fn is_accept(&self) -> bool {
        self.action == Action::Accept
    }

    /// Serializes the reply as a single protocol line (no trailing newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Classification of one host line.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundLine {
    /// A well-formed `"new"` request.
    Request(PolicyRequest),
    /// A well-formed request of another type; gets no reply.
    Ignored { request_type: String },
    /// Whitespace only.
    Blank,
    /// Undecodable. `event_id` is set when the id could still be recovered.
    Malformed {
        event_id: Option<String>,
        error: ProtocolError,
    },
}

/// Decodes one host line.
pub fn parse_line(line: &str) -> InboundLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InboundLine::Blank;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => {
            return InboundLine::Malformed {
                event_id: None,
                error: ProtocolError::InvalidJson(e.to_string()),
            }
        }
    };

    let event_id = value
        .get("event")
        .and_then(|event| event.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_owned);

    match value.get("type").and_then(Value::as_str) {
        None => InboundLine::Malformed {
            event_id,
            error: ProtocolError::MissingField("type"),
        },
        Some(request_type) if request_type != NEW_EVENT_REQUEST => InboundLine::Ignored {
            request_type: request_type.to_owned(),
        },
        Some(_) => {
            if event_id.is_none() {
                return InboundLine::Malformed {
                    event_id: None,
                    error: ProtocolError::MissingField("event.id"),
                };
            }
            match serde_json::from_value::<PolicyRequest>(value) {
                Ok(request) => InboundLine::Request(request),
                Err(e) => InboundLine::Malformed {
                    event_id,
                    error: ProtocolError::InvalidEvent(e.to_string()),
                },
            }
        }
    }
}
