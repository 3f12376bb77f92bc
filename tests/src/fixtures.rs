//! Shared builders for integration scenarios.

use rand::Rng;
use shared_types::{Identifier, RelayEvent, Tag};

/// Random 32-byte hex identifier.
pub fn random_pubkey() -> Identifier {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    Identifier::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

pub fn event(id: &str, pubkey: &Identifier, kind: u32, relays: &[&str]) -> RelayEvent {
    RelayEvent {
        id: id.to_string(),
        pubkey: pubkey.clone(),
        kind,
        created_at: 1_700_000_000,
        tags: relays.iter().map(|r| Tag::new("relay", *r)).collect(),
        content: String::new(),
        sig: Some("00".repeat(64)),
    }
}

/// One host request line for `event`.
pub fn host_line(event: &RelayEvent) -> String {
    serde_json::json!({
        "type": "new",
        "event": event,
        "receivedAt": 1_700_000_001,
        "sourceType": "IP4",
        "sourceInfo": "127.0.0.1",
    })
    .to_string()
}
