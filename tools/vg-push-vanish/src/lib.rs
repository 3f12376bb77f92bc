//! # vg-push-vanish
//!
//! Records a vanish request that arrived out of band (email, support ticket)
//! on the same stream the relay policy writes to. The record is unsigned and
//! targets a single relay.
//!
//! ```text
//! vg-push-vanish -p <pubkey> -r 'Requested through email' [--relay wss://relay] [-y]
//! ```

use clap::Parser;
use serde_json::json;
use shared_store::{StoreError, StreamAppender};
use shared_types::{Identifier, VanishRequestRecord, REQUEST_TO_VANISH_KIND, RELAY_TAG, VANISH_STREAM_KEY};

/// Relay name used when neither `--relay` nor `RELAY_URL` is given.
pub const DEFAULT_RELAY: &str = "ws://localhost:7777";

/// Push a vanish request onto the vanish stream
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "vg-push-vanish")]
#[command(about = "Push an unsigned vanish request received out of band")]
pub struct Args {
    /// Public key of the requester
    #[arg(short, long, value_parser = non_blank)]
    pub pubkey: String,

    /// Reason for the request
    #[arg(short, long, default_value = "")]
    pub reason: String,

    /// Relay the request applies to
    #[arg(long, env = "RELAY_URL", default_value = DEFAULT_RELAY)]
    pub relay: String,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Durable store URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,
}

fn non_blank(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Builds the unsigned record for `args`, timestamped `now_secs`.
pub fn build_record(args: &Args, now_secs: u64) -> VanishRequestRecord {
    VanishRequestRecord::manual(
        Identifier::new(args.pubkey.clone()),
        args.relay.clone(),
        args.reason.clone(),
        now_secs,
    )
}

/// Event-shaped preview shown before confirmation.
pub fn preview(record: &VanishRequestRecord) -> String {
    let event = json!({
        "kind": REQUEST_TO_VANISH_KIND,
        "pubkey": record.identifier.as_str(),
        "created_at": record.requested_at,
        "tags": [[RELAY_TAG, record.target.to_string()]],
        "content": record.reason,
    });
    serde_json::to_string_pretty(&event).unwrap_or_else(|_| event.to_string())
}

/// True for `y` or `yes`, any case.
pub fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Appends `record` to the vanish stream and returns the entry id.
pub async fn push<A>(stream: &A, record: &VanishRequestRecord) -> Result<String, StoreError>
where
    A: StreamAppender + ?Sized,
{
    stream.append(VANISH_STREAM_KEY, &record.to_stream_fields()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::InMemoryStore;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("vg-push-vanish").chain(argv.iter().copied()))
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["-p", "abc", "-r", "email request", "-y", "--relay", "wss://r.example"]).unwrap();
        assert_eq!(args.pubkey, "abc");
        assert_eq!(args.reason, "email request");
        assert_eq!(args.relay, "wss://r.example");
        assert!(args.yes);
    }

    #[test]
    fn test_pubkey_required_and_non_blank() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-p", "   "]).is_err());
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(is_confirmation("y"));
        assert!(is_confirmation(" YES \n"));
        assert!(!is_confirmation(""));
        assert!(!is_confirmation("n"));
        assert!(!is_confirmation("yep"));
    }

    #[test]
    fn test_preview_has_event_shape() {
        let args = parse(&["-p", "abc", "-r", "bye", "--relay", "wss://r.example"]).unwrap();
        let record = build_record(&args, 1_700_000_000);
        let value: serde_json::Value = serde_json::from_str(&preview(&record)).unwrap();

        assert_eq!(value["kind"], 62);
        assert_eq!(value["pubkey"], "abc");
        assert_eq!(value["created_at"], 1_700_000_000);
        assert_eq!(value["tags"], json!([["relay", "wss://r.example"]]));
        assert_eq!(value["content"], "bye");
    }

    #[tokio::test]
    async fn test_push_appends_unsigned_record() {
        let store = InMemoryStore::new();
        let args = parse(&["-p", "abc", "-r", "bye", "--relay", "wss://r.example"]).unwrap();
        let record = build_record(&args, 1_700_000_000);

        let id = push(&store, &record).await.unwrap();

        assert_eq!(id, "1-0");
        let entry = &store.stream_entries("vanish_requests")[0];
        assert_eq!(entry.field("pubkey"), Some("abc"));
        assert_eq!(entry.field("kind"), Some("62"));
        assert_eq!(entry.field("content"), Some("bye"));
        assert_eq!(entry.field("tags"), Some(r#"[["relay","wss://r.example"]]"#));
        assert_eq!(entry.field("sig"), None);
    }
}
