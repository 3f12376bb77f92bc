//! # End-to-End Protocol Scenarios
//!
//! Host lines through the full runtime pipeline, with the in-memory store
//! standing in for the durable store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use policy_runtime::{serve, PolicyConfig, Runtime, MALFORMED_REQUEST};
    use shared_store::{InMemoryStore, MEMBERSHIP_MIRROR_KEY};
    use shared_types::{Action, PolicyReply, VANISH_STREAM_KEY};

    use crate::fixtures::{event, host_line, random_pubkey};

    async fn run(runtime: &mut Runtime, lines: &[String]) -> Vec<PolicyReply> {
        let input = lines.join("\n") + "\n";
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, &mut runtime.pipeline)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_vanish_then_silence() {
        let store = Arc::new(InMemoryStore::new());
        let mut runtime = Runtime::start(&PolicyConfig::new("wss://Relay.Example"), store.clone(), store.clone())
            .await
            .unwrap();
        let alice = random_pubkey();
        let bob = random_pubkey();

        let replies = run(
            &mut runtime,
            &[
                host_line(&event("n1", &alice, 1, &[])),
                host_line(&event("v1", &alice, 62, &["wss://relay.example"])),
                host_line(&event("n2", &alice, 1, &[])),
                host_line(&event("n3", &bob, 1, &[])),
                host_line(&event("z1", &bob, 9735, &[])),
            ],
        )
        .await;

        assert_eq!(
            replies,
            vec![
                PolicyReply::accept("n1"),
                PolicyReply::accept("v1"),
                PolicyReply::shadow_reject("n2"),
                PolicyReply::accept("n3"),
                PolicyReply::reject("z1", "blocked: not authorized"),
            ]
        );

        let report = runtime.shutdown().await.unwrap();
        assert_eq!(report.batches_failed, 0);
        assert_eq!(store.members(MEMBERSHIP_MIRROR_KEY), vec![alice.clone()]);

        let entries = store.stream_entries(VANISH_STREAM_KEY);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("pubkey"), Some(alice.as_str()));
        assert_eq!(entries[0].field("id"), Some("v1"));
        assert_eq!(entries[0].field("target"), Some("wss://relay.example"));
    }

    #[tokio::test]
    async fn test_vanish_for_other_relay_changes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let mut runtime = Runtime::start(&PolicyConfig::new("example.com"), store.clone(), store.clone())
            .await
            .unwrap();
        let alice = random_pubkey();

        let replies = run(
            &mut runtime,
            &[
                host_line(&event("v1", &alice, 62, &["notexample.com"])),
                host_line(&event("n1", &alice, 1, &[])),
            ],
        )
        .await;

        assert!(replies.iter().all(|r| r.action == Action::Accept));
        runtime.shutdown().await;
        assert_eq!(store.stream_len(VANISH_STREAM_KEY), 0);
        assert!(store.members(MEMBERSHIP_MIRROR_KEY).is_empty());
    }

    #[tokio::test]
    async fn test_store_outage_never_blocks_replies() {
        let store = Arc::new(InMemoryStore::new());
        let mut runtime = Runtime::start(&PolicyConfig::new("example.com"), store.clone(), store.clone())
            .await
            .unwrap();
        store.set_sorted_set_available(false);
        store.set_stream_available(false);
        let alice = random_pubkey();

        let replies = run(
            &mut runtime,
            &[
                host_line(&event("v1", &alice, 62, &["ALL_RELAYS"])),
                host_line(&event("n1", &alice, 1, &[])),
            ],
        )
        .await;

        assert_eq!(
            replies,
            vec![PolicyReply::accept("v1"), PolicyReply::shadow_reject("n1")]
        );
        let report = runtime.shutdown().await.unwrap();
        assert_eq!(report.batches_failed, 1);
    }

    #[tokio::test]
    async fn test_malformed_and_foreign_lines_interleaved() {
        let store = Arc::new(InMemoryStore::new());
        let mut config = PolicyConfig::new("example.com");
        config.write_behind = false;
        let mut runtime = Runtime::start(&config, store.clone(), store.clone()).await.unwrap();
        let alice = random_pubkey();

        let replies = run(
            &mut runtime,
            &[
                "{garbage".to_string(),
                r#"{"type":"new","event":{"id":"broken","pubkey":"abc"}}"#.to_string(),
                r#"{"type":"lookback","event":{"id":"old"}}"#.to_string(),
                String::new(),
                host_line(&event("ok", &alice, 1, &[])),
            ],
        )
        .await;

        assert_eq!(
            replies,
            vec![
                PolicyReply::reject("broken", MALFORMED_REQUEST),
                PolicyReply::accept("ok"),
            ]
        );
    }
}
