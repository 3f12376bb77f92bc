//! Vanish broadcaster as a pipeline step, with metrics.

use async_trait::async_trait;
use shared_store::{SortedSetStore, StreamAppender};
use shared_types::{PolicyReply, PolicyRequest, VanishTarget};
use vg_02_vanish_broadcaster::{BroadcasterStats, VanishBroadcaster, VanishOutcome};

use super::Policy;

pub struct VanishPolicy<S: SortedSetStore, A: StreamAppender> {
    broadcaster: VanishBroadcaster<S, A>,
    /// Mirror failures already reported to metrics.
    reported_mirror_failures: u64,
}

impl<S: SortedSetStore, A: StreamAppender> VanishPolicy<S, A> {
    pub fn new(broadcaster: VanishBroadcaster<S, A>) -> Self {
        vg_telemetry::set_cache_members(broadcaster.cache().len());
        Self {
            broadcaster,
            reported_mirror_failures: 0,
        }
    }

    pub fn stats(&self) -> BroadcasterStats {
        self.broadcaster.stats()
    }

    pub fn broadcaster(&self) -> &VanishBroadcaster<S, A> {
        &self.broadcaster
    }

    fn report(&mut self, outcome: &VanishOutcome) {
        if let VanishOutcome::Recorded {
            target, stream_id, ..
        } = outcome
        {
            let label = match target {
                VanishTarget::AllRelays => "all_relays",
                VanishTarget::Relay(_) => "relay",
            };
            vg_telemetry::record_vanish_request(label);
            if stream_id.is_none() {
                vg_telemetry::record_persistence_failure("stream_append");
            }
            vg_telemetry::set_cache_members(self.broadcaster.cache().len());
        }

        // Background writer failures surface here too, so report the delta.
        let mirror_failures = self.broadcaster.stats().cache.mirror_failures;
        if mirror_failures > self.reported_mirror_failures {
            vg_telemetry::record_persistence_failures(
                "mirror_write",
                mirror_failures - self.reported_mirror_failures,
            );
            self.reported_mirror_failures = mirror_failures;
        }
    }
}

#[async_trait]
impl<S, A> Policy for VanishPolicy<S, A>
where
    S: SortedSetStore + 'static,
    A: StreamAppender + 'static,
{
    fn name(&self) -> &'static str {
        "vanish"
    }

    async fn evaluate(&mut self, request: &PolicyRequest) -> PolicyReply {
        let decision = self.broadcaster.evaluate(&request.event).await;
        self.report(&decision.outcome);
        decision.reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::InMemoryStore;
    use shared_types::{Action, Identifier, RelayEvent, Tag};
    use std::sync::Arc;
    use vg_02_vanish_broadcaster::BroadcasterConfig;

    fn request(id: &str, kind: u32, relay: Option<&str>) -> PolicyRequest {
        PolicyRequest::new_event(RelayEvent {
            id: id.into(),
            pubkey: Identifier::new("alice"),
            kind,
            created_at: 0,
            tags: relay.map(|r| vec![Tag::new("relay", r)]).unwrap_or_default(),
            content: String::new(),
            sig: None,
        })
    }

    #[tokio::test]
    async fn test_vanish_policy_forwards_decisions() {
        let store = Arc::new(InMemoryStore::new());
        let broadcaster =
            VanishBroadcaster::new(BroadcasterConfig::new("example.com"), store.clone(), store.clone())
                .unwrap();
        let mut policy = VanishPolicy::new(broadcaster);

        let first = policy.evaluate(&request("e1", 62, Some("example.com"))).await;
        let second = policy.evaluate(&request("e2", 1, None)).await;

        assert_eq!(first.action, Action::Accept);
        assert_eq!(second, PolicyReply::shadow_reject("e2"));
        assert_eq!(policy.stats().vanish_recorded, 1);
        assert_eq!(store.stream_len("vanish_requests"), 1);
    }

    #[tokio::test]
    async fn test_mirror_failures_reported_once() {
        let store = Arc::new(InMemoryStore::new());
        store.set_sorted_set_available(false);
        let broadcaster =
            VanishBroadcaster::new(BroadcasterConfig::new("example.com"), store.clone(), store.clone())
                .unwrap();
        let mut policy = VanishPolicy::new(broadcaster);

        policy.evaluate(&request("e1", 62, Some("all_relays"))).await;
        policy.evaluate(&request("e2", 1, None)).await;

        assert_eq!(policy.reported_mirror_failures, 1);
    }
}
