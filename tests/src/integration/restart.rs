//! # Restart Scenarios
//!
//! A second cache or broadcaster built over the same durable mirror must
//! remember what the first one recorded, bounded by its own capacity.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shared_store::{InMemoryStore, MEMBERSHIP_MIRROR_KEY};
    use shared_types::{Action, Identifier, ManualTimeSource};
    use vg_01_membership_cache::{CacheConfig, MembershipCache, MirrorWriter};
    use vg_02_vanish_broadcaster::{BroadcasterConfig, VanishBroadcaster};

    use crate::fixtures::{event, random_pubkey};

    fn cache(store: &Arc<InMemoryStore>, capacity: usize, clock: &Arc<ManualTimeSource>) -> MembershipCache<InMemoryStore> {
        MembershipCache::new(store.clone(), CacheConfig::default().with_capacity(capacity))
            .unwrap()
            .with_clock(clock.clone())
    }

    #[tokio::test]
    async fn test_membership_survives_restart() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let members: Vec<Identifier> = (0..5).map(|_| random_pubkey()).collect();

        let mut first = cache(&store, 10, &clock);
        first.initialize().await.unwrap();
        for member in &members {
            first.add(member).await.unwrap();
            clock.advance(1);
        }
        drop(first);

        let mut second = cache(&store, 10, &clock);
        assert_eq!(second.initialize().await.unwrap(), 5);
        for member in &members {
            assert!(second.has(member.as_str()));
        }
        assert!(!second.has(random_pubkey().as_str()));
        assert_eq!(second.iter().cloned().collect::<Vec<_>>(), members);
    }

    #[tokio::test]
    async fn test_smaller_capacity_after_restart_keeps_newest() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let members: Vec<Identifier> = (0..8).map(|_| random_pubkey()).collect();

        let mut first = cache(&store, 100, &clock);
        for member in &members {
            first.add(member).await.unwrap();
            clock.advance(1);
        }

        let mut second = cache(&store, 3, &clock);
        second.initialize().await.unwrap();

        let newest = members[5..].to_vec();
        assert_eq!(second.iter().cloned().collect::<Vec<_>>(), newest);
        assert_eq!(store.members(MEMBERSHIP_MIRROR_KEY), newest);
    }

    #[tokio::test]
    async fn test_eviction_is_mirrored_across_restart() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let members: Vec<Identifier> = (0..4).map(|_| random_pubkey()).collect();

        let mut first = cache(&store, 3, &clock);
        for member in &members {
            first.add(member).await.unwrap();
            clock.advance(1);
        }
        assert!(!first.has(members[0].as_str()));

        let mut second = cache(&store, 3, &clock);
        second.initialize().await.unwrap();
        assert!(!second.has(members[0].as_str()));
        assert!(members[1..].iter().all(|m| second.has(m.as_str())));
    }

    #[tokio::test]
    async fn test_vanished_sender_shadow_rejected_after_restart_with_write_behind() {
        let store = Arc::new(InMemoryStore::new());
        let alice = random_pubkey();

        let (handle, writer) = MirrorWriter::spawn(store.clone(), Duration::from_millis(200));
        let mut first =
            VanishBroadcaster::new(BroadcasterConfig::new("wss://relay.example"), store.clone(), store.clone())
                .unwrap()
                .with_write_behind(handle);
        first.initialize().await.unwrap();
        let reply = first
            .decide(&event("e1", &alice, 62, &["wss://relay.example"]))
            .await;
        assert_eq!(reply.action, Action::Accept);

        drop(first);
        let report = writer.await.unwrap();
        assert_eq!(report.batches_applied, 1);

        let mut second =
            VanishBroadcaster::new(BroadcasterConfig::new("wss://relay.example"), store.clone(), store.clone())
                .unwrap();
        second.initialize().await.unwrap();

        let reply = second.decide(&event("e2", &alice, 1, &[])).await;
        assert_eq!(reply.action, Action::ShadowReject);
        assert_eq!(reply.id, "e2");
        assert_eq!(store.stream_len("vanish_requests"), 1);
    }

    #[tokio::test]
    async fn test_mirror_loss_window_forgets_sender_after_restart() {
        let store = Arc::new(InMemoryStore::new());
        let alice = random_pubkey();

        let mut first =
            VanishBroadcaster::new(BroadcasterConfig::new("example.com"), store.clone(), store.clone()).unwrap();
        store.set_sorted_set_available(false);
        first.decide(&event("e1", &alice, 62, &["all_relays"])).await;
        assert_eq!(first.decide(&event("e2", &alice, 1, &[])).await.action, Action::ShadowReject);

        store.set_sorted_set_available(true);
        let mut second =
            VanishBroadcaster::new(BroadcasterConfig::new("example.com"), store.clone(), store.clone()).unwrap();
        second.initialize().await.unwrap();

        // The stream holds the request; the mirror never did.
        assert_eq!(store.stream_len("vanish_requests"), 1);
        assert_eq!(second.decide(&event("e3", &alice, 1, &[])).await.action, Action::Accept);
    }
}
