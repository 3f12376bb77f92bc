//! # Vanish Broadcaster
//!
//! Per-event decision for the vanish policy.
//!
//! ```text
//! event ──sender cached?──yes──→ shadowReject
//!              │no
//!              ├── kind != 62 ───────────────→ accept
//!              ├── no matching relay tag ────→ accept
//!              └── append record → cache.add → accept
//! ```
//!
//! The stream append happens before the cache update. Neither failure changes
//! the decision.

use std::sync::Arc;
use std::time::Duration;

use shared_store::{bounded, SortedSetStore, StreamAppender};
use shared_types::{
    PolicyReply, RelayEvent, SystemTimeSource, TimeSource, VanishRequestRecord, VanishTarget,
    REQUEST_TO_VANISH_KIND,
};
use tracing::{error, info, warn};
use vg_01_membership_cache::{CacheError, CacheStats, MembershipCache, MirrorWriterHandle};

use super::config::BroadcasterConfig;
use super::scope::RelayScope;
use crate::error::ConfigError;

/// What the broadcaster did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VanishOutcome {
    /// Sender already vanished; shadow-rejected.
    KnownVanished,
    /// Not a vanish request.
    NotVanishKind,
    /// A vanish request addressed to other relays.
    OtherRelay,
    /// A qualifying vanish request was recorded.
    Recorded {
        target: VanishTarget,
        /// Stream entry id, `None` when the append failed.
        stream_id: Option<String>,
        /// Whether the mirror write completed (or was queued).
        mirrored: bool,
    },
}

/// Reply plus the outcome that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub reply: PolicyReply,
    pub outcome: VanishOutcome,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcasterStats {
    pub decisions: u64,
    pub shadow_rejected: u64,
    pub vanish_recorded: u64,
    pub append_failures: u64,
    pub cache: CacheStats,
}

/// Vanish-request broadcaster.
///
/// Owns the membership cache; callers must serialize `decide` calls, which
/// `&mut self` enforces.
pub struct VanishBroadcaster<S: SortedSetStore, A: StreamAppender> {
    scope: RelayScope,
    cache: MembershipCache<S>,
    stream: Arc<A>,
    stream_key: String,
    append_timeout: Duration,
    clock: Arc<dyn TimeSource>,
    decisions: u64,
    shadow_rejected: u64,
    vanish_recorded: u64,
    append_failures: u64,
}

impl<S: SortedSetStore, A: StreamAppender> VanishBroadcaster<S, A> {
    /// Validates `config` and builds an uninitialized broadcaster.
    pub fn new(config: BroadcasterConfig, mirror: Arc<S>, stream: Arc<A>) -> Result<Self, ConfigError> {
        let scope = config.validate()?;
        let cache = MembershipCache::new(mirror, config.cache)?;
        Ok(Self {
            scope,
            cache,
            stream,
            stream_key: config.stream_key,
            append_timeout: config.append_timeout,
            clock: Arc::new(SystemTimeSource),
            decisions: 0,
            shadow_rejected: 0,
            vanish_recorded: 0,
            append_failures: 0,
        })
    }

    /// Uses `clock` for record timestamps and mirror scores.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.cache = self.cache.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn with_write_behind(mut self, writer: MirrorWriterHandle) -> Self {
        self.cache = self.cache.with_write_behind(writer);
        self
    }

    /// Loads remembered senders from the durable mirror.
    pub async fn initialize(&mut self) -> Result<usize, CacheError> {
        self.cache.initialize().await
    }

    pub fn scope(&self) -> &RelayScope {
        &self.scope
    }

    pub fn cache(&self) -> &MembershipCache<S> {
        &self.cache
    }

    pub fn stats(&self) -> BroadcasterStats {
        BroadcasterStats {
            decisions: self.decisions,
            shadow_rejected: self.shadow_rejected,
            vanish_recorded: self.vanish_recorded,
            append_failures: self.append_failures,
            cache: self.cache.stats(),
        }
    }

    /// Decides `event`. The reply id always echoes `event.id`.
    pub async fn decide(&mut self, event: &RelayEvent) -> PolicyReply {
        self.evaluate(event).await.reply
    }

    /// Like [`decide`](Self::decide), also reporting the outcome.
    pub async fn evaluate(&mut self, event: &RelayEvent) -> Decision {
        self.decisions += 1;

        if self.cache.has(event.pubkey.as_str()) {
            self.shadow_rejected += 1;
            return Decision {
                reply: PolicyReply::shadow_reject(&event.id),
                outcome: VanishOutcome::KnownVanished,
            };
        }

        let outcome = if event.kind != REQUEST_TO_VANISH_KIND {
            VanishOutcome::NotVanishKind
        } else {
            match self.scope.target_of(event) {
                Some(target) => self.record(event, target).await,
                None => VanishOutcome::OtherRelay,
            }
        };

        Decision {
            reply: PolicyReply::accept(&event.id),
            outcome,
        }
    }

    async fn record(&mut self, event: &RelayEvent, target: VanishTarget) -> VanishOutcome {
        let record = VanishRequestRecord::from_event(event, target.clone(), self.clock.now_secs());
        let fields = record.to_stream_fields();

        let stream_id = match bounded(
            self.append_timeout,
            "append",
            self.stream.append(&self.stream_key, &fields),
        )
        .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                self.append_failures += 1;
                let event_json = serde_json::to_string(event).unwrap_or_default();
                error!(
                    pubkey = %event.pubkey,
                    error = %e,
                    event = %event_json,
                    "Failed to append vanish request to stream; resubmit manually"
                );
                None
            }
        };

        let mirrored = match self.cache.add(&event.pubkey).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    pubkey = %event.pubkey,
                    error = %e,
                    "Vanished sender remembered in memory only"
                );
                false
            }
        };

        self.vanish_recorded += 1;
        info!(
            pubkey = %event.pubkey,
            target = %target,
            stream_id = stream_id.as_deref().unwrap_or("-"),
            "Vanish request recorded"
        );

        VanishOutcome::Recorded {
            target,
            stream_id,
            mirrored,
        }
    }
}
