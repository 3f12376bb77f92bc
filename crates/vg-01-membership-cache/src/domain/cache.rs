//! # Membership Cache
//!
//! A bounded membership record, not an access-frequency cache: eviction is by
//! insertion time and lookups never reorder anything.
//!
//! ## Algorithm
//!
//! - `order` (oldest first) and `members` always hold the same identifiers
//! - `add` appends to `order`; once `len > capacity` the head of `order` is
//!   evicted
//! - The durable mirror scores each member with its insertion time in
//!   milliseconds; `initialize` rebuilds `order` from the newest `capacity`
//!   entries

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use shared_store::{bounded, SortedSetStore};
use shared_types::{Identifier, SystemTimeSource, TimeSource};
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use super::mirror::{MirrorBatch, MirrorWrite};
use crate::adapters::MirrorWriterHandle;
use crate::error::CacheError;

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub members: usize,
    pub capacity: usize,
    /// Identifiers added since start (including ones later evicted).
    pub additions: u64,
    pub evictions: u64,
    /// Mirror batches that failed, inline or in the background writer.
    pub mirror_failures: u64,
}

/// Bounded FIFO set of identifiers backed by a durable sorted set.
pub struct MembershipCache<S: SortedSetStore> {
    /// Insertion order, oldest first.
    order: VecDeque<Identifier>,
    members: HashSet<Identifier>,
    config: CacheConfig,
    store: Arc<S>,
    clock: Arc<dyn TimeSource>,
    /// When set, mirror writes are queued instead of awaited.
    write_behind: Option<MirrorWriterHandle>,
    additions: u64,
    evictions: u64,
    inline_failures: u64,
}

impl<S: SortedSetStore> MembershipCache<S> {
    /// Creates an empty cache. Call [`initialize`](Self::initialize) before use.
    pub fn new(store: Arc<S>, config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            order: VecDeque::new(),
            members: HashSet::new(),
            config,
            store,
            clock: Arc::new(SystemTimeSource),
            write_behind: None,
            additions: 0,
            evictions: 0,
            inline_failures: 0,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Routes mirror writes through a background writer.
    pub fn with_write_behind(mut self, writer: MirrorWriterHandle) -> Self {
        self.write_behind = Some(writer);
        self
    }

    /// Loads the newest `capacity` identifiers from the mirror and trims the
    /// mirror down to `capacity` entries.
    ///
    /// Returns the number of identifiers loaded. Replaces any in-memory state.
    /// Only a failed load is an error; a failed trim is logged.
    pub async fn initialize(&mut self) -> Result<usize, CacheError> {
        let capacity = self.config.capacity;
        let key = self.config.mirror_key.as_str();
        let limit = self.config.store_timeout;

        let newest_first = bounded(
            limit,
            "range_by_score_desc",
            self.store.range_by_score_desc(key, 0, capacity as i64 - 1),
        )
        .await?;

        self.order.clear();
        self.members.clear();
        for identifier in newest_first.into_iter().take(capacity).rev() {
            if self.members.insert(identifier.clone()) {
                self.order.push_back(identifier);
            }
        }

        // A failed trim leaves the mirror oversized until a later start; the
        // load stands.
        let total = match self.trim_mirror(capacity).await {
            Ok(total) => Some(total),
            Err(e) => {
                warn!(error = %e, capacity, "Could not trim durable mirror; retrying on next start");
                None
            }
        };

        info!(
            loaded = self.order.len(),
            mirror_total = ?total,
            capacity,
            "Membership cache initialized"
        );
        Ok(self.order.len())
    }

    /// Removes the oldest mirror entries beyond `capacity`. Returns the mirror
    /// size seen before trimming.
    async fn trim_mirror(&self, capacity: usize) -> Result<u64, CacheError> {
        let key = self.config.mirror_key.as_str();
        let limit = self.config.store_timeout;

        let total = bounded(limit, "cardinality", self.store.cardinality(key)).await?;
        if total > capacity as u64 {
            let excess = total - capacity as u64;
            let removed = bounded(
                limit,
                "trim_lowest_scoring",
                self.store.trim_lowest_scoring(key, 0, excess as i64 - 1),
            )
            .await?;
            info!(removed, capacity, "Trimmed durable mirror to capacity");
        }
        Ok(total)
    }

    /// In-memory membership test. Never touches the mirror.
    pub fn has(&self, identifier: &str) -> bool {
        self.members.contains(identifier)
    }

    /// Adds `identifier`; a no-op for existing members.
    ///
    /// The in-memory set is updated before any mirror write is attempted. Mirror
    /// failures are logged and returned, but never roll back membership.
    pub async fn add(&mut self, identifier: &Identifier) -> Result<(), CacheError> {
        let Some(batch) = self.record(identifier) else {
            return Ok(());
        };

        let batch = match &self.write_behind {
            Some(writer) => match writer.submit(batch) {
                Ok(()) => return Ok(()),
                Err(batch) => {
                    warn!("Mirror writer stopped; writing mirror inline");
                    batch
                }
            },
            None => batch,
        };

        if let Err(e) = batch.apply(self.store.as_ref(), self.config.store_timeout).await {
            self.inline_failures += 1;
            return Err(e.into());
        }
        Ok(())
    }

    /// Applies the in-memory side of an add and returns the mirror writes it
    /// owes, or `None` when `identifier` is already a member.
    pub(crate) fn record(&mut self, identifier: &Identifier) -> Option<MirrorBatch> {
        if self.members.contains(identifier.as_str()) {
            return None;
        }

        self.order.push_back(identifier.clone());
        self.members.insert(identifier.clone());
        self.additions += 1;

        let mut writes = vec![MirrorWrite::Upsert {
            member: identifier.clone(),
            score: self.clock.now_millis() as f64,
        }];

        if self.order.len() > self.config.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                self.evictions += 1;
                debug!(pubkey = %oldest, "Evicted oldest cache member");
                writes.push(MirrorWrite::Remove { member: oldest });
            }
        }

        Some(MirrorBatch {
            key: self.config.mirror_key.clone(),
            writes,
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Members, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.order.iter()
    }

    pub fn stats(&self) -> CacheStats {
        let background_failures = self
            .write_behind
            .as_ref()
            .map(MirrorWriterHandle::failed_batches)
            .unwrap_or(0);
        CacheStats {
            members: self.order.len(),
            capacity: self.config.capacity,
            additions: self.additions,
            evictions: self.evictions,
            mirror_failures: self.inline_failures + background_failures,
        }
    }
}
