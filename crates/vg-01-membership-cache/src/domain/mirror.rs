//! Writes owed to the durable mirror after an in-memory mutation.
//!
//! An `add` that changes membership produces one batch: an upsert for the new
//! member and, when capacity was exceeded, a removal of the evicted one. Batches
//! are applied in submission order; every write in a batch is attempted even if
//! an earlier one failed.

use std::time::Duration;

use shared_store::{bounded, SortedSetStore, StoreError};
use shared_types::Identifier;
use tracing::warn;

/// A single mirror write.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorWrite {
    Upsert { member: Identifier, score: f64 },
    Remove { member: Identifier },
}

impl MirrorWrite {
    fn operation(&self) -> &'static str {
        match self {
            MirrorWrite::Upsert { .. } => "upsert_with_score",
            MirrorWrite::Remove { .. } => "remove_member",
        }
    }

    fn member(&self) -> &Identifier {
        match self {
            MirrorWrite::Upsert { member, .. } | MirrorWrite::Remove { member } => member,
        }
    }

    async fn apply<S>(&self, store: &S, key: &str, limit: Duration) -> Result<(), StoreError>
    where
        S: SortedSetStore + ?Sized,
    {
        match self {
            MirrorWrite::Upsert { member, score } => {
                bounded(limit, self.operation(), store.upsert_with_score(key, *score, member)).await
            }
            MirrorWrite::Remove { member } => {
                bounded(limit, self.operation(), store.remove_member(key, member)).await
            }
        }
    }
}

/// Ordered writes for one membership change.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorBatch {
    pub key: String,
    pub writes: Vec<MirrorWrite>,
}

impl MirrorBatch {
    /// Applies every write, logging each failure.
    ///
    /// Returns the first error encountered.
    pub async fn apply<S>(&self, store: &S, limit: Duration) -> Result<(), StoreError>
    where
        S: SortedSetStore + ?Sized,
    {
        let mut first_error = None;

        for write in &self.writes {
            if let Err(e) = write.apply(store, &self.key, limit).await {
                warn!(
                    operation = write.operation(),
                    pubkey = %write.member(),
                    error = %e,
                    "Durable mirror write failed; in-memory membership kept"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
