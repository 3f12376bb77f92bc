//! Outbound (Driven) ports for the durable store.
//!
//! Rank arguments follow the sorted-set convention: rank 0 is the lowest
//! score, negative ranks count back from the highest (`-1` is the last).

use async_trait::async_trait;
use shared_types::Identifier;
use thiserror::Error;

/// Durable store failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured bound.
    #[error("store operation '{operation}' timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    /// The store answered with something the adapter cannot interpret.
    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),
}

/// Sorted collection of identifiers scored by insertion time.
#[async_trait]
pub trait SortedSetStore: Send + Sync {
    /// Members between two ranks (inclusive), highest score first.
    async fn range_by_score_desc(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Identifier>, StoreError>;

    /// Number of members.
    async fn cardinality(&self, key: &str) -> Result<u64, StoreError>;

    /// Removes members between two ascending ranks (inclusive).
    ///
    /// Returns the number of members removed.
    async fn trim_lowest_scoring(
        &self,
        key: &str,
        from_rank: i64,
        to_rank: i64,
    ) -> Result<u64, StoreError>;

    /// Inserts `member`, or moves it to `score` if already present.
    async fn upsert_with_score(
        &self,
        key: &str,
        score: f64,
        member: &Identifier,
    ) -> Result<(), StoreError>;

    /// Removes `member`. Absent members are not an error.
    async fn remove_member(&self, key: &str, member: &Identifier) -> Result<(), StoreError>;
}

/// Append-only stream with store-assigned entry ids.
#[async_trait]
pub trait StreamAppender: Send + Sync {
    /// Appends one entry and returns its id.
    async fn append(&self, stream: &str, fields: &[(String, String)]) -> Result<String, StoreError>;
}
