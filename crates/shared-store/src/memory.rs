//! In-memory durable store for tests.
//!
//! Implements both ports with sorted-set and stream semantics matching the
//! production store, plus failure injection: each port can be switched to
//! `Unavailable`, and an artificial latency can be added to every call to
//! exercise timeouts.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Identifier;

use crate::ports::{SortedSetStore, StoreError, StreamAppender};

/// One appended stream entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Inner {
    sorted_sets: HashMap<String, HashMap<Identifier, f64>>,
    streams: HashMap<String, Vec<StreamEntry>>,
    next_stream_seq: u64,
}

impl Inner {
    /// Members of `key` ascending by (score, member).
    fn ascending(&self, key: &str) -> Vec<(Identifier, f64)> {
        let mut members: Vec<_> = self
            .sorted_sets
            .get(key)
            .map(|set| set.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        members.sort_by(|a, b| match a.1.total_cmp(&b.1) {
            CmpOrdering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        members
    }
}

/// Resolves an inclusive rank range against `len` members.
///
/// Returns `None` when the range selects nothing.
fn resolve_ranks(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// In-memory implementation of [`SortedSetStore`] and [`StreamAppender`].
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    sorted_set_down: AtomicBool,
    stream_down: AtomicBool,
    trim_down: AtomicBool,
    latency_ms: AtomicU64,
    sorted_set_writes: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every sorted-set call fail with `Unavailable`.
    pub fn set_sorted_set_available(&self, available: bool) {
        self.sorted_set_down.store(!available, Ordering::SeqCst);
    }

    /// Makes every stream append fail with `Unavailable`.
    pub fn set_stream_available(&self, available: bool) {
        self.stream_down.store(!available, Ordering::SeqCst);
    }

    /// Makes only `trim_lowest_scoring` fail, leaving reads and writes up.
    pub fn set_trim_available(&self, available: bool) {
        self.trim_down.store(!available, Ordering::SeqCst);
    }

    /// Delays every call by `latency` before it is served.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Inserts a member directly, bypassing failure injection.
    pub fn seed(&self, key: &str, member: impl Into<Identifier>, score: f64) {
        self.inner
            .lock()
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.into(), score);
    }

    /// Members of `key`, oldest (lowest score) first.
    pub fn members(&self, key: &str) -> Vec<Identifier> {
        self.inner
            .lock()
            .ascending(key)
            .into_iter()
            .map(|(member, _)| member)
            .collect()
    }

    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        self.inner
            .lock()
            .sorted_sets
            .get(key)
            .and_then(|set| set.get(member).copied())
    }

    pub fn stream_entries(&self, stream: &str) -> Vec<StreamEntry> {
        self.inner
            .lock()
            .streams
            .get(stream)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stream_len(&self, stream: &str) -> usize {
        self.inner
            .lock()
            .streams
            .get(stream)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Successful upserts and removals served so far.
    pub fn sorted_set_writes(&self) -> u64 {
        self.sorted_set_writes.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    async fn sorted_set_gate(&self) -> Result<(), StoreError> {
        self.simulate_latency().await;
        if self.sorted_set_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("sorted set offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SortedSetStore for InMemoryStore {
    async fn range_by_score_desc(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Identifier>, StoreError> {
        self.sorted_set_gate().await?;
        let mut members = self.inner.lock().ascending(key);
        members.reverse();
        Ok(match resolve_ranks(members.len(), start, stop) {
            Some((from, to)) => members[from..=to].iter().map(|(m, _)| m.clone()).collect(),
            None => Vec::new(),
        })
    }

    async fn cardinality(&self, key: &str) -> Result<u64, StoreError> {
        self.sorted_set_gate().await?;
        Ok(self
            .inner
            .lock()
            .sorted_sets
            .get(key)
            .map(|set| set.len() as u64)
            .unwrap_or(0))
    }

    async fn trim_lowest_scoring(
        &self,
        key: &str,
        from_rank: i64,
        to_rank: i64,
    ) -> Result<u64, StoreError> {
        self.sorted_set_gate().await?;
        if self.trim_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("trim refused".to_string()));
        }
        let mut inner = self.inner.lock();
        let members = inner.ascending(key);
        let Some((from, to)) = resolve_ranks(members.len(), from_rank, to_rank) else {
            return Ok(0);
        };
        let set = inner.sorted_sets.entry(key.to_string()).or_default();
        for (member, _) in &members[from..=to] {
            set.remove(member);
        }
        Ok((to - from + 1) as u64)
    }

    async fn upsert_with_score(
        &self,
        key: &str,
        score: f64,
        member: &Identifier,
    ) -> Result<(), StoreError> {
        self.sorted_set_gate().await?;
        self.inner
            .lock()
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.clone(), score);
        self.sorted_set_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &Identifier) -> Result<(), StoreError> {
        self.sorted_set_gate().await?;
        if let Some(set) = self.inner.lock().sorted_sets.get_mut(key) {
            set.remove(member.as_str());
        }
        self.sorted_set_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl StreamAppender for InMemoryStore {
    async fn append(&self, stream: &str, fields: &[(String, String)]) -> Result<String, StoreError> {
        self.simulate_latency().await;
        if self.stream_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("stream offline".to_string()));
        }
        let mut inner = self.inner.lock();
        inner.next_stream_seq += 1;
        let id = format!("{}-0", inner.next_stream_seq);
        inner
            .streams
            .entry(stream.to_string())
            .or_default()
            .push(StreamEntry {
                id: id.clone(),
                fields: fields.to_vec(),
            });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "zset";

    fn seeded(n: u32) -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 0..n {
            store.seed(KEY, format!("m{i}"), f64::from(i));
        }
        store
    }

    fn ids(values: &[&str]) -> Vec<Identifier> {
        values.iter().map(|v| Identifier::new(*v)).collect()
    }

    #[test]
    fn test_resolve_ranks() {
        assert_eq!(resolve_ranks(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve_ranks(5, 3, -1), Some((3, 4)));
        assert_eq!(resolve_ranks(5, 0, 10), Some((0, 4)));
        assert_eq!(resolve_ranks(5, 5, -1), None);
        assert_eq!(resolve_ranks(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve_ranks(0, 0, -1), None);
        assert_eq!(resolve_ranks(5, 3, 1), None);
    }

    #[tokio::test]
    async fn test_range_desc_returns_newest_first() {
        let store = seeded(5);
        let newest = store.range_by_score_desc(KEY, 0, 2).await.unwrap();
        assert_eq!(newest, ids(&["m4", "m3", "m2"]));
    }

    #[tokio::test]
    async fn test_trim_removes_lowest_scores() {
        let store = seeded(5);
        let removed = store.trim_lowest_scoring(KEY, 0, 1).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.members(KEY), ids(&["m2", "m3", "m4"]));
        assert_eq!(store.cardinality(KEY).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_upsert_moves_existing_member() {
        let store = seeded(3);
        store
            .upsert_with_score(KEY, 10.0, &Identifier::new("m0"))
            .await
            .unwrap();

        assert_eq!(store.members(KEY), ids(&["m1", "m2", "m0"]));
        assert_eq!(store.cardinality(KEY).await.unwrap(), 3);
        assert_eq!(store.sorted_set_writes(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_member_is_ok() {
        let store = seeded(1);
        store.remove_member(KEY, &Identifier::new("nope")).await.unwrap();
        store.remove_member("missing", &Identifier::new("m0")).await.unwrap();
        assert_eq!(store.members(KEY), ids(&["m0"]));
    }

    #[tokio::test]
    async fn test_failure_injection_is_per_port() {
        let store = seeded(1);
        store.set_sorted_set_available(false);

        let err = store.cardinality(KEY).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let fields = vec![("pubkey".to_string(), "abc".to_string())];
        let id = store.append("stream", &fields).await.unwrap();
        assert_eq!(id, "1-0");

        store.set_stream_available(false);
        assert!(store.append("stream", &fields).await.is_err());
        assert_eq!(store.stream_len("stream"), 1);
    }

    #[tokio::test]
    async fn test_stream_entries_keep_field_order() {
        let store = InMemoryStore::new();
        let fields = vec![
            ("pubkey".to_string(), "abc".to_string()),
            ("kind".to_string(), "62".to_string()),
        ];
        store.append("s", &fields).await.unwrap();
        store.append("s", &fields).await.unwrap();

        let entries = store.stream_entries("s");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, "2-0");
        assert_eq!(entries[0].fields, fields);
        assert_eq!(entries[0].field("kind"), Some("62"));
    }
}
