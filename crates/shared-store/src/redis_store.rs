//! Redis adapter for both durable store ports.
//!
//! Uses one multiplexed async connection; every call clones the handle, so the
//! adapter is shared freely behind an `Arc`.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use shared_types::Identifier;
use tracing::info;

use crate::ports::{SortedSetStore, StoreError, StreamAppender};

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        if e.is_timeout()
            || e.is_io_error()
            || e.is_connection_dropped()
            || e.is_connection_refusal()
        {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::UnexpectedReply(e.to_string())
        }
    }
}

/// Production store backed by Redis sorted sets and streams.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Opens a multiplexed connection to `url`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {e}")))?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!(redis_url = %redact(url), "Connected to durable store");
        Ok(Self { connection })
    }
}

/// Strips credentials from a connection URL for logging.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl SortedSetStore for RedisStore {
    async fn range_by_score_desc(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Identifier>, StoreError> {
        let mut con = self.connection.clone();
        let members: Vec<String> = con.zrevrange(key, start as isize, stop as isize).await?;
        Ok(members.into_iter().map(Identifier::from).collect())
    }

    async fn cardinality(&self, key: &str) -> Result<u64, StoreError> {
        let mut con = self.connection.clone();
        let count: u64 = con.zcard(key).await?;
        Ok(count)
    }

    async fn trim_lowest_scoring(
        &self,
        key: &str,
        from_rank: i64,
        to_rank: i64,
    ) -> Result<u64, StoreError> {
        let mut con = self.connection.clone();
        let removed: u64 = con
            .zremrangebyrank(key, from_rank as isize, to_rank as isize)
            .await?;
        Ok(removed)
    }

    async fn upsert_with_score(
        &self,
        key: &str,
        score: f64,
        member: &Identifier,
    ) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con.zadd(key, member.as_str(), score).await?;
        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &Identifier) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con.zrem(key, member.as_str()).await?;
        Ok(())
    }
}

#[async_trait]
impl StreamAppender for RedisStore {
    async fn append(&self, stream: &str, fields: &[(String, String)]) -> Result<String, StoreError> {
        let mut con = self.connection.clone();
        let id: String = con.xadd(stream, "*", fields).await?;
        Ok(id)
    }
}
