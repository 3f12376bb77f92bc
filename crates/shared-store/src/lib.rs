//! # Shared Store - Durable Store Ports and Adapters
//!
//! The policy touches durable state in exactly two ways:
//!
//! - a **sorted-set mirror** of cache membership, scored by insertion time, used
//!   to rebuild the membership cache after a restart;
//! - an **append-only stream** of vanish request records for downstream
//!   deletion workers.
//!
//! ```text
//! ┌────────────────────┐   SortedSetStore   ┌────────────────────┐
//! │ Membership Cache   │ ─────────────────→ │                    │
//! └────────────────────┘                    │  RedisStore /      │
//! ┌────────────────────┐   StreamAppender   │  InMemoryStore     │
//! │ Vanish Broadcaster │ ─────────────────→ │                    │
//! └────────────────────┘                    └────────────────────┘
//! ```
//!
//! Both ports are injected explicitly; nothing in the workspace reaches for a
//! global connection handle.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod memory;
pub mod ports;
pub mod redis_store;
pub mod timeout;

pub use memory::{InMemoryStore, StreamEntry};
pub use ports::{SortedSetStore, StoreError, StreamAppender};
pub use redis_store::RedisStore;
pub use timeout::bounded;

/// Sorted-set key holding the membership mirror.
pub const MEMBERSHIP_MIRROR_KEY: &str = "processed_pubkeys_zset";
