//! # VG-01 Membership Cache
//!
//! Bounded set of sender identifiers with insertion-order (FIFO) eviction,
//! mirrored to a durable sorted set so membership survives restarts.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): in-memory set and order, mirror write batches,
//!   configuration
//! - **Adapters Layer** (`adapters/`): background writer applying mirror
//!   batches off the decision path
//! - The durable mirror is the injected `SortedSetStore` port from `shared-store`
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: `members` and `order` hold exactly the same identifiers
//! - **INVARIANT-2**: `len() <= capacity` after every completed `add`
//! - **INVARIANT-3**: eviction removes the earliest inserted member; lookups never
//!   refresh an entry
//! - **INVARIANT-4**: in-memory mutation is applied even when mirror writes fail
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──initialize()──→ serving: has() / add() ──→ process exit
//!            │
//!            └── loads newest `capacity` mirror entries, trims the excess
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! let store = Arc::new(InMemoryStore::new());
//! let mut cache = MembershipCache::new(store, CacheConfig::default())?;
//! cache.initialize().await?;
//!
//! cache.add(&Identifier::new("abc")).await?;
//! assert!(cache.has("abc"));
//! ```

pub mod adapters;
pub mod domain;
pub mod error;

pub use adapters::{MirrorWriter, MirrorWriterHandle, WriterReport};
pub use domain::{CacheConfig, CacheStats, MembershipCache, MirrorBatch, MirrorWrite};
pub use error::CacheError;
