//! Domain layer: pure membership logic plus the writes it owes the mirror.

pub mod cache;
pub mod config;
pub mod mirror;

pub use cache::{CacheStats, MembershipCache};
pub use config::CacheConfig;
pub use mirror::{MirrorBatch, MirrorWrite};
