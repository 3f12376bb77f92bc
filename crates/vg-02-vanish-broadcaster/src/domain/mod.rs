//! Domain layer: relay scope matching, configuration and the decision service.

pub mod config;
pub mod scope;
pub mod service;

pub use config::BroadcasterConfig;
pub use scope::RelayScope;
pub use service::{BroadcasterStats, Decision, VanishBroadcaster, VanishOutcome};
