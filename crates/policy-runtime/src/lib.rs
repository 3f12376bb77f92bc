//! # Vanish-Gate Policy Runtime
//!
//! The write-policy process a relay host spawns. The host writes one JSON
//! request per line to stdin and blocks until the matching reply arrives on
//! stdout; logs go to stderr.
//!
//! ## Modular Structure
//!
//! - `config` - environment configuration
//! - `policies` - the policy trait, pipeline, vanish and allow-list policies
//! - `protocol` - the read-decide-write loop
//! - `runtime` - startup wiring and shutdown drain
//!
//! ## Decision Flow
//!
//! ```text
//! request ──→ VanishPolicy ──accept──→ AllowListPolicy ──accept──→ accept
//!                 │                          │
//!                 └── shadowReject           └── reject "blocked: not authorized"
//! ```

pub mod config;
pub mod policies;
pub mod protocol;
pub mod runtime;

pub use config::{ConfigError, PolicyConfig};
pub use policies::{AllowList, AllowListPolicy, Pipeline, Policy, VanishPolicy};
pub use protocol::{serve, LoopReport, MALFORMED_REQUEST};
pub use runtime::{Runtime, StartupError};
