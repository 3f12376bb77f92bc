//! # Shared Types Crate
//!
//! Domain entities and host protocol messages shared by every crate in the
//! workspace.
//!
//! ## Contents
//!
//! - **Entities**: `Identifier`, `Tag`, `RelayEvent`
//! - **Protocol**: `PolicyRequest`, `PolicyReply`, `Action`, line parsing
//! - **Vanish**: `VanishRequestRecord`, `VanishTarget`, stream field encoding
//! - **Time**: `TimeSource` abstraction with system and manual clocks
//!
//! ## Design Principles
//!
//! - **Fixed-shape records**: events and tags are typed records, not open maps,
//!   so tag matching is precise and testable.
//! - **Reply id echo**: every `PolicyReply` is built from the inbound event id and
//!   nothing else.

pub mod entities;
pub mod errors;
pub mod protocol;
pub mod time;
pub mod vanish;

pub use entities::*;
pub use errors::*;
pub use protocol::*;
pub use time::*;
pub use vanish::*;
