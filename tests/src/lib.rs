//! # Vanish-Gate Test Suite
//!
//! Cross-crate scenarios that no single crate can exercise alone.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── restart.rs       # membership survives process restarts via the mirror
//!     └── end_to_end.rs    # host lines in, decisions out, stream and mirror effects
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vg-tests
//! cargo test -p vg-tests integration::restart::
//! ```

pub mod fixtures;
pub mod integration;
