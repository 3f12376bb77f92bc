//! # Error Types
//!
//! Errors raised while decoding host protocol lines.

use thiserror::Error;

/// A host line that could not be turned into a decision request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// The line is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// A required field is absent or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The envelope parsed but the event does not have the expected shape.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
