//! Adapters layer.

pub mod mirror_writer;

pub use mirror_writer::{MirrorWriter, MirrorWriterHandle, WriterReport};
