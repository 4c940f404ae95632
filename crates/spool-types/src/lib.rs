//! Foundation types for spool.
//!
//! This crate provides the identifiers, lifecycle records, and session
//! configuration used throughout the spool pipeline. Every other spool crate
//! depends on `spool-types`.
//!
//! # Key Types
//!
//! - [`ChunkDigest`]: 16-byte MD5 content digest of a chunk or stream
//! - [`chunk_name`] / [`chunk_index`]: fixed-width, lexicographically
//!   monotonic base-26 chunk naming
//! - [`SealedChunk`] / [`ChunkState`]: per-chunk record and lifecycle
//! - [`SessionConfig`]: one transfer session's configuration

pub mod chunk;
pub mod config;
pub mod digest;
pub mod error;
pub mod naming;

pub use chunk::{ChunkState, SealedChunk};
pub use config::SessionConfig;
pub use digest::ChunkDigest;
pub use error::TypeError;
pub use naming::{
    chunk_index, chunk_name, parity_name, NamingError, CHUNK_PATTERN, CHUNK_PREFIX,
    DEFAULT_NAME_WIDTH, MANIFEST_NAME, PARITY_SUFFIX, TOTAL_KEY,
};
