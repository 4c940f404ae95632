//! Incremental content digests for spool.
//!
//! The send path feeds every block it reads into two accumulators at once
//! (the current chunk's and the whole stream's); the replay path does the
//! same with a fresh per-chunk accumulator. [`DigestAccumulator`] supports
//! querying the digest at any point without disturbing further feeding.

pub mod accumulator;

pub use accumulator::{digest_file, DigestAccumulator};
