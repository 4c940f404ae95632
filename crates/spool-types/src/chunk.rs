use std::path::PathBuf;

use crate::digest::ChunkDigest;

/// Lifecycle of a chunk within one send session.
///
/// A chunk is `Sealing` while the producer is still writing its local file,
/// `Sealed` once its target byte count is reached (digest fixed, never
/// recomputed after this point), `Uploading` while its transmission task is
/// in flight, and `Retired` once the upload completed and the local copy
/// was deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Sealing,
    Sealed,
    Uploading,
    Retired,
}

/// A fully written chunk, ready for transmission.
///
/// The digest is fixed at seal time; the scheduler keys all completion
/// accounting on `index`/`name`, never on upload completion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedChunk {
    /// Monotonic sequence index, starting at 0.
    pub index: u64,
    /// Stable name derived from `index`.
    pub name: String,
    /// Byte length; less than the chunk size only for the final chunk.
    pub len: u64,
    /// Content digest, finalized when the chunk was sealed.
    pub digest: ChunkDigest,
    /// Local scratch file holding the chunk until it retires.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_chunk_construction() {
        let chunk = SealedChunk {
            index: 3,
            name: "sp-aaaaad".into(),
            len: 1024,
            digest: ChunkDigest::from_raw([0; 16]),
            path: PathBuf::from("/tmp/sp-aaaaad"),
        };
        assert_eq!(chunk.index, 3);
        assert_eq!(chunk.name, "sp-aaaaad");
    }

    #[test]
    fn state_transitions_are_distinct() {
        assert_ne!(ChunkState::Sealing, ChunkState::Sealed);
        assert_ne!(ChunkState::Uploading, ChunkState::Retired);
    }
}
