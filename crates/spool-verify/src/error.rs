use spool_manifest::ManifestError;
use spool_remote::RemoteError;
use spool_types::ChunkDigest;
use thiserror::Error;

/// Typed verification and repair failures, distinguishable from a clean
/// pass. Every variant names the offending chunk.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The ledger references a remote object that no longer exists. No
    /// recovery path: parity only repairs corruption within a present
    /// object, it cannot reconstruct a fully absent one.
    #[error("chunk missing from remote: {name}")]
    MissingChunk { name: String },

    /// The remote's digest differs from the ledger's.
    #[error("checksum mismatch for {name}: ledger {recorded}, remote {actual}")]
    ChecksumMismatch {
        name: String,
        recorded: ChunkDigest,
        actual: ChunkDigest,
    },

    /// The chunk is corrupt and has no parity artifact. The operator must
    /// accept data loss or re-send.
    #[error("no parity available to repair {name}")]
    NoParityAvailable { name: String },

    /// A parity artifact exists, but the caller did not opt in to repair.
    #[error("{name} is repairable, but repair was not requested")]
    RepairNotRequested { name: String },

    /// The erasure-coding engine reported failure. No partial repair or
    /// fallback decoding is attempted.
    #[error("parity repair of {name} failed")]
    RepairFailed { name: String },

    /// The manifest object could not be parsed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A store operation failed terminally.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Local scratch I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;
