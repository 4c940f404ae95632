use spool_manifest::ManifestError;
use spool_remote::RemoteError;
use spool_types::NamingError;
use thiserror::Error;

/// Errors that abort a send session.
///
/// Any of these means no manifest is published: a partial manifest would
/// later falsely validate an incomplete transfer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A chunk upload exhausted the store's retries. Terminal for the
    /// whole session.
    #[error("upload of {name} failed: {source}")]
    Transmission {
        name: String,
        #[source]
        source: RemoteError,
    },

    /// An upload task panicked or was cancelled out from under us.
    #[error("upload task for {name} did not complete: {detail}")]
    UploadTask { name: String, detail: String },

    /// Chunk index exceeded the configured name width.
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// Container creation or parity generation failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Manifest serialization failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Local scratch I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
