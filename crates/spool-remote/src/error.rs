use thiserror::Error;

/// Errors from object-store and parity-engine collaborators.
///
/// Transient transport failures are retried inside the implementations
/// (e.g. `rclone --retries`); anything surfacing here is terminal for the
/// operation that caused it.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The named remote object does not exist.
    #[error("remote object not found: {name}")]
    NotFound { name: String },

    /// An external helper process failed or could not be spawned.
    #[error("{command} failed: {detail}")]
    Process { command: String, detail: String },

    /// A remote checksum listing carried a token that is not a digest.
    #[error("unparsable remote checksum for {name}: {token}")]
    BadChecksum { name: String, token: String },

    /// The configured parity engine cannot create or use parity data.
    #[error("parity is not supported by this engine")]
    ParityUnsupported,

    /// I/O error from local scratch files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for collaborator operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
