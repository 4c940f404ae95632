use thiserror::Error;

/// Errors from manifest serialization and parsing.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest bytes are not valid UTF-8.
    #[error("manifest is not valid UTF-8: {0}")]
    Encoding(String),

    /// No TOTAL line was found. A successful send always writes one, so a
    /// manifest without it is corrupt.
    #[error("manifest has no TOTAL entry")]
    MissingTotal,

    /// I/O error while writing the manifest scratch file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;
