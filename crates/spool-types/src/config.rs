use std::path::PathBuf;

use crate::naming::DEFAULT_NAME_WIDTH;

/// Configuration for one transfer session (send, replay, or check).
///
/// Passed explicitly to every component; no component reads ambient process
/// state. Lives for one process invocation and is never persisted.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Remote destination identifier (directory path or `remote:path`).
    pub destination: String,
    /// Target size of each chunk in bytes (default: 8 MiB).
    pub chunk_size: u64,
    /// Read/write block size in bytes (default: 64 KiB).
    pub block_size: usize,
    /// Maximum number of concurrently in-flight chunk uploads.
    pub window: usize,
    /// Directory for local chunk scratch files.
    pub scratch_dir: PathBuf,
    /// Encoded chunk-name width.
    pub name_width: usize,
    /// Skip the checksum pass (e.g. encrypted stores without checksums).
    pub skip_checksum: bool,
    /// Only verify integrity; move no data.
    pub verify_only: bool,
    /// Create and upload parity artifacts alongside chunks.
    pub create_parity: bool,
    /// Attempt parity repair when verification finds a mismatch.
    pub attempt_repair: bool,
}

impl SessionConfig {
    /// Config for the given destination with all defaults.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            chunk_size: 1 << 23, // 8 MiB
            block_size: 1 << 16, // 64 KiB
            window: 2,
            scratch_dir: std::env::temp_dir(),
            name_width: DEFAULT_NAME_WIDTH,
            skip_checksum: false,
            verify_only: false,
            create_parity: false,
            attempt_repair: false,
        }
    }
}
