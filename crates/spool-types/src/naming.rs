//! Chunk naming: fixed-width, lexicographically monotonic identifiers.
//!
//! A chunk's name is `"sp-"` followed by the sequence index encoded in
//! fixed-width base-26 `[a-z]`, padded with `a`. Because every name has the
//! same width and the alphabet is ordered, lexicographic order of names
//! equals numeric order of indices, and replay reconstructs the stream purely
//! by sorting manifest keys, so this property is load-bearing.

use thiserror::Error;

/// Prefix shared by every chunk object name.
pub const CHUNK_PREFIX: &str = "sp-";

/// Glob pattern matching chunk objects on the remote.
pub const CHUNK_PATTERN: &str = "sp-*";

/// Reserved remote object name for the manifest.
pub const MANIFEST_NAME: &str = "spool.md5";

/// Reserved manifest key for the whole-stream digest.
pub const TOTAL_KEY: &str = "TOTAL";

/// Suffix of a chunk's parity artifact.
pub const PARITY_SUFFIX: &str = ".par2";

/// Default encoded-index width. Six base-26 digits cover ~308M chunks.
pub const DEFAULT_NAME_WIDTH: usize = 6;

/// Errors from chunk name encoding and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    /// The index does not fit in the configured width. Fatal: it signals a
    /// misconfigured chunk-size-to-stream-size ratio.
    #[error("chunk index {index} does not fit in name width {width}")]
    Overflow { index: u64, width: usize },
}

/// Encode a chunk sequence index as a fixed-width name.
///
/// `chunk_name(i, w) < chunk_name(j, w)` lexicographically whenever `i < j`,
/// for all indices representable in `w` base-26 digits.
pub fn chunk_name(index: u64, width: usize) -> Result<String, NamingError> {
    let mut digits = vec![b'a'; width];
    let mut n = index;
    let mut pos = width;

    while n > 0 {
        if pos == 0 {
            return Err(NamingError::Overflow { index, width });
        }
        pos -= 1;
        digits[pos] = b'a' + (n % 26) as u8;
        n /= 26;
    }

    let mut name = String::with_capacity(CHUNK_PREFIX.len() + width);
    name.push_str(CHUNK_PREFIX);
    // Digits are always in [a-z].
    name.push_str(std::str::from_utf8(&digits).expect("base-26 digits are ASCII"));
    Ok(name)
}

/// Decode a chunk name back to its sequence index.
///
/// Returns `None` if the name does not have the chunk prefix, the expected
/// width, or contains characters outside `[a-z]`.
pub fn chunk_index(name: &str, width: usize) -> Option<u64> {
    let encoded = name.strip_prefix(CHUNK_PREFIX)?;
    if encoded.len() != width {
        return None;
    }
    let mut index: u64 = 0;
    for byte in encoded.bytes() {
        if !byte.is_ascii_lowercase() {
            return None;
        }
        index = index * 26 + u64::from(byte - b'a');
    }
    Some(index)
}

/// Name of the parity artifact for a chunk.
pub fn parity_name(chunk: &str) -> String {
    format!("{chunk}{PARITY_SUFFIX}")
}
