use std::fmt;

use crate::error::TypeError;

/// Content digest of a chunk or of the whole stream.
///
/// A `ChunkDigest` is the MD5 of the content. MD5 is deliberate: the threat
/// model is transport corruption and bitrot, not an adversary, and the value
/// must be directly comparable with what remote stores report for their
/// objects. Identical content always produces the same digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkDigest([u8; 16]);

impl ChunkDigest {
    /// Create a digest from a pre-computed 16-byte MD5 value.
    pub const fn from_raw(raw: [u8; 16]) -> Self {
        Self(raw)
    }

    /// The raw 16-byte digest.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex representation, as written in the manifest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters) for diagnostics.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 16 {
            return Err(TypeError::InvalidLength {
                expected: 16,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }
}

impl fmt::Debug for ChunkDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkDigest({})", self.short_hex())
    }
}

impl fmt::Display for ChunkDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 16]> for ChunkDigest {
    fn from(raw: [u8; 16]) -> Self {
        Self(raw)
    }
}

impl std::str::FromStr for ChunkDigest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
