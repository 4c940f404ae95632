use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};
use spool_types::ChunkDigest;

/// Incremental rolling checksum over a byte stream.
///
/// `peek` is idempotent with respect to continued accumulation: it finalizes
/// a clone of the internal state, so the same accumulator can keep being fed
/// afterwards. This is what lets one physical read update both a chunk
/// digest and the whole-stream digest.
#[derive(Clone)]
pub struct DigestAccumulator {
    inner: Md5,
    bytes_fed: u64,
}

impl DigestAccumulator {
    /// Fresh accumulator (digest of zero bytes until fed).
    pub fn new() -> Self {
        Self {
            inner: Md5::new(),
            bytes_fed: 0,
        }
    }

    /// Feed a block of bytes.
    pub fn update(&mut self, block: &[u8]) {
        self.inner.update(block);
        self.bytes_fed += block.len() as u64;
    }

    /// Current digest over everything fed so far. Does not consume or
    /// disturb the accumulator.
    pub fn peek(&self) -> ChunkDigest {
        let raw: [u8; 16] = self.inner.clone().finalize().into();
        ChunkDigest::from_raw(raw)
    }

    /// Total bytes fed so far.
    pub fn bytes_fed(&self) -> u64 {
        self.bytes_fed
    }
}

impl Default for DigestAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Digest a whole file by streaming it through an accumulator.
pub fn digest_file(path: &Path) -> io::Result<ChunkDigest> {
    let mut file = File::open(path)?;
    let mut acc = DigestAccumulator::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        acc.update(&buf[..n]);
    }
    Ok(acc.peek())
}
