use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use spool_digest::DigestAccumulator;
use spool_types::ChunkDigest;

/// Reads the input stream into bounded-size chunk files.
///
/// A lazy, finite, non-restartable producer: each call to [`seal_chunk`]
/// reads block-size pieces until the chunk's target size is reached or the
/// input is exhausted. Every block read updates two digest states from the
/// one physical read, the chunk's own and the whole stream's. The chunk
/// file is flushed and fsynced before the call returns, so a sealed chunk
/// is durable on disk.
///
/// [`seal_chunk`]: Chunker::seal_chunk
pub struct Chunker<R> {
    input: R,
    chunk_size: u64,
    block_size: usize,
    stream_digest: DigestAccumulator,
}

impl<R: Read> Chunker<R> {
    pub fn new(input: R, chunk_size: u64, block_size: usize) -> Self {
        Self {
            input,
            chunk_size,
            block_size,
            stream_digest: DigestAccumulator::new(),
        }
    }

    /// Seal the next chunk into `path`.
    ///
    /// Returns the byte count actually written (less than the chunk size
    /// only for the final chunk) and the chunk's digest. A zero count
    /// signals end-of-stream with no further chunk to process; the caller
    /// discards the empty file.
    pub fn seal_chunk(&mut self, path: &Path) -> io::Result<(u64, ChunkDigest)> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(self.block_size, file);
        let mut chunk_digest = DigestAccumulator::new();
        let mut remaining = self.chunk_size;
        let mut buf = vec![0u8; self.block_size];

        while remaining > 0 {
            let want = remaining.min(self.block_size as u64) as usize;
            let n = match self.input.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            chunk_digest.update(&buf[..n]);
            self.stream_digest.update(&buf[..n]);
            writer.write_all(&buf[..n])?;
            remaining -= n as u64;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok((self.chunk_size - remaining, chunk_digest.peek()))
    }

    /// Whole-stream digest over everything read so far.
    pub fn stream_digest(&self) -> ChunkDigest {
        self.stream_digest.peek()
    }

    /// Total bytes read from the input so far.
    pub fn bytes_read(&self) -> u64 {
        self.stream_digest.bytes_fed()
    }
}
