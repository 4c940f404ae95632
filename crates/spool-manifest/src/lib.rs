//! The spool ledger: an ordered mapping from chunk name to content digest,
//! plus one synthetic `TOTAL` entry for the whole-stream digest.
//!
//! Wire format (`spool.md5`): UTF-8 text, one `<digest>  <name>` line per
//! chunk in send order, final line `<digest>  TOTAL`. Chunk names never
//! contain whitespace, so tokens split unambiguously. Parsing is lenient:
//! short or garbled lines are skipped silently (blank trailing lines are
//! common), and consumers look entries up by name, never by position.

pub mod error;

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use spool_types::{ChunkDigest, TOTAL_KEY};

pub use error::{ManifestError, ManifestResult};

/// One chunk line of the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub digest: ChunkDigest,
}

/// The per-stream checksum ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    chunks: Vec<ManifestEntry>,
    total: ChunkDigest,
}

impl Manifest {
    /// Build a manifest from chunk entries in send order plus the
    /// whole-stream digest.
    pub fn build(chunks: Vec<ManifestEntry>, total: ChunkDigest) -> Self {
        Self { chunks, total }
    }

    /// Chunk entries in the order they were written (send order).
    pub fn chunks(&self) -> &[ManifestEntry] {
        &self.chunks
    }

    /// Chunk entries sorted by name, the reconstruction order for replay.
    pub fn sorted_chunks(&self) -> Vec<&ManifestEntry> {
        let mut sorted: Vec<&ManifestEntry> = self.chunks.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }

    /// The whole-stream digest (the TOTAL entry).
    pub fn total(&self) -> ChunkDigest {
        self.total
    }

    /// Look up a chunk's recorded digest by name.
    pub fn digest_for(&self, name: &str) -> Option<ChunkDigest> {
        self.chunks
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.digest)
    }

    /// Number of chunk entries (excluding TOTAL).
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if the stream had no non-empty chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Serialize to the wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for entry in &self.chunks {
            // Two spaces between tokens, md5sum-style.
            let _ = writeln!(out, "{}  {}", entry.digest, entry.name);
        }
        let _ = writeln!(out, "{}  {}", self.total, TOTAL_KEY);
        out.into_bytes()
    }

    /// Write the manifest to a local scratch file, flushed and fsynced so
    /// the upload that follows reads durable bytes.
    pub fn write_to_file(&self, path: &Path) -> ManifestResult<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Parse manifest bytes back into a ledger.
    ///
    /// Lines that do not carry two whitespace-separated tokens, or whose
    /// digest token does not parse, are skipped silently. The TOTAL line may
    /// appear anywhere; its absence is an error.
    pub fn parse(bytes: &[u8]) -> ManifestResult<Self> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| ManifestError::Encoding(e.to_string()))?;

        let mut chunks = Vec::new();
        let mut total = None;

        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            let (Some(digest_token), Some(name)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            let Ok(digest) = ChunkDigest::from_hex(digest_token) else {
                debug!(line, "skipping unparsable manifest line");
                continue;
            };
            if name == TOTAL_KEY {
                total = Some(digest);
            } else {
                chunks.push(ManifestEntry {
                    name: name.to_string(),
                    digest,
                });
            }
        }

        let total = total.ok_or(ManifestError::MissingTotal)?;
        Ok(Self { chunks, total })
    }
}
