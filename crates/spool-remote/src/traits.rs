use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use spool_types::ChunkDigest;

use crate::error::RemoteResult;

/// Client capability for one remote destination.
///
/// The destination is fixed at construction; all names are relative to it.
/// Implementations must satisfy these invariants:
/// - Transient transport failures are retried internally; a returned error
///   is terminal for that operation.
/// - `put` replaces any existing object of the same name.
/// - `list` and `remote_checksums` are scoped to the given glob pattern and
///   reflect the remote's current state, never a cached one.
/// - Object contents are opaque; the store never interprets them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under the given remote name.
    async fn put(&self, local: &Path, remote_name: &str) -> RemoteResult<()>;

    /// Fetch a remote object's bytes.
    async fn get(&self, remote_name: &str) -> RemoteResult<Bytes>;

    /// List remote object names matching a glob pattern.
    async fn list(&self, pattern: &str) -> RemoteResult<Vec<String>>;

    /// The store's own reported digest per object matching the pattern.
    async fn remote_checksums(
        &self,
        pattern: &str,
    ) -> RemoteResult<HashMap<String, ChunkDigest>>;

    /// Create the destination container/prefix if it does not exist.
    async fn make_container(&self) -> RemoteResult<()>;
}

/// Erasure-coding capability for per-chunk parity artifacts.
///
/// Only the repair coordinator may invoke `repair`; only the send path may
/// invoke `create_parity`.
#[async_trait]
pub trait ParityEngine: Send + Sync {
    /// Create a parity artifact for a sealed chunk file. Returns the local
    /// path of the single artifact to upload alongside the chunk.
    async fn create_parity(&self, chunk: &Path) -> RemoteResult<PathBuf>;

    /// Repair a corrupted local chunk file in place using a parity
    /// artifact. `Ok(false)` means the corruption exceeds the parity's
    /// repair capacity or the parity itself is invalid.
    async fn repair(&self, parity: &Path, corrupted: &Path) -> RemoteResult<bool>;
}
