use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info};

use spool_manifest::{Manifest, ManifestEntry};
use spool_remote::{ObjectStore, ParityEngine};
use spool_types::{chunk_name, ChunkDigest, SealedChunk, SessionConfig, MANIFEST_NAME};

use crate::chunker::Chunker;
use crate::error::{PipelineError, PipelineResult};
use crate::scheduler::UploadScheduler;

/// Outcome of a completed send.
#[derive(Clone, Debug)]
pub struct SendReport {
    pub chunks: usize,
    pub bytes: u64,
    pub total_digest: ChunkDigest,
}

/// Send a whole input stream to the destination as chunks, then publish
/// the manifest.
///
/// The manifest is written exactly once, after every chunk transmission has
/// been confirmed. A fatal error anywhere in the pipeline aborts the
/// session with no manifest published and the scratch directory cleaned.
pub async fn send_stream<R: Read>(
    input: R,
    store: Arc<dyn ObjectStore>,
    parity_engine: Option<Arc<dyn ParityEngine>>,
    config: &SessionConfig,
) -> PipelineResult<SendReport> {
    store.make_container().await?;

    let mut chunker = Chunker::new(input, config.chunk_size, config.block_size);
    let mut scheduler = UploadScheduler::new(Arc::clone(&store), config.window);

    let result = run_send(&mut chunker, &mut scheduler, &store, &parity_engine, config).await;
    if result.is_err() {
        scheduler.abort();
    }
    result
}

async fn run_send<R: Read>(
    chunker: &mut Chunker<R>,
    scheduler: &mut UploadScheduler,
    store: &Arc<dyn ObjectStore>,
    parity_engine: &Option<Arc<dyn ParityEngine>>,
    config: &SessionConfig,
) -> PipelineResult<SendReport> {
    let mut index = 0u64;
    loop {
        let name = chunk_name(index, config.name_width)?;
        // Sliding-window backpressure: the window predecessor must retire
        // before another chunk file may occupy the scratch directory.
        scheduler.make_room(index).await?;

        let path = config.scratch_dir.join(&name);
        let (len, digest) = chunker.seal_chunk(&path)?;
        if len == 0 {
            // Zero-length trailing chunk: discard, never seal or upload.
            tokio::fs::remove_file(&path).await?;
            break;
        }

        let parity = match parity_engine {
            Some(engine) if config.create_parity => Some(engine.create_parity(&path).await?),
            _ => None,
        };

        info!(
            chunk = %name,
            bytes_so_far = chunker.bytes_read(),
            "sending chunk"
        );
        scheduler.launch(
            SealedChunk {
                index,
                name,
                len,
                digest,
                path,
            },
            parity,
        );

        if index == 0 {
            // The first upload creates the destination prefix; concurrent
            // transmissions may not target it until that has happened.
            scheduler.retire(0).await?;
        }
        index += 1;
    }

    scheduler.drain().await?;
    debug!(
        chunks = scheduler.len(),
        peak_files = scheduler.peak_resident_files(),
        "all chunks retired"
    );

    let entries = scheduler
        .chunks()
        .map(|c| ManifestEntry {
            name: c.name.clone(),
            digest: c.digest,
        })
        .collect();
    let manifest = Manifest::build(entries, chunker.stream_digest());

    let manifest_path = config.scratch_dir.join(MANIFEST_NAME);
    manifest.write_to_file(&manifest_path)?;
    let published = store.put(&manifest_path, MANIFEST_NAME).await;
    tokio::fs::remove_file(&manifest_path).await?;
    published.map_err(|source| PipelineError::Transmission {
        name: MANIFEST_NAME.to_string(),
        source,
    })?;

    info!(
        bytes = chunker.bytes_read(),
        total = %manifest.total(),
        "send complete, manifest deposited"
    );
    Ok(SendReport {
        chunks: scheduler.len(),
        bytes: chunker.bytes_read(),
        total_digest: manifest.total(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::Path;

    use async_trait::async_trait;
    use bytes::Bytes;
    use spool_remote::{LocalDirStore, RemoteError, RemoteResult};
    use spool_types::ChunkDigest;

    use super::*;

    fn config(scratch: &Path, dest: &Path) -> SessionConfig {
        SessionConfig {
            destination: dest.to_string_lossy().into_owned(),
            scratch_dir: scratch.to_path_buf(),
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn concrete_scenario_three_chunks() {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalDirStore::new(remote.path()));

        let data = vec![0x42u8; 10_000_000];
        let cfg = SessionConfig {
            chunk_size: 4_000_000,
            block_size: 65_536,
            window: 2,
            ..config(scratch.path(), remote.path())
        };
        let report = send_stream(Cursor::new(data.clone()), store.clone(), None, &cfg)
            .await
            .unwrap();

        assert_eq!(report.chunks, 3);
        assert_eq!(report.bytes, 10_000_000);

        // Chunk sizes 4M / 4M / 2M under their monotonic names.
        let names = store.list("sp-*").await.unwrap();
        assert_eq!(names, vec!["sp-aaaaaa", "sp-aaaaab", "sp-aaaaac"]);
        assert_eq!(store.get("sp-aaaaac").await.unwrap().len(), 2_000_000);

        // Manifest: three chunk lines plus TOTAL.
        let manifest = Manifest::parse(&store.get(MANIFEST_NAME).await.unwrap()).unwrap();
        assert_eq!(manifest.len(), 3);

        let mut acc = spool_digest::DigestAccumulator::new();
        acc.update(&data);
        assert_eq!(manifest.total(), acc.peek());

        // Scratch directory is empty once the send finished.
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_stream_publishes_total_only_manifest() {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalDirStore::new(remote.path()));

        let cfg = config(scratch.path(), remote.path());
        let report = send_stream(Cursor::new(Vec::new()), store.clone(), None, &cfg)
            .await
            .unwrap();

        assert_eq!(report.chunks, 0);
        assert_eq!(report.bytes, 0);
        assert_eq!(
            report.total_digest.to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );

        let manifest = Manifest::parse(&store.get(MANIFEST_NAME).await.unwrap()).unwrap();
        assert!(manifest.is_empty());
        assert!(store.list("sp-*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scratch_never_exceeds_window_plus_one() {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalDirStore::new(remote.path()));

        let cfg = SessionConfig {
            chunk_size: 1_000,
            block_size: 128,
            window: 2,
            ..config(scratch.path(), remote.path())
        };
        let store: Arc<dyn ObjectStore> = store;
        let mut chunker = Chunker::new(
            Cursor::new(vec![1u8; 25_000]),
            cfg.chunk_size,
            cfg.block_size,
        );
        let mut scheduler = UploadScheduler::new(Arc::clone(&store), cfg.window);
        run_send(&mut chunker, &mut scheduler, &store, &None, &cfg)
            .await
            .unwrap();

        assert_eq!(scheduler.len(), 25);
        assert!(
            scheduler.peak_resident_files() <= cfg.window + 1,
            "peak {} exceeds window+1",
            scheduler.peak_resident_files()
        );
    }

    /// Store that fails every put of one specific object name.
    struct FailingStore {
        inner: LocalDirStore,
        poison: String,
    }

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn put(&self, local: &Path, remote_name: &str) -> RemoteResult<()> {
            if remote_name == self.poison {
                return Err(RemoteError::Process {
                    command: "put".into(),
                    detail: "injected failure".into(),
                });
            }
            self.inner.put(local, remote_name).await
        }
        async fn get(&self, remote_name: &str) -> RemoteResult<Bytes> {
            self.inner.get(remote_name).await
        }
        async fn list(&self, pattern: &str) -> RemoteResult<Vec<String>> {
            self.inner.list(pattern).await
        }
        async fn remote_checksums(
            &self,
            pattern: &str,
        ) -> RemoteResult<HashMap<String, ChunkDigest>> {
            self.inner.remote_checksums(pattern).await
        }
        async fn make_container(&self) -> RemoteResult<()> {
            self.inner.make_container().await
        }
    }

    #[tokio::test]
    async fn upload_failure_aborts_without_manifest() {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store = Arc::new(FailingStore {
            inner: LocalDirStore::new(remote.path()),
            poison: "sp-aaaaac".into(),
        });

        let cfg = SessionConfig {
            chunk_size: 1_000,
            block_size: 128,
            window: 2,
            ..config(scratch.path(), remote.path())
        };
        let err = send_stream(Cursor::new(vec![2u8; 5_000]), store, None, &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Transmission { ref name, .. } if name == "sp-aaaaac"));

        // No manifest was published and the scratch dir was cleaned.
        assert!(!remote.path().join(MANIFEST_NAME).exists());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn naming_overflow_is_fatal() {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalDirStore::new(remote.path()));

        // Width 1 allows only 26 chunks; 27 one-byte chunks overflow it.
        let cfg = SessionConfig {
            chunk_size: 1,
            block_size: 16,
            name_width: 1,
            ..config(scratch.path(), remote.path())
        };
        let err = send_stream(Cursor::new(vec![0u8; 27]), store, None, &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Naming(_)));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
