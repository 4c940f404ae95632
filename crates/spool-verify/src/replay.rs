use std::io::Write;

use tracing::{info, warn};

use spool_digest::DigestAccumulator;
use spool_manifest::Manifest;
use spool_remote::ObjectStore;
use spool_types::MANIFEST_NAME;

use crate::error::VerifyResult;

/// Outcome of a replay. Mismatches are reported here rather than raised:
/// a partially damaged stream is still worth more than no stream, so the
/// caller decides what a dirty replay is worth.
#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub chunks: usize,
    pub bytes: u64,
    pub mismatched_chunks: Vec<String>,
    pub total_matches: bool,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched_chunks.is_empty() && self.total_matches
    }
}

/// Fetch and parse the remote ledger without any integrity checking.
pub async fn fetch_manifest(store: &dyn ObjectStore) -> VerifyResult<Manifest> {
    Ok(Manifest::parse(&store.get(MANIFEST_NAME).await?)?)
}

/// Reassembles the original byte stream from its remote chunks.
pub struct ReplayEngine<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ReplayEngine<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Stream every ledger chunk, in name order, into `sink`.
    ///
    /// Each chunk is digested as it passes through and compared against its
    /// ledger entry, and the concatenation against TOTAL. Mismatches only
    /// warn; a missing chunk or store failure is still fatal, since there
    /// are no bytes to emit in its place.
    pub async fn replay<W: Write>(
        &self,
        manifest: &Manifest,
        sink: &mut W,
    ) -> VerifyResult<ReplayReport> {
        let mut total = DigestAccumulator::new();
        let mut bytes = 0u64;
        let mut mismatched = Vec::new();

        for entry in manifest.sorted_chunks() {
            let data = self.store.get(&entry.name).await?;

            let mut acc = DigestAccumulator::new();
            acc.update(&data);
            let actual = acc.peek();
            if actual != entry.digest {
                warn!(
                    chunk = %entry.name,
                    recorded = %entry.digest,
                    actual = %actual,
                    "replayed chunk does not match its ledger digest"
                );
                mismatched.push(entry.name.clone());
            }

            total.update(&data);
            sink.write_all(&data)?;
            bytes += data.len() as u64;
        }
        sink.flush()?;

        let total_matches = total.peek() == manifest.total();
        if !total_matches {
            warn!(
                recorded = %manifest.total(),
                actual = %total.peek(),
                "replayed stream does not match the TOTAL digest"
            );
        }
        info!(
            chunks = manifest.len(),
            bytes,
            clean = mismatched.is_empty() && total_matches,
            "replay finished"
        );

        Ok(ReplayReport {
            chunks: manifest.len(),
            bytes,
            mismatched_chunks: mismatched,
            total_matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use spool_pipeline::send_stream;
    use spool_remote::LocalDirStore;
    use spool_types::SessionConfig;

    use super::*;

    async fn sent_remote(data: &[u8], chunk_size: u64) -> (tempfile::TempDir, LocalDirStore) {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalDirStore::new(remote.path()));
        let cfg = SessionConfig {
            destination: remote.path().to_string_lossy().into_owned(),
            scratch_dir: scratch.path().to_path_buf(),
            chunk_size,
            block_size: 64,
            ..SessionConfig::default()
        };
        send_stream(Cursor::new(data.to_vec()), store, None, &cfg)
            .await
            .unwrap();
        let store = LocalDirStore::new(remote.path());
        (remote, store)
    }

    #[tokio::test]
    async fn replay_reassembles_sent_stream() {
        let data: Vec<u8> = (0..2_500u32).map(|i| (i % 251) as u8).collect();
        let (_remote, store) = sent_remote(&data, 1_000).await;

        let manifest = fetch_manifest(&store).await.unwrap();
        assert_eq!(manifest.len(), 3);

        let mut out = Vec::new();
        let report = ReplayEngine::new(&store)
            .replay(&manifest, &mut out)
            .await
            .unwrap();
        assert_eq!(out, data);
        assert_eq!(report.bytes, data.len() as u64);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn corrupt_chunk_warns_but_still_replays() {
        let data = vec![7u8; 2_000];
        let (remote, store) = sent_remote(&data, 1_000).await;

        // Same length, different bytes: replay emits them anyway.
        std::fs::write(remote.path().join("sp-aaaaab"), vec![8u8; 1_000]).unwrap();

        let manifest = fetch_manifest(&store).await.unwrap();
        let mut out = Vec::new();
        let report = ReplayEngine::new(&store)
            .replay(&manifest, &mut out)
            .await
            .unwrap();

        assert_eq!(out.len(), 2_000);
        assert_eq!(report.mismatched_chunks, vec!["sp-aaaaab"]);
        assert!(!report.total_matches);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn missing_chunk_is_fatal() {
        let data = vec![7u8; 2_000];
        let (remote, store) = sent_remote(&data, 1_000).await;
        std::fs::remove_file(remote.path().join("sp-aaaaab")).unwrap();

        let manifest = fetch_manifest(&store).await.unwrap();
        let mut out = Vec::new();
        assert!(ReplayEngine::new(&store)
            .replay(&manifest, &mut out)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn empty_stream_replays_to_nothing() {
        let (_remote, store) = sent_remote(&[], 1_000).await;

        let manifest = fetch_manifest(&store).await.unwrap();
        assert!(manifest.is_empty());

        let mut out = Vec::new();
        let report = ReplayEngine::new(&store)
            .replay(&manifest, &mut out)
            .await
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(report.chunks, 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn replay_orders_chunks_by_name() {
        // Manifest entries deliberately out of order; replay must sort.
        let remote = tempfile::tempdir().unwrap();
        std::fs::write(remote.path().join("sp-aaaaaa"), b"first").unwrap();
        std::fs::write(remote.path().join("sp-aaaaab"), b"second").unwrap();

        let mut total = DigestAccumulator::new();
        total.update(b"firstsecond");
        let digest_of = |d: &[u8]| {
            let mut acc = DigestAccumulator::new();
            acc.update(d);
            acc.peek()
        };
        let manifest = Manifest::build(
            vec![
                spool_manifest::ManifestEntry {
                    name: "sp-aaaaab".into(),
                    digest: digest_of(b"second"),
                },
                spool_manifest::ManifestEntry {
                    name: "sp-aaaaaa".into(),
                    digest: digest_of(b"first"),
                },
            ],
            total.peek(),
        );

        let store = LocalDirStore::new(remote.path());
        let mut out = Vec::new();
        let report = ReplayEngine::new(&store)
            .replay(&manifest, &mut out)
            .await
            .unwrap();
        assert_eq!(out, b"firstsecond");
        assert!(report.is_clean());
    }
}
