use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use spool_digest::digest_file;
use spool_types::ChunkDigest;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::ObjectStore;

/// Object store backed by a plain local directory.
///
/// Used when the destination is a filesystem path, and by tests. Checksums
/// are recomputed from file contents on every inventory call, which matches
/// the "built fresh on every verification pass" contract.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The destination directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn matching_names(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_file() && glob_match(pattern, &name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    async fn put(&self, local: &Path, remote_name: &str) -> RemoteResult<()> {
        let target = self.object_path(remote_name);
        tokio::fs::copy(local, &target).await?;
        debug!(name = remote_name, "stored object");
        Ok(())
    }

    async fn get(&self, remote_name: &str) -> RemoteResult<Bytes> {
        match tokio::fs::read(self.object_path(remote_name)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RemoteError::NotFound {
                name: remote_name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        self.matching_names(pattern)
    }

    async fn remote_checksums(
        &self,
        pattern: &str,
    ) -> RemoteResult<HashMap<String, ChunkDigest>> {
        let names = self.matching_names(pattern)?;
        let root = self.root.clone();
        let sums = tokio::task::spawn_blocking(move || -> RemoteResult<_> {
            let mut sums = HashMap::with_capacity(names.len());
            for name in names {
                let digest = digest_file(&root.join(&name))?;
                sums.insert(name, digest);
            }
            Ok(sums)
        })
        .await
        .map_err(|e| RemoteError::Process {
            command: "checksum task".into(),
            detail: e.to_string(),
        })??;
        Ok(sums)
    }

    async fn make_container(&self) -> RemoteResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

/// Minimal glob matcher: `*` matches any run of characters (including
/// empty). This covers the two patterns the pipeline uses, `sp-*` and
/// literal object names.
pub(crate) fn glob_match(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    if !name.starts_with(first) {
        return false;
    }
    let mut rest = &name[first.len()..];
    let mut last_part: Option<&str> = None;
    for part in parts {
        last_part = Some(part);
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    match last_part {
        // No `*` at all: the whole name must equal the pattern.
        None => rest.is_empty(),
        Some("") => true,
        Some(part) => rest.is_empty() || name.ends_with(part),
    }
}
