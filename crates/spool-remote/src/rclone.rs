use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::debug;

use spool_types::ChunkDigest;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::ObjectStore;

/// Retry budget handed to rclone. Transient transport failures never
/// surface past this store.
const RCLONE_RETRIES: &str = "--retries=10";

/// Object store that shells out to `rclone`.
///
/// Used for `remote:path` destinations. Each operation maps to one rclone
/// subcommand; rclone owns transient-failure retries, so any error returned
/// here is terminal.
pub struct RcloneStore {
    destination: String,
    binary: PathBuf,
}

impl RcloneStore {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            binary: PathBuf::from("rclone"),
        }
    }

    /// Use a specific rclone binary instead of resolving from `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn remote_path(&self, name: &str) -> String {
        format!("{}/{}", self.destination, name)
    }

    async fn run(&self, args: &[&str]) -> RemoteResult<Output> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| RemoteError::Process {
                command: format!("rclone {}", args.first().unwrap_or(&"")),
                detail: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(RemoteError::Process {
                command: format!("rclone {}", args.first().unwrap_or(&"")),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl ObjectStore for RcloneStore {
    async fn put(&self, local: &Path, remote_name: &str) -> RemoteResult<()> {
        let local = local.to_string_lossy();
        let target = self.remote_path(remote_name);
        debug!(name = remote_name, "rclone copyto");
        self.run(&["copyto", RCLONE_RETRIES, &local, &target])
            .await?;
        Ok(())
    }

    async fn get(&self, remote_name: &str) -> RemoteResult<Bytes> {
        let target = self.remote_path(remote_name);
        let output = self.run(&["cat", RCLONE_RETRIES, &target]).await?;
        Ok(Bytes::from(output.stdout))
    }

    async fn list(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        let include = format!("--include={pattern}");
        let output = self
            .run(&["lsf", RCLONE_RETRIES, &include, &self.destination])
            .await?;
        let mut names: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn remote_checksums(
        &self,
        pattern: &str,
    ) -> RemoteResult<HashMap<String, ChunkDigest>> {
        let include = format!("--include={pattern}");
        let output = self
            .run(&["md5sum", RCLONE_RETRIES, &include, &self.destination])
            .await?;
        parse_md5sum_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn make_container(&self) -> RemoteResult<()> {
        self.run(&["mkdir", &self.destination]).await?;
        Ok(())
    }
}

/// Parse `rclone md5sum` output: one `<digest>  <name>` line per object.
fn parse_md5sum_output(text: &str) -> RemoteResult<HashMap<String, ChunkDigest>> {
    let mut sums = HashMap::new();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(token), Some(name)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let digest = ChunkDigest::from_hex(token).map_err(|_| RemoteError::BadChecksum {
            name: name.to_string(),
            token: token.to_string(),
        })?;
        sums.insert(name.to_string(), digest);
    }
    Ok(sums)
}
