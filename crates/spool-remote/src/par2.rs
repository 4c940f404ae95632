use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use spool_types::PARITY_SUFFIX;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::ParityEngine;

/// Parity engine backed by the external `par2` binary.
///
/// `create_parity` produces exactly one artifact per chunk: par2 is asked
/// for a single recovery volume, the index file is dropped, and the volume
/// is renamed to `<chunk>.par2` (recovery volumes replicate the critical
/// packets, so one volume alone suffices for repair).
pub struct Par2Engine {
    binary: PathBuf,
    /// Redundancy percentage handed to `par2 create -r`.
    redundancy: u32,
}

impl Par2Engine {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("par2"),
            redundancy: 10,
        }
    }

    /// Use a specific par2 binary instead of resolving from `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_redundancy(mut self, percent: u32) -> Self {
        self.redundancy = percent;
        self
    }

    async fn run(&self, args: &[&str]) -> RemoteResult<std::process::ExitStatus> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| RemoteError::Process {
                command: format!("par2 {}", args.first().unwrap_or(&"")),
                detail: e.to_string(),
            })?;
        Ok(output.status)
    }
}

impl Default for Par2Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParityEngine for Par2Engine {
    async fn create_parity(&self, chunk: &Path) -> RemoteResult<PathBuf> {
        let artifact = parity_path_for(chunk);
        let redundancy = format!("-r{}", self.redundancy);
        let artifact_arg = artifact.to_string_lossy();
        let chunk_arg = chunk.to_string_lossy();

        let status = self
            .run(&["create", "-q", &redundancy, "-n1", &artifact_arg, &chunk_arg])
            .await?;
        if !status.success() {
            return Err(RemoteError::Process {
                command: "par2 create".into(),
                detail: format!("exit status {status} for {}", chunk.display()),
            });
        }

        // par2 wrote <chunk>.par2 (index) plus one <chunk>.vol*.par2
        // recovery volume. Keep a single artifact: the volume, under the
        // index's name.
        let volume = find_volume_file(chunk)?;
        std::fs::rename(&volume, &artifact)?;
        debug!(artifact = %artifact.display(), "created parity artifact");
        Ok(artifact)
    }

    async fn repair(&self, parity: &Path, corrupted: &Path) -> RemoteResult<bool> {
        let parity_arg = parity.to_string_lossy();
        let corrupted_arg = corrupted.to_string_lossy();
        let status = self
            .run(&["repair", "-q", &parity_arg, &corrupted_arg])
            .await?;

        // par2 renames the damaged original to <file>.1 on repair.
        let backup = corrupted.with_extension("1");
        if backup.exists() {
            let _ = std::fs::remove_file(&backup);
        }

        // Non-zero exit means the corruption exceeds the parity's repair
        // capacity or the parity itself is invalid.
        Ok(status.success())
    }
}

/// Engine used when parity support is unavailable. Creating parity fails
/// loudly; repair always reports "cannot repair".
pub struct NoopParityEngine;

#[async_trait]
impl ParityEngine for NoopParityEngine {
    async fn create_parity(&self, _chunk: &Path) -> RemoteResult<PathBuf> {
        Err(RemoteError::ParityUnsupported)
    }

    async fn repair(&self, _parity: &Path, _corrupted: &Path) -> RemoteResult<bool> {
        Ok(false)
    }
}

/// `<chunk-file-name>.par2` beside the chunk file.
fn parity_path_for(chunk: &Path) -> PathBuf {
    let mut name = chunk.as_os_str().to_owned();
    name.push(PARITY_SUFFIX);
    PathBuf::from(name)
}

/// Locate the single recovery volume par2 created beside the chunk.
fn find_volume_file(chunk: &Path) -> RemoteResult<PathBuf> {
    let dir = chunk.parent().unwrap_or_else(|| Path::new("."));
    let stem = format!(
        "{}.vol",
        chunk
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&stem) && name.ends_with(PARITY_SUFFIX) {
            return Ok(entry.path());
        }
    }
    Err(RemoteError::Process {
        command: "par2 create".into(),
        detail: format!("no recovery volume found for {}", chunk.display()),
    })
}
