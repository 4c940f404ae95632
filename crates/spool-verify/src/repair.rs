use tracing::{debug, info};

use spool_remote::{ObjectStore, ParityEngine};
use spool_types::parity_name;

use crate::error::{VerifyError, VerifyResult};

/// Heals a corrupted remote chunk in place using its parity artifact.
///
/// The only component allowed to invoke the erasure-coding engine. Scratch
/// copies of the parity artifact, the corrupted chunk, and any engine side
/// files live in a temporary directory that is removed on success and
/// failure alike.
pub struct RepairCoordinator<'a> {
    store: &'a dyn ObjectStore,
    engine: &'a dyn ParityEngine,
    requested: bool,
}

impl<'a> RepairCoordinator<'a> {
    /// `requested` is the caller's explicit opt-in to actually repairing;
    /// without it the coordinator only classifies the failure.
    pub fn new(store: &'a dyn ObjectStore, engine: &'a dyn ParityEngine, requested: bool) -> Self {
        Self {
            store,
            engine,
            requested,
        }
    }

    /// Attempt to heal chunk `name`.
    ///
    /// Distinguishes "unrepairable" ([`VerifyError::NoParityAvailable`])
    /// from "repairable but the caller must opt in"
    /// ([`VerifyError::RepairNotRequested`]). On engine success the healed chunk is
    /// re-uploaded under its original name, overwriting the corrupted copy.
    pub async fn heal(&self, name: &str) -> VerifyResult<()> {
        let parity = parity_name(name);
        let present = self.store.list(&parity).await?.iter().any(|n| n == &parity);
        if !present {
            return Err(VerifyError::NoParityAvailable {
                name: name.to_string(),
            });
        }
        if !self.requested {
            return Err(VerifyError::RepairNotRequested {
                name: name.to_string(),
            });
        }

        let scratch = tempfile::tempdir()?;
        let parity_path = scratch.path().join(&parity);
        let chunk_path = scratch.path().join(name);
        tokio::fs::write(&parity_path, self.store.get(&parity).await?).await?;
        tokio::fs::write(&chunk_path, self.store.get(name).await?).await?;
        debug!(chunk = name, "fetched chunk and parity into scratch");

        let healed = self.engine.repair(&parity_path, &chunk_path).await?;
        if !healed {
            return Err(VerifyError::RepairFailed {
                name: name.to_string(),
            });
        }

        self.store.put(&chunk_path, name).await?;
        info!(chunk = name, "repaired and re-uploaded");
        Ok(())
    }
}
