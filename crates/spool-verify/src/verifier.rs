use tracing::{debug, warn};

use spool_manifest::Manifest;
use spool_remote::ObjectStore;
use spool_types::{CHUNK_PATTERN, MANIFEST_NAME};

use crate::error::{VerifyError, VerifyResult};
use crate::repair::RepairCoordinator;

/// Where a verification pass currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyState {
    Checking,
    ChunkMismatchFound,
    Repairing,
    Verified,
    Failed,
}

/// Cross-checks the remote chunk inventory against the ledger.
///
/// On success returns the parsed ledger, so callers that go on to replay
/// reuse the same remote round trip.
pub struct IntegrityVerifier<'a> {
    store: &'a dyn ObjectStore,
    repair: Option<RepairCoordinator<'a>>,
    state: VerifyState,
}

impl<'a> IntegrityVerifier<'a> {
    /// Verifier without repair handling: any mismatch is a plain
    /// [`VerifyError::ChecksumMismatch`]. Used by send's post-check.
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            repair: None,
            state: VerifyState::Checking,
        }
    }

    /// Delegate mismatches to a repair coordinator, which classifies them
    /// as unrepairable, repairable-but-not-requested, or heals them.
    pub fn with_repair(mut self, coordinator: RepairCoordinator<'a>) -> Self {
        self.repair = Some(coordinator);
        self
    }

    pub fn state(&self) -> VerifyState {
        self.state
    }

    /// Verify every ledger entry against the remote's own checksums.
    ///
    /// Succeeds only if every non-TOTAL entry either matched directly or
    /// was successfully repaired; a repaired entry is trusted without
    /// re-fetching its remote checksum (re-run the whole pass if absolute
    /// certainty is required).
    pub async fn check(&mut self) -> VerifyResult<Manifest> {
        self.state = VerifyState::Checking;
        let result = self.run_check().await;
        self.state = match result {
            Ok(_) => VerifyState::Verified,
            Err(_) => VerifyState::Failed,
        };
        result
    }

    async fn run_check(&mut self) -> VerifyResult<Manifest> {
        let inventory = self.store.remote_checksums(CHUNK_PATTERN).await?;
        let manifest = Manifest::parse(&self.store.get(MANIFEST_NAME).await?)?;
        debug!(
            entries = manifest.len(),
            inventory = inventory.len(),
            "checking ledger against remote inventory"
        );

        for entry in manifest.chunks() {
            let Some(actual) = inventory.get(&entry.name) else {
                return Err(VerifyError::MissingChunk {
                    name: entry.name.clone(),
                });
            };
            if *actual == entry.digest {
                continue;
            }

            self.state = VerifyState::ChunkMismatchFound;
            warn!(
                chunk = %entry.name,
                recorded = %entry.digest,
                actual = %actual,
                "chunk digest mismatch"
            );
            match &self.repair {
                None => {
                    return Err(VerifyError::ChecksumMismatch {
                        name: entry.name.clone(),
                        recorded: entry.digest,
                        actual: *actual,
                    });
                }
                Some(coordinator) => {
                    self.state = VerifyState::Repairing;
                    coordinator.heal(&entry.name).await?;
                    // Healed: the entry counts as passed without another
                    // checksum round trip.
                }
            }
        }

        Ok(manifest)
    }
}
