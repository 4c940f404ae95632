use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use spool_remote::{ObjectStore, RemoteError};
use spool_types::{parity_name, ChunkState, SealedChunk};

use crate::error::{PipelineError, PipelineResult};

type UploadHandle = JoinHandle<Result<(), RemoteError>>;

/// One chunk's record in the scheduler arena, indexed by sequence number.
struct ChunkSlot {
    chunk: SealedChunk,
    state: ChunkState,
    task: Option<UploadHandle>,
}

/// Bounds concurrent outbound transfers to a sliding window of width W
/// while production and transmission stay overlapped.
///
/// The scheduler owns every upload task and the chunks' local files: no
/// other component deletes a chunk's scratch file. Completion accounting is
/// keyed by chunk identity (the arena index), never by completion order,
/// since uploads across the window finish in any order.
pub struct UploadScheduler {
    store: Arc<dyn ObjectStore>,
    window: usize,
    slots: Vec<ChunkSlot>,
    peak_resident: usize,
}

impl UploadScheduler {
    pub fn new(store: Arc<dyn ObjectStore>, window: usize) -> Self {
        Self {
            store,
            window: window.max(1),
            slots: Vec::new(),
            peak_resident: 0,
        }
    }

    /// Backpressure before sealing chunk `next_index`: block until chunk
    /// `next_index - W` has finished transmitting and delete its local
    /// copy. Keeps at most W+1 chunk files on local storage.
    pub async fn make_room(&mut self, next_index: u64) -> PipelineResult<()> {
        if let Some(oldest) = next_index.checked_sub(self.window as u64) {
            self.retire(oldest).await?;
        }
        let resident = self.resident_files() + 1; // plus the file about to be written
        self.peak_resident = self.peak_resident.max(resident);
        Ok(())
    }

    /// Start the upload task for a sealed chunk. If a parity artifact
    /// accompanies the chunk it is uploaded by the same task, so the chunk
    /// only retires once both are durable on the remote.
    pub fn launch(&mut self, chunk: SealedChunk, parity: Option<PathBuf>) {
        debug_assert_eq!(chunk.index as usize, self.slots.len());

        let store = Arc::clone(&self.store);
        let name = chunk.name.clone();
        let path = chunk.path.clone();
        let task = tokio::spawn(async move {
            store.put(&path, &name).await?;
            if let Some(parity_path) = parity {
                store.put(&parity_path, &parity_name(&name)).await?;
                let _ = tokio::fs::remove_file(&parity_path).await;
            }
            Ok(())
        });

        debug!(chunk = %chunk.name, len = chunk.len, "upload launched");
        self.slots.push(ChunkSlot {
            chunk,
            state: ChunkState::Uploading,
            task: Some(task),
        });
    }

    /// Block until chunk `index` has finished transmitting, then delete its
    /// local file. Idempotent for already-retired chunks.
    pub async fn retire(&mut self, index: u64) -> PipelineResult<()> {
        let slot = self
            .slots
            .get_mut(index as usize)
            .expect("retire of unknown chunk index");
        let Some(task) = slot.task.take() else {
            return Ok(());
        };

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                return Err(PipelineError::Transmission {
                    name: slot.chunk.name.clone(),
                    source,
                });
            }
            Err(e) => {
                return Err(PipelineError::UploadTask {
                    name: slot.chunk.name.clone(),
                    detail: e.to_string(),
                });
            }
        }

        tokio::fs::remove_file(&slot.chunk.path).await?;
        slot.state = ChunkState::Retired;
        debug!(chunk = %slot.chunk.name, "chunk retired");
        Ok(())
    }

    /// After input exhaustion: block on every remaining in-flight upload.
    pub async fn drain(&mut self) -> PipelineResult<()> {
        for index in 0..self.slots.len() as u64 {
            self.retire(index).await?;
        }
        Ok(())
    }

    /// Abort path: cancel still-running upload tasks and remove leftover
    /// scratch files (chunks and their local parity artifacts).
    pub fn abort(&mut self) {
        for slot in &mut self.slots {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            let _ = std::fs::remove_file(&slot.chunk.path);
            let mut parity = slot.chunk.path.as_os_str().to_owned();
            parity.push(".par2");
            let _ = std::fs::remove_file(PathBuf::from(parity));
        }
    }

    /// Sealed chunks in sequence order (the manifest's send order).
    pub fn chunks(&self) -> impl Iterator<Item = &SealedChunk> {
        self.slots.iter().map(|s| &s.chunk)
    }

    /// Number of chunks launched so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Highest number of chunk files simultaneously present in scratch.
    pub fn peak_resident_files(&self) -> usize {
        self.peak_resident
    }

    fn resident_files(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state != ChunkState::Retired)
            .count()
    }
}
