//! The spool send path: chunking producer, windowed upload scheduler, and
//! session orchestration.
//!
//! [`send_stream`] drives the whole pipeline: the [`Chunker`] seals
//! bounded-size chunk files from the input while the [`UploadScheduler`]
//! keeps up to W transmissions in flight, and the manifest is published
//! exactly once after everything retired cleanly.

pub mod chunker;
pub mod error;
pub mod scheduler;
pub mod send;

pub use chunker::Chunker;
pub use error::{PipelineError, PipelineResult};
pub use scheduler::UploadScheduler;
pub use send::{send_stream, SendReport};
