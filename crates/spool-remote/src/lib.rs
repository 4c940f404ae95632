//! Collaborator interfaces for spool: the object-store client and the
//! erasure-coding (parity) engine, plus concrete implementations.
//!
//! The core pipeline only ever talks to the [`ObjectStore`] and
//! [`ParityEngine`] traits. Two stores ship with the workspace: a local
//! directory store and an `rclone` subprocess store. Two parity engines
//! ship: an external `par2` binary engine and a no-op fallback.

pub mod error;
pub mod local;
pub mod par2;
pub mod rclone;
pub mod traits;

pub use error::{RemoteError, RemoteResult};
pub use local::LocalDirStore;
pub use par2::{NoopParityEngine, Par2Engine};
pub use rclone::RcloneStore;
pub use traits::{ObjectStore, ParityEngine};
