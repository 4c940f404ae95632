//! Post-transfer integrity: ledger verification, parity repair, and stream
//! replay.
//!
//! Verification cross-checks the remote's own checksum inventory against
//! the deposited ledger. Repair heals a corrupted chunk in place from its
//! parity artifact. Replay reassembles the original byte stream in chunk
//! name order, reporting (but not failing on) digest mismatches.

pub mod error;
pub mod repair;
pub mod replay;
pub mod verifier;

pub use error::{VerifyError, VerifyResult};
pub use repair::RepairCoordinator;
pub use replay::{fetch_manifest, ReplayEngine, ReplayReport};
pub use verifier::{IntegrityVerifier, VerifyState};
