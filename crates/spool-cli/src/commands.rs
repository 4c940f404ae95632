use std::io;
use std::sync::Arc;

use colored::Colorize;
use tracing::info;

use spool_pipeline::send_stream;
use spool_remote::{LocalDirStore, ObjectStore, Par2Engine, ParityEngine, RcloneStore};
use spool_types::SessionConfig;
use spool_verify::{fetch_manifest, IntegrityVerifier, RepairCoordinator, ReplayEngine};

use crate::cli::{CheckArgs, Cli, Command, ReplayArgs, SendArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Send(args) => cmd_send(args).await,
        Command::Replay(args) => cmd_replay(args).await,
        Command::Check(args) => cmd_check(args).await,
    }
}

/// A destination with a colon is an rclone `remote:path`; anything else is
/// a local directory.
fn open_store(destination: &str) -> Arc<dyn ObjectStore> {
    if destination.contains(':') {
        Arc::new(RcloneStore::new(destination))
    } else {
        Arc::new(LocalDirStore::new(destination))
    }
}

async fn cmd_send(args: SendArgs) -> anyhow::Result<()> {
    // Scratch files live in a private directory that is removed when the
    // session ends, success or not.
    let mut scratch = tempfile::Builder::new();
    scratch.prefix("spool-");
    let scratch = match &args.tempdir {
        Some(dir) => scratch.tempdir_in(dir)?,
        None => scratch.tempdir()?,
    };

    let config = SessionConfig {
        destination: args.destination.clone(),
        chunk_size: args.chunk_size,
        block_size: args.block_size,
        window: args.jobs,
        scratch_dir: scratch.path().to_path_buf(),
        skip_checksum: args.no_check,
        create_parity: args.parity,
        ..SessionConfig::default()
    };

    let store = open_store(&config.destination);
    let parity: Option<Arc<dyn ParityEngine>> = if config.create_parity {
        Some(Arc::new(Par2Engine::new()))
    } else {
        None
    };

    info!(destination = %config.destination, "starting send");
    let report = send_stream(io::stdin().lock(), Arc::clone(&store), parity, &config).await?;
    eprintln!(
        "{} sent {} chunks, {} bytes (total {})",
        "✓".green().bold(),
        report.chunks.to_string().bold(),
        report.bytes,
        report.total_digest.short_hex().yellow(),
    );

    if !config.skip_checksum {
        IntegrityVerifier::new(&*store).check().await?;
        eprintln!("{} remote checksums match the ledger", "✓".green().bold());
    }
    Ok(())
}

async fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    read_session(SessionConfig {
        destination: args.destination,
        skip_checksum: args.no_check,
        attempt_repair: args.repair,
        ..SessionConfig::default()
    })
    .await
}

async fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    read_session(SessionConfig {
        destination: args.destination,
        verify_only: true,
        attempt_repair: args.repair,
        ..SessionConfig::default()
    })
    .await
}

/// Read-side session shared by `check` and `replay`: obtain the ledger
/// through the verifier (unverified only when checksum-skipping was asked
/// for), then either stop there or replay the stream onto stdout.
///
/// A verification failure is fatal before any stream byte is emitted;
/// mismatches discovered during the replay pass itself are warnings.
async fn read_session(config: SessionConfig) -> anyhow::Result<()> {
    let store = open_store(&config.destination);

    let manifest = if config.skip_checksum {
        fetch_manifest(&*store).await?
    } else {
        let engine = Par2Engine::new();
        let mut verifier = IntegrityVerifier::new(&*store).with_repair(RepairCoordinator::new(
            &*store,
            &engine,
            config.attempt_repair,
        ));
        verifier.check().await?
    };

    if config.verify_only {
        eprintln!(
            "{} {} chunks verified against the ledger",
            "✓".green().bold(),
            manifest.len().to_string().bold(),
        );
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    let report = ReplayEngine::new(&*store)
        .replay(&manifest, &mut stdout)
        .await?;

    if report.is_clean() {
        eprintln!(
            "{} replayed {} chunks, {} bytes",
            "✓".green().bold(),
            report.chunks.to_string().bold(),
            report.bytes,
        );
    } else {
        eprintln!(
            "{} replayed {} bytes with {} mismatched chunk(s); TOTAL match: {}",
            "!".yellow().bold(),
            report.bytes,
            report.mismatched_chunks.len().to_string().red(),
            report.total_matches,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use spool_verify::VerifyError;

    use super::*;

    /// Send a small stream into a fresh local destination directory.
    async fn seeded_destination(data: &[u8]) -> tempfile::TempDir {
        let scratch = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalDirStore::new(remote.path()));
        let config = SessionConfig {
            destination: remote.path().to_string_lossy().into_owned(),
            scratch_dir: scratch.path().to_path_buf(),
            chunk_size: 1_000,
            block_size: 128,
            ..SessionConfig::default()
        };
        send_stream(Cursor::new(data.to_vec()), store, None, &config)
            .await
            .unwrap();
        remote
    }

    fn destination_of(dir: &tempfile::TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    fn corrupt(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"not the original bytes").unwrap();
    }

    #[tokio::test]
    async fn replay_verifies_before_emitting_by_default() {
        let remote = seeded_destination(&[3u8; 2_000]).await;
        corrupt(remote.path(), "sp-aaaaab");

        let err = cmd_replay(ReplayArgs {
            destination: destination_of(&remote),
            no_check: false,
            repair: false,
        })
        .await
        .unwrap_err();

        // Fatal before any byte of the stream was written.
        let verify_err = err.downcast_ref::<VerifyError>().expect("verify error");
        assert!(verify_err.to_string().contains("sp-aaaaab"));
    }

    #[tokio::test]
    async fn no_check_replays_without_verification() {
        let remote = seeded_destination(&[3u8; 2_000]).await;
        corrupt(remote.path(), "sp-aaaaab");

        cmd_replay(ReplayArgs {
            destination: destination_of(&remote),
            no_check: true,
            repair: false,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn replay_succeeds_on_clean_destination() {
        let remote = seeded_destination(&[5u8; 1_500]).await;

        cmd_replay(ReplayArgs {
            destination: destination_of(&remote),
            no_check: false,
            repair: false,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn check_passes_clean_and_fails_corrupt() {
        let remote = seeded_destination(&[7u8; 1_500]).await;
        cmd_check(CheckArgs {
            destination: destination_of(&remote),
            repair: false,
        })
        .await
        .unwrap();

        corrupt(remote.path(), "sp-aaaaaa");
        let err = cmd_check(CheckArgs {
            destination: destination_of(&remote),
            repair: false,
        })
        .await
        .unwrap_err();
        assert!(err.downcast_ref::<VerifyError>().is_some());
    }
}
