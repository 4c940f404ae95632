use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spool",
    about = "Chunked stream transfer with a verified checksum ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Chunk stdin and upload it to the destination
    Send(SendArgs),
    /// Reassemble a stored stream onto stdout
    Replay(ReplayArgs),
    /// Verify the destination against its ledger
    Check(CheckArgs),
}

#[derive(Args)]
pub struct SendArgs {
    /// Destination: a directory path, or `remote:path` for rclone
    pub destination: String,

    /// Chunk size in bytes
    #[arg(short = 'c', long, default_value_t = 1 << 23)]
    pub chunk_size: u64,

    /// Read/write block size in bytes
    #[arg(short = 'b', long, default_value_t = 1 << 16)]
    pub block_size: usize,

    /// Maximum concurrent chunk uploads
    #[arg(short = 'j', long, default_value_t = 2)]
    pub jobs: usize,

    /// Directory for chunk scratch files
    #[arg(short = 't', long)]
    pub tempdir: Option<PathBuf>,

    /// Skip the post-send verification pass
    #[arg(short = 'n', long)]
    pub no_check: bool,

    /// Create and upload a par2 parity artifact per chunk
    #[arg(long)]
    pub parity: bool,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Source: a directory path, or `remote:path` for rclone
    pub destination: String,

    /// Skip ledger verification before replaying
    #[arg(short = 'n', long)]
    pub no_check: bool,

    /// Repair corrupted chunks from their parity artifacts
    #[arg(long)]
    pub repair: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Destination: a directory path, or `remote:path` for rclone
    pub destination: String,

    /// Repair corrupted chunks from their parity artifacts
    #[arg(long)]
    pub repair: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_send_defaults() {
        let cli = Cli::try_parse_from(["spool", "send", "remote:backup"]).unwrap();
        if let Command::Send(args) = cli.command {
            assert_eq!(args.destination, "remote:backup");
            assert_eq!(args.chunk_size, 8 * 1024 * 1024);
            assert_eq!(args.block_size, 64 * 1024);
            assert_eq!(args.jobs, 2);
            assert!(args.tempdir.is_none());
            assert!(!args.no_check);
            assert!(!args.parity);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_send_tuning_flags() {
        let cli = Cli::try_parse_from([
            "spool", "send", "-c", "1048576", "-b", "4096", "-j", "4", "-t", "/var/tmp",
            "remote:backup",
        ])
        .unwrap();
        if let Command::Send(args) = cli.command {
            assert_eq!(args.chunk_size, 1_048_576);
            assert_eq!(args.block_size, 4_096);
            assert_eq!(args.jobs, 4);
            assert_eq!(args.tempdir, Some(PathBuf::from("/var/tmp")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_send_no_check_and_parity() {
        let cli =
            Cli::try_parse_from(["spool", "send", "-n", "--parity", "remote:backup"]).unwrap();
        if let Command::Send(args) = cli.command {
            assert!(args.no_check);
            assert!(args.parity);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_replay() {
        let cli = Cli::try_parse_from(["spool", "replay", "/srv/store"]).unwrap();
        if let Command::Replay(args) = cli.command {
            assert_eq!(args.destination, "/srv/store");
            assert!(!args.no_check);
            assert!(!args.repair);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_replay_no_check_and_repair() {
        let cli =
            Cli::try_parse_from(["spool", "replay", "-n", "--repair", "/srv/store"]).unwrap();
        if let Command::Replay(args) = cli.command {
            assert!(args.no_check);
            assert!(args.repair);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_check_with_repair() {
        let cli = Cli::try_parse_from(["spool", "check", "--repair", "remote:backup"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert!(args.repair);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["spool", "--verbose", "check", "d"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn missing_destination_is_an_error() {
        assert!(Cli::try_parse_from(["spool", "send"]).is_err());
    }
}
