//! CLI argument definitions using clap
//!
//! Commands:
//! - walreplay replay [--config <path>] [--wal-dir <dir> | --storage-dir <dir>] [--dump]
//! - walreplay inspect [--config <path>] [--wal-dir <dir> | --storage-dir <dir>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// walreplay - rebuild series and samples from a write-ahead log
#[derive(Parser, Debug)]
#[command(name = "walreplay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where to find the WAL. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WAL directory
    #[arg(long, conflicts_with = "storage_dir")]
    pub wal_dir: Option<PathBuf>,

    /// Storage directory; the WAL is read from its `wal` subdirectory
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the WAL and print a summary
    Replay {
        #[command(flatten)]
        source: SourceArgs,

        /// Include every replayed series and sample in the output
        #[arg(long)]
        dump: bool,
    },

    /// Print the latest checkpoint and retained segment range
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
