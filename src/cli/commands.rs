//! CLI command implementations
//!
//! Commands build a JSON report and print it. Report construction is
//! separate from printing so it can be tested without capturing stdout.

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::recovery::{WalDataCollector, WalReplayer};
use crate::wal::WalDir;

use super::args::{Command, SourceArgs};
use super::config::ReplayConfig;
use super::errors::CliResult;
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Replay { source, dump } => replay(&source, dump),
        Command::Inspect { source } => inspect(&source),
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over
/// the configured level.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second install (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Replay the WAL into a collector and print a summary
pub fn replay(source: &SourceArgs, dump: bool) -> CliResult<()> {
    let config = ReplayConfig::from_args(source)?;
    init_logging(&config.log_level);

    let report = replay_report(&config, dump)?;
    write_json(&report)
}

/// Print the latest checkpoint and retained segment range
pub fn inspect(source: &SourceArgs) -> CliResult<()> {
    let config = ReplayConfig::from_args(source)?;
    init_logging(&config.log_level);

    let report = inspect_report(&config)?;
    write_json(&report)
}

/// Replays the configured WAL and builds the summary document.
pub fn replay_report(config: &ReplayConfig, dump: bool) -> CliResult<Value> {
    let wal_dir = config.wal_path();
    let collector = WalDataCollector::new();

    let stats = WalReplayer::new(&collector)
        .with_options(config.replay_options())
        .replay(&wal_dir)?;
    info!(
        series = collector.series_len(),
        samples = collector.samples_len(),
        "collected replayed data"
    );

    let data = collector.into_data();
    let mut report = json!({
        "wal_dir": wal_dir.display().to_string(),
        "stats": stats,
        "collected": {
            "series": data.series.len(),
            "samples": data.samples.len(),
        },
    });
    if dump {
        report["data"] = serde_json::to_value(&data)?;
    }
    Ok(report)
}

/// Describes the configured WAL directory without replaying it.
pub fn inspect_report(config: &ReplayConfig) -> CliResult<Value> {
    let wal_dir = config.wal_path();
    let wal = WalDir::open_with(&wal_dir, config.max_record_bytes)?;

    let checkpoint = wal.last_checkpoint()?;
    let range = wal.segment_range()?;

    Ok(json!({
        "wal_dir": wal_dir.display().to_string(),
        "checkpoint": checkpoint.map(|c| json!({
            "index": c.index,
            "dir": c.dir.display().to_string(),
        })),
        "segments": range.map(|r| json!({
            "first": r.first,
            "last": r.last,
            "count": r.len(),
        })),
    }))
}
