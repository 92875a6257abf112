//! CLI module for walreplay
//!
//! Provides command-line interface for:
//! - replay: Replay a WAL directory and print a JSON summary
//! - inspect: Describe a WAL directory without replaying it

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, SourceArgs};
pub use commands::{init_logging, inspect, inspect_report, replay, replay_report, run, run_command};
pub use config::ReplayConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_json_to};
