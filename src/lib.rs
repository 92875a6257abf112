//! walreplay - rebuild time-series state from a write-ahead log
//!
//! Replays the latest checkpoint and every later WAL segment, in order,
//! into a sink. Corruption halts replay; nothing is skipped or repaired.

pub mod cli;
pub mod record;
pub mod recovery;
pub mod wal;

pub use recovery::{
    RecoveryError, RecoveryResult, ReplayOptions, ReplayStats, SeriesSampleSink,
    WalDataCollector, WalReplayer,
};
pub use wal::sub_directory;
