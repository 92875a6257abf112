//! WAL replay into a sink
//!
//! Reconstructs in-memory state from a WAL directory: the latest
//! checkpoint first, then every retained segment after it.
//!
//! # Sequence (strict order)
//!
//! 1. Open the WAL directory
//! 2. Locate the latest checkpoint; replay it if present
//! 3. List retained segments
//! 4. Replay each later segment in index order, one at a time
//! 5. Per record: series go to `store_series`, samples to
//!    `append_samples`, exemplars and resets to the sink's optional
//!    capabilities, reserved types are skipped
//!
//! # Failure policy
//!
//! - Halt on the first error, corrupt or malformed data included
//! - Applied records are never rolled back
//! - A reader is always closed; its close error only surfaces if nothing
//!   failed before it

mod adapters;
mod collector;
mod errors;
mod replay;
mod sink;

pub use collector::{CollectedData, WalDataCollector};
pub use errors::{RecoveryError, RecoveryErrorCode, RecoveryResult, ReplaySource};
pub use replay::{RecordSource, ReplayOptions, ReplayStats, WalAccess, WalReplayer};
pub use sink::{ExemplarSink, ResettableSink, SeriesSampleSink};
