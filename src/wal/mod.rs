//! Segmented write-ahead log storage
//!
//! A WAL directory holds numbered segment files and, optionally, checkpoint
//! directories consolidating every segment up to their index.
//!
//! # Layout
//!
//! ```text
//! <storage>/wal/
//!     checkpoint.00000004/
//!         00000000
//!     00000005
//!     00000006
//! ```
//!
//! # Guarantees
//!
//! - Records are framed with a length and a CRC32 checksum
//! - Segments are append-only and retained contiguously
//! - Corruption is reported with its stream offset, never skipped

mod dir;
mod errors;
mod frame;
mod reader;
mod segment;
mod writer;

pub use dir::{sub_directory, WalDir};
pub use errors::{WalError, WalErrorCode, WalResult};
pub use frame::{encode_frame, DEFAULT_MAX_RECORD_BYTES, FRAME_HEADER_SIZE};
pub use reader::SegmentReader;
pub use segment::{checkpoint_dir_name, segment_name, CheckpointRef, SegmentRange};
pub use writer::{CheckpointWriter, WalWriter, DEFAULT_MAX_SEGMENT_BYTES};
