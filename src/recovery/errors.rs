//! Recovery error types
//!
//! Error codes:
//! - REPLAY_OPEN_FAILED: WAL directory missing or unreadable, nothing replayed
//! - REPLAY_CHECKPOINT_LOOKUP_FAILED: checkpoint metadata unreadable, nothing replayed
//! - REPLAY_SEGMENT_LIST_FAILED: retained segments could not be enumerated
//! - REPLAY_SEGMENT_OPEN_FAILED: a checkpoint or segment could not be opened
//! - REPLAY_SEGMENT_READ_FAILED: I/O error or torn/corrupt frame mid-stream
//! - REPLAY_SEGMENT_CLOSE_FAILED: releasing a reader failed after a clean read
//! - REPLAY_MALFORMED_RECORD: a record failed to decode
//!
//! Every code is terminal for the replay call. Records applied before the
//! failure stay applied; there is no rollback.

use std::fmt;
use std::path::Path;

use crate::record::DecodeError;
use crate::wal::WalError;

/// Recovery error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryErrorCode {
    OpenFailed,
    CheckpointLookupFailed,
    SegmentListFailed,
    SegmentOpenFailed,
    SegmentReadFailed,
    SegmentCloseFailed,
    MalformedRecord,
}

impl RecoveryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            RecoveryErrorCode::OpenFailed => "REPLAY_OPEN_FAILED",
            RecoveryErrorCode::CheckpointLookupFailed => "REPLAY_CHECKPOINT_LOOKUP_FAILED",
            RecoveryErrorCode::SegmentListFailed => "REPLAY_SEGMENT_LIST_FAILED",
            RecoveryErrorCode::SegmentOpenFailed => "REPLAY_SEGMENT_OPEN_FAILED",
            RecoveryErrorCode::SegmentReadFailed => "REPLAY_SEGMENT_READ_FAILED",
            RecoveryErrorCode::SegmentCloseFailed => "REPLAY_SEGMENT_CLOSE_FAILED",
            RecoveryErrorCode::MalformedRecord => "REPLAY_MALFORMED_RECORD",
        }
    }
}

impl fmt::Display for RecoveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Which record stream a replay step was reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaySource {
    /// Checkpoint consolidating segments up to the index
    Checkpoint(u64),
    /// Live segment
    Segment(u64),
}

impl ReplaySource {
    /// The checkpoint or segment index
    pub fn index(&self) -> u64 {
        match self {
            ReplaySource::Checkpoint(i) | ReplaySource::Segment(i) => *i,
        }
    }
}

impl fmt::Display for ReplaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaySource::Checkpoint(i) => write!(f, "checkpoint {:08}", i),
            ReplaySource::Segment(i) => write!(f, "segment {:08}", i),
        }
    }
}

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Recovery error with replay location
#[derive(Debug)]
pub struct RecoveryError {
    code: RecoveryErrorCode,
    message: String,
    location: Option<ReplaySource>,
    /// Record offset within the stream, where known
    offset: Option<u64>,
    cause: Option<Cause>,
}

impl RecoveryError {
    fn new(code: RecoveryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
            offset: None,
            cause: None,
        }
    }

    fn at(mut self, location: ReplaySource) -> Self {
        self.location = Some(location);
        self
    }

    fn caused_by(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// WAL directory could not be opened
    pub fn open_failed(dir: &Path, err: WalError) -> Self {
        Self::new(
            RecoveryErrorCode::OpenFailed,
            format!("Failed to open WAL directory {}", dir.display()),
        )
        .caused_by(err)
    }

    /// Checkpoint lookup failed for a reason other than absence
    pub fn checkpoint_lookup_failed(err: WalError) -> Self {
        Self::new(
            RecoveryErrorCode::CheckpointLookupFailed,
            "Failed to locate latest checkpoint",
        )
        .caused_by(err)
    }

    /// Retained segments could not be enumerated
    pub fn segment_list_failed(err: WalError) -> Self {
        Self::new(RecoveryErrorCode::SegmentListFailed, "Failed to list WAL segments")
            .caused_by(err)
    }

    /// A checkpoint or segment could not be opened
    pub fn segment_open_failed(location: ReplaySource, err: WalError) -> Self {
        Self::new(
            RecoveryErrorCode::SegmentOpenFailed,
            format!("Failed to open {}", location),
        )
        .at(location)
        .caused_by(err)
    }

    /// Reading a checkpoint or segment failed mid-stream
    pub fn segment_read_failed(location: ReplaySource, err: WalError) -> Self {
        let mut recovery_err = Self::new(
            RecoveryErrorCode::SegmentReadFailed,
            format!("Failed to read {}", location),
        )
        .at(location);
        recovery_err.offset = err.offset();
        recovery_err.caused_by(err)
    }

    /// Releasing a checkpoint or segment reader failed
    pub fn segment_close_failed(location: ReplaySource, err: WalError) -> Self {
        Self::new(
            RecoveryErrorCode::SegmentCloseFailed,
            format!("Failed to close {}", location),
        )
        .at(location)
        .caused_by(err)
    }

    /// A record at `offset` could not be decoded
    pub fn malformed_record(location: ReplaySource, offset: u64, err: DecodeError) -> Self {
        let mut recovery_err = Self::new(
            RecoveryErrorCode::MalformedRecord,
            format!("Malformed record in {} at offset {}: {}", location, offset, err),
        )
        .at(location);
        recovery_err.offset = Some(offset);
        recovery_err.caused_by(err)
    }

    /// Returns the error code
    pub fn code(&self) -> RecoveryErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the checkpoint or segment being read when the error occurred
    pub fn location(&self) -> Option<ReplaySource> {
        self.location
    }

    /// Returns the record offset within the stream, if known
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref cause) = self.cause {
            if self.code != RecoveryErrorCode::MalformedRecord {
                write!(f, ": {}", cause)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RecoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type for recovery operations
pub type RecoveryResult<T> = Result<T, RecoveryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(RecoveryErrorCode::OpenFailed.code(), "REPLAY_OPEN_FAILED");
        assert_eq!(
            RecoveryErrorCode::CheckpointLookupFailed.code(),
            "REPLAY_CHECKPOINT_LOOKUP_FAILED"
        );
        assert_eq!(
            RecoveryErrorCode::MalformedRecord.code(),
            "REPLAY_MALFORMED_RECORD"
        );
    }

    #[test]
    fn test_malformed_record_carries_location() {
        let err = RecoveryError::malformed_record(
            ReplaySource::Segment(4),
            96,
            DecodeError::InvalidType(0),
        );
        assert_eq!(err.location(), Some(ReplaySource::Segment(4)));
        assert_eq!(err.offset(), Some(96));
        assert!(err.source().is_some());

        let display = err.to_string();
        assert!(display.contains("REPLAY_MALFORMED_RECORD"));
        assert!(display.contains("segment 00000004"));
        assert!(display.contains("offset 96"));
        assert!(display.contains("invalid record type tag 0"));
    }

    #[test]
    fn test_read_failure_takes_offset_from_wal_error() {
        let err = RecoveryError::segment_read_failed(
            ReplaySource::Checkpoint(2),
            WalError::corruption_at_offset(40, "Truncated record"),
        );
        assert_eq!(err.code(), RecoveryErrorCode::SegmentReadFailed);
        assert_eq!(err.offset(), Some(40));
        assert!(err.to_string().contains("checkpoint 00000002"));
    }
}
