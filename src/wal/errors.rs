//! WAL storage error types
//!
//! Error codes:
//! - WAL_DIRECTORY_UNAVAILABLE: WAL directory missing, not a directory, or unlistable
//! - WAL_LAYOUT_INVALID: segment/checkpoint naming or sequencing is broken
//! - WAL_READ_FAILED: I/O failure while opening or reading a segment
//! - WAL_CORRUPTION: frame header, length, or checksum is invalid
//! - WAL_APPEND_FAILED: write to a segment failed
//! - WAL_FSYNC_FAILED: fsync of a segment or directory failed
//! - WAL_RECORD_TOO_LARGE: record exceeds the configured record size limit

use std::fmt;
use std::io;
use std::path::Path;

/// WAL storage error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalErrorCode {
    /// WAL directory cannot be used
    DirectoryUnavailable,
    /// Segment or checkpoint layout is invalid
    LayoutInvalid,
    /// Segment open or read failed
    ReadFailed,
    /// Frame-level corruption
    Corruption,
    /// Segment write failed
    AppendFailed,
    /// fsync failed
    FsyncFailed,
    /// Record rejected before writing
    RecordTooLarge,
}

impl WalErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            WalErrorCode::DirectoryUnavailable => "WAL_DIRECTORY_UNAVAILABLE",
            WalErrorCode::LayoutInvalid => "WAL_LAYOUT_INVALID",
            WalErrorCode::ReadFailed => "WAL_READ_FAILED",
            WalErrorCode::Corruption => "WAL_CORRUPTION",
            WalErrorCode::AppendFailed => "WAL_APPEND_FAILED",
            WalErrorCode::FsyncFailed => "WAL_FSYNC_FAILED",
            WalErrorCode::RecordTooLarge => "WAL_RECORD_TOO_LARGE",
        }
    }
}

impl fmt::Display for WalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// WAL storage error with context
#[derive(Debug)]
pub struct WalError {
    code: WalErrorCode,
    message: String,
    /// Byte offset within the record stream, for corruption errors
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl WalError {
    fn new(code: WalErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            offset: None,
            source: None,
        }
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// WAL directory missing or unreadable
    pub fn directory_unavailable(path: &Path, source: io::Error) -> Self {
        Self::new(
            WalErrorCode::DirectoryUnavailable,
            format!("WAL directory unavailable: {}", path.display()),
        )
        .with_source(source)
    }

    /// Segment layout problem (gaps, bad names)
    pub fn layout_invalid(message: impl Into<String>) -> Self {
        Self::new(WalErrorCode::LayoutInvalid, message)
    }

    /// I/O failure while opening or reading
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(WalErrorCode::ReadFailed, message).with_source(source)
    }

    /// Corrupt frame starting at `offset`
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        let mut err = Self::new(WalErrorCode::Corruption, reason);
        err.offset = Some(offset);
        err
    }

    /// Write failure
    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(WalErrorCode::AppendFailed, message).with_source(source)
    }

    /// fsync failure
    pub fn fsync_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(WalErrorCode::FsyncFailed, message).with_source(source)
    }

    /// Record of `len` bytes over the `max` byte limit
    pub fn record_too_large(len: usize, max: u64) -> Self {
        Self::new(
            WalErrorCode::RecordTooLarge,
            format!("Record length {} exceeds maximum {}", len, max),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> WalErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the stream offset for corruption errors
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns whether the error is frame-level corruption
    pub fn is_corruption(&self) -> bool {
        self.code == WalErrorCode::Corruption
    }
}

impl fmt::Display for WalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (byte_offset: {})", offset)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for WAL storage operations
pub type WalResult<T> = Result<T, WalError>;
