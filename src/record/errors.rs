//! Record decode errors

use thiserror::Error;

use super::types::RecordType;

/// Result type for record decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Reasons a raw record cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty record")]
    Empty,

    #[error("invalid record type tag {0}")]
    InvalidType(u8),

    #[error("expected {expected} record, got {actual}")]
    UnexpectedType {
        expected: RecordType,
        actual: RecordType,
    },

    #[error("truncated {field}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("{0} trailing bytes after record body")]
    TrailingBytes(usize),

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("duplicate label name {0:?}")]
    DuplicateLabel(String),
}
