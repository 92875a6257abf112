//! Record framing for segment files
//!
//! Frame layout:
//! - Payload length (u32 LE)
//! - CRC32 of the payload (u32 LE, IEEE polynomial)
//! - Payload (variable)
//!
//! The frame layer knows nothing about record contents; it only guarantees
//! that a payload handed upward is exactly what was appended.

use crc32fast::Hasher;

use super::errors::{WalError, WalResult};

/// Size of the frame header in bytes
pub const FRAME_HEADER_SIZE: usize = 8;

/// Default upper bound on a single record payload (16 MiB)
pub const DEFAULT_MAX_RECORD_BYTES: u32 = 16 * 1024 * 1024;

/// Computes the CRC32 checksum of a payload.
pub fn payload_checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Builds a complete frame for `payload`.
///
/// Fails if the payload length does not fit the u32 length field.
pub fn encode_frame(payload: &[u8]) -> WalResult<Vec<u8>> {
    let length = u32::try_from(payload.len())
        .map_err(|_| WalError::record_too_large(payload.len(), u64::from(u32::MAX)))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&payload_checksum(payload).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Rejects a payload longer than `max_record_bytes`.
pub fn check_record_size(payload: &[u8], max_record_bytes: u32) -> WalResult<()> {
    if payload.len() as u64 > u64::from(max_record_bytes) {
        return Err(WalError::record_too_large(
            payload.len(),
            u64::from(max_record_bytes),
        ));
    }
    Ok(())
}

/// Parsed frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length in bytes
    pub length: u32,
    /// Expected payload checksum
    pub checksum: u32,
}

impl FrameHeader {
    /// Parses a header from its raw bytes.
    pub fn parse(raw: &[u8; FRAME_HEADER_SIZE]) -> Self {
        Self {
            length: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            checksum: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        }
    }
}
