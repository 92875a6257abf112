//! Adapter implementations for recovery traits
//!
//! Connects the replay driver to the filesystem WAL types.

use crate::wal::{CheckpointRef, SegmentRange, SegmentReader, WalDir, WalResult};

use super::replay::{RecordSource, WalAccess};

// ============================================================================
// RecordSource implementation for SegmentReader
// ============================================================================

impl RecordSource for SegmentReader {
    fn next_record(&mut self) -> WalResult<Option<&[u8]>> {
        SegmentReader::next_record(self)
    }

    fn record_offset(&self) -> u64 {
        SegmentReader::record_offset(self)
    }

    fn close(self) -> WalResult<()> {
        SegmentReader::close(self)
    }
}

// ============================================================================
// WalAccess implementation for WalDir
// ============================================================================

impl WalAccess for WalDir {
    type Source = SegmentReader;

    fn last_checkpoint(&self) -> WalResult<Option<CheckpointRef>> {
        WalDir::last_checkpoint(self)
    }

    fn segment_range(&self) -> WalResult<Option<SegmentRange>> {
        WalDir::segment_range(self)
    }

    fn open_checkpoint(&self, checkpoint: &CheckpointRef) -> WalResult<SegmentReader> {
        WalDir::open_checkpoint(self, checkpoint)
    }

    fn open_segment(&self, index: u64) -> WalResult<SegmentReader> {
        WalDir::open_segment(self, index)
    }
}
