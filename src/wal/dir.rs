//! Read access to a WAL directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::errors::{WalError, WalResult};
use super::frame::DEFAULT_MAX_RECORD_BYTES;
use super::reader::SegmentReader;
use super::segment::{self, CheckpointRef, SegmentRange};

/// Returns the WAL subdirectory of a storage directory (`<base>/wal`).
pub fn sub_directory(base: impl AsRef<Path>) -> PathBuf {
    base.as_ref().join("wal")
}

/// An opened WAL directory.
///
/// Opening only checks that the directory exists and can be listed;
/// segments and checkpoints are discovered on demand.
#[derive(Debug, Clone)]
pub struct WalDir {
    path: PathBuf,
    max_record_bytes: u32,
}

impl WalDir {
    /// Opens a WAL directory with the default record size limit.
    pub fn open(path: impl AsRef<Path>) -> WalResult<Self> {
        Self::open_with(path, DEFAULT_MAX_RECORD_BYTES)
    }

    /// Opens a WAL directory; records larger than `max_record_bytes` are
    /// treated as corruption by readers created from it.
    pub fn open_with(path: impl AsRef<Path>, max_record_bytes: u32) -> WalResult<Self> {
        let path = path.as_ref();

        let metadata =
            fs::metadata(path).map_err(|e| WalError::directory_unavailable(path, e))?;
        if !metadata.is_dir() {
            return Err(WalError::directory_unavailable(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        fs::read_dir(path).map_err(|e| WalError::directory_unavailable(path, e))?;

        trace!(dir = %path.display(), "opened WAL directory");
        Ok(Self {
            path: path.to_path_buf(),
            max_record_bytes,
        })
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the record size limit applied by readers.
    pub fn max_record_bytes(&self) -> u32 {
        self.max_record_bytes
    }

    /// Finds the latest completed checkpoint; `Ok(None)` if there is none.
    pub fn last_checkpoint(&self) -> WalResult<Option<CheckpointRef>> {
        segment::last_checkpoint(&self.path)
    }

    /// Returns the retained segment range; `Ok(None)` if no segments exist.
    pub fn segment_range(&self) -> WalResult<Option<SegmentRange>> {
        segment::segment_range(&self.path)
    }

    /// Opens segment `index` for reading.
    pub fn open_segment(&self, index: u64) -> WalResult<SegmentReader> {
        SegmentReader::open(&segment::segment_name(&self.path, index), self.max_record_bytes)
    }

    /// Opens all segment files of a checkpoint as one record stream.
    pub fn open_checkpoint(&self, checkpoint: &CheckpointRef) -> WalResult<SegmentReader> {
        let paths: Vec<PathBuf> = match segment::segment_range(&checkpoint.dir)? {
            Some(range) => (range.first..=range.last)
                .map(|i| segment::segment_name(&checkpoint.dir, i))
                .collect(),
            None => Vec::new(),
        };
        SegmentReader::open_all(&paths, self.max_record_bytes)
    }
}
