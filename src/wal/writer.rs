//! Segment and checkpoint writers
//!
//! - Every append is followed by fsync
//! - Records over the record size limit are rejected before any byte is
//!   written
//! - A writer never appends to a segment it did not create: opening a WAL
//!   starts a fresh segment after the last retained one, so a torn tail
//!   left by a crash stays at the end of its own segment
//! - Checkpoints are written under `checkpoint.N.tmp` and renamed into
//!   place only once complete

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::errors::{WalError, WalResult};
use super::frame::{
    check_record_size, encode_frame, DEFAULT_MAX_RECORD_BYTES, FRAME_HEADER_SIZE,
};
use super::segment::{checkpoint_dir_name, segment_name, segment_range, CheckpointRef, TMP_SUFFIX};

/// Default segment size before rolling over (128 MiB)
pub const DEFAULT_MAX_SEGMENT_BYTES: u64 = 128 * 1024 * 1024;

fn create_segment(dir: &Path, index: u64) -> WalResult<File> {
    let path = segment_name(dir, index);
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| {
            WalError::append_failed(format!("Failed to create segment: {}", path.display()), e)
        })?;
    sync_dir(dir)?;
    Ok(file)
}

fn sync_dir(dir: &Path) -> WalResult<()> {
    let handle = File::open(dir).map_err(|e| {
        WalError::fsync_failed(format!("Failed to open directory for fsync: {}", dir.display()), e)
    })?;
    handle.sync_all().map_err(|e| {
        WalError::fsync_failed(format!("Failed to fsync directory: {}", dir.display()), e)
    })
}

fn append_frame(file: &mut File, record: &[u8], what: &str) -> WalResult<usize> {
    let frame = encode_frame(record)?;
    file.write_all(&frame)
        .map_err(|e| WalError::append_failed(format!("Failed to append record to {}", what), e))?;
    file.sync_data()
        .map_err(|e| WalError::fsync_failed(format!("fsync failed after append to {}", what), e))?;
    Ok(frame.len())
}

/// Appends framed records to the segments of a WAL directory.
pub struct WalWriter {
    dir: PathBuf,
    file: File,
    segment_index: u64,
    segment_bytes: u64,
    max_segment_bytes: u64,
    max_record_bytes: u32,
}

impl WalWriter {
    /// Opens `dir` for writing with the default segment size.
    pub fn open(dir: &Path) -> WalResult<Self> {
        Self::open_with(dir, DEFAULT_MAX_SEGMENT_BYTES)
    }

    /// Opens `dir` for writing, creating it if missing.
    ///
    /// Writing starts in a new segment following the last retained one.
    pub fn open_with(dir: &Path, max_segment_bytes: u64) -> WalResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            WalError::append_failed(format!("Failed to create WAL directory: {}", dir.display()), e)
        })?;

        let segment_index = match segment_range(dir)? {
            Some(range) => range.last + 1,
            None => 0,
        };
        let file = create_segment(dir, segment_index)?;
        debug!(dir = %dir.display(), segment = segment_index, "opened WAL for writing");

        Ok(Self {
            dir: dir.to_path_buf(),
            file,
            segment_index,
            segment_bytes: 0,
            max_segment_bytes,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
        })
    }

    /// Sets the largest record payload `log` accepts.
    ///
    /// Should match the `max_record_bytes` of the readers replaying this WAL.
    pub fn with_max_record_bytes(mut self, max_record_bytes: u32) -> Self {
        self.max_record_bytes = max_record_bytes;
        self
    }

    /// Returns the WAL directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the index of the segment currently written.
    pub fn segment_index(&self) -> u64 {
        self.segment_index
    }

    /// Appends one record, rolling to a new segment first if it would not fit.
    ///
    /// A record over the record size limit fails with `WAL_RECORD_TOO_LARGE`
    /// and leaves the WAL untouched.
    pub fn log(&mut self, record: &[u8]) -> WalResult<()> {
        check_record_size(record, self.max_record_bytes)?;

        let frame_len = (record.len() + FRAME_HEADER_SIZE) as u64;
        if self.segment_bytes > 0 && self.segment_bytes + frame_len > self.max_segment_bytes {
            self.next_segment()?;
        }

        let what = segment_name(&self.dir, self.segment_index).display().to_string();
        let written = append_frame(&mut self.file, record, &what)?;
        self.segment_bytes += written as u64;
        Ok(())
    }

    /// Closes the current segment and starts the next one.
    ///
    /// Returns the index of the new segment.
    pub fn next_segment(&mut self) -> WalResult<u64> {
        self.file.sync_all().map_err(|e| {
            WalError::fsync_failed(
                format!("Failed to fsync segment {:08}", self.segment_index),
                e,
            )
        })?;

        let next = self.segment_index + 1;
        self.file = create_segment(&self.dir, next)?;
        self.segment_index = next;
        self.segment_bytes = 0;
        Ok(next)
    }
}

/// Writes a checkpoint directory atomically.
pub struct CheckpointWriter {
    wal_dir: PathBuf,
    tmp_dir: PathBuf,
    file: File,
    index: u64,
    max_record_bytes: u32,
}

impl CheckpointWriter {
    /// Starts a checkpoint covering segments up to and including `index`.
    ///
    /// Leftovers of an earlier unfinished checkpoint with the same index are removed.
    pub fn create(wal_dir: &Path, index: u64) -> WalResult<Self> {
        let tmp_dir = wal_dir.join(format!("{}{}", checkpoint_dir_name(index), TMP_SUFFIX));
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir).map_err(|e| {
                WalError::append_failed(
                    format!("Failed to remove stale checkpoint: {}", tmp_dir.display()),
                    e,
                )
            })?;
        }
        fs::create_dir_all(&tmp_dir).map_err(|e| {
            WalError::append_failed(
                format!("Failed to create checkpoint directory: {}", tmp_dir.display()),
                e,
            )
        })?;
        let file = create_segment(&tmp_dir, 0)?;

        Ok(Self {
            wal_dir: wal_dir.to_path_buf(),
            tmp_dir,
            file,
            index,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
        })
    }

    /// Sets the largest record payload `log` accepts.
    pub fn with_max_record_bytes(mut self, max_record_bytes: u32) -> Self {
        self.max_record_bytes = max_record_bytes;
        self
    }

    /// Appends one record to the checkpoint.
    pub fn log(&mut self, record: &[u8]) -> WalResult<()> {
        check_record_size(record, self.max_record_bytes)?;
        let what = format!("checkpoint {:08}", self.index);
        append_frame(&mut self.file, record, &what).map(|_| ())
    }

    /// Makes the checkpoint durable and visible under its final name.
    pub fn commit(self) -> WalResult<CheckpointRef> {
        self.file.sync_all().map_err(|e| {
            WalError::fsync_failed(format!("Failed to fsync checkpoint {:08}", self.index), e)
        })?;
        drop(self.file);

        let final_dir = self.wal_dir.join(checkpoint_dir_name(self.index));
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir).map_err(|e| {
                WalError::append_failed(
                    format!("Failed to replace checkpoint: {}", final_dir.display()),
                    e,
                )
            })?;
        }
        fs::rename(&self.tmp_dir, &final_dir).map_err(|e| {
            WalError::append_failed(
                format!("Failed to publish checkpoint: {}", final_dir.display()),
                e,
            )
        })?;
        sync_dir(&self.wal_dir)?;

        debug!(checkpoint = self.index, "checkpoint committed");
        Ok(CheckpointRef {
            dir: final_dir,
            index: self.index,
        })
    }
}
