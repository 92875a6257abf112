//! Segment and checkpoint naming within a WAL directory
//!
//! - Segments: `<wal>/00000000`, `<wal>/00000001`, ... (zero-padded decimal)
//! - Checkpoints: `<wal>/checkpoint.00000007`, holding segment files of
//!   their own. `checkpoint.N.tmp` is an unfinished checkpoint and never
//!   counts as the latest one.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{WalError, WalResult};

/// Directory name prefix of checkpoints
pub const CHECKPOINT_PREFIX: &str = "checkpoint.";

/// Suffix marking a checkpoint still being written
pub const TMP_SUFFIX: &str = ".tmp";

/// Returns the path of segment `index` inside `dir`.
pub fn segment_name(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{:08}", index))
}

/// Returns the directory name of the checkpoint covering segments up to `index`.
pub fn checkpoint_dir_name(index: u64) -> String {
    format!("{}{:08}", CHECKPOINT_PREFIX, index)
}

/// Inclusive range of retained segment indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    /// Lowest retained index
    pub first: u64,
    /// Highest retained index
    pub last: u64,
}

impl SegmentRange {
    /// Number of segments in the range
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    /// A range always holds at least one segment
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `index` lies within the range
    pub fn contains(&self, index: u64) -> bool {
        self.first <= index && index <= self.last
    }
}

/// Location and coverage of a completed checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRef {
    /// Checkpoint directory
    pub dir: PathBuf,
    /// Highest segment index whose data the checkpoint consolidates
    pub index: u64,
}

/// Parses an all-digit file name into an index.
fn parse_index(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

fn read_dir_entries(dir: &Path) -> WalResult<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        WalError::read_failed(format!("Failed to list directory: {}", dir.display()), e)
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            WalError::read_failed(format!("Failed to read entry in: {}", dir.display()), e)
        })?;
        // Non UTF-8 names cannot be segments or checkpoints
        if let Some(name) = entry.file_name().to_str() {
            out.push((name.to_string(), entry.path()));
        }
    }
    Ok(out)
}

/// Lists the segment file indexes in `dir`, ascending.
pub fn list_segment_indexes(dir: &Path) -> WalResult<Vec<u64>> {
    let mut indexes: Vec<u64> = read_dir_entries(dir)?
        .into_iter()
        .filter(|(_, path)| path.is_file())
        .filter_map(|(name, _)| parse_index(&name))
        .collect();
    indexes.sort_unstable();
    Ok(indexes)
}

/// Returns the retained segment range of `dir`, or `None` if it holds no segments.
///
/// Retained segments must be contiguous; a gap means data was lost and is
/// reported as a layout error.
pub fn segment_range(dir: &Path) -> WalResult<Option<SegmentRange>> {
    let indexes = list_segment_indexes(dir)?;
    let (first, last) = match (indexes.first(), indexes.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Ok(None),
    };

    for pair in indexes.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(WalError::layout_invalid(format!(
                "Segments are not sequential in {}: {:08} follows {:08}",
                dir.display(),
                pair[1],
                pair[0]
            )));
        }
    }

    Ok(Some(SegmentRange { first, last }))
}

/// Finds the most recent completed checkpoint in `dir`.
///
/// Returns `Ok(None)` when no checkpoint exists.
pub fn last_checkpoint(dir: &Path) -> WalResult<Option<CheckpointRef>> {
    let mut latest: Option<CheckpointRef> = None;

    for (name, path) in read_dir_entries(dir)? {
        let Some(suffix) = name.strip_prefix(CHECKPOINT_PREFIX) else {
            continue;
        };
        if suffix.ends_with(TMP_SUFFIX) || !path.is_dir() {
            continue;
        }
        let Some(index) = parse_index(suffix) else {
            continue;
        };
        if latest.as_ref().map_or(true, |c| index > c.index) {
            latest = Some(CheckpointRef { dir: path, index });
        }
    }

    Ok(latest)
}
