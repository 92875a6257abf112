//! WAL replay
//!
//! Replays the latest checkpoint, then every retained segment after it,
//! in index order, into a sink.
//!
//! Order:
//! 1. Locate the latest completed checkpoint; if present, replay it
//! 2. List retained segments
//! 3. Replay segments `checkpoint + 1 ..= last` (or `first ..= last`
//!    when there is no checkpoint)
//!
//! Each checkpoint or segment is closed before the next is opened. The
//! first error stops replay: records already applied stay applied, and a
//! close failure is reported only if reading had succeeded.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::record::{DecodeResult, Decoder, RecordType, RefExemplar, RefSample, RefSeries};
use crate::wal::{CheckpointRef, SegmentRange, WalDir, WalResult, DEFAULT_MAX_RECORD_BYTES};

use super::errors::{RecoveryError, RecoveryResult, ReplaySource};
use super::sink::SeriesSampleSink;

/// Forward-only stream of raw records.
pub trait RecordSource {
    /// Returns the next record, `None` at a clean end of stream.
    fn next_record(&mut self) -> WalResult<Option<&[u8]>>;

    /// Offset of the most recently returned record within the stream.
    fn record_offset(&self) -> u64;

    /// Releases the stream.
    fn close(self) -> WalResult<()>;
}

/// Read access to a WAL directory's checkpoints and segments.
pub trait WalAccess {
    type Source: RecordSource;

    /// Latest completed checkpoint, `None` if there is none.
    fn last_checkpoint(&self) -> WalResult<Option<CheckpointRef>>;

    /// Retained segment range, `None` if there are no segments.
    fn segment_range(&self) -> WalResult<Option<SegmentRange>>;

    /// Opens a checkpoint as one record stream.
    fn open_checkpoint(&self, checkpoint: &CheckpointRef) -> WalResult<Self::Source>;

    /// Opens segment `index`.
    fn open_segment(&self, index: u64) -> WalResult<Self::Source>;
}

/// Replay tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Frames with a larger declared length are treated as corruption
    pub max_record_bytes: u32,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
        }
    }
}

/// Statistics from WAL replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Index of the checkpoint replayed, if any
    pub checkpoint: Option<u64>,
    /// Segments replayed, in order
    pub segments: Vec<u64>,
    /// Records read, including ignored ones
    pub records: u64,
    /// Series definitions stored
    pub series: u64,
    /// Samples decoded
    pub samples: u64,
    /// Samples in batches the sink rejected
    pub samples_rejected: u64,
    /// Exemplars decoded
    pub exemplars: u64,
    /// Exemplars in batches the sink rejected
    pub exemplars_rejected: u64,
    /// Exemplars discarded because the sink does not retain them
    pub exemplars_dropped: u64,
    /// Series reset markers read
    pub series_resets: u64,
    /// Records with a reserved type tag
    pub unknown_records: u64,
}

/// Per-stream decode buffers, reused across records
#[derive(Default)]
struct Scratch {
    series: Vec<RefSeries>,
    samples: Vec<RefSample>,
    exemplars: Vec<RefExemplar>,
}

/// Drives replay of a WAL directory into a sink.
pub struct WalReplayer<'a, S: SeriesSampleSink + ?Sized> {
    sink: &'a S,
    options: ReplayOptions,
    decoder: Decoder,
}

impl<'a, S: SeriesSampleSink + ?Sized> WalReplayer<'a, S> {
    pub fn new(sink: &'a S) -> Self {
        Self {
            sink,
            options: ReplayOptions::default(),
            decoder: Decoder::new(),
        }
    }

    pub fn with_options(mut self, options: ReplayOptions) -> Self {
        self.options = options;
        self
    }

    /// Opens the WAL directory at `dir` and replays it.
    ///
    /// # Errors
    ///
    /// `REPLAY_OPEN_FAILED` if the directory is missing or unreadable; any
    /// other code from [`WalReplayer::replay_from`].
    pub fn replay(&self, dir: impl AsRef<Path>) -> RecoveryResult<ReplayStats> {
        let dir = dir.as_ref();
        info!(dir = %dir.display(), "replaying WAL");

        let wal = WalDir::open_with(dir, self.options.max_record_bytes)
            .map_err(|e| RecoveryError::open_failed(dir, e))?;
        self.replay_from(&wal)
    }

    /// Replays the latest checkpoint and all later segments of `wal`.
    pub fn replay_from<W: WalAccess>(&self, wal: &W) -> RecoveryResult<ReplayStats> {
        let mut stats = ReplayStats::default();

        let checkpoint = wal
            .last_checkpoint()
            .map_err(RecoveryError::checkpoint_lookup_failed)?;

        if let Some(ref checkpoint) = checkpoint {
            let location = ReplaySource::Checkpoint(checkpoint.index);
            info!(checkpoint = checkpoint.index, "replaying checkpoint");

            let source = wal
                .open_checkpoint(checkpoint)
                .map_err(|e| RecoveryError::segment_open_failed(location, e))?;
            self.replay_source(source, location, &mut stats)?;
            stats.checkpoint = Some(checkpoint.index);
        } else {
            debug!("no checkpoint found");
        }

        let range = wal
            .segment_range()
            .map_err(RecoveryError::segment_list_failed)?;

        if let Some(range) = range {
            let start = match checkpoint {
                Some(ref checkpoint) => checkpoint.index.checked_add(1),
                None => Some(range.first),
            };
            if let Some(start) = start {
                for index in start..=range.last {
                    let location = ReplaySource::Segment(index);
                    debug!(segment = index, "replaying segment");

                    let source = wal
                        .open_segment(index)
                        .map_err(|e| RecoveryError::segment_open_failed(location, e))?;
                    self.replay_source(source, location, &mut stats)?;
                    stats.segments.push(index);
                }
            }
        }

        info!(
            checkpoint = ?stats.checkpoint,
            segments = stats.segments.len(),
            records = stats.records,
            series = stats.series,
            samples = stats.samples,
            "WAL replay complete"
        );
        Ok(stats)
    }

    /// Replays one stream and closes it. A read or decode error takes
    /// precedence over a close error.
    fn replay_source<R: RecordSource>(
        &self,
        mut source: R,
        location: ReplaySource,
        stats: &mut ReplayStats,
    ) -> RecoveryResult<()> {
        let replayed = self.replay_records(&mut source, location, stats);
        let closed = source.close();

        match (replayed, closed) {
            (Err(e), _) => Err(e),
            (Ok(()), Err(e)) => Err(RecoveryError::segment_close_failed(location, e)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn replay_records<R: RecordSource>(
        &self,
        source: &mut R,
        location: ReplaySource,
        stats: &mut ReplayStats,
    ) -> RecoveryResult<()> {
        let mut scratch = Scratch::default();

        loop {
            let rec = match source.next_record() {
                Ok(Some(rec)) => rec,
                Ok(None) => return Ok(()),
                Err(e) => return Err(RecoveryError::segment_read_failed(location, e)),
            };

            let applied = self.apply_record(rec, location, &mut scratch, stats);
            if let Err(e) = applied {
                return Err(RecoveryError::malformed_record(
                    location,
                    source.record_offset(),
                    e,
                ));
            }
            stats.records += 1;
        }
    }

    fn apply_record(
        &self,
        rec: &[u8],
        location: ReplaySource,
        scratch: &mut Scratch,
        stats: &mut ReplayStats,
    ) -> DecodeResult<()> {
        match self.decoder.record_type(rec)? {
            RecordType::Series => {
                scratch.series.clear();
                self.decoder.series(rec, &mut scratch.series)?;
                self.sink.store_series(&scratch.series, location.index());
                stats.series += scratch.series.len() as u64;
            }
            RecordType::Samples => {
                scratch.samples.clear();
                self.decoder.samples(rec, &mut scratch.samples)?;
                let count = scratch.samples.len() as u64;
                stats.samples += count;
                if !self.sink.append_samples(&scratch.samples) {
                    warn!(%location, count, "sink rejected sample batch");
                    stats.samples_rejected += count;
                }
            }
            RecordType::Exemplars => {
                scratch.exemplars.clear();
                self.decoder.exemplars(rec, &mut scratch.exemplars)?;
                let count = scratch.exemplars.len() as u64;
                stats.exemplars += count;
                match self.sink.exemplar_sink() {
                    Some(exemplar_sink) => {
                        if !exemplar_sink.append_exemplars(&scratch.exemplars) {
                            warn!(%location, count, "sink rejected exemplar batch");
                            stats.exemplars_rejected += count;
                        }
                    }
                    None => stats.exemplars_dropped += count,
                }
            }
            RecordType::SeriesReset => {
                let epoch = self.decoder.series_reset(rec)?;
                if let Some(resettable) = self.sink.resettable_sink() {
                    resettable.reset_series(epoch);
                }
                stats.series_resets += 1;
            }
            RecordType::Unknown(tag) => {
                trace!(%location, tag, "skipping record with reserved type");
                stats.unknown_records += 1;
            }
        }
        Ok(())
    }
}
