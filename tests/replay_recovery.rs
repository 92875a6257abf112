//! WAL Replay Recovery Tests
//!
//! Tests for replay guarantees on real WAL directories:
//! - Checkpoint data is replayed before any later segment
//! - Segments are replayed once each, in increasing index order
//! - Without a checkpoint, replay starts at the lowest retained segment
//! - Malformed or corrupt data halts replay; earlier records stay applied
//! - A missing WAL directory fails before the sink is touched

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use walreplay::record::{Encoder, Labels, RefSample, RefSeries};
use walreplay::recovery::{RecoveryErrorCode, ReplaySource, WalDataCollector, WalReplayer};
use walreplay::wal::{
    encode_frame, segment_name, sub_directory, CheckpointWriter, WalErrorCode, WalWriter,
    DEFAULT_MAX_RECORD_BYTES,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn series(series_ref: u64, name: &str) -> RefSeries {
    RefSeries {
        series_ref,
        labels: Labels::from_pairs([("__name__", name)]),
    }
}

fn sample(series_ref: u64, t: i64, v: f64) -> RefSample {
    RefSample { series_ref, t, v }
}

/// Writes a segment file directly, bypassing the writer's numbering.
fn write_segment(wal_dir: &Path, index: u64, records: &[Vec<u8>]) {
    fs::create_dir_all(wal_dir).unwrap();
    let mut data = Vec::new();
    for rec in records {
        data.extend_from_slice(&encode_frame(rec).unwrap());
    }
    fs::write(segment_name(wal_dir, index), data).unwrap();
}

fn sample_times(collector: &WalDataCollector) -> Vec<i64> {
    collector.samples().iter().map(|s| s.t).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

/// No checkpoint, one segment with a series followed by a sample batch.
#[test]
fn test_single_segment_without_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = sub_directory(temp_dir.path());
    let enc = Encoder::new();

    {
        let mut writer = WalWriter::open(&wal_dir).unwrap();
        writer.log(&enc.series(&[series(1, "up")])).unwrap();
        writer.log(&enc.samples(&[sample(1, 100, 1.0)])).unwrap();
    }

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(&wal_dir).unwrap();
    assert_eq!(stats.checkpoint, None);
    assert_eq!(stats.segments, vec![0]);

    let data = collector.into_data();
    assert_eq!(data.series, vec![series(1, "up")]);
    assert_eq!(data.samples, vec![sample(1, 100, 1.0)]);
}

/// Checkpoint 0 holds a series; segment 1 holds a sample for it.
#[test]
fn test_checkpoint_then_segment() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = sub_directory(temp_dir.path());
    let enc = Encoder::new();

    let mut checkpoint = CheckpointWriter::create(&wal_dir, 0).unwrap();
    checkpoint.log(&enc.series(&[series(2, "load")])).unwrap();
    checkpoint.commit().unwrap();
    write_segment(&wal_dir, 1, &[enc.samples(&[sample(2, 200, 5.0)])]);

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(&wal_dir).unwrap();
    assert_eq!(stats.checkpoint, Some(0));
    assert_eq!(stats.segments, vec![1]);

    let data = collector.into_data();
    assert_eq!(data.series, vec![series(2, "load")]);
    assert_eq!(data.samples, vec![sample(2, 200, 5.0)]);
}

/// A checkpoint with no later segments replays on its own.
#[test]
fn test_checkpoint_without_segments() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = sub_directory(temp_dir.path());
    let enc = Encoder::new();

    let mut checkpoint = CheckpointWriter::create(&wal_dir, 5).unwrap();
    checkpoint.log(&enc.series(&[series(3, "cpu")])).unwrap();
    checkpoint.log(&enc.samples(&[sample(3, 50, 0.5)])).unwrap();
    checkpoint.commit().unwrap();

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(&wal_dir).unwrap();
    assert_eq!(stats.checkpoint, Some(5));
    assert!(stats.segments.is_empty());

    let data = collector.into_data();
    assert_eq!(data.series, vec![series(3, "cpu")]);
    assert_eq!(data.samples, vec![sample(3, 50, 0.5)]);
}

/// A record too large to replay is refused at write time, and the WAL
/// written around it replays cleanly.
#[test]
fn test_oversize_record_refused_by_writer() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    {
        let mut writer = WalWriter::open(wal_dir).unwrap();
        writer.log(&enc.samples(&[sample(1, 1, 0.0)])).unwrap();
        let err = writer
            .log(&vec![42u8; DEFAULT_MAX_RECORD_BYTES as usize + 1])
            .unwrap_err();
        assert_eq!(err.code(), WalErrorCode::RecordTooLarge);
        writer.log(&enc.samples(&[sample(1, 2, 0.0)])).unwrap();
    }

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(wal_dir).unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(sample_times(&collector), vec![1, 2]);
}

/// A record with an invalid type tag halts replay after the valid prefix.
#[test]
fn test_invalid_record_type_halts_replay() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = sub_directory(temp_dir.path());
    let enc = Encoder::new();

    write_segment(
        &wal_dir,
        0,
        &[
            enc.series(&[series(1, "up")]),
            enc.samples(&[sample(1, 1, 1.0)]),
            vec![0xff, 0x01],
            enc.samples(&[sample(1, 2, 2.0)]),
        ],
    );
    write_segment(&wal_dir, 1, &[enc.samples(&[sample(1, 3, 3.0)])]);

    let collector = WalDataCollector::new();
    let err = WalReplayer::new(&collector).replay(&wal_dir).unwrap_err();

    assert_eq!(err.code(), RecoveryErrorCode::MalformedRecord);
    assert_eq!(err.location(), Some(ReplaySource::Segment(0)));
    assert_eq!(collector.series_len(), 1);
    assert_eq!(sample_times(&collector), vec![1]);
}

/// A missing WAL directory fails immediately.
#[test]
fn test_missing_directory() {
    let temp_dir = TempDir::new().unwrap();

    let collector = WalDataCollector::new();
    let err = WalReplayer::new(&collector)
        .replay(sub_directory(temp_dir.path()))
        .unwrap_err();

    assert_eq!(err.code(), RecoveryErrorCode::OpenFailed);
    assert_eq!(collector.series_len(), 0);
    assert_eq!(collector.samples_len(), 0);
}

// =============================================================================
// Ordering
// =============================================================================

/// Checkpoint k, then k+1..=n, each exactly once.
#[test]
fn test_segments_after_checkpoint_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    for i in 0..6u64 {
        write_segment(wal_dir, i, &[enc.samples(&[sample(1, i as i64, 0.0)])]);
    }
    let mut checkpoint = CheckpointWriter::create(wal_dir, 2).unwrap();
    checkpoint.log(&enc.samples(&[sample(1, -1, 0.0)])).unwrap();
    checkpoint.commit().unwrap();

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(wal_dir).unwrap();

    assert_eq!(stats.checkpoint, Some(2));
    assert_eq!(stats.segments, vec![3, 4, 5]);
    assert_eq!(sample_times(&collector), vec![-1, 3, 4, 5]);
}

/// Only the latest completed checkpoint is used; unfinished ones are ignored.
#[test]
fn test_latest_completed_checkpoint_wins() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    for i in 0..5u64 {
        write_segment(wal_dir, i, &[enc.samples(&[sample(1, i as i64, 0.0)])]);
    }
    for index in [1u64, 2] {
        let mut checkpoint = CheckpointWriter::create(wal_dir, index).unwrap();
        checkpoint
            .log(&enc.samples(&[sample(1, 100 + index as i64, 0.0)]))
            .unwrap();
        checkpoint.commit().unwrap();
    }
    // Abandoned checkpoint write
    let mut unfinished = CheckpointWriter::create(wal_dir, 4).unwrap();
    unfinished.log(&enc.samples(&[sample(1, 999, 0.0)])).unwrap();
    drop(unfinished);

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(wal_dir).unwrap();

    assert_eq!(stats.checkpoint, Some(2));
    assert_eq!(sample_times(&collector), vec![102, 3, 4]);
}

/// Without a checkpoint, replay starts at the lowest retained segment.
#[test]
fn test_no_checkpoint_starts_at_lowest_segment() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    for i in 7..10u64 {
        write_segment(wal_dir, i, &[enc.samples(&[sample(1, i as i64, 0.0)])]);
    }

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(wal_dir).unwrap();

    assert_eq!(stats.segments, vec![7, 8, 9]);
    assert_eq!(sample_times(&collector), vec![7, 8, 9]);
}

/// Writer-rolled segments replay as one continuous history.
#[test]
fn test_rolled_segments_replay_in_write_order() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    {
        // Small segments force a roll every couple of records
        let mut writer = WalWriter::open_with(wal_dir, 80).unwrap();
        for t in 0..10 {
            writer.log(&enc.samples(&[sample(1, t, 0.0)])).unwrap();
        }
        assert!(writer.segment_index() > 0);
    }

    let collector = WalDataCollector::new();
    let stats = WalReplayer::new(&collector).replay(wal_dir).unwrap();

    assert!(stats.segments.len() > 1);
    assert_eq!(sample_times(&collector), (0..10).collect::<Vec<_>>());
}

// =============================================================================
// Halt on corruption
// =============================================================================

/// A torn tail is reported with its offset; the records before it stay applied.
#[test]
fn test_torn_tail_halts_with_offset() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    let first = enc.samples(&[sample(1, 1, 0.0)]);
    write_segment(wal_dir, 0, &[first.clone()]);
    let mut file = OpenOptions::new()
        .append(true)
        .open(segment_name(wal_dir, 0))
        .unwrap();
    file.write_all(&encode_frame(&first).unwrap()[..10]).unwrap();
    drop(file);

    let collector = WalDataCollector::new();
    let err = WalReplayer::new(&collector).replay(wal_dir).unwrap_err();

    assert_eq!(err.code(), RecoveryErrorCode::SegmentReadFailed);
    assert_eq!(err.offset(), Some(8 + first.len() as u64));
    assert_eq!(sample_times(&collector), vec![1]);
}

/// A missing segment after the checkpoint is an open failure.
#[test]
fn test_gap_after_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    let mut checkpoint = CheckpointWriter::create(wal_dir, 3).unwrap();
    checkpoint.log(&enc.samples(&[sample(1, 0, 0.0)])).unwrap();
    checkpoint.commit().unwrap();
    write_segment(wal_dir, 5, &[enc.samples(&[sample(1, 5, 0.0)])]);

    let collector = WalDataCollector::new();
    let err = WalReplayer::new(&collector).replay(wal_dir).unwrap_err();

    assert_eq!(err.code(), RecoveryErrorCode::SegmentOpenFailed);
    assert_eq!(err.location(), Some(ReplaySource::Segment(4)));
    assert_eq!(sample_times(&collector), vec![0]);
}

/// Non-contiguous retained segments cannot be listed.
#[test]
fn test_gap_between_segments() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    write_segment(wal_dir, 0, &[]);
    write_segment(wal_dir, 2, &[]);

    let collector = WalDataCollector::new();
    let err = WalReplayer::new(&collector).replay(wal_dir).unwrap_err();
    assert_eq!(err.code(), RecoveryErrorCode::SegmentListFailed);
}

/// Replaying the same directory twice yields identical data.
#[test]
fn test_replay_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let wal_dir = temp_dir.path();
    let enc = Encoder::new();

    {
        let mut writer = WalWriter::open(wal_dir).unwrap();
        for i in 0..20u64 {
            writer.log(&enc.series(&[series(i, "m")])).unwrap();
            writer
                .log(&enc.samples(&[sample(i, i as i64, i as f64 / 3.0)]))
                .unwrap();
        }
    }

    let first = WalDataCollector::new();
    let second = WalDataCollector::new();
    let stats1 = WalReplayer::new(&first).replay(wal_dir).unwrap();
    let stats2 = WalReplayer::new(&second).replay(wal_dir).unwrap();

    assert_eq!(stats1, stats2);
    assert_eq!(first.into_data(), second.into_data());
}
