//! In-memory collector for replayed series and samples
//!
//! A single mutex guards both sequences, so an observer never sees a
//! batch half-appended. The lock is held only for the copy into the
//! accumulated vectors, never across I/O or decoding.

use parking_lot::Mutex;
use serde::Serialize;

use crate::record::{RefSample, RefSeries};

use super::sink::SeriesSampleSink;

/// Everything a collector accumulated, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectedData {
    /// Series definitions
    pub series: Vec<RefSeries>,
    /// Samples
    pub samples: Vec<RefSample>,
}

/// Thread-safe sink accumulating series and samples for handoff.
///
/// The collector does not implement exemplar retention or series reset;
/// replay counts exemplars as dropped and ignores resets for it.
///
/// Finalization is by ownership: [`WalDataCollector::into_data`] consumes
/// the collector, so no append can follow it. A collector shared through
/// an `Arc` is finalized with `Arc::try_unwrap` once every other handle
/// is gone.
#[derive(Debug, Default)]
pub struct WalDataCollector {
    data: Mutex<CollectedData>,
}

impl WalDataCollector {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the series collected so far.
    pub fn series(&self) -> Vec<RefSeries> {
        self.data.lock().series.clone()
    }

    /// Returns a copy of the samples collected so far.
    pub fn samples(&self) -> Vec<RefSample> {
        self.data.lock().samples.clone()
    }

    /// Number of series collected so far.
    pub fn series_len(&self) -> usize {
        self.data.lock().series.len()
    }

    /// Number of samples collected so far.
    pub fn samples_len(&self) -> usize {
        self.data.lock().samples.len()
    }

    /// Returns a consistent copy of both sequences.
    pub fn snapshot(&self) -> CollectedData {
        self.data.lock().clone()
    }

    /// Finalizes the collector and hands over its data.
    pub fn into_data(self) -> CollectedData {
        self.data.into_inner()
    }
}

impl SeriesSampleSink for WalDataCollector {
    fn append_samples(&self, samples: &[RefSample]) -> bool {
        self.data.lock().samples.extend_from_slice(samples);
        true
    }

    fn store_series(&self, series: &[RefSeries], _generation: u64) {
        self.data.lock().series.extend_from_slice(series);
    }
}
