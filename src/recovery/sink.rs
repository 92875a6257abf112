//! Destinations for replayed data
//!
//! Every sink accepts series definitions and samples. Exemplar retention
//! and series reset handling are optional capabilities a sink advertises
//! through [`SeriesSampleSink::exemplar_sink`] and
//! [`SeriesSampleSink::resettable_sink`]; replay consults them per record.
//!
//! Sinks take `&self` and must synchronize internally: one instance may be
//! shared between replay and other producers.

use crate::record::{RefExemplar, RefSample, RefSeries};

/// Required sink capability: series definitions and samples.
pub trait SeriesSampleSink {
    /// Appends a batch of samples. Returns `false` if the batch was rejected.
    fn append_samples(&self, samples: &[RefSample]) -> bool;

    /// Stores a batch of series definitions.
    ///
    /// `generation` is the index of the checkpoint or segment the batch was
    /// read from.
    fn store_series(&self, series: &[RefSeries], generation: u64);

    /// Exemplar capability, if this sink retains exemplars.
    fn exemplar_sink(&self) -> Option<&dyn ExemplarSink> {
        None
    }

    /// Series reset capability, if this sink garbage-collects stale ids.
    fn resettable_sink(&self) -> Option<&dyn ResettableSink> {
        None
    }
}

/// Optional capability: exemplar retention.
pub trait ExemplarSink {
    /// Appends a batch of exemplars. Returns `false` if the batch was rejected.
    fn append_exemplars(&self, exemplars: &[RefExemplar]) -> bool;
}

/// Optional capability: series reset handling.
pub trait ResettableSink {
    /// Series reference ids below `epoch` may be considered stale.
    fn reset_series(&self, epoch: u64);
}
