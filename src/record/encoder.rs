//! Record encoding
//!
//! Layout (all integers little-endian, fixed width):
//! - Tag (u8)
//! - Series entry: ref (u64), label count (u32), labels
//! - Sample entry: ref (u64), t (i64), v (f64 bits)
//! - Exemplar entry: ref (u64), t (i64), v (f64 bits), labels
//! - Series reset: epoch (u64)
//!
//! A label is `name_len (u32), name, value_len (u32), value`.

use super::types::{Labels, RecordType, RefExemplar, RefSample, RefSeries};

/// Encodes typed batches into raw records.
#[derive(Debug, Default, Clone, Copy)]
pub struct Encoder;

impl Encoder {
    pub fn new() -> Self {
        Self
    }

    /// Encodes a batch of series definitions.
    pub fn series(&self, series: &[RefSeries]) -> Vec<u8> {
        let mut buf = vec![RecordType::Series.as_u8()];
        for s in series {
            buf.extend_from_slice(&s.series_ref.to_le_bytes());
            put_labels(&mut buf, &s.labels);
        }
        buf
    }

    /// Encodes a batch of samples.
    pub fn samples(&self, samples: &[RefSample]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + samples.len() * 24);
        buf.push(RecordType::Samples.as_u8());
        for s in samples {
            buf.extend_from_slice(&s.series_ref.to_le_bytes());
            buf.extend_from_slice(&s.t.to_le_bytes());
            buf.extend_from_slice(&s.v.to_bits().to_le_bytes());
        }
        buf
    }

    /// Encodes a batch of exemplars.
    pub fn exemplars(&self, exemplars: &[RefExemplar]) -> Vec<u8> {
        let mut buf = vec![RecordType::Exemplars.as_u8()];
        for e in exemplars {
            buf.extend_from_slice(&e.series_ref.to_le_bytes());
            buf.extend_from_slice(&e.t.to_le_bytes());
            buf.extend_from_slice(&e.v.to_bits().to_le_bytes());
            put_labels(&mut buf, &e.labels);
        }
        buf
    }

    /// Encodes a series reset marker.
    pub fn series_reset(&self, epoch: u64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(9);
        buf.push(RecordType::SeriesReset.as_u8());
        buf.extend_from_slice(&epoch.to_le_bytes());
        buf
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn put_labels(buf: &mut Vec<u8>, labels: &Labels) {
    buf.extend_from_slice(&(labels.len() as u32).to_le_bytes());
    for label in labels {
        put_str(buf, &label.name);
        put_str(buf, &label.value);
    }
}
