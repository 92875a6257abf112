//! Record decoding
//!
//! Decoding is a pure function of the record bytes. The batch decoders
//! append into caller-owned vectors so a replay loop can reuse its
//! buffers across records.

use super::errors::{DecodeError, DecodeResult};
use super::types::{Label, Labels, Record, RecordType, RefExemplar, RefSample, RefSeries};

/// Cursor over a record body
struct Decbuf<'a> {
    data: &'a [u8],
}

impl<'a> Decbuf<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn take(&mut self, n: usize, field: &'static str) -> DecodeResult<&'a [u8]> {
        if self.data.len() < n {
            return Err(DecodeError::Truncated {
                field,
                needed: n,
                remaining: self.data.len(),
            });
        }
        let data = self.data;
        let (head, tail) = data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn u32(&mut self, field: &'static str) -> DecodeResult<u32> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self, field: &'static str) -> DecodeResult<u64> {
        let b = self.take(8, field)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    fn i64(&mut self, field: &'static str) -> DecodeResult<i64> {
        self.u64(field).map(|v| v as i64)
    }

    fn f64(&mut self, field: &'static str) -> DecodeResult<f64> {
        self.u64(field).map(f64::from_bits)
    }

    fn string(&mut self, field: &'static str) -> DecodeResult<String> {
        let len = self.u32(field)? as usize;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    fn labels(&mut self) -> DecodeResult<Labels> {
        let count = self.u32("label count")? as usize;
        // Every label needs at least 8 bytes; cap the preallocation accordingly
        let mut labels = Vec::with_capacity(count.min(self.data.len() / 8));
        for _ in 0..count {
            let name = self.string("label name")?;
            let value = self.string("label value")?;
            labels.push(Label { name, value });
        }
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = labels.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(DecodeError::DuplicateLabel(pair[0].name.clone()));
        }
        Ok(labels.into())
    }
}

/// Translates raw records into typed records.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoder;

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    /// Reads the type tag of a record.
    ///
    /// # Errors
    ///
    /// `Empty` for a zero-length record, `InvalidType` for tags outside
    /// the valid range.
    pub fn record_type(&self, rec: &[u8]) -> DecodeResult<RecordType> {
        let tag = *rec.first().ok_or(DecodeError::Empty)?;
        RecordType::from_u8(tag).ok_or(DecodeError::InvalidType(tag))
    }

    fn body<'a>(&self, rec: &'a [u8], expected: RecordType) -> DecodeResult<Decbuf<'a>> {
        let actual = self.record_type(rec)?;
        if actual != expected {
            return Err(DecodeError::UnexpectedType { expected, actual });
        }
        Ok(Decbuf::new(&rec[1..]))
    }

    /// Decodes a series record, appending its entries to `out`.
    pub fn series(&self, rec: &[u8], out: &mut Vec<RefSeries>) -> DecodeResult<()> {
        let mut dec = self.body(rec, RecordType::Series)?;
        while !dec.is_empty() {
            let series_ref = dec.u64("series ref")?;
            let labels = dec.labels()?;
            out.push(RefSeries { series_ref, labels });
        }
        Ok(())
    }

    /// Decodes a samples record, appending its entries to `out`.
    pub fn samples(&self, rec: &[u8], out: &mut Vec<RefSample>) -> DecodeResult<()> {
        let mut dec = self.body(rec, RecordType::Samples)?;
        out.reserve(dec.data.len() / 24);
        while !dec.is_empty() {
            let series_ref = dec.u64("sample ref")?;
            let t = dec.i64("sample timestamp")?;
            let v = dec.f64("sample value")?;
            out.push(RefSample { series_ref, t, v });
        }
        Ok(())
    }

    /// Decodes an exemplars record, appending its entries to `out`.
    pub fn exemplars(&self, rec: &[u8], out: &mut Vec<RefExemplar>) -> DecodeResult<()> {
        let mut dec = self.body(rec, RecordType::Exemplars)?;
        while !dec.is_empty() {
            let series_ref = dec.u64("exemplar ref")?;
            let t = dec.i64("exemplar timestamp")?;
            let v = dec.f64("exemplar value")?;
            let labels = dec.labels()?;
            out.push(RefExemplar {
                series_ref,
                t,
                v,
                labels,
            });
        }
        Ok(())
    }

    /// Decodes a series reset record into its epoch.
    pub fn series_reset(&self, rec: &[u8]) -> DecodeResult<u64> {
        let mut dec = self.body(rec, RecordType::SeriesReset)?;
        let epoch = dec.u64("reset epoch")?;
        if !dec.is_empty() {
            return Err(DecodeError::TrailingBytes(dec.data.len()));
        }
        Ok(epoch)
    }

    /// Decodes any record into an owned [`Record`].
    pub fn decode(&self, rec: &[u8]) -> DecodeResult<Record> {
        match self.record_type(rec)? {
            RecordType::Series => {
                let mut out = Vec::new();
                self.series(rec, &mut out)?;
                Ok(Record::Series(out))
            }
            RecordType::Samples => {
                let mut out = Vec::new();
                self.samples(rec, &mut out)?;
                Ok(Record::Samples(out))
            }
            RecordType::Exemplars => {
                let mut out = Vec::new();
                self.exemplars(rec, &mut out)?;
                Ok(Record::Exemplars(out))
            }
            RecordType::SeriesReset => Ok(Record::SeriesReset {
                epoch: self.series_reset(rec)?,
            }),
            RecordType::Unknown(tag) => Ok(Record::Unknown { tag }),
        }
    }
}
