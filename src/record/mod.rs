//! WAL record codec
//!
//! Translates between raw record payloads and typed records:
//! series definitions, sample batches, exemplar batches, and series
//! reset markers.
//!
//! Decoding is pure: the same bytes always produce the same record, and
//! a record that violates its length or field constraints is rejected
//! as a whole.

mod decoder;
mod encoder;
mod errors;
mod types;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use errors::{DecodeError, DecodeResult};
pub use types::{Label, Labels, Record, RecordType, RefExemplar, RefSample, RefSeries};
