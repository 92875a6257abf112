//! Typed WAL records

use std::fmt;

use serde::Serialize;

/// A single label pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Label value
    pub value: String,
}

impl Label {
    /// Create a new label
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A label set, kept sorted by name with each name at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Labels(Vec<Label>);

impl Labels {
    /// Creates an empty label set
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a label set from name/value pairs.
    ///
    /// If a name repeats, its first value is kept.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| Label::new(name, value))
            .collect::<Vec<_>>()
            .into()
    }

    /// Returns the value of label `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|i| self.0[i].value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }
}

impl From<Vec<Label>> for Labels {
    /// Sorts by name and drops repeated names, keeping the first value given.
    fn from(mut labels: Vec<Label>) -> Self {
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        labels.dedup_by(|later, earlier| later.name == earlier.name);
        Self(labels)
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", label.name, label.value)?;
        }
        write!(f, "}}")
    }
}

/// Series definition: binds a reference id to a label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefSeries {
    /// Series reference id
    pub series_ref: u64,
    /// Series labels
    pub labels: Labels,
}

/// One sample of a previously defined series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefSample {
    /// Series reference id
    pub series_ref: u64,
    /// Timestamp in milliseconds
    pub t: i64,
    /// Sample value
    pub v: f64,
}

/// An exemplar attached to a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefExemplar {
    /// Series reference id
    pub series_ref: u64,
    /// Timestamp in milliseconds
    pub t: i64,
    /// Exemplar value
    pub v: f64,
    /// Exemplar labels (e.g. trace id)
    pub labels: Labels,
}

/// Record kind as stored in the leading tag byte.
///
/// Tags `5..=127` are reserved for record kinds added later; readers treat
/// them as [`RecordType::Unknown`] and skip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Series,
    Samples,
    Exemplars,
    SeriesReset,
    /// Reserved tag without a decoder
    Unknown(u8),
}

impl RecordType {
    /// Highest tag that may appear in a valid record
    pub const MAX_TAG: u8 = 127;

    /// Maps a tag byte to a record type; `None` for invalid tags.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(RecordType::Series),
            2 => Some(RecordType::Samples),
            3 => Some(RecordType::Exemplars),
            4 => Some(RecordType::SeriesReset),
            5..=Self::MAX_TAG => Some(RecordType::Unknown(tag)),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            RecordType::Series => 1,
            RecordType::Samples => 2,
            RecordType::Exemplars => 3,
            RecordType::SeriesReset => 4,
            RecordType::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Series => write!(f, "series"),
            RecordType::Samples => write!(f, "samples"),
            RecordType::Exemplars => write!(f, "exemplars"),
            RecordType::SeriesReset => write!(f, "series_reset"),
            RecordType::Unknown(tag) => write!(f, "unknown({})", tag),
        }
    }
}

/// A decoded WAL record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Batch of series definitions
    Series(Vec<RefSeries>),
    /// Batch of samples
    Samples(Vec<RefSample>),
    /// Batch of exemplars
    Exemplars(Vec<RefExemplar>),
    /// Series reference ids below `epoch` may be considered stale
    SeriesReset { epoch: u64 },
    /// Valid record of a kind this reader does not interpret
    Unknown { tag: u8 },
}

impl Record {
    /// Returns the type of this record
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Series(_) => RecordType::Series,
            Record::Samples(_) => RecordType::Samples,
            Record::Exemplars(_) => RecordType::Exemplars,
            Record::SeriesReset { .. } => RecordType::SeriesReset,
            Record::Unknown { tag } => RecordType::Unknown(*tag),
        }
    }
}
