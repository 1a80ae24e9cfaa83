//! Loki log streams.
//!
//! A stream is a fixed label set plus a bounded queue of timestamped
//! entries.  The node owns exactly two, `heartbeat` and `mouse`, each
//! holding at most one entry per cycle.

use core::fmt;

use heapless::{String, Vec};
use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};

use crate::compose::HEARTBEAT_CAPACITY;

pub const JOB_LABEL: &str = "mousetrap";

/// Entries a stream can hold between sends.
pub const ENTRIES_PER_STREAM: usize = 1;

/// Body length limits.  A limit counts a terminator slot, so accepted
/// bodies are strictly shorter.
pub const HEARTBEAT_MAX_LEN: usize = 100;
pub const MOUSE_MAX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Heartbeat,
    Mouse,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Mouse => "mouse",
        }
    }
}

/// `{job="mousetrap",type="<kind>",id="<node id>"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet {
    pub job: &'static str,
    pub kind: StreamKind,
    pub id: &'static str,
}

impl LabelSet {
    pub fn new(kind: StreamKind, id: &'static str) -> Self {
        Self { job: JOB_LABEL, kind, id }
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{job=\"{}\",type=\"{}\",id=\"{}\"}}", self.job, self.kind.as_str(), self.id)
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("job", self.job)?;
        map.serialize_entry("type", self.kind.as_str())?;
        map.serialize_entry("id", self.id)?;
        map.end()
    }
}

/// One log line.  Serialises as Loki's `["<ns>", "<line>"]` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub timestamp_nanos: u64,
    pub body: String<HEARTBEAT_CAPACITY>,
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use core::fmt::Write;
        // u64::MAX has 20 digits.
        let mut ts: String<20> = String::new();
        write!(ts, "{}", self.timestamp_nanos).map_err(serde::ser::Error::custom)?;
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(ts.as_str())?;
        pair.serialize_element(self.body.as_str())?;
        pair.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// Body is not strictly shorter than the stream's limit.
    BodyTooLong { len: usize, max: usize },
    /// The stream already holds its maximum number of entries.
    Full,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyTooLong { len, max } => {
                write!(f, "entry body of {} chars exceeds stream limit of {}", len, max - 1)
            }
            Self::Full => write!(f, "stream is full"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stream {
    labels: LabelSet,
    max_body_len: usize,
    entries: Vec<Entry, ENTRIES_PER_STREAM>,
}

impl Stream {
    pub fn new(labels: LabelSet, max_body_len: usize) -> Self {
        Self {
            labels,
            max_body_len: max_body_len.min(HEARTBEAT_CAPACITY + 1),
            entries: Vec::new(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_entry(&mut self, timestamp_nanos: u64, body: &str) -> Result<(), StreamError> {
        if body.len() >= self.max_body_len {
            return Err(StreamError::BodyTooLong { len: body.len(), max: self.max_body_len });
        }
        let mut text = String::new();
        // Cannot fail: max_body_len is capped at capacity + 1.
        text.push_str(body)
            .map_err(|()| StreamError::BodyTooLong { len: body.len(), max: self.max_body_len })?;
        self.entries
            .push(Entry { timestamp_nanos, body: text })
            .map_err(|_| StreamError::Full)
    }

    pub fn reset_entries(&mut self) {
        self.entries.clear();
    }
}

/// The node's two streams.  Cycle-scoped: built fresh on every wake.
#[derive(Debug, Clone)]
pub struct Streams {
    pub heartbeat: Stream,
    pub mouse: Stream,
}

impl Streams {
    pub fn new(node_id: &'static str) -> Self {
        Self {
            heartbeat: Stream::new(LabelSet::new(StreamKind::Heartbeat, node_id), HEARTBEAT_MAX_LEN),
            mouse: Stream::new(LabelSet::new(StreamKind::Mouse, node_id), MOUSE_MAX_LEN),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stream> {
        [&self.heartbeat, &self.mouse].into_iter()
    }

    /// No stream holds an entry.
    pub fn is_empty(&self) -> bool {
        self.iter().all(Stream::is_empty)
    }

    pub fn entry_count(&self) -> usize {
        self.iter().map(|s| s.entries().len()).sum()
    }

    pub fn reset_entries(&mut self) {
        self.heartbeat.reset_entries();
        self.mouse.reset_entries();
    }
}
