//! Loki push API body encoding.
//!
//! ```json
//! {"streams":[{"stream":{"job":"mousetrap","type":"mouse","id":"1"},
//!              "values":[["1700000000000000000","msg=mouse"]]}]}
//! ```
//!
//! Only streams holding entries are included.  Bodies above a size
//! threshold are DEFLATE-compressed when that actually shrinks them; the
//! HTTP adapter then sets `Content-Encoding: deflate`.

extern crate alloc;
use alloc::vec::Vec;

use log::debug;
use miniz_oxide::deflate::compress_to_vec;
use serde::Serialize;

use super::stream::{Entry, LabelSet, Stream, Streams};

/// Minimum body size worth compressing (overhead outweighs benefit below).
const COMPRESS_THRESHOLD: usize = 128;

/// DEFLATE compression level (1-10, higher = better ratio, slower).
const COMPRESSION_LEVEL: u8 = 6;

#[derive(Serialize)]
struct PushRequest<'a> {
    streams: heapless::Vec<PushStream<'a>, 2>,
}

#[derive(Serialize)]
struct PushStream<'a> {
    stream: &'a LabelSet,
    values: &'a [Entry],
}

impl<'a> From<&'a Stream> for PushStream<'a> {
    fn from(s: &'a Stream) -> Self {
        Self { stream: s.labels(), values: s.entries() }
    }
}

/// Encoded request body, ready for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushBody {
    pub bytes: Vec<u8>,
    /// `true` when `bytes` is raw DEFLATE.
    pub deflated: bool,
}

impl PushBody {
    pub fn content_encoding(&self) -> Option<&'static str> {
        self.deflated.then_some("deflate")
    }
}

/// Serialise every non-empty stream.  `None` if there is nothing to send.
pub fn encode_json(streams: &Streams) -> Result<Option<Vec<u8>>, serde_json::Error> {
    let mut request = PushRequest { streams: heapless::Vec::new() };
    for s in streams.iter().filter(|s| !s.is_empty()) {
        // Capacity matches the number of streams in `Streams`.
        let _ = request.streams.push(PushStream::from(s));
    }
    if request.streams.is_empty() {
        return Ok(None);
    }
    serde_json::to_vec(&request).map(Some)
}

/// Compress a payload using DEFLATE.
///
/// Returns `Some(compressed_bytes)` if compression is beneficial
/// (output < input), or `None` if compression should be skipped.
pub fn compress(input: &[u8]) -> Option<Vec<u8>> {
    if input.len() < COMPRESS_THRESHOLD {
        return None;
    }
    let compressed = compress_to_vec(input, COMPRESSION_LEVEL);
    if compressed.len() >= input.len() {
        return None;
    }
    Some(compressed)
}

/// JSON-encode and, if worthwhile, compress.
pub fn encode(streams: &Streams) -> Result<Option<PushBody>, serde_json::Error> {
    let Some(json) = encode_json(streams)? else {
        return Ok(None);
    };
    let body = match compress(&json) {
        Some(bytes) => {
            debug!("push: {} -> {} bytes (deflate)", json.len(), bytes.len());
            PushBody { bytes, deflated: true }
        }
        None => PushBody { bytes: json, deflated: false },
    };
    Ok(Some(body))
}
