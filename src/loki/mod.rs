//! Grafana Loki client-side model: label sets, bounded streams, and the
//! push body codec.  The HTTP transport lives in
//! [`adapters::loki_client`](crate::adapters::loki_client).

pub mod push;
pub mod stream;

pub use push::{PushBody, encode};
pub use stream::{Entry, LabelSet, Stream, StreamError, StreamKind, Streams};
