//! Incremental synchronization of format-preserving trees between two
//! processes.
//!
//! A [`SendSession`] encodes a tree as a stream of [`Op`]s relative to the
//! version it sent last; a [`ReceiveSession`] applies the stream to its own
//! copy of that version. Unchanged subtrees cost one operation and keep their
//! identity on the receiving side.

mod config;
mod edit;
mod error;
mod markers;
mod op;
mod padding;
mod receive;
mod registry;
mod send;
mod session;
mod types;

pub use config::SyncConfig;
pub use error::{Desync, SyncError, SyncResult};
pub use op::{Batch, BatchSink, BatchSource, Op, render_trace};
pub use receive::{FromWire, ReceiveQueue};
pub use registry::{
    CodecRegistry, DecodeFn, EncodeFn, MarkerCodec, MarkerDecodeFn, MarkerEncodeFn, NodeCodec,
};
pub use send::{SendQueue, WireValue};
pub use session::{ReceiveSession, SendSession, UnitOutcome};
