//! Wire operations and their framing.
//!
//! The stream carries no field names: the meaning of each primitive is fixed
//! by the position at which the paired codec functions read and write it.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SyncResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// The attribute equals the receiver's cached value.
    Unchanged,
    /// The attribute changed; its delta against the cached value follows.
    Changed,
    /// The attribute is set where there was no value; a full encoding follows.
    ChangedFromNull,
    /// The attribute became null.
    ChangedToNull,

    /// Reuse the next `n` cached list elements.
    Keep(u32),
    /// Skip the next `n` cached list elements.
    Delete(u32),
    /// A new list element follows.
    Insert,
    /// The next cached list element changed; its delta follows.
    Update,
    /// Reuse the cached list element at the given position, followed by its delta.
    Move(u32),
    EndList,

    Str(Box<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Id([u8; 16]),

    /// A type already defined in this session.
    TypeRef(u32),
    /// Defines the next type reference: signature, kind and fields follow.
    TypeDef(u32),

    EndUnit,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Unchanged => f.write_str("unchanged"),
            Op::Changed => f.write_str("changed"),
            Op::ChangedFromNull => f.write_str("changed-from-null"),
            Op::ChangedToNull => f.write_str("changed-to-null"),
            Op::Keep(n) => write!(f, "keep {n}"),
            Op::Delete(n) => write!(f, "delete {n}"),
            Op::Insert => f.write_str("insert"),
            Op::Update => f.write_str("update"),
            Op::Move(index) => write!(f, "move {index}"),
            Op::EndList => f.write_str("end-list"),
            Op::Str(value) => write!(f, "str {value:?}"),
            Op::Int(value) => write!(f, "int {value}"),
            Op::Float(value) => write!(f, "float {value}"),
            Op::Bool(value) => write!(f, "bool {value}"),
            Op::Bytes(bytes) => write!(f, "bytes[{}]", bytes.len()),
            Op::Id(_) => f.write_str("id"),
            Op::TypeRef(index) => write!(f, "type-ref {index}"),
            Op::TypeDef(index) => write!(f, "type-def {index}"),
            Op::EndUnit => f.write_str("end-unit"),
        }
    }
}

/// A contiguous run of operations as handed to the transport.
///
/// `sites` is empty unless the sender traces, in which case it holds the
/// source location that produced each op.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub ops: Vec<Op>,
    pub sites: Vec<Box<str>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Length-prefixed binary encoding.
    pub fn to_bytes(&self) -> SyncResult<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> SyncResult<Self> {
        Ok(postcard::from_bytes(bytes)?)
    }

    /// Splits `ops` into batches of at most `batch_size` operations.
    pub(crate) fn chunk(ops: Vec<Op>, sites: Vec<Box<str>>, batch_size: usize) -> Vec<Self> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::with_capacity(ops.len().div_ceil(batch_size));
        let mut ops = ops.into_iter().peekable();
        let mut sites = sites.into_iter();
        while ops.peek().is_some() {
            let chunk: Vec<Op> = ops.by_ref().take(batch_size).collect();
            let chunk_sites = sites.by_ref().take(chunk.len()).collect();
            batches.push(Self { ops: chunk, sites: chunk_sites });
        }
        batches
    }
}

/// One op per line, for logs and wire-trace snapshots.
pub fn render_trace(batches: &[Batch]) -> String {
    let mut out = String::new();
    for op in batches.iter().flat_map(|batch| &batch.ops) {
        out.push_str(&op.to_string());
        out.push('\n');
    }
    out
}

/// Where a receive queue pulls batches from. Waiting for the next batch is
/// the transport's business; returning `None` means the stream ended.
pub trait BatchSource {
    fn next_batch(&mut self) -> Option<Batch>;
}

/// Where a send session delivers the batches of a completed unit.
pub trait BatchSink {
    fn push_batch(&mut self, batch: Batch);
}

impl BatchSource for VecDeque<Batch> {
    fn next_batch(&mut self) -> Option<Batch> {
        self.pop_front()
    }
}

impl BatchSink for VecDeque<Batch> {
    fn push_batch(&mut self, batch: Batch) {
        self.push_back(batch);
    }
}

impl BatchSink for Vec<Batch> {
    fn push_batch(&mut self, batch: Batch) {
        self.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn chunking_respects_batch_size() {
        let ops = vec![Op::Unchanged; 7];
        let batches = Batch::chunk(ops, Vec::new(), 3);
        assert_eq!(batches.iter().map(Batch::len).collect::<Vec<_>>(), [3, 3, 1]);
        assert!(batches.iter().all(|batch| batch.sites.is_empty()));

        assert!(Batch::chunk(Vec::new(), Vec::new(), 3).is_empty());
        assert_eq!(Batch::chunk(vec![Op::Insert; 2], Vec::new(), 0).len(), 2);
    }

    #[test]
    fn bytes_round_trip() {
        let batch = Batch {
            ops: vec![
                Op::Id([7; 16]),
                Op::Changed,
                Op::Str("name".into()),
                Op::Float(1.5),
                Op::Keep(3),
                Op::TypeDef(0),
                Op::EndUnit,
            ],
            sites: vec!["a.rs:1".into()],
        };
        let bytes = batch.to_bytes().unwrap();
        assert_eq!(Batch::from_bytes(&bytes).unwrap(), batch);
        assert!(Batch::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn trace_rendering() {
        let batches = [
            Batch { ops: vec![Op::Id([0; 16]), Op::Changed, Op::Delete(1)], sites: vec![] },
            Batch { ops: vec![Op::Keep(2), Op::Str("d".into()), Op::EndList], sites: vec![] },
        ];
        expect![[r#"
            id
            changed
            delete 1
            keep 2
            str "d"
            end-list
        "#]]
        .assert_eq(&render_trace(&batches));
    }
}
