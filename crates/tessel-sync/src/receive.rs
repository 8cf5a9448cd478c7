//! The receiving half: rebuilds trees from operations and a cached baseline.

use std::collections::VecDeque;

use tessel_tree::{NodeId, Space, Tree};
use tessel_types::TypeStore;

use crate::types::ReceivedTypes;
use crate::{BatchSource, CodecRegistry, Desync, Op, SyncError, SyncResult};

/// Reads the operations of one unit in the order the sender wrote them.
///
/// `receive*` methods mirror `get_and_send*` and start by reading a change
/// marker; `decode*` methods mirror `send*` and read payload only.
pub struct ReceiveQueue<'a> {
    registry: &'a CodecRegistry,
    pub(crate) types: &'a mut TypeStore,
    pub(crate) type_refs: &'a mut ReceivedTypes,
    source: &'a mut dyn BatchSource,
    ops: VecDeque<Op>,
    sites: VecDeque<Box<str>>,
    last_site: Option<Box<str>>,
    /// Whether the last operation read closed the unit.
    at_end: bool,
}

impl<'a> ReceiveQueue<'a> {
    pub(crate) fn new(
        registry: &'a CodecRegistry,
        types: &'a mut TypeStore,
        type_refs: &'a mut ReceivedTypes,
        source: &'a mut dyn BatchSource,
    ) -> Self {
        Self {
            registry,
            types,
            type_refs,
            source,
            ops: VecDeque::new(),
            sites: VecDeque::new(),
            last_site: None,
            at_end: false,
        }
    }

    pub fn registry(&self) -> &'a CodecRegistry {
        self.registry
    }

    pub fn types(&mut self) -> &mut TypeStore {
        &mut *self.types
    }

    /// Takes the next operation, pulling batches from the source as needed.
    pub(crate) fn next(&mut self, expected: &'static str) -> SyncResult<Op> {
        loop {
            if let Some(op) = self.ops.pop_front() {
                self.last_site = self.sites.pop_front();
                self.at_end = matches!(op, Op::EndUnit);
                return Ok(op);
            }
            let Some(batch) = self.source.next_batch() else {
                return Err(self.desync(Desync::Exhausted { expected }));
            };
            self.ops.extend(batch.ops);
            self.sites.extend(batch.sites);
        }
    }

    /// Reports lost synchronization at the last operation read.
    pub fn desync(&self, reason: Desync) -> SyncError {
        SyncError::Desync { reason, site: self.last_site.clone() }
    }

    pub(crate) fn unexpected(&self, expected: &'static str, found: Op) -> SyncError {
        self.desync(Desync::UnexpectedOp { expected, found })
    }

    pub fn decode_str(&mut self) -> SyncResult<Box<str>> {
        match self.next("string")? {
            Op::Str(value) => Ok(value),
            op => Err(self.unexpected("string", op)),
        }
    }

    pub fn decode_string(&mut self) -> SyncResult<String> {
        self.decode_str().map(String::from)
    }

    pub fn decode_int(&mut self) -> SyncResult<i64> {
        match self.next("integer")? {
            Op::Int(value) => Ok(value),
            op => Err(self.unexpected("integer", op)),
        }
    }

    pub fn decode_float(&mut self) -> SyncResult<f64> {
        match self.next("float")? {
            Op::Float(value) => Ok(value),
            op => Err(self.unexpected("float", op)),
        }
    }

    pub fn decode_bool(&mut self) -> SyncResult<bool> {
        match self.next("boolean")? {
            Op::Bool(value) => Ok(value),
            op => Err(self.unexpected("boolean", op)),
        }
    }

    pub fn decode_bytes(&mut self) -> SyncResult<Vec<u8>> {
        match self.next("bytes")? {
            Op::Bytes(value) => Ok(value),
            op => Err(self.unexpected("bytes", op)),
        }
    }

    pub fn decode_id(&mut self) -> SyncResult<NodeId> {
        match self.next("id")? {
            Op::Id(bytes) => Ok(NodeId::from_bytes(bytes)),
            op => Err(self.unexpected("id", op)),
        }
    }

    pub(crate) fn decode_len(&mut self) -> SyncResult<usize> {
        let len = self.decode_int()?;
        usize::try_from(len)
            .ok()
            .ok_or_else(|| self.desync(Desync::InvalidDiscriminant { what: "length", value: len }))
    }

    /// Reads an enum sent as its position in `all`.
    pub fn decode_enum<T: Copy>(&mut self, what: &'static str, all: &[T]) -> SyncResult<T> {
        let value = self.decode_int()?;
        usize::try_from(value)
            .ok()
            .and_then(|index| all.get(index).copied())
            .ok_or_else(|| self.desync(Desync::InvalidDiscriminant { what, value }))
    }

    /// Receives a mandatory attribute. Mirrors [`SendQueue::get_and_send`].
    ///
    /// [`SendQueue::get_and_send`]: crate::SendQueue::get_and_send
    pub fn receive<T: Clone>(
        &mut self,
        before: Option<&T>,
        decode: impl FnOnce(&mut Self, Option<&T>) -> SyncResult<T>,
    ) -> SyncResult<T> {
        match self.next("change marker")? {
            Op::Unchanged => {
                before.cloned().ok_or_else(|| self.desync(Desync::UnchangedWithoutBaseline))
            }
            Op::Changed => match before {
                Some(before) => decode(self, Some(before)),
                None => Err(self.desync(Desync::ChangedWithoutBaseline)),
            },
            Op::ChangedFromNull => decode(self, None),
            op => Err(self.unexpected("change marker", op)),
        }
    }

    /// Receives a nullable attribute. Mirrors [`SendQueue::get_and_send_opt`].
    ///
    /// [`SendQueue::get_and_send_opt`]: crate::SendQueue::get_and_send_opt
    pub fn receive_opt<T: Clone>(
        &mut self,
        before: Option<Option<&T>>,
        decode: impl FnOnce(&mut Self, Option<&T>) -> SyncResult<T>,
    ) -> SyncResult<Option<T>> {
        match self.next("change marker")? {
            Op::Unchanged => match before {
                Some(before) => Ok(before.cloned()),
                None => Err(self.desync(Desync::UnchangedWithoutBaseline)),
            },
            Op::Changed => match before.flatten() {
                Some(before) => decode(self, Some(before)).map(Some),
                None => Err(self.desync(Desync::ChangedWithoutBaseline)),
            },
            Op::ChangedFromNull => decode(self, None).map(Some),
            Op::ChangedToNull => Ok(None),
            op => Err(self.unexpected("change marker", op)),
        }
    }

    pub fn receive_value<T: FromWire>(&mut self, before: Option<&T>) -> SyncResult<T> {
        self.receive(before, |q, _| T::decode(q))
    }

    pub fn receive_value_opt<T: FromWire>(
        &mut self,
        before: Option<Option<&T>>,
    ) -> SyncResult<Option<T>> {
        self.receive_opt(before, |q, _| T::decode(q))
    }

    /// Reads a node written by [`SendQueue::send_tree`].
    ///
    /// [`SendQueue::send_tree`]: crate::SendQueue::send_tree
    pub fn decode_tree(&mut self, before: Option<&Tree>) -> SyncResult<Tree> {
        let tag = self.decode_str()?;
        let id = self.decode_id()?;
        let registry = self.registry;
        registry.dispatch_receive(&tag, id, before.map(|before| &**before), self)
    }

    pub fn receive_tree(&mut self, before: Option<&Tree>) -> SyncResult<Tree> {
        self.receive(before, Self::decode_tree)
    }

    pub fn receive_tree_opt(&mut self, before: Option<Option<&Tree>>) -> SyncResult<Option<Tree>> {
        self.receive_opt(before, Self::decode_tree)
    }

    /// Receives a list attribute. Mirrors [`SendQueue::get_and_send_list`];
    /// `decode` reads one element's payload.
    ///
    /// [`SendQueue::get_and_send_list`]: crate::SendQueue::get_and_send_list
    pub fn receive_list<T: Clone>(
        &mut self,
        before: Option<&[T]>,
        mut decode: impl FnMut(&mut Self, Option<&T>) -> SyncResult<T>,
    ) -> SyncResult<Vec<T>> {
        let before = match self.next("change marker")? {
            Op::Unchanged => {
                return before
                    .map(<[T]>::to_vec)
                    .ok_or_else(|| self.desync(Desync::UnchangedWithoutBaseline));
            }
            Op::ChangedFromNull => {
                // Grown as elements arrive: the count has not been checked
                // against the stream yet.
                let len = self.decode_len()?;
                let mut elements = Vec::new();
                for _ in 0..len {
                    elements.push(decode(self, None)?);
                }
                return Ok(elements);
            }
            Op::Changed => before.ok_or_else(|| self.desync(Desync::ChangedWithoutBaseline))?,
            op => return Err(self.unexpected("change marker", op)),
        };

        let mut elements = Vec::with_capacity(before.len());
        let mut cursor = 0;
        loop {
            match self.next("list edit")? {
                Op::Keep(n) => {
                    let end = self.advance(cursor, n, before.len())?;
                    elements.extend_from_slice(&before[cursor..end]);
                    cursor = end;
                }
                Op::Delete(n) => cursor = self.advance(cursor, n, before.len())?,
                Op::Insert => elements.push(self.receive(None, &mut decode)?),
                Op::Update => {
                    let previous = self.element(before, cursor)?;
                    elements.push(self.receive(Some(previous), &mut decode)?);
                    cursor += 1;
                }
                Op::Move(index) => {
                    let previous = self.element(before, index as usize)?;
                    elements.push(self.receive(Some(previous), &mut decode)?);
                }
                Op::EndList => return Ok(elements),
                op => return Err(self.unexpected("list edit", op)),
            }
        }
    }

    pub fn receive_trees(&mut self, before: Option<&[Tree]>) -> SyncResult<Vec<Tree>> {
        self.receive_list(before, Self::decode_tree)
    }

    fn advance(&self, cursor: usize, n: u32, len: usize) -> SyncResult<usize> {
        let end = cursor + n as usize;
        if end > len {
            return Err(self.desync(Desync::ListOutOfBounds { index: end - 1, len }));
        }
        Ok(end)
    }

    fn element<'b, T>(&self, before: &'b [T], index: usize) -> SyncResult<&'b T> {
        before.get(index).ok_or_else(|| self.desync(Desync::ListOutOfBounds { index, len: before.len() }))
    }

    /// Reads the `EndUnit` that closes a unit.
    pub(crate) fn end_unit(&mut self) -> SyncResult<()> {
        match self.next("end of unit")? {
            Op::EndUnit => Ok(()),
            found => Err(self.desync(Desync::TrailingOps { found })),
        }
    }

    /// Reads past the rest of a unit that failed to decode, through its
    /// `EndUnit`, so that the next read starts at the following unit.
    /// Returns the number of operations skipped.
    pub(crate) fn skip_unit(&mut self) -> usize {
        let mut skipped = 0;
        while !self.at_end {
            if self.next("end of unit").is_err() {
                break;
            }
            skipped += 1;
        }
        skipped
    }
}

/// A leaf value received whole. Mirrors [`WireValue`](crate::WireValue).
pub trait FromWire: Clone {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self>;
}

impl FromWire for bool {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_bool()
    }
}

impl FromWire for i64 {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_int()
    }
}

impl FromWire for i32 {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        let value = q.decode_int()?;
        Self::try_from(value)
            .ok()
            .ok_or_else(|| q.desync(Desync::InvalidDiscriminant { what: "i32", value }))
    }
}

impl FromWire for u32 {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        let value = q.decode_int()?;
        Self::try_from(value)
            .ok()
            .ok_or_else(|| q.desync(Desync::InvalidDiscriminant { what: "u32", value }))
    }
}

impl FromWire for f64 {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_float()
    }
}

impl FromWire for String {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_string()
    }
}

impl FromWire for Box<str> {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_str()
    }
}

impl FromWire for NodeId {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_id()
    }
}

impl FromWire for Space {
    fn decode(q: &mut ReceiveQueue<'_>) -> SyncResult<Self> {
        q.decode_space()
    }
}
