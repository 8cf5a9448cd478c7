//! The sending half: turns an (after, before) pair of trees into operations.

use std::panic::Location;

use tessel_tree::{NodeId, Same, Space, Tree};
use tessel_types::TypeStore;

use crate::types::SentTypes;
use crate::{CodecRegistry, Op, SyncResult, edit};

/// Accumulates the operations of one unit.
///
/// Codecs write their fields through the `get_and_send*` family, which
/// compares each attribute with its baseline and emits a change marker before
/// any payload. The `send_*` family writes payload only and is what an
/// `encode` callback uses once the marker is out.
pub struct SendQueue<'a> {
    registry: &'a CodecRegistry,
    pub(crate) types: &'a TypeStore,
    pub(crate) type_refs: &'a mut SentTypes,
    ops: Vec<Op>,
    sites: Option<Vec<Box<str>>>,
}

impl<'a> SendQueue<'a> {
    pub(crate) fn new(
        registry: &'a CodecRegistry,
        types: &'a TypeStore,
        type_refs: &'a mut SentTypes,
        trace: bool,
    ) -> Self {
        Self { registry, types, type_refs, ops: Vec::new(), sites: trace.then(Vec::new) }
    }

    pub fn registry(&self) -> &'a CodecRegistry {
        self.registry
    }

    /// The type store the unit's type references resolve in.
    pub fn types(&self) -> &'a TypeStore {
        self.types
    }

    pub(crate) fn finish(self) -> (Vec<Op>, Vec<Box<str>>) {
        (self.ops, self.sites.unwrap_or_default())
    }

    #[track_caller]
    pub(crate) fn push(&mut self, op: Op) {
        if let Some(sites) = &mut self.sites {
            let location = Location::caller();
            let site = format!("{}:{}", location.file(), location.line());
            tracing::trace!(%op, %site, "send");
            sites.push(site.into_boxed_str());
        }
        self.ops.push(op);
    }

    #[track_caller]
    pub fn send_str(&mut self, value: &str) {
        self.push(Op::Str(value.into()));
    }

    #[track_caller]
    pub fn send_int(&mut self, value: i64) {
        self.push(Op::Int(value));
    }

    #[track_caller]
    pub fn send_float(&mut self, value: f64) {
        self.push(Op::Float(value));
    }

    #[track_caller]
    pub fn send_bool(&mut self, value: bool) {
        self.push(Op::Bool(value));
    }

    #[track_caller]
    pub fn send_bytes(&mut self, value: &[u8]) {
        self.push(Op::Bytes(value.to_vec()));
    }

    #[track_caller]
    pub fn send_id(&mut self, id: NodeId) {
        self.push(Op::Id(*id.as_bytes()));
    }

    #[track_caller]
    pub(crate) fn send_len(&mut self, len: usize) {
        self.push(Op::Int(len as i64));
    }

    /// Sends a mandatory attribute.
    ///
    /// With no baseline the value is new to the receiver and goes out in
    /// full. Otherwise nothing but `Unchanged` is sent when the value is the
    /// same as `before`, and `encode` receives the baseline to send a delta.
    #[track_caller]
    pub fn get_and_send<T: Same + ?Sized>(
        &mut self,
        after: &T,
        before: Option<&T>,
        encode: impl FnOnce(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        match before {
            None => {
                self.push(Op::ChangedFromNull);
                encode(self, after, None)
            }
            Some(before) if after.same(before) => {
                self.push(Op::Unchanged);
                Ok(())
            }
            Some(before) => {
                self.push(Op::Changed);
                encode(self, after, Some(before))
            }
        }
    }

    /// Sends a nullable attribute. The outer `Option` of `before` is the
    /// baseline itself, absent on first contact; the inner one is its value.
    #[track_caller]
    pub fn get_and_send_opt<T: Same + ?Sized>(
        &mut self,
        after: Option<&T>,
        before: Option<Option<&T>>,
        encode: impl FnOnce(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        self.get_and_send_opt_by(after, before, T::same, encode)
    }

    #[track_caller]
    pub(crate) fn get_and_send_opt_by<T: ?Sized>(
        &mut self,
        after: Option<&T>,
        before: Option<Option<&T>>,
        same: impl FnOnce(&T, &T) -> bool,
        encode: impl FnOnce(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        match (after, before.flatten()) {
            (None, None) if before.is_some() => self.push(Op::Unchanged),
            (None, _) => self.push(Op::ChangedToNull),
            (Some(after), None) => {
                self.push(Op::ChangedFromNull);
                return encode(self, after, None);
            }
            (Some(after), Some(before)) if same(after, before) => self.push(Op::Unchanged),
            (Some(after), Some(before)) => {
                self.push(Op::Changed);
                return encode(self, after, Some(before));
            }
        }
        Ok(())
    }

    #[track_caller]
    pub fn get_and_send_value<T: WireValue + ?Sized>(&mut self, after: &T, before: Option<&T>) -> SyncResult<()> {
        self.get_and_send(after, before, |q, after, _| {
            after.send(q);
            Ok(())
        })
    }

    #[track_caller]
    pub fn get_and_send_value_opt<T: WireValue + ?Sized>(
        &mut self,
        after: Option<&T>,
        before: Option<Option<&T>>,
    ) -> SyncResult<()> {
        self.get_and_send_opt(after, before, |q, after, _| {
            after.send(q);
            Ok(())
        })
    }

    /// Writes a node: its kind tag and id, then the fields written by the
    /// codec registered for the kind. The fields are a delta only when
    /// `before` is the same node.
    #[track_caller]
    pub fn send_tree(&mut self, after: &Tree, before: Option<&Tree>) -> SyncResult<()> {
        self.push(Op::Str(after.kind().into()));
        self.send_id(after.id());
        let registry = self.registry;
        registry.dispatch_send(&**after, before.map(|before| &**before), self)
    }

    #[track_caller]
    pub fn get_and_send_tree(&mut self, after: &Tree, before: Option<&Tree>) -> SyncResult<()> {
        self.get_and_send(after, before, Self::send_tree)
    }

    #[track_caller]
    pub fn get_and_send_tree_opt(
        &mut self,
        after: Option<&Tree>,
        before: Option<Option<&Tree>>,
    ) -> SyncResult<()> {
        self.get_and_send_opt(after, before, Self::send_tree)
    }

    /// Sends a list attribute.
    ///
    /// Elements are matched with the baseline by `identify`. Unmoved elements
    /// are kept by reference, reordered ones are moved and diffed against
    /// their old selves, and only elements new to the list are sent in full.
    #[track_caller]
    pub fn get_and_send_list<T: Same>(
        &mut self,
        after: &[T],
        before: Option<&[T]>,
        identify: impl Fn(&T) -> NodeId,
        mut encode: impl FnMut(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        let Some(before) = before else {
            self.push(Op::ChangedFromNull);
            self.send_len(after.len());
            for element in after {
                encode(self, element, None)?;
            }
            return Ok(());
        };
        if after.same(before) {
            self.push(Op::Unchanged);
            return Ok(());
        }
        self.push(Op::Changed);

        let after_ids: Vec<NodeId> = after.iter().map(&identify).collect();
        let before_ids: Vec<NodeId> = before.iter().map(&identify).collect();
        let script = edit::script(&after_ids, &before_ids, |a, b| after[a].same(&before[b]));
        for step in script {
            match step {
                edit::Edit::Keep(n) => self.push(Op::Keep(n)),
                edit::Edit::Delete(n) => self.push(Op::Delete(n)),
                edit::Edit::Update { after: a, before: b } => {
                    self.push(Op::Update);
                    self.get_and_send(&after[a], Some(&before[b]), &mut encode)?;
                }
                edit::Edit::Move { after: a, before: b } => {
                    self.push(Op::Move(b as u32));
                    self.get_and_send(&after[a], Some(&before[b]), &mut encode)?;
                }
                edit::Edit::Insert { after: a } => {
                    self.push(Op::Insert);
                    self.get_and_send(&after[a], None, &mut encode)?;
                }
            }
        }
        self.push(Op::EndList);
        Ok(())
    }

    /// Sends a list of nodes matched by node id.
    #[track_caller]
    pub fn get_and_send_trees(&mut self, after: &[Tree], before: Option<&[Tree]>) -> SyncResult<()> {
        self.get_and_send_list(after, before, |tree| tree.id(), Self::send_tree)
    }
}

/// A leaf value sent whole whenever it changes.
pub trait WireValue: Same {
    fn send(&self, q: &mut SendQueue<'_>);
}

macro_rules! wire_value {
    ($($ty:ty => |$value:ident, $q:ident| $send:expr),* $(,)?) => {
        $(impl WireValue for $ty {
            fn send(&self, $q: &mut SendQueue<'_>) {
                let $value = self;
                $send
            }
        })*
    };
}

wire_value! {
    bool => |value, q| q.send_bool(*value),
    i32 => |value, q| q.send_int(i64::from(*value)),
    i64 => |value, q| q.send_int(*value),
    u32 => |value, q| q.send_int(i64::from(*value)),
    f64 => |value, q| q.send_float(*value),
    str => |value, q| q.send_str(value),
    String => |value, q| q.send_str(value),
    Box<str> => |value, q| q.send_str(value),
    NodeId => |value, q| q.send_id(*value),
    Space => |value, q| q.send_space(value),
}
