//! Tag-keyed codecs for node and marker kinds.
//!
//! The queues know nothing about concrete node shapes. Each kind registers a
//! pair of functions that write and read its fields in one fixed order; the
//! registry resolves the pair from the wire tag at runtime.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tessel_tree::{Marker, MarkerKind, Node, NodeId, NodeKind, Tree};

use crate::{ReceiveQueue, SendQueue, SyncError, SyncResult, markers};

/// Writes the fields of `after`, as a delta against `before` when given.
pub type EncodeFn<N> = fn(&N, Option<&N>, &mut SendQueue<'_>) -> SyncResult<()>;
/// Reads the fields written by the paired [`EncodeFn`].
pub type DecodeFn<N> = fn(NodeId, Option<&N>, &mut ReceiveQueue<'_>) -> SyncResult<N>;
/// Writes the fields of a marker. Markers are always sent whole.
pub type MarkerEncodeFn<M> = fn(&M, &mut SendQueue<'_>) -> SyncResult<()>;
pub type MarkerDecodeFn<M> = fn(NodeId, &mut ReceiveQueue<'_>) -> SyncResult<M>;

/// Encoder/decoder pair for one node shape.
pub trait NodeCodec: Send + Sync {
    fn encode(
        &self,
        after: &dyn Node,
        before: Option<&dyn Node>,
        q: &mut SendQueue<'_>,
    ) -> SyncResult<()>;

    fn decode(
        &self,
        id: NodeId,
        before: Option<&dyn Node>,
        q: &mut ReceiveQueue<'_>,
    ) -> SyncResult<Tree>;
}

/// Encoder/decoder pair for one marker shape.
pub trait MarkerCodec: Send + Sync {
    fn encode(&self, marker: &dyn Marker, q: &mut SendQueue<'_>) -> SyncResult<()>;

    fn decode(&self, id: NodeId, q: &mut ReceiveQueue<'_>) -> SyncResult<Arc<dyn Marker>>;
}

struct FnCodec<N> {
    encode: EncodeFn<N>,
    decode: DecodeFn<N>,
}

impl<N: NodeKind> FnCodec<N> {
    fn cast(node: &dyn Node) -> SyncResult<&N> {
        node.downcast_ref::<N>().ok_or_else(|| SyncError::shape_mismatch(N::KIND, node.kind()))
    }
}

impl<N: NodeKind> NodeCodec for FnCodec<N> {
    fn encode(
        &self,
        after: &dyn Node,
        before: Option<&dyn Node>,
        q: &mut SendQueue<'_>,
    ) -> SyncResult<()> {
        let after = Self::cast(after)?;
        let before = before.map(Self::cast).transpose()?;
        (self.encode)(after, before, q)
    }

    fn decode(
        &self,
        id: NodeId,
        before: Option<&dyn Node>,
        q: &mut ReceiveQueue<'_>,
    ) -> SyncResult<Tree> {
        let before = before.map(Self::cast).transpose()?;
        Ok(Arc::new((self.decode)(id, before, q)?))
    }
}

struct FnMarkerCodec<M> {
    encode: MarkerEncodeFn<M>,
    decode: MarkerDecodeFn<M>,
}

impl<M: MarkerKind> MarkerCodec for FnMarkerCodec<M> {
    fn encode(&self, marker: &dyn Marker, q: &mut SendQueue<'_>) -> SyncResult<()> {
        let marker = marker
            .downcast_ref::<M>()
            .ok_or_else(|| SyncError::shape_mismatch(M::KIND, marker.kind()))?;
        (self.encode)(marker, q)
    }

    fn decode(&self, id: NodeId, q: &mut ReceiveQueue<'_>) -> SyncResult<Arc<dyn Marker>> {
        Ok(Arc::new((self.decode)(id, q)?))
    }
}

static GLOBAL: LazyLock<Arc<CodecRegistry>> = LazyLock::new(|| Arc::new(CodecRegistry::new()));

/// Process-wide table of codecs, read-mostly after startup registration.
///
/// Lookups clone the codec out of the table, so no lock is held while a
/// codec runs and codecs may recurse into the registry freely.
#[derive(Default)]
pub struct CodecRegistry {
    nodes: RwLock<FxHashMap<Box<str>, Arc<dyn NodeCodec>>>,
    markers: RwLock<FxHashMap<Box<str>, Arc<dyn MarkerCodec>>>,
}

impl CodecRegistry {
    /// A registry holding the codecs of the built-in marker kinds.
    pub fn new() -> Self {
        let registry = Self::empty();
        markers::register(&registry);
        registry
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The shared registry language plugins register into at startup.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Registers the codec pair for `N`. Registering a kind again replaces
    /// the earlier pair.
    pub fn register_node<N: NodeKind>(&self, encode: EncodeFn<N>, decode: DecodeFn<N>) {
        self.register_node_codec(N::KIND, Arc::new(FnCodec { encode, decode }));
    }

    pub fn register_node_codec(&self, tag: impl Into<Box<str>>, codec: Arc<dyn NodeCodec>) {
        let tag = tag.into();
        tracing::debug!(%tag, "registered node codec");
        self.nodes.write().insert(tag, codec);
    }

    pub fn register_marker<M: MarkerKind>(
        &self,
        encode: MarkerEncodeFn<M>,
        decode: MarkerDecodeFn<M>,
    ) {
        self.register_marker_codec(M::KIND, Arc::new(FnMarkerCodec { encode, decode }));
    }

    pub fn register_marker_codec(&self, tag: impl Into<Box<str>>, codec: Arc<dyn MarkerCodec>) {
        let tag = tag.into();
        tracing::debug!(%tag, "registered marker codec");
        self.markers.write().insert(tag, codec);
    }

    pub fn contains_node(&self, tag: &str) -> bool {
        self.nodes.read().contains_key(tag)
    }

    pub fn contains_marker(&self, tag: &str) -> bool {
        self.markers.read().contains_key(tag)
    }

    pub fn node_codec(&self, tag: &str) -> SyncResult<Arc<dyn NodeCodec>> {
        self.nodes.read().get(tag).cloned().ok_or_else(|| SyncError::UnknownNodeKind(tag.into()))
    }

    pub fn marker_codec(&self, tag: &str) -> SyncResult<Arc<dyn MarkerCodec>> {
        self.markers.read().get(tag).cloned().ok_or_else(|| SyncError::UnknownNodeKind(tag.into()))
    }

    /// Writes `after`'s fields with the codec of its kind, as a delta against
    /// `before` when `before` is the same node.
    pub fn dispatch_send(
        &self,
        after: &dyn Node,
        before: Option<&dyn Node>,
        q: &mut SendQueue<'_>,
    ) -> SyncResult<()> {
        let before = before.filter(|before| before.id() == after.id());
        if let Some(before) = before
            && before.kind() != after.kind()
        {
            return Err(SyncError::shape_mismatch(after.kind(), before.kind()));
        }
        self.node_codec(after.kind())?.encode(after, before, q)
    }

    /// Reads a node of kind `tag` written by [`dispatch_send`](Self::dispatch_send).
    pub fn dispatch_receive(
        &self,
        tag: &str,
        id: NodeId,
        before: Option<&dyn Node>,
        q: &mut ReceiveQueue<'_>,
    ) -> SyncResult<Tree> {
        let before = before.filter(|before| before.id() == id);
        if let Some(before) = before
            && before.kind() != tag
        {
            return Err(SyncError::shape_mismatch(tag, before.kind()));
        }
        self.node_codec(tag)?.decode(id, before, q)
    }

    pub fn dispatch_send_marker(&self, marker: &dyn Marker, q: &mut SendQueue<'_>) -> SyncResult<()> {
        self.marker_codec(marker.kind())?.encode(marker, q)
    }

    pub fn dispatch_receive_marker(
        &self,
        tag: &str,
        id: NodeId,
        q: &mut ReceiveQueue<'_>,
    ) -> SyncResult<Arc<dyn Marker>> {
        self.marker_codec(tag)?.decode(id, q)
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut nodes: Vec<_> = self.nodes.read().keys().cloned().collect();
        let mut markers: Vec<_> = self.markers.read().keys().cloned().collect();
        nodes.sort();
        markers.sort();
        f.debug_struct("CodecRegistry").field("nodes", &nodes).field("markers", &markers).finish()
    }
}

#[cfg(test)]
mod tests {
    use tessel_tree::{Markup, SearchResult};

    use super::*;

    #[test]
    fn builtin_markers() {
        let registry = CodecRegistry::new();
        assert!(registry.contains_marker(SearchResult::KIND));
        assert!(registry.contains_marker(Markup::KIND));
        assert!(!CodecRegistry::empty().contains_marker(SearchResult::KIND));
    }

    #[test]
    fn unknown_kind() {
        let registry = CodecRegistry::empty();
        let err = registry.node_codec("java.Lambda").err().unwrap();
        assert!(matches!(err, SyncError::UnknownNodeKind(tag) if &*tag == "java.Lambda"));
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(&CodecRegistry::global(), &CodecRegistry::global()));
    }
}
