use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Marker, Markers, NodeId, Space};

/// Upcast to [`Any`] for downcasting trait objects to their concrete node or
/// marker type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node of a format-preserving tree.
pub trait Node: AsAny + fmt::Debug + Send + Sync {
    /// Wire tag naming the node's shape. A codec is registered per tag.
    fn kind(&self) -> &'static str;

    /// Identifier assigned at construction. An id names one node of one kind.
    fn id(&self) -> NodeId;

    fn prefix(&self) -> &Space;

    fn markers(&self) -> &Markers;
}

/// Static wire tag of a concrete node type.
pub trait NodeKind: Node + Sized {
    const KIND: &'static str;

    fn into_tree(self) -> Tree {
        Arc::new(self)
    }
}

/// A shared reference to a node. Unmodified subtrees are shared between
/// successive versions of a tree, which is what makes diffing by identity cheap.
pub type Tree = Arc<dyn Node>;

impl dyn Node {
    pub fn downcast_ref<N: Node>(&self) -> Option<&N> {
        self.as_any().downcast_ref::<N>()
    }

    pub fn is<N: Node>(&self) -> bool {
        self.as_any().is::<N>()
    }
}

impl dyn Marker {
    pub fn downcast_ref<M: Marker>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }
}

/// Equality used to decide whether an attribute changed since it was last
/// synchronized: identity for node and marker references, value equality for
/// everything else.
pub trait Same {
    fn same(&self, before: &Self) -> bool;
}

macro_rules! same_by_value {
    ($($ty:ty),* $(,)?) => {
        $(impl Same for $ty {
            #[inline]
            fn same(&self, before: &Self) -> bool {
                self == before
            }
        })*
    };
}

same_by_value!(bool, char, i32, i64, u32, u64, str, String, Box<str>, NodeId, Space);

impl Same for f64 {
    #[inline]
    fn same(&self, before: &Self) -> bool {
        self.to_bits() == before.to_bits()
    }
}

impl Same for Tree {
    #[inline]
    fn same(&self, before: &Self) -> bool {
        Arc::ptr_eq(self, before)
    }
}

impl Same for Arc<dyn Marker> {
    #[inline]
    fn same(&self, before: &Self) -> bool {
        Arc::ptr_eq(self, before)
    }
}

impl<T: Same> Same for Option<T> {
    fn same(&self, before: &Self) -> bool {
        match (self, before) {
            (Some(after), Some(before)) => after.same(before),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Same> Same for [T] {
    fn same(&self, before: &Self) -> bool {
        self.len() == before.len() && self.iter().zip(before).all(|(a, b)| a.same(b))
    }
}

impl<T: Same> Same for Vec<T> {
    fn same(&self, before: &Self) -> bool {
        self.as_slice().same(before.as_slice())
    }
}

impl Same for Markers {
    fn same(&self, before: &Self) -> bool {
        self.id == before.id && self.entries.same(&before.entries)
    }
}
