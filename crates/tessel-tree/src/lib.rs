//! Format-preserving tree model shared by every language plugin.
//!
//! Nodes carry a stable [`NodeId`], their leading [`Space`] and a set of
//! [`Markers`]. Formatting that has no semantic home of its own lives in the
//! padding wrappers so that unmodified regions reprint unchanged.

mod id;
mod marker;
mod node;
mod padding;
mod space;

/// Stable node identifiers.
pub use id::NodeId;
/// Open, extensible per-node metadata.
pub use marker::{Marker, MarkerKind, Markers, Markup, MarkupLevel, SearchResult};
/// The node trait and the identity used for diffing.
pub use node::{AsAny, Node, NodeKind, Same, Tree};
/// Wrappers carrying formatting around an element.
pub use padding::{Container, LeftPadded, RightPadded};
/// Whitespace and comments.
pub use space::{Comment, Space};
