//! Open per-node metadata.

use std::fmt;
use std::sync::Arc;

use crate::{AsAny, NodeId};

/// A metadata record attached to a node.
///
/// Marker kinds are open: a plugin adds one by implementing this trait and
/// registering a codec for its [`MarkerKind::KIND`].
pub trait Marker: AsAny + fmt::Debug + Send + Sync {
    /// Wire tag of the marker's shape.
    fn kind(&self) -> &'static str;

    fn id(&self) -> NodeId;
}

/// Static wire tag of a concrete marker type.
pub trait MarkerKind: Marker + Sized {
    const KIND: &'static str;
}

/// The ordered set of markers attached to a node.
#[derive(Clone, Debug)]
pub struct Markers {
    pub id: NodeId,
    pub entries: Vec<Arc<dyn Marker>>,
}

impl Markers {
    pub fn new(entries: Vec<Arc<dyn Marker>>) -> Self {
        Self { id: NodeId::random(), entries }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Marker>> {
        self.entries.iter()
    }

    /// Returns the first marker of type `M`.
    pub fn find<M: Marker + 'static>(&self) -> Option<&M> {
        self.entries.iter().find_map(|marker| marker.downcast_ref::<M>())
    }

    /// Adds `marker`, replacing a marker with the same id.
    pub fn add(mut self, marker: Arc<dyn Marker>) -> Self {
        match self.entries.iter_mut().find(|existing| existing.id() == marker.id()) {
            Some(existing) => *existing = marker,
            None => self.entries.push(marker),
        }
        self
    }

    pub fn remove(mut self, id: NodeId) -> Self {
        self.entries.retain(|marker| marker.id() != id);
        self
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::empty()
    }
}

/// Marks a node matched by a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub id: NodeId,
    pub description: Option<String>,
}

impl SearchResult {
    pub fn new(description: Option<String>) -> Self {
        Self { id: NodeId::random(), description }
    }
}

impl Marker for SearchResult {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn id(&self) -> NodeId {
        self.id
    }
}

impl MarkerKind for SearchResult {
    const KIND: &'static str = "tessel.SearchResult";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkupLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl MarkupLevel {
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Warning, Self::Error];
}

/// A message attached to a node, e.g. a diagnostic produced by a recipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Markup {
    pub id: NodeId,
    pub level: MarkupLevel,
    pub message: String,
    pub detail: Option<String>,
}

impl Markup {
    pub fn new(level: MarkupLevel, message: impl Into<String>) -> Self {
        Self { id: NodeId::random(), level, message: message.into(), detail: None }
    }
}

impl Marker for Markup {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn id(&self) -> NodeId {
        self.id
    }
}

impl MarkerKind for Markup {
    const KIND: &'static str = "tessel.Markup";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_and_replace() {
        let search = SearchResult::new(Some("found".into()));
        let markers = Markers::empty().add(Arc::new(search.clone()));
        assert_eq!(markers.find::<SearchResult>(), Some(&search));
        assert!(markers.find::<Markup>().is_none());

        let replaced = SearchResult { description: None, ..search.clone() };
        let markers = markers.add(Arc::new(replaced.clone()));
        assert_eq!(markers.entries.len(), 1);
        assert_eq!(markers.find::<SearchResult>(), Some(&replaced));

        let markers = markers.remove(search.id);
        assert!(markers.is_empty());
    }
}
