use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Typed index into an [`Arena`].
pub struct Idx<T>(u32, PhantomData<fn() -> T>);

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({})", self.0)
    }
}

impl<T> std::hash::Hash for Idx<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Idx<T> {}

impl<T> PartialOrd for Idx<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Idx<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> Idx<T> {
    pub(crate) fn new(index: u32) -> Self {
        Self(index, PhantomData)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Append-only storage addressed by [`Idx`]. Entries are never removed, so an
/// index stays valid for the lifetime of the arena.
pub(crate) struct Arena<T> {
    items: Vec<T>,
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub(crate) fn alloc(&mut self, value: T) -> Idx<T> {
        let index = self.items.len() as u32;
        self.items.push(value);
        Idx::new(index)
    }

    pub(crate) fn get(&self, index: Idx<T>) -> Option<&T> {
        self.items.get(index.0 as usize)
    }

    pub(crate) fn iter_enumerated(&self) -> impl Iterator<Item = (Idx<T>, &T)> {
        self.items.iter().enumerate().map(|(i, item)| (Idx::new(i as u32), item))
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Index<Idx<T>> for Arena<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: Idx<T>) -> &Self::Output {
        &self.items[index.0 as usize]
    }
}

impl<T> IndexMut<Idx<T>> for Arena<T> {
    #[track_caller]
    fn index_mut(&mut self, index: Idx<T>) -> &mut Self::Output {
        &mut self.items[index.0 as usize]
    }
}
