use rustc_hash::FxHashMap;

use crate::arena::{Arena, Idx};
use crate::{Primitive, TypeData};

/// Reference to a type entity. Two ids are equal exactly when they name the
/// same entity, so comparing ids is the identity comparison recipes rely on.
pub type TypeId = Idx<TypeSlot>;

/// Storage cell of one type entity. Reserved cells hold no data until filled.
#[derive(Debug)]
pub struct TypeSlot {
    signature: Box<str>,
    data: Option<TypeData>,
}

static UNKNOWN: TypeData = TypeData::Unknown;

/// All type entities known to one side of a connection.
///
/// Every signature maps to exactly one [`TypeId`]. Cyclic entities are built
/// in two phases: [`reserve`](Self::reserve) hands out the id before any field
/// is known, then [`fill`](Self::fill) sets the fields in place. Every id taken
/// between the two calls stays valid and names the completed entity.
#[derive(Debug, Default)]
pub struct TypeStore {
    slots: Arena<TypeSlot>,
    by_signature: FxHashMap<Box<str>, TypeId>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entity with `data`'s signature, creating it if needed.
    ///
    /// A reserved entity with that signature is completed with `data`; a
    /// completed one is returned as is.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        let signature = self.signature_of(&data);
        match self.by_signature.get(signature.as_str()) {
            Some(&id) => {
                let slot = &mut self.slots[id];
                if slot.data.is_none() {
                    slot.data = Some(data);
                }
                id
            }
            None => self.insert(signature.into_boxed_str(), Some(data)),
        }
    }

    pub fn primitive(&mut self, primitive: Primitive) -> TypeId {
        self.intern(TypeData::Primitive(primitive))
    }

    pub fn unknown(&mut self) -> TypeId {
        self.intern(TypeData::Unknown)
    }

    /// Returns the id for `signature`, allocating a placeholder entity if the
    /// signature has not been seen.
    pub fn reserve(&mut self, signature: &str) -> TypeId {
        match self.by_signature.get(signature) {
            Some(&id) => id,
            None => self.insert(signature.into(), None),
        }
    }

    /// Sets the fields of `id` in place, keeping the signature it was stored
    /// under. This is the only way an existing entity changes.
    #[track_caller]
    pub fn fill(&mut self, id: TypeId, data: TypeData) {
        self.slots[id].data = Some(data);
    }

    pub fn lookup(&self, signature: &str) -> Option<TypeId> {
        self.by_signature.get(signature).copied()
    }

    /// The entity's fields, or `None` while it is only reserved.
    pub fn data(&self, id: TypeId) -> Option<&TypeData> {
        self.slots.get(id).and_then(|slot| slot.data.as_ref())
    }

    /// Like [`data`](Self::data), reading a reserved entity as [`TypeData::Unknown`].
    pub fn get(&self, id: TypeId) -> &TypeData {
        self.data(id).unwrap_or(&UNKNOWN)
    }

    #[track_caller]
    pub fn signature(&self, id: TypeId) -> &str {
        &self.slots[id].signature
    }

    pub fn is_pending(&self, id: TypeId) -> bool {
        self.slots.get(id).is_some_and(|slot| slot.data.is_none())
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.slots.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &str)> {
        self.slots.iter_enumerated().map(|(id, slot)| (id, &*slot.signature))
    }

    fn insert(&mut self, signature: Box<str>, data: Option<TypeData>) -> TypeId {
        let id = self.slots.alloc(TypeSlot { signature: signature.clone(), data });
        self.by_signature.insert(signature, id);
        id
    }
}
