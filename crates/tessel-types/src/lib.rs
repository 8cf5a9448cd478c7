//! The static type graph: mutually referential type entities deduplicated by
//! a deterministic signature instead of per-instance identifiers.

mod arena;
mod data;
mod signature;
mod store;

pub use arena::Idx;
pub use data::{
    Annotation, AnnotationValue, Array, Class, ClassKind, ElementValue, GenericTypeVariable,
    Method, Parameterized, Primitive, TypeData, Variable, Variance,
};
pub use store::{TypeId, TypeSlot, TypeStore};
