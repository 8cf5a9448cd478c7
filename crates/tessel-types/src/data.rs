//! Descriptors of the static type system.
//!
//! Entities reference each other through [`TypeId`]s into the owning
//! [`TypeStore`](crate::TypeStore), which is what lets the graph be cyclic: a
//! class lists its methods and each method names the class as its declaring type.

use crate::TypeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeData {
    Primitive(Primitive),
    Class(Class),
    Parameterized(Parameterized),
    GenericTypeVariable(GenericTypeVariable),
    Array(Array),
    Method(Method),
    Variable(Variable),
    Intersection(Vec<TypeId>),
    MultiCatch(Vec<TypeId>),
    Annotation(Annotation),
    Unknown,
}

impl TypeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeData::Primitive(_) => "Primitive",
            TypeData::Class(_) => "Class",
            TypeData::Parameterized(_) => "Parameterized",
            TypeData::GenericTypeVariable(_) => "GenericTypeVariable",
            TypeData::Array(_) => "Array",
            TypeData::Method(_) => "Method",
            TypeData::Variable(_) => "Variable",
            TypeData::Intersection(_) => "Intersection",
            TypeData::MultiCatch(_) => "MultiCatch",
            TypeData::Annotation(_) => "Annotation",
            TypeData::Unknown => "Unknown",
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            TypeData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            TypeData::Method(method) => Some(method),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Void,
    String,
    Null,
    None,
}

impl Primitive {
    pub const ALL: [Self; 12] = [
        Self::Boolean,
        Self::Byte,
        Self::Char,
        Self::Double,
        Self::Float,
        Self::Int,
        Self::Long,
        Self::Short,
        Self::Void,
        Self::String,
        Self::Null,
        Self::None,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Void => "void",
            Primitive::String => "String",
            Primitive::Null => "null",
            Primitive::None => "",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Enum,
    Interface,
    Annotation,
    Record,
    Value,
}

impl ClassKind {
    pub const ALL: [Self; 6] =
        [Self::Class, Self::Enum, Self::Interface, Self::Annotation, Self::Record, Self::Value];
}

/// A class-like type: class, interface, enum, record or annotation type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    pub kind: ClassKind,
    pub fully_qualified_name: Box<str>,
    pub flags: u64,
    pub type_parameters: Vec<TypeId>,
    pub supertype: Option<TypeId>,
    pub owning_class: Option<TypeId>,
    pub annotations: Vec<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<TypeId>,
    pub methods: Vec<TypeId>,
}

impl Class {
    pub fn new(kind: ClassKind, fully_qualified_name: impl Into<Box<str>>) -> Self {
        Self {
            kind,
            fully_qualified_name: fully_qualified_name.into(),
            flags: 0,
            type_parameters: Vec::new(),
            supertype: None,
            owning_class: None,
            annotations: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// A generic class instantiated with type arguments, e.g. `List<String>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameterized {
    pub ty: TypeId,
    pub type_parameters: Vec<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

impl Variance {
    pub const ALL: [Self; 3] = [Self::Invariant, Self::Covariant, Self::Contravariant];
}

/// A type variable or wildcard with its bounds, e.g. `T extends Comparable<T>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericTypeVariable {
    pub name: Box<str>,
    pub variance: Variance,
    pub bounds: Vec<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Array {
    pub element_type: TypeId,
    pub annotations: Vec<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub declaring_type: TypeId,
    pub name: Box<str>,
    pub flags: u64,
    pub return_type: TypeId,
    pub parameter_names: Vec<Box<str>>,
    pub parameter_types: Vec<TypeId>,
    pub thrown_exceptions: Vec<TypeId>,
    pub annotations: Vec<TypeId>,
}

/// A field, local variable or parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub name: Box<str>,
    pub owner: Option<TypeId>,
    pub ty: TypeId,
    pub annotations: Vec<TypeId>,
}

/// An annotation instance together with its element values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub ty: TypeId,
    pub values: Vec<ElementValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementValue {
    /// The annotation method this value is assigned to.
    pub element: TypeId,
    pub values: Vec<AnnotationValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationValue {
    Constant(Box<str>),
    Type(TypeId),
}
