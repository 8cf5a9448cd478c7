//! Codec of the type graph.
//!
//! Each side numbers the types of a session in the order they are first
//! sent. The first occurrence of a type is a `TypeDef` carrying its
//! signature and fields; later occurrences are a `TypeRef` to that number.
//! The number is assigned before the fields are written, so a type reachable
//! from its own fields is referenced instead of recursed into.
//!
//! A type sent while still reserved goes out as unknown. The first time it is
//! sent after being filled, its number is defined again with the fields.

use rustc_hash::{FxHashMap, FxHashSet};
use tessel_types::{
    Annotation, AnnotationValue, Array, Class, ClassKind, ElementValue, GenericTypeVariable, Method,
    Parameterized, Primitive, TypeData, TypeId, Variable, Variance,
};

use crate::{Desync, Op, ReceiveQueue, SendQueue, SyncError, SyncResult};

/// Type numbers assigned by a sender.
#[derive(Debug, Default)]
pub(crate) struct SentTypes {
    refs: FxHashMap<TypeId, u32>,
    order: Vec<TypeId>,
    /// Numbers whose type was still reserved when defined.
    incomplete: FxHashSet<u32>,
    /// Numbers defined again since the last commit.
    completed: Vec<u32>,
}

/// The state of a [`SentTypes`] to return to when a unit fails.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TypesMark {
    len: usize,
    completed: usize,
}

impl SentTypes {
    fn get(&self, id: TypeId) -> Option<u32> {
        self.refs.get(&id).copied()
    }

    fn assign(&mut self, id: TypeId, pending: bool) -> u32 {
        let number = self.order.len() as u32;
        self.refs.insert(id, number);
        self.order.push(id);
        if pending {
            self.incomplete.insert(number);
        }
        number
    }

    /// Whether `number` was defined as unknown, in which case it is now
    /// considered defined in full.
    fn complete(&mut self, number: u32) -> bool {
        let incomplete = self.incomplete.remove(&number);
        if incomplete {
            self.completed.push(number);
        }
        incomplete
    }

    pub(crate) fn mark(&self) -> TypesMark {
        TypesMark { len: self.order.len(), completed: self.completed.len() }
    }

    /// Forgets every number assigned and every definition completed after `mark`.
    pub(crate) fn rollback(&mut self, mark: TypesMark) {
        for number in self.completed.drain(mark.completed..) {
            self.incomplete.insert(number);
        }
        for id in self.order.drain(mark.len..) {
            self.refs.remove(&id);
        }
        self.incomplete.retain(|&number| (number as usize) < mark.len);
    }

    /// Keeps everything sent so far; a later rollback stops here.
    pub(crate) fn commit(&mut self) {
        self.completed.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.refs.clear();
        self.order.clear();
        self.incomplete.clear();
        self.completed.clear();
    }
}

/// Type numbers learned by a receiver.
#[derive(Debug, Default)]
pub(crate) struct ReceivedTypes {
    refs: Vec<TypeId>,
    defined: FxHashSet<TypeId>,
    /// Numbers defined as unknown, which the sender may define again.
    incomplete: FxHashSet<u32>,
}

impl ReceivedTypes {
    pub(crate) fn clear(&mut self) {
        self.refs.clear();
        self.defined.clear();
        self.incomplete.clear();
    }
}

fn kind_code(data: &TypeData) -> i64 {
    match data {
        TypeData::Primitive(_) => 0,
        TypeData::Class(_) => 1,
        TypeData::Parameterized(_) => 2,
        TypeData::GenericTypeVariable(_) => 3,
        TypeData::Array(_) => 4,
        TypeData::Method(_) => 5,
        TypeData::Variable(_) => 6,
        TypeData::Intersection(_) => 7,
        TypeData::MultiCatch(_) => 8,
        TypeData::Annotation(_) => 9,
        TypeData::Unknown => 10,
    }
}

impl SendQueue<'_> {
    /// Writes a reference to `id`, defining it first if this session has
    /// not sent it yet. A type still being built is sent as unknown.
    #[track_caller]
    pub fn send_type(&mut self, id: TypeId) -> SyncResult<()> {
        let pending = self.types().is_pending(id);
        let number = match self.type_refs.get(id) {
            None => self.type_refs.assign(id, pending),
            // Sent as unknown before the fields were known.
            Some(number) if !pending && self.type_refs.complete(number) => number,
            Some(number) => {
                self.push(Op::TypeRef(number));
                return Ok(());
            }
        };
        self.send_definition(number, id)
    }

    #[track_caller]
    fn send_definition(&mut self, number: u32, id: TypeId) -> SyncResult<()> {
        let types = self.types();
        let data = types.get(id);
        self.push(Op::TypeDef(number));
        self.send_str(types.signature(id));
        self.send_int(kind_code(data));
        match data {
            TypeData::Primitive(primitive) => self.send_int(*primitive as i64),
            TypeData::Class(class) => {
                self.send_int(class.kind as i64);
                self.send_str(&class.fully_qualified_name);
                self.send_int(class.flags as i64);
                self.send_types(&class.type_parameters)?;
                self.send_type_opt(class.supertype)?;
                self.send_type_opt(class.owning_class)?;
                self.send_types(&class.annotations)?;
                self.send_types(&class.interfaces)?;
                self.send_types(&class.members)?;
                self.send_types(&class.methods)?;
            }
            TypeData::Parameterized(parameterized) => {
                self.send_type(parameterized.ty)?;
                self.send_types(&parameterized.type_parameters)?;
            }
            TypeData::GenericTypeVariable(variable) => {
                self.send_str(&variable.name);
                self.send_int(variable.variance as i64);
                self.send_types(&variable.bounds)?;
            }
            TypeData::Array(array) => {
                self.send_type(array.element_type)?;
                self.send_types(&array.annotations)?;
            }
            TypeData::Method(method) => {
                self.send_type(method.declaring_type)?;
                self.send_str(&method.name);
                self.send_int(method.flags as i64);
                self.send_type(method.return_type)?;
                self.send_len(method.parameter_names.len());
                for name in &method.parameter_names {
                    self.send_str(name);
                }
                self.send_types(&method.parameter_types)?;
                self.send_types(&method.thrown_exceptions)?;
                self.send_types(&method.annotations)?;
            }
            TypeData::Variable(variable) => {
                self.send_str(&variable.name);
                self.send_type_opt(variable.owner)?;
                self.send_type(variable.ty)?;
                self.send_types(&variable.annotations)?;
            }
            TypeData::Intersection(bounds) | TypeData::MultiCatch(bounds) => self.send_types(bounds)?,
            TypeData::Annotation(annotation) => {
                self.send_type(annotation.ty)?;
                self.send_len(annotation.values.len());
                for value in &annotation.values {
                    self.send_type(value.element)?;
                    self.send_len(value.values.len());
                    for item in &value.values {
                        match item {
                            AnnotationValue::Constant(constant) => {
                                self.send_int(0);
                                self.send_str(constant);
                            }
                            AnnotationValue::Type(ty) => {
                                self.send_int(1);
                                self.send_type(*ty)?;
                            }
                        }
                    }
                }
            }
            TypeData::Unknown => {}
        }
        Ok(())
    }

    #[track_caller]
    fn send_types(&mut self, ids: &[TypeId]) -> SyncResult<()> {
        self.send_len(ids.len());
        ids.iter().try_for_each(|&id| self.send_type(id))
    }

    #[track_caller]
    fn send_type_opt(&mut self, id: Option<TypeId>) -> SyncResult<()> {
        self.send_bool(id.is_some());
        id.map_or(Ok(()), |id| self.send_type(id))
    }

    /// Sends a type attribute of a node. Types compare by identity.
    #[track_caller]
    pub fn get_and_send_type(
        &mut self,
        after: Option<TypeId>,
        before: Option<Option<TypeId>>,
    ) -> SyncResult<()> {
        self.get_and_send_opt_by(
            after.as_ref(),
            before.as_ref().map(Option::as_ref),
            |after, before| after == before,
            |q, &after, _| q.send_type(after),
        )
    }
}

impl ReceiveQueue<'_> {
    /// Reads a reference written by [`SendQueue::send_type`], creating or
    /// completing the type in the store on its definition.
    pub fn decode_type(&mut self) -> SyncResult<TypeId> {
        match self.next("type")? {
            Op::TypeRef(number) => self
                .type_refs
                .refs
                .get(number as usize)
                .copied()
                .ok_or_else(|| self.desync(Desync::UnknownTypeRef(number))),
            Op::TypeDef(number) => self.define_type(number),
            op => Err(self.unexpected("type", op)),
        }
    }

    fn define_type(&mut self, number: u32) -> SyncResult<TypeId> {
        let expected = self.type_refs.refs.len() as u32;
        let completing = number < expected && self.type_refs.incomplete.remove(&number);
        if number != expected && !completing {
            return Err(self.desync(Desync::TypeDefOutOfOrder { expected, found: number }));
        }
        let signature = self.decode_str()?;
        let id = if completing {
            let id = self.type_refs.refs[number as usize];
            let cached = self.types.signature(id);
            if *cached != *signature {
                let expected = cached.into();
                return Err(self.desync(Desync::TypeSignatureMismatch { expected, found: signature }));
            }
            id
        } else {
            let id = self.types.reserve(&signature);
            if !self.type_refs.defined.insert(id) {
                return Err(SyncError::IdentityViolation(signature));
            }
            self.type_refs.refs.push(id);
            id
        };

        let data = match self.decode_int()? {
            0 => TypeData::Primitive(self.decode_enum("primitive", &Primitive::ALL)?),
            1 => TypeData::Class(Class {
                kind: self.decode_enum("class kind", &ClassKind::ALL)?,
                fully_qualified_name: self.decode_str()?,
                flags: self.decode_int()? as u64,
                type_parameters: self.decode_types()?,
                supertype: self.decode_type_opt()?,
                owning_class: self.decode_type_opt()?,
                annotations: self.decode_types()?,
                interfaces: self.decode_types()?,
                members: self.decode_types()?,
                methods: self.decode_types()?,
            }),
            2 => TypeData::Parameterized(Parameterized {
                ty: self.decode_type()?,
                type_parameters: self.decode_types()?,
            }),
            3 => TypeData::GenericTypeVariable(GenericTypeVariable {
                name: self.decode_str()?,
                variance: self.decode_enum("variance", &Variance::ALL)?,
                bounds: self.decode_types()?,
            }),
            4 => TypeData::Array(Array {
                element_type: self.decode_type()?,
                annotations: self.decode_types()?,
            }),
            5 => TypeData::Method(Method {
                declaring_type: self.decode_type()?,
                name: self.decode_str()?,
                flags: self.decode_int()? as u64,
                return_type: self.decode_type()?,
                parameter_names: {
                    let len = self.decode_len()?;
                    (0..len).map(|_| self.decode_str()).collect::<SyncResult<_>>()?
                },
                parameter_types: self.decode_types()?,
                thrown_exceptions: self.decode_types()?,
                annotations: self.decode_types()?,
            }),
            6 => TypeData::Variable(Variable {
                name: self.decode_str()?,
                owner: self.decode_type_opt()?,
                ty: self.decode_type()?,
                annotations: self.decode_types()?,
            }),
            7 => TypeData::Intersection(self.decode_types()?),
            8 => TypeData::MultiCatch(self.decode_types()?),
            9 => TypeData::Annotation(self.decode_annotation()?),
            10 => TypeData::Unknown,
            value => return Err(self.desync(Desync::InvalidDiscriminant { what: "type kind", value })),
        };

        if data == TypeData::Unknown {
            self.type_refs.incomplete.insert(number);
        }
        // An unknown definition carries nothing the store does not have.
        if data != TypeData::Unknown || self.types.is_pending(id) {
            self.types.fill(id, data);
        }
        Ok(id)
    }

    fn decode_annotation(&mut self) -> SyncResult<Annotation> {
        let ty = self.decode_type()?;
        let len = self.decode_len()?;
        let mut values = Vec::new();
        for _ in 0..len {
            let element = self.decode_type()?;
            let count = self.decode_len()?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(match self.decode_int()? {
                    0 => AnnotationValue::Constant(self.decode_str()?),
                    1 => AnnotationValue::Type(self.decode_type()?),
                    value => {
                        return Err(self.desync(Desync::InvalidDiscriminant {
                            what: "annotation value",
                            value,
                        }));
                    }
                });
            }
            values.push(ElementValue { element, values: items });
        }
        Ok(Annotation { ty, values })
    }

    fn decode_types(&mut self) -> SyncResult<Vec<TypeId>> {
        let len = self.decode_len()?;
        (0..len).map(|_| self.decode_type()).collect()
    }

    fn decode_type_opt(&mut self) -> SyncResult<Option<TypeId>> {
        if self.decode_bool()? { self.decode_type().map(Some) } else { Ok(None) }
    }

    /// Receives a type attribute of a node. Mirrors [`SendQueue::get_and_send_type`].
    pub fn receive_type(&mut self, before: Option<Option<TypeId>>) -> SyncResult<Option<TypeId>> {
        self.receive_opt(before.as_ref().map(Option::as_ref), |q, _| q.decode_type())
    }
}
