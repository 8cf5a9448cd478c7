use std::fmt::Write as _;

use crate::{AnnotationValue, TypeData, TypeId, TypeStore, Variance};

impl TypeStore {
    /// Computes the signature `data` is deduplicated under.
    ///
    /// Referenced entities contribute the signature they are stored under, so
    /// a reference to an entity that is still being built resolves to the
    /// signature it was reserved with and the computation never follows a cycle.
    pub fn signature_of(&self, data: &TypeData) -> String {
        let mut out = String::new();
        match data {
            TypeData::Primitive(primitive) => out.push_str(primitive.keyword()),
            TypeData::Class(class) => out.push_str(&class.fully_qualified_name),
            TypeData::Parameterized(parameterized) => {
                out.push_str(self.signature(parameterized.ty));
                out.push('<');
                self.join(&mut out, &parameterized.type_parameters, ", ");
                out.push('>');
            }
            TypeData::GenericTypeVariable(variable) => {
                out.push_str("Generic{");
                match variable.variance {
                    Variance::Invariant => out.push_str(&variable.name),
                    Variance::Covariant => {
                        let _ = write!(out, "{} extends ", variable.name);
                        self.join(&mut out, &variable.bounds, " & ");
                    }
                    Variance::Contravariant => {
                        let _ = write!(out, "{} super ", variable.name);
                        self.join(&mut out, &variable.bounds, " & ");
                    }
                }
                out.push('}');
            }
            TypeData::Array(array) => {
                out.push_str(self.signature(array.element_type));
                out.push_str("[]");
            }
            TypeData::Method(method) => {
                let _ = write!(
                    out,
                    "{}{{name={},return={},parameters=[",
                    self.signature(method.declaring_type),
                    method.name,
                    self.signature(method.return_type),
                );
                self.join(&mut out, &method.parameter_types, ",");
                out.push_str("]}");
            }
            TypeData::Variable(variable) => {
                if let Some(owner) = variable.owner {
                    out.push_str(self.signature(owner));
                }
                let _ = write!(
                    out,
                    "{{name={},type={}}}",
                    variable.name,
                    self.signature(variable.ty)
                );
            }
            TypeData::Intersection(bounds) => self.join(&mut out, bounds, " & "),
            TypeData::MultiCatch(throwables) => self.join(&mut out, throwables, " | "),
            TypeData::Annotation(annotation) => {
                out.push('@');
                out.push_str(self.signature(annotation.ty));
                if !annotation.values.is_empty() {
                    out.push('(');
                    for (i, value) in annotation.values.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let element = match self.data(value.element) {
                            Some(TypeData::Method(method)) => &*method.name,
                            _ => self.signature(value.element),
                        };
                        let _ = write!(out, "{element}=[");
                        for (j, item) in value.values.iter().enumerate() {
                            if j > 0 {
                                out.push_str(", ");
                            }
                            match item {
                                AnnotationValue::Constant(constant) => out.push_str(constant),
                                AnnotationValue::Type(ty) => out.push_str(self.signature(*ty)),
                            }
                        }
                        out.push(']');
                    }
                    out.push(')');
                }
            }
            TypeData::Unknown => out.push_str("{undefined}"),
        }
        out
    }

    fn join(&self, out: &mut String, ids: &[TypeId], separator: &str) {
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_str(self.signature(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use crate::*;

    #[test]
    fn signatures() {
        let mut store = TypeStore::new();
        let int = store.primitive(Primitive::Int);
        let string = store.intern(TypeData::Class(Class::new(ClassKind::Class, "java.lang.String")));
        let list = store.intern(TypeData::Class(Class::new(ClassKind::Interface, "java.util.List")));
        let list_of_string = store.intern(TypeData::Parameterized(Parameterized {
            ty: list,
            type_parameters: vec![string],
        }));
        let t = store.intern(TypeData::GenericTypeVariable(GenericTypeVariable {
            name: "T".into(),
            variance: Variance::Covariant,
            bounds: vec![string, list],
        }));
        let array = store.intern(TypeData::Array(Array { element_type: int, annotations: vec![] }));
        let method = store.intern(TypeData::Method(Method {
            declaring_type: list,
            name: "get".into(),
            flags: 0,
            return_type: string,
            parameter_names: vec!["index".into()],
            parameter_types: vec![int],
            thrown_exceptions: vec![],
            annotations: vec![],
        }));
        let field = store.intern(TypeData::Variable(Variable {
            name: "size".into(),
            owner: Some(list),
            ty: int,
            annotations: vec![],
        }));
        let catch = store.intern(TypeData::MultiCatch(vec![string, list]));

        let actual = [list_of_string, t, array, method, field, catch]
            .map(|id| store.signature(id).to_owned())
            .join("\n");
        expect![[r#"
            java.util.List<java.lang.String>
            Generic{T extends java.lang.String & java.util.List}
            int[]
            java.util.List{name=get,return=java.lang.String,parameters=[int]}
            java.util.List{name=size,type=int}
            java.lang.String | java.util.List"#]]
        .assert_eq(&actual);
    }
}
