//! Java node kinds.
//!
//! Nodes are immutable once shared. Every `with_*` method returns a copy
//! with the same id, which is how an edit produces the next version of a
//! node without disturbing readers of the previous one.

use camino::Utf8PathBuf;
use tessel_tree::{
    Container, LeftPadded, Marker, MarkerKind, Markers, Node, NodeId, NodeKind, RightPadded, Same, Space, Tree,
};
use tessel_types::TypeId;

macro_rules! nodes {
    ($($ty:ident => $tag:literal),* $(,)?) => {
        $(
            impl Node for $ty {
                fn kind(&self) -> &'static str {
                    Self::KIND
                }

                fn id(&self) -> NodeId {
                    self.id
                }

                fn prefix(&self) -> &Space {
                    &self.prefix
                }

                fn markers(&self) -> &Markers {
                    &self.markers
                }
            }

            impl NodeKind for $ty {
                const KIND: &'static str = $tag;
            }

            impl $ty {
                pub fn with_prefix(self, prefix: Space) -> Self {
                    Self { prefix, ..self }
                }

                pub fn with_markers(self, markers: Markers) -> Self {
                    Self { markers, ..self }
                }
            }
        )*
    };
}

nodes! {
    CompilationUnit => "java.CompilationUnit",
    ClassDeclaration => "java.ClassDeclaration",
    MethodDeclaration => "java.MethodDeclaration",
    Block => "java.Block",
    Identifier => "java.Identifier",
    Literal => "java.Literal",
    MethodInvocation => "java.MethodInvocation",
    Return => "java.Return",
    Binary => "java.Binary",
}

/// A source file: the top-level unit of synchronization.
#[derive(Clone, Debug)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    pub source_path: Utf8PathBuf,
    pub classes: Vec<RightPadded<Tree>>,
    /// Formatting before the end of the file.
    pub eof: Space,
}

impl CompilationUnit {
    pub fn new(source_path: impl Into<Utf8PathBuf>, classes: Vec<Tree>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            source_path: source_path.into(),
            classes: classes.into_iter().map(|class| RightPadded::new(class, Space::EMPTY)).collect(),
            eof: Space::EMPTY,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &Tree> {
        self.classes.iter().map(|padded| &padded.element)
    }

    pub fn with_source_path(self, source_path: impl Into<Utf8PathBuf>) -> Self {
        Self { source_path: source_path.into(), ..self }
    }

    pub fn with_classes(self, classes: Vec<RightPadded<Tree>>) -> Self {
        Self { classes, ..self }
    }

    pub fn with_eof(self, eof: Space) -> Self {
        Self { eof, ..self }
    }
}

#[derive(Clone, Debug)]
pub struct ClassDeclaration {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    pub name: Tree,
    pub extends: Option<LeftPadded<Tree>>,
    pub body: Tree,
    pub ty: Option<TypeId>,
}

impl ClassDeclaration {
    pub fn new(name: Tree, body: Tree) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            name,
            extends: None,
            body,
            ty: None,
        }
    }

    pub fn with_name(self, name: Tree) -> Self {
        Self { name, ..self }
    }

    pub fn with_extends(self, extends: Option<LeftPadded<Tree>>) -> Self {
        Self { extends, ..self }
    }

    pub fn with_body(self, body: Tree) -> Self {
        Self { body, ..self }
    }

    pub fn with_type(self, ty: Option<TypeId>) -> Self {
        Self { ty, ..self }
    }
}

#[derive(Clone, Debug)]
pub struct MethodDeclaration {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    /// Absent for constructors.
    pub return_type: Option<Tree>,
    pub name: Tree,
    pub parameters: Container<Tree>,
    /// Absent for abstract and interface methods.
    pub body: Option<Tree>,
    pub method_type: Option<TypeId>,
}

impl MethodDeclaration {
    pub fn new(return_type: Option<Tree>, name: Tree, body: Option<Tree>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            return_type,
            name,
            parameters: Container::empty(),
            body,
            method_type: None,
        }
    }

    pub fn with_return_type(self, return_type: Option<Tree>) -> Self {
        Self { return_type, ..self }
    }

    pub fn with_name(self, name: Tree) -> Self {
        Self { name, ..self }
    }

    pub fn with_parameters(self, parameters: Container<Tree>) -> Self {
        Self { parameters, ..self }
    }

    pub fn with_body(self, body: Option<Tree>) -> Self {
        Self { body, ..self }
    }

    pub fn with_method_type(self, method_type: Option<TypeId>) -> Self {
        Self { method_type, ..self }
    }
}

#[derive(Clone, Debug)]
pub struct Block {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    pub statements: Vec<RightPadded<Tree>>,
    /// Formatting before the closing brace.
    pub end: Space,
}

impl Block {
    pub fn new(statements: Vec<Tree>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            statements: statements
                .into_iter()
                .map(|statement| RightPadded::new(statement, Space::EMPTY))
                .collect(),
            end: Space::EMPTY,
        }
    }

    pub fn statements(&self) -> impl Iterator<Item = &Tree> {
        self.statements.iter().map(|padded| &padded.element)
    }

    pub fn with_statements(self, statements: Vec<RightPadded<Tree>>) -> Self {
        Self { statements, ..self }
    }

    pub fn with_end(self, end: Space) -> Self {
        Self { end, ..self }
    }
}

#[derive(Clone, Debug)]
pub struct Identifier {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    pub simple_name: String,
    pub ty: Option<TypeId>,
}

impl Identifier {
    pub fn new(simple_name: impl Into<String>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            simple_name: simple_name.into(),
            ty: None,
        }
    }

    pub fn with_simple_name(self, simple_name: impl Into<String>) -> Self {
        Self { simple_name: simple_name.into(), ..self }
    }

    pub fn with_type(self, ty: Option<TypeId>) -> Self {
        Self { ty, ..self }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Bool(bool),
    Char(char),
    Int(i64),
    Float(f64),
    String(String),
}

impl Same for LiteralValue {
    fn same(&self, before: &Self) -> bool {
        match (self, before) {
            (Self::Float(after), Self::Float(before)) => after.same(before),
            _ => self == before,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Literal {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    /// `None` for the `null` literal.
    pub value: Option<LiteralValue>,
    /// The literal as written, e.g. `0x1F` or `"a\tb"`.
    pub value_source: String,
    pub ty: Option<TypeId>,
}

impl Literal {
    pub fn new(value: Option<LiteralValue>, value_source: impl Into<String>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            value,
            value_source: value_source.into(),
            ty: None,
        }
    }

    pub fn int(value: i64) -> Self {
        Self::new(Some(LiteralValue::Int(value)), value.to_string())
    }

    pub fn with_value(self, value: Option<LiteralValue>, value_source: impl Into<String>) -> Self {
        Self { value, value_source: value_source.into(), ..self }
    }

    pub fn with_type(self, ty: Option<TypeId>) -> Self {
        Self { ty, ..self }
    }
}

#[derive(Clone, Debug)]
pub struct MethodInvocation {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    /// The receiver expression and the space before its `.`.
    pub select: Option<RightPadded<Tree>>,
    pub name: Tree,
    pub arguments: Container<Tree>,
    pub method_type: Option<TypeId>,
}

impl MethodInvocation {
    pub fn new(select: Option<Tree>, name: Tree, arguments: Vec<Tree>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            select: select.map(|select| RightPadded::new(select, Space::EMPTY)),
            name,
            arguments: Container::new(
                Space::EMPTY,
                arguments.into_iter().map(|argument| RightPadded::new(argument, Space::EMPTY)).collect(),
            ),
            method_type: None,
        }
    }

    pub fn with_select(self, select: Option<RightPadded<Tree>>) -> Self {
        Self { select, ..self }
    }

    pub fn with_name(self, name: Tree) -> Self {
        Self { name, ..self }
    }

    pub fn with_arguments(self, arguments: Container<Tree>) -> Self {
        Self { arguments, ..self }
    }

    pub fn with_method_type(self, method_type: Option<TypeId>) -> Self {
        Self { method_type, ..self }
    }
}

#[derive(Clone, Debug)]
pub struct Return {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    pub expression: Option<Tree>,
}

impl Return {
    pub fn new(expression: Option<Tree>) -> Self {
        Self { id: NodeId::random(), prefix: Space::EMPTY, markers: Markers::empty(), expression }
    }

    pub fn with_expression(self, expression: Option<Tree>) -> Self {
        Self { expression, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub const ALL: [Self; 11] = [
        Self::Addition,
        Self::Subtraction,
        Self::Multiplication,
        Self::Division,
        Self::Modulo,
        Self::LessThan,
        Self::GreaterThan,
        Self::Equal,
        Self::NotEqual,
        Self::And,
        Self::Or,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Multiplication => "*",
            Self::Division => "/",
            Self::Modulo => "%",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl Same for BinaryOperator {
    fn same(&self, before: &Self) -> bool {
        self == before
    }
}

#[derive(Clone, Debug)]
pub struct Binary {
    pub id: NodeId,
    pub prefix: Space,
    pub markers: Markers,
    pub left: Tree,
    pub operator: LeftPadded<BinaryOperator>,
    pub right: Tree,
    pub ty: Option<TypeId>,
}

impl Binary {
    pub fn new(left: Tree, operator: BinaryOperator, right: Tree) -> Self {
        Self {
            id: NodeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::empty(),
            left,
            operator: LeftPadded::new(Space::whitespace(" "), operator),
            right,
            ty: None,
        }
    }

    pub fn with_left(self, left: Tree) -> Self {
        Self { left, ..self }
    }

    pub fn with_operator(self, operator: LeftPadded<BinaryOperator>) -> Self {
        Self { operator, ..self }
    }

    pub fn with_right(self, right: Tree) -> Self {
        Self { right, ..self }
    }

    pub fn with_type(self, ty: Option<TypeId>) -> Self {
        Self { ty, ..self }
    }
}

/// Records a trailing comma after the last element of a list, which the
/// tree has no other place for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrailingComma {
    pub id: NodeId,
    /// Formatting after the comma.
    pub suffix: Space,
}

impl TrailingComma {
    pub fn new(suffix: Space) -> Self {
        Self { id: NodeId::random(), suffix }
    }
}

impl Marker for TrailingComma {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn id(&self) -> NodeId {
        self.id
    }
}

impl MarkerKind for TrailingComma {
    const KIND: &'static str = "java.TrailingComma";
}

/// Rebuilds `tree` as a `N` with `edit` applied, keeping its id.
///
/// Returns `None` when `tree` is not a `N`.
pub fn edit<N: NodeKind + Clone>(tree: &Tree, f: impl FnOnce(N) -> N) -> Option<Tree> {
    let node = tree.downcast_ref::<N>()?.clone();
    Some(f(node).into_tree())
}
