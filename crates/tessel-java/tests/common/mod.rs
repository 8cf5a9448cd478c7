#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use tessel_java::{
    Binary, Block, ClassDeclaration, CompilationUnit, Identifier, MethodDeclaration, MethodInvocation, Return,
    edit,
};
use tessel_sync::{Batch, CodecRegistry, Op, ReceiveSession, SendSession, SyncConfig, SyncResult};
use tessel_tree::{LeftPadded, Node, NodeKind, RightPadded, Space, Tree};
use tessel_types::TypeStore;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn registry() -> Arc<CodecRegistry> {
    let registry = CodecRegistry::new();
    tessel_java::register(&registry);
    Arc::new(registry)
}

/// Both ends of one connection, each with its own type store.
pub struct Peer {
    pub sender: SendSession,
    pub receiver: ReceiveSession,
    pub sender_types: TypeStore,
    pub receiver_types: TypeStore,
}

impl Peer {
    pub fn new() -> Self {
        Self::with_config(registry(), SyncConfig::default())
    }

    pub fn with_config(registry: Arc<CodecRegistry>, config: SyncConfig) -> Self {
        init_tracing();
        Self {
            sender: SendSession::new(Arc::clone(&registry), config),
            receiver: ReceiveSession::new(registry),
            sender_types: TypeStore::new(),
            receiver_types: TypeStore::new(),
        }
    }

    pub fn send(&mut self, root: &Tree) -> Vec<Batch> {
        self.sender.send_unit(root, &self.sender_types).unwrap()
    }

    pub fn receive(&mut self, batches: Vec<Batch>) -> SyncResult<Tree> {
        let mut source = VecDeque::from(batches);
        self.receiver.receive_unit(&mut source, &mut self.receiver_types)
    }

    pub fn sync(&mut self, root: &Tree) -> Tree {
        let batches = self.send(root);
        self.receive(batches).unwrap()
    }
}

pub fn ops(batches: &[Batch]) -> Vec<Op> {
    batches.iter().flat_map(|batch| batch.ops.iter().cloned()).collect()
}

/// Structural rendering. Type ids are left out since each side numbers its
/// own store.
pub fn dump(tree: &Tree) -> String {
    format!("{tree:#?}")
}

pub fn ident(name: &str) -> Tree {
    Identifier::new(name).into_tree()
}

/// ```java
/// class Greeter extends Base {
///     String greet() { return name; }
/// }
/// ```
pub struct Sample {
    pub unit: Tree,
    pub class: Tree,
    pub class_body: Tree,
    pub greet: Tree,
    pub greet_body: Tree,
    pub ret: Tree,
    pub name: Tree,
}

impl Sample {
    pub fn new() -> Self {
        let name = ident("name");
        let ret = Return::new(Some(name.clone())).with_prefix(Space::whitespace(" ")).into_tree();
        let greet_body = Block::new(vec![ret.clone()]).with_prefix(Space::whitespace(" ")).into_tree();
        let greet = MethodDeclaration::new(Some(ident("String")), ident("greet"), Some(greet_body.clone()))
            .with_prefix(Space::format("\n    // says hello\n    "))
            .into_tree();
        let class_body = Block::new(vec![greet.clone()]).with_end(Space::whitespace("\n")).into_tree();
        let class = ClassDeclaration::new(ident("Greeter"), class_body.clone())
            .with_extends(Some(LeftPadded::new(Space::whitespace(" "), ident("Base"))))
            .into_tree();
        let unit = CompilationUnit::new("src/Greeter.java", vec![class.clone()])
            .with_eof(Space::whitespace("\n"))
            .into_tree();
        Self { unit, class, class_body, greet, greet_body, ret, name }
    }

    /// The root-to-leaf path of nodes above `name`.
    pub fn path_to_name(&self) -> Vec<Tree> {
        vec![
            self.unit.clone(),
            self.class.clone(),
            self.class_body.clone(),
            self.greet.clone(),
            self.greet_body.clone(),
            self.ret.clone(),
        ]
    }
}

/// Rebuilds every node of `path` (root first) so that the last one holds
/// `leaf` in place of the child with the same id. Siblings are shared.
pub fn rebuild(path: &[Tree], leaf: Tree) -> Tree {
    path.iter().rev().fold(leaf, |child, parent| replace_child(parent, child))
}

/// Returns a copy of `parent` whose child with `child`'s id is `child`.
pub fn replace_child(parent: &Tree, child: Tree) -> Tree {
    let id = child.id();
    let swap = |tree: &Tree| if tree.id() == id { child.clone() } else { tree.clone() };
    let swap_padded = |padded: &RightPadded<Tree>| padded.clone().with_element(swap(&padded.element));

    edit::<CompilationUnit>(parent, |unit| {
        let classes = unit.classes.iter().map(swap_padded).collect();
        unit.with_classes(classes)
    })
    .or_else(|| {
        edit::<ClassDeclaration>(parent, |class| {
            let name = swap(&class.name);
            let body = swap(&class.body);
            class.with_name(name).with_body(body)
        })
    })
    .or_else(|| {
        edit::<Block>(parent, |block| {
            let statements = block.statements.iter().map(swap_padded).collect();
            block.with_statements(statements)
        })
    })
    .or_else(|| {
        edit::<MethodDeclaration>(parent, |method| {
            let name = swap(&method.name);
            let body = method.body.as_ref().map(swap);
            method.with_name(name).with_body(body)
        })
    })
    .or_else(|| {
        edit::<Return>(parent, |ret| {
            let expression = ret.expression.as_ref().map(swap);
            ret.with_expression(expression)
        })
    })
    .or_else(|| {
        edit::<Binary>(parent, |binary| {
            let left = swap(&binary.left);
            let right = swap(&binary.right);
            binary.with_left(left).with_right(right)
        })
    })
    .or_else(|| {
        edit::<MethodInvocation>(parent, |invocation| {
            let name = swap(&invocation.name);
            invocation.with_name(name)
        })
    })
    .unwrap_or_else(|| panic!("cannot replace a child of {}", parent.kind()))
}

pub fn node<N: Node>(tree: &Tree) -> &N {
    tree.downcast_ref::<N>().unwrap_or_else(|| panic!("expected {}, found {}", std::any::type_name::<N>(), tree.kind()))
}
