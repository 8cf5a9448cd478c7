mod common;

use std::collections::VecDeque;
use std::sync::Arc;

use common::{Peer, Sample, dump, ident, node, ops, rebuild, registry};
use expect_test::expect;
use pretty_assertions::assert_eq;
use tessel_java::{
    Binary, BinaryOperator, Block, ClassDeclaration, CompilationUnit, Identifier, Literal, LiteralValue,
    MethodDeclaration, MethodInvocation, Return, TrailingComma, edit,
};
use tessel_sync::{Batch, Desync, Op, SyncConfig, SyncError, UnitOutcome, render_trace};
use tessel_tree::{Markers, Markup, MarkupLevel, Node, NodeId, NodeKind, RightPadded, SearchResult, Space, Tree};
use tessel_types::{Class, ClassKind, Method, Primitive, TypeData, TypeId, TypeStore};

#[test]
fn first_contact_round_trip() {
    let mut peer = Peer::new();
    let sample = Sample::new();
    let received = peer.sync(&sample.unit);

    assert_eq!(dump(&received), dump(&sample.unit));
    assert!(peer.receiver.baseline(sample.unit.id()).is_some());
    assert!(!peer.receiver.needs_full_resend());

    let class = node::<ClassDeclaration>(received_class(&received));
    let greet = node::<MethodDeclaration>(&node::<Block>(&class.body).statements[0].element);
    assert_eq!(greet.prefix.comments[0].text, " says hello");
}

fn received_class(unit: &Tree) -> &Tree {
    &node::<CompilationUnit>(unit).classes[0].element
}

#[test]
fn resending_an_identical_unit_costs_one_op() {
    let mut peer = Peer::new();
    let sample = Sample::new();
    let first = peer.sync(&sample.unit);

    let batches = peer.send(&sample.unit);
    expect![[r#"
        id
        unchanged
        end-unit
    "#]]
    .assert_eq(&render_trace(&batches));
    let second = peer.receive(batches).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn leaf_edit_sends_only_the_path_to_it() {
    let mut peer = Peer::new();
    let sample = Sample::new();
    let first = peer.sync(&sample.unit);

    let title = edit::<Identifier>(&sample.name, |name| name.with_simple_name("title")).unwrap();
    let unit = rebuild(&sample.path_to_name(), title);
    let batches = peer.send(&unit);
    expect![[r#"
        id
        changed
        str "java.CompilationUnit"
        id
        unchanged
        unchanged
        unchanged
        changed
        update
        changed
        changed
        str "java.ClassDeclaration"
        id
        unchanged
        unchanged
        unchanged
        unchanged
        changed
        str "java.Block"
        id
        unchanged
        unchanged
        changed
        update
        changed
        changed
        str "java.MethodDeclaration"
        id
        unchanged
        unchanged
        unchanged
        unchanged
        unchanged
        changed
        str "java.Block"
        id
        unchanged
        unchanged
        changed
        update
        changed
        changed
        str "java.Return"
        id
        unchanged
        unchanged
        changed
        str "java.Identifier"
        id
        unchanged
        unchanged
        changed
        str "title"
        unchanged
        unchanged
        unchanged
        end-list
        unchanged
        unchanged
        unchanged
        unchanged
        end-list
        unchanged
        unchanged
        unchanged
        unchanged
        end-list
        unchanged
        end-unit
    "#]]
    .assert_eq(&render_trace(&batches));

    // Payloads are the primitives that do not follow a kind tag.
    let ops = ops(&batches);
    let payloads: Vec<&Op> = ops
        .iter()
        .enumerate()
        .filter(|&(i, op)| match op {
            Op::Str(_) => !matches!(ops.get(i + 1), Some(Op::Id(_))),
            Op::Int(_) | Op::Float(_) | Op::Bool(_) | Op::Bytes(_) => true,
            _ => false,
        })
        .map(|(_, op)| op)
        .collect();
    assert_eq!(payloads, [&Op::Str("title".into())]);

    let second = peer.receive(batches).unwrap();
    assert_eq!(dump(&second), dump(&unit));

    let before = node::<ClassDeclaration>(received_class(&first));
    let after = node::<ClassDeclaration>(received_class(&second));
    assert!(Arc::ptr_eq(&before.name, &after.name));
    assert!(Arc::ptr_eq(
        &before.extends.as_ref().unwrap().element,
        &after.extends.as_ref().unwrap().element,
    ));
    assert!(!Arc::ptr_eq(&before.body, &after.body));
}

#[test]
fn list_edit_keeps_surviving_elements() {
    let mut peer = Peer::new();
    let (a, b, c, d) = (ident("a"), ident("b"), ident("c"), ident("d"));
    let block = Block::new(vec![a, b, c]).into_tree();
    let first = peer.sync(&block);

    let next = edit::<Block>(&block, |block| {
        let mut statements = block.statements[1..].to_vec();
        statements.push(RightPadded::new(d, Space::EMPTY));
        block.with_statements(statements)
    })
    .unwrap();
    let batches = peer.send(&next);
    expect![[r#"
        id
        changed
        str "java.Block"
        id
        unchanged
        unchanged
        changed
        delete 1
        keep 2
        insert
        changed-from-null
        changed-from-null
        str "java.Identifier"
        id
        changed-from-null
        str ""
        int 0
        changed-from-null
        id
        changed-from-null
        int 0
        changed-from-null
        str "d"
        changed-to-null
        changed-from-null
        str ""
        int 0
        changed-from-null
        id
        changed-from-null
        int 0
        end-list
        unchanged
        end-unit
    "#]]
    .assert_eq(&render_trace(&batches));

    let second = peer.receive(batches).unwrap();
    assert_eq!(dump(&second), dump(&next));
    let before: Vec<&Tree> = node::<Block>(&first).statements().collect();
    let after: Vec<&Tree> = node::<Block>(&second).statements().collect();
    assert!(Arc::ptr_eq(before[1], after[0]));
    assert!(Arc::ptr_eq(before[2], after[1]));
    assert_eq!(node::<Identifier>(after[2]).simple_name, "d");
}

#[test]
fn reordered_statements_keep_their_identity() {
    let mut peer = Peer::new();
    let block = Block::new(vec![ident("a"), ident("b"), ident("c")]).into_tree();
    let first = peer.sync(&block);

    let next = edit::<Block>(&block, |block| {
        let mut statements = block.statements.clone();
        statements.rotate_right(1);
        block.with_statements(statements)
    })
    .unwrap();
    let batches = peer.send(&next);
    let trace = render_trace(&batches);
    assert!(trace.contains("move 2\nunchanged\nkeep 2\n"), "{trace}");
    assert!(!trace.contains("insert"));

    let second = peer.receive(batches).unwrap();
    let before: Vec<&Tree> = node::<Block>(&first).statements().collect();
    let after: Vec<&Tree> = node::<Block>(&second).statements().collect();
    assert!(Arc::ptr_eq(before[2], after[0]));
    assert!(Arc::ptr_eq(before[0], after[1]));
    assert!(Arc::ptr_eq(before[1], after[2]));
}

#[test]
fn null_transitions() {
    let mut peer = Peer::new();
    let sample = Sample::new();
    peer.sync(&sample.unit);

    let bare = edit::<Return>(&sample.ret, |ret| ret.with_expression(None)).unwrap();
    let unit = rebuild(&sample.path_to_name()[..5], bare.clone());
    let batches = peer.send(&unit);
    assert!(render_trace(&batches).contains("str \"java.Return\"\nid\nunchanged\nunchanged\nchanged-to-null\n"));
    let received = peer.receive(batches).unwrap();
    assert_eq!(dump(&received), dump(&unit));

    let restored = edit::<Return>(&bare, |ret| ret.with_expression(Some(ident("other")))).unwrap();
    let unit = rebuild(&sample.path_to_name()[..5], restored);
    let batches = peer.send(&unit);
    assert!(render_trace(&batches).contains("unchanged\nunchanged\nchanged-from-null\nstr \"java.Identifier\"\nid\n"));
    let received = peer.receive(batches).unwrap();
    assert_eq!(dump(&received), dump(&unit));

    let abstract_method = edit::<MethodDeclaration>(&sample.greet, |method| method.with_body(None)).unwrap();
    let unit = rebuild(&sample.path_to_name()[..3], abstract_method);
    let received = peer.sync(&unit);
    assert_eq!(dump(&received), dump(&unit));
}

/// `demo.Greeter` declares `String greet()`, whose declaring type is the
/// class itself.
fn greeter_types(types: &mut TypeStore) -> (TypeId, TypeId, TypeId) {
    let string = types.primitive(Primitive::String);
    let class = types.reserve("demo.Greeter");
    let greet = types.intern(TypeData::Method(Method {
        declaring_type: class,
        name: "greet".into(),
        flags: 1,
        return_type: string,
        parameter_names: vec![],
        parameter_types: vec![],
        thrown_exceptions: vec![],
        annotations: vec![],
    }));
    types.fill(
        class,
        TypeData::Class(Class { methods: vec![greet], ..Class::new(ClassKind::Class, "demo.Greeter") }),
    );
    (class, greet, string)
}

fn typed_unit(class: TypeId, greet: TypeId, string: TypeId) -> Tree {
    let method = MethodDeclaration::new(
        Some(Identifier::new("String").with_type(Some(string)).into_tree()),
        ident("greet"),
        Some(Block::new(vec![]).into_tree()),
    )
    .with_method_type(Some(greet))
    .into_tree();
    let name = Identifier::new("Greeter").with_type(Some(class)).into_tree();
    let declaration =
        ClassDeclaration::new(name, Block::new(vec![method]).into_tree()).with_type(Some(class)).into_tree();
    CompilationUnit::new("src/Greeter.java", vec![declaration]).into_tree()
}

#[test]
fn cyclic_types_are_sent_once_and_keep_identity() {
    let mut peer = Peer::new();
    let (class, greet, string) = greeter_types(&mut peer.sender_types);

    let batches = peer.send(&typed_unit(class, greet, string));
    let defs = ops(&batches).iter().filter(|op| matches!(op, Op::TypeDef(_))).count();
    assert_eq!(defs, 3);
    let received = peer.receive(batches).unwrap();

    let types = &peer.receiver_types;
    let declaration = node::<ClassDeclaration>(received_class(&received));
    let class = declaration.ty.unwrap();
    assert_eq!(node::<Identifier>(&declaration.name).ty, Some(class));
    assert_eq!(&*types.get(class).as_class().unwrap().fully_qualified_name, "demo.Greeter");

    let method = node::<MethodDeclaration>(&node::<Block>(&declaration.body).statements[0].element);
    let greet = method.method_type.unwrap();
    let signature = types.get(greet).as_method().unwrap();
    assert_eq!(signature.declaring_type, class);
    assert_eq!(types.get(class).as_class().unwrap().methods, [greet]);
    assert_eq!(node::<Identifier>(method.return_type.as_ref().unwrap()).ty, Some(signature.return_type));
    assert_eq!(types.signature(signature.return_type), "String");
}

#[test]
fn types_are_referenced_across_units() {
    let mut peer = Peer::new();
    let (class, greet, string) = greeter_types(&mut peer.sender_types);
    let first = peer.sync(&typed_unit(class, greet, string));

    let other = CompilationUnit::new(
        "src/Main.java",
        vec![ClassDeclaration::new(ident("Main"), Block::new(vec![]).into_tree()).with_type(Some(class)).into_tree()],
    )
    .into_tree();
    let batches = peer.send(&other);
    let ops = ops(&batches);
    assert!(ops.contains(&Op::TypeRef(0)));
    assert!(!ops.iter().any(|op| matches!(op, Op::TypeDef(_))));

    let second = peer.receive(batches).unwrap();
    assert_eq!(
        node::<ClassDeclaration>(received_class(&first)).ty,
        node::<ClassDeclaration>(received_class(&second)).ty,
    );
}

#[test]
fn truncated_stream_forces_a_full_resend() {
    let mut peer = Peer::new();
    let sample = Sample::new();
    peer.sync(&sample.unit);

    let title = edit::<Identifier>(&sample.name, |name| name.with_simple_name("title")).unwrap();
    let unit = rebuild(&sample.path_to_name(), title);
    let mut ops = ops(&peer.send(&unit));
    ops.truncate(ops.len() - 4);
    let err = peer.receive(vec![Batch { ops, sites: vec![] }]).unwrap_err();
    assert!(matches!(err, SyncError::Desync { reason: Desync::Exhausted { .. }, .. }), "{err}");
    assert!(peer.receiver.needs_full_resend());
    assert!(peer.receiver.baseline(unit.id()).is_none());

    // The sender still believes the receiver holds `unit`.
    let batches = peer.send(&unit);
    let err = peer.receive(batches).unwrap_err();
    assert!(matches!(err, SyncError::Desync { reason: Desync::UnchangedWithoutBaseline, .. }), "{err}");

    peer.sender.reset();
    let received = peer.sync(&unit);
    assert_eq!(dump(&received), dump(&unit));
    assert!(!peer.receiver.needs_full_resend());
}

#[test]
fn trailing_ops_are_a_desync() {
    let mut peer = Peer::new();
    let block = Block::new(vec![]).into_tree();
    let mut ops = ops(&peer.send(&block));
    ops.insert(ops.len() - 1, Op::Int(7));
    let err = peer.receive(vec![Batch { ops, sites: vec![] }]).unwrap_err();
    assert!(matches!(err, SyncError::Desync { reason: Desync::TrailingOps { found: Op::Int(7) }, .. }), "{err}");
}

#[test]
fn oversized_counts_are_a_desync() {
    let id = Op::Id(*NodeId::random().as_bytes());
    let header = [id.clone(), Op::ChangedFromNull, Op::Str("java.Block".into()), id];

    // The comment count of a prefix.
    let mut peer = Peer::new();
    let mut ops = header.to_vec();
    ops.extend([Op::ChangedFromNull, Op::Str("".into()), Op::Int(i64::MAX), Op::EndUnit]);
    let err = peer.receive(vec![Batch { ops, sites: vec![] }]).unwrap_err();
    assert!(matches!(err, SyncError::Desync { .. }), "{err}");
    assert!(peer.receiver.needs_full_resend());

    // The length of a list sent on first contact.
    let mut peer = Peer::new();
    let mut ops = header.to_vec();
    ops.extend([Op::ChangedFromNull, Op::Str("".into()), Op::Int(0)]);
    ops.extend([Op::ChangedFromNull, Op::Id(*NodeId::random().as_bytes()), Op::ChangedFromNull, Op::Int(0)]);
    ops.extend([Op::ChangedFromNull, Op::Int(i64::MAX), Op::EndUnit]);
    let err = peer.receive(vec![Batch { ops, sites: vec![] }]).unwrap_err();
    assert!(
        matches!(err, SyncError::Desync { reason: Desync::UnexpectedOp { found: Op::EndUnit, .. }, .. }),
        "{err}"
    );
    assert!(peer.receiver.needs_full_resend());
}

#[test]
fn full_resend_follows_a_broken_unit_on_the_same_transport() {
    let mut peer = Peer::with_config(registry(), SyncConfig::default().with_batch_size(4));
    let sample = Sample::new();
    let other = Block::new(vec![ident("other")]).into_tree();

    let mut broken = peer.send(&sample.unit);
    assert!(broken.len() > 2);
    broken[1].ops[0] = Op::Int(0);
    let mut transport = VecDeque::<Batch>::new();
    transport.extend(broken);
    transport.extend(peer.send(&other));

    let err = peer.receiver.receive_unit(&mut transport, &mut peer.receiver_types).unwrap_err();
    assert!(matches!(err, SyncError::Desync { .. }), "{err}");
    assert!(peer.receiver.needs_full_resend());

    // The unit queued behind the broken one is read from its start.
    let received = peer.receiver.receive_unit(&mut transport, &mut peer.receiver_types).unwrap();
    assert_eq!(dump(&received), dump(&other));
    assert!(transport.is_empty());

    peer.sender.reset();
    transport.extend(peer.send(&sample.unit));
    let received = peer.receiver.receive_unit(&mut transport, &mut peer.receiver_types).unwrap();
    assert_eq!(dump(&received), dump(&sample.unit));
    assert!(!peer.receiver.needs_full_resend());
    assert!(transport.is_empty());
}

#[test]
fn reusing_an_id_for_another_kind_fails_to_send() {
    let mut peer = Peer::new();
    let name = ident("a");
    let block = Block::new(vec![name.clone()]).into_tree();
    peer.sync(&block);

    let literal = Literal { id: name.id(), ..Literal::int(1) }.into_tree();
    let next = rebuild(&[block.clone()], literal);
    let err = peer.sender.send_unit(&next, &peer.sender_types).unwrap_err();
    assert!(
        matches!(&err, SyncError::ShapeMismatch { expected, found }
            if &**expected == "java.Literal" && &**found == "java.Identifier"),
        "{err}"
    );
    assert!(err.is_session_fatal());
    assert!(Arc::ptr_eq(peer.sender.baseline(block.id()).unwrap(), &block));
}

#[test]
fn reusing_an_id_for_another_kind_fails_to_receive() {
    let mut peer = Peer::new();
    let name = ident("a");
    let block = Block::new(vec![name.clone()]).into_tree();
    peer.sync(&block);

    let renamed = edit::<Identifier>(&name, |name| name.with_simple_name("b")).unwrap();
    let mut ops = ops(&peer.send(&rebuild(&[block], renamed)));
    let tag = ops.iter().position(|op| *op == Op::Str("java.Identifier".into())).unwrap();
    ops[tag] = Op::Str("java.Literal".into());

    let err = peer.receive(vec![Batch { ops, sites: vec![] }]).unwrap_err();
    assert!(
        matches!(&err, SyncError::ShapeMismatch { expected, found }
            if &**expected == "java.Literal" && &**found == "java.Identifier"),
        "{err}"
    );
    assert!(peer.receiver.needs_full_resend());
}

#[test]
fn repeated_statements_share_one_object() {
    let mut peer = Peer::new();
    let block = Block::new(vec![ident("a"), ident("b")]).into_tree();
    let first = peer.sync(&block);

    let next = edit::<Block>(&block, |block| {
        let mut statements = block.statements.clone();
        statements.push(statements[0].clone());
        block.with_statements(statements)
    })
    .unwrap();
    let batches = peer.send(&next);
    let trace = render_trace(&batches);
    assert!(trace.contains("keep 2\nmove 0\nunchanged\nend-list\n"), "{trace}");
    assert!(!trace.contains("insert"));

    let second = peer.receive(batches).unwrap();
    let before: Vec<&Tree> = node::<Block>(&first).statements().collect();
    let after: Vec<&Tree> = node::<Block>(&second).statements().collect();
    assert!(Arc::ptr_eq(before[0], after[0]));
    assert!(Arc::ptr_eq(before[0], after[2]));
}

#[test]
fn binary_expressions_carry_their_type() {
    let mut peer = Peer::new();
    let int = peer.sender_types.primitive(Primitive::Int);
    let sum = Binary::new(Literal::int(1).into_tree(), BinaryOperator::Addition, ident("x"))
        .with_type(Some(int))
        .into_tree();
    let block = Block::new(vec![sum.clone()]).into_tree();
    let received = peer.sync(&block);
    let ty = node::<Binary>(&node::<Block>(&received).statements[0].element).ty.unwrap();
    assert_eq!(peer.receiver_types.signature(ty), "int");

    let untyped = edit::<Binary>(&sum, |binary| binary.with_type(None)).unwrap();
    let next = rebuild(&[block], untyped);
    let batches = peer.send(&next);
    assert!(ops(&batches).contains(&Op::ChangedToNull));
    let received = peer.receive(batches).unwrap();
    assert_eq!(node::<Binary>(&node::<Block>(&received).statements[0].element).ty, None);
}

#[test]
fn traced_desync_names_the_sending_site() {
    let mut peer = Peer::with_config(registry(), SyncConfig::default().with_trace(true).with_batch_size(4));
    let sample = Sample::new();
    let mut batches = peer.send(&sample.unit);
    assert!(batches.len() > 1);
    assert!(batches.iter().all(|batch| batch.sites.len() == batch.ops.len()));

    let (batch, index) = batches
        .iter()
        .enumerate()
        .find_map(|(b, batch)| batch.ops.iter().position(|op| *op == Op::Str("Greeter".into())).map(|i| (b, i)))
        .unwrap();
    batches[batch].ops[index] = Op::Bool(true);

    let err = peer.receive(batches).unwrap_err();
    let SyncError::Desync { reason, site } = &err else { panic!("unexpected error: {err}") };
    assert_eq!(*reason, Desync::UnexpectedOp { expected: "string", found: Op::Bool(true) });
    assert!(site.as_deref().is_some_and(|site| site.contains(".rs:")), "{err}");
}

#[test]
fn batches_survive_the_wire() {
    let mut peer = Peer::with_config(registry(), SyncConfig::default().with_batch_size(8));
    let sample = Sample::new();
    let batches = peer.send(&sample.unit);
    assert!(batches.iter().all(|batch| batch.len() <= 8));

    let wire: Vec<Vec<u8>> = batches.iter().map(|batch| batch.to_bytes().unwrap()).collect();
    let decoded = wire.iter().map(|bytes| Batch::from_bytes(bytes).unwrap()).collect();
    let received = peer.receive(decoded).unwrap();
    assert_eq!(dump(&received), dump(&sample.unit));
}

#[test]
fn expressions_round_trip() {
    let mut peer = Peer::new();
    let sum = Binary::new(Literal::int(1).into_tree(), BinaryOperator::Addition, ident("x")).into_tree();
    let literals = [
        Literal::new(Some(LiteralValue::Bool(true)), "true"),
        Literal::new(Some(LiteralValue::Char('é')), "'é'"),
        Literal::new(Some(LiteralValue::Float(0.5)), "0.5"),
        Literal::new(Some(LiteralValue::String("hi".into())), "\"hi\""),
        Literal::new(None, "null"),
    ];
    let mut arguments = vec![sum.clone()];
    arguments.extend(literals.into_iter().map(NodeKind::into_tree));
    let call = MethodInvocation::new(Some(ident("out")), ident("println"), arguments).into_tree();
    let block = Block::new(vec![call.clone()]).into_tree();
    let received = peer.sync(&block);
    assert_eq!(dump(&received), dump(&block));

    let product = edit::<Binary>(&sum, |binary| {
        let operator = binary.operator.clone().with_element(BinaryOperator::Multiplication);
        binary.with_operator(operator)
    })
    .unwrap();
    let next_call = edit::<MethodInvocation>(&call, |call| {
        let elements = call
            .arguments
            .elements
            .iter()
            .map(|padded| {
                if padded.element.id() == product.id() {
                    padded.clone().with_element(product.clone())
                } else {
                    padded.clone()
                }
            })
            .collect();
        let arguments = call.arguments.clone().with_elements(elements);
        call.with_arguments(arguments)
    })
    .unwrap();
    let next = rebuild(&[block], next_call);
    let batches = peer.send(&next);
    assert!(ops(&batches).contains(&Op::Int(BinaryOperator::Multiplication as i64)));
    let received = peer.receive(batches).unwrap();
    assert_eq!(dump(&received), dump(&next));
}

#[test]
fn markers_round_trip() {
    let mut peer = Peer::new();
    let search = Arc::new(SearchResult::new(Some("found by recipe".into())));
    let comma = Arc::new(TrailingComma::new(Space::whitespace(" ")));
    let markers = Markers::empty()
        .add(search.clone())
        .add(comma)
        .add(Arc::new(Markup::new(MarkupLevel::Warning, "deprecated")));
    let marked = Identifier::new("x").with_markers(markers).into_tree();
    let block = Block::new(vec![marked.clone()]).into_tree();
    let received = peer.sync(&block);
    assert_eq!(dump(&received), dump(&block));

    let statement = node::<Block>(&received).statements[0].element.clone();
    assert_eq!(statement.markers().find::<SearchResult>().unwrap().id, search.id);
    assert_eq!(statement.markers().find::<TrailingComma>().unwrap().suffix, Space::whitespace(" "));

    let unmarked = edit::<Identifier>(&marked, |identifier| {
        let markers = identifier.markers.clone().remove(search.id);
        identifier.with_markers(markers)
    })
    .unwrap();
    let next = rebuild(&[block], unmarked);
    let batches = peer.send(&next);
    assert!(render_trace(&batches).contains("delete 1\nkeep 2\nend-list"));
    let received = peer.receive(batches).unwrap();
    let statement = node::<Block>(&received).statements[0].element.clone();
    assert!(statement.markers().find::<SearchResult>().is_none());
    assert_eq!(statement.markers().iter().count(), 2);
}

#[derive(Debug)]
struct Lambda {
    id: NodeId,
    prefix: Space,
    markers: Markers,
}

impl Node for Lambda {
    fn kind(&self) -> &'static str {
        "java.Lambda"
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

#[test]
fn unknown_kind_skips_only_its_unit() {
    let mut peer = Peer::new();
    let (class, _, _) = greeter_types(&mut peer.sender_types);
    let typed = || Identifier::new("greeter").with_type(Some(class)).into_tree();
    let lambda: Tree = Arc::new(Lambda { id: NodeId::random(), prefix: Space::EMPTY, markers: Markers::empty() });
    let broken = Block::new(vec![typed(), lambda]).into_tree();
    let fine = Block::new(vec![typed()]).into_tree();

    let mut sink = VecDeque::<Batch>::new();
    let outcomes = peer.sender.send_all(&[broken.clone(), fine.clone()], &peer.sender_types, &mut sink).unwrap();
    assert_eq!(outcomes.iter().map(UnitOutcome::is_sent).collect::<Vec<_>>(), [false, true]);
    assert_eq!(outcomes[0].id(), broken.id());
    assert!(matches!(
        &outcomes[0],
        UnitOutcome::Unchanged { error: SyncError::UnknownNodeKind(kind), .. } if &**kind == "java.Lambda"
    ));
    assert!(peer.sender.baseline(broken.id()).is_none());

    // The skipped unit's type numbers were released, so the next unit defines them afresh.
    assert!(sink.iter().flat_map(|batch| &batch.ops).any(|op| *op == Op::TypeDef(0)));
    let received = peer.receiver.receive_unit(&mut sink, &mut peer.receiver_types).unwrap();
    let ty = node::<Identifier>(&node::<Block>(&received).statements[0].element).ty.unwrap();
    assert_eq!(peer.receiver_types.signature(ty), "demo.Greeter");
    assert!(sink.is_empty());
}

#[test]
fn receiving_an_unregistered_kind_fails_the_unit() {
    let mut peer = Peer::new();
    let block = Block::new(vec![ident("a")]).into_tree();
    let mut ops = ops(&peer.send(&block));
    let tag = ops.iter().position(|op| *op == Op::Str("java.Identifier".into())).unwrap();
    ops[tag] = Op::Str("java.Lambda".into());
    let err = peer.receive(vec![Batch { ops, sites: vec![] }]).unwrap_err();
    assert!(matches!(&err, SyncError::UnknownNodeKind(kind) if &**kind == "java.Lambda"), "{err}");
    assert!(peer.receiver.needs_full_resend());
}
