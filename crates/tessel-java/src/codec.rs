//! Encoder/decoder pairs of the Java node kinds.
//!
//! Each pair visits the same fields in the same order: prefix, markers, then
//! the kind's own fields as declared. Nothing on the wire names a field, so
//! an encoder and its decoder must be edited together.

use camino::Utf8PathBuf;
use tessel_sync::{CodecRegistry, Desync, ReceiveQueue, SendQueue, SyncResult};
use tessel_tree::{Node, NodeId, Tree};

use crate::tree::{
    Binary, BinaryOperator, Block, ClassDeclaration, CompilationUnit, Identifier, Literal, LiteralValue,
    MethodDeclaration, MethodInvocation, Return, TrailingComma,
};

/// Registers the codecs of every Java node and marker kind.
pub fn register(registry: &CodecRegistry) {
    registry.register_node(send_compilation_unit, receive_compilation_unit);
    registry.register_node(send_class_declaration, receive_class_declaration);
    registry.register_node(send_method_declaration, receive_method_declaration);
    registry.register_node(send_block, receive_block);
    registry.register_node(send_identifier, receive_identifier);
    registry.register_node(send_literal, receive_literal);
    registry.register_node(send_method_invocation, receive_method_invocation);
    registry.register_node(send_return, receive_return);
    registry.register_node(send_binary, receive_binary);
    registry.register_marker(send_trailing_comma, receive_trailing_comma);
    tracing::debug!("registered java codecs");
}

#[track_caller]
fn send_header<N: Node>(after: &N, before: Option<&N>, q: &mut SendQueue<'_>) -> SyncResult<()> {
    q.get_and_send_space(after.prefix(), before.map(|before| before.prefix()))?;
    q.get_and_send_markers(after.markers(), before.map(|before| before.markers()))
}

fn tree_id(tree: &Tree) -> NodeId {
    tree.id()
}

fn send_compilation_unit(
    after: &CompilationUnit,
    before: Option<&CompilationUnit>,
    q: &mut SendQueue<'_>,
) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_value(after.source_path.as_str(), before.map(|before| before.source_path.as_str()))?;
    q.get_and_send_list(
        &after.classes,
        before.map(|before| before.classes.as_slice()),
        |padded| padded.element.id(),
        |q, after, before| q.send_right_padded(after, before, SendQueue::send_tree),
    )?;
    q.get_and_send_space(&after.eof, before.map(|before| &before.eof))
}

fn receive_compilation_unit(
    id: NodeId,
    before: Option<&CompilationUnit>,
    q: &mut ReceiveQueue<'_>,
) -> SyncResult<CompilationUnit> {
    Ok(CompilationUnit {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        source_path: q.receive(before.map(|before| &before.source_path), |q, _| {
            q.decode_string().map(Utf8PathBuf::from)
        })?,
        classes: q.receive_list(before.map(|before| before.classes.as_slice()), |q, before| {
            q.decode_right_padded(before, ReceiveQueue::decode_tree)
        })?,
        eof: q.receive_space(before.map(|before| &before.eof))?,
    })
}

fn send_class_declaration(
    after: &ClassDeclaration,
    before: Option<&ClassDeclaration>,
    q: &mut SendQueue<'_>,
) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_tree(&after.name, before.map(|before| &before.name))?;
    q.get_and_send_opt(
        after.extends.as_ref(),
        before.map(|before| before.extends.as_ref()),
        |q, after, before| q.send_left_padded(after, before, SendQueue::send_tree),
    )?;
    q.get_and_send_tree(&after.body, before.map(|before| &before.body))?;
    q.get_and_send_type(after.ty, before.map(|before| before.ty))
}

fn receive_class_declaration(
    id: NodeId,
    before: Option<&ClassDeclaration>,
    q: &mut ReceiveQueue<'_>,
) -> SyncResult<ClassDeclaration> {
    Ok(ClassDeclaration {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        name: q.receive_tree(before.map(|before| &before.name))?,
        extends: q.receive_opt(before.map(|before| before.extends.as_ref()), |q, before| {
            q.decode_left_padded(before, ReceiveQueue::decode_tree)
        })?,
        body: q.receive_tree(before.map(|before| &before.body))?,
        ty: q.receive_type(before.map(|before| before.ty))?,
    })
}

fn send_method_declaration(
    after: &MethodDeclaration,
    before: Option<&MethodDeclaration>,
    q: &mut SendQueue<'_>,
) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_tree_opt(
        after.return_type.as_ref(),
        before.map(|before| before.return_type.as_ref()),
    )?;
    q.get_and_send_tree(&after.name, before.map(|before| &before.name))?;
    q.get_and_send(&after.parameters, before.map(|before| &before.parameters), |q, after, before| {
        q.send_container(after, before, tree_id, SendQueue::send_tree)
    })?;
    q.get_and_send_tree_opt(after.body.as_ref(), before.map(|before| before.body.as_ref()))?;
    q.get_and_send_type(after.method_type, before.map(|before| before.method_type))
}

fn receive_method_declaration(
    id: NodeId,
    before: Option<&MethodDeclaration>,
    q: &mut ReceiveQueue<'_>,
) -> SyncResult<MethodDeclaration> {
    Ok(MethodDeclaration {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        return_type: q.receive_tree_opt(before.map(|before| before.return_type.as_ref()))?,
        name: q.receive_tree(before.map(|before| &before.name))?,
        parameters: q.receive(before.map(|before| &before.parameters), |q, before| {
            q.decode_container(before, ReceiveQueue::decode_tree)
        })?,
        body: q.receive_tree_opt(before.map(|before| before.body.as_ref()))?,
        method_type: q.receive_type(before.map(|before| before.method_type))?,
    })
}

fn send_block(after: &Block, before: Option<&Block>, q: &mut SendQueue<'_>) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_list(
        &after.statements,
        before.map(|before| before.statements.as_slice()),
        |padded| padded.element.id(),
        |q, after, before| q.send_right_padded(after, before, SendQueue::send_tree),
    )?;
    q.get_and_send_space(&after.end, before.map(|before| &before.end))
}

fn receive_block(id: NodeId, before: Option<&Block>, q: &mut ReceiveQueue<'_>) -> SyncResult<Block> {
    Ok(Block {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        statements: q.receive_list(before.map(|before| before.statements.as_slice()), |q, before| {
            q.decode_right_padded(before, ReceiveQueue::decode_tree)
        })?,
        end: q.receive_space(before.map(|before| &before.end))?,
    })
}

fn send_identifier(
    after: &Identifier,
    before: Option<&Identifier>,
    q: &mut SendQueue<'_>,
) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_value(&after.simple_name, before.map(|before| &before.simple_name))?;
    q.get_and_send_type(after.ty, before.map(|before| before.ty))
}

fn receive_identifier(
    id: NodeId,
    before: Option<&Identifier>,
    q: &mut ReceiveQueue<'_>,
) -> SyncResult<Identifier> {
    Ok(Identifier {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        simple_name: q.receive_value(before.map(|before| &before.simple_name))?,
        ty: q.receive_type(before.map(|before| before.ty))?,
    })
}

const LITERAL_BOOL: i64 = 0;
const LITERAL_CHAR: i64 = 1;
const LITERAL_INT: i64 = 2;
const LITERAL_FLOAT: i64 = 3;
const LITERAL_STRING: i64 = 4;

fn send_literal_value(q: &mut SendQueue<'_>, value: &LiteralValue) {
    match value {
        LiteralValue::Bool(value) => {
            q.send_int(LITERAL_BOOL);
            q.send_bool(*value);
        }
        LiteralValue::Char(value) => {
            q.send_int(LITERAL_CHAR);
            q.send_int(i64::from(u32::from(*value)));
        }
        LiteralValue::Int(value) => {
            q.send_int(LITERAL_INT);
            q.send_int(*value);
        }
        LiteralValue::Float(value) => {
            q.send_int(LITERAL_FLOAT);
            q.send_float(*value);
        }
        LiteralValue::String(value) => {
            q.send_int(LITERAL_STRING);
            q.send_str(value);
        }
    }
}

fn receive_literal_value(q: &mut ReceiveQueue<'_>) -> SyncResult<LiteralValue> {
    Ok(match q.decode_int()? {
        LITERAL_BOOL => LiteralValue::Bool(q.decode_bool()?),
        LITERAL_CHAR => {
            let code = q.decode_int()?;
            let value = u32::try_from(code).ok().and_then(char::from_u32);
            LiteralValue::Char(value.ok_or_else(|| {
                q.desync(Desync::InvalidDiscriminant { what: "char", value: code })
            })?)
        }
        LITERAL_INT => LiteralValue::Int(q.decode_int()?),
        LITERAL_FLOAT => LiteralValue::Float(q.decode_float()?),
        LITERAL_STRING => LiteralValue::String(q.decode_string()?),
        value => {
            return Err(q.desync(Desync::InvalidDiscriminant { what: "literal", value }));
        }
    })
}

fn send_literal(after: &Literal, before: Option<&Literal>, q: &mut SendQueue<'_>) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_opt(after.value.as_ref(), before.map(|before| before.value.as_ref()), |q, value, _| {
        send_literal_value(q, value);
        Ok(())
    })?;
    q.get_and_send_value(&after.value_source, before.map(|before| &before.value_source))?;
    q.get_and_send_type(after.ty, before.map(|before| before.ty))
}

fn receive_literal(id: NodeId, before: Option<&Literal>, q: &mut ReceiveQueue<'_>) -> SyncResult<Literal> {
    Ok(Literal {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        value: q.receive_opt(before.map(|before| before.value.as_ref()), |q, _| receive_literal_value(q))?,
        value_source: q.receive_value(before.map(|before| &before.value_source))?,
        ty: q.receive_type(before.map(|before| before.ty))?,
    })
}

fn send_method_invocation(
    after: &MethodInvocation,
    before: Option<&MethodInvocation>,
    q: &mut SendQueue<'_>,
) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_opt(
        after.select.as_ref(),
        before.map(|before| before.select.as_ref()),
        |q, after, before| q.send_right_padded(after, before, SendQueue::send_tree),
    )?;
    q.get_and_send_tree(&after.name, before.map(|before| &before.name))?;
    q.get_and_send(&after.arguments, before.map(|before| &before.arguments), |q, after, before| {
        q.send_container(after, before, tree_id, SendQueue::send_tree)
    })?;
    q.get_and_send_type(after.method_type, before.map(|before| before.method_type))
}

fn receive_method_invocation(
    id: NodeId,
    before: Option<&MethodInvocation>,
    q: &mut ReceiveQueue<'_>,
) -> SyncResult<MethodInvocation> {
    Ok(MethodInvocation {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        select: q.receive_opt(before.map(|before| before.select.as_ref()), |q, before| {
            q.decode_right_padded(before, ReceiveQueue::decode_tree)
        })?,
        name: q.receive_tree(before.map(|before| &before.name))?,
        arguments: q.receive(before.map(|before| &before.arguments), |q, before| {
            q.decode_container(before, ReceiveQueue::decode_tree)
        })?,
        method_type: q.receive_type(before.map(|before| before.method_type))?,
    })
}

fn send_return(after: &Return, before: Option<&Return>, q: &mut SendQueue<'_>) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_tree_opt(after.expression.as_ref(), before.map(|before| before.expression.as_ref()))
}

fn receive_return(id: NodeId, before: Option<&Return>, q: &mut ReceiveQueue<'_>) -> SyncResult<Return> {
    Ok(Return {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        expression: q.receive_tree_opt(before.map(|before| before.expression.as_ref()))?,
    })
}

fn send_binary(after: &Binary, before: Option<&Binary>, q: &mut SendQueue<'_>) -> SyncResult<()> {
    send_header(after, before, q)?;
    q.get_and_send_tree(&after.left, before.map(|before| &before.left))?;
    q.get_and_send(&after.operator, before.map(|before| &before.operator), |q, after, before| {
        q.send_left_padded(after, before, |q, operator, _| {
            q.send_int(*operator as i64);
            Ok(())
        })
    })?;
    q.get_and_send_tree(&after.right, before.map(|before| &before.right))?;
    q.get_and_send_type(after.ty, before.map(|before| before.ty))
}

fn receive_binary(id: NodeId, before: Option<&Binary>, q: &mut ReceiveQueue<'_>) -> SyncResult<Binary> {
    Ok(Binary {
        id,
        prefix: q.receive_space(before.map(|before| &before.prefix))?,
        markers: q.receive_markers(before.map(|before| &before.markers))?,
        left: q.receive_tree(before.map(|before| &before.left))?,
        operator: q.receive(before.map(|before| &before.operator), |q, before| {
            q.decode_left_padded(before, |q, _| q.decode_enum("binary operator", &BinaryOperator::ALL))
        })?,
        right: q.receive_tree(before.map(|before| &before.right))?,
        ty: q.receive_type(before.map(|before| before.ty))?,
    })
}

fn send_trailing_comma(marker: &TrailingComma, q: &mut SendQueue<'_>) -> SyncResult<()> {
    q.send_space(&marker.suffix);
    Ok(())
}

fn receive_trailing_comma(id: NodeId, q: &mut ReceiveQueue<'_>) -> SyncResult<TrailingComma> {
    Ok(TrailingComma { id, suffix: q.decode_space()? })
}
