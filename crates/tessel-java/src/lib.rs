//! Java node kinds and their codecs.
//!
//! A host that synchronizes Java trees calls [`register`] once at startup,
//! usually on [`CodecRegistry::global`](tessel_sync::CodecRegistry::global).

mod codec;
mod tree;

pub use codec::register;
pub use tree::{
    Binary, BinaryOperator, Block, ClassDeclaration, CompilationUnit, Identifier, Literal, LiteralValue,
    MethodDeclaration, MethodInvocation, Return, TrailingComma, edit,
};
