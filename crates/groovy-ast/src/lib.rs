//! The Groovy node model.
//!
//! Nodes live in an [`Ast`] arena and refer to each other through
//! [`NodeId`] handles; a node's parent is a handle too, recorded once when
//! the parent is allocated. [`GroovyParser`] drives the front end and lowers
//! its raw tree into this model.

mod cloner;
mod comments;
mod convert;
mod node;
mod ops;
mod parse;
mod queries;

pub use cloner::{clone_subtree, extract_subtree, structurally_equal, CloneError};
pub use comments::{extract_comments, Comment};
pub use convert::{convert, source_range, ConvertError, Converter, MAX_CONVERT_DEPTH};
pub use node::{Ast, ClassKind, ConstantValue, Node, NodeId, NodeKind, TypeParam};
pub use ops::{BinaryOp, IncrementOp, UnaryOp};
pub use parse::{blank_lines, GroovyParser, ParseResult};

#[cfg(test)]
mod tests;
