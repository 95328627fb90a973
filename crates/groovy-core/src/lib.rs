//! Core shared types for the Groovy analysis crates.
//!
//! This crate is intentionally small: source positions, diagnostics and the
//! unresolved type-name representation shared by the syntax, AST and type
//! layers.

mod modifiers;
mod problem;
mod text;
mod type_ref;

pub use modifiers::Modifiers;
pub use problem::{Problem, Severity};
pub use text::{LineIndex, Position, Range};
pub use type_ref::TypeRef;

pub use text_size::TextSize;

/// Interned-ish identifier used throughout the node model.
pub type Name = smol_str::SmolStr;

/// Fully qualified name of `java.lang.Object`, the fallback for every
/// unresolved type.
pub const OBJECT: &str = "java.lang.Object";

#[cfg(test)]
mod tests;
