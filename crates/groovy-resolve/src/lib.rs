//! Semantic queries over the Groovy node model.
//!
//! [`AstTypeSolver`] exposes the classes of one compilation unit as type
//! declarations and resolves names through its imports. [`ContextChain`]
//! models the lexical scopes around a node, [`TypeExtractor`] infers
//! expression types, and [`SymbolResolver`] ties them together.
//! [`SemanticModel`] bundles a parse result with a resolver.

mod context;
mod declarations;
mod extractor;
mod model;
mod resolver;
mod solver;

pub use context::{Context, ContextChain, IMPLICIT_PARAMETER};
pub use declarations::{AstClass, AstMember};
pub use extractor::{TypeExtractor, MAX_INFERENCE_DEPTH};
pub use model::SemanticModel;
pub use resolver::SymbolResolver;
pub use solver::{AstTypeSolver, DEFAULT_PACKAGES};

#[cfg(test)]
mod tests;
