//! Resolved types and the solvers that produce them.
//!
//! A [`TypeSolver`] turns names into [`TypeDeclaration`]s. Declarations are
//! trait objects so source classes and class metadata share one model;
//! [`ReflectionTypeSolver`] is the metadata-backed implementation. On top of
//! declarations this crate provides subtyping, member lookup, overload
//! selection, numeric promotion and least upper bounds.

mod declarations;
mod hierarchy;
mod lub;
mod primitive;
pub mod reflection;
mod resolved;
mod solver;
mod symbol;

pub use declarations::{
    ConstructorDeclaration, FieldDeclaration, MethodDeclaration, ResolvedParameter,
    TypeDeclaration, TypeKind, TypeParameter, ValueDeclaration,
};
pub use hierarchy::{
    as_supertype, find_field, find_methods, is_assignable, is_subtype, select_method,
    supertypes, MemberField, MemberMethod,
};
pub use lub::{lub, promote, NumericKind, BIG_DECIMAL, BIG_INTEGER};
pub use primitive::PrimitiveType;
pub use reflection::{ClassCache, ReflectionTypeSolver};
pub use resolved::ResolvedType;
pub use solver::{
    bindings, boxed, erase_type_variables, object_type, resolve_type_ref, solve_or_object,
    substitute, CombinedTypeSolver, PlaceholderDeclaration, Substitution, TypeRefResult,
    TypeSolver,
};
pub use symbol::SymbolReference;

#[cfg(test)]
mod tests;
