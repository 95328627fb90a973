//! Subtyping, assignability and member lookup over resolved types.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use groovy_core::OBJECT;

use crate::declarations::{FieldDeclaration, MethodDeclaration, ResolvedParameter};
use crate::solver::{bindings, boxed, object_type, substitute, TypeSolver};
use crate::ResolvedType;

/// `ty` and all of its supertypes, breadth first, with type arguments
/// substituted. `Object` always comes last for reference and array types.
pub fn supertypes(solver: &dyn TypeSolver, ty: &ResolvedType) -> Vec<ResolvedType> {
    match ty {
        ResolvedType::Reference { .. } => {}
        ResolvedType::Array { .. } => return vec![ty.clone(), object_type(solver)],
        other => return vec![other.clone()],
    }
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([ty.clone()]);
    while let Some(current) = queue.pop_front() {
        let Some(decl) = current.declaration().cloned() else {
            continue;
        };
        if !seen.insert(decl.qualified_name()) {
            continue;
        }
        let subst = bindings(solver, decl.as_ref(), current.type_args());
        for ancestor in decl.ancestors() {
            queue.push_back(substitute(&ancestor, &subst));
        }
        out.push(current);
    }
    if !seen.contains(OBJECT) {
        out.push(object_type(solver));
    } else if let Some(index) = out.iter().position(ResolvedType::is_object) {
        let object = out.remove(index);
        out.push(object);
    }
    out
}

/// `sub` viewed as its supertype named `qualified_name`, with arguments.
pub fn as_supertype(
    solver: &dyn TypeSolver,
    sub: &ResolvedType,
    qualified_name: &str,
) -> Option<ResolvedType> {
    supertypes(solver, sub)
        .into_iter()
        .find(|ty| ty.is(qualified_name))
}

/// Subtyping by erasure. Primitives relate through widening only.
pub fn is_subtype(solver: &dyn TypeSolver, sub: &ResolvedType, sup: &ResolvedType) -> bool {
    match (sub, sup) {
        (ResolvedType::Primitive(a), ResolvedType::Primitive(b)) => a.widens_to(*b),
        (ResolvedType::Null, ResolvedType::Reference { .. } | ResolvedType::Array { .. }) => true,
        (ResolvedType::Reference { .. } | ResolvedType::Array { .. }, sup) if sup.is_object() => {
            true
        }
        (
            ResolvedType::Array {
                component: a,
                dimensions: a_dims,
            },
            ResolvedType::Array {
                component: b,
                dimensions: b_dims,
            },
        ) => {
            a_dims == b_dims && (a == b || (!a.is_primitive() && is_subtype(solver, a, b)))
        }
        (ResolvedType::Reference { .. }, ResolvedType::Reference { decl, .. }) => {
            let name = decl.qualified_name();
            supertypes(solver, sub).iter().any(|ty| ty.is(&name))
        }
        (_, ResolvedType::TypeVariable { .. }) => true,
        _ => sub == sup,
    }
}

/// Whether a value of type `value` can be passed where `target` is
/// expected, allowing widening and (un)boxing.
pub fn is_assignable(solver: &dyn TypeSolver, target: &ResolvedType, value: &ResolvedType) -> bool {
    if value.is_void() {
        return false;
    }
    if target.is_object() || target.is_type_variable() {
        return true;
    }
    match (target, value) {
        (ResolvedType::Primitive(t), ResolvedType::Primitive(v)) => v.widens_to(*t),
        (ResolvedType::Primitive(t), other) => other.unboxed().is_some_and(|v| v.widens_to(*t)),
        (_, ResolvedType::Primitive(_)) => is_subtype(solver, &boxed(solver, value), target),
        _ => is_subtype(solver, value, target),
    }
}

/// A field found on a receiver type, with its type as seen from there.
#[derive(Debug, Clone)]
pub struct MemberField {
    pub decl: Arc<dyn FieldDeclaration>,
    pub ty: ResolvedType,
}

/// A method found on a receiver type, with parameter and return types as
/// seen from there.
#[derive(Debug, Clone)]
pub struct MemberMethod {
    pub decl: Arc<dyn MethodDeclaration>,
    pub params: Vec<ResolvedParameter>,
    pub return_type: ResolvedType,
}

impl MemberMethod {
    /// Whether a call with `count` arguments can reach this method, counting
    /// default parameters and varargs.
    pub fn accepts_arity(&self, count: usize) -> bool {
        let variadic = self.params.last().is_some_and(|p| p.variadic);
        let required = self
            .params
            .iter()
            .filter(|p| !p.has_default && !p.variadic)
            .count();
        count >= required && (variadic || count <= self.params.len())
    }

    /// Expected type of the argument at `index`.
    pub fn param_type_at(&self, index: usize) -> Option<ResolvedType> {
        match self.params.get(index) {
            Some(param) if !param.variadic => Some(param.ty.clone()),
            _ => {
                let last = self.params.last().filter(|p| p.variadic)?;
                match &last.ty {
                    ResolvedType::Array {
                        component,
                        dimensions,
                    } => Some(ResolvedType::array_of((**component).clone(), dimensions - 1)),
                    other => Some(other.clone()),
                }
            }
        }
    }
}

/// Receiver types to search for members: boxed primitives, arrays fall back
/// to `Object`.
fn member_owners(solver: &dyn TypeSolver, receiver: &ResolvedType) -> Vec<ResolvedType> {
    match receiver {
        ResolvedType::Primitive(_) => supertypes(solver, &boxed(solver, receiver)),
        ResolvedType::TypeVariable { bounds, .. } => match bounds.first() {
            Some(bound) if !bound.is_type_variable() => supertypes(solver, bound),
            _ => vec![object_type(solver)],
        },
        ResolvedType::Null | ResolvedType::Void => vec![object_type(solver)],
        other => supertypes(solver, other),
    }
}

pub fn find_field(solver: &dyn TypeSolver, receiver: &ResolvedType, name: &str) -> Option<MemberField> {
    for owner in member_owners(solver, receiver) {
        let Some(decl) = owner.declaration() else {
            continue;
        };
        let Some(field) = decl.declared_fields().into_iter().find(|f| f.name() == name) else {
            continue;
        };
        let subst = bindings(solver, decl.as_ref(), owner.type_args());
        let ty = substitute(&field.ty(), &subst);
        return Some(MemberField { decl: field, ty });
    }
    None
}

/// Methods named `name` visible on `receiver`; overrides in subtypes hide
/// the methods they override.
pub fn find_methods(solver: &dyn TypeSolver, receiver: &ResolvedType, name: &str) -> Vec<MemberMethod> {
    let mut out: Vec<MemberMethod> = Vec::new();
    let mut signatures = HashSet::new();
    for owner in member_owners(solver, receiver) {
        let Some(decl) = owner.declaration() else {
            continue;
        };
        let subst = bindings(solver, decl.as_ref(), owner.type_args());
        for method in decl.declared_methods() {
            if method.name() != name {
                continue;
            }
            let params: Vec<ResolvedParameter> = method
                .parameters()
                .into_iter()
                .map(|p| ResolvedParameter {
                    ty: substitute(&p.ty, &subst),
                    ..p
                })
                .collect();
            let erased: Vec<String> = params.iter().map(|p| p.ty.erasure().describe()).collect();
            if !signatures.insert(erased) {
                continue;
            }
            let return_type = substitute(&method.return_type(), &subst);
            out.push(MemberMethod {
                decl: method,
                params,
                return_type,
            });
        }
    }
    out
}

/// Pick the best candidate for a call: arity first, then argument
/// compatibility. Unknown (`Object`) arguments match any parameter. When
/// several candidates share the arity but none is compatible, the first
/// arity match wins.
pub fn select_method(
    solver: &dyn TypeSolver,
    candidates: Vec<MemberMethod>,
    arg_types: &[ResolvedType],
) -> Option<MemberMethod> {
    let by_arity: Vec<MemberMethod> = candidates
        .into_iter()
        .filter(|m| m.accepts_arity(arg_types.len()))
        .collect();
    if by_arity.len() <= 1 {
        return by_arity.into_iter().next();
    }
    let mut best: Option<(u32, usize)> = None;
    for (index, candidate) in by_arity.iter().enumerate() {
        let Some(score) = compatibility(solver, candidate, arg_types) else {
            continue;
        };
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, index));
        }
    }
    let index = best.map_or(0, |(_, index)| index);
    by_arity.into_iter().nth(index)
}

fn compatibility(solver: &dyn TypeSolver, method: &MemberMethod, args: &[ResolvedType]) -> Option<u32> {
    let mut score = 0;
    for (index, arg) in args.iter().enumerate() {
        let param = method.param_type_at(index)?;
        score += if &param == arg {
            3
        } else if is_assignable(solver, &param, arg) {
            2
        } else if arg.is_object() || arg.is_null() {
            1
        } else {
            return None;
        };
    }
    Some(score)
}
