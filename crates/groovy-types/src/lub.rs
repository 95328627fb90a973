//! Numeric promotion and least upper bounds.

use crate::hierarchy::supertypes;
use crate::solver::{boxed, object_type, solve_or_object, TypeSolver};
use crate::{PrimitiveType, ResolvedType};

pub const BIG_INTEGER: &str = "java.math.BigInteger";
pub const BIG_DECIMAL: &str = "java.math.BigDecimal";

/// Rungs of the numeric tower, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericKind {
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
}

impl NumericKind {
    /// Numeric kind of a primitive, wrapper or big number type. `byte`,
    /// `short` and `char` take part as `int`; `boolean` is not numeric.
    pub fn of(ty: &ResolvedType) -> Option<NumericKind> {
        if ty.is(BIG_DECIMAL) {
            return Some(NumericKind::BigDecimal);
        }
        if ty.is(BIG_INTEGER) {
            return Some(NumericKind::BigInteger);
        }
        Some(match ty.unboxed()? {
            PrimitiveType::Boolean => return None,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char | PrimitiveType::Int => {
                NumericKind::Int
            }
            PrimitiveType::Long => NumericKind::Long,
            PrimitiveType::Float => NumericKind::Float,
            PrimitiveType::Double => NumericKind::Double,
        })
    }

    pub fn to_type(self, solver: &dyn TypeSolver) -> ResolvedType {
        match self {
            NumericKind::Int => ResolvedType::Primitive(PrimitiveType::Int),
            NumericKind::Long => ResolvedType::Primitive(PrimitiveType::Long),
            NumericKind::Float => ResolvedType::Primitive(PrimitiveType::Float),
            NumericKind::Double => ResolvedType::Primitive(PrimitiveType::Double),
            NumericKind::BigInteger => solve_or_object(solver, BIG_INTEGER),
            NumericKind::BigDecimal => solve_or_object(solver, BIG_DECIMAL),
        }
    }
}

/// Binary numeric promotion. Big numbers win over primitives; otherwise
/// `double > float > long > int`. `None` when either side is not numeric
/// (including `boolean`).
pub fn promote(solver: &dyn TypeSolver, a: &ResolvedType, b: &ResolvedType) -> Option<ResolvedType> {
    let kind = NumericKind::of(a)?.max(NumericKind::of(b)?);
    Some(kind.to_type(solver))
}

/// Least upper bound of `types`: the narrowest type every one of them is a
/// subtype of, or `Object`.
///
/// `null` is ignored. Numeric primitives promote instead of boxing, so
/// `int` and `double` give `double`.
pub fn lub(solver: &dyn TypeSolver, types: &[ResolvedType]) -> ResolvedType {
    let types: Vec<&ResolvedType> = types.iter().filter(|ty| !ty.is_null()).collect();
    let Some(first) = types.first().copied() else {
        return object_type(solver);
    };
    if types.iter().all(|ty| *ty == first) {
        return first.clone();
    }

    if types
        .iter()
        .all(|ty| ty.as_primitive().is_some_and(PrimitiveType::is_numeric))
    {
        let kind = types.iter().filter_map(|ty| NumericKind::of(ty)).max();
        if let Some(kind) = kind {
            return kind.to_type(solver);
        }
    }

    if types.iter().all(|ty| ty.is_array()) {
        return array_lub(solver, &types);
    }
    if types.iter().any(|ty| ty.is_void()) {
        return object_type(solver);
    }

    let boxed_types: Vec<ResolvedType> = types.iter().map(|ty| boxed(solver, ty)).collect();
    reference_lub(solver, &boxed_types)
}

fn array_lub(solver: &dyn TypeSolver, types: &[&ResolvedType]) -> ResolvedType {
    let mut components = Vec::with_capacity(types.len());
    let mut dims = None;
    for ty in types {
        let ResolvedType::Array {
            component,
            dimensions,
        } = ty
        else {
            return object_type(solver);
        };
        if *dims.get_or_insert(*dimensions) != *dimensions || component.is_primitive() {
            return object_type(solver);
        }
        components.push((**component).clone());
    }
    let component = reference_lub(solver, &components);
    ResolvedType::array_of(component, dims.unwrap_or(1))
}

fn reference_lub(solver: &dyn TypeSolver, types: &[ResolvedType]) -> ResolvedType {
    let Some((first, rest)) = types.split_first() else {
        return object_type(solver);
    };
    let others: Vec<Vec<ResolvedType>> = rest.iter().map(|ty| supertypes(solver, ty)).collect();
    let first_supers = supertypes(solver, first);

    // Prefer a common class over a common interface.
    let common: Vec<&ResolvedType> = first_supers
        .iter()
        .filter(|candidate| {
            others.iter().all(|supers| {
                supers
                    .iter()
                    .any(|ty| ty.qualified_name() == candidate.qualified_name())
            })
        })
        .collect();
    let pick = common
        .iter()
        .find(|ty| !ty.is_object() && ty.declaration().is_some_and(|d| !d.is_interface()))
        .or_else(|| common.iter().find(|ty| !ty.is_object()))
        .or_else(|| common.first());
    let Some(pick) = pick else {
        return object_type(solver);
    };

    // Keep type arguments only when every type agrees on them.
    let agree = others.iter().all(|supers| {
        supers
            .iter()
            .find(|ty| ty.qualified_name() == pick.qualified_name())
            .is_some_and(|ty| ty.type_args() == pick.type_args())
    });
    if agree {
        (*pick).clone()
    } else {
        pick.erasure()
    }
}
