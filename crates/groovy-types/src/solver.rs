use std::sync::Arc;

use groovy_core::{Modifiers, Name, TypeRef, OBJECT};

use crate::declarations::{
    ConstructorDeclaration, FieldDeclaration, MethodDeclaration, TypeDeclaration, TypeKind,
    TypeParameter,
};
use crate::{PrimitiveType, ResolvedType, SymbolReference};

pub type TypeRefResult = SymbolReference<Arc<dyn TypeDeclaration>>;

/// Name to declaration resolution.
pub trait TypeSolver: Send + Sync {
    /// Resolve a qualified (or, for solvers that know a scope, simple) type
    /// name. Never fails: unknown names give an unsolved reference.
    fn try_to_solve_type(&self, name: &str) -> TypeRefResult;
}

impl<S: TypeSolver + ?Sized> TypeSolver for Arc<S> {
    fn try_to_solve_type(&self, name: &str) -> TypeRefResult {
        (**self).try_to_solve_type(name)
    }
}

/// Consults each solver in turn.
#[derive(Default, Clone)]
pub struct CombinedTypeSolver {
    solvers: Vec<Arc<dyn TypeSolver>>,
}

impl CombinedTypeSolver {
    pub fn new(solvers: Vec<Arc<dyn TypeSolver>>) -> Self {
        Self { solvers }
    }

    pub fn push(&mut self, solver: Arc<dyn TypeSolver>) {
        self.solvers.push(solver);
    }
}

impl TypeSolver for CombinedTypeSolver {
    fn try_to_solve_type(&self, name: &str) -> TypeRefResult {
        self.solvers
            .iter()
            .map(|solver| solver.try_to_solve_type(name))
            .find(SymbolReference::is_solved)
            .unwrap_or_default()
    }
}

/// Stand-in declaration for a name no solver knows. It has no members and
/// no ancestors.
#[derive(Debug, Clone)]
pub struct PlaceholderDeclaration {
    qualified_name: String,
}

impl PlaceholderDeclaration {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }
}

impl TypeDeclaration for PlaceholderDeclaration {
    fn name(&self) -> &str {
        self.qualified_name
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(&self.qualified_name)
    }

    fn qualified_name(&self) -> String {
        self.qualified_name.clone()
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Class
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers(Modifiers::PUBLIC)
    }

    fn type_parameters(&self) -> Vec<TypeParameter> {
        Vec::new()
    }

    fn superclass(&self) -> Option<ResolvedType> {
        None
    }

    fn interfaces(&self) -> Vec<ResolvedType> {
        Vec::new()
    }

    fn declared_fields(&self) -> Vec<Arc<dyn FieldDeclaration>> {
        Vec::new()
    }

    fn declared_methods(&self) -> Vec<Arc<dyn MethodDeclaration>> {
        Vec::new()
    }

    fn constructors(&self) -> Vec<Arc<dyn ConstructorDeclaration>> {
        Vec::new()
    }
}

/// `java.lang.Object`, even when the solver does not know it.
pub fn object_type(solver: &dyn TypeSolver) -> ResolvedType {
    match solver.try_to_solve_type(OBJECT).into_declaration() {
        Some(decl) => ResolvedType::reference(decl),
        None => ResolvedType::reference(Arc::new(PlaceholderDeclaration::new(OBJECT))),
    }
}

/// The named type, or `Object` when it cannot be resolved.
pub fn solve_or_object(solver: &dyn TypeSolver, name: &str) -> ResolvedType {
    match solver.try_to_solve_type(name).into_declaration() {
        Some(decl) => ResolvedType::reference(decl),
        None => {
            tracing::trace!(target: "groovy.types", name, "unresolved type, using Object");
            object_type(solver)
        }
    }
}

/// Wrapper type of a primitive; other types are returned unchanged.
pub fn boxed(solver: &dyn TypeSolver, ty: &ResolvedType) -> ResolvedType {
    match ty {
        ResolvedType::Primitive(p) => solve_or_object(solver, p.boxed_name()),
        other => other.clone(),
    }
}

/// Resolve a source type. `type_vars` lists the type parameters in scope,
/// innermost first; `def`/`var` resolve to `Object`.
pub fn resolve_type_ref(
    solver: &dyn TypeSolver,
    ty: &TypeRef,
    type_vars: &[TypeParameter],
) -> ResolvedType {
    let base = if ty.is_dynamic() {
        object_type(solver)
    } else if ty.name == "void" && ty.dimensions == 0 {
        ResolvedType::Void
    } else if let Some(p) = PrimitiveType::from_name(&ty.name) {
        ResolvedType::Primitive(p)
    } else if let Some(var) = type_vars.iter().find(|v| v.name == ty.name.as_str()) {
        var.as_type()
    } else {
        match solver.try_to_solve_type(&ty.name).into_declaration() {
            Some(decl) => {
                let args = ty
                    .args
                    .iter()
                    .map(|arg| resolve_type_ref(solver, arg, type_vars))
                    .collect();
                ResolvedType::generic(decl, args)
            }
            None => {
                tracing::trace!(target: "groovy.types", name = %ty.name, "unresolved type, using Object");
                object_type(solver)
            }
        }
    };
    ResolvedType::array_of(base, ty.dimensions)
}

/// Generic `Name` → type bindings.
pub type Substitution = Vec<(Name, ResolvedType)>;

/// Bindings of `decl`'s type parameters to `args`. Missing arguments (raw
/// types) bind to the parameter's first bound, or `Object`.
pub fn bindings(
    solver: &dyn TypeSolver,
    decl: &dyn TypeDeclaration,
    args: &[ResolvedType],
) -> Substitution {
    decl.type_parameters()
        .into_iter()
        .enumerate()
        .map(|(i, param)| {
            let bound = args.get(i).cloned().unwrap_or_else(|| {
                param
                    .bounds
                    .first()
                    .map(|b| erase_type_variables(solver, b))
                    .unwrap_or_else(|| object_type(solver))
            });
            (param.name, bound)
        })
        .collect()
}

/// Replace type variables bound in `subst`.
pub fn substitute(ty: &ResolvedType, subst: &Substitution) -> ResolvedType {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        ResolvedType::TypeVariable { name, .. } => subst
            .iter()
            .find(|(bound, _)| bound == name)
            .map_or_else(|| ty.clone(), |(_, value)| value.clone()),
        ResolvedType::Reference { decl, args } => ResolvedType::generic(
            decl.clone(),
            args.iter().map(|arg| substitute(arg, subst)).collect(),
        ),
        ResolvedType::Array {
            component,
            dimensions,
        } => ResolvedType::array_of(substitute(component, subst), *dimensions),
        other => other.clone(),
    }
}

/// Replace every remaining type variable with its first bound, or `Object`.
pub fn erase_type_variables(solver: &dyn TypeSolver, ty: &ResolvedType) -> ResolvedType {
    match ty {
        ResolvedType::TypeVariable { bounds, .. } => match bounds.first() {
            Some(ResolvedType::TypeVariable { .. }) | None => object_type(solver),
            Some(bound) => bound.erasure(),
        },
        ResolvedType::Reference { decl, args } => ResolvedType::generic(
            decl.clone(),
            args.iter().map(|arg| erase_type_variables(solver, arg)).collect(),
        ),
        ResolvedType::Array {
            component,
            dimensions,
        } => ResolvedType::array_of(erase_type_variables(solver, component), *dimensions),
        other => other.clone(),
    }
}
