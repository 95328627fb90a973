//! Declarations backed by the node model.

use std::fmt;
use std::sync::Arc;

use groovy_ast::{Ast, ClassKind, NodeId, NodeKind, TypeParam};
use groovy_core::{Modifiers, TypeRef};
use groovy_types::{
    object_type, resolve_type_ref, ConstructorDeclaration, FieldDeclaration, MethodDeclaration,
    ResolvedParameter, ResolvedType, TypeDeclaration, TypeKind, TypeParameter, TypeSolver,
};

use crate::solver::AstTypeSolver;

/// Type parameters with bounds resolved; `outer` lists enclosing type
/// parameters a bound may mention.
pub(crate) fn type_parameters(
    solver: &dyn TypeSolver,
    params: &[TypeParam],
    outer: &[TypeParameter],
) -> Vec<TypeParameter> {
    let names: Vec<TypeParameter> = params
        .iter()
        .map(|p| TypeParameter::unbounded(p.name.clone()))
        .chain(outer.iter().cloned())
        .collect();
    params
        .iter()
        .map(|p| TypeParameter {
            name: p.name.clone(),
            bounds: p
                .bounds
                .iter()
                .map(|bound| resolve_type_ref(solver, bound, &names))
                .collect(),
        })
        .collect()
}

/// Resolved parameter for a [`NodeKind::Parameter`].
pub(crate) fn parameter(
    solver: &dyn TypeSolver,
    ast: &Ast,
    param: NodeId,
    type_vars: &[TypeParameter],
) -> Option<ResolvedParameter> {
    let NodeKind::Parameter {
        name,
        ty,
        variadic,
        default,
    } = ast.kind(param)?
    else {
        return None;
    };
    Some(ResolvedParameter {
        name: name.clone(),
        ty: resolve_type_ref(solver, ty, type_vars),
        variadic: *variadic,
        has_default: default.is_some(),
    })
}

/// The type parameters visible in a class body.
pub(crate) fn class_type_parameters(solver: &dyn TypeSolver, ast: &Ast, class: NodeId) -> Vec<TypeParameter> {
    match ast.kind(class) {
        Some(NodeKind::Class { type_params, .. }) => type_parameters(solver, type_params, &[]),
        _ => Vec::new(),
    }
}

/// A class, interface, enum, trait or script class declared in source.
#[derive(Clone)]
pub struct AstClass {
    solver: AstTypeSolver,
    class: NodeId,
}

impl fmt::Debug for AstClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstClass")
            .field("name", &self.qualified_name())
            .field("node", &self.class)
            .finish()
    }
}

impl AstClass {
    pub fn new(solver: AstTypeSolver, class: NodeId) -> Self {
        Self { solver, class }
    }

    pub fn node(&self) -> NodeId {
        self.class
    }

    fn ast(&self) -> &Ast {
        self.solver.ast()
    }

    fn type_vars(&self) -> Vec<TypeParameter> {
        class_type_parameters(&self.solver, self.ast(), self.class)
    }

    fn resolve(&self, ty: &TypeRef) -> ResolvedType {
        resolve_type_ref(&self.solver, ty, &self.type_vars())
    }

    fn members(&self, pick: impl Fn(&NodeKind) -> Option<&Vec<NodeId>>) -> Vec<NodeId> {
        self.ast().kind(self.class).and_then(pick).cloned().unwrap_or_default()
    }

    fn member(&self, member: NodeId) -> AstMember {
        AstMember {
            solver: self.solver.clone(),
            owner: self.class,
            member,
        }
    }
}

impl TypeDeclaration for AstClass {
    fn name(&self) -> &str {
        self.ast().name(self.class).unwrap_or_default()
    }

    fn qualified_name(&self) -> String {
        self.ast().qualified_name(self.class).unwrap_or_default()
    }

    fn kind(&self) -> TypeKind {
        match self.ast().kind(self.class) {
            Some(NodeKind::Class { kind, .. }) => match kind {
                ClassKind::Class => TypeKind::Class,
                ClassKind::Interface => TypeKind::Interface,
                ClassKind::Enum => TypeKind::Enum,
                ClassKind::Trait => TypeKind::Trait,
                ClassKind::Annotation => TypeKind::Annotation,
            },
            _ => TypeKind::Class,
        }
    }

    fn modifiers(&self) -> Modifiers {
        match self.ast().kind(self.class) {
            Some(NodeKind::Class { modifiers, .. }) => *modifiers,
            _ => Modifiers::empty(),
        }
    }

    fn type_parameters(&self) -> Vec<TypeParameter> {
        self.type_vars()
    }

    fn superclass(&self) -> Option<ResolvedType> {
        if self.is_interface() {
            return None;
        }
        let Some(NodeKind::Class { superclass, .. }) = self.ast().kind(self.class) else {
            return None;
        };
        match superclass {
            Some(ty) => Some(self.resolve(ty)),
            None if self.is_enum() => {
                let this = Arc::new(self.clone()) as Arc<dyn TypeDeclaration>;
                let enum_decl = self.solver.parent().try_to_solve_type("java.lang.Enum").into_declaration()?;
                Some(ResolvedType::generic(enum_decl, vec![ResolvedType::reference(this)]))
            }
            None => Some(object_type(&self.solver)),
        }
    }

    fn interfaces(&self) -> Vec<ResolvedType> {
        match self.ast().kind(self.class) {
            Some(NodeKind::Class { interfaces, .. }) => {
                interfaces.iter().map(|ty| self.resolve(ty)).collect()
            }
            _ => Vec::new(),
        }
    }

    fn declared_fields(&self) -> Vec<Arc<dyn FieldDeclaration>> {
        self.members(|kind| match kind {
            NodeKind::Class { fields, .. } => Some(fields),
            _ => None,
        })
        .into_iter()
        .map(|field| Arc::new(self.member(field)) as Arc<dyn FieldDeclaration>)
        .collect()
    }

    fn declared_methods(&self) -> Vec<Arc<dyn MethodDeclaration>> {
        self.members(|kind| match kind {
            NodeKind::Class { methods, .. } => Some(methods),
            _ => None,
        })
        .into_iter()
        .map(|method| Arc::new(self.member(method)) as Arc<dyn MethodDeclaration>)
        .collect()
    }

    fn constructors(&self) -> Vec<Arc<dyn ConstructorDeclaration>> {
        self.members(|kind| match kind {
            NodeKind::Class { constructors, .. } => Some(constructors),
            _ => None,
        })
        .into_iter()
        .map(|ctor| Arc::new(self.member(ctor)) as Arc<dyn ConstructorDeclaration>)
        .collect()
    }
}

/// A field, method or constructor of an [`AstClass`].
#[derive(Clone)]
pub struct AstMember {
    solver: AstTypeSolver,
    owner: NodeId,
    member: NodeId,
}

impl fmt::Debug for AstMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstMember")
            .field("owner", &self.owner)
            .field("member", &self.member)
            .finish()
    }
}

impl AstMember {
    pub fn node(&self) -> NodeId {
        self.member
    }

    fn ast(&self) -> &Ast {
        self.solver.ast()
    }

    /// Method type parameters followed by the class's.
    fn type_vars(&self) -> Vec<TypeParameter> {
        let class_vars = class_type_parameters(&self.solver, self.ast(), self.owner);
        let mut vars = match self.ast().kind(self.member) {
            Some(NodeKind::Method { type_params, .. }) => {
                type_parameters(&self.solver, type_params, &class_vars)
            }
            _ => Vec::new(),
        };
        vars.extend(class_vars);
        vars
    }

    fn params(&self) -> Vec<ResolvedParameter> {
        let params = match self.ast().kind(self.member) {
            Some(NodeKind::Method { params, .. } | NodeKind::Constructor { params, .. }) => params,
            _ => return Vec::new(),
        };
        let vars = self.type_vars();
        params
            .iter()
            .filter_map(|&param| parameter(&self.solver, self.ast(), param, &vars))
            .collect()
    }

    fn member_modifiers(&self) -> Modifiers {
        match self.ast().kind(self.member) {
            Some(
                NodeKind::Field { modifiers, .. }
                | NodeKind::Method { modifiers, .. }
                | NodeKind::Constructor { modifiers, .. },
            ) => *modifiers,
            _ => Modifiers::empty(),
        }
    }

    fn owner_name(&self) -> String {
        self.ast().qualified_name(self.owner).unwrap_or_default()
    }
}

impl FieldDeclaration for AstMember {
    fn name(&self) -> &str {
        self.ast().name(self.member).unwrap_or_default()
    }

    /// The declared type; `def` fields are `Object`.
    fn ty(&self) -> ResolvedType {
        match self.ast().kind(self.member) {
            Some(NodeKind::Field { ty, .. }) => resolve_type_ref(&self.solver, ty, &self.type_vars()),
            _ => object_type(&self.solver),
        }
    }

    fn modifiers(&self) -> Modifiers {
        self.member_modifiers()
    }

    fn declaring_type(&self) -> String {
        self.owner_name()
    }
}

impl MethodDeclaration for AstMember {
    fn name(&self) -> &str {
        self.ast().name(self.member).unwrap_or_default()
    }

    fn return_type(&self) -> ResolvedType {
        match self.ast().kind(self.member) {
            Some(NodeKind::Method { return_type, .. }) => {
                resolve_type_ref(&self.solver, return_type, &self.type_vars())
            }
            _ => object_type(&self.solver),
        }
    }

    fn parameters(&self) -> Vec<ResolvedParameter> {
        self.params()
    }

    fn modifiers(&self) -> Modifiers {
        self.member_modifiers()
    }

    fn declaring_type(&self) -> String {
        self.owner_name()
    }

    fn type_parameters(&self) -> Vec<TypeParameter> {
        let class_vars = class_type_parameters(&self.solver, self.ast(), self.owner);
        match self.ast().kind(self.member) {
            Some(NodeKind::Method { type_params, .. }) => {
                type_parameters(&self.solver, type_params, &class_vars)
            }
            _ => Vec::new(),
        }
    }
}

impl ConstructorDeclaration for AstMember {
    fn parameters(&self) -> Vec<ResolvedParameter> {
        self.params()
    }

    fn modifiers(&self) -> Modifiers {
        self.member_modifiers()
    }

    fn declaring_type(&self) -> String {
        self.owner_name()
    }
}
