use std::sync::Arc;

use groovy_ast::{Ast, NodeId, NodeKind};
use groovy_core::TypeRef;
use groovy_types::{
    object_type, resolve_type_ref, MemberMethod, ResolvedType, SymbolReference, TypeRefResult,
    TypeSolver, ValueDeclaration,
};

use crate::context::ContextChain;
use crate::extractor::TypeExtractor;
use crate::solver::AstTypeSolver;

/// Answers "what does this node refer to" for one compilation unit.
///
/// Every query builds a fresh [`ContextChain`] for the node it is asked
/// about; nothing is cached between queries except inside the parent type
/// solver.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    solver: AstTypeSolver,
}

impl SymbolResolver {
    pub fn new(ast: Arc<Ast>, parent: Arc<dyn TypeSolver>) -> Self {
        Self::with_solver(AstTypeSolver::new(ast, parent))
    }

    pub fn with_solver(solver: AstTypeSolver) -> Self {
        Self { solver }
    }

    pub fn ast(&self) -> &Ast {
        self.solver.ast()
    }

    pub fn type_solver(&self) -> &AstTypeSolver {
        &self.solver
    }

    pub fn context(&self, node: NodeId) -> ContextChain {
        ContextChain::build(self.ast(), node)
    }

    pub fn solve_symbol(&self, name: &str, node: NodeId) -> SymbolReference<ValueDeclaration> {
        self.context(node).solve_symbol(self, name)
    }

    /// Solve a type name as written at `node`; type arguments are ignored.
    pub fn solve_type(&self, name: &str, node: NodeId) -> TypeRefResult {
        let name = name.trim();
        let Some(parsed) = TypeRef::parse(name) else {
            return SymbolReference::unsolved();
        };
        self.context(node).solve_type(self, &parsed.name)
    }

    pub fn solve_method(
        &self,
        name: &str,
        arg_types: &[ResolvedType],
        node: NodeId,
    ) -> SymbolReference<MemberMethod> {
        self.context(node).solve_method(self, name, arg_types)
    }

    pub fn extract_type(&self, expr: NodeId) -> ResolvedType {
        TypeExtractor::new(self).extract(expr)
    }

    /// Type of any node: declarations give their declared type, expressions
    /// their inferred type, expression statements the type of their
    /// expression. Everything else is `Object`.
    pub fn resolve_type(&self, node: NodeId) -> ResolvedType {
        let ast = self.ast();
        let Some(kind) = ast.kind(node) else {
            return object_type(&self.solver);
        };
        let extractor = TypeExtractor::new(self);
        match kind {
            NodeKind::Class { .. } => self.class_type(node),
            NodeKind::Field { ty, .. } => self.resolve_type_ref(ty, node),
            NodeKind::Method { return_type, .. } => self.resolve_type_ref(return_type, node),
            NodeKind::Constructor { .. } => ast
                .get_parent(node)
                .map_or_else(|| object_type(&self.solver), |class| self.class_type(class)),
            NodeKind::Parameter { .. } | NodeKind::Variable { .. } => extractor.value_type(node),
            NodeKind::ExpressionStmt { expr } => extractor.extract(*expr),
            NodeKind::Return { value: Some(value) } => extractor.extract(*value),
            kind if kind.is_expression() => extractor.extract(node),
            _ => object_type(&self.solver),
        }
    }

    /// Resolve a written type with the type parameters in scope at `node`.
    pub fn resolve_type_ref(&self, ty: &TypeRef, node: NodeId) -> ResolvedType {
        let type_vars = self.context(node).type_variables(&self.solver);
        resolve_type_ref(&self.solver, ty, &type_vars)
    }

    /// The type of a class declared in this unit, parameterized by its own
    /// type variables.
    pub fn class_type(&self, class: NodeId) -> ResolvedType {
        let Some(decl) = self.solver.class_declaration(class) else {
            return object_type(&self.solver);
        };
        let args = decl.type_parameters().iter().map(|param| param.as_type()).collect();
        ResolvedType::generic(decl, args)
    }

    pub fn enclosing_class(&self, node: NodeId) -> Option<NodeId> {
        self.context(node).enclosing_class()
    }
}
