use std::sync::Arc;

use groovy_ast::{Ast, GroovyParser, NodeId};
use groovy_core::{Position, Problem};
use groovy_types::{
    MemberMethod, ReflectionTypeSolver, ResolvedType, SymbolReference, TypeRefResult, TypeSolver,
    ValueDeclaration,
};

use crate::resolver::SymbolResolver;

/// A parsed document together with everything needed to query it.
///
/// This is the surface language features build on: node queries from the
/// tree, symbol, type and method resolution from the [`SymbolResolver`].
#[derive(Debug, Clone)]
pub struct SemanticModel {
    problems: Vec<Problem>,
    resolver: SymbolResolver,
}

impl SemanticModel {
    pub fn new(ast: Arc<Ast>, solver: Arc<dyn TypeSolver>) -> Self {
        Self {
            problems: Vec::new(),
            resolver: SymbolResolver::new(ast, solver),
        }
    }

    /// Parse `source`. A parse that produced no tree still yields a model
    /// over an empty compilation unit, so queries never need a special case.
    pub fn parse(source: &str, parser: &GroovyParser, solver: Arc<dyn TypeSolver>) -> Self {
        let result = parser.parse(source);
        let ast = result.ast.unwrap_or_else(|| {
            tracing::debug!(
                target: "groovy.resolve",
                problems = result.problems.len(),
                "no tree, using an empty compilation unit"
            );
            Ast::empty()
        });
        Self {
            problems: result.problems,
            resolver: SymbolResolver::new(Arc::new(ast), solver),
        }
    }

    /// Parse with default settings against the built-in class metadata.
    pub fn from_source(source: &str) -> Self {
        Self::parse(
            source,
            &GroovyParser::default(),
            Arc::new(ReflectionTypeSolver::builtin()),
        )
    }

    pub fn ast(&self) -> &Ast {
        self.resolver.ast()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub fn get_all_nodes(&self) -> Vec<NodeId> {
        self.ast().get_all_nodes()
    }

    pub fn get_parent(&self, node: NodeId) -> Option<NodeId> {
        self.ast().get_parent(node)
    }

    pub fn node_at(&self, position: Position) -> Option<NodeId> {
        self.ast().node_at(position)
    }

    pub fn solve_symbol(&self, name: &str, node: NodeId) -> SymbolReference<ValueDeclaration> {
        self.resolver.solve_symbol(name, node)
    }

    pub fn solve_type(&self, name: &str, node: NodeId) -> TypeRefResult {
        self.resolver.solve_type(name, node)
    }

    pub fn solve_method(
        &self,
        name: &str,
        arg_types: &[ResolvedType],
        node: NodeId,
    ) -> SymbolReference<MemberMethod> {
        self.resolver.solve_method(name, arg_types, node)
    }

    pub fn resolve_type(&self, node: NodeId) -> ResolvedType {
        self.resolver.resolve_type(node)
    }

    /// Type of the deepest node at `position`.
    pub fn type_at(&self, position: Position) -> Option<ResolvedType> {
        self.node_at(position).map(|node| self.resolve_type(node))
    }
}
