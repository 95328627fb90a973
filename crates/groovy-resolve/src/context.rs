//! Lexical scopes enclosing a node.
//!
//! A [`ContextChain`] is built per query by walking a node's ancestors and
//! is discarded afterwards. Name lookup runs innermost first, so a closure
//! parameter hides a local, a local hides a method parameter, and a method
//! parameter hides a field of the enclosing class.
//!
//! Locals are order sensitive: only declarations in statements *before* the
//! one containing the query node are visible, which also keeps inference of
//! `def x = ...` from ever looking at itself.

use groovy_ast::{Ast, NodeId, NodeKind};
use groovy_types::{
    find_field, find_methods, object_type, select_method, MemberMethod, ResolvedType,
    SymbolReference, TypeParameter, TypeRefResult, TypeSolver, ValueDeclaration,
};

use crate::declarations::{class_type_parameters, type_parameters};
use crate::extractor::TypeExtractor;
use crate::resolver::SymbolResolver;
use crate::solver::AstTypeSolver;

/// Name of the implicit parameter of a closure written without a parameter
/// list.
pub const IMPLICIT_PARAMETER: &str = "it";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Static imports of the file.
    CompilationUnit,
    /// Fields and methods of `class`, inherited ones included.
    Class { class: NodeId },
    /// Parameters of a method or constructor, plus `locals` declared in its
    /// body before the query point, innermost first.
    Method { method: NodeId, locals: Vec<NodeId> },
    /// Parameters of a closure or lambda, plus its visible `locals`.
    Closure { closure: NodeId, locals: Vec<NodeId> },
}

/// Scopes visible from one node, innermost first. The last context is
/// always [`Context::CompilationUnit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChain {
    node: NodeId,
    contexts: Vec<Context>,
}

impl ContextChain {
    pub fn build(ast: &Ast, node: NodeId) -> Self {
        let mut contexts = Vec::new();
        let mut locals = Vec::new();

        match ast.kind(node) {
            Some(NodeKind::Method { .. } | NodeKind::Constructor { .. }) => {
                contexts.push(Context::Method {
                    method: node,
                    locals: Vec::new(),
                });
            }
            Some(NodeKind::Class { .. }) => contexts.push(Context::Class { class: node }),
            _ => {}
        }

        let mut child = node;
        for scope in ast.ancestors(node) {
            let Some(kind) = ast.kind(scope) else {
                break;
            };
            match kind {
                NodeKind::Block { statements } => {
                    collect_preceding(ast, statements, child, &mut locals);
                }
                NodeKind::Case { body, .. } => collect_preceding(ast, body, child, &mut locals),
                NodeKind::ForIn { variable, body, .. } if *body == child => locals.push(*variable),
                NodeKind::For { init, .. } if !init.contains(&child) => {
                    for &expr in init.iter().rev() {
                        if let Some(NodeKind::Declaration { target, .. }) = ast.kind(expr) {
                            locals.push(*target);
                        }
                    }
                }
                NodeKind::Catch { param, body } if *body == child => locals.push(*param),
                NodeKind::Closure { .. } | NodeKind::Lambda { .. } => {
                    contexts.push(Context::Closure {
                        closure: scope,
                        locals: std::mem::take(&mut locals),
                    });
                }
                NodeKind::Method { .. } | NodeKind::Constructor { .. } => {
                    contexts.push(Context::Method {
                        method: scope,
                        locals: std::mem::take(&mut locals),
                    });
                }
                NodeKind::Class { .. } => {
                    locals.clear();
                    contexts.push(Context::Class { class: scope });
                }
                _ => {}
            }
            child = scope;
        }

        contexts.push(Context::CompilationUnit);
        Self { node, contexts }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn enclosing_class(&self) -> Option<NodeId> {
        self.contexts.iter().find_map(|context| match context {
            Context::Class { class } => Some(*class),
            _ => None,
        })
    }

    pub fn enclosing_method(&self) -> Option<NodeId> {
        self.contexts.iter().find_map(|context| match context {
            Context::Method { method, .. } => Some(*method),
            _ => None,
        })
    }

    /// Type parameters in scope: the method's, then each enclosing class's.
    pub fn type_variables(&self, solver: &AstTypeSolver) -> Vec<TypeParameter> {
        let ast = solver.ast();
        let mut out = Vec::new();
        for context in &self.contexts {
            match context {
                Context::Method { method, .. } => {
                    if let Some(NodeKind::Method { type_params, .. }) = ast.kind(*method) {
                        let outer = self
                            .enclosing_class()
                            .map(|class| class_type_parameters(solver, ast, class))
                            .unwrap_or_default();
                        out.extend(type_parameters(solver, type_params, &outer));
                    }
                }
                Context::Class { class } => out.extend(class_type_parameters(solver, ast, *class)),
                _ => {}
            }
        }
        out
    }

    pub fn solve_symbol(&self, resolver: &SymbolResolver, name: &str) -> SymbolReference<ValueDeclaration> {
        self.solve_symbol_with(&TypeExtractor::new(resolver), name)
    }

    pub(crate) fn solve_symbol_with(
        &self,
        extractor: &TypeExtractor<'_>,
        name: &str,
    ) -> SymbolReference<ValueDeclaration> {
        if name.is_empty() {
            return SymbolReference::unsolved();
        }
        let resolver = extractor.resolver();
        let ast = resolver.ast();
        let solver = resolver.type_solver();

        for context in &self.contexts {
            let found = match context {
                Context::Closure { closure, locals } => {
                    find_local(extractor, locals, name).or_else(|| {
                        match ast.kind(*closure) {
                            Some(NodeKind::Closure { params: None, .. }) if name == IMPLICIT_PARAMETER => {
                                Some(ValueDeclaration::Parameter {
                                    name: IMPLICIT_PARAMETER.into(),
                                    ty: object_type(solver),
                                })
                            }
                            Some(
                                NodeKind::Closure {
                                    params: Some(params),
                                    ..
                                }
                                | NodeKind::Lambda { params, .. },
                            ) => find_parameter(extractor, params, name),
                            _ => None,
                        }
                    })
                }
                Context::Method { method, locals } => find_local(extractor, locals, name).or_else(|| {
                    match ast.kind(*method) {
                        Some(
                            NodeKind::Method { params, .. } | NodeKind::Constructor { params, .. },
                        ) => find_parameter(extractor, params, name),
                        _ => None,
                    }
                }),
                Context::Class { class } => {
                    let class_type = resolver.class_type(*class);
                    find_field(solver, &class_type, name).map(|field| ValueDeclaration::Field(field.decl))
                }
                Context::CompilationUnit => static_import_field(solver, name),
            };
            if let Some(found) = found {
                return SymbolReference::solved(found);
            }
        }
        SymbolReference::unsolved()
    }

    pub fn solve_type(&self, resolver: &SymbolResolver, name: &str) -> TypeRefResult {
        resolver.type_solver().try_to_solve_type(name)
    }

    /// The method a call to `name` without an explicit receiver reaches.
    pub fn solve_method(
        &self,
        resolver: &SymbolResolver,
        name: &str,
        arg_types: &[ResolvedType],
    ) -> SymbolReference<MemberMethod> {
        if name.is_empty() {
            return SymbolReference::unsolved();
        }
        let solver = resolver.type_solver();
        for context in &self.contexts {
            let found = match context {
                Context::Class { class } => {
                    let class_type = resolver.class_type(*class);
                    select_method(solver, find_methods(solver, &class_type, name), arg_types)
                }
                Context::CompilationUnit => static_import_method(solver, name, arg_types),
                _ => None,
            };
            if let Some(found) = found {
                return SymbolReference::solved(found);
            }
        }
        SymbolReference::unsolved()
    }
}

/// Declarations in `statements` before the one holding `child`, nearest
/// first.
fn collect_preceding(ast: &Ast, statements: &[NodeId], child: NodeId, out: &mut Vec<NodeId>) {
    let end = statements
        .iter()
        .position(|&stmt| stmt == child)
        .unwrap_or(statements.len());
    for &stmt in statements[..end].iter().rev() {
        let expr = match ast.kind(stmt) {
            Some(NodeKind::ExpressionStmt { expr }) => *expr,
            _ => stmt,
        };
        if let Some(NodeKind::Declaration { target, .. }) = ast.kind(expr) {
            out.push(*target);
        }
    }
}

fn find_local(extractor: &TypeExtractor<'_>, locals: &[NodeId], name: &str) -> Option<ValueDeclaration> {
    let ast = extractor.resolver().ast();
    let local = locals.iter().copied().find(|&local| ast.name(local) == Some(name))?;
    Some(ValueDeclaration::Local {
        name: name.into(),
        ty: extractor.value_type(local),
    })
}

fn find_parameter(extractor: &TypeExtractor<'_>, params: &[NodeId], name: &str) -> Option<ValueDeclaration> {
    let ast = extractor.resolver().ast();
    let param = params.iter().copied().find(|&param| ast.name(param) == Some(name))?;
    Some(ValueDeclaration::Parameter {
        name: name.into(),
        ty: extractor.value_type(param),
    })
}

/// Owner types of static imports that may provide `name`.
fn static_import_owners(solver: &AstTypeSolver, name: &str) -> Vec<(ResolvedType, String)> {
    let ast = solver.ast();
    let mut out = Vec::new();
    for &import in ast.imports() {
        let Some(NodeKind::Import {
            name: imported,
            alias,
            is_static: true,
            is_star,
        }) = ast.kind(import)
        else {
            continue;
        };
        let (owner, member) = if *is_star {
            (imported.as_str(), name.to_string())
        } else {
            let Some((owner, member)) = imported.rsplit_once('.') else {
                continue;
            };
            if alias.as_deref().unwrap_or(member) != name {
                continue;
            }
            (owner, member.to_string())
        };
        if let Some(decl) = solver.try_to_solve_type(owner).into_declaration() {
            out.push((ResolvedType::reference(decl), member));
        }
    }
    out
}

fn static_import_field(solver: &AstTypeSolver, name: &str) -> Option<ValueDeclaration> {
    static_import_owners(solver, name)
        .into_iter()
        .find_map(|(owner, member)| find_field(solver, &owner, &member).filter(|f| f.decl.is_static()))
        .map(|field| ValueDeclaration::Field(field.decl))
}

fn static_import_method(solver: &AstTypeSolver, name: &str, arg_types: &[ResolvedType]) -> Option<MemberMethod> {
    static_import_owners(solver, name).into_iter().find_map(|(owner, member)| {
        let candidates = find_methods(solver, &owner, &member)
            .into_iter()
            .filter(|m| m.decl.is_static())
            .collect();
        select_method(solver, candidates, arg_types)
    })
}
