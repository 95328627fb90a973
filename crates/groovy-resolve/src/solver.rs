use std::fmt;
use std::sync::Arc;

use groovy_ast::{Ast, NodeId, NodeKind};
use groovy_types::{SymbolReference, TypeDeclaration, TypeRefResult, TypeSolver};

use crate::declarations::AstClass;

/// Packages Groovy imports into every compilation unit besides `java.lang`.
pub const DEFAULT_PACKAGES: [&str; 6] = [
    "java.util",
    "java.io",
    "java.net",
    "groovy.lang",
    "groovy.util",
    "java.math",
];

/// Type solver scoped to one compilation unit.
///
/// Names are tried in this order: exact qualified name, a class declared in
/// the unit (qualified or simple name), explicit imports, star imports, the
/// unit's own package, `java.lang`, then [`DEFAULT_PACKAGES`]. Anything not
/// declared in the unit is looked up through `parent`.
#[derive(Clone)]
pub struct AstTypeSolver {
    ast: Arc<Ast>,
    parent: Arc<dyn TypeSolver>,
}

impl fmt::Debug for AstTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstTypeSolver")
            .field("package", &self.ast.package_name())
            .field("types", &self.ast.types().len())
            .finish()
    }
}

impl AstTypeSolver {
    pub fn new(ast: Arc<Ast>, parent: Arc<dyn TypeSolver>) -> Self {
        Self { ast, parent }
    }

    pub fn ast(&self) -> &Arc<Ast> {
        &self.ast
    }

    pub fn parent(&self) -> &Arc<dyn TypeSolver> {
        &self.parent
    }

    /// Declaration for a class node of this unit.
    pub fn class_declaration(&self, class: NodeId) -> Option<Arc<dyn TypeDeclaration>> {
        match self.ast.kind(class)? {
            NodeKind::Class { .. } => Some(Arc::new(AstClass::new(self.clone(), class))),
            _ => None,
        }
    }

    fn local_by_qualified_name(&self, name: &str) -> Option<NodeId> {
        self.ast
            .types()
            .iter()
            .copied()
            .find(|&class| {
                // Nested classes are stored as `Outer$Inner`.
                self.ast
                    .qualified_name(class)
                    .is_some_and(|qualified| qualified == name || qualified.replace('$', ".") == name)
            })
    }

    fn local_by_simple_name(&self, name: &str) -> Option<NodeId> {
        self.ast
            .types()
            .iter()
            .copied()
            .find(|&class| {
                self.ast
                    .name(class)
                    .is_some_and(|simple| simple == name || simple.rsplit('$').next() == Some(name))
            })
    }

    /// Resolve an already qualified candidate name.
    fn solve_qualified(&self, name: &str) -> TypeRefResult {
        if let Some(class) = self.local_by_qualified_name(name) {
            return SymbolReference::from(self.class_declaration(class));
        }
        self.parent.try_to_solve_type(name)
    }

    fn solve_through_imports(&self, name: &str) -> TypeRefResult {
        // `Map.Entry` matches an import of `java.util.Map`.
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        let imports = self.ast.imports();

        for &import in imports {
            let Some(NodeKind::Import {
                name: imported,
                alias,
                is_static: false,
                is_star: false,
            }) = self.ast.kind(import)
            else {
                continue;
            };
            let visible = alias
                .as_deref()
                .unwrap_or_else(|| imported.rsplit('.').next().unwrap_or(imported.as_str()));
            if visible != head {
                continue;
            }
            let candidate = match rest {
                Some(rest) => format!("{imported}.{rest}"),
                None => imported.to_string(),
            };
            let found = self.solve_qualified(&candidate);
            if found.is_solved() {
                return found;
            }
        }

        for &import in imports {
            let Some(NodeKind::Import {
                name: package,
                is_static: false,
                is_star: true,
                ..
            }) = self.ast.kind(import)
            else {
                continue;
            };
            let found = self.solve_qualified(&format!("{package}.{name}"));
            if found.is_solved() {
                return found;
            }
        }
        SymbolReference::unsolved()
    }
}

impl TypeSolver for AstTypeSolver {
    fn try_to_solve_type(&self, name: &str) -> TypeRefResult {
        if name.is_empty() {
            return SymbolReference::unsolved();
        }
        if let Some(class) = self.local_by_qualified_name(name) {
            return SymbolReference::from(self.class_declaration(class));
        }
        if name.contains('.') {
            let found = self.parent.try_to_solve_type(name);
            if found.is_solved() {
                return found;
            }
        }
        if let Some(class) = self.local_by_simple_name(name) {
            return SymbolReference::from(self.class_declaration(class));
        }

        let found = self.solve_through_imports(name);
        if found.is_solved() {
            return found;
        }
        if let Some(package) = self.ast.package_name().filter(|p| !p.is_empty()) {
            let found = self.solve_qualified(&format!("{package}.{name}"));
            if found.is_solved() {
                return found;
            }
        }
        for package in std::iter::once("java.lang").chain(DEFAULT_PACKAGES) {
            let found = self.parent.try_to_solve_type(&format!("{package}.{name}"));
            if found.is_solved() {
                return found;
            }
        }

        tracing::trace!(target: "groovy.resolve", name, "type not found");
        SymbolReference::unsolved()
    }
}
