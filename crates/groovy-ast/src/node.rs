use std::fmt;

use groovy_core::{Modifiers, Name, Range, TypeRef};
pub use groovy_syntax::raw::ConstantValue;

use crate::comments::Comment;
use crate::ops::{BinaryOp, IncrementOp, UnaryOp};

/// Handle of a node inside its [`Ast`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Trait,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: Name,
    pub bounds: Vec<TypeRef>,
}

/// Every concrete node kind. Children are referenced by [`NodeId`]; names
/// and unresolved types are stored inline.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    CompilationUnit {
        package: Option<NodeId>,
        imports: Vec<NodeId>,
        types: Vec<NodeId>,
    },
    Package {
        name: Name,
    },
    Import {
        name: Name,
        alias: Option<Name>,
        is_static: bool,
        is_star: bool,
    },
    /// `value` holds a single unnamed member; everything else is in `members`.
    Annotation {
        name: Name,
        value: Option<NodeId>,
        members: Vec<(Name, NodeId)>,
    },

    // Declarations
    Class {
        name: Name,
        kind: ClassKind,
        is_script: bool,
        modifiers: Modifiers,
        type_params: Vec<TypeParam>,
        superclass: Option<TypeRef>,
        interfaces: Vec<TypeRef>,
        fields: Vec<NodeId>,
        constructors: Vec<NodeId>,
        methods: Vec<NodeId>,
    },
    Field {
        name: Name,
        ty: TypeRef,
        modifiers: Modifiers,
        initializer: Option<NodeId>,
        is_enum_constant: bool,
    },
    Method {
        name: Name,
        return_type: TypeRef,
        modifiers: Modifiers,
        type_params: Vec<TypeParam>,
        params: Vec<NodeId>,
        throws: Vec<TypeRef>,
        body: Option<NodeId>,
    },
    Constructor {
        name: Name,
        modifiers: Modifiers,
        params: Vec<NodeId>,
        throws: Vec<TypeRef>,
        body: Option<NodeId>,
    },
    Parameter {
        name: Name,
        ty: TypeRef,
        variadic: bool,
        default: Option<NodeId>,
    },

    // Statements
    Block {
        statements: Vec<NodeId>,
    },
    ExpressionStmt {
        expr: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    ForIn {
        variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    For {
        init: Vec<NodeId>,
        condition: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    Try {
        body: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },
    Catch {
        param: NodeId,
        body: NodeId,
    },
    Throw {
        expr: NodeId,
    },
    Switch {
        subject: NodeId,
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    },
    Case {
        value: NodeId,
        body: Vec<NodeId>,
    },
    Break {
        label: Option<Name>,
    },
    Continue {
        label: Option<Name>,
    },
    Assert {
        condition: NodeId,
        message: Option<NodeId>,
    },
    EmptyStmt,

    // Expressions
    Constant(ConstantValue),
    Variable {
        name: Name,
    },
    /// `def x = 1` / `String s`; `target` is the declared [`NodeKind::Variable`].
    Declaration {
        ty: TypeRef,
        target: NodeId,
        value: Option<NodeId>,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Ternary {
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Elvis {
        value: NodeId,
        fallback: NodeId,
    },
    /// `params` is `None` when no parameter list was written (implicit `it`).
    Closure {
        params: Option<Vec<NodeId>>,
        body: NodeId,
    },
    Lambda {
        params: Vec<NodeId>,
        body: NodeId,
    },
    MethodCall {
        receiver: Option<NodeId>,
        name: Name,
        args: Vec<NodeId>,
        safe: bool,
        spread: bool,
    },
    ConstructorCall {
        ty: TypeRef,
        args: Vec<NodeId>,
    },
    Property {
        object: NodeId,
        name: Name,
        safe: bool,
        spread: bool,
    },
    Attribute {
        object: NodeId,
        name: Name,
        safe: bool,
    },
    List {
        elements: Vec<NodeId>,
    },
    Map {
        entries: Vec<NodeId>,
    },
    MapEntry {
        key: NodeId,
        value: NodeId,
    },
    Range {
        from: NodeId,
        to: NodeId,
        inclusive: bool,
    },
    Cast {
        ty: TypeRef,
        expr: NodeId,
        coerce: bool,
    },
    ClassExpr {
        ty: TypeRef,
    },
    GString {
        verbatim: String,
        strings: Vec<String>,
        values: Vec<NodeId>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Increment {
        op: IncrementOp,
        prefix: bool,
        operand: NodeId,
    },
    Spread {
        expr: NodeId,
    },
    SpreadMap {
        expr: NodeId,
    },
    MethodPointer {
        object: NodeId,
        name: Name,
    },
    ArrayCreation {
        element_type: TypeRef,
        sizes: Vec<NodeId>,
        initializer: Option<Vec<NodeId>>,
    },
    EmptyExpr,
}

impl NodeKind {
    /// Rebuild this kind with every child handle passed through `f`.
    ///
    /// This is the single exhaustive table over node kinds: cloning, child
    /// enumeration and structural comparison all go through it, so a new
    /// kind cannot be added without deciding how its children are visited.
    pub fn try_map_children<E>(
        &self,
        f: &mut impl FnMut(NodeId) -> Result<NodeId, E>,
    ) -> Result<NodeKind, E> {
        let kind = match self {
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            } => NodeKind::CompilationUnit {
                package: map_opt(package, f)?,
                imports: map_vec(imports, f)?,
                types: map_vec(types, f)?,
            },
            NodeKind::Package { name } => NodeKind::Package { name: name.clone() },
            NodeKind::Import {
                name,
                alias,
                is_static,
                is_star,
            } => NodeKind::Import {
                name: name.clone(),
                alias: alias.clone(),
                is_static: *is_static,
                is_star: *is_star,
            },
            NodeKind::Annotation {
                name,
                value,
                members,
            } => NodeKind::Annotation {
                name: name.clone(),
                value: map_opt(value, f)?,
                members: members
                    .iter()
                    .map(|(key, id)| Ok((key.clone(), f(*id)?)))
                    .collect::<Result<_, E>>()?,
            },
            NodeKind::Class {
                name,
                kind,
                is_script,
                modifiers,
                type_params,
                superclass,
                interfaces,
                fields,
                constructors,
                methods,
            } => NodeKind::Class {
                name: name.clone(),
                kind: *kind,
                is_script: *is_script,
                modifiers: *modifiers,
                type_params: type_params.clone(),
                superclass: superclass.clone(),
                interfaces: interfaces.clone(),
                fields: map_vec(fields, f)?,
                constructors: map_vec(constructors, f)?,
                methods: map_vec(methods, f)?,
            },
            NodeKind::Field {
                name,
                ty,
                modifiers,
                initializer,
                is_enum_constant,
            } => NodeKind::Field {
                name: name.clone(),
                ty: ty.clone(),
                modifiers: *modifiers,
                initializer: map_opt(initializer, f)?,
                is_enum_constant: *is_enum_constant,
            },
            NodeKind::Method {
                name,
                return_type,
                modifiers,
                type_params,
                params,
                throws,
                body,
            } => NodeKind::Method {
                name: name.clone(),
                return_type: return_type.clone(),
                modifiers: *modifiers,
                type_params: type_params.clone(),
                params: map_vec(params, f)?,
                throws: throws.clone(),
                body: map_opt(body, f)?,
            },
            NodeKind::Constructor {
                name,
                modifiers,
                params,
                throws,
                body,
            } => NodeKind::Constructor {
                name: name.clone(),
                modifiers: *modifiers,
                params: map_vec(params, f)?,
                throws: throws.clone(),
                body: map_opt(body, f)?,
            },
            NodeKind::Parameter {
                name,
                ty,
                variadic,
                default,
            } => NodeKind::Parameter {
                name: name.clone(),
                ty: ty.clone(),
                variadic: *variadic,
                default: map_opt(default, f)?,
            },
            NodeKind::Block { statements } => NodeKind::Block {
                statements: map_vec(statements, f)?,
            },
            NodeKind::ExpressionStmt { expr } => NodeKind::ExpressionStmt { expr: f(*expr)? },
            NodeKind::Return { value } => NodeKind::Return {
                value: map_opt(value, f)?,
            },
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => NodeKind::If {
                condition: f(*condition)?,
                then_branch: f(*then_branch)?,
                else_branch: map_opt(else_branch, f)?,
            },
            NodeKind::ForIn {
                variable,
                iterable,
                body,
            } => NodeKind::ForIn {
                variable: f(*variable)?,
                iterable: f(*iterable)?,
                body: f(*body)?,
            },
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => NodeKind::For {
                init: map_vec(init, f)?,
                condition: map_opt(condition, f)?,
                update: map_vec(update, f)?,
                body: f(*body)?,
            },
            NodeKind::While { condition, body } => NodeKind::While {
                condition: f(*condition)?,
                body: f(*body)?,
            },
            NodeKind::DoWhile { body, condition } => NodeKind::DoWhile {
                body: f(*body)?,
                condition: f(*condition)?,
            },
            NodeKind::Try {
                body,
                catches,
                finally,
            } => NodeKind::Try {
                body: f(*body)?,
                catches: map_vec(catches, f)?,
                finally: map_opt(finally, f)?,
            },
            NodeKind::Catch { param, body } => NodeKind::Catch {
                param: f(*param)?,
                body: f(*body)?,
            },
            NodeKind::Throw { expr } => NodeKind::Throw { expr: f(*expr)? },
            NodeKind::Switch {
                subject,
                cases,
                default,
            } => NodeKind::Switch {
                subject: f(*subject)?,
                cases: map_vec(cases, f)?,
                default: map_opt(default, f)?,
            },
            NodeKind::Case { value, body } => NodeKind::Case {
                value: f(*value)?,
                body: map_vec(body, f)?,
            },
            NodeKind::Break { label } => NodeKind::Break {
                label: label.clone(),
            },
            NodeKind::Continue { label } => NodeKind::Continue {
                label: label.clone(),
            },
            NodeKind::Assert { condition, message } => NodeKind::Assert {
                condition: f(*condition)?,
                message: map_opt(message, f)?,
            },
            NodeKind::EmptyStmt => NodeKind::EmptyStmt,
            NodeKind::Constant(value) => NodeKind::Constant(value.clone()),
            NodeKind::Variable { name } => NodeKind::Variable { name: name.clone() },
            NodeKind::Declaration { ty, target, value } => NodeKind::Declaration {
                ty: ty.clone(),
                target: f(*target)?,
                value: map_opt(value, f)?,
            },
            NodeKind::Binary { op, left, right } => NodeKind::Binary {
                op: *op,
                left: f(*left)?,
                right: f(*right)?,
            },
            NodeKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => NodeKind::Ternary {
                condition: f(*condition)?,
                then_expr: f(*then_expr)?,
                else_expr: f(*else_expr)?,
            },
            NodeKind::Elvis { value, fallback } => NodeKind::Elvis {
                value: f(*value)?,
                fallback: f(*fallback)?,
            },
            NodeKind::Closure { params, body } => NodeKind::Closure {
                params: match params {
                    Some(params) => Some(map_vec(params, f)?),
                    None => None,
                },
                body: f(*body)?,
            },
            NodeKind::Lambda { params, body } => NodeKind::Lambda {
                params: map_vec(params, f)?,
                body: f(*body)?,
            },
            NodeKind::MethodCall {
                receiver,
                name,
                args,
                safe,
                spread,
            } => NodeKind::MethodCall {
                receiver: map_opt(receiver, f)?,
                name: name.clone(),
                args: map_vec(args, f)?,
                safe: *safe,
                spread: *spread,
            },
            NodeKind::ConstructorCall { ty, args } => NodeKind::ConstructorCall {
                ty: ty.clone(),
                args: map_vec(args, f)?,
            },
            NodeKind::Property {
                object,
                name,
                safe,
                spread,
            } => NodeKind::Property {
                object: f(*object)?,
                name: name.clone(),
                safe: *safe,
                spread: *spread,
            },
            NodeKind::Attribute { object, name, safe } => NodeKind::Attribute {
                object: f(*object)?,
                name: name.clone(),
                safe: *safe,
            },
            NodeKind::List { elements } => NodeKind::List {
                elements: map_vec(elements, f)?,
            },
            NodeKind::Map { entries } => NodeKind::Map {
                entries: map_vec(entries, f)?,
            },
            NodeKind::MapEntry { key, value } => NodeKind::MapEntry {
                key: f(*key)?,
                value: f(*value)?,
            },
            NodeKind::Range {
                from,
                to,
                inclusive,
            } => NodeKind::Range {
                from: f(*from)?,
                to: f(*to)?,
                inclusive: *inclusive,
            },
            NodeKind::Cast { ty, expr, coerce } => NodeKind::Cast {
                ty: ty.clone(),
                expr: f(*expr)?,
                coerce: *coerce,
            },
            NodeKind::ClassExpr { ty } => NodeKind::ClassExpr { ty: ty.clone() },
            NodeKind::GString {
                verbatim,
                strings,
                values,
            } => NodeKind::GString {
                verbatim: verbatim.clone(),
                strings: strings.clone(),
                values: map_vec(values, f)?,
            },
            NodeKind::Unary { op, operand } => NodeKind::Unary {
                op: *op,
                operand: f(*operand)?,
            },
            NodeKind::Increment {
                op,
                prefix,
                operand,
            } => NodeKind::Increment {
                op: *op,
                prefix: *prefix,
                operand: f(*operand)?,
            },
            NodeKind::Spread { expr } => NodeKind::Spread { expr: f(*expr)? },
            NodeKind::SpreadMap { expr } => NodeKind::SpreadMap { expr: f(*expr)? },
            NodeKind::MethodPointer { object, name } => NodeKind::MethodPointer {
                object: f(*object)?,
                name: name.clone(),
            },
            NodeKind::ArrayCreation {
                element_type,
                sizes,
                initializer,
            } => NodeKind::ArrayCreation {
                element_type: element_type.clone(),
                sizes: map_vec(sizes, f)?,
                initializer: match initializer {
                    Some(items) => Some(map_vec(items, f)?),
                    None => None,
                },
            },
            NodeKind::EmptyExpr => NodeKind::EmptyExpr,
        };
        Ok(kind)
    }

    /// Child handles in source order (annotations excluded).
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let _ = self.try_map_children(&mut |id| {
            out.push(id);
            Ok::<_, std::convert::Infallible>(id)
        });
        out
    }

    /// Declared name for named declarations, variables and member accesses.
    pub fn name(&self) -> Option<&Name> {
        match self {
            NodeKind::Package { name }
            | NodeKind::Import { name, .. }
            | NodeKind::Annotation { name, .. }
            | NodeKind::Class { name, .. }
            | NodeKind::Field { name, .. }
            | NodeKind::Method { name, .. }
            | NodeKind::Constructor { name, .. }
            | NodeKind::Parameter { name, .. }
            | NodeKind::Variable { name }
            | NodeKind::MethodCall { name, .. }
            | NodeKind::Property { name, .. }
            | NodeKind::Attribute { name, .. }
            | NodeKind::MethodPointer { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::Class { .. }
                | NodeKind::Field { .. }
                | NodeKind::Method { .. }
                | NodeKind::Constructor { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Constant(_)
                | NodeKind::Variable { .. }
                | NodeKind::Declaration { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Ternary { .. }
                | NodeKind::Elvis { .. }
                | NodeKind::Closure { .. }
                | NodeKind::Lambda { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::ConstructorCall { .. }
                | NodeKind::Property { .. }
                | NodeKind::Attribute { .. }
                | NodeKind::List { .. }
                | NodeKind::Map { .. }
                | NodeKind::MapEntry { .. }
                | NodeKind::Range { .. }
                | NodeKind::Cast { .. }
                | NodeKind::ClassExpr { .. }
                | NodeKind::GString { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Increment { .. }
                | NodeKind::Spread { .. }
                | NodeKind::SpreadMap { .. }
                | NodeKind::MethodPointer { .. }
                | NodeKind::ArrayCreation { .. }
                | NodeKind::EmptyExpr
        )
    }
}

fn map_vec<E>(
    ids: &[NodeId],
    f: &mut impl FnMut(NodeId) -> Result<NodeId, E>,
) -> Result<Vec<NodeId>, E> {
    ids.iter().map(|id| f(*id)).collect()
}

fn map_opt<E>(
    id: &Option<NodeId>,
    f: &mut impl FnMut(NodeId) -> Result<NodeId, E>,
) -> Result<Option<NodeId>, E> {
    id.map(|id| f(id)).transpose()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Option<Range>,
    pub annotations: Vec<NodeId>,
    /// Leading documentation comment.
    pub comment: Option<Comment>,
    /// Comments between the previous declaration and the leading one.
    pub orphan_comments: Vec<Comment>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Annotations first, then the kind's children.
    pub fn children(&self) -> Vec<NodeId> {
        let mut children = self.annotations.clone();
        children.extend(self.kind.children());
        children
    }
}

/// Arena holding one parsed document. Nodes never move once allocated, and
/// a node's parent is recorded when the parent is allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// An empty compilation unit.
    pub fn empty() -> Self {
        let mut ast = Self::new();
        let root = ast.alloc(
            NodeKind::CompilationUnit {
                package: None,
                imports: Vec::new(),
                types: Vec::new(),
            },
            None,
            Vec::new(),
        );
        ast.set_root(root);
        ast
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId(0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node and adopt its children.
    pub(crate) fn alloc(
        &mut self,
        kind: NodeKind,
        range: Option<Range>,
        annotations: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        let children: Vec<NodeId> = annotations.iter().copied().chain(kind.children()).collect();
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.idx()) {
                debug_assert!(node.parent.is_none(), "{child:?} attached twice");
                node.parent = Some(id);
            }
        }
        self.nodes.push(Node {
            kind,
            range,
            annotations,
            comment: None,
            orphan_comments: Vec::new(),
            parent: None,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.idx())
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn range(&self, id: NodeId) -> Option<Range> {
        self.get(id).and_then(|node| node.range)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(NodeKind::name).map(|name| name.as_str())
    }

    /// Top-level type declarations of the compilation unit.
    pub fn types(&self) -> &[NodeId] {
        match self.kind(self.root()) {
            Some(NodeKind::CompilationUnit { types, .. }) => types,
            _ => &[],
        }
    }

    pub fn imports(&self) -> &[NodeId] {
        match self.kind(self.root()) {
            Some(NodeKind::CompilationUnit { imports, .. }) => imports,
            _ => &[],
        }
    }

    pub fn package_name(&self) -> Option<&str> {
        match self.kind(self.root()) {
            Some(NodeKind::CompilationUnit {
                package: Some(package),
                ..
            }) => self.name(*package),
            _ => None,
        }
    }

    /// Fully qualified name of a class node declared in this unit.
    pub fn qualified_name(&self, class: NodeId) -> Option<String> {
        let name = match self.kind(class)? {
            NodeKind::Class { name, .. } => name,
            _ => return None,
        };
        Some(match self.package_name() {
            Some(package) if !package.is_empty() => format!("{package}.{name}"),
            _ => name.to_string(),
        })
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index.idx()]
    }
}
