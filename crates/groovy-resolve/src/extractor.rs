//! Expression type inference.
//!
//! Every rule degrades to `Object` instead of failing: an unknown name, a
//! missing method or a type the solvers cannot find all infer `Object`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use groovy_ast::{Ast, BinaryOp, ConstantValue, NodeId, NodeKind, UnaryOp};
use groovy_core::TypeRef;
use groovy_types::{
    as_supertype, boxed, erase_type_variables, find_field, find_methods, lub, object_type,
    promote, select_method, solve_or_object, MemberMethod, PrimitiveType, ResolvedType,
    TypeSolver, BIG_DECIMAL, BIG_INTEGER,
};

use crate::context::ContextChain;
use crate::resolver::SymbolResolver;
use crate::solver::AstTypeSolver;

/// Nesting limit for inference through initializers and sub-expressions.
pub const MAX_INFERENCE_DEPTH: usize = 128;

const STRING: &str = "java.lang.String";
const GSTRING: &str = "groovy.lang.GString";
const CLOSURE: &str = "groovy.lang.Closure";

/// Infers expression types for one query.
///
/// Types of locals and parameters are remembered for the lifetime of the
/// extractor and shared with every nested copy, so a variable referenced
/// many times is inferred once.
#[derive(Clone)]
pub struct TypeExtractor<'a> {
    resolver: &'a SymbolResolver,
    depth: usize,
    values: Rc<RefCell<HashMap<NodeId, ResolvedType>>>,
}

impl std::fmt::Debug for TypeExtractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeExtractor")
            .field("depth", &self.depth)
            .field("values", &self.values.borrow().len())
            .finish()
    }
}

impl<'a> TypeExtractor<'a> {
    pub fn new(resolver: &'a SymbolResolver) -> Self {
        Self {
            resolver,
            depth: 0,
            values: Rc::default(),
        }
    }

    pub fn resolver(&self) -> &'a SymbolResolver {
        self.resolver
    }

    fn nested(&self) -> Self {
        Self {
            resolver: self.resolver,
            depth: self.depth + 1,
            values: Rc::clone(&self.values),
        }
    }

    fn solver(&self) -> &'a AstTypeSolver {
        self.resolver.type_solver()
    }

    fn ast(&self) -> &'a Ast {
        self.resolver.ast()
    }

    fn object(&self) -> ResolvedType {
        object_type(self.solver())
    }

    fn named(&self, name: &str) -> ResolvedType {
        solve_or_object(self.solver(), name)
    }

    fn generic(&self, name: &str, args: Vec<ResolvedType>) -> ResolvedType {
        match self.solver().try_to_solve_type(name).into_declaration() {
            Some(decl) => ResolvedType::generic(decl, args),
            None => self.object(),
        }
    }

    fn primitive(p: PrimitiveType) -> ResolvedType {
        ResolvedType::Primitive(p)
    }

    fn child(&self, expr: NodeId) -> ResolvedType {
        self.nested().extract(expr)
    }

    fn type_ref(&self, ty: &TypeRef, at: NodeId) -> ResolvedType {
        self.resolver.resolve_type_ref(ty, at)
    }

    /// Static type of `expr`.
    pub fn extract(&self, expr: NodeId) -> ResolvedType {
        if self.depth > MAX_INFERENCE_DEPTH {
            tracing::debug!(target: "groovy.resolve", ?expr, "inference too deep, using Object");
            return self.object();
        }
        let Some(kind) = self.ast().kind(expr) else {
            return self.object();
        };

        match kind {
            NodeKind::Constant(value) => self.constant(value),
            NodeKind::Variable { name } => self.variable(expr, name),
            NodeKind::Declaration { ty, value, .. } => {
                if !ty.is_dynamic() {
                    self.type_ref(ty, expr)
                } else {
                    value.map_or_else(|| self.object(), |value| self.child(value))
                }
            }
            NodeKind::Binary { op, left, right } => self.binary(*op, *left, *right),
            NodeKind::Ternary {
                then_expr,
                else_expr,
                ..
            } => lub(self.solver(), &[self.child(*then_expr), self.child(*else_expr)]),
            NodeKind::Elvis { value, .. } => self.child(*value),
            NodeKind::Closure { .. } | NodeKind::Lambda { .. } | NodeKind::MethodPointer { .. } => {
                self.named(CLOSURE)
            }
            NodeKind::MethodCall {
                receiver,
                name,
                args,
                spread,
                ..
            } => self.method_call(expr, *receiver, name, args, *spread),
            NodeKind::ConstructorCall { ty, .. } | NodeKind::Cast { ty, .. } => self.type_ref(ty, expr),
            NodeKind::Property {
                object,
                name,
                spread,
                ..
            } => {
                let object = self.child(*object);
                if *spread {
                    let element = self.element_type(&object);
                    let ty = self.property(&element, name);
                    self.generic("java.util.ArrayList", vec![boxed(self.solver(), &ty)])
                } else {
                    self.property(&object, name)
                }
            }
            NodeKind::Attribute { object, name, .. } => {
                let object = self.child(*object);
                find_field(self.solver(), &object, name).map_or_else(|| self.object(), |f| f.ty)
            }
            NodeKind::List { elements } => self.list(elements),
            NodeKind::Map { entries } => self.map(entries),
            NodeKind::Range { from, to, .. } => {
                let from = self.child(*from);
                let to = self.child(*to);
                if is_int_like(&from) && is_int_like(&to) {
                    self.named("groovy.lang.IntRange")
                } else {
                    let bound = boxed(self.solver(), &lub(self.solver(), &[from, to]));
                    self.generic("groovy.lang.Range", vec![bound])
                }
            }
            NodeKind::ClassExpr { ty } => {
                let ty = boxed(self.solver(), &self.type_ref(ty, expr));
                self.generic("java.lang.Class", vec![ty])
            }
            NodeKind::GString { .. } => self.named(GSTRING),
            NodeKind::Unary { op, operand } => match op {
                UnaryOp::Not => Self::primitive(PrimitiveType::Boolean),
                UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitwiseNegation => self.child(*operand),
            },
            NodeKind::Increment { operand, .. } => self.child(*operand),
            NodeKind::Spread { expr } | NodeKind::SpreadMap { expr } => self.child(*expr),
            NodeKind::ArrayCreation {
                element_type,
                sizes,
                initializer,
            } => {
                let element = self.type_ref(element_type, expr);
                let dims = sizes.len() as u32 + u32::from(initializer.is_some());
                ResolvedType::array_of(element, dims)
            }
            _ => self.object(),
        }
    }

    fn constant(&self, value: &ConstantValue) -> ResolvedType {
        match value {
            ConstantValue::Null => ResolvedType::Null,
            ConstantValue::Boolean(_) => Self::primitive(PrimitiveType::Boolean),
            ConstantValue::Integer(_) => Self::primitive(PrimitiveType::Int),
            ConstantValue::Long(_) => Self::primitive(PrimitiveType::Long),
            ConstantValue::Float(_) => Self::primitive(PrimitiveType::Float),
            ConstantValue::Double(_) => Self::primitive(PrimitiveType::Double),
            ConstantValue::BigInteger(_) => self.named(BIG_INTEGER),
            ConstantValue::BigDecimal(_) => self.named(BIG_DECIMAL),
            ConstantValue::String(_) => self.named(STRING),
        }
    }

    fn variable(&self, expr: NodeId, name: &str) -> ResolvedType {
        let chain = ContextChain::build(self.ast(), expr);
        match name {
            "this" => {
                return chain
                    .enclosing_class()
                    .map_or_else(|| self.object(), |class| self.resolver.class_type(class));
            }
            "super" => {
                return chain
                    .enclosing_class()
                    .and_then(|class| self.solver().class_declaration(class))
                    .and_then(|decl| decl.superclass())
                    .unwrap_or_else(|| self.object());
            }
            _ => {}
        }
        if let Some(value) = chain.solve_symbol_with(self, name).into_declaration() {
            return value.ty();
        }
        // `Math.max(..)`: a capitalized name that is no value names a class.
        if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            if let Some(decl) = chain.solve_type(self.resolver, name).into_declaration() {
                return ResolvedType::reference(decl);
            }
        }
        self.object()
    }

    fn binary(&self, op: BinaryOp, left: NodeId, right: NodeId) -> ResolvedType {
        if op.is_boolean() {
            return Self::primitive(PrimitiveType::Boolean);
        }
        if op.is_assignment() {
            return self.child(left);
        }
        match op {
            BinaryOp::Compare => return Self::primitive(PrimitiveType::Int),
            BinaryOp::RegexFind => return self.named("java.util.regex.Matcher"),
            BinaryOp::Power => return self.named(BIG_DECIMAL),
            _ => {}
        }

        let l = self.child(left);
        if op.is_shift() {
            return match l.unboxed() {
                Some(PrimitiveType::Long) => Self::primitive(PrimitiveType::Long),
                Some(p) if p.is_numeric() => Self::primitive(PrimitiveType::Int),
                _ => l,
            };
        }
        if matches!(op, BinaryOp::Index | BinaryOp::SafeIndex) {
            return self.index(l, right);
        }

        let r = self.child(right);
        let solver = self.solver();
        match op {
            BinaryOp::Plus => {
                if is_string(&l) || is_string(&r) {
                    self.named(STRING)
                } else if let Some(promoted) = promote(solver, &l, &r) {
                    promoted
                } else if as_supertype(solver, &l, "java.util.Collection").is_some()
                    || as_supertype(solver, &l, "java.util.Map").is_some()
                {
                    l
                } else {
                    self.object()
                }
            }
            BinaryOp::Minus | BinaryOp::Multiply if is_string(&l) => self.named(STRING),
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor if l.is_boolean() && r.is_boolean() => {
                Self::primitive(PrimitiveType::Boolean)
            }
            _ => promote(solver, &l, &r).unwrap_or_else(|| self.object()),
        }
    }

    fn index(&self, target: ResolvedType, index: NodeId) -> ResolvedType {
        let solver = self.solver();
        let index_type = self.child(index);
        let slicing = as_supertype(solver, &index_type, "groovy.lang.Range").is_some()
            || as_supertype(solver, &index_type, "java.util.List").is_some();

        if let ResolvedType::Array {
            component,
            dimensions,
        } = &target
        {
            return if slicing {
                target.clone()
            } else {
                ResolvedType::array_of((**component).clone(), dimensions - 1)
            };
        }
        if is_string(&target) {
            return self.named(STRING);
        }
        if slicing && as_supertype(solver, &target, "java.util.List").is_some() {
            return target;
        }
        if let Some(map) = as_supertype(solver, &target, "java.util.Map") {
            return self.type_arg(&map, 1);
        }
        if let Some(list) = as_supertype(solver, &target, "java.util.List") {
            return self.type_arg(&list, 0);
        }
        let get_at = select_method(solver, find_methods(solver, &target, "getAt"), &[index_type]);
        get_at.map_or_else(|| self.object(), |method| self.return_type(&method))
    }

    fn method_call(
        &self,
        call: NodeId,
        receiver: Option<NodeId>,
        name: &str,
        args: &[NodeId],
        spread: bool,
    ) -> ResolvedType {
        let arg_types: Vec<ResolvedType> = args.iter().map(|&arg| self.child(arg)).collect();
        let solver = self.solver();

        let Some(receiver) = receiver else {
            let chain = ContextChain::build(self.ast(), call);
            return chain
                .solve_method(self.resolver, name, &arg_types)
                .into_declaration()
                .map_or_else(|| self.object(), |method| self.return_type(&method));
        };

        let receiver = self.child(receiver);
        if spread {
            let element = self.element_type(&receiver);
            let ty = select_method(solver, find_methods(solver, &element, name), &arg_types)
                .map_or_else(|| self.object(), |method| self.return_type(&method));
            return self.generic("java.util.ArrayList", vec![boxed(solver, &ty)]);
        }
        select_method(solver, find_methods(solver, &receiver, name), &arg_types)
            .map_or_else(|| self.object(), |method| self.return_type(&method))
    }

    fn return_type(&self, method: &MemberMethod) -> ResolvedType {
        erase_type_variables(self.solver(), &method.return_type)
    }

    /// Field, then `getX()`/`isX()`, then map value.
    fn property(&self, object: &ResolvedType, name: &str) -> ResolvedType {
        let solver = self.solver();
        if object.is_array() && name == "length" {
            return Self::primitive(PrimitiveType::Int);
        }
        if let Some(field) = find_field(solver, object, name) {
            return erase_type_variables(solver, &field.ty);
        }
        if let Some(capitalized) = capitalize(name) {
            for prefix in ["get", "is"] {
                let getter = format!("{prefix}{capitalized}");
                let found = find_methods(solver, object, &getter)
                    .into_iter()
                    .find(|method| method.params.is_empty());
                if let Some(method) = found {
                    return self.return_type(&method);
                }
            }
        }
        if let Some(map) = as_supertype(solver, object, "java.util.Map") {
            return self.type_arg(&map, 1);
        }
        self.object()
    }

    fn list(&self, elements: &[NodeId]) -> ResolvedType {
        let types: Vec<ResolvedType> = elements
            .iter()
            .map(|&element| match self.ast().kind(element) {
                Some(NodeKind::Spread { expr }) => self.element_type(&self.child(*expr)),
                _ => self.child(element),
            })
            .collect();
        let element = if types.is_empty() {
            self.object()
        } else {
            boxed(self.solver(), &lub(self.solver(), &types))
        };
        self.generic("java.util.ArrayList", vec![element])
    }

    fn map(&self, entries: &[NodeId]) -> ResolvedType {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for &entry in entries {
            if let Some(NodeKind::MapEntry { key, value }) = self.ast().kind(entry) {
                keys.push(self.child(*key));
                values.push(self.child(*value));
            }
        }
        let solver = self.solver();
        let (key, value) = if keys.is_empty() {
            (self.object(), self.object())
        } else {
            (boxed(solver, &lub(solver, &keys)), boxed(solver, &lub(solver, &values)))
        };
        self.generic("java.util.LinkedHashMap", vec![key, value])
    }

    fn type_arg(&self, ty: &ResolvedType, index: usize) -> ResolvedType {
        ty.type_args()
            .get(index)
            .map_or_else(|| self.object(), |arg| erase_type_variables(self.solver(), arg))
    }

    /// Type of one element when iterating `ty` with `for (x in ty)`.
    pub fn element_type(&self, ty: &ResolvedType) -> ResolvedType {
        let solver = self.solver();
        if let ResolvedType::Array {
            component,
            dimensions,
        } = ty
        {
            return ResolvedType::array_of((**component).clone(), dimensions - 1);
        }
        if is_string(ty) {
            return self.named(STRING);
        }
        if let Some(map) = as_supertype(solver, ty, "java.util.Map") {
            let args = vec![self.type_arg(&map, 0), self.type_arg(&map, 1)];
            return self.generic("java.util.Map$Entry", args);
        }
        for iterable in ["java.lang.Iterable", "java.util.Iterator"] {
            if let Some(found) = as_supertype(solver, ty, iterable) {
                return self.type_arg(&found, 0);
            }
        }
        self.object()
    }

    /// Type of a local variable or parameter node.
    ///
    /// Untyped locals take their initializer's type; an untyped `for` loop
    /// variable takes the element type of what it iterates.
    pub fn value_type(&self, node: NodeId) -> ResolvedType {
        let cached = self.values.borrow().get(&node).cloned();
        if let Some(ty) = cached {
            return ty;
        }
        let ty = self.infer_value_type(node);
        self.values.borrow_mut().insert(node, ty.clone());
        ty
    }

    fn infer_value_type(&self, node: NodeId) -> ResolvedType {
        let ast = self.ast();
        let parent = ast.get_parent(node).and_then(|parent| ast.kind(parent));
        match ast.kind(node) {
            Some(NodeKind::Variable { .. }) => match parent {
                Some(NodeKind::Declaration { ty, target, value }) if *target == node => {
                    if !ty.is_dynamic() {
                        return self.type_ref(ty, node);
                    }
                    match value.map(|value| self.child(value)) {
                        Some(ty) if !ty.is_null() && !ty.is_void() => ty,
                        _ => self.object(),
                    }
                }
                _ => self.extract(node),
            },
            Some(NodeKind::Parameter { ty, .. }) if ty.is_dynamic() => match parent {
                Some(NodeKind::ForIn { iterable, .. }) => self.element_type(&self.child(*iterable)),
                Some(NodeKind::Catch { .. }) => self.named("java.lang.Exception"),
                _ => self.object(),
            },
            Some(NodeKind::Parameter { ty, .. }) => self.type_ref(ty, node),
            _ => self.object(),
        }
    }
}

fn is_string(ty: &ResolvedType) -> bool {
    ty.is(STRING) || ty.is(GSTRING)
}

fn is_int_like(ty: &ResolvedType) -> bool {
    matches!(
        ty.unboxed(),
        Some(PrimitiveType::Int | PrimitiveType::Short | PrimitiveType::Byte)
    )
}

fn capitalize(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
