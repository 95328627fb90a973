//! Lowering of the front end's raw tree into the node model.

use groovy_config::ParserConfig;
use groovy_core::{Name, Position, Range, TypeRef};
use groovy_syntax::raw::{
    ClassKind as RawClassKind, ExprClass, ExprData, RawAnnotation, RawClass, RawExpr,
    RawGenericParam, RawMethod, RawModule, RawParam, RawStmt, SourcePos, StmtKind,
};

use crate::comments::{attach_comments, extract_comments};
use crate::node::{Ast, ClassKind, NodeId, NodeKind, TypeParam};
use crate::ops::{BinaryOp, IncrementOp, UnaryOp};

/// Raw trees nested deeper than this are rejected instead of overflowing
/// the stack.
pub const MAX_CONVERT_DEPTH: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed raw tree at {position}: {message}")]
    MalformedTree { message: String, position: String },
    #[error("raw tree nesting exceeds {0}")]
    TooDeep(u32),
}

/// Convert a raw module. When `source` is given and comment attribution is
/// enabled, comments are extracted from it and attached to declarations.
pub fn convert(
    module: &RawModule,
    source: Option<&str>,
    config: &ParserConfig,
) -> Result<Ast, ConvertError> {
    let mut converter = Converter::new();
    let root = converter.module(module)?;
    let mut ast = converter.finish(root);
    if let (true, Some(source)) = (config.attribute_comments, source) {
        let comments = extract_comments(source, config.tab_size);
        tracing::trace!(target: "groovy.convert", comments = comments.len(), "attaching comments");
        attach_comments(&mut ast, &comments);
    }
    Ok(ast)
}

/// 1-based range of a raw node; `None` when the start is unknown. A missing
/// end collapses the range onto its start.
pub fn source_range(pos: SourcePos) -> Option<Range> {
    if !pos.has_start() {
        return None;
    }
    let begin = Position::new(pos.line as u32, pos.column as u32);
    let end = if pos.has_end() {
        Position::new(pos.last_line as u32, pos.last_column as u32)
    } else {
        begin
    };
    Some(Range::new(begin, end))
}

pub struct Converter {
    ast: Ast,
    depth: u32,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Self {
            ast: Ast::new(),
            depth: 0,
        }
    }

    pub fn finish(mut self, root: NodeId) -> Ast {
        self.ast.set_root(root);
        self.ast
    }

    fn node(&mut self, kind: NodeKind, pos: SourcePos) -> NodeId {
        self.ast.alloc(kind, source_range(pos), Vec::new())
    }

    fn annotated(&mut self, kind: NodeKind, pos: SourcePos, annotations: Vec<NodeId>) -> NodeId {
        self.ast.alloc(kind, source_range(pos), annotations)
    }

    fn enter(&mut self) -> Result<(), ConvertError> {
        self.depth += 1;
        if self.depth > MAX_CONVERT_DEPTH {
            return Err(ConvertError::TooDeep(MAX_CONVERT_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    pub fn module(&mut self, module: &RawModule) -> Result<NodeId, ConvertError> {
        let package = match &module.package {
            Some(package) => {
                let annotations = self.annotations(&package.annotations)?;
                Some(self.annotated(
                    NodeKind::Package {
                        name: Name::new(&package.name),
                    },
                    package.pos,
                    annotations,
                ))
            }
            None => None,
        };
        let mut imports = Vec::with_capacity(module.imports.len());
        for import in &module.imports {
            let annotations = self.annotations(&import.annotations)?;
            imports.push(self.annotated(
                NodeKind::Import {
                    name: Name::new(&import.name),
                    alias: import.alias.as_deref().map(Name::new),
                    is_static: import.is_static,
                    is_star: import.is_star,
                },
                import.pos,
                annotations,
            ));
        }
        let types = module
            .classes
            .iter()
            .map(|class| self.class(class))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.ast.alloc(
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
            unit_range(module),
            Vec::new(),
        ))
    }

    fn annotations(&mut self, annotations: &[RawAnnotation]) -> Result<Vec<NodeId>, ConvertError> {
        annotations
            .iter()
            .map(|annotation| self.annotation(annotation))
            .collect()
    }

    fn annotation(&mut self, annotation: &RawAnnotation) -> Result<NodeId, ConvertError> {
        let name = Name::new(annotation.class_name.to_string());
        let kind = match annotation.members.as_slice() {
            [(key, value)] if key == "value" => NodeKind::Annotation {
                name,
                value: Some(self.expr(value)?),
                members: Vec::new(),
            },
            members => {
                let mut converted = Vec::with_capacity(members.len());
                for (key, value) in members {
                    converted.push((Name::new(key), self.expr(value)?));
                }
                NodeKind::Annotation {
                    name,
                    value: None,
                    members: converted,
                }
            }
        };
        Ok(self.node(kind, annotation.pos))
    }

    pub fn class(&mut self, class: &RawClass) -> Result<NodeId, ConvertError> {
        self.enter()?;
        let annotations = self.annotations(&class.annotations)?;
        let mut fields = Vec::with_capacity(class.fields.len());
        for field in &class.fields {
            let field_annotations = self.annotations(&field.annotations)?;
            let initializer = field.initial.as_ref().map(|e| self.expr(e)).transpose()?;
            fields.push(self.annotated(
                NodeKind::Field {
                    name: Name::new(&field.name),
                    ty: field.ty.clone().unwrap_or_else(TypeRef::dynamic),
                    modifiers: field.modifiers,
                    initializer,
                    is_enum_constant: field.is_enum_constant,
                },
                field.pos,
                field_annotations,
            ));
        }
        let constructors = class
            .constructors
            .iter()
            .map(|ctor| self.constructor(&class.name, ctor))
            .collect::<Result<Vec<_>, _>>()?;
        let methods = class
            .methods
            .iter()
            .map(|method| self.method(method))
            .collect::<Result<Vec<_>, _>>()?;
        let id = self.annotated(
            NodeKind::Class {
                name: Name::new(&class.name),
                kind: class_kind(class.kind),
                is_script: class.is_script,
                modifiers: class.modifiers,
                type_params: type_params(&class.generics),
                superclass: class.superclass.clone(),
                interfaces: class.interfaces.clone(),
                fields,
                constructors,
                methods,
            },
            class.pos,
            annotations,
        );
        self.leave();
        Ok(id)
    }

    fn method(&mut self, method: &RawMethod) -> Result<NodeId, ConvertError> {
        let annotations = self.annotations(&method.annotations)?;
        let params = self.params(&method.params)?;
        let body = method.body.as_ref().map(|b| self.stmt(b)).transpose()?;
        Ok(self.annotated(
            NodeKind::Method {
                name: Name::new(&method.name),
                return_type: method.return_type.clone().unwrap_or_else(TypeRef::dynamic),
                modifiers: method.modifiers,
                type_params: type_params(&method.generics),
                params,
                throws: method.throws.clone(),
                body,
            },
            method.pos,
            annotations,
        ))
    }

    fn constructor(&mut self, class_name: &str, ctor: &RawMethod) -> Result<NodeId, ConvertError> {
        let annotations = self.annotations(&ctor.annotations)?;
        let params = self.params(&ctor.params)?;
        let body = ctor.body.as_ref().map(|b| self.stmt(b)).transpose()?;
        Ok(self.annotated(
            NodeKind::Constructor {
                name: Name::new(class_name),
                modifiers: ctor.modifiers,
                params,
                throws: ctor.throws.clone(),
                body,
            },
            ctor.pos,
            annotations,
        ))
    }

    fn params(&mut self, params: &[RawParam]) -> Result<Vec<NodeId>, ConvertError> {
        params.iter().map(|param| self.param(param)).collect()
    }

    fn param(&mut self, param: &RawParam) -> Result<NodeId, ConvertError> {
        let annotations = self.annotations(&param.annotations)?;
        let default = param.default.as_ref().map(|e| self.expr(e)).transpose()?;
        Ok(self.annotated(
            NodeKind::Parameter {
                name: Name::new(&param.name),
                ty: param.ty.clone().unwrap_or_else(TypeRef::dynamic),
                variadic: param.variadic,
                default,
            },
            param.pos,
            annotations,
        ))
    }

    fn stmts(&mut self, stmts: &[RawStmt]) -> Result<Vec<NodeId>, ConvertError> {
        stmts.iter().map(|stmt| self.stmt(stmt)).collect()
    }

    pub fn stmt(&mut self, stmt: &RawStmt) -> Result<NodeId, ConvertError> {
        self.enter()?;
        let kind = self.stmt_kind(stmt)?;
        self.leave();
        Ok(self.node(kind, stmt.pos))
    }

    fn stmt_kind(&mut self, stmt: &RawStmt) -> Result<NodeKind, ConvertError> {
        let kind = match &stmt.kind {
            StmtKind::Block(stmts) => NodeKind::Block {
                statements: self.stmts(stmts)?,
            },
            StmtKind::Expression(expr) => NodeKind::ExpressionStmt {
                expr: self.expr(expr)?,
            },
            StmtKind::Return(value) => NodeKind::Return {
                value: self.opt_expr(value.as_ref())?,
            },
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => NodeKind::If {
                condition: self.expr(condition)?,
                then_branch: self.stmt(then_branch)?,
                else_branch: else_branch.as_deref().map(|s| self.stmt(s)).transpose()?,
            },
            StmtKind::ForIn {
                variable,
                iterable,
                body,
            } => NodeKind::ForIn {
                variable: self.param(variable)?,
                iterable: self.expr(iterable)?,
                body: self.stmt(body)?,
            },
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => NodeKind::For {
                init: self.exprs(init)?,
                condition: self.opt_expr(condition.as_ref())?,
                update: self.exprs(update)?,
                body: self.stmt(body)?,
            },
            StmtKind::While { condition, body } => NodeKind::While {
                condition: self.expr(condition)?,
                body: self.stmt(body)?,
            },
            StmtKind::DoWhile { body, condition } => NodeKind::DoWhile {
                body: self.stmt(body)?,
                condition: self.expr(condition)?,
            },
            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                let body = self.stmt(body)?;
                let mut converted = Vec::with_capacity(catches.len());
                for catch in catches {
                    let param = self.param(&catch.param)?;
                    let body = self.stmt(&catch.body)?;
                    converted.push(self.node(NodeKind::Catch { param, body }, catch.pos));
                }
                NodeKind::Try {
                    body,
                    catches: converted,
                    finally: finally.as_deref().map(|s| self.stmt(s)).transpose()?,
                }
            }
            StmtKind::Throw(expr) => NodeKind::Throw {
                expr: self.expr(expr)?,
            },
            StmtKind::Switch {
                subject,
                cases,
                default,
            } => {
                let subject = self.expr(subject)?;
                let mut converted = Vec::with_capacity(cases.len());
                for case in cases {
                    let value = self.expr(&case.value)?;
                    let body = self.stmts(&case.body)?;
                    converted.push(self.node(NodeKind::Case { value, body }, case.pos));
                }
                let default = match default {
                    Some(stmts) => {
                        let statements = self.stmts(stmts)?;
                        let pos = stmts.first().map_or(SourcePos::UNKNOWN, |s| s.pos);
                        Some(self.node(NodeKind::Block { statements }, pos))
                    }
                    None => None,
                };
                NodeKind::Switch {
                    subject,
                    cases: converted,
                    default,
                }
            }
            StmtKind::Break(label) => NodeKind::Break {
                label: label.as_deref().map(Name::new),
            },
            StmtKind::Continue(label) => NodeKind::Continue {
                label: label.as_deref().map(Name::new),
            },
            StmtKind::Assert { condition, message } => NodeKind::Assert {
                condition: self.expr(condition)?,
                message: self.opt_expr(message.as_ref())?,
            },
            StmtKind::Empty => NodeKind::EmptyStmt,
        };
        Ok(kind)
    }

    fn exprs(&mut self, exprs: &[RawExpr]) -> Result<Vec<NodeId>, ConvertError> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn opt_expr(&mut self, expr: Option<&RawExpr>) -> Result<Option<NodeId>, ConvertError> {
        expr.map(|e| self.expr(e)).transpose()
    }

    pub fn expr(&mut self, expr: &RawExpr) -> Result<NodeId, ConvertError> {
        self.enter()?;
        let kind = self.expr_kind(expr)?;
        self.leave();
        Ok(self.node(kind, expr.pos))
    }

    fn expr_kind(&mut self, expr: &RawExpr) -> Result<NodeKind, ConvertError> {
        // Each general view below also accepts its specializations, so the
        // specialized kind must always be tested first.
        if let Some(decl) = expr.as_declaration() {
            let (name, origin_type, target_pos) = match (&decl.left.data, decl.left.pos) {
                (ExprData::Variable { name, origin_type }, pos) => (name, origin_type, pos),
                _ => return Err(malformed(expr, "declaration target is not a variable")),
            };
            let target = self.node(
                NodeKind::Variable {
                    name: Name::new(name),
                },
                target_pos,
            );
            let value = match decl.right.class {
                ExprClass::Empty => None,
                _ => Some(self.expr(&decl.right)?),
            };
            return Ok(NodeKind::Declaration {
                ty: origin_type.clone().unwrap_or_else(TypeRef::dynamic),
                target,
                value,
            });
        }
        if let Some(binary) = expr.as_binary() {
            let op = BinaryOp::from_text(&binary.op)
                .ok_or_else(|| malformed(expr, &format!("unknown operator `{}`", binary.op)))?;
            return Ok(NodeKind::Binary {
                op,
                left: self.expr(&binary.left)?,
                right: self.expr(&binary.right)?,
            });
        }
        if let Some(attribute) = expr.as_attribute() {
            return Ok(NodeKind::Attribute {
                object: self.expr(&attribute.object)?,
                name: Name::new(&attribute.property),
                safe: attribute.safe,
            });
        }
        if let Some(property) = expr.as_property() {
            return Ok(NodeKind::Property {
                object: self.expr(&property.object)?,
                name: Name::new(&property.property),
                safe: property.safe,
                spread: property.spread,
            });
        }
        if let Some(elvis) = expr.as_elvis() {
            return Ok(NodeKind::Elvis {
                value: self.expr(&elvis.condition)?,
                fallback: self.expr(&elvis.false_expr)?,
            });
        }
        if let Some(ternary) = expr.as_ternary() {
            return Ok(NodeKind::Ternary {
                condition: self.expr(&ternary.condition)?,
                then_expr: self.expr(&ternary.true_expr)?,
                else_expr: self.expr(&ternary.false_expr)?,
            });
        }
        if let Some(lambda) = expr.as_lambda() {
            let params = match &lambda.params {
                Some(params) => self.params(params)?,
                None => Vec::new(),
            };
            return Ok(NodeKind::Lambda {
                params,
                body: self.stmt(&lambda.body)?,
            });
        }
        if let Some(closure) = expr.as_closure() {
            let params = match &closure.params {
                Some(params) => Some(self.params(params)?),
                None => None,
            };
            return Ok(NodeKind::Closure {
                params,
                body: self.stmt(&closure.body)?,
            });
        }

        let kind = match &expr.data {
            ExprData::Constant(value) => NodeKind::Constant(value.clone()),
            ExprData::Variable { name, .. } => NodeKind::Variable {
                name: Name::new(name),
            },
            ExprData::MethodCall {
                object,
                method,
                args,
                safe,
                spread,
            } => NodeKind::MethodCall {
                receiver: object.as_deref().map(|o| self.expr(o)).transpose()?,
                name: Name::new(method),
                args: self.exprs(args)?,
                safe: *safe,
                spread: *spread,
            },
            ExprData::ConstructorCall { ty, args } => NodeKind::ConstructorCall {
                ty: ty.clone(),
                args: self.exprs(args)?,
            },
            ExprData::List(elements) => NodeKind::List {
                elements: self.exprs(elements)?,
            },
            ExprData::Map(entries) => NodeKind::Map {
                entries: self.exprs(entries)?,
            },
            ExprData::MapEntry { key, value } => NodeKind::MapEntry {
                key: self.expr(key)?,
                value: self.expr(value)?,
            },
            ExprData::Range {
                from,
                to,
                inclusive,
            } => NodeKind::Range {
                from: self.expr(from)?,
                to: self.expr(to)?,
                inclusive: *inclusive,
            },
            ExprData::Cast {
                ty,
                expr: inner,
                coerce,
            } => NodeKind::Cast {
                ty: ty.clone(),
                expr: self.expr(inner)?,
                coerce: *coerce,
            },
            ExprData::Class(ty) => NodeKind::ClassExpr { ty: ty.clone() },
            ExprData::GString {
                verbatim,
                strings,
                values,
            } => NodeKind::GString {
                verbatim: verbatim.clone(),
                strings: strings.clone(),
                values: self.exprs(values)?,
            },
            ExprData::Unary(operand) => {
                let operand = self.expr(operand)?;
                match expr.class {
                    ExprClass::Spread => NodeKind::Spread { expr: operand },
                    ExprClass::SpreadMap => NodeKind::SpreadMap { expr: operand },
                    class => {
                        let op = unary_op(class)
                            .ok_or_else(|| malformed(expr, "unexpected unary expression class"))?;
                        NodeKind::Unary { op, operand }
                    }
                }
            }
            ExprData::Increment { op, expr: operand } => {
                let op = match op.as_str() {
                    "++" => IncrementOp::Increment,
                    "--" => IncrementOp::Decrement,
                    other => return Err(malformed(expr, &format!("unknown operator `{other}`"))),
                };
                NodeKind::Increment {
                    op,
                    prefix: expr.class == ExprClass::Prefix,
                    operand: self.expr(operand)?,
                }
            }
            ExprData::MethodPointer { object, method } => NodeKind::MethodPointer {
                object: self.expr(object)?,
                name: Name::new(method),
            },
            ExprData::Array {
                element_type,
                sizes,
                initializer,
            } => NodeKind::ArrayCreation {
                element_type: element_type.clone(),
                sizes: self.exprs(sizes)?,
                initializer: initializer.as_deref().map(|i| self.exprs(i)).transpose()?,
            },
            ExprData::Empty => NodeKind::EmptyExpr,
            ExprData::Binary(_)
            | ExprData::Property(_)
            | ExprData::Ternary(_)
            | ExprData::Closure(_) => {
                return Err(malformed(expr, "node data does not match its class"));
            }
        };
        Ok(kind)
    }
}

fn malformed(expr: &RawExpr, message: &str) -> ConvertError {
    ConvertError::MalformedTree {
        message: format!("{message} ({:?})", expr.class),
        position: format!("{}:{}", expr.pos.line, expr.pos.column),
    }
}

fn unary_op(class: ExprClass) -> Option<UnaryOp> {
    Some(match class {
        ExprClass::Not => UnaryOp::Not,
        ExprClass::UnaryMinus => UnaryOp::Minus,
        ExprClass::UnaryPlus => UnaryOp::Plus,
        ExprClass::BitwiseNegation => UnaryOp::BitwiseNegation,
        _ => return None,
    })
}

fn class_kind(kind: RawClassKind) -> ClassKind {
    match kind {
        RawClassKind::Class => ClassKind::Class,
        RawClassKind::Interface => ClassKind::Interface,
        RawClassKind::Enum => ClassKind::Enum,
        RawClassKind::Trait => ClassKind::Trait,
        RawClassKind::Annotation => ClassKind::Annotation,
    }
}

fn type_params(generics: &[RawGenericParam]) -> Vec<TypeParam> {
    generics
        .iter()
        .map(|param| TypeParam {
            name: Name::new(&param.name),
            bounds: param.bounds.clone(),
        })
        .collect()
}

/// The unit spans every positioned top-level declaration.
fn unit_range(module: &RawModule) -> Option<Range> {
    let ranges: Vec<Range> = module
        .package
        .iter()
        .map(|p| p.pos)
        .chain(module.imports.iter().map(|i| i.pos))
        .chain(module.classes.iter().map(|c| c.pos))
        .filter_map(source_range)
        .collect();
    let begin = ranges.iter().map(|r| r.begin).min()?;
    let end = ranges.iter().map(|r| r.end).max()?;
    Some(Range::new(begin, end))
}
