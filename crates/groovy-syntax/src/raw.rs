//! The front end's raw tree.
//!
//! This mirrors the host compiler's node classes closely: expressions carry an
//! [`ExprClass`] with a single-inheritance chain (a declaration *is a* binary
//! expression, an attribute access *is a* property access, ...), and positions
//! use the compiler's 1-based line/column numbers with `-1` for "unknown".

use groovy_core::{Modifiers, TypeRef};

/// 1-based source position of a raw node. The last line/column pair is
/// exclusive; `-1` marks a missing coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub line: i32,
    pub column: i32,
    pub last_line: i32,
    pub last_column: i32,
}

impl SourcePos {
    pub const UNKNOWN: SourcePos = SourcePos {
        line: -1,
        column: -1,
        last_line: -1,
        last_column: -1,
    };

    pub fn new(line: u32, column: u32, last_line: u32, last_column: u32) -> Self {
        Self {
            line: line as i32,
            column: column as i32,
            last_line: last_line as i32,
            last_column: last_column as i32,
        }
    }

    pub fn has_start(&self) -> bool {
        self.line > 0 && self.column > 0
    }

    pub fn has_end(&self) -> bool {
        self.last_line > 0 && self.last_column > 0
    }
}

impl Default for SourcePos {
    fn default() -> Self {
        SourcePos::UNKNOWN
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawModule {
    pub package: Option<RawPackage>,
    pub imports: Vec<RawImport>,
    /// Declared classes in source order, followed by the synthesized script
    /// class (if any top-level statements or methods exist).
    pub classes: Vec<RawClass>,
}

impl RawModule {
    pub fn script_class(&self) -> Option<&RawClass> {
        self.classes.iter().find(|class| class.is_script)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPackage {
    pub name: String,
    pub annotations: Vec<RawAnnotation>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawImport {
    /// Class name, or package/class prefix for star imports.
    pub name: String,
    pub alias: Option<String>,
    pub is_static: bool,
    pub is_star: bool,
    pub annotations: Vec<RawAnnotation>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    pub class_name: TypeRef,
    /// Member values; a single unnamed value is stored under `value`.
    pub members: Vec<(String, RawExpr)>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Trait,
    Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawGenericParam {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub generics: Vec<RawGenericParam>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub fields: Vec<RawField>,
    pub constructors: Vec<RawMethod>,
    pub methods: Vec<RawMethod>,
    pub annotations: Vec<RawAnnotation>,
    /// Synthesized from top-level statements.
    pub is_script: bool,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    /// `None` for `def` fields.
    pub ty: Option<TypeRef>,
    pub modifiers: Modifiers,
    pub initial: Option<RawExpr>,
    pub annotations: Vec<RawAnnotation>,
    pub is_enum_constant: bool,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawMethod {
    pub name: String,
    /// `None` for `def` methods and constructors.
    pub return_type: Option<TypeRef>,
    pub modifiers: Modifiers,
    pub generics: Vec<RawGenericParam>,
    pub params: Vec<RawParam>,
    pub throws: Vec<TypeRef>,
    pub body: Option<RawStmt>,
    pub annotations: Vec<RawAnnotation>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub name: String,
    /// `None` for untyped parameters.
    pub ty: Option<TypeRef>,
    pub default: Option<RawExpr>,
    pub variadic: bool,
    pub annotations: Vec<RawAnnotation>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawStmt {
    pub kind: StmtKind,
    pub labels: Vec<String>,
    pub pos: SourcePos,
}

impl RawStmt {
    pub fn new(kind: StmtKind, pos: SourcePos) -> Self {
        Self {
            kind,
            labels: Vec::new(),
            pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<RawStmt>),
    Expression(RawExpr),
    Return(Option<RawExpr>),
    If {
        condition: RawExpr,
        then_branch: Box<RawStmt>,
        else_branch: Option<Box<RawStmt>>,
    },
    ForIn {
        variable: RawParam,
        iterable: RawExpr,
        body: Box<RawStmt>,
    },
    For {
        init: Vec<RawExpr>,
        condition: Option<RawExpr>,
        update: Vec<RawExpr>,
        body: Box<RawStmt>,
    },
    While {
        condition: RawExpr,
        body: Box<RawStmt>,
    },
    DoWhile {
        body: Box<RawStmt>,
        condition: RawExpr,
    },
    Try {
        body: Box<RawStmt>,
        catches: Vec<RawCatch>,
        finally: Option<Box<RawStmt>>,
    },
    Throw(RawExpr),
    Switch {
        subject: RawExpr,
        cases: Vec<RawCase>,
        default: Option<Vec<RawStmt>>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Assert {
        condition: RawExpr,
        message: Option<RawExpr>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCatch {
    pub param: RawParam,
    pub body: RawStmt,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCase {
    pub value: RawExpr,
    pub body: Vec<RawStmt>,
    pub pos: SourcePos,
}

/// Runtime class of a raw expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprClass {
    Constant,
    Variable,
    Binary,
    Declaration,
    Property,
    Attribute,
    Ternary,
    Elvis,
    MethodCall,
    ConstructorCall,
    Closure,
    Lambda,
    List,
    Map,
    MapEntry,
    Range,
    Cast,
    Class,
    GString,
    Not,
    UnaryMinus,
    UnaryPlus,
    BitwiseNegation,
    Prefix,
    Postfix,
    Spread,
    SpreadMap,
    MethodPointer,
    Array,
    Empty,
}

impl ExprClass {
    /// The class this one specializes, if any.
    pub fn superclass(self) -> Option<ExprClass> {
        match self {
            ExprClass::Declaration => Some(ExprClass::Binary),
            ExprClass::Attribute => Some(ExprClass::Property),
            ExprClass::Elvis => Some(ExprClass::Ternary),
            ExprClass::Lambda => Some(ExprClass::Closure),
            _ => None,
        }
    }

    /// `instanceof` over the specialization chain.
    pub fn is_a(self, other: ExprClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.superclass();
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    /// Decimal digits of a `BigInteger` literal.
    BigInteger(String),
    Float(f32),
    Double(f64),
    /// Decimal text of a `BigDecimal` literal.
    BigDecimal(String),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawExpr {
    pub class: ExprClass,
    pub data: ExprData,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprData {
    Constant(ConstantValue),
    Variable {
        name: String,
        /// Declared type when the variable is the target of a declaration.
        origin_type: Option<TypeRef>,
    },
    Binary(BinaryData),
    Property(PropertyData),
    Ternary(TernaryData),
    MethodCall {
        object: Option<Box<RawExpr>>,
        method: String,
        args: Vec<RawExpr>,
        safe: bool,
        spread: bool,
    },
    ConstructorCall {
        ty: TypeRef,
        args: Vec<RawExpr>,
    },
    Closure(ClosureData),
    List(Vec<RawExpr>),
    Map(Vec<RawExpr>),
    MapEntry {
        key: Box<RawExpr>,
        value: Box<RawExpr>,
    },
    Range {
        from: Box<RawExpr>,
        to: Box<RawExpr>,
        inclusive: bool,
    },
    Cast {
        ty: TypeRef,
        expr: Box<RawExpr>,
        /// `expr as Type` rather than `(Type) expr`.
        coerce: bool,
    },
    Class(TypeRef),
    GString {
        verbatim: String,
        strings: Vec<String>,
        values: Vec<RawExpr>,
    },
    Unary(Box<RawExpr>),
    /// Prefix or postfix `++`/`--`.
    Increment {
        op: String,
        expr: Box<RawExpr>,
    },
    MethodPointer {
        object: Box<RawExpr>,
        method: String,
    },
    Array {
        element_type: TypeRef,
        sizes: Vec<RawExpr>,
        initializer: Option<Vec<RawExpr>>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryData {
    pub left: Box<RawExpr>,
    /// Operator text as written (`+`, `==`, `[`, `instanceof`, `!in`, ...).
    pub op: String,
    pub right: Box<RawExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData {
    pub object: Box<RawExpr>,
    pub property: String,
    pub safe: bool,
    pub spread: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryData {
    pub condition: Box<RawExpr>,
    pub true_expr: Box<RawExpr>,
    pub false_expr: Box<RawExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureData {
    /// `None` when no parameter list was written (implicit `it`).
    pub params: Option<Vec<RawParam>>,
    pub body: Box<RawStmt>,
}

impl RawExpr {
    pub fn new(class: ExprClass, data: ExprData, pos: SourcePos) -> Self {
        Self { class, data, pos }
    }

    pub fn empty() -> Self {
        Self::new(ExprClass::Empty, ExprData::Empty, SourcePos::UNKNOWN)
    }

    pub fn is_a(&self, class: ExprClass) -> bool {
        self.class.is_a(class)
    }

    /// View as a binary expression; also succeeds for declarations.
    pub fn as_binary(&self) -> Option<&BinaryData> {
        match &self.data {
            ExprData::Binary(data) if self.is_a(ExprClass::Binary) => Some(data),
            _ => None,
        }
    }

    pub fn as_declaration(&self) -> Option<&BinaryData> {
        match &self.data {
            ExprData::Binary(data) if self.class == ExprClass::Declaration => Some(data),
            _ => None,
        }
    }

    /// View as a property access; also succeeds for attribute access.
    pub fn as_property(&self) -> Option<&PropertyData> {
        match &self.data {
            ExprData::Property(data) if self.is_a(ExprClass::Property) => Some(data),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&PropertyData> {
        match &self.data {
            ExprData::Property(data) if self.class == ExprClass::Attribute => Some(data),
            _ => None,
        }
    }

    /// View as a ternary; also succeeds for elvis, whose condition and true
    /// branch are both the tested value.
    pub fn as_ternary(&self) -> Option<&TernaryData> {
        match &self.data {
            ExprData::Ternary(data) if self.is_a(ExprClass::Ternary) => Some(data),
            _ => None,
        }
    }

    pub fn as_elvis(&self) -> Option<&TernaryData> {
        match &self.data {
            ExprData::Ternary(data) if self.class == ExprClass::Elvis => Some(data),
            _ => None,
        }
    }

    /// View as a closure; also succeeds for lambdas.
    pub fn as_closure(&self) -> Option<&ClosureData> {
        match &self.data {
            ExprData::Closure(data) if self.is_a(ExprClass::Closure) => Some(data),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&ClosureData> {
        match &self.data {
            ExprData::Closure(data) if self.class == ExprClass::Lambda => Some(data),
            _ => None,
        }
    }
}
