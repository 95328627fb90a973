//! Declaration interfaces shared by the AST-backed and reflection-backed
//! type solvers.

use std::fmt;
use std::sync::Arc;

use groovy_core::{Modifiers, Name};

use crate::ResolvedType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Trait,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub name: Name,
    pub bounds: Vec<ResolvedType>,
}

impl TypeParameter {
    pub fn unbounded(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn as_type(&self) -> ResolvedType {
        ResolvedType::TypeVariable {
            name: self.name.clone(),
            bounds: self.bounds.clone(),
        }
    }
}

/// A class, interface, enum, annotation or trait.
pub trait TypeDeclaration: Send + Sync + fmt::Debug {
    /// Simple name, e.g. `ArrayList`.
    fn name(&self) -> &str;

    /// Binary name, e.g. `java.util.ArrayList` or `Outer$Inner`.
    fn qualified_name(&self) -> String;

    fn kind(&self) -> TypeKind;

    fn modifiers(&self) -> Modifiers;

    fn type_parameters(&self) -> Vec<TypeParameter>;

    /// Direct superclass, with type arguments written in terms of this
    /// declaration's type parameters. `None` for `java.lang.Object` and
    /// interfaces.
    fn superclass(&self) -> Option<ResolvedType>;

    fn interfaces(&self) -> Vec<ResolvedType>;

    fn declared_fields(&self) -> Vec<Arc<dyn FieldDeclaration>>;

    fn declared_methods(&self) -> Vec<Arc<dyn MethodDeclaration>>;

    fn constructors(&self) -> Vec<Arc<dyn ConstructorDeclaration>>;

    /// Direct supertypes: the superclass first, then interfaces.
    fn ancestors(&self) -> Vec<ResolvedType> {
        let mut out: Vec<ResolvedType> = self.superclass().into_iter().collect();
        out.extend(self.interfaces());
        out
    }

    fn is_interface(&self) -> bool {
        matches!(self.kind(), TypeKind::Interface | TypeKind::Annotation | TypeKind::Trait)
    }

    fn is_enum(&self) -> bool {
        self.kind() == TypeKind::Enum
    }

    fn package_name(&self) -> Option<String> {
        let qualified = self.qualified_name();
        qualified.rsplit_once('.').map(|(package, _)| package.to_string())
    }
}

pub trait FieldDeclaration: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn ty(&self) -> ResolvedType;
    fn modifiers(&self) -> Modifiers;
    /// Qualified name of the declaring type.
    fn declaring_type(&self) -> String;

    fn is_static(&self) -> bool {
        self.modifiers().is_static()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub name: Name,
    pub ty: ResolvedType,
    pub variadic: bool,
    /// Groovy default value: the argument may be omitted.
    pub has_default: bool,
}

impl ResolvedParameter {
    pub fn new(name: impl Into<Name>, ty: ResolvedType) -> Self {
        Self {
            name: name.into(),
            ty,
            variadic: false,
            has_default: false,
        }
    }
}

pub trait MethodDeclaration: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn return_type(&self) -> ResolvedType;
    fn parameters(&self) -> Vec<ResolvedParameter>;
    fn modifiers(&self) -> Modifiers;
    fn declaring_type(&self) -> String;

    fn type_parameters(&self) -> Vec<TypeParameter> {
        Vec::new()
    }

    fn is_static(&self) -> bool {
        self.modifiers().is_static()
    }

    fn is_varargs(&self) -> bool {
        self.parameters().last().is_some_and(|p| p.variadic)
    }

    /// `name(Type, Type)` with simple type names.
    fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters()
            .iter()
            .map(|p| p.ty.simple_describe())
            .collect();
        format!("{}({})", self.name(), params.join(", "))
    }
}

pub trait ConstructorDeclaration: Send + Sync + fmt::Debug {
    fn parameters(&self) -> Vec<ResolvedParameter>;
    fn modifiers(&self) -> Modifiers;
    fn declaring_type(&self) -> String;
}

/// Anything a name in an expression can resolve to.
#[derive(Debug, Clone)]
pub enum ValueDeclaration {
    Field(Arc<dyn FieldDeclaration>),
    Parameter { name: Name, ty: ResolvedType },
    Local { name: Name, ty: ResolvedType },
}

impl ValueDeclaration {
    pub fn name(&self) -> &str {
        match self {
            ValueDeclaration::Field(field) => field.name(),
            ValueDeclaration::Parameter { name, .. } | ValueDeclaration::Local { name, .. } => name,
        }
    }

    pub fn ty(&self) -> ResolvedType {
        match self {
            ValueDeclaration::Field(field) => field.ty(),
            ValueDeclaration::Parameter { ty, .. } | ValueDeclaration::Local { ty, .. } => ty.clone(),
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, ValueDeclaration::Field(_))
    }
}
