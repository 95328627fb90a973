use std::fmt;
use std::sync::Arc;

use groovy_core::{Name, OBJECT};

use crate::declarations::TypeDeclaration;
use crate::PrimitiveType;

/// A resolved type.
#[derive(Clone)]
pub enum ResolvedType {
    Primitive(PrimitiveType),
    Reference {
        decl: Arc<dyn TypeDeclaration>,
        args: Vec<ResolvedType>,
    },
    /// `component` is never itself an array.
    Array {
        component: Box<ResolvedType>,
        dimensions: u32,
    },
    Void,
    Null,
    TypeVariable {
        name: Name,
        bounds: Vec<ResolvedType>,
    },
}

impl ResolvedType {
    pub fn reference(decl: Arc<dyn TypeDeclaration>) -> Self {
        ResolvedType::Reference {
            decl,
            args: Vec::new(),
        }
    }

    pub fn generic(decl: Arc<dyn TypeDeclaration>, args: Vec<ResolvedType>) -> Self {
        ResolvedType::Reference { decl, args }
    }

    /// `component` with `dimensions` more array levels; nested arrays are
    /// flattened.
    pub fn array_of(component: ResolvedType, dimensions: u32) -> Self {
        if dimensions == 0 {
            return component;
        }
        match component {
            ResolvedType::Array {
                component,
                dimensions: inner,
            } => ResolvedType::Array {
                component,
                dimensions: inner + dimensions,
            },
            other => ResolvedType::Array {
                component: Box::new(other),
                dimensions,
            },
        }
    }

    /// Qualified name for references, keyword for primitives and `void`.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            ResolvedType::Primitive(p) => Some(p.name().to_string()),
            ResolvedType::Reference { decl, .. } => Some(decl.qualified_name()),
            ResolvedType::Void => Some("void".to_string()),
            _ => None,
        }
    }

    pub fn declaration(&self) -> Option<&Arc<dyn TypeDeclaration>> {
        match self {
            ResolvedType::Reference { decl, .. } => Some(decl),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[ResolvedType] {
        match self {
            ResolvedType::Reference { args, .. } => args,
            _ => &[],
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            ResolvedType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ResolvedType::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, ResolvedType::Reference { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ResolvedType::Array { .. })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ResolvedType::Null)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ResolvedType::Void)
    }

    pub fn is_type_variable(&self) -> bool {
        matches!(self, ResolvedType::TypeVariable { .. })
    }

    pub fn is(&self, qualified_name: &str) -> bool {
        match self {
            ResolvedType::Reference { decl, .. } => decl.qualified_name() == qualified_name,
            _ => false,
        }
    }

    pub fn is_object(&self) -> bool {
        self.is(OBJECT)
    }

    /// The primitive this type denotes or unboxes to.
    pub fn unboxed(&self) -> Option<PrimitiveType> {
        match self {
            ResolvedType::Primitive(p) => Some(*p),
            ResolvedType::Reference { decl, .. } => {
                PrimitiveType::from_boxed_name(&decl.qualified_name())
            }
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.unboxed() == Some(PrimitiveType::Boolean)
    }

    /// The type with type arguments dropped, at every level.
    pub fn erasure(&self) -> ResolvedType {
        match self {
            ResolvedType::Reference { decl, .. } => ResolvedType::reference(decl.clone()),
            ResolvedType::Array {
                component,
                dimensions,
            } => ResolvedType::array_of(component.erasure(), *dimensions),
            other => other.clone(),
        }
    }

    /// Full rendering: `java.util.List<java.lang.String>[]`.
    pub fn describe(&self) -> String {
        self.render(&|decl: &dyn TypeDeclaration| decl.qualified_name())
    }

    /// Rendering with simple class names: `List<String>[]`.
    pub fn simple_describe(&self) -> String {
        self.render(&|decl: &dyn TypeDeclaration| decl.name().to_string())
    }

    fn render(&self, name: &dyn Fn(&dyn TypeDeclaration) -> String) -> String {
        match self {
            ResolvedType::Primitive(p) => p.name().to_string(),
            ResolvedType::Reference { decl, args } => {
                let mut out = name(decl.as_ref());
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.render(name)).collect();
                    out.push('<');
                    out.push_str(&args.join(", "));
                    out.push('>');
                }
                out
            }
            ResolvedType::Array {
                component,
                dimensions,
            } => {
                let mut out = component.render(name);
                for _ in 0..*dimensions {
                    out.push_str("[]");
                }
                out
            }
            ResolvedType::Void => "void".to_string(),
            ResolvedType::Null => "null".to_string(),
            ResolvedType::TypeVariable { name, .. } => name.to_string(),
        }
    }
}

impl PartialEq for ResolvedType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolvedType::Primitive(a), ResolvedType::Primitive(b)) => a == b,
            (
                ResolvedType::Reference { decl: a, args: a_args },
                ResolvedType::Reference { decl: b, args: b_args },
            ) => a.qualified_name() == b.qualified_name() && a_args == b_args,
            (
                ResolvedType::Array {
                    component: a,
                    dimensions: a_dims,
                },
                ResolvedType::Array {
                    component: b,
                    dimensions: b_dims,
                },
            ) => a_dims == b_dims && a == b,
            (ResolvedType::Void, ResolvedType::Void) | (ResolvedType::Null, ResolvedType::Null) => {
                true
            }
            (
                ResolvedType::TypeVariable { name: a, .. },
                ResolvedType::TypeVariable { name: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolvedType({})", self.describe())
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
