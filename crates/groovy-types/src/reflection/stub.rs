use serde::{Deserialize, Serialize};

use crate::declarations::TypeKind;

pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;
pub const ACC_VARARGS: u16 = 0x0080;

/// Class metadata as a class loader would expose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStub {
    /// Binary name, e.g. `java.util.ArrayList`.
    pub name: String,
    #[serde(default)]
    pub access_flags: u16,
    /// Binary name of the superclass.
    #[serde(default)]
    pub super_class: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Generic class signature, e.g. `<E:Ljava/lang/Object;>Ljava/util/AbstractList<TE;>;`.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldStub>,
    /// Methods and constructors (`<init>`).
    #[serde(default)]
    pub methods: Vec<MethodStub>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStub {
    pub name: String,
    #[serde(default)]
    pub access_flags: u16,
    /// JVM descriptor, e.g. `I` or `Ljava/io/PrintStream;`.
    pub descriptor: String,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStub {
    pub name: String,
    #[serde(default)]
    pub access_flags: u16,
    /// JVM method descriptor, e.g. `(I)Ljava/lang/Object;`.
    pub descriptor: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub parameter_names: Vec<String>,
}

impl ClassStub {
    pub fn kind(&self) -> TypeKind {
        if self.access_flags & ACC_ANNOTATION != 0 {
            TypeKind::Annotation
        } else if self.access_flags & ACC_INTERFACE != 0 {
            TypeKind::Interface
        } else if self.access_flags & ACC_ENUM != 0 {
            TypeKind::Enum
        } else {
            TypeKind::Class
        }
    }

    pub fn package_name(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(p, _)| p)
    }

    pub fn simple_name(&self) -> &str {
        let name = self.name.rsplit_once('.').map_or(self.name.as_str(), |(_, s)| s);
        name.rsplit_once('$').map_or(name, |(_, s)| s)
    }
}

impl MethodStub {
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_varargs(&self) -> bool {
        self.access_flags & ACC_VARARGS != 0
    }
}
