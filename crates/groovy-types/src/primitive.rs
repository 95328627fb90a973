use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Qualified name of the wrapper class.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }

    /// JVM descriptor character.
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Char => 'C',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The primitive a wrapper class unboxes to.
    pub fn from_boxed_name(name: &str) -> Option<PrimitiveType> {
        Self::ALL.into_iter().find(|p| p.boxed_name() == name)
    }

    pub fn from_descriptor(ch: char) -> Option<PrimitiveType> {
        Self::ALL.into_iter().find(|p| p.descriptor() == ch)
    }

    pub fn is_numeric(self) -> bool {
        self != PrimitiveType::Boolean
    }

    /// Widening primitive conversion (JLS 5.1.2), including identity.
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            Double | Boolean => false,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
