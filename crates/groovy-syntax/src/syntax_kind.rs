use serde::{Deserialize, Serialize};

/// Token kinds produced by the Groovy lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    // --- Identifiers & literals ---
    Identifier,
    IntLiteral,
    LongLiteral,
    BigIntegerLiteral,
    FloatLiteral,
    DoubleLiteral,
    BigDecimalLiteral,
    StringLiteral,
    /// A double-quoted string containing `$` interpolation.
    GStringLiteral,

    // --- Keywords ---
    AbstractKw,
    AsKw,
    AssertKw,
    BooleanKw,
    BreakKw,
    ByteKw,
    CaseKw,
    CatchKw,
    CharKw,
    ClassKw,
    ContinueKw,
    DefKw,
    DefaultKw,
    DoKw,
    DoubleKw,
    ElseKw,
    EnumKw,
    ExtendsKw,
    FalseKw,
    FinalKw,
    FinallyKw,
    FloatKw,
    ForKw,
    IfKw,
    ImplementsKw,
    ImportKw,
    InKw,
    InstanceofKw,
    IntKw,
    InterfaceKw,
    LongKw,
    NativeKw,
    NewKw,
    NullKw,
    PackageKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReturnKw,
    ShortKw,
    StaticKw,
    SuperKw,
    SwitchKw,
    SynchronizedKw,
    ThisKw,
    ThrowKw,
    ThrowsKw,
    TraitKw,
    TransientKw,
    TrueKw,
    TryKw,
    VarKw,
    VoidKw,
    VolatileKw,
    WhileKw,

    // --- Separators ---
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    At,

    // --- Operators ---
    Eq,
    EqEq,
    EqEqEq,
    Bang,
    BangEq,
    BangEqEq,
    Tilde,
    Question,
    Colon,
    ColonColon,
    Arrow,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Caret,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    StarStarEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LeftShiftEq,
    RightShiftEq,
    UnsignedRightShiftEq,
    ElvisEq,
    RegexFind,
    RegexMatch,
    Range,
    RangeExclusive,
    Ellipsis,
    SafeDot,
    SafeIndex,
    SpreadDot,
    AttributeDot,
    MethodPointer,
    Elvis,

    // --- Special ---
    Error,
    Eof,
}

impl SyntaxKind {
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        let kind = match text {
            "abstract" => SyntaxKind::AbstractKw,
            "as" => SyntaxKind::AsKw,
            "assert" => SyntaxKind::AssertKw,
            "boolean" => SyntaxKind::BooleanKw,
            "break" => SyntaxKind::BreakKw,
            "byte" => SyntaxKind::ByteKw,
            "case" => SyntaxKind::CaseKw,
            "catch" => SyntaxKind::CatchKw,
            "char" => SyntaxKind::CharKw,
            "class" => SyntaxKind::ClassKw,
            "continue" => SyntaxKind::ContinueKw,
            "def" => SyntaxKind::DefKw,
            "default" => SyntaxKind::DefaultKw,
            "do" => SyntaxKind::DoKw,
            "double" => SyntaxKind::DoubleKw,
            "else" => SyntaxKind::ElseKw,
            "enum" => SyntaxKind::EnumKw,
            "extends" => SyntaxKind::ExtendsKw,
            "false" => SyntaxKind::FalseKw,
            "final" => SyntaxKind::FinalKw,
            "finally" => SyntaxKind::FinallyKw,
            "float" => SyntaxKind::FloatKw,
            "for" => SyntaxKind::ForKw,
            "if" => SyntaxKind::IfKw,
            "implements" => SyntaxKind::ImplementsKw,
            "import" => SyntaxKind::ImportKw,
            "in" => SyntaxKind::InKw,
            "instanceof" => SyntaxKind::InstanceofKw,
            "int" => SyntaxKind::IntKw,
            "interface" => SyntaxKind::InterfaceKw,
            "long" => SyntaxKind::LongKw,
            "native" => SyntaxKind::NativeKw,
            "new" => SyntaxKind::NewKw,
            "null" => SyntaxKind::NullKw,
            "package" => SyntaxKind::PackageKw,
            "private" => SyntaxKind::PrivateKw,
            "protected" => SyntaxKind::ProtectedKw,
            "public" => SyntaxKind::PublicKw,
            "return" => SyntaxKind::ReturnKw,
            "short" => SyntaxKind::ShortKw,
            "static" => SyntaxKind::StaticKw,
            "super" => SyntaxKind::SuperKw,
            "switch" => SyntaxKind::SwitchKw,
            "synchronized" => SyntaxKind::SynchronizedKw,
            "this" => SyntaxKind::ThisKw,
            "throw" => SyntaxKind::ThrowKw,
            "throws" => SyntaxKind::ThrowsKw,
            "trait" => SyntaxKind::TraitKw,
            "transient" => SyntaxKind::TransientKw,
            "true" => SyntaxKind::TrueKw,
            "try" => SyntaxKind::TryKw,
            "var" => SyntaxKind::VarKw,
            "void" => SyntaxKind::VoidKw,
            "volatile" => SyntaxKind::VolatileKw,
            "while" => SyntaxKind::WhileKw,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::AbstractKw && self <= SyntaxKind::WhileKw
    }

    /// Primitive type keywords (`void` excluded).
    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::BooleanKw
                | SyntaxKind::ByteKw
                | SyntaxKind::CharKw
                | SyntaxKind::ShortKw
                | SyntaxKind::IntKw
                | SyntaxKind::LongKw
                | SyntaxKind::FloatKw
                | SyntaxKind::DoubleKw
        )
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::PublicKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::StaticKw
                | SyntaxKind::FinalKw
                | SyntaxKind::AbstractKw
                | SyntaxKind::SynchronizedKw
                | SyntaxKind::VolatileKw
                | SyntaxKind::TransientKw
                | SyntaxKind::NativeKw
        )
    }

    pub fn is_number_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::LongLiteral
                | SyntaxKind::BigIntegerLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::DoubleLiteral
                | SyntaxKind::BigDecimalLiteral
        )
    }

    /// Keywords that Groovy still accepts as property or map-key names
    /// (`obj.class`, `[in: 1]`).
    pub fn is_identifier_like(self) -> bool {
        self == SyntaxKind::Identifier || self.is_keyword()
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            SyntaxKind::Eq
                | SyntaxKind::PlusEq
                | SyntaxKind::MinusEq
                | SyntaxKind::StarEq
                | SyntaxKind::SlashEq
                | SyntaxKind::PercentEq
                | SyntaxKind::StarStarEq
                | SyntaxKind::AmpEq
                | SyntaxKind::PipeEq
                | SyntaxKind::CaretEq
                | SyntaxKind::LeftShiftEq
                | SyntaxKind::RightShiftEq
                | SyntaxKind::UnsignedRightShiftEq
                | SyntaxKind::ElvisEq
        )
    }
}
