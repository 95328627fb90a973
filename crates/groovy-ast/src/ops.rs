use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
    PowerAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    ElvisAssign,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Compare,
    RegexFind,
    RegexMatch,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    InstanceOf,
    NotInstanceOf,
    In,
    NotIn,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    Plus,
    Minus,
    Multiply,
    Divide,
    Remainder,
    Power,
    Index,
    SafeIndex,
}

const TABLE: &[(&str, BinaryOp)] = &[
    ("=", BinaryOp::Assign),
    ("+=", BinaryOp::PlusAssign),
    ("-=", BinaryOp::MinusAssign),
    ("*=", BinaryOp::MultiplyAssign),
    ("/=", BinaryOp::DivideAssign),
    ("%=", BinaryOp::RemainderAssign),
    ("**=", BinaryOp::PowerAssign),
    ("&=", BinaryOp::BitAndAssign),
    ("|=", BinaryOp::BitOrAssign),
    ("^=", BinaryOp::BitXorAssign),
    ("<<=", BinaryOp::LeftShiftAssign),
    (">>=", BinaryOp::RightShiftAssign),
    (">>>=", BinaryOp::UnsignedRightShiftAssign),
    ("?=", BinaryOp::ElvisAssign),
    ("||", BinaryOp::Or),
    ("&&", BinaryOp::And),
    ("|", BinaryOp::BitOr),
    ("^", BinaryOp::BitXor),
    ("&", BinaryOp::BitAnd),
    ("==", BinaryOp::Equal),
    ("!=", BinaryOp::NotEqual),
    ("===", BinaryOp::Identical),
    ("!==", BinaryOp::NotIdentical),
    ("<=>", BinaryOp::Compare),
    ("=~", BinaryOp::RegexFind),
    ("==~", BinaryOp::RegexMatch),
    ("<", BinaryOp::Less),
    ("<=", BinaryOp::LessEqual),
    (">", BinaryOp::Greater),
    (">=", BinaryOp::GreaterEqual),
    ("instanceof", BinaryOp::InstanceOf),
    ("!instanceof", BinaryOp::NotInstanceOf),
    ("in", BinaryOp::In),
    ("!in", BinaryOp::NotIn),
    ("<<", BinaryOp::LeftShift),
    (">>", BinaryOp::RightShift),
    (">>>", BinaryOp::UnsignedRightShift),
    ("+", BinaryOp::Plus),
    ("-", BinaryOp::Minus),
    ("*", BinaryOp::Multiply),
    ("/", BinaryOp::Divide),
    ("%", BinaryOp::Remainder),
    ("**", BinaryOp::Power),
    ("[", BinaryOp::Index),
    ("?[", BinaryOp::SafeIndex),
];

impl BinaryOp {
    pub fn from_text(text: &str) -> Option<BinaryOp> {
        TABLE.iter().find(|(t, _)| *t == text).map(|(_, op)| *op)
    }

    pub fn text(self) -> &'static str {
        TABLE
            .iter()
            .find(|(_, op)| *op == self)
            .map_or("?", |(t, _)| t)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::PlusAssign
                | BinaryOp::MinusAssign
                | BinaryOp::MultiplyAssign
                | BinaryOp::DivideAssign
                | BinaryOp::RemainderAssign
                | BinaryOp::PowerAssign
                | BinaryOp::BitAndAssign
                | BinaryOp::BitOrAssign
                | BinaryOp::BitXorAssign
                | BinaryOp::LeftShiftAssign
                | BinaryOp::RightShiftAssign
                | BinaryOp::UnsignedRightShiftAssign
                | BinaryOp::ElvisAssign
        )
    }

    /// Operators whose result is always `boolean`.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Or
                | BinaryOp::And
                | BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Identical
                | BinaryOp::NotIdentical
                | BinaryOp::RegexMatch
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::InstanceOf
                | BinaryOp::NotInstanceOf
                | BinaryOp::In
                | BinaryOp::NotIn
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(
            self,
            BinaryOp::LeftShift | BinaryOp::RightShift | BinaryOp::UnsignedRightShift
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitwiseNegation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementOp {
    Increment,
    Decrement,
}
