use serde::{Deserialize, Serialize};

use crate::syntax_kind::SyntaxKind;

/// A lexed token. Line and column are 1-based; the end position is exclusive,
/// i.e. it names the column right after the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: SyntaxKind,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

impl Token {
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// Tokenize `input`, returning the tokens (always terminated by `Eof`) and
/// any lexical errors. Erroneous input yields `Error` tokens so the parser can
/// keep going.
pub fn lex(input: &str, tab_size: u32) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(input, tab_size);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == SyntaxKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, lexer.errors)
}

const OPERATORS: &[(&str, SyntaxKind)] = &[
    (">>>=", SyntaxKind::UnsignedRightShiftEq),
    ("<=>", SyntaxKind::Spaceship),
    ("===", SyntaxKind::EqEqEq),
    ("!==", SyntaxKind::BangEqEq),
    ("==~", SyntaxKind::RegexMatch),
    ("**=", SyntaxKind::StarStarEq),
    ("<<=", SyntaxKind::LeftShiftEq),
    (">>=", SyntaxKind::RightShiftEq),
    (">>>", SyntaxKind::UnsignedRightShift),
    ("..<", SyntaxKind::RangeExclusive),
    ("...", SyntaxKind::Ellipsis),
    ("==", SyntaxKind::EqEq),
    ("!=", SyntaxKind::BangEq),
    ("=~", SyntaxKind::RegexFind),
    ("<=", SyntaxKind::LtEq),
    (">=", SyntaxKind::GtEq),
    ("<<", SyntaxKind::LeftShift),
    (">>", SyntaxKind::RightShift),
    ("&&", SyntaxKind::AmpAmp),
    ("||", SyntaxKind::PipePipe),
    ("++", SyntaxKind::PlusPlus),
    ("--", SyntaxKind::MinusMinus),
    ("+=", SyntaxKind::PlusEq),
    ("-=", SyntaxKind::MinusEq),
    ("*=", SyntaxKind::StarEq),
    ("/=", SyntaxKind::SlashEq),
    ("%=", SyntaxKind::PercentEq),
    ("&=", SyntaxKind::AmpEq),
    ("|=", SyntaxKind::PipeEq),
    ("^=", SyntaxKind::CaretEq),
    ("?=", SyntaxKind::ElvisEq),
    ("**", SyntaxKind::StarStar),
    ("->", SyntaxKind::Arrow),
    ("::", SyntaxKind::ColonColon),
    ("..", SyntaxKind::Range),
    ("?.", SyntaxKind::SafeDot),
    ("?[", SyntaxKind::SafeIndex),
    ("?:", SyntaxKind::Elvis),
    ("*.", SyntaxKind::SpreadDot),
    (".@", SyntaxKind::AttributeDot),
    (".&", SyntaxKind::MethodPointer),
    ("(", SyntaxKind::LParen),
    (")", SyntaxKind::RParen),
    ("{", SyntaxKind::LBrace),
    ("}", SyntaxKind::RBrace),
    ("[", SyntaxKind::LBracket),
    ("]", SyntaxKind::RBracket),
    (";", SyntaxKind::Semicolon),
    (",", SyntaxKind::Comma),
    (".", SyntaxKind::Dot),
    ("@", SyntaxKind::At),
    ("=", SyntaxKind::Eq),
    ("!", SyntaxKind::Bang),
    ("~", SyntaxKind::Tilde),
    ("?", SyntaxKind::Question),
    (":", SyntaxKind::Colon),
    ("<", SyntaxKind::Lt),
    (">", SyntaxKind::Gt),
    ("+", SyntaxKind::Plus),
    ("-", SyntaxKind::Minus),
    ("*", SyntaxKind::Star),
    ("/", SyntaxKind::Slash),
    ("%", SyntaxKind::Percent),
    ("&", SyntaxKind::Amp),
    ("|", SyntaxKind::Pipe),
    ("^", SyntaxKind::Caret),
];

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    tab_size: u32,
    newline_pending: bool,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, tab_size: u32) -> Self {
        Self::with_start(input, tab_size, 1, 1)
    }

    /// Lex a fragment whose first character sits at `line:column` of the
    /// enclosing document (used for GString interpolations).
    pub fn with_start(input: &'a str, tab_size: u32, line: u32, column: u32) -> Self {
        let mut lexer = Self {
            input,
            pos: 0,
            line,
            column,
            tab_size: tab_size.max(1),
            newline_pending: false,
            errors: Vec::new(),
        };
        if input.starts_with("#!") {
            lexer.skip_line();
        }
        lexer
    }

    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                if self.peek() != Some('\n') {
                    self.line += 1;
                    self.column = 1;
                }
            }
            '\t' => {
                self.column = ((self.column - 1) / self.tab_size + 1) * self.tab_size + 1;
            }
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn advance_str(&mut self, text: &str) {
        for _ in text.chars() {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some('\n') | Some('\r') => {
                    self.newline_pending = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                // Line continuation.
                Some('\\') if matches!(self.peek_nth(1), Some('\n') | Some('\r')) => {
                    self.advance();
                    if self.advance() == Some('\r') && self.peek() == Some('\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_nth(1) == Some('/') => self.skip_line(),
                Some('/') if self.peek_nth(1) == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(ch) = self.peek() {
                        if ch == '*' && self.peek_nth(1) == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        if ch == '\n' || ch == '\r' {
                            self.newline_pending = true;
                        }
                        self.advance();
                    }
                    if !closed {
                        self.error_from(line, column, "unterminated block comment");
                    }
                }
                _ => break,
            }
        }
    }

    fn error_from(&mut self, line: u32, column: u32, message: &str) {
        self.errors.push(LexError {
            message: message.to_string(),
            line,
            column,
            end_line: self.line,
            end_column: self.column,
        });
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let newline_before = std::mem::take(&mut self.newline_pending);

        let kind = match self.peek() {
            None => SyntaxKind::Eof,
            Some(ch) if is_ident_start(ch) => self.lex_ident(),
            Some(ch) if ch.is_ascii_digit() => self.lex_number(),
            Some('\'') => self.lex_string('\''),
            Some('"') => self.lex_string('"'),
            Some(_) => self.lex_operator(line, column),
        };

        Token {
            kind,
            start,
            end: self.pos,
            line,
            column,
            end_line: self.line,
            end_column: self.column,
            newline_before,
        }
    }

    fn lex_ident(&mut self) -> SyntaxKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        SyntaxKind::from_keyword(&self.input[start..self.pos]).unwrap_or(SyntaxKind::Identifier)
    }

    fn eat_digits(&mut self, radix: u32) {
        while self
            .peek()
            .is_some_and(|ch| ch.is_digit(radix) || ch == '_')
        {
            self.advance();
        }
    }

    fn lex_number(&mut self) -> SyntaxKind {
        let mut decimal = false;
        let radix_prefix = self.peek() == Some('0')
            && matches!(self.peek_nth(1), Some('x' | 'X' | 'b' | 'B'));
        if radix_prefix {
            let radix = if matches!(self.peek_nth(1), Some('x' | 'X')) {
                16
            } else {
                2
            };
            self.advance();
            self.advance();
            self.eat_digits(radix);
        } else {
            self.eat_digits(10);
            // `1..2` is a range, not a fraction.
            if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
                decimal = true;
                self.advance();
                self.eat_digits(10);
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let signed = matches!(self.peek_nth(1), Some('+' | '-'));
                let digit_at = if signed { 2 } else { 1 };
                if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    decimal = true;
                    self.advance();
                    if signed {
                        self.advance();
                    }
                    self.eat_digits(10);
                }
            }
        }

        let suffix = self.peek();
        let kind = match suffix {
            Some('l' | 'L') => SyntaxKind::LongLiteral,
            Some('i' | 'I') => SyntaxKind::IntLiteral,
            Some('g' | 'G') if decimal => SyntaxKind::BigDecimalLiteral,
            Some('g' | 'G') => SyntaxKind::BigIntegerLiteral,
            Some('f' | 'F') if !radix_prefix => SyntaxKind::FloatLiteral,
            Some('d' | 'D') if !radix_prefix => SyntaxKind::DoubleLiteral,
            _ => {
                return if decimal {
                    SyntaxKind::DoubleLiteral
                } else {
                    SyntaxKind::IntLiteral
                };
            }
        };
        self.advance();
        kind
    }

    fn lex_string(&mut self, quote: char) -> SyntaxKind {
        let (line, column) = (self.line, self.column);
        let closing: String = [quote; 3].iter().collect();
        let triple = self.rest().starts_with(&closing);
        let delimiter_len = if triple { 3 } else { 1 };
        for _ in 0..delimiter_len {
            self.advance();
        }

        let mut interpolated = false;
        loop {
            let Some(ch) = self.peek() else {
                self.error_from(line, column, "unterminated string literal");
                return SyntaxKind::Error;
            };
            if !triple && (ch == '\n' || ch == '\r') {
                self.error_from(line, column, "unterminated string literal");
                return SyntaxKind::Error;
            }
            if ch == '\\' {
                self.advance();
                self.advance();
                continue;
            }
            if ch == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.rest().starts_with(&closing) {
                    self.advance_str(&closing);
                    break;
                }
            }
            if quote == '"' && ch == '$' {
                match self.peek_nth(1) {
                    Some('{') => {
                        interpolated = true;
                        self.advance();
                        if !self.skip_interpolation() {
                            self.error_from(line, column, "unterminated string literal");
                            return SyntaxKind::Error;
                        }
                        continue;
                    }
                    Some(next) if is_ident_start(next) && next != '$' => interpolated = true,
                    _ => {}
                }
            }
            self.advance();
        }

        if interpolated {
            SyntaxKind::GStringLiteral
        } else {
            SyntaxKind::StringLiteral
        }
    }

    /// Skip a `{ ... }` interpolation body, stepping over nested braces and
    /// quoted strings. Returns false if the input ends first.
    fn skip_interpolation(&mut self) -> bool {
        let mut depth = 0u32;
        while let Some(ch) = self.peek() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return true;
                    }
                }
                '\'' | '"' => {
                    self.advance();
                    while let Some(inner) = self.peek() {
                        if inner == '\\' {
                            self.advance();
                        } else if inner == ch {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => {}
            }
            self.advance();
        }
        false
    }

    fn lex_operator(&mut self, line: u32, column: u32) -> SyntaxKind {
        let rest = self.rest();
        for (text, kind) in OPERATORS {
            if rest.starts_with(text) {
                self.advance_str(text);
                return *kind;
            }
        }
        let ch = self.advance();
        self.error_from(
            line,
            column,
            &format!("unexpected character `{}`", ch.unwrap_or_default()),
        );
        SyntaxKind::Error
    }
}

/// Advance a 1-based `(line, column)` over `text`, expanding tabs the same way
/// the lexer does.
pub(crate) fn advance_position(line: u32, column: u32, text: &str, tab_size: u32) -> (u32, u32) {
    let mut lexer = Lexer::with_start(text, tab_size, line, column);
    while lexer.advance().is_some() {}
    (lexer.line, lexer.column)
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
