//! Groovy front end: lexer, parser and the raw tree it produces.
//!
//! The raw tree in [`raw`] keeps the shape of the host compiler's AST after
//! its conversion phase, including the specialized node classes. Consumers
//! should go through the [`FrontEnd`] trait so tests can swap in a fake.

mod lexer;
mod literals;
mod parser;
pub mod raw;
mod syntax_kind;

use std::fmt;

use groovy_config::ParserConfig;

pub use lexer::{lex, LexError, Lexer, Token};
pub use literals::{parse_number, split_gstring, unescape, unescape_string, GStringPart, LiteralError};
pub use syntax_kind::SyntaxKind;

use raw::RawModule;

/// A positioned syntax error. Coordinates are 1-based; the end is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ line {}, column {}.", self.message, self.line, self.column)
    }
}

/// An error message reported by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Syntax(SyntaxError),
    /// An internal failure while parsing (e.g. runaway nesting).
    Exception { message: String },
    /// A plain message without position information.
    Simple { message: String },
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Message::Syntax(err) => &err.message,
            Message::Exception { message } | Message::Simple { message } => message,
        }
    }

    /// 1-based line of the message, for positioned messages.
    pub fn line(&self) -> Option<u32> {
        match self {
            Message::Syntax(err) => Some(err.line),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

/// Result of running the front end over one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontEndOutput {
    /// The tree; absent whenever an error message was reported.
    pub module: Option<RawModule>,
    pub messages: Vec<Message>,
    pub warnings: Vec<Warning>,
    /// Lexed tokens, kept when `store_tokens` is enabled.
    pub tokens: Option<Vec<Token>>,
}

impl FrontEndOutput {
    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }
}

/// The compiler front end collaborator used by the parse pipeline.
pub trait FrontEnd: Send + Sync {
    fn parse(&self, source: &str, config: &ParserConfig) -> FrontEndOutput;
}

/// The built-in recursive descent front end.
#[derive(Debug, Clone)]
pub struct GroovyFrontEnd {
    script_name: String,
}

impl GroovyFrontEnd {
    pub const DEFAULT_SCRIPT_NAME: &'static str = "Script";

    /// Front end that names synthesized script classes `script_name`.
    pub fn with_script_name(script_name: impl Into<String>) -> Self {
        Self {
            script_name: script_name.into(),
        }
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }
}

impl Default for GroovyFrontEnd {
    fn default() -> Self {
        Self::with_script_name(Self::DEFAULT_SCRIPT_NAME)
    }
}

impl FrontEnd for GroovyFrontEnd {
    fn parse(&self, source: &str, config: &ParserConfig) -> FrontEndOutput {
        let outcome = parser::Parser::new(source, config).parse_module(&self.script_name);
        tracing::trace!(
            target: "groovy.parse",
            tokens = outcome.tokens.len(),
            messages = outcome.messages.len(),
            warnings = outcome.warnings.len(),
            "front end finished"
        );
        let module = outcome.messages.is_empty().then_some(outcome.module);
        FrontEndOutput {
            module,
            messages: outcome.messages,
            warnings: outcome.warnings,
            tokens: config.store_tokens.then_some(outcome.tokens),
        }
    }
}

#[cfg(test)]
mod tests;
