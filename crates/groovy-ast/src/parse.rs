//! The parse pipeline: front end, diagnostics, lenient recovery and
//! conversion.

use std::collections::BTreeSet;
use std::sync::Arc;

use groovy_config::ParserConfig;
use groovy_core::{Position, Problem, Range};
use groovy_syntax::{FrontEnd, FrontEndOutput, GroovyFrontEnd, Message, Token, Warning};

use crate::convert::convert;
use crate::node::Ast;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// `None` in strict mode on any error, or when lenient recovery gave up.
    pub ast: Option<Ast>,
    pub problems: Vec<Problem>,
    /// Tokens of the original source, when `store_tokens` is set.
    pub tokens: Option<Vec<Token>>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }
}

#[derive(Clone)]
pub struct GroovyParser {
    config: ParserConfig,
    front_end: Arc<dyn FrontEnd>,
}

impl std::fmt::Debug for GroovyParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroovyParser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for GroovyParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl GroovyParser {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_front_end(config, Arc::new(GroovyFrontEnd::default()))
    }

    pub fn with_front_end(config: ParserConfig, front_end: Arc<dyn FrontEnd>) -> Self {
        Self { config, front_end }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `source`. Never panics on bad input: every failure is reported
    /// as a [`Problem`].
    pub fn parse(&self, source: &str) -> ParseResult {
        let output = self.front_end.parse(source, &self.config);
        let tokens = output.tokens.clone();
        let mut problems = self.problems(&output);

        if !output.has_errors() {
            let ast = match &output.module {
                Some(module) => match convert(module, Some(source), &self.config) {
                    Ok(ast) => Some(ast),
                    Err(err) => {
                        tracing::warn!(target: "groovy.convert", error = %err, "conversion failed");
                        problems.push(
                            Problem::error(format!("conversion error: {err}"))
                                .with_cause(err.to_string()),
                        );
                        self.config.lenient_mode.then(Ast::empty)
                    }
                },
                None => Some(Ast::empty()),
            };
            return ParseResult {
                ast,
                problems,
                tokens,
            };
        }

        if !self.config.lenient_mode {
            return ParseResult {
                ast: None,
                problems,
                tokens,
            };
        }

        let (ast, problems) = self.recover(source, output, problems);
        ParseResult {
            ast,
            problems,
            tokens,
        }
    }

    /// Blank every erroring line and re-parse, until the source parses,
    /// stops changing, or the attempt budget runs out.
    fn recover(
        &self,
        source: &str,
        first: FrontEndOutput,
        original_problems: Vec<Problem>,
    ) -> (Option<Ast>, Vec<Problem>) {
        let mut current = source.to_string();
        let mut last = first;
        let mut last_problems = original_problems.clone();
        for attempt in 1..=self.config.max_recovery_attempts {
            let lines: BTreeSet<u32> = last.messages.iter().filter_map(Message::line).collect();
            if lines.is_empty() {
                tracing::debug!(target: "groovy.parse", attempt, "no positioned errors to blank");
                break;
            }
            let blanked = blank_lines(&current, &lines);
            if blanked == current {
                tracing::debug!(target: "groovy.parse", attempt, "recovery made no progress");
                break;
            }
            tracing::debug!(
                target: "groovy.parse",
                attempt,
                blanked = ?lines,
                "retrying parse with error lines blanked"
            );
            let output = self.front_end.parse(&blanked, &self.config);
            current = blanked;
            if !output.has_errors() {
                if let Some(module) = &output.module {
                    match convert(module, Some(source), &self.config) {
                        Ok(ast) => return (Some(ast), original_problems),
                        Err(err) => {
                            tracing::warn!(target: "groovy.convert", error = %err, "conversion failed");
                            let mut problems = original_problems;
                            problems.push(
                                Problem::error(format!("conversion error: {err}"))
                                    .with_cause(err.to_string()),
                            );
                            return (Some(Ast::empty()), problems);
                        }
                    }
                }
            }
            last_problems = self.problems(&output);
            last = output;
        }
        tracing::debug!(
            target: "groovy.parse",
            problems = last_problems.len(),
            "lenient recovery gave up"
        );
        (None, last_problems)
    }

    fn problems(&self, output: &FrontEndOutput) -> Vec<Problem> {
        let mut problems: Vec<Problem> = output.messages.iter().map(message_problem).collect();
        if self.config.collect_warnings {
            problems.extend(output.warnings.iter().map(warning_problem));
        }
        problems
    }
}

fn message_problem(message: &Message) -> Problem {
    match message {
        Message::Syntax(err) => Problem::error(&err.message).with_range(Range::new(
            Position::new(err.line, err.column),
            Position::new(err.end_line, err.end_column),
        )),
        Message::Exception { message } => {
            Problem::error(message).with_cause("front end exception")
        }
        Message::Simple { message } => Problem::error(message),
    }
}

fn warning_problem(warning: &Warning) -> Problem {
    Problem::warning(&warning.message).at(Position::new(warning.line, warning.column))
}

/// Replace the content of the given 1-based lines with nothing, keeping the
/// line terminators so every other line keeps its number.
pub fn blank_lines(source: &str, lines: &BTreeSet<u32>) -> String {
    let mut out = String::with_capacity(source.len());
    for (index, line) in source.split_inclusive('\n').enumerate() {
        if lines.contains(&(index as u32 + 1)) {
            let content = line.trim_end_matches(['\n', '\r']);
            out.push_str(&line[content.len()..]);
        } else {
            out.push_str(line);
        }
    }
    out
}
