use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Position, Range};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Hint => "HINT",
        };
        f.write_str(s)
    }
}

/// A diagnostic produced while parsing or converting a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub message: String,
    pub position: Option<Position>,
    pub range: Option<Range>,
    pub severity: Severity,
    /// Description of the underlying failure, if the problem wraps one.
    pub cause: Option<String>,
}

impl Problem {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            range: None,
            severity,
            cause: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach a range; the position defaults to the range start.
    #[must_use]
    pub fn with_range(mut self, range: Range) -> Self {
        self.position.get_or_insert(range.begin);
        self.range = Some(range);
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// 1-based line of the problem, if it carries a position.
    #[inline]
    pub fn line(&self) -> Option<u32> {
        self.position.map(|p| p.line)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} @ {}: {}", self.severity, pos, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}
