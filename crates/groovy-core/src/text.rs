//! Text model primitives: 1-based positions, ranges and offset conversion.

use std::fmt;

use serde::{Deserialize, Serialize};
use text_size::TextSize;

/// A 1-based (line, column) position, as reported by the Groovy compiler.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A range between two positions. `end` is never before `begin`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub begin: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, clamping `end` to `begin` when the caller passes an
    /// inverted pair.
    #[inline]
    pub fn new(begin: Position, end: Position) -> Self {
        let end = if end < begin { begin } else { end };
        Self { begin, end }
    }

    #[inline]
    pub const fn point(pos: Position) -> Self {
        Self {
            begin: pos,
            end: pos,
        }
    }

    /// Both bounds are inclusive so a cursor placed right after a token still
    /// hits it.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.begin <= pos && pos <= self.end
    }

    #[inline]
    pub fn encloses(&self, other: &Range) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    #[inline]
    pub fn line_span(&self) -> u32 {
        self.end.line - self.begin.line + 1
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}

/// Pre-computed line start offsets for a particular text snapshot.
///
/// Columns are counted in characters, matching the front end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    line_ends: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(128);
        let mut line_ends = Vec::with_capacity(128);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    line_ends.push(TextSize::from(i as u32));
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_starts.push(TextSize::from((i + 2) as u32));
                        i += 2;
                    } else {
                        line_starts.push(TextSize::from((i + 1) as u32));
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        line_ends.push(TextSize::from(text.len() as u32));

        Self {
            line_starts,
            line_ends,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Byte offset where the given 1-based line starts.
    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        let idx = line.checked_sub(1)?;
        self.line_starts.get(idx as usize).copied()
    }

    /// Byte offset of the end of the given 1-based line, excluding the newline.
    #[inline]
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        let idx = line.checked_sub(1)?;
        self.line_ends.get(idx as usize).copied()
    }

    fn line_index(&self, offset: TextSize) -> usize {
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        }
    }

    /// Convert a byte offset to a 1-based position.
    ///
    /// `text` must be the same snapshot used to construct this index.
    pub fn position(&self, text: &str, offset: TextSize) -> Position {
        let offset = offset.min(self.text_len);
        let line = self.line_index(offset);
        let start = u32::from(self.line_starts[line]) as usize;
        let end = u32::from(offset.min(self.line_ends[line])) as usize;
        let column = text
            .get(start..end)
            .map(|s| s.chars().count() as u32)
            .unwrap_or(0);
        Position::new(line as u32 + 1, column + 1)
    }

    /// Convert a 1-based position to a byte offset. Columns past the end of the
    /// line yield `None`.
    pub fn offset(&self, text: &str, pos: Position) -> Option<TextSize> {
        let start = self.line_start(pos.line)?;
        let end = self.line_end(pos.line)?;
        let col = pos.column.checked_sub(1)? as usize;
        let line_text = text.get(u32::from(start) as usize..u32::from(end) as usize)?;

        let mut chars = line_text.char_indices();
        match chars.nth(col) {
            Some((byte, _)) => Some(start + TextSize::from(byte as u32)),
            None if line_text.chars().count() == col => Some(end),
            None => None,
        }
    }

    /// Text of the given 1-based line, without its terminator.
    pub fn line_text<'a>(&self, text: &'a str, line: u32) -> Option<&'a str> {
        let start = u32::from(self.line_start(line)?) as usize;
        let end = u32::from(self.line_end(line)?) as usize;
        text.get(start..end)
    }
}
