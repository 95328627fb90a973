use std::fmt;

use serde::{Deserialize, Serialize};

/// A type as written in source, before resolution.
///
/// `name` is the (possibly dotted) name exactly as it appeared, `args` are the
/// generic arguments and `dimensions` counts trailing `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub dimensions: u32,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            dimensions: 0,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// The `def` pseudo type used for dynamically typed declarations.
    pub fn dynamic() -> Self {
        Self::new("def")
    }

    /// `def`, `var` and a missing type all mean "dynamically typed".
    pub fn is_dynamic(&self) -> bool {
        self.dimensions == 0 && matches!(self.name.as_str(), "def" | "var" | "")
    }

    pub fn is_qualified(&self) -> bool {
        self.name.contains('.')
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Parse a textual type such as `java.util.Map<String, List<Integer>>[]`.
    ///
    /// Wildcards collapse to their upper bound (`? extends T` becomes `T`,
    /// anything else becomes `Object`). Returns `None` for malformed input.
    pub fn parse(text: &str) -> Option<TypeRef> {
        let mut parser = TypeRefParser {
            text: text.as_bytes(),
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        (parser.pos == parser.text.len()).then_some(ty)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

struct TypeRefParser<'a> {
    text: &'a [u8],
    pos: usize,
}

impl TypeRefParser<'_> {
    fn skip_ws(&mut self) {
        while self.pos < self.text.len() && self.text[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.text.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let end = self.pos + kw.len();
        if self.text.get(self.pos..end) == Some(kw.as_bytes())
            && !self
                .text
                .get(end)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn parse_name(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(&b) = self.text.get(self.pos) {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return None;
        }
        let name = std::str::from_utf8(&self.text[start..self.pos]).ok()?;
        // `String...` leaves the dots on the name; they are handled by the caller.
        Some(name.to_string())
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        if self.eat(b'?') {
            if self.eat_keyword("extends") {
                return self.parse_type();
            }
            if self.eat_keyword("super") {
                self.parse_type()?;
            }
            return Some(TypeRef::new(crate::OBJECT));
        }

        let mut name = self.parse_name()?;
        let mut dimensions = 0;
        if let Some(stripped) = name.strip_suffix("...") {
            name = stripped.to_string();
            dimensions += 1;
        }

        let mut args = Vec::new();
        if self.eat(b'<') {
            if !self.eat(b'>') {
                loop {
                    args.push(self.parse_type()?);
                    if self.eat(b',') {
                        continue;
                    }
                    if self.eat(b'>') {
                        break;
                    }
                    return None;
                }
            }
        }

        while self.eat(b'[') {
            if !self.eat(b']') {
                return None;
            }
            dimensions += 1;
        }
        self.skip_ws();
        if self.text.get(self.pos..self.pos + 3) == Some(b"...") {
            self.pos += 3;
            dimensions += 1;
        }

        Some(TypeRef {
            name,
            args,
            dimensions,
        })
    }
}
