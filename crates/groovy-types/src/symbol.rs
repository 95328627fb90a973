/// Outcome of a resolution query: either a declaration or "not found".
///
/// Resolution never fails with an error; absence is an ordinary value.
#[derive(Debug, Clone)]
pub struct SymbolReference<T> {
    declaration: Option<T>,
}

impl<T> SymbolReference<T> {
    pub fn solved(declaration: T) -> Self {
        Self {
            declaration: Some(declaration),
        }
    }

    pub fn unsolved() -> Self {
        Self { declaration: None }
    }

    pub fn is_solved(&self) -> bool {
        self.declaration.is_some()
    }

    pub fn declaration(&self) -> Option<&T> {
        self.declaration.as_ref()
    }

    pub fn into_declaration(self) -> Option<T> {
        self.declaration
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SymbolReference<U> {
        SymbolReference {
            declaration: self.declaration.map(f),
        }
    }

    /// `self` if solved, otherwise the result of `f`.
    pub fn or_else(self, f: impl FnOnce() -> SymbolReference<T>) -> Self {
        if self.is_solved() {
            self
        } else {
            f()
        }
    }
}

impl<T> From<Option<T>> for SymbolReference<T> {
    fn from(declaration: Option<T>) -> Self {
        Self { declaration }
    }
}

impl<T> Default for SymbolReference<T> {
    fn default() -> Self {
        Self::unsolved()
    }
}
