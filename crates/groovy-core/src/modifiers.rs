use std::fmt;

use serde::{Deserialize, Serialize};

/// Declaration modifiers, encoded with the JVM access flag values.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers(pub u16);

impl Modifiers {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const VOLATILE: u16 = 0x0040;
    pub const TRANSIENT: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const VARARGS: u16 = 0x0080;
    pub const ENUM: u16 = 0x4000;

    const KEYWORDS: [(&'static str, u16); 9] = [
        ("public", Self::PUBLIC),
        ("private", Self::PRIVATE),
        ("protected", Self::PROTECTED),
        ("static", Self::STATIC),
        ("final", Self::FINAL),
        ("synchronized", Self::SYNCHRONIZED),
        ("volatile", Self::VOLATILE),
        ("native", Self::NATIVE),
        ("abstract", Self::ABSTRACT),
    ];

    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    #[inline]
    pub fn insert(&mut self, flag: u16) {
        self.0 |= flag;
    }

    /// Flag for a source modifier keyword; `transient` is handled here because
    /// it shares its bit with varargs on methods.
    pub fn flag_for_keyword(keyword: &str) -> Option<u16> {
        if keyword == "transient" {
            return Some(Self::TRANSIENT);
        }
        Self::KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == keyword)
            .map(|(_, flag)| *flag)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    /// Keywords in canonical order, e.g. `["public", "static"]`.
    pub fn keywords(self) -> Vec<&'static str> {
        Self::KEYWORDS
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(kw, _)| *kw)
            .collect()
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({:#06x})", self.0)
    }
}
