//! JVM descriptors and generic signatures (JVMS 4.3, 4.7.9.1).
//!
//! Descriptors are the erased subset of signatures, so one parser reads
//! both.

use crate::PrimitiveType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid signature `{signature}` at offset {offset}")]
pub struct SignatureError {
    pub signature: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSig {
    Base(PrimitiveType),
    /// Binary name (`java.util.Map$Entry`) and its type arguments.
    Class { name: String, args: Vec<TypeArg> },
    Array(Box<TypeSig>),
    TypeVar(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    Any,
    Exact(TypeSig),
    Extends(TypeSig),
    Super(TypeSig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamSig {
    pub name: String,
    pub bounds: Vec<TypeSig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSig {
    pub type_params: Vec<TypeParamSig>,
    pub superclass: TypeSig,
    pub interfaces: Vec<TypeSig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub type_params: Vec<TypeParamSig>,
    pub params: Vec<TypeSig>,
    /// `None` for `void`.
    pub return_type: Option<TypeSig>,
}

pub fn parse_field_signature(signature: &str) -> Result<TypeSig, SignatureError> {
    let mut parser = SigParser::new(signature);
    let ty = parser.type_sig()?;
    parser.finish()?;
    Ok(ty)
}

pub fn parse_method_signature(signature: &str) -> Result<MethodSig, SignatureError> {
    let mut parser = SigParser::new(signature);
    let type_params = parser.type_params()?;
    parser.expect(b'(')?;
    let mut params = Vec::new();
    while parser.peek() != Some(b')') {
        params.push(parser.type_sig()?);
    }
    parser.expect(b')')?;
    let return_type = if parser.eat(b'V') {
        None
    } else {
        Some(parser.type_sig()?)
    };
    while parser.eat(b'^') {
        parser.type_sig()?;
    }
    parser.finish()?;
    Ok(MethodSig {
        type_params,
        params,
        return_type,
    })
}

pub fn parse_class_signature(signature: &str) -> Result<ClassSig, SignatureError> {
    let mut parser = SigParser::new(signature);
    let type_params = parser.type_params()?;
    let superclass = parser.type_sig()?;
    let mut interfaces = Vec::new();
    while parser.peek().is_some() {
        interfaces.push(parser.type_sig()?);
    }
    Ok(ClassSig {
        type_params,
        superclass,
        interfaces,
    })
}

/// `java/util/List` → `java.util.List`.
pub fn internal_to_binary(internal: &str) -> String {
    internal.replace('/', ".")
}

struct SigParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self) -> SignatureError {
        SignatureError {
            signature: self.text.to_string(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), SignatureError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish(&self) -> Result<(), SignatureError> {
        if self.pos == self.text.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Identifier up to (not including) any of `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, SignatureError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&self.text[start..self.pos])
    }

    fn type_params(&mut self) -> Result<Vec<TypeParamSig>, SignatureError> {
        let mut params = Vec::new();
        if !self.eat(b'<') {
            return Ok(params);
        }
        while !self.eat(b'>') {
            let name = self.identifier(b":>")?.to_string();
            let mut bounds = Vec::new();
            while self.eat(b':') {
                // An empty class bound is followed directly by an interface
                // bound or the next parameter.
                if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                    bounds.push(self.type_sig()?);
                }
            }
            if self.peek().is_none() {
                return Err(self.error());
            }
            params.push(TypeParamSig { name, bounds });
        }
        Ok(params)
    }

    fn type_sig(&mut self) -> Result<TypeSig, SignatureError> {
        let Some(b) = self.peek() else {
            return Err(self.error());
        };
        if let Some(base) = PrimitiveType::from_descriptor(b as char) {
            self.pos += 1;
            return Ok(TypeSig::Base(base));
        }
        match b {
            b'[' => {
                self.pos += 1;
                Ok(TypeSig::Array(Box::new(self.type_sig()?)))
            }
            b'T' => {
                self.pos += 1;
                let name = self.identifier(b";")?.to_string();
                self.expect(b';')?;
                Ok(TypeSig::TypeVar(name))
            }
            b'L' => {
                self.pos += 1;
                self.class_sig()
            }
            _ => Err(self.error()),
        }
    }

    fn class_sig(&mut self) -> Result<TypeSig, SignatureError> {
        let mut name = internal_to_binary(self.identifier(b"<;.")?);
        let mut args = self.type_args()?;
        // Inner classes: `Outer<T>.Inner<U>`; only the innermost arguments
        // are kept.
        while self.eat(b'.') {
            name.push('$');
            name.push_str(self.identifier(b"<;.")?);
            args = self.type_args()?;
        }
        self.expect(b';')?;
        Ok(TypeSig::Class { name, args })
    }

    fn type_args(&mut self) -> Result<Vec<TypeArg>, SignatureError> {
        let mut args = Vec::new();
        if !self.eat(b'<') {
            return Ok(args);
        }
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArg::Any
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArg::Extends(self.type_sig()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArg::Super(self.type_sig()?)
                }
                Some(_) => TypeArg::Exact(self.type_sig()?),
                None => return Err(self.error()),
            };
            args.push(arg);
        }
        Ok(args)
    }
}
