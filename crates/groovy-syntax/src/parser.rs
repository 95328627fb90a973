use groovy_config::ParserConfig;
use groovy_core::{Modifiers, TypeRef, OBJECT};

use crate::lexer::{advance_position, Lexer, Token};
use crate::literals::{self, GStringPart};
use crate::raw::*;
use crate::syntax_kind::SyntaxKind;
use crate::{Message, SyntaxError, Warning};

/// Expressions and statements nested deeper than this abort the parse.
pub(crate) const MAX_NESTING_DEPTH: u32 = 100;

const SCRIPT_SUPERCLASS: &str = "groovy.lang.Script";

pub(crate) struct ParseOutcome {
    pub module: RawModule,
    pub messages: Vec<Message>,
    pub warnings: Vec<Warning>,
    pub tokens: Vec<Token>,
}

/// One parsed class member.
enum Member {
    Constructor(RawMethod),
    Method(RawMethod),
    Fields(Vec<RawField>),
    Skipped,
}

pub(crate) struct Parser<'a> {
    input: &'a str,
    config: &'a ParserConfig,
    tokens: Vec<Token>,
    pos: usize,
    /// End of the last consumed token.
    last_end: (u32, u32),
    messages: Vec<Message>,
    warnings: Vec<Warning>,
    error_count: u32,
    aborted: bool,
    depth: u32,
    /// First token of the statement or member being parsed.
    construct_start: usize,
    /// Nested classes, hoisted to the module level.
    hoisted: Vec<RawClass>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str, config: &'a ParserConfig) -> Self {
        Self::at_offset(input, config, 1, 1, 0)
    }

    fn at_offset(input: &'a str, config: &'a ParserConfig, line: u32, column: u32, depth: u32) -> Self {
        let mut lexer = Lexer::with_start(input, config.tab_size, line, column);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == SyntaxKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        let mut parser = Self {
            input,
            config,
            tokens,
            pos: 0,
            last_end: (line, column),
            messages: Vec::new(),
            warnings: Vec::new(),
            error_count: 0,
            aborted: false,
            depth,
            construct_start: 0,
            hoisted: Vec::new(),
        };
        for err in lexer.into_errors() {
            parser.push_error(SyntaxError {
                message: err.message,
                line: err.line,
                column: err.column,
                end_line: err.end_line,
                end_column: err.end_column,
            });
        }
        parser
    }

    // --- Module level -----------------------------------------------------

    pub(crate) fn parse_module(mut self, script_name: &str) -> ParseOutcome {
        let mut module = RawModule {
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
        };
        let mut statements = Vec::new();
        let mut script_methods = Vec::new();

        self.skip_semicolons();
        if self.at(SyntaxKind::PackageKw) {
            module.package = Some(self.parse_package());
        }

        while !self.at_eof() {
            let before = self.pos;
            self.skip_semicolons();
            if self.at_eof() {
                break;
            }
            if self.at(SyntaxKind::ImportKw) {
                let import = self.parse_import(&module.imports);
                module.imports.push(import);
            } else if self.at_type_decl_start(self.pos) {
                if let Some(class) = self.parse_class() {
                    module.classes.push(class);
                }
            } else if self.at_script_method_start() {
                let start = self.tok();
                match self.parse_member(start, None) {
                    Member::Method(method) | Member::Constructor(method) => script_methods.push(method),
                    Member::Fields(_) | Member::Skipped => {}
                }
            } else {
                self.parse_statement_into(&mut statements);
            }
            if self.pos == before {
                self.bump();
            }
        }

        module.classes.append(&mut self.hoisted);
        if !statements.is_empty() || !script_methods.is_empty() {
            module
                .classes
                .push(script_class(script_name, statements, script_methods));
        }
        self.check_duplicate_classes(&module.classes);

        ParseOutcome {
            module,
            messages: self.messages,
            warnings: self.warnings,
            tokens: self.tokens,
        }
    }

    fn check_duplicate_classes(&mut self, classes: &[RawClass]) {
        for (idx, class) in classes.iter().enumerate() {
            if classes[..idx].iter().any(|other| other.name == class.name) {
                let name = &class.name;
                self.messages.push(Message::Simple {
                    message: format!(
                        "Invalid duplicate class definition of class {name} : The source contains at least two definitions of the class {name}."
                    ),
                });
            }
        }
    }

    fn parse_package(&mut self) -> RawPackage {
        let start = self.bump();
        let name = self.parse_qualified_name();
        self.finish_statement();
        RawPackage {
            name,
            annotations: Vec::new(),
            pos: self.pos_from(&start),
        }
    }

    fn parse_import(&mut self, previous: &[RawImport]) -> RawImport {
        let start = self.bump();
        let is_static = self.eat(SyntaxKind::StaticKw);
        let name = self.parse_qualified_name();
        let mut is_star = false;
        if self.at(SyntaxKind::Dot) && self.nth(1) == SyntaxKind::Star {
            self.bump();
            self.bump();
            is_star = true;
        }
        let alias = if self.eat(SyntaxKind::AsKw) {
            let tok = self.tok();
            self.expect(SyntaxKind::Identifier, "an alias name")
                .then(|| self.text(&tok).to_string())
        } else {
            None
        };
        self.finish_statement();

        let implicit = if is_star {
            name == "java.lang"
        } else {
            name.strip_prefix("java.lang.").is_some_and(|rest| !rest.contains('.'))
        };
        if implicit && !is_static && alias.is_none() {
            self.warn(&start, format!("Unnecessary import of `{name}`: java.lang is imported by default"));
        }
        if previous
            .iter()
            .any(|p| p.name == name && p.is_star == is_star && p.alias == alias && p.is_static == is_static)
        {
            self.warn(&start, format!("Duplicate import of `{name}`"));
        }
        RawImport {
            name,
            alias,
            is_static,
            is_star,
            annotations: Vec::new(),
            pos: self.pos_from(&start),
        }
    }

    // --- Declarations -----------------------------------------------------

    fn parse_class(&mut self) -> Option<RawClass> {
        let start = self.tok();
        let (mut modifiers, annotations) = self.parse_modifiers_and_annotations();
        let kind = match self.current() {
            SyntaxKind::ClassKw => ClassKind::Class,
            SyntaxKind::InterfaceKw => ClassKind::Interface,
            SyntaxKind::EnumKw => ClassKind::Enum,
            SyntaxKind::TraitKw => ClassKind::Trait,
            SyntaxKind::At if self.nth(1) == SyntaxKind::InterfaceKw => {
                self.bump();
                ClassKind::Annotation
            }
            _ => {
                self.error_here("expected a type declaration");
                self.recover_statement();
                return None;
            }
        };
        self.bump();
        match kind {
            ClassKind::Interface | ClassKind::Annotation => {
                modifiers.insert(Modifiers::INTERFACE | Modifiers::ABSTRACT)
            }
            ClassKind::Enum => modifiers.insert(Modifiers::ENUM | Modifiers::FINAL),
            ClassKind::Class | ClassKind::Trait => {}
        }

        let name_tok = self.tok();
        if !self.expect(SyntaxKind::Identifier, "a class name") {
            self.recover_statement();
            return None;
        }
        let name = self.text(&name_tok).to_string();
        let generics = if self.at(SyntaxKind::Lt) {
            self.parse_generic_params()
        } else {
            Vec::new()
        };

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.eat(SyntaxKind::ExtendsKw) {
            if kind == ClassKind::Interface {
                interfaces = self.parse_type_list();
            } else {
                superclass = Some(self.parse_type());
            }
        }
        if self.eat(SyntaxKind::ImplementsKw) {
            interfaces.extend(self.parse_type_list());
        }

        let mut class = RawClass {
            name,
            kind,
            modifiers,
            generics,
            superclass,
            interfaces,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            annotations,
            is_script: false,
            pos: SourcePos::UNKNOWN,
        };
        self.parse_class_body(&mut class);
        class.pos = self.pos_from(&start);
        Some(class)
    }

    fn parse_class_body(&mut self, class: &mut RawClass) {
        if !self.expect(SyntaxKind::LBrace, "`{`") {
            return;
        }
        if class.kind == ClassKind::Enum {
            self.parse_enum_constants(class);
        }
        while !self.at(SyntaxKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            self.skip_semicolons();
            if self.at(SyntaxKind::RBrace) {
                break;
            }
            let start = self.tok();
            match self.parse_member(start, Some(class.name.as_str())) {
                Member::Constructor(ctor) => class.constructors.push(ctor),
                Member::Method(method) => class.methods.push(method),
                Member::Fields(fields) => class.fields.extend(fields),
                Member::Skipped => {}
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(SyntaxKind::RBrace, "`}`");
    }

    fn parse_enum_constants(&mut self, class: &mut RawClass) {
        let enum_type = TypeRef::new(class.name.clone());
        loop {
            let start = self.tok();
            let annotations = if start.kind == SyntaxKind::At {
                self.parse_modifiers_and_annotations().1
            } else {
                Vec::new()
            };
            let name_tok = self.tok();
            if name_tok.kind != SyntaxKind::Identifier
                || !(matches!(
                    self.nth(1),
                    SyntaxKind::Comma
                        | SyntaxKind::Semicolon
                        | SyntaxKind::RBrace
                        | SyntaxKind::LParen
                        | SyntaxKind::LBrace
                ) || self.nth_tok(1).newline_before)
            {
                break;
            }
            self.bump();
            if self.eat(SyntaxKind::LParen) {
                self.parse_call_arguments(Some(SyntaxKind::RParen));
                self.expect(SyntaxKind::RParen, "`)`");
            }
            if self.at(SyntaxKind::LBrace) {
                // Constant-specific class bodies are not modelled.
                let mut body = anonymous_class(&class.name);
                self.parse_class_body(&mut body);
            }
            class.fields.push(RawField {
                name: self.text(&name_tok).to_string(),
                ty: Some(enum_type.clone()),
                modifiers: Modifiers(Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL | Modifiers::ENUM),
                initial: None,
                annotations,
                is_enum_constant: true,
                pos: self.pos_from(&start),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.eat(SyntaxKind::Semicolon);
    }

    fn parse_member(&mut self, start: Token, class_name: Option<&str>) -> Member {
        self.construct_start = self.pos;
        if self.at(SyntaxKind::StaticKw) && self.nth(1) == SyntaxKind::LBrace {
            self.bump();
            self.parse_block();
            return Member::Skipped;
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
            return Member::Skipped;
        }
        if class_name.is_some() && self.at_type_decl_start(self.pos) {
            if let (Some(mut inner), Some(outer)) = (self.parse_class(), class_name) {
                inner.name = format!("{outer}${}", inner.name);
                self.hoisted.push(inner);
            }
            return Member::Skipped;
        }

        let (modifiers, annotations) = self.parse_modifiers_and_annotations();
        let generics = if self.at(SyntaxKind::Lt) {
            self.parse_generic_params()
        } else {
            Vec::new()
        };

        let name_tok = self.tok();
        if name_tok.kind == SyntaxKind::Identifier
            && class_name == Some(self.text(&name_tok))
            && self.nth(1) == SyntaxKind::LParen
        {
            self.bump();
            let name = self.text(&name_tok).to_string();
            let ctor = self.parse_method_rest(&start, name, None, modifiers, annotations, generics);
            return Member::Constructor(ctor);
        }

        let ty = if self.eat(SyntaxKind::DefKw) {
            None
        } else if self.at_untyped_member_name() {
            None
        } else {
            Some(self.parse_type())
        };

        let name_tok = self.tok();
        let name = match name_tok.kind {
            SyntaxKind::StringLiteral => literals::unescape_string(self.text(&name_tok)).ok(),
            kind if kind.is_identifier_like() => Some(self.text(&name_tok).to_string()),
            _ => None,
        };
        let Some(name) = name else {
            self.error_here("expected a member name");
            self.recover_statement();
            return Member::Skipped;
        };
        self.bump();

        if self.at(SyntaxKind::LParen) {
            let method = self.parse_method_rest(&start, name, ty, modifiers, annotations, generics);
            return Member::Method(method);
        }

        let mut fields = Vec::new();
        let mut name = name;
        loop {
            let initial = self.eat(SyntaxKind::Eq).then(|| self.parse_expression());
            fields.push(RawField {
                name,
                ty: ty.clone(),
                modifiers,
                initial,
                annotations: annotations.clone(),
                is_enum_constant: false,
                pos: self.pos_from(&start),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
            let tok = self.tok();
            if !self.expect(SyntaxKind::Identifier, "a field name") {
                break;
            }
            name = self.text(&tok).to_string();
        }
        self.finish_statement();
        Member::Fields(fields)
    }

    /// `static x = 1` and `final foo() {}` declare members without a type.
    fn at_untyped_member_name(&self) -> bool {
        let kind = self.current();
        if !(kind == SyntaxKind::Identifier || kind == SyntaxKind::StringLiteral) {
            return false;
        }
        let next = self.nth_tok(1);
        matches!(
            next.kind,
            SyntaxKind::LParen
                | SyntaxKind::Eq
                | SyntaxKind::Comma
                | SyntaxKind::Semicolon
                | SyntaxKind::RBrace
                | SyntaxKind::Eof
        ) || next.newline_before
    }

    fn parse_method_rest(
        &mut self,
        start: &Token,
        name: String,
        return_type: Option<TypeRef>,
        modifiers: Modifiers,
        annotations: Vec<RawAnnotation>,
        generics: Vec<RawGenericParam>,
    ) -> RawMethod {
        self.expect(SyntaxKind::LParen, "`(`");
        let params = self.parse_params(SyntaxKind::RParen);
        self.expect(SyntaxKind::RParen, "`)`");
        let throws = if self.eat(SyntaxKind::ThrowsKw) {
            self.parse_type_list()
        } else {
            Vec::new()
        };
        if self.eat(SyntaxKind::DefaultKw) {
            self.parse_expression();
        }
        let body = if self.at(SyntaxKind::LBrace) {
            Some(self.parse_block())
        } else {
            self.finish_statement();
            None
        };
        RawMethod {
            name,
            return_type,
            modifiers,
            generics,
            params,
            throws,
            body,
            annotations,
            pos: self.pos_from(start),
        }
    }

    fn parse_generic_params(&mut self) -> Vec<RawGenericParam> {
        let mut params = Vec::new();
        self.bump();
        loop {
            let tok = self.tok();
            if !self.expect(SyntaxKind::Identifier, "a type parameter") {
                break;
            }
            let mut bounds = Vec::new();
            if self.eat(SyntaxKind::ExtendsKw) {
                bounds.push(self.parse_type());
                while self.eat(SyntaxKind::Amp) {
                    bounds.push(self.parse_type());
                }
            }
            params.push(RawGenericParam {
                name: self.text(&tok).to_string(),
                bounds,
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect_gt();
        params
    }

    fn parse_params(&mut self, terminator: SyntaxKind) -> Vec<RawParam> {
        let mut params = Vec::new();
        while !self.at(terminator) && !self.at_eof() {
            let start = self.tok();
            let (_, annotations) = self.parse_modifiers_and_annotations();
            self.eat(SyntaxKind::DefKw);
            let typed = self
                .skip_type_at(self.pos)
                .is_some_and(|end| matches!(self.kind_at(end), SyntaxKind::Identifier | SyntaxKind::Ellipsis));
            let mut ty = typed.then(|| self.parse_type());
            let variadic = self.eat(SyntaxKind::Ellipsis);
            if variadic {
                let base = ty.take().unwrap_or_else(|| TypeRef::new(OBJECT));
                let dimensions = base.dimensions + 1;
                ty = Some(base.with_dimensions(dimensions));
            }
            let name_tok = self.tok();
            if !self.expect(SyntaxKind::Identifier, "a parameter name") {
                break;
            }
            let default = self.eat(SyntaxKind::Eq).then(|| self.parse_expression());
            params.push(RawParam {
                name: self.text(&name_tok).to_string(),
                ty,
                default,
                variadic,
                annotations,
                pos: self.pos_from(&start),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        params
    }

    fn parse_modifiers_and_annotations(&mut self) -> (Modifiers, Vec<RawAnnotation>) {
        let mut modifiers = Modifiers::empty();
        let mut annotations = Vec::new();
        loop {
            let tok = self.tok();
            if tok.kind.is_modifier() {
                if let Some(flag) = Modifiers::flag_for_keyword(self.text(&tok)) {
                    modifiers.insert(flag);
                }
                self.bump();
            } else if tok.kind == SyntaxKind::At && self.nth(1) != SyntaxKind::InterfaceKw {
                annotations.push(self.parse_annotation());
            } else {
                break;
            }
        }
        (modifiers, annotations)
    }

    fn parse_annotation(&mut self) -> RawAnnotation {
        let start = self.bump();
        let class_name = TypeRef::new(self.parse_qualified_name());
        let mut members = Vec::new();
        if self.eat(SyntaxKind::LParen) {
            while !self.at(SyntaxKind::RParen) && !self.at_eof() {
                let tok = self.tok();
                if tok.kind.is_identifier_like() && self.nth(1) == SyntaxKind::Eq {
                    self.bump();
                    self.bump();
                    let value = self.parse_expression();
                    members.push((self.text(&tok).to_string(), value));
                } else {
                    let value = self.parse_expression();
                    members.push(("value".to_string(), value));
                }
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::RParen, "`)`");
        }
        RawAnnotation {
            class_name,
            members,
            pos: self.pos_from(&start),
        }
    }

    // --- Types ------------------------------------------------------------

    fn parse_type(&mut self) -> TypeRef {
        let tok = self.tok();
        let mut ty = if tok.kind.is_primitive_type() || tok.kind == SyntaxKind::VoidKw {
            self.bump();
            TypeRef::new(self.text(&tok))
        } else if tok.kind == SyntaxKind::Identifier {
            TypeRef::new(self.parse_qualified_name())
        } else {
            self.error_here("expected a type");
            return TypeRef::new(OBJECT);
        };
        if self.at(SyntaxKind::Lt) {
            self.bump();
            let mut args = Vec::new();
            while !self.at_closing_gt() && !self.at_eof() {
                args.push(self.parse_type_argument());
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect_gt();
            ty.args = args;
        }
        while self.at(SyntaxKind::LBracket) && self.nth(1) == SyntaxKind::RBracket {
            self.bump();
            self.bump();
            ty.dimensions += 1;
        }
        ty
    }

    fn parse_type_argument(&mut self) -> TypeRef {
        if self.eat(SyntaxKind::Question) {
            if self.eat(SyntaxKind::ExtendsKw) {
                return self.parse_type();
            }
            if self.eat(SyntaxKind::SuperKw) {
                self.parse_type();
            }
            return TypeRef::new(OBJECT);
        }
        self.parse_type()
    }

    fn parse_type_list(&mut self) -> Vec<TypeRef> {
        let mut types = vec![self.parse_type()];
        while self.eat(SyntaxKind::Comma) {
            types.push(self.parse_type());
        }
        types
    }

    fn at_closing_gt(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::Gt | SyntaxKind::RightShift | SyntaxKind::UnsignedRightShift
        )
    }

    /// Consume one `>`, splitting `>>` and `>>>` closing nested type arguments.
    fn expect_gt(&mut self) {
        let rest = match self.current() {
            SyntaxKind::Gt => {
                self.bump();
                return;
            }
            SyntaxKind::RightShift => SyntaxKind::Gt,
            SyntaxKind::UnsignedRightShift => SyntaxKind::RightShift,
            SyntaxKind::GtEq => SyntaxKind::Eq,
            _ => {
                self.error_here("expected `>`");
                return;
            }
        };
        let tok = &mut self.tokens[self.pos];
        self.last_end = (tok.line, tok.column + 1);
        tok.kind = rest;
        tok.start += 1;
        tok.column += 1;
        tok.newline_before = false;
    }

    fn parse_qualified_name(&mut self) -> String {
        let tok = self.tok();
        if !tok.kind.is_identifier_like() {
            self.error_here("expected a name");
            return String::new();
        }
        self.bump();
        let mut name = self.text(&tok).to_string();
        while self.at(SyntaxKind::Dot) && self.nth(1).is_identifier_like() {
            self.bump();
            let segment = self.bump();
            name.push('.');
            name.push_str(self.text(&segment));
        }
        name
    }

    // --- Statements -------------------------------------------------------

    fn parse_block(&mut self) -> RawStmt {
        let start = self.tok();
        if !self.expect(SyntaxKind::LBrace, "`{`") {
            return RawStmt::new(StmtKind::Block(Vec::new()), self.pos_from(&start));
        }
        let statements = self.parse_block_statements();
        self.expect(SyntaxKind::RBrace, "`}`");
        RawStmt::new(StmtKind::Block(statements), self.pos_from(&start))
    }

    fn parse_block_statements(&mut self) -> Vec<RawStmt> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at(SyntaxKind::RBrace) || self.at_eof() {
                break;
            }
            let before = self.pos;
            self.parse_statement_into(&mut statements);
            if self.pos == before {
                self.bump();
            }
        }
        statements
    }

    /// Parse a statement used as the body of a compound statement.
    fn parse_body_statement(&mut self) -> RawStmt {
        if self.at(SyntaxKind::LBrace) {
            return self.parse_block();
        }
        let start = self.tok();
        let mut statements = Vec::new();
        self.parse_statement_into(&mut statements);
        if statements.len() == 1 {
            if let Some(stmt) = statements.pop() {
                return stmt;
            }
        }
        RawStmt::new(StmtKind::Block(statements), self.pos_from(&start))
    }

    fn parse_statement_into(&mut self, out: &mut Vec<RawStmt>) {
        if self.enter() {
            self.parse_statement_inner(out);
        }
        self.leave();
    }

    fn parse_statement_inner(&mut self, out: &mut Vec<RawStmt>) {
        self.construct_start = self.pos;
        let mut labels = Vec::new();
        while self.at(SyntaxKind::Identifier) && self.nth(1) == SyntaxKind::Colon {
            let tok = self.bump();
            self.bump();
            labels.push(self.text(&tok).to_string());
        }
        let first = out.len();
        let start = self.tok();

        match start.kind {
            SyntaxKind::LBrace => out.push(self.parse_block()),
            SyntaxKind::IfKw => out.push(self.parse_if()),
            SyntaxKind::ForKw => out.push(self.parse_for()),
            SyntaxKind::WhileKw => {
                self.bump();
                let condition = self.parse_paren_condition();
                let body = Box::new(self.parse_body_statement());
                out.push(RawStmt::new(StmtKind::While { condition, body }, self.pos_from(&start)));
            }
            SyntaxKind::DoKw => {
                self.bump();
                let body = Box::new(self.parse_body_statement());
                self.skip_semicolons();
                self.expect(SyntaxKind::WhileKw, "`while`");
                let condition = self.parse_paren_condition();
                out.push(RawStmt::new(StmtKind::DoWhile { body, condition }, self.pos_from(&start)));
                self.finish_statement();
            }
            SyntaxKind::TryKw => out.push(self.parse_try()),
            SyntaxKind::SwitchKw => out.push(self.parse_switch()),
            SyntaxKind::SynchronizedKw if self.nth(1) == SyntaxKind::LParen => {
                self.bump();
                self.parse_paren_condition();
                out.push(self.parse_block());
            }
            SyntaxKind::ReturnKw => {
                self.bump();
                let value = (!self.at_stmt_end()).then(|| self.parse_expression());
                out.push(RawStmt::new(StmtKind::Return(value), self.pos_from(&start)));
                self.finish_statement();
            }
            SyntaxKind::BreakKw | SyntaxKind::ContinueKw => {
                self.bump();
                let label_tok = self.tok();
                let label = (label_tok.kind == SyntaxKind::Identifier && !label_tok.newline_before)
                    .then(|| {
                        self.bump();
                        self.text(&label_tok).to_string()
                    });
                let kind = if start.kind == SyntaxKind::BreakKw {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                };
                out.push(RawStmt::new(kind, self.pos_from(&start)));
                self.finish_statement();
            }
            SyntaxKind::ThrowKw => {
                self.bump();
                let expr = self.parse_expression();
                out.push(RawStmt::new(StmtKind::Throw(expr), self.pos_from(&start)));
                self.finish_statement();
            }
            SyntaxKind::AssertKw => {
                self.bump();
                let condition = self.parse_expression();
                let message = (self.eat(SyntaxKind::Colon) || self.eat(SyntaxKind::Comma))
                    .then(|| self.parse_expression());
                out.push(RawStmt::new(StmtKind::Assert { condition, message }, self.pos_from(&start)));
                self.finish_statement();
            }
            _ if self.at_type_decl_start(self.pos) => {
                self.error_here("local type declarations are not supported");
                self.parse_class();
            }
            _ if self.at_local_decl_start() => {
                self.parse_local_declaration(out);
                self.finish_statement();
            }
            _ => {
                let expr = self.parse_expression();
                let expr = if self.at_command_argument(&expr) {
                    self.parse_command_call(expr)
                } else {
                    expr
                };
                let pos = expr.pos;
                out.push(RawStmt::new(StmtKind::Expression(expr), pos));
                self.finish_statement();
            }
        }

        if let Some(stmt) = out.get_mut(first) {
            stmt.labels = labels;
        }
    }

    fn parse_paren_condition(&mut self) -> RawExpr {
        self.expect(SyntaxKind::LParen, "`(`");
        let expr = self.parse_expression();
        self.expect(SyntaxKind::RParen, "`)`");
        expr
    }

    fn parse_if(&mut self) -> RawStmt {
        let start = self.bump();
        let condition = self.parse_paren_condition();
        let then_branch = Box::new(self.parse_body_statement());
        let else_branch = if self.at_else() {
            self.skip_semicolons();
            self.bump();
            Some(Box::new(self.parse_body_statement()))
        } else {
            None
        };
        RawStmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            self.pos_from(&start),
        )
    }

    fn at_else(&self) -> bool {
        let mut idx = self.pos;
        while self.kind_at(idx) == SyntaxKind::Semicolon {
            idx += 1;
        }
        self.kind_at(idx) == SyntaxKind::ElseKw
    }

    fn parse_for(&mut self) -> RawStmt {
        let start = self.bump();
        self.expect(SyntaxKind::LParen, "`(`");

        if self.at_for_in_header() {
            let var_start = self.tok();
            let (_, annotations) = self.parse_modifiers_and_annotations();
            self.eat(SyntaxKind::DefKw);
            let typed = self
                .skip_type_at(self.pos)
                .is_some_and(|end| self.kind_at(end) == SyntaxKind::Identifier);
            let ty = typed.then(|| self.parse_type());
            let name_tok = self.tok();
            self.expect(SyntaxKind::Identifier, "a loop variable");
            let variable = RawParam {
                name: self.text(&name_tok).to_string(),
                ty,
                default: None,
                variadic: false,
                annotations,
                pos: self.pos_from(&var_start),
            };
            if !self.eat(SyntaxKind::InKw) {
                self.expect(SyntaxKind::Colon, "`in`");
            }
            let iterable = self.parse_expression();
            self.expect(SyntaxKind::RParen, "`)`");
            let body = Box::new(self.parse_body_statement());
            return RawStmt::new(
                StmtKind::ForIn {
                    variable,
                    iterable,
                    body,
                },
                self.pos_from(&start),
            );
        }

        let mut init = Vec::new();
        if !self.at(SyntaxKind::Semicolon) {
            if self.at_local_decl_start() {
                let mut decls = Vec::new();
                self.parse_local_declaration(&mut decls);
                init.extend(decls.into_iter().filter_map(|stmt| match stmt.kind {
                    StmtKind::Expression(expr) => Some(expr),
                    _ => None,
                }));
            } else {
                init = self.parse_expression_list(SyntaxKind::Semicolon);
            }
        }
        self.expect(SyntaxKind::Semicolon, "`;`");
        let condition = (!self.at(SyntaxKind::Semicolon)).then(|| self.parse_expression());
        self.expect(SyntaxKind::Semicolon, "`;`");
        let update = if self.at(SyntaxKind::RParen) {
            Vec::new()
        } else {
            self.parse_expression_list(SyntaxKind::RParen)
        };
        self.expect(SyntaxKind::RParen, "`)`");
        let body = Box::new(self.parse_body_statement());
        RawStmt::new(
            StmtKind::For {
                init,
                condition,
                update,
                body,
            },
            self.pos_from(&start),
        )
    }

    /// `for (x in xs)` / `for (T x : xs)`: an `in` or `:` appears before any
    /// `;` at paren depth zero.
    fn at_for_in_header(&self) -> bool {
        let mut idx = self.pos;
        let mut depth = 0u32;
        loop {
            match self.kind_at(idx) {
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace => depth += 1,
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                SyntaxKind::InKw | SyntaxKind::Colon if depth == 0 => return true,
                SyntaxKind::Semicolon | SyntaxKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
    }

    fn parse_expression_list(&mut self, terminator: SyntaxKind) -> Vec<RawExpr> {
        let mut exprs = Vec::new();
        while !self.at(terminator) && !self.at_eof() {
            exprs.push(self.parse_expression());
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        exprs
    }

    fn parse_try(&mut self) -> RawStmt {
        let start = self.bump();
        let body = Box::new(self.parse_block());
        let mut catches = Vec::new();
        while self.at(SyntaxKind::CatchKw) {
            let catch_start = self.bump();
            self.expect(SyntaxKind::LParen, "`(`");
            let param_start = self.tok();
            self.parse_modifiers_and_annotations();
            let mut types = Vec::new();
            if !(self.at(SyntaxKind::Identifier) && self.nth(1) == SyntaxKind::RParen) {
                types.push(self.parse_type());
                while self.eat(SyntaxKind::Pipe) {
                    types.push(self.parse_type());
                }
            }
            if types.is_empty() {
                types.push(TypeRef::new("Exception"));
            }
            let name_tok = self.tok();
            self.expect(SyntaxKind::Identifier, "an exception variable");
            let param_pos = self.pos_from(&param_start);
            self.expect(SyntaxKind::RParen, "`)`");
            let block = self.parse_block();
            let pos = self.pos_from(&catch_start);
            for ty in types {
                catches.push(RawCatch {
                    param: RawParam {
                        name: self.text(&name_tok).to_string(),
                        ty: Some(ty),
                        default: None,
                        variadic: false,
                        annotations: Vec::new(),
                        pos: param_pos,
                    },
                    body: block.clone(),
                    pos,
                });
            }
        }
        let finally = self
            .eat(SyntaxKind::FinallyKw)
            .then(|| Box::new(self.parse_block()));
        if catches.is_empty() && finally.is_none() {
            self.error_here("expected `catch` or `finally`");
        }
        RawStmt::new(
            StmtKind::Try {
                body,
                catches,
                finally,
            },
            self.pos_from(&start),
        )
    }

    fn parse_switch(&mut self) -> RawStmt {
        let start = self.bump();
        let subject = self.parse_paren_condition();
        let mut cases = Vec::new();
        let mut default = None;
        self.expect(SyntaxKind::LBrace, "`{`");
        while !self.at(SyntaxKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            self.skip_semicolons();
            let case_start = self.tok();
            match case_start.kind {
                SyntaxKind::CaseKw => {
                    self.bump();
                    let value = self.parse_expression();
                    self.expect(SyntaxKind::Colon, "`:`");
                    let body = self.parse_case_body();
                    cases.push(RawCase {
                        value,
                        body,
                        pos: self.pos_from(&case_start),
                    });
                }
                SyntaxKind::DefaultKw => {
                    self.bump();
                    self.expect(SyntaxKind::Colon, "`:`");
                    default = Some(self.parse_case_body());
                }
                SyntaxKind::RBrace => break,
                _ => {
                    self.error_here("expected `case` or `default`");
                    self.recover_statement();
                }
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(SyntaxKind::RBrace, "`}`");
        RawStmt::new(
            StmtKind::Switch {
                subject,
                cases,
                default,
            },
            self.pos_from(&start),
        )
    }

    fn parse_case_body(&mut self) -> Vec<RawStmt> {
        let mut body = Vec::new();
        loop {
            self.skip_semicolons();
            if matches!(
                self.current(),
                SyntaxKind::CaseKw | SyntaxKind::DefaultKw | SyntaxKind::RBrace | SyntaxKind::Eof
            ) {
                break;
            }
            let before = self.pos;
            self.parse_statement_into(&mut body);
            if self.pos == before {
                self.bump();
            }
        }
        body
    }

    fn at_local_decl_start(&self) -> bool {
        let kind = self.current();
        match kind {
            SyntaxKind::DefKw | SyntaxKind::VarKw | SyntaxKind::FinalKw => true,
            SyntaxKind::At => self.nth(1) != SyntaxKind::InterfaceKw,
            _ if kind.is_primitive_type() => self.nth(1) != SyntaxKind::Dot,
            SyntaxKind::Identifier => {
                let Some(end) = self.skip_type_at(self.pos) else {
                    return false;
                };
                if self.kind_at(end) != SyntaxKind::Identifier || self.tokens[end].newline_before {
                    return false;
                }
                let follower = self.nth_tok(end + 1 - self.pos);
                self.looks_like_type(self.pos, end)
                    && (follower.newline_before
                        || matches!(
                            follower.kind,
                            SyntaxKind::Eq
                                | SyntaxKind::Comma
                                | SyntaxKind::Semicolon
                                | SyntaxKind::RBrace
                                | SyntaxKind::RParen
                                | SyntaxKind::Eof
                        ))
            }
            _ => false,
        }
    }

    fn parse_local_declaration(&mut self, out: &mut Vec<RawStmt>) {
        let start = self.tok();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations();
        let untyped = self.eat(SyntaxKind::DefKw)
            || self.eat(SyntaxKind::VarKw)
            || ((modifiers != Modifiers::empty() || !annotations.is_empty())
                && self.at(SyntaxKind::Identifier)
                && !self
                    .skip_type_at(self.pos)
                    .is_some_and(|end| self.kind_at(end) == SyntaxKind::Identifier));
        let ty = (!untyped).then(|| self.parse_type());

        if self.at(SyntaxKind::LParen) {
            self.error_here("multiple assignment declarations are not supported");
            self.recover_statement();
            return;
        }

        loop {
            let name_tok = self.tok();
            if !self.expect(SyntaxKind::Identifier, "a variable name") {
                self.recover_statement();
                return;
            }
            let variable = RawExpr::new(
                ExprClass::Variable,
                ExprData::Variable {
                    name: self.text(&name_tok).to_string(),
                    origin_type: ty.clone(),
                },
                self.pos_from(&name_tok),
            );
            let right = if self.eat(SyntaxKind::Eq) {
                self.parse_expression()
            } else {
                RawExpr::empty()
            };
            let pos = self.pos_from(&start);
            let decl = RawExpr::new(
                ExprClass::Declaration,
                ExprData::Binary(BinaryData {
                    left: Box::new(variable),
                    op: "=".to_string(),
                    right: Box::new(right),
                }),
                pos,
            );
            out.push(RawStmt::new(StmtKind::Expression(decl), pos));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
    }

    /// `println x`: a name followed on the same line by an argument.
    fn at_command_argument(&self, callee: &RawExpr) -> bool {
        if !matches!(callee.class, ExprClass::Variable | ExprClass::Property) {
            return false;
        }
        let tok = self.tok();
        !tok.newline_before
            && (tok.kind.is_number_literal()
                || matches!(
                    tok.kind,
                    SyntaxKind::Identifier
                        | SyntaxKind::StringLiteral
                        | SyntaxKind::GStringLiteral
                        | SyntaxKind::TrueKw
                        | SyntaxKind::FalseKw
                        | SyntaxKind::NullKw
                        | SyntaxKind::ThisKw
                        | SyntaxKind::NewKw
                ))
    }

    fn parse_command_call(&mut self, callee: RawExpr) -> RawExpr {
        let args = self.parse_call_arguments(None);
        let pos = self.span(callee.pos);
        let data = match callee.data {
            ExprData::Variable { name, .. } => ExprData::MethodCall {
                object: None,
                method: name,
                args,
                safe: false,
                spread: false,
            },
            ExprData::Property(property) => ExprData::MethodCall {
                object: Some(property.object),
                method: property.property,
                args,
                safe: property.safe,
                spread: property.spread,
            },
            other => return RawExpr::new(callee.class, other, callee.pos),
        };
        RawExpr::new(ExprClass::MethodCall, data, pos)
    }

    // --- Expressions ------------------------------------------------------

    pub(crate) fn parse_expression(&mut self) -> RawExpr {
        let expr = if self.enter() {
            self.parse_assignment()
        } else {
            RawExpr::empty()
        };
        self.leave();
        expr
    }

    fn parse_assignment(&mut self) -> RawExpr {
        let left = self.parse_ternary();
        let tok = self.tok();
        if !tok.kind.is_assignment() || tok.newline_before {
            return left;
        }
        if tok.kind == SyntaxKind::ElvisEq {
            self.require_parrot(&tok, "elvis assignments");
        }
        self.bump();
        let right = self.parse_assignment();
        let pos = self.span(left.pos);
        binary(left, self.text(&tok), right, pos)
    }

    fn parse_ternary(&mut self) -> RawExpr {
        let condition = self.parse_binary(1);
        match self.current() {
            SyntaxKind::Question => {
                self.bump();
                let true_expr = self.parse_ternary();
                self.expect(SyntaxKind::Colon, "`:`");
                let false_expr = self.parse_ternary();
                let pos = self.span(condition.pos);
                RawExpr::new(
                    ExprClass::Ternary,
                    ExprData::Ternary(TernaryData {
                        condition: Box::new(condition),
                        true_expr: Box::new(true_expr),
                        false_expr: Box::new(false_expr),
                    }),
                    pos,
                )
            }
            SyntaxKind::Elvis => {
                self.bump();
                let false_expr = self.parse_ternary();
                let pos = self.span(condition.pos);
                RawExpr::new(
                    ExprClass::Elvis,
                    ExprData::Ternary(TernaryData {
                        condition: Box::new(condition.clone()),
                        true_expr: Box::new(condition),
                        false_expr: Box::new(false_expr),
                    }),
                    pos,
                )
            }
            _ => condition,
        }
    }

    /// Current binary operator: `(level, operator text, token count)`.
    fn binary_operator(&self) -> Option<(u8, String, usize)> {
        let tok = self.tok();
        if tok.newline_before && !matches!(tok.kind, SyntaxKind::AmpAmp | SyntaxKind::PipePipe) {
            return None;
        }
        if tok.kind == SyntaxKind::Bang {
            let next = self.nth_tok(1);
            let adjacent = next.start == tok.end;
            return match next.kind {
                SyntaxKind::InKw if adjacent => Some((7, "!in".to_string(), 2)),
                SyntaxKind::InstanceofKw if adjacent => Some((7, "!instanceof".to_string(), 2)),
                _ => None,
            };
        }
        let level = match tok.kind {
            SyntaxKind::PipePipe => 1,
            SyntaxKind::AmpAmp => 2,
            SyntaxKind::Pipe => 3,
            SyntaxKind::Caret => 4,
            SyntaxKind::Amp => 5,
            SyntaxKind::EqEq
            | SyntaxKind::BangEq
            | SyntaxKind::EqEqEq
            | SyntaxKind::BangEqEq
            | SyntaxKind::Spaceship
            | SyntaxKind::RegexFind
            | SyntaxKind::RegexMatch => 6,
            SyntaxKind::Lt
            | SyntaxKind::LtEq
            | SyntaxKind::Gt
            | SyntaxKind::GtEq
            | SyntaxKind::InstanceofKw
            | SyntaxKind::InKw
            | SyntaxKind::AsKw => 7,
            SyntaxKind::LeftShift
            | SyntaxKind::RightShift
            | SyntaxKind::UnsignedRightShift
            | SyntaxKind::Range
            | SyntaxKind::RangeExclusive => 8,
            SyntaxKind::Plus | SyntaxKind::Minus => 9,
            SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => 10,
            _ => return None,
        };
        Some((level, self.text(&tok).to_string(), 1))
    }

    fn parse_binary(&mut self, min_level: u8) -> RawExpr {
        let mut left = self.parse_unary();
        while let Some((level, op, width)) = self.binary_operator() {
            if level < min_level {
                break;
            }
            let op_tok = self.tok();
            for _ in 0..width {
                self.bump();
            }
            match op.as_str() {
                "!in" | "!instanceof" | "===" | "!==" => {
                    self.require_parrot(&op_tok, &format!("`{op}` operators"))
                }
                _ => {}
            }
            left = match op.as_str() {
                "instanceof" | "!instanceof" => {
                    let ty_start = self.tok();
                    let ty = self.parse_type();
                    let class_expr =
                        RawExpr::new(ExprClass::Class, ExprData::Class(ty), self.pos_from(&ty_start));
                    let pos = self.span(left.pos);
                    binary(left, &op, class_expr, pos)
                }
                "as" => {
                    let ty = self.parse_type();
                    let pos = self.span(left.pos);
                    RawExpr::new(
                        ExprClass::Cast,
                        ExprData::Cast {
                            ty,
                            expr: Box::new(left),
                            coerce: true,
                        },
                        pos,
                    )
                }
                ".." | "..<" => {
                    let right = self.parse_binary(level + 1);
                    let pos = self.span(left.pos);
                    RawExpr::new(
                        ExprClass::Range,
                        ExprData::Range {
                            from: Box::new(left),
                            to: Box::new(right),
                            inclusive: op == "..",
                        },
                        pos,
                    )
                }
                _ => {
                    let right = self.parse_binary(level + 1);
                    let pos = self.span(left.pos);
                    binary(left, &op, right, pos)
                }
            };
        }
        left
    }

    fn parse_unary(&mut self) -> RawExpr {
        let expr = if self.enter() {
            self.parse_unary_inner()
        } else {
            RawExpr::empty()
        };
        self.leave();
        expr
    }

    fn parse_unary_inner(&mut self) -> RawExpr {
        let start = self.tok();
        let class = match start.kind {
            SyntaxKind::Minus if self.nth(1).is_number_literal() && self.nth_tok(1).start == start.end => {
                self.bump();
                let literal = self.bump();
                let text = format!("-{}", self.text(&literal));
                let value = self.number_value(&literal, &text);
                return RawExpr::new(ExprClass::Constant, ExprData::Constant(value), self.pos_from(&start));
            }
            SyntaxKind::Minus => ExprClass::UnaryMinus,
            SyntaxKind::Plus => ExprClass::UnaryPlus,
            SyntaxKind::Bang => ExprClass::Not,
            SyntaxKind::Tilde => ExprClass::BitwiseNegation,
            SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                self.bump();
                let operand = self.parse_unary();
                return RawExpr::new(
                    ExprClass::Prefix,
                    ExprData::Increment {
                        op: self.text(&start).to_string(),
                        expr: Box::new(operand),
                    },
                    self.pos_from(&start),
                );
            }
            SyntaxKind::LParen if self.at_cast() => {
                self.bump();
                let ty = self.parse_type();
                self.expect(SyntaxKind::RParen, "`)`");
                let operand = self.parse_unary();
                return RawExpr::new(
                    ExprClass::Cast,
                    ExprData::Cast {
                        ty,
                        expr: Box::new(operand),
                        coerce: false,
                    },
                    self.pos_from(&start),
                );
            }
            _ => return self.parse_power(),
        };
        self.bump();
        let operand = self.parse_unary();
        RawExpr::new(class, ExprData::Unary(Box::new(operand)), self.pos_from(&start))
    }

    fn parse_power(&mut self) -> RawExpr {
        let base = self.parse_postfix();
        let tok = self.tok();
        if tok.kind != SyntaxKind::StarStar || tok.newline_before {
            return base;
        }
        self.bump();
        let exponent = self.parse_unary();
        let pos = self.span(base.pos);
        binary(base, "**", exponent, pos)
    }

    fn parse_postfix(&mut self) -> RawExpr {
        let mut expr = self.parse_primary();
        loop {
            let tok = self.tok();
            expr = match tok.kind {
                SyntaxKind::Dot | SyntaxKind::SafeDot | SyntaxKind::SpreadDot | SyntaxKind::AttributeDot => {
                    self.bump();
                    self.parse_member_access(expr, tok.kind)
                }
                SyntaxKind::MethodPointer | SyntaxKind::ColonColon => {
                    self.bump();
                    let name_tok = self.tok();
                    let method = if name_tok.kind.is_identifier_like() {
                        self.bump();
                        self.text(&name_tok).to_string()
                    } else {
                        self.error_here("expected a method name");
                        String::new()
                    };
                    let pos = self.span(expr.pos);
                    RawExpr::new(
                        ExprClass::MethodPointer,
                        ExprData::MethodPointer {
                            object: Box::new(expr),
                            method,
                        },
                        pos,
                    )
                }
                _ if tok.newline_before => break,
                SyntaxKind::LParen => {
                    self.bump();
                    let args = self.parse_call_arguments(Some(SyntaxKind::RParen));
                    self.expect(SyntaxKind::RParen, "`)`");
                    let pos = self.span(expr.pos);
                    let call = match expr.data {
                        ExprData::Variable { name, .. } => ExprData::MethodCall {
                            object: None,
                            method: name,
                            args,
                            safe: false,
                            spread: false,
                        },
                        _ => ExprData::MethodCall {
                            object: Some(Box::new(expr)),
                            method: "call".to_string(),
                            args,
                            safe: false,
                            spread: false,
                        },
                    };
                    RawExpr::new(ExprClass::MethodCall, call, pos)
                }
                SyntaxKind::LBrace if matches!(expr.class, ExprClass::MethodCall | ExprClass::Variable) => {
                    let closure = self.parse_closure();
                    self.append_closure_argument(expr, closure)
                }
                SyntaxKind::LBracket | SyntaxKind::SafeIndex => {
                    if tok.kind == SyntaxKind::SafeIndex {
                        self.require_parrot(&tok, "safe index operators");
                    }
                    self.bump();
                    let index_start = self.tok();
                    let mut items = self.parse_expression_list(SyntaxKind::RBracket);
                    let index = if items.len() == 1 {
                        items.pop().unwrap_or_else(RawExpr::empty)
                    } else {
                        RawExpr::new(ExprClass::List, ExprData::List(items), self.pos_from(&index_start))
                    };
                    self.expect(SyntaxKind::RBracket, "`]`");
                    let pos = self.span(expr.pos);
                    let op = if tok.kind == SyntaxKind::SafeIndex { "?[" } else { "[" };
                    binary(expr, op, index, pos)
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    self.bump();
                    let pos = self.span(expr.pos);
                    RawExpr::new(
                        ExprClass::Postfix,
                        ExprData::Increment {
                            op: self.text(&tok).to_string(),
                            expr: Box::new(expr),
                        },
                        pos,
                    )
                }
                _ => break,
            };
        }
        expr
    }

    fn parse_member_access(&mut self, object: RawExpr, via: SyntaxKind) -> RawExpr {
        let name_tok = self.tok();
        let name = match name_tok.kind {
            SyntaxKind::StringLiteral => literals::unescape_string(self.text(&name_tok)).unwrap_or_default(),
            kind if kind.is_identifier_like() => self.text(&name_tok).to_string(),
            _ => {
                self.error_here("expected a member name");
                return object;
            }
        };
        self.bump();
        let safe = via == SyntaxKind::SafeDot;
        let spread = via == SyntaxKind::SpreadDot;

        let next = self.tok();
        if via != SyntaxKind::AttributeDot && !next.newline_before && next.kind == SyntaxKind::LParen {
            self.bump();
            let args = self.parse_call_arguments(Some(SyntaxKind::RParen));
            self.expect(SyntaxKind::RParen, "`)`");
            let pos = self.span(object.pos);
            return RawExpr::new(
                ExprClass::MethodCall,
                ExprData::MethodCall {
                    object: Some(Box::new(object)),
                    method: name,
                    args,
                    safe,
                    spread,
                },
                pos,
            );
        }
        if via != SyntaxKind::AttributeDot && !next.newline_before && next.kind == SyntaxKind::LBrace {
            let closure = self.parse_closure();
            let pos = self.span(object.pos);
            return RawExpr::new(
                ExprClass::MethodCall,
                ExprData::MethodCall {
                    object: Some(Box::new(object)),
                    method: name,
                    args: vec![closure],
                    safe,
                    spread,
                },
                pos,
            );
        }

        let class = if via == SyntaxKind::AttributeDot {
            ExprClass::Attribute
        } else {
            ExprClass::Property
        };
        let pos = self.span(object.pos);
        RawExpr::new(
            class,
            ExprData::Property(PropertyData {
                object: Box::new(object),
                property: name,
                safe,
                spread,
            }),
            pos,
        )
    }

    fn append_closure_argument(&mut self, callee: RawExpr, closure: RawExpr) -> RawExpr {
        let pos = self.span(callee.pos);
        let data = match callee.data {
            ExprData::MethodCall {
                object,
                method,
                mut args,
                safe,
                spread,
            } => {
                args.push(closure);
                ExprData::MethodCall {
                    object,
                    method,
                    args,
                    safe,
                    spread,
                }
            }
            ExprData::Variable { name, .. } => ExprData::MethodCall {
                object: None,
                method: name,
                args: vec![closure],
                safe: false,
                spread: false,
            },
            other => return RawExpr::new(callee.class, other, callee.pos),
        };
        RawExpr::new(ExprClass::MethodCall, data, pos)
    }

    /// Arguments up to `close` (or the end of the statement for command
    /// calls). Named arguments are collected into a leading map.
    fn parse_call_arguments(&mut self, close: Option<SyntaxKind>) -> Vec<RawExpr> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut named_start: Option<SourcePos> = None;
        loop {
            let done = match close {
                Some(kind) => self.at(kind),
                None => self.at_stmt_end(),
            };
            if done || self.at_eof() {
                break;
            }
            if self.at_named_argument() {
                let entry = self.parse_map_entry();
                named_start.get_or_insert(entry.pos);
                named.push(entry);
            } else if self.at(SyntaxKind::Star) && self.nth(1) == SyntaxKind::Colon {
                let start = self.bump();
                self.bump();
                let value = self.parse_expression();
                named_start.get_or_insert(self.pos_from(&start));
                named.push(RawExpr::new(
                    ExprClass::SpreadMap,
                    ExprData::Unary(Box::new(value)),
                    self.pos_from(&start),
                ));
            } else if self.at(SyntaxKind::Star) {
                let start = self.bump();
                let value = self.parse_expression();
                positional.push(RawExpr::new(
                    ExprClass::Spread,
                    ExprData::Unary(Box::new(value)),
                    self.pos_from(&start),
                ));
            } else {
                positional.push(self.parse_expression());
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        if let Some(start) = named_start {
            let pos = self.span(start);
            positional.insert(0, RawExpr::new(ExprClass::Map, ExprData::Map(named), pos));
        }
        positional
    }

    fn at_named_argument(&self) -> bool {
        let kind = self.current();
        (kind.is_identifier_like() || kind == SyntaxKind::StringLiteral || kind.is_number_literal())
            && self.nth(1) == SyntaxKind::Colon
    }

    fn parse_map_entry(&mut self) -> RawExpr {
        let start = self.tok();
        let key = if start.kind.is_identifier_like() {
            self.bump();
            RawExpr::new(
                ExprClass::Constant,
                ExprData::Constant(ConstantValue::String(self.text(&start).to_string())),
                self.pos_from(&start),
            )
        } else {
            self.parse_primary()
        };
        self.expect(SyntaxKind::Colon, "`:`");
        let value = self.parse_expression();
        map_entry(key, value, self.pos_from(&start))
    }

    fn parse_primary(&mut self) -> RawExpr {
        let start = self.tok();
        let constant = |value| ExprData::Constant(value);
        match start.kind {
            kind if kind.is_number_literal() => {
                self.bump();
                let value = self.number_value(&start, self.text(&start));
                RawExpr::new(ExprClass::Constant, constant(value), self.pos_from(&start))
            }
            SyntaxKind::StringLiteral => {
                self.bump();
                let value = match literals::unescape_string(self.text(&start)) {
                    Ok(value) => value,
                    Err(err) => {
                        self.error_at(start, err.message);
                        String::new()
                    }
                };
                RawExpr::new(
                    ExprClass::Constant,
                    constant(ConstantValue::String(value)),
                    self.pos_from(&start),
                )
            }
            SyntaxKind::GStringLiteral => {
                self.bump();
                self.parse_gstring(start)
            }
            SyntaxKind::TrueKw | SyntaxKind::FalseKw => {
                self.bump();
                RawExpr::new(
                    ExprClass::Constant,
                    constant(ConstantValue::Boolean(start.kind == SyntaxKind::TrueKw)),
                    self.pos_from(&start),
                )
            }
            SyntaxKind::NullKw => {
                self.bump();
                RawExpr::new(ExprClass::Constant, constant(ConstantValue::Null), self.pos_from(&start))
            }
            SyntaxKind::ThisKw | SyntaxKind::SuperKw => {
                self.bump();
                variable(self.text(&start), self.pos_from(&start))
            }
            SyntaxKind::Identifier if self.nth(1) == SyntaxKind::Arrow => self.parse_lambda(),
            SyntaxKind::Identifier => {
                self.bump();
                variable(self.text(&start), self.pos_from(&start))
            }
            kind if kind.is_primitive_type() || kind == SyntaxKind::VoidKw => {
                let ty = self.parse_type();
                RawExpr::new(ExprClass::Class, ExprData::Class(ty), self.pos_from(&start))
            }
            SyntaxKind::LParen if self.at_lambda() => self.parse_lambda(),
            SyntaxKind::LParen => {
                self.bump();
                let expr = self.parse_expression();
                self.expect(SyntaxKind::RParen, "`)`");
                expr
            }
            SyntaxKind::LBracket => self.parse_list_or_map(),
            SyntaxKind::LBrace => self.parse_closure(),
            SyntaxKind::NewKw => self.parse_new(),
            SyntaxKind::Error => {
                // Already reported by the lexer.
                self.bump();
                RawExpr::empty()
            }
            SyntaxKind::RParen
            | SyntaxKind::RBracket
            | SyntaxKind::RBrace
            | SyntaxKind::Semicolon
            | SyntaxKind::Eof => {
                self.error_here("unexpected token");
                RawExpr::empty()
            }
            _ => {
                self.error_here("unexpected token");
                self.bump();
                RawExpr::empty()
            }
        }
    }

    fn number_value(&mut self, tok: &Token, text: &str) -> ConstantValue {
        match literals::parse_number(tok.kind, text) {
            Ok(value) => value,
            Err(err) => {
                self.error_at(*tok, err.message);
                ConstantValue::Integer(0)
            }
        }
    }

    fn parse_gstring(&mut self, tok: Token) -> RawExpr {
        let text = self.text(&tok);
        let quote_len = if text.starts_with("\"\"\"") { 3 } else { 1 };
        let body = literals::strip_quotes(text).unwrap_or_default();
        let mut strings = Vec::new();
        let mut values = Vec::new();
        for part in literals::split_gstring(body) {
            match part {
                GStringPart::Text(raw) => {
                    let value = match literals::unescape(&raw) {
                        Ok(value) => value,
                        Err(err) => {
                            self.error_at(tok, err.message);
                            raw
                        }
                    };
                    strings.push(value);
                }
                GStringPart::Value { source, offset } => {
                    let (line, column) = advance_position(
                        tok.line,
                        tok.column,
                        &text[..quote_len + offset],
                        self.config.tab_size,
                    );
                    values.push(self.parse_interpolation(&source, line, column));
                }
            }
        }
        RawExpr::new(
            ExprClass::GString,
            ExprData::GString {
                verbatim: body.to_string(),
                strings,
                values,
            },
            self.pos_from(&tok),
        )
    }

    fn parse_interpolation(&mut self, source: &str, line: u32, column: u32) -> RawExpr {
        if source.trim().is_empty() {
            let pos = SourcePos::new(line, column, line, column);
            return RawExpr::new(ExprClass::Constant, ExprData::Constant(ConstantValue::Null), pos);
        }
        let mut inner = Parser::at_offset(source, self.config, line, column, self.depth);
        let expr = inner.parse_expression();
        if !inner.at_eof() {
            inner.error_here("unexpected token in string interpolation");
        }
        for message in inner.messages {
            match message {
                Message::Syntax(err) => self.push_error(err),
                other => {
                    self.messages.push(other);
                    self.error_count += 1;
                    self.abort();
                }
            }
        }
        expr
    }

    fn parse_list_or_map(&mut self) -> RawExpr {
        let start = self.bump();
        if self.at(SyntaxKind::Colon) && self.nth(1) == SyntaxKind::RBracket {
            self.bump();
            self.bump();
            return RawExpr::new(ExprClass::Map, ExprData::Map(Vec::new()), self.pos_from(&start));
        }

        let mut elements = Vec::new();
        let mut entries = Vec::new();
        while !self.at(SyntaxKind::RBracket) && !self.at_eof() {
            let item_start = self.tok();
            if self.at(SyntaxKind::Star) && self.nth(1) == SyntaxKind::Colon {
                self.bump();
                self.bump();
                let value = self.parse_expression();
                entries.push(RawExpr::new(
                    ExprClass::SpreadMap,
                    ExprData::Unary(Box::new(value)),
                    self.pos_from(&item_start),
                ));
            } else if self.at_named_argument() {
                entries.push(self.parse_map_entry());
            } else if self.at(SyntaxKind::Star) {
                self.bump();
                let value = self.parse_expression();
                elements.push(RawExpr::new(
                    ExprClass::Spread,
                    ExprData::Unary(Box::new(value)),
                    self.pos_from(&item_start),
                ));
            } else {
                let value = self.parse_expression();
                if self.eat(SyntaxKind::Colon) {
                    let mapped = self.parse_expression();
                    entries.push(map_entry(value, mapped, self.pos_from(&item_start)));
                } else {
                    elements.push(value);
                }
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RBracket, "`]`");
        let pos = self.pos_from(&start);
        if !entries.is_empty() {
            if !elements.is_empty() {
                self.error_at(start, "list and map entries cannot be mixed");
            }
            return RawExpr::new(ExprClass::Map, ExprData::Map(entries), pos);
        }
        RawExpr::new(ExprClass::List, ExprData::List(elements), pos)
    }

    fn parse_closure(&mut self) -> RawExpr {
        let start = self.bump();
        let params = if self.closure_has_params() {
            let params = self.parse_params(SyntaxKind::Arrow);
            self.expect(SyntaxKind::Arrow, "`->`");
            Some(params)
        } else {
            None
        };
        let statements = self.parse_block_statements();
        self.expect(SyntaxKind::RBrace, "`}`");
        let pos = self.pos_from(&start);
        RawExpr::new(
            ExprClass::Closure,
            ExprData::Closure(ClosureData {
                params,
                body: Box::new(RawStmt::new(StmtKind::Block(statements), pos)),
            }),
            pos,
        )
    }

    /// Scan a closure header: only parameter-ish tokens before a `->`.
    fn closure_has_params(&self) -> bool {
        let mut idx = self.pos;
        loop {
            let kind = self.kind_at(idx);
            match kind {
                SyntaxKind::Arrow => return true,
                SyntaxKind::Identifier
                | SyntaxKind::Comma
                | SyntaxKind::Dot
                | SyntaxKind::Lt
                | SyntaxKind::Gt
                | SyntaxKind::RightShift
                | SyntaxKind::LBracket
                | SyntaxKind::RBracket
                | SyntaxKind::Question
                | SyntaxKind::Ellipsis
                | SyntaxKind::DefKw
                | SyntaxKind::FinalKw => {}
                _ if kind.is_primitive_type() => {}
                _ => return false,
            }
            idx += 1;
        }
    }

    fn at_lambda(&self) -> bool {
        self.skip_balanced(self.pos)
            .is_some_and(|end| self.kind_at(end) == SyntaxKind::Arrow)
    }

    fn parse_lambda(&mut self) -> RawExpr {
        let start = self.tok();
        self.require_parrot(&start, "lambda expressions");
        let params = if self.eat(SyntaxKind::LParen) {
            let params = self.parse_params(SyntaxKind::RParen);
            self.expect(SyntaxKind::RParen, "`)`");
            params
        } else {
            let name_tok = self.bump();
            vec![RawParam {
                name: self.text(&name_tok).to_string(),
                ty: None,
                default: None,
                variadic: false,
                annotations: Vec::new(),
                pos: self.pos_from(&name_tok),
            }]
        };
        self.expect(SyntaxKind::Arrow, "`->`");
        let body = if self.at(SyntaxKind::LBrace) {
            self.parse_block()
        } else {
            let expr = self.parse_expression();
            let pos = expr.pos;
            RawStmt::new(
                StmtKind::Block(vec![RawStmt::new(StmtKind::Expression(expr), pos)]),
                pos,
            )
        };
        RawExpr::new(
            ExprClass::Lambda,
            ExprData::Closure(ClosureData {
                params: Some(params),
                body: Box::new(body),
            }),
            self.pos_from(&start),
        )
    }

    fn parse_new(&mut self) -> RawExpr {
        let start = self.bump();
        let ty = self.parse_type();

        if ty.dimensions > 0 || self.at(SyntaxKind::LBracket) {
            let mut element_type = ty.clone();
            let mut sizes = Vec::new();
            while self.at(SyntaxKind::LBracket) {
                self.bump();
                if self.eat(SyntaxKind::RBracket) {
                    element_type.dimensions += 1;
                    continue;
                }
                sizes.push(self.parse_expression());
                self.expect(SyntaxKind::RBracket, "`]`");
            }
            let initializer = if self.at(SyntaxKind::LBrace) {
                self.bump();
                let items = self.parse_expression_list(SyntaxKind::RBrace);
                self.expect(SyntaxKind::RBrace, "`}`");
                element_type.dimensions = element_type.dimensions.saturating_sub(1);
                Some(items)
            } else {
                None
            };
            return RawExpr::new(
                ExprClass::Array,
                ExprData::Array {
                    element_type,
                    sizes,
                    initializer,
                },
                self.pos_from(&start),
            );
        }

        let args = if self.eat(SyntaxKind::LParen) {
            let args = self.parse_call_arguments(Some(SyntaxKind::RParen));
            self.expect(SyntaxKind::RParen, "`)`");
            args
        } else {
            self.error_here("expected `(`");
            Vec::new()
        };
        if self.at(SyntaxKind::LBrace) && !self.tok().newline_before {
            // Anonymous class body; its members are not modelled.
            let mut anonymous = anonymous_class(&ty.name);
            self.parse_class_body(&mut anonymous);
        }
        RawExpr::new(
            ExprClass::ConstructorCall,
            ExprData::ConstructorCall { ty, args },
            self.pos_from(&start),
        )
    }

    // --- Lookahead --------------------------------------------------------

    fn kind_at(&self, idx: usize) -> SyntaxKind {
        self.tokens.get(idx).map_or(SyntaxKind::Eof, |tok| tok.kind)
    }

    fn looks_like_type(&self, start: usize, end: usize) -> bool {
        if end > start + 1 || self.kind_at(start).is_primitive_type() {
            return true;
        }
        self.tokens
            .get(start)
            .and_then(|tok| self.text(tok).chars().next())
            .is_some_and(char::is_uppercase)
    }

    /// Index just past a type starting at `idx`, if one is there.
    fn skip_type_at(&self, idx: usize) -> Option<usize> {
        let kind = self.kind_at(idx);
        let mut i = idx + 1;
        if kind == SyntaxKind::Identifier {
            while self.kind_at(i) == SyntaxKind::Dot && self.kind_at(i + 1) == SyntaxKind::Identifier {
                i += 2;
            }
            if self.kind_at(i) == SyntaxKind::Lt {
                i = self.skip_type_args_at(i)?;
            }
        } else if !(kind.is_primitive_type() || kind == SyntaxKind::VoidKw) {
            return None;
        }
        while self.kind_at(i) == SyntaxKind::LBracket && self.kind_at(i + 1) == SyntaxKind::RBracket {
            i += 2;
        }
        Some(i)
    }

    fn skip_type_args_at(&self, idx: usize) -> Option<usize> {
        let mut depth: i32 = 0;
        let mut i = idx;
        loop {
            let kind = self.kind_at(i);
            match kind {
                SyntaxKind::Lt => depth += 1,
                SyntaxKind::Gt => depth -= 1,
                SyntaxKind::RightShift => depth -= 2,
                SyntaxKind::UnsignedRightShift => depth -= 3,
                SyntaxKind::Identifier
                | SyntaxKind::Dot
                | SyntaxKind::Comma
                | SyntaxKind::Question
                | SyntaxKind::ExtendsKw
                | SyntaxKind::SuperKw
                | SyntaxKind::LBracket
                | SyntaxKind::RBracket
                | SyntaxKind::Amp => {}
                _ if kind.is_primitive_type() => {}
                _ => return None,
            }
            i += 1;
            if depth <= 0 {
                return Some(i);
            }
        }
    }

    /// Index just past the bracket group opening at `idx`.
    fn skip_balanced(&self, idx: usize) -> Option<usize> {
        let mut depth = 0u32;
        let mut i = idx;
        loop {
            match self.kind_at(i) {
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace => depth += 1,
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                SyntaxKind::Eof => return None,
                _ => {}
            }
            i += 1;
        }
    }

    fn skip_modifiers_at(&self, idx: usize) -> usize {
        let mut i = idx;
        loop {
            let kind = self.kind_at(i);
            if kind.is_modifier() {
                i += 1;
            } else if kind == SyntaxKind::At && self.kind_at(i + 1) != SyntaxKind::InterfaceKw {
                i += 1;
                if self.kind_at(i).is_identifier_like() {
                    i += 1;
                }
                while self.kind_at(i) == SyntaxKind::Dot && self.kind_at(i + 1).is_identifier_like() {
                    i += 2;
                }
                if self.kind_at(i) == SyntaxKind::LParen {
                    match self.skip_balanced(i) {
                        Some(end) => i = end,
                        None => return i,
                    }
                }
            } else {
                return i;
            }
        }
    }

    fn at_type_decl_start(&self, idx: usize) -> bool {
        let i = self.skip_modifiers_at(idx);
        match self.kind_at(i) {
            SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::EnumKw | SyntaxKind::TraitKw => true,
            SyntaxKind::At => self.kind_at(i + 1) == SyntaxKind::InterfaceKw,
            _ => false,
        }
    }

    /// `def foo() {`, `String foo(x) {`, `static main(args) {` at script level.
    fn at_script_method_start(&self) -> bool {
        let mut i = self.skip_modifiers_at(self.pos);
        let has_prefix = i > self.pos;
        let name_at = if self.kind_at(i) == SyntaxKind::DefKw {
            i += 1;
            if self.kind_at(i) == SyntaxKind::Lt {
                match self.skip_type_args_at(i) {
                    Some(end) => i = end,
                    None => return false,
                }
            }
            i
        } else if has_prefix && self.kind_at(i) == SyntaxKind::Identifier && self.kind_at(i + 1) == SyntaxKind::LParen {
            i
        } else {
            match self.skip_type_at(i) {
                Some(end) if self.kind_at(end) == SyntaxKind::Identifier => end,
                _ => return false,
            }
        };
        let name_kind = self.kind_at(name_at);
        if !(name_kind.is_identifier_like() || name_kind == SyntaxKind::StringLiteral)
            || self.kind_at(name_at + 1) != SyntaxKind::LParen
        {
            return false;
        }
        self.skip_balanced(name_at + 1)
            .is_some_and(|end| matches!(self.kind_at(end), SyntaxKind::LBrace | SyntaxKind::ThrowsKw))
    }

    fn at_cast(&self) -> bool {
        let Some(end) = self.skip_type_at(self.pos + 1) else {
            return false;
        };
        if self.kind_at(end) != SyntaxKind::RParen {
            return false;
        }
        let primitive = self.kind_at(self.pos + 1).is_primitive_type();
        if !primitive && !self.looks_like_type(self.pos + 1, end) {
            return false;
        }
        let next = self.kind_at(end + 1);
        next.is_number_literal()
            || matches!(
                next,
                SyntaxKind::Identifier
                    | SyntaxKind::StringLiteral
                    | SyntaxKind::GStringLiteral
                    | SyntaxKind::LParen
                    | SyntaxKind::NewKw
                    | SyntaxKind::ThisKw
                    | SyntaxKind::SuperKw
                    | SyntaxKind::TrueKw
                    | SyntaxKind::FalseKw
                    | SyntaxKind::NullKw
                    | SyntaxKind::Bang
                    | SyntaxKind::Tilde
            )
            || (primitive && matches!(next, SyntaxKind::Minus | SyntaxKind::Plus))
    }

    // --- Token plumbing ---------------------------------------------------

    fn current(&self) -> SyntaxKind {
        self.kind_at(self.pos)
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.kind_at(self.pos + n)
    }

    fn tok(&self) -> Token {
        self.nth_tok(0)
    }

    fn nth_tok(&self, n: usize) -> Token {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[(self.pos + n).min(last)]
    }

    fn text(&self, tok: &Token) -> &'a str {
        tok.text(self.input)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(SyntaxKind::Eof)
    }

    fn at_stmt_end(&self) -> bool {
        let tok = self.tok();
        tok.newline_before
            || matches!(
                tok.kind,
                SyntaxKind::Semicolon | SyntaxKind::RBrace | SyntaxKind::Eof | SyntaxKind::ElseKw
            )
    }

    fn bump(&mut self) -> Token {
        let tok = self.tok();
        if tok.kind != SyntaxKind::Eof {
            self.pos += 1;
            self.last_end = (tok.end_line, tok.end_column);
        }
        tok
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_here(&format!("expected {what}"));
        false
    }

    fn skip_semicolons(&mut self) {
        while self.eat(SyntaxKind::Semicolon) {}
    }

    fn finish_statement(&mut self) {
        if self.eat(SyntaxKind::Semicolon) || self.at_stmt_end() {
            return;
        }
        self.error_here("unexpected token");
        self.recover_statement();
    }

    /// Skip to the end of the current line, a `;` or a closing brace.
    fn recover_statement(&mut self) {
        let start = self.pos;
        while !self.at_eof() {
            if self.eat(SyntaxKind::Semicolon) {
                break;
            }
            if self.at(SyntaxKind::RBrace) || (self.pos > start && self.tok().newline_before) {
                break;
            }
            self.bump();
        }
    }

    fn pos_from(&self, start: &Token) -> SourcePos {
        let (last_line, last_column) = if self.last_end < (start.line, start.column) {
            (start.end_line, start.end_column)
        } else {
            self.last_end
        };
        SourcePos::new(start.line, start.column, last_line, last_column)
    }

    fn span(&self, from: SourcePos) -> SourcePos {
        SourcePos {
            last_line: self.last_end.0 as i32,
            last_column: self.last_end.1 as i32,
            ..from
        }
    }

    fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth <= MAX_NESTING_DEPTH {
            return true;
        }
        if !self.aborted {
            self.messages.push(Message::Exception {
                message: format!("nesting depth exceeds {MAX_NESTING_DEPTH}"),
            });
            self.error_count += 1;
            self.abort();
        }
        false
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn require_parrot(&mut self, tok: &Token, feature: &str) {
        let level = self.config.language_level;
        if !level.supports_parrot_syntax() {
            self.error_at(*tok, format!("{feature} require language level 3.0 or later (configured: {level})"));
        }
    }

    fn warn(&mut self, tok: &Token, message: String) {
        self.warnings.push(Warning {
            message,
            line: tok.line,
            column: tok.column,
        });
    }

    /// Report at the current token. When a statement or member breaks off
    /// at the end of a line, the error belongs to that line: the token on the
    /// next line is not part of it.
    fn error_here(&mut self, message: &str) {
        let tok = self.tok();
        let found = if tok.kind == SyntaxKind::Eof {
            "end of input".to_string()
        } else {
            format!("`{}`", self.text(&tok))
        };
        let message = format!("{message}, found {found}");
        if tok.newline_before && self.pos > self.construct_start {
            let (line, column) = self.last_end;
            self.push_error(SyntaxError {
                message,
                line,
                column,
                end_line: line,
                end_column: column,
            });
        } else {
            self.error_at(tok, message);
        }
    }

    fn error_at(&mut self, tok: Token, message: impl Into<String>) {
        self.push_error(SyntaxError {
            message: message.into(),
            line: tok.line,
            column: tok.column,
            end_line: tok.end_line,
            end_column: tok.end_column,
        });
    }

    fn push_error(&mut self, error: SyntaxError) {
        if self.aborted {
            return;
        }
        // A token the parser cannot consume is seen again by the caller.
        if let Some(Message::Syntax(previous)) = self.messages.last() {
            if (previous.line, previous.column) == (error.line, error.column) {
                return;
            }
        }
        self.messages.push(Message::Syntax(error));
        self.error_count += 1;
        if self.error_count >= self.config.tolerance.max(1) {
            self.abort();
        }
    }

    /// Stop parsing: every loop sees end of input from here on.
    fn abort(&mut self) {
        self.aborted = true;
        self.pos = self.tokens.len().saturating_sub(1);
    }
}

fn binary(left: RawExpr, op: &str, right: RawExpr, pos: SourcePos) -> RawExpr {
    RawExpr::new(
        ExprClass::Binary,
        ExprData::Binary(BinaryData {
            left: Box::new(left),
            op: op.to_string(),
            right: Box::new(right),
        }),
        pos,
    )
}

fn variable(name: &str, pos: SourcePos) -> RawExpr {
    RawExpr::new(
        ExprClass::Variable,
        ExprData::Variable {
            name: name.to_string(),
            origin_type: None,
        },
        pos,
    )
}

fn map_entry(key: RawExpr, value: RawExpr, pos: SourcePos) -> RawExpr {
    RawExpr::new(
        ExprClass::MapEntry,
        ExprData::MapEntry {
            key: Box::new(key),
            value: Box::new(value),
        },
        pos,
    )
}

fn anonymous_class(name: &str) -> RawClass {
    RawClass {
        name: name.to_string(),
        kind: ClassKind::Class,
        modifiers: Modifiers::empty(),
        generics: Vec::new(),
        superclass: None,
        interfaces: Vec::new(),
        fields: Vec::new(),
        constructors: Vec::new(),
        methods: Vec::new(),
        annotations: Vec::new(),
        is_script: false,
        pos: SourcePos::UNKNOWN,
    }
}

fn script_class(name: &str, statements: Vec<RawStmt>, mut methods: Vec<RawMethod>) -> RawClass {
    let positions: Vec<SourcePos> = statements
        .iter()
        .map(|s| s.pos)
        .chain(methods.iter().map(|m| m.pos))
        .filter(SourcePos::has_start)
        .collect();
    let class_pos = enclosing(&positions);
    let body_pos = enclosing(&statements.iter().map(|s| s.pos).collect::<Vec<_>>());

    methods.push(RawMethod {
        name: "run".to_string(),
        return_type: Some(TypeRef::new(OBJECT)),
        modifiers: Modifiers(Modifiers::PUBLIC),
        generics: Vec::new(),
        params: Vec::new(),
        throws: Vec::new(),
        body: Some(RawStmt::new(StmtKind::Block(statements), body_pos)),
        annotations: Vec::new(),
        pos: body_pos,
    });
    RawClass {
        name: name.to_string(),
        kind: ClassKind::Class,
        modifiers: Modifiers(Modifiers::PUBLIC),
        generics: Vec::new(),
        superclass: Some(TypeRef::new(SCRIPT_SUPERCLASS)),
        interfaces: Vec::new(),
        fields: Vec::new(),
        constructors: Vec::new(),
        methods,
        annotations: Vec::new(),
        is_script: true,
        pos: class_pos,
    }
}

fn enclosing(positions: &[SourcePos]) -> SourcePos {
    let known = positions.iter().filter(|p| p.has_start());
    let start = known.clone().min_by_key(|p| (p.line, p.column));
    let end = known.max_by_key(|p| (p.last_line, p.last_column));
    match (start, end) {
        (Some(start), Some(end)) => SourcePos {
            line: start.line,
            column: start.column,
            last_line: end.last_line,
            last_column: end.last_column,
        },
        _ => SourcePos::UNKNOWN,
    }
}
