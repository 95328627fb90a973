//! Comment extraction and doc-comment attachment.
//!
//! Extraction works on the source text alone; the raw tree carries no
//! comments. Attachment walks declarations in source order with a single
//! cursor: every comment between the cursor and a declaration belongs to
//! that declaration, the last one as its doc comment and the rest as
//! orphans.

use groovy_core::{Position, Range};

use crate::node::{Ast, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comment {
    Line { content: String, range: Range },
    Block { content: String, range: Range },
    Javadoc { content: String, range: Range },
}

impl Comment {
    /// Text between the delimiters.
    pub fn content(&self) -> &str {
        match self {
            Comment::Line { content, .. }
            | Comment::Block { content, .. }
            | Comment::Javadoc { content, .. } => content,
        }
    }

    pub fn range(&self) -> Range {
        match self {
            Comment::Line { range, .. }
            | Comment::Block { range, .. }
            | Comment::Javadoc { range, .. } => *range,
        }
    }

    pub fn is_doc(&self) -> bool {
        matches!(self, Comment::Javadoc { .. })
    }
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    column: u32,
    tab_size: u32,
}

impl Scanner<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
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

    fn at(&self, text: &str) -> bool {
        self.chars.clone().take(text.chars().count()).eq(text.chars())
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn skip_string(&mut self, quote: char) {
        let triple: String = std::iter::repeat(quote).take(3).collect();
        if self.at(&triple) {
            self.bump_n(3);
            while self.peek().is_some() {
                if self.at(&triple) {
                    self.bump_n(3);
                    return;
                }
                if self.bump() == Some('\\') {
                    self.bump();
                }
            }
            return;
        }
        self.bump();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                return;
            }
            self.bump();
            if ch == '\\' {
                self.bump();
            } else if ch == quote {
                return;
            }
        }
    }
}

/// Collect every comment in `source`, in order, with 1-based ranges. Tabs
/// advance to the next multiple of `tab_size`, matching the front end.
pub fn extract_comments(source: &str, tab_size: u32) -> Vec<Comment> {
    let mut scanner = Scanner {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
        tab_size: tab_size.max(1),
    };
    let mut comments = Vec::new();
    while let Some(ch) = scanner.peek() {
        if scanner.at("//") {
            let begin = scanner.position();
            scanner.bump_n(2);
            let mut content = String::new();
            while let Some(ch) = scanner.peek() {
                if ch == '\n' || ch == '\r' {
                    break;
                }
                content.push(ch);
                scanner.bump();
            }
            comments.push(Comment::Line {
                content,
                range: Range::new(begin, scanner.position()),
            });
        } else if scanner.at("/*") {
            let begin = scanner.position();
            let doc = scanner.at("/**") && !scanner.at("/**/");
            scanner.bump_n(if doc { 3 } else { 2 });
            let mut content = String::new();
            while scanner.peek().is_some() && !scanner.at("*/") {
                if let Some(ch) = scanner.bump() {
                    content.push(ch);
                }
            }
            scanner.bump_n(2);
            let range = Range::new(begin, scanner.position());
            comments.push(if doc {
                Comment::Javadoc { content, range }
            } else {
                Comment::Block { content, range }
            });
        } else if ch == '"' || ch == '\'' {
            scanner.skip_string(ch);
        } else {
            scanner.bump();
        }
    }
    comments
}

/// Attaches comments to declarations in one document.
pub(crate) struct CommentAttacher<'a> {
    comments: &'a [Comment],
    next: usize,
    cursor: Position,
}

enum Item {
    Attach(NodeId),
    /// Consumes the comments before it without keeping them.
    Barrier,
}

impl<'a> CommentAttacher<'a> {
    fn new(comments: &'a [Comment], cursor: Position) -> Self {
        Self {
            comments,
            next: 0,
            cursor,
        }
    }

    fn walk(&mut self, ast: &mut Ast, mut items: Vec<(Range, Item)>) {
        items.sort_by_key(|(range, _)| range.begin);
        for (range, item) in items {
            let mut taken = Vec::new();
            while let Some(comment) = self.comments.get(self.next) {
                let comment_range = comment.range();
                if comment_range.end > range.begin {
                    break;
                }
                self.next += 1;
                if comment_range.begin >= self.cursor {
                    taken.push(comment.clone());
                }
            }
            if let (Item::Attach(id), Some(doc)) = (item, taken.pop()) {
                if let Some(node) = ast.get_mut(id) {
                    node.comment = Some(doc);
                    node.orphan_comments = taken;
                }
            }
            self.cursor = self.cursor.max(range.end);
        }
    }
}

/// Top-level pass over type declarations, then one pass per class body.
pub(crate) fn attach_comments(ast: &mut Ast, comments: &[Comment]) {
    if comments.is_empty() {
        return;
    }
    let types = ast.types().to_vec();
    let mut top_level = Vec::new();
    let mut classes = Vec::new();
    for id in types {
        let Some(NodeKind::Class {
            is_script, methods, ..
        }) = ast.kind(id)
        else {
            continue;
        };
        if !*is_script {
            if let Some(range) = ast.range(id) {
                top_level.push((range, Item::Attach(id)));
            }
            classes.push(id);
            continue;
        }
        // Script methods are written at the top level; the synthesized
        // `run` body only separates them.
        for &method in methods {
            let Some(range) = ast.range(method) else {
                continue;
            };
            if is_script_body(ast, method) {
                for stmt in block_statements(ast, method) {
                    if let Some(range) = ast.range(stmt) {
                        top_level.push((range, Item::Barrier));
                    }
                }
            } else {
                top_level.push((range, Item::Attach(method)));
            }
        }
    }
    CommentAttacher::new(comments, Position::new(1, 1)).walk(ast, top_level);

    for class in classes {
        attach_member_comments(ast, class, comments);
    }
}

/// Member pass scoped to one class body.
pub(crate) fn attach_member_comments(ast: &mut Ast, class: NodeId, comments: &[Comment]) {
    let Some(class_range) = ast.range(class) else {
        return;
    };
    let Some(NodeKind::Class {
        fields,
        constructors,
        methods,
        ..
    }) = ast.kind(class)
    else {
        return;
    };
    let members: Vec<(Range, Item)> = fields
        .iter()
        .chain(constructors)
        .chain(methods)
        .filter_map(|&id| Some((ast.range(id)?, Item::Attach(id))))
        .filter(|(range, _)| class_range.encloses(range))
        .collect();
    let inner: Vec<Comment> = comments
        .iter()
        .filter(|comment| class_range.encloses(&comment.range()))
        .cloned()
        .collect();
    CommentAttacher::new(&inner, class_range.begin).walk(ast, members);
}

fn is_script_body(ast: &Ast, method: NodeId) -> bool {
    matches!(
        ast.kind(method),
        Some(NodeKind::Method { name, params, .. }) if name == "run" && params.is_empty()
    )
}

fn block_statements(ast: &Ast, method: NodeId) -> Vec<NodeId> {
    let body = match ast.kind(method) {
        Some(NodeKind::Method { body: Some(body), .. }) => *body,
        _ => return Vec::new(),
    };
    match ast.kind(body) {
        Some(NodeKind::Block { statements }) => statements.clone(),
        _ => Vec::new(),
    }
}
