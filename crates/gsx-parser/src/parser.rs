//! Document parser for GSX.
//!
//! Parses the token stream from `gsx-lexer` into a [`File`] AST with one
//! token of lookahead (`current` and `peek`). Embedded Go is never
//! tokenized here: expressions are pulled from the lexer as raw text, and
//! statements, parameter types, loop iterables and `@if` conditions are
//! sliced out of the source by byte offsets once their extent is known.
//!
//! Uses recursive descent. Errors inside a body are recorded and parsing
//! resumes at the next node; errors in a declaration skip ahead to the next
//! top-level keyword.

use std::mem;

use gsx_lexer::{
    group_comments, Comment, CommentGroup, Diagnostics, Lexer, Position, Span, Token, TokenKind,
};
use tracing::{debug, trace};

use crate::ast::{
    AttrValue, Attribute, ChildrenSlot, Component, ComponentCall, DeclKind, Element, File,
    ForLoop, GoCode, GoDecl, GoExpr, GoFunc, IfStmt, Import, LetBinding, Node, Param, TextContent,
};
use crate::ParseError;

type ParseResult<T> = Result<T, ParseError>;

/// The outcome of parsing one file.
///
/// `file` is `None` only when the package clause is missing. Diagnostics
/// hold the parser's own errors followed by the lexer's.
#[derive(Debug)]
pub struct Parsed {
    pub file: Option<File>,
    pub diagnostics: Diagnostics,
}

impl Parsed {
    /// The file, unless any diagnostic is an error.
    pub fn into_result(self) -> Result<File, Diagnostics> {
        match self.file {
            Some(file) if !self.diagnostics.has_errors() => Ok(file),
            _ => Err(self.diagnostics),
        }
    }
}

enum TopLevel {
    Component(Component),
    Func(GoFunc),
    Decl(GoDecl),
}

/// A braced block: its nodes, the comment trailing the `{` line, and the
/// comments that attached to nothing.
struct Block {
    nodes: Vec<Node>,
    trailing: Option<CommentGroup>,
    orphans: Vec<CommentGroup>,
}

/// GSX document parser.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    peek: Token,
    diagnostics: Diagnostics,
    comments: Vec<Comment>,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>) -> Self {
        let mut parser = Self {
            lexer,
            current: Token::new(TokenKind::Eof, Span::default()),
            peek: Token::new(TokenKind::Eof, Span::default()),
            diagnostics: Diagnostics::new(),
            comments: Vec::new(),
        };
        parser.advance();
        parser.advance();
        parser
    }

    /// Parse a whole file.
    pub fn parse_file(mut self) -> Parsed {
        let position = self.position();
        self.skip_newlines();
        let leading_comments = self.leading_comments();

        let package = match self.parse_package() {
            Ok(package) => package,
            Err(err) => {
                self.record(err);
                return self.finish(None);
            }
        };
        let imports = self.parse_imports();

        let mut file = File {
            package,
            imports,
            components: Vec::new(),
            funcs: Vec::new(),
            decls: Vec::new(),
            position,
            leading_comments,
            orphan_comments: Vec::new(),
        };

        loop {
            self.skip_newlines();
            if self.at_eof() {
                break;
            }
            let leading = self.leading_comments();

            let result = match self.current.kind {
                TokenKind::AtComponent | TokenKind::Templ => {
                    self.parse_component().map(TopLevel::Component)
                }
                TokenKind::Func => self.parse_func(),
                TokenKind::Type | TokenKind::Const | TokenKind::Var => {
                    Ok(TopLevel::Decl(self.parse_go_decl()))
                }
                _ => Err(self.error(format!(
                    "unexpected token {}, expected @component, func, templ, type, const, or var",
                    self.current.kind
                ))),
            };

            match result {
                Ok(TopLevel::Component(mut component)) => {
                    component.leading_comments = leading;
                    file.components.push(component);
                }
                Ok(TopLevel::Func(mut func)) => {
                    func.leading_comments = leading;
                    file.funcs.push(func);
                }
                Ok(TopLevel::Decl(mut decl)) => {
                    decl.leading_comments = leading;
                    file.decls.push(decl);
                }
                Err(err) => {
                    self.record(err);
                    file.orphan_comments.extend(leading);
                    self.synchronize();
                }
            }
        }

        self.collect_comments();
        file.orphan_comments
            .extend(group_comments(mem::take(&mut self.comments)));

        debug!(
            package = %file.package,
            components = file.components.len(),
            funcs = file.funcs.len(),
            decls = file.decls.len(),
            "parsed file"
        );
        self.finish(Some(file))
    }

    fn finish(mut self, file: Option<File>) -> Parsed {
        self.diagnostics.extend(self.lexer.diagnostics());
        Parsed {
            file,
            diagnostics: self.diagnostics,
        }
    }

    // =========================================================================
    // Package and imports
    // =========================================================================

    fn parse_package(&mut self) -> ParseResult<String> {
        if !self.at(&TokenKind::Package) {
            return Err(self.error("expected package declaration"));
        }
        self.advance();
        let name = self.expect_ident("expected package name")?;
        self.skip_newlines();
        Ok(name)
    }

    fn parse_imports(&mut self) -> Vec<Import> {
        let mut imports = Vec::new();

        while self.at(&TokenKind::Import) {
            self.advance();
            if self.at(&TokenKind::LParen) {
                self.advance();
                self.skip_newlines();
                while !matches!(self.current.kind, TokenKind::RParen | TokenKind::Eof) {
                    match self.parse_import_spec() {
                        Ok(import) => imports.push(import),
                        Err(err) => {
                            self.record(err);
                            self.advance();
                        }
                    }
                    self.skip_newlines();
                }
                if let Err(err) = self.expect(TokenKind::RParen) {
                    self.record(err);
                }
            } else {
                match self.parse_import_spec() {
                    Ok(import) => imports.push(import),
                    Err(err) => self.record(err),
                }
            }
            self.skip_newlines();
        }

        imports
    }

    fn parse_import_spec(&mut self) -> ParseResult<Import> {
        let position = self.position();
        let alias = match &self.current.kind {
            TokenKind::Ident(alias) => Some(alias.clone()),
            TokenKind::Underscore => Some("_".to_string()),
            TokenKind::Dot => Some(".".to_string()),
            _ => None,
        };
        if alias.is_some() {
            self.advance();
        }

        let path = match &self.current.kind {
            TokenKind::String(path) | TokenKind::RawString(path) => path.clone(),
            _ => return Err(self.error("expected import path string")),
        };
        self.advance();

        Ok(Import {
            alias,
            path,
            position,
        })
    }

    // =========================================================================
    // Top-level declarations
    // =========================================================================

    /// `@component Name(params) { body }` or `templ Name(params) { body }`.
    fn parse_component(&mut self) -> ParseResult<Component> {
        let position = self.position();
        self.advance();
        let name = self.expect_ident("expected component name")?;
        let params = self.parse_params()?;
        self.skip_newlines();
        self.parse_component_body(name, params, position)
    }

    fn parse_component_body(
        &mut self,
        name: String,
        params: Vec<Param>,
        position: Position,
    ) -> ParseResult<Component> {
        let block = self.parse_block()?;
        debug!(component = %name, nodes = block.nodes.len(), "parsed component");

        Ok(Component {
            name,
            params,
            body: block.nodes,
            accepts_children: false,
            position,
            leading_comments: None,
            trailing_comments: block.trailing,
            orphan_comments: block.orphans,
        })
    }

    /// A `func` is a component when it returns `Element`. Anything else,
    /// methods included, is captured verbatim.
    fn parse_func(&mut self) -> ParseResult<TopLevel> {
        let position = self.position();
        let start = self.current.span.start;
        self.advance();

        if self.at(&TokenKind::LParen) {
            return Ok(TopLevel::Func(self.capture_func(start, position)));
        }

        let name = self.expect_ident("expected function name")?;
        let params = self.parse_params()?;

        if matches!(&self.current.kind, TokenKind::Ident(ty) if ty == "Element") {
            self.advance();
            self.skip_newlines();
            return self
                .parse_component_body(name, params, position)
                .map(TopLevel::Component);
        }

        Ok(TopLevel::Func(self.capture_func(start, position)))
    }

    /// Capture a function's source from `start` through its closing brace.
    fn capture_func(&mut self, start: usize, position: Position) -> GoFunc {
        let mut parens = 0i32;
        let mut braces = 0i32;
        let mut opened = false;

        while !self.at_eof() {
            match self.current.kind {
                TokenKind::LParen => parens += 1,
                TokenKind::RParen => parens -= 1,
                TokenKind::LBrace if parens == 0 => {
                    braces += 1;
                    opened = true;
                }
                TokenKind::RBrace if parens == 0 => {
                    braces -= 1;
                    if opened && braces == 0 {
                        let end = self.current.span.end;
                        self.advance();
                        return GoFunc {
                            code: self.lexer.source_range(start, end).to_string(),
                            position,
                            leading_comments: None,
                        };
                    }
                }
                _ => {}
            }
            self.advance();
        }

        self.diagnostics
            .error(position.clone(), "unterminated function definition");
        GoFunc {
            code: self.slice_to_current(start).trim_end().to_string(),
            position,
            leading_comments: None,
        }
    }

    /// `type`, `const` or `var`, up to the first newline outside any
    /// bracket pair.
    fn parse_go_decl(&mut self) -> GoDecl {
        let position = self.position();
        let start = self.current.span.start;
        let kind = match self.current.kind {
            TokenKind::Type => DeclKind::Type,
            TokenKind::Const => DeclKind::Const,
            _ => DeclKind::Var,
        };
        self.advance();

        let mut depth = 0i32;
        while !self.at_eof() {
            match self.current.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::Newline if depth <= 0 => break,
                _ => {}
            }
            self.advance();
        }

        GoDecl {
            kind,
            code: self.slice_to_current(start).trim_end().to_string(),
            position,
            leading_comments: None,
        }
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        self.skip_newlines();

        let mut params = Vec::new();
        while !matches!(self.current.kind, TokenKind::RParen | TokenKind::Eof) {
            params.push(self.parse_param()?);
            self.skip_newlines();
            if !self.at(&TokenKind::Comma) {
                break;
            }
            self.advance();
            self.skip_newlines();
        }

        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let position = self.position();
        let name = self.expect_ident("expected parameter name")?;

        let start = self.current.span.start;
        let mut depth = 0i32;
        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::RParen if depth == 0 => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        let ty = self.slice_to_current(start).trim().to_string();
        if ty.is_empty() {
            return Err(ParseError::new(
                format!("expected type for parameter {name}"),
                position,
            ));
        }
        Ok(Param { name, ty, position })
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// `{ nodes }`, consuming both braces and any newlines after the `}`.
    fn parse_block(&mut self) -> ParseResult<Block> {
        let open_line = self.current.span.line;
        self.expect(TokenKind::LBrace)?;
        let trailing = self.trailing_comment(open_line);

        let (nodes, orphans) = self.parse_body();

        self.expect(TokenKind::RBrace)?;
        self.skip_newlines();
        Ok(Block {
            nodes,
            trailing,
            orphans,
        })
    }

    /// Nodes up to the closing `}`. Comments preceding a node attach to it;
    /// comments before a node that failed to parse, or before the `}`,
    /// come back as orphans.
    fn parse_body(&mut self) -> (Vec<Node>, Vec<CommentGroup>) {
        let mut nodes = Vec::new();
        let mut orphans = Vec::new();

        loop {
            self.skip_newlines();
            if matches!(self.current.kind, TokenKind::RBrace | TokenKind::Eof) {
                break;
            }
            let leading = self.leading_comments();

            match self.parse_body_node() {
                Ok(Some(mut node)) => {
                    node.set_leading_comments(leading);
                    nodes.push(node);
                }
                Ok(None) => orphans.extend(leading),
                Err(err) => {
                    self.record(err);
                    orphans.extend(leading);
                }
            }
        }

        self.collect_comments();
        orphans.extend(group_comments(mem::take(&mut self.comments)));
        (nodes, orphans)
    }

    fn parse_body_node(&mut self) -> ParseResult<Option<Node>> {
        let node = match self.current.kind {
            TokenKind::LAngle => Node::Element(self.parse_element()?),
            TokenKind::AtLet => Node::Let(self.parse_let()?),
            TokenKind::AtFor => Node::For(self.parse_for()?),
            TokenKind::AtIf => Node::If(self.parse_if()?),
            TokenKind::AtCall(_) => Node::Call(self.parse_call()?),
            TokenKind::LBrace => self.parse_braced()?,
            TokenKind::Ident(_)
            | TokenKind::If
            | TokenKind::For
            | TokenKind::Func
            | TokenKind::Return
            | TokenKind::Var
            | TokenKind::Const
            | TokenKind::Type => Node::GoCode(self.parse_go_statement()),
            // Already reported by the lexer.
            TokenKind::Error(_) => {
                self.advance();
                return Ok(None);
            }
            _ => {
                let err = self.error(format!("unexpected token {} in body", self.current.kind));
                self.advance();
                return Err(err);
            }
        };
        Ok(Some(node))
    }

    /// A raw Go statement. Ends at a newline or `;` outside brackets, or
    /// before a closer that belongs to the enclosing block. Inside a `for`
    /// header, `;` separates clauses instead.
    fn parse_go_statement(&mut self) -> GoCode {
        let position = self.position();
        let start = self.current.span.start;
        let mut in_for_header = self.at(&TokenKind::For);
        let mut depth = 0i32;

        while !self.at_eof() {
            match self.current.kind {
                TokenKind::LBrace => {
                    in_for_header = false;
                    depth += 1;
                }
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace if depth == 0 => break,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::Newline if depth == 0 => break,
                TokenKind::Semicolon if depth == 0 && !in_for_header => {
                    let code = self.slice_to_current(start).trim().to_string();
                    self.advance();
                    return GoCode {
                        code,
                        position,
                        leading_comments: None,
                    };
                }
                _ => {}
            }
            self.advance();
        }

        GoCode {
            code: self.slice_to_current(start).trim().to_string(),
            position,
            leading_comments: None,
        }
    }

    /// `{expr}` or `{children...}` in content position.
    fn parse_braced(&mut self) -> ParseResult<Node> {
        let position = self.position();
        let result = self.lexer.read_balanced_braces_from(self.current.span.start);
        self.current = self.lexer.next_token();
        self.peek = self.lexer.next_token();

        let code = result
            .map_err(|err| ParseError::new(err.kind.to_string(), position.clone()))?
            .trim();
        if code == "children..." {
            return Ok(Node::ChildrenSlot(ChildrenSlot {
                position,
                leading_comments: None,
            }));
        }
        Ok(Node::GoExpr(GoExpr::new(code, position)))
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn parse_element(&mut self) -> ParseResult<Element> {
        let position = self.position();
        self.expect(TokenKind::LAngle)?;
        let tag = self.expect_ident("expected element tag name")?;

        let named_ref = if self.at(&TokenKind::Hash) {
            self.advance();
            Some(self.expect_ident("expected identifier after '#' for named ref")?)
        } else {
            None
        };

        let mut attributes = self.parse_attributes();
        let ref_key = attributes
            .iter()
            .position(|a| a.name == "key" && matches!(a.value, AttrValue::Expr(_)))
            .and_then(|index| match attributes.remove(index).value {
                AttrValue::Expr(expr) => Some(expr),
                _ => None,
            });

        let mut element = Element {
            tag,
            named_ref,
            ref_key,
            attributes,
            children: Vec::new(),
            self_close: false,
            position,
            leading_comments: None,
            trailing_comments: None,
        };

        if self.at(&TokenKind::SlashAngle) {
            let line = self.current.span.line;
            self.advance();
            element.self_close = true;
            element.trailing_comments = self.trailing_comment(line);
            self.skip_newlines();
            return Ok(element);
        }

        self.expect(TokenKind::RAngle)?;
        element.children = self.parse_children();

        if !self.at(&TokenKind::LAngleSlash) {
            let err = self.error(format!("expected closing tag </{}>", element.tag));
            self.record(err);
            return Ok(element);
        }
        self.advance();

        let closing = match &self.current.kind {
            TokenKind::Ident(name) => Some(name.clone()),
            _ => None,
        };
        match closing {
            Some(name) => {
                if name != element.tag {
                    let err = self.error(format!(
                        "mismatched closing tag: expected </{}>, got </{}>",
                        element.tag, name
                    ));
                    self.record(err);
                }
                self.advance();
            }
            None => {
                let err = self.error(format!("expected closing tag </{}>", element.tag));
                self.record(err);
            }
        }

        let close_line = self.current.span.line;
        if let Err(err) = self.expect(TokenKind::RAngle) {
            self.record(err);
            return Ok(element);
        }
        element.trailing_comments = self.trailing_comment(close_line);
        self.skip_newlines();
        Ok(element)
    }

    fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        loop {
            self.skip_newlines();
            let TokenKind::Ident(name) = &self.current.kind else {
                break;
            };
            let name = name.clone();
            match self.parse_attribute(name) {
                Ok(attribute) => attributes.push(attribute),
                Err(err) => self.record(err),
            }
        }
        attributes
    }

    fn parse_attribute(&mut self, name: String) -> ParseResult<Attribute> {
        let position = self.position();
        self.advance();

        if !self.at(&TokenKind::Equals) {
            return Ok(Attribute {
                name,
                value: AttrValue::Bool(true),
                value_position: position.clone(),
                position,
            });
        }

        // `={`: the lexer already sits just past the brace.
        if self.peek.kind == TokenKind::LBrace {
            let value_position = self.peek.span.position(self.lexer.file());
            self.current = self.lexer.read_go_expr();
            self.peek = self.lexer.next_token();
            let code = match &self.current.kind {
                TokenKind::GoExpr(code) | TokenKind::Error(code) => code.trim().to_string(),
                _ => String::new(),
            };
            self.advance();
            return Ok(Attribute {
                name,
                value: AttrValue::Expr(GoExpr::new(code, value_position.clone())),
                position,
                value_position,
            });
        }

        self.advance();
        let value_position = self.position();
        let (value, value_position) = match self.current.kind.clone() {
            TokenKind::String(s) | TokenKind::RawString(s) => {
                (AttrValue::String(s), value_position.offset_columns(1))
            }
            TokenKind::Int(text) => {
                let value = text
                    .parse()
                    .map_err(|_| self.error(format!("invalid integer literal {text}")))?;
                (AttrValue::Int(value), value_position)
            }
            TokenKind::Float(text) => {
                let value = text
                    .parse()
                    .map_err(|_| self.error(format!("invalid float literal {text}")))?;
                (AttrValue::Float(value), value_position)
            }
            TokenKind::Ident(word) => {
                let value = match word.as_str() {
                    "true" => AttrValue::Bool(true),
                    "false" => AttrValue::Bool(false),
                    _ => AttrValue::Expr(GoExpr::new(word, value_position.clone())),
                };
                (value, value_position)
            }
            other => return Err(self.error(format!("expected attribute value, got {other}"))),
        };
        self.advance();

        Ok(Attribute {
            name,
            value,
            position,
            value_position,
        })
    }

    /// Element content up to `</`. A stray `}` also stops it, so an
    /// unclosed element does not swallow the enclosing block.
    fn parse_children(&mut self) -> Vec<Node> {
        let mut children = Vec::new();

        loop {
            self.skip_newlines();
            if matches!(
                self.current.kind,
                TokenKind::LAngleSlash | TokenKind::RBrace | TokenKind::Eof
            ) {
                break;
            }
            let leading = self.leading_comments();

            let child = match self.current.kind {
                TokenKind::LAngle => self.parse_element().map(Node::Element),
                TokenKind::LBrace => self.parse_braced(),
                TokenKind::AtLet => self.parse_let().map(Node::Let),
                TokenKind::AtFor => self.parse_for().map(Node::For),
                TokenKind::AtIf => self.parse_if().map(Node::If),
                TokenKind::AtCall(_) => self.parse_call().map(Node::Call),
                _ if is_text(&self.current.kind) => Ok(self.parse_text()),
                _ => {
                    self.advance();
                    continue;
                }
            };

            match child {
                Ok(mut node) => {
                    node.set_leading_comments(leading);
                    children.push(node);
                }
                Err(err) => self.record(err),
            }
        }

        children
    }

    /// Coalesce a run of text tokens into one text node. A word is preceded
    /// by a space when it follows another word or one of `,` `:` `;`.
    fn parse_text(&mut self) -> Node {
        let position = self.position();
        let mut text = String::new();
        let mut spaced = false;

        while is_text(&self.current.kind) {
            let word = is_word(&self.current.kind);
            if word && spaced {
                text.push(' ');
            }
            text.push_str(self.current.text());
            spaced = word
                || matches!(
                    self.current.kind,
                    TokenKind::Comma | TokenKind::Colon | TokenKind::Semicolon
                );
            self.advance();
        }

        Node::Text(TextContent { text, position })
    }

    // =========================================================================
    // Directives
    // =========================================================================

    /// `@let name = <element>`
    fn parse_let(&mut self) -> ParseResult<LetBinding> {
        let position = self.position();
        self.advance();
        let name = self.expect_ident("expected variable name after @let")?;
        self.expect(TokenKind::Equals)?;
        self.skip_newlines();

        if !self.at(&TokenKind::LAngle) {
            return Err(self.error("expected element after @let ="));
        }
        let element = self.parse_element()?;

        Ok(LetBinding {
            name,
            element,
            position,
            leading_comments: None,
        })
    }

    /// `@for [index,] value := range iterable { body }`
    fn parse_for(&mut self) -> ParseResult<ForLoop> {
        let position = self.position();
        self.advance();

        let first = self.loop_variable("expected loop variable")?;
        let (index, value) = if self.at(&TokenKind::Comma) {
            self.advance();
            (
                Some(first),
                self.loop_variable("expected second loop variable")?,
            )
        } else {
            (None, first)
        };

        self.expect(TokenKind::ColonEquals)?;
        if !self.at(&TokenKind::Range) {
            return Err(self.error("expected 'range'"));
        }
        self.advance();

        let iterable = self.capture_header();
        self.skip_newlines();
        let block = self.parse_block()?;

        Ok(ForLoop {
            index,
            value,
            iterable,
            body: block.nodes,
            position,
            leading_comments: None,
            trailing_comments: block.trailing,
            orphan_comments: block.orphans,
        })
    }

    fn loop_variable(&mut self, message: &str) -> ParseResult<String> {
        let name = match &self.current.kind {
            TokenKind::Underscore => "_".to_string(),
            TokenKind::Ident(name) => name.clone(),
            _ => return Err(self.error(message)),
        };
        self.advance();
        Ok(name)
    }

    /// `@if cond { } [@else { } | @else @if ...]`
    fn parse_if(&mut self) -> ParseResult<IfStmt> {
        let position = self.position();
        self.advance();

        let condition = self.capture_header();
        if condition.is_empty() {
            return Err(self.error("expected condition after @if"));
        }
        self.skip_newlines();
        let block = self.parse_block()?;

        let mut stmt = IfStmt {
            condition,
            then_branch: block.nodes,
            else_branch: Vec::new(),
            position,
            leading_comments: None,
            trailing_comments: block.trailing,
            orphan_comments: block.orphans,
        };

        if !self.at(&TokenKind::AtElse) {
            return Ok(stmt);
        }
        self.advance();
        self.skip_newlines();

        if self.at(&TokenKind::AtIf) {
            match self.parse_if() {
                Ok(nested) => stmt.else_branch.push(Node::If(nested)),
                Err(err) => self.record(err),
            }
            return Ok(stmt);
        }

        match self.parse_block() {
            Ok(block) => {
                stmt.else_branch = block.nodes;
                stmt.orphan_comments.extend(block.trailing);
                stmt.orphan_comments.extend(block.orphans);
            }
            Err(err) => self.record(err),
        }
        Ok(stmt)
    }

    /// `@Name(args)`, optionally followed on the same line by `{ children }`.
    fn parse_call(&mut self) -> ParseResult<ComponentCall> {
        let position = self.position();
        let name = match &self.current.kind {
            TokenKind::AtCall(name) => name.clone(),
            _ => String::new(),
        };
        self.advance();

        if !self.at(&TokenKind::LParen) {
            return Err(self.error(format!("expected '(' after @{name}")));
        }
        let args_start = self.current.span.end;
        let mut depth = 0i32;
        loop {
            match self.current.kind {
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        format!("unterminated arguments to @{name}"),
                        position,
                    ))
                }
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.advance();
        }
        let args = self.slice_to_current(args_start).trim().to_string();
        self.advance();

        let children = if self.at(&TokenKind::LBrace) {
            self.parse_block()?.nodes
        } else {
            Vec::new()
        };

        Ok(ComponentCall {
            name,
            args,
            children,
            position,
            leading_comments: None,
        })
    }

    /// Raw source from the current token up to the `{` that opens a block.
    fn capture_header(&mut self) -> String {
        let start = self.current.span.start;
        while !matches!(
            self.current.kind,
            TokenKind::LBrace | TokenKind::Newline | TokenKind::Eof
        ) {
            self.advance();
        }
        self.slice_to_current(start).trim().to_string()
    }

    // =========================================================================
    // Comments
    // =========================================================================

    fn collect_comments(&mut self) {
        let comments = self.lexer.take_comments();
        self.comments.extend(comments);
    }

    /// Everything buffered so far, as one group.
    fn leading_comments(&mut self) -> Option<CommentGroup> {
        self.collect_comments();
        if self.comments.is_empty() {
            return None;
        }
        Some(CommentGroup::new(mem::take(&mut self.comments)))
    }

    /// The first buffered comment, if it starts on `line`.
    fn trailing_comment(&mut self, line: usize) -> Option<CommentGroup> {
        self.collect_comments();
        if self.comments.first()?.position.line != line {
            return None;
        }
        Some(CommentGroup::new(vec![self.comments.remove(0)]))
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn advance(&mut self) {
        let next = self.lexer.next_token();
        self.current = mem::replace(&mut self.peek, next);
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn skip_newlines(&mut self) {
        while self.at(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.current.kind != kind {
            return Err(self.error(format!("expected {kind}, got {}", self.current.kind)));
        }
        self.advance();
        Ok(())
    }

    fn expect_ident(&mut self, message: &str) -> ParseResult<String> {
        let TokenKind::Ident(name) = &self.current.kind else {
            return Err(self.error(message));
        };
        let name = name.clone();
        self.advance();
        Ok(name)
    }

    /// Skip to the next token that can start a top-level declaration.
    fn synchronize(&mut self) {
        while !self.at_eof() {
            if matches!(
                self.current.kind,
                TokenKind::AtComponent
                    | TokenKind::Templ
                    | TokenKind::Func
                    | TokenKind::Type
                    | TokenKind::Const
                    | TokenKind::Var
            ) {
                return;
            }
            self.advance();
        }
    }

    fn position(&self) -> Position {
        self.current.span.position(self.lexer.file())
    }

    fn slice_to_current(&self, start: usize) -> &'src str {
        self.lexer.source_range(start, self.current.span.start)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.position())
    }

    fn record(&mut self, err: ParseError) {
        trace!(%err, "recorded parse error");
        self.diagnostics.push(err.into());
    }
}

fn is_word(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_) | TokenKind::Int(_) | TokenKind::Float(_)
    ) || kind.is_keyword()
}

fn is_text(kind: &TokenKind) -> bool {
    is_word(kind)
        || matches!(
            kind,
            TokenKind::Comma
                | TokenKind::Slash
                | TokenKind::Dot
                | TokenKind::Colon
                | TokenKind::Semicolon
                | TokenKind::Bang
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Star
                | TokenKind::Pipe
                | TokenKind::Ampersand
                | TokenKind::Equals
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Underscore
                | TokenKind::Hash
        )
}
