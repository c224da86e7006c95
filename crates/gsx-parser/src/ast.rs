//! Abstract Syntax Tree for GSX.
//!
//! A [`File`] holds the package clause, imports, components, and pass-through
//! Go declarations. Component bodies are trees of [`Node`], a closed sum type
//! over every body construct.

use gsx_lexer::{CommentGroup, Position};
use serde::Serialize;

// ---------------------------------------------------------------------------
// File-level nodes
// ---------------------------------------------------------------------------

/// A complete `.gsx` source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub package: String,
    pub imports: Vec<Import>,
    pub components: Vec<Component>,
    /// Helper functions and methods, passed through verbatim.
    pub funcs: Vec<GoFunc>,
    /// Top-level `type`/`const`/`var` declarations, passed through verbatim.
    pub decls: Vec<GoDecl>,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
    pub orphan_comments: Vec<CommentGroup>,
}

impl File {
    pub fn has_import(&self, path: &str) -> bool {
        self.imports.iter().any(|imp| imp.path == path)
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub alias: Option<String>,
    pub path: String,
    pub position: Position,
}

impl Import {
    pub fn new(path: impl Into<String>, position: Position) -> Self {
        Self {
            alias: None,
            path: path.into(),
            position,
        }
    }
}

/// A named, parameterized template producing one element tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Node>,
    /// Set by the analyzer when the body contains `{children...}`.
    pub accepts_children: bool,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
    pub trailing_comments: Option<CommentGroup>,
    pub orphan_comments: Vec<CommentGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    /// Raw Go type text, e.g. `*tui.State[int]` or `func() string`.
    pub ty: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoFunc {
    pub code: String,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Type,
    Const,
    Var,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Type => "type",
            DeclKind::Const => "const",
            DeclKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoDecl {
    pub kind: DeclKind,
    pub code: String,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}

// ---------------------------------------------------------------------------
// Body nodes
// ---------------------------------------------------------------------------

/// A node inside a component body or element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum Node {
    Element(Element),
    Text(TextContent),
    Let(LetBinding),
    For(ForLoop),
    If(IfStmt),
    Call(ComponentCall),
    /// `{children...}`: where a caller's children are spliced in.
    ChildrenSlot(ChildrenSlot),
    /// `{expr}`, evaluated on every render.
    GoExpr(GoExpr),
    /// A bare reference to a `@let` binding, reused rather than re-evaluated.
    RawGoExpr(RawGoExpr),
    /// A raw Go statement in a body.
    GoCode(GoCode),
}

impl Node {
    pub fn position(&self) -> &Position {
        match self {
            Node::Element(n) => &n.position,
            Node::Text(n) => &n.position,
            Node::Let(n) => &n.position,
            Node::For(n) => &n.position,
            Node::If(n) => &n.position,
            Node::Call(n) => &n.position,
            Node::ChildrenSlot(n) => &n.position,
            Node::GoExpr(n) => &n.position,
            Node::RawGoExpr(n) => &n.position,
            Node::GoCode(n) => &n.position,
        }
    }

    /// Attach a leading comment group. Text and let references carry none.
    pub fn set_leading_comments(&mut self, comments: Option<CommentGroup>) {
        if comments.is_none() {
            return;
        }
        match self {
            Node::Element(n) => n.leading_comments = comments,
            Node::Let(n) => n.leading_comments = comments,
            Node::For(n) => n.leading_comments = comments,
            Node::If(n) => n.leading_comments = comments,
            Node::Call(n) => n.leading_comments = comments,
            Node::ChildrenSlot(n) => n.leading_comments = comments,
            Node::GoExpr(n) => n.leading_comments = comments,
            Node::GoCode(n) => n.leading_comments = comments,
            Node::Text(_) | Node::RawGoExpr(_) => {}
        }
    }

    pub fn leading_comments(&self) -> Option<&CommentGroup> {
        match self {
            Node::Element(n) => n.leading_comments.as_ref(),
            Node::Let(n) => n.leading_comments.as_ref(),
            Node::For(n) => n.leading_comments.as_ref(),
            Node::If(n) => n.leading_comments.as_ref(),
            Node::Call(n) => n.leading_comments.as_ref(),
            Node::ChildrenSlot(n) => n.leading_comments.as_ref(),
            Node::GoExpr(n) => n.leading_comments.as_ref(),
            Node::GoCode(n) => n.leading_comments.as_ref(),
            Node::Text(_) | Node::RawGoExpr(_) => None,
        }
    }
}

/// An element like `<div class="p-1">...</div>` or `<hr />`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    /// `#Name` suffix on the tag.
    pub named_ref: Option<String>,
    /// `key={expr}`, lifted out of the attribute list.
    pub ref_key: Option<GoExpr>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub self_close: bool,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
    pub trailing_comments: Option<CommentGroup>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
    pub position: Position,
    /// Where the value starts. For string literals this is the first
    /// character inside the quotes.
    pub value_position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum AttrValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Expr(GoExpr),
}

impl AttrValue {
    pub fn as_expr(&self) -> Option<&GoExpr> {
        match self {
            AttrValue::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub text: String,
    pub position: Position,
}

/// `@let name = <element>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetBinding {
    pub name: String,
    pub element: Element,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}

/// `@for [index,] value := range iterable { body }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForLoop {
    pub index: Option<String>,
    pub value: String,
    pub iterable: String,
    pub body: Vec<Node>,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
    pub trailing_comments: Option<CommentGroup>,
    pub orphan_comments: Vec<CommentGroup>,
}

/// `@if cond { } [@else { } | @else @if ...]`. An else-if chain is an
/// `else_branch` holding a single nested `If`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStmt {
    pub condition: String,
    pub then_branch: Vec<Node>,
    pub else_branch: Vec<Node>,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
    pub trailing_comments: Option<CommentGroup>,
    pub orphan_comments: Vec<CommentGroup>,
}

/// `@Name(args) [{ children }]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentCall {
    pub name: String,
    /// Raw argument source between the parentheses.
    pub args: String,
    pub children: Vec<Node>,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildrenSlot {
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoExpr {
    pub code: String,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}

impl GoExpr {
    pub fn new(code: impl Into<String>, position: Position) -> Self {
        Self {
            code: code.into(),
            position,
            leading_comments: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawGoExpr {
    pub code: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoCode {
    pub code: String,
    pub position: Position,
    pub leading_comments: Option<CommentGroup>,
}
