//! Named element references (`<div#Sidebar>`).
//!
//! Each ref becomes a field on the generated view, so names must be exported
//! Go identifiers and unique per component. Refs inside `@for` become slices,
//! or maps when keyed with `key={...}`.

use std::collections::HashMap;

use gsx_lexer::{Diagnostics, Position};
use gsx_parser::ast::{Element, Node};
use serde::Serialize;

/// Reserved for the generated view's root element.
pub const RESERVED_REF: &str = "Root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Single,
    List,
    Map,
}

/// Go type of a keyed ref's map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    String,
    Int,
}

impl KeyType {
    pub fn as_go(&self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Int => "int",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRef {
    pub name: String,
    pub tag: String,
    pub in_loop: bool,
    pub in_conditional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyType>,
    pub position: Position,
}

impl NamedRef {
    pub fn kind(&self) -> RefKind {
        match (self.in_loop, self.key_expr.is_some()) {
            (true, true) => RefKind::Map,
            (true, false) => RefKind::List,
            (false, _) => RefKind::Single,
        }
    }
}

/// Guess a map key type from the key expression's spelling.
pub fn infer_key_type(expr: &str) -> KeyType {
    if expr.ends_with(".ID") || expr.ends_with(".Id") {
        KeyType::String
    } else if expr.contains("int") || expr.contains("Int") {
        KeyType::Int
    } else {
        KeyType::String
    }
}

/// Exported Go identifier: uppercase first letter, then letters, digits, `_`.
pub fn is_valid_ref_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Validate and collect every named ref in a component body.
pub fn collect_named_refs(body: &[Node], diagnostics: &mut Diagnostics) -> Vec<NamedRef> {
    let mut collector = RefCollector {
        refs: Vec::new(),
        seen: HashMap::new(),
        diagnostics,
    };
    collector.walk(body, false, false);
    collector.refs
}

struct RefCollector<'d> {
    refs: Vec<NamedRef>,
    seen: HashMap<String, Position>,
    diagnostics: &'d mut Diagnostics,
}

impl RefCollector<'_> {
    fn walk(&mut self, nodes: &[Node], in_loop: bool, in_cond: bool) {
        for node in nodes {
            match node {
                Node::Element(el) => self.element(el, in_loop, in_cond),
                Node::Let(binding) => self.walk(&binding.element.children, in_loop, in_cond),
                Node::For(lp) => self.walk(&lp.body, true, in_cond),
                Node::If(stmt) => {
                    self.walk(&stmt.then_branch, in_loop, true);
                    self.walk(&stmt.else_branch, in_loop, true);
                }
                Node::Call(call) => self.walk(&call.children, in_loop, in_cond),
                _ => {}
            }
        }
    }

    fn element(&mut self, el: &Element, in_loop: bool, in_cond: bool) {
        if let Some(name) = &el.named_ref {
            self.check(el, name, in_loop, in_cond);
        }
        self.walk(&el.children, in_loop, in_cond);
    }

    fn check(&mut self, el: &Element, name: &str, in_loop: bool, in_cond: bool) {
        let position = el.position.clone();

        if !is_valid_ref_name(name) {
            self.diagnostics.error(
                position,
                format!(
                    "invalid ref name {name:?} - must be valid Go identifier starting with uppercase letter"
                ),
            );
            return;
        }
        if name == RESERVED_REF {
            self.diagnostics
                .error(position, format!("ref name '{RESERVED_REF}' is reserved"));
            return;
        }
        if let Some(first) = self.seen.get(name) {
            self.diagnostics.error(
                position,
                format!("duplicate ref name {name:?} (first defined at {first})"),
            );
            return;
        }
        self.seen.insert(name.to_string(), position.clone());

        let key_expr = el.ref_key.as_ref().map(|key| key.code.clone());
        if el.ref_key.is_some() && !in_loop {
            self.diagnostics.error(
                position.clone(),
                format!("key attribute on ref {name:?} only valid inside @for loop"),
            );
        }
        let key_type = key_expr.as_deref().map(infer_key_type);

        self.refs.push(NamedRef {
            name: name.to_string(),
            tag: el.tag.clone(),
            in_loop,
            in_conditional: in_cond,
            key_expr,
            key_type,
            position,
        });
    }
}
