//! The analyzer: validates a parsed file and annotates it for code generation.
//!
//! Runs in six passes over every component:
//!
//! 1. mark components whose body contains `{children...}`
//! 2. collect `@let` names
//! 3. rewrite bare `{name}` references to let bindings as [`RawGoExpr`]
//! 4. validate named refs
//! 5. validate tags, attributes, classes and component calls
//! 6. detect reactive state and its element bindings
//!
//! and finally adds the runtime imports the generated code needs.

use std::collections::HashMap;

use gsx_lexer::{Diagnostic, Diagnostics, Position};
use gsx_parser::ast::{
    AttrValue, Attribute, Component, ComponentCall, Element, File, Import, LetBinding, Node,
    RawGoExpr,
};
use serde::Serialize;
use tracing::debug;

use crate::classes::{class_tokens, ClassTranslator, ImportKind, UtilityClasses};
use crate::refs::{collect_named_refs, NamedRef};
use crate::schema::{is_known_attribute, is_known_tag, is_void_tag, suggest_attribute};
use crate::state::{detect_state_bindings, detect_state_vars, StateBinding, StateVar};

/// What analysis learned about one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInfo {
    pub name: String,
    pub accepts_children: bool,
    pub let_bindings: Vec<LetInfo>,
    pub named_refs: Vec<NamedRef>,
    pub state_vars: Vec<StateVar>,
    pub state_bindings: Vec<StateBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetInfo {
    pub name: String,
    /// Referenced as a bare `{name}` somewhere in the component.
    pub used: bool,
    pub position: Position,
}

/// Result of [`Analyzer::analyze`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub components: Vec<ComponentInfo>,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    pub fn component(&self, name: &str) -> Option<&ComponentInfo> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// `Err` with every diagnostic when any of them is an error.
    pub fn into_result(self) -> Result<Self, Diagnostics> {
        if self.has_errors() {
            Err(self.diagnostics)
        } else {
            Ok(self)
        }
    }
}

/// Which runtime packages the generated file uses.
#[derive(Debug, Default, Clone, Copy)]
struct Usage {
    element: bool,
    layout: bool,
    tui: bool,
}

impl Usage {
    fn mark(&mut self, kind: ImportKind) {
        match kind {
            ImportKind::Element => self.element = true,
            ImportKind::Layout => self.layout = true,
            ImportKind::Tui => self.tui = true,
        }
    }

    fn scan(&mut self, code: &str) {
        if code.contains("layout.") {
            self.layout = true;
        }
        if code.contains("tui.") {
            self.tui = true;
        }
    }

    fn imports(&self) -> impl Iterator<Item = ImportKind> {
        [
            (self.element, ImportKind::Element),
            (self.layout, ImportKind::Layout),
            (self.tui, ImportKind::Tui),
        ]
        .into_iter()
        .filter_map(|(used, kind)| used.then_some(kind))
    }
}

/// Per-invocation tables. Built fresh for every [`Analyzer::analyze`] call.
#[derive(Default)]
struct Context {
    /// Component name to whether it accepts children.
    accepts_children: HashMap<String, bool>,
    usage: Usage,
    diagnostics: Diagnostics,
}

/// Let bindings of one component, in declaration order.
#[derive(Default)]
struct LetTable {
    entries: Vec<LetInfo>,
}

impl LetTable {
    fn get(&self, name: &str) -> Option<&LetInfo> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Mark `name` used. False when it is not a let binding.
    fn mark_used(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.used = true;
                true
            }
            None => false,
        }
    }
}

/// Semantic analyzer for parsed `.gsx` files.
pub struct Analyzer {
    classes: Box<dyn ClassTranslator>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_translator(Box::new(UtilityClasses::new()))
    }

    /// Use a custom utility-class vocabulary.
    pub fn with_translator(classes: Box<dyn ClassTranslator>) -> Self {
        Self { classes }
    }

    /// Analyze `file` in place. Running it again on the result is a no-op
    /// apart from recomputing the same diagnostics.
    pub fn analyze(&mut self, file: &mut File) -> Analysis {
        let mut ctx = Context::default();
        debug!(components = file.components.len(), "analyzing {}", file.package);

        // Pass 1: children slots
        for component in &mut file.components {
            component.accepts_children = contains_children_slot(&component.body);
            ctx.accepts_children
                .insert(component.name.clone(), component.accepts_children);
        }

        // Pass 2: let bindings
        let mut lets: Vec<LetTable> = file
            .components
            .iter()
            .map(|c| collect_let_bindings(c, &mut ctx.diagnostics))
            .collect();

        // Pass 3: let references
        for (component, table) in file.components.iter_mut().zip(&mut lets) {
            rewrite_let_refs(&mut component.body, table);
        }

        // Pass 4: named refs
        let refs: Vec<Vec<NamedRef>> = file
            .components
            .iter()
            .map(|c| collect_named_refs(&c.body, &mut ctx.diagnostics))
            .collect();

        // Pass 5: validation
        for component in &file.components {
            debug!(component = %component.name, "validating");
            ctx.usage.element = true;
            self.check_nodes(&component.body, &mut ctx);
        }

        // Pass 6: state
        let mut components = Vec::with_capacity(file.components.len());
        for ((component, table), named_refs) in file.components.iter().zip(lets).zip(refs) {
            let state_vars = detect_state_vars(component);
            if !state_vars.is_empty() {
                ctx.usage.tui = true;
            }
            let state_bindings =
                detect_state_bindings(component, &state_vars, &mut ctx.diagnostics);
            debug!(
                component = %component.name,
                state_vars = state_vars.len(),
                bindings = state_bindings.len(),
                "state detected"
            );
            components.push(ComponentInfo {
                name: component.name.clone(),
                accepts_children: component.accepts_children,
                let_bindings: table.entries,
                named_refs,
                state_vars,
                state_bindings,
            });
        }

        add_imports(file, ctx.usage);

        Analysis {
            components,
            diagnostics: ctx.diagnostics,
        }
    }

    // =========================================================================
    // Pass 5
    // =========================================================================

    fn check_nodes(&self, nodes: &[Node], ctx: &mut Context) {
        for node in nodes {
            self.check_node(node, ctx);
        }
    }

    fn check_node(&self, node: &Node, ctx: &mut Context) {
        match node {
            Node::Element(el) => self.check_element(el, ctx),
            Node::Let(binding) => self.check_element(&binding.element, ctx),
            Node::For(lp) => self.check_nodes(&lp.body, ctx),
            Node::If(stmt) => {
                self.check_nodes(&stmt.then_branch, ctx);
                self.check_nodes(&stmt.else_branch, ctx);
            }
            Node::Call(call) => self.check_call(call, ctx),
            Node::GoExpr(expr) => ctx.usage.scan(&expr.code),
            Node::GoCode(code) => ctx.usage.scan(&code.code),
            Node::Text(_) | Node::RawGoExpr(_) | Node::ChildrenSlot(_) => {}
        }
    }

    fn check_element(&self, el: &Element, ctx: &mut Context) {
        if !is_known_tag(&el.tag) {
            ctx.diagnostics
                .error(el.position.clone(), format!("unknown element tag <{}>", el.tag));
        }
        if is_void_tag(&el.tag) && !el.children.is_empty() {
            ctx.diagnostics.error(
                el.position.clone(),
                format!("<{}> is a void element and cannot have children", el.tag),
            );
        }
        for attr in &el.attributes {
            self.check_attribute(attr, ctx);
        }
        self.check_nodes(&el.children, ctx);
    }

    fn check_attribute(&self, attr: &Attribute, ctx: &mut Context) {
        if !is_known_attribute(&attr.name) {
            let mut diagnostic = Diagnostic::error(
                attr.position.clone(),
                format!("unknown attribute {}", attr.name),
            );
            if let Some(fix) = suggest_attribute(&attr.name) {
                diagnostic = diagnostic.with_hint(format!("did you mean {fix}?"));
            }
            ctx.diagnostics.push(diagnostic);
            return;
        }

        match &attr.value {
            AttrValue::String(value) if attr.name == "class" => {
                self.check_classes(value, &attr.value_position, ctx);
            }
            AttrValue::Expr(expr) => ctx.usage.scan(&expr.code),
            _ => {}
        }
    }

    fn check_classes(&self, value: &str, start: &Position, ctx: &mut Context) {
        for token in class_tokens(value) {
            match self.classes.translate(token.class) {
                Some(translation) => {
                    if let Some(kind) = translation.needs {
                        ctx.usage.mark(kind);
                    }
                }
                None => {
                    let mut diagnostic = Diagnostic::error(
                        start.offset_columns(token.start),
                        format!("unknown utility class {:?}", token.class),
                    )
                    .with_end(start.offset_columns(token.end));
                    if let Some(fix) = self.classes.suggest(token.class) {
                        diagnostic = diagnostic.with_hint(format!("did you mean {fix:?}?"));
                    }
                    ctx.diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn check_call(&self, call: &ComponentCall, ctx: &mut Context) {
        let rejects_children = ctx.accepts_children.get(&call.name) == Some(&false);
        if rejects_children && !call.children.is_empty() {
            ctx.diagnostics.error(
                call.position.clone(),
                format!(
                    "component {} does not accept children (no {{children...}} slot in definition)",
                    call.name
                ),
            );
        }
        ctx.usage.scan(&call.args);
        self.check_nodes(&call.children, ctx);
    }
}

// ============================================================================
// Passes 1-3
// ============================================================================

fn contains_children_slot(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::ChildrenSlot(_) => true,
        Node::Element(el) => contains_children_slot(&el.children),
        Node::Let(binding) => contains_children_slot(&binding.element.children),
        Node::For(lp) => contains_children_slot(&lp.body),
        Node::If(stmt) => {
            contains_children_slot(&stmt.then_branch) || contains_children_slot(&stmt.else_branch)
        }
        Node::Call(call) => contains_children_slot(&call.children),
        _ => false,
    })
}

fn collect_let_bindings(component: &Component, diagnostics: &mut Diagnostics) -> LetTable {
    let mut table = LetTable::default();
    collect_lets_in(&component.body, &mut table, diagnostics);
    table
}

fn collect_lets_in(nodes: &[Node], table: &mut LetTable, diagnostics: &mut Diagnostics) {
    for node in nodes {
        match node {
            Node::Let(binding) => {
                register_let(binding, table, diagnostics);
                collect_lets_in(&binding.element.children, table, diagnostics);
            }
            Node::Element(el) => collect_lets_in(&el.children, table, diagnostics),
            Node::For(lp) => collect_lets_in(&lp.body, table, diagnostics),
            Node::If(stmt) => {
                collect_lets_in(&stmt.then_branch, table, diagnostics);
                collect_lets_in(&stmt.else_branch, table, diagnostics);
            }
            Node::Call(call) => collect_lets_in(&call.children, table, diagnostics),
            _ => {}
        }
    }
}

fn register_let(binding: &LetBinding, table: &mut LetTable, diagnostics: &mut Diagnostics) {
    if let Some(first) = table.get(&binding.name) {
        diagnostics.error(
            binding.position.clone(),
            format!(
                "duplicate @let binding {:?} (first defined at {}:{})",
                binding.name, first.position.line, first.position.column
            ),
        );
        return;
    }
    table.entries.push(LetInfo {
        name: binding.name.clone(),
        used: false,
        position: binding.position.clone(),
    });
}

fn rewrite_let_refs(nodes: &mut [Node], table: &mut LetTable) {
    for node in nodes.iter_mut() {
        let replacement = match node {
            Node::GoExpr(expr) if is_simple_ident(&expr.code) && table.mark_used(&expr.code) => {
                Some(RawGoExpr {
                    code: expr.code.clone(),
                    position: expr.position.clone(),
                })
            }
            Node::Element(el) => {
                rewrite_let_refs(&mut el.children, table);
                None
            }
            Node::Let(binding) => {
                rewrite_let_refs(&mut binding.element.children, table);
                None
            }
            Node::For(lp) => {
                rewrite_let_refs(&mut lp.body, table);
                None
            }
            Node::If(stmt) => {
                rewrite_let_refs(&mut stmt.then_branch, table);
                rewrite_let_refs(&mut stmt.else_branch, table);
                None
            }
            Node::Call(call) => {
                rewrite_let_refs(&mut call.children, table);
                None
            }
            _ => None,
        };
        if let Some(raw) = replacement {
            *node = Node::RawGoExpr(raw);
        }
    }
}

fn is_simple_ident(code: &str) -> bool {
    let mut chars = code.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn add_imports(file: &mut File, usage: Usage) {
    for kind in usage.imports() {
        let path = kind.path();
        if !file.has_import(path) {
            debug!(path, "adding import");
            file.imports.push(Import::new(path, Position::default()));
        }
    }
}
