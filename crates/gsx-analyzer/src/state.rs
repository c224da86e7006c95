//! Reactive state detection.
//!
//! A component declares state with `count := tui.NewState(0)` or receives it
//! as a `*tui.State[T]` parameter. Elements whose text or class expression
//! calls `count.Get()` are bound to that state and re-rendered when it
//! changes. `deps={[a, b]}` overrides the detected dependencies.

use std::collections::HashSet;
use std::sync::LazyLock;

use gsx_lexer::{Diagnostics, Position};
use gsx_parser::ast::{AttrValue, Attribute, Component, Node};
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::naming::{visit_elements, NamedElement};

static NEW_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s*:=\s*tui\.NewState\((.+)\)").expect("NewState pattern is a valid regex")
});

static GET_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(\*(\w+)\)|(\w+))\.Get\(\)").expect("Get pattern is a valid regex")
});

static STATE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*tui\.State\[(.+)\]$").expect("State param pattern is a valid regex")
});

/// Initializer shapes and the Go type each one yields, tried in order.
static TYPE_SHAPES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"^-?\d+$", "int"),
        (r"^-?\d+\.\d+$", "float64"),
        (r"^\[\](\w+(?:\.\w+)?)\{", "[]${1}"),
        (r"^map\[(\w+)\](\w+(?:\.\w+)?)\{", "map[${1}]${2}"),
        (r"^&(\w+(?:\.\w+)?)\{", "*${1}"),
        (r"^(\w+(?:\.\w+)?)\{", "${1}"),
    ]
    .into_iter()
    .map(|(pattern, ty)| {
        (
            Regex::new(pattern).expect("type shape is a valid regex"),
            ty,
        )
    })
    .collect()
});

/// Fallback when an initializer's type cannot be guessed.
pub const UNTYPED: &str = "any";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateVar {
    pub name: String,
    /// Go type of the state's value, e.g. `int` or `[]string`.
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_expr: Option<String>,
    pub is_parameter: bool,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundAttribute {
    Text,
    Class,
}

/// An element property that must be recomputed when state changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateBinding {
    pub state_vars: Vec<String>,
    pub element_name: String,
    pub tag: String,
    pub attribute: BoundAttribute,
    pub expr: String,
    pub explicit_deps: bool,
    pub position: Position,
}

/// Guess the Go type of a `tui.NewState` initializer.
pub fn infer_state_type(init: &str) -> String {
    let init = init.trim();
    match init {
        "true" | "false" => return "bool".to_string(),
        "nil" => return UNTYPED.to_string(),
        _ => {}
    }
    if is_string_literal(init) {
        return "string".to_string();
    }

    for (shape, ty) in TYPE_SHAPES.iter() {
        if let Some(caps) = shape.captures(init) {
            let mut out = String::new();
            caps.expand(ty, &mut out);
            return out;
        }
    }
    UNTYPED.to_string()
}

fn is_string_literal(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('`') && s.ends_with('`')))
}

/// State parameters and top-level `tui.NewState` declarations.
pub fn detect_state_vars(component: &Component) -> Vec<StateVar> {
    let mut vars = Vec::new();

    for param in &component.params {
        if let Some(caps) = STATE_PARAM.captures(&param.ty) {
            vars.push(StateVar {
                name: param.name.clone(),
                ty: caps[1].to_string(),
                init_expr: None,
                is_parameter: true,
                position: param.position.clone(),
            });
        }
    }

    for node in &component.body {
        let Node::GoCode(code) = node else {
            continue;
        };
        for caps in NEW_STATE.captures_iter(&code.code) {
            let init = caps[2].to_string();
            vars.push(StateVar {
                name: caps[1].to_string(),
                ty: infer_state_type(&init),
                init_expr: Some(init),
                is_parameter: false,
                position: code.position.clone(),
            });
        }
    }

    vars
}

/// Known state names referenced by `.Get()` calls, deduplicated, in order
/// of first use.
pub fn detect_get_calls(expr: &str, state_names: &HashSet<&str>) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in GET_CALL.captures_iter(expr) {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let name = name.as_str();
        if state_names.contains(name) && !found.iter().any(|f| f == name) {
            found.push(name.to_string());
        }
    }
    found
}

/// Validate a `deps={[a, b]}` attribute and return the listed state names.
///
/// Returns `None` for a malformed value or one naming no known state,
/// leaving detection to `.Get()` calls. An empty list is a warning and
/// yields no dependencies at all. Unknown names are reported and dropped.
pub fn parse_explicit_deps(
    attr: &Attribute,
    state_names: &HashSet<&str>,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<String>> {
    let AttrValue::Expr(expr) = &attr.value else {
        diagnostics.error(
            attr.position.clone(),
            "deps attribute must use expression syntax: deps={[state1, state2]}",
        );
        return None;
    };

    let code = expr.code.trim();
    let Some(inner) = code
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        diagnostics.error(
            attr.position.clone(),
            "deps attribute must be an array literal: deps={[state1, state2]}",
        );
        return None;
    };

    let inner = inner.trim();
    if inner.is_empty() {
        diagnostics.warning(attr.position.clone(), "empty deps attribute has no effect");
        return Some(Vec::new());
    }

    let mut deps = Vec::new();
    for name in inner.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if state_names.contains(name) {
            deps.push(name.to_string());
        } else {
            diagnostics.error(
                attr.position.clone(),
                format!("unknown state variable {name:?} in deps"),
            );
        }
    }
    if deps.is_empty() {
        return None;
    }
    Some(deps)
}

/// Find every element text or class expression that reads state.
///
/// Elements inside `@for` are validated but never bound: their names are
/// not stable across iterations.
pub fn detect_state_bindings(
    component: &Component,
    state_vars: &[StateVar],
    diagnostics: &mut Diagnostics,
) -> Vec<StateBinding> {
    let state_names: HashSet<&str> = state_vars.iter().map(|v| v.name.as_str()).collect();
    let mut bindings = Vec::new();

    visit_elements(&component.body, |named: NamedElement<'_>| {
        let el = named.element;
        let explicit = el
            .attribute("deps")
            .and_then(|attr| parse_explicit_deps(attr, &state_names, diagnostics));

        if named.in_loop {
            return;
        }

        let mut bind = |element_name: &str,
                        attribute: BoundAttribute,
                        code: &str,
                        position: &Position| {
            let (state_vars, explicit_deps) = match &explicit {
                Some(deps) => (deps.clone(), true),
                None => (detect_get_calls(code, &state_names), false),
            };
            if state_vars.is_empty() {
                return;
            }
            trace!(element = element_name, ?attribute, "state binding");
            bindings.push(StateBinding {
                state_vars,
                element_name: element_name.to_string(),
                tag: el.tag.clone(),
                attribute,
                expr: code.to_string(),
                explicit_deps,
                position: position.clone(),
            });
        };

        for (index, child) in el.children.iter().enumerate() {
            if let Node::GoExpr(expr) = child {
                let target = named.child_name(index).unwrap_or(named.name);
                bind(target, BoundAttribute::Text, &expr.code, &expr.position);
            }
        }
        for attr in el.attributes.iter().filter(|a| a.name == "class") {
            if let AttrValue::Expr(expr) = &attr.value {
                bind(named.name, BoundAttribute::Class, &expr.code, &attr.position);
            }
        }
    });

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsx_lexer::FileId;
    use gsx_parser::ast::GoExpr;
    use pretty_assertions::assert_eq;

    fn component(source: &str) -> Component {
        let file = gsx_parser::parse("test.gsx", source).into_result().unwrap();
        file.components.into_iter().next().unwrap()
    }

    fn names<'a>(list: &[&'a str]) -> HashSet<&'a str> {
        list.iter().copied().collect()
    }

    fn deps_attr(code: &str) -> Attribute {
        let position = Position::new(FileId::new("test.gsx"), 1, 1);
        Attribute {
            name: "deps".into(),
            value: AttrValue::Expr(GoExpr::new(code, position.clone())),
            position: position.clone(),
            value_position: position,
        }
    }

    // =========================================================================
    // Type inference
    // =========================================================================

    #[test]
    fn test_infer_scalars() {
        assert_eq!(infer_state_type("0"), "int");
        assert_eq!(infer_state_type("-42"), "int");
        assert_eq!(infer_state_type("3.14"), "float64");
        assert_eq!(infer_state_type("true"), "bool");
        assert_eq!(infer_state_type(" false "), "bool");
        assert_eq!(infer_state_type("\"hi\""), "string");
        assert_eq!(infer_state_type("`raw`"), "string");
        assert_eq!(infer_state_type("nil"), "any");
    }

    #[test]
    fn test_infer_composites() {
        assert_eq!(infer_state_type("[]string{}"), "[]string");
        assert_eq!(infer_state_type("[]model.Item{a, b}"), "[]model.Item");
        assert_eq!(infer_state_type("map[string]int{}"), "map[string]int");
        assert_eq!(infer_state_type("&Config{Debug: true}"), "*Config");
        assert_eq!(infer_state_type("ui.Theme{}"), "ui.Theme");
    }

    #[test]
    fn test_infer_fallback() {
        assert_eq!(infer_state_type("loadItems()"), "any");
        assert_eq!(infer_state_type("x + 1"), "any");
        assert_eq!(infer_state_type("\""), "any");
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    #[test]
    fn test_detect_params_and_declarations() {
        let c = component(
            "package ui\n\n@component Counter(label string, total *tui.State[int]) {\n\tcount := tui.NewState(0)\n\tnames := tui.NewState([]string{})\n\t<div></div>\n}\n",
        );
        let vars = detect_state_vars(&c);
        let got: Vec<_> = vars
            .iter()
            .map(|v| (v.name.as_str(), v.ty.as_str(), v.is_parameter))
            .collect();
        assert_eq!(
            got,
            vec![
                ("total", "int", true),
                ("count", "int", false),
                ("names", "[]string", false),
            ]
        );
        assert_eq!(vars[1].init_expr.as_deref(), Some("0"));
        assert_eq!(vars[1].position.line, 4);
    }

    #[test]
    fn test_nested_declarations_are_ignored() {
        let c = component(
            "package ui\n\n@component C() {\n\t@if ok {\n\t\tx := tui.NewState(1)\n\t}\n}\n",
        );
        assert!(detect_state_vars(&c).is_empty());
    }

    // =========================================================================
    // Get calls
    // =========================================================================

    #[test]
    fn test_get_calls() {
        let known = names(&["count", "name"]);
        assert_eq!(
            detect_get_calls("fmt.Sprintf(\"%d %s %d\", count.Get(), name.Get(), count.Get())", &known),
            vec!["count", "name"]
        );
        assert_eq!(detect_get_calls("(*count).Get() + 1", &known), vec!["count"]);
        assert!(detect_get_calls("other.Get()", &known).is_empty());
        assert!(detect_get_calls("count.Set(1)", &known).is_empty());
    }

    // =========================================================================
    // Explicit deps
    // =========================================================================

    #[test]
    fn test_explicit_deps() {
        let known = names(&["a", "b"]);
        let mut diags = Diagnostics::new();
        let deps = parse_explicit_deps(&deps_attr("[a, b]"), &known, &mut diags);
        assert_eq!(deps, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_explicit_deps_unknown_name() {
        let known = names(&["a"]);
        let mut diags = Diagnostics::new();
        let deps = parse_explicit_deps(&deps_attr("[a, zz]"), &known, &mut diags);
        assert_eq!(deps, Some(vec!["a".to_string()]));
        assert_eq!(
            diags.iter().next().unwrap().message,
            "unknown state variable \"zz\" in deps"
        );
    }

    #[test]
    fn test_explicit_deps_all_unknown_falls_back() {
        let mut diags = Diagnostics::new();
        let deps = parse_explicit_deps(&deps_attr("[x, y]"), &names(&["a"]), &mut diags);
        assert_eq!(deps, None);
        assert_eq!(diags.errors().count(), 2);
    }

    #[test]
    fn test_explicit_deps_empty_is_warning() {
        let mut diags = Diagnostics::new();
        let deps = parse_explicit_deps(&deps_attr("[ ]"), &names(&[]), &mut diags);
        assert_eq!(deps, Some(Vec::new()));
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_explicit_deps_shape_errors() {
        let mut diags = Diagnostics::new();
        assert_eq!(parse_explicit_deps(&deps_attr("a, b"), &names(&["a"]), &mut diags), None);

        let mut attr = deps_attr("");
        attr.value = AttrValue::String("a".into());
        assert_eq!(parse_explicit_deps(&attr, &names(&["a"]), &mut diags), None);

        let got: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            got,
            vec![
                "deps attribute must be an array literal: deps={[state1, state2]}",
                "deps attribute must use expression syntax: deps={[state1, state2]}",
            ]
        );
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    fn bindings(source: &str) -> (Vec<StateBinding>, Diagnostics) {
        let c = component(source);
        let vars = detect_state_vars(&c);
        let mut diags = Diagnostics::new();
        let list = detect_state_bindings(&c, &vars, &mut diags);
        (list, diags)
    }

    #[test]
    fn test_text_binding() {
        let (list, diags) = bindings(
            "package ui\n\n@component Counter() {\n\tcount := tui.NewState(0)\n\t<span>{fmt.Sprintf(\"%d\", count.Get())}</span>\n}\n",
        );
        assert!(diags.is_empty());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].element_name, "__tmp_0");
        assert_eq!(list[0].attribute, BoundAttribute::Text);
        assert_eq!(list[0].state_vars, vec!["count"]);
        assert!(!list[0].explicit_deps);
    }

    #[test]
    fn test_class_binding_uses_ref_name() {
        let (list, _) = bindings(
            "package ui\n\n@component C() {\n\ton := tui.NewState(false)\n\t<div#Panel class={panelClass(on.Get())}></div>\n}\n",
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].element_name, "Panel");
        assert_eq!(list[0].attribute, BoundAttribute::Class);
    }

    #[test]
    fn test_explicit_deps_override_detection() {
        let (list, _) = bindings(
            "package ui\n\n@component C() {\n\ta := tui.NewState(1)\n\tb := tui.NewState(2)\n\t<span deps={[b]}>{total(a)}</span>\n}\n",
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].state_vars, vec!["b"]);
        assert!(list[0].explicit_deps);
    }

    #[test]
    fn test_empty_deps_suppress_binding() {
        let (list, diags) = bindings(
            "package ui\n\n@component C() {\n\tn := tui.NewState(0)\n\t<span deps={[]}>{n.Get()}</span>\n}\n",
        );
        assert!(list.is_empty());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_loop_elements_are_not_bound() {
        let (list, diags) = bindings(
            "package ui\n\n@component C(items []string) {\n\tn := tui.NewState(0)\n\t@for _, it := range items {\n\t\t<span deps={[bogus]}>{n.Get()}</span>\n\t}\n}\n",
        );
        assert!(list.is_empty());
        assert_eq!(
            diags.iter().next().unwrap().message,
            "unknown state variable \"bogus\" in deps"
        );
    }

    #[test]
    fn test_binding_names_follow_counter() {
        let (list, _) = bindings(
            "package ui\n\n@component C() {\n\tn := tui.NewState(0)\n\t<div>\n\t\tlabel\n\t\t<span>{n.Get()}</span>\n\t</div>\n}\n",
        );
        // div is __tmp_0, its text child takes slot 1, span is __tmp_2.
        assert_eq!(list[0].element_name, "__tmp_2");
    }

    #[test]
    fn test_text_binding_targets_child_slot() {
        let (list, _) = bindings(
            "package ui\n\n@component C() {\n\tn := tui.NewState(0)\n\t<div>{n.Get()}</div>\n}\n",
        );
        let names: Vec<_> = list.iter().map(|b| b.element_name.as_str()).collect();
        assert_eq!(names, vec!["__tmp_1"]);
        assert_eq!(list[0].tag, "div");
    }

    #[test]
    fn test_text_binding_under_named_parent() {
        let (list, _) = bindings(
            "package ui\n\n@component C() {\n\tn := tui.NewState(0)\n\t<div#Box>\n\t\tlabel\n\t\t{n.Get()}\n\t</div>\n}\n",
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].element_name, "__tmp_1");
    }

    #[test]
    fn test_unknown_deps_fall_back_to_detection() {
        let (list, diags) = bindings(
            "package ui\n\n@component C() {\n\tn := tui.NewState(0)\n\t<span deps={[bogus]}>{n.Get()}</span>\n}\n",
        );
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].state_vars, vec!["n"]);
        assert!(!list[0].explicit_deps);
    }
}
