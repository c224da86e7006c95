//! End-to-end runs of the lex → parse → analyze pipeline on fixture files,
//! plus a few invocations of the `gsx` binary itself.

use std::process::Command;

use gsx_analyzer::{element_names, BoundAttribute, ImportKind, RefKind};
use gsx_parser::ast::Node;
use pretty_assertions::assert_eq;

const COUNTER: &str = include_str!("fixtures/counter.gsx");
const ERRORS: &str = include_str!("fixtures/errors.gsx");

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn gsx(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_gsx"))
        .args(args)
        .output()
        .expect("run gsx")
}

// =============================================================================
// Library pipeline
// =============================================================================

#[test]
fn test_counter_fixture_is_clean() {
    let (_, analysis) = gsx_analyzer::analyze_source("counter.gsx", COUNTER).unwrap();
    assert!(analysis.diagnostics.is_empty(), "{}", analysis.diagnostics);

    let names: Vec<_> = analysis.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Counter", "Panel", "App"]);
}

#[test]
fn test_counter_state_and_bindings() {
    let (_, analysis) = gsx_analyzer::analyze_source("counter.gsx", COUNTER).unwrap();
    let counter = analysis.component("Counter").unwrap();

    assert_eq!(counter.state_vars.len(), 1);
    assert_eq!(counter.state_vars[0].name, "count");
    assert_eq!(counter.state_vars[0].ty, "int");

    assert_eq!(counter.state_bindings.len(), 1);
    let binding = &counter.state_bindings[0];
    assert_eq!(binding.element_name, "Value");
    assert_eq!(binding.attribute, BoundAttribute::Text);
    assert_eq!(binding.state_vars, vec!["count"]);
}

#[test]
fn test_counter_element_names() {
    let (file, _) = gsx_analyzer::analyze_source("counter.gsx", COUNTER).unwrap();
    let counter = file.component("Counter").unwrap();
    // Each button reserves one extra slot for its text child.
    assert_eq!(
        element_names(&counter.body),
        vec!["__tmp_0", "Value", "__tmp_1", "__tmp_2", "__tmp_4"]
    );
}

#[test]
fn test_children_slot_and_let_reference() {
    let (file, analysis) = gsx_analyzer::analyze_source("counter.gsx", COUNTER).unwrap();

    assert!(analysis.component("Panel").unwrap().accepts_children);
    assert!(!analysis.component("Counter").unwrap().accepts_children);

    let app = analysis.component("App").unwrap();
    assert!(app.let_bindings[0].used);
    assert_eq!(app.named_refs[0].name, "Row");
    assert_eq!(app.named_refs[0].kind(), RefKind::List);

    let Node::Call(panel) = &file.component("App").unwrap().body[1] else {
        panic!("expected @Panel call");
    };
    assert!(matches!(&panel.children[0], Node::RawGoExpr(raw) if raw.code == "header"));
}

#[test]
fn test_counter_imports() {
    let (file, _) = gsx_analyzer::analyze_source("counter.gsx", COUNTER).unwrap();
    let paths: Vec<_> = file.imports.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "fmt",
            ImportKind::Element.path(),
            ImportKind::Layout.path(),
            ImportKind::Tui.path(),
        ]
    );
}

#[test]
fn test_errors_fixture() {
    let (_, analysis) = gsx_analyzer::analyze_source("errors.gsx", ERRORS).unwrap();
    let lines: Vec<String> = analysis.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "errors.gsx:4:14: error: unknown utility class \"flex-column\" (did you mean \"flex-col\"?)",
            "errors.gsx:5:3: error: unknown element tag <section>",
            "errors.gsx:6:9: error: unknown attribute colour (did you mean background?)",
            "errors.gsx:7:3: error: <hr> is a void element and cannot have children",
        ]
    );

    let first = analysis.diagnostics.iter().next().unwrap();
    assert_eq!(first.end.as_ref().map(|e| e.column), Some(25));
}

#[test]
fn test_parse_failure_is_reported_as_error() {
    let err = gsx_analyzer::analyze_source("x.gsx", "package ui\n\n@component X( {\n}\n")
        .unwrap_err();
    assert!(err.has_errors());
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn test_cli_check_ok() {
    let out = gsx(&["check", &fixture("counter.gsx")]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("OK:"));
}

#[test]
fn test_cli_check_errors_exit_nonzero() {
    let out = gsx(&["check", &fixture("errors.gsx")]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown element tag <section>"));
}

#[test]
fn test_cli_check_json() {
    let out = gsx(&["check", "--json", &fixture("errors.gsx")]);
    assert_eq!(out.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let list = value.as_array().unwrap();
    assert_eq!(list.len(), 4);
    assert_eq!(list[0]["severity"], "error");
    assert_eq!(list[0]["hint"], "did you mean \"flex-col\"?");
}

#[test]
fn test_cli_ast_json() {
    let out = gsx(&["ast", "--json", &fixture("counter.gsx")]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["components"][0]["name"], "Counter");
    assert_eq!(value["file"]["package"], "ui");
    assert_eq!(value["components"][0]["state_bindings"][0]["attribute"], "text");
}

#[test]
fn test_cli_ast_summary() {
    let out = gsx(&["ast", &fixture("counter.gsx")]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("component Panel (accepts children: yes)"));
    assert!(stdout.contains("  state count int = 0"));
    assert!(stdout.contains("  bind Value.text <- count"));
    assert!(stdout.contains("  ref Row <span> list"));
}

#[test]
fn test_cli_tokens() {
    let out = gsx(&["tokens", &fixture("errors.gsx")]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let first = stdout.lines().next().unwrap();
    assert_eq!(first, "1:1 'package' \"package\"");
}

#[test]
fn test_cli_missing_file() {
    let out = gsx(&["check", "does/not/exist.gsx"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("Error reading does/not/exist.gsx:"));
}
