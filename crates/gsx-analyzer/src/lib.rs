//! GSX Analyzer
//!
//! Semantic checks and annotations over a parsed [`File`]: children slots,
//! `@let` references, named refs, tag/attribute/class validation, reactive
//! state detection, and the runtime imports generated code will need.
//!
//! ```text
//! source → parse() → File → Analyzer::analyze() → (annotated File, Analysis)
//! ```
//!
//! # Example
//!
//! ```
//! let source = "package ui\n\n@component Counter() {\n\tcount := tui.NewState(0)\n\t<span>{count.Get()}</span>\n}\n";
//! let (file, analysis) = gsx_analyzer::analyze_source("counter.gsx", source).unwrap();
//! assert!(analysis.diagnostics.is_empty());
//! assert_eq!(analysis.components[0].state_bindings[0].state_vars, ["count"]);
//! assert!(file.has_import("github.com/grindlemire/go-tui/pkg/tui"));
//! ```

pub mod analyzer;
pub mod classes;
pub mod naming;
pub mod refs;
pub mod schema;
pub mod state;

pub use analyzer::{Analysis, Analyzer, ComponentInfo, LetInfo};
pub use classes::{ClassTranslation, ClassTranslator, ImportKind, UtilityClasses};
pub use naming::{element_names, visit_elements, NamedElement};
pub use refs::{infer_key_type, KeyType, NamedRef, RefKind};
pub use schema::{is_known_attribute, is_known_tag, is_void_tag, suggest_attribute};
pub use state::{infer_state_type, BoundAttribute, StateBinding, StateVar};

use gsx_lexer::Diagnostics;
use gsx_parser::File;

/// Parse and analyze `source` in one step.
///
/// Fails with the parse diagnostics when parsing produced any error. On
/// success, parse warnings are merged ahead of the analysis diagnostics,
/// which may themselves contain errors.
pub fn analyze_source(name: &str, source: &str) -> Result<(File, Analysis), Diagnostics> {
    let parsed = gsx_parser::parse(name, source);
    let parse_diagnostics = parsed.diagnostics;
    let mut file = match parsed.file {
        Some(file) if !parse_diagnostics.has_errors() => file,
        _ => return Err(parse_diagnostics),
    };

    let mut analysis = Analyzer::new().analyze(&mut file);
    let mut diagnostics = parse_diagnostics;
    diagnostics.extend(analysis.diagnostics);
    analysis.diagnostics = diagnostics;
    Ok((file, analysis))
}
