//! GSX Parser
//!
//! Parses `.gsx` sources into a [`File`] AST by recursive descent over the
//! lexer's token stream. The parser recovers from errors: a malformed
//! declaration is reported and skipped so later components still parse.
//! Comments collected by the lexer are attached to the nodes they precede,
//! to the line they trail, or kept as orphan groups.
//!
//! # Example
//!
//! ```
//! let parsed = gsx_parser::parse("app.gsx", "package ui\n\n@component Hello() {\n\t<span>Hi</span>\n}\n");
//! let file = parsed.into_result().unwrap();
//! assert_eq!(file.components[0].name, "Hello");
//! ```

pub mod ast;
pub mod parser;

pub use ast::{AttrValue, Component, Element, File, Node};
pub use parser::{Parsed, Parser};

use gsx_lexer::{Diagnostic, FileId, Lexer, Position};

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::error(err.position, err.message)
    }
}

/// Parse `source` as the file `name`.
pub fn parse(name: &str, source: &str) -> Parsed {
    Parser::new(Lexer::new(FileId::new(name), source)).parse_file()
}
