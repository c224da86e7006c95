//! GSX Lexer
//!
//! Tokenizes `.gsx` component sources into positioned tokens, one at a time.
//! Handles keywords, the `@` directive set, string/rune/raw-string/number
//! literals, and balanced-brace extraction of embedded Go expressions.
//! Comments are not tokens: they are buffered on a side channel for the
//! parser to attach to nodes.
//!
//! # Example
//!
//! ```
//! use gsx_lexer::{FileId, Lexer, TokenKind};
//!
//! let tokens = Lexer::tokenize(FileId::new("app.gsx"), "package ui").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Package);
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! ```

pub mod comment;
pub mod diagnostic;
mod expr;
pub mod lexer;
pub mod token;

pub use comment::{group_comments, Comment, CommentGroup};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use lexer::Lexer;
pub use token::{keyword_or_ident, FileId, Position, Span, Token, TokenKind};

/// Lexer error with the span of the offending text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lex error at line {line}, column {column}: {kind}", line = .span.line, column = .span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            LexErrorKind::UnbalancedParens | LexErrorKind::UnbalancedBrackets => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn to_diagnostic(&self, file: &FileId) -> Diagnostic {
        let position = self.span.position(file);
        match self.severity() {
            Severity::Error => Diagnostic::error(position, self.kind.to_string()),
            Severity::Warning => Diagnostic::warning(position, self.kind.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unknown @ keyword: @{0}")]
    UnknownDirective(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("empty rune literal")]
    EmptyRune,
    #[error("unterminated rune literal")]
    UnterminatedRune,
    #[error("unterminated raw string literal")]
    UnterminatedRawString,
    #[error("unterminated block comment")]
    UnterminatedBlockComment,
    #[error("unterminated Go expression: unmatched '{{'")]
    UnterminatedExpr,
    #[error("unterminated Go expression: unmatched parentheses")]
    UnbalancedParens,
    #[error("unterminated Go expression: unmatched brackets")]
    UnbalancedBrackets,
    #[error("unterminated braces: unmatched '{{'")]
    UnterminatedBraces,
    #[error("expected '{{' at start of balanced braces")]
    ExpectedBrace,
}
