//! Raw extraction of embedded Go expressions and statements.
//!
//! Embedded code is never tokenized: the parser asks for the raw text
//! between balanced braces and the lexer scans for the matching `}`,
//! skipping over string, raw-string and rune literals so that braces
//! inside quotes do not count.

use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};
use crate::{LexError, LexErrorKind};

impl<'src> Lexer<'src> {
    /// Read an expression whose opening `{` was already consumed.
    ///
    /// Returns a `GoExpr` token holding the raw text and leaves the cursor
    /// past the closing `}`. An unclosed brace yields an `Error` token.
    pub fn read_go_expr(&mut self) -> Token {
        self.start_token();
        let start = self.offset();
        let mut braces = 1i32;
        let mut parens = 0i32;
        let mut brackets = 0i32;

        while let Some(c) = self.current_char() {
            match c {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                '[' => brackets += 1,
                ']' => brackets -= 1,
                '"' => {
                    self.skip_string();
                    continue;
                }
                '`' => {
                    self.skip_raw_string();
                    continue;
                }
                '\'' => {
                    self.skip_rune();
                    continue;
                }
                _ => {}
            }
            if braces == 0 {
                break;
            }
            self.advance();
        }

        let text = self.source_range(start, self.offset()).to_string();
        if braces != 0 {
            self.fail(LexErrorKind::UnterminatedExpr);
            return self.make(TokenKind::Error(text));
        }
        if parens != 0 {
            self.fail(LexErrorKind::UnbalancedParens);
        }
        if brackets != 0 {
            self.fail(LexErrorKind::UnbalancedBrackets);
        }

        let token = self.make(TokenKind::GoExpr(text));
        self.advance();
        token
    }

    /// Read the contents of balanced braces starting at the cursor, which
    /// must sit on the opening `{`.
    pub fn read_balanced_braces(&mut self) -> Result<&'src str, LexError> {
        self.start_token();
        if self.current_char() != Some('{') {
            return Err(LexError::new(LexErrorKind::ExpectedBrace, self.token_span()));
        }
        self.advance();

        let start = self.offset();
        let mut depth = 1;
        while let Some(c) = self.current_char() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                '"' => {
                    self.skip_string();
                    continue;
                }
                '`' => {
                    self.skip_raw_string();
                    continue;
                }
                '\'' => {
                    self.skip_rune();
                    continue;
                }
                _ => {}
            }
            self.advance();
        }

        if depth != 0 {
            return Err(LexError::new(LexErrorKind::UnterminatedBraces, self.token_span()));
        }
        let content = self.source_range(start, self.offset());
        self.advance();
        Ok(content)
    }

    /// Raw source from the cursor up to (not including) the next `{` or
    /// newline. Used for `@if` conditions and `@for` iterables.
    pub fn read_until_brace(&mut self) -> &'src str {
        self.skip_whitespace();
        let start = self.offset();
        while !matches!(self.current_char(), Some('{' | '\n') | None) {
            self.advance();
        }
        self.source_range(start, self.offset())
    }

    /// Read balanced brace contents starting from an explicit byte offset
    /// that must point at the opening `{`.
    ///
    /// The cursor moves past the matching `}` with line and column
    /// recomputed by rescanning. Anything the lexer buffered from beyond
    /// `offset` (lookahead comments and errors) is discarded. On failure
    /// the cursor moves to end of input, since an unclosed brace swallows
    /// the rest of the file.
    pub fn read_balanced_braces_from(&mut self, offset: usize) -> Result<&'src str, LexError> {
        let source = self.source();
        let bytes = source.as_bytes();
        let brace_span = self.span_at(offset);
        if bytes.get(offset) != Some(&b'{') {
            return Err(LexError::new(LexErrorKind::ExpectedBrace, brace_span));
        }

        let content_start = offset + 1;
        let mut pos = content_start;
        let mut depth = 1;
        while pos < bytes.len() {
            match bytes[pos] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                b'"' => {
                    pos = skip_quoted(bytes, pos, b'"');
                    continue;
                }
                b'`' => {
                    pos = skip_raw(bytes, pos);
                    continue;
                }
                b'\'' => {
                    pos = skip_rune_bytes(bytes, pos);
                    continue;
                }
                _ => {}
            }
            pos += 1;
        }

        if depth != 0 {
            self.seek(source.len(), offset);
            return Err(LexError::new(LexErrorKind::UnterminatedBraces, brace_span));
        }

        self.seek(pos + 1, offset);
        Ok(&source[content_start..pos])
    }

    fn span_at(&self, offset: usize) -> Span {
        let before = self.source_range(0, offset);
        let line = 1 + before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = 1 + before[line_start..].chars().count();
        Span::new(offset, offset + 1, line, column)
    }

    // --- Literal skipping ---

    fn skip_string(&mut self) {
        self.advance();
        while !matches!(self.current_char(), Some('"') | None) {
            if self.current_char() == Some('\\') {
                self.advance();
            }
            self.advance();
        }
        self.advance();
    }

    fn skip_raw_string(&mut self) {
        self.advance();
        while !matches!(self.current_char(), Some('`') | None) {
            self.advance();
        }
        self.advance();
    }

    fn skip_rune(&mut self) {
        self.advance();
        if self.current_char() == Some('\\') {
            self.advance();
        }
        self.advance();
        if self.current_char() == Some('\'') {
            self.advance();
        }
    }
}

/// Index just past a quoted literal starting at `pos`.
fn skip_quoted(bytes: &[u8], mut pos: usize, quote: u8) -> usize {
    pos += 1;
    while pos < bytes.len() && bytes[pos] != quote {
        pos += if bytes[pos] == b'\\' { 2 } else { 1 };
    }
    (pos + 1).min(bytes.len())
}

fn skip_raw(bytes: &[u8], mut pos: usize) -> usize {
    pos += 1;
    while pos < bytes.len() && bytes[pos] != b'`' {
        pos += 1;
    }
    (pos + 1).min(bytes.len())
}

fn skip_rune_bytes(bytes: &[u8], mut pos: usize) -> usize {
    pos += 1;
    if bytes.get(pos) == Some(&b'\\') {
        pos += 2;
    } else if pos < bytes.len() {
        // a multi-byte rune: step over the whole UTF-8 sequence
        pos += utf8_len(bytes[pos]);
    }
    if bytes.get(pos) == Some(&b'\'') {
        pos += 1;
    }
    pos.min(bytes.len())
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use crate::token::FileId;
    use crate::{Lexer, TokenKind};
    use pretty_assertions::assert_eq;

    fn lexer(source: &str) -> Lexer<'_> {
        Lexer::new(FileId::new("expr.gsx"), source)
    }

    // =========================================================================
    // read_go_expr: opening brace already consumed
    // =========================================================================

    #[test]
    fn test_go_expr_simple() {
        let mut lx = lexer("{count + 1} rest");
        assert_eq!(lx.next_token().kind, TokenKind::LBrace);
        let tok = lx.read_go_expr();
        assert_eq!(tok.kind, TokenKind::GoExpr("count + 1".into()));
        assert_eq!(lx.next_token().kind, TokenKind::Ident("rest".into()));
    }

    #[test]
    fn test_go_expr_nested_and_quoted_braces() {
        let mut lx = lexer(r#"{fmt.Sprintf("}{%d", m["k"]) + len(`}`) + '}'} x"#);
        lx.next_token();
        let tok = lx.read_go_expr();
        assert_eq!(
            tok.kind,
            TokenKind::GoExpr(r#"fmt.Sprintf("}{%d", m["k"]) + len(`}`) + '}'"#.into())
        );
        assert!(lx.errors().is_empty());
    }

    #[test]
    fn test_go_expr_struct_literal() {
        let mut lx = lexer("{Item{Name: \"a\"}}");
        lx.next_token();
        assert_eq!(
            lx.read_go_expr().kind,
            TokenKind::GoExpr("Item{Name: \"a\"}".into())
        );
    }

    #[test]
    fn test_go_expr_unterminated() {
        let mut lx = lexer("{foo(bar");
        lx.next_token();
        let tok = lx.read_go_expr();
        assert_eq!(tok.kind, TokenKind::Error("foo(bar".into()));
        let messages: Vec<String> = lx.errors().iter().map(|e| e.kind.to_string()).collect();
        assert_eq!(messages, vec!["unterminated Go expression: unmatched '{'"]);
    }

    #[test]
    fn test_go_expr_unbalanced_parens_is_warning() {
        let mut lx = lexer("{f(x}");
        lx.next_token();
        assert_eq!(lx.read_go_expr().kind, TokenKind::GoExpr("f(x".into()));
        let diags = lx.diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(!diags.has_errors());
    }

    // =========================================================================
    // read_balanced_braces / read_until_brace
    // =========================================================================

    #[test]
    fn test_balanced_braces_at_cursor() {
        let mut lx = lexer("{ a { b } \"}\" } tail");
        assert_eq!(lx.read_balanced_braces().unwrap(), " a { b } \"}\" ");
        assert_eq!(lx.next_token().kind, TokenKind::Ident("tail".into()));
    }

    #[test]
    fn test_balanced_braces_requires_open_brace() {
        let mut lx = lexer("x");
        let err = lx.read_balanced_braces().unwrap_err();
        assert_eq!(err.kind.to_string(), "expected '{' at start of balanced braces");
    }

    #[test]
    fn test_read_until_brace() {
        let mut lx = lexer("  len(items) > 0 {");
        assert_eq!(lx.read_until_brace(), "len(items) > 0 ");
        assert_eq!(lx.next_token().kind, TokenKind::LBrace);
    }

    // =========================================================================
    // read_balanced_braces_from: explicit offset with rescan
    // =========================================================================

    #[test]
    fn test_from_offset_recomputes_position() {
        let source = "<p>\n  {items[\n0]}\n  done";
        let mut lx = lexer(source);
        // run the cursor past the brace, as parser lookahead does
        for _ in 0..6 {
            lx.next_token();
        }
        let offset = source.find('{').unwrap();
        assert_eq!(lx.read_balanced_braces_from(offset).unwrap(), "items[\n0]");

        assert_eq!(lx.next_token().kind, TokenKind::Newline);
        let done = lx.next_token();
        assert_eq!(done.kind, TokenKind::Ident("done".into()));
        assert_eq!((done.span.line, done.span.column), (4, 3));
    }

    #[test]
    fn test_from_offset_drops_lookahead_comments_and_errors() {
        let source = "// keep\n{ x /* inner */ \"oops\n }";
        let mut lx = lexer(source);
        // lex the newline, the brace, then one lookahead past it
        lx.next_token();
        lx.next_token();
        lx.next_token();
        lx.next_token();
        assert_eq!(lx.errors().len(), 1);

        let offset = source.find('{').unwrap();
        let err = lx.read_balanced_braces_from(offset).unwrap_err();
        assert_eq!(err.kind.to_string(), "unterminated braces: unmatched '{'");
        assert_eq!((err.span.line, err.span.column), (2, 1));

        // the string error came from lookahead past the brace
        assert!(lx.errors().is_empty());
        let comments = lx.take_comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "// keep");
        assert_eq!(lx.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_from_offset_skips_multibyte_runes() {
        let source = "{'}' + 'é'} x";
        let mut lx = lexer(source);
        assert_eq!(lx.read_balanced_braces_from(0).unwrap(), "'}' + 'é'");
        let x = lx.next_token();
        assert_eq!(x.kind, TokenKind::Ident("x".into()));
        assert_eq!(x.span.column, 13);
    }

    #[test]
    fn test_from_offset_rejects_bad_offset() {
        let mut lx = lexer("abc");
        let err = lx.read_balanced_braces_from(1).unwrap_err();
        assert_eq!(err.kind.to_string(), "expected '{' at start of balanced braces");
    }
}
