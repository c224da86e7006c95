use crate::comment::Comment;
use crate::diagnostic::Diagnostics;
use crate::token::{keyword_or_ident, FileId, Position, Span, Token, TokenKind};
use crate::{LexError, LexErrorKind};

/// Pull-based lexer over a single source file.
///
/// Tokens are produced on demand by [`Lexer::next_token`]. Errors are
/// recorded and lexing continues from the failure point; comments are
/// buffered until the parser drains them with [`Lexer::take_comments`].
pub struct Lexer<'src> {
    file: FileId,
    source: &'src str,
    pos: usize,
    ch: Option<char>,
    line: usize,
    column: usize,
    token_start: usize,
    token_line: usize,
    token_column: usize,
    pending_comments: Vec<Comment>,
    /// End line of the most recently collected comment, cleared by any real token.
    last_comment_end_line: usize,
    errors: Vec<LexError>,
}

/// Snapshot of the scalar cursor state, used for lookahead.
#[derive(Clone, Copy)]
struct Cursor {
    pos: usize,
    ch: Option<char>,
    line: usize,
    column: usize,
    token_start: usize,
    token_line: usize,
    token_column: usize,
    last_comment_end_line: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(file: FileId, source: &'src str) -> Self {
        Self {
            file,
            source,
            pos: 0,
            ch: source.chars().next(),
            line: 1,
            column: 1,
            token_start: 0,
            token_line: 1,
            token_column: 1,
            pending_comments: Vec::new(),
            last_comment_end_line: 0,
            errors: Vec::new(),
        }
    }

    /// Lex the whole source, including the trailing `Eof`.
    pub fn tokenize(file: FileId, source: &str) -> Result<Vec<Token>, Diagnostics> {
        let mut lexer = Lexer::new(file, source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        let diagnostics = lexer.diagnostics();
        diagnostics.into_result().map(|()| tokens)
    }

    pub fn file(&self) -> &FileId {
        &self.file
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Byte offset of the cursor.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Current cursor location.
    pub fn position(&self) -> Position {
        Position::new(self.file.clone(), self.line, self.column)
    }

    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Recorded errors converted to diagnostics, in source order of discovery.
    pub fn diagnostics(&self) -> Diagnostics {
        self.errors
            .iter()
            .map(|e| e.to_diagnostic(&self.file))
            .collect::<Vec<_>>()
            .into()
    }

    /// Drain the buffered comments.
    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.pending_comments)
    }

    /// Raw source between two byte offsets, clamped to the source bounds.
    pub fn source_range(&self, start: usize, end: usize) -> &'src str {
        let end = end.min(self.source.len());
        if start >= end {
            return "";
        }
        self.source.get(start..end).unwrap_or("")
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start_token();

        let Some(c) = self.ch else {
            return self.make(TokenKind::Eof);
        };

        match c {
            '\n' => self.single(TokenKind::Newline),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '>' => self.single(TokenKind::RAngle),
            '=' => self.single(TokenKind::Equals),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '&' => self.single(TokenKind::Ampersand),
            '|' => self.single(TokenKind::Pipe),
            '*' => self.single(TokenKind::Star),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '!' => self.single(TokenKind::Bang),
            '#' => self.single(TokenKind::Hash),
            '<' if self.peek_char() == Some('/') => self.double(TokenKind::LAngleSlash),
            '<' => self.single(TokenKind::LAngle),
            '/' if self.peek_char() == Some('>') => self.double(TokenKind::SlashAngle),
            '/' => self.single(TokenKind::Slash),
            ':' if self.peek_char() == Some('=') => self.double(TokenKind::ColonEquals),
            ':' => self.single(TokenKind::Colon),
            '.' if self.peek_char().is_some_and(|p| p.is_ascii_digit()) => self.number(),
            '.' => self.single(TokenKind::Dot),
            '_' if self.peek_char().is_some_and(is_ident_char) => self.identifier(),
            '_' => self.single(TokenKind::Underscore),
            '@' => self.at_keyword(),
            '"' => self.string(),
            '\'' => self.rune(),
            '`' => self.raw_string(),
            c if is_letter(c) => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            other => {
                self.advance();
                self.fail(LexErrorKind::UnexpectedChar(other));
                self.make(TokenKind::Error(other.to_string()))
            }
        }
    }

    /// Lex one token ahead without moving the cursor, the comment buffer,
    /// or the error list.
    pub fn peek_token(&mut self) -> Token {
        let cursor = self.cursor();
        let comments = self.pending_comments.len();
        let errors = self.errors.len();

        let token = self.next_token();

        self.restore(cursor);
        self.pending_comments.truncate(comments);
        self.errors.truncate(errors);
        token
    }

    // --- Comments ---

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.ch {
                Some(' ' | '\t' | '\r') => self.advance(),
                Some('/') if self.peek_char() == Some('/') => self.line_comment(),
                Some('/') if self.peek_char() == Some('*') => self.block_comment(),
                _ => return,
            }
        }
    }

    pub(crate) fn skip_whitespace(&mut self) {
        self.skip_whitespace_and_comments();
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let blank_line_before = self.blank_line_before(line);

        while !matches!(self.ch, Some('\n') | None) {
            self.advance();
        }

        self.push_comment(start, line, column, false, blank_line_before);
    }

    fn block_comment(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let blank_line_before = self.blank_line_before(line);

        self.advance();
        self.advance();
        loop {
            match self.ch {
                None => {
                    let span = Span::new(start, self.pos, line, column);
                    self.errors
                        .push(LexError::new(LexErrorKind::UnterminatedBlockComment, span));
                    return;
                }
                Some('*') if self.peek_char() == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }

        self.push_comment(start, line, column, true, blank_line_before);
    }

    fn push_comment(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
        is_block: bool,
        blank_line_before: bool,
    ) {
        self.pending_comments.push(Comment {
            text: self.source[start..self.pos].to_string(),
            position: Position::new(self.file.clone(), line, column),
            offset: start,
            end_line: self.line,
            end_column: self.column,
            is_block,
            blank_line_before,
        });
        self.last_comment_end_line = self.line;
    }

    fn blank_line_before(&self, line: usize) -> bool {
        if let Some(last) = self.pending_comments.last() {
            return line > last.end_line + 1;
        }
        self.last_comment_end_line > 0 && line > self.last_comment_end_line + 1
    }

    // --- Scanners ---

    fn identifier(&mut self) -> Token {
        let start = self.pos;
        while self.ch.is_some_and(is_ident_char) {
            self.advance();
        }
        let kind = keyword_or_ident(&self.source[start..self.pos]);
        self.make(kind)
    }

    fn at_keyword(&mut self) -> Token {
        self.advance();
        let start = self.pos;
        while self.ch.is_some_and(is_letter) {
            self.advance();
        }
        let word = &self.source[start..self.pos];

        let kind = match word {
            "component" => TokenKind::AtComponent,
            "let" => TokenKind::AtLet,
            "for" => TokenKind::AtFor,
            "if" => TokenKind::AtIf,
            "else" => TokenKind::AtElse,
            _ if word.chars().next().is_some_and(char::is_uppercase) => {
                TokenKind::AtCall(word.to_string())
            }
            _ => {
                self.fail(LexErrorKind::UnknownDirective(word.to_string()));
                TokenKind::Error(format!("@{word}"))
            }
        };
        self.make(kind)
    }

    fn string(&mut self) -> Token {
        self.advance();
        let mut value = String::new();

        loop {
            match self.ch {
                None | Some('\n') => {
                    self.fail(LexErrorKind::UnterminatedString);
                    return self.make(TokenKind::Error(value));
                }
                Some('"') => {
                    self.advance();
                    return self.make(TokenKind::String(value));
                }
                Some('\\') => {
                    self.advance();
                    if let Some(escaped) = self.ch {
                        match unescape(escaped, '"') {
                            Some(c) => value.push(c),
                            None => {
                                value.push('\\');
                                value.push(escaped);
                            }
                        }
                        self.advance();
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn rune(&mut self) -> Token {
        self.advance();

        let value = match self.ch {
            Some('\\') => {
                self.advance();
                let Some(escaped) = self.ch else {
                    self.fail(LexErrorKind::UnterminatedRune);
                    return self.make(TokenKind::Error(String::new()));
                };
                self.advance();
                unescape(escaped, '\'').unwrap_or(escaped)
            }
            Some('\'') => {
                self.advance();
                self.fail(LexErrorKind::EmptyRune);
                return self.make(TokenKind::Error(String::new()));
            }
            None => {
                self.fail(LexErrorKind::EmptyRune);
                return self.make(TokenKind::Error(String::new()));
            }
            Some(c) => {
                self.advance();
                c
            }
        };

        if self.ch != Some('\'') {
            self.fail(LexErrorKind::UnterminatedRune);
            return self.make(TokenKind::Error(value.to_string()));
        }
        self.advance();
        self.make(TokenKind::Rune(value.to_string()))
    }

    fn raw_string(&mut self) -> Token {
        self.advance();
        let start = self.pos;
        while !matches!(self.ch, Some('`') | None) {
            self.advance();
        }
        let literal = self.source[start..self.pos].to_string();

        if self.ch.is_none() {
            self.fail(LexErrorKind::UnterminatedRawString);
            return self.make(TokenKind::Error(literal));
        }
        self.advance();
        self.make(TokenKind::RawString(literal))
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        let mut is_float = false;

        if self.ch == Some('.') {
            is_float = true;
            self.advance();
        }
        self.digits();

        if self.ch == Some('.') && !is_float {
            is_float = true;
            self.advance();
            self.digits();
        }

        if matches!(self.ch, Some('e' | 'E')) {
            is_float = true;
            self.advance();
            if matches!(self.ch, Some('+' | '-')) {
                self.advance();
            }
            self.digits();
        }

        let literal = self.source[start..self.pos].to_string();
        if is_float {
            self.make(TokenKind::Float(literal))
        } else {
            self.make(TokenKind::Int(literal))
        }
    }

    fn digits(&mut self) {
        while self.ch.is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    // --- Helpers ---

    pub(crate) fn current_char(&self) -> Option<char> {
        self.ch
    }

    pub(crate) fn peek_char(&self) -> Option<char> {
        let c = self.ch?;
        self.source[self.pos + c.len_utf8()..].chars().next()
    }

    pub(crate) fn advance(&mut self) {
        let Some(c) = self.ch else {
            return;
        };
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.ch = self.source[self.pos..].chars().next();
    }

    pub(crate) fn start_token(&mut self) {
        self.token_start = self.pos;
        self.token_line = self.line;
        self.token_column = self.column;
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        self.advance();
        self.make(kind)
    }

    fn double(&mut self, kind: TokenKind) -> Token {
        self.advance();
        self.advance();
        self.make(kind)
    }

    pub(crate) fn make(&mut self, kind: TokenKind) -> Token {
        if !matches!(kind, TokenKind::Newline | TokenKind::Eof) {
            self.last_comment_end_line = 0;
        }
        Token::new(kind, self.token_span())
    }

    pub(crate) fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.pos,
            self.token_line,
            self.token_column,
        )
    }

    /// Record an error spanning the token scanned so far.
    pub(crate) fn fail(&mut self, kind: LexErrorKind) {
        let span = self.token_span();
        self.errors.push(LexError::new(kind, span));
    }

    fn cursor(&self) -> Cursor {
        Cursor {
            pos: self.pos,
            ch: self.ch,
            line: self.line,
            column: self.column,
            token_start: self.token_start,
            token_line: self.token_line,
            token_column: self.token_column,
            last_comment_end_line: self.last_comment_end_line,
        }
    }

    fn restore(&mut self, cursor: Cursor) {
        self.pos = cursor.pos;
        self.ch = cursor.ch;
        self.line = cursor.line;
        self.column = cursor.column;
        self.token_start = cursor.token_start;
        self.token_line = cursor.token_line;
        self.token_column = cursor.token_column;
        self.last_comment_end_line = cursor.last_comment_end_line;
    }

    /// Move the cursor to `offset`, recomputing line and column by rescanning
    /// the source up to it.
    ///
    /// Comments and errors found at or after `discard_from` belonged to
    /// lookahead tokens that will be lexed again, so they are dropped.
    pub(crate) fn seek(&mut self, offset: usize, discard_from: usize) {
        let offset = offset.min(self.source.len());
        let before = &self.source[..offset];

        self.line = 1 + before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        self.column = 1 + before[line_start..].chars().count();
        self.pos = offset;
        self.ch = self.source[offset..].chars().next();

        self.pending_comments.retain(|c| c.offset < discard_from);
        self.errors.retain(|e| e.span.start < discard_from);
        tracing::trace!(offset, discard_from, line = self.line, "lexer seek");
    }
}

fn is_letter(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Decode the character after a backslash. `None` keeps the escape verbatim.
fn unescape(c: char, quote: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '0' => Some('\0'),
        c if c == quote => Some(quote),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lexer(source: &str) -> Lexer<'_> {
        Lexer::new(FileId::new("test.gsx"), source)
    }

    /// Helper: lex everything and return token kinds.
    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lx = lexer(source);
        let mut out = Vec::new();
        loop {
            let tok = lx.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                return out;
            }
        }
    }

    /// Helper: lex everything and return the error messages.
    fn errors(source: &str) -> Vec<String> {
        let mut lx = lexer(source);
        while lx.next_token().kind != TokenKind::Eof {}
        lx.errors().iter().map(|e| e.kind.to_string()).collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    // =========================================================================
    // Structure and punctuation
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_newlines_are_tokens() {
        assert_eq!(
            kinds("a\n\tb\r\n"),
            vec![
                ident("a"),
                TokenKind::Newline,
                ident("b"),
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_two_char_tokens() {
        assert_eq!(
            kinds("x := </ />"),
            vec![
                ident("x"),
                TokenKind::ColonEquals,
                TokenKind::LAngleSlash,
                TokenKind::SlashAngle,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_single_char_punctuation() {
        assert_eq!(
            kinds("(){}[]<>/=,.:;&|*+-!#_"),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LAngle,
                TokenKind::RAngle,
                TokenKind::Slash,
                TokenKind::Equals,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Star,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Bang,
                TokenKind::Hash,
                TokenKind::Underscore,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(kinds("$"), vec![TokenKind::Error("$".into()), TokenKind::Eof]);
        assert_eq!(errors("$"), vec!["unexpected character '$'"]);
    }

    // =========================================================================
    // Identifiers, keywords, directives
    // =========================================================================

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("package import func templ type const var return if else for range"),
            vec![
                TokenKind::Package,
                TokenKind::Import,
                TokenKind::Func,
                TokenKind::Templ,
                TokenKind::Type,
                TokenKind::Const,
                TokenKind::Var,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::Range,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_underscore_identifier() {
        assert_eq!(kinds("_x _"), vec![ident("_x"), TokenKind::Underscore, TokenKind::Eof]);
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            kinds("@component @let @for @if @else @Card"),
            vec![
                TokenKind::AtComponent,
                TokenKind::AtLet,
                TokenKind::AtFor,
                TokenKind::AtIf,
                TokenKind::AtElse,
                TokenKind::AtCall("Card".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unknown_lowercase_directive() {
        assert_eq!(
            kinds("@bogus"),
            vec![TokenKind::Error("@bogus".into()), TokenKind::Eof]
        );
        assert_eq!(errors("@bogus"), vec!["unknown @ keyword: @bogus"]);
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"q\"\\ \x""#),
            vec![TokenKind::String("a\nb\t\"q\"\\ \\x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_newline() {
        assert_eq!(errors("\"abc\nx"), vec!["unterminated string literal"]);
        // lexing resumes on the next line
        assert_eq!(
            kinds("\"abc\nx"),
            vec![
                TokenKind::Error("abc".into()),
                TokenKind::Newline,
                ident("x"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_string_eof() {
        assert_eq!(errors("\"abc"), vec!["unterminated string literal"]);
    }

    #[test]
    fn test_runes() {
        assert_eq!(
            kinds(r"'a' '\n' '\''"),
            vec![
                TokenKind::Rune("a".into()),
                TokenKind::Rune("\n".into()),
                TokenKind::Rune("'".into()),
                TokenKind::Eof
            ]
        );
        assert_eq!(errors("''"), vec!["empty rune literal"]);
        assert_eq!(errors("'ab"), vec!["unterminated rune literal"]);
    }

    #[test]
    fn test_raw_string() {
        assert_eq!(
            kinds("`a\\n\nb`"),
            vec![TokenKind::RawString("a\\n\nb".into()), TokenKind::Eof]
        );
        assert_eq!(errors("`abc"), vec!["unterminated raw string literal"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.14 .5 1e9 2.5E-3"),
            vec![
                TokenKind::Int("42".into()),
                TokenKind::Float("3.14".into()),
                TokenKind::Float(".5".into()),
                TokenKind::Float("1e9".into()),
                TokenKind::Float("2.5E-3".into()),
                TokenKind::Eof
            ]
        );
    }

    // =========================================================================
    // Positions
    // =========================================================================

    #[test]
    fn test_positions_are_one_based() {
        let mut lx = lexer("package ui\n  <div>");
        let pkg = lx.next_token();
        assert_eq!((pkg.span.line, pkg.span.column), (1, 1));
        let name = lx.next_token();
        assert_eq!((name.span.line, name.span.column), (1, 9));
        assert_eq!((name.span.start, name.span.end), (8, 10));
        lx.next_token(); // newline
        let angle = lx.next_token();
        assert_eq!((angle.span.line, angle.span.column), (2, 3));
    }

    #[test]
    fn test_columns_count_chars() {
        let mut lx = lexer("\"héllo\" x");
        lx.next_token();
        let x = lx.next_token();
        assert_eq!(x.span.column, 9);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut lx = lexer("a // note\nb");
        let peeked = lx.peek_token();
        assert_eq!(peeked.kind, ident("a"));
        assert_eq!(lx.next_token().kind, ident("a"));
        let newline = lx.peek_token();
        assert_eq!(newline.kind, TokenKind::Newline);
        // peeking lexed past the comment but must not keep it
        assert!(lx.take_comments().is_empty());
        assert_eq!(lx.next_token().kind, TokenKind::Newline);
        assert_eq!(lx.take_comments().len(), 1);
    }

    #[test]
    fn test_peek_discards_errors() {
        let mut lx = lexer("$");
        lx.peek_token();
        assert!(lx.errors().is_empty());
        lx.next_token();
        assert_eq!(lx.errors().len(), 1);
    }

    #[test]
    fn test_source_range_clamps() {
        let lx = lexer("hello");
        assert_eq!(lx.source_range(1, 3), "el");
        assert_eq!(lx.source_range(2, 100), "llo");
        assert_eq!(lx.source_range(4, 2), "");
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[test]
    fn test_comments_are_not_tokens() {
        assert_eq!(
            kinds("a // trailing\n/* block */ b"),
            vec![ident("a"), TokenKind::Newline, ident("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment_fields() {
        let mut lx = lexer("  // first\n/* second\n line */x");
        while lx.next_token().kind != TokenKind::Eof {}
        let comments = lx.take_comments();
        assert_eq!(comments.len(), 2);

        assert_eq!(comments[0].text, "// first");
        assert_eq!((comments[0].position.line, comments[0].position.column), (1, 3));
        assert!(!comments[0].is_block);

        assert!(comments[1].is_block);
        assert_eq!(comments[1].position.line, 2);
        assert_eq!(comments[1].end_line, 3);
        assert_eq!(comments[1].content(), "second\n line");
    }

    #[test]
    fn test_blank_line_before() {
        let mut lx = lexer("// a\n// b\n\n// c\n");
        while lx.next_token().kind != TokenKind::Eof {}
        let comments = lx.take_comments();
        let flags: Vec<bool> = comments.iter().map(|c| c.blank_line_before).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_blank_line_across_drained_batches() {
        let mut lx = lexer("// a\n\n// b\n");
        lx.next_token(); // newline after a
        assert_eq!(lx.take_comments().len(), 1);
        while lx.next_token().kind != TokenKind::Eof {}
        let rest = lx.take_comments();
        assert!(rest[0].blank_line_before);
    }

    #[test]
    fn test_code_between_comments_resets_blank_tracking() {
        let mut lx = lexer("// a\nx\n\n// b\n");
        while lx.next_token().kind != TokenKind::Ident("x".into()) {}
        lx.take_comments();
        while lx.next_token().kind != TokenKind::Eof {}
        let rest = lx.take_comments();
        assert!(!rest[0].blank_line_before);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(errors("/* never"), vec!["unterminated block comment"]);
    }

    #[test]
    fn test_tokenize_reports_diagnostics() {
        let err = Lexer::tokenize(FileId::new("bad.gsx"), "x\n  @oops").unwrap_err();
        assert_eq!(err.to_string(), "bad.gsx:2:3: error: unknown @ keyword: @oops");
    }
}
