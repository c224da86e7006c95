use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Name of the source file a position belongs to.
///
/// Cheap to clone; every token and AST node carries one through its [`Position`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FileId(Arc<str>);

impl FileId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A 1-based line/column location in a named source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub file: FileId,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: FileId, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }

    /// The same location shifted `columns` to the right on the same line.
    pub fn offset_columns(&self, columns: usize) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line,
            column: self.column + columns,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Byte range of a token plus the line/column where it starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn position(&self, file: &FileId) -> Position {
        Position::new(file.clone(), self.line, self.column)
    }
}

/// Token classification for GSX source.
///
/// Variants that need their source text carry it directly; fixed punctuation
/// and keywords are recovered through [`TokenKind::text`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structure
    Eof,
    Newline,
    /// Lexing failed; carries whatever text was read before the failure.
    Error(String),

    // Keywords
    Package,
    Import,
    Func,
    Return,
    If,
    Else,
    For,
    Range,
    Templ,
    Type,
    Const,
    Var,

    // Directives
    AtComponent,
    AtLet,
    AtFor,
    AtIf,
    AtElse,
    /// `@Name` with an uppercase first letter: a component call.
    AtCall(String),

    // Literals (carry data)
    Ident(String),
    Int(String),
    Float(String),
    /// Unescaped contents of a double-quoted string.
    String(String),
    RawString(String),
    Rune(String),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
    Slash,
    Equals,
    Comma,
    Dot,
    Colon,
    Semicolon,
    ColonEquals,
    Ampersand,
    Pipe,
    Star,
    Plus,
    Minus,
    Bang,
    Underscore,
    Hash,
    SlashAngle,
    LAngleSlash,

    /// Raw embedded expression text between balanced braces.
    GoExpr(String),
}

impl TokenKind {
    /// The literal text of the token as it appears in text content.
    pub fn text(&self) -> &str {
        match self {
            TokenKind::Eof => "",
            TokenKind::Newline => "\n",
            TokenKind::Error(s)
            | TokenKind::AtCall(s)
            | TokenKind::Ident(s)
            | TokenKind::Int(s)
            | TokenKind::Float(s)
            | TokenKind::String(s)
            | TokenKind::RawString(s)
            | TokenKind::Rune(s)
            | TokenKind::GoExpr(s) => s,
            TokenKind::Package => "package",
            TokenKind::Import => "import",
            TokenKind::Func => "func",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::Range => "range",
            TokenKind::Templ => "templ",
            TokenKind::Type => "type",
            TokenKind::Const => "const",
            TokenKind::Var => "var",
            TokenKind::AtComponent => "@component",
            TokenKind::AtLet => "@let",
            TokenKind::AtFor => "@for",
            TokenKind::AtIf => "@if",
            TokenKind::AtElse => "@else",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LAngle => "<",
            TokenKind::RAngle => ">",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Slash => "/",
            TokenKind::Equals => "=",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::ColonEquals => ":=",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Star => "*",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Underscore => "_",
            TokenKind::Hash => "#",
            TokenKind::SlashAngle => "/>",
            TokenKind::LAngleSlash => "</",
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Package
                | TokenKind::Import
                | TokenKind::Func
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::Range
                | TokenKind::Templ
                | TokenKind::Type
                | TokenKind::Const
                | TokenKind::Var
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => f.write_str("end of file"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Error(_) => f.write_str("invalid token"),
            TokenKind::AtCall(name) => write!(f, "@{name}"),
            TokenKind::Ident(_) => f.write_str("identifier"),
            TokenKind::Int(_) => f.write_str("integer"),
            TokenKind::Float(_) => f.write_str("float"),
            TokenKind::String(_) => f.write_str("string"),
            TokenKind::RawString(_) => f.write_str("raw string"),
            TokenKind::Rune(_) => f.write_str("rune"),
            TokenKind::GoExpr(_) => f.write_str("Go expression"),
            other => write!(f, "'{}'", other.text()),
        }
    }
}

/// A token produced by the GSX lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn text(&self) -> &str {
        self.kind.text()
    }
}

/// Map an identifier to its keyword kind, or `Ident` if it is not reserved.
pub fn keyword_or_ident(word: &str) -> TokenKind {
    match word {
        "package" => TokenKind::Package,
        "import" => TokenKind::Import,
        "func" => TokenKind::Func,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "range" => TokenKind::Range,
        "templ" => TokenKind::Templ,
        "type" => TokenKind::Type,
        "const" => TokenKind::Const,
        "var" => TokenKind::Var,
        _ => TokenKind::Ident(word.to_string()),
    }
}
