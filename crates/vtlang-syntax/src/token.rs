//! Token types and source span tracking for the vtlang lexer.

use std::fmt;

/// A span in the source code, tracking byte offsets and line/column.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, in characters not bytes).
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A dummy span for synthesized nodes.
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: if self.line <= other.line {
                self.column
            } else {
                other.column
            },
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The kind of token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // === Keywords ===
    /// `assert`
    Assert,

    // === Literals and names ===
    /// Identifier, bare or backtick-quoted.
    Ident(String),
    /// Variable reference `$name` (the name is stored without `$`).
    Var(String),
    /// Integer literal.
    Integer(i64),
    /// String literal with escapes resolved.
    StringLit(String),

    // === Operators and punctuation ===
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<:`
    SubtypeOf,
    /// `-`
    Minus,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,

    // === Trivia and sentinels ===
    /// `// ...` comment.
    Comment(String),
    /// A malformed lexeme, with a description of the problem.
    Error(String),
    Eof,
}

impl TokenKind {
    /// Tokens the parser never sees.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Comment(_))
    }

    pub fn keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "assert" => Some(TokenKind::Assert),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Assert => write!(f, "'assert'"),
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Var(name) => write!(f, "variable '${}'", name),
            TokenKind::Integer(n) => write!(f, "integer {}", n),
            TokenKind::StringLit(s) => write!(f, "string {:?}", s),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::BangEq => write!(f, "'!='"),
            TokenKind::SubtypeOf => write!(f, "'<:'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comment(_) => write!(f, "comment"),
            TokenKind::Error(msg) => write!(f, "invalid token ({})", msg),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
