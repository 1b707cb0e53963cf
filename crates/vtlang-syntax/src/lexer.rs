//! Lexer for the vtlang assertion language.
//!
//! Converts source text into a stream of tokens.

use crate::token::{Span, Token, TokenKind};
use std::str::Chars;

/// Lexer for vtlang source code.
pub struct Lexer<'a> {
    /// Source text being lexed.
    source: &'a str,
    /// Character iterator.
    chars: Chars<'a>,
    /// Current byte position.
    pos: usize,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed).
    column: u32,
    /// Start position of current token.
    token_start: usize,
    token_start_line: u32,
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars(),
            pos: 0,
            line: 1,
            column: 1,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Tokenize the entire source, returning all tokens including EOF.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.mark_token_start();

        let Some(c) = self.peek() else {
            return self.make_token(TokenKind::Eof);
        };

        if c == '/' && self.peek_next() == Some('/') {
            return self.lex_comment();
        }
        if c == '"' {
            return self.lex_string();
        }
        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c == '$' {
            return self.lex_variable();
        }
        if c == '`' {
            return self.lex_quoted_identifier();
        }
        if is_ident_start(c) {
            return self.lex_identifier();
        }

        self.lex_operator_or_punctuation()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn mark_token_start(&mut self) {
        self.token_start = self.pos;
        self.token_start_line = self.line;
        self.token_start_column = self.column;
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    /// Advance to the next character, returning the current one.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            Span::new(
                self.token_start,
                self.pos,
                self.token_start_line,
                self.token_start_column,
            ),
        )
    }

    fn token_text(&self) -> &'a str {
        &self.source[self.token_start..self.pos]
    }

    fn lex_comment(&mut self) -> Token {
        self.advance();
        self.advance();
        if self.peek() == Some(' ') {
            self.advance();
        }
        let content_start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        let content = self.source[content_start..self.pos].to_string();
        self.make_token(TokenKind::Comment(content))
    }

    fn lex_string(&mut self) -> Token {
        self.advance();

        let mut content = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return self
                        .make_token(TokenKind::Error("unterminated string literal".to_string()));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return self.make_token(TokenKind::Error(format!(
                                "invalid escape sequence: \\{}",
                                c
                            )));
                        }
                        None => {
                            return self.make_token(TokenKind::Error(
                                "unterminated string literal".to_string(),
                            ));
                        }
                    };
                    content.push(escaped);
                    self.advance();
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
            }
        }

        self.make_token(TokenKind::StringLit(content))
    }

    fn lex_number(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.token_text();
        match text.parse::<i64>() {
            Ok(n) => self.make_token(TokenKind::Integer(n)),
            Err(_) => self.make_token(TokenKind::Error(format!("invalid integer: {}", text))),
        }
    }

    /// Lex `$name`.
    fn lex_variable(&mut self) -> Token {
        self.advance();
        if !self.peek().is_some_and(is_ident_start) {
            return self.make_token(TokenKind::Error("expected variable name after '$'".into()));
        }
        let name_start = self.pos;
        self.consume_ident_chars();
        let name = self.source[name_start..self.pos].to_string();
        self.make_token(TokenKind::Var(name))
    }

    /// Lex `` `any.name-with:symbols` `` as a plain identifier.
    fn lex_quoted_identifier(&mut self) -> Token {
        self.advance();
        let name_start = self.pos;
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return self.make_token(TokenKind::Error(
                        "unterminated quoted identifier".to_string(),
                    ));
                }
                Some('`') => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        let name = self.source[name_start..self.pos].to_string();
        self.advance();
        if name.is_empty() {
            return self.make_token(TokenKind::Error("empty quoted identifier".to_string()));
        }
        self.make_token(TokenKind::Ident(name))
    }

    fn lex_identifier(&mut self) -> Token {
        self.consume_ident_chars();
        let text = self.token_text();
        if let Some(keyword) = TokenKind::keyword(text) {
            self.make_token(keyword)
        } else {
            self.make_token(TokenKind::Ident(text.to_string()))
        }
    }

    /// Identifier bodies may contain `-` (node names like `web-server`).
    fn consume_ident_chars(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn lex_operator_or_punctuation(&mut self) -> Token {
        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        let kind = match c {
            '=' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::EqEq
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::BangEq
            }
            '<' if self.peek() == Some(':') => {
                self.advance();
                TokenKind::SubtypeOf
            }
            '-' => TokenKind::Minus,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '=' => TokenKind::Error("unexpected '=' (did you mean '=='?)".to_string()),
            other => TokenKind::Error(format!("unexpected character '{}'", other)),
        };
        self.make_token(kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("  \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            lex("$n: Node"),
            vec![
                TokenKind::Var("n".to_string()),
                TokenKind::Colon,
                TokenKind::Ident("Node".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_assertion_tokens() {
        assert_eq!(
            lex(r#"assert $n.password != "x\"y""#),
            vec![
                TokenKind::Assert,
                TokenKind::Var("n".to_string()),
                TokenKind::Dot,
                TokenKind::Ident("password".to_string()),
                TokenKind::BangEq,
                TokenKind::StringLit("x\"y".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("== != <: - ; ( )"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::SubtypeOf,
                TokenKind::Minus,
                TokenKind::Semicolon,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_quoted_and_dashed_identifiers() {
        assert_eq!(
            lex("`tosca.nodes.Compute` web-server"),
            vec![
                TokenKind::Ident("tosca.nodes.Compute".to_string()),
                TokenKind::Ident("web-server".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comment_is_trivia() {
        let kinds = lex("// hello\nassert");
        assert!(kinds[0].is_trivia());
        assert_eq!(kinds[1], TokenKind::Assert);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(lex("\"open")[0], TokenKind::Error(_)));
        assert!(matches!(lex("$ x")[0], TokenKind::Error(_)));
        assert!(matches!(lex("a = b")[1], TokenKind::Error(_)));
        assert!(matches!(lex("99999999999999999999")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::new("assert\n  $db").tokenize();
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
        assert_eq!(tokens[1].span.len(), 3);
    }
}
