//! Recursive descent parser for vtlang assertion programs.
//!
//! ```text
//! program   := (statement ';'?)*
//! statement := VAR ':' 'Node' | 'assert' bool_expr
//! bool_expr := ref ('==' | '!=' | '<:') ref
//! ref       := 'type' '(' ref ')' | (IDENT | VAR) ('.' name)* | '-'? INT | STRING
//! ```

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};
use thiserror::Error;

/// Parser error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token at {span}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("unexpected end of file at {span}")]
    UnexpectedEof { span: Span },
    #[error("invalid syntax at {span}: {message}")]
    InvalidSyntax { message: String, span: Span },
}

impl ParseError {
    /// Get the source span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span } => *span,
            ParseError::InvalidSyntax { span, .. } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser for vtlang source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let tokens: Vec<_> = Lexer::new(source)
            .tokenize()
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .collect();
        Self { tokens, pos: 0 }
    }

    /// Parse a complete program.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let start = self.current_span();
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
            while self.match_token(TokenKind::Semicolon) {}
        }
        let span = if statements.is_empty() {
            start
        } else {
            start.merge(self.prev_span())
        };
        Ok(Program { statements, span })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek_kind() {
            TokenKind::Var(_) => self.parse_node_decl().map(Statement::NodeDecl),
            TokenKind::Assert => self.parse_assertion().map(Statement::Assert),
            TokenKind::Error(message) => Err(ParseError::InvalidSyntax {
                message,
                span: self.current_span(),
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "'$variable: Node' or 'assert'".to_string(),
                found: other.to_string(),
                span: self.current_span(),
            }),
        }
    }

    fn parse_node_decl(&mut self) -> ParseResult<NodeDecl> {
        let start = self.current_span();
        let var = self.parse_var()?;
        self.expect(TokenKind::Colon)?;
        let sort = self.parse_ident()?;
        if sort.name != "Node" {
            return Err(ParseError::InvalidSyntax {
                message: format!("variables can only be declared as Node, not '{}'", sort.name),
                span: sort.span,
            });
        }
        let span = start.merge(self.prev_span());
        Ok(NodeDecl { var, span })
    }

    fn parse_assertion(&mut self) -> ParseResult<Assertion> {
        let start = self.current_span();
        self.expect(TokenKind::Assert)?;
        let expr = self.parse_bool_expr()?;
        let span = start.merge(self.prev_span());
        Ok(Assertion { expr, span })
    }

    fn parse_bool_expr(&mut self) -> ParseResult<BoolExpr> {
        let lhs = self.parse_ref()?;
        let op = match self.peek_kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::BangEq => CmpOp::Ne,
            TokenKind::SubtypeOf => CmpOp::SubtypeOf,
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "'==', '!=' or '<:'".to_string(),
                    found: other.to_string(),
                    span: self.current_span(),
                })
            }
        };
        self.advance();
        let rhs = self.parse_ref()?;
        let span = lhs.span.merge(rhs.span);
        Ok(BoolExpr { op, lhs, rhs, span })
    }

    fn parse_ref(&mut self) -> ParseResult<Ref> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Ref::new(RefKind::Int(n), start))
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek_kind() {
                    TokenKind::Integer(n) => {
                        self.advance();
                        Ok(Ref::new(RefKind::Int(-n), start.merge(self.prev_span())))
                    }
                    other => Err(ParseError::UnexpectedToken {
                        expected: "integer literal".to_string(),
                        found: other.to_string(),
                        span: self.current_span(),
                    }),
                }
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Ref::new(RefKind::Str(s), start))
            }
            TokenKind::Ident(name) if name == "type" && self.peek_ahead_kind(1) == TokenKind::LParen => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let inner = self.parse_ref()?;
                self.expect(TokenKind::RParen)?;
                Ok(Ref::new(
                    RefKind::TypeOf(Box::new(inner)),
                    start.merge(self.prev_span()),
                ))
            }
            TokenKind::Ident(_) => {
                let root = AccessRoot::Ident(self.parse_ident()?);
                self.parse_access_chain(root, start)
            }
            TokenKind::Var(_) => {
                let root = AccessRoot::Var(self.parse_var()?);
                self.parse_access_chain(root, start)
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof { span: start }),
            TokenKind::Error(message) => Err(ParseError::InvalidSyntax {
                message,
                span: start,
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "reference".to_string(),
                found: other.to_string(),
                span: start,
            }),
        }
    }

    fn parse_access_chain(&mut self, root: AccessRoot, start: Span) -> ParseResult<Ref> {
        let mut members = Vec::new();
        while self.match_token(TokenKind::Dot) {
            members.push(self.parse_member_name()?);
        }
        let span = start.merge(self.prev_span());
        Ok(Ref::new(RefKind::Access { root, members }, span))
    }

    /// Member names may collide with keywords (`.assert` is a valid property).
    fn parse_member_name(&mut self) -> ParseResult<Ident> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Assert => {
                self.advance();
                Ok(Ident::new("assert", span))
            }
            _ => self.parse_ident(),
        }
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident::new(name, span))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: other.to_string(),
                span,
            }),
        }
    }

    fn parse_var(&mut self) -> ParseResult<Ident> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Var(name) => {
                self.advance();
                Ok(Ident::new(name, span))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "variable".to_string(),
                found: other.to_string(),
                span,
            }),
        }
    }

    // === Token helpers ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map(|t| t.kind.clone()).unwrap_or(TokenKind::Eof)
    }

    fn peek_ahead_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind.clone())
            .unwrap_or(TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.peek()
            .map(|t| t.span)
            .unwrap_or_else(|| self.prev_span())
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::dummy()
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        std::mem::discriminant(&self.peek_kind()) == std::mem::discriminant(&kind)
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.check(kind.clone()) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Err(ParseError::UnexpectedEof {
                span: self.current_span(),
            })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                found: self.peek_kind().to_string(),
                span: self.current_span(),
            })
        }
    }
}

/// Parse source text into a program.
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source).parse_program()
}
