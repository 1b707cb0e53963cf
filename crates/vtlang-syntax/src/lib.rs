//! Lexer, parser, and AST for the vtlang assertion language.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod token;

pub use ast::*;
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use pretty::{pretty_print, pretty_print_ref};
pub use token::{Span, Token, TokenKind};
