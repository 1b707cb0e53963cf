//! Error types for model construction and assertion compilation.

use crate::term::Tag;
use thiserror::Error;
use vtlang_syntax::Span;

/// An error compiling one assertion-language statement.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("undeclared symbol: {name}")]
    UndeclaredSymbol { name: String, span: Span },

    #[error("undeclared variable: ${name}")]
    UndeclaredVariable { name: String, span: Span },

    #[error("string {value:?} does not occur in the topology")]
    UndeclaredString { value: String, span: Span },

    #[error("cannot access member '{member}' of a {found} value")]
    InvalidAccess {
        member: String,
        found: Tag,
        span: Span,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Tag, found: Tag, span: Span },
}

impl CompileError {
    /// Get the source span of this error.
    pub fn span(&self) -> Span {
        match self {
            CompileError::UndeclaredSymbol { span, .. }
            | CompileError::UndeclaredVariable { span, .. }
            | CompileError::UndeclaredString { span, .. }
            | CompileError::InvalidAccess { span, .. }
            | CompileError::TypeMismatch { span, .. } => *span,
        }
    }
}

/// An error deriving the symbolic domain from a topology.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("strings {first:?} and {second:?} both map to symbol {symbol}")]
    SymbolCollision {
        symbol: String,
        first: String,
        second: String,
    },
}

/// Symbolic model error.
#[derive(Debug, Error)]
pub enum SymbolicError {
    #[error("statement {}: {error}", .statement + 1)]
    Compile {
        /// Zero-based index of the failing statement.
        statement: usize,
        #[source]
        error: CompileError,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("property '{property}' of node '{node}' holds a {kind} value, which has no symbolic encoding")]
    UnsupportedValue {
        node: String,
        property: String,
        kind: &'static str,
    },

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("cannot render SMT-LIB: {0}")]
    Smt(String),

    #[error("Z3 error: {0}")]
    Z3(String),
}

impl SymbolicError {
    /// Source span of the failing expression, for compile errors.
    pub fn span(&self) -> Option<Span> {
        match self {
            SymbolicError::Compile { error, .. } => Some(error.span()),
            _ => None,
        }
    }
}

pub type SymbolicResult<T> = Result<T, SymbolicError>;
