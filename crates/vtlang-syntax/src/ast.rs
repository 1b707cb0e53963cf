//! Abstract syntax tree for vtlang assertion programs.

use crate::token::Span;

/// A complete program: statements in document order.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// An identifier with its source span.
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A top-level statement.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `$name: Node`
    NodeDecl(NodeDecl),
    /// `assert <bool-expr>`
    Assert(Assertion),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::NodeDecl(d) => d.span,
            Statement::Assert(a) => a.span,
        }
    }
}

/// `$name: Node`
#[derive(Debug, Clone)]
pub struct NodeDecl {
    /// Variable name without the leading `$`.
    pub var: Ident,
    pub span: Span,
}

/// `assert <bool-expr>`
#[derive(Debug, Clone)]
pub struct Assertion {
    pub expr: BoolExpr,
    pub span: Span,
}

/// A comparison between two references.
#[derive(Debug, Clone)]
pub struct BoolExpr {
    pub op: CmpOp,
    pub lhs: Ref,
    pub rhs: Ref,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<:` (node type inherits from)
    SubtypeOf,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::SubtypeOf => "<:",
        }
    }
}

/// A reference expression with its source span.
#[derive(Debug, Clone)]
pub struct Ref {
    pub kind: RefKind,
    pub span: Span,
}

impl Ref {
    pub fn new(kind: RefKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone)]
pub enum RefKind {
    /// `type(<ref>)`
    TypeOf(Box<Ref>),
    /// `root.member.member...`; `members` is empty for a bare reference.
    Access { root: AccessRoot, members: Vec<Ident> },
    /// Integer literal.
    Int(i64),
    /// String literal.
    Str(String),
}

/// The head of an access chain.
#[derive(Debug, Clone)]
pub enum AccessRoot {
    /// Node or node type name.
    Ident(Ident),
    /// `$name` variable.
    Var(Ident),
}

impl AccessRoot {
    pub fn span(&self) -> Span {
        match self {
            AccessRoot::Ident(id) | AccessRoot::Var(id) => id.span,
        }
    }
}
