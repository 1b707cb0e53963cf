//! Typed compilation of assertion programs into constraints.
//!
//! Statements are compiled in document order against the model's symbol
//! tables. Variables and constraints are staged and only committed once
//! every statement has compiled, so a failing program leaves the model as
//! it was.

use crate::domain::SymbolicDomain;
use crate::env::Env;
use crate::error::{CompileError, SymbolicError, SymbolicResult};
use crate::model::{Constraint, Origin, SymbolicModel, VarDecl};
use crate::term::{Formula, NodeTerm, Tag, Term, TypeTerm, Val, ValTerm, VarId};
use tracing::{debug, info};
use vtlang_syntax::{AccessRoot, BoolExpr, CmpOp, Program, Ref, RefKind, Statement};

type CompileResult<T> = Result<T, CompileError>;

/// Variables and constraints produced by one program.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub vars: Vec<VarDecl>,
    pub constraints: Vec<Constraint>,
}

/// Compile a program against a model without modifying it.
pub fn compile_program(model: &SymbolicModel, program: &Program) -> SymbolicResult<CompiledProgram> {
    let mut compiler = Compiler::new(model);
    for (index, stmt) in program.statements.iter().enumerate() {
        compiler
            .compile_statement(index, stmt)
            .map_err(|error| SymbolicError::Compile {
                statement: index,
                error,
            })?;
    }
    Ok(compiler.finish())
}

impl SymbolicModel {
    /// Compile a program and append its variables and constraints.
    ///
    /// On error the model is unchanged.
    pub fn compile(&mut self, program: &Program) -> SymbolicResult<()> {
        let compiled = compile_program(self, program)?;
        info!(
            vars = compiled.vars.len(),
            assertions = compiled.constraints.len(),
            "compiled program"
        );
        self.commit(compiled.vars, compiled.constraints);
        Ok(())
    }
}

struct Compiler<'m> {
    model: &'m SymbolicModel,
    env: Env,
    vars: Vec<VarDecl>,
    constraints: Vec<Constraint>,
}

impl<'m> Compiler<'m> {
    fn new(model: &'m SymbolicModel) -> Self {
        Self {
            model,
            env: Env::new(),
            vars: Vec::new(),
            constraints: Vec::new(),
        }
    }

    fn domain(&self) -> &'m SymbolicDomain {
        self.model.domain()
    }

    fn finish(self) -> CompiledProgram {
        CompiledProgram {
            vars: self.vars,
            constraints: self.constraints,
        }
    }

    fn compile_statement(&mut self, index: usize, stmt: &Statement) -> CompileResult<()> {
        match stmt {
            Statement::NodeDecl(decl) => {
                let id = VarId((self.model.vars().len() + self.vars.len()) as u32);
                self.vars.push(VarDecl {
                    name: decl.var.name.clone(),
                    span: decl.span,
                });
                self.env.bind(decl.var.name.as_str(), Term::Node(NodeTerm::Var(id)));
                debug!(statement = index, var = %decl.var.name, id = id.0, "declared node variable");
            }
            Statement::Assert(assertion) => {
                let formula = self.compile_bool_expr(&assertion.expr)?;
                self.constraints.push(Constraint {
                    formula,
                    origin: Origin::Assertion {
                        statement: index,
                        span: assertion.span,
                    },
                });
                debug!(statement = index, "compiled assertion");
            }
        }
        Ok(())
    }

    fn compile_bool_expr(&self, expr: &BoolExpr) -> CompileResult<Formula> {
        let lhs = self.compile_ref(&expr.lhs)?;
        let rhs = self.compile_ref(&expr.rhs)?;

        if expr.op == CmpOp::SubtypeOf {
            let (sub, sup) = match (&lhs, &rhs) {
                (Term::Type(sub), Term::Type(sup)) => (*sub, *sup),
                (Term::Type(_), other) => {
                    return Err(CompileError::TypeMismatch {
                        expected: Tag::NodeType,
                        found: other.tag(),
                        span: expr.rhs.span,
                    })
                }
                (other, _) => {
                    return Err(CompileError::TypeMismatch {
                        expected: Tag::NodeType,
                        found: other.tag(),
                        span: expr.lhs.span,
                    })
                }
            };
            let none = Term::none(self.domain(), Tag::NodeType);
            return Ok(Formula::And(vec![
                Formula::DerivesFrom(sub, sup),
                Formula::not(Formula::Eq(lhs, none)),
            ]));
        }

        let tag = lhs.tag();
        if rhs.tag() != tag {
            return Err(CompileError::TypeMismatch {
                expected: tag,
                found: rhs.tag(),
                span: expr.span,
            });
        }
        let none = Term::none(self.domain(), tag);
        let defined_equal = Formula::And(vec![
            Formula::Eq(lhs.clone(), rhs.clone()),
            Formula::not(Formula::Eq(lhs.clone(), none.clone())),
        ]);
        Ok(match expr.op {
            CmpOp::Eq => defined_equal,
            _ => Formula::And(vec![
                Formula::not(defined_equal),
                Formula::not(Formula::And(vec![
                    Formula::Eq(lhs, none.clone()),
                    Formula::Eq(rhs, none),
                ])),
            ]),
        })
    }

    fn compile_ref(&self, r: &Ref) -> CompileResult<Term> {
        match &r.kind {
            RefKind::Int(n) => Ok(Term::Val(ValTerm::Lit(Val::Int(*n)))),
            RefKind::Str(s) => self
                .domain()
                .string(s)
                .map(|sym| Term::Val(ValTerm::Lit(Val::Str(sym))))
                .ok_or_else(|| CompileError::UndeclaredString {
                    value: s.clone(),
                    span: r.span,
                }),
            RefKind::TypeOf(inner) => match self.compile_ref(inner)? {
                Term::Node(node) => Ok(Term::Type(TypeTerm::TypeOf(node))),
                other => Err(CompileError::TypeMismatch {
                    expected: Tag::Node,
                    found: other.tag(),
                    span: inner.span,
                }),
            },
            RefKind::Access { root, members } => {
                let mut term = self.compile_root(root)?;
                for member in members {
                    let node = match term {
                        Term::Node(node) => node,
                        other => {
                            return Err(CompileError::InvalidAccess {
                                member: member.name.clone(),
                                found: other.tag(),
                                span: member.span,
                            })
                        }
                    };
                    let prop = self.domain().property(&member.name).ok_or_else(|| {
                        CompileError::UndeclaredSymbol {
                            name: member.name.clone(),
                            span: member.span,
                        }
                    })?;
                    term = Term::Val(ValTerm::Prop(node, prop));
                }
                Ok(term)
            }
        }
    }

    /// Identifiers name a node type first, then a node.
    fn compile_root(&self, root: &AccessRoot) -> CompileResult<Term> {
        match root {
            AccessRoot::Ident(id) => {
                let domain = self.domain();
                if let Some(ty) = domain.node_type(&id.name) {
                    Ok(Term::Type(TypeTerm::Const(ty)))
                } else if let Some(node) = domain.node(&id.name) {
                    Ok(Term::Node(NodeTerm::Const(node)))
                } else {
                    Err(CompileError::UndeclaredSymbol {
                        name: id.name.clone(),
                        span: id.span,
                    })
                }
            }
            AccessRoot::Var(id) => self
                .env
                .lookup(&id.name)
                .map(|(term, _)| term.clone())
                .ok_or_else(|| CompileError::UndeclaredVariable {
                    name: id.name.clone(),
                    span: id.span,
                }),
        }
    }
}
