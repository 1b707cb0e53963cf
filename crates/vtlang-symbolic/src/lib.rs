//! Symbolic model builder and typed assertion compiler for vtlang.
//!
//! A resolved [`Topology`](vtlang_topology::Topology) is encoded as a closed
//! world over finite enumerated sorts (nodes, node types, property names,
//! strings, function names) with the relations `nodeType`, `nodeProp` and
//! `derivesFrom` grounded at every point. Assertion programs are then
//! type-checked and compiled into constraints over that encoding, and a
//! [`Backend`] decides satisfiability, Z3 by default.
//!
//! ```text
//! extract ─▶ SymbolicDomain ─▶ build_model (ground) ─▶ SymbolicModel::compile ─▶ Backend::check
//! ```

pub mod build;
pub mod compile;
pub mod convert;
pub mod domain;
pub mod encoder;
pub mod env;
pub mod error;
pub mod extract;
pub mod model;
pub mod smtlib;
pub mod solver;
pub mod term;

pub use build::build_model;
pub use compile::{compile_program, CompiledProgram};
pub use domain::{EnumSort, FuncSym, NodeSym, PropSym, StrSym, SymbolicDomain, TypeSym};
pub use error::{CompileError, DomainError, SymbolicError, SymbolicResult};
pub use extract::{extract, symbolize, ExtractedDomain};
pub use model::{Constraint, Origin, Relations, SymbolicModel, VarDecl};
pub use smtlib::to_smtlib;
pub use solver::{Backend, Binding, CheckConfig, EnumerationBackend, Outcome, Witness, Z3Backend};
pub use term::{Formula, ListVal, NodeTerm, Tag, Term, TypeTerm, Val, ValTerm, VarId};

/// Check a model with Z3.
pub fn check(model: &SymbolicModel, config: CheckConfig) -> Outcome {
    Z3Backend::new(config).check(model)
}

/// Set the solver's `timeout` parameter, if a budget is given.
pub(crate) fn apply_solver_timeout(solver: &z3::Solver, timeout_ms: Option<u64>) {
    if let Some(ms) = timeout_ms {
        let mut params = z3::Params::new();
        params.set_u32("timeout", u32::try_from(ms).unwrap_or(u32::MAX));
        solver.set_params(&params);
    }
}
