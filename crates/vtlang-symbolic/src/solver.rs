//! Satisfiability backends.
//!
//! [`Z3Backend`] asserts the model into a Z3 solver through
//! [`Encoding`](crate::encoder::Encoding). [`EnumerationBackend`] decides a
//! model by backtracking over assignments of Node-sort members to the
//! declared variables; its relation interpretation is rebuilt from the ground
//! equalities in the constraint accumulator, so a model checks the same
//! whether it came from [`build_model`] or was assembled elsewhere.
//!
//! [`build_model`]: crate::build_model

use crate::domain::{NodeSym, TypeSym};
use crate::encoder::Encoding;
use crate::model::{Relations, SymbolicModel};
use crate::term::{Formula, NodeTerm, Term, TypeTerm, Val, ValTerm, VarId};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use z3::SatResult;

/// Resource bounds for a single check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckConfig {
    /// Wall-clock budget in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Maximum number of variable assignments to try. Only the enumeration
    /// backend counts assignments.
    pub max_assignments: Option<u64>,
}

/// Result of a satisfiability check.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Sat { witness: Witness },
    Unsat,
    /// The backend could not decide (budget exhausted, ungrounded query).
    Unknown { reason: String },
}

impl Outcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, Outcome::Sat { .. })
    }
}

/// One variable's value in a satisfying assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub var: String,
    /// Node name, or `None` for the `none` sentinel.
    pub node: Option<String>,
}

/// A satisfying assignment, one binding per declared variable in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    pub bindings: Vec<Binding>,
}

impl Witness {
    /// The binding of the most recent declaration of `var`.
    pub fn get(&self, var: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.var == var)
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for binding in &self.bindings {
            writeln!(
                f,
                "${} = {}",
                binding.var,
                binding.node.as_deref().unwrap_or("none")
            )?;
        }
        Ok(())
    }
}

/// A decision procedure over symbolic models.
pub trait Backend {
    fn name(&self) -> &'static str;

    fn check(&self, model: &SymbolicModel) -> Outcome;
}

/// Z3 over the enumeration-sort encoding.
#[derive(Debug, Clone, Default)]
pub struct Z3Backend {
    config: CheckConfig,
}

impl Z3Backend {
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }
}

impl Backend for Z3Backend {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn check(&self, model: &SymbolicModel) -> Outcome {
        let encoding = match Encoding::new(model, self.config.timeout_ms) {
            Ok(encoding) => encoding,
            Err(e) => {
                warn!(error = %e, "cannot encode model");
                return Outcome::Unknown {
                    reason: e.to_string(),
                };
            }
        };
        let solver = encoding.solver();

        let outcome = match solver.check() {
            SatResult::Sat => match solver.get_model() {
                Some(z3_model) => {
                    let bindings = model
                        .vars()
                        .iter()
                        .zip(encoding.vars())
                        .map(|(decl, var)| {
                            let node = z3_model
                                .eval(var, true)
                                .and_then(|value| encoding.node_of(&value))
                                .and_then(|sym| model.domain().node_name(sym))
                                .map(str::to_string);
                            Binding {
                                var: decl.name.clone(),
                                node,
                            }
                        })
                        .collect();
                    Outcome::Sat {
                        witness: Witness { bindings },
                    }
                }
                None => Outcome::Unknown {
                    reason: "Z3 reported sat without a model".to_string(),
                },
            },
            SatResult::Unsat => Outcome::Unsat,
            SatResult::Unknown => Outcome::Unknown {
                reason: solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "Z3 returned unknown".to_string()),
            },
        };
        info!(
            backend = self.name(),
            vars = model.vars().len(),
            sat = outcome.is_sat(),
            "check finished"
        );
        outcome
    }
}

/// Finite-domain backtracking search.
#[derive(Debug, Clone, Default)]
pub struct EnumerationBackend {
    config: CheckConfig,
}

impl EnumerationBackend {
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }
}

impl Backend for EnumerationBackend {
    fn name(&self) -> &'static str {
        "enumeration"
    }

    fn check(&self, model: &SymbolicModel) -> Outcome {
        let relations = match Relations::from_constraints(model.constraints()) {
            Ok(relations) => relations,
            Err(conflict) => {
                debug!(conflict = %conflict.0, "conflicting groundings");
                return Outcome::Unsat;
            }
        };

        // Each constraint is checked as soon as its last variable is assigned.
        let var_count = model.vars().len();
        let mut ground = Vec::new();
        let mut by_var: Vec<Vec<&Formula>> = vec![Vec::new(); var_count];
        for constraint in model.constraints() {
            match constraint.formula.max_var() {
                Some(v) if v.index() < var_count => by_var[v.index()].push(&constraint.formula),
                Some(v) => {
                    return Outcome::Unknown {
                        reason: format!("constraint mentions undeclared variable #{}", v.0),
                    }
                }
                None => ground.push(&constraint.formula),
            }
        }

        let mut search = Search {
            relations: &relations,
            candidates: model.domain().node_ids().collect(),
            by_var,
            assignment: Vec::with_capacity(var_count),
            tried: 0,
            started: Instant::now(),
            config: self.config,
        };

        for formula in ground {
            match search.eval(formula) {
                Ok(true) => {}
                Ok(false) => return Outcome::Unsat,
                Err(stop) => return stop.into_outcome(),
            }
        }

        let outcome = match search.solve() {
            Ok(true) => Outcome::Sat {
                witness: Witness {
                    bindings: model
                        .vars()
                        .iter()
                        .zip(&search.assignment)
                        .map(|(decl, node)| Binding {
                            var: decl.name.clone(),
                            node: model.domain().node_name(*node).map(str::to_string),
                        })
                        .collect(),
                },
            },
            Ok(false) => Outcome::Unsat,
            Err(stop) => stop.into_outcome(),
        };
        info!(
            backend = self.name(),
            vars = var_count,
            assignments = search.tried,
            sat = outcome.is_sat(),
            "check finished"
        );
        outcome
    }
}

/// Why the search gave up.
enum Stop {
    Ungrounded(String),
    Budget(String),
}

impl Stop {
    fn into_outcome(self) -> Outcome {
        let reason = match self {
            Stop::Ungrounded(point) => format!("query at ungrounded point {point}"),
            Stop::Budget(reason) => reason,
        };
        Outcome::Unknown { reason }
    }
}

struct Search<'a> {
    relations: &'a Relations,
    candidates: Vec<NodeSym>,
    by_var: Vec<Vec<&'a Formula>>,
    assignment: Vec<NodeSym>,
    tried: u64,
    started: Instant,
    config: CheckConfig,
}

impl Search<'_> {
    fn solve(&mut self) -> Result<bool, Stop> {
        let depth = self.assignment.len();
        if depth == self.by_var.len() {
            return Ok(true);
        }
        for i in 0..self.candidates.len() {
            self.spend()?;
            self.assignment.push(self.candidates[i]);
            if self.consistent(depth)? && self.solve()? {
                return Ok(true);
            }
            self.assignment.pop();
        }
        Ok(false)
    }

    fn spend(&mut self) -> Result<(), Stop> {
        self.tried += 1;
        if let Some(max) = self.config.max_assignments {
            if self.tried > max {
                return Err(Stop::Budget(format!("assignment budget of {max} exhausted")));
            }
        }
        if let Some(ms) = self.config.timeout_ms {
            if self.started.elapsed() > Duration::from_millis(ms) {
                return Err(Stop::Budget(format!("timed out after {ms} ms")));
            }
        }
        Ok(())
    }

    fn consistent(&self, var: usize) -> Result<bool, Stop> {
        for formula in &self.by_var[var] {
            if !self.eval(formula)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn eval(&self, formula: &Formula) -> Result<bool, Stop> {
        match formula {
            Formula::Eq(l, r) => self.eval_eq(l, r),
            Formula::Not(f) => Ok(!self.eval(f)?),
            Formula::And(fs) => {
                for f in fs {
                    if !self.eval(f)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Formula::DerivesFrom(sub, sup) => {
                let (a, b) = (self.eval_type(sub)?, self.eval_type(sup)?);
                self.relations
                    .derives_from(a, b)
                    .ok_or_else(|| Stop::Ungrounded(format!("derivesFrom({}, {})", a.0, b.0)))
            }
        }
    }

    fn eval_eq(&self, l: &Term, r: &Term) -> Result<bool, Stop> {
        Ok(match (l, r) {
            (Term::Node(a), Term::Node(b)) => self.eval_node(a) == self.eval_node(b),
            (Term::Type(a), Term::Type(b)) => self.eval_type(a)? == self.eval_type(b)?,
            (Term::Val(a), Term::Val(b)) => self.eval_val(a)? == self.eval_val(b)?,
            _ => false,
        })
    }

    fn eval_node(&self, term: &NodeTerm) -> NodeSym {
        match term {
            NodeTerm::Const(n) => *n,
            NodeTerm::Var(VarId(v)) => self.assignment[*v as usize],
        }
    }

    fn eval_type(&self, term: &TypeTerm) -> Result<TypeSym, Stop> {
        match term {
            TypeTerm::Const(t) => Ok(*t),
            TypeTerm::TypeOf(n) => {
                let node = self.eval_node(n);
                self.relations
                    .node_type(node)
                    .ok_or_else(|| Stop::Ungrounded(format!("nodeType({})", node.0)))
            }
        }
    }

    fn eval_val<'v>(&'v self, term: &'v ValTerm) -> Result<&'v Val, Stop> {
        match term {
            ValTerm::Lit(v) => Ok(v),
            ValTerm::Prop(n, p) => {
                let node = self.eval_node(n);
                self.relations
                    .node_prop(node, *p)
                    .ok_or_else(|| Stop::Ungrounded(format!("nodeProp({}, {})", node.0, p.0)))
            }
        }
    }
}
