//! The symbolic model: domain, relation tables, variables and constraints.

use crate::domain::{NodeSym, PropSym, SymbolicDomain, TypeSym};
use crate::term::{Formula, NodeTerm, Term, TypeTerm, Val, ValTerm, VarId};
use std::collections::BTreeMap;
use vtlang_syntax::Span;

/// Where a constraint came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    /// Grounding of a relation function at one point.
    Grounding,
    /// A user assertion.
    Assertion { statement: usize, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub formula: Formula,
    pub origin: Origin,
}

/// A declared node variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub span: Span,
}

/// Interpretation of the relation functions at their grounded points.
///
/// Points absent from a table are ungrounded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relations {
    node_type: BTreeMap<NodeSym, TypeSym>,
    node_prop: BTreeMap<(NodeSym, PropSym), Val>,
    derives_from: BTreeMap<(TypeSym, TypeSym), bool>,
}

/// Two groundings disagree about one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict(pub String);

impl Relations {
    pub fn node_type(&self, node: NodeSym) -> Option<TypeSym> {
        self.node_type.get(&node).copied()
    }

    pub fn node_prop(&self, node: NodeSym, prop: PropSym) -> Option<&Val> {
        self.node_prop.get(&(node, prop))
    }

    pub fn derives_from(&self, sub: TypeSym, sup: TypeSym) -> Option<bool> {
        self.derives_from.get(&(sub, sup)).copied()
    }

    /// Number of grounded points across all three relations.
    pub fn len(&self) -> usize {
        self.node_type.len() + self.node_prop.len() + self.derives_from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_node_type(&mut self, node: NodeSym, ty: TypeSym) -> Result<(), Conflict> {
        set_point(&mut self.node_type, node, ty, "nodeType")
    }

    pub fn set_node_prop(&mut self, node: NodeSym, prop: PropSym, val: Val) -> Result<(), Conflict> {
        set_point(&mut self.node_prop, (node, prop), val, "nodeProp")
    }

    pub fn set_derives_from(&mut self, sub: TypeSym, sup: TypeSym, holds: bool) -> Result<(), Conflict> {
        set_point(&mut self.derives_from, (sub, sup), holds, "derivesFrom")
    }

    /// Rebuild the interpretation from the ground equalities in a constraint
    /// list. Constraints of any other shape are ignored.
    pub fn from_constraints<'a>(
        constraints: impl IntoIterator<Item = &'a Constraint>,
    ) -> Result<Self, Conflict> {
        let mut relations = Relations::default();
        for constraint in constraints {
            relations.apply(&constraint.formula)?;
        }
        Ok(relations)
    }

    /// Record a ground relation point. Returns `false` if the formula is not
    /// one.
    fn apply(&mut self, formula: &Formula) -> Result<bool, Conflict> {
        match formula {
            Formula::Eq(
                Term::Type(TypeTerm::TypeOf(NodeTerm::Const(n))),
                Term::Type(TypeTerm::Const(t)),
            ) => self.set_node_type(*n, *t)?,
            Formula::Eq(
                Term::Val(ValTerm::Prop(NodeTerm::Const(n), p)),
                Term::Val(ValTerm::Lit(v)),
            ) => self.set_node_prop(*n, *p, v.clone())?,
            Formula::DerivesFrom(TypeTerm::Const(a), TypeTerm::Const(b)) => {
                self.set_derives_from(*a, *b, true)?
            }
            Formula::Not(inner) => match &**inner {
                Formula::DerivesFrom(TypeTerm::Const(a), TypeTerm::Const(b)) => {
                    self.set_derives_from(*a, *b, false)?
                }
                _ => return Ok(false),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn set_point<K: Ord + std::fmt::Debug, V: PartialEq + std::fmt::Debug>(
    table: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    relation: &str,
) -> Result<(), Conflict> {
    match table.get(&key) {
        Some(existing) if *existing != value => Err(Conflict(format!(
            "{relation}{key:?} grounded to both {existing:?} and {value:?}"
        ))),
        Some(_) => Ok(()),
        None => {
            table.insert(key, value);
            Ok(())
        }
    }
}

/// A grounded topology encoding plus the compiled user assertions.
#[derive(Debug, Clone)]
pub struct SymbolicModel {
    domain: SymbolicDomain,
    relations: Relations,
    vars: Vec<VarDecl>,
    constraints: Vec<Constraint>,
}

impl SymbolicModel {
    pub(crate) fn new(domain: SymbolicDomain) -> Self {
        Self {
            domain,
            relations: Relations::default(),
            vars: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn domain(&self) -> &SymbolicDomain {
        &self.domain
    }

    /// Relation tables as declared by grounding.
    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> Option<&VarDecl> {
        self.vars.get(id.index())
    }

    /// Every constraint in accumulation order, groundings first.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| matches!(c.origin, Origin::Assertion { .. }))
    }

    /// Record a grounding in both the relation table and the accumulator.
    pub(crate) fn ground(&mut self, formula: Formula) -> Result<(), Conflict> {
        if !self.relations.apply(&formula)? {
            return Err(Conflict(format!("not a grounding: {formula:?}")));
        }
        self.constraints.push(Constraint {
            formula,
            origin: Origin::Grounding,
        });
        Ok(())
    }

    /// Append staged variables and constraints.
    ///
    /// Variable ids in `constraints` must have been allocated starting at
    /// the current variable count.
    pub(crate) fn commit(&mut self, vars: Vec<VarDecl>, constraints: Vec<Constraint>) {
        self.vars.extend(vars);
        self.constraints.extend(constraints);
    }
}
