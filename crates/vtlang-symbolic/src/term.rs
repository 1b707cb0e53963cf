//! Sort-tagged terms and boolean formulas of the constraint language.

use crate::domain::{FuncSym, NodeSym, PropSym, StrSym, SymbolicDomain, TypeSym};
use std::fmt;

/// Index of a declared node variable in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compile-time classification of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Node,
    NodeType,
    Val,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Node => write!(f, "Node"),
            Tag::NodeType => write!(f, "NodeType"),
            Tag::Val => write!(f, "Val"),
        }
    }
}

/// A term of sort Node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTerm {
    Const(NodeSym),
    Var(VarId),
}

/// A term of sort NodeType.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeTerm {
    Const(TypeSym),
    /// `nodeType(n)`
    TypeOf(NodeTerm),
}

/// A term of sort Val.
#[derive(Debug, Clone, PartialEq)]
pub enum ValTerm {
    Lit(Val),
    /// `nodeProp(n, p)`
    Prop(NodeTerm, PropSym),
}

/// A value of the algebraic Val type.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Int(i64),
    Float(f64),
    Str(StrSym),
    List(ListVal),
    Func(FuncSym, ListVal),
    /// Absence of a value.
    None,
}

/// A cons list of values.
#[derive(Debug, Clone, PartialEq)]
pub enum ListVal {
    Nil,
    Cons(Box<Val>, Box<ListVal>),
}

impl ListVal {
    /// Right-fold values into a cons chain.
    pub fn from_vals(vals: Vec<Val>) -> Self {
        vals.into_iter()
            .rev()
            .fold(ListVal::Nil, |tail, head| {
                ListVal::Cons(Box::new(head), Box::new(tail))
            })
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter { next: self }
    }
}

pub struct ListIter<'a> {
    next: &'a ListVal,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Val;

    fn next(&mut self) -> Option<Self::Item> {
        let current: &'a ListVal = self.next;
        match current {
            ListVal::Nil => None,
            ListVal::Cons(head, tail) => {
                self.next = &**tail;
                Some(&**head)
            }
        }
    }
}

/// A term of any sort.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Node(NodeTerm),
    Type(TypeTerm),
    Val(ValTerm),
}

impl Term {
    pub fn tag(&self) -> Tag {
        match self {
            Term::Node(_) => Tag::Node,
            Term::Type(_) => Tag::NodeType,
            Term::Val(_) => Tag::Val,
        }
    }

    /// The `none` member of the sort for `tag`.
    pub fn none(domain: &SymbolicDomain, tag: Tag) -> Term {
        match tag {
            Tag::Node => Term::Node(NodeTerm::Const(domain.node_none())),
            Tag::NodeType => Term::Type(TypeTerm::Const(domain.node_type_none())),
            Tag::Val => Term::Val(ValTerm::Lit(Val::None)),
        }
    }

    fn node_term(&self) -> Option<NodeTerm> {
        match self {
            Term::Node(n) | Term::Type(TypeTerm::TypeOf(n)) | Term::Val(ValTerm::Prop(n, _)) => {
                Some(*n)
            }
            Term::Type(TypeTerm::Const(_)) | Term::Val(ValTerm::Lit(_)) => None,
        }
    }

    /// The variable this term mentions, if any.
    pub fn var(&self) -> Option<VarId> {
        match self.node_term()? {
            NodeTerm::Var(v) => Some(v),
            NodeTerm::Const(_) => None,
        }
    }
}

/// A boolean constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// Equality of two terms of the same sort.
    Eq(Term, Term),
    Not(Box<Formula>),
    And(Vec<Formula>),
    /// `derivesFrom(sub, sup)`
    DerivesFrom(TypeTerm, TypeTerm),
}

impl Formula {
    pub fn not(f: Formula) -> Formula {
        Formula::Not(Box::new(f))
    }

    /// Grounding `nodeType(n) == t`.
    pub fn node_type_is(node: NodeSym, ty: TypeSym) -> Formula {
        Formula::Eq(
            Term::Type(TypeTerm::TypeOf(NodeTerm::Const(node))),
            Term::Type(TypeTerm::Const(ty)),
        )
    }

    /// Grounding `nodeProp(n, p) == v`.
    pub fn node_prop_is(node: NodeSym, prop: PropSym, val: Val) -> Formula {
        Formula::Eq(
            Term::Val(ValTerm::Prop(NodeTerm::Const(node), prop)),
            Term::Val(ValTerm::Lit(val)),
        )
    }

    /// Grounding `derivesFrom(sub, sup)` or its negation.
    pub fn derives_from_is(sub: TypeSym, sup: TypeSym, holds: bool) -> Formula {
        let f = Formula::DerivesFrom(TypeTerm::Const(sub), TypeTerm::Const(sup));
        if holds {
            f
        } else {
            Formula::not(f)
        }
    }

    /// Highest-numbered variable the formula mentions.
    pub fn max_var(&self) -> Option<VarId> {
        match self {
            Formula::Eq(l, r) => l.var().max(r.var()),
            Formula::Not(f) => f.max_var(),
            Formula::And(fs) => fs.iter().filter_map(Formula::max_var).max(),
            Formula::DerivesFrom(l, r) => Term::Type(*l).var().max(Term::Type(*r).var()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_right_fold() {
        let list = ListVal::from_vals(vec![Val::Int(1), Val::Int(2), Val::Int(3)]);
        let expected = ListVal::Cons(
            Box::new(Val::Int(1)),
            Box::new(ListVal::Cons(
                Box::new(Val::Int(2)),
                Box::new(ListVal::Cons(Box::new(Val::Int(3)), Box::new(ListVal::Nil))),
            )),
        );
        assert_eq!(list, expected);
        assert_eq!(list.iter().count(), 3);
        assert_eq!(ListVal::from_vals(Vec::new()), ListVal::Nil);
    }

    #[test]
    fn test_max_var() {
        let v0 = Term::Node(NodeTerm::Var(VarId(0)));
        let v2 = Term::Val(ValTerm::Prop(NodeTerm::Var(VarId(2)), PropSym(0)));
        let f = Formula::And(vec![
            Formula::Eq(v0.clone(), v0),
            Formula::not(Formula::Eq(v2.clone(), Term::Val(ValTerm::Lit(Val::None)))),
        ]);
        assert_eq!(f.max_var(), Some(VarId(2)));
        assert_eq!(
            Formula::node_type_is(NodeSym(0), TypeSym(1)).max_var(),
            None
        );
    }

    #[test]
    fn test_tags() {
        assert_eq!(Term::Type(TypeTerm::TypeOf(NodeTerm::Var(VarId(0)))).tag(), Tag::NodeType);
        assert_eq!(Term::Val(ValTerm::Lit(Val::Int(1))).tag(), Tag::Val);
        assert_eq!(Tag::NodeType.to_string(), "NodeType");
    }
}
