//! Variable-binding environment for one compiled program.

use crate::term::{Tag, Term};
use std::collections::HashMap;

/// Maps declared variable names to their term and tag.
///
/// Re-binding a name replaces the previous binding.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: HashMap<String, Term>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, term: Term) {
        self.bindings.insert(name.into(), term);
    }

    pub fn lookup(&self, name: &str) -> Option<(&Term, Tag)> {
        self.bindings.get(name).map(|term| (term, term.tag()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{NodeTerm, VarId};

    #[test]
    fn test_last_binding_wins() {
        let mut env = Env::new();
        env.bind("n", Term::Node(NodeTerm::Var(VarId(0))));
        env.bind("n", Term::Node(NodeTerm::Var(VarId(1))));
        let (term, tag) = env.lookup("n").unwrap();
        assert_eq!(*term, Term::Node(NodeTerm::Var(VarId(1))));
        assert_eq!(tag, Tag::Node);
        assert_eq!(env.len(), 1);
        assert!(env.lookup("m").is_none());
    }
}
