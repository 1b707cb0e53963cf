//! Finite enumerated sorts of the symbolic domain.
//!
//! Each sort is an index arena: members are deduplicated by name in
//! first-seen order and addressed by a `u32` index. The Node and NodeType
//! sorts carry a trailing `none` sentinel whose index is one past the last
//! real member, so it can never coincide with a real member even when a node
//! is literally named "none".

use crate::error::{DomainError, SymbolicResult};
use crate::extract::{symbolize, ExtractedDomain};
use std::collections::HashMap;
use std::fmt;

macro_rules! symbol_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

symbol_id!(
    /// Member of the Node sort.
    NodeSym
);
symbol_id!(
    /// Member of the NodeType sort.
    TypeSym
);
symbol_id!(
    /// Member of the PropertyName sort.
    PropSym
);
symbol_id!(
    /// Member of the StringSymbol sort.
    StrSym
);
symbol_id!(
    /// Member of the FunctionName sort.
    FuncSym
);

/// A closed enumeration of named members.
#[derive(Debug, Clone)]
pub struct EnumSort {
    name: &'static str,
    members: Vec<String>,
    index: HashMap<String, u32>,
    nullable: bool,
}

impl EnumSort {
    /// Build a sort from names, keeping the first occurrence of each.
    pub fn new(name: &'static str, names: impl IntoIterator<Item = String>, nullable: bool) -> Self {
        let mut members = Vec::new();
        let mut index = HashMap::new();
        for member in names {
            if index.contains_key(&member) {
                continue;
            }
            index.insert(member.clone(), members.len() as u32);
            members.push(member);
        }
        Self {
            name,
            members,
            index,
            nullable,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of real members, excluding `none`.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    /// Name of a real member; `None` for the sentinel or an unknown index.
    pub fn member(&self, id: u32) -> Option<&str> {
        self.members.get(id as usize).map(String::as_str)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Index of the `none` sentinel, if this sort has one.
    pub fn none(&self) -> Option<u32> {
        self.nullable.then_some(self.members.len() as u32)
    }

    /// Every index in the sort, the sentinel last.
    pub fn ids(&self) -> impl Iterator<Item = u32> {
        let total = self.members.len() + usize::from(self.nullable);
        0..total as u32
    }
}

/// The five enumerated sorts derived from a topology.
#[derive(Debug, Clone)]
pub struct SymbolicDomain {
    nodes: EnumSort,
    node_types: EnumSort,
    properties: EnumSort,
    strings: EnumSort,
    functions: EnumSort,
    /// Generated member name for each string, parallel to `strings`.
    string_symbols: Vec<String>,
}

impl SymbolicDomain {
    /// Declare the sorts from extracted symbol sets.
    ///
    /// Fails if two distinct strings would share a generated member name.
    pub fn from_extracted(extracted: &ExtractedDomain) -> SymbolicResult<Self> {
        let strings = EnumSort::new("StringSym", extracted.strings.iter().cloned(), false);
        let mut string_symbols = Vec::with_capacity(strings.len());
        let mut owners: HashMap<String, usize> = HashMap::new();
        for (i, value) in strings.members().iter().enumerate() {
            let symbol = symbolize(i, value);
            if let Some(&first) = owners.get(&symbol) {
                return Err(DomainError::SymbolCollision {
                    symbol,
                    first: strings.members()[first].clone(),
                    second: value.clone(),
                }
                .into());
            }
            owners.insert(symbol.clone(), i);
            string_symbols.push(symbol);
        }

        Ok(Self {
            nodes: EnumSort::new("Node", extracted.nodes.iter().cloned(), true),
            node_types: EnumSort::new("NodeType", extracted.node_types.iter().cloned(), true),
            properties: EnumSort::new("PropName", extracted.properties.iter().cloned(), false),
            strings,
            functions: EnumSort::new("FuncName", extracted.functions.iter().cloned(), false),
            string_symbols,
        })
    }

    pub fn node_sort(&self) -> &EnumSort {
        &self.nodes
    }

    pub fn node_type_sort(&self) -> &EnumSort {
        &self.node_types
    }

    pub fn property_sort(&self) -> &EnumSort {
        &self.properties
    }

    pub fn string_sort(&self) -> &EnumSort {
        &self.strings
    }

    pub fn function_sort(&self) -> &EnumSort {
        &self.functions
    }

    // === Node ===

    pub fn node(&self, name: &str) -> Option<NodeSym> {
        self.nodes.lookup(name).map(NodeSym)
    }

    pub fn node_none(&self) -> NodeSym {
        NodeSym(self.nodes.len() as u32)
    }

    pub fn node_name(&self, sym: NodeSym) -> Option<&str> {
        self.nodes.member(sym.0)
    }

    /// Every Node member, `none` last.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeSym> {
        self.nodes.ids().map(NodeSym)
    }

    // === NodeType ===

    pub fn node_type(&self, name: &str) -> Option<TypeSym> {
        self.node_types.lookup(name).map(TypeSym)
    }

    pub fn node_type_none(&self) -> TypeSym {
        TypeSym(self.node_types.len() as u32)
    }

    pub fn node_type_name(&self, sym: TypeSym) -> Option<&str> {
        self.node_types.member(sym.0)
    }

    /// Every NodeType member, `none` last.
    pub fn node_type_ids(&self) -> impl Iterator<Item = TypeSym> {
        self.node_types.ids().map(TypeSym)
    }

    // === PropertyName ===

    pub fn property(&self, name: &str) -> Option<PropSym> {
        self.properties.lookup(name).map(PropSym)
    }

    pub fn property_name(&self, sym: PropSym) -> Option<&str> {
        self.properties.member(sym.0)
    }

    pub fn property_ids(&self) -> impl Iterator<Item = PropSym> {
        self.properties.ids().map(PropSym)
    }

    // === StringSymbol ===

    pub fn string(&self, value: &str) -> Option<StrSym> {
        self.strings.lookup(value).map(StrSym)
    }

    pub fn string_value(&self, sym: StrSym) -> Option<&str> {
        self.strings.member(sym.0)
    }

    /// Generated member name, e.g. `ss_0_plaintext123`.
    pub fn string_symbol(&self, sym: StrSym) -> Option<&str> {
        self.string_symbols.get(sym.index()).map(String::as_str)
    }

    // === FunctionName ===

    pub fn function(&self, name: &str) -> Option<FuncSym> {
        self.functions.lookup(name).map(FuncSym)
    }

    pub fn function_name(&self, sym: FuncSym) -> Option<&str> {
        self.functions.member(sym.0)
    }
}

impl fmt::Display for SymbolicDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sort in [&self.nodes, &self.node_types, &self.properties] {
            write_sort(f, sort)?;
        }
        writeln!(f, "{} ({}):", self.strings.name(), self.strings.len())?;
        for (value, symbol) in self.strings.members().iter().zip(&self.string_symbols) {
            writeln!(f, "  {} = {:?}", symbol, value)?;
        }
        write_sort(f, &self.functions)
    }
}

fn write_sort(f: &mut fmt::Formatter<'_>, sort: &EnumSort) -> fmt::Result {
    writeln!(f, "{} ({}):", sort.name(), sort.len())?;
    for member in sort.members() {
        writeln!(f, "  {}", member)?;
    }
    if sort.is_nullable() {
        writeln!(f, "  <none>")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted() -> ExtractedDomain {
        ExtractedDomain {
            nodes: vec!["db1".into(), "none".into()],
            node_types: vec!["Database".into(), "Root".into()],
            properties: vec!["password".into()],
            strings: vec!["plaintext123".into(), "Plaintext123".into()],
            functions: vec!["get_input".into()],
        }
    }

    #[test]
    fn test_enum_sort_dedups_in_first_seen_order() {
        let sort = EnumSort::new("S", ["b", "a", "b", "c"].map(String::from), false);
        assert_eq!(sort.members(), &["b", "a", "c"]);
        assert_eq!(sort.lookup("c"), Some(2));
        assert_eq!(sort.none(), None);
        assert_eq!(sort.ids().count(), 3);
    }

    #[test]
    fn test_none_sentinel_is_distinct_from_members() {
        let domain = SymbolicDomain::from_extracted(&extracted()).unwrap();
        let none = domain.node_none();
        assert_eq!(domain.node("none"), Some(NodeSym(1)));
        assert_ne!(domain.node("none"), Some(none));
        assert_eq!(domain.node_name(none), None);
        assert_eq!(domain.node_ids().last(), Some(none));
        assert_eq!(domain.node_type_ids().count(), 3);
    }

    #[test]
    fn test_string_symbols_are_distinct() {
        let domain = SymbolicDomain::from_extracted(&extracted()).unwrap();
        let a = domain.string("plaintext123").unwrap();
        let b = domain.string("Plaintext123").unwrap();
        assert_eq!(domain.string_symbol(a), Some("ss_0_plaintext123"));
        assert_eq!(domain.string_symbol(b), Some("ss_1_plaintext123"));
    }

    #[test]
    fn test_display_lists_every_sort() {
        let domain = SymbolicDomain::from_extracted(&extracted()).unwrap();
        let text = domain.to_string();
        assert!(text.contains("Node (2):"));
        assert!(text.contains("ss_0_plaintext123 = \"plaintext123\""));
        assert!(text.contains("FuncName (1):"));
    }
}
