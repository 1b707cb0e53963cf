//! Topology object graph: nodes, types, capabilities, requirements, policies.

use crate::value::Value;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// A resolved topology.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Topology {
    #[serde(default)]
    pub node_types: Vec<NodeType>,
    #[serde(default)]
    pub capability_types: Vec<CapabilityType>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

/// A node type with an optional single parent.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeType {
    pub name: String,
    #[serde(default, alias = "derived_from")]
    pub parent: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub capabilities: Vec<CapabilityDef>,
    #[serde(default)]
    pub requirements: Vec<RequirementDef>,
}

/// A capability type with an optional single parent.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityType {
    pub name: String,
    #[serde(default, alias = "derived_from")]
    pub parent: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

/// A property declaration on a type.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Declared kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Map,
    /// Any kind not listed above (scalar units, versions, custom data types).
    #[default]
    #[serde(other)]
    Any,
}

impl PropertyKind {
    /// Whether a concrete value is compatible with this declared kind.
    ///
    /// Deferred calls are resolved at deployment time and match any kind.
    pub fn admits(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Call(_)) | (PropertyKind::Any, _) => true,
            (PropertyKind::String, Value::Str(_)) => true,
            (PropertyKind::Integer, Value::Int(_)) => true,
            (PropertyKind::Float, Value::Float(_) | Value::Int(_)) => true,
            (PropertyKind::Boolean, Value::Bool(_)) => true,
            (PropertyKind::List, Value::List(_)) => true,
            (PropertyKind::Map, Value::Map(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyKind::String => "string",
            PropertyKind::Integer => "integer",
            PropertyKind::Float => "float",
            PropertyKind::Boolean => "boolean",
            PropertyKind::List => "list",
            PropertyKind::Map => "map",
            PropertyKind::Any => "any",
        };
        write!(f, "{}", s)
    }
}

/// A capability declaration on a node type.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityDef {
    pub name: String,
    #[serde(rename = "type")]
    pub capability_type: String,
}

/// A requirement declaration on a node type.
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementDef {
    pub name: String,
    pub capability: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub occurrences: Occurrences,
}

/// Occurrence bounds of a requirement, `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "(u64, UpperBound)")]
pub struct Occurrences {
    pub lower: u64,
    pub upper: UpperBound,
}

impl Occurrences {
    /// Create bounds, rejecting `lower > upper`.
    pub fn new(lower: u64, upper: UpperBound) -> Result<Self, String> {
        if !upper.admits(lower) {
            return Err(format!(
                "lower bound {} exceeds upper bound {}",
                lower, upper
            ));
        }
        Ok(Self { lower, upper })
    }

    /// Whether `count` satisfies both bounds.
    pub fn contains(&self, count: u64) -> bool {
        count >= self.lower && self.upper.admits(count)
    }
}

impl Default for Occurrences {
    fn default() -> Self {
        Self {
            lower: 1,
            upper: UpperBound::Bounded(1),
        }
    }
}

impl TryFrom<(u64, UpperBound)> for Occurrences {
    type Error = String;

    fn try_from((lower, upper): (u64, UpperBound)) -> Result<Self, Self::Error> {
        Occurrences::new(lower, upper)
    }
}

/// Upper occurrence bound. `Unbounded` sorts after every finite bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawBound")]
pub enum UpperBound {
    Bounded(u64),
    Unbounded,
}

impl UpperBound {
    pub fn admits(self, count: u64) -> bool {
        match self {
            UpperBound::Bounded(max) => count <= max,
            UpperBound::Unbounded => true,
        }
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpperBound::Bounded(n) => write!(f, "{}", n),
            UpperBound::Unbounded => write!(f, "UNBOUNDED"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBound {
    Finite(u64),
    Keyword(String),
}

impl TryFrom<RawBound> for UpperBound {
    type Error = String;

    fn try_from(raw: RawBound) -> Result<Self, Self::Error> {
        match raw {
            RawBound::Finite(n) => Ok(UpperBound::Bounded(n)),
            RawBound::Keyword(s) if s.eq_ignore_ascii_case("unbounded") => {
                Ok(UpperBound::Unbounded)
            }
            RawBound::Keyword(s) => Err(format!("invalid upper bound '{}'", s)),
        }
    }
}

/// A node template with its concrete values.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub capabilities: BTreeMap<String, CapabilityInstance>,
    #[serde(default)]
    pub requirements: Vec<RequirementBinding>,
}

/// Concrete properties of one capability on a node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilityInstance {
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// A requirement fulfilled by a target node.
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementBinding {
    pub name: String,
    pub node: String,
}

/// A policy applied to a set of nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct Policy {
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Topology {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.node_types.iter().find(|t| t.name == name)
    }

    pub fn capability_type(&self, name: &str) -> Option<&CapabilityType> {
        self.capability_types.iter().find(|t| t.name == name)
    }

    /// Walk a node type and its ancestors, most specific first.
    ///
    /// The walk stops at a root, at an undeclared parent, or after visiting
    /// as many types as are declared, so it terminates on cyclic input.
    pub fn ancestors<'a>(&'a self, type_name: &str) -> Ancestors<'a> {
        Ancestors {
            topology: self,
            next: self.node_type(type_name),
            remaining: self.node_types.len(),
        }
    }

    /// Whether `type_name` is `ancestor` or inherits from it.
    pub fn derives_from(&self, type_name: &str, ancestor: &str) -> bool {
        self.ancestors(type_name).any(|t| t.name == ancestor)
    }

    /// Property declarations visible on a type, including inherited ones.
    /// A redeclaration in a subtype hides the parent's declaration.
    pub fn declared_properties<'a>(&'a self, type_name: &str) -> Vec<&'a PropertyDef> {
        let mut seen: Vec<&'a PropertyDef> = Vec::new();
        for ty in self.ancestors(type_name) {
            for prop in &ty.properties {
                if !seen.iter().any(|p| p.name == prop.name) {
                    seen.push(prop);
                }
            }
        }
        seen
    }

    /// Requirement declarations visible on a type, including inherited ones.
    /// A redeclaration in a subtype hides the parent's declaration.
    pub fn declared_requirements<'a>(&'a self, type_name: &str) -> Vec<&'a RequirementDef> {
        let mut seen: Vec<&'a RequirementDef> = Vec::new();
        for ty in self.ancestors(type_name) {
            for req in &ty.requirements {
                if !seen.iter().any(|r| r.name == req.name) {
                    seen.push(req);
                }
            }
        }
        seen
    }

    /// Whether a type (or one of its ancestors) declares a property.
    pub fn declares_property(&self, type_name: &str, property: &str) -> bool {
        self.ancestors(type_name)
            .any(|t| t.properties.iter().any(|p| p.name == property))
    }

    /// Walk a capability type and its ancestors, most specific first.
    pub fn capability_ancestors<'a>(&'a self, type_name: &str) -> Vec<&'a CapabilityType> {
        let mut chain = Vec::new();
        let mut next = self.capability_type(type_name);
        while let Some(ty) = next {
            if chain.len() >= self.capability_types.len() {
                break;
            }
            chain.push(ty);
            next = ty.parent.as_deref().and_then(|p| self.capability_type(p));
        }
        chain
    }
}

/// Iterator over a node type's inheritance chain.
pub struct Ancestors<'a> {
    topology: &'a Topology,
    next: Option<&'a NodeType>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a NodeType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next.take()?;
        self.remaining -= 1;
        self.next = current
            .parent
            .as_deref()
            .and_then(|p| self.topology.node_type(p));
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str, parent: Option<&str>, props: &[&str]) -> NodeType {
        NodeType {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            properties: props
                .iter()
                .map(|p| PropertyDef {
                    name: p.to_string(),
                    kind: PropertyKind::Any,
                    required: true,
                })
                .collect(),
            capabilities: vec![],
            requirements: vec![],
        }
    }

    fn hierarchy() -> Topology {
        Topology {
            node_types: vec![
                ty("Root", None, &["tosca_id"]),
                ty("SoftwareComponent", Some("Root"), &["version"]),
                ty("Database", Some("SoftwareComponent"), &["password", "port"]),
            ],
            ..Topology::default()
        }
    }

    #[test]
    fn test_ancestor_chain_most_specific_first() {
        let topo = hierarchy();
        let names: Vec<_> = topo.ancestors("Database").map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Database", "SoftwareComponent", "Root"]);
        assert!(topo.derives_from("Database", "Root"));
        assert!(!topo.derives_from("Root", "Database"));
    }

    #[test]
    fn test_ancestors_terminate_on_cycle() {
        let topo = Topology {
            node_types: vec![ty("A", Some("B"), &[]), ty("B", Some("A"), &[])],
            ..Topology::default()
        };
        assert_eq!(topo.ancestors("A").count(), 2);
    }

    #[test]
    fn test_inherited_property_declarations() {
        let topo = hierarchy();
        assert!(topo.declares_property("Database", "tosca_id"));
        assert!(!topo.declares_property("SoftwareComponent", "password"));
        let names: Vec<_> = topo
            .declared_properties("Database")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["password", "port", "version", "tosca_id"]);
    }

    #[test]
    fn test_unbounded_is_distinct_from_every_finite_bound() {
        for n in [0, 1, 42, u64::MAX] {
            assert_ne!(UpperBound::Unbounded, UpperBound::Bounded(n));
            assert!(UpperBound::Bounded(n) < UpperBound::Unbounded);
        }
        assert!(UpperBound::Unbounded.admits(u64::MAX));
    }

    #[test]
    fn test_occurrences_reject_inverted_bounds() {
        assert!(Occurrences::new(2, UpperBound::Bounded(1)).is_err());
        let occ = Occurrences::new(1, UpperBound::Unbounded).unwrap();
        assert!(occ.contains(7));
        assert!(!occ.contains(0));
    }

    #[test]
    fn test_occurrences_from_json() {
        let occ: Occurrences = serde_json::from_str(r#"[0, "UNBOUNDED"]"#).unwrap();
        assert_eq!(occ.upper, UpperBound::Unbounded);
        let occ: Occurrences = serde_json::from_str("[1, 3]").unwrap();
        assert_eq!(occ.upper, UpperBound::Bounded(3));
        assert!(serde_json::from_str::<Occurrences>("[4, 3]").is_err());
        assert!(serde_json::from_str::<Occurrences>(r#"[0, "many"]"#).is_err());
    }

    #[test]
    fn test_property_kind_admits() {
        assert!(PropertyKind::Float.admits(&Value::Int(3)));
        assert!(PropertyKind::Integer.admits(&Value::call("get_input", vec![])));
        assert!(!PropertyKind::Integer.admits(&Value::str("3")));
        assert!(PropertyKind::Any.admits(&Value::Null));
    }
}
