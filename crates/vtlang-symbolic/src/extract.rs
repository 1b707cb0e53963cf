//! Collects the finite symbol sets a topology needs.

use std::collections::HashSet;
use tracing::debug;
use vtlang_topology::{Topology, Value};

/// Symbol sets for every enumerated sort, deduplicated by name in first-seen
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDomain {
    pub nodes: Vec<String>,
    pub node_types: Vec<String>,
    pub properties: Vec<String>,
    pub strings: Vec<String>,
    pub functions: Vec<String>,
}

/// An ordered set of names under construction.
#[derive(Debug, Default)]
struct NameSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl NameSet {
    fn insert(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.names.push(name.to_string());
        }
    }
}

/// Dedup tables threaded through the walk.
#[derive(Debug, Default)]
struct Extraction {
    nodes: NameSet,
    node_types: NameSet,
    properties: NameSet,
    strings: NameSet,
    functions: NameSet,
}

impl Extraction {
    fn scan_value(&mut self, value: &Value) {
        match value {
            Value::Str(s) => self.strings.insert(s),
            Value::List(items) => {
                for item in items {
                    self.scan_value(item);
                }
            }
            Value::Call(call) => {
                self.functions.insert(&call.name);
                for arg in &call.args {
                    self.scan_value(arg);
                }
            }
            Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Null | Value::Map(_) => {}
        }
    }

    fn finish(self) -> ExtractedDomain {
        ExtractedDomain {
            nodes: self.nodes.names,
            node_types: self.node_types.names,
            properties: self.properties.names,
            strings: self.strings.names,
            functions: self.functions.names,
        }
    }
}

/// Scan a topology for node names, type names (with ancestors), property
/// names, literal strings and function names.
pub fn extract(topology: &Topology) -> ExtractedDomain {
    let mut ex = Extraction::default();

    for node in &topology.nodes {
        ex.nodes.insert(&node.name);
        // The concrete type is recorded even if it is undeclared so that
        // grounding can still name it.
        ex.node_types.insert(&node.node_type);
        for ty in topology.ancestors(&node.node_type) {
            ex.node_types.insert(&ty.name);
        }
    }

    for type_name in &ex.node_types.names {
        if let Some(ty) = topology.node_type(type_name) {
            for prop in &ty.properties {
                ex.properties.insert(&prop.name);
            }
        }
    }

    for node in &topology.nodes {
        for value in node.properties.values() {
            ex.scan_value(value);
        }
        for cap in node.capabilities.values() {
            for value in cap.properties.values() {
                ex.scan_value(value);
            }
        }
    }

    let extracted = ex.finish();
    debug!(
        nodes = extracted.nodes.len(),
        node_types = extracted.node_types.len(),
        properties = extracted.properties.len(),
        strings = extracted.strings.len(),
        functions = extracted.functions.len(),
        "extracted symbol sets"
    );
    extracted
}

/// Generated sort-member name for the `index`-th string: `ss_<index>_` then
/// the first 16 characters, lower-cased, anything but ASCII alphanumerics
/// replaced by `_` so the result is a plain SMT-LIB symbol.
pub fn symbolize(index: usize, value: &str) -> String {
    let mut symbol = format!("ss_{}_", index);
    for c in value.chars().take(16) {
        if c.is_ascii_alphanumeric() {
            symbol.push(c.to_ascii_lowercase());
        } else {
            symbol.push('_');
        }
    }
    symbol
}
