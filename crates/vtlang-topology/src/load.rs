//! Loading a resolved topology from JSON and checking referential integrity.

use crate::error::{TopologyError, TopologyResult};
use crate::model::Topology;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

impl Topology {
    /// Parse and validate a topology document.
    pub fn from_json_str(source: &str) -> TopologyResult<Self> {
        let topology: Topology = serde_json::from_str(source)?;
        topology.validate()?;
        Ok(topology)
    }

    /// Read, parse, and validate a topology file.
    pub fn from_json_file(path: impl AsRef<Path>) -> TopologyResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let topology = Self::from_json_str(&source)?;
        info!(
            path = %path.display(),
            nodes = topology.nodes.len(),
            node_types = topology.node_types.len(),
            "loaded topology"
        );
        Ok(topology)
    }

    /// Check that every reference in the graph resolves.
    pub fn validate(&self) -> TopologyResult<()> {
        unique_names("node", self.nodes.iter().map(|n| n.name.as_str()))?;
        unique_names("node type", self.node_types.iter().map(|t| t.name.as_str()))?;
        unique_names(
            "capability type",
            self.capability_types.iter().map(|t| t.name.as_str()),
        )?;
        unique_names("policy", self.policies.iter().map(|p| p.name.as_str()))?;

        for ty in &self.node_types {
            if let Some(parent) = &ty.parent {
                if self.node_type(parent).is_none() {
                    return Err(TopologyError::UnknownParent {
                        kind: "node type",
                        name: ty.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        for ty in &self.capability_types {
            if let Some(parent) = &ty.parent {
                if self.capability_type(parent).is_none() {
                    return Err(TopologyError::UnknownParent {
                        kind: "capability type",
                        name: ty.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for ty in &self.node_types {
            // The walk is capped at the number of declared types, so a chain
            // that has not reached a root by then must loop.
            let chain = self.ancestors(&ty.name).collect::<Vec<_>>();
            if chain.last().is_some_and(|t| t.parent.is_some()) {
                return Err(TopologyError::InheritanceCycle {
                    kind: "node type",
                    name: ty.name.clone(),
                });
            }
            for cap in &ty.capabilities {
                if self.capability_type(&cap.capability_type).is_none() {
                    return Err(TopologyError::UnknownCapabilityType {
                        owner: format!("{}.{}", ty.name, cap.name),
                        capability_type: cap.capability_type.clone(),
                    });
                }
            }
            for req in &ty.requirements {
                if !req.occurrences.upper.admits(req.occurrences.lower) {
                    return Err(TopologyError::InvalidOccurrences {
                        requirement: format!("{}.{}", ty.name, req.name),
                        lower: req.occurrences.lower,
                        upper: req.occurrences.upper.to_string(),
                    });
                }
            }
        }

        for ty in &self.capability_types {
            let chain = self.capability_ancestors(&ty.name);
            if chain.last().is_some_and(|t| t.parent.is_some()) {
                return Err(TopologyError::InheritanceCycle {
                    kind: "capability type",
                    name: ty.name.clone(),
                });
            }
        }

        for node in &self.nodes {
            if self.node_type(&node.node_type).is_none() {
                return Err(TopologyError::UnknownNodeType {
                    node: node.name.clone(),
                    node_type: node.node_type.clone(),
                });
            }
            let declared = self.declared_properties(&node.node_type);
            for (name, value) in &node.properties {
                if let Some(def) = declared.iter().find(|d| &d.name == name) {
                    if !def.kind.admits(value) {
                        return Err(TopologyError::KindMismatch {
                            node: node.name.clone(),
                            property: name.clone(),
                            expected: def.kind.to_string(),
                            found: value.kind_name(),
                        });
                    }
                } else {
                    debug!(node = %node.name, property = %name, "property not declared by node type");
                }
            }
            if let Some(def) = declared
                .iter()
                .find(|d| d.required && !node.properties.contains_key(&d.name))
            {
                return Err(TopologyError::MissingRequiredProperty {
                    node: node.name.clone(),
                    property: def.name.clone(),
                });
            }
            for req in &node.requirements {
                if self.node(&req.node).is_none() {
                    return Err(TopologyError::UnknownRequirementTarget {
                        node: node.name.clone(),
                        requirement: req.name.clone(),
                        target: req.node.clone(),
                    });
                }
            }
            for def in self.declared_requirements(&node.node_type) {
                let count = node
                    .requirements
                    .iter()
                    .filter(|binding| binding.name == def.name)
                    .count() as u64;
                if !def.occurrences.contains(count) {
                    return Err(TopologyError::RequirementCountOutOfBounds {
                        node: node.name.clone(),
                        requirement: def.name.clone(),
                        count,
                        lower: def.occurrences.lower,
                        upper: def.occurrences.upper.to_string(),
                    });
                }
            }
        }

        for policy in &self.policies {
            for target in &policy.targets {
                if self.node(target).is_none() {
                    return Err(TopologyError::UnknownPolicyTarget {
                        policy: policy.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> TopologyResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TopologyError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"{
        "node_types": [
            { "name": "Root" },
            { "name": "Database", "derived_from": "Root",
              "properties": [ { "name": "port", "type": "integer" } ] }
        ],
        "nodes": [ { "name": "db1", "type": "Database", "properties": { "port": 5432 } } ]
    }"#;

    #[test]
    fn test_load_valid_topology() {
        let topo = Topology::from_json_str(BASE).unwrap();
        assert_eq!(topo.nodes.len(), 1);
        assert_eq!(topo.node_type("Database").unwrap().parent.as_deref(), Some("Root"));
    }

    #[test]
    fn test_unknown_node_type() {
        let src = r#"{ "nodes": [ { "name": "x", "type": "Missing" } ] }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::UnknownNodeType { .. })
        ));
    }

    #[test]
    fn test_unknown_parent() {
        let src = r#"{ "node_types": [ { "name": "A", "parent": "Ghost" } ] }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_inheritance_cycle() {
        let src = r#"{ "node_types": [
            { "name": "A", "parent": "B" },
            { "name": "B", "parent": "A" }
        ] }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::InheritanceCycle { .. })
        ));
    }

    #[test]
    fn test_duplicate_node_names() {
        let src = r#"{
            "node_types": [ { "name": "T" } ],
            "nodes": [ { "name": "a", "type": "T" }, { "name": "a", "type": "T" } ]
        }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::DuplicateName { kind: "node", .. })
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let src = BASE.replace("5432", "\"5432\"");
        assert!(matches!(
            Topology::from_json_str(&src),
            Err(TopologyError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_dangling_requirement_and_policy_targets() {
        let src = r#"{
            "node_types": [ { "name": "T" } ],
            "nodes": [ { "name": "a", "type": "T",
                         "requirements": [ { "name": "host", "node": "nowhere" } ] } ]
        }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::UnknownRequirementTarget { .. })
        ));

        let src = r#"{
            "node_types": [ { "name": "T" } ],
            "nodes": [ { "name": "a", "type": "T" } ],
            "policies": [ { "name": "p", "type": "Placement", "targets": ["b"] } ]
        }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::UnknownPolicyTarget { .. })
        ));
    }

    #[test]
    fn test_missing_required_property() {
        let src = BASE.replace(r#""properties": { "port": 5432 }"#, r#""properties": {}"#);
        assert!(matches!(
            Topology::from_json_str(&src),
            Err(TopologyError::MissingRequiredProperty { ref node, ref property })
                if node == "db1" && property == "port"
        ));
    }

    #[test]
    fn test_optional_property_may_be_absent() {
        let src = r#"{
            "node_types": [
                { "name": "Root", "properties": [ { "name": "description", "required": false } ] },
                { "name": "Database", "derived_from": "Root",
                  "properties": [ { "name": "port", "type": "integer" } ] }
            ],
            "nodes": [ { "name": "db1", "type": "Database", "properties": { "port": 5432 } } ]
        }"#;
        assert!(Topology::from_json_str(src).is_ok());
    }

    const HOSTED: &str = r#"{
        "node_types": [
            { "name": "Compute" },
            { "name": "Software",
              "requirements": [ { "name": "host", "capability": "Container", "node": "Compute" } ] },
            { "name": "Database", "derived_from": "Software" },
            { "name": "WebApp",
              "requirements": [ { "name": "database", "capability": "Endpoint",
                                  "occurrences": [1, "UNBOUNDED"] } ] }
        ],
        "nodes": [
            { "name": "vm1", "type": "Compute" },
            { "name": "vm2", "type": "Compute" },
            { "name": "db1", "type": "Database", "requirements": BINDINGS },
            { "name": "app", "type": "WebApp",
              "requirements": [ { "name": "database", "node": "db1" },
                                { "name": "database", "node": "db1" } ] }
        ]
    }"#;

    fn hosted(bindings: &str) -> TopologyResult<Topology> {
        Topology::from_json_str(&HOSTED.replace("BINDINGS", bindings))
    }

    #[test]
    fn test_inherited_requirement_occurrences() {
        assert!(hosted(r#"[ { "name": "host", "node": "vm1" } ]"#).is_ok());

        assert!(matches!(
            hosted("[]"),
            Err(TopologyError::RequirementCountOutOfBounds {
                ref node, ref requirement, count: 0, lower: 1, ..
            }) if node == "db1" && requirement == "host"
        ));

        let err = hosted(
            r#"[ { "name": "host", "node": "vm1" }, { "name": "host", "node": "vm2" } ]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::RequirementCountOutOfBounds { count: 2, ref upper, .. } if upper == "1"
        ));
    }

    #[test]
    fn test_unbounded_requirement_admits_many() {
        let topo = hosted(r#"[ { "name": "host", "node": "vm1" } ]"#).unwrap();
        assert_eq!(topo.node("app").unwrap().requirements.len(), 2);
    }

    #[test]
    fn test_unknown_capability_type() {
        let src = r#"{ "node_types": [
            { "name": "T", "capabilities": [ { "name": "endpoint", "type": "Endpoint" } ] }
        ] }"#;
        assert!(matches!(
            Topology::from_json_str(src),
            Err(TopologyError::UnknownCapabilityType { .. })
        ));
    }
}
