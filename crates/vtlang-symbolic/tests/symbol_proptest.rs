//! Property tests for domain extraction and string symbol generation.
//!
//! Properties tested:
//!   1. Extraction is deterministic on the same topology
//!   2. Generated string symbols are pairwise distinct, including for strings
//!      that agree after truncation and normalization
//!   3. Every concrete, declared value is grounded to its conversion

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use vtlang_symbolic::{build_model, extract, symbolize, SymbolicDomain, Val};
use vtlang_topology::{Node, NodeType, PropertyDef, PropertyKind, Topology, Value};

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        (-1000i64..1000).prop_map(Value::Int),
        "[a-zA-Z0-9 _.-]{0,24}".prop_map(Value::Str),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::List),
            (
                prop::sample::select(vec!["get_input", "concat", "get_attribute"]),
                prop::collection::vec(inner, 0..3)
            )
                .prop_map(|(name, args)| Value::call(name, args)),
        ]
    })
}

fn topology_strategy() -> impl Strategy<Value = Topology> {
    prop::collection::vec(
        prop::collection::btree_map("p[0-3]", value_strategy(), 0..4),
        1..5,
    )
    .prop_map(|node_props| {
        let props = (0..4)
            .map(|i| PropertyDef {
                name: format!("p{i}"),
                kind: PropertyKind::Any,
                required: false,
            })
            .collect();
        Topology {
            node_types: vec![
                NodeType {
                    name: "Root".to_string(),
                    parent: None,
                    properties: props,
                    capabilities: Vec::new(),
                    requirements: Vec::new(),
                },
                NodeType {
                    name: "Leaf".to_string(),
                    parent: Some("Root".to_string()),
                    properties: Vec::new(),
                    capabilities: Vec::new(),
                    requirements: Vec::new(),
                },
            ],
            nodes: node_props
                .into_iter()
                .enumerate()
                .map(|(i, properties)| Node {
                    name: format!("n{i}"),
                    node_type: if i % 2 == 0 { "Leaf" } else { "Root" }.to_string(),
                    properties: properties.into_iter().collect::<BTreeMap<_, _>>(),
                    capabilities: BTreeMap::new(),
                    requirements: Vec::new(),
                })
                .collect(),
            ..Topology::default()
        }
    })
}

proptest! {
    #[test]
    fn extraction_is_deterministic(topology in topology_strategy()) {
        prop_assert_eq!(extract(&topology), extract(&topology));
    }

    #[test]
    fn string_symbols_are_injective(
        base in "[a-z]{16}",
        suffixes in prop::collection::hash_set("[A-Za-z0-9 !?]{0,6}", 1..8),
    ) {
        // Every string shares the same 16-character normalized prefix.
        let strings: Vec<String> = suffixes.into_iter().map(|s| format!("{base}{s}")).collect();
        let symbols: HashSet<String> = strings
            .iter()
            .enumerate()
            .map(|(i, s)| symbolize(i, s))
            .collect();
        prop_assert_eq!(symbols.len(), strings.len());

        let domain = SymbolicDomain::from_extracted(&vtlang_symbolic::ExtractedDomain {
            strings: strings.clone(),
            ..Default::default()
        });
        prop_assert!(domain.is_ok());
    }

    #[test]
    fn declared_values_are_grounded(topology in topology_strategy()) {
        let model = build_model(&topology).unwrap();
        let d = model.domain();
        for node in &topology.nodes {
            let n = d.node(&node.name).unwrap();
            for (name, _) in &node.properties {
                let p = d.property(name).unwrap();
                let grounded = model.relations().node_prop(n, p);
                prop_assert!(grounded.is_some());
                prop_assert_ne!(grounded, Some(&Val::None));
            }
        }
    }
}
