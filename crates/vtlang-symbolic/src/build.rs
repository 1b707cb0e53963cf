//! Builds the grounded symbolic model of a topology.

use crate::convert::{convert, ConvertError};
use crate::domain::SymbolicDomain;
use crate::error::{SymbolicError, SymbolicResult};
use crate::extract::extract;
use crate::model::{Conflict, SymbolicModel};
use crate::term::{Formula, Val};
use tracing::{debug, info};
use vtlang_topology::Topology;

impl From<Conflict> for SymbolicError {
    fn from(conflict: Conflict) -> Self {
        SymbolicError::Internal(conflict.0)
    }
}

/// Extract the domain of a topology and ground `nodeType`, `nodeProp` and
/// `derivesFrom` at every point.
pub fn build_model(topology: &Topology) -> SymbolicResult<SymbolicModel> {
    let extracted = extract(topology);
    let domain = SymbolicDomain::from_extracted(&extracted)?;
    let mut model = SymbolicModel::new(domain.clone());

    // nodeType
    for node_sym in domain.node_ids() {
        let ty = match domain.node_name(node_sym) {
            Some(name) => {
                let node = topology.node(name).ok_or_else(|| {
                    SymbolicError::Internal(format!("node '{name}' vanished after extraction"))
                })?;
                domain.node_type(&node.node_type).ok_or_else(|| {
                    SymbolicError::Internal(format!(
                        "type '{}' of node '{name}' is not in the NodeType sort",
                        node.node_type
                    ))
                })?
            }
            None => domain.node_type_none(),
        };
        model.ground(Formula::node_type_is(node_sym, ty))?;
    }

    // nodeProp
    for node_sym in domain.node_ids() {
        let node = domain.node_name(node_sym).and_then(|name| topology.node(name));
        for prop_sym in domain.property_ids() {
            let prop_name = domain.property_name(prop_sym).unwrap_or_default();
            let value = node.and_then(|node| {
                if topology.declares_property(&node.node_type, prop_name) {
                    node.properties.get(prop_name).map(|v| (node, v))
                } else {
                    None
                }
            });
            let val = match value {
                Some((node, v)) => convert(&domain, v).map_err(|e| match e {
                    ConvertError::Unsupported(kind) => SymbolicError::UnsupportedValue {
                        node: node.name.clone(),
                        property: prop_name.to_string(),
                        kind,
                    },
                    other => SymbolicError::Internal(other.to_string()),
                })?,
                None => Val::None,
            };
            debug!(
                node = domain.node_name(node_sym).unwrap_or("none"),
                property = prop_name,
                defined = val != Val::None,
                "grounded property"
            );
            model.ground(Formula::node_prop_is(node_sym, prop_sym, val))?;
        }
    }

    // derivesFrom
    for sub in domain.node_type_ids() {
        for sup in domain.node_type_ids() {
            let holds = match (domain.node_type_name(sub), domain.node_type_name(sup)) {
                (Some(a), Some(b)) => a == b || topology.derives_from(a, b),
                _ => false,
            };
            model.ground(Formula::derives_from_is(sub, sup, holds))?;
        }
    }

    info!(
        nodes = domain.node_sort().len(),
        node_types = domain.node_type_sort().len(),
        properties = domain.property_sort().len(),
        strings = domain.string_sort().len(),
        functions = domain.function_sort().len(),
        groundings = model.constraints().len(),
        "built symbolic model"
    );
    Ok(model)
}
