//! Topology loading and validation errors.

use std::path::PathBuf;
use thiserror::Error;

/// An error raised while loading or validating a topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed topology document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("integer {literal} does not fit in a signed 64-bit integer")]
    IntegerOutOfRange { literal: String },

    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} '{name}' derives from undeclared parent '{parent}'")]
    UnknownParent {
        kind: &'static str,
        name: String,
        parent: String,
    },

    #[error("{kind} '{name}' is part of an inheritance cycle")]
    InheritanceCycle { kind: &'static str, name: String },

    #[error("node '{node}' has undeclared type '{node_type}'")]
    UnknownNodeType { node: String, node_type: String },

    #[error("'{owner}' references undeclared capability type '{capability_type}'")]
    UnknownCapabilityType {
        owner: String,
        capability_type: String,
    },

    #[error("requirement '{requirement}' of node '{node}' targets unknown node '{target}'")]
    UnknownRequirementTarget {
        node: String,
        requirement: String,
        target: String,
    },

    #[error("policy '{policy}' targets unknown node '{target}'")]
    UnknownPolicyTarget { policy: String, target: String },

    #[error("invalid occurrences for requirement '{requirement}': lower bound {lower} exceeds upper bound {upper}")]
    InvalidOccurrences {
        requirement: String,
        lower: u64,
        upper: String,
    },

    #[error("node '{node}' has no value for required property '{property}'")]
    MissingRequiredProperty { node: String, property: String },

    #[error("node '{node}' binds requirement '{requirement}' {count} times, expected between {lower} and {upper}")]
    RequirementCountOutOfBounds {
        node: String,
        requirement: String,
        count: u64,
        lower: u64,
        upper: String,
    },

    #[error("property '{property}' of node '{node}' is declared {expected}, found {found}")]
    KindMismatch {
        node: String,
        property: String,
        expected: String,
        found: &'static str,
    },
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
