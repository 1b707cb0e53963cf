//! Resolved infrastructure topology model for vtlang.
//!
//! A [`Topology`] is the already-resolved object graph that the symbolic
//! layer consumes: nodes with concrete types and property values, node and
//! capability types with single-parent inheritance, and policies. Loading
//! from JSON and referential validation live in [`load`].

pub mod error;
pub mod load;
pub mod model;
pub mod value;

pub use error::{TopologyError, TopologyResult};
pub use model::{
    Ancestors, CapabilityDef, CapabilityInstance, CapabilityType, Node, NodeType, Occurrences,
    Policy, PropertyDef, PropertyKind, RequirementBinding, RequirementDef, Topology, UpperBound,
};
pub use value::{FunctionCall, Value, INTRINSIC_FUNCTIONS};
