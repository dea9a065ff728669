//! Workflow graph definition, load-time resolution, and validation.
//!
//! This crate provides:
//! - serde schema for the node/edge definition supplied by the
//!   persistence layer (`GraphDefinition`)
//! - resolved, typed [`WorkflowGraph`] with per-condition action lookup
//! - a strict validation pass (DAG, endpoint existence, channel and
//!   sensor checks) that rejects malformed graphs before any tick runs

pub mod graph;
pub mod schema;

pub use graph::{GraphError, ResolvedAction, WorkflowGraph};
pub use schema::{
    Action, Condition, EdgeDefinition, GraphDefinition, NodeDefinition, NodeKind, Operator,
};
