//! serde schema for workflow graph definitions.
//!
//! The persistence collaborator hands over a JSON document of nodes and
//! directed edges. Node payloads are a tagged variant on `kind`; the
//! channel string in action nodes stays raw here and is parsed into a
//! typed [`Channel`](nexus_core::Channel) during graph resolution so a
//! bad channel surfaces as a validation error, not a parse failure.

use serde::{Deserialize, Serialize};

use nexus_core::EquipmentType;

/// Raw graph definition as supplied by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

impl GraphDefinition {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A graph vertex with its kind-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Kind-specific node payload, tagged by an explicit `kind` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Equipment {
        equipment_id: String,
        equipment_type: EquipmentType,
    },
    Condition(Condition),
    Action(Action),
}

/// Threshold condition bound to exactly one (equipment, sensor) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub equipment_id: String,
    pub sensor_name: String,
    pub operator: Operator,
    pub threshold: f64,
    /// Upper bound, required for `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_high: Option<f64>,
}

/// Comparison operators a condition node supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "between")]
    Between,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Between => "between",
        };
        f.write_str(s)
    }
}

/// Notification action held by an action node.
///
/// `message_template` is a minijinja template over the triggering
/// reading's fields; `channel` is parsed during graph resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub channel: String,
    pub recipient: String,
    pub message_template: String,
}

/// Directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub source: String,
    pub target: String,
}
