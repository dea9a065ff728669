//! Load-time resolution of a raw definition into a validated graph.
//!
//! The persistence layer already promises a consistent graph; this pass
//! re-checks everything the engine depends on and rejects anything
//! malformed before the first tick.

use std::collections::{HashMap, VecDeque};

use nexus_core::{Channel, Equipment, SensorCatalog, UnknownChannel};

use crate::schema::{Action, Condition, GraphDefinition, NodeKind, Operator};

/// Reasons a graph definition is rejected at load time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("edge references unknown node: {0}")]
    UnknownEndpoint(String),

    #[error("self-loop on node: {0}")]
    SelfLoop(String),

    #[error("graph contains a cycle")]
    Cycle,

    // Field names avoid `source`, which thiserror reserves for the cause.
    #[error("invalid edge {from_node} -> {to_node}: {detail}")]
    InvalidEdge {
        from_node: String,
        to_node: String,
        detail: String,
    },

    #[error("condition chains are not supported (edge {from_node} -> {to_node})")]
    CompoundConditionsUnsupported { from_node: String, to_node: String },

    #[error("condition node '{node_id}' references unknown equipment: {equipment_id}")]
    UnknownEquipment {
        node_id: String,
        equipment_id: String,
    },

    #[error("condition node '{node_id}' references unknown sensor '{sensor_name}' for {equipment_id}")]
    UnknownSensor {
        node_id: String,
        equipment_id: String,
        sensor_name: String,
    },

    #[error("condition node '{node_id}' uses 'between' without threshold_high")]
    MissingUpperBound { node_id: String },

    #[error("action node '{node_id}': {source}")]
    UnsupportedChannel {
        node_id: String,
        #[source]
        source: UnknownChannel,
    },
}

/// Action node resolved into a typed channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction {
    pub channel: Channel,
    pub recipient: String,
    pub message_template: String,
}

/// Validated workflow graph, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    equipment: Vec<Equipment>,
    /// Condition nodes in definition order (evaluation order is stable).
    conditions: Vec<(String, Condition)>,
    actions: HashMap<String, ResolvedAction>,
    /// Condition node id → action node ids, in edge order.
    actions_by_condition: HashMap<String, Vec<String>>,
}

impl WorkflowGraph {
    /// Resolve and validate a raw definition against the sensor catalog.
    pub fn load(definition: &GraphDefinition, catalog: &SensorCatalog) -> Result<Self, GraphError> {
        let mut kinds: HashMap<&str, &NodeKind> = HashMap::new();
        for node in &definition.nodes {
            if kinds.insert(node.id.as_str(), &node.kind).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &definition.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !kinds.contains_key(endpoint.as_str()) {
                    return Err(GraphError::UnknownEndpoint(endpoint.clone()));
                }
            }
            if edge.source == edge.target {
                return Err(GraphError::SelfLoop(edge.source.clone()));
            }
        }

        reject_cycles(definition, &kinds)?;

        let mut equipment = Vec::new();
        let mut equipment_types = HashMap::new();
        let mut conditions = Vec::new();
        let mut actions = HashMap::new();

        for node in &definition.nodes {
            match &node.kind {
                NodeKind::Equipment {
                    equipment_id,
                    equipment_type,
                } => {
                    equipment_types.insert(equipment_id.clone(), *equipment_type);
                    equipment.push(Equipment::new(equipment_id.clone(), *equipment_type));
                }
                NodeKind::Condition(cond) => {
                    conditions.push((node.id.clone(), cond.clone()));
                }
                NodeKind::Action(action) => {
                    actions.insert(node.id.clone(), resolve_action(&node.id, action)?);
                }
            }
        }

        for (node_id, cond) in &conditions {
            let kind = equipment_types.get(&cond.equipment_id).copied().ok_or_else(|| {
                GraphError::UnknownEquipment {
                    node_id: node_id.clone(),
                    equipment_id: cond.equipment_id.clone(),
                }
            })?;
            if catalog.spec(kind, &cond.sensor_name).is_none() {
                return Err(GraphError::UnknownSensor {
                    node_id: node_id.clone(),
                    equipment_id: cond.equipment_id.clone(),
                    sensor_name: cond.sensor_name.clone(),
                });
            }
            if cond.operator == Operator::Between && cond.threshold_high.is_none() {
                return Err(GraphError::MissingUpperBound {
                    node_id: node_id.clone(),
                });
            }
        }

        let actions_by_condition = resolve_trigger_paths(definition, &kinds)?;

        tracing::debug!(
            equipment = equipment.len(),
            conditions = conditions.len(),
            actions = actions.len(),
            "workflow graph loaded"
        );

        Ok(Self {
            equipment,
            conditions,
            actions,
            actions_by_condition,
        })
    }

    /// Equipment referenced by the graph, in definition order.
    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    /// Condition nodes in evaluation order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn condition(&self, node_id: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, c)| c)
    }

    pub fn action(&self, node_id: &str) -> Option<&ResolvedAction> {
        self.actions.get(node_id)
    }

    /// All action nodes, in arbitrary order.
    pub fn actions(&self) -> impl Iterator<Item = (&str, &ResolvedAction)> {
        self.actions.iter().map(|(id, a)| (id.as_str(), a))
    }

    /// Action nodes directly reachable from a condition node, in edge order.
    pub fn actions_for(&self, condition_node_id: &str) -> Vec<(&str, &ResolvedAction)> {
        self.actions_by_condition
            .get(condition_node_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.actions.get(id).map(|a| (id.as_str(), a)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn resolve_action(node_id: &str, action: &Action) -> Result<ResolvedAction, GraphError> {
    let channel: Channel =
        action
            .channel
            .parse()
            .map_err(|source| GraphError::UnsupportedChannel {
                node_id: node_id.to_string(),
                source,
            })?;
    Ok(ResolvedAction {
        channel,
        recipient: action.recipient.clone(),
        message_template: action.message_template.clone(),
    })
}

/// Kahn's algorithm over all edges; any leftover node means a cycle.
fn reject_cycles(
    definition: &GraphDefinition,
    kinds: &HashMap<&str, &NodeKind>,
) -> Result<(), GraphError> {
    let mut indegree: HashMap<&str, usize> = kinds.keys().map(|id| (*id, 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &definition.edges {
        if let Some(deg) = indegree.get_mut(edge.target.as_str()) {
            *deg += 1;
        }
        successors
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0usize;

    while let Some(id) = queue.pop_front() {
        visited += 1;
        for &next in successors.get(id).into_iter().flatten() {
            if let Some(deg) = indegree.get_mut(next) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if visited != kinds.len() {
        return Err(GraphError::Cycle);
    }
    Ok(())
}

/// Check edge semantics and collect condition → action trigger paths.
///
/// Allowed edges: equipment → condition (sensor binding context) and
/// condition → action (trigger path). Condition → condition edges are
/// rejected explicitly: compound AND/OR chaining has no defined
/// semantics in this engine.
fn resolve_trigger_paths(
    definition: &GraphDefinition,
    kinds: &HashMap<&str, &NodeKind>,
) -> Result<HashMap<String, Vec<String>>, GraphError> {
    let mut paths: HashMap<String, Vec<String>> = HashMap::new();

    for edge in &definition.edges {
        let source_kind = kinds[edge.source.as_str()];
        let target_kind = kinds[edge.target.as_str()];
        match (source_kind, target_kind) {
            (NodeKind::Condition(_), NodeKind::Action(_)) => {
                paths
                    .entry(edge.source.clone())
                    .or_default()
                    .push(edge.target.clone());
            }
            (NodeKind::Condition(_), NodeKind::Condition(_)) => {
                return Err(GraphError::CompoundConditionsUnsupported {
                    from_node: edge.source.clone(),
                    to_node: edge.target.clone(),
                });
            }
            (NodeKind::Equipment { .. }, NodeKind::Condition(_)) => {}
            (NodeKind::Action(_), _) => {
                return Err(GraphError::InvalidEdge {
                    from_node: edge.source.clone(),
                    to_node: edge.target.clone(),
                    detail: "action nodes have no outgoing edges".to_string(),
                });
            }
            _ => {
                return Err(GraphError::InvalidEdge {
                    from_node: edge.source.clone(),
                    to_node: edge.target.clone(),
                    detail: "only equipment->condition and condition->action edges are allowed"
                        .to_string(),
                });
            }
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EdgeDefinition, NodeDefinition};
    use nexus_core::EquipmentType;

    fn equipment_node(id: &str, equipment_id: &str) -> NodeDefinition {
        NodeDefinition {
            id: id.to_string(),
            kind: NodeKind::Equipment {
                equipment_id: equipment_id.to_string(),
                equipment_type: EquipmentType::Centrifuge,
            },
        }
    }

    fn condition_node(id: &str, equipment_id: &str, sensor: &str) -> NodeDefinition {
        NodeDefinition {
            id: id.to_string(),
            kind: NodeKind::Condition(Condition {
                equipment_id: equipment_id.to_string(),
                sensor_name: sensor.to_string(),
                operator: Operator::GreaterThan,
                threshold: 4400.0,
                threshold_high: None,
            }),
        }
    }

    fn action_node(id: &str, channel: &str) -> NodeDefinition {
        NodeDefinition {
            id: id.to_string(),
            kind: NodeKind::Action(Action {
                channel: channel.to_string(),
                recipient: "ops@example.com".to_string(),
                message_template: "{{ sensor }} breached".to_string(),
            }),
        }
    }

    fn edge(source: &str, target: &str) -> EdgeDefinition {
        EdgeDefinition {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn valid_definition() -> GraphDefinition {
        GraphDefinition {
            nodes: vec![
                equipment_node("eq1", "cf-01"),
                condition_node("c1", "cf-01", "rpm"),
                action_node("a1", "email"),
                action_node("a2", "webhook"),
            ],
            edges: vec![edge("eq1", "c1"), edge("c1", "a1"), edge("c1", "a2")],
        }
    }

    #[test]
    fn load_valid_graph() {
        let graph = WorkflowGraph::load(&valid_definition(), &SensorCatalog::builtin()).unwrap();
        assert_eq!(graph.equipment().len(), 1);
        assert_eq!(graph.conditions().count(), 1);

        let actions = graph.actions_for("c1");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].0, "a1");
        assert_eq!(actions[0].1.channel, Channel::Email);
        assert_eq!(actions[1].1.channel, Channel::Webhook);
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut def = valid_definition();
        def.nodes.push(action_node("a1", "email"));
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("a1".to_string()));
    }

    #[test]
    fn dangling_edge_rejected() {
        let mut def = valid_definition();
        def.edges.push(edge("c1", "ghost"));
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(err, GraphError::UnknownEndpoint("ghost".to_string()));
    }

    #[test]
    fn self_loop_rejected() {
        let mut def = valid_definition();
        def.edges.push(edge("c1", "c1"));
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(err, GraphError::SelfLoop("c1".to_string()));
    }

    #[test]
    fn cycle_rejected() {
        // Artificial two-condition cycle; the cycle check runs before
        // edge-kind checks so it surfaces as Cycle.
        let def = GraphDefinition {
            nodes: vec![
                equipment_node("eq1", "cf-01"),
                condition_node("c1", "cf-01", "rpm"),
                condition_node("c2", "cf-01", "temp"),
            ],
            edges: vec![edge("c1", "c2"), edge("c2", "c1")],
        };
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(err, GraphError::Cycle);
    }

    #[test]
    fn condition_chain_rejected() {
        let def = GraphDefinition {
            nodes: vec![
                equipment_node("eq1", "cf-01"),
                condition_node("c1", "cf-01", "rpm"),
                condition_node("c2", "cf-01", "temp"),
                action_node("a1", "email"),
            ],
            edges: vec![edge("c1", "c2"), edge("c2", "a1")],
        };
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(
            err,
            GraphError::CompoundConditionsUnsupported {
                from_node: "c1".to_string(),
                to_node: "c2".to_string(),
            }
        );
    }

    #[test]
    fn action_outgoing_edge_rejected() {
        let mut def = valid_definition();
        def.edges.push(edge("a1", "a2"));
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        match err {
            GraphError::InvalidEdge {
                from_node, to_node, ..
            } => {
                assert_eq!(from_node, "a1");
                assert_eq!(to_node, "a2");
            }
            other => panic!("expected InvalidEdge, got {other:?}"),
        }
    }

    #[test]
    fn unknown_channel_rejected_at_load() {
        let mut def = valid_definition();
        def.nodes.push(action_node("a3", "sms"));
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        match err {
            GraphError::UnsupportedChannel { node_id, source } => {
                assert_eq!(node_id, "a3");
                assert_eq!(source.0, "sms");
            }
            other => panic!("expected UnsupportedChannel, got {other:?}"),
        }
    }

    #[test]
    fn unknown_equipment_rejected() {
        let def = GraphDefinition {
            nodes: vec![condition_node("c1", "missing-eq", "rpm")],
            edges: vec![],
        };
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownEquipment {
                node_id: "c1".to_string(),
                equipment_id: "missing-eq".to_string(),
            }
        );
    }

    #[test]
    fn unknown_sensor_rejected() {
        let def = GraphDefinition {
            nodes: vec![
                equipment_node("eq1", "cf-01"),
                condition_node("c1", "cf-01", "humidity"),
            ],
            edges: vec![],
        };
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownSensor { .. }));
    }

    #[test]
    fn between_requires_upper_bound() {
        let mut def = valid_definition();
        def.nodes.push(NodeDefinition {
            id: "c2".to_string(),
            kind: NodeKind::Condition(Condition {
                equipment_id: "cf-01".to_string(),
                sensor_name: "temp".to_string(),
                operator: Operator::Between,
                threshold: 20.0,
                threshold_high: None,
            }),
        });
        let err = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingUpperBound {
                node_id: "c2".to_string(),
            }
        );
    }

    #[test]
    fn action_with_no_incoming_edge_is_unreachable_but_valid() {
        let mut def = valid_definition();
        def.nodes.push(action_node("orphan", "webhook"));
        let graph = WorkflowGraph::load(&def, &SensorCatalog::builtin()).unwrap();
        assert!(graph.action("orphan").is_some());
        assert!(graph.actions_for("orphan").is_empty());
    }
}
