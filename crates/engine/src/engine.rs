//! Edge-triggered execution over a validated workflow graph.
//!
//! Per tick the engine generates one reading per (equipment, sensor)
//! pair, evaluates every condition node against the latest reading for
//! its bound sensor, and fires the condition's actions on the rising
//! edge only. A condition that stays breached across consecutive ticks
//! produces a single trigger; it must evaluate false once before it can
//! fire again.

use std::collections::HashMap;

use chrono::Utc;
use futures::future::join_all;

use nexus_core::{
    Channel, DispatchStatus, NotificationResult, SensorReading, TriggerEvent,
};
use nexus_graph::{Operator, WorkflowGraph};
use nexus_notify::{AlertContext, Dispatcher, NotificationMessage, TemplateRenderer};
use nexus_signal::{AnomalyProfile, SignalGenerator};

use crate::error::EngineError;
use crate::evaluator::evaluate;
use crate::sink::RunSink;

/// Per-condition trigger state.
///
/// `Armed` means the condition evaluated true on the most recent
/// evaluation; further true evaluations are suppressed until it
/// re-enters `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmState {
    Idle,
    Armed,
}

/// Everything one tick produced, in production order.
#[derive(Debug)]
pub struct TickReport {
    pub tick_index: u64,
    pub readings: Vec<SensorReading>,
    pub triggers: Vec<TriggerEvent>,
    pub results: Vec<NotificationResult>,
}

/// What a condition node would do given a set of readings, without
/// mutating trigger state or dispatching anything.
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunOutcome {
    pub condition_node_id: String,
    /// Value evaluated, `None` when no reading covered the bound sensor.
    pub value: Option<f64>,
    pub would_trigger: bool,
    pub actions: Vec<String>,
}

struct PendingDispatch {
    action_node_id: String,
    channel: Channel,
    recipient: String,
    message: NotificationMessage,
}

/// Drives the generate → evaluate → trigger → dispatch pipeline.
pub struct ExecutionEngine {
    graph: WorkflowGraph,
    generator: SignalGenerator,
    dispatcher: Dispatcher,
    renderer: TemplateRenderer,
    sink: Box<dyn RunSink>,
    arm_states: HashMap<String, ArmState>,
    /// Latest reading per (equipment_id, sensor_name).
    last_readings: HashMap<(String, String), SensorReading>,
    /// Active anomaly per (equipment_id, sensor_name), at most one each.
    anomalies: HashMap<(String, String), AnomalyProfile>,
}

impl ExecutionEngine {
    /// Assemble the engine over a loaded graph.
    ///
    /// Every action node's message template is syntax-checked here, so a
    /// broken template aborts before the first tick instead of surfacing
    /// as a failed dispatch mid-run.
    pub fn new(
        graph: WorkflowGraph,
        generator: SignalGenerator,
        dispatcher: Dispatcher,
        sink: Box<dyn RunSink>,
    ) -> Result<Self, EngineError> {
        let renderer = TemplateRenderer::new();
        for (node_id, action) in graph.actions() {
            renderer
                .validate(&action.message_template)
                .map_err(|source| EngineError::InvalidTemplate {
                    node_id: node_id.to_string(),
                    source,
                })?;
        }

        let arm_states = graph
            .conditions()
            .map(|(id, _)| (id.to_string(), ArmState::Idle))
            .collect();

        Ok(Self {
            graph,
            generator,
            dispatcher,
            renderer,
            sink,
            arm_states,
            last_readings: HashMap::new(),
            anomalies: HashMap::new(),
        })
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn last_reading(&self, equipment_id: &str, sensor_name: &str) -> Option<&SensorReading> {
        self.last_readings
            .get(&(equipment_id.to_string(), sensor_name.to_string()))
    }

    /// Activate an anomaly profile on one (equipment, sensor) pair,
    /// replacing any profile already active there.
    pub fn inject_anomaly(
        &mut self,
        equipment_id: &str,
        sensor_name: &str,
        profile: AnomalyProfile,
    ) -> Result<(), EngineError> {
        let equipment = self
            .graph
            .equipment()
            .iter()
            .find(|e| e.id == equipment_id)
            .ok_or_else(|| EngineError::UnknownEquipment(equipment_id.to_string()))?;
        if self
            .generator
            .catalog()
            .spec(equipment.kind, sensor_name)
            .is_none()
        {
            return Err(nexus_signal::SignalError::UnknownSensor {
                equipment_type: equipment.kind,
                sensor_name: sensor_name.to_string(),
            }
            .into());
        }

        tracing::info!(
            equipment_id,
            sensor_name,
            kind = %profile.kind,
            start_tick = profile.start_tick,
            "anomaly injected"
        );
        self.anomalies
            .insert((equipment_id.to_string(), sensor_name.to_string()), profile);
        Ok(())
    }

    /// Deactivate the anomaly on one (equipment, sensor) pair, if any.
    pub fn clear_anomaly(&mut self, equipment_id: &str, sensor_name: &str) {
        let removed = self
            .anomalies
            .remove(&(equipment_id.to_string(), sensor_name.to_string()));
        if removed.is_some() {
            tracing::info!(equipment_id, sensor_name, "anomaly cleared");
        }
    }

    /// Run one full tick: generate readings for every (equipment, sensor)
    /// pair the graph references, then evaluate and dispatch.
    pub async fn tick(&mut self, tick_index: u64) -> Result<TickReport, EngineError> {
        let mut readings = Vec::new();
        for equipment in self.graph.equipment() {
            for spec in self.generator.catalog().sensors_for(equipment.kind) {
                let key = (equipment.id.clone(), spec.name.clone());
                let profile = self.anomalies.get(&key);
                readings.push(self.generator.next(equipment, &spec.name, tick_index, profile)?);
            }
        }
        self.process_readings(tick_index, readings).await
    }

    /// Evaluate and dispatch against caller-supplied readings.
    ///
    /// This is the whole pipeline minus generation; `tick` feeds it, and
    /// tests script exact value sequences through it. Only conditions
    /// whose bound sensor received a reading this tick are evaluated.
    pub async fn process_readings(
        &mut self,
        tick_index: u64,
        readings: Vec<SensorReading>,
    ) -> Result<TickReport, EngineError> {
        for reading in &readings {
            self.sink.reading(reading);
            self.last_readings.insert(
                (reading.equipment_id.clone(), reading.sensor_name.clone()),
                reading.clone(),
            );
        }

        let mut triggers = Vec::new();
        for (node_id, condition) in self.graph.conditions() {
            let key = (condition.equipment_id.clone(), condition.sensor_name.clone());
            let Some(reading) = self.last_readings.get(&key) else {
                continue;
            };
            if reading.tick_index != tick_index {
                continue;
            }

            let breached = evaluate(condition, reading)?;
            let Some(state) = self.arm_states.get_mut(node_id) else {
                continue;
            };
            match (*state, breached) {
                (ArmState::Idle, true) => {
                    *state = ArmState::Armed;
                    triggers.push(TriggerEvent {
                        condition_node_id: node_id.to_string(),
                        reading: reading.clone(),
                        fired_at_tick: tick_index,
                    });
                }
                (ArmState::Armed, false) => *state = ArmState::Idle,
                _ => {}
            }
        }

        for event in &triggers {
            self.sink.trigger(event);
        }

        let mut results = Vec::new();
        let mut pending = Vec::new();
        for event in &triggers {
            let Some(condition) = self.graph.condition(&event.condition_node_id) else {
                continue;
            };
            let ctx = AlertContext::from_reading(
                &event.reading,
                condition.operator.to_string(),
                condition.threshold,
                condition.threshold_high,
            );
            for (action_id, action) in self.graph.actions_for(&event.condition_node_id) {
                match self.renderer.render(&action.message_template, &ctx) {
                    Ok(body) => pending.push(PendingDispatch {
                        action_node_id: action_id.to_string(),
                        channel: action.channel,
                        recipient: action.recipient.clone(),
                        message: NotificationMessage::new(ctx.subject(), body),
                    }),
                    // A render failure on one action is recorded like any
                    // other delivery failure and must not stop the rest.
                    Err(e) => {
                        tracing::warn!(
                            action_node_id = action_id,
                            error = %e,
                            "message template failed to render"
                        );
                        results.push(NotificationResult {
                            id: uuid::Uuid::new_v4(),
                            action_node_id: action_id.to_string(),
                            channel: action.channel,
                            recipient: action.recipient.clone(),
                            status: DispatchStatus::Failed,
                            error: Some(e.to_string()),
                            attempted_at: Utc::now(),
                        });
                    }
                }
            }
        }

        let dispatched = join_all(pending.iter().map(|p| {
            self.dispatcher
                .dispatch(&p.action_node_id, p.channel, &p.recipient, &p.message)
        }))
        .await;
        results.extend(dispatched);

        for result in &results {
            self.sink.result(result);
        }

        Ok(TickReport {
            tick_index,
            readings,
            triggers,
            results,
        })
    }

    /// Evaluate every condition against the given readings without
    /// touching trigger state or dispatching. Used to preview a graph
    /// before running it.
    pub fn dry_run(&self, readings: &[SensorReading]) -> Result<Vec<DryRunOutcome>, EngineError> {
        let by_pair: HashMap<(&str, &str), &SensorReading> = readings
            .iter()
            .map(|r| ((r.equipment_id.as_str(), r.sensor_name.as_str()), r))
            .collect();

        let mut outcomes = Vec::new();
        for (node_id, condition) in self.graph.conditions() {
            let reading =
                by_pair.get(&(condition.equipment_id.as_str(), condition.sensor_name.as_str()));
            let would_trigger = match reading {
                Some(r) => evaluate(condition, r)?,
                None => false,
            };
            outcomes.push(DryRunOutcome {
                condition_node_id: node_id.to_string(),
                value: reading.map(|r| r.value),
                would_trigger,
                actions: self
                    .graph
                    .actions_for(node_id)
                    .iter()
                    .map(|(id, _)| id.to_string())
                    .collect(),
            });
        }
        Ok(outcomes)
    }

    /// Synthesize one reading per condition that satisfies it, for
    /// exercising the full trigger path in a dry run.
    pub fn triggering_readings(&self) -> Vec<SensorReading> {
        let mut readings = Vec::new();
        for (_, condition) in self.graph.conditions() {
            let Some(equipment) = self
                .graph
                .equipment()
                .iter()
                .find(|e| e.id == condition.equipment_id)
            else {
                continue;
            };
            let unit = self
                .generator
                .catalog()
                .spec(equipment.kind, &condition.sensor_name)
                .map(|s| s.unit.clone())
                .unwrap_or_default();
            let value = match condition.operator {
                Operator::GreaterThan | Operator::GreaterOrEqual => condition.threshold + 10.0,
                Operator::LessThan | Operator::LessOrEqual => condition.threshold - 10.0,
                Operator::Between => {
                    let high = condition.threshold_high.unwrap_or(condition.threshold);
                    (condition.threshold + high) / 2.0
                }
            };
            readings.push(SensorReading {
                equipment_id: condition.equipment_id.clone(),
                equipment_type: equipment.kind,
                sensor_name: condition.sensor_name.clone(),
                value,
                unit,
                tick_index: 0,
                timestamp: Utc::now(),
            });
        }
        readings
    }
}
