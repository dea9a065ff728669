//! Events the pipeline produces while a simulation runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::equipment::Channel;
use crate::reading::SensorReading;

/// Emitted once per rising edge of a condition node.
///
/// A condition that stays breached across consecutive ticks produces a
/// single event; it only fires again after evaluating false in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub condition_node_id: String,
    pub reading: SensorReading,
    pub fired_at_tick: u64,
}

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Failed,
    Mocked,
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatchStatus::Sent => "sent",
            DispatchStatus::Failed => "failed",
            DispatchStatus::Mocked => "mocked",
        };
        f.write_str(s)
    }
}

/// Recorded for every dispatch attempt, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub id: Uuid,
    pub action_node_id: String,
    pub channel: Channel,
    pub recipient: String,
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl NotificationResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DispatchStatus::Sent | DispatchStatus::Mocked)
    }
}
