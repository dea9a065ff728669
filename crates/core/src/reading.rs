use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentType;

/// One telemetry reading for a single (equipment, sensor) pair.
///
/// Emitted once per simulation tick and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub sensor_name: String,
    pub value: f64,
    pub unit: String,
    pub tick_index: u64,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    /// Key identifying the (equipment, sensor) pair this reading belongs to.
    pub fn sensor_key(&self) -> String {
        format!("{}.{}", self.equipment_id, self.sensor_name)
    }
}
