//! Pure condition evaluation.
//!
//! `>=`, `<=`, and `between` use a small relative epsilon on their
//! boundary checks so floating-point noise at exactly the threshold
//! doesn't flicker between triggered and not. Strict `>` and `<` stay
//! ordinary comparisons.

use nexus_core::SensorReading;
use nexus_graph::{Condition, Operator};

use crate::error::EngineError;

const RELATIVE_EPSILON: f64 = 1e-9;

fn epsilon_for(value: f64, threshold: f64) -> f64 {
    RELATIVE_EPSILON * value.abs().max(threshold.abs()).max(1.0)
}

/// Evaluate a condition against the latest reading for its bound sensor.
///
/// Pure, no side effects. Fails with [`EngineError::SensorMismatch`] if
/// the reading belongs to a different (equipment, sensor) pair than the
/// condition is bound to — a caller contract violation, never silently
/// ignored.
pub fn evaluate(condition: &Condition, reading: &SensorReading) -> Result<bool, EngineError> {
    if reading.equipment_id != condition.equipment_id
        || reading.sensor_name != condition.sensor_name
    {
        return Err(EngineError::SensorMismatch {
            expected: format!("{}.{}", condition.equipment_id, condition.sensor_name),
            got: format!("{}.{}", reading.equipment_id, reading.sensor_name),
        });
    }

    let value = reading.value;
    let threshold = condition.threshold;

    let triggered = match condition.operator {
        Operator::GreaterThan => value > threshold,
        Operator::LessThan => value < threshold,
        Operator::GreaterOrEqual => value >= threshold - epsilon_for(value, threshold),
        Operator::LessOrEqual => value <= threshold + epsilon_for(value, threshold),
        Operator::Between => {
            // Validated at graph load; a missing upper bound here means the
            // condition bypassed validation, treat it as a degenerate range.
            let high = condition.threshold_high.unwrap_or(threshold);
            value >= threshold - epsilon_for(value, threshold)
                && value <= high + epsilon_for(value, high)
        }
    };

    Ok(triggered)
}
