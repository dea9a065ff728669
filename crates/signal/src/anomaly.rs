//! Anomaly profiles applied to a single (equipment, sensor) pair.

use serde::{Deserialize, Serialize};

/// Shapes of injected sensor anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    /// Single-tick offset at `start_tick`; reverts the next tick.
    Spike,
    /// Linear ramp up to `magnitude` over `duration` ticks, then holds.
    Drift,
    /// Sinusoidal swing of amplitude `magnitude` for `duration` ticks.
    Oscillation,
    /// Value frozen at the reading captured at `start_tick` until cleared.
    Flatline,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnomalyKind::Spike => "spike",
            AnomalyKind::Drift => "drift",
            AnomalyKind::Oscillation => "oscillation",
            AnomalyKind::Flatline => "flatline",
        };
        f.write_str(s)
    }
}

/// An anomaly attached to one (equipment, sensor) pair for a bounded
/// tick window. At most one profile is active per pair at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyProfile {
    pub kind: AnomalyKind,
    pub start_tick: u64,
    pub magnitude: f64,
    /// Ramp/oscillation window in ticks. Ignored for flatline, which
    /// persists until the profile is cleared.
    pub duration: u64,
}

impl AnomalyProfile {
    /// Whether this profile distorts the reading at `tick`.
    pub fn affects(&self, tick: u64) -> bool {
        if tick < self.start_tick {
            return false;
        }
        match self.kind {
            AnomalyKind::Spike => tick == self.start_tick,
            // Drift holds at full magnitude after the ramp; flatline stays
            // frozen until explicitly cleared.
            AnomalyKind::Drift | AnomalyKind::Flatline => true,
            AnomalyKind::Oscillation => tick < self.start_tick + self.duration,
        }
    }
}
