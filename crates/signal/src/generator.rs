//! Seeded, replayable sensor value generation.
//!
//! Baseline values are derived from a SHA-256 digest keyed by
//! `(seed, equipment_type, sensor_name, tick_index)`, so a run with the
//! same seed and tick sequence reproduces identical readings bit for bit.
//! Anomaly profiles distort the baseline without touching the keying.

use chrono::Utc;
use sha2::{Digest, Sha256};

use nexus_core::{Equipment, EquipmentType, SensorCatalog, SensorReading, SensorSpec};

use crate::anomaly::{AnomalyKind, AnomalyProfile};

/// Errors from the signal generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("unknown sensor '{sensor_name}' for equipment type '{equipment_type}'")]
    UnknownSensor {
        equipment_type: EquipmentType,
        sensor_name: String,
    },
}

/// Produces one reading per (equipment, sensor) per tick.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    seed: u64,
    catalog: SensorCatalog,
}

impl SignalGenerator {
    pub fn new(seed: u64, catalog: SensorCatalog) -> Self {
        Self { seed, catalog }
    }

    pub fn catalog(&self) -> &SensorCatalog {
        &self.catalog
    }

    /// Generate the reading for one (equipment, sensor) pair at `tick_index`,
    /// applying `active_profile` if it covers the tick.
    ///
    /// Fails with [`SignalError::UnknownSensor`] if the catalog has no such
    /// sensor for the equipment's type; the caller must not request
    /// undefined readings.
    pub fn next(
        &self,
        equipment: &Equipment,
        sensor_name: &str,
        tick_index: u64,
        active_profile: Option<&AnomalyProfile>,
    ) -> Result<SensorReading, SignalError> {
        let spec = self.catalog.spec(equipment.kind, sensor_name).ok_or_else(|| {
            SignalError::UnknownSensor {
                equipment_type: equipment.kind,
                sensor_name: sensor_name.to_string(),
            }
        })?;

        let baseline = self.baseline(spec, equipment.kind, sensor_name, tick_index);
        let value = match active_profile {
            Some(profile) if profile.affects(tick_index) => {
                self.apply_anomaly(profile, baseline, spec, equipment.kind, sensor_name, tick_index)
            }
            _ => baseline,
        };

        Ok(SensorReading {
            equipment_id: equipment.id.clone(),
            equipment_type: equipment.kind,
            sensor_name: sensor_name.to_string(),
            value,
            unit: spec.unit.clone(),
            tick_index,
            timestamp: Utc::now(),
        })
    }

    /// Baseline value inside the sensor's normal range, stable for a given
    /// `(seed, equipment_type, sensor_name, tick_index)` key.
    fn baseline(
        &self,
        spec: &SensorSpec,
        kind: EquipmentType,
        sensor_name: &str,
        tick_index: u64,
    ) -> f64 {
        let unit = self.unit_value(kind, sensor_name, tick_index);
        spec.min_normal + unit * (spec.max_normal - spec.min_normal)
    }

    /// Uniform value in `[0, 1)` derived from the keyed digest.
    fn unit_value(&self, kind: EquipmentType, sensor_name: &str, tick_index: u64) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(kind.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(sensor_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(tick_index.to_le_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        // 53 mantissa bits keep the conversion exact.
        let raw = u64::from_le_bytes(bytes) >> 11;
        raw as f64 / (1u64 << 53) as f64
    }

    fn apply_anomaly(
        &self,
        profile: &AnomalyProfile,
        baseline: f64,
        spec: &SensorSpec,
        kind: EquipmentType,
        sensor_name: &str,
        tick_index: u64,
    ) -> f64 {
        let elapsed = tick_index - profile.start_tick;
        match profile.kind {
            AnomalyKind::Spike => baseline + profile.magnitude,
            AnomalyKind::Drift => {
                let ramp_ticks = (elapsed + 1).min(profile.duration.max(1));
                let fraction = ramp_ticks as f64 / profile.duration.max(1) as f64;
                baseline + profile.magnitude * fraction
            }
            AnomalyKind::Oscillation => {
                let phase =
                    2.0 * std::f64::consts::PI * elapsed as f64 / profile.duration.max(1) as f64;
                baseline + profile.magnitude * phase.sin()
            }
            // Frozen at the baseline captured on the profile's start tick,
            // recomputed deterministically instead of stored.
            AnomalyKind::Flatline => {
                self.baseline(spec, kind, sensor_name, profile.start_tick)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::SensorSpec;

    fn generator(seed: u64) -> SignalGenerator {
        SignalGenerator::new(seed, SensorCatalog::builtin())
    }

    /// Catalog with a degenerate [50, 50] range so the baseline is exactly
    /// 50.0 and anomaly arithmetic is observable without noise.
    fn flat_generator() -> (SignalGenerator, Equipment) {
        let mut catalog = SensorCatalog::builtin();
        catalog.insert(
            EquipmentType::Analyzer,
            SensorSpec::new("temp", "°C", 50.0, 50.0),
        );
        (
            SignalGenerator::new(42, catalog),
            Equipment::new("an-01", EquipmentType::Analyzer),
        )
    }

    #[test]
    fn same_seed_replays_identical_values() {
        let a = generator(42);
        let b = generator(42);
        let eq = Equipment::new("cf-01", EquipmentType::Centrifuge);
        for tick in 0..50 {
            let ra = a.next(&eq, "rpm", tick, None).unwrap();
            let rb = b.next(&eq, "rpm", tick, None).unwrap();
            assert_eq!(ra.value, rb.value, "tick {tick} diverged");
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = generator(1);
        let b = generator(2);
        let eq = Equipment::new("cf-01", EquipmentType::Centrifuge);
        let diverged = (0..20).any(|tick| {
            a.next(&eq, "rpm", tick, None).unwrap().value
                != b.next(&eq, "rpm", tick, None).unwrap().value
        });
        assert!(diverged);
    }

    #[test]
    fn baseline_stays_in_normal_range() {
        let gen = generator(7);
        let eq = Equipment::new("st-01", EquipmentType::Storage);
        for tick in 0..200 {
            let reading = gen.next(&eq, "level", tick, None).unwrap();
            assert!((30.0..80.0).contains(&reading.value), "tick {tick}: {}", reading.value);
        }
    }

    #[test]
    fn unknown_sensor_fails() {
        let gen = generator(0);
        let eq = Equipment::new("cv-01", EquipmentType::Conveyor);
        let err = gen.next(&eq, "rpm", 0, None).unwrap_err();
        assert_eq!(
            err,
            SignalError::UnknownSensor {
                equipment_type: EquipmentType::Conveyor,
                sensor_name: "rpm".to_string(),
            }
        );
    }

    #[test]
    fn spike_offsets_single_tick_then_reverts() {
        let (gen, eq) = flat_generator();
        let profile = AnomalyProfile {
            kind: AnomalyKind::Spike,
            start_tick: 5,
            magnitude: 30.0,
            duration: 1,
        };
        let at = |tick| gen.next(&eq, "temp", tick, Some(&profile)).unwrap().value;
        assert_eq!(at(4), 50.0);
        assert_eq!(at(5), 80.0);
        assert_eq!(at(6), 50.0);
    }

    #[test]
    fn drift_ramps_then_holds() {
        let (gen, eq) = flat_generator();
        let profile = AnomalyProfile {
            kind: AnomalyKind::Drift,
            start_tick: 10,
            magnitude: 20.0,
            duration: 5,
        };
        let at = |tick| gen.next(&eq, "temp", tick, Some(&profile)).unwrap().value;
        assert_eq!(at(10), 54.0);
        assert_eq!(at(12), 62.0);
        assert_eq!(at(14), 70.0);
        assert_eq!(at(15), 70.0);
        assert_eq!(at(100), 70.0);
    }

    #[test]
    fn oscillation_swings_and_reverts() {
        let (gen, eq) = flat_generator();
        let profile = AnomalyProfile {
            kind: AnomalyKind::Oscillation,
            start_tick: 0,
            magnitude: 10.0,
            duration: 4,
        };
        let at = |tick| gen.next(&eq, "temp", tick, Some(&profile)).unwrap().value;
        assert!((at(0) - 50.0).abs() < 1e-9); // sin(0)
        assert!((at(1) - 60.0).abs() < 1e-9); // sin(π/2)
        assert!((at(3) - 40.0).abs() < 1e-9); // sin(3π/2)
        assert_eq!(at(4), 50.0); // window over
    }

    #[test]
    fn flatline_freezes_start_tick_value() {
        let gen = generator(42);
        let eq = Equipment::new("cf-01", EquipmentType::Centrifuge);
        let frozen = gen.next(&eq, "rpm", 8, None).unwrap().value;

        let profile = AnomalyProfile {
            kind: AnomalyKind::Flatline,
            start_tick: 8,
            magnitude: 0.0,
            duration: 0,
        };
        for tick in 8..30 {
            let reading = gen.next(&eq, "rpm", tick, Some(&profile)).unwrap();
            assert_eq!(reading.value, frozen, "tick {tick}");
        }
        // Cleared profile returns to live baseline.
        let live = gen.next(&eq, "rpm", 31, None).unwrap().value;
        assert_ne!(live, frozen);
    }

    #[test]
    fn reading_carries_unit_and_tick() {
        let gen = generator(3);
        let eq = Equipment::new("rb-01", EquipmentType::Robot);
        let reading = gen.next(&eq, "vibration", 12, None).unwrap();
        assert_eq!(reading.unit, "mm/s");
        assert_eq!(reading.tick_index, 12);
        assert_eq!(reading.sensor_key(), "rb-01.vibration");
    }
}
