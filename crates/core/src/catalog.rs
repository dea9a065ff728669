//! Per-equipment-type sensor catalog.
//!
//! The catalog is normally supplied by the model-metadata collaborator;
//! the defaults here mirror the sensors the demo equipment ships with so
//! a run can start without an external catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentType;

/// A sensor a given equipment type exposes, with its unit and the
/// numeric range normal readings fall into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    pub name: String,
    pub unit: String,
    pub min_normal: f64,
    pub max_normal: f64,
}

impl SensorSpec {
    pub fn new(name: &str, unit: &str, min_normal: f64, max_normal: f64) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            min_normal,
            max_normal,
        }
    }
}

/// Valid sensors per equipment type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorCatalog {
    sensors: HashMap<EquipmentType, Vec<SensorSpec>>,
}

impl SensorCatalog {
    /// Empty catalog; populate with [`insert`](Self::insert).
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in sensors for all five equipment types.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.extend(
            EquipmentType::Analyzer,
            [
                SensorSpec::new("temp", "°C", 18.0, 28.0),
                SensorSpec::new("ph", "pH", 6.8, 7.2),
                SensorSpec::new("turbidity", "NTU", 0.5, 3.0),
                SensorSpec::new("conductivity", "µS/cm", 200.0, 400.0),
            ],
        );
        catalog.extend(
            EquipmentType::Robot,
            [
                SensorSpec::new("x_pos", "mm", 0.0, 2000.0),
                SensorSpec::new("y_pos", "mm", 0.0, 1500.0),
                SensorSpec::new("z_pos", "mm", 0.0, 1000.0),
                SensorSpec::new("vibration", "mm/s", 0.5, 2.5),
                SensorSpec::new("current", "A", 0.8, 1.5),
                SensorSpec::new("cycle_time", "s", 2.0, 8.0),
            ],
        );
        catalog.extend(
            EquipmentType::Centrifuge,
            [
                SensorSpec::new("rpm", "RPM", 3500.0, 4500.0),
                SensorSpec::new("vibration", "mm/s", 0.3, 1.5),
                SensorSpec::new("temp", "°C", 22.0, 32.0),
                SensorSpec::new("imbalance", "g", 0.0, 5.0),
            ],
        );
        catalog.extend(
            EquipmentType::Storage,
            [
                SensorSpec::new("level", "%", 30.0, 80.0),
                SensorSpec::new("temp", "°C", 18.0, 23.0),
                SensorSpec::new("humidity", "%RH", 35.0, 55.0),
                SensorSpec::new("pressure", "bar", 0.95, 1.05),
            ],
        );
        catalog.extend(
            EquipmentType::Conveyor,
            [
                SensorSpec::new("speed", "m/min", 10.0, 25.0),
                SensorSpec::new("current", "A", 1.2, 2.5),
                SensorSpec::new("vibration", "mm/s", 0.2, 1.0),
                SensorSpec::new("tension", "N", 200.0, 400.0),
            ],
        );

        catalog
    }

    /// Register a sensor for an equipment type, replacing any spec with
    /// the same name.
    pub fn insert(&mut self, kind: EquipmentType, spec: SensorSpec) {
        let specs = self.sensors.entry(kind).or_default();
        if let Some(existing) = specs.iter_mut().find(|s| s.name == spec.name) {
            *existing = spec;
        } else {
            specs.push(spec);
        }
    }

    fn extend(&mut self, kind: EquipmentType, specs: impl IntoIterator<Item = SensorSpec>) {
        for spec in specs {
            self.insert(kind, spec);
        }
    }

    /// Look up a sensor spec by equipment type and sensor name.
    pub fn spec(&self, kind: EquipmentType, sensor_name: &str) -> Option<&SensorSpec> {
        self.sensors
            .get(&kind)?
            .iter()
            .find(|s| s.name == sensor_name)
    }

    /// All sensors for an equipment type (empty slice if none registered).
    pub fn sensors_for(&self, kind: EquipmentType) -> &[SensorSpec] {
        self.sensors.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_all_equipment_types() {
        let catalog = SensorCatalog::builtin();
        for kind in EquipmentType::ALL {
            assert!(
                !catalog.sensors_for(kind).is_empty(),
                "no sensors for {kind}"
            );
        }
    }

    #[test]
    fn spec_lookup() {
        let catalog = SensorCatalog::builtin();
        let spec = catalog.spec(EquipmentType::Centrifuge, "rpm").unwrap();
        assert_eq!(spec.unit, "RPM");
        assert_eq!(spec.min_normal, 3500.0);
        assert_eq!(spec.max_normal, 4500.0);
    }

    #[test]
    fn spec_unknown_sensor_is_none() {
        let catalog = SensorCatalog::builtin();
        assert!(catalog.spec(EquipmentType::Storage, "rpm").is_none());
    }

    #[test]
    fn insert_replaces_existing_spec() {
        let mut catalog = SensorCatalog::builtin();
        catalog.insert(
            EquipmentType::Analyzer,
            SensorSpec::new("temp", "°C", 50.0, 50.0),
        );
        let spec = catalog.spec(EquipmentType::Analyzer, "temp").unwrap();
        assert_eq!(spec.min_normal, 50.0);
        assert_eq!(spec.max_normal, 50.0);
        // still only one "temp" entry
        let count = catalog
            .sensors_for(EquipmentType::Analyzer)
            .iter()
            .filter(|s| s.name == "temp")
            .count();
        assert_eq!(count, 1);
    }
}
