pub mod catalog;
pub mod config;
pub mod equipment;
pub mod events;
pub mod reading;

pub use catalog::{SensorCatalog, SensorSpec};
pub use config::Config;
pub use equipment::{Channel, Equipment, EquipmentType, UnknownChannel};
pub use events::{DispatchStatus, NotificationResult, TriggerEvent};
pub use reading::SensorReading;
