//! Deterministic telemetry generation with injectable anomalies.
//!
//! This crate provides:
//! - `SignalGenerator` producing one reading per (equipment, sensor) per tick,
//!   bit-reproducible for a fixed seed
//! - `AnomalyProfile` describing spike/drift/oscillation/flatline distortions
//!   over a bounded tick window

pub mod anomaly;
pub mod generator;

pub use anomaly::{AnomalyKind, AnomalyProfile};
pub use generator::{SignalError, SignalGenerator};
