//! Workflow execution engine for simulated telemetry.
//!
//! This crate provides:
//! - pure condition evaluation with epsilon-tolerant boundary checks
//! - edge-triggered execution over a validated workflow graph
//! - a tick-ordered simulation clock with cooperative shutdown
//! - fire-and-forget result emission via the `RunSink` trait

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod runner;
pub mod sink;

pub use engine::{DryRunOutcome, ExecutionEngine, TickReport};
pub use error::EngineError;
pub use evaluator::evaluate;
pub use runner::{RunSummary, SimulationRunner};
pub use sink::{ChannelSink, NullSink, RunEvent, RunSink, TracingSink};
