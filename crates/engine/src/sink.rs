//! Fire-and-forget emission of run artifacts.
//!
//! The logger/UI collaborator consumes readings, triggers, and dispatch
//! results as they are produced. The engine never blocks on the sink
//! accepting a value.

use nexus_core::{NotificationResult, SensorReading, TriggerEvent};
use tokio::sync::mpsc;

/// Receives each artifact as the engine produces it.
pub trait RunSink: Send + Sync {
    fn reading(&self, _reading: &SensorReading) {}
    fn trigger(&self, _event: &TriggerEvent) {}
    fn result(&self, _result: &NotificationResult) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl RunSink for NullSink {}

/// Logs artifacts through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl RunSink for TracingSink {
    fn reading(&self, reading: &SensorReading) {
        tracing::debug!(
            tick = reading.tick_index,
            sensor = %reading.sensor_key(),
            value = reading.value,
            unit = %reading.unit,
            "reading"
        );
    }

    fn trigger(&self, event: &TriggerEvent) {
        tracing::info!(
            tick = event.fired_at_tick,
            condition = %event.condition_node_id,
            sensor = %event.reading.sensor_key(),
            value = event.reading.value,
            "condition triggered"
        );
    }

    fn result(&self, result: &NotificationResult) {
        tracing::info!(
            action = %result.action_node_id,
            channel = %result.channel,
            status = %result.status,
            error = result.error.as_deref().unwrap_or(""),
            "dispatch result"
        );
    }
}

/// One artifact forwarded by [`ChannelSink`].
#[derive(Debug, Clone)]
pub enum RunEvent {
    Reading(SensorReading),
    Trigger(TriggerEvent),
    Result(NotificationResult),
}

/// Forwards artifacts over an unbounded channel.
///
/// `send` on an unbounded channel never blocks, and a dropped receiver
/// is ignored: the run keeps going whether or not anyone listens.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RunSink for ChannelSink {
    fn reading(&self, reading: &SensorReading) {
        let _ = self.tx.send(RunEvent::Reading(reading.clone()));
    }

    fn trigger(&self, event: &TriggerEvent) {
        let _ = self.tx.send(RunEvent::Trigger(event.clone()));
    }

    fn result(&self, result: &NotificationResult) {
        let _ = self.tx.send(RunEvent::Result(result.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nexus_core::EquipmentType;

    fn reading() -> SensorReading {
        SensorReading {
            equipment_id: "cf-01".to_string(),
            equipment_type: EquipmentType::Centrifuge,
            sensor_name: "rpm".to_string(),
            value: 4000.0,
            unit: "RPM".to_string(),
            tick_index: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (sink, mut rx) = ChannelSink::new();
        sink.reading(&reading());
        match rx.try_recv().unwrap() {
            RunEvent::Reading(r) => assert_eq!(r.sensor_name, "rpm"),
            other => panic!("expected reading, got {other:?}"),
        }
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        // must not panic or block
        sink.reading(&reading());
    }
}
