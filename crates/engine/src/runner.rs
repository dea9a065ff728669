//! Tick clock driving the engine.
//!
//! Ticks are strictly ordered: the next tick is not started until the
//! previous one (including its dispatches) has completed. A slow tick
//! therefore delays the clock instead of overlapping with it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::engine::ExecutionEngine;
use crate::error::EngineError;

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub triggers: u64,
    pub notifications: u64,
}

/// Runs the engine on a fixed interval until stopped.
pub struct SimulationRunner {
    engine: ExecutionEngine,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
}

impl SimulationRunner {
    pub fn new(engine: ExecutionEngine, tick_interval: Duration) -> Self {
        Self {
            engine,
            tick_interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle that stops the run loop after the in-flight tick finishes.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    /// Drive ticks until `max_ticks` is reached (if given) or the
    /// shutdown handle is notified.
    pub async fn run(mut self, max_ticks: Option<u64>) -> Result<RunSummary, EngineError> {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = RunSummary::default();
        let mut tick_index = 0u64;

        loop {
            if let Some(max) = max_ticks {
                if tick_index >= max {
                    break;
                }
            }

            tokio::select! {
                _ = interval.tick() => {
                    let report = self.engine.tick(tick_index).await?;
                    summary.ticks += 1;
                    summary.triggers += report.triggers.len() as u64;
                    summary.notifications += report.results.len() as u64;
                    tick_index += 1;
                }
                _ = self.shutdown.notified() => {
                    tracing::info!(ticks = summary.ticks, "shutdown requested");
                    break;
                }
            }
        }

        tracing::info!(
            ticks = summary.ticks,
            triggers = summary.triggers,
            notifications = summary.notifications,
            "run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nexus_core::{EquipmentType, SensorCatalog, SensorSpec};
    use nexus_graph::{GraphDefinition, WorkflowGraph};
    use nexus_notify::Dispatcher;
    use nexus_signal::SignalGenerator;

    use crate::sink::NullSink;

    fn engine() -> ExecutionEngine {
        engine_with(Dispatcher::mocked())
    }

    fn engine_with(dispatcher: Dispatcher) -> ExecutionEngine {
        let json = r#"{
            "nodes": [
                {"id": "eq1", "kind": "equipment",
                 "equipment_id": "cf-01", "equipment_type": "centrifuge"},
                {"id": "c1", "kind": "condition",
                 "equipment_id": "cf-01", "sensor_name": "rpm",
                 "operator": ">", "threshold": 0},
                {"id": "a1", "kind": "action", "channel": "email",
                 "recipient": "ops@example.com", "message_template": "{{ value }}"}
            ],
            "edges": [
                {"source": "eq1", "target": "c1"},
                {"source": "c1", "target": "a1"}
            ]
        }"#;
        let mut catalog = SensorCatalog::builtin();
        catalog.insert(EquipmentType::Centrifuge, SensorSpec::new("rpm", "RPM", 3000.0, 5000.0));
        let definition = GraphDefinition::from_json(json).unwrap();
        let graph = WorkflowGraph::load(&definition, &catalog).unwrap();
        ExecutionEngine::new(
            graph,
            SignalGenerator::new(7, catalog),
            dispatcher,
            Box::new(NullSink),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn runs_exactly_max_ticks() {
        let runner = SimulationRunner::new(engine(), Duration::from_millis(100));
        let summary = runner.run(Some(5)).await.unwrap();
        assert_eq!(summary.ticks, 5);
        // rpm > 0 fires on the first tick and stays armed
        assert_eq!(summary.triggers, 1);
        assert_eq!(summary.notifications, 1);
    }

    struct SlowNotifier;

    #[async_trait::async_trait]
    impl nexus_notify::Notifier for SlowNotifier {
        async fn send(
            &self,
            _recipient: &str,
            _message: &nexus_notify::NotificationMessage,
        ) -> Result<(), nexus_notify::NotifyError> {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            Ok(())
        }
        fn channel_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_loop() {
        let runner = SimulationRunner::new(engine(), Duration::from_millis(100));
        let shutdown = runner.shutdown_handle();
        let handle = tokio::spawn(runner.run(None));

        tokio::time::sleep(Duration::from_millis(350)).await;
        shutdown.notify_one();

        let summary = handle.await.unwrap().unwrap();
        assert!(summary.ticks >= 1);
        assert!(summary.ticks <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_tick_is_not_lost() {
        let adapters: std::collections::HashMap<_, _> = std::collections::HashMap::from([(
            nexus_core::Channel::Email,
            Box::new(SlowNotifier) as Box<dyn nexus_notify::Notifier>,
        )]);
        let dispatcher = Dispatcher::with_adapters(adapters, Duration::from_secs(5));
        let runner = SimulationRunner::new(engine_with(dispatcher), Duration::from_millis(100));
        let shutdown = runner.shutdown_handle();
        let handle = tokio::spawn(runner.run(None));

        // The first tick's dispatch holds the loop for 1.5s; the signal
        // lands while no task is awaiting notified() and must still stop
        // the run afterwards.
        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.notify_one();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.ticks, 1);
    }
}
