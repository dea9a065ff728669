//! sim-worker — runs the telemetry simulation pipeline.
//!
//! Loads a workflow graph definition from JSON, builds the deterministic
//! signal generator and notification dispatcher from the environment, and
//! drives ticks until the tick budget is exhausted or Ctrl-C.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use nexus_core::config::{load_dotenv, Config};
use nexus_core::SensorCatalog;
use nexus_engine::{ExecutionEngine, SimulationRunner, TracingSink};
use nexus_graph::{GraphDefinition, WorkflowGraph};
use nexus_notify::Dispatcher;
use nexus_signal::SignalGenerator;

// ── CLI ─────────────────────────────────────────────────────────────

/// Telemetry simulation worker — deterministic signals, workflow
/// evaluation, and notification dispatch.
#[derive(Parser, Debug)]
#[command(name = "sim-worker", version, about)]
struct Cli {
    /// Path to the workflow graph definition (JSON).
    #[arg(long, env = "NEXUS_GRAPH", default_value = "config/workflow.json")]
    graph: String,

    /// Stop after this many ticks (runs until Ctrl-C when omitted).
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the tick interval from the environment, in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Override the generator seed from the environment.
    #[arg(long)]
    seed: Option<u64>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();

    let seed = cli.seed.unwrap_or(config.simulation.seed);
    let tick_interval = cli
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.simulation.tick_interval());

    let raw = std::fs::read_to_string(&cli.graph)
        .with_context(|| format!("reading graph definition from {}", cli.graph))?;
    let definition = GraphDefinition::from_json(&raw)
        .with_context(|| format!("parsing graph definition from {}", cli.graph))?;

    let catalog = SensorCatalog::builtin();
    let graph = WorkflowGraph::load(&definition, &catalog).context("validating workflow graph")?;
    info!(
        path = %cli.graph,
        equipment = graph.equipment().len(),
        "workflow graph loaded"
    );

    let dispatcher = Dispatcher::from_config(&config.notify).context("building dispatcher")?;
    if dispatcher.is_mock() {
        info!("notification dispatch is mocked; no outbound calls will be made");
    }

    let generator = SignalGenerator::new(seed, catalog);
    let engine = ExecutionEngine::new(graph, generator, dispatcher, Box::new(TracingSink))
        .context("building execution engine")?;
    let runner = SimulationRunner::new(engine, tick_interval);

    let shutdown = runner.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received");
            // notify_one stores a permit, so a signal arriving while a
            // tick is still in flight is not lost.
            shutdown.notify_one();
        }
    });

    info!(seed, interval_ms = tick_interval.as_millis() as u64, "sim-worker starting");
    let summary = runner.run(cli.ticks).await?;
    info!(
        ticks = summary.ticks,
        triggers = summary.triggers,
        notifications = summary.notifications,
        "sim-worker exited cleanly"
    );
    Ok(())
}
