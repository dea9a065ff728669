use nexus_graph::GraphError;
use nexus_notify::NotifyError;
use nexus_signal::SignalError;
use thiserror::Error;

/// Run-aborting engine errors.
///
/// All of these indicate a broken setup or a caller contract violation,
/// detected at load or first use. Transient delivery failures are not
/// errors; they surface as `failed` notification results.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("reading for '{got}' does not match condition bound to '{expected}'")]
    SensorMismatch { expected: String, got: String },

    #[error("unknown equipment: {0}")]
    UnknownEquipment(String),

    #[error("action node '{node_id}' has an invalid message template: {source}")]
    InvalidTemplate {
        node_id: String,
        #[source]
        source: NotifyError,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}
