//! Pipeline-specific error types.

use crate::pipeline::id::NodeId;
use thiserror::Error;

/// Errors that can occur within the pipeline system.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Node {node_id:?} error: {message}")]
    Node { node_id: NodeId, message: String },

    #[error("Node {node_id:?} ({name}) failed: {source}")]
    NodeFailed {
        node_id: NodeId,
        name: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Iteration step {index} failed: {source}")]
    StepFailed {
        index: usize,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {node_id:?} has no slot '{slot}'")]
    UnknownSlot { node_id: NodeId, slot: String },

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Cycle detected in pipeline graph")]
    CycleDetected,

    #[error("Slot mismatch: {0}")]
    SlotMismatch(String),

    #[error("Slot configuration is sealed: {0}")]
    SealedSlots(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run was cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a script error from a Rhai error.
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        PipelineError::Script(err.to_string())
    }

    /// True if this error is, or wraps, a cooperative cancellation.
    pub fn is_cancellation(&self) -> bool {
        match self {
            PipelineError::Cancelled => true,
            PipelineError::NodeFailed { source, .. } | PipelineError::StepFailed { source, .. } => {
                source.is_cancellation()
            }
            _ => false,
        }
    }

    /// The innermost error, skipping node/step wrappers.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::NodeFailed { source, .. } | PipelineError::StepFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
