//! Dataflow graph engine.
//!
//! Nodes own typed, named data slots; edges connect an output slot to an
//! input slot of a compatible type. A run executes the nodes of one graph
//! in topological order, gathering each node's inputs from its upstream
//! outputs just before it runs.
//!
//! # Architecture
//!
//! ```text
//! [GroupInput] ──► [Script] ──► [GroupOutput]      (wrapped graph)
//!        ▲                            │
//!        │ inject step rows           │ harvest rows
//! [Composite] ◄───────────────────────┘            (outer graph)
//! ```
//!
//! # Design
//!
//! - **Enum dispatch for builtins**: `BuiltinNode` covers every shipped node and
//!   is serialisable; host nodes plug in through `NodePlugin`.
//! - **Rows share items**: `DataItem` is reference counted, so moving rows
//!   between slots never copies payloads.
//! - **Stable ids**: `NodeId` indexes the node vector; removal leaves a tombstone.
//! - **Borrowed pool**: the run attaches the shared `WorkerPool` to every node
//!   and a drop guard detaches it again.

pub mod annotation;
pub mod data;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod nodes;
pub mod plan;
pub mod pool;
pub mod run;
pub mod slot;

pub use annotation::{
    DataAnnotationMergeMode, DataAnnotations, TextAnnotationMergeMode, TextAnnotations,
};
pub use data::{DataContext, DataItem, DataRow, DataSlot};
pub use error::{PipelineError, PipelineResult};
pub use graph::{Edge, GraphDefinition, NodeDefinition, PipelineGraph};
pub use id::{EdgeId, NodeId, SlotRef};
pub use node::{AnyNode, BuiltinNode, NodeContext, NodeKind, NodePlugin};
pub use nodes::{BoundaryNode, BoundaryRole, ScriptNode};
pub use plan::{ExecutionPlan, PlanStats};
pub use pool::WorkerPool;
pub use run::{CancellationToken, EtaEstimator, GraphRun, ProgressInfo, RunContext, RunReport};
pub use slot::{DataType, SlotDescriptor, SlotDirection, SlotSet};
