//! Composite nodes: a whole pipeline exposed as a single node.
//!
//! A [`CompositeNode`] owns a wrapped [`PipelineGraph`] that contains
//! exactly one group input and one group output boundary node. The
//! composite node's own slots are derived from those two nodes and are
//! regenerated synchronously by every API that edits them.
//!
//! Running the node:
//! 1. [`StepGenerator`] partitions the input rows into iteration steps.
//! 2. [`FailureRecovery`] resolves the failure policies once per run.
//! 3. [`NestedRunOrchestrator`] runs the wrapped graph once per step and
//!    collects the group output rows into the composite node's outputs.
//!
//! # Example
//!
//! ```ignore
//! use subflow_rs::composite::{CompositeNode, IterationMode};
//! use subflow_rs::pipeline::DataType;
//!
//! let mut node = CompositeNode::new("Segment");
//! node.add_input_slot("Image", DataType::new("image"))?;
//! node.add_output_slot("Mask", DataType::new("mask"))?;
//! node.settings_mut().iteration_mode = IterationMode::Iterating;
//! ```

pub mod iteration;
pub mod orchestrator;
pub mod recovery;
pub mod settings;
pub mod sync;

pub use iteration::{natural_cmp, GeneratedSteps, IterationStep, StepGenerator, StepInput};
pub use orchestrator::NestedRunOrchestrator;
pub use recovery::{
    export_failed_step, resolve_continue_on_failure, resolve_export_failed_inputs, FailedStep,
    FailureDecision, FailureRecovery, RunSummary,
};
pub use settings::{
    ColumnMatching, CompositeSettings, FailurePolicy, IterationMode, StepGeneratorSettings,
    StepIsolation,
};
pub use sync::{edit_composite_in_graph, projected_slots, regenerate_in_graph, SyncReport};

use crate::pipeline::{
    AnyNode, BoundaryNode, DataType, NodeContext, NodeId, NodeKind, PipelineError, PipelineGraph,
    PipelineResult, SlotSet, WorkerPool,
};
use serde::{Deserialize, Serialize};

/// Node ids of the two boundary nodes inside a wrapped graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryHandles {
    pub input: NodeId,
    pub output: NodeId,
}

/// Find the group input and group output of `graph`, creating whichever is missing.
pub fn ensure_boundaries(graph: &mut PipelineGraph) -> BoundaryHandles {
    let input = graph
        .find_first_node_of_kind(NodeKind::GroupInput)
        .unwrap_or_else(|| {
            tracing::debug!("Wrapped graph has no group input, creating one");
            graph.insert_node(BoundaryNode::input())
        });
    let output = graph
        .find_first_node_of_kind(NodeKind::GroupOutput)
        .unwrap_or_else(|| {
            tracing::debug!("Wrapped graph has no group output, creating one");
            graph.insert_node(BoundaryNode::output())
        });
    BoundaryHandles { input, output }
}

fn handles_valid(graph: &PipelineGraph, handles: BoundaryHandles) -> bool {
    let kind_of = |id| graph.node(id).map(AnyNode::kind);
    kind_of(handles.input) == Some(NodeKind::GroupInput)
        && kind_of(handles.output) == Some(NodeKind::GroupOutput)
}

/// A node whose behaviour is an embedded pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CompositeNodeDefinition", into = "CompositeNodeDefinition")]
pub struct CompositeNode {
    name: String,
    settings: CompositeSettings,
    wrapped: PipelineGraph,
    /// Derived from the boundary nodes, never edited directly.
    slots: SlotSet,
    boundaries: BoundaryHandles,
    /// Suppresses regeneration while a caller is mid-edit.
    prevent_update_slots: bool,
    /// Borrowed while the outer run is in progress.
    worker_pool: Option<WorkerPool>,
    last_summary: Option<RunSummary>,
}

#[derive(Serialize, Deserialize)]
struct CompositeNodeDefinition {
    name: String,
    #[serde(default)]
    settings: CompositeSettings,
    #[serde(default)]
    graph: PipelineGraph,
}

impl From<CompositeNodeDefinition> for CompositeNode {
    fn from(def: CompositeNodeDefinition) -> Self {
        let mut node = CompositeNode::with_graph(def.name, def.graph);
        node.settings = def.settings;
        node
    }
}

impl From<CompositeNode> for CompositeNodeDefinition {
    fn from(node: CompositeNode) -> Self {
        Self {
            name: node.name,
            settings: node.settings,
            graph: node.wrapped,
        }
    }
}

impl CompositeNode {
    /// Composite node around an empty pipeline (just the two boundaries).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_graph(name, PipelineGraph::new())
    }

    /// Wrap `graph`, adding boundary nodes if it has none.
    pub fn with_graph(name: impl Into<String>, mut graph: PipelineGraph) -> Self {
        let boundaries = ensure_boundaries(&mut graph);
        let mut node = Self {
            name: name.into(),
            settings: CompositeSettings::default(),
            wrapped: graph,
            slots: SlotSet::new(),
            boundaries,
            prevent_update_slots: false,
            worker_pool: None,
            last_summary: None,
        };
        if let Err(e) = node.regenerate_slots() {
            tracing::warn!("Failed to derive slots of composite '{}': {}", node.name, e);
        }
        node
    }

    pub fn with_settings(mut self, settings: CompositeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn settings(&self) -> &CompositeSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut CompositeSettings {
        &mut self.settings
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    pub fn wrapped_graph(&self) -> &PipelineGraph {
        &self.wrapped
    }

    pub fn boundaries(&self) -> BoundaryHandles {
        self.boundaries
    }

    /// Summary of the most recent run, if any.
    pub fn last_run_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    pub fn set_worker_pool(&mut self, pool: Option<WorkerPool>) {
        self.worker_pool = pool;
    }

    // ==================== Structure Editing ====================

    /// Replace the wrapped graph.
    pub fn set_wrapped_graph(&mut self, graph: PipelineGraph) -> PipelineResult<()> {
        self.wrapped = graph;
        self.boundaries = ensure_boundaries(&mut self.wrapped);
        self.regenerate_slots()
    }

    /// Edit the wrapped graph in place, then resynchronise.
    pub fn edit_wrapped_graph<R>(
        &mut self,
        edit: impl FnOnce(&mut PipelineGraph, BoundaryHandles) -> R,
    ) -> PipelineResult<R> {
        let result = edit(&mut self.wrapped, self.boundaries);
        if !handles_valid(&self.wrapped, self.boundaries) {
            self.boundaries = ensure_boundaries(&mut self.wrapped);
        }
        self.wrapped.prune_dangling_edges();
        self.regenerate_slots()?;
        Ok(result)
    }

    pub fn add_input_slot(&mut self, name: &str, data_type: DataType) -> PipelineResult<()> {
        self.boundary_mut(self.boundaries.input)?
            .add_slot(name, data_type)?;
        self.regenerate_slots()
    }

    /// Add an input that may stay empty without making steps incomplete.
    pub fn add_optional_input_slot(&mut self, name: &str, data_type: DataType) -> PipelineResult<()> {
        self.boundary_mut(self.boundaries.input)?
            .add_optional_slot(name, data_type)?;
        self.regenerate_slots()
    }

    pub fn remove_input_slot(&mut self, name: &str) -> PipelineResult<bool> {
        let removed = self.boundary_mut(self.boundaries.input)?.remove_slot(name)?;
        self.wrapped.prune_dangling_edges();
        self.regenerate_slots()?;
        Ok(removed)
    }

    pub fn add_output_slot(&mut self, name: &str, data_type: DataType) -> PipelineResult<()> {
        self.boundary_mut(self.boundaries.output)?
            .add_slot(name, data_type)?;
        self.regenerate_slots()
    }

    pub fn remove_output_slot(&mut self, name: &str) -> PipelineResult<bool> {
        let removed = self.boundary_mut(self.boundaries.output)?.remove_slot(name)?;
        self.wrapped.prune_dangling_edges();
        self.regenerate_slots()?;
        Ok(removed)
    }

    fn boundary_mut(&mut self, id: NodeId) -> PipelineResult<&mut BoundaryNode> {
        self.wrapped
            .node_mut(id)
            .and_then(AnyNode::as_boundary_mut)
            .ok_or(PipelineError::UnknownNode(id))
    }

    // ==================== Slot Synchronisation ====================

    /// Rebuild this node's slots from the boundary nodes. Does nothing while
    /// updates are suspended.
    pub fn regenerate_slots(&mut self) -> PipelineResult<()> {
        if self.prevent_update_slots {
            return Ok(());
        }
        sync::regenerate(&mut self.slots, &self.wrapped, self.boundaries)
    }

    /// Run `edit` with regeneration suspended, then regenerate once.
    pub fn with_slot_updates_suspended<R>(
        &mut self,
        edit: impl FnOnce(&mut Self) -> PipelineResult<R>,
    ) -> PipelineResult<R> {
        let previous = std::mem::replace(&mut self.prevent_update_slots, true);
        let result = edit(self);
        self.prevent_update_slots = previous;
        self.regenerate_slots()?;
        result
    }

    pub fn slot_updates_suspended(&self) -> bool {
        self.prevent_update_slots
    }

    // ==================== Execution ====================

    pub fn run(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        for slot in self.slots.outputs_mut() {
            slot.clear();
        }
        self.last_summary = None;

        let progress = ctx.progress.clone();
        let generated = StepGenerator::new(&self.settings.step_generator).generate(
            self.slots.inputs(),
            self.settings.iteration_mode,
            &progress,
        )?;

        let recovery = FailureRecovery::resolve(&self.settings, &*ctx.run.partitions, &ctx.run.config);
        let nested_config = ctx
            .run
            .config
            .nested(recovery.continue_on_failure(), recovery.export_failed_inputs());
        let pool = self
            .worker_pool
            .clone()
            .or_else(|| ctx.run.worker_pool.clone());
        let nested = ctx.run.nested(nested_config, pool);

        let mut summary = RunSummary {
            total_steps: generated.steps.len(),
            skipped_incomplete: generated.skipped_incomplete,
            pass_through: generated
                .steps
                .first()
                .is_some_and(IterationStep::is_pass_through),
            ..Default::default()
        };
        if !summary.pass_through {
            progress.log(format_args!(
                "Running {} iteration steps (matched on {:?})",
                generated.steps.len(),
                generated.reference_columns
            ));
        }

        let result = NestedRunOrchestrator::new(
            &mut self.wrapped,
            &mut self.slots,
            self.boundaries,
            self.settings.step_isolation,
            nested,
            progress.clone(),
        )
        .execute(&generated.steps, &recovery, &mut summary);

        if summary.has_failures() {
            progress.warn(format_args!(
                "{} of {} iteration steps failed",
                summary.failed.len(),
                summary.total_steps
            ));
        }
        self.last_summary = Some(summary);
        result
    }
}
