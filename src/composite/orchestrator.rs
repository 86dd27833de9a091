//! Nested runs of the wrapped graph.
//!
//! Steps run strictly one after another. For every step the orchestrator
//! injects the step's rows into the group input, runs the wrapped graph,
//! appends the group output's rows to the composite node's outputs, and
//! drains the wrapped graph before the next step starts.

use crate::composite::iteration::IterationStep;
use crate::composite::recovery::{
    export_failed_step, FailedStep, FailureDecision, FailureRecovery, RunSummary,
};
use crate::composite::settings::StepIsolation;
use crate::composite::BoundaryHandles;
use crate::pipeline::{
    AnyNode, BoundaryNode, DataAnnotationMergeMode, EtaEstimator, GraphRun, NodeId,
    PipelineError, PipelineGraph, PipelineResult, ProgressInfo, RunContext, SlotSet,
    TextAnnotationMergeMode,
};

/// Runs the wrapped graph of one composite node for a list of steps.
pub struct NestedRunOrchestrator<'a> {
    wrapped: &'a mut PipelineGraph,
    /// The composite node's own slots: inputs are read, outputs are filled.
    slots: &'a mut SlotSet,
    boundaries: BoundaryHandles,
    isolation: StepIsolation,
    context: RunContext,
    progress: ProgressInfo,
}

impl<'a> NestedRunOrchestrator<'a> {
    pub fn new(
        wrapped: &'a mut PipelineGraph,
        slots: &'a mut SlotSet,
        boundaries: BoundaryHandles,
        isolation: StepIsolation,
        context: RunContext,
        progress: ProgressInfo,
    ) -> Self {
        Self {
            wrapped,
            slots,
            boundaries,
            isolation,
            context,
            progress,
        }
    }

    /// Run every step, routing failures through `recovery`.
    ///
    /// The wrapped graph is fully reset afterwards, whatever the outcome.
    pub fn execute(
        mut self,
        steps: &[IterationStep],
        recovery: &FailureRecovery,
        summary: &mut RunSummary,
    ) -> PipelineResult<()> {
        let result = self.run_steps(steps, recovery, summary);
        self.wrapped.clear_slot_data(&[]);
        result
    }

    fn run_steps(
        &mut self,
        steps: &[IterationStep],
        recovery: &FailureRecovery,
        summary: &mut RunSummary,
    ) -> PipelineResult<()> {
        let total = steps.len();
        let eta = EtaEstimator::start();

        for (index, step) in steps.iter().enumerate() {
            self.context.check_cancelled()?;
            if !step.is_pass_through() {
                self.progress.log_progress(
                    index,
                    total,
                    format_args!("Iteration step {:?}", step.reference_annotations()),
                );
            }

            match self.run_step(index, step) {
                Ok(()) => summary.succeeded += 1,
                Err(error) => match recovery.decide(&error, self.context.is_cancelled()) {
                    FailureDecision::Absorb => {
                        recovery.report(&self.progress, index, total, &error);
                        if recovery.export_failed_inputs() {
                            self.export_inputs(index, step, &error);
                        }
                        summary.failed.push(FailedStep {
                            index,
                            message: error.to_string(),
                        });
                    }
                    FailureDecision::Propagate if error.is_cancellation() => return Err(error),
                    FailureDecision::Propagate => {
                        return Err(PipelineError::StepFailed {
                            index,
                            source: Box::new(error),
                        })
                    }
                },
            }

            if let Some(remaining) = eta.update(index + 1, total).filter(|_| total > 1) {
                self.progress.debug(format_args!(
                    "Step {}/{} done, about {:.1}s remaining",
                    index + 1,
                    total,
                    remaining.as_secs_f64()
                ));
            }
        }
        Ok(())
    }

    /// Run one step. Cleanup happens whether or not the nested run succeeded.
    pub fn run_step(&mut self, index: usize, step: &IterationStep) -> PipelineResult<()> {
        let step_progress = if step.is_pass_through() {
            self.progress.clone()
        } else {
            self.progress.resolve(&format!("step {}", index))
        };

        match self.isolation {
            StepIsolation::CopyGraph => {
                let mut instance = self.wrapped.clone();
                run_isolated(
                    &mut instance,
                    self.slots,
                    self.boundaries,
                    step,
                    &self.context,
                    step_progress,
                )
            }
            StepIsolation::ClearSlots => {
                let result = run_isolated(
                    self.wrapped,
                    self.slots,
                    self.boundaries,
                    step,
                    &self.context,
                    step_progress,
                );
                drain(self.wrapped, self.boundaries, step.is_pass_through());
                result
            }
        }
    }

    fn export_inputs(&self, index: usize, step: &IterationStep, error: &PipelineError) {
        let Some(output_path) = self.context.config.output_path.as_deref() else {
            self.progress
                .warn("Cannot export failed inputs: the run has no output path");
            return;
        };
        match export_failed_step(output_path, index, step, self.slots.inputs(), error) {
            Ok(dir) => self
                .progress
                .log(format_args!("Exported failed inputs to {}", dir.display())),
            Err(e) => self
                .progress
                .warn(format_args!("Failed to export inputs of step {}: {}", index, e)),
        }
    }
}

/// Inject, run and harvest one step on `graph`.
fn run_isolated(
    graph: &mut PipelineGraph,
    slots: &mut SlotSet,
    boundaries: BoundaryHandles,
    step: &IterationStep,
    context: &RunContext,
    progress: ProgressInfo,
) -> PipelineResult<()> {
    inject(graph, slots, boundaries.input, step)?;

    let output = boundary_mut(graph, boundaries.output)?;
    for slot in output.slots_mut().outputs_mut() {
        slot.set_skip_gc(true);
    }

    GraphRun::new(graph, context, progress).run()?;

    let output = graph
        .node(boundaries.output)
        .and_then(AnyNode::as_boundary)
        .ok_or(PipelineError::UnknownNode(boundaries.output))?;
    for target in slots.outputs_mut() {
        if let Some(source) = output.slots().output(target.name()) {
            target.add_data_from_slot(source);
        }
    }
    Ok(())
}

/// Replace the group input's rows with the rows selected by `step`.
fn inject(
    graph: &mut PipelineGraph,
    slots: &SlotSet,
    input: NodeId,
    step: &IterationStep,
) -> PipelineResult<()> {
    let boundary = boundary_mut(graph, input)?;
    for slot in boundary.slots_mut().inputs_mut() {
        slot.clear();
        slot.set_skip_data_gathering(true);
    }

    for source in slots.inputs() {
        let target = boundary
            .slots_mut()
            .input_mut(source.name())
            .ok_or_else(|| PipelineError::UnknownSlot {
                node_id: input,
                slot: source.name().to_string(),
            })?;

        if step.is_pass_through() {
            target.add_data_from_slot(source);
            continue;
        }
        for &r in step.rows(source.name()) {
            let row = source.row(r).ok_or_else(|| {
                PipelineError::SlotMismatch(format!(
                    "step selects row {} of '{}' which has {} rows",
                    r,
                    source.name(),
                    source.len()
                ))
            })?;
            target.add_data(
                row.item.clone(),
                &row.text_annotations,
                TextAnnotationMergeMode::OverwriteExisting,
                &row.data_annotations,
                DataAnnotationMergeMode::OverwriteExisting,
                row.context.clone(),
            );
        }
    }
    Ok(())
}

/// Drop all rows of the wrapped graph. Between steps the boundary nodes
/// keep their orchestration flags; after a pass-through run they are reset.
fn drain(graph: &mut PipelineGraph, boundaries: BoundaryHandles, pass_through: bool) {
    if pass_through {
        graph.clear_slot_data(&[]);
        return;
    }
    graph.clear_slot_data(&[boundaries.input, boundaries.output]);
    for id in [boundaries.input, boundaries.output] {
        if let Some(boundary) = graph.node_mut(id).and_then(AnyNode::as_boundary_mut) {
            let (inputs, outputs) = boundary.slots_mut().split_mut();
            for slot in inputs.iter_mut().chain(outputs.iter_mut()) {
                slot.clear();
            }
        }
    }
}

fn boundary_mut(graph: &mut PipelineGraph, id: NodeId) -> PipelineResult<&mut BoundaryNode> {
    graph
        .node_mut(id)
        .and_then(AnyNode::as_boundary_mut)
        .ok_or(PipelineError::UnknownNode(id))
}
