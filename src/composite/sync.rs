//! Slot synchronisation between a composite node and its boundary nodes.
//!
//! The composite node's slots are a projection of the boundary nodes:
//! its inputs mirror the group input's outputs and its outputs mirror the
//! group output's inputs. Regeneration always clears and re-adds the whole
//! set, so the projection holds after every call.

use crate::composite::{BoundaryHandles, CompositeNode};
use crate::pipeline::{
    AnyNode, NodeId, PipelineError, PipelineGraph, PipelineResult, SlotDescriptor, SlotRef,
    SlotSet,
};

/// Outer edges touched by a regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Edges restored onto the slot of the same name
    pub reconnected: Vec<(SlotRef, SlotRef)>,
    /// Edges whose slot vanished or changed to an incompatible type
    pub dropped: Vec<(SlotRef, SlotRef)>,
}

/// Descriptors the composite node must expose for the given boundaries.
pub fn projected_slots(
    graph: &PipelineGraph,
    boundaries: BoundaryHandles,
) -> PipelineResult<(Vec<SlotDescriptor>, Vec<SlotDescriptor>)> {
    let input = graph
        .node(boundaries.input)
        .and_then(AnyNode::as_boundary)
        .ok_or(PipelineError::UnknownNode(boundaries.input))?;
    let output = graph
        .node(boundaries.output)
        .and_then(AnyNode::as_boundary)
        .ok_or(PipelineError::UnknownNode(boundaries.output))?;
    Ok((
        input.slots().output_descriptors(),
        output.slots().input_descriptors(),
    ))
}

/// Seal `slots` and rebuild them from the boundary nodes.
pub(crate) fn regenerate(
    slots: &mut SlotSet,
    graph: &PipelineGraph,
    boundaries: BoundaryHandles,
) -> PipelineResult<()> {
    let (inputs, outputs) = projected_slots(graph, boundaries)?;
    slots.seal();
    slots.rebuild(inputs, outputs)
}

/// Regenerate the composite node `node` of an outer graph and reconnect its
/// edges by slot name. Edges that no longer fit are logged and dropped.
pub fn regenerate_in_graph(graph: &mut PipelineGraph, node: NodeId) -> PipelineResult<SyncReport> {
    edit_composite_in_graph(graph, node, |_| Ok(()))
}

/// Edit the composite node `node` of an outer graph, then regenerate its
/// slots and restore its outer edges.
pub fn edit_composite_in_graph<F>(
    graph: &mut PipelineGraph,
    node: NodeId,
    edit: F,
) -> PipelineResult<SyncReport>
where
    F: FnOnce(&mut CompositeNode) -> PipelineResult<()>,
{
    let composite = graph
        .node_mut(node)
        .and_then(AnyNode::as_composite_mut)
        .ok_or(PipelineError::UnknownNode(node))?;
    composite.with_slot_updates_suspended(edit)?;

    let mut report = SyncReport::default();
    for edge in graph.disconnect_all(node) {
        let pair = (edge.from.clone(), edge.to.clone());
        match graph.connect(edge.from, edge.to) {
            Ok(_) => report.reconnected.push(pair),
            Err(e) => {
                tracing::warn!("Dropping edge {} -> {}: {}", pair.0, pair.1, e);
                report.dropped.push(pair);
            }
        }
    }

    tracing::debug!(
        "Resynchronised composite {:?}: {} edges restored, {} dropped",
        node,
        report.reconnected.len(),
        report.dropped.len()
    );
    Ok(report)
}
