//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use serde_json::Value;
use subflow_rs::composite::CompositeNode;
use subflow_rs::pipeline::{
    DataContext, DataItem, DataRow, DataSlot, GraphRun, NodeId, PipelineGraph, PipelineResult,
    ProgressInfo, RunContext, RunReport,
};

/// Create a row with the given text annotations
pub fn row(value: Value, annotations: &[(&str, &str)]) -> DataRow {
    annotations.iter().fold(
        DataRow::new(DataItem::new(value), DataContext::new(Some("test"))),
        |row, (key, value)| row.with_annotation(*key, *value),
    )
}

/// Replace the rows of an input slot and stop the run from gathering into it
pub fn seed_input(graph: &mut PipelineGraph, node: NodeId, slot: &str, rows: Vec<DataRow>) {
    let slot = graph
        .node_mut(node)
        .and_then(|n| n.slots_mut().input_mut(slot))
        .unwrap_or_else(|| panic!("no input slot '{}' on {:?}", slot, node));
    slot.clear();
    slot.set_skip_data_gathering(true);
    for row in rows {
        slot.push_row(row);
    }
}

/// Run `graph` once with a fresh progress prefix
pub fn run_graph(graph: &mut PipelineGraph, context: &RunContext) -> PipelineResult<RunReport> {
    GraphRun::new(graph, context, ProgressInfo::new("test")).run()
}

/// Borrow the composite node `id` of `graph`
pub fn composite(graph: &PipelineGraph, id: NodeId) -> &CompositeNode {
    graph
        .node(id)
        .and_then(|n| n.as_composite())
        .unwrap_or_else(|| panic!("{:?} is not a composite node", id))
}

/// Items of every row of a slot, in order
pub fn item_values(slot: &DataSlot) -> Vec<Value> {
    slot.rows().iter().map(|r| r.item.value().clone()).collect()
}

/// Values of one annotation column, in row order
pub fn annotation_values(slot: &DataSlot, key: &str) -> Vec<String> {
    slot.rows()
        .iter()
        .filter_map(|r| r.annotation(key).map(str::to_string))
        .collect()
}

/// Rows of an output slot of the node `id`
pub fn output_slot<'g>(graph: &'g PipelineGraph, id: NodeId, slot: &str) -> &'g DataSlot {
    graph
        .node(id)
        .and_then(|n| n.slots().output(slot))
        .unwrap_or_else(|| panic!("no output slot '{}' on {:?}", slot, id))
}
