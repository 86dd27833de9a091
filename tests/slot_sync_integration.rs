//! Integration tests for composite slot synchronisation

mod common;

use common::builders::CompositeBuilder;
use proptest::prelude::*;
use std::collections::BTreeSet;
use subflow_rs::composite::{
    edit_composite_in_graph, projected_slots, regenerate_in_graph, CompositeNode,
};
use subflow_rs::pipeline::{
    AnyNode, DataType, PipelineError, PipelineGraph, ScriptNode, SlotDescriptor, SlotDirection,
    SlotRef,
};

fn assert_projection(node: &CompositeNode) {
    let (inputs, outputs) =
        projected_slots(node.wrapped_graph(), node.boundaries()).expect("boundaries present");
    fn names(descriptors: &[SlotDescriptor]) -> Vec<String> {
        descriptors.iter().map(|d| d.name.clone()).collect()
    }
    assert_eq!(names(&node.slots().input_descriptors()), names(&inputs));
    assert_eq!(names(&node.slots().output_descriptors()), names(&outputs));
    for (slot, expected) in node.slots().inputs().iter().zip(&inputs) {
        assert_eq!(slot.data_type(), &expected.data_type);
        assert_eq!(slot.is_optional(), expected.optional);
    }
}

#[test]
fn test_boundary_edit_is_projected() {
    let mut node = CompositeBuilder::new("c").input("A").script("item").build();
    node.edit_wrapped_graph(|graph, handles| {
        graph
            .node_mut(handles.input)
            .and_then(AnyNode::as_boundary_mut)
            .map(|b| b.add_slot("Mask", DataType::new("mask")))
    })
    .unwrap()
    .unwrap()
    .unwrap();

    assert_projection(&node);
    let mask = node.slots().input("Mask").expect("projected input");
    assert_eq!(mask.data_type().name(), "mask");
    assert_eq!(mask.descriptor().direction, SlotDirection::Input);
}

#[test]
fn test_outer_edges_follow_slot_names() {
    let mut outer = PipelineGraph::new();
    let source = outer.insert_node(ScriptNode::new("source", "item"));
    let c = outer.insert_node(CompositeBuilder::new("c").input("A").input("B").build());
    let sink = outer.insert_node(ScriptNode::new("sink", "item"));
    outer
        .connect(SlotRef::new(source, "Output"), SlotRef::new(c, "B"))
        .unwrap();
    outer
        .connect(SlotRef::new(c, "Output"), SlotRef::new(sink, "Input"))
        .unwrap();

    // Reordering inputs keeps the edge attached to "B"
    let report = edit_composite_in_graph(&mut outer, c, |node| {
        node.remove_input_slot("A")?;
        node.add_input_slot("A", DataType::any())
    })
    .unwrap();

    assert!(report.dropped.is_empty());
    assert_eq!(report.reconnected.len(), 2);
    assert_eq!(outer.incoming(c, "B"), vec![SlotRef::new(source, "Output")]);
    let names: Vec<String> = outer
        .node(c)
        .unwrap()
        .slots()
        .input_descriptors()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn test_regenerate_in_graph_is_idempotent() {
    let mut outer = PipelineGraph::new();
    let source = outer.insert_node(ScriptNode::new("source", "item"));
    let c = outer.insert_node(CompositeBuilder::new("c").input("A").build());
    outer
        .connect(SlotRef::new(source, "Output"), SlotRef::new(c, "A"))
        .unwrap();

    let first = regenerate_in_graph(&mut outer, c).unwrap();
    let second = regenerate_in_graph(&mut outer, c).unwrap();
    assert_eq!(first, second);
    assert_eq!(outer.edges().len(), 1);
}

#[test]
fn test_regenerate_unknown_node_fails() {
    let mut outer = PipelineGraph::new();
    let script = outer.insert_node(ScriptNode::new("s", "item"));
    let err = regenerate_in_graph(&mut outer, script).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownNode(_)));
}

#[test]
fn test_direct_slot_edits_are_rejected() {
    let mut node = CompositeBuilder::new("c").input("A").build();
    let err = node
        .slots_mut()
        .remove(SlotDirection::Input, "A")
        .unwrap_err();
    assert!(matches!(err, PipelineError::SealedSlots(_)));
    assert_projection(&node);
}

proptest! {
    #[test]
    fn prop_slots_always_mirror_boundaries(
        inputs in prop::collection::btree_set("[a-z]{1,6}", 0..5),
        outputs in prop::collection::btree_set("[A-Z]{1,6}", 0..4),
        optional_mask in any::<u8>(),
    ) {
        let mut node = CompositeNode::new("c");
        for (i, name) in inputs.iter().enumerate() {
            if optional_mask & (1 << i) != 0 {
                node.add_optional_input_slot(name, DataType::new(format!("t{}", i))).unwrap();
            } else {
                node.add_input_slot(name, DataType::new(format!("t{}", i))).unwrap();
            }
        }
        for name in &outputs {
            node.add_output_slot(name, DataType::any()).unwrap();
        }
        assert_projection(&node);

        let before = node.slots().input_descriptors();
        node.regenerate_slots().unwrap();
        node.regenerate_slots().unwrap();
        prop_assert_eq!(node.slots().input_descriptors(), before);

        let projected: BTreeSet<String> = node
            .slots()
            .inputs()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        prop_assert_eq!(projected, inputs);
    }
}
