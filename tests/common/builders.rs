//! Test data builders for creating test objects

use serde_json::Value;
use subflow_rs::composite::{
    ColumnMatching, CompositeNode, CompositeSettings, FailurePolicy, IterationMode, StepIsolation,
};
use subflow_rs::pipeline::{
    AnyNode, DataSlot, DataType, PipelineResult, ScriptNode, SlotDescriptor, SlotRef,
};

use super::row;

/// Builder for input slots with annotated rows
pub struct SlotBuilder {
    descriptor: SlotDescriptor,
    rows: Vec<(Value, Vec<(String, String)>)>,
}

impl SlotBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: SlotDescriptor::input(name, DataType::any()),
            rows: Vec::new(),
        }
    }

    pub fn data_type(mut self, data_type: &str) -> Self {
        self.descriptor.data_type = DataType::new(data_type);
        self
    }

    pub fn optional(mut self) -> Self {
        self.descriptor = self.descriptor.optional();
        self
    }

    pub fn row(mut self, value: Value, annotations: &[(&str, &str)]) -> Self {
        let annotations = annotations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.rows.push((value, annotations));
        self
    }

    /// One row per value, each annotated `key = value`
    pub fn keyed_rows(self, key: &str, values: &[&str]) -> Self {
        values.iter().fold(self, |builder, value| {
            builder.row(Value::from(*value), &[(key, *value)])
        })
    }

    pub fn build(self) -> DataSlot {
        let mut slot = DataSlot::new(self.descriptor);
        for (value, annotations) in self.rows {
            let pairs: Vec<(&str, &str)> = annotations
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            slot.push_row(row(value, &pairs));
        }
        slot
    }
}

/// Builder for composite nodes whose wrapped graph routes every input
/// through one body node into every output.
pub struct CompositeBuilder {
    name: String,
    inputs: Vec<(String, bool)>,
    outputs: Vec<String>,
    body: Option<AnyNode>,
    settings: CompositeSettings,
}

impl CompositeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            body: None,
            settings: CompositeSettings::default(),
        }
    }

    pub fn input(mut self, name: &str) -> Self {
        self.inputs.push((name.to_string(), false));
        self
    }

    pub fn optional_input(mut self, name: &str) -> Self {
        self.inputs.push((name.to_string(), true));
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.outputs.push(name.to_string());
        self
    }

    /// Route data through a script node
    pub fn script(self, source: &str) -> Self {
        self.body(ScriptNode::new("Body", source))
    }

    /// Route data through any node with `Input` and `Output` slots
    pub fn body(mut self, node: impl Into<AnyNode>) -> Self {
        self.body = Some(node.into());
        self
    }

    pub fn mode(mut self, mode: IterationMode) -> Self {
        self.settings.iteration_mode = mode;
        self
    }

    pub fn matching(mut self, matching: ColumnMatching) -> Self {
        self.settings.step_generator.column_matching = matching;
        self
    }

    pub fn limit(mut self, limit: &str) -> Self {
        self.settings.step_generator.limit = Some(limit.to_string());
        self
    }

    pub fn skip_incomplete(mut self) -> Self {
        self.settings.step_generator.skip_incomplete = true;
        self
    }

    pub fn continue_on_failure(mut self, policy: FailurePolicy) -> Self {
        self.settings.continue_on_failure = policy;
        self
    }

    pub fn export_failed_inputs(mut self, policy: FailurePolicy) -> Self {
        self.settings.export_failed_inputs = policy;
        self
    }

    pub fn isolation(mut self, isolation: StepIsolation) -> Self {
        self.settings.step_isolation = isolation;
        self
    }

    pub fn partition(mut self, index: usize) -> Self {
        self.settings.runtime_partition = index;
        self
    }

    pub fn build(self) -> CompositeNode {
        let outputs = if self.outputs.is_empty() {
            vec!["Output".to_string()]
        } else {
            self.outputs
        };

        let mut node = CompositeNode::new(self.name).with_settings(self.settings);
        node.with_slot_updates_suspended(|n| {
            for (name, optional) in &self.inputs {
                if *optional {
                    n.add_optional_input_slot(name, DataType::any())?;
                } else {
                    n.add_input_slot(name, DataType::any())?;
                }
            }
            for name in &outputs {
                n.add_output_slot(name, DataType::any())?;
            }
            Ok(())
        })
        .expect("composite slots");

        let inputs = self.inputs;
        let body = self.body;
        node.edit_wrapped_graph(|graph, handles| -> PipelineResult<()> {
            let (sources, sinks): (Vec<SlotRef>, Vec<SlotRef>) = match body {
                Some(body) => {
                    let id = graph.insert_node(body);
                    (
                        vec![SlotRef::new(id, "Output")],
                        vec![SlotRef::new(id, "Input")],
                    )
                }
                None => (Vec::new(), Vec::new()),
            };
            let group_inputs = inputs.iter().map(|(name, _)| SlotRef::new(handles.input, name));
            let group_outputs = outputs.iter().map(|name| SlotRef::new(handles.output, name));

            if sinks.is_empty() {
                for from in group_inputs {
                    for to in group_outputs.clone() {
                        graph.connect(from.clone(), to)?;
                    }
                }
            } else {
                for from in group_inputs {
                    graph.connect(from, sinks[0].clone())?;
                }
                for to in group_outputs {
                    graph.connect(sources[0].clone(), to)?;
                }
            }
            Ok(())
        })
        .and_then(|wired| wired)
        .expect("wrapped graph wiring");
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slot_builder() {
        let slot = SlotBuilder::new("Image")
            .data_type("image")
            .row(json!(1), &[("#Dataset", "a")])
            .keyed_rows("#Dataset", &["b", "c"])
            .build();

        assert_eq!(slot.name(), "Image");
        assert_eq!(slot.data_type().name(), "image");
        assert_eq!(slot.len(), 3);
        assert_eq!(slot.rows()[2].annotation("#Dataset"), Some("c"));
    }

    #[test]
    fn test_composite_builder() {
        let node = CompositeBuilder::new("c")
            .input("A")
            .optional_input("B")
            .script("item")
            .mode(IterationMode::Iterating)
            .build();

        assert_eq!(node.slots().inputs().len(), 2);
        assert!(node.slots().input("B").unwrap().is_optional());
        assert_eq!(node.slots().outputs()[0].name(), "Output");
        // Two boundaries plus the body, three edges
        assert_eq!(node.wrapped_graph().node_count(), 3);
        assert_eq!(node.wrapped_graph().edges().len(), 3);
        assert_eq!(node.settings().iteration_mode, IterationMode::Iterating);
    }
}
