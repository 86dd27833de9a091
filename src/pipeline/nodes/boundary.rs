//! Group input/output boundary nodes.
//!
//! A boundary node marks the interface of a wrapped sub-pipeline. Every
//! slot exists twice, as an input and an output with the same name and
//! type; running the node copies each input row to its twin output.
//!
//! The group input's slots define the composite node's inputs, the group
//! output's slots define its outputs.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::NodeContext;
use crate::pipeline::slot::{DataType, SlotDescriptor, SlotDirection, SlotSet};
use serde::{Deserialize, Serialize};

/// Which side of the wrapped graph a boundary node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryRole {
    Input,
    Output,
}

/// Pass-through node mirroring each input slot to an output of the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryNode {
    name: String,
    role: BoundaryRole,
    slots: SlotSet,
}

impl BoundaryNode {
    pub fn input() -> Self {
        Self {
            name: "Group input".to_string(),
            role: BoundaryRole::Input,
            slots: SlotSet::new(),
        }
    }

    pub fn output() -> Self {
        Self {
            name: "Group output".to_string(),
            role: BoundaryRole::Output,
            slots: SlotSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> BoundaryRole {
        self.role
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    /// Add a mirrored slot pair.
    pub fn add_slot(&mut self, name: &str, data_type: DataType) -> PipelineResult<()> {
        self.add_descriptor(SlotDescriptor::input(name, data_type))
    }

    /// Add a mirrored slot pair whose input side is optional.
    pub fn add_optional_slot(&mut self, name: &str, data_type: DataType) -> PipelineResult<()> {
        self.add_descriptor(SlotDescriptor::input(name, data_type).optional())
    }

    fn add_descriptor(&mut self, descriptor: SlotDescriptor) -> PipelineResult<()> {
        if self.slots.input(&descriptor.name).is_some() {
            return Err(PipelineError::SlotMismatch(format!(
                "{} already has a slot '{}'",
                self.name, descriptor.name
            )));
        }
        let output = descriptor.mirrored();
        self.slots.add(descriptor)?;
        self.slots.add(output)
    }

    /// Remove a slot pair. Returns whether it existed.
    pub fn remove_slot(&mut self, name: &str) -> PipelineResult<bool> {
        let had_input = self.slots.remove(SlotDirection::Input, name)?;
        let had_output = self.slots.remove(SlotDirection::Output, name)?;
        Ok(had_input || had_output)
    }

    /// The interface this node exposes, in slot order.
    pub fn slot_descriptors(&self) -> Vec<SlotDescriptor> {
        self.slots.input_descriptors()
    }

    pub fn run(&mut self, _ctx: &mut NodeContext) -> PipelineResult<()> {
        let (inputs, outputs) = self.slots.split_mut();
        for input in inputs.iter() {
            if let Some(output) = outputs.iter_mut().find(|o| o.name() == input.name()) {
                output.add_data_from_slot(input);
            }
        }
        Ok(())
    }
}
