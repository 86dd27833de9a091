//! Slot descriptors and per-node slot sets.
//!
//! Each node owns a [`SlotSet`]: its ordered input and output [`DataSlot`]s.
//! The graph uses the descriptors to validate edge connections; the data
//! itself lives in the slots and is moved by the run.

use crate::pipeline::data::DataSlot;
use crate::pipeline::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the data type carried by a slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    /// Type name that is compatible with every other type.
    pub const ANY: &'static str = "any";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn any() -> Self {
        Self(Self::ANY.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        self.0 == Self::ANY
    }

    /// Whether a slot of this type may receive data of type `source`.
    pub fn accepts(&self, source: &DataType) -> bool {
        self.is_any() || source.is_any() || self == source
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a slot is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    Input,
    Output,
}

/// Descriptor for a node's slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub name: String,
    pub direction: SlotDirection,
    #[serde(default)]
    pub data_type: DataType,
    /// Optional inputs may stay empty without making an iteration step incomplete.
    #[serde(default)]
    pub optional: bool,
}

impl SlotDescriptor {
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: SlotDirection::Input,
            data_type,
            optional: false,
        }
    }

    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: SlotDirection::Output,
            data_type,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Same name, type and optionality, opposite direction.
    pub fn mirrored(&self) -> Self {
        Self {
            direction: match self.direction {
                SlotDirection::Input => SlotDirection::Output,
                SlotDirection::Output => SlotDirection::Input,
            },
            ..self.clone()
        }
    }
}

/// Ordered input and output slots of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotSet {
    inputs: Vec<DataSlot>,
    outputs: Vec<DataSlot>,
    /// Sealed sets are derived from elsewhere and only change through `rebuild`.
    #[serde(default)]
    sealed: bool,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unsealed set from descriptors, routing each by direction.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = SlotDescriptor>) -> PipelineResult<Self> {
        let mut set = Self::new();
        for descriptor in descriptors {
            set.add(descriptor)?;
        }
        Ok(set)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Add a slot. Fails on sealed sets and duplicate names.
    pub fn add(&mut self, descriptor: SlotDescriptor) -> PipelineResult<()> {
        if self.sealed {
            return Err(PipelineError::SealedSlots(format!(
                "cannot add slot '{}'",
                descriptor.name
            )));
        }
        self.push_unchecked(descriptor)
    }

    /// Remove a slot by direction and name. Returns whether it existed.
    pub fn remove(&mut self, direction: SlotDirection, name: &str) -> PipelineResult<bool> {
        if self.sealed {
            return Err(PipelineError::SealedSlots(format!(
                "cannot remove slot '{}'",
                name
            )));
        }
        let list = self.list_mut(direction);
        let before = list.len();
        list.retain(|s| s.name() != name);
        Ok(list.len() != before)
    }

    /// Clear and re-add all slots. Sealing is preserved.
    pub fn rebuild(
        &mut self,
        inputs: impl IntoIterator<Item = SlotDescriptor>,
        outputs: impl IntoIterator<Item = SlotDescriptor>,
    ) -> PipelineResult<()> {
        self.inputs.clear();
        self.outputs.clear();
        for descriptor in inputs {
            self.push_unchecked(SlotDescriptor {
                direction: SlotDirection::Input,
                ..descriptor
            })?;
        }
        for descriptor in outputs {
            self.push_unchecked(SlotDescriptor {
                direction: SlotDirection::Output,
                ..descriptor
            })?;
        }
        Ok(())
    }

    fn push_unchecked(&mut self, descriptor: SlotDescriptor) -> PipelineResult<()> {
        let direction = descriptor.direction;
        let list = self.list_mut(direction);
        if list.iter().any(|s| s.name() == descriptor.name) {
            return Err(PipelineError::SlotMismatch(format!(
                "duplicate {:?} slot '{}'",
                direction, descriptor.name
            )));
        }
        list.push(DataSlot::new(descriptor));
        Ok(())
    }

    fn list_mut(&mut self, direction: SlotDirection) -> &mut Vec<DataSlot> {
        match direction {
            SlotDirection::Input => &mut self.inputs,
            SlotDirection::Output => &mut self.outputs,
        }
    }

    pub fn inputs(&self) -> &[DataSlot] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[DataSlot] {
        &self.outputs
    }

    pub fn inputs_mut(&mut self) -> &mut [DataSlot] {
        &mut self.inputs
    }

    pub fn outputs_mut(&mut self) -> &mut [DataSlot] {
        &mut self.outputs
    }

    /// Borrow inputs and outputs at the same time.
    pub fn split_mut(&mut self) -> (&mut [DataSlot], &mut [DataSlot]) {
        (&mut self.inputs, &mut self.outputs)
    }

    pub fn input(&self, name: &str) -> Option<&DataSlot> {
        self.inputs.iter().find(|s| s.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&DataSlot> {
        self.outputs.iter().find(|s| s.name() == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut DataSlot> {
        self.inputs.iter_mut().find(|s| s.name() == name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut DataSlot> {
        self.outputs.iter_mut().find(|s| s.name() == name)
    }

    pub fn slot(&self, direction: SlotDirection, name: &str) -> Option<&DataSlot> {
        match direction {
            SlotDirection::Input => self.input(name),
            SlotDirection::Output => self.output(name),
        }
    }

    pub fn input_descriptors(&self) -> Vec<SlotDescriptor> {
        self.inputs.iter().map(|s| s.descriptor().clone()).collect()
    }

    pub fn output_descriptors(&self) -> Vec<SlotDescriptor> {
        self.outputs.iter().map(|s| s.descriptor().clone()).collect()
    }

    /// Drop all rows and orchestration flags.
    pub fn clear_data(&mut self) {
        for slot in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            slot.clear();
            slot.reset_flags();
        }
    }

    /// Total rows held across every slot.
    pub fn row_count(&self) -> usize {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|s| s.len())
            .sum()
    }
}
