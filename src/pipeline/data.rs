//! Row-oriented slot storage.
//!
//! A `DataSlot` is an ordered list of rows. Each row references a data item
//! (shared, never deep-copied when rows move between slots), carries its
//! text and data annotations, and a provenance context handle.

use crate::pipeline::annotation::{
    DataAnnotationMergeMode, DataAnnotations, TextAnnotationMergeMode, TextAnnotations,
};
use crate::pipeline::slot::{DataType, SlotDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Shared reference to an immutable data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataItem(Arc<serde_json::Value>);

impl DataItem {
    pub fn new(value: serde_json::Value) -> Self {
        Self(Arc::new(value))
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// True if both handles point at the same stored value.
    pub fn ptr_eq(&self, other: &DataItem) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<serde_json::Value> for DataItem {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

/// Provenance handle of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataContext {
    pub id: u64,
    pub source: Option<String>,
    pub parent: Option<u64>,
}

impl DataContext {
    /// Fresh root context.
    pub fn new(source: Option<&str>) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            source: source.map(str::to_string),
            parent: None,
        }
    }

    /// Child context for data derived from this one.
    pub fn derive(&self, source: &str) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            source: Some(source.to_string()),
            parent: Some(self.id),
        }
    }
}

/// One row of a data slot.
#[derive(Debug, Clone)]
pub struct DataRow {
    pub item: DataItem,
    pub text_annotations: TextAnnotations,
    pub data_annotations: DataAnnotations,
    pub context: DataContext,
}

impl DataRow {
    pub fn new(item: DataItem, context: DataContext) -> Self {
        Self {
            item,
            text_annotations: TextAnnotations::new(),
            data_annotations: DataAnnotations::new(),
            context,
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.text_annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.text_annotations.get(key).map(String::as_str)
    }
}

/// Ordered rows plus the flags the orchestration layer uses to steer a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SlotDescriptor", into = "SlotDescriptor")]
pub struct DataSlot {
    descriptor: SlotDescriptor,
    rows: Vec<DataRow>,
    /// Input gathering leaves this slot alone (data was injected directly).
    skip_data_gathering: bool,
    /// Intermediate garbage collection leaves this slot alone.
    skip_gc: bool,
}

impl DataSlot {
    pub fn new(descriptor: SlotDescriptor) -> Self {
        Self {
            descriptor,
            rows: Vec::new(),
            skip_data_gathering: false,
            skip_gc: false,
        }
    }

    pub fn descriptor(&self) -> &SlotDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.descriptor.data_type
    }

    pub fn is_optional(&self) -> bool {
        self.descriptor.optional
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn push_row(&mut self, row: DataRow) {
        self.rows.push(row);
    }

    /// Append a row, merging the given annotation sets with the requested modes.
    pub fn add_data(
        &mut self,
        item: DataItem,
        text_annotations: &TextAnnotations,
        text_mode: TextAnnotationMergeMode,
        data_annotations: &DataAnnotations,
        data_mode: DataAnnotationMergeMode,
        context: DataContext,
    ) {
        let mut row = DataRow::new(item, context);
        text_mode.merge_into(&mut row.text_annotations, text_annotations);
        data_mode.merge_into(&mut row.data_annotations, data_annotations);
        self.rows.push(row);
    }

    /// Append every row of `other`, keeping items, annotations and provenance.
    pub fn add_data_from_slot(&mut self, other: &DataSlot) {
        self.rows.reserve(other.rows.len());
        for row in &other.rows {
            self.add_data(
                row.item.clone(),
                &row.text_annotations,
                TextAnnotationMergeMode::OverwriteExisting,
                &row.data_annotations,
                DataAnnotationMergeMode::OverwriteExisting,
                row.context.clone(),
            );
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn skip_data_gathering(&self) -> bool {
        self.skip_data_gathering
    }

    pub fn set_skip_data_gathering(&mut self, skip: bool) {
        self.skip_data_gathering = skip;
    }

    pub fn skip_gc(&self) -> bool {
        self.skip_gc
    }

    pub fn set_skip_gc(&mut self, skip: bool) {
        self.skip_gc = skip;
    }

    pub fn reset_flags(&mut self) {
        self.skip_data_gathering = false;
        self.skip_gc = false;
    }

    /// Every text annotation key used by at least one row.
    pub fn text_annotation_columns(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|r| r.text_annotations.keys().cloned())
            .collect()
    }
}

impl From<SlotDescriptor> for DataSlot {
    fn from(descriptor: SlotDescriptor) -> Self {
        Self::new(descriptor)
    }
}

impl From<DataSlot> for SlotDescriptor {
    fn from(slot: DataSlot) -> Self {
        slot.descriptor
    }
}
