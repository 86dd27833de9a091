//! Script node: evaluates a Rhai expression for every input row.
//!
//! ## Script Interface
//!
//! The script receives:
//! - `item` - The row's data item
//! - `annotations` - Map of the row's text annotations
//!
//! Its value becomes the output row's item. Annotations and data
//! annotations are carried over; provenance gets a derived child context.
//! A script error (including `throw`) fails the node.
//!
//! ## Example Scripts
//!
//! Scale a numeric item:
//! ```rhai
//! item * 2.0
//! ```
//!
//! Reject rows from a broken acquisition:
//! ```rhai
//! if annotations["#Dataset"] == "broken" { throw "corrupt dataset" }
//! item
//! ```

use crate::pipeline::data::{DataItem, DataRow};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::NodeContext;
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::slot::{DataType, SlotDescriptor, SlotSet};
use crate::scripting::ExpressionEngine;
use rhai::AST;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SCRIPT_INPUT: &str = "Input";
pub const SCRIPT_OUTPUT: &str = "Output";

/// A pipeline node that maps every input row through a Rhai expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ScriptNodeDefinition", into = "ScriptNodeDefinition")]
pub struct ScriptNode {
    /// Human-readable name for this node instance.
    name: String,
    /// The user's Rhai script source code.
    script: String,
    slots: SlotSet,
    /// Compiled AST (cached after first use).
    compiled: Option<Arc<AST>>,
    /// Borrowed pool, attached only while a run is in progress.
    pool: Option<WorkerPool>,
}

#[derive(Serialize, Deserialize)]
struct ScriptNodeDefinition {
    name: String,
    script: String,
    #[serde(default)]
    input_type: DataType,
    #[serde(default)]
    output_type: DataType,
}

impl From<ScriptNodeDefinition> for ScriptNode {
    fn from(def: ScriptNodeDefinition) -> Self {
        ScriptNode::new(def.name, def.script).with_types(def.input_type, def.output_type)
    }
}

impl From<ScriptNode> for ScriptNodeDefinition {
    fn from(node: ScriptNode) -> Self {
        let input_type = node
            .slots
            .input(SCRIPT_INPUT)
            .map(|s| s.data_type().clone())
            .unwrap_or_default();
        let output_type = node
            .slots
            .output(SCRIPT_OUTPUT)
            .map(|s| s.data_type().clone())
            .unwrap_or_default();
        Self {
            name: node.name,
            script: node.script,
            input_type,
            output_type,
        }
    }
}

fn script_slots(input_type: DataType, output_type: DataType) -> SlotSet {
    let mut slots = SlotSet::new();
    slots.rebuild(
        vec![SlotDescriptor::input(SCRIPT_INPUT, input_type)],
        vec![SlotDescriptor::output(SCRIPT_OUTPUT, output_type)],
    )
    .ok();
    slots
}

impl ScriptNode {
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            slots: script_slots(DataType::any(), DataType::any()),
            compiled: None,
            pool: None,
        }
    }

    /// Set the data types of the `Input` and `Output` slots.
    pub fn with_types(mut self, input_type: DataType, output_type: DataType) -> Self {
        self.slots = script_slots(input_type, output_type);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Replace the script; it is recompiled on next run.
    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = script.into();
        self.compiled = None;
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    pub fn set_worker_pool(&mut self, pool: Option<WorkerPool>) {
        self.pool = pool;
    }

    pub fn has_worker_pool(&self) -> bool {
        self.pool.is_some()
    }

    pub fn run(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        let engine = Arc::new(ExpressionEngine::new());
        let ast = match &self.compiled {
            Some(ast) => ast.clone(),
            None => {
                let ast = Arc::new(engine.compile(&self.script)?);
                self.compiled = Some(ast.clone());
                ast
            }
        };

        let rows: Vec<DataRow> = self
            .slots
            .input(SCRIPT_INPUT)
            .map(|s| s.rows().to_vec())
            .unwrap_or_default();

        let results: Vec<PipelineResult<serde_json::Value>> = match &self.pool {
            Some(pool) if rows.len() > 1 => {
                let inputs = rows
                    .iter()
                    .map(|r| (r.item.clone(), r.text_annotations.clone()))
                    .collect();
                let (engine, ast) = (engine.clone(), ast.clone());
                pool.map(inputs, move |(item, annotations)| {
                    engine.eval_item(&ast, item.value(), &annotations)
                })
            }
            _ => rows
                .iter()
                .map(|r| engine.eval_item(&ast, r.item.value(), &r.text_annotations))
                .collect(),
        };

        if results.len() != rows.len() {
            return Err(PipelineError::Node {
                node_id: ctx.node_id,
                message: format!(
                    "worker pool returned {} of {} results",
                    results.len(),
                    rows.len()
                ),
            });
        }

        // A failing row leaves the output untouched
        let values = results.into_iter().collect::<PipelineResult<Vec<_>>>()?;

        let output = self
            .slots
            .output_mut(SCRIPT_OUTPUT)
            .ok_or_else(|| PipelineError::UnknownSlot {
                node_id: ctx.node_id,
                slot: SCRIPT_OUTPUT.to_string(),
            })?;

        for (row, value) in rows.into_iter().zip(values) {
            output.push_row(DataRow {
                item: DataItem::new(value),
                context: row.context.derive(&self.name),
                ..row
            });
        }

        tracing::trace!("Script '{}' processed {} rows", self.name, output.len());
        Ok(())
    }
}
