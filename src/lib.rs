//! # subflow-rs: Composite Dataflow Nodes
//!
//! A small dataflow engine whose centrepiece is the composite node: a whole
//! pipeline wrapped and exposed as a single node inside a larger pipeline.
//! The composite node runs its wrapped pipeline either once with all input
//! rows (pass-through) or once per iteration step, a group of input rows
//! matched across slots by their annotations.
//!
//! ## Architecture
//!
//! - **Pipeline**: graph, typed slots, row storage and the run loop
//! - **Composite**: slot synchronisation, step generation, nested runs and
//!   failure recovery
//! - **Scripting**: Rhai expressions for limits, matching predicates and
//!   script nodes
//! - **Config**: project files, run flags, runtime partitions and host settings
//!
//! ## Configuration
//!
//! Host settings and logs are stored in the platform-appropriate data
//! directory under `dev.hxyulin.subflow-rs`:
//!
//! - **Linux**: `~/.local/share/dev.hxyulin.subflow-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.subflow-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.subflow-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use subflow_rs::{
//!     composite::{CompositeNode, IterationMode},
//!     pipeline::{DataType, GraphRun, PipelineGraph, ProgressInfo, RunContext},
//! };
//!
//! let mut node = CompositeNode::new("Per dataset");
//! node.add_input_slot("Image", DataType::new("image"))?;
//! node.add_output_slot("Result", DataType::any())?;
//! node.settings_mut().iteration_mode = IterationMode::Iterating;
//!
//! let mut graph = PipelineGraph::new();
//! graph.insert_node(node);
//!
//! let context = RunContext::default();
//! GraphRun::new(&mut graph, &context, ProgressInfo::new("run")).run()?;
//! ```

pub mod composite;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scripting;

// Re-export commonly used types
pub use composite::{CompositeNode, CompositeSettings, IterationMode, RunSummary};
pub use config::{EngineSettings, ProjectFile, RunConfiguration};
pub use error::{Result, SubflowError};
pub use pipeline::{GraphRun, PipelineGraph, RunContext};
pub use scripting::ExpressionEngine;
