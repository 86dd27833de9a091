//! Configuration module for subflow-rs
//!
//! This module handles:
//! - Project files (`.subflow.json`): a pipeline graph plus its run
//!   configuration, runtime partitions and seed input data
//! - Per-run flags ([`RunConfiguration`])
//! - Runtime partitions ([`RuntimePartitionRegistry`])
//! - Host settings ([`EngineSettings`])
//!
//! # App Data Location
//!
//! Host settings and logs are stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.hxyulin.subflow-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.subflow-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.subflow-rs\`
//!
//! # Example
//!
//! ```ignore
//! use subflow_rs::config::ProjectFile;
//!
//! let mut project = ProjectFile::load("segmentation.subflow.json")?;
//! project.inject_inputs()?;
//! project.save("segmentation.subflow.json")?;
//! ```

pub mod partition;
pub mod run;
pub mod settings;

pub use partition::*;
pub use run::*;
pub use settings::*;

use crate::error::{Result, SubflowError};
use crate::pipeline::{
    DataContext, DataItem, DataRow, NodeId, PipelineError, PipelineGraph, TextAnnotations,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.subflow-rs";

/// Engine settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

/// Project file extension
pub const PROJECT_FILE_EXTENSION: &str = "subflow.json";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        SubflowError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            SubflowError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

// ==================== Seed Inputs ====================

/// A row given literally in a project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDefinition {
    pub item: serde_json::Value,

    #[serde(default)]
    pub annotations: TextAnnotations,
}

/// Rows injected into one input slot before the project runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub node: NodeId,
    pub slot: String,
    pub rows: Vec<RowDefinition>,
}

// ==================== Project File ====================

/// A complete, runnable project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Project name
    #[serde(default)]
    pub name: String,

    /// The pipeline to run
    #[serde(default)]
    pub graph: PipelineGraph,

    /// Flags for the top-level run
    #[serde(default)]
    pub run: RunConfiguration,

    /// Runtime partitions referenced by composite nodes
    #[serde(default)]
    pub partitions: RuntimePartitionRegistry,

    /// Seed data for source slots
    #[serde(default)]
    pub inputs: Vec<InputBinding>,
}

impl ProjectFile {
    /// Create an empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a project file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SubflowError::Config(format!("Failed to read project file {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SubflowError::Config(format!("Failed to parse project file {:?}: {}", path, e))
        })
    }

    /// Load a project file, returning an empty project if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load project, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save project file to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SubflowError::Config(format!("Failed to create project directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SubflowError::Config(format!("Failed to serialize project: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            SubflowError::Config(format!("Failed to write project file {:?}: {}", path, e))
        })
    }

    /// Copy the seed rows into their target slots, marking those slots so a
    /// run does not overwrite them with gathered data.
    pub fn inject_inputs(&mut self) -> Result<()> {
        for binding in &self.inputs {
            let node = self
                .graph
                .node_mut(binding.node)
                .ok_or(PipelineError::UnknownNode(binding.node))?;
            let slot = node.slots_mut().input_mut(&binding.slot).ok_or_else(|| {
                PipelineError::UnknownSlot {
                    node_id: binding.node,
                    slot: binding.slot.clone(),
                }
            })?;

            slot.clear();
            slot.set_skip_data_gathering(true);
            for def in &binding.rows {
                let mut row = DataRow::new(
                    DataItem::new(def.item.clone()),
                    DataContext::new(Some("project input")),
                );
                row.text_annotations = def.annotations.clone();
                slot.push_row(row);
            }
            tracing::debug!(
                "Injected {} rows into {:?}/{}",
                binding.rows.len(),
                binding.node,
                binding.slot
            );
        }
        Ok(())
    }
}
