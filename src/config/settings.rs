//! Engine settings
//!
//! Host-level settings that do not belong to a single project: worker pool
//! size and logging. Stored as TOML in the app data directory.
//!
//! ```toml
//! worker_threads = 8
//! log_filter = "info,subflow_rs=debug"
//! log_to_file = true
//! ```

use crate::config::{app_data_dir, ensure_app_data_dir, SETTINGS_FILE};
use crate::error::{Result, SubflowError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,subflow_rs=debug";

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Host settings for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Size of the shared worker pool handed to nodes
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Also write logs to a daily rolling file
    #[serde(default)]
    pub log_to_file: bool,

    /// Log directory (defaults to `<app data>/logs`)
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            log_filter: default_log_filter(),
            log_to_file: false,
            log_directory: None,
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SubflowError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SubflowError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })
    }

    /// Load settings from the app data directory, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = app_data_dir().map(|d| d.join(SETTINGS_FILE)) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubflowError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            SubflowError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }

    /// Resolved log directory, creating the app data directory if needed
    pub fn resolved_log_directory(&self) -> Result<PathBuf> {
        match &self.log_directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(ensure_app_data_dir()?.join("logs")),
        }
    }
}
