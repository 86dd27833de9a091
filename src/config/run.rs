//! Per-run configuration flags.
//!
//! A [`RunConfiguration`] is fixed for the duration of a run. Nested runs
//! started by composite nodes derive their own copy through
//! [`RunConfiguration::nested`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_gc_intermediate() -> bool {
    true
}

/// Flags that govern a single graph run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Reuse results from the cache instead of executing nodes
    #[serde(default)]
    pub load_from_cache: bool,

    /// Populate the cache with node results
    #[serde(default)]
    pub store_to_cache: bool,

    /// Write node results below `output_path`
    #[serde(default)]
    pub store_to_disk: bool,

    /// Failure continuation resolved by the composite node that started
    /// this run. `None` for a top-level run. When set, failures inside the
    /// run are handled by that parent node, so nodes that inherit their
    /// policy from a partition do not absorb them again.
    #[serde(default)]
    pub continue_on_failure: Option<bool>,

    /// Failed-input export resolved by the parent composite node, `None` for
    /// a top-level run.
    #[serde(default)]
    pub export_failed_inputs: Option<bool>,

    /// Clear intermediate slot data once every consumer has read it
    #[serde(default = "default_gc_intermediate")]
    pub gc_intermediate: bool,

    /// Root directory for disk output and failure exports
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            load_from_cache: false,
            store_to_cache: false,
            store_to_disk: false,
            continue_on_failure: None,
            export_failed_inputs: None,
            gc_intermediate: default_gc_intermediate(),
            output_path: None,
        }
    }
}

impl RunConfiguration {
    /// Whether a parent composite node handles failures of this run.
    pub fn is_nested(&self) -> bool {
        self.continue_on_failure.is_some()
    }

    /// Configuration for a nested run started from this one.
    ///
    /// Cache and disk flags are always off; the failure flags are replaced by
    /// the already-resolved settings of the node that starts the nested run.
    pub fn nested(&self, continue_on_failure: bool, export_failed_inputs: bool) -> Self {
        Self {
            load_from_cache: false,
            store_to_cache: false,
            store_to_disk: false,
            continue_on_failure: Some(continue_on_failure),
            export_failed_inputs: Some(export_failed_inputs),
            gc_intermediate: self.gc_intermediate,
            output_path: self.output_path.clone(),
        }
    }
}
