//! Failure recovery for nested runs.
//!
//! Every failed step is routed through [`FailureRecovery::decide`]. A
//! cancellation always propagates. Otherwise the node's own tri-state
//! policy decides, and `InheritFromPartition` defers to the runtime
//! partition the node is bound to. Inside a nested run the enclosing
//! composite node owns failure handling, so inherited policies resolve to
//! "propagate".

use crate::composite::iteration::IterationStep;
use crate::composite::settings::{CompositeSettings, FailurePolicy};
use crate::config::{PartitionLookup, RunConfiguration};
use crate::pipeline::{DataSlot, PipelineError, PipelineResult, ProgressInfo};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What to do with a failed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Log the failure and go on with the next step.
    Absorb,
    /// Abort the composite node with the error.
    Propagate,
}

/// Resolve the continue-on-failure policy to a concrete flag.
///
/// Inherited continuation is refused inside a nested run, and while the run
/// populates the cache if the partition asks for it.
pub fn resolve_continue_on_failure(
    policy: FailurePolicy,
    partition: usize,
    partitions: &dyn PartitionLookup,
    config: &RunConfiguration,
) -> bool {
    match policy {
        FailurePolicy::Enabled => true,
        FailurePolicy::Disabled => false,
        FailurePolicy::InheritFromPartition if config.is_nested() => false,
        FailurePolicy::InheritFromPartition => {
            let settings = partitions.continue_on_failure_settings(partition);
            if !settings.continue_on_failure {
                return false;
            }
            !(settings.disable_on_cache_update && config.store_to_cache)
        }
    }
}

/// Resolve the export-failed-inputs policy to a concrete flag.
pub fn resolve_export_failed_inputs(
    policy: FailurePolicy,
    partition: usize,
    partitions: &dyn PartitionLookup,
    config: &RunConfiguration,
) -> bool {
    match policy {
        FailurePolicy::Enabled => true,
        FailurePolicy::Disabled => false,
        FailurePolicy::InheritFromPartition if config.is_nested() => false,
        FailurePolicy::InheritFromPartition => {
            partitions
                .continue_on_failure_settings(partition)
                .export_failed_inputs
        }
    }
}

/// Resolved failure handling of one composite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecovery {
    continue_on_failure: bool,
    export_failed_inputs: bool,
    partition_name: String,
}

impl FailureRecovery {
    pub fn resolve(
        settings: &CompositeSettings,
        partitions: &dyn PartitionLookup,
        config: &RunConfiguration,
    ) -> Self {
        let partition = settings.runtime_partition;
        Self {
            continue_on_failure: resolve_continue_on_failure(
                settings.continue_on_failure,
                partition,
                partitions,
                config,
            ),
            export_failed_inputs: resolve_export_failed_inputs(
                settings.export_failed_inputs,
                partition,
                partitions,
                config,
            ),
            partition_name: partitions.partition_name(partition),
        }
    }

    pub fn continue_on_failure(&self) -> bool {
        self.continue_on_failure
    }

    pub fn export_failed_inputs(&self) -> bool {
        self.export_failed_inputs
    }

    pub fn partition_name(&self) -> &str {
        &self.partition_name
    }

    pub fn decide(&self, error: &PipelineError, cancelled: bool) -> FailureDecision {
        if cancelled || error.is_cancellation() || !self.continue_on_failure {
            FailureDecision::Propagate
        } else {
            FailureDecision::Absorb
        }
    }

    /// Log the failure banner of an absorbed step.
    pub fn report(&self, progress: &ProgressInfo, index: usize, total: usize, error: &PipelineError) {
        progress.error("------------------------------------------------------------");
        progress.error(format_args!(
            "Iteration step {} of {} FAILED and was skipped (partition '{}')",
            index + 1,
            total,
            self.partition_name
        ));
        progress.error(format_args!("Error: {}", error));
        if !std::ptr::eq(error.root_cause(), error) {
            progress.error(format_args!("Cause: {}", error.root_cause()));
        }
        progress.error("------------------------------------------------------------");
    }
}

// ==================== Run Summary ====================

/// A step that failed and was absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub index: usize,
    pub message: String,
}

/// Outcome of one composite node run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedStep>,
    pub skipped_incomplete: usize,
    pub pass_through: bool,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

// ==================== Failed Input Export ====================

#[derive(Serialize)]
struct ExportedRow<'a> {
    row: usize,
    item: &'a serde_json::Value,
    text_annotations: &'a crate::pipeline::TextAnnotations,
    data_annotations: &'a crate::pipeline::DataAnnotations,
    context: &'a crate::pipeline::DataContext,
}

#[derive(Serialize)]
struct ExportedStep<'a> {
    index: usize,
    error: String,
    reference_annotations: &'a crate::pipeline::TextAnnotations,
    text_annotations: &'a crate::pipeline::TextAnnotations,
    incomplete: bool,
    slots: Vec<&'a str>,
}

/// Write the input rows of a failed step below `<output_path>/_error/`.
///
/// Returns the directory that was written.
pub fn export_failed_step(
    output_path: &Path,
    index: usize,
    step: &IterationStep,
    inputs: &[DataSlot],
    error: &PipelineError,
) -> PipelineResult<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let dir = output_path
        .join("_error")
        .join(format!("{}-step{}", stamp, index));
    std::fs::create_dir_all(&dir)?;

    for slot in inputs {
        let rows: Vec<ExportedRow> = step
            .rows(slot.name())
            .iter()
            .filter_map(|&r| slot.row(r).map(|row| (r, row)))
            .map(|(r, row)| ExportedRow {
                row: r,
                item: row.item.value(),
                text_annotations: &row.text_annotations,
                data_annotations: &row.data_annotations,
                context: &row.context,
            })
            .collect();
        let path = dir.join(format!("{}.json", sanitize_file_name(slot.name())));
        std::fs::write(path, serde_json::to_string_pretty(&rows)?)?;
    }

    let description = ExportedStep {
        index,
        error: error.to_string(),
        reference_annotations: step.reference_annotations(),
        text_annotations: step.text_annotations(),
        incomplete: step.is_incomplete(),
        slots: inputs.iter().map(DataSlot::name).collect(),
    };
    std::fs::write(
        dir.join("step.json"),
        serde_json::to_string_pretty(&description)?,
    )?;

    Ok(dir)
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContinueOnFailureSettings, RuntimePartition, RuntimePartitionRegistry};

    fn registry(continue_on_failure: bool, disable_on_cache_update: bool) -> RuntimePartitionRegistry {
        let mut registry = RuntimePartitionRegistry::new();
        registry.add(
            RuntimePartition::new("Batch").with_continue_on_failure(ContinueOnFailureSettings {
                continue_on_failure,
                export_failed_inputs: false,
                disable_on_cache_update,
            }),
        );
        registry
    }

    #[test]
    fn test_local_policy_wins() {
        let partitions = registry(false, true);
        let config = RunConfiguration::default();
        assert!(resolve_continue_on_failure(FailurePolicy::Enabled, 1, &partitions, &config));
        assert!(!resolve_continue_on_failure(FailurePolicy::Disabled, 1, &partitions, &config));
    }

    #[test]
    fn test_inherit_follows_partition() {
        let config = RunConfiguration::default();
        assert!(resolve_continue_on_failure(
            FailurePolicy::InheritFromPartition,
            1,
            &registry(true, true),
            &config
        ));
        assert!(!resolve_continue_on_failure(
            FailurePolicy::InheritFromPartition,
            1,
            &registry(false, false),
            &config
        ));
    }

    #[test]
    fn test_inherit_refused_while_populating_cache() {
        let config = RunConfiguration {
            store_to_cache: true,
            ..Default::default()
        };
        assert!(!resolve_continue_on_failure(
            FailurePolicy::InheritFromPartition,
            1,
            &registry(true, true),
            &config
        ));
        assert!(resolve_continue_on_failure(
            FailurePolicy::InheritFromPartition,
            1,
            &registry(true, false),
            &config
        ));
    }

    #[test]
    fn test_export_policy_inherits_partition_flag() {
        let partitions = registry(true, true);
        let config = RunConfiguration::default();
        assert!(!resolve_export_failed_inputs(
            FailurePolicy::InheritFromPartition,
            1,
            &partitions,
            &config
        ));
        // Default partition exports by default
        assert!(resolve_export_failed_inputs(
            FailurePolicy::InheritFromPartition,
            0,
            &partitions,
            &config
        ));
    }

    #[test]
    fn test_nested_run_leaves_inherited_failures_to_parent() {
        let partitions = registry(true, false);
        let nested = RunConfiguration::default().nested(true, true);

        assert!(!resolve_continue_on_failure(
            FailurePolicy::InheritFromPartition,
            1,
            &partitions,
            &nested
        ));
        assert!(!resolve_export_failed_inputs(
            FailurePolicy::InheritFromPartition,
            0,
            &partitions,
            &nested
        ));
        // An explicit node setting still applies
        assert!(resolve_continue_on_failure(FailurePolicy::Enabled, 1, &partitions, &nested));
    }

    #[test]
    fn test_cancellation_always_propagates() {
        let settings = CompositeSettings {
            continue_on_failure: FailurePolicy::Enabled,
            ..Default::default()
        };
        let recovery = FailureRecovery::resolve(
            &settings,
            &RuntimePartitionRegistry::new(),
            &RunConfiguration::default(),
        );
        let failure = PipelineError::Script("bad".into());
        assert_eq!(recovery.decide(&failure, false), FailureDecision::Absorb);
        assert_eq!(recovery.decide(&failure, true), FailureDecision::Propagate);
        assert_eq!(
            recovery.decide(&PipelineError::Cancelled, false),
            FailureDecision::Propagate
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Raw image/1"), "Raw_image_1");
    }
}
