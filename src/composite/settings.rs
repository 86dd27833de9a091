//! Configuration surface of a composite node.
//!
//! Everything here is plain serde data. It round-trips with the project
//! file and is applied before a run.

use crate::pipeline::{DataAnnotationMergeMode, TextAnnotationMergeMode};
use serde::{Deserialize, Serialize};

/// How input rows are turned into nested runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IterationMode {
    /// Run the wrapped graph once with every input row.
    #[default]
    PassThrough,
    /// One nested run per matched row combination (at most one row per slot).
    Iterating,
    /// One nested run per matched group (any number of rows per slot).
    Merging,
}

/// Which annotation keys are used as reference columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnMatching {
    /// Keys present in every participating slot.
    #[default]
    Intersection,
    /// Every key seen in any participating slot.
    Union,
    /// Like `Intersection`, restricted to keys starting with `#`.
    PrefixHashIntersection,
    /// Like `Union`, restricted to keys starting with `#`.
    PrefixHashUnion,
    /// The explicit `custom_columns` list.
    Custom,
    /// No reference columns: every row matches every other row.
    MergeAll,
    /// Every row forms its own group.
    SplitAll,
    /// Same as `MergeAll`.
    None,
}

/// Tri-state failure setting of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    Enabled,
    Disabled,
    /// Take the setting from the node's runtime partition.
    #[default]
    InheritFromPartition,
}

/// How consecutive steps are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepIsolation {
    /// Reuse the wrapped graph and clear its slot data after every step.
    /// Nodes must not carry state from one step to the next.
    #[default]
    ClearSlots,
    /// Run every step on a deep copy of the wrapped graph.
    CopyGraph,
}

/// Matching and filtering settings of the iteration step generator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepGeneratorSettings {
    #[serde(default)]
    pub column_matching: ColumnMatching,

    /// Reference columns for `ColumnMatching::Custom`
    #[serde(default)]
    pub custom_columns: Vec<String>,

    /// An absent annotation value matches any value
    #[serde(default)]
    pub missing_matches_any: bool,

    /// Rhai predicate replacing exact matching. In scope: `annotations`,
    /// `other_annotations`, `exact_match_results`.
    #[serde(default)]
    pub custom_predicate: Option<String>,

    /// How the text annotations of a step's rows are combined
    #[serde(default)]
    pub text_merge_mode: TextAnnotationMergeMode,

    /// How the data annotations of a step's rows are combined
    #[serde(default)]
    pub data_merge_mode: DataAnnotationMergeMode,

    /// Rhai expression selecting the step indices to keep (`count` in scope)
    #[serde(default)]
    pub limit: Option<String>,

    /// Drop steps that miss rows from a participating slot
    #[serde(default)]
    pub skip_incomplete: bool,
}

impl StepGeneratorSettings {
    pub fn with_matching(mut self, column_matching: ColumnMatching) -> Self {
        self.column_matching = column_matching;
        self
    }

    /// Match on an explicit list of columns.
    pub fn with_custom_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_matching = ColumnMatching::Custom;
        self.custom_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.custom_predicate = Some(predicate.into());
        self
    }

    pub fn skipping_incomplete(mut self) -> Self {
        self.skip_incomplete = true;
        self
    }
}

/// All settings of a composite node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositeSettings {
    #[serde(default)]
    pub iteration_mode: IterationMode,

    #[serde(default)]
    pub step_generator: StepGeneratorSettings,

    /// Whether a failed step is absorbed
    #[serde(default)]
    pub continue_on_failure: FailurePolicy,

    /// Whether the inputs of an absorbed failure are exported
    #[serde(default)]
    pub export_failed_inputs: FailurePolicy,

    #[serde(default)]
    pub step_isolation: StepIsolation,

    /// Index into the runtime partition registry (clamped on lookup)
    #[serde(default)]
    pub runtime_partition: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CompositeSettings::default();
        assert_eq!(settings.iteration_mode, IterationMode::PassThrough);
        assert_eq!(settings.continue_on_failure, FailurePolicy::InheritFromPartition);
        assert_eq!(settings.step_isolation, StepIsolation::ClearSlots);
        assert_eq!(
            settings.step_generator.column_matching,
            ColumnMatching::Intersection
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: CompositeSettings =
            serde_json::from_str(r#"{ "iteration_mode": "Merging" }"#).unwrap();
        assert_eq!(settings.iteration_mode, IterationMode::Merging);
        assert!(!settings.step_generator.skip_incomplete);
        assert_eq!(settings.runtime_partition, 0);
    }

    #[test]
    fn test_custom_columns_switch_matching() {
        let s = StepGeneratorSettings::default().with_custom_columns(["#Dataset"]);
        assert_eq!(s.column_matching, ColumnMatching::Custom);
        assert_eq!(s.custom_columns, vec!["#Dataset".to_string()]);
    }
}
