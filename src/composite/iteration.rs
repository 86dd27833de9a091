//! Iteration step generation.
//!
//! Rows of the composite node's input slots are grouped by the values of
//! their reference annotations. In merging mode every group becomes one
//! step; in iterating mode every group is expanded into the combinations
//! that take exactly one row from each slot that has rows in the group.
//!
//! After grouping, steps are
//! 1. deduplicated,
//! 2. sorted by their reference values (natural order, absent first),
//! 3. restricted to the indices selected by the limit expression,
//! 4. checked for completeness, and
//! 5. optionally stripped of incomplete steps.

use crate::composite::settings::{ColumnMatching, IterationMode, StepGeneratorSettings};
use crate::pipeline::{
    DataAnnotations, DataSlot, PipelineResult, ProgressInfo, TextAnnotations,
};
use crate::scripting::ExpressionEngine;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Reference values of a row or group, one entry per reference column.
type ReferenceKey = Vec<Option<String>>;

/// Rows one input slot contributes to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInput {
    pub slot: String,
    pub rows: Vec<usize>,
}

/// A group of input rows processed by one nested run.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationStep {
    /// One entry per composite input slot, in slot order.
    inputs: Vec<StepInput>,
    reference_key: ReferenceKey,
    reference_annotations: TextAnnotations,
    /// Required slots that contributed no row.
    missing_slots: Vec<String>,
    text_annotations: TextAnnotations,
    data_annotations: DataAnnotations,
    pass_through: bool,
}

impl IterationStep {
    pub fn inputs(&self) -> &[StepInput] {
        &self.inputs
    }

    /// Row indices selected from `slot` (empty if the slot contributes nothing).
    pub fn rows(&self, slot: &str) -> &[usize] {
        self.inputs
            .iter()
            .find(|input| input.slot == slot)
            .map(|input| input.rows.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of selected rows across all slots.
    pub fn row_count(&self) -> usize {
        self.inputs.iter().map(|input| input.rows.len()).sum()
    }

    pub fn is_incomplete(&self) -> bool {
        !self.missing_slots.is_empty()
    }

    pub fn missing_slots(&self) -> &[String] {
        &self.missing_slots
    }

    /// Reference column values shared by the rows of this step.
    pub fn reference_annotations(&self) -> &TextAnnotations {
        &self.reference_annotations
    }

    /// Text annotations of all rows, combined with the configured merge mode.
    pub fn text_annotations(&self) -> &TextAnnotations {
        &self.text_annotations
    }

    /// Data annotations of all rows, combined with the configured merge mode.
    pub fn data_annotations(&self) -> &DataAnnotations {
        &self.data_annotations
    }

    /// True for the single step of a pass-through run.
    pub fn is_pass_through(&self) -> bool {
        self.pass_through
    }

    fn row_selection(&self) -> Vec<Vec<usize>> {
        self.inputs.iter().map(|input| input.rows.clone()).collect()
    }
}

/// Result of step generation.
#[derive(Debug, Clone, Default)]
pub struct GeneratedSteps {
    pub steps: Vec<IterationStep>,
    /// Reference columns the rows were matched on
    pub reference_columns: Vec<String>,
    /// Incomplete steps removed because `skip_incomplete` is set
    pub skipped_incomplete: usize,
}

/// A matched group: the rows of every participating slot sharing one key.
struct Group {
    key: ReferenceKey,
    rows: Vec<Vec<usize>>,
}

/// Partitions input rows into iteration steps.
pub struct StepGenerator<'a> {
    settings: &'a StepGeneratorSettings,
    engine: ExpressionEngine,
}

impl<'a> StepGenerator<'a> {
    pub fn new(settings: &'a StepGeneratorSettings) -> Self {
        Self {
            settings,
            engine: ExpressionEngine::new(),
        }
    }

    pub fn generate(
        &self,
        slots: &[DataSlot],
        mode: IterationMode,
        progress: &ProgressInfo,
    ) -> PipelineResult<GeneratedSteps> {
        // Optional slots without rows do not take part in matching
        let participating: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !(slot.is_optional() && slot.is_empty()))
            .map(|(i, _)| i)
            .collect();

        if mode == IterationMode::PassThrough || participating.is_empty() {
            return Ok(GeneratedSteps {
                steps: vec![self.pass_through_step(slots)],
                ..Default::default()
            });
        }

        let reference_columns = self.reference_columns(slots, &participating);
        progress.debug(format_args!(
            "Matching {} slots on reference columns {:?}",
            participating.len(),
            reference_columns
        ));

        let steps = if self.settings.column_matching == ColumnMatching::SplitAll {
            self.split_all(slots, &participating)
        } else {
            let groups = self.group_rows(slots, &participating, &reference_columns)?;
            progress.debug(format_args!("Found {} row groups", groups.len()));
            groups
                .into_iter()
                .flat_map(|group| match mode {
                    IterationMode::Iterating => expand_combinations(&group.rows)
                        .into_iter()
                        .map(|rows| (group.key.clone(), rows))
                        .collect::<Vec<_>>(),
                    _ => vec![(group.key, group.rows)],
                })
                .map(|(key, rows)| {
                    self.build_step(slots, &participating, &reference_columns, key, rows)
                })
                .collect()
        };

        self.finish(steps, reference_columns, progress)
    }

    /// Reference columns for the current matching mode.
    pub fn reference_columns(&self, slots: &[DataSlot], participating: &[usize]) -> Vec<String> {
        let column_sets: Vec<BTreeSet<String>> = participating
            .iter()
            .map(|&i| &slots[i])
            .filter(|slot| !slot.is_empty())
            .map(DataSlot::text_annotation_columns)
            .collect();

        let intersection = |prefix: &str| -> Vec<String> {
            let mut sets = column_sets.iter();
            let Some(first) = sets.next() else {
                return Vec::new();
            };
            let common = sets.fold(first.clone(), |acc, set| {
                acc.intersection(set).cloned().collect()
            });
            common.into_iter().filter(|c| c.starts_with(prefix)).collect()
        };
        let union = |prefix: &str| -> Vec<String> {
            column_sets
                .iter()
                .flatten()
                .filter(|c| c.starts_with(prefix))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        match self.settings.column_matching {
            ColumnMatching::Intersection => intersection(""),
            ColumnMatching::PrefixHashIntersection => intersection("#"),
            ColumnMatching::Union => union(""),
            ColumnMatching::PrefixHashUnion => union("#"),
            ColumnMatching::Custom => {
                let mut seen = BTreeSet::new();
                self.settings
                    .custom_columns
                    .iter()
                    .filter(|c| seen.insert(c.as_str()))
                    .cloned()
                    .collect()
            }
            ColumnMatching::MergeAll | ColumnMatching::SplitAll | ColumnMatching::None => {
                Vec::new()
            }
        }
    }

    // ==================== Grouping ====================

    fn group_rows(
        &self,
        slots: &[DataSlot],
        participating: &[usize],
        columns: &[String],
    ) -> PipelineResult<Vec<Group>> {
        let row_keys: Vec<Vec<ReferenceKey>> = participating
            .iter()
            .map(|&i| {
                slots[i]
                    .rows()
                    .iter()
                    .map(|row| {
                        columns
                            .iter()
                            .map(|c| row.text_annotations.get(c).cloned())
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let predicate = self
            .settings
            .custom_predicate
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.engine.compile(p))
            .transpose()?;

        if predicate.is_none() && !self.settings.missing_matches_any {
            return Ok(group_exact(&row_keys));
        }

        let mut keys: BTreeSet<ReferenceKey> = row_keys.iter().flatten().cloned().collect();
        if self.settings.missing_matches_any {
            keys = most_specific_keys(keys);
        }

        let mut groups = Vec::with_capacity(keys.len());
        for key in keys {
            let key_annotations = reference_annotations(columns, &key);
            let mut rows = vec![Vec::new(); participating.len()];
            for (p, &slot_index) in participating.iter().enumerate() {
                for (row_index, row_key) in row_keys[p].iter().enumerate() {
                    let exact = if self.settings.missing_matches_any {
                        covers(&key, row_key)
                    } else {
                        &key == row_key
                    };
                    let matched = match &predicate {
                        Some(ast) => {
                            let row = &slots[slot_index].rows()[row_index];
                            self.engine.eval_predicate(
                                ast,
                                &row.text_annotations,
                                &key_annotations,
                                exact,
                            )?
                        }
                        None => exact,
                    };
                    if matched {
                        rows[p].push(row_index);
                    }
                }
            }
            if rows.iter().any(|r| !r.is_empty()) {
                groups.push(Group { key, rows });
            }
        }
        Ok(groups)
    }

    fn split_all(&self, slots: &[DataSlot], participating: &[usize]) -> Vec<IterationStep> {
        let mut steps = Vec::new();
        for (p, &slot_index) in participating.iter().enumerate() {
            for row in 0..slots[slot_index].len() {
                let mut rows = vec![Vec::new(); participating.len()];
                rows[p].push(row);
                steps.push(self.build_step(slots, participating, &[], Vec::new(), rows));
            }
        }
        steps
    }

    // ==================== Step Construction ====================

    fn build_step(
        &self,
        slots: &[DataSlot],
        participating: &[usize],
        columns: &[String],
        key: ReferenceKey,
        rows: Vec<Vec<usize>>,
    ) -> IterationStep {
        let mut per_slot: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
        for (&slot_index, selected) in participating.iter().zip(rows) {
            per_slot[slot_index] = selected;
        }

        let missing_slots = participating
            .iter()
            .filter(|&&i| !slots[i].is_optional() && per_slot[i].is_empty())
            .map(|&i| slots[i].name().to_string())
            .collect();

        let inputs: Vec<StepInput> = slots
            .iter()
            .zip(per_slot)
            .map(|(slot, rows)| StepInput {
                slot: slot.name().to_string(),
                rows,
            })
            .collect();

        let (text_annotations, data_annotations) = self.merged_annotations(slots, &inputs);

        IterationStep {
            reference_annotations: reference_annotations(columns, &key),
            reference_key: key,
            inputs,
            missing_slots,
            text_annotations,
            data_annotations,
            pass_through: false,
        }
    }

    fn pass_through_step(&self, slots: &[DataSlot]) -> IterationStep {
        let inputs: Vec<StepInput> = slots
            .iter()
            .map(|slot| StepInput {
                slot: slot.name().to_string(),
                rows: (0..slot.len()).collect(),
            })
            .collect();
        let (text_annotations, data_annotations) = self.merged_annotations(slots, &inputs);

        IterationStep {
            inputs,
            reference_key: Vec::new(),
            reference_annotations: TextAnnotations::new(),
            missing_slots: Vec::new(),
            text_annotations,
            data_annotations,
            pass_through: true,
        }
    }

    fn merged_annotations(
        &self,
        slots: &[DataSlot],
        inputs: &[StepInput],
    ) -> (TextAnnotations, DataAnnotations) {
        let rows: Vec<_> = slots
            .iter()
            .zip(inputs)
            .flat_map(|(slot, input)| input.rows.iter().filter_map(|&r| slot.row(r)))
            .collect();
        let text = self
            .settings
            .text_merge_mode
            .merge_all(rows.iter().map(|row| &row.text_annotations));
        let data = self
            .settings
            .data_merge_mode
            .merge_all(rows.iter().map(|row| &row.data_annotations));
        (text, data)
    }

    // ==================== Post-processing ====================

    fn finish(
        &self,
        mut steps: Vec<IterationStep>,
        reference_columns: Vec<String>,
        progress: &ProgressInfo,
    ) -> PipelineResult<GeneratedSteps> {
        let mut seen = BTreeSet::new();
        steps.retain(|step| seen.insert(step.row_selection()));

        steps.sort_by(|a, b| compare_keys(&a.reference_key, &b.reference_key));

        if let Some(limit) = self.settings.limit.as_deref().filter(|l| !l.trim().is_empty()) {
            let keep = self.engine.eval_limit(limit, steps.len())?;
            progress.log(format_args!(
                "Limiting {} iteration steps to indices {:?}",
                steps.len(),
                keep
            ));
            steps = steps
                .into_iter()
                .enumerate()
                .filter(|(i, _)| keep.contains(i))
                .map(|(_, step)| step)
                .collect();
        }

        for (i, step) in steps.iter().enumerate() {
            if step.is_incomplete() {
                progress.warn(format_args!(
                    "Incomplete iteration step {} {:?}: no rows from {:?}",
                    i, step.reference_annotations, step.missing_slots
                ));
            }
        }

        let mut skipped_incomplete = 0;
        if self.settings.skip_incomplete {
            let before = steps.len();
            steps.retain(|step| !step.is_incomplete());
            skipped_incomplete = before - steps.len();
            if skipped_incomplete > 0 {
                progress.log(format_args!(
                    "Skipped {} incomplete iteration steps",
                    skipped_incomplete
                ));
            }
        }

        Ok(GeneratedSteps {
            steps,
            reference_columns,
            skipped_incomplete,
        })
    }
}

fn group_exact(row_keys: &[Vec<ReferenceKey>]) -> Vec<Group> {
    let mut groups: BTreeMap<ReferenceKey, Vec<Vec<usize>>> = BTreeMap::new();
    for (p, keys) in row_keys.iter().enumerate() {
        for (row, key) in keys.iter().enumerate() {
            groups
                .entry(key.clone())
                .or_insert_with(|| vec![Vec::new(); row_keys.len()])[p]
                .push(row);
        }
    }
    groups
        .into_iter()
        .map(|(key, rows)| Group { key, rows })
        .collect()
}

/// True if every value of `key` is absent or equal in `specific`.
fn covers(specific: &ReferenceKey, key: &ReferenceKey) -> bool {
    key.iter()
        .zip(specific)
        .all(|(value, other)| value.is_none() || value == other)
}

/// Drop every key that is covered by a different, more specific key.
fn most_specific_keys(keys: BTreeSet<ReferenceKey>) -> BTreeSet<ReferenceKey> {
    keys.iter()
        .filter(|key| !keys.iter().any(|other| other != *key && covers(other, key)))
        .cloned()
        .collect()
}

/// Cartesian product over the slots that have rows; slots without rows
/// stay empty in every combination.
fn expand_combinations(rows: &[Vec<usize>]) -> Vec<Vec<Vec<usize>>> {
    let mut combinations: Vec<Vec<Vec<usize>>> = vec![Vec::new()];
    for slot_rows in rows {
        if slot_rows.is_empty() {
            for combination in &mut combinations {
                combination.push(Vec::new());
            }
            continue;
        }
        combinations = combinations
            .into_iter()
            .flat_map(|combination| {
                slot_rows.iter().map(move |&row| {
                    let mut next = combination.clone();
                    next.push(vec![row]);
                    next
                })
            })
            .collect();
    }
    combinations
}

fn reference_annotations(columns: &[String], key: &ReferenceKey) -> TextAnnotations {
    columns
        .iter()
        .zip(key)
        .filter_map(|(column, value)| value.as_ref().map(|v| (column.clone(), v.clone())))
        .collect()
}

fn compare_keys(a: &ReferenceKey, b: &ReferenceKey) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ordering = match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => natural_cmp(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

/// Compare strings so that digit runs order by numeric value ("2" < "10").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut a);
                let right = take_digits(&mut b);
                let left_trimmed = left.trim_start_matches('0');
                let right_trimmed = right.trim_start_matches('0');
                let ordering = left_trimmed
                    .len()
                    .cmp(&right_trimmed.len())
                    .then_with(|| left_trimmed.cmp(right_trimmed))
                    .then_with(|| left.len().cmp(&right.len()));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        DataContext, DataItem, DataRow, DataType, SlotDescriptor, TextAnnotationMergeMode,
    };
    use serde_json::json;

    fn slot(name: &str, keys: &[&str]) -> DataSlot {
        let mut slot = DataSlot::new(SlotDescriptor::input(name, DataType::any()));
        for (i, k) in keys.iter().enumerate() {
            slot.push_row(
                DataRow::new(DataItem::new(json!(i)), DataContext::new(None))
                    .with_annotation("k", *k),
            );
        }
        slot
    }

    fn generate(
        settings: &StepGeneratorSettings,
        slots: &[DataSlot],
        mode: IterationMode,
    ) -> GeneratedSteps {
        StepGenerator::new(settings)
            .generate(slots, mode, &ProgressInfo::new("test"))
            .unwrap()
    }

    fn keys(steps: &GeneratedSteps) -> Vec<String> {
        steps
            .steps
            .iter()
            .map(|s| s.reference_annotations().get("k").cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_natural_order() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("img10", "img9"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "b"), Ordering::Less);
        assert_eq!(natural_cmp("x01", "x1"), Ordering::Greater);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_pass_through_has_all_rows() {
        let slots = [slot("A", &["1", "2"]), slot("B", &["3"])];
        let out = generate(&StepGeneratorSettings::default(), &slots, IterationMode::PassThrough);
        assert_eq!(out.steps.len(), 1);
        assert!(out.steps[0].is_pass_through());
        assert_eq!(out.steps[0].rows("A"), &[0, 1]);
        assert_eq!(out.steps[0].rows("B"), &[0]);
    }

    #[test]
    fn test_zero_slots_behaves_as_pass_through() {
        let out = generate(&StepGeneratorSettings::default(), &[], IterationMode::Iterating);
        assert_eq!(out.steps.len(), 1);
        assert!(out.steps[0].is_pass_through());
    }

    #[test]
    fn test_steps_are_sorted_naturally() {
        let slots = [slot("A", &["10", "2", "1"])];
        let out = generate(&StepGeneratorSettings::default(), &slots, IterationMode::Iterating);
        assert_eq!(keys(&out), vec!["1", "2", "10"]);
    }

    #[test]
    fn test_empty_required_slot_makes_steps_incomplete() {
        let slots = [slot("A", &["1", "2"]), slot("B", &[])];
        let out = generate(&StepGeneratorSettings::default(), &slots, IterationMode::Iterating);
        assert_eq!(out.steps.len(), 2);
        assert!(out.steps.iter().all(IterationStep::is_incomplete));
        assert_eq!(out.steps[0].missing_slots(), &["B".to_string()]);
    }

    #[test]
    fn test_optional_empty_slot_does_not_participate() {
        let optional = DataSlot::new(SlotDescriptor::input("B", DataType::any()).optional());
        let slots = [slot("A", &["1", "2"]), optional];
        let out = generate(&StepGeneratorSettings::default(), &slots, IterationMode::Iterating);
        assert_eq!(out.steps.len(), 2);
        assert!(out.steps.iter().all(|s| !s.is_incomplete()));
    }

    #[test]
    fn test_merge_all_forms_single_group() {
        let settings = StepGeneratorSettings::default().with_matching(ColumnMatching::MergeAll);
        let slots = [slot("A", &["1", "2", "3"])];
        let out = generate(&settings, &slots, IterationMode::Merging);
        assert_eq!(out.steps.len(), 1);
        assert_eq!(out.steps[0].rows("A"), &[0, 1, 2]);
    }

    #[test]
    fn test_split_all_one_step_per_row() {
        let settings = StepGeneratorSettings::default().with_matching(ColumnMatching::SplitAll);
        let slots = [slot("A", &["1", "1"]), slot("B", &["1"])];
        let out = generate(&settings, &slots, IterationMode::Merging);
        assert_eq!(out.steps.len(), 3);
        assert_eq!(out.steps[2].rows("B"), &[0]);
        assert!(out.steps[2].rows("A").is_empty());

        // Each step holds a single row, so every other slot is missing
        assert!(out.steps.iter().all(|s| s.is_incomplete()));
        assert_eq!(out.steps[0].missing_slots(), &["B".to_string()]);
        assert_eq!(out.steps[2].missing_slots(), &["A".to_string()]);
    }

    #[test]
    fn test_missing_matches_any_folds_absent_values() {
        let mut a = slot("A", &["1", "2"]);
        a.push_row(DataRow::new(DataItem::new(json!("wild")), DataContext::new(None)));
        let b = slot("B", &["1", "2"]);
        let settings = StepGeneratorSettings {
            column_matching: ColumnMatching::Custom,
            custom_columns: vec!["k".into()],
            missing_matches_any: true,
            ..Default::default()
        };
        let out = generate(&settings, &[a, b], IterationMode::Merging);
        assert_eq!(keys(&out), vec!["1", "2"]);
        // The unannotated row joins every group
        assert_eq!(out.steps[0].rows("A"), &[0, 2]);
        assert_eq!(out.steps[1].rows("A"), &[1, 2]);
    }

    #[test]
    fn test_custom_predicate_replaces_exact_matching() {
        let a = slot("A", &["1", "2"]);
        let b = slot("B", &["1", "2"]);
        let settings = StepGeneratorSettings::default()
            .with_custom_columns(["k"])
            .with_predicate("true");
        let out = generate(&settings, &[a, b], IterationMode::Merging);
        // Both groups select every row, so they collapse into one step
        assert_eq!(out.steps.len(), 1);
        assert_eq!(out.steps[0].rows("A"), &[0, 1]);
        assert_eq!(out.steps[0].rows("B"), &[0, 1]);
    }

    #[test]
    fn test_predicate_sees_exact_result() {
        let a = slot("A", &["1", "2"]);
        let settings = StepGeneratorSettings::default()
            .with_custom_columns(["k"])
            .with_predicate("exact_match_results && annotations[\"k\"] != \"2\"");
        let out = generate(&settings, &[a], IterationMode::Merging);
        assert_eq!(keys(&out), vec!["1"]);
    }

    #[test]
    fn test_limit_keeps_selected_indices() {
        let settings = StepGeneratorSettings::default().with_limit("[0, 2, 99]");
        let slots = [slot("A", &["a", "b", "c", "d"])];
        let out = generate(&settings, &slots, IterationMode::Iterating);
        assert_eq!(keys(&out), vec!["a", "c"]);
    }

    #[test]
    fn test_merged_annotations_use_merge_mode() {
        let mut a = slot("A", &["1", "1"]);
        a.push_row(
            DataRow::new(DataItem::new(json!(0)), DataContext::new(None)).with_annotation("k", "2"),
        );
        let settings = StepGeneratorSettings {
            column_matching: ColumnMatching::MergeAll,
            text_merge_mode: TextAnnotationMergeMode::OverwriteExisting,
            ..Default::default()
        };
        let out = generate(&settings, &[a], IterationMode::Merging);
        assert_eq!(out.steps[0].text_annotations().get("k").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_expand_combinations_keeps_empty_slots() {
        let combos = expand_combinations(&[vec![0, 1], vec![], vec![5]]);
        assert_eq!(
            combos,
            vec![
                vec![vec![0], vec![], vec![5]],
                vec![vec![1], vec![], vec![5]],
            ]
        );
    }
}
