//! Row annotations and the strategies used to merge them.
//!
//! Text annotations are `key -> string` pairs attached to a row; keys are
//! unique per row. Data annotations attach whole data items under a key.
//! Whenever two annotation sets meet (copying a row into a slot that
//! already carries annotations, or folding the rows of an iteration step
//! into one set) a merge mode decides which value survives.

use crate::pipeline::data::DataItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text annotations of a single row.
pub type TextAnnotations = BTreeMap<String, String>;

/// Data annotations of a single row.
pub type DataAnnotations = BTreeMap<String, DataItem>;

/// How conflicting text annotations are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAnnotationMergeMode {
    /// Distinct values are joined into a JSON list string.
    #[default]
    Merge,
    /// Like `Merge`, but values that already are JSON lists are flattened first.
    MergeLists,
    /// Keep the value that was there first.
    SkipExisting,
    /// The last value wins.
    OverwriteExisting,
    /// Drop all annotations.
    Discard,
}

/// How conflicting data annotations are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataAnnotationMergeMode {
    #[default]
    OverwriteExisting,
    SkipExisting,
    Discard,
}

impl TextAnnotationMergeMode {
    /// Merge `incoming` into `target`.
    pub fn merge_into(self, target: &mut TextAnnotations, incoming: &TextAnnotations) {
        match self {
            TextAnnotationMergeMode::Discard => {}
            TextAnnotationMergeMode::OverwriteExisting => {
                for (k, v) in incoming {
                    target.insert(k.clone(), v.clone());
                }
            }
            TextAnnotationMergeMode::SkipExisting => {
                for (k, v) in incoming {
                    target.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            TextAnnotationMergeMode::Merge | TextAnnotationMergeMode::MergeLists => {
                let flatten = self == TextAnnotationMergeMode::MergeLists;
                for (k, v) in incoming {
                    let merged = match target.get(k) {
                        Some(existing) if existing != v => {
                            combine_values(&[existing.as_str(), v.as_str()], flatten)
                        }
                        _ => v.clone(),
                    };
                    target.insert(k.clone(), merged);
                }
            }
        }
    }

    /// Fold several annotation sets into one, in iteration order.
    pub fn merge_all<'a>(self, sets: impl IntoIterator<Item = &'a TextAnnotations>) -> TextAnnotations {
        let mut by_key: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for set in sets {
            for (k, v) in set {
                by_key.entry(k.as_str()).or_default().push(v.as_str());
            }
        }

        let mut result = TextAnnotations::new();
        if self == TextAnnotationMergeMode::Discard {
            return result;
        }
        for (key, values) in by_key {
            let value = match self {
                TextAnnotationMergeMode::SkipExisting => values.first().map(|v| v.to_string()),
                TextAnnotationMergeMode::OverwriteExisting => values.last().map(|v| v.to_string()),
                TextAnnotationMergeMode::Merge => Some(combine_values(&values, false)),
                TextAnnotationMergeMode::MergeLists => Some(combine_values(&values, true)),
                TextAnnotationMergeMode::Discard => None,
            };
            if let Some(value) = value {
                result.insert(key.to_string(), value);
            }
        }
        result
    }
}

impl DataAnnotationMergeMode {
    /// Merge `incoming` into `target`.
    pub fn merge_into(self, target: &mut DataAnnotations, incoming: &DataAnnotations) {
        match self {
            DataAnnotationMergeMode::Discard => {}
            DataAnnotationMergeMode::OverwriteExisting => {
                for (k, v) in incoming {
                    target.insert(k.clone(), v.clone());
                }
            }
            DataAnnotationMergeMode::SkipExisting => {
                for (k, v) in incoming {
                    target.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }
    }

    /// Fold several annotation sets into one, in iteration order.
    pub fn merge_all<'a>(self, sets: impl IntoIterator<Item = &'a DataAnnotations>) -> DataAnnotations {
        let mut result = DataAnnotations::new();
        for set in sets {
            self.merge_into(&mut result, set);
        }
        result
    }
}

/// Join distinct values (first-seen order). A single distinct value is
/// returned unchanged; several become a JSON list string.
fn combine_values(values: &[&str], flatten_lists: bool) -> String {
    let mut distinct: Vec<String> = Vec::new();
    let mut push = |v: String| {
        if !distinct.contains(&v) {
            distinct.push(v);
        }
    };

    for value in values {
        match flatten_lists
            .then(|| serde_json::from_str::<Vec<String>>(value).ok())
            .flatten()
        {
            Some(items) => items.into_iter().for_each(&mut push),
            None => push(value.to_string()),
        }
    }

    if distinct.len() == 1 {
        return distinct.remove(0);
    }
    serde_json::to_string(&distinct).unwrap_or_else(|_| distinct.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotations(pairs: &[(&str, &str)]) -> TextAnnotations {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overwrite_replaces_existing() {
        let mut target = annotations(&[("k", "1"), ("other", "x")]);
        TextAnnotationMergeMode::OverwriteExisting.merge_into(&mut target, &annotations(&[("k", "2")]));
        assert_eq!(target["k"], "2");
        assert_eq!(target["other"], "x");
    }

    #[test]
    fn test_skip_existing_keeps_first() {
        let mut target = annotations(&[("k", "1")]);
        TextAnnotationMergeMode::SkipExisting
            .merge_into(&mut target, &annotations(&[("k", "2"), ("new", "y")]));
        assert_eq!(target["k"], "1");
        assert_eq!(target["new"], "y");
    }

    #[test]
    fn test_merge_builds_json_list() {
        let a = annotations(&[("k", "1")]);
        let b = annotations(&[("k", "2")]);
        let c = annotations(&[("k", "1")]);
        let merged = TextAnnotationMergeMode::Merge.merge_all([&a, &b, &c]);
        assert_eq!(merged["k"], r#"["1","2"]"#);
    }

    #[test]
    fn test_merge_single_value_is_unchanged() {
        let a = annotations(&[("k", "same")]);
        let merged = TextAnnotationMergeMode::Merge.merge_all([&a, &a]);
        assert_eq!(merged["k"], "same");
    }

    #[test]
    fn test_merge_lists_flattens() {
        let a = annotations(&[("k", r#"["1","2"]"#)]);
        let b = annotations(&[("k", "3")]);
        let merged = TextAnnotationMergeMode::MergeLists.merge_all([&a, &b]);
        assert_eq!(merged["k"], r#"["1","2","3"]"#);
    }

    #[test]
    fn test_discard_drops_everything() {
        let a = annotations(&[("k", "1")]);
        assert!(TextAnnotationMergeMode::Discard.merge_all([&a]).is_empty());

        let mut target = annotations(&[("k", "0")]);
        TextAnnotationMergeMode::Discard.merge_into(&mut target, &a);
        assert_eq!(target["k"], "0");
    }

    #[test]
    fn test_data_annotation_modes() {
        let first: DataAnnotations = [("roi".to_string(), DataItem::new(json!(1)))].into();
        let second: DataAnnotations = [("roi".to_string(), DataItem::new(json!(2)))].into();

        let over = DataAnnotationMergeMode::OverwriteExisting.merge_all([&first, &second]);
        assert_eq!(over["roi"].value(), &json!(2));

        let skip = DataAnnotationMergeMode::SkipExisting.merge_all([&first, &second]);
        assert_eq!(skip["roi"].value(), &json!(1));

        assert!(DataAnnotationMergeMode::Discard.merge_all([&first]).is_empty());
    }
}
