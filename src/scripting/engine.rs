//! Rhai expression engine
//!
//! One engine instance serves three kinds of user expressions:
//!
//! - **Limits**: `count` is in scope; the result selects step indices.
//! - **Matching predicates**: `annotations`, `other_annotations` and
//!   `exact_match_results` are in scope; the result must be a bool.
//! - **Item scripts**: `item` and `annotations` are in scope; the result
//!   becomes the new data item.

use crate::pipeline::{PipelineError, PipelineResult, TextAnnotations};
use crate::scripting::range::parse_integer_range;
use rhai::{Array, Dynamic, Engine, Map, Scope, AST, INT};
use std::collections::BTreeSet;
use std::ops::{Range, RangeInclusive};

const MAX_ARRAY_SIZE: usize = 100_000;

/// Sandboxed Rhai engine for user expressions
pub struct ExpressionEngine {
    engine: Engine,
}

impl std::fmt::Debug for ExpressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEngine").finish_non_exhaustive()
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        Self { engine }
    }

    /// Configure the Rhai engine with helper functions and safety limits
    fn configure_engine(engine: &mut Engine) {
        // Set safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(100_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(MAX_ARRAY_SIZE);
        engine.set_max_map_size(1_000);

        // "0-2,5" -> [0, 1, 2, 5]; invalid text yields an empty array
        engine.register_fn("range_indices", |text: &str| -> Array {
            parse_integer_range(text, MAX_ARRAY_SIZE)
                .map(|set| set.into_iter().map(|i| Dynamic::from(i as INT)).collect())
                .unwrap_or_default()
        });

        // Numeric view of an annotation value, NaN if it does not parse
        engine.register_fn("as_number", |text: &str| -> f64 {
            text.trim().parse::<f64>().unwrap_or(f64::NAN)
        });
    }

    /// Compile an expression
    pub fn compile(&self, source: &str) -> PipelineResult<AST> {
        self.engine
            .compile_expression(source)
            .or_else(|_| self.engine.compile(source))
            .map_err(|e| PipelineError::Script(format!("Compile error: {}", e)))
    }

    /// Evaluate a limit expression against `count` steps.
    ///
    /// Accepts an integer, an array of integers, a range, or an integer range
    /// string. Indices outside `0..count` are dropped.
    pub fn eval_limit(&self, source: &str, count: usize) -> PipelineResult<BTreeSet<usize>> {
        let ast = self.compile(source)?;
        let mut scope = Scope::new();
        scope.push("count", count as INT);

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(PipelineError::from_rhai_error)?;

        dynamic_to_indices(result, count)
    }

    /// Evaluate a compiled matching predicate.
    pub fn eval_predicate(
        &self,
        ast: &AST,
        annotations: &TextAnnotations,
        other_annotations: &TextAnnotations,
        exact_match_results: bool,
    ) -> PipelineResult<bool> {
        let mut scope = Scope::new();
        scope.push("annotations", to_rhai_map(annotations));
        scope.push("other_annotations", to_rhai_map(other_annotations));
        scope.push("exact_match_results", exact_match_results);

        self.engine
            .eval_ast_with_scope::<bool>(&mut scope, ast)
            .map_err(PipelineError::from_rhai_error)
    }

    /// Evaluate a compiled item script.
    pub fn eval_item(
        &self,
        ast: &AST,
        item: &serde_json::Value,
        annotations: &TextAnnotations,
    ) -> PipelineResult<serde_json::Value> {
        let item = rhai::serde::to_dynamic(item).map_err(PipelineError::from_rhai_error)?;
        let mut scope = Scope::new();
        scope.push("item", item);
        scope.push("annotations", to_rhai_map(annotations));

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            .map_err(PipelineError::from_rhai_error)?;

        rhai::serde::from_dynamic::<serde_json::Value>(&result).map_err(PipelineError::from_rhai_error)
    }

    /// Direct access to the underlying engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

fn to_rhai_map(annotations: &TextAnnotations) -> Map {
    annotations
        .iter()
        .map(|(k, v)| (k.as_str().into(), Dynamic::from(v.clone())))
        .collect()
}

/// Convert a limit result into step indices below `count`.
fn dynamic_to_indices(value: Dynamic, count: usize) -> PipelineResult<BTreeSet<usize>> {
    let as_index = |i: INT| usize::try_from(i).ok().filter(|&i| i < count);
    let upper = INT::try_from(count).unwrap_or(INT::MAX);

    if value.is_int() {
        let i = value.as_int().map_err(limit_type_error)?;
        return Ok(as_index(i).into_iter().collect());
    }
    if value.is_string() {
        let text = value.into_string().map_err(limit_type_error)?;
        return parse_integer_range(&text, count);
    }
    if value.is_array() {
        let items = value.into_array().map_err(limit_type_error)?;
        let mut set = BTreeSet::new();
        for item in items {
            let i = item.as_int().map_err(limit_type_error)?;
            set.extend(as_index(i));
        }
        return Ok(set);
    }
    if value.is::<Range<INT>>() {
        let range = value.cast::<Range<INT>>();
        return Ok((range.start.max(0)..range.end.min(upper))
            .filter_map(as_index)
            .collect());
    }
    if value.is::<RangeInclusive<INT>>() {
        let range = value.cast::<RangeInclusive<INT>>();
        let end = (*range.end()).min(upper.saturating_sub(1));
        return Ok(((*range.start()).max(0)..=end)
            .filter_map(as_index)
            .collect());
    }

    Err(limit_type_error(value.type_name()))
}

fn limit_type_error(type_name: &str) -> PipelineError {
    PipelineError::Script(format!(
        "limit must evaluate to an integer, array, range or range string (got {})",
        type_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> TextAnnotations {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_limit_array() {
        let engine = ExpressionEngine::new();
        let set = engine.eval_limit("[0, 2]", 5).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_limit_range_uses_count() {
        let engine = ExpressionEngine::new();
        let set = engine.eval_limit("0..(count / 2)", 6).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_limit_inclusive_range() {
        let engine = ExpressionEngine::new();
        let set = engine.eval_limit("1..=2", 6).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_limit_string_and_out_of_range() {
        let engine = ExpressionEngine::new();
        let set = engine.eval_limit(r#""0-1,9""#, 3).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_limit_single_int_and_negative() {
        let engine = ExpressionEngine::new();
        assert_eq!(engine.eval_limit("count - 1", 4).unwrap().len(), 1);
        assert!(engine.eval_limit("-1", 4).unwrap().is_empty());
    }

    #[test]
    fn test_limit_huge_ranges_on_few_steps() {
        let engine = ExpressionEngine::new();
        let expected = vec![0, 1, 2];
        for source in [
            r#""0-4000000000""#,
            "0..9223372036854775807",
            "-5..=9223372036854775807",
        ] {
            let set = engine.eval_limit(source, 3).unwrap();
            assert_eq!(set.into_iter().collect::<Vec<_>>(), expected, "{}", source);
        }
    }

    #[test]
    fn test_range_indices_helper_is_capped() {
        let engine = ExpressionEngine::new();
        let set = engine
            .eval_limit(r#"range_indices("0-4000000000")"#, 2)
            .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_limit_bad_type() {
        let engine = ExpressionEngine::new();
        assert!(engine.eval_limit("true", 4).is_err());
    }

    #[test]
    fn test_predicate_sees_all_variables() {
        let engine = ExpressionEngine::new();
        let ast = engine
            .compile(r#"exact_match_results || annotations["k"] == other_annotations["alias"]"#)
            .unwrap();
        let a = annotations(&[("k", "1")]);
        let b = annotations(&[("alias", "1")]);
        assert!(engine.eval_predicate(&ast, &a, &b, false).unwrap());
        let c = annotations(&[("alias", "2")]);
        assert!(!engine.eval_predicate(&ast, &a, &c, false).unwrap());
        assert!(engine.eval_predicate(&ast, &a, &c, true).unwrap());
    }

    #[test]
    fn test_eval_item() {
        let engine = ExpressionEngine::new();
        let ast = engine.compile("item * 2").unwrap();
        let out = engine
            .eval_item(&ast, &serde_json::json!(21), &TextAnnotations::new())
            .unwrap();
        assert_eq!(out, serde_json::json!(42));
    }

    #[test]
    fn test_eval_item_error_is_script_error() {
        let engine = ExpressionEngine::new();
        let ast = engine.compile(r#"throw "bad row""#).unwrap();
        let err = engine
            .eval_item(&ast, &serde_json::json!(1), &TextAnnotations::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Script(_)));
        assert!(err.to_string().contains("bad row"));
    }

    #[test]
    fn test_range_indices_helper() {
        let engine = ExpressionEngine::new();
        let set = engine.eval_limit(r#"range_indices("1-2")"#, 5).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }
}
