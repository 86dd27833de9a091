//! Integer range strings such as `"0-2,5,7-9"`.

use crate::pipeline::{PipelineError, PipelineResult};
use std::collections::BTreeSet;

/// Parse a comma-separated list of indices and inclusive `a-b` spans,
/// keeping only indices below `bound`.
///
/// Descending spans (`"5-3"`) are accepted and cover the same indices as
/// their ascending form. Whitespace around tokens is ignored; empty tokens
/// are skipped. Spans are clipped before they are expanded, so the cost
/// depends on `bound` and not on the span ends.
pub fn parse_integer_range(text: &str, bound: usize) -> PipelineResult<BTreeSet<usize>> {
    let mut indices = BTreeSet::new();

    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start, token)?;
                let end = parse_index(end, token)?;
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                if lo < bound {
                    indices.extend(lo..=hi.min(bound - 1));
                }
            }
            None => {
                let index = parse_index(token, token)?;
                if index < bound {
                    indices.insert(index);
                }
            }
        }
    }

    Ok(indices)
}

fn parse_index(part: &str, token: &str) -> PipelineResult<usize> {
    part.trim().parse::<usize>().map_err(|_| {
        PipelineError::Script(format!("invalid integer range element '{}'", token))
    })
}
