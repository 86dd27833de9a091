//! Rhai scripting for user expressions
//!
//! Composite nodes and script nodes accept small user expressions:
//!
//! - **Limit expressions** select which iteration steps to keep. `count` is
//!   the number of generated steps. The result may be an integer, an array
//!   of integers, a range or an integer-range string.
//! - **Matching predicates** decide whether a row belongs to a group.
//!   `annotations` holds the row's text annotations, `other_annotations` the
//!   group's reference values and `exact_match_results` the outcome of plain
//!   equality matching.
//! - **Item scripts** transform a data item. `item` is the value as a Rhai
//!   dynamic, `annotations` the row's text annotations.
//!
//! ## Helper Functions
//!
//! - `range_indices(text)` - Parse `"0-2,5"` into `[0, 1, 2, 5]`
//! - `as_number(text)` - Parse an annotation value as a float (NaN on failure)
//!
//! ## Example Expressions
//!
//! Keep only the first ten steps:
//! ```rhai
//! 0..10
//! ```
//!
//! Keep every other step:
//! ```rhai
//! let out = [];
//! for i in 0..count { if i % 2 == 0 { out.push(i); } }
//! out
//! ```
//!
//! Match rows whose `#Dataset` differs only by case:
//! ```rhai
//! exact_match_results || annotations["#Dataset"].to_lower() == other_annotations["#Dataset"].to_lower()
//! ```

mod engine;
mod range;

pub use engine::ExpressionEngine;
pub use range::parse_integer_range;
