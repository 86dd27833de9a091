//! Built-in pipeline node implementations.

pub mod boundary;
pub mod script;

pub use boundary::{BoundaryNode, BoundaryRole};
pub use script::{ScriptNode, SCRIPT_INPUT, SCRIPT_OUTPUT};
