//! Node abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`NodePlugin` trait**: for host-defined nodes that live outside this crate.
//! - **`BuiltinNode` enum**: for the nodes shipped here. Serialisable, so a
//!   graph made only of builtins round-trips through a project file.
//!
//! `AnyNode` wraps either variant so the graph can handle both uniformly.

use crate::composite::CompositeNode;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::id::NodeId;
use crate::pipeline::nodes::{BoundaryNode, BoundaryRole, ScriptNode};
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::run::{ProgressInfo, RunContext};
use crate::pipeline::slot::SlotSet;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};

/// Context passed to a node while it runs.
pub struct NodeContext<'a> {
    /// Id of the running node inside its graph.
    pub node_id: NodeId,
    /// The enclosing run: configuration, partitions, cancellation, pool.
    pub run: &'a RunContext,
    /// Progress/log sink scoped to this node.
    pub progress: &'a ProgressInfo,
}

/// Coarse node classification used for lookups such as "the first group input".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    GroupInput,
    GroupOutput,
    Script,
    Composite,
    Plugin,
}

/// Trait for pluggable/user-defined nodes.
pub trait NodePlugin: DynClone + Send {
    /// Human-readable name of this node.
    fn name(&self) -> &str;

    fn kind(&self) -> NodeKind {
        NodeKind::Plugin
    }

    /// Slots (and their data) of this node.
    fn slots(&self) -> &SlotSet;

    fn slots_mut(&mut self) -> &mut SlotSet;

    /// Read the input slots and fill the output slots.
    fn run(&mut self, ctx: &mut NodeContext) -> PipelineResult<()>;

    /// Attach (`Some`) or release (`None`) the shared worker pool.
    fn set_worker_pool(&mut self, _pool: Option<WorkerPool>) {}
}

dyn_clone::clone_trait_object!(NodePlugin);

/// Enum dispatch for built-in nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuiltinNode {
    GroupInput(BoundaryNode),
    GroupOutput(BoundaryNode),
    Script(ScriptNode),
    Composite(Box<CompositeNode>),
}

impl BuiltinNode {
    pub fn name(&self) -> &str {
        match self {
            BuiltinNode::GroupInput(n) => n.name(),
            BuiltinNode::GroupOutput(n) => n.name(),
            BuiltinNode::Script(n) => n.name(),
            BuiltinNode::Composite(n) => n.name(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            BuiltinNode::GroupInput(_) => NodeKind::GroupInput,
            BuiltinNode::GroupOutput(_) => NodeKind::GroupOutput,
            BuiltinNode::Script(_) => NodeKind::Script,
            BuiltinNode::Composite(_) => NodeKind::Composite,
        }
    }

    pub fn slots(&self) -> &SlotSet {
        match self {
            BuiltinNode::GroupInput(n) => n.slots(),
            BuiltinNode::GroupOutput(n) => n.slots(),
            BuiltinNode::Script(n) => n.slots(),
            BuiltinNode::Composite(n) => n.slots(),
        }
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        match self {
            BuiltinNode::GroupInput(n) => n.slots_mut(),
            BuiltinNode::GroupOutput(n) => n.slots_mut(),
            BuiltinNode::Script(n) => n.slots_mut(),
            BuiltinNode::Composite(n) => n.slots_mut(),
        }
    }

    pub fn run(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        match self {
            BuiltinNode::GroupInput(n) => n.run(ctx),
            BuiltinNode::GroupOutput(n) => n.run(ctx),
            BuiltinNode::Script(n) => n.run(ctx),
            BuiltinNode::Composite(n) => n.run(ctx),
        }
    }

    pub fn set_worker_pool(&mut self, pool: Option<WorkerPool>) {
        match self {
            BuiltinNode::GroupInput(_) | BuiltinNode::GroupOutput(_) => {}
            BuiltinNode::Script(n) => n.set_worker_pool(pool),
            BuiltinNode::Composite(n) => n.set_worker_pool(pool),
        }
    }
}

/// Wrapper that holds either a built-in node (enum dispatch) or a plugin (trait object).
#[derive(Clone)]
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl std::fmt::Debug for AnyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyNode::Builtin(n) => f.debug_tuple("Builtin").field(n).finish(),
            AnyNode::Plugin(n) => f.debug_tuple("Plugin").field(&n.name()).finish(),
        }
    }
}

impl AnyNode {
    pub fn name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.name(),
            AnyNode::Plugin(n) => n.name(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            AnyNode::Builtin(n) => n.kind(),
            AnyNode::Plugin(n) => n.kind(),
        }
    }

    pub fn slots(&self) -> &SlotSet {
        match self {
            AnyNode::Builtin(n) => n.slots(),
            AnyNode::Plugin(n) => n.slots(),
        }
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        match self {
            AnyNode::Builtin(n) => n.slots_mut(),
            AnyNode::Plugin(n) => n.slots_mut(),
        }
    }

    pub fn run(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        match self {
            AnyNode::Builtin(n) => n.run(ctx),
            AnyNode::Plugin(n) => n.run(ctx),
        }
    }

    pub fn set_worker_pool(&mut self, pool: Option<WorkerPool>) {
        match self {
            AnyNode::Builtin(n) => n.set_worker_pool(pool),
            AnyNode::Plugin(n) => n.set_worker_pool(pool),
        }
    }

    pub fn as_boundary(&self) -> Option<&BoundaryNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::GroupInput(n) | BuiltinNode::GroupOutput(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_boundary_mut(&mut self) -> Option<&mut BoundaryNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::GroupInput(n) | BuiltinNode::GroupOutput(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::Composite(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut CompositeNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::Composite(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_builtin(&self) -> Option<&BuiltinNode> {
        match self {
            AnyNode::Builtin(n) => Some(n),
            AnyNode::Plugin(_) => None,
        }
    }
}

impl From<BuiltinNode> for AnyNode {
    fn from(node: BuiltinNode) -> Self {
        AnyNode::Builtin(node)
    }
}

impl From<Box<dyn NodePlugin>> for AnyNode {
    fn from(node: Box<dyn NodePlugin>) -> Self {
        AnyNode::Plugin(node)
    }
}

impl From<BoundaryNode> for AnyNode {
    fn from(node: BoundaryNode) -> Self {
        match node.role() {
            BoundaryRole::Input => AnyNode::Builtin(BuiltinNode::GroupInput(node)),
            BoundaryRole::Output => AnyNode::Builtin(BuiltinNode::GroupOutput(node)),
        }
    }
}

impl From<ScriptNode> for AnyNode {
    fn from(node: ScriptNode) -> Self {
        AnyNode::Builtin(BuiltinNode::Script(node))
    }
}

impl From<CompositeNode> for AnyNode {
    fn from(node: CompositeNode) -> Self {
        AnyNode::Builtin(BuiltinNode::Composite(Box::new(node)))
    }
}
