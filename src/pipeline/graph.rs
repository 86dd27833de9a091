//! Pipeline graph: nodes, slot-to-slot edges and structural mutation.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{EdgeId, NodeId, SlotRef};
use crate::pipeline::node::{AnyNode, BuiltinNode, NodeKind};
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::slot::SlotDirection;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An edge from an output slot to an input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: SlotRef,
    pub to: SlotRef,
}

/// The pipeline graph. Cloning deep-copies every node and its slot data.
#[derive(Debug, Clone, Default)]
pub struct PipelineGraph {
    /// `None` marks a removed node; ids are never reused.
    nodes: Vec<Option<AnyNode>>,
    edges: Vec<Edge>,
    next_edge_id: u32,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Nodes ──

    /// Add a node. Returns its NodeId.
    pub fn insert_node(&mut self, node: impl Into<AnyNode>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node.into()));
        id
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<AnyNode> {
        let node = self.nodes.get_mut(id.index())?.take()?;
        self.edges.retain(|e| e.from.node != id && e.to.node != id);
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&AnyNode> {
        self.nodes.get(id.index())?.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AnyNode> {
        self.nodes.get_mut(id.index())?.as_mut()
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &AnyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut AnyNode)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .filter_map(|(i, n)| n.as_mut().map(|n| (NodeId(i as u32), n)))
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|(id, _)| id).collect()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Size of the id space, including removed nodes.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// First live node of the given kind, by id order.
    pub fn find_first_node_of_kind(&self, kind: NodeKind) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.kind() == kind)
            .map(|(id, _)| id)
    }

    // ── Edges ──

    /// Connect an output slot to an input slot of a compatible type.
    pub fn connect(&mut self, from: SlotRef, to: SlotRef) -> PipelineResult<EdgeId> {
        let source_type = self
            .slot_descriptor(&from, SlotDirection::Output)?
            .data_type
            .clone();
        let target_type = self
            .slot_descriptor(&to, SlotDirection::Input)?
            .data_type
            .clone();

        if !target_type.accepts(&source_type) {
            return Err(PipelineError::SlotMismatch(format!(
                "{} ({}) cannot feed {} ({})",
                from, source_type, to, target_type
            )));
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(PipelineError::InvalidEdge(format!(
                "{} -> {} already exists",
                from, to
            )));
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.push(Edge { id, from, to });
        Ok(id)
    }

    /// Remove the edge between two slots. Returns whether it existed.
    pub fn disconnect(&mut self, from: &SlotRef, to: &SlotRef) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| !(&e.from == from && &e.to == to));
        self.edges.len() != before
    }

    /// Remove every edge touching `node` and return them.
    pub fn disconnect_all(&mut self, node: NodeId) -> Vec<Edge> {
        let (removed, kept) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.from.node == node || e.to.node == node);
        self.edges = kept;
        removed
    }

    /// Remove edges whose endpoint slot no longer exists and return them.
    pub fn prune_dangling_edges(&mut self) -> Vec<Edge> {
        let (kept, removed): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| {
                self.slot_descriptor(&e.from, SlotDirection::Output).is_ok()
                    && self.slot_descriptor(&e.to, SlotDirection::Input).is_ok()
            });
        self.edges = kept;
        for edge in &removed {
            tracing::debug!("Pruned dangling edge {} -> {}", edge.from, edge.to);
        }
        removed
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Output slots feeding the given input slot.
    pub fn incoming(&self, node: NodeId, slot: &str) -> Vec<SlotRef> {
        self.edges
            .iter()
            .filter(|e| e.to.node == node && e.to.slot == slot)
            .map(|e| e.from.clone())
            .collect()
    }

    /// Input slots fed by the given output slot.
    pub fn outgoing(&self, node: NodeId, slot: &str) -> Vec<SlotRef> {
        self.edges
            .iter()
            .filter(|e| e.from.node == node && e.from.slot == slot)
            .map(|e| e.to.clone())
            .collect()
    }

    fn slot_descriptor(
        &self,
        slot: &SlotRef,
        direction: SlotDirection,
    ) -> PipelineResult<&crate::pipeline::slot::SlotDescriptor> {
        let node = self
            .node(slot.node)
            .ok_or(PipelineError::UnknownNode(slot.node))?;
        node.slots()
            .slot(direction, &slot.slot)
            .map(|s| s.descriptor())
            .ok_or_else(|| PipelineError::UnknownSlot {
                node_id: slot.node,
                slot: slot.slot.clone(),
            })
    }

    // ── Data ──

    /// Drop all rows and orchestration flags from every node not in `exclude`.
    pub fn clear_slot_data(&mut self, exclude: &[NodeId]) {
        for (id, node) in self.nodes_mut() {
            if !exclude.contains(&id) {
                node.slots_mut().clear_data();
            }
        }
    }

    /// Total rows held by all slots of all nodes.
    pub fn row_count(&self) -> usize {
        self.nodes().map(|(_, n)| n.slots().row_count()).sum()
    }

    /// Attach or release the shared pool on every node.
    pub fn set_worker_pool(&mut self, pool: Option<WorkerPool>) {
        for (_, node) in self.nodes_mut() {
            node.set_worker_pool(pool.clone());
        }
    }

    // ── Persistence ──

    /// Serializable form of the graph. Fails if a plugin node is present.
    pub fn to_definition(&self) -> PipelineResult<GraphDefinition> {
        let nodes = self
            .nodes()
            .map(|(id, node)| match node.as_builtin() {
                Some(builtin) => Ok(NodeDefinition {
                    id,
                    node: builtin.clone(),
                }),
                None => Err(PipelineError::Serialization(format!(
                    "plugin node '{}' ({:?}) cannot be serialized",
                    node.name(),
                    id
                ))),
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        let edges = self
            .edges
            .iter()
            .map(|e| EdgeDefinition {
                from: e.from.clone(),
                to: e.to.clone(),
            })
            .collect();

        Ok(GraphDefinition { nodes, edges })
    }

    /// Rebuild a graph, keeping node ids. Edges are re-validated.
    pub fn from_definition(def: GraphDefinition) -> PipelineResult<Self> {
        let mut graph = PipelineGraph::new();
        for NodeDefinition { id, node } in def.nodes {
            if id.index() >= graph.nodes.len() {
                graph.nodes.resize_with(id.index() + 1, || None);
            }
            if graph.nodes[id.index()].is_some() {
                return Err(PipelineError::Serialization(format!(
                    "duplicate node id {:?}",
                    id
                )));
            }
            graph.nodes[id.index()] = Some(AnyNode::Builtin(node));
        }
        for edge in def.edges {
            graph.connect(edge.from, edge.to)?;
        }
        Ok(graph)
    }
}

/// A node entry in a [`GraphDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: NodeId,
    pub node: BuiltinNode,
}

/// An edge entry in a [`GraphDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub from: SlotRef,
    pub to: SlotRef,
}

/// Serializable graph structure (no slot data).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

impl Serialize for PipelineGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_definition()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let def = GraphDefinition::deserialize(deserializer)?;
        PipelineGraph::from_definition(def).map_err(serde::de::Error::custom)
    }
}
