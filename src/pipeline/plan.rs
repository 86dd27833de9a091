//! Execution plan: topological node order plus the producer/consumer
//! bookkeeping a run needs for input gathering and garbage collection.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::PipelineGraph;
use crate::pipeline::id::NodeId;
use std::collections::{BTreeSet, VecDeque};

/// Statistics about a built plan
#[derive(Debug, Clone, Default)]
pub struct PlanStats {
    /// Number of live nodes in the graph
    pub total_nodes: usize,

    /// Nodes without incoming edges
    pub source_nodes: usize,

    /// Nodes without outgoing edges
    pub sink_nodes: usize,

    /// Build time in microseconds
    pub build_time_us: u64,
}

/// Topologically ordered execution plan for one graph snapshot.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// Live nodes in execution order
    pub order: Vec<NodeId>,

    /// Distinct upstream nodes, indexed by `NodeId::index()`
    pub producers: Vec<Vec<NodeId>>,

    /// Number of distinct downstream nodes, indexed by `NodeId::index()`
    pub consumer_counts: Vec<usize>,

    pub stats: PlanStats,
}

impl ExecutionPlan {
    /// Build a plan with Kahn's algorithm. Ties are broken by node id so the
    /// order is deterministic across runs and across graph copies.
    pub fn build(graph: &PipelineGraph) -> PipelineResult<Self> {
        let start_time = std::time::Instant::now();
        let n = graph.node_capacity();

        let mut successors: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); n];
        let mut predecessors: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); n];
        for edge in graph.edges() {
            let (from, to) = (edge.from.node, edge.to.node);
            if from.index() < n && to.index() < n {
                successors[from.index()].insert(to);
                predecessors[to.index()].insert(from);
            }
        }

        let live: Vec<NodeId> = graph.node_ids();
        let mut in_degree = vec![0usize; n];
        for &id in &live {
            in_degree[id.index()] = predecessors[id.index()].len();
        }

        // Kahn's algorithm
        let mut queue: VecDeque<NodeId> = live
            .iter()
            .copied()
            .filter(|id| in_degree[id.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(live.len());

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &successors[node.index()] {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != live.len() {
            tracing::warn!(
                "Pipeline graph has a cycle! Only {} of {} nodes schedulable.",
                order.len(),
                live.len()
            );
            return Err(PipelineError::CycleDetected);
        }

        let stats = PlanStats {
            total_nodes: live.len(),
            source_nodes: live
                .iter()
                .filter(|id| predecessors[id.index()].is_empty())
                .count(),
            sink_nodes: live
                .iter()
                .filter(|id| successors[id.index()].is_empty())
                .count(),
            build_time_us: start_time.elapsed().as_micros() as u64,
        };

        Ok(Self {
            order,
            consumer_counts: successors.iter().map(BTreeSet::len).collect(),
            producers: predecessors
                .into_iter()
                .map(|p| p.into_iter().collect())
                .collect(),
            stats,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
