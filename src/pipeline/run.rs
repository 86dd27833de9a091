//! Graph runs.
//!
//! A [`GraphRun`] executes one graph in plan order. For every node it
//! gathers input rows from upstream outputs, runs the node, and then
//! releases intermediate data that no consumer needs anymore. The shared
//! worker pool is lent to the graph's nodes only for the duration of the run.

use crate::config::{RunConfiguration, RuntimePartitionRegistry};
use crate::pipeline::data::DataRow;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::PipelineGraph;
use crate::pipeline::id::NodeId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::plan::{ExecutionPlan, PlanStats};
use crate::pipeline::pool::WorkerPool;
use serde::Serialize;
use std::fmt::Display;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ==================== Cancellation ====================

/// Cooperative cancellation flag shared by a run and all its nested runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ==================== Run Context ====================

/// Everything a node can see of the run it executes in.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub config: RunConfiguration,
    pub partitions: Arc<RuntimePartitionRegistry>,
    pub cancellation: CancellationToken,
    /// Borrowed pool; `None` runs everything on the calling thread.
    pub worker_pool: Option<WorkerPool>,
}

impl RunContext {
    pub fn new(config: RunConfiguration) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_partitions(mut self, partitions: RuntimePartitionRegistry) -> Self {
        self.partitions = Arc::new(partitions);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_worker_pool(mut self, pool: WorkerPool) -> Self {
        self.worker_pool = Some(pool);
        self
    }

    /// Context for a nested run. Partitions and cancellation are shared.
    pub fn nested(&self, config: RunConfiguration, worker_pool: Option<WorkerPool>) -> Self {
        Self {
            config,
            partitions: Arc::clone(&self.partitions),
            cancellation: self.cancellation.clone(),
            worker_pool,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn check_cancelled(&self) -> PipelineResult<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ==================== Progress ====================

/// Hierarchical progress reporter. Every message carries the path of
/// nodes and steps that led to it, e.g. `run > Segment > step 3`.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    prefix: String,
    current: usize,
    max: usize,
}

impl ProgressInfo {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            current: 0,
            max: 0,
        }
    }

    /// Child reporter one level below this one.
    pub fn resolve(&self, name: &str) -> Self {
        let prefix = if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{} > {}", self.prefix, name)
        };
        Self::new(prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_progress(&mut self, current: usize, max: usize) {
        self.current = current;
        self.max = max;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn log(&self, message: impl Display) {
        tracing::info!("[{}] {}", self.prefix, message);
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!("[{}] {}", self.prefix, message);
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!("[{}] {}", self.prefix, message);
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!("[{}] {}", self.prefix, message);
    }

    pub fn log_progress(&mut self, current: usize, max: usize, message: impl Display) {
        self.set_progress(current, max);
        let percent = if max == 0 {
            100.0
        } else {
            current as f64 * 100.0 / max as f64
        };
        tracing::info!(
            "[{}] [{}/{} {:.0}%] {}",
            self.prefix,
            current,
            max,
            percent,
            message
        );
    }
}

/// Linear remaining-time estimate from the average duration of finished units.
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    started: Instant,
}

impl EtaEstimator {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Remaining time after `done` of `total` units, `None` before the first one.
    pub fn update(&self, done: usize, total: usize) -> Option<Duration> {
        Self::estimate(self.elapsed(), done, total)
    }

    fn estimate(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
        if done == 0 {
            return None;
        }
        let remaining = total.saturating_sub(done) as u32;
        let per_unit = elapsed / done as u32;
        Some(per_unit * remaining)
    }
}

// ==================== Worker Pool Lease ====================

/// Lends a pool to every node of a graph and takes it back on drop, so the
/// pool is released on success, error and unwinding alike.
pub(crate) struct PoolLease<'g> {
    graph: &'g mut PipelineGraph,
}

impl<'g> PoolLease<'g> {
    pub(crate) fn attach(graph: &'g mut PipelineGraph, pool: Option<WorkerPool>) -> Self {
        graph.set_worker_pool(pool);
        Self { graph }
    }
}

impl Deref for PoolLease<'_> {
    type Target = PipelineGraph;

    fn deref(&self) -> &PipelineGraph {
        self.graph
    }
}

impl DerefMut for PoolLease<'_> {
    fn deref_mut(&mut self) -> &mut PipelineGraph {
        self.graph
    }
}

impl Drop for PoolLease<'_> {
    fn drop(&mut self) {
        self.graph.set_worker_pool(None);
    }
}

// ==================== Graph Run ====================

/// Outcome of a successful run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub executed: usize,
    pub elapsed: Duration,
    pub plan: PlanStats,
}

/// One execution of a graph.
pub struct GraphRun<'g> {
    graph: &'g mut PipelineGraph,
    context: &'g RunContext,
    progress: ProgressInfo,
}

impl<'g> GraphRun<'g> {
    pub fn new(graph: &'g mut PipelineGraph, context: &'g RunContext, progress: ProgressInfo) -> Self {
        Self {
            graph,
            context,
            progress,
        }
    }

    pub fn run(self) -> PipelineResult<RunReport> {
        let start_time = Instant::now();
        let plan = ExecutionPlan::build(self.graph)?;
        let gc = self.context.config.gc_intermediate;
        let mut pending_consumers = plan.consumer_counts.clone();

        let mut graph = PoolLease::attach(self.graph, self.context.worker_pool.clone());

        for &node_id in &plan.order {
            self.context.check_cancelled()?;
            gather_inputs(&mut graph, node_id)?;

            let node = graph
                .node_mut(node_id)
                .ok_or(PipelineError::UnknownNode(node_id))?;
            let node_progress = self.progress.resolve(node.name());
            let mut ctx = NodeContext {
                node_id,
                run: self.context,
                progress: &node_progress,
            };
            node.run(&mut ctx).map_err(|e| PipelineError::NodeFailed {
                node_id,
                name: node.name().to_string(),
                source: Box::new(e),
            })?;

            if gc {
                collect_garbage(&mut graph, &plan, node_id, &mut pending_consumers);
            }
        }

        if let (true, Some(dir)) = (
            self.context.config.store_to_disk,
            self.context.config.output_path.as_deref(),
        ) {
            let written = store_outputs(&graph, dir)?;
            self.progress
                .debug(format_args!("Stored {} output slots below {}", written, dir.display()));
        }

        let report = RunReport {
            executed: plan.order.len(),
            elapsed: start_time.elapsed(),
            plan: plan.stats,
        };
        self.progress.debug(format_args!(
            "Executed {} nodes in {:?}",
            report.executed, report.elapsed
        ));
        Ok(report)
    }
}

/// Replace the rows of every connected input slot of `node_id` with the rows
/// of its upstream outputs. Slots flagged `skip_data_gathering` and slots
/// without incoming edges keep their rows.
fn gather_inputs(graph: &mut PipelineGraph, node_id: NodeId) -> PipelineResult<()> {
    let node = graph
        .node(node_id)
        .ok_or(PipelineError::UnknownNode(node_id))?;

    let mut gathered: Vec<(String, Vec<DataRow>)> = Vec::new();
    for slot in node.slots().inputs() {
        if slot.skip_data_gathering() {
            continue;
        }
        let sources = graph.incoming(node_id, slot.name());
        if sources.is_empty() {
            continue;
        }
        let rows = sources
            .iter()
            .filter_map(|source| {
                graph
                    .node(source.node)
                    .and_then(|n| n.slots().output(&source.slot))
            })
            .flat_map(|output| output.rows().iter().cloned())
            .collect();
        gathered.push((slot.name().to_string(), rows));
    }

    let node = graph
        .node_mut(node_id)
        .ok_or(PipelineError::UnknownNode(node_id))?;
    for (name, rows) in gathered {
        if let Some(slot) = node.slots_mut().input_mut(&name) {
            slot.clear();
            for row in rows {
                slot.push_row(row);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StoredRow<'a> {
    item: &'a serde_json::Value,
    text_annotations: &'a crate::pipeline::TextAnnotations,
    data_annotations: &'a crate::pipeline::DataAnnotations,
}

/// Write every non-empty output slot to `<dir>/<node index>-<slot>.json`.
/// Returns the number of files written.
pub fn store_outputs(graph: &PipelineGraph, dir: &Path) -> PipelineResult<usize> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;
    for (id, node) in graph.nodes() {
        for slot in node.slots().outputs().iter().filter(|s| !s.is_empty()) {
            let rows: Vec<StoredRow> = slot
                .rows()
                .iter()
                .map(|row| StoredRow {
                    item: row.item.value(),
                    text_annotations: &row.text_annotations,
                    data_annotations: &row.data_annotations,
                })
                .collect();
            let file_name: String = format!("{}-{}.json", id.index(), slot.name())
                .chars()
                .map(|c| if c == '/' || c == '\\' { '_' } else { c })
                .collect();
            std::fs::write(dir.join(file_name), serde_json::to_string_pretty(&rows)?)?;
            written += 1;
        }
    }
    Ok(written)
}

fn collect_garbage(
    graph: &mut PipelineGraph,
    plan: &ExecutionPlan,
    node_id: NodeId,
    pending_consumers: &mut [usize],
) {
    if let Some(node) = graph.node_mut(node_id) {
        for slot in node.slots_mut().inputs_mut() {
            if !slot.skip_gc() {
                slot.clear();
            }
        }
    }

    for &producer in &plan.producers[node_id.index()] {
        let pending = &mut pending_consumers[producer.index()];
        *pending = pending.saturating_sub(1);
        if *pending > 0 {
            continue;
        }
        if let Some(node) = graph.node_mut(producer) {
            for slot in node.slots_mut().outputs_mut() {
                if !slot.skip_gc() {
                    slot.clear();
                }
            }
            tracing::trace!("Released outputs of {:?}", producer);
        }
    }
}
