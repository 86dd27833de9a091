//! Mock construction helpers

use mockall::mock;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use subflow_rs::config::{ContinueOnFailureSettings, PartitionLookup};
use subflow_rs::pipeline::{
    DataType, NodeContext, NodePlugin, PipelineError, PipelineResult, SlotDescriptor, SlotSet,
    WorkerPool,
};

mock! {
    pub Partitions {}

    impl PartitionLookup for Partitions {
        fn partition_name(&self, index: usize) -> String;
        fn continue_on_failure_settings(&self, index: usize) -> ContinueOnFailureSettings;
    }
}

/// Partition lookup that answers every index with `settings`
pub fn partitions_with(settings: ContinueOnFailureSettings) -> MockPartitions {
    let mut partitions = MockPartitions::new();
    partitions
        .expect_partition_name()
        .return_const("Mocked".to_string());
    partitions
        .expect_continue_on_failure_settings()
        .return_const(settings);
    partitions
}

fn plugin_slots() -> SlotSet {
    let mut slots = SlotSet::new();
    slots
        .rebuild(
            vec![SlotDescriptor::input("Input", DataType::any())],
            vec![SlotDescriptor::output("Output", DataType::any())],
        )
        .expect("plugin slots");
    slots
}

/// What a [`TestNode`] does when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBehavior {
    /// Emit one row per input row whose item is the number of runs so far
    CountRuns,
    /// Emit one row describing the run configuration it saw
    ReportContext,
    /// Cancel the run, then fail
    CancelRun,
    /// Pass rows through, failing on the given (1-based) run
    FailOnRun(usize),
}

/// Plugin node for observing how nested runs are driven
#[derive(Clone)]
pub struct TestNode {
    behavior: TestBehavior,
    slots: SlotSet,
    runs: usize,
    has_pool: bool,
    /// Shared by every copy of the node
    total_runs: Arc<AtomicUsize>,
}

impl TestNode {
    pub fn new(behavior: TestBehavior) -> Box<dyn NodePlugin> {
        Self::counted(behavior).0
    }

    /// Like [`TestNode::new`], also returning a counter of runs across all
    /// copies of the node
    pub fn counted(behavior: TestBehavior) -> (Box<dyn NodePlugin>, Arc<AtomicUsize>) {
        let total_runs = Arc::new(AtomicUsize::new(0));
        let node = Box::new(Self {
            behavior,
            slots: plugin_slots(),
            runs: 0,
            has_pool: false,
            total_runs: Arc::clone(&total_runs),
        });
        (node, total_runs)
    }
}

impl NodePlugin for TestNode {
    fn name(&self) -> &str {
        "Test node"
    }

    fn slots(&self) -> &SlotSet {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    fn run(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        self.runs += 1;
        let run = self.total_runs.fetch_add(1, Ordering::SeqCst) + 1;
        let (inputs, outputs) = self.slots.split_mut();
        let input = &inputs[0];
        let output = &mut outputs[0];

        match self.behavior {
            TestBehavior::CountRuns => {
                for row in input.rows() {
                    let mut counted = row.clone();
                    counted.item = json!(self.runs).into();
                    output.push_row(counted);
                }
            }
            TestBehavior::ReportContext => {
                let config = &ctx.run.config;
                let mut report = input.rows().first().cloned().ok_or_else(|| {
                    PipelineError::Node {
                        node_id: ctx.node_id,
                        message: "no input rows".to_string(),
                    }
                })?;
                report.item = json!({
                    "load_from_cache": config.load_from_cache,
                    "store_to_cache": config.store_to_cache,
                    "store_to_disk": config.store_to_disk,
                    "continue_on_failure": config.continue_on_failure,
                    "export_failed_inputs": config.export_failed_inputs,
                    "worker_pool": self.has_pool,
                })
                .into();
                output.push_row(report);
            }
            TestBehavior::CancelRun => {
                ctx.run.cancellation.cancel();
                return Err(PipelineError::Script("cancelled from inside".to_string()));
            }
            TestBehavior::FailOnRun(failing) => {
                if run == failing {
                    return Err(PipelineError::Script(format!("failed on run {}", run)));
                }
                output.add_data_from_slot(input);
            }
        }
        Ok(())
    }

    fn set_worker_pool(&mut self, pool: Option<WorkerPool>) {
        self.has_pool = pool.is_some();
    }
}
