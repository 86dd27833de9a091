//! subflow-rs - Main Entry Point
//!
//! Loads a project file, runs its pipeline once and reports what every
//! node produced.
//!
//! ```text
//! subflow-rs <project.subflow.json>
//! ```

use anyhow::Context;
use subflow_rs::{
    composite::CompositeNode,
    config::{EngineSettings, ProjectFile},
    pipeline::{GraphRun, ProgressInfo, RunContext, WorkerPool},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise logging. The returned guard flushes the log file on drop.
fn init_logging(settings: &EngineSettings) -> Option<WorkerGuard> {
    let (file_layer, guard) = if settings.log_to_file {
        match settings.resolved_log_directory() {
            Ok(dir) => {
                let appender = tracing_appender::rolling::daily(dir, "subflow.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (
                    Some(fmt::layer().with_writer(writer).with_ansi(false)),
                    Some(guard),
                )
            }
            Err(e) => {
                eprintln!("File logging disabled: {}", e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    let Some(project_path) = std::env::args().nth(1) else {
        eprintln!("Usage: subflow-rs <project.subflow.json>");
        std::process::exit(2);
    };

    let settings = EngineSettings::load_or_default();
    let _log_guard = init_logging(&settings);

    tracing::info!("Starting subflow-rs {}", env!("CARGO_PKG_VERSION"));

    let mut project = ProjectFile::load(&project_path)
        .with_context(|| format!("Failed to load project {}", project_path))?;
    project
        .inject_inputs()
        .context("Failed to inject project inputs")?;

    let pool = WorkerPool::new(settings.worker_threads);
    let context = RunContext::new(project.run.clone())
        .with_partitions(project.partitions.clone())
        .with_worker_pool(pool);

    let progress = ProgressInfo::new(if project.name.is_empty() {
        "run".to_string()
    } else {
        project.name.clone()
    });
    let report = GraphRun::new(&mut project.graph, &context, progress)
        .run()
        .context("Pipeline run failed")?;

    tracing::info!(
        "Executed {} nodes in {:.2}s",
        report.executed,
        report.elapsed.as_secs_f64()
    );

    for (id, node) in project.graph.nodes() {
        for slot in node.slots().outputs().iter().filter(|s| !s.is_empty()) {
            tracing::info!("{:?} '{}' / {}: {} rows", id, node.name(), slot.name(), slot.len());
        }
        if let Some(summary) = node.as_composite().and_then(CompositeNode::last_run_summary) {
            tracing::info!(
                "{:?} '{}': {} of {} steps succeeded, {} failed, {} incomplete skipped",
                id,
                node.name(),
                summary.succeeded,
                summary.total_steps,
                summary.failed.len(),
                summary.skipped_incomplete
            );
        }
    }

    Ok(())
}
