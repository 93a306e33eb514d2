//! Run orchestration: partition, spawn, join, drain to the sink.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

use entidades_shared::config::RunConfig;
use entidades_shared::error::Result;
use entidades_shared::session::SessionFactory;
use entidades_shared::sink::RecordSink;
use entidades_shared::types::OutputRecord;

use crate::partition::partition;
use crate::worker::BatchWorker;

/// Aggregate outcome of one harvest run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Sum of every worker's batch length.
    pub total_records: usize,
    pub worker_count: u32,
    pub total_pages: u32,
}

/// Progress callback for run status.
pub trait ProgressReporter: Send + Sync {
    /// Called once, before any worker starts.
    fn run_started(&self, total_pages: u32, worker_count: u32);
    /// Called as each worker settles, in completion order, with the running
    /// record total.
    fn worker_finished(&self, records_so_far: usize, settled: u32, total: u32);
    /// Called once, after the last worker has settled.
    fn done(&self, summary: &RunSummary);
}

/// No-op reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn run_started(&self, _total_pages: u32, _worker_count: u32) {}
    fn worker_finished(&self, _records_so_far: usize, _settled: u32, _total: u32) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full harvest: every page in `[1, total_pages]` split across the
/// worker pool, every batch appended to `sink` in worker-completion order.
///
/// Worker outcomes are independent: one that cannot acquire a session, or
/// whose task dies, contributes zero records and never cancels its siblings.
/// The only run-level failure mode below is the sink itself refusing writes.
#[instrument(skip_all, fields(total_pages = config.total_pages, workers = config.worker_count))]
pub async fn run<F, W>(
    config: Arc<RunConfig>,
    factory: Arc<F>,
    sink: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary>
where
    F: SessionFactory,
    W: RecordSink,
{
    config.validate()?;

    let ranges = partition(config.total_pages, config.worker_count);
    progress.run_started(config.total_pages, config.worker_count);
    info!("starting harvest");

    let mut tasks: JoinSet<(u32, Vec<OutputRecord>)> = JoinSet::new();
    for range in ranges {
        let config = Arc::clone(&config);
        let factory = Arc::clone(&factory);

        tasks.spawn(async move {
            if range.is_empty() {
                debug!(worker = range.worker_id, "empty range, nothing to do");
                return (range.worker_id, Vec::new());
            }

            match factory.open(range.worker_id).await {
                Ok(session) => {
                    let records = BatchWorker::new(session, config, range).run().await;
                    (range.worker_id, records)
                }
                Err(err) => {
                    error!(
                        worker = range.worker_id,
                        error = %err,
                        "could not acquire a browsing session"
                    );
                    (range.worker_id, Vec::new())
                }
            }
        });
    }

    let mut settled = 0u32;
    let mut total_records = 0usize;

    while let Some(joined) = tasks.join_next().await {
        settled += 1;
        match joined {
            Ok((worker_id, records)) => {
                sink.append_batch(&records)?;
                total_records += records.len();
                info!(worker = worker_id, records = records.len(), "worker settled");
            }
            Err(err) => {
                error!(error = %err, "worker task died");
            }
        }
        progress.worker_finished(total_records, settled, config.worker_count);
    }

    let summary = RunSummary {
        total_records,
        worker_count: config.worker_count,
        total_pages: config.total_pages,
    };
    info!(total_records, "harvest complete");
    progress.done(&summary);

    Ok(summary)
}
