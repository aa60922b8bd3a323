//! Wiring of the enumerator and the worker pool

use crate::config::Config;
use crate::enumerator::{GroupEnumerator, ListingOutcome};
use crate::error::Result;
use crate::fetch::{Endpoint, build_client};
use crate::rendezvous;
use crate::sink::RecordSink;
use crate::worker::{GroupWorker, WorkerStats};
use std::sync::Arc;
use tracing::{error, info};

/// Totals for a whole run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Groups published by the enumerator
    pub groups_discovered: usize,
    /// Groups taken by workers
    pub groups_processed: usize,
    /// Groups whose user list was abandoned
    pub groups_failed: usize,
    /// Records handed to the sink
    pub records_emitted: usize,
    /// System-account members left out
    pub records_suppressed: usize,
    /// False if the group listing stopped early
    pub listing_complete: bool,
    /// Worker tasks that panicked
    pub workers_lost: usize,
}

impl RunSummary {
    fn absorb(&mut self, stats: WorkerStats) {
        self.groups_processed += stats.groups_processed;
        self.groups_failed += stats.groups_failed;
        self.records_emitted += stats.records_emitted;
        self.records_suppressed += stats.records_suppressed;
    }
}

/// Dump every public group's membership into `sink`
///
/// Returns once the group listing has ended and every worker has drained the
/// channel. Failed page requests are logged and skipped; only an invalid
/// configuration or an HTTP client that cannot be built is an error.
pub async fn run(config: Config, sink: Arc<dyn RecordSink>) -> Result<RunSummary> {
    let root = config.validate()?;
    let client = build_client(&config.http)?;
    drive(config, root, client, sink).await
}

/// Like [`run`], on a caller-supplied HTTP client
pub async fn run_with_client(
    config: Config,
    client: reqwest::Client,
    sink: Arc<dyn RecordSink>,
) -> Result<RunSummary> {
    let root = config.validate()?;
    drive(config, root, client, sink).await
}

async fn drive(
    config: Config,
    root: String,
    client: reqwest::Client,
    sink: Arc<dyn RecordSink>,
) -> Result<RunSummary> {
    let worker_count = config.worker_count();
    info!(portal = %root, workers = worker_count, "starting membership dump");

    let config = Arc::new(config);
    let endpoint = Endpoint::new(root, config.page_size);
    let (work_tx, work_rx) = rendezvous::channel();

    let enumerator = GroupEnumerator::new(client.clone(), config.clone(), endpoint.clone());
    let listing = tokio::spawn(enumerator.run(work_tx));

    let workers: Vec<_> = (0..worker_count)
        .map(|id| {
            let worker = GroupWorker::new(
                id,
                client.clone(),
                config.clone(),
                endpoint.clone(),
                sink.clone(),
            );
            tokio::spawn(worker.run(work_rx.clone()))
        })
        .collect();
    // workers hold the only receivers, so a dead pool unblocks the enumerator
    drop(work_rx);

    let mut summary = RunSummary::default();
    for result in futures::future::join_all(workers).await {
        match result {
            Ok(stats) => summary.absorb(stats),
            Err(e) => {
                error!(error = %e, "worker task failed");
                summary.workers_lost += 1;
            }
        }
    }

    let outcome = match listing.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "group enumerator task failed");
            ListingOutcome::default()
        }
    };
    summary.groups_discovered = outcome.groups_published;
    summary.listing_complete = outcome.complete;

    info!(
        groups = summary.groups_processed,
        failed = summary.groups_failed,
        records = summary.records_emitted,
        suppressed = summary.records_suppressed,
        complete = summary.listing_complete,
        "membership dump finished"
    );

    Ok(summary)
}
