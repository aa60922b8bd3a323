//! Group workers: the consumer side of the pipeline
//!
//! Each worker pulls one group at a time off the rendezvous channel and pages
//! through that group's user list, emitting a record per admitted member. A
//! failed page ends work on that group only; the worker moves straight on to
//! the next one.

use crate::config::Config;
use crate::fetch::{Endpoint, PageFetcher, RequestProfile};
use crate::paginate::Paginator;
use crate::rendezvous::WorkReceiver;
use crate::sink::RecordSink;
use crate::types::{Group, OutputRecord};
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters kept by one worker
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Groups taken off the channel
    pub groups_processed: usize,
    /// Groups whose user list could not be read to the end
    pub groups_failed: usize,
    /// Records handed to the sink
    pub records_emitted: usize,
    /// Members dropped as system accounts
    pub records_suppressed: usize,
}

/// Result of paging through one group's user list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Every page was read
    Complete {
        /// Records emitted for the group
        records: usize,
    },
    /// A page failed; earlier pages' records were already emitted
    Abandoned {
        /// Records emitted before the failure
        records: usize,
    },
}

/// One consumer of the group channel
pub struct GroupWorker {
    id: usize,
    config: Arc<Config>,
    endpoint: Endpoint,
    fetcher: PageFetcher,
    sink: Arc<dyn RecordSink>,
}

impl GroupWorker {
    /// Create a worker on the shared client
    pub fn new(
        id: usize,
        client: reqwest::Client,
        config: Arc<Config>,
        endpoint: Endpoint,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        let fetcher = PageFetcher::new(client, &config, RequestProfile::Members);
        Self {
            id,
            config,
            endpoint,
            fetcher,
            sink,
        }
    }

    /// Process groups until the channel is closed and drained
    pub async fn run(mut self, work: WorkReceiver<Group>) -> WorkerStats {
        let mut stats = WorkerStats::default();

        while let Some(group) = work.recv().await {
            stats.groups_processed += 1;
            if let GroupOutcome::Abandoned { .. } = self.process_group(&group, &mut stats).await {
                stats.groups_failed += 1;
            }
        }

        debug!(worker = self.id, ?stats, "worker finished");
        stats
    }

    /// Page through one group's members and emit their records
    pub async fn process_group(&mut self, group: &Group, stats: &mut WorkerStats) -> GroupOutcome {
        if self.config.verbose {
            debug!(
                worker = self.id,
                group_id = %group.id,
                title = group.title.as_deref().unwrap_or(""),
                "processing group"
            );
        }

        let endpoint = &self.endpoint;
        let mut pages = Paginator::new(&mut self.fetcher, |start| {
            endpoint.user_list(&group.id, start)
        });
        let mut records = 0;

        while let Some(result) = pages.next_page().await {
            match result {
                Ok(page) => {
                    for member in page.into_members() {
                        if self.config.admits(&member.username) {
                            self.sink.emit(&OutputRecord::new(group, member));
                            records += 1;
                        } else {
                            stats.records_suppressed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        group_id = %group.id,
                        url = %e.url(),
                        error = %e,
                        "could not read user list, skipping rest of group"
                    );
                    stats.records_emitted += records;
                    return GroupOutcome::Abandoned { records };
                }
            }
        }

        stats.records_emitted += records;
        GroupOutcome::Complete { records }
    }
}
