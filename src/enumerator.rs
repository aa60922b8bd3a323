//! Group enumeration: the producer side of the pipeline
//!
//! Pages through the public group search and hands every group to the worker
//! pool over the rendezvous channel, in listing order. The channel is closed when
//! the listing ends, whether it ended normally or was given up on.

use crate::config::Config;
use crate::fetch::{Endpoint, PageFetcher, RequestProfile};
use crate::paginate::Paginator;
use crate::rendezvous::{SendError, WorkSender};
use crate::retry::Backoff;
use crate::types::Group;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How the group listing ended
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListingOutcome {
    /// Groups handed to workers
    pub groups_published: usize,
    /// Listing pages received
    pub pages: usize,
    /// False if the listing stopped before the end-of-listing sentinel
    pub complete: bool,
}

/// Producer that walks the group search
pub struct GroupEnumerator {
    config: Arc<Config>,
    endpoint: Endpoint,
    fetcher: PageFetcher,
}

impl GroupEnumerator {
    /// Create an enumerator on the shared client
    pub fn new(client: reqwest::Client, config: Arc<Config>, endpoint: Endpoint) -> Self {
        let fetcher = PageFetcher::new(client, &config, RequestProfile::Listing);
        Self {
            config,
            endpoint,
            fetcher,
        }
    }

    /// Publish every listed group, then close the channel
    ///
    /// A failed page is re-requested at the same cursor according to the
    /// `listing_retry` policy. When that policy gives up (or the reply cannot be
    /// decoded) the listing stops early and the outcome is marked incomplete.
    pub async fn run(mut self, mut work: WorkSender<Group>) -> ListingOutcome {
        let mut backoff = Backoff::new(&self.config.listing_retry);
        let endpoint = &self.endpoint;
        let mut pages = Paginator::new(&mut self.fetcher, |start| endpoint.group_search(start));

        let mut published = 0;
        let mut complete = true;

        while let Some(result) = pages.next_page().await {
            match result {
                Ok(page) => {
                    backoff.reset();
                    let groups = page.into_groups();
                    debug!(groups = groups.len(), next = ?pages.cursor(), "group page received");

                    for group in groups {
                        if let Err(SendError(group)) = work.send(group).await {
                            warn!(group_id = %group.id, "no workers left to take groups");
                            complete = false;
                            pages.abandon();
                            break;
                        }
                        published += 1;
                    }
                }
                Err(e) => {
                    warn!(url = %e.url(), error = %e, "group listing request failed");
                    if !backoff.retry(&e).await {
                        error!(url = %e.url(), "giving up on group listing");
                        complete = false;
                        pages.abandon();
                    }
                }
            }
        }

        let page_count = pages.pages();
        work.close();

        info!(
            groups = published,
            pages = page_count,
            complete,
            "group listing finished"
        );

        ListingOutcome {
            groups_published: published,
            pages: page_count,
            complete,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::fetch::build_client;
    use crate::rendezvous;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn group_page(ids: &[&str], next_start: i64) -> String {
        let results: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({"id": id, "title": id.to_uppercase(), "owner": "admin"}))
            .collect();
        serde_json::json!({
            "query": "access:public",
            "total": 5,
            "start": 1,
            "num": 2,
            "nextStart": next_start,
            "results": results
        })
        .to_string()
    }

    fn fast_retry(max_attempts: Option<u32>) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    fn enumerator_for(server: &MockServer, retry: RetryConfig) -> GroupEnumerator {
        let config = Config {
            page_size: 2,
            listing_retry: retry,
            ..Config::new(server.uri())
        };
        let client = build_client(&config.http).unwrap();
        let endpoint = Endpoint::new(server.uri(), config.page_size);
        GroupEnumerator::new(client, Arc::new(config), endpoint)
    }

    async fn mount_listing(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/community/groups"))
            .and(query_param("start", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(group_page(&["c", "d"], 5)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/community/groups"))
            .and(query_param("start", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(group_page(&["e"], -1)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/community/groups"))
            .and(query_param("q", "access:public"))
            .and(query_param("sortField", "title"))
            .respond_with(ResponseTemplate::new(200).set_body_string(group_page(&["a", "b"], 3)))
            .with_priority(10)
            .mount(server)
            .await;
    }

    async fn collect(rx: rendezvous::WorkReceiver<Group>) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(group) = rx.recv().await {
            ids.push(group.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_publishes_all_pages_in_order_then_closes() {
        let mock_server = MockServer::start().await;
        mount_listing(&mock_server).await;

        let (tx, rx) = rendezvous::channel();
        let enumerator = enumerator_for(&mock_server, fast_retry(Some(0)));
        let producer = tokio::spawn(enumerator.run(tx));

        let ids = collect(rx.clone()).await;
        let outcome = producer.await.unwrap();

        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(
            outcome,
            ListingOutcome {
                groups_published: 5,
                pages: 3,
                complete: true
            }
        );
        assert!(rx.is_closed());
    }

    #[tokio::test]
    async fn test_retries_same_cursor_after_transport_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/community/groups"))
            .and(query_param("start", "3"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&mock_server)
            .await;
        mount_listing(&mock_server).await;

        let (tx, rx) = rendezvous::channel();
        let enumerator = enumerator_for(&mock_server, fast_retry(Some(5)));
        let producer = tokio::spawn(enumerator.run(tx));

        let ids = collect(rx).await;
        let outcome = producer.await.unwrap();

        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert!(outcome.complete);

        let requests = mock_server.received_requests().await.unwrap();
        let second_page_requests = requests
            .iter()
            .filter(|r| r.url.query().is_some_and(|q| q.contains("start=3")))
            .count();
        assert_eq!(second_page_requests, 3);
    }

    #[tokio::test]
    async fn test_gives_up_when_retries_exhausted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/community/groups"))
            .and(query_param("start", "3"))
            .respond_with(ResponseTemplate::new(502))
            .with_priority(1)
            .mount(&mock_server)
            .await;
        mount_listing(&mock_server).await;

        let (tx, rx) = rendezvous::channel();
        let enumerator = enumerator_for(&mock_server, fast_retry(Some(2)));
        let producer = tokio::spawn(enumerator.run(tx));

        let ids = collect(rx).await;
        let outcome = producer.await.unwrap();

        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(outcome.groups_published, 2);
        assert!(!outcome.complete);
    }

    #[tokio::test]
    async fn test_undecodable_listing_stops_without_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/community/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"error\": "))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (tx, rx) = rendezvous::channel();
        let enumerator = enumerator_for(&mock_server, fast_retry(None));
        let producer = tokio::spawn(enumerator.run(tx));

        assert!(collect(rx).await.is_empty());
        let outcome = producer.await.unwrap();
        assert_eq!(outcome.pages, 0);
        assert!(!outcome.complete);
    }

    #[tokio::test]
    async fn test_stops_when_all_workers_gone() {
        let mock_server = MockServer::start().await;
        mount_listing(&mock_server).await;

        let (tx, rx) = rendezvous::channel();
        drop(rx);

        let outcome = enumerator_for(&mock_server, fast_retry(Some(0)))
            .run(tx)
            .await;
        assert_eq!(outcome.groups_published, 0);
        assert!(!outcome.complete);
    }
}
