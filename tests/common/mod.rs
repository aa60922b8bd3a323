//! Fake portal for pipeline tests

#![allow(dead_code)]

use portal_members::{Config, RetryConfig};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Join time reported for every fake member
pub const JOINED_MS: i64 = 1_500_000_000_000;

/// A mock portal REST root
pub struct FakePortal {
    pub server: MockServer,
}

impl FakePortal {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Config pointing at this portal, with fast listing retries
    pub fn config(&self, workers: usize) -> Config {
        Config {
            workers,
            listing_retry: RetryConfig {
                max_attempts: Some(3),
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                backoff_multiplier: 2.0,
                jitter: false,
            },
            ..Config::new(self.uri())
        }
    }

    /// Serve the group search as the given pages of group ids
    pub async fn groups(&self, pages: &[&[&str]]) {
        let bodies: Vec<String> = paged(pages, |ids, start, next| {
            let results: Vec<_> = ids
                .iter()
                .map(|id| serde_json::json!({"id": id, "title": format!("Group {}", id), "owner": "admin"}))
                .collect();
            envelope(start, next, "results", serde_json::Value::Array(results))
        });
        self.mount_pages("/community/groups".to_string(), bodies)
            .await;
    }

    /// Serve a group's user list as pages of (username, full name)
    pub async fn members(&self, group_id: &str, pages: &[&[(&str, &str)]]) {
        let bodies: Vec<String> = paged(pages, |users, start, next| {
            let users: Vec<_> = users
                .iter()
                .map(|(username, full_name)| {
                    serde_json::json!({
                        "username": username,
                        "fullName": full_name,
                        "memberType": "member",
                        "joined": JOINED_MS
                    })
                })
                .collect();
            envelope(start, next, "users", serde_json::Value::Array(users))
        });
        self.mount_pages(user_list_path(group_id), bodies).await;
    }

    /// Make a group's user list answer with an error status
    pub async fn failing_members(&self, group_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(user_list_path(group_id)))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    async fn mount_pages(&self, list_path: String, bodies: Vec<String>) {
        let starts = start_indexes(bodies.len());
        for (i, body) in bodies.into_iter().enumerate() {
            let mock = Mock::given(method("GET")).and(path(list_path.clone()));
            let mock = if i == 0 {
                // the first request carries no start parameter
                mock.respond_with(json_response(body)).with_priority(10)
            } else {
                mock.and(query_param("start", starts[i].to_string()))
                    .respond_with(json_response(body))
            };
            mock.mount(&self.server).await;
        }
    }

    /// Requests received so far on a path containing `path_part` whose query contains `needle`
    pub async fn requests_matching(&self, path_part: &str, needle: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().contains(path_part))
            .filter(|r| r.url.query().unwrap_or("").contains(needle))
            .count()
    }
}

pub fn user_list_path(group_id: &str) -> String {
    format!("/community/groups/{}/userList", group_id)
}

pub fn json_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "application/json")
        .set_body_string(body)
}

// Cursors are 1-based like the portal's: page i starts at 1 + 100 * i
fn start_indexes(count: usize) -> Vec<u64> {
    (0..count).map(|i| 1 + 100 * i as u64).collect()
}

fn paged<T>(pages: &[&[T]], body: impl Fn(&[T], u64, i64) -> String) -> Vec<String> {
    let starts = start_indexes(pages.len());
    pages
        .iter()
        .enumerate()
        .map(|(i, items)| {
            let next = starts.get(i + 1).map_or(-1, |s| *s as i64);
            body(items, starts[i], next)
        })
        .collect()
}

fn envelope(start: u64, next: i64, key: &str, items: serde_json::Value) -> String {
    let mut value = serde_json::json!({
        "total": 0,
        "start": start,
        "num": 100,
        "nextStart": next,
    });
    value[key] = items;
    value.to_string()
}
