//! Page fetching
//!
//! One [`PageFetcher`] per pagination loop: it shares the connection pool of the
//! run-wide [`reqwest::Client`] but owns its own header set and decode buffer,
//! reused across every page the loop requests.

use crate::config::{Config, HttpConfig};
use crate::decode::{decode_body, decode_page};
use crate::error::{FetchError, Result};
use crate::types::Page;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, HeaderMap, HeaderValue, USER_AGENT,
};

/// Build the HTTP client shared by the enumerator and all workers
pub fn build_client(http: &HttpConfig) -> Result<reqwest::Client> {
    if http.accept_invalid_certs {
        tracing::warn!("TLS certificate validation is disabled");
    }

    let client = reqwest::Client::builder()
        .timeout(http.request_timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.max_idle_per_host)
        .danger_accept_invalid_certs(http.accept_invalid_certs)
        .build()?;

    Ok(client)
}

/// URL builder for the two listing endpoints
#[derive(Clone, Debug)]
pub struct Endpoint {
    root: String,
    page_size: u32,
}

impl Endpoint {
    /// `root` is the REST root without a trailing slash
    pub fn new(root: impl Into<String>, page_size: u32) -> Self {
        Self {
            root: root.into(),
            page_size,
        }
    }

    /// Public group search, sorted by title
    pub fn group_search(&self, start: u64) -> String {
        let mut url = format!(
            "{}/community/groups?f=json&q=access:public&sortField=title&sortOrder=&num={}",
            self.root, self.page_size
        );
        push_start(&mut url, start);
        url
    }

    /// User list of one group
    pub fn user_list(&self, group_id: &str, start: u64) -> String {
        let mut url = format!(
            "{}/community/groups/{}/userList?f=json&num={}",
            self.root,
            urlencoding::encode(group_id),
            self.page_size
        );
        push_start(&mut url, start);
        url
    }
}

// The first page is requested without a start parameter
fn push_start(url: &mut String, start: u64) {
    if start > 0 {
        url.push_str("&start=");
        url.push_str(&start.to_string());
    }
}

/// Which set of request headers a fetcher sends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestProfile {
    /// Group search: plain JSON
    Listing,
    /// User lists: JSON, compressed transfer allowed
    Members,
}

/// Issues GET requests for one pagination loop and decodes the replies
pub struct PageFetcher {
    client: reqwest::Client,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl PageFetcher {
    /// Create a fetcher on top of the shared client
    pub fn new(client: reqwest::Client, config: &Config, profile: RequestProfile) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if profile == RequestProfile::Members {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        }
        match HeaderValue::from_str(&config.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid User-Agent, sending requests without one");
            }
        }

        Self {
            client,
            headers,
            body: Vec::new(),
        }
    }

    /// GET `url` and decode the reply into a page
    pub async fn fetch(&mut self, url: &str) -> std::result::Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let raw = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        decode_body(encoding.as_deref(), &raw, &mut self.body)
            .and_then(|()| decode_page(&self.body))
            .map_err(|source| FetchError::Decode {
                url: url.to_string(),
                source,
            })
    }
}
