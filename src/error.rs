//! Error types for portal-members
//!
//! Two layers:
//! - [`FetchError`] / [`DecodeError`] describe a single failed page request. They are
//!   recovered inside the pipeline (logged, then the loop moves on) and never end a run.
//! - [`Error`] covers setup failures (bad configuration, HTTP client construction)
//!   and is the only error [`crate::run`] returns.

use thiserror::Error;

/// Result type alias for portal-members setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Setup error returned before the pipeline starts
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// The portal base URL could not be parsed
    #[error("invalid portal URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The shared HTTP client could not be built
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A single page request that did not yield a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body-read failure
    #[error("request to {url} failed: {source}")]
    Transport {
        /// URL that was requested
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The body could not be decoded into a page
    #[error("could not decode response from {url}: {source}")]
    Decode {
        /// URL that was requested
        url: String,
        /// Underlying decode error
        #[source]
        source: DecodeError,
    },
}

impl FetchError {
    /// URL of the failed request
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }

    /// True for network-level failures, including error statuses
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. } | FetchError::Status { .. }
        )
    }

    /// True when the payload arrived but could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode { .. })
    }
}

/// Failure to turn a response body into a page
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Malformed JSON or unexpected envelope shape
    #[error("malformed JSON envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// The body could not be decompressed according to its Content-Encoding
    #[error("failed to decode {encoding} body: {source}")]
    ContentEncoding {
        /// Content-Encoding header value
        encoding: String,
        /// Underlying decompression error
        #[source]
        source: std::io::Error,
    },
}
