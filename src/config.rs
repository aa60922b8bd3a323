//! Configuration types for portal-members

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2227.0 Safari/537.36";

/// Upper bound for `RetryConfig::max_delay`
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Username prefix of the portal's built-in service accounts
pub const DEFAULT_SYSTEM_ACCOUNT_PREFIX: &str = "esri_";

/// Main configuration for a membership dump
///
/// Built once by the caller (the CLI, or an embedding application) and handed to
/// the enumerator and every worker at construction time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Portal REST root, e.g. `https://maps.company.net/portal/sharing/rest`
    pub base_url: String,

    /// Number of parallel group workers (default: 40, at least one is always run)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Log every group as a worker picks it up
    #[serde(default)]
    pub verbose: bool,

    /// Emit records for system accounts too (default: false)
    #[serde(default)]
    pub include_system_accounts: bool,

    /// Username prefix identifying system accounts (default: "esri_")
    #[serde(default = "default_system_account_prefix")]
    pub system_account_prefix: String,

    /// Items requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry policy for the group listing
    #[serde(default)]
    pub listing_retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            workers: default_workers(),
            user_agent: default_user_agent(),
            verbose: false,
            include_system_accounts: false,
            system_account_prefix: default_system_account_prefix(),
            page_size: default_page_size(),
            http: HttpConfig::default(),
            listing_retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration for the given portal with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Check the configuration and return the normalized REST root
    ///
    /// The returned string has no trailing slash, so endpoint paths can be appended
    /// directly.
    pub fn validate(&self) -> Result<String> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::Config {
                message: "portal URL is required".to_string(),
                key: Some("base_url".to_string()),
            });
        }

        let parsed = url::Url::parse(trimmed)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("unsupported URL scheme '{}'", parsed.scheme()),
                key: Some("base_url".to_string()),
            });
        }

        if self.page_size == 0 {
            return Err(Error::Config {
                message: "page size must be greater than zero".to_string(),
                key: Some("page_size".to_string()),
            });
        }

        self.listing_retry.validate()?;

        Ok(trimmed.to_string())
    }

    /// Size of the worker pool; a configured zero still runs one worker
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// Whether a record for this username should be emitted
    pub fn admits(&self, username: &str) -> bool {
        self.include_system_accounts
            || self.system_account_prefix.is_empty()
            || !username.starts_with(&self.system_account_prefix)
    }
}

/// HTTP client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Idle pooled connections kept per host (default: 1024)
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Skip TLS certificate validation (default: false)
    ///
    /// Internal portals often run on self-signed certificates. This must be
    /// switched on explicitly; it is never implied by any other setting.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
            accept_invalid_certs: false,
        }
    }
}

/// Retry configuration with exponential backoff
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries per page (default: 10, None = retry forever)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: format!(
                    "backoff multiplier must be a finite number of at least 1.0, got {}",
                    self.backoff_multiplier
                ),
                key: Some("listing_retry.backoff_multiplier".to_string()),
            });
        }
        for (key, delay) in [
            ("listing_retry.initial_delay", self.initial_delay),
            ("listing_retry.max_delay", self.max_delay),
        ] {
            if delay > MAX_RETRY_DELAY {
                return Err(Error::Config {
                    message: format!(
                        "retry delays must not exceed {} seconds",
                        MAX_RETRY_DELAY.as_secs()
                    ),
                    key: Some(key.to_string()),
                });
            }
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_workers() -> usize {
    40
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_system_account_prefix() -> String {
    DEFAULT_SYSTEM_ACCOUNT_PREFIX.to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_idle_per_host() -> usize {
    1024
}

fn default_max_attempts() -> Option<u32> {
    Some(10)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Durations are (de)serialized as whole seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
