//! Retry logic with exponential backoff
//!
//! Used by the group enumerator, which re-requests the same cursor after a
//! transient failure instead of giving up on the listing. With
//! `max_attempts = None` the policy never gives up, so a persistently
//! unreachable portal keeps the run waiting (with growing delays) until it
//! comes back.

use crate::config::RetryConfig;
use crate::error::FetchError;
use rand::Rng;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // connection refused, reset, timeouts, truncated bodies
            FetchError::Transport { .. } => true,
            // server busy or overloaded
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            // the same bytes will come back again
            FetchError::Decode { .. } => false,
        }
    }
}

/// Per-page retry state for a pagination loop
///
/// Call [`Backoff::retry`] after a failed request: it decides whether the same
/// request should be issued again and sleeps for the backoff delay if so. Call
/// [`Backoff::reset`] after a success so the next page starts with a fresh budget.
pub struct Backoff<'a> {
    config: &'a RetryConfig,
    attempt: u32,
    delay: Duration,
}

impl<'a> Backoff<'a> {
    /// Start with no failed attempts
    pub fn new(config: &'a RetryConfig) -> Self {
        Self {
            config,
            attempt: 0,
            delay: config.initial_delay,
        }
    }

    /// Retries spent on the current request
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Wait before re-issuing a failed request
    ///
    /// Returns `false` without waiting when the error is permanent or the
    /// configured attempts are used up.
    pub async fn retry<E>(&mut self, error: &E) -> bool
    where
        E: IsRetryable + std::fmt::Display,
    {
        if !error.is_retryable() {
            tracing::error!(error = %error, "Operation failed with non-retryable error");
            return false;
        }
        if self
            .config
            .max_attempts
            .is_some_and(|max| self.attempt >= max)
        {
            tracing::error!(
                error = %error,
                attempts = self.attempt + 1,
                "Operation failed after all retry attempts exhausted"
            );
            return false;
        }

        self.attempt += 1;
        tracing::warn!(
            error = %error,
            attempt = self.attempt,
            max_attempts = ?self.config.max_attempts,
            delay_ms = self.delay.as_millis(),
            "Operation failed, retrying"
        );

        let jittered_delay = if self.config.jitter {
            add_jitter(self.delay)
        } else {
            self.delay
        };
        tokio::time::sleep(jittered_delay).await;

        let next_delay =
            Duration::try_from_secs_f64(self.delay.as_secs_f64() * self.config.backoff_multiplier)
                .unwrap_or(self.config.max_delay);
        self.delay = next_delay.min(self.config.max_delay);
        true
    }

    /// Record a success; the next failure starts from the initial delay again
    pub fn reset(&mut self) {
        if self.attempt > 0 {
            tracing::info!(attempts = self.attempt + 1, "Operation succeeded after retry");
        }
        self.attempt = 0;
        self.delay = self.config.initial_delay;
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor)).unwrap_or(delay)
}
