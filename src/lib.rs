//! # portal-members
//!
//! Enumerates every public group on a portal and dumps each group's full
//! membership list as flat `(group, member)` records.
//!
//! ## Pipeline
//!
//! - A single **enumerator** pages through the public group search and hands each
//!   group over a zero-capacity rendezvous channel, so it never runs further ahead
//!   than the workers can take.
//! - A fixed pool of **workers** pulls groups off that channel. Each worker pages
//!   through its group's user list and emits one record per member to a
//!   [`RecordSink`].
//! - A failed page request never ends the run: a worker drops the group it was on
//!   and takes the next one, and the enumerator retries its cursor according to
//!   [`RetryConfig`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use portal_members::{Config, StdoutSink, run};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         workers: 16,
//!         ..Config::new("https://maps.company.net/portal/sharing/rest")
//!     };
//!
//!     let summary = run(config, Arc::new(StdoutSink)).await?;
//!     eprintln!("{} records", summary.records_emitted);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Response body and JSON envelope decoding
pub mod decode;
/// Group listing producer
pub mod enumerator;
/// Error types
pub mod error;
/// HTTP page fetching and endpoint URLs
pub mod fetch;
/// Cursor-driven pagination
pub mod paginate;
/// Enumerator and worker pool wiring
pub mod pipeline;
/// Zero-capacity work channel
pub mod rendezvous;
/// Retry logic with exponential backoff
pub mod retry;
/// Record sinks
pub mod sink;
/// Core types
pub mod types;
/// Group membership workers
pub mod worker;

// Re-export commonly used types
pub use config::{Config, HttpConfig, RetryConfig};
pub use error::{DecodeError, Error, FetchError, Result};
pub use pipeline::{RunSummary, run, run_with_client};
pub use sink::{MemorySink, RecordSink, StdoutSink};
pub use types::{Cursor, Group, Member, OutputRecord, Page, PageItems};
