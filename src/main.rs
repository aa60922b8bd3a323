//! Command line front end: dump portal group memberships to stdout

use clap::Parser;
use portal_members::config::DEFAULT_USER_AGENT;
use portal_members::{Config, HttpConfig, RetryConfig, StdoutSink};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// List every member of every public group on a portal
#[derive(Debug, Parser)]
#[command(name = "portal-members", version, about)]
struct Cli {
    /// Portal REST URL (https://maps.company.net/portal/sharing/rest/)
    #[arg(short = 'u', long = "url", env = "PORTAL_URL")]
    url: String,

    /// Number of concurrent group workers
    #[arg(short = 't', long = "threads", default_value_t = 40)]
    threads: usize,

    /// User-Agent header to send
    #[arg(short = 'a', long = "agent", default_value = DEFAULT_USER_AGENT)]
    agent: String,

    /// Turns on verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Also print the portal's built-in (esri_*) accounts
    #[arg(short = 'e', long = "esri")]
    esri: bool,

    /// Accept invalid or self-signed TLS certificates
    #[arg(short = 'k', long = "insecure")]
    insecure: bool,

    /// Items requested per page
    #[arg(long = "page-size", default_value_t = 100)]
    page_size: u32,

    /// Retries per group-listing page before giving up (0 = retry forever)
    #[arg(long = "listing-retries", default_value_t = 10)]
    listing_retries: u32,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            workers: self.threads,
            user_agent: self.agent,
            verbose: self.verbose,
            include_system_accounts: self.esri,
            page_size: self.page_size,
            http: HttpConfig {
                accept_invalid_certs: self.insecure,
                ..HttpConfig::default()
            },
            listing_retry: RetryConfig {
                max_attempts: (self.listing_retries > 0).then_some(self.listing_retries),
                ..RetryConfig::default()
            },
            ..Config::new(self.url)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "warn,portal_members=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match portal_members::run(cli.into_config(), Arc::new(StdoutSink)).await {
        Ok(summary) => {
            tracing::debug!(?summary, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "could not start");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["portal-members", "-u", "https://p.example.com/rest"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.base_url, "https://p.example.com/rest");
        assert_eq!(config.workers, 40);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(!config.include_system_accounts);
        assert!(!config.http.accept_invalid_certs);
        assert_eq!(config.listing_retry.max_attempts, Some(10));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "portal-members",
            "--url",
            "https://p.example.com/rest",
            "-t",
            "8",
            "-v",
            "-e",
            "-k",
            "--listing-retries",
            "0",
        ])
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.workers, 8);
        assert!(config.verbose);
        assert!(config.include_system_accounts);
        assert!(config.http.accept_invalid_certs);
        assert_eq!(config.listing_retry.max_attempts, None);
    }

    #[test]
    fn test_cli_requires_url() {
        use clap::CommandFactory;
        // detach PORTAL_URL so the outcome does not depend on the environment
        let command = Cli::command().mut_arg("url", |arg| arg.env(None::<&str>));
        let err = command.try_get_matches_from(["portal-members"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
