//! Example: Scanning an exported mailbox for refunds.
//!
//! Reads every `.eml` file in a directory, runs a full scan and prints the
//! report as JSON. Spans and events are logged to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=trainalyze=debug
//!
//! cargo run --example scan_mailbox -- ./mail-export
//! ```

use std::env;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use trainalyze::{EmlDirectoryFetcher, MailSession, ScanConfig, Scanner};

#[tokio::main]
async fn main() -> trainalyze::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trainalyze=info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    dotenvy::dotenv().ok();
    let dir = env::args()
        .nth(1)
        .or_else(|| env::var("TRAINALYZE_MAILBOX").ok())
        .expect("usage: scan_mailbox <directory of .eml files>");
    let account = env::var("TRAINALYZE_ACCOUNT").unwrap_or_else(|_| "me@example.com".into());

    let config = ScanConfig::builder()
        .fetch_timeout(Duration::from_secs(60))
        .build()?;
    let scanner = Scanner::new(EmlDirectoryFetcher::new(&dir), config);

    // Local files need no provider token
    let session = MailSession::new(&account, "local")?;

    tracing::info!(dir = %dir, "Scanning mailbox");
    let report = match scanner.scan(&session).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, category = %e.category(), "Scan failed");
            return Err(e);
        }
    };

    for recommendation in &report.recommendations {
        tracing::info!(%recommendation, "Recommendation");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("report serializes")
    );
    Ok(())
}
