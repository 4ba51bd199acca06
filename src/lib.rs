//! # trainalyze
//!
//! Finds unclaimed UK transport refunds in a mailbox.
//!
//! This crate provides:
//! - A rule-based extractor that turns a transport email into a [`RefundCandidate`]
//!   (merchant, amount, journey date, reason, claim link, confidence)
//! - Delay Repay estimation and claim deadlines per operator
//! - An async [`Scanner`] that fetches messages through a [`Fetcher`] and
//!   aggregates refund opportunities, totals and recommendations
//!
//! The crate does not talk to mail providers itself. A provider client
//! implements [`Fetcher`]; [`EmlDirectoryFetcher`] and [`InMemoryFetcher`]
//! are included for exported mailboxes and tests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use trainalyze::{EmlDirectoryFetcher, MailSession, ScanConfig, Scanner};
//!
//! # async fn example() -> trainalyze::Result<()> {
//! let config = ScanConfig::builder().lookback_days(90).build()?;
//! let scanner = Scanner::new(EmlDirectoryFetcher::new("./mail"), config);
//!
//! let session = MailSession::new("traveller@example.com", "access-token")?;
//! let report = scanner.scan(&session).await?;
//!
//! for opportunity in &report.opportunities {
//!     println!(
//!         "{:?}: £{} ({:?})",
//!         opportunity.candidate.merchant,
//!         opportunity.refund_amount(),
//!         opportunity.deadline.status,
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Extracting a Single Message
//!
//! ```
//! use trainalyze::{extract, Message, ReasonTag};
//! use chrono::Utc;
//!
//! let message = Message::new(
//!     "1",
//!     "Delay Repay",
//!     "Your train was delayed by 40 minutes. Fare: £22.00",
//!     "GWR <noreply@gwr.com>",
//!     Utc::now(),
//! );
//!
//! let candidate = extract(&message).unwrap();
//! assert_eq!(candidate.reason, ReasonTag::Delay);
//! assert_eq!(candidate.delay_minutes, Some(40));
//! ```
//!
//! ## Error Handling
//!
//! Extraction never fails. Scanning can, and every error says whether the
//! caller should retry or ask the user to reconnect:
//!
//! ```
//! use trainalyze::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.requires_reauth() {
//!         println!("Please reconnect your mailbox");
//!     } else if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation and installs no subscriber.
//!
//! ### Span Naming Convention
//!
//! - `Scanner::scan` - One mailbox scan
//! - `EmlDirectoryFetcher::load` - Reading an exported mailbox
//!
//! ### Standard Fields
//!
//! - `email` - Account address
//! - `fetcher` - Fetcher description
//! - `message_id` - Message identifier
//! - `candidate_count` / `opportunity_count` - Scan results

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod keywords;
pub mod matcher;
pub mod operators;
pub mod refund;
pub mod scan;

// Internal modules
mod mailbox;
mod message;
mod session;

// Re-exports for ergonomic API
pub use config::{ScanConfig, ScanConfigBuilder};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use extractor::{extract, Confidence, EmailCategory, Extractor, ReasonTag, RefundCandidate};
pub use fetcher::{Fetcher, InMemoryFetcher, SearchQuery};
pub use mailbox::EmlDirectoryFetcher;
pub use message::Message;
pub use operators::{Operator, OperatorRegistry};
pub use refund::{ClaimDeadline, DeadlineStatus, DelayRepayScheme, RefundEstimate};
pub use scan::{Recommendation, RefundOpportunity, ScanReport, ScanSummary, Scanner};
pub use session::MailSession;
