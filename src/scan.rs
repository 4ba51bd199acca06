//! One user-initiated mailbox scan: fetch, extract, aggregate.
//!
//! # Example
//!
//! ```
//! use trainalyze::{InMemoryFetcher, MailSession, Message, ScanConfig, Scanner};
//! use chrono::{TimeZone, Utc};
//!
//! # async fn example() -> trainalyze::Result<()> {
//! let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
//! let fetcher = InMemoryFetcher::new(vec![Message::new(
//!     "1",
//!     "Your train was delayed",
//!     "Delayed by 45 minutes. Fare: £30.00. Travel date: 18/03/2025",
//!     "LNER <tickets@lner.co.uk>",
//!     now,
//! )]);
//!
//! let scanner = Scanner::new(fetcher, ScanConfig::default());
//! let session = MailSession::new("me@example.com", "token")?;
//! let report = scanner.scan_at(&session, now).await?;
//!
//! assert_eq!(report.opportunities.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::extractor::{Confidence, EmailCategory, Extractor, RefundCandidate};
use crate::fetcher::{Fetcher, SearchQuery};
use crate::message::Message;
use crate::operators::OperatorRegistry;
use crate::refund::{
    claim_deadline, estimate_refund, ClaimDeadline, DeadlineStatus, DelayRepayScheme,
    RefundEstimate, DEFAULT_CLAIM_DEADLINE_DAYS,
};
use crate::session::MailSession;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

/// Spend above which a Railcard is suggested.
const RAILCARD_SPEND_THRESHOLD: Decimal = Decimal::from_parts(300, 0, 0, false, 0);
/// Share of spend a Railcard typically saves (34%).
const RAILCARD_SAVING: Decimal = Decimal::from_parts(34, 0, 0, false, 2);
/// Delay emails from one operator before suggesting alternatives.
const OPERATOR_DELAY_THRESHOLD: usize = 2;

/// Runs scans against one fetcher.
#[derive(Debug)]
pub struct Scanner<F> {
    fetcher: F,
    config: ScanConfig,
    extractor: Extractor,
}

impl<F: Fetcher> Scanner<F> {
    /// Creates a scanner. The extractor uses the config's operator registry.
    #[must_use]
    pub fn new(fetcher: F, config: ScanConfig) -> Self {
        let extractor = Extractor::with_operators(config.operators().clone());
        Self {
            fetcher,
            config,
            extractor,
        }
    }

    /// Returns the scan configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Returns the underlying fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Scans the mailbox behind `session` as of now.
    ///
    /// # Errors
    ///
    /// See [`scan_at`](Self::scan_at).
    pub async fn scan(&self, session: &MailSession) -> Result<ScanReport> {
        self.scan_at(session, Utc::now()).await
    }

    /// Scans the mailbox behind `session` as of `now`.
    ///
    /// `now` sets the search window and decides which claim deadlines have passed.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionExpired`] if the session has expired and cannot be refreshed
    /// - [`Error::FetchTimeout`] if the fetcher exceeds [`ScanConfig::fetch_timeout`]
    /// - Any error the fetcher reports
    #[instrument(
        name = "Scanner::scan",
        skip_all,
        fields(
            email = %session.email(),
            fetcher = %self.fetcher.description(),
            max_messages = self.config.max_messages
        )
    )]
    pub async fn scan_at(&self, session: &MailSession, now: DateTime<Utc>) -> Result<ScanReport> {
        session.ensure_usable(now)?;

        let query = self.query_for(now.date_naive());
        debug!(query = %query.to_provider_query(), "Fetching messages");

        let timeout = self.config.fetch_timeout;
        let mut messages = tokio::time::timeout(timeout, self.fetcher.fetch(session, &query))
            .await
            .map_err(|_| Error::FetchTimeout {
                fetcher: self.fetcher.description().to_string(),
                timeout,
            })??;

        messages.sort_by_key(|m| Reverse(m.received()));
        let report = self.build_report(&messages, now);

        debug!(
            message_count = report.summary.messages_scanned,
            candidate_count = report.candidates.len(),
            opportunity_count = report.opportunities.len(),
            "Scan complete"
        );
        Ok(report)
    }

    fn query_for(&self, today: NaiveDate) -> SearchQuery {
        let after = today
            .checked_sub_days(Days::new(u64::from(self.config.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        SearchQuery::for_transport(
            after,
            self.config.max_messages,
            self.config.keyword_query_limit,
        )
    }

    fn build_report(&self, messages: &[Message], now: DateTime<Utc>) -> ScanReport {
        let candidates = self.extractor.extract_all(messages);
        let opportunities = find_opportunities(&candidates, self.config.operators(), now.date_naive());
        let summary = ScanSummary::new(messages.len(), &candidates, &opportunities);
        let recommendations = recommend(&candidates, summary.total_spend);

        ScanReport {
            scanned_at: now,
            candidates,
            opportunities,
            summary,
            recommendations,
        }
    }
}

/// Everything a scan found.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// The instant the scan was evaluated at.
    pub scanned_at: DateTime<Utc>,
    /// Every candidate, most recent message first.
    pub candidates: Vec<RefundCandidate>,
    /// Claimable delays and cancellations, best first.
    pub opportunities: Vec<RefundOpportunity>,
    /// Counts and totals.
    pub summary: ScanSummary,
    /// Travel advice, possibly empty.
    pub recommendations: Vec<Recommendation>,
}

/// A delay or cancellation that has not been refunded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundOpportunity {
    /// The delay or cancellation email.
    pub candidate: RefundCandidate,
    /// Compensation due, if price and delay are both known.
    pub estimate: Option<RefundEstimate>,
    /// Last day to claim, from the journey date (or the email date).
    pub deadline: ClaimDeadline,
    /// How complete a claim form would be: `High` with booking reference,
    /// delay and price, `Medium` with booking reference and delay.
    pub claim_readiness: Confidence,
}

impl RefundOpportunity {
    /// Returns the estimated refund, or zero when it cannot be estimated.
    #[must_use]
    pub fn refund_amount(&self) -> Decimal {
        self.estimate.map_or(Decimal::ZERO, |e| e.amount)
    }
}

/// Totals across one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Messages returned by the fetcher.
    pub messages_scanned: usize,
    /// Messages that produced a candidate.
    pub candidates: usize,
    /// Booking confirmations and e-tickets.
    pub bookings: usize,
    /// Delay, delay claim and cancellation emails.
    pub delays: usize,
    /// Refund confirmations.
    pub refunds: usize,
    /// Unrefunded delays and cancellations.
    pub opportunities: usize,
    /// Sum of booking amounts in GBP.
    pub total_spend: Decimal,
    /// Estimated refunds still within their claim window.
    pub total_claimable: Decimal,
    /// Estimated refunds whose claim window has closed.
    pub total_expired: Decimal,
}

impl ScanSummary {
    fn new(
        messages_scanned: usize,
        candidates: &[RefundCandidate],
        opportunities: &[RefundOpportunity],
    ) -> Self {
        let count = |pred: fn(EmailCategory) -> bool| {
            candidates.iter().filter(|c| pred(c.category)).count()
        };

        let total_spend: Decimal = candidates
            .iter()
            .filter(|c| c.category == EmailCategory::Booking && c.currency.as_deref() == Some("GBP"))
            .filter_map(|c| c.amount)
            .sum();

        let total_for = |status: DeadlineStatus| -> Decimal {
            opportunities
                .iter()
                .filter(|o| o.deadline.status == status)
                .map(RefundOpportunity::refund_amount)
                .sum()
        };

        Self {
            messages_scanned,
            candidates: candidates.len(),
            bookings: count(|c| c == EmailCategory::Booking),
            delays: count(EmailCategory::is_claimable),
            refunds: count(|c| c == EmailCategory::Refund),
            opportunities: opportunities.len(),
            total_spend: total_spend.round_dp(2),
            total_claimable: total_for(DeadlineStatus::Active).round_dp(2),
            total_expired: total_for(DeadlineStatus::Expired).round_dp(2),
        }
    }
}

/// Advice derived from travel patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Enough was spent that a Railcard would likely pay for itself.
    Railcard {
        /// Total booking spend, whole pounds.
        total_spend: Decimal,
        /// Likely saving, whole pounds.
        estimated_saving: Decimal,
    },
    /// One operator is delayed often.
    AvoidOperator {
        /// Operator name.
        operator: String,
        /// Delay emails seen from it.
        delays: usize,
    },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Railcard {
                total_spend,
                estimated_saving,
            } => write!(
                f,
                "You spent £{total_spend} on trains. A Railcard (£30/year) could save ~£{estimated_saving}"
            ),
            Recommendation::AvoidOperator { operator, delays } => write!(
                f,
                "Consider alternatives to {operator} ({delays} delays recorded)"
            ),
        }
    }
}

fn find_opportunities(
    candidates: &[RefundCandidate],
    operators: &OperatorRegistry,
    today: NaiveDate,
) -> Vec<RefundOpportunity> {
    let refunded: HashSet<&str> = candidates
        .iter()
        .filter(|c| c.category == EmailCategory::Refund)
        .filter_map(|c| c.booking_ref.as_deref())
        .collect();

    let mut opportunities: Vec<RefundOpportunity> = candidates
        .iter()
        .filter(|c| c.category.is_claimable())
        .filter(|c| {
            c.booking_ref
                .as_deref()
                .map_or(true, |r| !refunded.contains(r))
        })
        .map(|candidate| {
            let operator = candidate
                .merchant
                .as_deref()
                .and_then(|name| operators.find_by_name(name));
            let scheme = operator.map_or(DelayRepayScheme::Standard, |op| op.scheme);
            let window = operator.map_or(DEFAULT_CLAIM_DEADLINE_DAYS, |op| op.claim_deadline_days);
            let travelled = candidate
                .journey_date
                .unwrap_or_else(|| candidate.received.date_naive());

            RefundOpportunity {
                candidate: candidate.clone(),
                estimate: estimate_refund(candidate.amount, candidate.delay_minutes, scheme),
                deadline: claim_deadline(Some(travelled), window, today),
                claim_readiness: claim_readiness(candidate),
            }
        })
        .collect();

    opportunities.sort_by(compare_opportunities);
    opportunities
}

fn claim_readiness(candidate: &RefundCandidate) -> Confidence {
    match (
        candidate.booking_ref.is_some(),
        candidate.delay_minutes.is_some(),
        candidate.amount.is_some(),
    ) {
        (true, true, true) => Confidence::High,
        (true, true, false) => Confidence::Medium,
        _ => Confidence::Low,
    }
}

/// Highest refund first, then most claim-ready, then still-claimable first.
fn compare_opportunities(a: &RefundOpportunity, b: &RefundOpportunity) -> Ordering {
    fn status_rank(status: DeadlineStatus) -> u8 {
        match status {
            DeadlineStatus::Active => 0,
            DeadlineStatus::Unknown => 1,
            DeadlineStatus::Expired => 2,
        }
    }

    b.refund_amount()
        .cmp(&a.refund_amount())
        .then_with(|| b.claim_readiness.cmp(&a.claim_readiness))
        .then_with(|| status_rank(a.deadline.status).cmp(&status_rank(b.deadline.status)))
}

fn recommend(candidates: &[RefundCandidate], total_spend: Decimal) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if total_spend > RAILCARD_SPEND_THRESHOLD {
        recommendations.push(Recommendation::Railcard {
            total_spend: total_spend.round(),
            estimated_saving: (total_spend * RAILCARD_SAVING).round(),
        });
    }

    // Ties go to the operator seen first, i.e. the most recent message.
    let mut delays_by_operator: Vec<(&str, usize)> = Vec::new();
    for candidate in candidates.iter().filter(|c| c.category.is_claimable()) {
        let operator = candidate.merchant.as_deref().unwrap_or("Unknown");
        match delays_by_operator.iter_mut().find(|(name, _)| *name == operator) {
            Some((_, count)) => *count += 1,
            None => delays_by_operator.push((operator, 1)),
        }
    }

    let worst = delays_by_operator
        .into_iter()
        .fold(None::<(&str, usize)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        });
    if let Some((operator, delays)) = worst.filter(|(_, n)| *n >= OPERATOR_DELAY_THRESHOLD) {
        recommendations.push(Recommendation::AvoidOperator {
            operator: operator.to_string(),
            delays,
        });
    }

    recommendations
}
