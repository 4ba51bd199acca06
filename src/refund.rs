//! Delay Repay compensation rules and claim deadlines.
//!
//! ```
//! use trainalyze::refund::{estimate_refund, DelayRepayScheme};
//! use rust_decimal::Decimal;
//!
//! let estimate = estimate_refund(Some(Decimal::new(4000, 2)), Some(35), DelayRepayScheme::Standard).unwrap();
//! assert_eq!(estimate.percent, 50);
//! assert_eq!(estimate.amount, Decimal::new(2000, 2));
//! ```

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

/// Days a traveller has to claim when the operator publishes no other window.
pub const DEFAULT_CLAIM_DEADLINE_DAYS: u32 = 28;

/// A compensation scheme: delay thresholds (minutes) and the share of the fare repaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayRepayScheme {
    /// National Rail standard scheme.
    #[default]
    Standard,
    /// Delay Repay 15, used by the more generous operators.
    DelayRepay15,
    /// Transport for London: full refund once 15 minutes late.
    Tfl,
}

impl DelayRepayScheme {
    /// Returns `(minimum delay in minutes, percent repaid)` pairs, ascending.
    #[must_use]
    pub fn thresholds(self) -> &'static [(u32, u8)] {
        match self {
            DelayRepayScheme::Standard => &[(15, 25), (30, 50), (60, 100)],
            DelayRepayScheme::DelayRepay15 => &[(15, 25), (30, 50), (60, 100), (120, 100)],
            DelayRepayScheme::Tfl => &[(15, 100)],
        }
    }

    /// Returns the percentage of the fare repaid for a delay, or `None` below every threshold.
    #[must_use]
    pub fn compensation_percent(self, delay_minutes: u32) -> Option<u8> {
        self.thresholds()
            .iter()
            .rev()
            .find(|(minimum, _)| delay_minutes >= *minimum)
            .map(|&(_, percent)| percent)
    }
}

/// Estimated compensation for one journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundEstimate {
    /// Amount repaid, rounded to pence.
    pub amount: Decimal,
    /// Share of the fare repaid.
    pub percent: u8,
}

/// Estimates Delay Repay compensation.
///
/// Returns `None` when the price or delay is unknown (or zero), or when the
/// delay is below the scheme's first threshold.
#[must_use]
pub fn estimate_refund(
    price: Option<Decimal>,
    delay_minutes: Option<u32>,
    scheme: DelayRepayScheme,
) -> Option<RefundEstimate> {
    let price = price.filter(|p| *p > Decimal::ZERO)?;
    let delay = delay_minutes.filter(|d| *d > 0)?;
    let percent = scheme.compensation_percent(delay)?;

    let amount = (price * Decimal::from(percent) / Decimal::ONE_HUNDRED).round_dp(2);
    Some(RefundEstimate { amount, percent })
}

/// Whether a claim can still be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// The claim window is still open.
    Active,
    /// The claim window has closed.
    Expired,
    /// No journey date is known.
    Unknown,
}

/// The last day a claim can be made, and whether that is still ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimDeadline {
    /// Last day to claim, if the journey date is known.
    pub date: Option<NaiveDate>,
    /// Status relative to the day the deadline was computed.
    pub status: DeadlineStatus,
}

/// Computes the claim deadline `days` after `journey_date`.
///
/// The claim is [`DeadlineStatus::Active`] up to and including the deadline day.
///
/// ```
/// use trainalyze::refund::{claim_deadline, DeadlineStatus};
/// use chrono::NaiveDate;
///
/// let journey = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
/// let deadline = claim_deadline(Some(journey), 28, today);
/// assert_eq!(deadline.date, NaiveDate::from_ymd_opt(2025, 3, 29));
/// assert_eq!(deadline.status, DeadlineStatus::Active);
/// ```
#[must_use]
pub fn claim_deadline(journey_date: Option<NaiveDate>, days: u32, today: NaiveDate) -> ClaimDeadline {
    let date = journey_date.and_then(|d| d.checked_add_days(Days::new(u64::from(days))));

    let status = match date {
        Some(deadline) if today <= deadline => DeadlineStatus::Active,
        Some(_) => DeadlineStatus::Expired,
        None => DeadlineStatus::Unknown,
    };

    ClaimDeadline { date, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_standard_thresholds() {
        let scheme = DelayRepayScheme::Standard;
        assert_eq!(scheme.compensation_percent(14), None);
        assert_eq!(scheme.compensation_percent(15), Some(25));
        assert_eq!(scheme.compensation_percent(29), Some(25));
        assert_eq!(scheme.compensation_percent(30), Some(50));
        assert_eq!(scheme.compensation_percent(90), Some(100));
    }

    #[test]
    fn test_tfl_full_refund() {
        assert_eq!(DelayRepayScheme::Tfl.compensation_percent(15), Some(100));
        assert_eq!(DelayRepayScheme::Tfl.compensation_percent(10), None);
    }

    #[test]
    fn test_delay_repay_15_long_delay() {
        assert_eq!(DelayRepayScheme::DelayRepay15.compensation_percent(180), Some(100));
    }

    #[test]
    fn test_estimate_rounds_to_pence() {
        let estimate =
            estimate_refund(Some(Decimal::new(1999, 2)), Some(20), DelayRepayScheme::Standard)
                .unwrap();
        assert_eq!(estimate.percent, 25);
        // 19.99 * 25% = 4.9975
        assert_eq!(estimate.amount, Decimal::new(500, 2));
    }

    #[test]
    fn test_estimate_missing_inputs() {
        let scheme = DelayRepayScheme::Standard;
        assert_eq!(estimate_refund(None, Some(30), scheme), None);
        assert_eq!(estimate_refund(Some(Decimal::TEN), None, scheme), None);
        assert_eq!(estimate_refund(Some(Decimal::TEN), Some(0), scheme), None);
        assert_eq!(estimate_refund(Some(Decimal::TEN), Some(5), scheme), None);
    }

    #[test]
    fn test_deadline_boundaries() {
        let journey = date(2025, 3, 1);
        let on_deadline = claim_deadline(Some(journey), 28, date(2025, 3, 29));
        assert_eq!(on_deadline.status, DeadlineStatus::Active);

        let after = claim_deadline(Some(journey), 28, date(2025, 3, 30));
        assert_eq!(after.status, DeadlineStatus::Expired);
        assert_eq!(after.date, Some(date(2025, 3, 29)));
    }

    #[test]
    fn test_deadline_unknown_without_date() {
        let deadline = claim_deadline(None, 28, date(2025, 3, 1));
        assert_eq!(deadline.status, DeadlineStatus::Unknown);
        assert_eq!(deadline.date, None);
    }
}
