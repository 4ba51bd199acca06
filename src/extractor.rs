//! Rule-based refund candidate extraction.
//!
//! The extractor turns one [`Message`] into at most one [`RefundCandidate`].
//! It is a pure function of the message: no I/O, no shared mutable state,
//! and the same message always yields the same candidate.
//!
//! # Example
//!
//! ```
//! use trainalyze::{extract, Confidence, Message, ReasonTag};
//! use chrono::Utc;
//!
//! let message = Message::new(
//!     "42",
//!     "Your train has been cancelled",
//!     "Travel date: 14/03/2025\nTotal paid: £38.60",
//!     "LNER <tickets@lner.co.uk>",
//!     Utc::now(),
//! );
//!
//! let candidate = extract(&message).unwrap();
//! assert_eq!(candidate.reason, ReasonTag::Cancellation);
//! assert_eq!(candidate.confidence, Confidence::High);
//! assert_eq!(candidate.merchant.as_deref(), Some("LNER"));
//! ```

use crate::keywords::{
    CANCELLATION, CATEGORY_BOOKING, CATEGORY_CANCELLATION, CATEGORY_DELAY, CATEGORY_DELAY_CLAIM,
    CATEGORY_RECEIPT, CATEGORY_REFUND, CATEGORY_STATEMENT, DELAY, OVERCHARGE, STATIONS, TRANSPORT,
    UK_STATIONS,
};
use crate::matcher::{AmountMatcher, BookingRefMatcher, DateMatcher, DelayMatcher, FieldMatcher};
use crate::message::Message;
use crate::operators::OperatorRegistry;
use chrono::{DateTime, NaiveDate, Utc};
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Maximum number of characters of the subject kept on a candidate.
pub const SUBJECT_MAX_CHARS: usize = 80;

/// Why a refund might be owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    /// The service ran late.
    Delay,
    /// The service did not run.
    Cancellation,
    /// The traveller paid more than they should have.
    Overcharge,
    /// No reason keyword was found.
    #[default]
    Unknown,
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReasonTag::Delay => "delay",
            ReasonTag::Cancellation => "cancellation",
            ReasonTag::Overcharge => "overcharge",
            ReasonTag::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// How many of the key fields (amount, date, reason) were found.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// At most one key field.
    Low,
    /// Exactly two key fields.
    Medium,
    /// Amount, date and a known reason.
    High,
}

impl Confidence {
    fn from_field_count(count: usize) -> Self {
        match count {
            3.. => Confidence::High,
            2 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        write!(f, "{s}")
    }
}

/// What kind of transport email this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailCategory {
    /// Delay Repay or compensation claim correspondence.
    DelayClaim,
    /// Money was (or will be) returned.
    Refund,
    /// A service was cancelled.
    Cancellation,
    /// A service ran late.
    Delay,
    /// Ticket purchase or booking confirmation.
    Booking,
    /// Pay-as-you-go journey statement.
    Statement,
    /// Generic payment receipt.
    Receipt,
    /// Transport related, but none of the above.
    Other,
}

impl EmailCategory {
    /// Returns `true` for categories that can lead to a compensation claim.
    #[must_use]
    pub fn is_claimable(self) -> bool {
        matches!(
            self,
            EmailCategory::Delay | EmailCategory::DelayClaim | EmailCategory::Cancellation
        )
    }
}

impl fmt::Display for EmailCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmailCategory::DelayClaim => "delay_claim",
            EmailCategory::Refund => "refund",
            EmailCategory::Cancellation => "cancellation",
            EmailCategory::Delay => "delay",
            EmailCategory::Booking => "booking",
            EmailCategory::Statement => "statement",
            EmailCategory::Receipt => "receipt",
            EmailCategory::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A transport email that may be worth a refund claim.
///
/// Every field except `reason`, `confidence` and `category` is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundCandidate {
    /// Identifier of the source message.
    pub message_id: String,
    /// When the source message was received.
    pub received: DateTime<Utc>,
    /// Subject line, cut to [`SUBJECT_MAX_CHARS`] characters.
    pub subject: String,
    /// Kind of transport email.
    pub category: EmailCategory,
    /// Operator or retailer the ticket was bought from.
    pub merchant: Option<String>,
    /// Fare or charge mentioned in the email.
    pub amount: Option<Decimal>,
    /// ISO 4217 code of `amount`.
    pub currency: Option<String>,
    /// Journey date, or the date the email refers to.
    pub journey_date: Option<NaiveDate>,
    /// Why a refund might be owed.
    pub reason: ReasonTag,
    /// Where to submit a claim.
    pub claim_url: Option<String>,
    /// How complete the key fields are.
    pub confidence: Confidence,
    /// Booking or order reference, upper-cased.
    pub booking_ref: Option<String>,
    /// Reported delay, in minutes.
    pub delay_minutes: Option<u32>,
    /// First station mentioned.
    pub origin: Option<String>,
    /// Second distinct station mentioned.
    pub destination: Option<String>,
}

/// Extracts [`RefundCandidate`]s from messages.
///
/// Holds the operator registry used to name the merchant; everything else is
/// driven by built-in keyword tables and matchers.
///
/// # Example
///
/// ```
/// use trainalyze::operators::{Operator, OperatorRegistry};
/// use trainalyze::{Extractor, Message};
/// use chrono::Utc;
///
/// let mut operators = OperatorRegistry::with_defaults();
/// operators.register("lumo", Operator::new("Lumo"));
/// let extractor = Extractor::with_operators(operators);
///
/// let message = Message::new("1", "Your Lumo e-ticket", "", "hello@lumo.co.uk", Utc::now());
/// let candidate = extractor.extract(&message).unwrap();
/// assert_eq!(candidate.merchant.as_deref(), Some("Lumo"));
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    operators: OperatorRegistry,
    amount: AmountMatcher,
    date: DateMatcher,
    booking_ref: BookingRefMatcher,
    delay: DelayMatcher,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Creates an extractor that knows the built-in UK operators.
    #[must_use]
    pub fn new() -> Self {
        Self::with_operators(OperatorRegistry::with_defaults())
    }

    /// Creates an extractor with a custom operator registry.
    #[must_use]
    pub fn with_operators(operators: OperatorRegistry) -> Self {
        Self {
            operators,
            amount: AmountMatcher::new(),
            date: DateMatcher::new(),
            booking_ref: BookingRefMatcher::new(),
            delay: DelayMatcher::new(),
        }
    }

    /// Returns the operator registry.
    #[must_use]
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Extracts a candidate from `message`.
    ///
    /// Returns `None` if the message contains no transport or refund keyword.
    #[must_use]
    pub fn extract(&self, message: &Message) -> Option<RefundCandidate> {
        let text = normalise_text(message.subject(), message.body());

        let anchors: Vec<(usize, usize)> = TRANSPORT
            .find_iter(&text)
            .map(|m| (m.start, m.end))
            .collect();
        if anchors.is_empty() {
            trace!(message_id = %message.id(), "No transport keyword, skipping message");
            return None;
        }

        let money = self.amount.find(&text);
        let journey_date = self.date.find_near(&text, &anchors);
        let reason = reason_tag(&text);

        let field_count = usize::from(money.is_some())
            + usize::from(journey_date.is_some())
            + usize::from(reason != ReasonTag::Unknown);
        let confidence = Confidence::from_field_count(field_count);

        let operator = self.operators.identify(message.sender());
        let (origin, destination) = route(&text);

        let candidate = RefundCandidate {
            message_id: message.id().to_string(),
            received: message.received(),
            subject: message.subject().chars().take(SUBJECT_MAX_CHARS).collect(),
            category: categorise(&text),
            merchant: operator.map(|op| op.name.clone()),
            amount: money.as_ref().map(|m| m.amount),
            currency: money.map(|m| m.currency.to_string()),
            journey_date,
            reason,
            claim_url: operator.and_then(|op| op.claim_url.clone()),
            confidence,
            booking_ref: self.booking_ref.find(&text),
            delay_minutes: self.delay.find(&text),
            origin,
            destination,
        };

        debug!(
            message_id = %candidate.message_id,
            category = %candidate.category,
            reason = %candidate.reason,
            confidence = %candidate.confidence,
            "Extracted refund candidate"
        );
        Some(candidate)
    }

    /// Extracts candidates from every message, keeping input order.
    #[must_use]
    pub fn extract_all(&self, messages: &[Message]) -> Vec<RefundCandidate> {
        messages.iter().filter_map(|m| self.extract(m)).collect()
    }
}

static DEFAULT_EXTRACTOR: LazyLock<Extractor> = LazyLock::new(Extractor::new);

/// Extracts a candidate using the built-in operator registry.
///
/// See [`Extractor::extract`].
#[must_use]
pub fn extract(message: &Message) -> Option<RefundCandidate> {
    DEFAULT_EXTRACTOR.extract(message)
}

fn reason_tag(text: &str) -> ReasonTag {
    if CANCELLATION.is_match(text) {
        ReasonTag::Cancellation
    } else if DELAY.is_match(text) {
        ReasonTag::Delay
    } else if OVERCHARGE.is_match(text) {
        ReasonTag::Overcharge
    } else {
        ReasonTag::Unknown
    }
}

fn categorise(text: &str) -> EmailCategory {
    let rules = [
        (&*CATEGORY_DELAY_CLAIM, EmailCategory::DelayClaim),
        (&*CATEGORY_REFUND, EmailCategory::Refund),
        (&*CATEGORY_CANCELLATION, EmailCategory::Cancellation),
        (&*CATEGORY_DELAY, EmailCategory::Delay),
        (&*CATEGORY_BOOKING, EmailCategory::Booking),
        (&*CATEGORY_STATEMENT, EmailCategory::Statement),
        (&*CATEGORY_RECEIPT, EmailCategory::Receipt),
    ];
    rules
        .into_iter()
        .find(|(set, _)| set.is_match(text))
        .map_or(EmailCategory::Other, |(_, category)| category)
}

/// First and second distinct stations mentioned, by canonical name.
fn route(text: &str) -> (Option<String>, Option<String>) {
    let mut stations = STATIONS.find_iter(text).filter_map(|m| canonical_station(m.text));
    let origin = stations.next();
    let destination = stations.find(|s| Some(*s) != origin);
    (
        origin.map(str::to_string),
        destination.map(str::to_string),
    )
}

fn canonical_station(found: &str) -> Option<&'static str> {
    UK_STATIONS.iter().copied().find(|station| {
        station
            .split_whitespace()
            .map(str::to_lowercase)
            .eq(found.split_whitespace().map(str::to_lowercase))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Text normalisation
// ─────────────────────────────────────────────────────────────────────────────

static HTML_HIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>|<script\b[^>]*>.*?</script\s*>|<!--.*?-->")
        .expect("valid regex")
});

static HTML_BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:br|p|div|tr|li|ul|ol|table|h[1-6])\b[^>]*>").expect("valid regex")
});

static HTML_CELL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:td|th)\b[^>]*>").expect("valid regex"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z!][^>]*>").expect("valid regex"));

static HTML_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid regex")
});

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));

/// Joins subject and body into one plain-text string.
///
/// Tags become spaces (style and script contents are dropped), block-level
/// tags become line breaks, and HTML entities are decoded.
fn normalise_text(subject: &str, body: &str) -> String {
    let text = format!("{subject}\n{body}");
    let text = HTML_HIDDEN.replace_all(&text, " ");
    let text = HTML_BLOCK_TAG.replace_all(&text, "\n");
    let text = HTML_CELL_TAG.replace_all(&text, " ");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = HTML_ENTITY.replace_all(&text, |caps: &Captures<'_>| decode_entity(caps));
    HORIZONTAL_SPACE.replace_all(&text, " ").into_owned()
}

fn decode_entity(caps: &Captures<'_>) -> String {
    let name = &caps[1];
    let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok().and_then(char::from_u32)
    } else {
        named_entity(name)
    };
    decoded.map_or_else(|| caps[0].to_string(), String::from)
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "pound" => '£',
        "euro" => '€',
        "dollar" => '$',
        "ndash" => '-',
        "mdash" => '-',
        "lsquo" | "rsquo" => '\'',
        "ldquo" | "rdquo" => '"',
        "hellip" => '…',
        "copy" => '©',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()
    }

    fn message(subject: &str, body: &str) -> Message {
        Message::new("m1", subject, body, "Friend <friend@example.com>", received())
    }

    #[test]
    fn test_no_transport_keyword() {
        let msg = message("Lunch on Friday?", "See you at 1pm, it's £12.50 each.");
        assert!(extract(&msg).is_none());
    }

    #[test]
    fn test_cancellation_with_amount_and_date_is_high() {
        let msg = message(
            "Service update",
            "Your train on 14/03/2025 was cancelled. You paid £42.00.",
        );
        let candidate = extract(&msg).unwrap();
        assert_eq!(candidate.reason, ReasonTag::Cancellation);
        assert_eq!(candidate.confidence, Confidence::High);
        assert_eq!(candidate.amount, Some(Decimal::new(4200, 2)));
        assert_eq!(candidate.journey_date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(candidate.category, EmailCategory::Cancellation);
    }

    #[test]
    fn test_delayed_with_amount_no_date_is_medium() {
        let msg = message("Your journey", "Your service was delayed. Fare: £12.50");
        let candidate = extract(&msg).unwrap();
        assert_eq!(candidate.reason, ReasonTag::Delay);
        assert_eq!(candidate.confidence, Confidence::Medium);
        assert_eq!(candidate.amount, Some(Decimal::new(1250, 2)));
        assert_eq!(candidate.currency.as_deref(), Some("GBP"));
        assert_eq!(candidate.journey_date, None);
    }

    #[test]
    fn test_generic_keyword_only_is_low() {
        let msg = message("Your train", "See you at the station.");
        let candidate = extract(&msg).unwrap();
        assert_eq!(candidate.reason, ReasonTag::Unknown);
        assert_eq!(candidate.confidence, Confidence::Low);
        assert_eq!(candidate.category, EmailCategory::Other);
        assert!(candidate.amount.is_none());
    }

    #[test]
    fn test_reason_priority() {
        let msg = message("Disruption", "Delayed, then cancelled. Overcharged too.");
        assert_eq!(extract(&msg).unwrap().reason, ReasonTag::Cancellation);

        let msg = message("Trip", "Train delayed; you were overcharged.");
        assert_eq!(extract(&msg).unwrap().reason, ReasonTag::Delay);

        let msg = message("Oyster", "You were charged the maximum fare.");
        assert_eq!(extract(&msg).unwrap().reason, ReasonTag::Overcharge);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let msg = message(
            "Delay Repay",
            "Travel date: 02/03/2025. Delayed by 35 minutes. Total £20.00",
        );
        assert_eq!(extract(&msg), extract(&msg));
    }

    #[test]
    fn test_empty_body_does_not_panic() {
        assert!(extract(&message("", "")).is_none());
        let candidate = extract(&message("Your e-ticket", "")).unwrap();
        assert_eq!(candidate.category, EmailCategory::Booking);
    }

    #[test]
    fn test_html_body() {
        let body = concat!(
            "<html><head><style>.cancelled { color: red }</style></head>",
            "<body><p>Your <b>train</b> was delayed.</p>",
            "<table><tr><td>Total paid:</td><td>&pound;23.40</td></tr></table>",
            "<p>Travel date:&nbsp;03/03/2025</p></body></html>",
        );
        let candidate = extract(&message("Journey update", body)).unwrap();
        assert_eq!(candidate.reason, ReasonTag::Delay);
        assert_eq!(candidate.amount, Some(Decimal::new(2340, 2)));
        assert_eq!(candidate.currency.as_deref(), Some("GBP"));
        assert_eq!(candidate.journey_date, NaiveDate::from_ymd_opt(2025, 3, 3));
        assert_eq!(candidate.confidence, Confidence::High);
    }

    #[test]
    fn test_adjacent_inline_tags_keep_words_apart() {
        let body = concat!(
            "<span>Your train was</span><span>cancelled</span>",
            "<span>Total paid:</span><span>&pound;20.00</span>",
        );
        assert_eq!(
            normalise_text("", body).trim(),
            "Your train was cancelled Total paid: £20.00"
        );

        let candidate = extract(&message("Journey update", body)).unwrap();
        assert_eq!(candidate.reason, ReasonTag::Cancellation);
        assert_eq!(candidate.amount, Some(Decimal::new(2000, 2)));
    }

    #[test]
    fn test_generic_ticket_words_alone_are_not_transport() {
        let msg = Message::new("m3", "Call us anytime", "", "a@b.com", received());
        assert!(extract(&msg).is_none());
    }

    #[test]
    fn test_merchant_comes_from_sender_domain() {
        let msg = Message::new(
            "m4",
            "Your payment was delayed",
            "",
            "Netflix <info@mailer.netflix.com>",
            received(),
        );
        let candidate = extract(&msg).unwrap();
        assert_eq!(candidate.merchant, None);
        assert_eq!(candidate.claim_url, None);
    }

    #[test]
    fn test_html_style_content_ignored() {
        let body = "<style>.train { display: none }</style><p>Hello friend</p>";
        assert!(extract(&message("Newsletter", body)).is_none());
    }

    #[test]
    fn test_non_ascii_does_not_panic() {
        let msg = message(
            "Zug verspätet 🚆",
            "Ihr Zug wurde storniert — 列车 train € ¥1200 &#x1F686; &#99999999; &bogus;",
        );
        let candidate = extract(&msg).unwrap();
        assert_eq!(candidate.subject, "Zug verspätet 🚆");
    }

    #[test]
    fn test_subject_truncated_on_char_boundary() {
        let subject = format!("Train {}", "é".repeat(100));
        let candidate = extract(&message(&subject, "")).unwrap();
        assert_eq!(candidate.subject.chars().count(), SUBJECT_MAX_CHARS);
    }

    #[test]
    fn test_operator_fields() {
        let msg = Message::new(
            "m2",
            "Delay Repay claim received",
            "Booking reference: ABC12345. Your train from London Kings Cross to York was 45 minutes late.",
            "LNER <noreply@lner.co.uk>",
            received(),
        );
        let candidate = extract(&msg).unwrap();
        assert_eq!(candidate.merchant.as_deref(), Some("LNER"));
        assert_eq!(
            candidate.claim_url.as_deref(),
            Some("https://www.lner.co.uk/help/delay-repay/")
        );
        assert_eq!(candidate.category, EmailCategory::DelayClaim);
        assert_eq!(candidate.booking_ref.as_deref(), Some("ABC12345"));
        assert_eq!(candidate.delay_minutes, Some(45));
        assert_eq!(candidate.origin.as_deref(), Some("London Kings Cross"));
        assert_eq!(candidate.destination.as_deref(), Some("York"));
    }

    #[test]
    fn test_unknown_sender_has_no_merchant() {
        let candidate = extract(&message("Your rail ticket", "")).unwrap();
        assert_eq!(candidate.merchant, None);
        assert_eq!(candidate.claim_url, None);
    }

    #[test]
    fn test_route_skips_repeated_station() {
        let (origin, destination) = route("leeds to LEEDS then on to york");
        assert_eq!(origin.as_deref(), Some("Leeds"));
        assert_eq!(destination.as_deref(), Some("York"));
    }

    #[test]
    fn test_extract_all_keeps_order() {
        let messages = vec![
            Message::new("a", "Train delayed", "", "x@y.com", received()),
            Message::new("b", "Dinner", "", "x@y.com", received()),
            Message::new("c", "Train cancelled", "", "x@y.com", received()),
        ];
        let ids: Vec<_> = Extractor::new()
            .extract_all(&messages)
            .into_iter()
            .map(|c| c.message_id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_entity_decoding() {
        let text = normalise_text("", "A &amp;pound; B &#163;5 &#xA3;6 &unknown;");
        assert_eq!(text, "\nA &pound; B £5 £6 &unknown;");
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }
}
