//! Field extraction from normalised email text.
//!
//! Each matcher pulls one kind of field (an amount, a date, a booking
//! reference, a delay length) out of free text. Matchers are best-effort:
//! they return `None` rather than failing, and never panic on arbitrary
//! input.
//!
//! # Example
//!
//! ```
//! use trainalyze::matcher::{AmountMatcher, DateMatcher, FieldMatcher};
//! use chrono::NaiveDate;
//!
//! let money = AmountMatcher::new().find("Total paid: £12.50").unwrap();
//! assert_eq!(money.currency, "GBP");
//! assert_eq!(money.amount.to_string(), "12.50");
//!
//! let date = DateMatcher::new().find("Travel date: 14/03/2025").unwrap();
//! assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
//! ```

use chrono::NaiveDate;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use std::sync::LazyLock;

/// Trait for extracting a typed field from email text.
///
/// # Example
///
/// ```
/// use trainalyze::matcher::FieldMatcher;
///
/// struct CoachNumber;
///
/// impl FieldMatcher for CoachNumber {
///     type Output = char;
///
///     fn find(&self, text: &str) -> Option<char> {
///         text.split("Coach ").nth(1)?.chars().next()
///     }
///
///     fn description(&self) -> &str {
///         "coach letter"
///     }
/// }
///
/// assert_eq!(CoachNumber.find("Coach C, seat 42"), Some('C'));
/// ```
pub trait FieldMatcher: Send + Sync {
    /// The extracted value.
    type Output;

    /// Attempts to extract the field from `text`.
    fn find(&self, text: &str) -> Option<Self::Output>;

    /// Returns a human-readable description of what this matcher looks for.
    ///
    /// Used in logging.
    fn description(&self) -> &str;
}

/// Regex-based matcher that extracts the first capture group.
///
/// # Example
///
/// ```
/// use trainalyze::matcher::RegexMatcher;
///
/// let matcher = RegexMatcher::new(r"Coach\s+([A-Z])").unwrap();
/// assert_eq!(matcher.find_match("Coach B, seat 12"), Some("B"));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    description: String,
}

impl RegexMatcher {
    /// Creates a new regex matcher.
    ///
    /// The regex should contain at least one capture group. The first capture group
    /// will be extracted as the match result.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            description: format!("regex pattern: {pattern}"),
            regex,
        })
    }

    /// Creates a new regex matcher with a custom description.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn with_description(
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            description: description.into(),
            regex,
        })
    }

    /// Returns the first capture group of the first match, borrowed from `text`.
    #[must_use]
    pub fn find_match<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Returns the first capture group of every non-overlapping match.
    pub fn find_all<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = &'t str> + 'r
    where
        't: 'r,
    {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl FieldMatcher for RegexMatcher {
    type Output = String;

    fn find(&self, text: &str) -> Option<String> {
        self.find_match(text).map(str::to_string)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Amounts
// ─────────────────────────────────────────────────────────────────────────────

/// Upper bound (exclusive) for an amount to be considered a fare.
const MAX_PLAUSIBLE_AMOUNT: i64 = 100_000;

const NUMBER: &str = r"(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";

static AMOUNT_SYMBOL_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?P<sym>[£$€])\s?{NUMBER}")).expect("valid regex"));

static AMOUNT_CODE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?P<code>GBP|EUR|USD)\s?{NUMBER}")).expect("valid regex")
});

static AMOUNT_CODE_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{NUMBER}\s?(?P<code>GBP|EUR|USD)\b")).expect("valid regex")
});

static AMOUNT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:total|price|cost|paid|amount|fare|refund)\b[^\n]{0,25}$")
        .expect("valid regex")
});

/// A monetary amount with its ISO currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Money {
    /// The amount, as written (no rounding applied).
    pub amount: Decimal,
    /// ISO 4217 code: `GBP`, `EUR` or `USD`.
    pub currency: &'static str,
}

/// Extracts the most relevant monetary amount.
///
/// Recognises symbol-first (`£12.50`), code-first (`GBP 12.50`) and
/// code-after (`12.50 GBP`) forms, with optional thousands separators.
/// An amount labelled as a total, price, fare or refund wins; otherwise the
/// first plausible amount in the text is returned.
///
/// # Example
///
/// ```
/// use trainalyze::matcher::{AmountMatcher, FieldMatcher};
///
/// let matcher = AmountMatcher::new();
/// let money = matcher.find("Seat upgrade £5.00. Total: £48.20").unwrap();
/// assert_eq!(money.amount.to_string(), "48.20");
///
/// assert!(matcher.find("No prices here").is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountMatcher;

/// An amount found in the text, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AmountHit {
    money: Money,
    start: usize,
}

impl AmountMatcher {
    /// Creates an amount matcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn hits(text: &str) -> Vec<AmountHit> {
        let mut hits: Vec<AmountHit> = Vec::new();

        for caps in AMOUNT_SYMBOL_FIRST.captures_iter(text) {
            let currency = match &caps["sym"] {
                "£" => "GBP",
                "€" => "EUR",
                _ => "USD",
            };
            hits.extend(Self::hit_from(&caps, currency));
        }
        for regex in [&*AMOUNT_CODE_FIRST, &*AMOUNT_CODE_AFTER] {
            for caps in regex.captures_iter(text) {
                let currency = match &caps["code"] {
                    "GBP" => "GBP",
                    "EUR" => "EUR",
                    _ => "USD",
                };
                hits.extend(Self::hit_from(&caps, currency));
            }
        }

        hits.sort_by_key(|h| h.start);
        hits
    }

    fn hit_from(caps: &Captures<'_>, currency: &'static str) -> Option<AmountHit> {
        let whole = caps.get(0)?;
        let amount = Decimal::from_str(&caps["num"].replace(',', "")).ok()?;
        if amount <= Decimal::ZERO || amount >= Decimal::from(MAX_PLAUSIBLE_AMOUNT) {
            return None;
        }
        Some(AmountHit {
            money: Money { amount, currency },
            start: whole.start(),
        })
    }
}

impl FieldMatcher for AmountMatcher {
    type Output = Money;

    fn find(&self, text: &str) -> Option<Money> {
        let hits = Self::hits(text);
        let labelled = hits
            .iter()
            .find(|h| AMOUNT_LABEL.is_match(line_before(text, h.start)));
        labelled.or_else(|| hits.first()).map(|h| h.money.clone())
    }

    fn description(&self) -> &str {
        "currency amount"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dates
// ─────────────────────────────────────────────────────────────────────────────

/// How far (in bytes) a date may sit from a transport keyword to count as near it.
pub const NEAR_WINDOW: usize = 120;

const MONTH: &str = r"(?P<month>jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?";

static DATE_NUMERIC_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<day>\d{1,2})[/\-.](?P<mon>\d{1,2})[/\-.](?P<year>\d{4}|\d{2})\b")
        .expect("valid regex")
});

static DATE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<year>\d{4})-(?P<mon>\d{1,2})-(?P<day>\d{1,2})\b").expect("valid regex")
});

static DATE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+{MONTH},?\s+(?P<year>\d{{4}})\b"
    ))
    .expect("valid regex")
});

static DATE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH}\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<year>\d{{4}})\b"
    ))
    .expect("valid regex")
});

static DATE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:date\s+of\s+travel|travel\s+date|travelling|travel|journey\s+date|journey|departing|departure|depart|outward)\b[^\n\d]{0,20}$",
    )
    .expect("valid regex")
});

/// A date found in the text, with its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateHit {
    /// The parsed calendar date.
    pub date: NaiveDate,
    /// Byte offset where the date text starts.
    pub start: usize,
    /// Byte offset just past the date text.
    pub end: usize,
}

/// Extracts calendar dates in common UK email formats.
///
/// Numeric dates are read day-first (`03/04/2025` is 3 April). Impossible
/// dates such as `31/02/2025` are skipped.
///
/// # Example
///
/// ```
/// use trainalyze::matcher::{DateMatcher, FieldMatcher};
/// use chrono::NaiveDate;
///
/// let matcher = DateMatcher::new();
/// assert_eq!(
///     matcher.find("Outward: Fri 7th March 2025"),
///     NaiveDate::from_ymd_opt(2025, 3, 7)
/// );
/// assert_eq!(matcher.find("Booked on 31/02/2025"), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DateMatcher;

impl DateMatcher {
    /// Creates a date matcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns every valid date in the text, in order of appearance.
    ///
    /// Overlapping matches from different formats are collapsed to the first.
    #[must_use]
    pub fn find_all(&self, text: &str) -> Vec<DateHit> {
        let mut hits = Vec::new();

        for caps in DATE_NUMERIC_DMY.captures_iter(text) {
            hits.extend(numeric_hit(&caps));
        }
        for caps in DATE_ISO.captures_iter(text) {
            hits.extend(numeric_hit(&caps));
        }
        for regex in [&*DATE_DAY_MONTH, &*DATE_MONTH_DAY] {
            for caps in regex.captures_iter(text) {
                hits.extend(textual_hit(&caps));
            }
        }

        hits.sort_by_key(|h| h.start);
        let mut result: Vec<DateHit> = Vec::with_capacity(hits.len());
        for hit in hits {
            if result.last().is_some_and(|prev| hit.start < prev.end) {
                continue;
            }
            result.push(hit);
        }
        result
    }

    /// Finds the date most likely to be the journey date.
    ///
    /// Preference order:
    /// 1. A date directly labelled as a travel/journey/departure date
    /// 2. The date closest to one of `anchors` (keyword spans), within [`NEAR_WINDOW`] bytes
    /// 3. The first valid date in the text
    #[must_use]
    pub fn find_near(&self, text: &str, anchors: &[(usize, usize)]) -> Option<NaiveDate> {
        let hits = self.find_all(text);

        if let Some(hit) = hits
            .iter()
            .find(|h| DATE_LABEL.is_match(line_before(text, h.start)))
        {
            return Some(hit.date);
        }

        let nearest = hits
            .iter()
            .filter_map(|h| {
                anchors
                    .iter()
                    .map(|&(start, end)| span_distance((h.start, h.end), (start, end)))
                    .min()
                    .filter(|&d| d <= NEAR_WINDOW)
                    .map(|d| (d, h))
            })
            .min_by_key(|&(d, h)| (d, h.start));

        nearest.map(|(_, h)| h).or(hits.first()).map(|h| h.date)
    }
}

impl FieldMatcher for DateMatcher {
    type Output = NaiveDate;

    fn find(&self, text: &str) -> Option<NaiveDate> {
        self.find_near(text, &[])
    }

    fn description(&self) -> &str {
        "journey date"
    }
}

fn numeric_hit(caps: &Captures<'_>) -> Option<DateHit> {
    let whole = caps.get(0)?;
    let day: u32 = caps["day"].parse().ok()?;
    let month: u32 = caps["mon"].parse().ok()?;
    let year = expand_year(&caps["year"])?;
    Some(DateHit {
        date: NaiveDate::from_ymd_opt(year, month, day)?,
        start: whole.start(),
        end: whole.end(),
    })
}

fn textual_hit(caps: &Captures<'_>) -> Option<DateHit> {
    let whole = caps.get(0)?;
    let day: u32 = caps["day"].parse().ok()?;
    let month = month_number(&caps["month"])?;
    let year = expand_year(&caps["year"])?;
    Some(DateHit {
        date: NaiveDate::from_ymd_opt(year, month, day)?,
        start: whole.start(),
        end: whole.end(),
    })
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if raw.len() == 2 { 2000 + year } else { year })
}

fn month_number(abbrev: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = abbrev.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn span_distance(a: (usize, usize), b: (usize, usize)) -> usize {
    if a.0 >= b.1 {
        a.0 - b.1
    } else if b.0 >= a.1 {
        b.0 - a.1
    } else {
        0
    }
}

/// Returns the part of the current line that precedes byte offset `at`.
///
/// `at` must be a char boundary (regex match offsets always are).
fn line_before(text: &str, at: usize) -> &str {
    let head = &text[..at];
    let line_start = head.rfind('\n').map_or(0, |i| i + 1);
    &head[line_start..]
}

// ─────────────────────────────────────────────────────────────────────────────
// Booking references
// ─────────────────────────────────────────────────────────────────────────────

/// Extracts a booking reference.
///
/// A labelled reference (`Booking reference: ABC12345`, `Ref #9XK2LM7Q`)
/// must contain at least one digit, so words that happen to follow a label
/// are not mistaken for codes. Without a label, a bare `AB123456`-style code
/// is accepted. Results are upper-cased.
///
/// # Example
///
/// ```
/// use trainalyze::matcher::{BookingRefMatcher, FieldMatcher};
///
/// let matcher = BookingRefMatcher::new();
/// assert_eq!(matcher.find("Booking reference: abc12345").as_deref(), Some("ABC12345"));
/// assert_eq!(matcher.find("Your booking confirmation"), None);
/// ```
#[derive(Debug, Clone)]
pub struct BookingRefMatcher {
    labelled: RegexMatcher,
    bare: RegexMatcher,
}

impl Default for BookingRefMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingRefMatcher {
    /// Creates a booking reference matcher.
    ///
    /// # Panics
    ///
    /// Panics if the built-in patterns fail to compile (should not happen).
    #[must_use]
    pub fn new() -> Self {
        Self {
            labelled: RegexMatcher::with_description(
                r"(?i)\b(?:booking\s+reference|booking\s+ref|reference\s+number|confirmation\s+number|order\s+number|booking|reference|confirmation|ref|order)\b\.?[:\s#]*([A-Z0-9]{6,10})\b",
                "labelled booking reference",
            )
            .expect("valid regex"),
            bare: RegexMatcher::with_description(
                r"\b([A-Z]{2,3}[0-9]{6,8})\b",
                "bare booking reference",
            )
            .expect("valid regex"),
        }
    }
}

impl FieldMatcher for BookingRefMatcher {
    type Output = String;

    fn find(&self, text: &str) -> Option<String> {
        self.labelled
            .find_all(text)
            .find(|code| code.bytes().any(|b| b.is_ascii_digit()))
            .or_else(|| self.bare.find_match(text))
            .map(str::to_uppercase)
    }

    fn description(&self) -> &str {
        "booking reference"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delay length
// ─────────────────────────────────────────────────────────────────────────────

static DELAY_BEFORE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<n>\d{1,4})\s*(?P<unit>minutes?|mins?|hours?|hrs?)\s+(?:late|delay(?:ed)?)\b",
    )
    .expect("valid regex")
});

static DELAY_BY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdelayed\s+by\s+(?P<n>\d{1,4})\s*(?P<unit>minutes?|mins?|hours?|hrs?)\b")
        .expect("valid regex")
});

/// Extracts the length of a delay, in minutes.
///
/// Understands `25 minutes late`, `1 hour delay` and `delayed by 40 mins`.
/// Hours are converted to minutes.
///
/// # Example
///
/// ```
/// use trainalyze::matcher::{DelayMatcher, FieldMatcher};
///
/// let matcher = DelayMatcher::new();
/// assert_eq!(matcher.find("arrived 35 minutes late"), Some(35));
/// assert_eq!(matcher.find("was delayed by 2 hours"), Some(120));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayMatcher;

impl DelayMatcher {
    /// Creates a delay matcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FieldMatcher for DelayMatcher {
    type Output = u32;

    fn find(&self, text: &str) -> Option<u32> {
        [&*DELAY_BEFORE_UNIT, &*DELAY_BY]
            .iter()
            .filter_map(|regex| regex.captures(text))
            .min_by_key(|caps| caps.get(0).map_or(usize::MAX, |m| m.start()))
            .and_then(|caps| {
                let n: u32 = caps["n"].parse().ok()?;
                let is_hours = caps["unit"].to_ascii_lowercase().starts_with('h');
                Some(if is_hours { n.saturating_mul(60) } else { n })
            })
    }

    fn description(&self) -> &str {
        "delay length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_regex_matcher() {
        let matcher = RegexMatcher::new(r"seat:\s*(\d+)").unwrap();
        assert_eq!(matcher.find_match("Your seat: 42"), Some("42"));
        assert_eq!(matcher.find_match("No seat here"), None);
        assert_eq!(matcher.find("Your seat: 7").as_deref(), Some("7"));
    }

    #[test]
    fn test_match_outlives_matcher() {
        let text = String::from("Coach B, seat 12");
        let found = {
            let matcher = RegexMatcher::new(r"Coach\s+([A-Z])").unwrap();
            matcher.find_match(&text)
        };
        assert_eq!(found, Some("B"));
    }

    #[test]
    fn test_amount_symbol_formats() {
        let matcher = AmountMatcher::new();
        let money = matcher.find("Refund of £12.50 issued").unwrap();
        assert_eq!(money.amount, Decimal::new(1250, 2));
        assert_eq!(money.currency, "GBP");

        let money = matcher.find("Ticket € 9").unwrap();
        assert_eq!(money.amount, Decimal::from(9));
        assert_eq!(money.currency, "EUR");

        let money = matcher.find("Charged $1,234.00 today").unwrap();
        assert_eq!(money.amount, Decimal::new(123_400, 2));
        assert_eq!(money.currency, "USD");
    }

    #[test]
    fn test_amount_code_formats() {
        let matcher = AmountMatcher::new();
        let money = matcher.find("Amount GBP 45.10").unwrap();
        assert_eq!(money.amount, Decimal::new(4510, 2));
        assert_eq!(money.currency, "GBP");

        let money = matcher.find("You paid 30.00 EUR").unwrap();
        assert_eq!(money.amount, Decimal::new(3000, 2));
        assert_eq!(money.currency, "EUR");
    }

    #[test]
    fn test_amount_prefers_labelled() {
        let matcher = AmountMatcher::new();
        let money = matcher.find("Seat reservation £0.00\nTotal paid: £63.40").unwrap();
        assert_eq!(money.amount, Decimal::new(6340, 2));
    }

    #[test]
    fn test_amount_first_plausible_wins() {
        let matcher = AmountMatcher::new();
        // £0 is not plausible, so the next amount is used
        let money = matcher.find("Was £0, now £15 and later £20").unwrap();
        assert_eq!(money.amount, Decimal::from(15));
        assert!(matcher.find("Jackpot £250000").is_none());
    }

    #[test]
    fn test_date_formats() {
        let matcher = DateMatcher::new();
        assert_eq!(matcher.find("on 14/03/2025"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on 14-03-25"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on 14.03.2025"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on 2025-03-14"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on 14 Mar 2025"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on 14th March 2025"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on March 14, 2025"), Some(date(2025, 3, 14)));
        assert_eq!(matcher.find("on Sept 2nd, 2025"), Some(date(2025, 9, 2)));
    }

    #[test]
    fn test_date_invalid_calendar_skipped() {
        let matcher = DateMatcher::new();
        assert_eq!(matcher.find("31/02/2025 then 01/03/2025"), Some(date(2025, 3, 1)));
        assert_eq!(matcher.find("30 Febtember 2025"), None);
    }

    #[test]
    fn test_date_labelled_preferred() {
        let matcher = DateMatcher::new();
        let text = "Booked 01/02/2025\nTravel date: 10/02/2025";
        assert_eq!(matcher.find(text), Some(date(2025, 2, 10)));
    }

    #[test]
    fn test_date_near_anchor() {
        let matcher = DateMatcher::new();
        let padding = "x".repeat(200);
        let text = format!("Newsletter 01/01/2025 {padding} train cancelled 05/01/2025");
        let anchor = text.find("cancelled").unwrap();
        let anchors = [(anchor, anchor + "cancelled".len())];
        assert_eq!(matcher.find_near(&text, &anchors), Some(date(2025, 1, 5)));
        // Without anchors the first date wins
        assert_eq!(matcher.find(&text), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_date_far_from_anchor_falls_back_to_first() {
        let matcher = DateMatcher::new();
        let padding = "x".repeat(300);
        let text = format!("cancelled {padding} 05/01/2025");
        assert_eq!(matcher.find_near(&text, &[(0, 9)]), Some(date(2025, 1, 5)));
    }

    #[test]
    fn test_date_find_all_in_order() {
        let hits = DateMatcher::new().find_all("14 March 2025 and 2025-03-15");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].date, date(2025, 3, 14));
        assert_eq!(hits[1].date, date(2025, 3, 15));
    }

    #[test]
    fn test_booking_ref() {
        let matcher = BookingRefMatcher::new();
        assert_eq!(
            matcher.find("Booking reference: ABC12345").as_deref(),
            Some("ABC12345")
        );
        assert_eq!(matcher.find("Ref #9xk2lm7q").as_deref(), Some("9XK2LM7Q"));
        assert_eq!(matcher.find("Code TL1234567 attached").as_deref(), Some("TL1234567"));
        assert_eq!(matcher.find("booking confirmation for you"), None);
    }

    #[test]
    fn test_delay_minutes() {
        let matcher = DelayMatcher::new();
        assert_eq!(matcher.find("arrived 45 mins late"), Some(45));
        assert_eq!(matcher.find("a 1 hour delay"), Some(60));
        assert_eq!(matcher.find("delayed by 20 minutes"), Some(20));
        assert_eq!(matcher.find("on time"), None);
    }

    #[test]
    fn test_matchers_survive_odd_input() {
        let inputs = ["", "£", "£.", "€€€", "ééé 12/", "日本 2025年3月14日 ¥1200", "\u{0}\u{FEFF}"];
        for input in inputs {
            let _ = AmountMatcher::new().find(input);
            let _ = DateMatcher::new().find(input);
            let _ = BookingRefMatcher::new().find(input);
            let _ = DelayMatcher::new().find(input);
        }
    }
}
