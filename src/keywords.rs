//! Keyword tables used to classify transport emails.
//!
//! Every table is compiled once into a [`KeywordSet`]: a single
//! case-insensitive regex that only matches whole words, so `bus` does not
//! fire on "business" and `late` style phrases do not fire on "template".
//!
//! ```
//! use trainalyze::keywords::{KeywordSet, TRANSPORT};
//!
//! assert!(TRANSPORT.is_match("Your e-ticket for the 08:15 train"));
//! assert!(!TRANSPORT.is_match("Quarterly business review"));
//!
//! let custom = KeywordSet::new("ferry", ["ferry", "sailing"]).unwrap();
//! assert_eq!(custom.find("Your SAILING is confirmed").unwrap().text, "SAILING");
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Subject keywords, in the order they are offered to the provider-side search.
pub const SUBJECT_QUERY_KEYWORDS: &[&str] = &[
    "e-ticket",
    "booking confirmation",
    "train ticket",
    "rail ticket",
    "journey details",
    "delay repay",
    "compensation",
    "refund",
    "cancellation",
    "disruption",
    "delayed service",
    "oyster",
    "contactless journey",
    "travelcard",
    "railcard",
    "season ticket",
    "advance ticket",
    "off-peak ticket",
    "anytime ticket",
    "booking reference",
];

const GENERIC_TRANSPORT_WORDS: &[&str] = &[
    "train",
    "trains",
    "rail",
    "railway",
    "eticket",
    "journey",
    "departure",
    "station",
    "platform",
    "coach",
    "bus",
    "tram",
    "underground",
    "tfl",
];

const CANCELLATION_PHRASES: &[&str] = &[
    "cancelled",
    "canceled",
    "cancellation",
    "not running",
    "service withdrawn",
];

const DELAY_PHRASES: &[&str] = &[
    "delayed",
    "delay",
    "delay repay",
    "delay compensation",
    "disruption",
    "running late",
    "minutes late",
    "mins late",
];

const OVERCHARGE_PHRASES: &[&str] = &[
    "overcharged",
    "overcharge",
    "charged twice",
    "double charged",
    "duplicate charge",
    "incorrect fare",
    "incomplete journey",
    "maximum fare",
];

/// Common UK stations used for route detection.
pub const UK_STATIONS: &[&str] = &[
    "London Euston",
    "London Kings Cross",
    "London St Pancras",
    "London Paddington",
    "London Victoria",
    "London Waterloo",
    "London Liverpool Street",
    "London Bridge",
    "Manchester Piccadilly",
    "Birmingham New Street",
    "Leeds",
    "Glasgow Central",
    "Edinburgh Waverley",
    "Bristol Temple Meads",
    "Liverpool Lime Street",
    "Newcastle",
    "Sheffield",
    "Nottingham",
    "Leicester",
    "Cambridge",
    "Oxford",
    "Brighton",
    "Reading",
    "Cardiff Central",
    "York",
    "Peterborough",
    "Milton Keynes",
    "Crewe",
    "Preston",
];

/// Any keyword that qualifies a message as transport or refund related.
///
/// This is the union of generic transport words, the subject query keywords
/// and every reason keyword, so a message carrying a cancellation phrase is
/// always considered.
pub static TRANSPORT: LazyLock<KeywordSet> = LazyLock::new(|| {
    let phrases = GENERIC_TRANSPORT_WORDS
        .iter()
        .chain(SUBJECT_QUERY_KEYWORDS)
        .chain(CANCELLATION_PHRASES)
        .chain(DELAY_PHRASES)
        .chain(OVERCHARGE_PHRASES);
    KeywordSet::new("transport", phrases.copied()).expect("valid keyword pattern")
});

/// Phrases indicating a cancelled service.
pub static CANCELLATION: LazyLock<KeywordSet> =
    LazyLock::new(|| static_set("cancellation", CANCELLATION_PHRASES));

/// Phrases indicating a delayed service.
pub static DELAY: LazyLock<KeywordSet> =
    LazyLock::new(|| static_set("delay", DELAY_PHRASES));

/// Phrases indicating the traveller paid too much.
pub static OVERCHARGE: LazyLock<KeywordSet> =
    LazyLock::new(|| static_set("overcharge", OVERCHARGE_PHRASES));

/// Known stations, matched as whole words.
pub static STATIONS: LazyLock<KeywordSet> =
    LazyLock::new(|| static_set("station", UK_STATIONS));

pub(crate) static CATEGORY_DELAY_CLAIM: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set(
        "delay claim",
        &["delay repay", "compensation claim", "your claim", "delay compensation"],
    )
});

pub(crate) static CATEGORY_REFUND: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set(
        "refund",
        &["refund", "refunded", "money back", "reimbursement", "credited"],
    )
});

pub(crate) static CATEGORY_CANCELLATION: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set(
        "cancellation",
        &["cancelled", "canceled", "cancellation", "service disruption", "not running"],
    )
});

pub(crate) static CATEGORY_DELAY: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set("delay", &["delayed", "delay", "late", "disruption"])
});

pub(crate) static CATEGORY_BOOKING: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set(
        "booking",
        &["booking confirmation", "e-ticket", "your ticket", "booking reference"],
    )
});

pub(crate) static CATEGORY_STATEMENT: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set(
        "statement",
        &["journey history", "oyster statement", "contactless statement"],
    )
});

pub(crate) static CATEGORY_RECEIPT: LazyLock<KeywordSet> = LazyLock::new(|| {
    static_set("receipt", &["receipt", "payment", "invoice"])
});

fn static_set(name: &str, phrases: &[&str]) -> KeywordSet {
    KeywordSet::new(name, phrases.iter().copied()).expect("valid keyword pattern")
}

/// A named list of phrases matched case-insensitively on word boundaries.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    name: String,
    phrases: Vec<String>,
    regex: Regex,
}

/// A single keyword occurrence in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch<'a> {
    /// The matched text, as it appears in the input.
    pub text: &'a str,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset just past the match.
    pub end: usize,
}

impl KeywordSet {
    /// Compiles a keyword set.
    ///
    /// Phrases are escaped, so they are literal text. Whitespace inside a
    /// phrase matches any run of whitespace, and longer phrases win over
    /// their prefixes ("delay repay" over "delay").
    ///
    /// # Errors
    ///
    /// Returns an error if the combined pattern exceeds the regex size limit.
    pub fn new<I, S>(name: impl Into<String>, phrases: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| {
                let p: String = p.into();
                p.trim().to_string()
            })
            .filter(|p| !p.is_empty() && seen.insert(p.to_lowercase()))
            .collect();

        let mut ordered: Vec<&String> = phrases.iter().collect();
        ordered.sort_by_key(|p| std::cmp::Reverse(p.len()));

        let pattern = if ordered.is_empty() {
            // Matches nothing
            r"\b\B".to_string()
        } else {
            let alternation = ordered
                .iter()
                .map(|p| {
                    p.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect::<Vec<_>>()
                .join("|");
            format!(r"(?i)\b(?:{alternation})\b")
        };

        Ok(Self {
            name: name.into(),
            regex: Regex::new(&pattern)?,
            phrases,
        })
    }

    /// Returns the name of this set, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the phrases in this set, in insertion order.
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Returns `true` if any phrase occurs in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns the first occurrence of any phrase.
    #[must_use]
    pub fn find<'a>(&self, text: &'a str) -> Option<KeywordMatch<'a>> {
        self.regex.find(text).map(KeywordMatch::from)
    }

    /// Returns all non-overlapping occurrences, in order of appearance.
    pub fn find_iter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = KeywordMatch<'a>> + 'a {
        self.regex.find_iter(text).map(KeywordMatch::from)
    }
}

impl<'a> From<regex::Match<'a>> for KeywordMatch<'a> {
    fn from(m: regex::Match<'a>) -> Self {
        Self {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        }
    }
}
