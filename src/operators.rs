//! Transport operator identification from email senders.
//!
//! This module maps a sender (`LNER <tickets@lner.co.uk>`) to the operator
//! that sold the ticket, with its claim page, compensation scheme and claim
//! window. Built-in UK operators can be extended or overridden at runtime.
//!
//! # Example
//!
//! ```
//! use trainalyze::operators::{Operator, OperatorRegistry};
//! use trainalyze::refund::DelayRepayScheme;
//!
//! let mut registry = OperatorRegistry::with_defaults();
//! assert_eq!(registry.identify("GWR <noreply@gwr.com>").unwrap().name, "GWR");
//!
//! registry.register(
//!     "lumo",
//!     Operator::new("Lumo").with_claim_url("https://www.lumo.co.uk/delay-repay"),
//! );
//! let lumo = registry.identify("bookings@lumo.co.uk").unwrap();
//! assert_eq!(lumo.scheme, DelayRepayScheme::Standard);
//! ```

use crate::message::sender_domain;
use crate::refund::{DelayRepayScheme, DEFAULT_CLAIM_DEADLINE_DAYS};
use serde::Serialize;
use std::sync::LazyLock;

/// Sender domains of UK transport companies, used for the provider-side search.
pub const TRANSPORT_SENDER_DOMAINS: &[&str] = &[
    // Rail booking platforms
    "trainline.com",
    "thetrainline.com",
    "nationalrail.co.uk",
    "raileurope.com",
    // Train operators
    "lner.co.uk",
    "gwr.com",
    "avantiwestcoast.co.uk",
    "tpexpress.co.uk",
    "southernrailway.com",
    "southeasternrailway.co.uk",
    "c2c-online.co.uk",
    "crosscountrytrains.co.uk",
    "northernrailway.co.uk",
    "merseyrail.org",
    "scotrail.co.uk",
    "tfwrail.wales",
    "chilternrailways.co.uk",
    "eastmidlandsrailway.co.uk",
    "greateranglia.co.uk",
    "heathrowexpress.com",
    "gatwickexpress.com",
    "stanstedexpress.com",
    "eurostar.com",
    // TfL
    "tfl.gov.uk",
    // Buses and coaches
    "nationalexpress.com",
    "megabus.com",
    "flixbus.co.uk",
    "stagecoachbus.com",
    "arrivabus.co.uk",
    "firstbus.co.uk",
    // Journey planners
    "omio.com",
    "rome2rio.com",
    "busbud.com",
];

/// Returns `true` if `domain` is, or is a subdomain of, a known transport sender.
///
/// ```
/// use trainalyze::operators::is_transport_sender;
///
/// assert!(is_transport_sender("oyster.tfl.gov.uk"));
/// assert!(!is_transport_sender("nottfl.gov.uk"));
/// ```
#[must_use]
pub fn is_transport_sender(domain: &str) -> bool {
    TRANSPORT_SENDER_DOMAINS
        .iter()
        .any(|known| domain_matches(domain, known))
}

/// Returns `true` if `domain` equals `known` or is one of its subdomains, ignoring case.
pub(crate) fn domain_matches(domain: &str, known: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    let known = known.trim().to_lowercase();
    domain == known
        || domain
            .strip_suffix(known.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn key_matches_domain(key: &str, domain: &str) -> bool {
    if key.contains('.') {
        return domain_matches(domain, key);
    }
    domain
        .split('.')
        .any(|label| label.starts_with(key) || label.ends_with(key))
}

/// A transport company and how to claim compensation from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    /// Display name, used as the candidate's merchant.
    pub name: String,
    /// Page where Delay Repay or refund claims are made.
    pub claim_url: Option<String>,
    /// Compensation scheme the operator follows.
    pub scheme: DelayRepayScheme,
    /// Days after travel within which a claim must be made.
    pub claim_deadline_days: u32,
}

impl Operator {
    /// Creates an operator on the standard scheme with the default claim window.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            claim_url: None,
            scheme: DelayRepayScheme::Standard,
            claim_deadline_days: DEFAULT_CLAIM_DEADLINE_DAYS,
        }
    }

    /// Sets the claim page.
    #[must_use]
    pub fn with_claim_url(mut self, url: impl Into<String>) -> Self {
        self.claim_url = Some(url.into());
        self
    }

    /// Sets the compensation scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: DelayRepayScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the claim window.
    #[must_use]
    pub fn with_claim_deadline_days(mut self, days: u32) -> Self {
        self.claim_deadline_days = days;
        self
    }
}

/// Built-in operators, keyed by a sender substring and checked in order.
static KNOWN_OPERATORS: LazyLock<Vec<(&'static str, Operator)>> = LazyLock::new(|| {
    use DelayRepayScheme::{DelayRepay15, Tfl};

    vec![
        (
            "trainline",
            Operator::new("Trainline")
                .with_claim_url("https://www.thetrainline.com/information/delay-repay"),
        ),
        (
            "lner",
            Operator::new("LNER")
                .with_claim_url("https://www.lner.co.uk/help/delay-repay/")
                .with_scheme(DelayRepay15),
        ),
        (
            "gwr",
            Operator::new("GWR")
                .with_claim_url(
                    "https://www.gwr.com/help-and-support/refunds-and-compensation/delay-repay",
                )
                .with_scheme(DelayRepay15),
        ),
        (
            "avanti",
            Operator::new("Avanti West Coast")
                .with_claim_url("https://www.avantiwestcoast.co.uk/help-and-support/journey-problems/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "tpexpress",
            Operator::new("TransPennine Express")
                .with_claim_url("https://www.tpexpress.co.uk/help/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "southern",
            Operator::new("Southern").with_claim_url(
                "https://www.southernrailway.com/help-and-contact/delayed-or-cancelled/delay-repay",
            ),
        ),
        (
            "southeastern",
            Operator::new("Southeastern")
                .with_claim_url("https://www.southeasternrailway.co.uk/contact-us/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "c2c",
            Operator::new("c2c")
                .with_claim_url("https://www.c2c-online.co.uk/help-contact/delay-repay/")
                .with_scheme(DelayRepay15),
        ),
        (
            "crosscountry",
            Operator::new("CrossCountry")
                .with_claim_url("https://www.crosscountrytrains.co.uk/journey-help/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "northern",
            Operator::new("Northern").with_claim_url(
                "https://www.northernrailway.co.uk/refunds-compensation/delay-repay",
            ),
        ),
        (
            "scotrail",
            Operator::new("ScotRail").with_claim_url(
                "https://www.scotrail.co.uk/about-scotrail/our-delays-policy/delay-repay",
            ),
        ),
        (
            "chiltern",
            Operator::new("Chiltern Railways")
                .with_claim_url("https://www.chilternrailways.co.uk/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "eastmidlands",
            Operator::new("East Midlands Railway")
                .with_claim_url("https://www.eastmidlandsrailway.co.uk/help/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "greateranglia",
            Operator::new("Greater Anglia")
                .with_claim_url("https://www.greateranglia.co.uk/about-us/our-policies/delay-repay")
                .with_scheme(DelayRepay15),
        ),
        (
            "tfl",
            Operator::new("TfL")
                .with_claim_url("https://tfl.gov.uk/fares/refunds-and-replacements")
                .with_scheme(Tfl),
        ),
        (
            "nationalexpress",
            Operator::new("National Express")
                .with_claim_url("https://www.nationalexpress.com/en/help/contact-us")
                .with_claim_deadline_days(30),
        ),
        ("megabus", Operator::new("Megabus")),
        (
            "eurostar",
            Operator::new("Eurostar").with_claim_url(
                "https://www.eurostar.com/uk-en/travel-info/service-information/delay-compensation",
            ),
        ),
        ("heathrow", Operator::new("Heathrow Express")),
    ]
});

/// A customizable registry of transport operators.
///
/// Resolution order for [`identify`](Self::identify):
/// 1. Custom entries, in registration order
/// 2. Built-in operators (if [`Self::with_defaults`] was used), in table order
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    custom: Vec<(String, Operator)>,
    use_defaults: bool,
}

impl OperatorRegistry {
    /// Creates an empty registry without built-in operators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            use_defaults: false,
        }
    }

    /// Creates a registry that includes the built-in UK operators.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            custom: Vec::new(),
            use_defaults: true,
        }
    }

    /// Registers an operator under a sender domain key (e.g. `"lumo"` or `"lumo.co.uk"`).
    ///
    /// Replaces any custom entry with the same key and takes precedence over built-ins.
    pub fn register(&mut self, key: impl Into<String>, operator: Operator) {
        let key = key.into().to_lowercase();
        if let Some(entry) = self.custom.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = operator;
        } else {
            self.custom.push((key, operator));
        }
    }

    /// Registers multiple operators at once.
    pub fn register_many<I, K>(&mut self, operators: I)
    where
        I: IntoIterator<Item = (K, Operator)>,
        K: Into<String>,
    {
        for (key, operator) in operators {
            self.register(key, operator);
        }
    }

    /// Removes a custom entry.
    ///
    /// Note: This only removes custom entries, not built-in operators.
    pub fn unregister(&mut self, key: &str) -> Option<Operator> {
        let key = key.to_lowercase();
        let index = self.custom.iter().position(|(k, _)| *k == key)?;
        Some(self.custom.remove(index).1)
    }

    /// Identifies the operator behind a sender address.
    ///
    /// Only the domain of the address is inspected, never the display name.
    /// A key matches a domain label it starts or ends (`trainline` matches
    /// `info.thetrainline.com`). A key containing a dot is matched as a
    /// whole domain, subdomains included.
    #[must_use]
    pub fn identify(&self, sender: &str) -> Option<&Operator> {
        let domain = sender_domain(sender)?;
        self.entries()
            .find(|(key, _)| key_matches_domain(key, &domain))
            .map(|(_, operator)| operator)
    }

    /// Looks an operator up by its display name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Operator> {
        self.entries()
            .map(|(_, operator)| operator)
            .find(|operator| operator.name.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if `key` is registered.
    #[must_use]
    pub fn is_known(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.entries().any(|(k, _)| k == key)
    }

    /// Returns the number of registered operators (custom + built-in if enabled).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Returns `true` if the registry has no operators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Custom entries followed by the built-ins they do not shadow.
    fn entries(&self) -> impl Iterator<Item = (&str, &Operator)> {
        let custom = self.custom.iter().map(|(k, op)| (k.as_str(), op));
        let defaults = KNOWN_OPERATORS
            .iter()
            .filter(move |_| self.use_defaults)
            .filter(move |(key, _)| !self.custom.iter().any(|(k, _)| k == key))
            .map(|(key, op)| (*key, op));
        custom.chain(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_builtin() {
        let registry = OperatorRegistry::with_defaults();
        assert_eq!(
            registry.identify("LNER <tickets@lner.co.uk>").unwrap().name,
            "LNER"
        );
        assert_eq!(
            registry
                .identify("auto-confirm@info.thetrainline.com")
                .unwrap()
                .name,
            "Trainline"
        );
        assert_eq!(
            registry.identify("noreply@contactless.tfl.gov.uk").unwrap().scheme,
            DelayRepayScheme::Tfl
        );
        assert!(registry.identify("friend@example.com").is_none());
    }

    #[test]
    fn test_display_name_and_inner_labels_are_ignored() {
        let registry = OperatorRegistry::with_defaults();
        assert!(registry.identify("Netflix <info@mailer.netflix.com>").is_none());
        assert!(registry.identify("LNER fan club <hello@example.com>").is_none());
        assert!(registry.identify("no address here").is_none());
    }

    #[test]
    fn test_dotted_key_matches_whole_domain() {
        let mut registry = OperatorRegistry::new();
        registry.register("lumo.co.uk", Operator::new("Lumo"));
        assert_eq!(registry.identify("news@mail.lumo.co.uk").unwrap().name, "Lumo");
        assert!(registry.identify("news@notlumo.co.uk").is_none());
    }

    #[test]
    fn test_southeastern_is_not_southern() {
        let registry = OperatorRegistry::with_defaults();
        let op = registry
            .identify("Southeastern <info@southeasternrailway.co.uk>")
            .unwrap();
        assert_eq!(op.name, "Southeastern");
        assert_eq!(op.scheme, DelayRepayScheme::DelayRepay15);
    }

    #[test]
    fn test_national_express_window() {
        let registry = OperatorRegistry::with_defaults();
        let op = registry.identify("tickets@nationalexpress.com").unwrap();
        assert_eq!(op.claim_deadline_days, 30);
        assert_eq!(op.scheme, DelayRepayScheme::Standard);
    }

    #[test]
    fn test_registry_empty() {
        let registry = OperatorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.identify("tickets@lner.co.uk").is_none());
    }

    #[test]
    fn test_custom_overrides_builtin() {
        let mut registry = OperatorRegistry::with_defaults();
        let before = registry.len();
        registry.register("LNER", Operator::new("London North Eastern Railway"));

        assert_eq!(registry.len(), before);
        assert_eq!(
            registry.identify("tickets@lner.co.uk").unwrap().name,
            "London North Eastern Railway"
        );

        registry.unregister("lner");
        assert_eq!(registry.identify("tickets@lner.co.uk").unwrap().name, "LNER");
    }

    #[test]
    fn test_find_by_name() {
        let registry = OperatorRegistry::with_defaults();
        let op = registry.find_by_name("avanti west coast").unwrap();
        assert_eq!(op.scheme, DelayRepayScheme::DelayRepay15);
        assert!(registry.find_by_name("Lumo").is_none());
    }

    #[test]
    fn test_register_many() {
        let mut registry = OperatorRegistry::new();
        registry.register_many([
            ("lumo", Operator::new("Lumo")),
            ("grandcentral", Operator::new("Grand Central")),
        ]);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_known("LUMO"));
        assert_eq!(
            registry.identify("news@grandcentralrail.com").unwrap().name,
            "Grand Central"
        );
    }

    #[test]
    fn test_is_transport_sender() {
        assert!(is_transport_sender("lner.co.uk"));
        assert!(is_transport_sender("Info.TheTrainline.com"));
        assert!(!is_transport_sender("example.com"));
        assert!(!is_transport_sender("evilgwr.com"));
    }
}
