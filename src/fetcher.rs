//! The mail-access seam.
//!
//! A [`Fetcher`] turns a [`MailSession`] and a [`SearchQuery`] into raw
//! [`Message`]s. Provider clients (Gmail, Outlook, IMAP) live outside this
//! crate and implement the trait; [`InMemoryFetcher`] and
//! [`EmlDirectoryFetcher`](crate::EmlDirectoryFetcher) cover tests and
//! exported mailboxes.

use crate::error::Result;
use crate::keywords::SUBJECT_QUERY_KEYWORDS;
use crate::message::Message;
use crate::operators::{domain_matches, TRANSPORT_SENDER_DOMAINS};
use crate::session::MailSession;
use chrono::NaiveDate;
use futures::future::BoxFuture;
use std::cmp::Reverse;

/// What to ask the mail provider for.
///
/// A message qualifies if it comes from one of `sender_domains` or its
/// subject contains one of `subject_keywords`, and it was received on or
/// after `after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Sender domains; subdomains match too.
    pub sender_domains: Vec<String>,
    /// Subject phrases, matched case-insensitively.
    pub subject_keywords: Vec<String>,
    /// Earliest day to include.
    pub after: NaiveDate,
    /// Upper bound on messages returned.
    pub max_results: usize,
}

impl SearchQuery {
    /// Builds the standard transport query: every known transport sender
    /// plus the first `keyword_limit` subject keywords.
    ///
    /// # Example
    ///
    /// ```
    /// use trainalyze::SearchQuery;
    /// use chrono::NaiveDate;
    ///
    /// let after = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    /// let query = SearchQuery::for_transport(after, 300, 2);
    /// assert_eq!(query.subject_keywords, vec!["e-ticket", "booking confirmation"]);
    /// assert!(query.to_provider_query().ends_with("after:2024/06/01"));
    /// ```
    #[must_use]
    pub fn for_transport(after: NaiveDate, max_results: usize, keyword_limit: usize) -> Self {
        Self {
            sender_domains: TRANSPORT_SENDER_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            subject_keywords: SUBJECT_QUERY_KEYWORDS
                .iter()
                .take(keyword_limit)
                .map(|k| (*k).to_string())
                .collect(),
            after,
            max_results,
        }
    }

    /// Renders the query in Gmail search syntax.
    ///
    /// `(from:a.com OR from:b.com) OR subject:("k1" OR "k2") after:YYYY/MM/DD`
    #[must_use]
    pub fn to_provider_query(&self) -> String {
        let mut parts = Vec::with_capacity(2);

        if !self.sender_domains.is_empty() {
            let senders: Vec<String> = self
                .sender_domains
                .iter()
                .map(|d| format!("from:{d}"))
                .collect();
            parts.push(format!("({})", senders.join(" OR ")));
        }
        if !self.subject_keywords.is_empty() {
            let keywords: Vec<String> = self
                .subject_keywords
                .iter()
                .map(|k| format!("\"{}\"", k.replace('"', "")))
                .collect();
            parts.push(format!("subject:({})", keywords.join(" OR ")));
        }

        let after = format!("after:{}", self.after.format("%Y/%m/%d"));
        if parts.is_empty() {
            after
        } else {
            format!("{} {after}", parts.join(" OR "))
        }
    }

    /// Evaluates the query locally against a message.
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        if message.received().date_naive() < self.after {
            return false;
        }

        let from_sender = message.sender_domain().is_some_and(|domain| {
            self.sender_domains
                .iter()
                .any(|known| domain_matches(&domain, known))
        });
        if from_sender {
            return true;
        }

        let subject = message.subject().to_lowercase();
        self.subject_keywords
            .iter()
            .any(|k| subject.contains(&k.to_lowercase()))
    }

    /// Keeps matching messages, newest first, capped at `max_results`.
    ///
    /// Messages received at the same instant keep their input order.
    pub(crate) fn select(&self, messages: impl IntoIterator<Item = Message>) -> Vec<Message> {
        let mut selected: Vec<Message> = messages.into_iter().filter(|m| self.matches(m)).collect();
        selected.sort_by_key(|m| Reverse(m.received()));
        selected.truncate(self.max_results);
        selected
    }
}

/// Source of raw messages for a scan.
///
/// Implementations must be cheap to share across tasks. The returned future
/// borrows the fetcher, session and query for its lifetime.
///
/// # Example
///
/// ```
/// use trainalyze::{Fetcher, MailSession, Message, Result, SearchQuery};
/// use futures::future::BoxFuture;
///
/// struct EmptyMailbox;
///
/// impl Fetcher for EmptyMailbox {
///     fn fetch<'a>(
///         &'a self,
///         _session: &'a MailSession,
///         _query: &'a SearchQuery,
///     ) -> BoxFuture<'a, Result<Vec<Message>>> {
///         Box::pin(async { Ok(Vec::new()) })
///     }
///
///     fn description(&self) -> &str {
///         "empty mailbox"
///     }
/// }
/// ```
pub trait Fetcher: Send + Sync {
    /// Fetches the messages matching `query` from the account behind `session`.
    ///
    /// # Errors
    ///
    /// Implementations report provider failures as
    /// [`Error::Upstream`](crate::Error::Upstream) and local I/O failures as
    /// [`Error::Io`](crate::Error::Io).
    fn fetch<'a>(
        &'a self,
        session: &'a MailSession,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<Message>>>;

    /// Returns a short name for this fetcher, used in logs and errors.
    fn description(&self) -> &str;
}

/// A fetcher over a fixed list of messages.
///
/// # Example
///
/// ```
/// use trainalyze::{Fetcher, InMemoryFetcher, MailSession, Message, SearchQuery};
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// # async fn example() -> trainalyze::Result<()> {
/// let fetcher = InMemoryFetcher::new(vec![Message::new(
///     "1",
///     "Your e-ticket",
///     "",
///     "tickets@lner.co.uk",
///     Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
/// )]);
/// let session = MailSession::new("me@example.com", "token")?;
/// let query = SearchQuery::for_transport(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 10, 10);
///
/// let messages = fetcher.fetch(&session, &query).await?;
/// assert_eq!(messages.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    messages: Vec<Message>,
}

impl InMemoryFetcher {
    /// Creates a fetcher over `messages`.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Adds a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no messages are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Fetcher for InMemoryFetcher {
    fn fetch<'a>(
        &'a self,
        _session: &'a MailSession,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<Message>>> {
        Box::pin(async move { Ok(query.select(self.messages.iter().cloned())) })
    }

    fn description(&self) -> &str {
        "in-memory"
    }
}
