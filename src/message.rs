//! The raw email handed from a fetcher to the extractor.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use mailparse::{parse_mail, MailAddr, MailHeaderMap, ParsedMail};
use tracing::debug;

/// A single email as returned by a [`Fetcher`](crate::Fetcher).
///
/// Messages are immutable once built; the extractor only ever borrows them.
///
/// # Example
///
/// ```
/// use trainalyze::Message;
/// use chrono::Utc;
///
/// let message = Message::new(
///     "msg-1",
///     "Your e-ticket",
///     "Booking reference: ABC12345",
///     "LNER <tickets@lner.co.uk>",
///     Utc::now(),
/// );
/// assert_eq!(message.sender_domain().as_deref(), Some("lner.co.uk"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: String,
    subject: String,
    body: String,
    sender: String,
    received: DateTime<Utc>,
}

impl Message {
    /// Creates a message from already-decoded parts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
        received: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            received,
        }
    }

    /// Parses a raw RFC 822 message.
    ///
    /// Headers are decoded (RFC 2047 encoded words included). The body is the
    /// first `text/plain` part, or failing that the first `text/html` part,
    /// searching nested multiparts depth-first. A message with no text part
    /// gets an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseEmail`] if the message structure cannot be parsed,
    /// or [`Error::MissingHeader`] if there is no parseable `Date` header.
    ///
    /// # Example
    ///
    /// ```
    /// use trainalyze::Message;
    ///
    /// let raw = b"From: GWR <noreply@gwr.com>\r\n\
    /// Subject: Delay Repay claim received\r\n\
    /// Date: Tue, 4 Mar 2025 09:12:00 +0000\r\n\
    /// \r\n\
    /// We have received your claim.";
    ///
    /// let message = Message::from_rfc822("1", raw).unwrap();
    /// assert_eq!(message.subject(), "Delay Repay claim received");
    /// assert!(message.body().contains("received your claim"));
    /// ```
    pub fn from_rfc822(id: impl Into<String>, raw: &[u8]) -> Result<Self> {
        let parsed = parse_mail(raw).map_err(|source| Error::ParseEmail { source })?;

        let subject = parsed
            .headers
            .get_first_value("Subject")
            .unwrap_or_default();
        let sender = parsed.headers.get_first_value("From").unwrap_or_default();

        let received = parsed
            .headers
            .get_first_value("Date")
            .and_then(|value| mailparse::dateparse(&value).ok())
            .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
            .ok_or(Error::MissingHeader { header: "Date" })?;

        let body = extract_body_text(&parsed).map_err(|source| Error::ParseEmail { source })?;

        Ok(Self {
            id: id.into(),
            subject,
            body,
            sender,
            received,
        })
    }

    /// Returns the provider's identifier for this message.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the decoded subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the body, plain text or HTML.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the raw `From` value, e.g. `LNER <tickets@lner.co.uk>`.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns when the message was received.
    #[must_use]
    pub fn received(&self) -> DateTime<Utc> {
        self.received
    }

    /// Returns the lower-cased domain of the sender address, if one can be found.
    #[must_use]
    pub fn sender_domain(&self) -> Option<String> {
        sender_domain(&self.sender)
    }
}

/// Lower-cased domain of the address in a `From` header value.
pub(crate) fn sender_domain(sender: &str) -> Option<String> {
    sender_address(sender)
        .and_then(|addr| addr.rsplit_once('@').map(|(_, domain)| domain.to_string()))
        .map(|domain| domain.trim().trim_end_matches('>').to_lowercase())
        .filter(|domain| !domain.is_empty())
}

/// Pulls the bare address out of a `From` header value.
fn sender_address(sender: &str) -> Option<String> {
    match mailparse::addrparse(sender) {
        Ok(list) => list.iter().find_map(|addr| match addr {
            MailAddr::Single(info) => Some(info.addr.clone()),
            MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
        }),
        Err(e) => {
            debug!(error = %e, "Unparseable sender, falling back to raw value");
            sender.contains('@').then(|| sender.to_string())
        }
    }
}

/// Extracts text content from a parsed email, preferring plain text over HTML.
fn extract_body_text(parsed: &ParsedMail<'_>) -> std::result::Result<String, mailparse::MailParseError> {
    if parsed.subparts.is_empty() {
        return parsed.get_body();
    }

    for mimetype in ["text/plain", "text/html"] {
        if let Some(part) = find_part(parsed, mimetype) {
            return part.get_body();
        }
    }

    Ok(String::new())
}

/// Depth-first search for the first leaf part with the given MIME type.
fn find_part<'b, 'a>(parsed: &'b ParsedMail<'a>, mimetype: &str) -> Option<&'b ParsedMail<'a>> {
    if parsed.subparts.is_empty() {
        return parsed
            .ctype
            .mimetype
            .eq_ignore_ascii_case(mimetype)
            .then_some(parsed);
    }
    parsed
        .subparts
        .iter()
        .find_map(|part| find_part(part, mimetype))
}
