//! Error types for the trainalyze crate.
//!
//! Extraction itself never fails: a message that cannot be understood simply
//! yields no candidate. The errors here come from configuration, the mail
//! session, and the fetch step that surrounds extraction. Use
//! [`Error::is_retryable`] and [`Error::requires_reauth`] to decide which
//! prompt the calling layer should show.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning a mailbox.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Session errors (NOT retryable, user must re-authenticate)
    // ─────────────────────────────────────────────────────────────────────────
    /// The mail session has expired and carries no refresh token.
    #[error("mail session for {email} expired at {expired_at}")]
    SessionExpired {
        /// The account the session belongs to.
        email: String,
        /// When the access token expired.
        expired_at: chrono::DateTime<chrono::Utc>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Fetch errors (RETRYABLE unless the fetcher says otherwise)
    // ─────────────────────────────────────────────────────────────────────────
    /// The fetcher did not return within the configured timeout.
    #[error("fetch from {fetcher} timed out after {timeout:?}")]
    FetchTimeout {
        /// Description of the fetcher.
        fetcher: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The mail provider reported a failure.
    #[error("mail provider error: {message}")]
    Upstream {
        /// Provider-supplied description.
        message: String,
        /// Whether the provider considers the failure transient.
        retryable: bool,
    },

    /// Failed to read from a local mailbox export.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Email parsing errors (NOT retryable - malformed content won't change)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse a raw email message.
    #[error("failed to parse email")]
    ParseEmail {
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    /// A header required to build a [`Message`](crate::Message) is absent or unreadable.
    #[error("email has no usable {header} header")]
    MissingHeader {
        /// Name of the header.
        header: &'static str,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// ```
    /// use trainalyze::Error;
    /// use std::time::Duration;
    ///
    /// let err = Error::FetchTimeout { fetcher: "gmail".into(), timeout: Duration::from_secs(30) };
    /// assert!(err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::FetchTimeout { .. } | Error::Io { .. } => true,
            Error::Upstream { retryable, .. } => *retryable,

            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::SessionExpired { .. }
            | Error::ParseEmail { .. }
            | Error::MissingHeader { .. } => false,
        }
    }

    /// Returns `true` if the user has to reconnect their mailbox before scanning again.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Error::SessionExpired { .. })
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEmailFormat { .. } | Error::InvalidConfig { .. } => {
                ErrorCategory::Configuration
            }
            Error::SessionExpired { .. } => ErrorCategory::Authentication,
            Error::FetchTimeout { .. } => ErrorCategory::Timeout,
            Error::Upstream { .. } => ErrorCategory::Upstream,
            Error::Io { .. } => ErrorCategory::Io,
            Error::ParseEmail { .. } | Error::MissingHeader { .. } => ErrorCategory::Parse,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Expired or otherwise unusable mail session.
    Authentication,
    /// Timeout errors.
    Timeout,
    /// Failures reported by the mail provider.
    Upstream,
    /// Local file access errors.
    Io,
    /// Email parsing errors.
    Parse,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Authentication => write!(f, "authentication"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Upstream => write!(f, "upstream"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Parse => write!(f, "parse"),
        }
    }
}
