//! Authenticated mail session handle.
//!
//! The OAuth handshake itself belongs to the web layer. Once it has a token,
//! it wraps it in a [`MailSession`] and hands that to a
//! [`Fetcher`](crate::Fetcher). Tokens are stored as [`SecretString`] so they
//! never end up in logs.
//!
//! ```
//! use trainalyze::MailSession;
//! use chrono::{Duration, Utc};
//!
//! let session = MailSession::new("traveller@example.com", "ya29.token")
//!     .unwrap()
//!     .with_expiry(Utc::now() + Duration::hours(1));
//!
//! assert!(!session.is_expired_at(Utc::now()));
//! assert!(!format!("{session:?}").contains("ya29"));
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};

/// An authenticated session against the user's mail provider.
#[derive(Clone)]
pub struct MailSession {
    email: EmailAddress,
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for MailSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSession")
            .field("email", &self.email.as_str())
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl MailSession {
    /// Creates a session for `email` holding `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailFormat`] if the address does not parse, or
    /// [`Error::InvalidConfig`] if the token is empty.
    pub fn new(email: &str, access_token: impl Into<String>) -> Result<Self> {
        let email = EmailAddress::parse_with_options(email, email_address::Options::default())
            .map_err(|_| Error::InvalidEmailFormat {
                email: email.to_string(),
            })?;

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "access token is required".into(),
            });
        }

        Ok(Self {
            email,
            access_token: SecretString::from(access_token),
            refresh_token: None,
            expires_at: None,
        })
    }

    /// Attaches a refresh token, allowing the web layer to renew an expired session.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the access token expiry.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the account address as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the validated account address.
    #[must_use]
    pub fn email_address(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the access token for use in provider requests.
    ///
    /// The token is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Returns the refresh token, if one was granted.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret())
    }

    /// Returns when the access token expires, if known.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns `true` if the access token has expired at `now`.
    ///
    /// A session without a known expiry never expires.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Returns `true` if an expired session can be renewed without user interaction.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Fails with [`Error::SessionExpired`] if the session is expired and cannot be refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionExpired`] when the user must reconnect.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<()> {
        match self.expires_at {
            Some(expired_at) if expired_at <= now && !self.can_refresh() => {
                Err(Error::SessionExpired {
                    email: self.email().to_string(),
                    expired_at,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_session() {
        let session = MailSession::new("user@example.com", "token-123").unwrap();
        assert_eq!(session.email(), "user@example.com");
        assert_eq!(session.access_token(), "token-123");
        assert!(session.refresh_token().is_none());
        assert!(!session.is_expired_at(now()));
    }

    #[test]
    fn test_invalid_email() {
        let err = MailSession::new("not-an-email", "token").unwrap_err();
        assert!(matches!(err, Error::InvalidEmailFormat { .. }));
    }

    #[test]
    fn test_empty_token() {
        let err = MailSession::new("user@example.com", "  ").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_tokens_not_in_debug() {
        let session = MailSession::new("user@example.com", "super-secret-access")
            .unwrap()
            .with_refresh_token("super-secret-refresh");
        let debug_str = format!("{session:?}");
        assert!(!debug_str.contains("super-secret"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_expiry() {
        let session = MailSession::new("user@example.com", "token")
            .unwrap()
            .with_expiry(now() - Duration::minutes(5));
        assert!(session.is_expired_at(now()));
        assert!(!session.is_expired_at(now() - Duration::hours(1)));

        let err = session.ensure_usable(now()).unwrap_err();
        assert!(err.requires_reauth());
    }

    #[test]
    fn test_expired_with_refresh_token_is_usable() {
        let session = MailSession::new("user@example.com", "token")
            .unwrap()
            .with_refresh_token("refresh")
            .with_expiry(now() - Duration::minutes(5));
        assert!(session.is_expired_at(now()));
        assert!(session.can_refresh());
        assert!(session.ensure_usable(now()).is_ok());
        assert_eq!(session.refresh_token(), Some("refresh"));
    }
}
