//! Configuration for a mailbox scan.
//!
//! Use [`ScanConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use trainalyze::ScanConfig;
//! use std::time::Duration;
//!
//! let config = ScanConfig::builder()
//!     .lookback_days(90)
//!     .fetch_timeout(Duration::from_secs(10))
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.max_messages, 300);
//! ```

use crate::error::{Error, Result};
use crate::operators::{Operator, OperatorRegistry};
use std::time::Duration;

/// Default cap on messages fetched per scan.
pub const DEFAULT_MAX_MESSAGES: usize = 300;
/// Default search window, in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;
/// Default number of subject keywords sent to the provider search.
pub const DEFAULT_KEYWORD_QUERY_LIMIT: usize = 10;
/// Default bound on the fetch step.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`Scanner`](crate::Scanner).
///
/// Create using [`ScanConfig::builder()`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum number of messages requested from the fetcher.
    pub max_messages: usize,
    /// How far back to search, in days.
    pub lookback_days: u32,
    /// Timeout for the whole fetch step.
    pub fetch_timeout: Duration,
    /// How many subject keywords go into the provider query.
    pub keyword_query_limit: usize,
    operators: OperatorRegistry,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            keyword_query_limit: DEFAULT_KEYWORD_QUERY_LIMIT,
            operators: OperatorRegistry::with_defaults(),
        }
    }
}

impl ScanConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Returns the operator registry used to identify merchants.
    #[must_use]
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    max_messages: Option<usize>,
    lookback_days: Option<u32>,
    fetch_timeout: Option<Duration>,
    keyword_query_limit: Option<usize>,
    operators: Option<OperatorRegistry>,
}

impl ScanConfigBuilder {
    /// Sets the maximum number of messages fetched (default 300).
    #[must_use]
    pub fn max_messages(mut self, max: usize) -> Self {
        self.max_messages = Some(max);
        self
    }

    /// Sets how many days back to search (default 365).
    #[must_use]
    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Sets the fetch timeout (default 30 seconds).
    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Sets how many subject keywords are sent to the provider (default 10).
    #[must_use]
    pub fn keyword_query_limit(mut self, limit: usize) -> Self {
        self.keyword_query_limit = Some(limit);
        self
    }

    /// Replaces the operator registry.
    ///
    /// # Example
    ///
    /// ```
    /// use trainalyze::operators::{Operator, OperatorRegistry};
    /// use trainalyze::ScanConfig;
    ///
    /// let mut registry = OperatorRegistry::new();
    /// registry.register("lumo", Operator::new("Lumo"));
    ///
    /// let config = ScanConfig::builder().operators(registry).build().unwrap();
    /// assert_eq!(config.operators().len(), 1);
    /// ```
    #[must_use]
    pub fn operators(mut self, registry: OperatorRegistry) -> Self {
        self.operators = Some(registry);
        self
    }

    /// Adds one operator on top of the current registry (built-ins by default).
    #[must_use]
    pub fn register_operator(mut self, key: impl Into<String>, operator: Operator) -> Self {
        self.operators
            .get_or_insert_with(OperatorRegistry::with_defaults)
            .register(key, operator);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any limit is zero.
    pub fn build(self) -> Result<ScanConfig> {
        let max_messages = self.max_messages.unwrap_or(DEFAULT_MAX_MESSAGES);
        if max_messages == 0 {
            return Err(invalid("max_messages must be greater than zero"));
        }

        let lookback_days = self.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS);
        if lookback_days == 0 {
            return Err(invalid("lookback_days must be greater than zero"));
        }

        let fetch_timeout = self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT);
        if fetch_timeout.is_zero() {
            return Err(invalid("fetch_timeout must be greater than zero"));
        }

        let keyword_query_limit = self
            .keyword_query_limit
            .unwrap_or(DEFAULT_KEYWORD_QUERY_LIMIT);
        if keyword_query_limit == 0 {
            return Err(invalid("keyword_query_limit must be greater than zero"));
        }

        Ok(ScanConfig {
            max_messages,
            lookback_days,
            fetch_timeout,
            keyword_query_limit,
            operators: self.operators.unwrap_or_else(OperatorRegistry::with_defaults),
        })
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ScanConfig::builder().build().unwrap();
        assert_eq!(config.max_messages, 300);
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.keyword_query_limit, 10);
        assert!(config.operators().is_known("lner"));
    }

    #[test]
    fn test_builder_full() {
        let config = ScanConfig::builder()
            .max_messages(50)
            .lookback_days(30)
            .fetch_timeout(Duration::from_secs(5))
            .keyword_query_limit(20)
            .build()
            .unwrap();

        assert_eq!(config.max_messages, 50);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.keyword_query_limit, 20);
    }

    #[test]
    fn test_builder_rejects_zero_limits() {
        for builder in [
            ScanConfig::builder().max_messages(0),
            ScanConfig::builder().lookback_days(0),
            ScanConfig::builder().fetch_timeout(Duration::ZERO),
            ScanConfig::builder().keyword_query_limit(0),
        ] {
            let err = builder.build().unwrap_err();
            assert!(matches!(err, Error::InvalidConfig { .. }));
        }
    }

    #[test]
    fn test_register_operator_keeps_defaults() {
        let config = ScanConfig::builder()
            .register_operator("lumo", Operator::new("Lumo"))
            .build()
            .unwrap();

        assert!(config.operators().is_known("lumo"));
        assert!(config.operators().is_known("gwr"));
    }

    #[test]
    fn test_custom_registry_without_defaults() {
        let config = ScanConfig::builder()
            .operators(OperatorRegistry::new())
            .register_operator("lumo", Operator::new("Lumo"))
            .build()
            .unwrap();

        assert_eq!(config.operators().len(), 1);
        assert!(!config.operators().is_known("gwr"));
    }

    #[test]
    fn test_default_matches_builder() {
        let config = ScanConfig::default();
        assert_eq!(config.max_messages, DEFAULT_MAX_MESSAGES);
        assert_eq!(config.operators().len(), OperatorRegistry::with_defaults().len());
    }
}
