//! Fetching from a directory of exported `.eml` files.

use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, SearchQuery};
use crate::message::Message;
use crate::session::MailSession;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Reads messages from `*.eml` files in a single directory.
///
/// Each file becomes one [`Message`] whose id is the file stem. Files that
/// cannot be read or parsed, or that carry no `Date` header, are logged and
/// skipped. Subdirectories are not searched.
///
/// # Example
///
/// ```no_run
/// use trainalyze::{EmlDirectoryFetcher, MailSession, ScanConfig, Scanner};
///
/// # async fn example() -> trainalyze::Result<()> {
/// let fetcher = EmlDirectoryFetcher::new("./exported-mail");
/// let scanner = Scanner::new(fetcher, ScanConfig::default());
/// let session = MailSession::new("me@example.com", "local")?;
///
/// let report = scanner.scan(&session).await?;
/// println!("{} refund opportunities", report.opportunities.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EmlDirectoryFetcher {
    dir: PathBuf,
    description: String,
}

impl EmlDirectoryFetcher {
    /// Creates a fetcher over `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            description: format!("eml directory {}", dir.display()),
            dir,
        }
    }

    /// Returns the directory being read.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[instrument(
        name = "EmlDirectoryFetcher::load",
        skip(self),
        fields(dir = %self.dir.display())
    )]
    async fn load(&self) -> Result<Vec<Message>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|source| self.io_error(source))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| self.io_error(source))?
        {
            let path = entry.path();
            if is_eml(&path) {
                paths.push(path);
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(message) = read_message(&path).await {
                messages.push(message);
            }
        }

        debug!(loaded = messages.len(), "Loaded messages from directory");
        Ok(messages)
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::Io {
            path: self.dir.clone(),
            source,
        }
    }
}

impl Fetcher for EmlDirectoryFetcher {
    fn fetch<'a>(
        &'a self,
        _session: &'a MailSession,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<Message>>> {
        Box::pin(async move {
            let messages = self.load().await?;
            Ok(query.select(messages))
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn is_eml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
}

/// Reads and parses one file, logging and returning `None` on failure.
async fn read_message(path: &Path) -> Option<Message> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read file, skipping");
            return None;
        }
    };

    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    match Message::from_rfc822(id, &raw) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                category = %e.category(),
                "Failed to parse email, skipping message"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn eml(subject: &str, date: &str) -> String {
        format!(
            "From: LNER <tickets@lner.co.uk>\r\nSubject: {subject}\r\nDate: {date}\r\n\r\nYour train was delayed.\r\n"
        )
    }

    fn query() -> SearchQuery {
        SearchQuery::for_transport(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 10, 10)
    }

    fn session() -> MailSession {
        MailSession::new("me@example.com", "local").unwrap()
    }

    #[tokio::test]
    async fn test_reads_eml_files_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.eml"), eml("First", "Mon, 3 Mar 2025 08:00:00 +0000")).unwrap();
        fs::write(dir.path().join("b.EML"), eml("Second", "Fri, 7 Mar 2025 08:00:00 +0000")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not an email").unwrap();

        let fetcher = EmlDirectoryFetcher::new(dir.path());
        let messages = fetcher.fetch(&session(), &query()).await.unwrap();

        let ids: Vec<_> = messages.iter().map(Message::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(messages[0].subject(), "Second");
    }

    #[tokio::test]
    async fn test_skips_undated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("undated.eml"),
            "From: tickets@lner.co.uk\r\nSubject: e-ticket\r\n\r\nbody",
        )
        .unwrap();
        fs::write(dir.path().join("ok.eml"), eml("e-ticket", "Mon, 3 Mar 2025 08:00:00 +0000")).unwrap();

        let fetcher = EmlDirectoryFetcher::new(dir.path());
        let messages = fetcher.fetch(&session(), &query()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id(), "ok");
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = EmlDirectoryFetcher::new(dir.path().join("does-not-exist"));

        let err = fetcher.fetch(&session(), &query()).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_description_names_directory() {
        let fetcher = EmlDirectoryFetcher::new("/tmp/mail");
        assert_eq!(fetcher.description(), "eml directory /tmp/mail");
        assert_eq!(fetcher.dir(), Path::new("/tmp/mail"));
    }
}
