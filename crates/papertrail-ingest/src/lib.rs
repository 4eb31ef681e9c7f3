//! Input fetching and record extraction.
//!
//! [`fetch`] resolves an input reference into a readable local file,
//! downloading URLs into temporary files whose deletion is tied to the
//! handle's lifetime. [`RecordExtractor`] is the swappable extraction
//! capability; [`Pdf2Bib`] is the production backend wrapping the external
//! tool of the same name.

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("retrieval failed for {url}: {reason}")]
    Retrieval { url: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An input reference: a file already on disk, or a URL to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    pub fn is_url(&self) -> bool {
        matches!(self, Source::Url(_))
    }

    /// The originating URL, when there is one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Source::Url(u) => Some(u),
            Source::Path(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Url(u) => write!(f, "{}", u),
        }
    }
}

/// A fetched input, readable at [`path()`](FetchedFile::path).
///
/// Local inputs are borrowed: the file is the caller's and is never
/// deleted. Downloaded inputs own their temporary file, which is removed
/// exactly once when the handle drops, regardless of how the surrounding
/// processing exits.
pub enum FetchedFile {
    Local(PathBuf),
    Downloaded(tempfile::NamedTempFile),
}

impl FetchedFile {
    pub fn path(&self) -> &Path {
        match self {
            FetchedFile::Local(p) => p,
            FetchedFile::Downloaded(t) => t.path(),
        }
    }
}

/// Resolves an input reference into a local file.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        source: &'a Source,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedFile, IngestError>> + Send + 'a>>;
}

/// Production fetcher: passes local paths through, downloads URLs.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        source: &'a Source,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedFile, IngestError>> + Send + 'a>> {
        Box::pin(async move {
            match source {
                Source::Path(p) => Ok(FetchedFile::Local(p.clone())),
                Source::Url(url) => download(&self.client, url, self.timeout).await,
            }
        })
    }
}

/// Download a URL into a fresh temporary file.
async fn download(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<FetchedFile, IngestError> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| IngestError::Retrieval {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(IngestError::Retrieval {
            url: url.to_string(),
            reason: format!("HTTP {}", status),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| IngestError::Retrieval {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix("papertrail-")
        .suffix(".pdf")
        .tempfile()?;
    tmp.as_file_mut().write_all(&bytes)?;
    tracing::debug!(url, bytes = bytes.len(), path = %tmp.path().display(), "downloaded input");

    Ok(FetchedFile::Downloaded(tmp))
}

/// Extraction capability: local file in, raw record text out.
///
/// `None` means "no record obtainable" — the caller logs it and gives up on
/// that reference only.
pub trait RecordExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
}

/// Runs the external `pdf2bib` tool and captures its stdout.
pub struct Pdf2Bib {
    command: String,
}

impl Pdf2Bib {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for Pdf2Bib {
    fn default() -> Self {
        Self::new("pdf2bib")
    }
}

impl RecordExtractor for Pdf2Bib {
    fn name(&self) -> &str {
        "pdf2bib"
    }

    fn extract<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            let output = match tokio::process::Command::new(&self.command)
                .arg(path)
                .output()
                .await
            {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(command = %self.command, error = %e, "failed to run extraction tool");
                    return None;
                }
            };

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!(
                    command = %self.command,
                    status = %output.status,
                    stderr = %stderr.trim(),
                    "extraction tool failed"
                );
                return None;
            }

            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            if stdout.trim().is_empty() {
                None
            } else {
                Some(stdout)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_path_passes_through() {
        let fetcher = HttpFetcher::new(reqwest::Client::new(), Duration::from_secs(5));
        let source = Source::Path(PathBuf::from("/some/paper.pdf"));
        let fetched = fetcher.fetch(&source).await.unwrap();
        assert_eq!(fetched.path(), Path::new("/some/paper.pdf"));
        // Dropping a Local handle must not touch the caller's file; nothing
        // to assert here beyond it not being a Downloaded variant.
        assert!(matches!(fetched, FetchedFile::Local(_)));
    }

    #[test]
    fn downloaded_file_removed_on_drop() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        assert!(path.exists());
        let fetched = FetchedFile::Downloaded(tmp);
        drop(fetched);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_tool_yields_none() {
        let extractor = Pdf2Bib::new("definitely-not-a-real-command");
        assert!(extractor.extract(Path::new("/x.pdf")).await.is_none());
    }

    #[tokio::test]
    async fn nonzero_exit_yields_none() {
        let extractor = Pdf2Bib::new("false");
        assert!(extractor.extract(Path::new("/x.pdf")).await.is_none());
    }

    #[tokio::test]
    async fn stdout_is_captured() {
        // `echo` prints its argument, standing in for a tool that writes the
        // record to stdout.
        let extractor = Pdf2Bib::new("echo");
        let out = extractor.extract(Path::new("/x.pdf")).await.unwrap();
        assert_eq!(out.trim(), "/x.pdf");
    }
}
