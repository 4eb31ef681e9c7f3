//! Reference-list capability and the Crossref-backed implementation.

use std::future::Future;
use std::pin::Pin;

use papertrail_crossref::CrossrefClient;

/// Looks up the DOIs cited by a work.
pub trait ReferenceSource: Send + Sync {
    /// The canonical name of this source (e.g., "Crossref").
    fn name(&self) -> &str;

    /// The cited DOIs of the work identified by `doi`, in citation order.
    /// References without a DOI of their own are not included.
    fn references<'a>(
        &'a self,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, String>> + Send + 'a>>;
}

/// [`ReferenceSource`] backed by the Crossref works API.
pub struct CrossrefSource {
    client: CrossrefClient,
}

impl CrossrefSource {
    pub fn new(client: CrossrefClient) -> Self {
        Self { client }
    }
}

impl ReferenceSource for CrossrefSource {
    fn name(&self) -> &str {
        "Crossref"
    }

    fn references<'a>(
        &'a self,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, String>> + Send + 'a>> {
        Box::pin(async move { self.client.cited_dois(doi).await.map_err(|e| e.to_string()) })
    }
}
