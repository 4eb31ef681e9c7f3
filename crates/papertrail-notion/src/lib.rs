//! Notion database client.
//!
//! Covers the two operations the catalog needs: query-by-filter (duplicate
//! checks) and create-page (new entries). The property names match the
//! deployed paper database schema and must not be changed independently of
//! it.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

const API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Title property of the paper database.
pub const PROP_TITLE: &str = "タイトル";
/// DOI property, url-typed, holding the canonical `https://doi.org/...` form.
pub const PROP_DOI: &str = "doi";

#[derive(Error, Debug)]
pub enum NotionError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notion API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

/// One catalog entry, in the shape the database schema expects.
///
/// All coercion (placeholder title, numeric year, canonical DOI URL, text
/// truncation) happens before this struct is built; this crate only
/// serializes.
#[derive(Debug, Clone, Serialize)]
pub struct PaperPage {
    pub title: String,
    pub year: Option<i64>,
    pub doi_url: Option<String>,
    pub bibtex: String,
    pub read: bool,
    /// ISO-8601 creation timestamp.
    pub date: String,
    /// Originating URL, present only for URL-sourced inputs.
    pub source_url: Option<String>,
}

/// Build the duplicate-check filter: title equality, OR'd with DOI-URL
/// equality when a DOI is present.
///
/// An empty DOI contributes no clause at all — otherwise it would match
/// every record with an empty DOI field.
pub fn duplicate_filter(title: &str, doi: &str) -> serde_json::Value {
    let title_clause = serde_json::json!({
        "property": PROP_TITLE,
        "title": { "equals": title }
    });

    if doi.is_empty() {
        return title_clause;
    }

    serde_json::json!({
        "or": [
            title_clause,
            {
                "property": PROP_DOI,
                "url": { "equals": format!("https://doi.org/{}", doi) }
            }
        ]
    })
}

/// Render a [`PaperPage`] into the database's property payload.
pub fn page_properties(page: &PaperPage) -> serde_json::Value {
    let mut properties = serde_json::json!({
        (PROP_TITLE): { "title": [{ "text": { "content": page.title } }] },
        "Year": { "number": page.year },
        (PROP_DOI): { "url": page.doi_url },
        "BibTex": { "rich_text": [{ "text": { "content": page.bibtex } }] },
        "READ": { "checkbox": page.read },
        "日付": { "date": { "start": page.date } },
    });
    if let Some(ref url) = page.source_url {
        properties["URL"] = serde_json::json!({ "url": url });
    }
    properties
}

/// Thin client over the Notion REST API.
pub struct NotionClient {
    token: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl NotionClient {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            token: token.into(),
            timeout,
            http: reqwest::Client::new(),
        }
    }

    /// Query the database with the given filter; true if any record matches.
    pub async fn any_match(
        &self,
        database_id: &str,
        filter: serde_json::Value,
    ) -> Result<bool, NotionError> {
        let url = format!("{}/databases/{}/query", API_BASE, database_id);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "filter": filter }))
            .send()
            .await?;

        let data = Self::read_json(resp).await?;
        let count = data["results"].as_array().map(|a| a.len()).unwrap_or(0);
        Ok(count > 0)
    }

    /// Create a page for the entry in the database.
    pub async fn create_page(
        &self,
        database_id: &str,
        page: &PaperPage,
    ) -> Result<(), NotionError> {
        let url = format!("{}/pages", API_BASE);
        let body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": page_properties(page),
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        Self::read_json(resp).await?;
        Ok(())
    }

    async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, NotionError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or_else(|| "no error message".to_string());
            tracing::debug!(status = status.as_u16(), %message, "notion request failed");
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }
}
