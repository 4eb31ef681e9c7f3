//! Crossref works client.
//!
//! Fetches the reference list of a work by DOI. Only references that carry
//! their own DOI are returned; the rest cannot be resolved further and are
//! dropped.

use std::time::Duration;

use thiserror::Error;

const API_BASE: &str = "https://api.crossref.org";

#[derive(Error, Debug)]
pub enum CrossrefError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Crossref lookup failed: HTTP {0}")]
    Status(u16),
}

/// Crossref REST API client.
pub struct CrossrefClient {
    /// Contact address for the polite pool, appended as `mailto`.
    pub mailto: Option<String>,
    timeout: Duration,
    http: reqwest::Client,
}

impl CrossrefClient {
    pub fn new(mailto: Option<String>, timeout: Duration) -> Self {
        Self {
            mailto,
            timeout,
            http: reqwest::Client::new(),
        }
    }

    /// Fetch the DOIs cited by the work identified by `doi`.
    ///
    /// Returns them in citation order. A work without a reference list
    /// yields an empty vec.
    pub async fn cited_dois(&self, doi: &str) -> Result<Vec<String>, CrossrefError> {
        let mut url = format!("{}/works/{}", API_BASE, urlencoding::encode(doi));

        let user_agent = if let Some(ref email) = self.mailto {
            url.push_str(&format!("?mailto={}", urlencoding::encode(email)));
            format!("papertrail/0.1 (mailto:{})", email)
        } else {
            "papertrail/0.1".to_string()
        };

        let resp = self
            .http
            .get(&url)
            .header("User-Agent", user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CrossrefError::Status(status.as_u16()));
        }

        let data: serde_json::Value = resp.json().await?;
        Ok(reference_dois(&data))
    }
}

/// Pull the cited DOIs out of a Crossref work response.
///
/// Reads `message.reference[].DOI`, skipping entries without one.
pub fn reference_dois(work: &serde_json::Value) -> Vec<String> {
    let Some(references) = work["message"]["reference"].as_array() else {
        return vec![];
    };

    references
        .iter()
        .filter_map(|r| r["DOI"].as_str())
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_dois_in_order() {
        let work = serde_json::json!({
            "message": {
                "reference": [
                    { "key": "r1", "DOI": "10.1/a" },
                    { "key": "r2", "unstructured": "Some book, 1999" },
                    { "key": "r3", "DOI": "10.1/b" },
                ]
            }
        });
        assert_eq!(reference_dois(&work), vec!["10.1/a", "10.1/b"]);
    }

    #[test]
    fn missing_reference_list_is_empty() {
        let work = serde_json::json!({ "message": { "title": ["No refs here"] } });
        assert!(reference_dois(&work).is_empty());
    }

    #[test]
    fn blank_dois_are_dropped() {
        let work = serde_json::json!({
            "message": { "reference": [ { "DOI": "  " }, { "DOI": "10.2/c" } ] }
        });
        assert_eq!(reference_dois(&work), vec!["10.2/c"]);
    }

    #[test]
    fn non_object_payload_is_empty() {
        assert!(reference_dois(&serde_json::json!(null)).is_empty());
        assert!(reference_dois(&serde_json::json!({"message": {"reference": "bad"}})).is_empty());
    }
}
