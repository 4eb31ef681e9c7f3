//! Catalog capability trait and the Notion-backed implementation.

use std::future::Future;
use std::pin::Pin;

use papertrail_bib::BibRecord;
use papertrail_notion::{NotionClient, PaperPage, duplicate_filter};

use crate::doi_url;

/// Raw text is capped at this many characters before persistence.
pub const RAW_TEXT_CAP: usize = 2000;

/// The record store holding ingested papers.
///
/// Two operations: an advisory duplicate check (title equality OR
/// DOI-URL equality; title only when the DOI is empty) and entry creation.
pub trait Catalog: Send + Sync {
    fn find_duplicate<'a>(
        &'a self,
        title: &'a str,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, String>> + Send + 'a>>;

    fn create_entry<'a>(
        &'a self,
        entry: &'a NewEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;
}

/// A catalog entry ready to persist, with all write-time coercion applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Never empty: an extracted empty title becomes "Untitled" here.
    pub title: String,
    /// Present only when the year field was all digits.
    pub year: Option<i64>,
    /// Canonical `https://doi.org/...` form, absent for records without one.
    pub doi_url: Option<String>,
    /// Original record text, truncated to [`RAW_TEXT_CAP`] characters.
    pub raw_text: String,
    pub read: bool,
    /// ISO-8601 wall-clock timestamp taken at write time.
    pub date: String,
    /// Originating URL, recorded only for URL-sourced inputs.
    pub source_url: Option<String>,
}

impl NewEntry {
    /// Coerce a parsed record into its persisted form.
    pub fn from_record(record: &BibRecord, source_url: Option<&str>) -> Self {
        Self {
            title: if record.title.is_empty() {
                "Untitled".to_string()
            } else {
                record.title.clone()
            },
            year: coerce_year(&record.year),
            doi_url: if record.doi.is_empty() {
                None
            } else {
                Some(doi_url(&record.doi))
            },
            raw_text: truncate_chars(&record.raw_text, RAW_TEXT_CAP),
            read: false,
            date: chrono::Local::now().to_rfc3339(),
            source_url: source_url.map(String::from),
        }
    }
}

/// Year becomes a number only when the field is entirely digits; `"n.d."`
/// and friends stay absent rather than becoming 0 or an error.
fn coerce_year(year: &str) -> Option<i64> {
    if !year.is_empty() && year.chars().all(|c| c.is_ascii_digit()) {
        year.parse().ok()
    } else {
        None
    }
}

fn truncate_chars(text: &str, cap: usize) -> String {
    text.chars().take(cap).collect()
}

/// [`Catalog`] backed by a Notion database.
pub struct NotionBackend {
    client: NotionClient,
    database_id: String,
}

impl NotionBackend {
    pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }
}

impl Catalog for NotionBackend {
    fn find_duplicate<'a>(
        &'a self,
        title: &'a str,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, String>> + Send + 'a>> {
        Box::pin(async move {
            let filter = duplicate_filter(title, doi);
            self.client
                .any_match(&self.database_id, filter)
                .await
                .map_err(|e| e.to_string())
        })
    }

    fn create_entry<'a>(
        &'a self,
        entry: &'a NewEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>> {
        Box::pin(async move {
            let page = PaperPage {
                title: entry.title.clone(),
                year: entry.year,
                doi_url: entry.doi_url.clone(),
                bibtex: entry.raw_text.clone(),
                read: entry.read,
                date: entry.date.clone(),
                source_url: entry.source_url.clone(),
            };
            self.client
                .create_page(&self.database_id, &page)
                .await
                .map_err(|e| e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, year: &str, doi: &str) -> BibRecord {
        BibRecord {
            title: title.to_string(),
            year: year.to_string(),
            doi: doi.to_string(),
            raw_text: format!("@article{{k, title={{{}}}}}", title),
        }
    }

    // ── year coercion ──────────────────────────────────────────────────

    #[test]
    fn digit_year_becomes_number() {
        let entry = NewEntry::from_record(&record("T", "2020", ""), None);
        assert_eq!(entry.year, Some(2020));
    }

    #[test]
    fn non_digit_year_is_absent() {
        let entry = NewEntry::from_record(&record("T", "n.d.", ""), None);
        assert_eq!(entry.year, None);
    }

    #[test]
    fn empty_year_is_absent() {
        let entry = NewEntry::from_record(&record("T", "", ""), None);
        assert_eq!(entry.year, None);
    }

    #[test]
    fn mixed_year_is_absent() {
        let entry = NewEntry::from_record(&record("T", "2020a", ""), None);
        assert_eq!(entry.year, None);
    }

    // ── title placeholder ──────────────────────────────────────────────

    #[test]
    fn empty_title_becomes_untitled() {
        let entry = NewEntry::from_record(&record("", "2020", ""), None);
        assert_eq!(entry.title, "Untitled");
    }

    #[test]
    fn nonempty_title_kept() {
        let entry = NewEntry::from_record(&record("A Paper", "2020", ""), None);
        assert_eq!(entry.title, "A Paper");
    }

    // ── DOI rendering ──────────────────────────────────────────────────

    #[test]
    fn doi_rendered_as_url() {
        let entry = NewEntry::from_record(&record("T", "", "10.1/x"), None);
        assert_eq!(entry.doi_url.as_deref(), Some("https://doi.org/10.1/x"));
    }

    #[test]
    fn empty_doi_is_absent() {
        let entry = NewEntry::from_record(&record("T", "", ""), None);
        assert_eq!(entry.doi_url, None);
    }

    // ── truncation ─────────────────────────────────────────────────────

    #[test]
    fn long_raw_text_truncated_to_cap() {
        let mut rec = record("T", "", "");
        rec.raw_text = "x".repeat(RAW_TEXT_CAP + 500);
        let entry = NewEntry::from_record(&rec, None);
        assert_eq!(entry.raw_text.chars().count(), RAW_TEXT_CAP);
    }

    #[test]
    fn short_raw_text_unmodified() {
        let mut rec = record("T", "", "");
        rec.raw_text = "@article{k}".to_string();
        let entry = NewEntry::from_record(&rec, None);
        assert_eq!(entry.raw_text, "@article{k}");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let mut rec = record("T", "", "");
        rec.raw_text = "é".repeat(RAW_TEXT_CAP + 1);
        let entry = NewEntry::from_record(&rec, None);
        assert_eq!(entry.raw_text.chars().count(), RAW_TEXT_CAP);
    }

    // ── misc ───────────────────────────────────────────────────────────

    #[test]
    fn read_flag_starts_false() {
        let entry = NewEntry::from_record(&record("T", "", ""), None);
        assert!(!entry.read);
    }

    #[test]
    fn source_url_recorded_verbatim() {
        let entry = NewEntry::from_record(&record("T", "", ""), Some("https://doi.org/10.1/x"));
        assert_eq!(entry.source_url.as_deref(), Some("https://doi.org/10.1/x"));
    }
}
