//! Catalog write policy.

use papertrail_bib::BibRecord;

use crate::catalog::{Catalog, NewEntry};
use crate::confirm::ConfirmPolicy;

/// The write decision for one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Skipped because the duplicate check matched and force was off.
    DuplicateSkip,
    /// Skipped because the user declined the untitled-record prompt.
    Declined,
}

/// One write request with the decision inputs.
pub struct WriteRequest<'a> {
    pub record: &'a BibRecord,
    /// Result of the advisory duplicate check.
    pub duplicate: bool,
    pub force: bool,
    /// Set when the input came from a URL; only then is an empty title
    /// worth a confirmation, and only then is the URL stored as provenance.
    pub source_url: Option<&'a str>,
}

/// Apply the write policy and create the entry when it calls for one.
///
/// Duplicates are skipped unless forced. An empty title on a URL-sourced
/// record goes through the confirmation gate before being stored as
/// "Untitled". Errors from the catalog propagate to the caller.
pub async fn write_record(
    catalog: &dyn Catalog,
    confirm: &dyn ConfirmPolicy,
    req: WriteRequest<'_>,
) -> Result<WriteOutcome, String> {
    if req.duplicate && !req.force {
        return Ok(WriteOutcome::DuplicateSkip);
    }

    if req.record.title.is_empty()
        && let Some(url) = req.source_url
    {
        let question = format!("No title could be extracted from {}. Store it as \"Untitled\"?", url);
        if !confirm.confirm(&question) {
            return Ok(WriteOutcome::Declined);
        }
    }

    let entry = NewEntry::from_record(req.record, req.source_url);
    catalog.create_entry(&entry).await?;
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCatalog, ScriptedConfirm};

    fn record(title: &str) -> BibRecord {
        BibRecord {
            title: title.to_string(),
            year: "2020".to_string(),
            doi: "10.1/x".to_string(),
            raw_text: "@article{x}".to_string(),
        }
    }

    async fn decide(
        catalog: &MockCatalog,
        confirm: &ScriptedConfirm,
        title: &str,
        duplicate: bool,
        force: bool,
        source_url: Option<&str>,
    ) -> WriteOutcome {
        let rec = record(title);
        write_record(
            catalog,
            confirm,
            WriteRequest {
                record: &rec,
                duplicate,
                force,
                source_url,
            },
        )
        .await
        .unwrap()
    }

    // ── policy table ───────────────────────────────────────────────────

    #[tokio::test]
    async fn fresh_titled_record_is_written() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![]);
        let outcome = decide(&catalog, &confirm, "T", false, false, None).await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(catalog.created().len(), 1);
    }

    #[tokio::test]
    async fn fresh_untitled_from_url_prompts() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![true]);
        let outcome = decide(&catalog, &confirm, "", false, false, Some("https://doi.org/10.1/x"))
            .await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(confirm.asked(), 1);
        assert_eq!(catalog.created()[0].title, "Untitled");
    }

    #[tokio::test]
    async fn declined_untitled_is_skipped() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![false]);
        let outcome = decide(&catalog, &confirm, "", false, false, Some("https://doi.org/10.1/x"))
            .await;
        assert_eq!(outcome, WriteOutcome::Declined);
        assert!(catalog.created().is_empty());
    }

    #[tokio::test]
    async fn untitled_local_record_writes_without_prompt() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![]);
        let outcome = decide(&catalog, &confirm, "", false, false, None).await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(confirm.asked(), 0);
        assert_eq!(catalog.created()[0].title, "Untitled");
    }

    #[tokio::test]
    async fn duplicate_without_force_is_skipped() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![]);
        let outcome = decide(&catalog, &confirm, "T", true, false, None).await;
        assert_eq!(outcome, WriteOutcome::DuplicateSkip);
        assert!(catalog.created().is_empty());
    }

    #[tokio::test]
    async fn duplicate_with_force_is_written() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![]);
        let outcome = decide(&catalog, &confirm, "T", true, true, None).await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(catalog.created().len(), 1);
    }

    #[tokio::test]
    async fn forced_untitled_duplicate_from_url_still_prompts() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![true]);
        let outcome = decide(&catalog, &confirm, "", true, true, Some("https://doi.org/10.1/x"))
            .await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(confirm.asked(), 1);
    }

    // ── idempotence ────────────────────────────────────────────────────

    #[tokio::test]
    async fn second_write_without_force_skips() {
        let catalog = MockCatalog::empty();
        let confirm = ScriptedConfirm::new(vec![]);
        let first = decide(&catalog, &confirm, "T", false, false, None).await;
        assert_eq!(first, WriteOutcome::Written);
        // The entry now exists, so the advisory check reports a duplicate.
        let second = decide(&catalog, &confirm, "T", true, false, None).await;
        assert_eq!(second, WriteOutcome::DuplicateSkip);
        assert_eq!(catalog.created().len(), 1);
    }

    // ── error propagation ──────────────────────────────────────────────

    #[tokio::test]
    async fn create_error_propagates() {
        let catalog = MockCatalog::failing("boom");
        let confirm = ScriptedConfirm::new(vec![]);
        let rec = record("T");
        let result = write_record(
            &catalog,
            &confirm,
            WriteRequest {
                record: &rec,
                duplicate: false,
                force: false,
                source_url: None,
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), "boom");
    }
}
