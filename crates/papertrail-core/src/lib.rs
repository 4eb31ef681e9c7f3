//! Ingest pipeline and citation-graph expansion.
//!
//! A single reference flows fetch → extract → parse → duplicate check →
//! catalog write ([`Pipeline`]); when expansion is enabled, the DOIs cited
//! by each written record are walked depth-first through the same pipeline
//! ([`expand`]), bounded by a visited set and paced against the metadata
//! service.

pub mod catalog;
pub mod confirm;
pub mod expand;
pub mod mock;
pub mod pipeline;
pub mod rate_limit;
pub mod refs;
pub mod writer;

// Re-export for convenience
pub use catalog::{Catalog, NewEntry, NotionBackend, RAW_TEXT_CAP};
pub use confirm::{AlwaysAccept, AlwaysSkip, ConfirmPolicy};
pub use expand::{Expander, VisitedSet, run_ingest};
pub use papertrail_bib::BibRecord;
pub use papertrail_ingest::{Fetcher, HttpFetcher, RecordExtractor, Source};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use rate_limit::FetchPacer;
pub use refs::{CrossrefSource, ReferenceSource};
pub use writer::{WriteOutcome, WriteRequest};

/// Configuration for one ingest run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Write even when the duplicate check matches.
    pub force: bool,
    /// Follow the citation graph of written records.
    pub recursive: bool,
    /// Per-request timeout for every outbound HTTP call.
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            force: false,
            recursive: false,
            http_timeout_secs: 30,
        }
    }
}

/// Progress events emitted while processing references.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    Fetching {
        target: String,
    },
    FetchFailed {
        target: String,
        error: String,
    },
    Extracting {
        file: String,
    },
    /// The extraction tool produced nothing usable for this reference.
    NoRecord {
        target: String,
    },
    CheckingDuplicate {
        title: String,
    },
    Written {
        title: String,
    },
    DuplicateSkip {
        title: String,
    },
    /// The user declined to store an untitled record.
    Declined {
        target: String,
    },
    /// A catalog query or write failed for this reference.
    CatalogFailed {
        target: String,
        error: String,
    },
    /// Reference DOIs fetched for a written record.
    Expanding {
        doi: String,
        count: usize,
    },
    ReferenceLookupFailed {
        doi: String,
        error: String,
    },
    AlreadyVisited {
        doi: String,
    },
}

/// Per-run tallies, one increment per processed reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub duplicates: usize,
    pub declined: usize,
    /// References that could not be fetched or yielded no record.
    pub unavailable: usize,
    /// References whose catalog query or write failed.
    pub failed: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.written + self.duplicates + self.declined + self.unavailable + self.failed
    }

    pub(crate) fn note(&mut self, outcome: &PipelineOutcome) {
        match outcome {
            PipelineOutcome::Unavailable => self.unavailable += 1,
            PipelineOutcome::Decided { outcome, .. } => match outcome {
                WriteOutcome::Written => self.written += 1,
                WriteOutcome::DuplicateSkip => self.duplicates += 1,
                WriteOutcome::Declined => self.declined += 1,
            },
        }
    }
}

/// Render a DOI in its canonical URL form.
pub fn doi_url(doi: &str) -> String {
    format!("https://doi.org/{}", doi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doi_url_form() {
        assert_eq!(doi_url("10.1234/abc"), "https://doi.org/10.1234/abc");
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut summary = RunSummary::default();
        summary.note(&PipelineOutcome::Unavailable);
        summary.note(&PipelineOutcome::Decided {
            record: BibRecord::default(),
            outcome: WriteOutcome::Written,
        });
        summary.note(&PipelineOutcome::Decided {
            record: BibRecord::default(),
            outcome: WriteOutcome::DuplicateSkip,
        });
        assert_eq!(summary.written, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.unavailable, 1);
        assert_eq!(summary.processed(), 3);
    }
}
